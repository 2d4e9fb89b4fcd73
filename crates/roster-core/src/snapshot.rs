//! Compliance snapshots: each member's latest measurement per criterion.
//!
//! The measurement shape depends on the criterion's comparison type. The
//! derived compliant / non-compliant status is never stored; it is computed
//! from the raw numbers by the same checks the evaluator uses.

use crate::criteria::ComplianceCriterion;
use crate::error::{Result, RosterError};
use crate::evaluator::{assess, Assessment};
use crate::paths;
use crate::types::{ComparisonType, ComplianceStatus, MemberStatus};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// HoursLog
// ---------------------------------------------------------------------------

/// Completed vs. required hours. `deficit` is always derived from the other two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "HoursRecord")]
pub struct HoursLog {
    completed: f64,
    required: f64,
    deficit: f64,
}

#[derive(Deserialize)]
struct HoursRecord {
    completed: f64,
    required: f64,
}

impl From<HoursRecord> for HoursLog {
    fn from(r: HoursRecord) -> Self {
        HoursLog::new(r.completed, r.required)
    }
}

impl HoursLog {
    pub fn new(completed: f64, required: f64) -> Self {
        Self {
            completed,
            required,
            deficit: (required - completed).max(0.0),
        }
    }

    pub fn completed(&self) -> f64 {
        self.completed
    }

    pub fn required(&self) -> f64 {
        self.required
    }

    pub fn deficit(&self) -> f64 {
        self.deficit
    }
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Measurement {
    PaymentDays {
        days_overdue: u32,
    },
    HoursDeficit(HoursLog),
    Percentage {
        percentage: f64,
    },
    ResponseDays {
        avg_response_time: f64,
    },
    /// A snapshot this build cannot read: an unknown tag or a malformed shape.
    /// Never counts as a violation.
    #[serde(other)]
    Unrecognized,
}

impl Measurement {
    pub fn hours(completed: f64, required: f64) -> Self {
        Measurement::HoursDeficit(HoursLog::new(completed, required))
    }

    pub fn comparison_type(&self) -> Option<ComparisonType> {
        match self {
            Measurement::PaymentDays { .. } => Some(ComparisonType::PaymentDays),
            Measurement::HoursDeficit(_) => Some(ComparisonType::HoursDeficit),
            Measurement::Percentage { .. } => Some(ComparisonType::Percentage),
            Measurement::ResponseDays { .. } => Some(ComparisonType::ResponseDays),
            Measurement::Unrecognized => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Member
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "MemberRecord")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub status: MemberStatus,
    /// Criterion id → latest measurement.
    pub compliance: BTreeMap<String, Measurement>,
    /// Entries that loaded as `Unrecognized`, kept verbatim so a save writes
    /// them back unchanged.
    unparsed: BTreeMap<String, serde_yaml::Value>,
}

/// On-disk shape of a member. Compliance entries are read one by one so a
/// malformed snapshot cannot take the rest of the file down with it.
#[derive(Deserialize)]
struct MemberRecord {
    id: String,
    name: String,
    #[serde(default)]
    status: MemberStatus,
    #[serde(default)]
    compliance: BTreeMap<String, serde_yaml::Value>,
}

impl From<MemberRecord> for Member {
    fn from(r: MemberRecord) -> Self {
        let mut compliance = BTreeMap::new();
        let mut unparsed = BTreeMap::new();
        for (criterion, raw) in r.compliance {
            let measurement = match serde_yaml::from_value::<Measurement>(raw.clone()) {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(
                        member = %r.id,
                        criterion = %criterion,
                        error = %e,
                        "malformed compliance snapshot; treating as compliant"
                    );
                    Measurement::Unrecognized
                }
            };
            if measurement == Measurement::Unrecognized {
                unparsed.insert(criterion.clone(), raw);
            }
            compliance.insert(criterion, measurement);
        }
        Self {
            id: r.id,
            name: r.name,
            status: r.status,
            compliance,
            unparsed,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum StoredMeasurement<'a> {
    Parsed(&'a Measurement),
    Raw(&'a serde_yaml::Value),
}

#[derive(Serialize)]
struct StoredMember<'a> {
    id: &'a str,
    name: &'a str,
    status: MemberStatus,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    compliance: BTreeMap<&'a str, StoredMeasurement<'a>>,
}

impl Serialize for Member {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let compliance = self
            .compliance
            .iter()
            .map(|(criterion, m)| {
                let stored = match (m, self.unparsed.get(criterion)) {
                    (Measurement::Unrecognized, Some(raw)) => StoredMeasurement::Raw(raw),
                    _ => StoredMeasurement::Parsed(m),
                };
                (criterion.as_str(), stored)
            })
            .collect();
        StoredMember {
            id: &self.id,
            name: &self.name,
            status: self.status,
            compliance,
        }
        .serialize(serializer)
    }
}

impl Member {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: MemberStatus::Active,
            compliance: BTreeMap::new(),
            unparsed: BTreeMap::new(),
        }
    }

    pub fn with_measurement(mut self, criterion_id: impl Into<String>, m: Measurement) -> Self {
        let criterion_id = criterion_id.into();
        self.unparsed.remove(&criterion_id);
        self.compliance.insert(criterion_id, m);
        self
    }

    pub fn snapshot(&self, criterion_id: &str) -> Option<&Measurement> {
        self.compliance.get(criterion_id)
    }

    /// Compliance against `criterion`, or `None` when there is no usable snapshot.
    pub fn status_for(&self, criterion: &ComplianceCriterion) -> Option<ComplianceStatus> {
        let m = self.snapshot(&criterion.id)?;
        match assess(criterion, m) {
            Assessment::Compliant => Some(ComplianceStatus::Compliant),
            Assessment::Violation { .. } => Some(ComplianceStatus::NonCompliant),
            Assessment::Unreadable => None,
        }
    }
}

// ---------------------------------------------------------------------------
// MemberRoster (members.yaml)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberRoster {
    #[serde(default)]
    pub members: Vec<Member>,
}

impl MemberRoster {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::members_path(root);
        if !path.exists() {
            if paths::roster_dir(root).is_dir() {
                return Ok(Self::default());
            }
            return Err(RosterError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let roster: MemberRoster = serde_yaml::from_str(&data)?;
        Ok(roster)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::members_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn member(&self, id: &str) -> Result<&Member> {
        self.members
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| RosterError::MemberNotFound(id.to_string()))
    }

    pub fn member_mut(&mut self, id: &str) -> Result<&mut Member> {
        self.members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| RosterError::MemberNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemberAction, Severity};
    use tempfile::TempDir;

    #[test]
    fn deficit_is_derived_not_read() {
        let yaml = "type: hours_deficit\ncompleted: 12\nrequired: 20\ndeficit: 0\n";
        let m: Measurement = serde_yaml::from_str(yaml).unwrap();
        match m {
            Measurement::HoursDeficit(h) => {
                assert_eq!(h.completed(), 12.0);
                assert_eq!(h.deficit(), 8.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn surplus_hours_have_no_deficit() {
        assert_eq!(HoursLog::new(25.0, 20.0).deficit(), 0.0);
    }

    #[test]
    fn unknown_tag_is_unrecognized() {
        let m: Measurement = serde_yaml::from_str("type: karma_points\npoints: 4\n").unwrap();
        assert_eq!(m, Measurement::Unrecognized);
        assert_eq!(m.comparison_type(), None);
    }

    #[test]
    fn status_is_derived_from_measurement() {
        let dues = ComplianceCriterion::new(
            "dues_payment",
            ComparisonType::PaymentDays,
            90.0,
            Severity::High,
            MemberAction::Probation,
        );
        let late = Member::new("m1", "Ada")
            .with_measurement("dues_payment", Measurement::PaymentDays { days_overdue: 95 });
        let ok = Member::new("m2", "Bo")
            .with_measurement("dues_payment", Measurement::PaymentDays { days_overdue: 90 });
        let unknown = Member::new("m3", "Cy");

        assert_eq!(late.status_for(&dues), Some(ComplianceStatus::NonCompliant));
        assert_eq!(ok.status_for(&dues), Some(ComplianceStatus::Compliant));
        assert_eq!(unknown.status_for(&dues), None);
    }

    #[test]
    fn roster_load_save() {
        let dir = TempDir::new().unwrap();
        let roster = MemberRoster {
            members: vec![Member::new("m1", "Ada")
                .with_measurement("service_hours", Measurement::hours(4.0, 10.0))],
        };
        roster.save(dir.path()).unwrap();
        let loaded = MemberRoster::load(dir.path()).unwrap();
        assert_eq!(loaded.members, roster.members);
        assert_eq!(loaded.member("m1").unwrap().status, MemberStatus::Active);
    }

    const MIXED_ROSTER: &str = "members:
- id: m1
  name: Ada
  compliance:
    dues_payment:
      type: payment_days
      days_overdue: 95
- id: m2
  name: Bo
  status: warned
  compliance:
    service_hours:
      type: hours_deficit
      completed: 12
    dues_payment:
      type: payment_days
      days_overdue: -3
    event_attendance:
      type: percentage
      percentage: 40
";

    #[test]
    fn malformed_snapshot_does_not_spoil_the_roster() {
        let roster: MemberRoster = serde_yaml::from_str(MIXED_ROSTER).unwrap();
        let ada = roster.member("m1").unwrap();
        let bo = roster.member("m2").unwrap();

        assert_eq!(
            ada.snapshot("dues_payment"),
            Some(&Measurement::PaymentDays { days_overdue: 95 })
        );
        assert_eq!(bo.status, MemberStatus::Warned);
        assert_eq!(bo.snapshot("service_hours"), Some(&Measurement::Unrecognized));
        assert_eq!(bo.snapshot("dues_payment"), Some(&Measurement::Unrecognized));
        assert_eq!(
            bo.snapshot("event_attendance"),
            Some(&Measurement::Percentage { percentage: 40.0 })
        );

        let dues = ComplianceCriterion::new(
            "dues_payment",
            ComparisonType::PaymentDays,
            90.0,
            Severity::High,
            MemberAction::Probation,
        );
        assert_eq!(ada.status_for(&dues), Some(ComplianceStatus::NonCompliant));
        assert_eq!(bo.status_for(&dues), None);
    }

    #[test]
    fn unreadable_snapshots_survive_a_save() {
        let dir = TempDir::new().unwrap();
        let mut roster: MemberRoster = serde_yaml::from_str(MIXED_ROSTER).unwrap();
        roster.member_mut("m2").unwrap().status = MemberStatus::Probation;
        roster.save(dir.path()).unwrap();

        let raw: serde_yaml::Value =
            serde_yaml::from_str(&std::fs::read_to_string(paths::members_path(dir.path())).unwrap())
                .unwrap();
        let hours = &raw["members"][1]["compliance"]["service_hours"];
        assert_eq!(hours["type"].as_str(), Some("hours_deficit"));
        assert_eq!(hours["completed"].as_i64(), Some(12));
        assert_eq!(
            raw["members"][1]["compliance"]["dues_payment"]["days_overdue"].as_i64(),
            Some(-3)
        );

        let loaded = MemberRoster::load(dir.path()).unwrap();
        assert_eq!(loaded.member("m2").unwrap().status, MemberStatus::Probation);
        assert_eq!(loaded.members, roster.members);
    }

    #[test]
    fn roster_load_requires_init() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            MemberRoster::load(dir.path()),
            Err(RosterError::NotInitialized)
        ));
    }
}
