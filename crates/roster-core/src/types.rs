use crate::error::RosterError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Ordered most severe first, so an ascending sort puts `High` at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(RosterError::InvalidValue {
                kind: "severity",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ComparisonType
// ---------------------------------------------------------------------------

/// How a criterion's threshold is compared against a member's measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonType {
    /// Days a payment is overdue; violation above the threshold.
    PaymentDays,
    /// Required hours not yet completed; violation on any deficit.
    HoursDeficit,
    /// A percentage score; violation below the threshold.
    Percentage,
    /// Average days to respond; violation above the threshold.
    ResponseDays,
    /// A type this build does not know. No check exists for it, so it never
    /// produces a violation.
    #[serde(other)]
    Unknown,
}

impl ComparisonType {
    pub fn all() -> &'static [ComparisonType] {
        &[
            ComparisonType::PaymentDays,
            ComparisonType::HoursDeficit,
            ComparisonType::Percentage,
            ComparisonType::ResponseDays,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonType::PaymentDays => "payment_days",
            ComparisonType::HoursDeficit => "hours_deficit",
            ComparisonType::Percentage => "percentage",
            ComparisonType::ResponseDays => "response_days",
            ComparisonType::Unknown => "unknown",
        }
    }

    /// Actions an operator may attach to a criterion of this type.
    pub fn permitted_actions(self) -> &'static [MemberAction] {
        match self {
            ComparisonType::PaymentDays => &[
                MemberAction::Warning,
                MemberAction::Probation,
                MemberAction::Suspension,
                MemberAction::Inactive,
            ],
            ComparisonType::HoursDeficit => &[MemberAction::Warning, MemberAction::Probation],
            ComparisonType::Percentage => &[
                MemberAction::Warning,
                MemberAction::Probation,
                MemberAction::Inactive,
            ],
            ComparisonType::ResponseDays => &[MemberAction::Warning, MemberAction::Probation],
            ComparisonType::Unknown => &[],
        }
    }
}

impl fmt::Display for ComparisonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComparisonType {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComparisonType::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| RosterError::InvalidValue {
                kind: "comparison type",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// MemberStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    #[default]
    Active,
    Warned,
    Probation,
    Suspended,
    Inactive,
}

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Warned => "warned",
            MemberStatus::Probation => "probation",
            MemberStatus::Suspended => "suspended",
            MemberStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MemberAction
// ---------------------------------------------------------------------------

/// A status change that a criterion proposes when a member violates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberAction {
    Warning,
    Probation,
    Suspension,
    Inactive,
}

impl MemberAction {
    pub fn all() -> &'static [MemberAction] {
        &[
            MemberAction::Warning,
            MemberAction::Probation,
            MemberAction::Suspension,
            MemberAction::Inactive,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemberAction::Warning => "warning",
            MemberAction::Probation => "probation",
            MemberAction::Suspension => "suspension",
            MemberAction::Inactive => "inactive",
        }
    }

    /// The member status requested from the status store when this action runs.
    pub fn target_status(self) -> MemberStatus {
        match self {
            MemberAction::Warning => MemberStatus::Warned,
            MemberAction::Probation => MemberStatus::Probation,
            MemberAction::Suspension => MemberStatus::Suspended,
            MemberAction::Inactive => MemberStatus::Inactive,
        }
    }
}

impl fmt::Display for MemberAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemberAction {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemberAction::all()
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| RosterError::InvalidValue {
                kind: "action",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// ComplianceStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::NonCompliant => "non_compliant",
        })
    }
}
