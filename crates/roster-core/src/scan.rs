use crate::error::Result;
use crate::evaluator::evaluate;
use crate::queue::ActionQueue;
use crate::repository::ComplianceRepository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub members_scanned: usize,
    pub criteria_enabled: usize,
    pub proposals: usize,
    /// Entries of the previous batch that were discarded.
    pub replaced: usize,
}

/// Read criteria and snapshots from `repo`, evaluate them, and replace the
/// contents of `queue` with the result.
pub fn run_scan(
    repo: &dyn ComplianceRepository,
    queue: &mut ActionQueue,
    at: DateTime<Utc>,
) -> Result<ScanReport> {
    let criteria = repo.criteria()?;
    let members = repo.members()?;

    let proposals = evaluate(&criteria, &members, at);
    let report = ScanReport {
        generated_at: at,
        members_scanned: members.len(),
        criteria_enabled: criteria.iter().filter(|c| c.enabled).count(),
        proposals: proposals.len(),
        replaced: queue.len(),
    };
    queue.replace_all(proposals, at);

    tracing::info!(
        members = report.members_scanned,
        criteria = report.criteria_enabled,
        proposals = report.proposals,
        "compliance scan complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::default_criteria;
    use crate::repository::MemoryRepository;
    use crate::snapshot::{Measurement, Member};
    use chrono::TimeZone;

    fn repo() -> MemoryRepository {
        MemoryRepository {
            criteria: default_criteria(),
            members: vec![
                Member::new("m1", "Ada")
                    .with_measurement("dues_payment", Measurement::PaymentDays { days_overdue: 95 }),
                Member::new("m2", "Bo")
                    .with_measurement("event_attendance", Measurement::Percentage { percentage: 80.0 }),
                Member::new("m3", "Cy")
                    .with_measurement("service_hours", Measurement::hours(12.0, 20.0)),
            ],
        }
    }

    #[test]
    fn scan_fills_queue() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut queue = ActionQueue::new();
        let report = run_scan(&repo(), &mut queue, at).unwrap();

        assert_eq!(report.members_scanned, 3);
        assert_eq!(report.criteria_enabled, 4);
        assert_eq!(report.proposals, 2);
        assert_eq!(report.replaced, 0);
        assert_eq!(queue.len(), 2);
        assert!(queue.find("m1", "dues_payment").is_ok());
        assert!(queue.find("m3", "service_hours").is_ok());
    }

    #[test]
    fn rescan_replaces_stale_entries() {
        let first = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 3, 1, 0, 5, 0).unwrap();
        let mut repo = repo();
        let mut queue = ActionQueue::new();
        run_scan(&repo, &mut queue, first).unwrap();

        // Ada's dues are paid between scans.
        repo.members[0]
            .compliance
            .insert("dues_payment".to_string(), Measurement::PaymentDays { days_overdue: 0 });
        let report = run_scan(&repo, &mut queue, second).unwrap();

        assert_eq!(report.replaced, 2);
        assert_eq!(queue.len(), 1);
        assert!(queue.find("m1", "dues_payment").is_err());
        assert!(queue.entries().iter().all(|e| e.action.timestamp == second));
    }
}
