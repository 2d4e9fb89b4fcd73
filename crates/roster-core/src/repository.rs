use crate::config::Config;
use crate::criteria::ComplianceCriterion;
use crate::error::Result;
use crate::snapshot::{Member, MemberRoster};
use std::path::{Path, PathBuf};

/// Read access to the criteria registry and the compliance snapshots.
pub trait ComplianceRepository {
    fn criteria(&self) -> Result<Vec<ComplianceCriterion>>;
    fn members(&self) -> Result<Vec<Member>>;
}

/// Reads `.roster/config.yaml` and `.roster/members.yaml` on every call, so a
/// long-running watcher always sees the latest edits and snapshot refreshes.
pub struct FileRepository {
    root: PathBuf,
}

impl FileRepository {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl ComplianceRepository for FileRepository {
    fn criteria(&self) -> Result<Vec<ComplianceCriterion>> {
        Ok(Config::load(&self.root)?.criteria)
    }

    fn members(&self) -> Result<Vec<Member>> {
        Ok(MemberRoster::load(&self.root)?.members)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    pub criteria: Vec<ComplianceCriterion>,
    pub members: Vec<Member>,
}

impl ComplianceRepository for MemoryRepository {
    fn criteria(&self) -> Result<Vec<ComplianceCriterion>> {
        Ok(self.criteria.clone())
    }

    fn members(&self) -> Result<Vec<Member>> {
        Ok(self.members.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Measurement;
    use tempfile::TempDir;

    #[test]
    fn file_repository_reads_latest_files() {
        let dir = TempDir::new().unwrap();
        Config::new("Lambda").save(dir.path()).unwrap();
        MemberRoster::default().save(dir.path()).unwrap();

        let repo = FileRepository::new(dir.path());
        assert!(repo.members().unwrap().is_empty());

        MemberRoster {
            members: vec![Member::new("m1", "Ada")
                .with_measurement("dues_payment", Measurement::PaymentDays { days_overdue: 1 })],
        }
        .save(dir.path())
        .unwrap();

        assert_eq!(repo.members().unwrap().len(), 1);
        assert_eq!(repo.criteria().unwrap().len(), Config::new("x").criteria.len());
    }

    #[test]
    fn malformed_snapshot_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        Config::new("Lambda").save(dir.path()).unwrap();
        std::fs::write(
            crate::paths::members_path(dir.path()),
            "members:
- id: m1
  name: Ada
  compliance:
    dues_payment: {type: payment_days, days_overdue: 95}
- id: m2
  name: Bo
  compliance:
    service_hours: {type: hours_deficit, completed: 12}
",
        )
        .unwrap();

        let repo = FileRepository::new(dir.path());
        let members = repo.members().unwrap();
        assert_eq!(members.len(), 2);

        let at = chrono::Utc::now();
        let proposals = crate::evaluator::evaluate(&repo.criteria().unwrap(), &members, at);
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].member_id, "m1");
        assert_eq!(proposals[0].criterion_id, "dues_payment");
    }

    #[test]
    fn file_repository_uninitialized() {
        let dir = TempDir::new().unwrap();
        assert!(FileRepository::new(dir.path()).criteria().is_err());
    }
}
