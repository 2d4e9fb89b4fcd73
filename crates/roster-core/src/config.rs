use crate::criteria::{self, ComplianceCriterion, CriterionUpdate};
use crate::error::{Result, RosterError};
use crate::paths;
use crate::types::ComparisonType;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ExecutionConfig
// ---------------------------------------------------------------------------

/// Retry policy for status updates issued when an action is executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on every further attempt.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    250
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// StatusStoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusStoreConfig {
    /// Write status changes into the local members file.
    #[default]
    Ledger,
    /// POST status changes to a member service.
    Http {
        base_url: String,
        /// Name of the environment variable holding a bearer token.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_env: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_timeout_secs() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// WatchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    300
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// OrganizationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub organization: OrganizationConfig,
    #[serde(default = "criteria::default_criteria")]
    pub criteria: Vec<ComplianceCriterion>,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub status_store: StatusStoreConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            version: 1,
            organization: OrganizationConfig {
                name: organization.into(),
            },
            criteria: criteria::default_criteria(),
            execution: ExecutionConfig::default(),
            status_store: StatusStoreConfig::default(),
            watch: WatchConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(RosterError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Refuses to write criteria whose comparison type did not load, since the
    /// original name would be lost.
    pub fn save(&self, root: &Path) -> Result<()> {
        if let Some(c) = self
            .criteria
            .iter()
            .find(|c| c.comparison_type == ComparisonType::Unknown)
        {
            return Err(RosterError::InvalidCriterion {
                id: c.id.clone(),
                reason: "comparison_type is not recognized; fix config.yaml by hand".to_string(),
            });
        }
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn criterion(&self, id: &str) -> Result<&ComplianceCriterion> {
        criteria::find(&self.criteria, id)
    }

    /// Edit one criterion in memory. Nothing changes when the edit is invalid.
    pub fn update_criterion(
        &mut self,
        id: &str,
        update: &CriterionUpdate,
    ) -> Result<&ComplianceCriterion> {
        criteria::apply_update(&mut self.criteria, id, update)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. Each criterion must be internally consistent
        for c in &self.criteria {
            for problem in c.problems() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("criterion '{}': {}", c.id, problem),
                });
            }
        }

        // 2. Ids must be unique
        for id in criteria::duplicate_ids(&self.criteria) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("criterion id '{id}' is defined more than once"),
            });
        }

        // 3. Nothing to scan
        if !self.criteria.iter().any(|c| c.enabled) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "no criteria are enabled; scans will never propose actions".to_string(),
            });
        }

        // 4. Retry policy
        if self.execution.max_attempts == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "execution.max_attempts must be at least 1".to_string(),
            });
        } else if self.execution.max_attempts > 10 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "execution.max_attempts={} (>10 is unusual)",
                    self.execution.max_attempts
                ),
            });
        }

        // 5. Status store endpoint
        if let StatusStoreConfig::Http { base_url, .. } = &self.status_store {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "status_store.base_url '{base_url}' must start with http:// or https://"
                    ),
                });
            }
        }

        // 6. Polling interval
        if self.watch.interval_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "watch.interval_secs must be at least 1".to_string(),
            });
        }

        warnings
    }

    pub fn has_errors(&self) -> bool {
        self.validate().iter().any(|w| w.level == WarnLevel::Error)
    }

    /// Errors that would make a scan's proposals wrong. Criteria with an
    /// unrecognized comparison type are left out: the evaluator skips them.
    pub fn scan_errors(&self) -> Vec<ConfigWarning> {
        let known = Config {
            criteria: self
                .criteria
                .iter()
                .filter(|c| c.comparison_type != ComparisonType::Unknown)
                .cloned()
                .collect(),
            ..self.clone()
        };
        known
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemberAction;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_clean() {
        let cfg = Config::new("Lambda Chapter");
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
    }

    #[test]
    fn minimal_yaml_fills_defaults() {
        let yaml = "organization:\n  name: Lambda\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.criteria.len(), criteria::default_criteria().len());
        assert_eq!(cfg.status_store, StatusStoreConfig::Ledger);
        assert_eq!(cfg.execution.max_attempts, 3);
        assert_eq!(cfg.watch.interval_secs, 300);
    }

    #[test]
    fn http_store_yaml_tagged() {
        let yaml = "type: http\nbase_url: https://members.example.org/api\ntoken_env: ROSTER_TOKEN\n";
        let store: StatusStoreConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            store,
            StatusStoreConfig::Http {
                base_url: "https://members.example.org/api".to_string(),
                token_env: Some("ROSTER_TOKEN".to_string()),
                timeout_secs: 10,
            }
        );
    }

    #[test]
    fn load_missing_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(RosterError::NotInitialized)
        ));
    }

    #[test]
    fn save_then_load_keeps_edits() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new("Lambda");
        cfg.update_criterion(
            "event_attendance",
            &CriterionUpdate {
                threshold: Some(50.0),
                ..Default::default()
            },
        )
        .unwrap();
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.criterion("event_attendance").unwrap().threshold, 50.0);
    }

    #[test]
    fn inconsistent_criterion_is_an_error() {
        let mut cfg = Config::new("Lambda");
        cfg.criteria[0].allowed_actions = vec![MemberAction::Warning];
        assert!(cfg.has_errors());
    }

    #[test]
    fn duplicate_criterion_is_an_error() {
        let mut cfg = Config::new("Lambda");
        let dup = cfg.criteria[1].clone();
        cfg.criteria.push(dup);
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("more than once")));
    }

    #[test]
    fn no_enabled_criteria_warns() {
        let mut cfg = Config::new("Lambda");
        for c in &mut cfg.criteria {
            c.enabled = false;
        }
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
    }

    #[test]
    fn bad_http_url_is_an_error() {
        let mut cfg = Config::new("Lambda");
        cfg.status_store = StatusStoreConfig::Http {
            base_url: "members.example.org".to_string(),
            token_env: None,
            timeout_secs: 5,
        };
        assert!(cfg.has_errors());
    }

    #[test]
    fn unrecognized_comparison_type_loads_and_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(paths::roster_dir(dir.path())).unwrap();
        let yaml = "organization:
  name: Lambda
criteria:
- id: dues_payment
  comparison_type: payment_days
  threshold: 90
  severity: high
  allowed_actions: [warning, probation]
  selected_action: probation
- id: karma
  comparison_type: karma_points
  threshold: 3
  severity: low
  allowed_actions: [warning]
  selected_action: warning
";
        std::fs::write(paths::config_path(dir.path()), yaml).unwrap();

        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.criteria.len(), 2);
        assert_eq!(
            cfg.criterion("karma").unwrap().comparison_type,
            ComparisonType::Unknown
        );
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("criterion 'karma'")));
        assert!(cfg.scan_errors().is_empty());
    }

    #[test]
    fn save_refuses_unrecognized_comparison_type() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new("Lambda");
        cfg.criteria[0].comparison_type = ComparisonType::Unknown;
        assert!(matches!(
            cfg.save(dir.path()),
            Err(RosterError::InvalidCriterion { .. })
        ));
        assert!(!paths::config_path(dir.path()).exists());
    }

    #[test]
    fn scan_errors_keep_real_problems() {
        let mut cfg = Config::new("Lambda");
        cfg.criteria[0].allowed_actions = vec![MemberAction::Warning];
        assert_eq!(cfg.scan_errors().len(), 1);
    }

    #[test]
    fn zero_attempts_is_an_error() {
        let mut cfg = Config::new("Lambda");
        cfg.execution.max_attempts = 0;
        assert!(cfg.has_errors());
    }
}
