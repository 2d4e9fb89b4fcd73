use crate::error::{Result, RosterError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const ROSTER_DIR: &str = ".roster";

pub const CONFIG_FILE: &str = ".roster/config.yaml";
pub const MEMBERS_FILE: &str = ".roster/members.yaml";
pub const QUEUE_FILE: &str = ".roster/queue.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn roster_dir(root: &Path) -> PathBuf {
    root.join(ROSTER_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn members_path(root: &Path) -> PathBuf {
    root.join(MEMBERS_FILE)
}

pub fn queue_path(root: &Path) -> PathBuf {
    root.join(QUEUE_FILE)
}

// ---------------------------------------------------------------------------
// Id validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_\-]*$").unwrap())
}

/// Criterion and member ids: lowercase alphanumerics, `_` and `-`.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !id_re().is_match(id) {
        return Err(RosterError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids() {
        for id in ["dues_payment", "m-001", "a", "event_attendance_2"] {
            validate_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_ids() {
        for id in ["", "_leading", "has space", "Upper", "dots.bad"] {
            assert!(validate_id(id).is_err(), "expected invalid: {id}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/org");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/org/.roster/config.yaml")
        );
        assert_eq!(
            queue_path(root),
            PathBuf::from("/tmp/org/.roster/queue.yaml")
        );
    }
}
