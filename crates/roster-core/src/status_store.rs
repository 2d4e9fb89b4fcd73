//! The member status store that executed actions write to.

use crate::config::StatusStoreConfig;
use crate::error::{Result, RosterError};
use crate::snapshot::MemberRoster;
use crate::types::MemberStatus;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub trait StatusStore {
    fn update_status(&self, member_id: &str, status: MemberStatus) -> Result<()>;
}

/// Build the store named by the config.
pub fn from_config(root: &Path, config: &StatusStoreConfig) -> Result<Box<dyn StatusStore>> {
    match config {
        StatusStoreConfig::Ledger => Ok(Box::new(LedgerStatusStore::new(root))),
        StatusStoreConfig::Http {
            base_url,
            token_env,
            timeout_secs,
        } => {
            let token = token_env.as_deref().and_then(|var| std::env::var(var).ok());
            let store = HttpStatusStore::new(base_url, token, Duration::from_secs(*timeout_secs))?;
            Ok(Box::new(store))
        }
    }
}

// ---------------------------------------------------------------------------
// LedgerStatusStore
// ---------------------------------------------------------------------------

/// Records status changes directly in `.roster/members.yaml`.
pub struct LedgerStatusStore {
    root: PathBuf,
}

impl LedgerStatusStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl StatusStore for LedgerStatusStore {
    fn update_status(&self, member_id: &str, status: MemberStatus) -> Result<()> {
        let mut roster = MemberRoster::load(&self.root)?;
        let member = roster.member_mut(member_id)?;
        let previous = member.status;
        member.status = status;
        roster.save(&self.root)?;
        tracing::info!(member = member_id, from = %previous, to = %status, "member status updated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HttpStatusStore
// ---------------------------------------------------------------------------

/// `POST {base_url}/members/{id}/status` with `{"status": "<status>"}`.
pub struct HttpStatusStore {
    base_url: String,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpStatusStore {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RosterError::StatusUpdate(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn status_url(&self, member_id: &str) -> String {
        format!("{}/members/{}/status", self.base_url, member_id)
    }
}

impl StatusStore for HttpStatusStore {
    fn update_status(&self, member_id: &str, status: MemberStatus) -> Result<()> {
        let url = self.status_url(member_id);
        let mut req = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "status": status }));
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .map_err(|e| RosterError::StatusUpdate(format!("POST {url}: {e}")))?;
        let code = resp.status();
        if code == reqwest::StatusCode::NOT_FOUND {
            return Err(RosterError::MemberNotFound(member_id.to_string()));
        }
        if !code.is_success() {
            let body = resp.text().unwrap_or_default();
            let detail = format!("POST {url} returned {code}: {}", body.trim());
            return Err(if code.is_client_error() {
                RosterError::StatusRejected(detail)
            } else {
                RosterError::StatusUpdate(detail)
            });
        }
        tracing::info!(member = member_id, to = %status, "member status updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionConfig;
    use crate::evaluator::ProposedAction;
    use crate::queue::ActionQueue;
    use crate::snapshot::Member;
    use crate::types::{MemberAction, Severity};
    use mockito::Matcher;
    use tempfile::TempDir;

    #[test]
    fn ledger_updates_member_status() {
        let dir = TempDir::new().unwrap();
        let roster = MemberRoster {
            members: vec![Member::new("m1", "Ada"), Member::new("m2", "Bo")],
        };
        roster.save(dir.path()).unwrap();

        let store = LedgerStatusStore::new(dir.path());
        store.update_status("m2", MemberStatus::Probation).unwrap();

        let loaded = MemberRoster::load(dir.path()).unwrap();
        assert_eq!(loaded.member("m1").unwrap().status, MemberStatus::Active);
        assert_eq!(loaded.member("m2").unwrap().status, MemberStatus::Probation);
    }

    #[test]
    fn ledger_unknown_member() {
        let dir = TempDir::new().unwrap();
        MemberRoster::default().save(dir.path()).unwrap();
        let store = LedgerStatusStore::new(dir.path());
        assert!(matches!(
            store.update_status("ghost", MemberStatus::Warned),
            Err(RosterError::MemberNotFound(_))
        ));
    }

    #[test]
    fn http_posts_status_with_token() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/members/m1/status")
            .match_header("authorization", "Bearer s3cret")
            .match_body(Matcher::Json(serde_json::json!({ "status": "suspended" })))
            .with_status(204)
            .create();

        let store = HttpStatusStore::new(
            &format!("{}/", server.url()),
            Some("s3cret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        store.update_status("m1", MemberStatus::Suspended).unwrap();
        mock.assert();
    }

    #[test]
    fn http_server_error_is_status_update_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/members/m1/status")
            .with_status(503)
            .with_body("maintenance")
            .create();

        let store = HttpStatusStore::new(&server.url(), None, Duration::from_secs(5)).unwrap();
        let err = store
            .update_status("m1", MemberStatus::Warned)
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("maintenance"));
    }

    #[test]
    fn http_client_error_is_rejected_not_retryable() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/members/m1/status")
            .with_status(401)
            .with_body("bad token")
            .create();

        let store = HttpStatusStore::new(&server.url(), None, Duration::from_secs(5)).unwrap();
        let err = store
            .update_status("m1", MemberStatus::Warned)
            .unwrap_err();
        assert!(matches!(err, RosterError::StatusRejected(_)));
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn rejected_update_is_sent_once() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/members/m1/status")
            .with_status(422)
            .expect(1)
            .create();

        let store = HttpStatusStore::new(&server.url(), None, Duration::from_secs(5)).unwrap();
        let action = ProposedAction {
            member_id: "m1".to_string(),
            member_name: "Ada".to_string(),
            criterion_id: "dues_payment".to_string(),
            current_status: MemberStatus::Active,
            proposed_action: MemberAction::Warning,
            reason: "Dues overdue by 95 days (limit 90)".to_string(),
            severity: Severity::High,
            timestamp: chrono::Utc::now(),
        };
        let mut queue = ActionQueue::new();
        queue.replace_all(vec![action.clone()], action.timestamp);
        let policy = ExecutionConfig {
            max_attempts: 3,
            backoff_ms: 0,
        };

        let err = queue.execute(&action, &store, &policy).unwrap_err();
        mock.assert();
        assert!(!err.is_retryable());
        assert_eq!(queue.find("m1", "dues_payment").unwrap().attempts, 1);
    }

    #[test]
    fn http_not_found_is_member_not_found() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/members/ghost/status")
            .with_status(404)
            .create();

        let store = HttpStatusStore::new(&server.url(), None, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            store.update_status("ghost", MemberStatus::Warned),
            Err(RosterError::MemberNotFound(_))
        ));
    }
}
