//! The review queue of proposed actions awaiting an execute or dismiss decision.
//!
//! Every scan replaces the whole queue. Entries leave the queue only when an
//! operator dismisses them or when executing them succeeds; a failed execution
//! keeps the entry and records the error so it can be retried.

use crate::config::ExecutionConfig;
use crate::error::{Result, RosterError};
use crate::evaluator::{review_order, ProposedAction};
use crate::paths;
use crate::status_store::StatusStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// QueuedAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    #[serde(flatten)]
    pub action: ProposedAction,
    /// Status update attempts made so far.
    #[serde(default)]
    pub attempts: u32,
    /// Set when the last execution failed; the entry can be retried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl QueuedAction {
    pub fn new(action: ProposedAction) -> Self {
        Self {
            action,
            attempts: 0,
            last_error: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.last_error.is_some()
    }
}

// ---------------------------------------------------------------------------
// ActionQueue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionQueue {
    /// When the batch in the queue was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: Vec<QueuedAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::queue_path(root);
        if !path.exists() {
            if paths::roster_dir(root).is_dir() {
                return Ok(Self::default());
            }
            return Err(RosterError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let queue: ActionQueue = serde_yaml::from_str(&data)?;
        Ok(queue)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::queue_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn entries(&self) -> &[QueuedAction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in review order: severity, member name, criterion id.
    pub fn sorted(&self) -> Vec<&QueuedAction> {
        let mut v: Vec<&QueuedAction> = self.entries.iter().collect();
        v.sort_by(|a, b| review_order(&a.action, &b.action));
        v
    }

    pub fn find(&self, member_id: &str, criterion_id: &str) -> Result<&QueuedAction> {
        self.entries
            .iter()
            .find(|e| e.action.targets(member_id, criterion_id))
            .ok_or_else(|| RosterError::ActionNotQueued {
                member_id: member_id.to_string(),
                criterion_id: criterion_id.to_string(),
            })
    }

    pub fn contains(&self, action: &ProposedAction) -> bool {
        self.entries.iter().any(|e| e.action == *action)
    }

    /// Discard the current batch and queue `actions` in its place.
    pub fn replace_all(&mut self, actions: Vec<ProposedAction>, generated_at: DateTime<Utc>) {
        let dropped = self.entries.len();
        self.entries = actions.into_iter().map(QueuedAction::new).collect();
        self.generated_at = Some(generated_at);
        tracing::debug!(dropped, queued = self.entries.len(), "action queue replaced");
    }

    /// Remove every entry equal to `action`. Returns whether anything was removed.
    pub fn remove(&mut self, action: &ProposedAction) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.action != *action);
        self.entries.len() != before
    }

    pub fn dismiss(&mut self, action: &ProposedAction) -> Result<()> {
        if !self.remove(action) {
            return Err(RosterError::ActionNotQueued {
                member_id: action.member_id.clone(),
                criterion_id: action.criterion_id.clone(),
            });
        }
        tracing::info!(
            member = %action.member_id,
            criterion = %action.criterion_id,
            "action dismissed"
        );
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Apply `action` through `store`, then remove it from the queue.
    ///
    /// Retryable store errors are retried up to `policy.max_attempts` times
    /// with doubling backoff. If every attempt fails the entry stays queued
    /// with `last_error` set and `ExecutionFailed` is returned.
    pub fn execute(
        &mut self,
        action: &ProposedAction,
        store: &dyn StatusStore,
        policy: &ExecutionConfig,
    ) -> Result<()> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.action == *action)
            .ok_or_else(|| RosterError::ActionNotQueued {
                member_id: action.member_id.clone(),
                criterion_id: action.criterion_id.clone(),
            })?;

        let target = action.proposed_action.target_status();
        let (made, outcome) = with_retries(policy, || {
            store.update_status(&action.member_id, target)
        });

        match outcome {
            Ok(()) => {
                self.remove(action);
                tracing::info!(
                    member = %action.member_id,
                    criterion = %action.criterion_id,
                    action = %action.proposed_action,
                    attempts = made,
                    "action executed"
                );
                Ok(())
            }
            Err(e) => {
                let entry = &mut self.entries[idx];
                entry.attempts += made;
                entry.last_error = Some(e.to_string());
                Err(RosterError::ExecutionFailed {
                    member_id: action.member_id.clone(),
                    action: action.proposed_action.to_string(),
                    attempts: entry.attempts,
                    reason: e.to_string(),
                    retryable: e.is_retryable(),
                })
            }
        }
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or runs out
/// of attempts. Returns the number of attempts made alongside the outcome.
fn with_retries<F>(policy: &ExecutionConfig, mut op: F) -> (u32, Result<()>)
where
    F: FnMut() -> Result<()>,
{
    let max = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(()) => return (attempt, Ok(())),
            Err(e) if attempt < max && e.is_retryable() => {
                let delay = policy
                    .backoff_ms
                    .saturating_mul(2u64.saturating_pow(attempt - 1));
                tracing::warn!(attempt, max, delay_ms = delay, error = %e, "status update failed; retrying");
                std::thread::sleep(Duration::from_millis(delay));
            }
            Err(e) => return (attempt, Err(e)),
        }
    }
}
