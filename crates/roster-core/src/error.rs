use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("not initialized: run 'roster init'")]
    NotInitialized,

    #[error("criterion not found: {0}")]
    CriterionNotFound(String),

    #[error("invalid criterion '{id}': {reason}")]
    InvalidCriterion { id: String, reason: String },

    #[error("invalid id '{0}': must be lowercase alphanumeric with underscores or hyphens")]
    InvalidId(String),

    #[error("invalid {kind}: {value}")]
    InvalidValue { kind: &'static str, value: String },

    #[error("member not found: {0}")]
    MemberNotFound(String),

    #[error("no queued action for member '{member_id}' on criterion '{criterion_id}'")]
    ActionNotQueued {
        member_id: String,
        criterion_id: String,
    },

    /// Transport failure or server-side error; the same request may succeed later.
    #[error("status update failed: {0}")]
    StatusUpdate(String),

    /// The store refused the request; repeating it unchanged will not help.
    #[error("status update rejected: {0}")]
    StatusRejected(String),

    #[error("could not apply {action} to member '{member_id}' after {attempts} attempt(s): {reason}; the action is still queued")]
    ExecutionFailed {
        member_id: String,
        action: String,
        attempts: u32,
        reason: String,
        retryable: bool,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RosterError {
    /// True when the operator can retry the same request and expect it may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RosterError::StatusUpdate(_) => true,
            RosterError::ExecutionFailed { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
