//! The criteria registry: configurable compliance rules.
//!
//! Criteria are edited by an operator ahead of a scan. Every edit goes through
//! [`apply_update`], which validates the edited copy before committing it, so
//! an inconsistent criterion never reaches the registry.

use crate::error::{Result, RosterError};
use crate::paths;
use crate::types::{ComparisonType, MemberAction, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// ComplianceCriterion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCriterion {
    pub id: String,
    /// Short display name used in reason text, e.g. "Dues".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub comparison_type: ComparisonType,
    pub threshold: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub severity: Severity,
    pub allowed_actions: Vec<MemberAction>,
    pub selected_action: MemberAction,
}

fn default_enabled() -> bool {
    true
}

impl ComplianceCriterion {
    pub fn new(
        id: impl Into<String>,
        comparison_type: ComparisonType,
        threshold: f64,
        severity: Severity,
        selected_action: MemberAction,
    ) -> Self {
        Self {
            id: id.into(),
            label: None,
            description: None,
            comparison_type,
            threshold,
            enabled: true,
            severity,
            allowed_actions: comparison_type.permitted_actions().to_vec(),
            selected_action,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The label if set, otherwise the id with underscores turned into spaces
    /// and the first letter capitalized.
    pub fn display_label(&self) -> String {
        if let Some(ref label) = self.label {
            return label.clone();
        }
        let spaced = self.id.replace(['_', '-'], " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Every consistency problem with this criterion, empty when valid.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if let Err(e) = paths::validate_id(&self.id) {
            problems.push(e.to_string());
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            problems.push(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            ));
        }
        if self.comparison_type == ComparisonType::Percentage && self.threshold > 100.0 {
            problems.push(format!(
                "percentage threshold must be at most 100, got {}",
                self.threshold
            ));
        }
        if self.allowed_actions.is_empty() {
            problems.push("allowed_actions must not be empty".to_string());
        }
        if self.comparison_type == ComparisonType::Unknown {
            problems.push(
                "comparison_type is not recognized; the criterion is skipped during scans"
                    .to_string(),
            );
        } else {
            let permitted = self.comparison_type.permitted_actions();
            for action in &self.allowed_actions {
                if !permitted.contains(action) {
                    problems.push(format!(
                        "action '{action}' is not permitted for {} criteria",
                        self.comparison_type
                    ));
                }
            }
        }
        if !self.allowed_actions.contains(&self.selected_action) {
            problems.push(format!(
                "selected action '{}' is not one of the allowed actions",
                self.selected_action
            ));
        }

        problems
    }

    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(RosterError::InvalidCriterion {
                id: self.id.clone(),
                reason: problems.join("; "),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Registry helpers
// ---------------------------------------------------------------------------

/// The registry a freshly initialized organization starts with.
pub fn default_criteria() -> Vec<ComplianceCriterion> {
    let mut profile = ComplianceCriterion::new(
        "profile_completeness",
        ComparisonType::Percentage,
        80.0,
        Severity::Low,
        MemberAction::Warning,
    )
    .with_label("Profile completeness");
    profile.enabled = false;

    vec![
        ComplianceCriterion::new(
            "dues_payment",
            ComparisonType::PaymentDays,
            90.0,
            Severity::High,
            MemberAction::Probation,
        )
        .with_label("Dues"),
        ComplianceCriterion::new(
            "service_hours",
            ComparisonType::HoursDeficit,
            20.0,
            Severity::Medium,
            MemberAction::Warning,
        )
        .with_label("Service hours"),
        ComplianceCriterion::new(
            "event_attendance",
            ComparisonType::Percentage,
            60.0,
            Severity::Medium,
            MemberAction::Warning,
        )
        .with_label("Event attendance"),
        ComplianceCriterion::new(
            "communication_response",
            ComparisonType::ResponseDays,
            7.0,
            Severity::Low,
            MemberAction::Warning,
        )
        .with_label("Responses"),
        profile,
    ]
}

pub fn find<'a>(criteria: &'a [ComplianceCriterion], id: &str) -> Result<&'a ComplianceCriterion> {
    criteria
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| RosterError::CriterionNotFound(id.to_string()))
}

/// Ids that appear more than once, in first-seen order.
pub fn duplicate_ids(criteria: &[ComplianceCriterion]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dups = Vec::new();
    for c in criteria {
        if !seen.insert(c.id.as_str()) && !dups.contains(&c.id) {
            dups.push(c.id.clone());
        }
    }
    dups
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

/// A partial edit to one criterion. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct CriterionUpdate {
    pub enabled: Option<bool>,
    pub threshold: Option<f64>,
    pub severity: Option<Severity>,
    pub allowed_actions: Option<Vec<MemberAction>>,
    pub selected_action: Option<MemberAction>,
    pub label: Option<String>,
}

impl CriterionUpdate {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.threshold.is_none()
            && self.severity.is_none()
            && self.allowed_actions.is_none()
            && self.selected_action.is_none()
            && self.label.is_none()
    }
}

/// Apply `update` to the criterion `id`. The registry is left unchanged when
/// the edited criterion fails validation.
pub fn apply_update<'a>(
    criteria: &'a mut [ComplianceCriterion],
    id: &str,
    update: &CriterionUpdate,
) -> Result<&'a ComplianceCriterion> {
    let slot = criteria
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| RosterError::CriterionNotFound(id.to_string()))?;

    let mut edited = slot.clone();
    if let Some(enabled) = update.enabled {
        edited.enabled = enabled;
    }
    if let Some(threshold) = update.threshold {
        edited.threshold = threshold;
    }
    if let Some(severity) = update.severity {
        edited.severity = severity;
    }
    if let Some(ref allowed) = update.allowed_actions {
        edited.allowed_actions = allowed.clone();
    }
    if let Some(action) = update.selected_action {
        edited.selected_action = action;
    }
    if let Some(ref label) = update.label {
        edited.label = Some(label.clone());
    }

    edited.validate()?;
    *slot = edited;
    Ok(slot)
}
