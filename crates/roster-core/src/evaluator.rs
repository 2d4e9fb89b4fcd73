use crate::criteria::ComplianceCriterion;
use crate::snapshot::{Member, Measurement};
use crate::types::{ComparisonType, MemberAction, MemberStatus, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ---------------------------------------------------------------------------
// ProposedAction (output)
// ---------------------------------------------------------------------------

/// A pending, human-reviewable recommendation to change a member's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedAction {
    pub member_id: String,
    pub member_name: String,
    pub criterion_id: String,
    pub current_status: MemberStatus,
    pub proposed_action: MemberAction,
    pub reason: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl ProposedAction {
    pub fn targets(&self, member_id: &str, criterion_id: &str) -> bool {
        self.member_id == member_id && self.criterion_id == criterion_id
    }
}

/// Review order: most severe first, then member name, then criterion id.
pub fn review_order(a: &ProposedAction, b: &ProposedAction) -> Ordering {
    a.severity
        .cmp(&b.severity)
        .then_with(|| a.member_name.cmp(&b.member_name))
        .then_with(|| a.criterion_id.cmp(&b.criterion_id))
}

// ---------------------------------------------------------------------------
// Check table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Assessment {
    Compliant,
    Violation { reason: String },
    /// The measurement does not have the shape this check reads.
    Unreadable,
}

/// A fn-pointer check, one per comparison type.
pub struct Check {
    pub comparison: ComparisonType,
    pub assess: fn(&ComplianceCriterion, &Measurement) -> Assessment,
}

static CHECKS: &[Check] = &[
    Check {
        comparison: ComparisonType::PaymentDays,
        assess: payment_days,
    },
    Check {
        comparison: ComparisonType::HoursDeficit,
        assess: hours_deficit,
    },
    Check {
        comparison: ComparisonType::Percentage,
        assess: percentage,
    },
    Check {
        comparison: ComparisonType::ResponseDays,
        assess: response_days,
    },
];

pub fn check_for(comparison: ComparisonType) -> Option<&'static Check> {
    CHECKS.iter().find(|c| c.comparison == comparison)
}

/// Assess one measurement against one criterion, ignoring `enabled`.
pub fn assess(criterion: &ComplianceCriterion, measurement: &Measurement) -> Assessment {
    match check_for(criterion.comparison_type) {
        Some(check) => (check.assess)(criterion, measurement),
        None => Assessment::Unreadable,
    }
}

fn verdict(violated: bool, reason: impl FnOnce() -> String) -> Assessment {
    if violated {
        Assessment::Violation { reason: reason() }
    } else {
        Assessment::Compliant
    }
}

fn payment_days(c: &ComplianceCriterion, m: &Measurement) -> Assessment {
    let Measurement::PaymentDays { days_overdue } = m else {
        return Assessment::Unreadable;
    };
    verdict(f64::from(*days_overdue) > c.threshold, || {
        format!(
            "{} overdue by {} days (limit {})",
            c.display_label(),
            days_overdue,
            c.threshold
        )
    })
}

// The configured threshold feeds the `required` figure upstream; any deficit violates.
fn hours_deficit(c: &ComplianceCriterion, m: &Measurement) -> Assessment {
    let Measurement::HoursDeficit(hours) = m else {
        return Assessment::Unreadable;
    };
    verdict(hours.deficit() > 0.0, || {
        format!(
            "{} short by {} ({} of {} completed)",
            c.display_label(),
            hours.deficit(),
            hours.completed(),
            hours.required()
        )
    })
}

fn percentage(c: &ComplianceCriterion, m: &Measurement) -> Assessment {
    let Measurement::Percentage { percentage } = m else {
        return Assessment::Unreadable;
    };
    verdict(*percentage < c.threshold, || {
        format!(
            "{} at {}% (minimum {}%)",
            c.display_label(),
            percentage,
            c.threshold
        )
    })
}

fn response_days(c: &ComplianceCriterion, m: &Measurement) -> Assessment {
    let Measurement::ResponseDays { avg_response_time } = m else {
        return Assessment::Unreadable;
    };
    verdict(*avg_response_time > c.threshold, || {
        format!(
            "{} take {} days on average (limit {})",
            c.display_label(),
            avg_response_time,
            c.threshold
        )
    })
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Propose one action per (member, enabled criterion) pair in violation.
///
/// Pure over its inputs: `at` stamps every proposal, so two runs with the same
/// inputs and clock reading return equal proposals. Missing snapshots are
/// skipped. Criteria with an unrecognized comparison type, and snapshots
/// whose shape does not fit the criterion, are logged and treated as
/// compliant. The output is unordered; sort with [`review_order`]
/// for display.
pub fn evaluate(
    criteria: &[ComplianceCriterion],
    members: &[Member],
    at: DateTime<Utc>,
) -> Vec<ProposedAction> {
    let enabled: Vec<&ComplianceCriterion> = criteria
        .iter()
        .filter(|c| c.enabled)
        .filter(|c| {
            let known = check_for(c.comparison_type).is_some();
            if !known {
                tracing::warn!(
                    criterion = %c.id,
                    "comparison type is not recognized; skipping criterion"
                );
            }
            known
        })
        .collect();
    let mut proposals = Vec::new();

    for member in members {
        for criterion in &enabled {
            let Some(measurement) = member.snapshot(&criterion.id) else {
                tracing::debug!(
                    member = %member.id,
                    criterion = %criterion.id,
                    "no snapshot; skipping"
                );
                continue;
            };

            match assess(criterion, measurement) {
                Assessment::Compliant => {}
                Assessment::Violation { reason } => proposals.push(ProposedAction {
                    member_id: member.id.clone(),
                    member_name: member.name.clone(),
                    criterion_id: criterion.id.clone(),
                    current_status: member.status,
                    proposed_action: criterion.selected_action,
                    reason,
                    severity: criterion.severity,
                    timestamp: at,
                }),
                Assessment::Unreadable => {
                    tracing::warn!(
                        member = %member.id,
                        criterion = %criterion.id,
                        expected = %criterion.comparison_type,
                        found = measurement
                            .comparison_type()
                            .map(|c| c.as_str())
                            .unwrap_or("unrecognized"),
                        "snapshot shape does not match criterion; treating as compliant"
                    );
                }
            }
        }
    }

    tracing::debug!(
        members = members.len(),
        criteria = enabled.len(),
        proposals = proposals.len(),
        "evaluation complete"
    );
    proposals
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
