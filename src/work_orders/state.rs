//! Work order state machine.
//!
//! ```text
//! new -> in_progress -> {waiting_parts, on_hold} -> in_progress -> completed
//!   any non-terminal state -> cancelled
//! ```
//!
//! Planning is pure: [`plan_transition`] validates a move and computes the
//! fields it stamps, the caller writes them together with the status.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::WorkOrderStatus;

/// Whether `from -> to` is an accepted lifecycle move.
pub fn is_allowed(from: WorkOrderStatus, to: WorkOrderStatus) -> bool {
    use WorkOrderStatus::*;

    matches!(
        (from, to),
        (New, InProgress | Cancelled)
            | (InProgress, WaitingParts | OnHold | Completed | Cancelled)
            | (WaitingParts | OnHold, InProgress | Cancelled)
    )
}

/// Inputs needed to stamp a transition.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext {
    pub actor: Uuid,
    pub current_assignee: Option<Uuid>,
    pub now: DateTime<Utc>,
    /// Client supplied completion time
    pub completed_at_override: Option<DateTime<Utc>>,
    pub reassign_on_start: bool,
}

/// Field writes implied by a validated status move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub from: WorkOrderStatus,
    pub to: WorkOrderStatus,
    pub assigned_to: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Validate `from -> to` and compute its side effects.
///
/// Returns `Ok(None)` when the status does not change.
pub fn plan_transition(
    from: WorkOrderStatus,
    to: WorkOrderStatus,
    ctx: &TransitionContext,
) -> Result<Option<StatusChange>, DomainError> {
    if from == to {
        return Ok(None);
    }

    if !is_allowed(from, to) {
        return Err(DomainError::validation(
            "status",
            format!("cannot move a work order from {from} to {to}"),
        ));
    }

    let mut change = StatusChange {
        from,
        to,
        assigned_to: None,
        started_at: None,
        completed_by: None,
        completed_at: None,
    };

    match to {
        WorkOrderStatus::InProgress => {
            if ctx.reassign_on_start || ctx.current_assignee.is_none() {
                change.assigned_to = Some(ctx.actor);
            }
            change.started_at = Some(ctx.now);
        }
        WorkOrderStatus::Completed => {
            change.completed_by = Some(ctx.actor);
            change.completed_at = Some(ctx.completed_at_override.unwrap_or(ctx.now));
        }
        _ => {}
    }

    Ok(Some(change))
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkOrderStatus::*;
    use chrono::TimeZone;

    fn ctx(reassign_on_start: bool, current_assignee: Option<Uuid>) -> TransitionContext {
        TransitionContext {
            actor: Uuid::from_u128(7),
            current_assignee,
            now: Utc.with_ymd_and_hms(2024, 3, 4, 10, 30, 0).unwrap(),
            completed_at_override: None,
            reassign_on_start,
        }
    }

    #[test]
    fn transition_table() {
        let allowed = [
            (New, InProgress),
            (New, Cancelled),
            (InProgress, WaitingParts),
            (InProgress, OnHold),
            (InProgress, Completed),
            (InProgress, Cancelled),
            (WaitingParts, InProgress),
            (WaitingParts, Cancelled),
            (OnHold, InProgress),
            (OnHold, Cancelled),
        ];

        for &from in WorkOrderStatus::ALL {
            for &to in WorkOrderStatus::ALL {
                assert_eq!(
                    is_allowed(from, to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_are_final() {
        for &to in WorkOrderStatus::ALL {
            if to == Completed || to == Cancelled {
                continue;
            }
            for from in [Completed, Cancelled] {
                let err = plan_transition(from, to, &ctx(true, None)).unwrap_err();
                assert!(matches!(err, DomainError::Validation { field: "status", .. }));
            }
        }
        assert!(plan_transition(Completed, Cancelled, &ctx(true, None)).is_err());
        assert!(plan_transition(Cancelled, Completed, &ctx(true, None)).is_err());
    }

    #[test]
    fn same_status_is_a_no_op() {
        assert_eq!(plan_transition(Completed, Completed, &ctx(true, None)).unwrap(), None);
        assert_eq!(plan_transition(New, New, &ctx(true, None)).unwrap(), None);
    }

    #[test]
    fn skipping_in_progress_is_rejected() {
        assert!(plan_transition(New, Completed, &ctx(true, None)).is_err());
        assert!(plan_transition(New, OnHold, &ctx(true, None)).is_err());
    }

    #[test]
    fn start_assigns_actor_and_stamps_started_at() {
        let context = ctx(true, Some(Uuid::from_u128(1)));
        let change = plan_transition(New, InProgress, &context).unwrap().unwrap();
        assert_eq!(change.assigned_to, Some(context.actor));
        assert_eq!(change.started_at, Some(context.now));
        assert_eq!(change.completed_by, None);
    }

    #[test]
    fn start_keeps_assignee_when_reassignment_disabled() {
        let context = ctx(false, Some(Uuid::from_u128(1)));
        let change = plan_transition(OnHold, InProgress, &context).unwrap().unwrap();
        assert_eq!(change.assigned_to, None);
        assert_eq!(change.started_at, Some(context.now));

        let unassigned = ctx(false, None);
        let change = plan_transition(New, InProgress, &unassigned).unwrap().unwrap();
        assert_eq!(change.assigned_to, Some(unassigned.actor));
    }

    #[test]
    fn completion_uses_now_without_override() {
        let context = ctx(true, None);
        let change = plan_transition(InProgress, Completed, &context).unwrap().unwrap();
        assert_eq!(change.completed_by, Some(context.actor));
        assert_eq!(change.completed_at, Some(context.now));
        assert_eq!(change.assigned_to, None);
    }

    #[test]
    fn completion_honours_override() {
        let override_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let context = TransitionContext {
            completed_at_override: Some(override_at),
            ..ctx(true, None)
        };
        let change = plan_transition(InProgress, Completed, &context).unwrap().unwrap();
        assert_eq!(change.completed_by, Some(context.actor));
        assert_eq!(change.completed_at, Some(override_at));
    }
}
