//! Transition rules for [`LeaveRequest`].
//!
//! ```text
//! Draft ──submit──▶ Pending ──reject──▶ Rejected
//!   │                  │
//!   ├──────approve─────┴──approve──▶ Approved
//!   └──cancel──▶ Cancelled ◀──cancel── Pending
//! ```
//!
//! Approved, Rejected and Cancelled are terminal. Approval itself needs the
//! range store and is driven by [`crate::leave::engine::LeaveEngine::approve`];
//! this module only holds the guards and the state mutation.

use chrono::Utc;

use crate::leave::error::{LeaveError, LeaveResult};
use crate::model::leave_request::{LeaveRequest, LeaveState};

fn invalid(request: &LeaveRequest, action: &'static str) -> LeaveError {
    LeaveError::InvalidTransition {
        from: request.state,
        action,
    }
}

pub fn submit(request: &mut LeaveRequest) -> LeaveResult<()> {
    if request.state != LeaveState::Draft {
        return Err(invalid(request, "submit"));
    }
    request.state = LeaveState::Pending;
    Ok(())
}

/// Guards checked before the store is asked to record the approval.
pub fn ensure_approvable(request: &LeaveRequest) -> LeaveResult<()> {
    if !matches!(request.state, LeaveState::Draft | LeaveState::Pending) {
        return Err(invalid(request, "approve"));
    }
    if request.requires_replacement && request.replacement_employee_id.is_none() {
        return Err(LeaveError::MissingReplacement);
    }
    Ok(())
}

/// Marks an already-recorded approval on the request itself.
pub(crate) fn mark_approved(request: &mut LeaveRequest, decided_by: Option<u64>) {
    request.state = LeaveState::Approved;
    request.decided_by = decided_by;
    request.decided_at = Some(Utc::now());
}

pub fn reject(
    request: &mut LeaveRequest,
    decided_by: Option<u64>,
    reason: Option<String>,
) -> LeaveResult<()> {
    if request.state != LeaveState::Pending {
        return Err(invalid(request, "reject"));
    }
    request.state = LeaveState::Rejected;
    request.rejection_reason = reason;
    request.decided_by = decided_by;
    request.decided_at = Some(Utc::now());
    Ok(())
}

pub fn cancel(request: &mut LeaveRequest) -> LeaveResult<()> {
    if !matches!(request.state, LeaveState::Draft | LeaveState::Pending) {
        return Err(invalid(request, "cancel"));
    }
    request.state = LeaveState::Cancelled;
    Ok(())
}

/// Last assignment wins. Terminal requests can no longer be changed.
pub fn assign_replacement(request: &mut LeaveRequest, employee_id: u64) -> LeaveResult<()> {
    if request.state.is_terminal() {
        return Err(invalid(request, "assign a replacement to"));
    }
    request.replacement_employee_id = Some(employee_id);
    Ok(())
}
