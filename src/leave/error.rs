use chrono::NaiveDate;
use thiserror::Error;

use crate::model::leave_request::LeaveState;

#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("end_date {end} cannot be before start_date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("leave for employee {employee_id} overlaps an approved leave ({start} to {end})")]
    Overlap {
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("cannot {action} a leave request in state {from}")]
    InvalidTransition {
        from: LeaveState,
        action: &'static str,
    },

    #[error("a replacement employee must be assigned before approval")]
    MissingReplacement,

    #[error("leave store error: {0}")]
    Store(String),
}

impl From<sqlx::Error> for LeaveError {
    fn from(e: sqlx::Error) -> Self {
        LeaveError::Store(e.to_string())
    }
}

pub type LeaveResult<T> = Result<T, LeaveError>;
