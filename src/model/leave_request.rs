use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::leave::error::{LeaveError, LeaveResult};

/// Inclusive calendar range. `end >= start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    #[serde(rename = "start_date")]
    start: NaiveDate,
    #[serde(rename = "end_date")]
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> LeaveResult<Self> {
        if end < start {
            return Err(LeaveError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Two inclusive ranges overlap iff `max(starts) <= min(ends)`.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start.max(other.start) <= self.end.min(other.end)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveState {
    Draft,
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LeaveState::Approved | LeaveState::Rejected | LeaveState::Cancelled
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    #[default]
    Annual,
    Sick,
    Unpaid,
}

/// Input for creating a leave request.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: LeaveType,
    pub reason: String,
    pub requires_replacement: bool,
    pub replacement_employee_id: Option<u64>,
}

impl NewLeaveRequest {
    pub fn new(employee_id: u64, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            employee_id,
            start_date,
            end_date,
            leave_type: LeaveType::default(),
            reason: String::new(),
            requires_replacement: false,
            replacement_employee_id: None,
        }
    }

    pub fn requires_replacement(mut self, required: bool) -> Self {
        self.requires_replacement = required;
        self
    }

    pub fn replacement(mut self, employee_id: u64) -> Self {
        self.replacement_employee_id = Some(employee_id);
        self
    }

    pub fn leave_type(mut self, leave_type: LeaveType) -> Self {
        self.leave_type = leave_type;
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// One employee's leave request. Lifecycle changes go through
/// [`crate::leave::state_machine`]; fields are only readable from outside the crate.
#[derive(Debug, Clone, Serialize)]
pub struct LeaveRequest {
    pub(crate) id: Option<u64>,
    pub(crate) employee_id: u64,
    #[serde(flatten)]
    pub(crate) range: DateRange,
    pub(crate) leave_type: LeaveType,
    pub(crate) reason: String,
    pub(crate) state: LeaveState,
    pub(crate) requires_replacement: bool,
    pub(crate) replacement_employee_id: Option<u64>,
    pub(crate) rejection_reason: Option<String>,
    pub(crate) decided_by: Option<u64>,
    pub(crate) decided_at: Option<DateTime<Utc>>,
    pub(crate) created_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    /// Builds a draft. Only the range invariant is checked here; the overlap
    /// check needs a store and lives in [`crate::leave::engine::LeaveEngine`].
    pub(crate) fn draft(new: NewLeaveRequest) -> LeaveResult<Self> {
        let range = DateRange::new(new.start_date, new.end_date)?;
        Ok(Self {
            id: None,
            employee_id: new.employee_id,
            range,
            leave_type: new.leave_type,
            reason: new.reason,
            state: LeaveState::Draft,
            requires_replacement: new.requires_replacement,
            replacement_employee_id: new.replacement_employee_id,
            rejection_reason: None,
            decided_by: None,
            decided_at: None,
            created_at: None,
        })
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn employee_id(&self) -> u64 {
        self.employee_id
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn start_date(&self) -> NaiveDate {
        self.range.start()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.range.end()
    }

    pub fn leave_type(&self) -> LeaveType {
        self.leave_type
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn state(&self) -> LeaveState {
        self.state
    }

    pub fn requires_replacement(&self) -> bool {
        self.requires_replacement
    }

    pub fn replacement_employee_id(&self) -> Option<u64> {
        self.replacement_employee_id
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn decided_by(&self) -> Option<u64> {
        self.decided_by
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_range_rejects_end_before_start() {
        let err = DateRange::new(d(2024, 1, 10), d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, LeaveError::InvalidRange { .. }));
    }

    #[test]
    fn test_single_day_range_is_valid() {
        let range = DateRange::new(d(2024, 1, 1), d(2024, 1, 1)).unwrap();
        assert!(range.contains(d(2024, 1, 1)));
        assert!(!range.contains(d(2024, 1, 2)));
    }

    #[test]
    fn test_overlap_shares_boundary_day() {
        let a = DateRange::new(d(2024, 2, 1), d(2024, 2, 10)).unwrap();
        let b = DateRange::new(d(2024, 2, 10), d(2024, 2, 15)).unwrap();
        let c = DateRange::new(d(2024, 2, 11), d(2024, 2, 15)).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_state_strings() {
        assert_eq!(LeaveState::Pending.as_ref(), "pending");
        assert_eq!(LeaveState::from_str("approved").unwrap(), LeaveState::Approved);
        assert_eq!(LeaveType::from_str("sick").unwrap(), LeaveType::Sick);
        assert!(LeaveType::from_str("sabbatical").is_err());
    }

    #[test]
    fn test_draft_starts_in_draft() {
        let request = LeaveRequest::draft(
            NewLeaveRequest::new(1, d(2024, 1, 1), d(2024, 1, 10)).reason("Trámite"),
        )
        .unwrap();
        assert_eq!(request.state(), LeaveState::Draft);
        assert_eq!(request.reason(), "Trámite");
        assert_eq!(request.leave_type(), LeaveType::Annual);
        assert!(request.id().is_none());
    }
}
