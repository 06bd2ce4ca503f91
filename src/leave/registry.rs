use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::leave::error::{LeaveError, LeaveResult};
use crate::leave::overlap::find_overlap;
use crate::model::leave_request::{DateRange, LeaveRequest};

/// Per-employee index of approved leave ranges.
///
/// Implementations must make `record_approval` atomic with respect to other
/// approvals for the same employee: the overlap re-check and the insert happen
/// under one lock or transaction, so two clashing ranges can never both land.
#[async_trait]
pub trait LeaveRangeStore: Send + Sync {
    /// Approved ranges for the employee, in approval order.
    async fn ranges_for(&self, employee_id: u64) -> LeaveResult<Vec<DateRange>>;

    /// Re-checks overlap and records the request's range as approved, along
    /// with whoever decided it.
    async fn record_approval(
        &self,
        request: &LeaveRequest,
        decided_by: Option<u64>,
    ) -> LeaveResult<()>;

    async fn is_on_leave(&self, employee_id: u64, on: NaiveDate) -> LeaveResult<bool> {
        let ranges = self.ranges_for(employee_id).await?;
        Ok(ranges.iter().any(|r| r.contains(on)))
    }
}

/// Process-local store. Ranges are never removed or merged.
#[derive(Debug, Default)]
pub struct InMemoryRangeStore {
    ranges: Mutex<HashMap<u64, Vec<DateRange>>>,
}

impl InMemoryRangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from already-approved ranges, e.g. after a restart.
    pub fn with_approved<I>(approved: I) -> Self
    where
        I: IntoIterator<Item = (u64, DateRange)>,
    {
        let mut ranges: HashMap<u64, Vec<DateRange>> = HashMap::new();
        for (employee_id, range) in approved {
            ranges.entry(employee_id).or_default().push(range);
        }
        Self {
            ranges: Mutex::new(ranges),
        }
    }

    fn lock(&self) -> LeaveResult<std::sync::MutexGuard<'_, HashMap<u64, Vec<DateRange>>>> {
        self.ranges
            .lock()
            .map_err(|_| LeaveError::Store("approved range registry lock poisoned".into()))
    }
}

#[async_trait]
impl LeaveRangeStore for InMemoryRangeStore {
    async fn ranges_for(&self, employee_id: u64) -> LeaveResult<Vec<DateRange>> {
        Ok(self.lock()?.get(&employee_id).cloned().unwrap_or_default())
    }

    async fn record_approval(
        &self,
        request: &LeaveRequest,
        _decided_by: Option<u64>,
    ) -> LeaveResult<()> {
        let mut ranges = self.lock()?;
        let employee_ranges = ranges.entry(request.employee_id()).or_default();
        if let Some(existing) = find_overlap(&request.range(), employee_ranges.iter()) {
            return Err(LeaveError::Overlap {
                employee_id: request.employee_id(),
                start: existing.start(),
                end: existing.end(),
            });
        }
        employee_ranges.push(request.range());
        Ok(())
    }
}
