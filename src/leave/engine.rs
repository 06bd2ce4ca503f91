use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::leave::calendar::{HolidayCalendar, business_days};
use crate::leave::error::{LeaveError, LeaveResult};
use crate::leave::overlap::find_overlap;
use crate::leave::registry::LeaveRangeStore;
use crate::leave::state_machine;
use crate::model::leave_request::{DateRange, LeaveRequest, NewLeaveRequest};

/// Entry point for the leave life cycle: owns the range store handle and the
/// holiday calendar used for business-day counts.
#[derive(Clone)]
pub struct LeaveEngine {
    store: Arc<dyn LeaveRangeStore>,
    holidays: HolidayCalendar,
}

impl LeaveEngine {
    pub fn new(store: Arc<dyn LeaveRangeStore>, holidays: HolidayCalendar) -> Self {
        Self { store, holidays }
    }

    /// Builds a draft, rejecting inverted ranges and ranges that clash with
    /// an approved leave of the same employee.
    pub async fn create_leave_request(
        &self,
        new: NewLeaveRequest,
    ) -> LeaveResult<LeaveRequest> {
        let request = LeaveRequest::draft(new)?;
        self.ensure_no_overlap(&request).await?;

        debug!(
            employee_id = request.employee_id(),
            start = %request.start_date(),
            end = %request.end_date(),
            "Leave request drafted"
        );
        Ok(request)
    }

    pub fn submit(&self, request: &mut LeaveRequest) -> LeaveResult<()> {
        state_machine::submit(request)?;
        info!(
            leave_id = ?request.id(),
            employee_id = request.employee_id(),
            "Leave request submitted"
        );
        Ok(())
    }

    /// Approves from Draft or Pending. The overlap check is repeated by the
    /// store while recording, since another request may have been approved
    /// after this one was created. The decider is written in the same step.
    pub async fn approve(
        &self,
        request: &mut LeaveRequest,
        decided_by: Option<u64>,
    ) -> LeaveResult<()> {
        state_machine::ensure_approvable(request)?;

        if let Err(e) = self.store.record_approval(request, decided_by).await {
            if let LeaveError::Overlap { start, end, .. } = &e {
                warn!(
                    leave_id = ?request.id(),
                    employee_id = request.employee_id(),
                    conflicting_start = %start,
                    conflicting_end = %end,
                    "Approval refused: overlapping approved leave"
                );
            }
            return Err(e);
        }

        state_machine::mark_approved(request, decided_by);
        info!(
            leave_id = ?request.id(),
            employee_id = request.employee_id(),
            decided_by = ?decided_by,
            "Leave request approved"
        );
        Ok(())
    }

    pub fn reject(
        &self,
        request: &mut LeaveRequest,
        decided_by: Option<u64>,
        reason: Option<String>,
    ) -> LeaveResult<()> {
        state_machine::reject(request, decided_by, reason)?;
        info!(
            leave_id = ?request.id(),
            employee_id = request.employee_id(),
            "Leave request rejected"
        );
        Ok(())
    }

    pub fn cancel(&self, request: &mut LeaveRequest) -> LeaveResult<()> {
        state_machine::cancel(request)?;
        info!(
            leave_id = ?request.id(),
            employee_id = request.employee_id(),
            "Leave request cancelled"
        );
        Ok(())
    }

    pub fn assign_replacement(
        &self,
        request: &mut LeaveRequest,
        employee_id: u64,
    ) -> LeaveResult<()> {
        state_machine::assign_replacement(request, employee_id)?;
        debug!(leave_id = ?request.id(), replacement = employee_id, "Replacement assigned");
        Ok(())
    }

    /// Working days covered by the request under the configured holidays.
    pub fn business_days_of(&self, request: &LeaveRequest) -> u32 {
        self.business_days(request.start_date(), request.end_date())
    }

    pub fn business_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        business_days(start, end, Some(&self.holidays))
    }

    /// Whether the employee has approved leave covering `on` (today when `None`).
    pub async fn is_on_leave(
        &self,
        employee_id: u64,
        on: Option<NaiveDate>,
    ) -> LeaveResult<bool> {
        let on = on.unwrap_or_else(|| Local::now().date_naive());
        self.store.is_on_leave(employee_id, on).await
    }

    pub async fn ranges_for(&self, employee_id: u64) -> LeaveResult<Vec<DateRange>> {
        self.store.ranges_for(employee_id).await
    }

    async fn ensure_no_overlap(&self, request: &LeaveRequest) -> LeaveResult<()> {
        let approved = self.store.ranges_for(request.employee_id()).await?;
        match find_overlap(&request.range(), &approved) {
            Some(existing) => {
                warn!(
                    employee_id = request.employee_id(),
                    conflicting_start = %existing.start(),
                    conflicting_end = %existing.end(),
                    "Leave request overlaps an approved leave"
                );
                Err(LeaveError::Overlap {
                    employee_id: request.employee_id(),
                    start: existing.start(),
                    end: existing.end(),
                })
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::registry::InMemoryRangeStore;
    use crate::model::leave_request::LeaveState;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn engine() -> LeaveEngine {
        LeaveEngine::new(Arc::new(InMemoryRangeStore::new()), HolidayCalendar::new())
    }

    #[tokio::test]
    async fn test_failed_approval_leaves_state_untouched() {
        let engine = engine();
        let mut first = engine
            .create_leave_request(NewLeaveRequest::new(1, d(4, 1), d(4, 10)))
            .await
            .unwrap();
        let mut second = engine
            .create_leave_request(NewLeaveRequest::new(1, d(4, 8), d(4, 12)))
            .await
            .unwrap();
        engine.submit(&mut second).unwrap();

        engine.approve(&mut first, Some(99)).await.unwrap();
        assert_eq!(first.decided_by(), Some(99));

        let err = engine.approve(&mut second, Some(99)).await.unwrap_err();
        assert!(matches!(err, LeaveError::Overlap { .. }));
        assert_eq!(second.state(), LeaveState::Pending);
        assert!(second.decided_at().is_none());
    }

    /// Remembers the decider each approval was recorded with.
    #[derive(Default)]
    struct DeciderLog {
        inner: InMemoryRangeStore,
        deciders: std::sync::Mutex<Vec<Option<u64>>>,
    }

    #[async_trait::async_trait]
    impl LeaveRangeStore for DeciderLog {
        async fn ranges_for(&self, employee_id: u64) -> LeaveResult<Vec<DateRange>> {
            self.inner.ranges_for(employee_id).await
        }

        async fn record_approval(
            &self,
            request: &LeaveRequest,
            decided_by: Option<u64>,
        ) -> LeaveResult<()> {
            self.inner.record_approval(request, decided_by).await?;
            self.deciders.lock().unwrap().push(decided_by);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_records_decider_with_approval() {
        let store = Arc::new(DeciderLog::default());
        let engine = LeaveEngine::new(store.clone(), HolidayCalendar::new());
        let mut request = engine
            .create_leave_request(NewLeaveRequest::new(1, d(5, 1), d(5, 3)))
            .await
            .unwrap();

        engine.approve(&mut request, Some(42)).await.unwrap();

        assert_eq!(*store.deciders.lock().unwrap(), vec![Some(42)]);
        assert_eq!(request.decided_by(), Some(42));
    }

    #[tokio::test]
    async fn test_refused_approval_records_no_decider() {
        let store = Arc::new(DeciderLog::default());
        let engine = LeaveEngine::new(store.clone(), HolidayCalendar::new());
        let mut first = engine
            .create_leave_request(NewLeaveRequest::new(1, d(5, 1), d(5, 3)))
            .await
            .unwrap();
        let mut second = engine
            .create_leave_request(NewLeaveRequest::new(1, d(5, 3), d(5, 6)))
            .await
            .unwrap();

        engine.approve(&mut first, Some(42)).await.unwrap();
        engine.approve(&mut second, Some(7)).await.unwrap_err();

        assert_eq!(*store.deciders.lock().unwrap(), vec![Some(42)]);
        assert!(second.decided_by().is_none());
    }

    #[tokio::test]
    async fn test_business_days_use_configured_holidays() {
        let holidays: HolidayCalendar = [d(1, 1)].into_iter().collect();
        let engine = LeaveEngine::new(Arc::new(InMemoryRangeStore::new()), holidays);
        let request = engine
            .create_leave_request(NewLeaveRequest::new(1, d(1, 1), d(1, 10)))
            .await
            .unwrap();
        assert_eq!(engine.business_days_of(&request), 7);
    }
}
