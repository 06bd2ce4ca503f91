use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};

use crate::leave::error::{LeaveError, LeaveResult};
use crate::leave::overlap::find_overlap;
use crate::leave::registry::LeaveRangeStore;
use crate::model::leave_request::{DateRange, LeaveRequest, LeaveState, LeaveType};

const SELECT_COLUMNS: &str = r#"
    SELECT id, employee_id, start_date, end_date, leave_type, reason, status,
           requires_replacement, replacement_employee_id, rejection_reason,
           decided_by, decided_at, created_at
    FROM leave_requests
"#;

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_type: String,
    reason: String,
    status: String,
    requires_replacement: bool,
    replacement_employee_id: Option<u64>,
    rejection_reason: Option<String>,
    decided_by: Option<u64>,
    decided_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = LeaveError;

    fn try_from(row: LeaveRow) -> LeaveResult<Self> {
        let state = LeaveState::from_str(&row.status)
            .map_err(|_| LeaveError::Store(format!("unknown leave status '{}'", row.status)))?;
        let leave_type = LeaveType::from_str(&row.leave_type)
            .map_err(|_| LeaveError::Store(format!("unknown leave type '{}'", row.leave_type)))?;

        Ok(LeaveRequest {
            id: Some(row.id),
            employee_id: row.employee_id,
            range: DateRange::new(row.start_date, row.end_date)?,
            leave_type,
            reason: row.reason,
            state,
            requires_replacement: row.requires_replacement,
            replacement_employee_id: row.replacement_employee_id,
            rejection_reason: row.rejection_reason,
            decided_by: row.decided_by,
            decided_at: row.decided_at,
            created_at: row.created_at,
        })
    }
}

/// List filters; every field is optional.
#[derive(Debug, Default, Clone)]
pub struct LeaveQuery {
    pub employee_id: Option<u64>,
    pub state: Option<LeaveState>,
    pub leave_type: Option<LeaveType>,
    /// Keep requests whose range intersects `[from, to]`.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(&'static str),
    Date(NaiveDate),
}

impl LeaveQuery {
    fn where_clause(&self) -> (String, Vec<FilterValue>) {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args = Vec::new();

        if let Some(employee_id) = self.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }
        if let Some(state) = self.state {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(state.into()));
        }
        if let Some(leave_type) = self.leave_type {
            where_sql.push_str(" AND leave_type = ?");
            args.push(FilterValue::Str(leave_type.into()));
        }
        if let Some(from) = self.from {
            where_sql.push_str(" AND end_date >= ?");
            args.push(FilterValue::Date(from));
        }
        if let Some(to) = self.to {
            where_sql.push_str(" AND start_date <= ?");
            args.push(FilterValue::Date(to));
        }

        (where_sql, args)
    }
}

/// `leave_requests` rows are the source of truth for approved ranges.
#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Inserts a new request and returns it with its assigned id.
    pub async fn insert(&self, request: &LeaveRequest) -> LeaveResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, start_date, end_date, leave_type, reason, status,
                 requires_replacement, replacement_employee_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.range.start())
        .bind(request.range.end())
        .bind(request.leave_type.as_ref())
        .bind(&request.reason)
        .bind(request.state.as_ref())
        .bind(request.requires_replacement)
        .bind(request.replacement_employee_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                employee_id = request.employee_id,
                "Failed to insert leave request"
            );
            LeaveError::from(e)
        })?;

        let id = result.last_insert_id();
        self.get(id)
            .await?
            .ok_or_else(|| LeaveError::Store(format!("leave request {id} vanished after insert")))
    }

    pub async fn get(&self, id: u64) -> LeaveResult<Option<LeaveRequest>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, leave_id = id, "Failed to fetch leave request");
                LeaveError::from(e)
            })?;

        row.map(LeaveRequest::try_from).transpose()
    }

    /// Persists a transition made in memory. The update only applies while the
    /// row is still in `expected`; returns false when another writer got there first.
    pub async fn save_transition(
        &self,
        request: &LeaveRequest,
        expected: LeaveState,
    ) -> LeaveResult<bool> {
        let id = persisted_id(request)?;
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, replacement_employee_id = ?, rejection_reason = ?,
                decided_by = ?, decided_at = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(request.state.as_ref())
        .bind(request.replacement_employee_id)
        .bind(&request.rejection_reason)
        .bind(request.decided_by)
        .bind(request.decided_at)
        .bind(id)
        .bind(expected.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id = id, "Failed to save leave transition");
            LeaveError::from(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// One page of requests, newest first, plus the total match count.
    pub async fn list(
        &self,
        query: &LeaveQuery,
        page: u64,
        per_page: u64,
    ) -> LeaveResult<(Vec<LeaveRequest>, i64)> {
        let (where_sql, args) = query.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
                FilterValue::Date(d) => count_q.bind(*d),
            };
        }
        let total = count_q.fetch_one(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to count leave requests");
            LeaveError::from(e)
        })?;

        let data_sql = format!(
            "{SELECT_COLUMNS}{} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            where_sql
        );
        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
                FilterValue::Date(d) => data_q.bind(d),
            };
        }
        let offset = page_offset(page, per_page);
        let rows = data_q
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch leave list");
                LeaveError::from(e)
            })?;

        let leaves = rows
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<LeaveResult<Vec<_>>>()?;
        Ok((leaves, total))
    }

    /// Approved requests intersecting `window` (all approved when `None`), by start date.
    pub async fn approved_calendar(
        &self,
        window: Option<DateRange>,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        let query = LeaveQuery {
            state: Some(LeaveState::Approved),
            from: window.map(|w| w.start()),
            to: window.map(|w| w.end()),
            ..LeaveQuery::default()
        };
        let (where_sql, args) = query.where_clause();
        let sql = format!("{SELECT_COLUMNS}{} ORDER BY start_date", where_sql);

        let mut q = sqlx::query_as::<_, LeaveRow>(&sql);
        for arg in args {
            q = match arg {
                FilterValue::U64(v) => q.bind(v),
                FilterValue::Str(s) => q.bind(s),
                FilterValue::Date(d) => q.bind(d),
            };
        }
        let rows = q.fetch_all(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch leave calendar");
            LeaveError::from(e)
        })?;

        rows.into_iter().map(LeaveRequest::try_from).collect()
    }
}

/// Rows to skip for a 1-based page; saturates instead of wrapping on huge pages.
fn page_offset(page: u64, per_page: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(per_page)
}

fn persisted_id(request: &LeaveRequest) -> LeaveResult<u64> {
    request
        .id
        .ok_or_else(|| LeaveError::Store("leave request has not been persisted".into()))
}

#[async_trait]
impl LeaveRangeStore for MySqlLeaveStore {
    async fn ranges_for(&self, employee_id: u64) -> LeaveResult<Vec<DateRange>> {
        let rows = sqlx::query_as::<_, (NaiveDate, NaiveDate)>(
            r#"
            SELECT start_date, end_date
            FROM leave_requests
            WHERE employee_id = ?
            AND status = 'approved'
            ORDER BY decided_at, id
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(start, end)| DateRange::new(start, end))
            .collect()
    }

    /// Locks the request row and the employee's approved rows, re-checks
    /// overlap and flips the row to approved, decider included, in one transaction.
    async fn record_approval(
        &self,
        request: &LeaveRequest,
        decided_by: Option<u64>,
    ) -> LeaveResult<()> {
        let id = persisted_id(request)?;
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, String>(
            "SELECT status FROM leave_requests WHERE id = ? FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| LeaveError::Store(format!("leave request {id} not found")))?;

        let current = LeaveState::from_str(&status)
            .map_err(|_| LeaveError::Store(format!("unknown leave status '{status}'")))?;
        if !matches!(current, LeaveState::Draft | LeaveState::Pending) {
            return Err(LeaveError::InvalidTransition {
                from: current,
                action: "approve",
            });
        }

        let approved = sqlx::query_as::<_, (NaiveDate, NaiveDate)>(
            r#"
            SELECT start_date, end_date
            FROM leave_requests
            WHERE employee_id = ?
            AND status = 'approved'
            FOR UPDATE
            "#,
        )
        .bind(request.employee_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(start, end)| DateRange::new(start, end))
        .collect::<LeaveResult<Vec<_>>>()?;

        if let Some(existing) = find_overlap(&request.range, &approved) {
            return Err(LeaveError::Overlap {
                employee_id: request.employee_id,
                start: existing.start(),
                end: existing.end(),
            });
        }

        sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = 'approved', replacement_employee_id = ?,
                decided_by = ?, decided_at = UTC_TIMESTAMP()
            WHERE id = ?
            "#,
        )
        .bind(request.replacement_employee_id)
        .bind(decided_by)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn is_on_leave(&self, employee_id: u64, on: NaiveDate) -> LeaveResult<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM leave_requests
                WHERE employee_id = ?
                AND status = 'approved'
                AND start_date <= ?
                AND end_date >= ?
            )
            "#,
        )
        .bind(employee_id)
        .bind(on)
        .bind(on)
        .fetch_one(&self.pool)
        .await?;

        Ok(found > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_orders_binds() {
        let query = LeaveQuery {
            employee_id: Some(7),
            state: Some(LeaveState::Pending),
            from: NaiveDate::from_ymd_opt(2024, 2, 1),
            ..LeaveQuery::default()
        };
        let (sql, args) = query.where_clause();
        assert_eq!(sql, " WHERE 1=1 AND employee_id = ? AND status = ? AND end_date >= ?");
        assert!(matches!(args[0], FilterValue::U64(7)));
        assert!(matches!(args[1], FilterValue::Str("pending")));
        assert!(matches!(args[2], FilterValue::Date(_)));
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(0, 10), 0);
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 25), 50);
        assert_eq!(page_offset(u64::MAX, 100), u64::MAX);
    }

    #[test]
    fn test_row_with_unknown_status_is_a_store_error() {
        let row = LeaveRow {
            id: 1,
            employee_id: 1,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            leave_type: "annual".into(),
            reason: String::new(),
            status: "archived".into(),
            requires_replacement: false,
            replacement_employee_id: None,
            rejection_reason: None,
            decided_by: None,
            decided_at: None,
            created_at: None,
        };
        assert!(matches!(LeaveRequest::try_from(row), Err(LeaveError::Store(_))));
    }
}
