use crate::auth::auth::AuthUser;
use crate::leave::LeaveEngine;
use crate::model::leave_request::{
    DateRange, LeaveRequest, LeaveState, LeaveType, NewLeaveRequest,
};
use crate::repository::{LeaveQuery, MySqlLeaveStore};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "annual", value_type = String)]
    #[serde(default)]
    pub leave_type: LeaveType,
    #[schema(example = "Capacitación")]
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub requires_replacement: bool,
    #[schema(example = 1001)]
    pub replacement_employee_id: Option<u64>,
    /// Submit right away (default). Pass `false` to keep the request as a draft.
    #[schema(example = true)]
    pub submit: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    /// leave application id
    pub id: Option<u64>,
    /// employee id for whom the leave is applied
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-09", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = "pending")]
    pub status: String,
    pub reason: String,
    pub requires_replacement: bool,
    pub replacement_employee_id: Option<u64>,
    pub rejection_reason: Option<String>,
    /// user id of whoever approved or rejected the request
    pub decided_by: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub decided_at: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
    /// working days covered, holidays excluded
    #[schema(example = 5)]
    pub business_days: u32,
}

impl LeaveResponse {
    fn build(leave: &LeaveRequest, engine: &LeaveEngine) -> Self {
        Self {
            id: leave.id(),
            employee_id: leave.employee_id(),
            start_date: leave.start_date(),
            end_date: leave.end_date(),
            leave_type: leave.leave_type().to_string(),
            status: leave.state().to_string(),
            reason: leave.reason().to_string(),
            requires_replacement: leave.requires_replacement(),
            replacement_employee_id: leave.replacement_employee_id(),
            rejection_reason: leave.rejection_reason().map(str::to_string),
            decided_by: leave.decided_by(),
            decided_at: leave.decided_at(),
            created_at: leave.created_at(),
            business_days: engine.business_days_of(leave),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID (HR/Admin only)
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = "sick")]
    /// Filter by leave type
    pub leave_type: Option<String>,
    /// Leaves ending on or after this date
    pub from: Option<NaiveDate>,
    /// Leaves starting on or before this date
    pub to: Option<NaiveDate>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

impl LeaveFilter {
    /// `(page, per_page)` with defaults applied; `per_page` is capped at 100.
    fn paging(&self) -> (u64, u64) {
        let per_page = self.per_page.unwrap_or(10).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (page, per_page)
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = "No coverage available for those dates")]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AssignReplacement {
    #[schema(example = 1001)]
    pub employee_id: u64,
}

#[derive(Deserialize, IntoParams)]
pub struct CalendarQuery {
    /// Month as `YYYY-MM`; all approved leave when omitted
    pub month: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CalendarEvent {
    pub leave_id: Option<u64>,
    pub employee_id: u64,
    #[schema(format = "date", value_type = String)]
    pub start: NaiveDate,
    #[schema(format = "date", value_type = String)]
    pub end: NaiveDate,
    pub leave_type: String,
}

#[derive(Deserialize, IntoParams)]
pub struct BusinessDaysQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Deserialize, IntoParams)]
pub struct OnLeaveQuery {
    /// Day to check; today when omitted
    pub date: Option<NaiveDate>,
}

fn parse_month(month: &str) -> Option<DateRange> {
    let first = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").ok()?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    DateRange::new(first, last).ok()
}

async fn load(store: &MySqlLeaveStore, leave_id: u64) -> actix_web::Result<LeaveRequest> {
    store.get(leave_id).await?.ok_or_else(|| {
        actix_web::error::ErrorNotFound(serde_json::json!({
            "message": "Leave request not found"
        }))
    })
}

async fn persist(
    store: &MySqlLeaveStore,
    leave: &LeaveRequest,
    expected: LeaveState,
) -> actix_web::Result<()> {
    if store.save_transition(leave, expected).await? {
        Ok(())
    } else {
        Err(actix_web::error::ErrorConflict(serde_json::json!({
            "message": "Leave request was modified by another request"
        })))
    }
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(content = CreateLeave, content_type = "application/json"),
    responses(
        (status = 201, description = "Leave request created", body = LeaveResponse),
        (status = 400, description = "end_date before start_date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 409, description = "Overlaps an approved leave")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    store: web::Data<MySqlLeaveStore>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();

    let mut new = NewLeaveRequest::new(employee_id, payload.start_date, payload.end_date)
        .leave_type(payload.leave_type)
        .reason(payload.reason)
        .requires_replacement(payload.requires_replacement);
    if let Some(replacement) = payload.replacement_employee_id {
        new = new.replacement(replacement);
    }

    let mut leave = engine.create_leave_request(new).await?;
    if payload.submit.unwrap_or(true) {
        engine.submit(&mut leave)?;
    }
    let leave = store.insert(&leave).await?;

    Ok(HttpResponse::Created().json(LeaveResponse::build(&leave, &engine)))
}

/* =========================
Submit a draft (owner)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/submit",
    params(("leave_id" = u64, Path, description = "ID of the draft to submit")),
    responses(
        (status = 200, description = "Leave submitted", body = LeaveResponse),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request is not a draft")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn submit_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    store: web::Data<MySqlLeaveStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let mut leave = load(&store, path.into_inner()).await?;
    auth.require_owner_or_manager(leave.employee_id())?;

    let previous = leave.state();
    engine.submit(&mut leave)?;
    persist(&store, &leave, previous).await?;

    Ok(HttpResponse::Ok().json(LeaveResponse::build(&leave, &engine)))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "ID of the leave request to approve")),
    responses(
        (status = 200, description = "Leave approved", body = LeaveResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already processed or overlapping an approved leave"),
        (status = 422, description = "A replacement must be assigned first")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    store: web::Data<MySqlLeaveStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let mut leave = load(&store, path.into_inner()).await?;
    // the store flips the row and records the decider inside its locked transaction
    engine.approve(&mut leave, Some(auth.user_id)).await?;

    Ok(HttpResponse::Ok().json(LeaveResponse::build(&leave, &engine)))
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "ID of the leave request to reject")),
    request_body(content = RejectLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request is not pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    store: web::Data<MySqlLeaveStore>,
    path: web::Path<u64>,
    payload: Option<web::Json<RejectLeave>>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let mut leave = load(&store, path.into_inner()).await?;
    let previous = leave.state();
    let reason = payload.and_then(|p| p.into_inner().reason);
    engine.reject(&mut leave, Some(auth.user_id), reason)?;
    persist(&store, &leave, previous).await?;

    Ok(HttpResponse::Ok().json(LeaveResponse::build(&leave, &engine)))
}

/* =========================
Cancel leave (owner or HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(("leave_id" = u64, Path, description = "ID of the leave request to cancel")),
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveResponse),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Only drafts and pending requests can be cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    store: web::Data<MySqlLeaveStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let mut leave = load(&store, path.into_inner()).await?;
    auth.require_owner_or_manager(leave.employee_id())?;

    let previous = leave.state();
    engine.cancel(&mut leave)?;
    persist(&store, &leave, previous).await?;

    Ok(HttpResponse::Ok().json(LeaveResponse::build(&leave, &engine)))
}

/* =========================
Assign replacement
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/replacement",
    params(("leave_id" = u64, Path, description = "ID of the leave request")),
    request_body(content = AssignReplacement, content_type = "application/json"),
    responses(
        (status = 200, description = "Replacement assigned", body = LeaveResponse),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn assign_replacement(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    store: web::Data<MySqlLeaveStore>,
    path: web::Path<u64>,
    payload: web::Json<AssignReplacement>,
) -> actix_web::Result<impl Responder> {
    let mut leave = load(&store, path.into_inner()).await?;
    auth.require_owner_or_manager(leave.employee_id())?;

    let previous = leave.state();
    engine.assign_replacement(&mut leave, payload.employee_id)?;
    persist(&store, &leave, previous).await?;

    Ok(HttpResponse::Ok().json(LeaveResponse::build(&leave, &engine)))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "ID of the leave request to fetch")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    store: web::Data<MySqlLeaveStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = load(&store, path.into_inner()).await?;
    auth.require_owner_or_manager(leave.employee_id())?;

    Ok(HttpResponse::Ok().json(LeaveResponse::build(&leave, &engine)))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 400, description = "Unknown status or leave type"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    store: web::Data<MySqlLeaveStore>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let (page, per_page) = query.paging();

    let state = match query.status.as_deref() {
        Some(s) => Some(LeaveState::from_str(s).map_err(|_| {
            actix_web::error::ErrorBadRequest(serde_json::json!({
                "message": "Unknown leave status"
            }))
        })?),
        None => None,
    };
    let leave_type = match query.leave_type.as_deref() {
        Some(t) => Some(LeaveType::from_str(t).map_err(|_| {
            actix_web::error::ErrorBadRequest(serde_json::json!({
                "message": "Invalid leave type. Allowed: annual, sick, unpaid"
            }))
        })?),
        None => None,
    };

    // employees only ever see their own requests
    let employee_id = if auth.role.manages_leave() {
        query.employee_id
    } else {
        Some(auth.require_employee()?)
    };

    let filter = LeaveQuery {
        employee_id,
        state,
        leave_type,
        from: query.from,
        to: query.to,
    };
    let (leaves, total) = store.list(&filter, page, per_page).await?;

    let response = LeaveListResponse {
        data: leaves
            .iter()
            .map(|leave| LeaveResponse::build(leave, &engine))
            .collect(),
        page,
        per_page,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Approved leave laid out for a calendar view.
#[utoipa::path(
    get,
    path = "/api/leave/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Approved leave in the month", body = [CalendarEvent]),
        (status = 400, description = "month is not YYYY-MM")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_calendar(
    auth: AuthUser,
    store: web::Data<MySqlLeaveStore>,
    query: web::Query<CalendarQuery>,
) -> actix_web::Result<impl Responder> {
    let window = match query.month.as_deref() {
        Some(month) => Some(parse_month(month).ok_or_else(|| {
            actix_web::error::ErrorBadRequest(serde_json::json!({
                "message": "month must be formatted as YYYY-MM"
            }))
        })?),
        None => None,
    };

    let events: Vec<CalendarEvent> = store
        .approved_calendar(window)
        .await?
        .into_iter()
        .filter(|leave| auth.require_owner_or_manager(leave.employee_id()).is_ok())
        .map(|leave| CalendarEvent {
            leave_id: leave.id(),
            employee_id: leave.employee_id(),
            start: leave.start_date(),
            end: leave.end_date(),
            leave_type: leave.leave_type().to_string(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(events))
}

#[utoipa::path(
    get,
    path = "/api/leave/business-days",
    params(BusinessDaysQuery),
    responses((status = 200, description = "Working days in the inclusive range", body = Object)),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn business_days(
    _auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<BusinessDaysQuery>,
) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "start": query.start,
        "end": query.end,
        "business_days": engine.business_days(query.start, query.end)
    }))
}

#[utoipa::path(
    get,
    path = "/api/leave/on-leave/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee to check"),
        OnLeaveQuery
    ),
    responses((status = 200, description = "Whether an approved leave covers the date", body = Object)),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn on_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
    query: web::Query<OnLeaveQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_owner_or_manager(employee_id)?;

    let on_leave = engine.is_on_leave(employee_id, query.date).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "employee_id": employee_id,
        "date": query.date,
        "on_leave": on_leave
    })))
}
