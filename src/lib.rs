pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod leave;
pub mod model;
pub mod models;
pub mod repository;
pub mod routes;

pub use leave::{
    HolidayCalendar, InMemoryRangeStore, LeaveEngine, LeaveError, LeaveRangeStore, LeaveResult,
    business_days, has_overlap,
};
pub use model::leave_request::{DateRange, LeaveRequest, LeaveState, LeaveType, NewLeaveRequest};
