pub mod leave_request;

pub use leave_request::{LeaveQuery, MySqlLeaveStore};
