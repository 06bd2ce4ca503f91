pub mod calendar;
pub mod engine;
pub mod error;
pub mod overlap;
pub mod registry;
pub mod state_machine;

pub use calendar::{HolidayCalendar, business_days};
pub use engine::LeaveEngine;
pub use error::{LeaveError, LeaveResult};
pub use overlap::has_overlap;
pub use registry::{InMemoryRangeStore, LeaveRangeStore};
