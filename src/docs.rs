use crate::api::leave_request::{
    AssignReplacement, CalendarEvent, CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse,
    RejectLeave,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Licencias API",
        version = "0.1.0",
        description = r#"
## Staff leave (licencia) service

Employees request leave over an inclusive date range; HR or an administrator approves or
rejects it. Approved leave for the same employee never overlaps, and employees currently on
approved leave are refused access.

### Life cycle
- **draft** → **pending** → **approved** | **rejected**
- drafts and pending requests can be **cancelled**
- requests flagged `requires_replacement` need a replacement employee before approval

### Security
All endpoints require a **JWT Bearer** access token.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::submit_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::assign_replacement,
        crate::api::leave_request::leave_calendar,
        crate::api::leave_request::business_days,
        crate::api::leave_request::on_leave
    ),
    components(
        schemas(
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            CreateLeave,
            RejectLeave,
            AssignReplacement,
            CalendarEvent
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request life cycle"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
