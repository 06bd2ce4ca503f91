use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::leave::LeaveEngine;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

/// Authenticates the bearer token and refuses employees who are currently on
/// approved leave.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => h.to_str().map_err(|_| {
            actix_web::error::ErrorUnauthorized(
                json!({"error": "Invalid Authorization header encoding"}),
            )
        })?,
        None => {
            let resp =
                HttpResponse::Unauthorized().json(json!({"error": "Missing Authorization header"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t,
        None => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"error": "Authorization header must start with Bearer"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"error": "Invalid or expired token", "details": e}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let role = match Role::from_id(claims.role) {
        Some(role) => role,
        None => {
            let resp =
                HttpResponse::Unauthorized().json(json!({"error": "Invalid role"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    if let (Some(employee_id), false) = (claims.employee_id, role.bypasses_leave_gate()) {
        let engine = req
            .app_data::<Data<LeaveEngine>>()
            .cloned()
            .ok_or_else(|| actix_web::error::ErrorInternalServerError("Leave engine missing"))?;

        match engine.is_on_leave(employee_id, None).await {
            Ok(false) => {}
            Ok(true) => {
                tracing::info!(employee_id, "Access denied: active approved leave");
                let resp = HttpResponse::Forbidden()
                    .json(json!({"error": "Access denied: active approved leave"}));
                return Ok(req.into_response(resp.map_into_boxed_body()));
            }
            Err(e) => {
                tracing::error!(error = %e, employee_id, "Leave gate lookup failed");
                let resp = HttpResponse::InternalServerError()
                    .json(json!({"error": "Internal Server Error"}));
                return Ok(req.into_response(resp.map_into_boxed_body()));
            }
        }
    }

    let auth_user = AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::error::{LeaveError, LeaveResult};
    use crate::leave::{HolidayCalendar, InMemoryRangeStore, LeaveRangeStore};
    use crate::model::leave_request::{DateRange, LeaveRequest};
    use crate::models::{Claims, TokenType};
    use actix_web::http::StatusCode;
    use actix_web::middleware::from_fn;
    use actix_web::{App, test, web};
    use chrono::Local;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "gate-secret";

    /// Store whose lookups always fail.
    struct BrokenStore;

    #[async_trait::async_trait]
    impl LeaveRangeStore for BrokenStore {
        async fn ranges_for(&self, _employee_id: u64) -> LeaveResult<Vec<DateRange>> {
            Err(LeaveError::Store("connection refused".into()))
        }

        async fn record_approval(
            &self,
            _request: &LeaveRequest,
            _decided_by: Option<u64>,
        ) -> LeaveResult<()> {
            Err(LeaveError::Store("connection refused".into()))
        }
    }

    fn config() -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: SECRET.into(),
            server_addr: String::new(),
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            log_dir: "logs".into(),
            holidays: HolidayCalendar::new(),
        }
    }

    fn bearer(role: u8, employee_id: Option<u64>) -> String {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize
            + 600;
        let claims = Claims {
            user_id: 1,
            sub: "mgarcia".into(),
            role,
            exp,
            jti: "gate-jti".into(),
            token_type: TokenType::Access,
            employee_id,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        format!("Bearer {token}")
    }

    /// Employee 5 has approved leave covering today.
    fn engine_with_leave_today() -> LeaveEngine {
        let today = Local::now().date_naive();
        let store = InMemoryRangeStore::with_approved([(5, DateRange::new(today, today).unwrap())]);
        LeaveEngine::new(Arc::new(store), HolidayCalendar::new())
    }

    async fn status_for(engine: LeaveEngine, authorization: Option<String>) -> StatusCode {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config()))
                .app_data(Data::new(engine))
                .wrap(from_fn(auth_middleware))
                .route("/ping", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let mut req = test::TestRequest::get().uri("/ping");
        if let Some(value) = authorization {
            req = req.insert_header(("Authorization", value));
        }
        test::call_service(&app, req.to_request()).await.status()
    }

    #[actix_web::test]
    async fn test_employee_on_leave_is_refused() {
        let status = status_for(engine_with_leave_today(), Some(bearer(3, Some(5)))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_hr_user_on_leave_is_refused() {
        let status = status_for(engine_with_leave_today(), Some(bearer(2, Some(5)))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_admin_and_system_bypass_the_gate() {
        let admin = status_for(engine_with_leave_today(), Some(bearer(1, Some(5)))).await;
        assert_eq!(admin, StatusCode::OK);
        let system = status_for(engine_with_leave_today(), Some(bearer(4, Some(5)))).await;
        assert_eq!(system, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_other_employee_passes() {
        let status = status_for(engine_with_leave_today(), Some(bearer(3, Some(6)))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_user_without_employee_profile_passes() {
        let status = status_for(engine_with_leave_today(), Some(bearer(3, None))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_lookup_failure_is_a_server_error() {
        let engine = LeaveEngine::new(Arc::new(BrokenStore), HolidayCalendar::new());
        let status = status_for(engine, Some(bearer(3, Some(5)))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_missing_header_is_unauthorized() {
        let status = status_for(engine_with_leave_today(), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
