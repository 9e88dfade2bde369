//! Points Router
//!
//! Every route requires a bearer token; ledger writes and the archive sweep
//! additionally require staff.

use auth::domain::repository::UserRepository;
use auth::middleware::{require_bearer, require_staff};
use auth::{AuthAppState, PgUserRepository};
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};

use crate::domain::repository::PointsRepository;
use crate::infra::postgres::PgPointsRepository;
use crate::presentation::handlers::{self, PointsAppState};

/// Create the points router with PostgreSQL repositories
pub fn points_router(
    state: PointsAppState<PgPointsRepository>,
    auth: AuthAppState<PgUserRepository>,
) -> Router {
    points_router_generic(state, auth)
}

/// Create a generic points router for any repository implementation
pub fn points_router_generic<R, U>(state: PointsAppState<R>, auth: AuthAppState<U>) -> Router
where
    R: PointsRepository,
    U: UserRepository + Clone + Send + Sync + 'static,
{
    let staff = Router::new()
        .route(
            "/transactions/completion",
            post(handlers::complete_tasks::<R>),
        )
        .route(
            "/transactions/redemption",
            post(handlers::redeem_products::<R>),
        )
        .route("/residents/archive", post(handlers::archive_residents::<R>))
        .route_layer(from_fn(require_staff));

    Router::new()
        .route(
            "/transactions/user/{user_id}",
            get(handlers::transaction_history::<R>),
        )
        .route(
            "/residents/{user_id}/balance",
            get(handlers::resident_balance::<R>),
        )
        .route("/leaderboard", get(handlers::leaderboard::<R>))
        .route("/leaderboard/top", get(handlers::top_performers::<R>))
        .route(
            "/leaderboard/user/{user_id}/position",
            get(handlers::user_position::<R>),
        )
        .merge(staff)
        .route_layer(from_fn_with_state(auth, require_bearer::<U>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::NaiveDate;
    use kernel::id::{ProductId, TaskId, UserId};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use auth::application::{RegisterUserInput, RegisterUserUseCase};
    use auth::{AuthConfig, InMemoryUserRepository, UserRole};

    use crate::application::config::PointsConfig;
    use crate::domain::entities::{Product, Resident, Task};
    use crate::infra::InMemoryPointsRepository;

    struct TestApp {
        router: Router,
        auth: AuthAppState<InMemoryUserRepository>,
        points: InMemoryPointsRepository,
        resident: UserId,
        officer: UserId,
    }

    fn auth_config() -> AuthConfig {
        AuthConfig::from_secrets(
            b"router-test-pepper-0123456789",
            b"router-access-secret-32-bytes-long!",
            std::time::Duration::from_secs(900),
            b"router-refresh-secret-32-bytes-long",
            std::time::Duration::from_secs(3600),
        )
        .unwrap()
    }

    fn registration(role: UserRole, email: Option<&str>) -> RegisterUserInput {
        let resident = role == UserRole::Resident;
        RegisterUserInput {
            user_name: format!("{role} user"),
            role,
            password: "Kettle#Orchid2024".into(),
            profile_picture: None,
            officer_email: email.map(str::to_string),
            batch_number: resident.then_some(2),
            date_of_admission: if resident {
                NaiveDate::from_ymd_opt(2025, 3, 1)
            } else {
                None
            },
            date_of_birth: if resident {
                NaiveDate::from_ymd_opt(2010, 7, 15)
            } else {
                None
            },
        }
    }

    async fn app() -> TestApp {
        let auth = AuthAppState::new(InMemoryUserRepository::new(), auth_config());
        let register = RegisterUserUseCase::new(auth.repo.clone(), auth.config.clone());
        let officer = register
            .execute(
                UserRole::Developer,
                registration(UserRole::Officer, Some("officer@example.com")),
            )
            .await
            .unwrap();
        let resident = register
            .execute(UserRole::Officer, registration(UserRole::Resident, None))
            .await
            .unwrap();

        let points = InMemoryPointsRepository::new();
        points
            .insert_resident(Resident::new(
                resident,
                "Resident user",
                2,
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            ))
            .await;
        points
            .insert_task(Task {
                task_id: TaskId::new(1),
                task_name: "Sweep the hall".into(),
                category: "chores".into(),
                points: 50,
                is_active: true,
            })
            .await;

        let state = PointsAppState::new(points.clone(), PointsConfig::default());
        TestApp {
            router: points_router_generic(state, auth.clone()),
            auth,
            points,
            resident,
            officer,
        }
    }

    impl TestApp {
        fn bearer(&self, user_id: UserId) -> String {
            let token = self
                .auth
                .config
                .tokens
                .issue_access_token(user_id.get())
                .unwrap();
            format!("Bearer {token}")
        }

        async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
            let res = self.router.clone().oneshot(req).await.unwrap();
            let status = res.status();
            let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, body)
        }
    }

    fn post_json(uri: &str, auth: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::AUTHORIZATION, auth)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str, auth: &str) -> Request<Body> {
        Request::get(uri)
            .header(header::AUTHORIZATION, auth)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_requires_bearer() {
        let app = app().await;
        let req = Request::get("/leaderboard").body(Body::empty()).unwrap();

        let (status, body) = app.send(req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_officer_records_completion() {
        let app = app().await;
        let auth = app.bearer(app.officer);

        let (status, body) = app
            .send(post_json(
                "/transactions/completion",
                &auth,
                json!({ "userId": app.resident.get(), "tasks": [{ "id": 1 }, { "id": 1 }] }),
            ))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["newBalance"], 100);
        assert_eq!(body["totalPoints"], 100);
        assert!(body["transactionId"].is_string());
    }

    #[tokio::test]
    async fn test_resident_cannot_record_transactions() {
        let app = app().await;
        let auth = app.bearer(app.resident);

        let (status, body) = app
            .send(post_json(
                "/transactions/completion",
                &auth,
                json!({ "userId": app.resident.get(), "tasks": [{ "id": 1 }] }),
            ))
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_insufficient_points_is_402_with_details() {
        let app = app().await;
        let auth = app.bearer(app.officer);

        let (status, body) = app
            .send(post_json(
                "/transactions/redemption",
                &auth,
                json!({ "userId": app.resident.get(), "products": [{ "id": 9, "quantity": 1 }] }),
            ))
            .await;
        // Unknown product is reported before the balance check
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["details"]["missingProductIds"], json!([9]));

        app.points
            .insert_product(Product {
                product_id: ProductId::new(2),
                product_name: "Instant noodles".into(),
                category: "food".into(),
                points: 80,
                quantity: 5,
                is_available: true,
            })
            .await;
        app.send(post_json(
            "/transactions/completion",
            &auth,
            json!({ "userId": app.resident.get(), "tasks": [{ "id": 1 }] }),
        ))
        .await;

        let (status, body) = app
            .send(post_json(
                "/transactions/redemption",
                &auth,
                json!({ "userId": app.resident.get(), "products": [{ "id": 2, "quantity": 1 }] }),
            ))
            .await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["error"]["code"], "INSUFFICIENT_POINTS");
        assert_eq!(
            body["error"]["details"],
            json!({ "required": 80, "available": 50 })
        );
        assert_eq!(app.points.product(ProductId::new(2)).await.unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_self_or_staff_access() {
        let app = app().await;
        let own = format!("/residents/{}/balance", app.resident.get());

        let (status, body) = app.send(get(&own, &app.bearer(app.resident))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currentPoints"], 0);

        let (status, _) = app.send(get(&own, &app.bearer(app.officer))).await;
        assert_eq!(status, StatusCode::OK);

        let other = format!("/residents/{}/balance", app.officer.get());
        let (status, _) = app.send(get(&other, &app.bearer(app.resident))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_leaderboard_validates_limit() {
        let app = app().await;
        let auth = app.bearer(app.resident);

        let (status, body) = app.send(get("/leaderboard?limit=0", &auth)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = app
            .send(get("/leaderboard?type=total&period=week&limit=5", &auth))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalResidents"], 1);
        assert_eq!(body["entries"][0]["rank"], 1);
    }

    #[tokio::test]
    async fn test_position_and_archive_endpoints() {
        let app = app().await;
        let position = format!("/leaderboard/user/{}/position", app.resident.get());

        let (status, body) = app.send(get(&position, &app.bearer(app.resident))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "rank": 1, "points": 0, "totalResidents": 1 }));

        let (status, body) = app
            .send(post_json(
                "/residents/archive",
                &app.bearer(app.officer),
                json!({ "monthsThreshold": 0 }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let req = Request::post("/residents/archive")
            .header(header::AUTHORIZATION, app.bearer(app.officer))
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.send(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "archived": 1, "errors": [] }));
    }
}
