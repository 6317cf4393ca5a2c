//! API Router with Swagger UI

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::UserService;
use crate::interfaces::http::common::ErrorResponse;
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::{auth, health, metrics, request_id, users};

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from POST /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        auth::protected,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
    ),
    components(
        schemas(
            ErrorResponse,
            health::HealthResponse,
            health::ComponentHealth,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RegisterRequest,
            auth::ProtectedResponse,
            auth::TokenUserInfo,
            users::UserDto,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            users::FilterModeParam,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Authentication", description = "Email/password login issuing JWT bearer tokens"),
        (name = "Users", description = "User management"),
    ),
    info(
        title = "User Service API",
        version = "1.0.0",
        description = "User management with JWT authentication",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Everything the router needs from the running service
#[derive(Clone)]
pub struct RouterDeps {
    pub user_service: Arc<UserService>,
    /// Pinged by `/health`; `None` for the in-memory backend
    pub db: Option<DatabaseConnection>,
    /// `/metrics` is only mounted when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

/// Create the API router with all routes
pub fn create_api_router(deps: RouterDeps) -> Router {
    let auth_gate = AuthState {
        authority: deps.user_service.authority().clone(),
    };

    let auth_state = auth::AuthHandlerState {
        user_service: deps.user_service.clone(),
    };
    let user_state = users::UserHandlerState {
        user_service: deps.user_service,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .with_state(auth_state);

    // Auth routes (protected)
    let auth_protected_routes = Router::new()
        .route("/protected", get(auth::protected))
        .layer(middleware::from_fn_with_state(
            auth_gate.clone(),
            auth_middleware,
        ));

    // User routes (protected)
    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .layer(middleware::from_fn_with_state(auth_gate, auth_middleware))
        .with_state(user_state);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health::HealthState::new(deps.db));

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    let mut router = Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .nest("/auth", auth_routes.merge(auth_protected_routes))
        .nest("/users", user_routes);

    if let Some(handle) = deps.metrics {
        router = router.route(
            "/metrics",
            get(metrics::prometheus_metrics).with_state(metrics::MetricsState { handle }),
        );
    }

    router
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, Response, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::application::TokenAuthority;
    use crate::infrastructure::crypto::jwt::JwtConfig;
    use crate::infrastructure::storage::InMemoryUserRepository;

    const TEST_COST: u32 = 4;

    async fn app() -> Router {
        let repo = Arc::new(InMemoryUserRepository::new());
        let authority = Arc::new(TokenAuthority::new(JwtConfig::new("router-secret")).unwrap());
        let user_service = Arc::new(
            UserService::new(repo, authority, TEST_COST)
                .await
                .unwrap(),
        );

        create_api_router(RouterDeps {
            user_service,
            db: None,
            metrics: None,
        })
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        req.body(Body::empty()).unwrap()
    }

    async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
        axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(resp: Response<Body>) -> Value {
        serde_json::from_slice(&body_bytes(resp).await).unwrap()
    }

    async fn register(app: &Router, email: &str, password: &str) -> Value {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/register",
                None,
                json!({"name": "Ann", "email": email, "telephone": "+100", "password": password}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await
    }

    async fn login(app: &Router, email: &str, password: &str) -> Response<Body> {
        app.clone()
            .oneshot(json_request(
                "POST",
                "/auth/login",
                None,
                json!({"email": email, "password": password}),
            ))
            .await
            .unwrap()
    }

    async fn token_for(app: &Router, email: &str, password: &str) -> String {
        let resp = login(app, email, password).await;
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn register_never_returns_the_hash() {
        let app = app().await;
        let user = register(&app, "a@x.com", "secret123").await;

        assert_eq!(user["email"], "a@x.com");
        assert!(user.get("password_hash").is_none());
        assert!(user.get("password").is_none());
    }

    #[tokio::test]
    async fn login_returns_bearer_token() {
        let app = app().await;
        register(&app, "a@x.com", "secret123").await;

        let resp = login(&app, "a@x.com", "secret123").await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["expires_in"], 3600);
        assert!(body["token"].as_str().unwrap().split('.').count() == 3);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let app = app().await;
        register(&app, "a@x.com", "secret123").await;

        let wrong_password = login(&app, "a@x.com", "wrong-password").await;
        let unknown_email = login(&app, "nobody@x.com", "secret123").await;

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

        let a = body_bytes(wrong_password).await;
        let b = body_bytes(unknown_email).await;
        assert_eq!(a, b);
        assert_eq!(a, br#"{"error":"Invalid email or password"}"#.to_vec());
    }

    #[tokio::test]
    async fn multibyte_password_over_72_bytes_cannot_register() {
        let app = app().await;
        // 40 characters, 80 bytes
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/register",
                None,
                json!({"name": "Ann", "email": "a@x.com", "password": "é".repeat(40)}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("password: "));

        register(&app, "a@x.com", &"é".repeat(36)).await;
        let longer = format!("{}zzzz", "é".repeat(36));
        let resp = login(&app, "a@x.com", &longer).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_login_fields_are_rejected() {
        let app = app().await;
        let resp = login(&app, "", "").await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn protected_route_echoes_claims() {
        let app = app().await;
        register(&app, "a@x.com", "secret123").await;
        let token = token_for(&app, "a@x.com", "secret123").await;

        let resp = app
            .clone()
            .oneshot(get_request("/auth/protected", Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["message"], "Welcome to the protected route!");
        assert_eq!(body["user"]["email"], "a@x.com");
        let iat = body["user"]["iat"].as_i64().unwrap();
        let exp = body["user"]["exp"].as_i64().unwrap();
        assert_eq!(exp - iat, 3600);
    }

    #[tokio::test]
    async fn gate_distinguishes_missing_from_invalid() {
        let app = app().await;

        let missing = app
            .clone()
            .oneshot(get_request("/users", None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(missing).await["error"],
            "Access denied. Token required."
        );

        let invalid = app
            .clone()
            .oneshot(get_request("/users", Some("not-a-token")))
            .await
            .unwrap();
        assert_eq!(invalid.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(invalid).await["error"], "Invalid token.");
    }

    #[tokio::test]
    async fn user_crud_round() {
        let app = app().await;
        register(&app, "admin@x.com", "secret123").await;
        let token = token_for(&app, "admin@x.com", "secret123").await;

        // create
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/users",
                Some(&token),
                json!({"name": "Bob", "email": "bob@y.org", "telephone": "+200", "password": "hunter22"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let bob = body_json(resp).await;
        let id = bob["id"].as_str().unwrap().to_string();

        // duplicate email
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/users",
                Some(&token),
                json!({"name": "Bobby", "email": "bob@y.org", "password": "hunter22"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        // read
        let resp = app
            .clone()
            .oneshot(get_request(&format!("/users/{}", id), Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["name"], "Bob");

        // update password, then log in with it
        let resp = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/users/{}", id),
                Some(&token),
                json!({"telephone": "+300", "password": "new-secret"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let updated = body_json(resp).await;
        assert_eq!(updated["telephone"], "+300");
        assert_eq!(updated["name"], "Bob");
        assert_eq!(
            login(&app, "bob@y.org", "new-secret").await.status(),
            StatusCode::OK
        );

        // delete
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/users/{}", id))
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app
            .clone()
            .oneshot(get_request(&format!("/users/{}", id), Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"], "User not found");
    }

    #[tokio::test]
    async fn update_of_missing_user_is_404() {
        let app = app().await;
        register(&app, "a@x.com", "secret123").await;
        let token = token_for(&app, "a@x.com", "secret123").await;

        let resp = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/users/does-not-exist",
                Some(&token),
                json!({"name": "Ghost"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_filters_combine_by_mode() {
        let app = app().await;
        register(&app, "ann@x.com", "secret123").await;
        let token = token_for(&app, "ann@x.com", "secret123").await;

        app.clone()
            .oneshot(json_request(
                "POST",
                "/users",
                Some(&token),
                json!({"name": "Bob", "email": "bob@y.org", "password": "hunter22"}),
            ))
            .await
            .unwrap();

        let count = |uri: &'static str| {
            let app = app.clone();
            let token = token.clone();
            async move {
                let resp = app.oneshot(get_request(uri, Some(&token))).await.unwrap();
                assert_eq!(resp.status(), StatusCode::OK);
                body_json(resp).await.as_array().unwrap().len()
            }
        };

        assert_eq!(count("/users").await, 2);
        assert_eq!(count("/users?name=BOB").await, 1);
        assert_eq!(count("/users?name=bob&email=x.com").await, 2);
        assert_eq!(count("/users?name=bob&email=x.com&mode=all").await, 0);
        assert_eq!(count("/users?name=").await, 2);
    }

    #[tokio::test]
    async fn health_reports_memory_backend() {
        let resp = app()
            .await
            .oneshot(get_request("/health", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"]["backend"], "memory");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let resp = app()
            .await
            .oneshot(get_request("/api-doc/openapi.json", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let doc = body_json(resp).await;
        assert!(doc["paths"]["/auth/login"].is_object());
        assert!(doc["paths"]["/users/{id}"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
    }
}
