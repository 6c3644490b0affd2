//! Router construction, shared state and the CORS policy.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use shared_types::WelcomeResponse;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{self, UserStore};
use crate::config::AppConfig;
use crate::oauth::{self, TokenExchangeService};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub exchange: Arc<TokenExchangeService>,
    pub users: Arc<dyn UserStore>,
}

pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/secure-data", get(auth::secure_data))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        // Google OAuth routes
        .route("/auth/google", post(oauth::google_exchange))
        .route("/auth/google/url", get(oauth::google_auth_url))
        // Password login routes
        .route("/login", post(auth::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state.config.cors_allowed_origins))
        .with_state(state)
}

async fn home() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the auth relay".to_string(),
    })
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Build CORS layer from the configured frontend origins.
///
/// Only listed origins are allowed. Unparseable entries are skipped with a
/// warning; an empty list allows no cross-origin requests at all.
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        tracing::warn!("No valid CORS origins configured, cross-origin requests will be refused");
    } else {
        tracing::info!("CORS configured for origins: {:?}", origins);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::Request,
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::{hash_password, InMemoryUserStore, JwtConfig, UserRecord};
    use crate::oauth::id_token::tests::fake_id_token;
    use crate::oauth::{InMemoryRefreshTokenStore, ProviderCredentials, RefreshTokenStore};

    const FRONTEND: &str = "http://localhost:5173";

    fn test_config(token_endpoint: &str, with_provider: bool) -> AppConfig {
        AppConfig {
            port: 0,
            cors_allowed_origins: vec![FRONTEND.to_string()],
            provider: with_provider.then(|| ProviderCredentials {
                client_id: "client.apps.googleusercontent.com".to_string(),
                client_secret: "GOCSPX-test-secret".to_string(),
                redirect_uri: FRONTEND.to_string(),
            }),
            token_endpoint: token_endpoint.to_string(),
            auth_endpoint: oauth::GOOGLE_AUTH_ENDPOINT.to_string(),
            exchange_timeout: Duration::from_secs(5),
            max_concurrent_exchanges: 4,
            jwt: Some(JwtConfig {
                secret: "test-secret-key-for-testing-only".to_string(),
                token_duration_minutes: 30,
            }),
            login_users: vec![UserRecord {
                username: "admin".to_string(),
                password_sha256: hash_password("pass123"),
            }],
            service_refresh_token: Some("1//service-refresh-token".to_string()),
        }
    }

    fn test_app(config: AppConfig, store: Arc<dyn RefreshTokenStore>) -> Router {
        let exchange = TokenExchangeService::new(config.exchange_settings(), store)
            .expect("should build exchange service");
        let users = InMemoryUserStore::new(config.login_users.clone());
        create_app(AppState {
            config: Arc::new(config),
            exchange: Arc::new(exchange),
            users: Arc::new(users),
        })
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn token_endpoint_returning(status: u16, body: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_exchange_returns_only_access_and_id_tokens() {
        let server = token_endpoint_returning(
            200,
            json!({
                "access_token": "ya29.access",
                "id_token": fake_id_token("1234"),
                "refresh_token": "1//0g-refresh-secret",
                "expires_in": 3599
            }),
        )
        .await;
        let store = Arc::new(InMemoryRefreshTokenStore::new());
        let app = test_app(
            test_config(&format!("{}/token", server.uri()), true),
            store.clone(),
        );

        let response = app
            .oneshot(post_json("/auth/google", r#"{"code":"4/0AX4XfWh"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let mut keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["accessToken", "idToken", "message"]);
        assert!(!body.to_string().contains("1//0g-refresh-secret"));

        assert_eq!(
            store.get("1234").await,
            Some("1//0g-refresh-secret".to_string())
        );
    }

    #[tokio::test]
    async fn test_exchange_missing_code_is_400() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        for body in ["{}", r#"{"code":""}"#, "not json"] {
            let app = test_app(
                test_config(&server.uri(), true),
                Arc::new(InMemoryRefreshTokenStore::new()),
            );
            let response = app.oneshot(post_json("/auth/google", body)).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = body_json(response).await;
            assert!(body["detail"].is_string());
        }
    }

    #[tokio::test]
    async fn test_exchange_upstream_rejection_is_502() {
        let server = token_endpoint_returning(
            401,
            json!({"error": "invalid_client", "error_description": "Unauthorized client"}),
        )
        .await;
        let app = test_app(
            test_config(&server.uri(), true),
            Arc::new(InMemoryRefreshTokenStore::new()),
        );

        let response = app
            .oneshot(post_json("/auth/google", r#"{"code":"abc"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .contains("Unauthorized client"));
    }

    #[tokio::test]
    async fn test_exchange_incomplete_upstream_is_500() {
        let server = token_endpoint_returning(200, json!({"access_token": "ya29.access"})).await;
        let app = test_app(
            test_config(&server.uri(), true),
            Arc::new(InMemoryRefreshTokenStore::new()),
        );

        let response = app
            .oneshot(post_json("/auth/google", r#"{"code":"abc"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("id_token"));
    }

    #[tokio::test]
    async fn test_exchange_without_credentials_is_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let app = test_app(
            test_config(&server.uri(), false),
            Arc::new(InMemoryRefreshTokenStore::new()),
        );

        let response = app
            .oneshot(post_json("/auth/google", r#"{"code":"abc"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_auth_url_requests_offline_access() {
        let app = test_app(
            test_config("http://unused", true),
            Arc::new(InMemoryRefreshTokenStore::new()),
        );

        let response = app
            .oneshot(Request::get("/auth/google/url").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let url = body["authUrl"].as_str().unwrap();
        let state = body["state"].as_str().unwrap();
        assert!(url.starts_with(oauth::GOOGLE_AUTH_ENDPOINT));
        assert!(url.contains("client_id=client.apps.googleusercontent.com"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5173"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains(&format!("state={}", state)));
        assert!(!url.contains("GOCSPX"));
    }

    #[tokio::test]
    async fn test_cors_allows_only_listed_origins() {
        let app = test_app(
            test_config("http://unused", true),
            Arc::new(InMemoryRefreshTokenStore::new()),
        );

        let preflight = |origin: &str| {
            Request::builder()
                .method("OPTIONS")
                .uri("/auth/google")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap()
        };

        let allowed = app.clone().oneshot(preflight(FRONTEND)).await.unwrap();
        assert_eq!(
            allowed
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            FRONTEND
        );

        let refused = app.oneshot(preflight("https://evil.example")).await.unwrap();
        assert!(refused
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    fn login_request(username: &str, password: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!(
                "username={}&password={}",
                username, password
            )))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_and_access_secure_data() {
        let app = test_app(
            test_config("http://unused", true),
            Arc::new(InMemoryRefreshTokenStore::new()),
        );

        let response = app
            .clone()
            .oneshot(login_request("admin", "pass123"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["token_type"], "bearer");
        let token = body["access_token"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                Request::get("/secure-data")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["client_secret"], "GOCSP...");
        assert_eq!(body["refresh_token"], "1//se...");
        assert!(!body.to_string().contains("GOCSPX-test-secret"));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_400() {
        let app = test_app(
            test_config("http://unused", true),
            Arc::new(InMemoryRefreshTokenStore::new()),
        );

        for (username, password) in [("admin", "wrong"), ("nobody", "pass123")] {
            let response = app
                .clone()
                .oneshot(login_request(username, password))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = body_json(response).await;
            assert_eq!(body["detail"], "Incorrect username or password");
        }
    }

    #[tokio::test]
    async fn test_login_disabled_without_secret_key() {
        let mut config = test_config("http://unused", true);
        config.jwt = None;
        let app = test_app(config, Arc::new(InMemoryRefreshTokenStore::new()));

        let response = app.oneshot(login_request("admin", "pass123")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_secure_data_requires_valid_token() {
        let app = test_app(
            test_config("http://unused", true),
            Arc::new(InMemoryRefreshTokenStore::new()),
        );

        let missing = app
            .clone()
            .oneshot(Request::get("/secure-data").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            missing.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let forged = app
            .oneshot(
                Request::get("/secure-data")
                    .header(header::AUTHORIZATION, "Bearer not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_secure_data_rejects_removed_user() {
        let config = test_config("http://unused", true);
        let jwt = config.jwt.clone().unwrap();
        let app = test_app(config, Arc::new(InMemoryRefreshTokenStore::new()));

        let token = crate::auth::create_token(&jwt, "ghost").unwrap();
        let response = app
            .oneshot(
                Request::get("/secure-data")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Invalid user");
    }

    #[tokio::test]
    async fn test_home_and_health() {
        let app = test_app(
            test_config("http://unused", false),
            Arc::new(InMemoryRefreshTokenStore::new()),
        );

        let health = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let home = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(home).await;
        assert!(body["message"].is_string());
    }
}
