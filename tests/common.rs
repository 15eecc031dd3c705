#![allow(dead_code)]

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use base64::Engine;
use mass_mailer::config::{
    Config, LogFormat, MailConfig, MailTransport, OAuthConfig, ServerConfig, SmtpAuth, SmtpTls, TelemetryConfig,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use tokio::net::TcpListener;
use tokio::sync::watch;

pub const GOOD_CODE: &str = "good-code";
pub const ACCESS_TOKEN: &str = "test-access-token";

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("mass_mailer=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap())
            .add_directive("rustls=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

/// Stands in for Google's token, userinfo and Gmail send endpoints.
#[derive(Clone, Debug)]
pub struct FakeGoogle {
    pub url: String,
    sent: Arc<Mutex<Vec<String>>>,
}

impl FakeGoogle {
    async fn spawn() -> Self {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/token", post(token))
            .route("/userinfo", get(userinfo))
            .route("/gmail/send", post(gmail_send))
            .with_state(sent.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { url, sent }
    }

    /// Every raw message the Gmail endpoint received, decoded to text.
    pub fn sent_messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

fn bearer_is_valid(headers: &HeaderMap) -> bool {
    headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some(format!("Bearer {ACCESS_TOKEN}").as_str())
}

async fn token(Form(form): Form<HashMap<String, String>>) -> impl IntoResponse {
    if form.get("code").map(String::as_str) == Some(GOOD_CODE) {
        (
            StatusCode::OK,
            Json(json!({"access_token": ACCESS_TOKEN, "token_type": "Bearer", "expires_in": 3599})),
        )
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant", "error_description": "Bad Request"})))
    }
}

async fn userinfo(headers: HeaderMap) -> impl IntoResponse {
    if bearer_is_valid(&headers) {
        (
            StatusCode::OK,
            Json(json!({"given_name": "Ada", "name": "Ada Lovelace", "email": "ada@example.com"})),
        )
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_token"})))
    }
}

#[derive(Deserialize)]
struct RawMessage {
    raw: String,
}

async fn gmail_send(
    State(sent): State<Arc<Mutex<Vec<String>>>>,
    headers: HeaderMap,
    Json(body): Json<RawMessage>,
) -> impl IntoResponse {
    if !bearer_is_valid(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"code": 401, "message": "Invalid Credentials"}})));
    }

    let decoded = base64::engine::general_purpose::URL_SAFE.decode(body.raw).unwrap();
    let text = String::from_utf8(decoded).unwrap();
    let bounced = text.contains("bounce@");
    sent.lock().unwrap().push(text);

    if bounced {
        (StatusCode::BAD_REQUEST, Json(json!({"error": {"code": 400, "message": "Invalid To header"}})))
    } else {
        (StatusCode::OK, Json(json!({"id": "msg-1", "threadId": "thread-1"})))
    }
}

pub fn get_test_config(google_url: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            shutdown_timeout_secs: 5,
            cors_allowed_origins: vec![],
            max_upload_bytes: 1_048_576,
        },
        oauth: OAuthConfig {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            redirect_uri: "http://localhost:3000/callback".to_string(),
            auth_url: format!("{google_url}/auth"),
            token_url: format!("{google_url}/token"),
            userinfo_url: format!("{google_url}/userinfo"),
        },
        mail: MailConfig {
            transport: MailTransport::GmailApi,
            gmail_send_url: format!("{google_url}/gmail/send"),
            smtp_host: "localhost".to_string(),
            smtp_port: 465,
            smtp_auth: SmtpAuth::Xoauth2,
            smtp_tls: SmtpTls::Implicit,
            smtp_username: None,
            smtp_password: None,
            timeout_secs: 5,
        },
        telemetry: TelemetryConfig { log_format: LogFormat::Text, otlp_endpoint: None },
    }
}

#[derive(Debug)]
pub struct TestApp {
    pub server_url: String,
    pub client: reqwest::Client,
    pub google: FakeGoogle,
    pub shutdown_tx: watch::Sender<bool>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        setup_tracing();
        let google = FakeGoogle::spawn().await;
        let config = get_test_config(&google.url);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let services = mass_mailer::build_services(&config).unwrap();
        let router = mass_mailer::api::app_router(&config, services, shutdown_rx.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_url = format!("http://{}", listener.local_addr().unwrap());
        let mut server_rx = shutdown_rx;
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = server_rx.wait_for(|&s| s).await;
                })
                .await
                .unwrap();
        });

        Self { server_url, client: reqwest::Client::new(), google, shutdown_tx }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server_url)
    }
}
