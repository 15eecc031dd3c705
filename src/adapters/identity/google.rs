use crate::config::OAuthConfig;
use crate::domain::identity::SenderIdentity;
use crate::services::identity::{AuthError, IdentityProvider};
use async_trait::async_trait;
use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RedirectUrl, RequestTokenError,
    TokenResponse, TokenUrl,
};
use serde::Deserialize;

type OAuthClient = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Google OAuth2: authorization-code exchange plus the OpenID userinfo endpoint.
#[derive(Debug, Clone)]
pub struct GoogleIdentityProvider {
    oauth: OAuthClient,
    http: reqwest::Client,
    userinfo_url: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    given_name: Option<String>,
    name: Option<String>,
    email: Option<String>,
}

impl UserInfo {
    fn into_identity(self) -> Result<SenderIdentity, AuthError> {
        let email = self
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| AuthError::Profile("profile has no email address".into()))?;
        let name = self.given_name.filter(|name| !name.trim().is_empty()).or(self.name).unwrap_or_default();
        Ok(SenderIdentity { name, email })
    }
}

impl GoogleIdentityProvider {
    /// # Errors
    /// Returns an error if any configured endpoint is not a valid URL or the
    /// HTTP client cannot be built.
    pub fn new(config: &OAuthConfig) -> anyhow::Result<Self> {
        let oauth = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(config.auth_url.clone())?)
            .set_token_uri(TokenUrl::new(config.token_url.clone())?)
            .set_redirect_uri(RedirectUrl::new(config.redirect_uri.clone())?);

        // Token endpoints must not be allowed to redirect the code elsewhere.
        let http = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none()).build()?;

        Ok(Self { oauth, http, userinfo_url: config.userinfo_url.clone() })
    }
}

fn describe_token_error<RE: std::error::Error + 'static>(err: &RequestTokenError<RE, BasicErrorResponse>) -> String {
    match err {
        RequestTokenError::ServerResponse(response) => response.to_string(),
        RequestTokenError::Request(e) => format!("token request failed: {e}"),
        RequestTokenError::Parse(e, _) => format!("unreadable token response: {e}"),
        RequestTokenError::Other(msg) => msg.clone(),
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    #[tracing::instrument(err(level = "debug"), skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| AuthError::Exchange(describe_token_error(&e)))?;

        Ok(token.access_token().secret().clone())
    }

    #[tracing::instrument(err(level = "debug"), skip_all)]
    async fn fetch_profile(&self, access_token: &str) -> Result<SenderIdentity, AuthError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AuthError::Profile(e.to_string()))?;

        let info: UserInfo = response.json().await.map_err(|e| AuthError::Profile(e.to_string()))?;
        info.into_identity()
    }
}
