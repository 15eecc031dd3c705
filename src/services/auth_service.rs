use crate::domain::identity::{AuthSession, SenderIdentity};
use crate::services::identity::{AuthError, IdentityProvider};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;

#[derive(Clone, Debug)]
struct Metrics {
    exchanges: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("mass-mailer");
        Self {
            exchanges: meter
                .u64_counter("mailer_auth_exchanges_total")
                .with_description("Total authorization-code exchanges by outcome")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    metrics: Metrics,
}

impl AuthService {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider, metrics: Metrics::new() }
    }

    /// Exchanges an authorization code and returns the user's profile with the access token.
    ///
    /// # Errors
    /// Returns `AuthError::UnsupportedProvider` if `provider` is not configured,
    /// otherwise whatever the exchange or profile lookup fails with.
    #[tracing::instrument(err(level = "warn"), skip(self, code))]
    pub async fn login(&self, provider: &str, code: &str) -> Result<AuthSession, AuthError> {
        if provider != self.provider.name() {
            return Err(AuthError::UnsupportedProvider(provider.to_string()));
        }

        let result = async {
            let access_token = self.provider.exchange_code(code).await?;
            let user = self.provider.fetch_profile(&access_token).await?;
            Ok::<_, AuthError>(AuthSession { user, access_token })
        }
        .await;

        let status = if result.is_ok() { "success" } else { "failure" };
        self.metrics.exchanges.add(1, &[KeyValue::new("status", status)]);

        if let Ok(session) = &result {
            tracing::info!(email = %session.user.email, "User signed in");
        }
        result
    }

    /// Resolves the sending identity behind a bearer token.
    ///
    /// # Errors
    /// Returns `AuthError::Profile` if the provider rejects the token.
    #[tracing::instrument(err(level = "debug"), skip_all)]
    pub async fn resolve_sender(&self, access_token: &str) -> Result<SenderIdentity, AuthError> {
        self.provider.fetch_profile(access_token).await
    }
}
