use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub oauth: OAuthConfig,

    #[command(flatten)]
    pub mail: MailConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "MAILER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "MAILER_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Seconds to wait for in-flight streams to finish after a shutdown signal
    #[arg(long, env = "MAILER_SHUTDOWN_TIMEOUT_SECS", default_value_t = 30)]
    pub shutdown_timeout_secs: u64,

    /// Comma-separated list of origins allowed by CORS. Empty allows any origin.
    #[arg(long, env = "MAILER_CORS_ALLOWED_ORIGINS", value_delimiter = ',', default_value = "")]
    pub cors_allowed_origins: Vec<String>,

    /// Maximum size of a `/send-emails` upload in bytes (Default: 5MB)
    #[arg(long, env = "MAILER_MAX_UPLOAD_BYTES", default_value_t = 5_242_880)]
    pub max_upload_bytes: usize,
}

#[derive(Clone, Debug, Args)]
pub struct OAuthConfig {
    /// OAuth2 client id registered with the identity provider
    #[arg(long, env = "MAILER_OAUTH_CLIENT_ID")]
    pub client_id: String,

    /// OAuth2 client secret
    #[arg(long, env = "MAILER_OAUTH_CLIENT_SECRET")]
    pub client_secret: String,

    /// Redirect URI used by the frontend when requesting the authorization code
    #[arg(long, env = "MAILER_OAUTH_REDIRECT_URI")]
    pub redirect_uri: String,

    #[arg(long, env = "MAILER_OAUTH_AUTH_URL", default_value = "https://accounts.google.com/o/oauth2/auth")]
    pub auth_url: String,

    #[arg(long, env = "MAILER_OAUTH_TOKEN_URL", default_value = "https://oauth2.googleapis.com/token")]
    pub token_url: String,

    #[arg(long, env = "MAILER_OAUTH_USERINFO_URL", default_value = "https://www.googleapis.com/oauth2/v3/userinfo")]
    pub userinfo_url: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MailTransport {
    /// Submit each message through the Gmail REST API
    #[default]
    GmailApi,
    /// Submit each message over SMTPS
    Smtp,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SmtpAuth {
    /// SASL XOAUTH2 using the caller's bearer token
    #[default]
    Xoauth2,
    /// Static username/password from configuration
    Password,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SmtpTls {
    /// TLS from the first byte (SMTPS)
    #[default]
    Implicit,
    /// Plaintext greeting upgraded with STARTTLS
    Starttls,
    /// No encryption; local relays only
    None,
}

#[derive(Clone, Debug, Args)]
pub struct MailConfig {
    /// Transport used to deliver each message
    #[arg(long, env = "MAILER_MAIL_TRANSPORT", value_enum, default_value_t = MailTransport::GmailApi)]
    pub transport: MailTransport,

    /// Gmail API endpoint for sending raw messages
    #[arg(
        long,
        env = "MAILER_GMAIL_SEND_URL",
        default_value = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send"
    )]
    pub gmail_send_url: String,

    /// SMTP server host
    #[arg(long, env = "MAILER_SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// SMTP server port
    #[arg(long, env = "MAILER_SMTP_PORT", default_value_t = 465)]
    pub smtp_port: u16,

    /// Connection security for the SMTP session
    #[arg(long, env = "MAILER_SMTP_TLS", value_enum, default_value_t = SmtpTls::Implicit)]
    pub smtp_tls: SmtpTls,

    /// SMTP authentication mechanism
    #[arg(long, env = "MAILER_SMTP_AUTH", value_enum, default_value_t = SmtpAuth::Xoauth2)]
    pub smtp_auth: SmtpAuth,

    /// SMTP username for password authentication
    #[arg(long, env = "MAILER_SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    /// SMTP password for password authentication
    #[arg(long, env = "MAILER_SMTP_PASSWORD")]
    pub smtp_password: Option<String>,

    /// Network timeout for a single delivery attempt
    #[arg(long, env = "MAILER_MAIL_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Default, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "MAILER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint (traces and metrics are exported only when set)
    #[arg(long, env = "MAILER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
