/// The signed-in user a batch is sent on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    pub name: String,
    pub email: String,
}

/// Result of a successful authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: SenderIdentity,
    pub access_token: String,
}
