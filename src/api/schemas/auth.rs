use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CodeExchange {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct User {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub access_token: String,
}
