pub mod auth;
pub mod emails;
pub mod health;
