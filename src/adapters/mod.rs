pub mod identity;
pub mod mail;
