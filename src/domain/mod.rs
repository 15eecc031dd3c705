pub mod identity;
pub mod progress;
pub mod recipient;
pub mod template;
