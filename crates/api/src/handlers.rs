pub mod notifications;
pub mod sessions;
