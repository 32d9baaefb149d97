pub mod event;
pub mod notification;
pub mod session;
