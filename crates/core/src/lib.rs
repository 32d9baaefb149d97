//! # TutorBook core
//!
//! Domain rules for tutoring session bookings:
//!
//! - **lifecycle**: the legal transitions of a session and who may trigger them
//! - **reconcile**: folding change-feed events into a participant's session list
//! - **notify**: inbox messages owed to the counter-party
//! - **service**: running an action against the store end to end
//!
//! Storage, the change feed and identity are reached through the traits in
//! [`repository`].

pub mod context;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod repository;
pub mod service;

pub mod mock;
