//! mockall doubles for the collaborator traits, shared by the crates' tests.
pub mod repositories;
