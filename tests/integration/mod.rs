//! Integration tests module
//!
//! Organized by workflow: acceptance scenarios, concurrency, the registration
//! workflow, event authoring and the Postgres store.

pub mod authoring_test;
pub mod concurrency_test;
pub mod scenarios_test;
