/// Scripted implementations of core traits for tests.
pub mod executor;
