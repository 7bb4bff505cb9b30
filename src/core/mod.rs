pub mod domain;
pub mod runner;
pub mod traits;
