//! Common test utilities for rar-reclaim integration tests
//!
//! The archive tool is replaced by a generated shell script, so everything
//! here is Unix only.

#[allow(dead_code)]
pub mod assertions;
#[allow(dead_code)]
pub mod doubles;
#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use doubles::*;
pub use fixtures::*;
