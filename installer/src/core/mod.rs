//! Deterministic, pure logic shared by the installer.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod args;
pub mod error_finder;
pub mod lockfile;
pub mod podfile;
pub mod types;
