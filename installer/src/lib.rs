//! CocoaPods install build step.
//!
//! Installs the pods of an iOS/macOS project, retrying once after a specs
//! repo update when the first `pod install` fails. The crate keeps a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (argument assembly, output
//!   classification, lockfile parsing). No I/O.
//! - **[`io`]**: Side-effecting adapters (processes, filesystem walk, config,
//!   step output). Behind traits where tests need doubles.
//!
//! [`installer`] implements the install-with-retry flow on top of both;
//! [`step`] wires the whole build step together for the CLI.

pub mod core;
pub mod exit_codes;
pub mod installer;
pub mod io;
pub mod logging;
pub mod step;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
