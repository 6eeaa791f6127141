//! I/O adapters for the build step.

pub mod annotation;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod process;
pub mod ruby;
pub mod runner;
pub mod step_log;
