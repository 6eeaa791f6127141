//! Stable exit codes for the `cocoapods-install` binary.

/// Pods installed.
pub const OK: i32 = 0;
/// Invalid input, no Podfile, CocoaPods setup failure or failed install.
pub const FAILURE: i32 = 1;
