//! Stable exit codes for sceneops CLI commands.

/// Command succeeded with no reported conditions.
pub const OK: i32 = 0;
/// Command failed due to invalid config/arguments or a transport error.
pub const INVALID: i32 = 1;
/// The skill server did not answer the availability probe.
pub const UNAVAILABLE: i32 = 2;
/// The run completed but reported non-fatal conditions (aborted sweeps,
/// failed steps, a failed material create).
pub const PARTIAL: i32 = 3;
