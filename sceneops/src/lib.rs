//! Reconciling client for a remote scene editor's skill API.
//!
//! The editor owns all scene and asset state; this crate drives it through
//! blocking, name-addressed skill calls and tolerates two properties of that
//! API: responses arrive in several loose shapes, and object names are not
//! unique. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (response normalization, node
//!   addressing, report types). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (HTTP transport, config files).
//!   Isolated behind the [`io::transport::SkillClient`] trait for tests.
//!
//! Orchestration modules ([`sweep`], [`material`], [`scene`], [`session`])
//! combine core logic with a client to implement CLI commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod material;
pub mod scene;
pub mod session;
pub mod sweep;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
