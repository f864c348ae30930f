//! I/O helpers for sceneops commands.

pub mod config;
pub mod transport;
