//! Shared deterministic types for sweep and material operations.
//!
//! These types carry no I/O and are the vocabulary the orchestration layer
//! uses to report what happened to each chain or candidate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A hypothesis that zero or more remote objects share `name` exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepCandidate {
    pub name: String,
    /// Upper bound on confirmed deletions before the drain gives up.
    pub max_attempts: u32,
}

impl SweepCandidate {
    pub fn new(name: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            name: name.into(),
            max_attempts,
        }
    }
}

/// How a drain stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepTermination {
    /// The remote reported "not found"; the name is drained.
    Exhausted,
    /// The attempt bound ran out while the remote still reported deletions.
    Aborted,
}

/// Result of draining one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub name: String,
    pub max_attempts: u32,
    /// Confirmed deletions (calls that normalized to success).
    pub attempts_used: u32,
    /// Delete calls issued, including the terminal "not found" probe.
    pub calls: u32,
    pub termination: SweepTermination,
}

impl SweepReport {
    pub fn aborted(&self) -> bool {
        self.termination == SweepTermination::Aborted
    }
}

/// A material asset in the remote asset database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialAsset {
    pub name: String,
    /// Asset-database location, e.g. `Assets/Materials/M.mat`.
    pub save_path: String,
}

impl MaterialAsset {
    pub fn new(name: impl Into<String>, save_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            save_path: save_path.into(),
        }
    }
}

/// Linear RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const RED: Rgba = Rgba::opaque(1.0, 0.0, 0.0);
    pub const BLUE: Rgba = Rgba::opaque(0.0, 0.0, 1.0);

    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `r,g,b` or `r,g,b,a`; alpha defaults to `1.0`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let parts: Vec<f32> = raw
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f32>()
                    .map_err(|err| format!("invalid color component '{}': {err}", part.trim()))
            })
            .collect::<Result<_, _>>()?;
        let color = match parts.as_slice() {
            [r, g, b] => Rgba::opaque(*r, *g, *b),
            [r, g, b, a] => Rgba {
                r: *r,
                g: *g,
                b: *b,
                a: *a,
            },
            _ => return Err(format!("expected 3 or 4 components, got {}", parts.len())),
        };
        if [color.r, color.g, color.b, color.a]
            .iter()
            .any(|c| !(0.0..=1.0).contains(c))
        {
            return Err(format!("color components must be within 0..=1: {raw}"));
        }
        Ok(color)
    }
}

/// Conditions surfaced to the caller instead of being raised.
///
/// `Unavailable` and `CreateFailed` are fatal for their scope; the others are
/// reported and execution continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Remote not reachable at run start; no calls were issued.
    Unavailable { endpoint: String },
    /// Material creation normalized to failure; the chain was skipped.
    CreateFailed { save_path: String },
    /// An assign or mutation call normalized to failure.
    StepFailed { skill: String, target: String },
    /// A drain hit its attempt bound while the remote still reported success.
    SweepAborted { name: String, max_attempts: u32 },
    /// A node reference was rejected locally.
    InvalidReference { target: String, reason: String },
}

impl Condition {
    /// Fatal conditions stop their dependent chain (or the whole run).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Condition::Unavailable { .. } | Condition::CreateFailed { .. }
        )
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Unavailable { endpoint } => write!(f, "unavailable: {endpoint}"),
            Condition::CreateFailed { save_path } => write!(f, "create failed: {save_path}"),
            Condition::StepFailed { skill, target } => {
                write!(f, "step failed: {skill} on '{target}'")
            }
            Condition::SweepAborted { name, max_attempts } => write!(
                f,
                "sweep aborted: '{name}' still present after {max_attempts} deletions"
            ),
            Condition::InvalidReference { target, reason } => {
                write!(f, "invalid reference '{target}': {reason}")
            }
        }
    }
}
