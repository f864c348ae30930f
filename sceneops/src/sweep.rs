//! Drain same-named objects out of the remote scene.
//!
//! The editor exposes no object identifiers and no "count by name" query, so a
//! name denotes an unknown-size multiset. The only primitive is
//! `gameobject_delete {name}`, which removes one match per call. A drain
//! repeats that call until the remote says "not found" or the attempt bound
//! runs out.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::core::outcome::normalize;
use crate::core::types::{Condition, SweepCandidate, SweepReport, SweepTermination};
use crate::io::transport::{SkillArgs, SkillClient};

pub const DELETE_SKILL: &str = "gameobject_delete";

/// Reports for every candidate of one cleanup pass, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub reports: Vec<SweepReport>,
}

impl CleanupReport {
    /// Total confirmed deletions across all candidates.
    pub fn deleted(&self) -> u32 {
        self.reports.iter().map(|report| report.attempts_used).sum()
    }

    /// One `SweepAborted` condition per candidate that hit its bound.
    pub fn conditions(&self) -> Vec<Condition> {
        self.reports
            .iter()
            .filter(|report| report.aborted())
            .map(|report| Condition::SweepAborted {
                name: report.name.clone(),
                max_attempts: report.max_attempts,
            })
            .collect()
    }
}

/// Context on a cleanup pass that a transport error stopped.
///
/// `completed` holds the reports of every candidate drained before the
/// failure, so deletions already made are not lost. Recover it with
/// `err.downcast_ref::<CleanupInterrupted>()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "cleanup interrupted at '{}' after {} deletion(s)",
    .interrupted,
    .completed.deleted()
)]
pub struct CleanupInterrupted {
    pub completed: CleanupReport,
    /// Candidate whose drain failed.
    pub interrupted: String,
}

/// Delete every object named exactly `candidate.name`, up to
/// `candidate.max_attempts` deletions.
///
/// A call that normalizes to failure means no object with that name is left;
/// that is the normal terminal state ([`SweepTermination::Exhausted`]). If the
/// bound is reached while the remote still reports deletions, the drain stops
/// with [`SweepTermination::Aborted`]. A bound of zero issues no calls.
///
/// Transport errors abort the drain and propagate.
#[instrument(skip(client), fields(name = %candidate.name, max_attempts = candidate.max_attempts))]
pub fn drain<C: SkillClient>(client: &C, candidate: &SweepCandidate) -> Result<SweepReport> {
    let args = delete_args(&candidate.name);
    let mut remaining = candidate.max_attempts;
    let mut attempts_used = 0u32;
    let mut calls = 0u32;

    let termination = loop {
        if remaining == 0 {
            break SweepTermination::Aborted;
        }
        let response = client
            .invoke(DELETE_SKILL, &args)
            .with_context(|| format!("delete '{}'", candidate.name))?;
        calls += 1;
        if !normalize(&response) {
            break SweepTermination::Exhausted;
        }
        attempts_used += 1;
        remaining -= 1;
        debug!(deleted = attempts_used, "deleted one instance");
    };

    match termination {
        SweepTermination::Exhausted => {
            info!(deleted = attempts_used, calls, "sweep drained")
        }
        SweepTermination::Aborted => warn!(
            deleted = attempts_used,
            calls, "sweep aborted: attempt bound reached while deletions still succeed"
        ),
    }

    Ok(SweepReport {
        name: candidate.name.clone(),
        max_attempts: candidate.max_attempts,
        attempts_used,
        calls,
        termination,
    })
}

/// Drain each candidate independently, in catalog order.
///
/// An aborted candidate does not stop the pass; a transport error does, and
/// the error carries a [`CleanupInterrupted`] with the reports so far.
#[instrument(skip_all, fields(candidates = catalog.len()))]
pub fn cleanup<C: SkillClient>(client: &C, catalog: &[SweepCandidate]) -> Result<CleanupReport> {
    let mut reports = Vec::with_capacity(catalog.len());
    for candidate in catalog {
        match drain(client, candidate) {
            Ok(report) => reports.push(report),
            Err(err) => {
                return Err(err.context(CleanupInterrupted {
                    completed: CleanupReport { reports },
                    interrupted: candidate.name.clone(),
                }));
            }
        }
    }
    Ok(CleanupReport { reports })
}

fn delete_args(name: &str) -> SkillArgs {
    let mut args = SkillArgs::new();
    args.insert("name".to_string(), Value::String(name.to_string()));
    args
}
