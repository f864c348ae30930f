//! A run against one remote editor.
//!
//! [`Session::connect`] probes availability exactly once; an unreachable
//! remote fails with [`Unavailable`] before any skill call is issued. After
//! that the session only sequences the sweep and material layers.

use anyhow::Result;
use tracing::{info, instrument};

use crate::core::types::{Condition, SweepCandidate};
use crate::io::config::ClientConfig;
use crate::io::transport::SkillClient;
use crate::material::{ChainReport, MaterialMutator, MaterialPlan};
use crate::scene::{ObjectSpec, create_object};
use crate::sweep::{CleanupReport, cleanup};

/// The remote did not answer the availability probe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("skill server unavailable at {endpoint}")]
pub struct Unavailable {
    pub endpoint: String,
}

impl Unavailable {
    pub fn condition(&self) -> Condition {
        Condition::Unavailable {
            endpoint: self.endpoint.clone(),
        }
    }
}

pub struct Session<C: SkillClient> {
    client: C,
    color_properties: Vec<String>,
}

impl<C: SkillClient> Session<C> {
    /// Probe the remote once; fail with [`Unavailable`] if it is down.
    #[instrument(skip_all)]
    pub fn connect(client: C, cfg: &ClientConfig) -> Result<Self> {
        if !client.probe_availability() {
            return Err(Unavailable {
                endpoint: client.endpoint(),
            }
            .into());
        }
        info!(endpoint = %client.endpoint(), "connected");
        Ok(Self {
            client,
            color_properties: cfg.material.color_properties.clone(),
        })
    }

    /// Drain every candidate of `catalog`.
    pub fn cleanup(&self, catalog: &[SweepCandidate]) -> Result<CleanupReport> {
        cleanup(&self.client, catalog)
    }

    pub fn run_material_chain(&self, plan: &MaterialPlan) -> Result<ChainReport> {
        self.mutator().run_chain(plan)
    }

    /// Run independent chains; a failed create only stops its own chain.
    pub fn run_material_chains(&self, plans: &[MaterialPlan]) -> Result<Vec<ChainReport>> {
        let mutator = self.mutator();
        plans.iter().map(|plan| mutator.run_chain(plan)).collect()
    }

    /// Create `count` objects from `spec`; returns how many the remote confirmed.
    pub fn spawn(&self, spec: &ObjectSpec, count: u32) -> Result<u32> {
        let mut created = 0;
        for _ in 0..count {
            if create_object(&self.client, spec)? {
                created += 1;
            }
        }
        Ok(created)
    }

    pub fn mutator(&self) -> MaterialMutator<'_, C> {
        MaterialMutator::with_color_properties(&self.client, self.color_properties.clone())
    }
}
