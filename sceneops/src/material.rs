//! Create, assign, and mutate shared material assets.
//!
//! A material is created once per save path and then assigned by reference
//! to any number of nodes. Mutations go through `material_set_color`,
//! `material_set_float` or `material_set_texture` addressed at one node; the
//! editor edits the node's
//! *shared* material, so every other assignee observes the change and no
//! per-node instance copy is forked.
//!
//! Ordering is enforced by types: [`MaterialMutator::assign`] and the
//! mutation methods take a [`CreatedMaterial`], which only
//! [`MaterialMutator::create_material`] can produce after the create call
//! normalized to success. The token proves ordering only: the editor edits
//! whatever material the addressed node holds, so each [`StepReport`] records
//! the save path it was issued under for the caller to compare.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::core::node_ref::{InvalidReference, NodeRef, is_asset_path};
use crate::core::outcome::normalize;
use crate::core::types::{Condition, MaterialAsset, Rgba};
use crate::io::transport::{SkillArgs, SkillClient};

pub const CREATE_SKILL: &str = "material_create";
pub const ASSIGN_SKILL: &str = "material_assign";
pub const SET_COLOR_SKILL: &str = "material_set_color";
pub const SET_FLOAT_SKILL: &str = "material_set_float";
pub const SET_TEXTURE_SKILL: &str = "material_set_texture";

/// Texture slot written when no property is named.
pub const DEFAULT_TEXTURE_PROPERTY: &str = "_MainTex";

/// The create call for a material normalized to failure.
///
/// Fatal for that material's chain only.
#[derive(Debug, Clone, thiserror::Error)]
#[error("material create failed for {save_path}: {response}")]
pub struct CreateFailed {
    pub save_path: String,
    pub response: Value,
}

/// A material the remote acknowledged creating.
///
/// Only obtainable from [`MaterialMutator::create_material`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedMaterial {
    asset: MaterialAsset,
}

impl CreatedMaterial {
    pub fn save_path(&self) -> &str {
        &self.asset.save_path
    }
}

/// Verdict of one assign or mutation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Applied,
    Failed,
    /// The node reference was malformed; no call was issued.
    Rejected { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub skill: String,
    /// Save path of the material this step was issued under.
    pub material: String,
    pub target: String,
    /// Property touched by a mutation step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    pub status: StepStatus,
}

impl StepReport {
    pub fn applied(&self) -> bool {
        self.status == StepStatus::Applied
    }

    /// The condition this step surfaces, if it did not apply.
    pub fn condition(&self) -> Option<Condition> {
        match &self.status {
            StepStatus::Applied => None,
            StepStatus::Failed => Some(Condition::StepFailed {
                skill: self.skill.clone(),
                target: self.target.clone(),
            }),
            StepStatus::Rejected { reason } => Some(Condition::InvalidReference {
                target: self.target.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Material lifecycle as seen by the client.
///
/// There is no deleted state; materials are never swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MaterialState {
    /// Never acknowledged by the remote (not attempted, or the create failed).
    Unrequested,
    Created,
    Assigned { assignees: u32 },
    Mutated { assignees: u32, mutations: u32 },
}

/// A full create → assign → mutate chain for one material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialPlan {
    pub asset: MaterialAsset,
    pub assignees: Vec<NodeRef>,
    pub color: Option<Rgba>,
    /// Explicit property to mutate. `None` tries every configured name.
    pub property: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub save_path: String,
    pub state: MaterialState,
    /// Every assign and mutation step, in issue order.
    pub steps: Vec<StepReport>,
    pub conditions: Vec<Condition>,
}

impl ChainReport {
    pub fn succeeded(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Shared-resource mutator bound to one skill client.
pub struct MaterialMutator<'a, C: SkillClient> {
    client: &'a C,
    color_properties: Vec<String>,
}

impl<'a, C: SkillClient> MaterialMutator<'a, C> {
    /// Mutator trying `_BaseColor` then `_Color` for compatibility writes.
    pub fn new(client: &'a C) -> Self {
        Self::with_color_properties(
            client,
            vec!["_BaseColor".to_string(), "_Color".to_string()],
        )
    }

    pub fn with_color_properties(client: &'a C, color_properties: Vec<String>) -> Self {
        Self {
            client,
            color_properties,
        }
    }

    /// Issue exactly one `material_create` call.
    ///
    /// A failed verdict returns a [`CreateFailed`] error; callers that need
    /// to tell it apart from transport errors use `downcast_ref`.
    #[instrument(skip(self), fields(save_path = %asset.save_path))]
    pub fn create_material(&self, asset: &MaterialAsset) -> Result<CreatedMaterial> {
        let mut args = SkillArgs::new();
        args.insert("name".to_string(), Value::String(asset.name.clone()));
        args.insert(
            "savePath".to_string(),
            Value::String(asset.save_path.clone()),
        );
        let response = self
            .client
            .invoke(CREATE_SKILL, &args)
            .with_context(|| format!("create material {}", asset.save_path))?;
        if !normalize(&response) {
            warn!(%response, "material create failed");
            return Err(CreateFailed {
                save_path: asset.save_path.clone(),
                response,
            }
            .into());
        }
        debug!("material created");
        Ok(CreatedMaterial {
            asset: asset.clone(),
        })
    }

    /// Assign the material asset to `node`'s renderer.
    pub fn assign(&self, material: &CreatedMaterial, node: &NodeRef) -> Result<StepReport> {
        let mut extra = SkillArgs::new();
        extra.insert(
            "materialPath".to_string(),
            Value::String(material.save_path().to_string()),
        );
        self.node_step(ASSIGN_SKILL, material, node, None, extra)
    }

    /// Set `property` on the shared material reachable from `node`.
    ///
    /// One call regardless of how many nodes share the material. A path that
    /// the editor would read as an asset path is rejected without a call.
    pub fn set_color(
        &self,
        material: &CreatedMaterial,
        node: &NodeRef,
        color: Rgba,
        property: &str,
    ) -> Result<StepReport> {
        self.node_step(
            SET_COLOR_SKILL,
            material,
            node,
            Some(property),
            color_args(color, property),
        )
    }

    /// Set one logical color under every configured property name.
    ///
    /// Render pipelines disagree on the name (`_BaseColor` vs `_Color`), so
    /// some of these calls are expected to fail. The write counts as applied
    /// when at least one name took.
    pub fn set_color_compat(
        &self,
        material: &CreatedMaterial,
        node: &NodeRef,
        color: Rgba,
    ) -> Result<ColorWrite> {
        let mut steps = Vec::with_capacity(self.color_properties.len());
        for property in &self.color_properties {
            let step = self.set_color(material, node, color, property)?;
            let rejected = matches!(step.status, StepStatus::Rejected { .. });
            steps.push(step);
            // A malformed reference fails identically for every name.
            if rejected {
                break;
            }
        }
        Ok(ColorWrite { steps })
    }

    /// Set a float property on the shared material reachable from `node`.
    pub fn set_float(
        &self,
        material: &CreatedMaterial,
        node: &NodeRef,
        property: &str,
        value: f32,
    ) -> Result<StepReport> {
        let mut extra = SkillArgs::new();
        extra.insert(
            "propertyName".to_string(),
            Value::String(property.to_string()),
        );
        extra.insert("value".to_string(), Value::from(value));
        self.node_step(SET_FLOAT_SKILL, material, node, Some(property), extra)
    }

    /// Bind the texture asset at `texture_path` on the shared material
    /// reachable from `node`, under `property` or [`DEFAULT_TEXTURE_PROPERTY`].
    pub fn set_texture(
        &self,
        material: &CreatedMaterial,
        node: &NodeRef,
        texture_path: &str,
        property: Option<&str>,
    ) -> Result<StepReport> {
        let property = property.unwrap_or(DEFAULT_TEXTURE_PROPERTY);
        let mut extra = SkillArgs::new();
        extra.insert(
            "texturePath".to_string(),
            Value::String(texture_path.to_string()),
        );
        extra.insert(
            "propertyName".to_string(),
            Value::String(property.to_string()),
        );
        self.node_step(SET_TEXTURE_SKILL, material, node, Some(property), extra)
    }

    /// Set `property` directly on the asset, addressed by its save path.
    ///
    /// The editor treats a `path` starting with `Assets/` or ending in `.mat`
    /// as an asset path rather than a node path; a save path matching neither
    /// would be looked up as a node, so it is rejected without a call.
    pub fn set_color_on_asset(
        &self,
        material: &CreatedMaterial,
        color: Rgba,
        property: &str,
    ) -> Result<StepReport> {
        let save_path = material.save_path();
        let mut report = StepReport {
            skill: SET_COLOR_SKILL.to_string(),
            material: save_path.to_string(),
            target: save_path.to_string(),
            property: Some(property.to_string()),
            status: StepStatus::Failed,
        };
        if !is_asset_path(save_path) {
            report.status = StepStatus::Rejected {
                reason: format!("'{save_path}' is not a material asset path"),
            };
            return Ok(report);
        }
        let mut args = color_args(color, property);
        args.insert("path".to_string(), Value::String(save_path.to_string()));
        let response = self
            .client
            .invoke(SET_COLOR_SKILL, &args)
            .with_context(|| format!("{SET_COLOR_SKILL} on {save_path}"))?;
        report.status = verdict(&response);
        Ok(report)
    }

    /// Run create → assign (every node) → one color mutation.
    ///
    /// A failed create skips everything else and reports `CreateFailed`. A
    /// failed assignment is reported and the remaining assignments still run.
    /// The color is written once, through the first node whose assignment
    /// applied and that mutation skills address as a node; the other
    /// assignees see it through the shared material. If every applied assignee
    /// is a path the editor would read as an asset path, the mutation is
    /// rejected locally.
    #[instrument(
        skip_all,
        fields(save_path = %plan.asset.save_path, assignees = plan.assignees.len())
    )]
    pub fn run_chain(&self, plan: &MaterialPlan) -> Result<ChainReport> {
        let mut report = ChainReport {
            save_path: plan.asset.save_path.clone(),
            state: MaterialState::Unrequested,
            steps: Vec::new(),
            conditions: Vec::new(),
        };

        let material = match self.create_material(&plan.asset) {
            Ok(material) => material,
            Err(err) => {
                if let Some(failed) = err.downcast_ref::<CreateFailed>() {
                    report.conditions.push(Condition::CreateFailed {
                        save_path: failed.save_path.clone(),
                    });
                    return Ok(report);
                }
                return Err(err);
            }
        };
        report.state = MaterialState::Created;

        let mut assignees = 0u32;
        let mut first_assigned: Option<&NodeRef> = None;
        let mut mutation_target: Option<&NodeRef> = None;
        for node in &plan.assignees {
            let step = self.assign(&material, node)?;
            if step.applied() {
                assignees += 1;
                first_assigned.get_or_insert(node);
                if node.resolve_for_mutation().is_ok() {
                    mutation_target.get_or_insert(node);
                }
            }
            record(&mut report, step);
        }
        if assignees > 0 {
            report.state = MaterialState::Assigned { assignees };
        }

        let Some(color) = plan.color else {
            return Ok(report);
        };
        let Some(target) = mutation_target.or(first_assigned) else {
            warn!("no assignment applied; skipping color mutation");
            return Ok(report);
        };

        let applied = match &plan.property {
            Some(property) => {
                let step = self.set_color(&material, target, color, property)?;
                let applied = step.applied();
                record(&mut report, step);
                applied
            }
            None => {
                let write = self.set_color_compat(&material, target, color)?;
                let applied = write.applied();
                if applied {
                    // Individual names that did not take are expected here.
                    report.steps.extend(write.steps);
                } else {
                    for step in write.steps {
                        record(&mut report, step);
                    }
                }
                applied
            }
        };
        if applied {
            report.state = MaterialState::Mutated {
                assignees,
                mutations: 1,
            };
        }

        info!(
            state = ?report.state,
            conditions = report.conditions.len(),
            "material chain finished"
        );
        Ok(report)
    }

    fn node_step(
        &self,
        skill: &str,
        material: &CreatedMaterial,
        node: &NodeRef,
        property: Option<&str>,
        extra: SkillArgs,
    ) -> Result<StepReport> {
        let mut report = StepReport {
            skill: skill.to_string(),
            material: material.save_path().to_string(),
            target: node.to_string(),
            property: property.map(str::to_string),
            status: StepStatus::Failed,
        };
        let mut args = match resolve_for(skill, node) {
            Ok(args) => args,
            Err(err) => {
                warn!(skill, target = %report.target, error = %err, "rejected node reference");
                report.status = StepStatus::Rejected {
                    reason: err.to_string(),
                };
                return Ok(report);
            }
        };
        args.extend(extra);
        let response = self
            .client
            .invoke(skill, &args)
            .with_context(|| format!("{skill} on '{}'", report.target))?;
        report.status = verdict(&response);
        if report.status == StepStatus::Failed {
            warn!(skill, target = %report.target, %response, "step failed");
        }
        Ok(report)
    }
}

/// Per-name results of a compatibility color write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorWrite {
    pub steps: Vec<StepReport>,
}

impl ColorWrite {
    pub fn applied(&self) -> bool {
        self.steps.iter().any(StepReport::applied)
    }
}

/// Assignment always looks up a node; the mutation skills check for asset
/// addressing first.
fn resolve_for(skill: &str, node: &NodeRef) -> Result<SkillArgs, InvalidReference> {
    if skill == ASSIGN_SKILL {
        node.resolve()
    } else {
        node.resolve_for_mutation()
    }
}

fn verdict(response: &Value) -> StepStatus {
    if normalize(response) {
        StepStatus::Applied
    } else {
        StepStatus::Failed
    }
}

fn record(report: &mut ChainReport, step: StepReport) {
    if let Some(condition) = step.condition() {
        report.conditions.push(condition);
    }
    report.steps.push(step);
}

fn color_args(color: Rgba, property: &str) -> SkillArgs {
    let mut args = SkillArgs::new();
    args.insert("r".to_string(), Value::from(color.r));
    args.insert("g".to_string(), Value::from(color.g));
    args.insert("b".to_string(), Value::from(color.b));
    args.insert("a".to_string(), Value::from(color.a));
    args.insert(
        "propertyName".to_string(),
        Value::String(property.to_string()),
    );
    args
}
