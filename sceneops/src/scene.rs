//! Scene object creation helpers.
//!
//! Creation does not return an identifier: the editor only echoes the name,
//! and creating the same name twice yields two indistinguishable objects.
//! Cleanup of anything spawned here goes through [`crate::sweep`].

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::outcome::normalize;
use crate::io::transport::{SkillArgs, SkillClient};

pub const CREATE_OBJECT_SKILL: &str = "gameobject_create";
pub const SET_PARENT_SKILL: &str = "gameobject_set_parent";

/// A primitive object to create.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpec {
    pub name: String,
    /// Primitive mesh such as `Cube` or `Sphere`; `None` creates an empty object.
    pub primitive: Option<String>,
    pub position: [f32; 3],
}

impl ObjectSpec {
    pub fn cube(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primitive: Some("Cube".to_string()),
            position: [0.0, 0.0, 0.0],
        }
    }

    pub fn at(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }
}

/// Create one object and return the normalized verdict.
pub fn create_object<C: SkillClient>(client: &C, spec: &ObjectSpec) -> Result<bool> {
    let mut args = SkillArgs::new();
    args.insert("name".to_string(), Value::String(spec.name.clone()));
    if let Some(primitive) = &spec.primitive {
        args.insert("primitiveType".to_string(), Value::String(primitive.clone()));
    }
    let [x, y, z] = spec.position;
    args.insert("x".to_string(), Value::from(x));
    args.insert("y".to_string(), Value::from(y));
    args.insert("z".to_string(), Value::from(z));

    let response = client
        .invoke(CREATE_OBJECT_SKILL, &args)
        .with_context(|| format!("create object '{}'", spec.name))?;
    let created = normalize(&response);
    if created {
        debug!(name = %spec.name, "object created");
    } else {
        warn!(name = %spec.name, %response, "object create failed");
    }
    Ok(created)
}

/// Parent the first object named `child` under the first object named `parent`.
pub fn set_parent<C: SkillClient>(client: &C, child: &str, parent: &str) -> Result<bool> {
    let mut args = SkillArgs::new();
    args.insert("childName".to_string(), Value::String(child.to_string()));
    args.insert("parentName".to_string(), Value::String(parent.to_string()));
    let response = client
        .invoke(SET_PARENT_SKILL, &args)
        .with_context(|| format!("parent '{child}' under '{parent}'"))?;
    Ok(normalize(&response))
}
