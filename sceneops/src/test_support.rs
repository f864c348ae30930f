//! Test-only skill clients.
//!
//! - [`ScriptedClient`] replays queued responses and records every call.
//! - [`FakeScene`] is an in-memory editor: a name-indexed multiset of objects
//!   plus an asset database of materials, answering in the same loose shapes
//!   the real skill server uses.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use serde_json::{Value, json};

use crate::core::types::Rgba;
use crate::io::config::{ClientConfig, write_config};
use crate::io::transport::{SkillArgs, SkillClient};

/// One recorded skill invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub skill: String,
    pub args: SkillArgs,
}

pub fn success() -> Value {
    json!({"success": true})
}

pub fn failure(message: &str) -> Value {
    json!({"error": message})
}

pub fn deleted(name: &str) -> Value {
    json!({"success": true, "deleted": name})
}

pub fn not_found(name: &str) -> Value {
    json!({"error": format!("GameObject not found: {name}")})
}

/// Client that answers from a fixed queue.
///
/// Running out of responses is a transport error, which lets tests exercise
/// error propagation. [`ScriptedClient::repeating`] never runs out.
pub struct ScriptedClient {
    responses: RefCell<VecDeque<Value>>,
    repeat: Option<Value>,
    available: bool,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            repeat: None,
            available: true,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn repeating(response: Value) -> Self {
        Self {
            repeat: Some(response),
            ..Self::new(Vec::new())
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }
}

impl SkillClient for ScriptedClient {
    fn invoke(&self, skill: &str, args: &SkillArgs) -> Result<Value> {
        self.calls.borrow_mut().push(RecordedCall {
            skill: skill.to_string(),
            args: args.clone(),
        });
        if let Some(response) = self.responses.borrow_mut().pop_front() {
            return Ok(response);
        }
        self.repeat
            .clone()
            .ok_or_else(|| anyhow!("scripted client has no response for {skill}"))
    }

    fn probe_availability(&self) -> bool {
        self.available
    }

    fn endpoint(&self) -> String {
        "scripted://".to_string()
    }
}

#[derive(Debug, Clone)]
struct FakeObject {
    name: String,
    parent: Option<u64>,
    material: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct FakeMaterial {
    colors: BTreeMap<String, Rgba>,
    floats: BTreeMap<String, f32>,
    textures: BTreeMap<String, String>,
}

/// In-memory stand-in for the editor.
///
/// Names are not unique; lookups by name hit the oldest surviving match.
/// Materials are shared by reference: assigning stores the asset path on the
/// object, and mutations through any assignee edit the single asset.
pub struct FakeScene {
    objects: RefCell<BTreeMap<u64, FakeObject>>,
    materials: RefCell<BTreeMap<String, FakeMaterial>>,
    next_id: Cell<u64>,
    color_properties: Option<Vec<String>>,
    rejected_paths: Vec<String>,
    textures: Vec<String>,
    available: bool,
    calls: RefCell<Vec<RecordedCall>>,
}

impl Default for FakeScene {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeScene {
    pub fn new() -> Self {
        Self {
            objects: RefCell::new(BTreeMap::new()),
            materials: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
            color_properties: None,
            rejected_paths: Vec::new(),
            textures: Vec::new(),
            available: true,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Only these color property names exist on created materials.
    pub fn with_color_properties(mut self, names: &[&str]) -> Self {
        self.color_properties = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// `material_create` fails for this save path.
    pub fn rejecting_material(mut self, save_path: &str) -> Self {
        self.rejected_paths.push(save_path.to_string());
        self
    }

    /// Register a texture asset that `material_set_texture` can bind.
    pub fn with_texture(mut self, texture_path: &str) -> Self {
        self.textures.push(texture_path.to_string());
        self
    }

    pub fn offline(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn spawn(&self, name: &str) -> u64 {
        self.insert(name, None)
    }

    pub fn spawn_many(&self, name: &str, count: usize) {
        for _ in 0..count {
            self.spawn(name);
        }
    }

    pub fn spawn_child(&self, name: &str, parent: u64) -> u64 {
        self.insert(name, Some(parent))
    }

    pub fn count(&self, name: &str) -> usize {
        self.objects
            .borrow()
            .values()
            .filter(|object| object.name == name)
            .count()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, skill: &str) -> Vec<RecordedCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.skill == skill)
            .cloned()
            .collect()
    }

    pub fn material_color(&self, save_path: &str, property: &str) -> Option<Rgba> {
        self.materials
            .borrow()
            .get(save_path)
            .and_then(|material| material.colors.get(property).copied())
    }

    pub fn material_float(&self, save_path: &str, property: &str) -> Option<f32> {
        self.materials
            .borrow()
            .get(save_path)
            .and_then(|material| material.floats.get(property).copied())
    }

    pub fn material_texture(&self, save_path: &str, property: &str) -> Option<String> {
        self.materials
            .borrow()
            .get(save_path)
            .and_then(|material| material.textures.get(property).cloned())
    }

    /// Color observed through the material currently assigned to `name`.
    pub fn node_color(&self, name: &str, property: &str) -> Option<Rgba> {
        let path = self.assigned_material(name)?;
        self.material_color(&path, property)
    }

    pub fn assigned_material(&self, name: &str) -> Option<String> {
        let objects = self.objects.borrow();
        objects
            .values()
            .find(|object| object.name == name)
            .and_then(|object| object.material.clone())
    }

    pub fn material_count(&self) -> usize {
        self.materials.borrow().len()
    }

    fn insert(&self, name: &str, parent: Option<u64>) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.objects.borrow_mut().insert(
            id,
            FakeObject {
                name: name.to_string(),
                parent,
                material: None,
            },
        );
        id
    }

    fn find_by_name(&self, name: &str) -> Option<u64> {
        self.objects
            .borrow()
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| *id)
    }

    fn find_child(&self, parent: u64, name: &str) -> Option<u64> {
        self.objects
            .borrow()
            .iter()
            .find(|(_, object)| object.parent == Some(parent) && object.name == name)
            .map(|(id, _)| *id)
    }

    fn find_target(&self, args: &SkillArgs) -> std::result::Result<u64, Value> {
        if let Some(path) = args.get("path").and_then(Value::as_str) {
            let mut segments = path.split('/');
            let root = segments.next().unwrap_or_default();
            let mut current = self
                .find_by_name(root)
                .ok_or_else(|| failure(&format!("GameObject not found: {path}")))?;
            for segment in segments {
                current = self
                    .find_child(current, segment)
                    .ok_or_else(|| failure(&format!("GameObject not found: {path}")))?;
            }
            return Ok(current);
        }
        let name = args.get("name").and_then(Value::as_str).unwrap_or_default();
        self.find_by_name(name)
            .ok_or_else(|| failure(&format!("GameObject not found: {name}")))
    }

    fn material_of(&self, id: u64) -> std::result::Result<String, Value> {
        self.objects
            .borrow()
            .get(&id)
            .and_then(|object| object.material.clone())
            .ok_or_else(|| failure("No material assigned to renderer"))
    }

    fn handle(&self, skill: &str, args: &SkillArgs) -> std::result::Result<Value, Value> {
        match skill {
            "gameobject_create" => {
                let name = str_arg(args, "name")?;
                self.spawn(&name);
                Ok(json!({"success": true, "name": name}))
            }
            "gameobject_set_parent" => {
                let child = str_arg(args, "childName")?;
                let parent = str_arg(args, "parentName")?;
                let child_id = self
                    .find_by_name(&child)
                    .ok_or_else(|| failure(&format!("GameObject not found: {child}")))?;
                let parent_id = self
                    .find_by_name(&parent)
                    .ok_or_else(|| failure(&format!("GameObject not found: {parent}")))?;
                if let Some(object) = self.objects.borrow_mut().get_mut(&child_id) {
                    object.parent = Some(parent_id);
                }
                Ok(json!({"status": "success"}))
            }
            "gameobject_delete" => {
                let name = str_arg(args, "name")?;
                let id = self.find_by_name(&name).ok_or_else(|| not_found(&name))?;
                let mut objects = self.objects.borrow_mut();
                objects.remove(&id);
                for object in objects.values_mut() {
                    if object.parent == Some(id) {
                        object.parent = None;
                    }
                }
                Ok(deleted(&name))
            }
            "material_create" => {
                let save_path = str_arg(args, "savePath")?;
                if self.rejected_paths.contains(&save_path) {
                    return Err(failure("Shader not found: Universal Render Pipeline/Lit"));
                }
                self.materials
                    .borrow_mut()
                    .insert(save_path.clone(), FakeMaterial::default());
                Ok(json!({"success": true, "path": save_path}))
            }
            "material_assign" => {
                let material_path = str_arg(args, "materialPath")?;
                if !self.materials.borrow().contains_key(&material_path) {
                    return Err(failure(&format!("Material not found: {material_path}")));
                }
                let id = self.find_target(args)?;
                if let Some(object) = self.objects.borrow_mut().get_mut(&id) {
                    object.material = Some(material_path.clone());
                }
                Ok(json!({"status": "success", "material": material_path}))
            }
            "material_set_color" => {
                let property = str_arg(args, "propertyName")?;
                let path = self.mutation_target(args)?;
                if let Some(allowed) = &self.color_properties {
                    if !allowed.contains(&property) {
                        return Err(failure(&format!("Material has no property {property}")));
                    }
                }
                let color = Rgba {
                    r: f32_arg(args, "r"),
                    g: f32_arg(args, "g"),
                    b: f32_arg(args, "b"),
                    a: f32_arg(args, "a"),
                };
                self.edit_material(&path, |material| {
                    material.colors.insert(property.clone(), color);
                });
                Ok(json!({"result": {"success": true}}))
            }
            "material_set_float" => {
                let property = str_arg(args, "propertyName")?;
                let path = self.mutation_target(args)?;
                let value = f32_arg(args, "value");
                self.edit_material(&path, |material| {
                    material.floats.insert(property.clone(), value);
                });
                Ok(json!({"result": {"status": "success"}}))
            }
            "material_set_texture" => {
                let texture_path = str_arg(args, "texturePath")?;
                let property = str_arg(args, "propertyName")?;
                let path = self.mutation_target(args)?;
                if !self.textures.contains(&texture_path) {
                    return Err(failure(&format!("Texture not found: {texture_path}")));
                }
                self.edit_material(&path, |material| {
                    material.textures.insert(property.clone(), texture_path.clone());
                });
                Ok(json!({"success": true, "texture": texture_path}))
            }
            other => Err(failure(&format!("Unknown skill: {other}"))),
        }
    }

    /// Asset path addressing (`Assets/...` or `*.mat`) edits the asset
    /// directly; anything else resolves a node and follows its material.
    fn mutation_target(&self, args: &SkillArgs) -> std::result::Result<String, Value> {
        if let Some(path) = args.get("path").and_then(Value::as_str) {
            if path.starts_with("Assets/") || path.ends_with(".mat") {
                if !self.materials.borrow().contains_key(path) {
                    return Err(failure(&format!("Material asset not found: {path}")));
                }
                return Ok(path.to_string());
            }
        }
        let id = self.find_target(args)?;
        self.material_of(id)
    }

    fn edit_material(&self, path: &str, edit: impl FnOnce(&mut FakeMaterial)) {
        if let Some(material) = self.materials.borrow_mut().get_mut(path) {
            edit(material);
        }
    }
}

impl SkillClient for FakeScene {
    fn invoke(&self, skill: &str, args: &SkillArgs) -> Result<Value> {
        self.calls.borrow_mut().push(RecordedCall {
            skill: skill.to_string(),
            args: args.clone(),
        });
        Ok(self.handle(skill, args).unwrap_or_else(|err| err))
    }

    fn probe_availability(&self) -> bool {
        self.available
    }

    fn endpoint(&self) -> String {
        "fake://scene".to_string()
    }
}

fn str_arg(args: &SkillArgs, key: &str) -> std::result::Result<String, Value> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| failure(&format!("{key} is required")))
}

fn f32_arg(args: &SkillArgs, key: &str) -> f32 {
    args.get(key).and_then(Value::as_f64).unwrap_or(1.0) as f32
}

/// A config file written into a fresh temp directory.
pub struct ConfigFixture {
    pub dir: tempfile::TempDir,
    pub path: PathBuf,
}

impl ConfigFixture {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sceneops.toml");
        write_config(&path, cfg)?;
        Ok(Self { dir, path })
    }
}
