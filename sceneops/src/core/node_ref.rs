//! Addressing for scene nodes.
//!
//! The editor resolves a target either by exact name (full-string equality,
//! never substring or wildcard) or by a `/`-joined parent→child path whose
//! root segment is matched by exact name. Resolution here only shapes the
//! addressing arguments; it never checks that the node exists.

use std::fmt;

use serde_json::{Map, Value};

/// Separator between path segments in the remote addressing form.
pub const PATH_SEPARATOR: char = '/';
const PATH_SEPARATOR_STR: &str = "/";

/// A mutation skill reads a `path` with this prefix as a material asset.
const ASSET_PATH_PREFIX: &str = "Assets/";
/// A mutation skill reads a `path` with this suffix as a material asset.
const MATERIAL_SUFFIX: &str = ".mat";

const NAME_ARG: &str = "name";
const PATH_ARG: &str = "path";

/// A target in the remote scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// Exact-match name. Several remote objects may share it.
    Name(String),
    /// Hierarchical path; each segment is a child of the previous one.
    Path(Vec<String>),
}

/// A reference that is malformed before it ever reaches the remote.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReference {
    #[error("node name must not be empty")]
    EmptyName,
    #[error("node path must have at least one segment")]
    EmptyPath,
    #[error("node path segment {index} is empty")]
    EmptySegment { index: usize },
    #[error("node path segment {index} ('{segment}') contains '/'")]
    SeparatorInSegment { index: usize, segment: String },
    #[error("node path '{path}' would be read as a material asset path")]
    AssetPathLike { path: String },
}

/// Whether the editor's material mutation skills treat `path` as an asset
/// path instead of a node path.
pub fn is_asset_path(path: &str) -> bool {
    path.starts_with(ASSET_PATH_PREFIX) || path.ends_with(MATERIAL_SUFFIX)
}

impl NodeRef {
    pub fn name(name: impl Into<String>) -> Self {
        NodeRef::Name(name.into())
    }

    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NodeRef::Path(segments.into_iter().map(Into::into).collect())
    }

    /// Split a `/`-delimited string into a [`NodeRef::Path`].
    ///
    /// Segments are kept verbatim, so `"A//B"` yields an empty segment that
    /// [`NodeRef::resolve`] later rejects.
    pub fn parse_path(raw: &str) -> Self {
        if raw.is_empty() {
            return NodeRef::Path(Vec::new());
        }
        NodeRef::Path(raw.split(PATH_SEPARATOR).map(str::to_string).collect())
    }

    /// Check the reference for locally detectable malformations.
    pub fn validate(&self) -> Result<(), InvalidReference> {
        match self {
            NodeRef::Name(name) if name.is_empty() => Err(InvalidReference::EmptyName),
            NodeRef::Name(_) => Ok(()),
            NodeRef::Path(segments) if segments.is_empty() => Err(InvalidReference::EmptyPath),
            NodeRef::Path(segments) => {
                for (index, segment) in segments.iter().enumerate() {
                    if segment.is_empty() {
                        return Err(InvalidReference::EmptySegment { index });
                    }
                    if segment.contains(PATH_SEPARATOR) {
                        return Err(InvalidReference::SeparatorInSegment {
                            index,
                            segment: segment.clone(),
                        });
                    }
                }
                Ok(())
            }
        }
    }

    /// Produce the addressing arguments for a skill call.
    ///
    /// `Name(n)` becomes `{"name": n}`; `Path(s)` becomes `{"path": "a/b/c"}`.
    pub fn resolve(&self) -> Result<Map<String, Value>, InvalidReference> {
        self.validate()?;
        let mut args = Map::new();
        match self {
            NodeRef::Name(name) => {
                args.insert(NAME_ARG.to_string(), Value::String(name.clone()));
            }
            NodeRef::Path(segments) => {
                args.insert(PATH_ARG.to_string(), Value::String(joined(segments)));
            }
        }
        Ok(args)
    }

    /// Like [`NodeRef::resolve`], for skills that edit a node's material.
    ///
    /// Those skills check `path` for asset addressing before node lookup, so
    /// a node path such as `Assets/Cube` would never reach the node.
    pub fn resolve_for_mutation(&self) -> Result<Map<String, Value>, InvalidReference> {
        let args = self.resolve()?;
        if let NodeRef::Path(segments) = self {
            let path = joined(segments);
            if is_asset_path(&path) {
                return Err(InvalidReference::AssetPathLike { path });
            }
        }
        Ok(args)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Name(name) => write!(f, "{name}"),
            NodeRef::Path(segments) => write!(f, "{}", joined(segments)),
        }
    }
}

fn joined(segments: &[String]) -> String {
    segments.join(PATH_SEPARATOR_STR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_resolves_to_exact_name_arg() {
        let args = NodeRef::name("Cube1").resolve().expect("resolve");
        assert_eq!(Value::Object(args), json!({"name": "Cube1"}));
    }

    #[test]
    fn path_resolves_to_joined_path_arg() {
        let args = NodeRef::path(["Parent", "Child", "Leaf"])
            .resolve()
            .expect("resolve");
        assert_eq!(Value::Object(args), json!({"path": "Parent/Child/Leaf"}));
    }

    #[test]
    fn single_segment_path_is_valid() {
        let args = NodeRef::path(["Root"]).resolve().expect("resolve");
        assert_eq!(Value::Object(args), json!({"path": "Root"}));
    }

    #[test]
    fn empty_path_is_invalid() {
        let err = NodeRef::Path(Vec::new()).resolve().unwrap_err();
        assert_eq!(err, InvalidReference::EmptyPath);
    }

    #[test]
    fn empty_name_is_invalid() {
        let err = NodeRef::name("").resolve().unwrap_err();
        assert_eq!(err, InvalidReference::EmptyName);
    }

    #[test]
    fn empty_segment_is_invalid() {
        let err = NodeRef::parse_path("A//B").resolve().unwrap_err();
        assert_eq!(err, InvalidReference::EmptySegment { index: 1 });
    }

    #[test]
    fn separator_inside_segment_is_invalid() {
        let err = NodeRef::path(["A", "B/C"]).resolve().unwrap_err();
        assert_eq!(
            err,
            InvalidReference::SeparatorInSegment {
                index: 1,
                segment: "B/C".to_string()
            }
        );
        assert_eq!(err.to_string(), "node path segment 1 ('B/C') contains '/'");
    }

    #[test]
    fn parse_path_splits_on_separator() {
        assert_eq!(
            NodeRef::parse_path("MatTestCube/ChildCube"),
            NodeRef::path(["MatTestCube", "ChildCube"])
        );
        assert_eq!(NodeRef::parse_path(""), NodeRef::Path(Vec::new()));
    }

    /// Names are passed verbatim; a slash in a name is not path syntax.
    #[test]
    fn name_containing_separator_is_not_split() {
        let args = NodeRef::name("A/B").resolve().expect("resolve");
        assert_eq!(Value::Object(args), json!({"name": "A/B"}));
    }

    #[test]
    fn display_renders_addressing_form() {
        assert_eq!(NodeRef::name("Cube").to_string(), "Cube");
        assert_eq!(NodeRef::path(["A", "B"]).to_string(), "A/B");
    }

    #[test]
    fn asset_like_path_is_rejected_for_mutation_only() {
        let node = NodeRef::path(["Assets", "Cube"]);
        assert!(node.resolve().is_ok());
        assert_eq!(
            node.resolve_for_mutation().unwrap_err(),
            InvalidReference::AssetPathLike {
                path: "Assets/Cube".to_string()
            }
        );
        assert!(
            NodeRef::path(["Props", "Glass.mat"])
                .resolve_for_mutation()
                .is_err()
        );
    }

    #[test]
    fn ordinary_refs_resolve_for_mutation() {
        let args = NodeRef::path(["Assets"])
            .resolve_for_mutation()
            .expect("resolve");
        assert_eq!(Value::Object(args), json!({"path": "Assets"}));
        let args = NodeRef::name("Assets/Cube")
            .resolve_for_mutation()
            .expect("resolve");
        assert_eq!(Value::Object(args), json!({"name": "Assets/Cube"}));
    }

    #[test]
    fn asset_path_rules() {
        assert!(is_asset_path("Assets/Materials/M.mat"));
        assert!(is_asset_path("M.mat"));
        assert!(!is_asset_path("Assets"));
        assert!(!is_asset_path("Cube1/ChildCube"));
    }
}
