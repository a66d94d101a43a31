//! The loaded 3D asset, seen only as a set of named mesh nodes.
//!
//! Original entities have no placement of their own; their geometry lives in
//! this asset and is addressed by node name.

use crate::render::{NodeAppearance, NodeHandle, NodeTag, SceneGraph};
use std::collections::HashSet;
use std::path::Path;

const GLB_MAGIC: u32 = 0x4654_6C67;
const GLB_CHUNK_JSON: u32 = 0x4E4F_534A;
const GLB_HEADER_LEN: usize = 12;
const GLB_CHUNK_HEADER_LEN: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read model at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed GLB: {0}")]
    InvalidGlb(&'static str),
    #[error("failed to parse glTF JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(serde::Deserialize)]
struct GltfDocument {
    #[serde(default)]
    nodes: Vec<GltfNode>,
}

#[derive(serde::Deserialize)]
struct GltfNode {
    name: Option<String>,
    mesh: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelAsset {
    pub name: String,
    node_names: Vec<String>,
}

impl ModelAsset {
    /// Duplicate names keep their first occurrence.
    pub fn from_node_names<I, N>(name: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut node_names = Vec::new();
        for node in names {
            let node = node.into();
            if seen.insert(node.clone()) {
                node_names.push(node);
            } else {
                log::warn!("Duplicate node name {:?} in model; keeping the first", node);
            }
        }
        Self {
            name: name.into(),
            node_names,
        }
    }

    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_gltf_bytes(name, &bytes)
    }

    /// Accepts binary GLB or plain glTF JSON and keeps named mesh nodes.
    pub fn from_gltf_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, AssetError> {
        let json = if read_u32(bytes, 0) == Some(GLB_MAGIC) {
            glb_json_chunk(bytes)?
        } else {
            bytes
        };
        let document: GltfDocument = serde_json::from_slice(json)?;
        let names = document
            .nodes
            .into_iter()
            .filter(|node| node.mesh.is_some())
            .filter_map(|node| node.name);
        Ok(Self::from_node_names(name, names))
    }

    pub fn node_names(&self) -> &[String] {
        &self.node_names
    }

    /// Registers every node with the scene, tagged by its name.
    pub fn attach<S: SceneGraph + ?Sized>(&self, scene: &mut S) -> Vec<NodeHandle> {
        let handles: Vec<NodeHandle> = self
            .node_names
            .iter()
            .map(|name| scene.insert_asset_node(NodeTag::from_name(name), NodeAppearance::default()))
            .collect();
        log::info!("Attached model '{}' with {} nodes", self.name, handles.len());
        handles
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn glb_json_chunk(bytes: &[u8]) -> Result<&[u8], AssetError> {
    let chunk_len = read_u32(bytes, GLB_HEADER_LEN).ok_or(AssetError::InvalidGlb("truncated header"))?;
    let chunk_type =
        read_u32(bytes, GLB_HEADER_LEN + 4).ok_or(AssetError::InvalidGlb("truncated header"))?;
    if chunk_type != GLB_CHUNK_JSON {
        return Err(AssetError::InvalidGlb("first chunk is not JSON"));
    }
    let start = GLB_HEADER_LEN + GLB_CHUNK_HEADER_LEN;
    bytes
        .get(start..start + chunk_len as usize)
        .ok_or(AssetError::InvalidGlb("JSON chunk exceeds file"))
}
