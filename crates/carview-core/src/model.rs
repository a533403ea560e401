//! In-memory scene graph
//!
//! A minimal stand-in for a 3D engine's model: a node tree where mesh nodes
//! reference shared materials by id. Used by tests and by tooling that inspects
//! assets without a renderer.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::framing::Bounds;
use crate::paint::{PaintableScene, PartSurvey, SlotSurvey};

/// Index of a node in its [`Model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Index of a material in its [`Model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub usize);

/// Reference to a texture image by URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureRef(pub String);

impl TextureRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }
}

/// A renderable material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    pub name: String,
    /// Base color, `None` for materials without a color property
    pub color: Option<Rgb>,
    /// Base color texture
    pub map: Option<TextureRef>,
    /// Bumped on every change so renderers know to re-upload
    pub version: u32,
}

impl SurfaceMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            map: None,
            version: 0,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_map(mut self, map: TextureRef) -> Self {
        self.map = Some(map);
        self
    }

    pub fn mark_dirty(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

/// Materials of a mesh node: one, or an ordered list for multi-material meshes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialBinding {
    Single(MaterialId),
    Multi(Vec<MaterialId>),
}

impl MaterialBinding {
    pub fn slots(&self) -> &[MaterialId] {
        match self {
            MaterialBinding::Single(id) => std::slice::from_ref(id),
            MaterialBinding::Multi(ids) => ids,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub material: MaterialBinding,
    /// Bounds in model space
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub mesh: Option<MeshData>,
    pub children: Vec<NodeId>,
}

/// A loaded model: node tree plus material table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    nodes: Vec<Node>,
    materials: Vec<SurfaceMaterial>,
}

impl Model {
    /// Create a model with an empty root node
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node {
                name: root_name.into(),
                mesh: None,
                children: Vec::new(),
            }],
            materials: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn add_material(&mut self, material: SurfaceMaterial) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// Add a group node under `parent`
    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.push_node(parent, name.into(), None)
    }

    /// Add a mesh node under `parent`
    pub fn add_mesh(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        material: MaterialBinding,
        bounds: Option<Bounds>,
    ) -> NodeId {
        self.push_node(parent, name.into(), Some(MeshData { material, bounds }))
    }

    fn push_node(&mut self, parent: NodeId, name: String, mesh: Option<MeshData>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name,
            mesh,
            children: Vec::new(),
        });
        if let Some(parent) = self.nodes.get_mut(parent.0) {
            parent.children.push(id);
        } else {
            tracing::warn!("Parent node {:?} does not exist, attaching {:?} to root", parent, id);
            self.nodes[0].children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn material(&self, id: MaterialId) -> Option<&SurfaceMaterial> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut SurfaceMaterial> {
        self.materials.get_mut(id.0)
    }

    pub fn materials(&self) -> &[SurfaceMaterial] {
        &self.materials
    }

    /// All nodes reachable from the root, depth first, parents before children
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut visited = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            visited.push(id);
            if let Some(node) = self.nodes.get(id.0) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        visited
    }

    /// Union of all mesh bounds, `None` when no mesh has bounds
    pub fn bounds(&self) -> Option<Bounds> {
        self.traverse()
            .into_iter()
            .filter_map(|id| self.nodes[id.0].mesh.as_ref()?.bounds)
            .reduce(|a, b| a.union(&b))
    }

    fn slot_material(&self, part: NodeId, slot: usize) -> Option<MaterialId> {
        self.nodes
            .get(part.0)?
            .mesh
            .as_ref()?
            .material
            .slots()
            .get(slot)
            .copied()
    }
}

impl PaintableScene for Model {
    type PartId = NodeId;
    type Texture = TextureRef;

    fn survey(&self) -> Vec<PartSurvey<NodeId, TextureRef>> {
        self.traverse()
            .into_iter()
            .filter_map(|id| {
                let node = &self.nodes[id.0];
                let mesh = node.mesh.as_ref()?;
                let slots = mesh
                    .material
                    .slots()
                    .iter()
                    .map(|mat_id| match self.material(*mat_id) {
                        Some(material) => SlotSurvey {
                            material_name: material.name.clone(),
                            color: material.color,
                            texture: material.map.clone(),
                        },
                        None => SlotSurvey {
                            material_name: String::new(),
                            color: None,
                            texture: None,
                        },
                    })
                    .collect();
                Some(PartSurvey {
                    id,
                    mesh_name: node.name.clone(),
                    slots,
                })
            })
            .collect()
    }

    fn set_slot_color(&mut self, part: NodeId, slot: usize, color: Rgb) -> bool {
        let Some(mat_id) = self.slot_material(part, slot) else {
            return false;
        };
        match self.material_mut(mat_id) {
            Some(material) if material.color.is_some() => {
                material.color = Some(color);
                material.mark_dirty();
                true
            }
            _ => false,
        }
    }

    fn set_slot_texture(&mut self, part: NodeId, slot: usize, texture: Option<TextureRef>) -> bool {
        let Some(mat_id) = self.slot_material(part, slot) else {
            return false;
        };
        match self.material_mut(mat_id) {
            Some(material) => {
                material.map = texture;
                material.mark_dirty();
                true
            }
            None => false,
        }
    }
}
