use anyhow::Context;
use glam::{Quat, Vec3};

use crate::{animation::AnimationClip, model::Model};

/// Node of a decoded asset. Indices refer into the owning [`AssetBundle`].
#[derive(Debug, Clone)]
pub struct AssetNode {
    pub name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub model: Option<usize>,
    pub children: Vec<usize>,
}

/// A decoded glTF asset, independent of any scene or GPU state.
pub struct AssetBundle {
    pub name: String,
    pub nodes: Vec<AssetNode>,
    /// Root nodes of the displayed glTF scene.
    pub roots: Vec<usize>,
    pub models: Vec<Model>,
    pub clips: Vec<AnimationClip>,
}

impl AssetBundle {
    pub fn from_gltf(
        name: impl Into<String>,
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
    ) -> anyhow::Result<AssetBundle> {
        let name = name.into();

        let models = document
            .meshes()
            .map(|mesh| {
                let mesh_name = mesh
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("{} (Mesh {})", name, mesh.index()));
                Model::from_gltf(mesh_name, mesh, buffers)
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .context("Failed to decode meshes")?;

        let nodes = document
            .nodes()
            .map(|node| {
                let (translation, rotation, scale) = node.transform().decomposed();
                AssetNode {
                    name: node
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("Node {}", node.index())),
                    translation: translation.into(),
                    rotation: Quat::from_array(rotation),
                    scale: scale.into(),
                    model: node.mesh().map(|mesh| mesh.index()),
                    children: node.children().map(|child| child.index()).collect(),
                }
            })
            .collect();

        let roots = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .map(|scene| scene.nodes().map(|node| node.index()).collect())
            .unwrap_or_default();

        let clips = document
            .animations()
            .map(|animation| AnimationClip::from_gltf(animation, buffers))
            .collect::<anyhow::Result<Vec<_>>>()
            .context("Failed to decode animations")?;

        Ok(AssetBundle {
            name,
            nodes,
            roots,
            models,
            clips,
        })
    }
}
