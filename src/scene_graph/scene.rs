use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;

use crate::assets::bundle::AssetBundle;
use crate::math::bounds::AABB;
use crate::model::Model;
use crate::rendering::instance::Instance;
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};
use crate::scene_graph::transform::Transform;

/// Objects created by [`Scene::spawn_bundle`].
pub struct SpawnedAsset {
    pub root: ObjectId,
    /// Scene object for each node of the bundle, indexed like `AssetBundle::nodes`.
    pub nodes: Vec<ObjectId>,
}

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn add_model(&mut self, model: Model) -> SceneModelId {
        self.models.alloc(SceneModel::new(model))
    }

    /// Adds a root object rendering `model`.
    pub fn add_mesh(&mut self, name: impl Into<String>, model: Model) -> ObjectId {
        let model_id = self.add_model(model);
        self.add_object(Object3D::named(name).with_model(model_id))
    }

    /// Instantiates a loaded asset under a new root object named after the asset.
    pub fn spawn_bundle(&mut self, bundle: AssetBundle) -> SpawnedAsset {
        let root = self.add_object(Object3D::named(bundle.name.clone()));

        let model_ids = bundle
            .models
            .into_iter()
            .map(|model| self.add_model(model))
            .collect::<Vec<_>>();

        let nodes = bundle
            .nodes
            .iter()
            .map(|node| {
                let mut object = Object3D::named(node.name.clone());
                object.transform =
                    Transform::from_trs(node.translation, node.rotation, node.scale);
                object.model_id = node.model.and_then(|index| model_ids.get(index).copied());
                self.add_object(object)
            })
            .collect::<Vec<_>>();

        for (index, node) in bundle.nodes.iter().enumerate() {
            for &child in &node.children {
                if let Some(&child_id) = nodes.get(child) {
                    self.set_object_parent(child_id, Some(nodes[index]));
                }
            }
        }

        for &scene_root in &bundle.roots {
            if let Some(&root_child) = nodes.get(scene_root) {
                self.set_object_parent(root_child, Some(root));
            }
        }

        log::debug!(
            "Spawned {} with {} nodes and {} models",
            bundle.name,
            nodes.len(),
            model_ids.len()
        );

        SpawnedAsset { root, nodes }
    }

    /// Updates all object transforms in hierarchical order
    fn update_transforms(&self) {
        let root_objects = self.objects.iter().filter_map(|(id, object)| {
            if object.parent_id.is_none() {
                Some(id)
            } else {
                None
            }
        });

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.objects.get(object_id) {
            if object.transform.is_world_dirty() {
                let local_matrix = *object.transform.get_local_matrix();
                object
                    .transform
                    .set_world_matrix(parent_world_matrix * local_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// World matrix computed from the local transforms of the object and its
    /// ancestors, independent of the cached world matrices.
    pub fn compute_world_matrix(&self, object_id: ObjectId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.objects.get(object_id);

        while let Some(object) = current {
            matrix = *object.transform.get_local_matrix() * matrix;
            current = object.parent_id.and_then(|id| self.objects.get(id));
        }

        matrix
    }

    /// World-space box enclosing every model in the subtree rooted at
    /// `object_id`. `None` if the subtree has no geometry.
    pub fn world_bounds(&self, object_id: ObjectId) -> Option<AABB> {
        let parent_matrix = self
            .objects
            .get(object_id)?
            .parent_id
            .map(|parent_id| self.compute_world_matrix(parent_id))
            .unwrap_or(Mat4::IDENTITY);

        let mut bounds = AABB::EMPTY;
        self.collect_bounds_recursive(object_id, parent_matrix, &mut bounds);

        (!bounds.is_empty()).then_some(bounds)
    }

    fn collect_bounds_recursive(&self, object_id: ObjectId, parent_matrix: Mat4, bounds: &mut AABB) {
        let Some(object) = self.objects.get(object_id) else {
            return;
        };

        let world_matrix = parent_matrix * *object.transform.get_local_matrix();

        if let Some(scene_model) = object.model_id.and_then(|id| self.models.get(id)) {
            *bounds = bounds.union(&scene_model.model.bounds.transformed(&world_matrix));
        }

        for &child_id in &object.child_ids {
            self.collect_bounds_recursive(child_id, world_matrix, bounds);
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_translation(translation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn translate_object(&mut self, object_id: ObjectId, delta: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.translate(delta);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_rotation(&mut self, object_id: ObjectId, rotation: Quat) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_rotation(rotation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_scale(&mut self, object_id: ObjectId, scale: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_scale(scale);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn get_object_transform(&self, object_id: ObjectId) -> Option<&Transform> {
        self.objects.get(object_id).map(|object| &object.transform)
    }

    pub fn early_update(&mut self) {
        for (_, model) in self.models.iter_mut() {
            model.clear_instances();
        }
    }

    pub fn late_update(&mut self) {
        self.update_transforms();
        self.gather_instances();
    }

    fn gather_instances(&mut self) {
        for (_, object) in self.objects.iter() {
            let Some(scene_model) = object.model_id.and_then(|id| self.models.get_mut(id)) else {
                continue;
            };

            scene_model.add_instance(Instance::new(
                *object.transform.get_world_matrix(),
                *object.transform.get_inverse_transpose_world_matrix(),
            ));
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
