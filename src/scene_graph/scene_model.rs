use id_arena::Id;

use crate::{
    model::Model,
    rendering::{
        instance::{Instance, Instances},
        render_model::RenderModelId,
    },
};

pub type SceneModelId = Id<SceneModel>;

pub struct SceneModel {
    pub model: Model,
    /// Set by the renderer once the model has been uploaded to the GPU.
    pub render_model: Option<RenderModelId>,
    instances: Instances,
}

impl SceneModel {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            render_model: None,
            instances: Instances::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.model.name
    }

    pub fn instances(&self) -> &Instances {
        &self.instances
    }

    pub fn add_instance(&mut self, instance: Instance) {
        self.instances.add(instance);
    }

    pub fn clear_instances(&mut self) {
        self.instances.clear();
    }
}
