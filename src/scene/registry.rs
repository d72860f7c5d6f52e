//! Bookkeeping for the models currently in the scene.

use crate::{
    data_structures::{instance::Instance, scene_graph::SceneNode},
    scene::animation::AnimationPlayer,
};

/// A model that finished loading, together with its playback state.
pub struct LoadedModel {
    pub folder: String,
    pub node: Box<dyn SceneNode>,
    pub player: AnimationPlayer,
}

/// All models of the scene, in the order their loads completed.
///
/// Loads that fail never produce an entry here, so the registry is also the
/// record of what is actually drawn each frame.
#[derive(Default)]
pub struct ModelRegistry {
    models: Vec<LoadedModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, model: LoadedModel) {
        self.models.push(model);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedModel> {
        self.models.iter()
    }

    /// Advance every playing animation by `dt` seconds and rederive the world
    /// transforms of all models.
    pub fn update(&mut self, dt: f32) {
        let identity = Instance::default();
        for model in &mut self.models {
            model.player.advance(dt, model.node.as_mut());
            model.node.update_world_transforms(&identity);
        }
    }

    /// Upload the world transforms of all models to the GPU.
    pub fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        for model in &mut self.models {
            model.node.write_to_buffers(queue);
        }
    }

    pub fn draw<'a, 'b>(
        &'a self,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
        render_pass: &'b mut wgpu::RenderPass<'a>,
    ) where
        'a: 'b,
    {
        for model in &self.models {
            model
                .node
                .draw(camera_bind_group, light_bind_group, render_pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    use crate::data_structures::scene_graph::ContainerNode;

    fn loaded(folder: &str) -> LoadedModel {
        LoadedModel {
            folder: folder.to_string(),
            node: Box::new(ContainerNode::new(Vec::new())),
            player: AnimationPlayer::new(false),
        }
    }

    #[test]
    fn registry_keeps_completion_order() {
        let mut registry = ModelRegistry::new();
        registry.add(loaded("planet"));
        registry.add(loaded("astronaut"));

        let folders: Vec<_> = registry.iter().map(|m| m.folder.as_str()).collect();
        assert_eq!(folders, vec!["planet", "astronaut"]);
    }

    #[test]
    fn update_rederives_world_transforms() {
        let mut registry = ModelRegistry::new();
        let mut model = loaded("astronaut");
        model.node.set_local_transform(Instance {
            position: Vector3::new(-12.0, -4.5, 2.0),
            ..Default::default()
        });
        registry.add(model);

        registry.update(0.016);

        let world = registry.iter().next().unwrap().node.world_transform();
        assert_eq!(world.position, Vector3::new(-12.0, -4.5, 2.0));
    }
}
