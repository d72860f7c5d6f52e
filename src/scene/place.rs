//! Loading and placing catalog assets.
//!
//! Loads go through [`load_descriptor`] and [`load_terrain`], which pair the
//! glTF loader with the catalog's placement transforms. [`settle`] moves the
//! outcomes into the registry: a failed load is logged and skipped, it never
//! takes the rest of the scene down with it.

use crate::{
    data_structures::{instance::Instance, scene_graph::SceneNode},
    resources::load_model_gltf,
    scene::{
        animation::AnimationPlayer,
        descriptor::{AssetDescriptor, TERRAIN, terrain_path},
        registry::{LoadedModel, ModelRegistry},
    },
};

/// Apply a descriptor's placement transform to a loaded model's root.
pub fn place(descriptor: &AssetDescriptor, node: &mut dyn SceneNode) {
    node.set_local_transform(descriptor.instance());
    node.update_world_transforms(&Instance::default());
}

/// Load one catalog asset and place it.
pub async fn load_descriptor(
    descriptor: AssetDescriptor,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<LoadedModel> {
    let mut node = load_model_gltf(&descriptor.path(), device, queue).await?;
    place(&descriptor, node.as_mut());
    Ok(LoadedModel {
        folder: descriptor.folder.to_string(),
        node,
        player: AnimationPlayer::new(descriptor.animated),
    })
}

/// Load the surface terrain of the given planet and place it.
pub async fn load_terrain(
    planet: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<LoadedModel> {
    let mut node = load_model_gltf(&terrain_path(planet), device, queue).await?;
    place(&TERRAIN, node.as_mut());
    Ok(LoadedModel {
        folder: TERRAIN.folder.to_string(),
        node,
        player: AnimationPlayer::new(TERRAIN.animated),
    })
}

/// Move load outcomes into the registry.
///
/// Successful loads are registered in the order given; failures are logged
/// with the asset's name and dropped. One bad asset therefore costs exactly
/// that asset, nothing else.
pub fn settle(
    outcomes: impl IntoIterator<Item = (String, anyhow::Result<LoadedModel>)>,
    registry: &mut ModelRegistry,
) {
    for (name, outcome) in outcomes {
        match outcome {
            Ok(model) => registry.add(model),
            Err(error) => log::error!("failed to load {name}: {error:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use cgmath::Vector3;

    use crate::{data_structures::scene_graph::ContainerNode, scene::descriptor::catalog};

    fn loaded(folder: &str) -> LoadedModel {
        LoadedModel {
            folder: folder.to_string(),
            node: Box::new(ContainerNode::new(Vec::new())),
            player: AnimationPlayer::new(false),
        }
    }

    #[test]
    fn place_moves_the_root_to_the_descriptor_transform() {
        let astronaut = catalog()
            .into_iter()
            .find(|d| d.folder == "astronaut")
            .unwrap();
        let mut node = ContainerNode::new(Vec::new());

        place(&astronaut, &mut node);

        assert_eq!(
            node.world_transform().position,
            Vector3::new(-12.0, -4.5, 2.0)
        );
        assert_eq!(node.world_transform().scale, Vector3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn settle_registers_in_the_order_given() {
        let mut registry = ModelRegistry::new();
        settle(
            vec![
                ("planet".to_string(), Ok(loaded("planet"))),
                ("astronaut".to_string(), Ok(loaded("astronaut"))),
            ],
            &mut registry,
        );

        let folders: Vec<_> = registry.iter().map(|m| m.folder.as_str()).collect();
        assert_eq!(folders, vec!["planet", "astronaut"]);
    }

    #[test]
    fn settle_skips_failures_without_dropping_the_rest() {
        let mut registry = ModelRegistry::new();
        settle(
            vec![
                ("planet".to_string(), Ok(loaded("planet"))),
                (
                    "surface_terrain_model".to_string(),
                    Err(anyhow!("no such file")),
                ),
                ("astronaut".to_string(), Ok(loaded("astronaut"))),
            ],
            &mut registry,
        );

        assert_eq!(registry.len(), 2);
        let folders: Vec<_> = registry.iter().map(|m| m.folder.as_str()).collect();
        assert_eq!(folders, vec!["planet", "astronaut"]);
    }
}
