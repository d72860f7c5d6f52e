//! End-to-end checks of scene assembly without a GPU: catalog placement,
//! load settling and animation playback against plain container nodes.

use anyhow::anyhow;
use cgmath::Vector3;
use marsview::{
    data_structures::{instance::Instance, scene_graph::{ContainerNode, ModelAnimation, SceneNode}},
    scene::{
        animation::AnimationPlayer,
        descriptor::{TERRAIN, catalog, terrain_path},
        place::{place, settle},
        registry::{LoadedModel, ModelRegistry},
    },
};

fn loaded(folder: &str, animated: bool) -> LoadedModel {
    LoadedModel {
        folder: folder.to_string(),
        node: Box::new(ContainerNode::new(Vec::new())),
        player: AnimationPlayer::new(animated),
    }
}

#[test]
fn every_catalog_asset_resolves_to_a_gltf_scene_file() {
    for descriptor in catalog() {
        assert_eq!(
            descriptor.path(),
            format!("models/{}/scene.gltf", descriptor.folder)
        );
    }
    assert_eq!(
        terrain_path("mars"),
        "models/surface_terrain_model/mars.gltf"
    );
}

#[test]
fn placing_the_whole_catalog_reproduces_its_transforms() {
    for descriptor in catalog() {
        let mut node = ContainerNode::new(Vec::new());
        place(&descriptor, &mut node);

        let world = node.world_transform();
        assert_eq!(world.position, Vector3::from(descriptor.position));
        assert_eq!(world.scale, Vector3::from(descriptor.scale));
    }
}

#[test]
fn terrain_placement_is_independent_of_the_planet() {
    let mut node = ContainerNode::new(Vec::new());
    place(&TERRAIN, &mut node);
    assert_eq!(
        node.world_transform().position,
        Vector3::new(270.0, 85.0, -500.0)
    );
}

#[test]
fn registry_contents_depend_on_completion_order_not_catalog_order() {
    let mut forward = ModelRegistry::new();
    settle(
        vec![
            ("astronaut".to_string(), Ok(loaded("astronaut", true))),
            ("planet".to_string(), Ok(loaded("planet", false))),
        ],
        &mut forward,
    );

    let mut reversed = ModelRegistry::new();
    settle(
        vec![
            ("planet".to_string(), Ok(loaded("planet", false))),
            ("astronaut".to_string(), Ok(loaded("astronaut", true))),
        ],
        &mut reversed,
    );

    assert_eq!(forward.len(), 2);
    assert_eq!(reversed.len(), 2);
    let forward_folders: Vec<_> = forward.iter().map(|m| m.folder.clone()).collect();
    let reversed_folders: Vec<_> = reversed.iter().map(|m| m.folder.clone()).collect();
    assert_eq!(forward_folders, vec!["astronaut", "planet"]);
    assert_eq!(reversed_folders, vec!["planet", "astronaut"]);
}

#[test]
fn one_failed_load_costs_exactly_one_model() {
    let mut registry = ModelRegistry::new();
    let outcomes: Vec<(String, anyhow::Result<LoadedModel>)> = catalog()
        .into_iter()
        .enumerate()
        .map(|(i, descriptor)| {
            let outcome = if descriptor.folder == "space_shuttle" {
                Err(anyhow!("download failed"))
            } else {
                Ok(loaded(descriptor.folder, descriptor.animated))
            };
            (format!("{i}:{}", descriptor.folder), outcome)
        })
        .collect();
    let total = outcomes.len();

    settle(outcomes, &mut registry);

    assert_eq!(registry.len(), total - 1);
    assert!(registry.iter().all(|m| m.folder != "space_shuttle"));
}

#[test]
fn registry_update_advances_only_playing_models() {
    let clip = ModelAnimation {
        name: "drive".to_string(),
        instances: vec![
            Instance {
                position: Vector3::new(0.0, 0.0, 0.0),
                ..Default::default()
            },
            Instance {
                position: Vector3::new(4.0, 0.0, 0.0),
                ..Default::default()
            },
        ],
        timestamps: vec![0.0, 4.0],
    };

    let mut registry = ModelRegistry::new();
    registry.add(LoadedModel {
        folder: "curiosity_rover".to_string(),
        node: Box::new(ContainerNode::new(vec![clip.clone()])),
        player: AnimationPlayer::new(true),
    });
    registry.add(LoadedModel {
        folder: "perseverance_mars_rover".to_string(),
        node: Box::new(ContainerNode::new(vec![clip])),
        player: AnimationPlayer::new(false),
    });

    registry.update(1.0);

    let mut models = registry.iter();
    let playing = models.next().unwrap();
    let paused = models.next().unwrap();
    assert_eq!(
        playing.node.world_transform().position,
        Vector3::new(1.0, 0.0, 0.0)
    );
    assert_eq!(
        paused.node.world_transform().position,
        Vector3::new(0.0, 0.0, 0.0)
    );
}
