//! The fixed asset catalog: every model the viewer shows, with its
//! placement transform and whether its animations should play.

use cgmath::{Euler, Quaternion, Rad};

use crate::data_structures::instance::Instance;

/// One entry of the asset catalog.
///
/// `folder` names the directory below `models/` holding the asset's
/// `scene.gltf`. Rotation angles are Euler angles in radians, applied in
/// x, y, z order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssetDescriptor {
    pub folder: &'static str,
    pub scale: [f32; 3],
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub animated: bool,
}

impl AssetDescriptor {
    /// The path of this asset's glTF file relative to the asset root.
    pub fn path(&self) -> String {
        format!("models/{}/scene.gltf", self.folder)
    }

    /// The placement transform to apply to the loaded model's root node.
    pub fn instance(&self) -> Instance {
        Instance {
            position: self.position.into(),
            rotation: Quaternion::from(Euler::new(
                Rad(self.rotation[0]),
                Rad(self.rotation[1]),
                Rad(self.rotation[2]),
            )),
            scale: self.scale.into(),
        }
    }
}

const PI: f32 = std::f32::consts::PI;

/// All models of the Mars scene, terrain excluded.
pub fn catalog() -> Vec<AssetDescriptor> {
    vec![
        AssetDescriptor {
            folder: "curiosity_rover",
            scale: [2.5, 2.5, 2.5],
            position: [-2.0, -4.0, -25.0],
            rotation: [0.0, 0.0, 0.0],
            animated: true,
        },
        AssetDescriptor {
            folder: "astronaut",
            scale: [2.0, 2.0, 2.0],
            position: [-12.0, -4.5, 2.0],
            rotation: [0.0, -250.8, 0.0],
            animated: true,
        },
        AssetDescriptor {
            folder: "perseverance_mars_rover",
            scale: [2.0, 2.0, 2.0],
            position: [-18.0, -3.0, -12.0],
            rotation: [0.0, 0.0, 0.0],
            animated: false,
        },
        AssetDescriptor {
            folder: "space_shuttle",
            scale: [0.9, 0.9, 0.9],
            position: [-50.0, -1.0, -120.0],
            rotation: [0.0, -200.0, 0.0],
            animated: false,
        },
        AssetDescriptor {
            folder: "robot_from_the_series_love_death_and_robots",
            scale: [0.3, 0.3, 0.3],
            position: [8.0, -2.0, 5.0],
            rotation: [0.0, 10.2, 0.0],
            animated: false,
        },
        AssetDescriptor {
            folder: "planet",
            scale: [1.0, 1.0, 1.0],
            position: [-5.0, 18.0, -50.0],
            rotation: [0.0, PI, 0.0],
            animated: false,
        },
        AssetDescriptor {
            folder: "solar_skid",
            scale: [0.03, 0.03, 0.04],
            position: [13.0, -2.3, -11.0],
            rotation: [0.0, -269.3, 0.0],
            animated: false,
        },
        AssetDescriptor {
            folder: "solar_skid",
            scale: [0.03, 0.03, 0.04],
            position: [12.0, -2.3, -19.0],
            rotation: [0.0, -269.3, 0.0],
            animated: false,
        },
        AssetDescriptor {
            folder: "solar_skid",
            scale: [0.03, 0.03, 0.04],
            position: [11.0, -2.3, -28.0],
            rotation: [0.0, -269.3, 0.0],
            animated: false,
        },
        AssetDescriptor {
            folder: "solar_skid",
            scale: [0.03, 0.03, 0.04],
            position: [10.0, -2.3, -37.0],
            rotation: [0.0, -269.3, 0.0],
            animated: false,
        },
        AssetDescriptor {
            folder: "sci_fi_enclosure",
            scale: [1.6, 1.6, 1.6],
            position: [40.0, -2.3, -47.0],
            rotation: [0.0, 0.0, 0.0],
            animated: false,
        },
    ]
}

/// Placement of the surface terrain. The terrain's glTF file depends on the
/// selected planet, see [`terrain_path`].
pub const TERRAIN: AssetDescriptor = AssetDescriptor {
    folder: "surface_terrain_model",
    scale: [50.0, 50.0, 50.0],
    position: [270.0, 85.0, -500.0],
    rotation: [-0.04, PI, 0.0],
    animated: false,
};

/// The glTF file of the given planet's surface terrain.
pub fn terrain_path(planet: &str) -> String {
    format!("models/{}/{}.gltf", TERRAIN.folder, planet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Rotation, Vector3};

    #[test]
    fn catalog_is_stable() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 11);
        assert_eq!(
            catalog.iter().filter(|d| d.folder == "solar_skid").count(),
            4
        );
        assert_eq!(catalog.iter().filter(|d| d.animated).count(), 2);
    }

    #[test]
    fn astronaut_descriptor_matches_its_placement() {
        let astronaut = catalog()
            .into_iter()
            .find(|d| d.folder == "astronaut")
            .unwrap();
        assert_eq!(astronaut.path(), "models/astronaut/scene.gltf");
        assert!(astronaut.animated);

        let instance = astronaut.instance();
        assert_eq!(instance.position, Vector3::new(-12.0, -4.5, 2.0));
        assert_eq!(instance.scale, Vector3::new(2.0, 2.0, 2.0));
        // A pure y rotation keeps the up axis fixed.
        let up = instance.rotation.rotate_vector(Vector3::unit_y());
        assert!((up - Vector3::unit_y()).magnitude() < 1e-5);
    }

    #[test]
    fn terrain_path_embeds_the_planet() {
        assert_eq!(
            terrain_path("mars"),
            "models/surface_terrain_model/mars.gltf"
        );
    }
}
