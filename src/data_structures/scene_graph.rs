//! Scene graph and hierarchical scene organization.
//!
//! Provides the [`SceneNode`] trait and the two node kinds the viewer works
//! with: [`ContainerNode`] (grouping only, no GPU resources) and [`ModelNode`]
//! (a mesh with an instance buffer). Nodes carry a local and a derived world
//! transform plus the keyframe animation tracks targeting them.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        model::{self, DrawModel},
    },
    resources::animation::Keyframes,
};

/// An animation clip as read from glTF: one keyframe track with timing.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub keyframes: Keyframes,
    pub timestamps: Vec<f32>,
}

/// Per-node animation with all transform components merged into whole
/// keyframe instances.
#[derive(Clone, Debug, Default)]
pub struct ModelAnimation {
    pub name: String,
    pub instances: Vec<Instance>,
    pub timestamps: Vec<f32>,
}

impl ModelAnimation {
    pub fn duration(&self) -> f32 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }
}

/**
 * Intermediate state when converting between `AnimationClip` and `ModelAnimation`
 */
#[derive(Default)]
struct ClipMergeState {
    animations: Vec<ModelAnimation>,
    trans: Vec<cgmath::Vector3<f32>>,
    rots: Vec<cgmath::Quaternion<f32>>,
    scals: Vec<cgmath::Vector3<f32>>,
    timestamps: Vec<f32>,
    current_clip: String,
}

impl ClipMergeState {
    fn reset(&mut self, clip: &AnimationClip) {
        self.timestamps = vec![];
        self.trans = vec![];
        self.rots = vec![];
        self.scals = vec![];
        self.current_clip = clip.name.clone();
    }

    fn finish_current(&mut self) -> ModelAnimation {
        let max_len = self.trans.len().max(self.rots.len()).max(self.scals.len());
        // glTF stores translation/rotation/scale as separate channels which
        // may have different lengths; pad the short tracks with identity.
        let instances = (0..max_len)
            .map(|i| Instance {
                position: self
                    .trans
                    .get(i)
                    .or_else(|| self.trans.first())
                    .copied()
                    .unwrap_or(cgmath::Vector3::new(0.0, 0.0, 0.0)),
                rotation: self
                    .rots
                    .get(i)
                    .or_else(|| self.rots.first())
                    .copied()
                    .unwrap_or(cgmath::Quaternion::new(1.0, 0.0, 0.0, 0.0)),
                scale: self
                    .scals
                    .get(i)
                    .or_else(|| self.scals.first())
                    .copied()
                    .unwrap_or(cgmath::Vector3::new(1.0, 1.0, 1.0)),
            })
            .collect();
        ModelAnimation {
            name: self.current_clip.clone(),
            instances,
            timestamps: self.timestamps.clone(),
        }
    }
}

/// Merges keyframe tracks with the same clip name so that all transform
/// components of one clip live in a single [`ModelAnimation`].
pub fn merge(clips: &[AnimationClip]) -> Vec<ModelAnimation> {
    let first = match clips.first() {
        Some(clip) => clip,
        None => return Vec::new(),
    };
    let mut state = ClipMergeState {
        current_clip: first.name.clone(),
        ..Default::default()
    };
    for clip in clips {
        if clip.name != state.current_clip {
            let animation = state.finish_current();
            state.animations.push(animation);
            state.reset(clip);
        }
        match &clip.keyframes {
            Keyframes::Translation(translations) => state.trans.extend(translations.iter().copied()),
            Keyframes::Rotation(rotations) => state.rots.extend(rotations.iter().copied()),
            Keyframes::Scale(scales) => state.scals.extend(scales.iter().copied()),
            Keyframes::Other => (),
        }
        // Keep the densest set of timestamps in case some tracks have fewer steps.
        if clip.timestamps.len() > state.timestamps.len() {
            state.timestamps = clip.timestamps.clone();
        }
    }
    let animation = state.finish_current();
    state.animations.push(animation);
    state.animations
}

pub trait SceneNode {
    fn local_transform(&self) -> &Instance;

    fn set_local_transform(&mut self, instance: Instance);

    fn world_transform(&self) -> &Instance;

    /// Derive this node's world transform from the parent's and push it down
    /// the subtree.
    fn update_world_transforms(&mut self, parent: &Instance);

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    fn children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn animations(&self) -> &[ModelAnimation];

    /// Upload the current world transforms of the subtree to the GPU.
    fn write_to_buffers(&mut self, queue: &wgpu::Queue);

    fn draw<'a, 'b>(
        &'a self,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
        render_pass: &'b mut wgpu::RenderPass<'a>,
    ) where
        'a: 'b;
}

/// A grouping node without GPU resources of its own.
pub struct ContainerNode {
    pub children: Vec<Box<dyn SceneNode>>,
    local: Instance,
    world: Instance,
    animations: Vec<ModelAnimation>,
}

impl ContainerNode {
    pub fn new(animations: Vec<ModelAnimation>) -> Self {
        Self {
            children: Vec::new(),
            local: Instance::default(),
            world: Instance::default(),
            animations,
        }
    }
}

impl SceneNode for ContainerNode {
    fn local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn world_transform(&self) -> &Instance {
        &self.world
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        let world = self.world.clone();
        for child in &mut self.children {
            child.update_world_transforms(&world);
        }
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn animations(&self) -> &[ModelAnimation] {
        &self.animations
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        for child in &mut self.children {
            child.write_to_buffers(queue);
        }
    }

    fn draw<'a, 'b>(
        &'a self,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
        render_pass: &'b mut wgpu::RenderPass<'a>,
    ) where
        'a: 'b,
    {
        for child in &self.children {
            child.draw(camera_bind_group, light_bind_group, render_pass);
        }
    }
}

/// A mesh-bearing node with a single-element instance buffer holding its
/// world transform.
pub struct ModelNode {
    children: Vec<Box<dyn SceneNode>>,
    instance_buffer: wgpu::Buffer,
    local: Instance,
    world: Instance,
    animations: Vec<ModelAnimation>,
    model: model::Model,
}

impl ModelNode {
    pub fn from_model(
        device: &wgpu::Device,
        model: model::Model,
        animations: Vec<ModelAnimation>,
    ) -> Self {
        let world = Instance::default();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&[world.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            children: Vec::new(),
            instance_buffer,
            local: Instance::default(),
            world,
            animations,
            model,
        }
    }
}

impl SceneNode for ModelNode {
    fn local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn world_transform(&self) -> &Instance {
        &self.world
    }

    fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        let world = self.world.clone();
        for child in &mut self.children {
            child.update_world_transforms(&world);
        }
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn animations(&self) -> &[ModelAnimation] {
        &self.animations
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[self.world.to_raw()]),
        );
        for child in &mut self.children {
            child.write_to_buffers(queue);
        }
    }

    fn draw<'a, 'b>(
        &'a self,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
        render_pass: &'b mut wgpu::RenderPass<'a>,
    ) where
        'a: 'b,
    {
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.draw_model_instanced(&self.model, 0..1, camera_bind_group, light_bind_group);
        for child in &self.children {
            child.draw(camera_bind_group, light_bind_group, render_pass);
        }
    }
}

/// Converts one glTF node (with its subtree) into scene-graph nodes.
///
/// The node's decomposed transform becomes the local transform; animation
/// clips targeting the node are attached to it.
pub fn to_scene_node(
    node: gltf::scene::Node,
    buf: &[Vec<u8>],
    device: &wgpu::Device,
    mats: &[model::Material],
    anims: &HashMap<usize, Vec<AnimationClip>>,
) -> Box<dyn SceneNode> {
    let animations = anims
        .get(&node.index())
        .map(|clips| merge(clips))
        .unwrap_or_default();
    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => {
            let mut meshes = Vec::new();
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buf[buffer.index()]));

                let mut vertices = Vec::new();
                if let Some(positions) = reader.read_positions() {
                    vertices.extend(positions.map(|position| model::ModelVertex {
                        position,
                        ..Default::default()
                    }));
                }
                if let Some(normals) = reader.read_normals() {
                    for (vertex, normal) in vertices.iter_mut().zip(normals) {
                        vertex.normal = normal;
                    }
                }
                if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                    for (vertex, tex_coord) in vertices.iter_mut().zip(tex_coords) {
                        vertex.tex_coords = tex_coord;
                    }
                }
                if let Some(tangents) = reader.read_tangents() {
                    for (vertex, tangent) in vertices.iter_mut().zip(tangents) {
                        // glTF tangents are vec4 where w flips the bitangent
                        let tangent: cgmath::Vector4<f32> = tangent.into();
                        vertex.tangent = tangent.truncate().into();
                        let normal: cgmath::Vector3<f32> = vertex.normal.into();
                        vertex.bitangent = (normal.cross(tangent.truncate()) * tangent[3]).into();
                    }
                }

                let mut indices = Vec::new();
                if let Some(indices_raw) = reader.read_indices() {
                    indices.extend(indices_raw.into_u32());
                }

                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Vertex Buffer", mesh.name())),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Index Buffer", mesh.name())),
                    contents: bytemuck::cast_slice(&indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

                meshes.push(model::Mesh {
                    name: mesh.name().unwrap_or("unknown_mesh").to_string(),
                    vertex_buffer,
                    index_buffer,
                    num_elements: indices.len() as u32,
                    material: primitive.material().index().unwrap_or(0),
                });
            }
            let model = model::Model {
                meshes,
                materials: mats.to_vec(),
            };
            Box::new(ModelNode::from_model(device, model, animations))
        }
        None => Box::new(ContainerNode::new(animations)),
    };

    let (position, rotation, scale) = node.transform().decomposed();
    scene_node.set_local_transform(Instance {
        position: position.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    });
    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buf, device, mats, anims));
    }

    scene_node
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{One, Quaternion, Vector3};

    fn clip(name: &str, keyframes: Keyframes, timestamps: Vec<f32>) -> AnimationClip {
        AnimationClip {
            name: name.to_string(),
            keyframes,
            timestamps,
        }
    }

    #[test]
    fn merge_combines_tracks_of_one_clip() {
        let clips = vec![
            clip(
                "wave",
                Keyframes::Translation(vec![
                    Vector3::new(0.0, 0.0, 0.0),
                    Vector3::new(1.0, 0.0, 0.0),
                ]),
                vec![0.0, 1.0],
            ),
            clip(
                "wave",
                Keyframes::Rotation(vec![Quaternion::one(), Quaternion::one()]),
                vec![0.0, 1.0],
            ),
        ];
        let merged = merge(&clips);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "wave");
        assert_eq!(merged[0].instances.len(), 2);
        assert_eq!(merged[0].instances[1].position, Vector3::new(1.0, 0.0, 0.0));
        // The missing scale track is padded with identity.
        assert_eq!(merged[0].instances[0].scale, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn merge_splits_distinct_clip_names() {
        let clips = vec![
            clip(
                "a",
                Keyframes::Translation(vec![Vector3::new(0.0, 0.0, 0.0)]),
                vec![0.0],
            ),
            clip(
                "b",
                Keyframes::Translation(vec![Vector3::new(2.0, 0.0, 0.0)]),
                vec![0.0],
            ),
        ];
        let merged = merge(&clips);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "a");
        assert_eq!(merged[1].name, "b");
    }

    #[test]
    fn merge_of_nothing_is_empty() {
        assert!(merge(&[]).is_empty());
    }

    #[test]
    fn world_transforms_propagate_through_containers() {
        let mut child = ContainerNode::new(Vec::new());
        child.set_local_transform(Instance {
            position: Vector3::new(1.0, 0.0, 0.0),
            ..Default::default()
        });
        let mut root = ContainerNode::new(Vec::new());
        root.set_local_transform(Instance {
            position: Vector3::new(0.0, 2.0, 0.0),
            scale: Vector3::new(3.0, 3.0, 3.0),
            ..Default::default()
        });
        root.add_child(Box::new(child));

        root.update_world_transforms(&Instance::default());

        let child_world = root.children()[0].world_transform();
        assert_eq!(child_world.position, Vector3::new(3.0, 2.0, 0.0));
        assert_eq!(child_world.scale, Vector3::new(3.0, 3.0, 3.0));
    }
}
