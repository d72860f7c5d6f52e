//! Loading of models and textures from external files or the network.

use std::{
    collections::HashMap,
    io::{BufReader, Cursor},
};

use anyhow::Context as _;

use crate::{
    data_structures::{
        model,
        scene_graph::{AnimationClip, ContainerNode, SceneNode, to_scene_node},
        texture::Texture,
    },
    resources::{
        animation::Keyframes,
        texture::{diffuse_normal_layout, load_binary, load_texture},
    },
};

pub mod animation;
pub mod texture;

/// Resolve a URI referenced inside a model file against the model's folder.
fn sibling(model_path: &str, uri: &str) -> String {
    match model_path.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{uri}"),
        None => uri.to_string(),
    }
}

/// Load a glTF file and convert it into a scene-graph subtree.
///
/// Buffer and image URIs are resolved relative to the model's folder. The
/// returned root is always a fresh [`ContainerNode`] wrapping the file's
/// scene nodes, so a caller-applied placement transform never collides with
/// transforms the file's own animations write.
pub async fn load_model_gltf(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Box<dyn SceneNode>> {
    let gltf_bytes = load_binary(file_name)
        .await
        .with_context(|| format!("reading {file_name}"))?;
    let gltf_cursor = Cursor::new(gltf_bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.into());
                };
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(&sibling(file_name, uri))
                    .await
                    .with_context(|| format!("reading buffer {uri} of {file_name}"))?;
                buffer_data.push(bin);
            }
        }
    }

    // Load animations, grouped by the glTF node they target
    let mut animations: HashMap<usize, Vec<AnimationClip>> = HashMap::new();
    for animation in gltf.animations() {
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| Some(&buffer_data[buffer.index()]));
            let timestamps = match reader.read_inputs() {
                Some(gltf::accessor::Iter::Standard(times)) => times.collect(),
                Some(gltf::accessor::Iter::Sparse(_)) => {
                    log::warn!("sparse animation inputs are not supported, skipping channel");
                    Vec::new()
                }
                None => Vec::new(),
            };
            let keyframes = match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                    Keyframes::Translation(translations.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => {
                    Keyframes::Rotation(rotations.into_f32().map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                    Keyframes::Scale(scales.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) | None => {
                    Keyframes::Other
                }
            };
            let clip = AnimationClip {
                name: animation.name().unwrap_or("Default").to_string(),
                keyframes,
                timestamps,
            };
            animations
                .entry(channel.target().node().index())
                .or_default()
                .push(clip);
        }
    }

    // Load materials
    let layout = diffuse_normal_layout(device);
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let diffuse_texture = match pbr.base_color_texture() {
            Some(info) => match info.texture().source().source() {
                gltf::image::Source::View { view, mime_type } => Texture::from_bytes(
                    device,
                    queue,
                    &buffer_data[view.buffer().index()],
                    file_name,
                    mime_type.split('/').next_back(),
                    false,
                )?,
                gltf::image::Source::Uri { uri, mime_type } => {
                    load_texture(
                        &sibling(file_name, uri),
                        false,
                        device,
                        queue,
                        mime_type.and_then(|mt| mt.split('/').next_back()),
                    )
                    .await?
                }
            },
            None => Texture::create_default_diffuse(1, 1, device, queue),
        };
        let normal_texture = match material.normal_texture() {
            Some(normal) => match normal.texture().source().source() {
                gltf::image::Source::View { view, mime_type } => Texture::from_bytes(
                    device,
                    queue,
                    &buffer_data[view.buffer().index()],
                    file_name,
                    mime_type.split('/').next_back(),
                    true,
                )?,
                gltf::image::Source::Uri { uri, mime_type } => {
                    load_texture(
                        &sibling(file_name, uri),
                        true,
                        device,
                        queue,
                        mime_type.and_then(|mt| mt.split('/').next_back()),
                    )
                    .await?
                }
            },
            None => Texture::create_default_normal_map(2, 2, device, queue),
        };
        materials.push(model::Material::new(
            device,
            material.name().unwrap_or(file_name),
            diffuse_texture,
            normal_texture,
            &layout,
        ));
    }
    if materials.is_empty() {
        // Meshes index material 0 unconditionally, so keep one around.
        materials.push(model::Material::new(
            device,
            file_name,
            Texture::create_default_diffuse(1, 1, device, queue),
            Texture::create_default_normal_map(2, 2, device, queue),
            &layout,
        ));
    }

    let mut root = ContainerNode::new(Vec::new());
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            root.add_child(to_scene_node(node, &buffer_data, device, &materials, &animations));
        }
    }

    Ok(Box::new(root))
}
