//! Keyframe animation playback for loaded models.
//!
//! Each loaded model owns one [`AnimationPlayer`]. Every frame the player
//! advances by the measured frame time and writes sampled transforms into
//! the model's scene-graph nodes; placement transforms on the model's root
//! are never touched because the loader wraps every model in a plain
//! container node that no animation targets.

use cgmath::VectorSpace;

use crate::data_structures::{
    instance::Instance,
    scene_graph::{ModelAnimation, SceneNode},
};

/// Playback state for one model's animations.
#[derive(Clone, Debug)]
pub struct AnimationPlayer {
    elapsed: f32,
    playing: bool,
}

impl AnimationPlayer {
    pub fn new(playing: bool) -> Self {
        Self {
            elapsed: 0.0,
            playing,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Advance playback by `dt` seconds and apply the sampled transforms to
    /// every animated node in the subtree. A paused player leaves all
    /// transforms as they are.
    pub fn advance(&mut self, dt: f32, root: &mut dyn SceneNode) {
        if !self.playing {
            return;
        }
        self.elapsed += dt;
        apply(root, self.elapsed);
    }
}

fn apply(node: &mut dyn SceneNode, elapsed: f32) {
    let sampled = node
        .animations()
        .first()
        .and_then(|animation| sample(animation, elapsed));
    if let Some(transform) = sampled {
        node.set_local_transform(transform);
    }
    for child in node.children_mut() {
        apply(child.as_mut(), elapsed);
    }
}

/// Sample an animation at `elapsed` seconds since playback start.
///
/// Playback loops: the sample time wraps around the clip duration. Between
/// keyframes positions and scales are interpolated linearly and rotations
/// spherically. Returns `None` for clips without keyframes.
pub fn sample(animation: &ModelAnimation, elapsed: f32) -> Option<Instance> {
    let duration = animation.duration();
    if animation.timestamps.is_empty() || animation.instances.is_empty() {
        return None;
    }
    if animation.timestamps.len() == 1 || duration <= 0.0 {
        return Some(animation.instances[0].clone());
    }

    let t = elapsed.rem_euclid(duration);
    let next = animation
        .timestamps
        .iter()
        .position(|&stamp| stamp >= t)
        .unwrap_or(animation.timestamps.len() - 1)
        .max(1);
    let prev = next - 1;

    let t0 = animation.timestamps[prev];
    let t1 = animation.timestamps[next];
    let span = t1 - t0;
    let amount = if span > 0.0 { (t - t0) / span } else { 0.0 };

    let from = animation
        .instances
        .get(prev)
        .unwrap_or(&animation.instances[0]);
    let to = animation.instances.get(next).unwrap_or(from);

    Some(Instance {
        position: from.position.lerp(to.position, amount),
        rotation: from.rotation.slerp(to.rotation, amount),
        scale: from.scale.lerp(to.scale, amount),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{One, Quaternion, Vector3};

    use crate::data_structures::scene_graph::ContainerNode;

    fn walk_clip() -> ModelAnimation {
        ModelAnimation {
            name: "walk".to_string(),
            instances: vec![
                Instance {
                    position: Vector3::new(0.0, 0.0, 0.0),
                    ..Default::default()
                },
                Instance {
                    position: Vector3::new(2.0, 0.0, 0.0),
                    ..Default::default()
                },
            ],
            timestamps: vec![0.0, 2.0],
        }
    }

    #[test]
    fn sample_interpolates_between_keyframes() {
        let clip = walk_clip();
        let halfway = sample(&clip, 1.0).unwrap();
        assert_eq!(halfway.position, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(halfway.rotation, Quaternion::one());
    }

    #[test]
    fn sample_wraps_past_the_clip_end() {
        let clip = walk_clip();
        let wrapped = sample(&clip, 2.5).unwrap();
        let direct = sample(&clip, 0.5).unwrap();
        assert_eq!(wrapped.position, direct.position);
    }

    #[test]
    fn sample_of_empty_clip_is_none() {
        let clip = ModelAnimation::default();
        assert!(sample(&clip, 1.0).is_none());
    }

    #[test]
    fn paused_player_leaves_transforms_alone() {
        let mut node = ContainerNode::new(vec![walk_clip()]);
        let before = node.local_transform().clone();

        let mut player = AnimationPlayer::new(false);
        player.advance(1.0, &mut node);

        assert_eq!(node.local_transform(), &before);
    }

    #[test]
    fn playing_player_drives_animated_nodes() {
        let mut node = ContainerNode::new(vec![walk_clip()]);
        let mut player = AnimationPlayer::new(true);

        player.advance(0.5, &mut node);
        assert_eq!(
            node.local_transform().position,
            Vector3::new(0.5, 0.0, 0.0)
        );

        player.advance(0.5, &mut node);
        assert_eq!(
            node.local_transform().position,
            Vector3::new(1.0, 0.0, 0.0)
        );
    }
}
