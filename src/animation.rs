//! Keyframe animation of node transforms.
//!
//! Clips are decoupled from the scene: channels address nodes by their index
//! in the source asset, and an [`AnimationMixer`] binds those indices to scene
//! objects when the asset is spawned.

use glam::{Quat, Vec3, Vec4};
use gltf::animation::util::ReadOutputs;

use crate::{
    model::Buffers,
    scene_graph::{ObjectId, Scene},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetProperty {
    Translation,
    Rotation,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    /// Outputs are stored as (in-tangent, value, out-tangent) triplets.
    CubicSpline,
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub target_node: usize,
    pub property: TargetProperty,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    /// xyz for translation and scale, xyzw for rotation.
    pub values: Vec<Vec4>,
}

impl Channel {
    fn keyframe_value(&self, index: usize) -> Vec4 {
        match self.interpolation {
            Interpolation::CubicSpline => self.values[index * 3 + 1],
            _ => self.values[index],
        }
    }

    pub fn sample(&self, time: f32) -> Option<Vec4> {
        let last = self.times.len().checked_sub(1)?;

        if time <= self.times[0] {
            return Some(self.keyframe_value(0));
        }
        if time >= self.times[last] {
            return Some(self.keyframe_value(last));
        }

        let next = self.times.partition_point(|&t| t <= time);
        let previous = next - 1;
        let (t0, t1) = (self.times[previous], self.times[next]);
        let delta = t1 - t0;
        let s = if delta > 0.0 { (time - t0) / delta } else { 0.0 };

        let value = match self.interpolation {
            Interpolation::Step => self.keyframe_value(previous),
            Interpolation::Linear => {
                let a = self.values[previous];
                let b = self.values[next];
                match self.property {
                    TargetProperty::Rotation => Vec4::from(
                        Quat::from_vec4(a).slerp(Quat::from_vec4(b), s),
                    ),
                    _ => a.lerp(b, s),
                }
            }
            Interpolation::CubicSpline => {
                let p0 = self.values[previous * 3 + 1];
                let m0 = self.values[previous * 3 + 2] * delta;
                let p1 = self.values[next * 3 + 1];
                let m1 = self.values[next * 3] * delta;

                let s2 = s * s;
                let s3 = s2 * s;
                let value = p0 * (2.0 * s3 - 3.0 * s2 + 1.0)
                    + m0 * (s3 - 2.0 * s2 + s)
                    + p1 * (-2.0 * s3 + 3.0 * s2)
                    + m1 * (s3 - s2);

                match self.property {
                    TargetProperty::Rotation => value.normalize_or_zero(),
                    _ => value,
                }
            }
        };

        Some(value)
    }
}

#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .filter_map(|channel| channel.times.last().copied())
            .fold(0.0, f32::max);

        Self {
            name: name.into(),
            duration,
            channels,
        }
    }

    pub fn from_gltf(animation: gltf::Animation, buffers: Buffers) -> anyhow::Result<Self> {
        let name = animation
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("Animation {}", animation.index()));

        let mut channels = Vec::new();

        for channel in animation.channels() {
            let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(|d| &d[..]));

            let times = reader
                .read_inputs()
                .ok_or_else(|| anyhow::anyhow!("{}: channel without keyframe times", name))?
                .collect::<Vec<f32>>();

            let outputs = reader
                .read_outputs()
                .ok_or_else(|| anyhow::anyhow!("{}: channel without keyframe values", name))?;

            let (property, values): (_, Vec<Vec4>) = match outputs {
                ReadOutputs::Translations(values) => (
                    TargetProperty::Translation,
                    values.map(|v| Vec3::from(v).extend(0.0)).collect(),
                ),
                ReadOutputs::Scales(values) => (
                    TargetProperty::Scale,
                    values.map(|v| Vec3::from(v).extend(0.0)).collect(),
                ),
                ReadOutputs::Rotations(values) => (
                    TargetProperty::Rotation,
                    values.into_f32().map(Vec4::from).collect(),
                ),
                ReadOutputs::MorphTargetWeights(_) => {
                    log::warn!("{}: morph target animation is not supported", name);
                    continue;
                }
            };

            let interpolation = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Step => Interpolation::Step,
                gltf::animation::Interpolation::Linear => Interpolation::Linear,
                gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
            };

            let expected_values = match interpolation {
                Interpolation::CubicSpline => times.len() * 3,
                _ => times.len(),
            };
            if values.len() != expected_values {
                return Err(anyhow::anyhow!(
                    "{}: channel {} has {} keyframe times but {} values, expected {}",
                    name,
                    channel.index(),
                    times.len(),
                    values.len(),
                    expected_values
                ));
            }

            channels.push(Channel {
                target_node: channel.target().node().index(),
                property,
                interpolation,
                times,
                values,
            });
        }

        Ok(AnimationClip::new(name, channels))
    }
}

/// Playback state of one clip.
#[derive(Debug, Clone)]
pub struct ClipAction {
    clip: usize,
    time: f32,
    running: bool,
    pub time_scale: f32,
    pub weight: f32,
}

impl ClipAction {
    pub fn play(&mut self) -> &mut Self {
        self.running = true;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

/// Plays clips against the nodes of one spawned asset.
pub struct AnimationMixer {
    clips: Vec<AnimationClip>,
    actions: Vec<ClipAction>,
    bindings: Vec<ObjectId>,
}

impl AnimationMixer {
    /// `bindings[i]` is the scene object for node `i` of the source asset.
    pub fn new(clips: Vec<AnimationClip>, bindings: Vec<ObjectId>) -> Self {
        let actions = (0..clips.len())
            .map(|clip| ClipAction {
                clip,
                time: 0.0,
                running: false,
                time_scale: 1.0,
                weight: 1.0,
            })
            .collect();

        Self {
            clips,
            actions,
            bindings,
        }
    }

    pub fn actions(&self) -> &[ClipAction] {
        &self.actions
    }

    pub fn clip_action(&mut self, clip: usize) -> Option<&mut ClipAction> {
        self.actions.get_mut(clip)
    }

    /// Advances every running action by `delta` seconds and writes the
    /// sampled values to the bound scene objects. Actions loop forever.
    pub fn update(&mut self, delta: f32, scene: &mut Scene) {
        let mut blended: Vec<(ObjectId, TargetProperty, Vec4, f32)> = Vec::new();

        for action in self.actions.iter_mut().filter(|action| action.running) {
            let clip = &self.clips[action.clip];

            action.time += delta * action.time_scale;
            if clip.duration > 0.0 {
                action.time = action.time.rem_euclid(clip.duration);
            }

            if action.weight <= 0.0 {
                continue;
            }

            for channel in &clip.channels {
                let Some(&object_id) = self.bindings.get(channel.target_node) else {
                    continue;
                };
                let Some(value) = channel.sample(action.time) else {
                    continue;
                };

                match blended
                    .iter_mut()
                    .find(|(id, property, _, _)| *id == object_id && *property == channel.property)
                {
                    Some((_, property, accumulated, total_weight)) => {
                        *total_weight += action.weight;
                        let t = action.weight / *total_weight;
                        *accumulated = match property {
                            TargetProperty::Rotation => Vec4::from(
                                Quat::from_vec4(*accumulated).slerp(Quat::from_vec4(value), t),
                            ),
                            _ => accumulated.lerp(value, t),
                        };
                    }
                    None => blended.push((object_id, channel.property, value, action.weight)),
                }
            }
        }

        for (object_id, property, value, _) in blended {
            match property {
                TargetProperty::Translation => {
                    scene.set_object_translation(object_id, value.truncate())
                }
                TargetProperty::Rotation => {
                    scene.set_object_rotation(object_id, Quat::from_vec4(value).normalize())
                }
                TargetProperty::Scale => scene.set_object_scale(object_id, value.truncate()),
            }
        }
    }
}
