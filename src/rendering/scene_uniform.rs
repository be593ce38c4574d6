use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::{
    camera::Camera,
    lighting::{Lights, MAX_DIRECTIONAL_LIGHTS},
};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct DirectionalLightData {
    pub direction: [f32; 4],
    /// Color premultiplied by intensity.
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniformState {
    pub view_proj: Mat4,
    pub ambient: [f32; 4],
    pub light_count: [u32; 4],
    pub lights: [DirectionalLightData; MAX_DIRECTIONAL_LIGHTS],
}

impl SceneUniformState {
    pub fn new(camera: &Camera, lights: &Lights) -> Self {
        let mut packed = [DirectionalLightData::default(); MAX_DIRECTIONAL_LIGHTS];
        let count = lights.directional.len().min(MAX_DIRECTIONAL_LIGHTS);

        for (slot, light) in packed.iter_mut().zip(&lights.directional) {
            *slot = DirectionalLightData {
                direction: light.direction_to_light().extend(0.0).to_array(),
                color: (light.color * light.intensity).extend(1.0).to_array(),
            };
        }

        Self {
            view_proj: camera.get_vp_matrix(),
            ambient: lights.ambient_radiance().extend(1.0).to_array(),
            light_count: [count as u32, 0, 0, 0],
            lights: packed,
        }
    }
}

pub struct SceneUniform {
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl SceneUniform {
    pub fn new(device: &wgpu::Device, initial_state: SceneUniformState) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene uniform buffer"),
            contents: bytemuck::cast_slice(&[initial_state]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene uniform bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene uniform bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, state: SceneUniformState) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[state]));
    }
}
