use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::gpu::{create_uniform_buffer, scene_bind_group_layout};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub sky: [f32; 4],
    /// xyz points toward the sun.
    pub light_dir: [f32; 4],
    /// fog near, fog far, shadow mode (0 off, 1 hard, 2 soft), shadow texel size.
    pub params: [f32; 4],
}

/// Inputs for one frame's scene uniform.
pub struct SceneFrame {
    pub view_proj: Mat4,
    pub light_view_proj: Mat4,
    pub eye: Vec3,
    pub sky: [f32; 3],
    pub light_dir: Vec3,
    pub fog: (f32, f32),
    pub shadow_mode: f32,
    pub shadow_texel: f32,
}

impl From<&SceneFrame> for SceneUniform {
    fn from(frame: &SceneFrame) -> Self {
        Self {
            view_proj: frame.view_proj.to_cols_array_2d(),
            light_view_proj: frame.light_view_proj.to_cols_array_2d(),
            eye: frame.eye.extend(1.0).to_array(),
            sky: [frame.sky[0], frame.sky[1], frame.sky[2], 1.0],
            light_dir: frame.light_dir.extend(0.0).to_array(),
            params: [frame.fog.0, frame.fog.1, frame.shadow_mode, frame.shadow_texel],
        }
    }
}

pub struct CameraState {
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub layout: wgpu::BindGroupLayout,
}

impl CameraState {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = SceneUniform::zeroed();
        let uniform_buffer = create_uniform_buffer(device, &uniform, "Scene Uniform");

        let layout = scene_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            uniform_buffer,
            bind_group,
            layout,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, frame: &SceneFrame) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[SceneUniform::from(frame)]),
        );
    }
}
