use glam::{Mat4, Vec3};

use super::gpu::{create_depth_texture, shadow_bind_group_layout};

pub const SHADOW_MAP_SIZE: u32 = 1024;
const SHADOW_EXTENT: f32 = 40.0;
const SUN_POSITION: Vec3 = Vec3::new(50.0, 100.0, 50.0);

/// Directional-light depth map that follows the player.
pub struct ShadowMap {
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
    pub layout: wgpu::BindGroupLayout,
    _texture: wgpu::Texture,
}

impl ShadowMap {
    pub fn new(device: &wgpu::Device) -> Self {
        let (texture, view) =
            create_depth_texture(device, SHADOW_MAP_SIZE, SHADOW_MAP_SIZE, "Shadow Map");
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let layout = shadow_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });
        Self {
            view,
            bind_group,
            layout,
            _texture: texture,
        }
    }

    pub fn light_dir() -> Vec3 {
        SUN_POSITION.normalize()
    }

    /// Orthographic light frustum centered on `focus`.
    pub fn light_view_proj(focus: Vec3) -> Mat4 {
        let eye = focus + Self::light_dir() * 100.0;
        let view = Mat4::look_at_rh(eye, focus, Vec3::Y);
        let proj = Mat4::orthographic_rh(
            -SHADOW_EXTENT,
            SHADOW_EXTENT,
            -SHADOW_EXTENT,
            SHADOW_EXTENT,
            0.5,
            500.0,
        );
        proj * view
    }

    pub fn texel_size() -> f32 {
        1.0 / SHADOW_MAP_SIZE as f32
    }
}
