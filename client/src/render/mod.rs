use glam::Mat4;
use web_sys::HtmlCanvasElement;

pub mod boxes;
pub mod camera;
pub mod gpu;
pub mod labels;
pub mod shadow;

use boxes::{BoxInstance, BoxRenderer};
use camera::{CameraState, SceneFrame};
use gpu::create_depth_texture;
use shadow::ShadowMap;

use crate::config::{FOG_FAR, FOG_NEAR};
use crate::error::EngineError;
use crate::game::GameState;
use crate::settings::{RenderQuality, ShadowMode};

pub struct RenderContext {
    pub canvas: HtmlCanvasElement,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl RenderContext {
    pub async fn new(canvas: HtmlCanvasElement) -> Result<Self, EngineError> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| EngineError::Surface(e.to_string()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| EngineError::Adapter(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Obby Device"),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                ..Default::default()
            })
            .await
            .map_err(|e| EngineError::Device(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| EngineError::Surface("surface reports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("Render surface {}x{} ({:?})", width, height, surface_format);

        Ok(Self {
            canvas,
            surface,
            device,
            queue,
            config,
        })
    }
}

pub struct Renderer {
    pub ctx: RenderContext,
    camera: CameraState,
    shadow: ShadowMap,
    depth_view: wgpu::TextureView,
    boxes: BoxRenderer,
    quality: RenderQuality,
}

impl Renderer {
    pub async fn new(
        canvas: HtmlCanvasElement,
        quality: RenderQuality,
    ) -> Result<Self, EngineError> {
        let ctx = RenderContext::new(canvas).await?;
        let camera = CameraState::new(&ctx.device);
        let shadow = ShadowMap::new(&ctx.device);
        let (_, depth_view) = create_depth_texture(
            &ctx.device,
            ctx.config.width,
            ctx.config.height,
            "Depth Texture",
        );
        let boxes = BoxRenderer::new(&ctx.device, &camera.layout, &shadow.layout, ctx.config.format);

        Ok(Self {
            ctx,
            camera,
            shadow,
            depth_view,
            boxes,
            quality,
        })
    }

    /// Apply a new tier; the backing store is resized at the new density.
    pub fn set_quality(&mut self, quality: RenderQuality, css_width: f64, css_height: f64) {
        self.quality = quality;
        self.resize(css_width, css_height);
    }

    /// Resize to a CSS-pixel size at the current pixel ratio.
    pub fn resize(&mut self, css_width: f64, css_height: f64) {
        let ratio = self.quality.pixel_ratio as f64;
        let width = (css_width * ratio).round().max(1.0) as u32;
        let height = (css_height * ratio).round().max(1.0) as u32;
        if width == self.ctx.config.width && height == self.ctx.config.height {
            return;
        }
        self.ctx.canvas.set_width(width);
        self.ctx.canvas.set_height(height);
        self.ctx.config.width = width;
        self.ctx.config.height = height;
        self.ctx
            .surface
            .configure(&self.ctx.device, &self.ctx.config);

        let (_, depth_view) = create_depth_texture(&self.ctx.device, width, height, "Depth Texture");
        self.depth_view = depth_view;
    }

    pub fn aspect(&self) -> f32 {
        self.ctx.config.width as f32 / self.ctx.config.height as f32
    }

    pub fn view_proj(&self, game: &GameState) -> Mat4 {
        game.camera_pose()
            .view_proj(game.settings.fov_radians(), self.aspect())
    }

    pub fn render_frame(&mut self, game: &GameState) -> Result<(), wgpu::SurfaceError> {
        let pose = game.camera_pose();
        let sky = game.sky_color().map(|c| c.powf(2.2));
        let shadow_mode = match self.quality.shadows {
            ShadowMode::Off => 0.0,
            ShadowMode::Hard => 1.0,
            ShadowMode::Soft => 2.0,
        };
        self.camera.update(
            &self.ctx.queue,
            &SceneFrame {
                view_proj: self.view_proj(game),
                light_view_proj: ShadowMap::light_view_proj(game.player.position),
                eye: pose.eye,
                sky,
                light_dir: ShadowMap::light_dir(),
                fog: (FOG_NEAR, FOG_FAR),
                shadow_mode,
                shadow_texel: ShadowMap::texel_size(),
            },
        );

        let mut instances: Vec<BoxInstance> = game
            .platforms
            .iter()
            .map(|p| {
                let model = Mat4::from_translation(p.center()) * Mat4::from_scale(p.size());
                BoxInstance::new(model, p.color, p.opacity)
            })
            .collect();
        instances.extend(
            game.character_boxes()
                .into_iter()
                .map(|b| BoxInstance::new(b.model, b.color, 1.0)),
        );
        self.boxes
            .prepare(&self.ctx.device, &self.ctx.queue, pose.eye, instances);

        let output = self.ctx.surface.get_current_texture()?;
        let swapchain_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            // Always cleared so the map reads as fully lit when shadows are off.
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            if self.quality.shadows != ShadowMode::Off {
                self.boxes.render_shadow(&mut pass, &self.camera.bind_group);
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swapchain_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: sky[0] as f64,
                            g: sky[1] as f64,
                            b: sky[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            self.boxes
                .render(&mut pass, &self.camera.bind_group, &self.shadow.bind_group);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Reconfigure after the surface was lost or went stale.
    pub fn recover_surface(&mut self) {
        self.ctx
            .surface
            .configure(&self.ctx.device, &self.ctx.config);
    }
}
