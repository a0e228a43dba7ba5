//! Main renderer managing wgpu state and rendering.

use crate::{
    camera::{Camera, CameraUniform},
    color::{scene_format_for, OutputEncoding},
    frame::FrameError,
    mesh::Mesh,
    mosaic::PixelView,
    pipeline::{
        create_camera_bind_group_layout, create_moon_bind_group_layout, create_overlay_pipeline, MoonShading,
        PipelineSet,
    },
    readback::{ReadbackError, SceneTarget},
    texture::Texture,
    vertex::OverlayBatch,
};
use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use orbit::ReliefParams;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

/// Default background gray, display space.
pub const BACKGROUND_GRAY: f32 = 10.0 / 255.0;

/// Surface and lighting constants of the moon. Colors in display space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoonMaterial {
    /// Relief color at noise 0.
    pub ramp_low: [f32; 3],
    /// Relief color at noise 1.
    pub ramp_high: [f32; 3],
    pub material_color: [f32; 3],
    pub specular_color: [f32; 3],
    pub shininess: f32,
    pub light_color: [f32; 3],
    pub ambient_strength: f32,
}

impl MoonMaterial {
    /// Gray material under a slightly warm light.
    pub fn lit() -> Self {
        Self {
            ramp_low: [0.0; 3],
            ramp_high: [1.0; 3],
            material_color: [200.0 / 255.0; 3],
            specular_color: [200.0 / 255.0; 3],
            shininess: 5.0,
            light_color: [1.0, 1.0, 220.0 / 255.0],
            ambient_strength: 30.0 / 255.0,
        }
    }

    /// Red-to-green noise ramp with a white highlight.
    pub fn relief() -> Self {
        Self {
            ramp_low: [1.0, 0.0, 0.0],
            ramp_high: [10.0 / 255.0, 245.0 / 255.0, 14.0 / 255.0],
            material_color: [0.78; 3],
            specular_color: [1.0; 3],
            shininess: 16.0,
            light_color: [1.0; 3],
            ambient_strength: 0.25,
        }
    }
}

/// Moon shader uniform (must match `Moon` in moon_lit.wgsl and moon_relief.wgsl).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MoonUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of view * model, for eye-space normals.
    pub normal_matrix: [[f32; 4]; 4],
    /// xyz = unit vector toward the sun in eye space
    pub sun_eye: [f32; 4],
    pub ramp_low: [f32; 4],
    pub ramp_high: [f32; 4],
    pub material_color: [f32; 4],
    /// w = shininess
    pub specular_color: [f32; 4],
    /// w = ambient strength
    pub light_color: [f32; 4],
    /// x = time, y = noise scale, z = displacement, w = time scale
    pub params: [f32; 4],
    /// x = 1 when the shader must output linear color
    pub flags: [f32; 4],
}

impl MoonUniform {
    pub fn new(
        model: Mat4,
        view: Mat4,
        sun_eye: Vec3,
        material: &MoonMaterial,
        relief: &ReliefParams,
        time: f32,
        encoding: OutputEncoding,
    ) -> Self {
        let model_view = Mat3::from_mat4(view * model);
        let normal_matrix = Mat4::from_mat3(model_view.inverse().transpose());
        let sun = sun_eye.normalize_or_zero();
        let rgb = |c: [f32; 3], w: f32| [c[0], c[1], c[2], w];
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            sun_eye: [sun.x, sun.y, sun.z, 0.0],
            ramp_low: rgb(material.ramp_low, 1.0),
            ramp_high: rgb(material.ramp_high, 1.0),
            material_color: rgb(material.material_color, 1.0),
            specular_color: rgb(material.specular_color, material.shininess),
            light_color: rgb(material.light_color, material.ambient_strength),
            params: [time, relief.noise_scale, relief.displacement, relief.time_scale],
            flags: [encoding.shader_flag(), 0.0, 0.0, 0.0],
        }
    }
}

impl Default for MoonUniform {
    fn default() -> Self {
        Self::new(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Vec3::Z,
            &MoonMaterial::lit(),
            &ReliefParams::default(),
            0.0,
            OutputEncoding::Raw,
        )
    }
}

/// Main renderer state.
pub struct Renderer {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub window: Arc<Window>,

    // Pipelines for the swapchain and for the offscreen scene
    surface_pipelines: PipelineSet,
    scene_pipelines: PipelineSet,
    overlay_pipeline: wgpu::RenderPipeline,

    camera_bind_group: wgpu::BindGroup,
    camera_buffer: wgpu::Buffer,
    camera_uniform: CameraUniform,
    view_matrix: Mat4,

    moon_bind_group: wgpu::BindGroup,
    moon_buffer: wgpu::Buffer,

    depth_texture: Texture,
    scene: SceneTarget,

    encoding: OutputEncoding,
    background: f32,
}

impl Renderer {
    /// Create a new renderer for the given window.
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        log::info!("Using GPU: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Surface reports no supported formats"))?;
        log::info!("Surface format: {:?}", surface_format);

        let present_mode = if vsync {
            surface_caps
                .present_modes
                .iter()
                .find(|m| matches!(m, wgpu::PresentMode::Mailbox))
                .copied()
                .unwrap_or(wgpu::PresentMode::AutoVsync)
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let moon_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Moon Uniform Buffer"),
            contents: bytemuck::cast_slice(&[MoonUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout = create_camera_bind_group_layout(&device);
        let moon_bind_group_layout = create_moon_bind_group_layout(&device);

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });
        let moon_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Moon Bind Group"),
            layout: &moon_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: moon_buffer.as_entire_binding(),
            }],
        });

        let scene_format = scene_format_for(surface_format);
        let surface_pipelines =
            PipelineSet::new(&device, surface_format, &camera_bind_group_layout, &moon_bind_group_layout);
        let scene_pipelines = PipelineSet::new(&device, scene_format, &camera_bind_group_layout, &moon_bind_group_layout);
        let overlay_pipeline = create_overlay_pipeline(&device, surface_format);

        let depth_texture = Texture::create_depth_texture(&device, config.width, config.height, "Depth Texture");
        let scene = SceneTarget::new(&device, config.width, config.height, scene_format)?;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            window,
            surface_pipelines,
            scene_pipelines,
            overlay_pipeline,
            camera_bind_group,
            camera_buffer,
            camera_uniform,
            view_matrix: Mat4::IDENTITY,
            moon_bind_group,
            moon_buffer,
            depth_texture,
            scene,
            encoding: OutputEncoding::for_format(surface_format),
            background: BACKGROUND_GRAY,
        })
    }

    /// Resize the surface and recreate every size-dependent target.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, self.config.width, self.config.height, "Depth Texture");
        match SceneTarget::new(&self.device, self.config.width, self.config.height, self.scene_pipelines.format) {
            Ok(scene) => self.scene = scene,
            Err(e) => log::error!("Failed to recreate scene target: {e}"),
        }
        log::debug!("Resized to {}x{}", new_size.width, new_size.height);
    }

    /// Display-space background gray.
    pub fn set_background(&mut self, gray: f32) {
        self.background = gray.clamp(0.0, 1.0);
    }

    /// Acquire the next swapchain image. `None` means skip this frame.
    pub fn begin_frame(&mut self) -> Result<Option<(wgpu::SurfaceTexture, wgpu::CommandEncoder)>, FrameError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(None);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(FrameError::OutOfMemory),
            Err(e) => {
                log::warn!("Skipping frame: {e}");
                return Ok(None);
            }
        };
        let encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        Ok(Some((output, encoder)))
    }

    pub fn update_camera(&mut self, camera: &Camera) {
        self.camera_uniform.update(camera);
        self.view_matrix = camera.view_matrix();
        self.queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[self.camera_uniform]));
    }

    /// Upload this frame's moon transform, light and material. Call after `update_camera`.
    pub fn update_moon(&mut self, model: Mat4, sun_eye: Vec3, material: &MoonMaterial, relief: &ReliefParams, time: f32) {
        let uniform = MoonUniform::new(model, self.view_matrix, sun_eye, material, relief, time, self.encoding);
        self.queue.write_buffer(&self.moon_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    fn clear_color(&self) -> wgpu::Color {
        self.encoding.clear_color(self.background)
    }

    fn draw_moon(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        mesh: &Mesh,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Moon Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color()),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_bind_group(1, &self.moon_bind_group, &[]);
        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
    }

    /// Clear the swapchain image and draw the moon into it.
    pub fn render_moon(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        mesh: &Mesh,
        shading: MoonShading,
    ) {
        self.draw_moon(
            encoder,
            view,
            &self.depth_texture.view,
            self.surface_pipelines.moon(shading),
            mesh,
        );
    }

    /// Draw the moon offscreen, copy it to the CPU and hand the pixels to `f`.
    /// Blocks until the GPU has finished.
    pub fn read_scene<R>(
        &self,
        mesh: &Mesh,
        shading: MoonShading,
        f: impl FnOnce(&PixelView) -> R,
    ) -> Result<R, ReadbackError> {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Readback Encoder"),
        });
        self.draw_moon(
            &mut encoder,
            &self.scene.color.view,
            &self.scene.depth.view,
            self.scene_pipelines.moon(shading),
            mesh,
        );
        self.scene.copy_to_readback(&mut encoder);
        self.queue.submit(std::iter::once(encoder.finish()));
        self.scene.read(&self.device, f)
    }

    /// Draw screen-space quads. With `clear` the image is cleared to the background first.
    pub fn render_overlay(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, batch: &OverlayBatch, clear: bool) {
        if batch.is_empty() && !clear {
            return;
        }
        let load = if clear {
            wgpu::LoadOp::Clear(self.clear_color())
        } else {
            wgpu::LoadOp::Load
        };

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Vertex Buffer"),
            contents: bytemuck::cast_slice(&batch.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Index Buffer"),
            contents: bytemuck::cast_slice(&batch.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        if batch.is_empty() {
            return;
        }

        render_pass.set_pipeline(&self.overlay_pipeline);
        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..batch.indices.len() as u32, 0, 0..1);
    }

    /// End frame and present.
    pub fn end_frame(&self, output: wgpu::SurfaceTexture, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    /// Get window dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Access the device for mesh creation.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// How colors must be encoded for the surface.
    pub fn encoding(&self) -> OutputEncoding {
        self.encoding
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moon_uniform_is_wgsl_sized() {
        assert_eq!(std::mem::size_of::<MoonUniform>(), 256);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 208);
    }

    #[test]
    fn moon_uniform_packs_material_and_params() {
        let relief = ReliefParams::default();
        let uniform = MoonUniform::new(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Vec3::new(0.0, 0.0, 2.0),
            &MoonMaterial::relief(),
            &relief,
            1.5,
            OutputEncoding::Srgb,
        );
        assert_eq!(uniform.sun_eye, [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(uniform.params, [1.5, 4.0, 0.1, 0.2]);
        assert_eq!(uniform.specular_color[3], 16.0);
        assert_eq!(uniform.light_color[3], 0.25);
        assert_eq!(uniform.ramp_low, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniform.flags[0], 1.0);
    }

    #[test]
    fn normal_matrix_keeps_normals_perpendicular_under_scale() {
        let model = Mat4::from_scale(Vec3::new(80.0, 80.0, 80.0)) * Mat4::from_rotation_y(0.7);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(300.0, 0.0, 0.0), Vec3::Y);
        let uniform = MoonUniform::new(
            model,
            view,
            Vec3::X,
            &MoonMaterial::lit(),
            &ReliefParams::default(),
            0.0,
            OutputEncoding::Raw,
        );
        let normal_matrix = Mat4::from_cols_array_2d(&uniform.normal_matrix);

        let tangent = Vec3::X;
        let normal = Vec3::Y;
        let t = (view * model).transform_vector3(tangent);
        let n = normal_matrix.transform_vector3(normal);
        assert!(t.dot(n).abs() < 1e-3);
    }

    #[test]
    fn lit_material_matches_fixed_function_values() {
        let lit = MoonMaterial::lit();
        assert_eq!(lit.shininess, 5.0);
        assert!((lit.ambient_strength - 30.0 / 255.0).abs() < 1e-6);
        assert!((lit.light_color[2] - 220.0 / 255.0).abs() < 1e-6);
    }
}
