use std::path::Path;
use std::sync::Arc;

use beat_platform::window::load_icon;
use beat_platform::Platform;
use winit::dpi::PhysicalSize;
use winit::window::{Fullscreen, Window};

use crate::backend::BackendKind;
use crate::error::RendererError;
use crate::renderer::{Frame, Renderer, VideoMode};
use crate::screenshot;
use crate::selector::BackendFactory;

const SCREENSHOT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

pub struct WgpuRenderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    adapter_info: wgpu::AdapterInfo,
    kind: BackendKind,
    mode: VideoMode,
    last_clear: wgpu::Color,
    fps_frames: u32,
    fps_elapsed: f32,
    fps: f32,
}

impl WgpuRenderer {
    pub fn new(
        window: Arc<Window>,
        kind: BackendKind,
        mode: VideoMode,
    ) -> Result<Self, RendererError> {
        let backends = kind.wgpu_backends();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        if instance.enumerate_adapters(backends).is_empty() {
            return Err(RendererError::BackendNotInstalled {
                backend: kind,
                detail: format!("no {kind} adapters found"),
            });
        }

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| RendererError::BackendNotInstalled {
                backend: kind,
                detail: format!("failed to create surface: {e}"),
            })?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RendererError::NoHardwareAcceleration { backend: kind })?;

        let adapter_info = adapter.get_info();
        log::info!(
            "GPU adapter: {} ({:?}, driver {})",
            adapter_info.name,
            adapter_info.backend,
            adapter_info.driver
        );

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Beat Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                ..Default::default()
            },
            None,
        ))
        .map_err(|e| RendererError::Generic(format!("failed to create device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| RendererError::Generic("surface reports no formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode(mode.vsync),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            adapter_info,
            kind,
            mode,
            last_clear: wgpu::Color::BLACK,
            fps_frames: 0,
            fps_elapsed: 0.0,
            fps: 0.0,
        })
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

impl Renderer for WgpuRenderer {
    fn backend(&self) -> BackendKind {
        self.kind
    }

    fn adapter_name(&self) -> &str {
        &self.adapter_info.name
    }

    fn is_software_renderer(&self) -> bool {
        self.adapter_info.device_type == wgpu::DeviceType::Cpu
    }

    fn set_video_mode(&mut self, mode: &VideoMode) -> Result<bool, RendererError> {
        let fullscreen = if mode.windowed {
            None
        } else {
            Some(Fullscreen::Borderless(None))
        };
        self.window.set_fullscreen(fullscreen);
        self.window.set_title(&mode.title);
        if mode.icon != self.mode.icon {
            self.window
                .set_window_icon(mode.icon.as_deref().and_then(load_icon));
        }
        if mode.windowed {
            // The OS may apply the size asynchronously; a Resized event follows.
            if let Some(size) = self
                .window
                .request_inner_size(PhysicalSize::new(mode.width, mode.height))
            {
                self.config.width = size.width.max(1);
                self.config.height = size.height.max(1);
            }
        }
        self.config.present_mode = present_mode(mode.vsync);
        self.reconfigure();

        let reload_textures = mode.color_depth != self.mode.color_depth;
        self.mode = mode.clone();
        log::info!(
            "Video mode: {}x{} {} {}bpp{}",
            mode.width,
            mode.height,
            if mode.windowed { "windowed" } else { "fullscreen" },
            mode.color_depth,
            if mode.vsync { " vsync" } else { "" }
        );
        Ok(reload_textures)
    }

    fn update(&mut self, dt: f32) {
        self.fps_frames += 1;
        self.fps_elapsed += dt;
        if self.fps_elapsed >= 1.0 {
            self.fps = self.fps_frames as f32 / self.fps_elapsed;
            self.fps_frames = 0;
            self.fps_elapsed = 0.0;
            log::trace!("{:.1} fps", self.fps);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), RendererError> {
        let [r, g, b, a] = frame.clear_color;
        self.last_clear = wgpu::Color { r, g, b, a };

        let output = match self.surface.get_current_texture() {
            Ok(tex) => tex,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(RendererError::Generic("GPU out of memory".to_string()));
            }
            Err(e) => {
                log::warn!("Surface error: {:?}", e);
                return Ok(());
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.clear_into(&view);
        output.present();
        Ok(())
    }

    fn save_screenshot(&mut self, path: &Path) -> Result<(), RendererError> {
        let width = self.config.width;
        let height = self.config.height;
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Screenshot Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SCREENSHOT_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.clear_into(&view);

        let pixels = screenshot::read_texture_rgba(&self.device, &self.queue, &texture, width, height)?;
        screenshot::save_rgba(path, pixels, width, height)?;
        log::info!("Screenshot saved to {}", path.display());
        Ok(())
    }
}

impl WgpuRenderer {
    fn clear_into(&self, view: &wgpu::TextureView) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.last_clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

/// Builds `WgpuRenderer`s, creating the window through the platform.
pub struct WgpuBackendFactory<'a> {
    platform: &'a Platform,
    mode: VideoMode,
}

impl<'a> WgpuBackendFactory<'a> {
    pub fn new(platform: &'a Platform, mode: VideoMode) -> Self {
        Self { platform, mode }
    }
}

impl BackendFactory for WgpuBackendFactory<'_> {
    fn hardware_description(&mut self) -> String {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapters: Vec<String> = instance
            .enumerate_adapters(wgpu::Backends::all())
            .iter()
            .map(|adapter| {
                let info = adapter.get_info();
                format!("{} ({:?}, driver {} {})", info.name, info.backend, info.driver, info.driver_info)
            })
            .collect();
        if adapters.is_empty() {
            "no graphics adapters found".to_string()
        } else {
            adapters.join("\n")
        }
    }

    fn create(&mut self, kind: BackendKind) -> Result<Box<dyn Renderer>, RendererError> {
        let window = self
            .platform
            .create_window(&self.mode.platform_config())
            .map_err(|e| RendererError::Generic(e.to_string()))?;
        let renderer = WgpuRenderer::new(window, kind, self.mode.clone())?;
        Ok(Box::new(renderer))
    }
}
