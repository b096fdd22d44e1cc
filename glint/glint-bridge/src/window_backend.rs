//! Window-capable backend: created from a window, implements RenderBackendWindow.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use render_api::{ExtractedMeshes, ExtractedView, RenderBackend, RenderBackendWindow};
use wgpu::SurfaceTargetUnsafe;

use crate::plugin::GlintPlugin;
use glint_renderer::{CameraState, GlintConfig};

/// Backend that owns wgpu Instance and GlintPlugin; can present to a window.
/// Created via `GlintWindowBackend::from_window(window)`; each frame use
/// `render_frame_to_window(view, raw_window_handle, raw_display_handle)`.
/// Surface is recreated each frame (wgpu::Surface lifetime tied to window; avoids
/// transmute and platform-specific staleness when window is dragged/resized).
pub struct GlintWindowBackend {
    instance: wgpu::Instance,
    plugin: GlintPlugin,
}

impl GlintWindowBackend {
    /// Create a window-capable backend from a window (e.g. winit). The window is only used
    /// to get raw handles and to create an initial surface for adapter selection.
    /// The host must keep the window alive; each frame pass its raw handles to
    /// `render_frame_to_window`.
    pub fn from_window(
        window: &(impl HasWindowHandle + HasDisplayHandle),
    ) -> Result<Box<dyn RenderBackendWindow>, String> {
        Self::from_window_with_config(window, GlintConfig::default())
    }

    pub fn from_window_with_config(
        window: &(impl HasWindowHandle + HasDisplayHandle),
        config: GlintConfig,
    ) -> Result<Box<dyn RenderBackendWindow>, String> {
        let (raw_window, raw_display) = {
            let wh = window.window_handle().map_err(|e| e.to_string())?;
            let dh = window.display_handle().map_err(|e| e.to_string())?;
            (wh.as_raw(), dh.as_raw())
        };
        let backend =
            pollster::block_on(Self::from_raw_handles_async(raw_window, raw_display, config))?;
        Ok(Box::new(backend))
    }

    async fn from_raw_handles_async(
        raw_window_handle: raw_window_handle::RawWindowHandle,
        raw_display_handle: raw_window_handle::RawDisplayHandle,
        mut config: GlintConfig,
    ) -> Result<Self, String> {
        let instance = wgpu::Instance::default();
        let target = SurfaceTargetUnsafe::RawHandle {
            raw_window_handle,
            raw_display_handle,
        };
        let surface = unsafe {
            instance
                .create_surface_unsafe(target)
                .map_err(|e| e.to_string())?
        };
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or("No adapter")?;
        // Camera state travels as a push constant; the feature is not in the
        // default limits.
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("glint_device"),
                    required_features: wgpu::Features::PUSH_CONSTANTS,
                    required_limits: wgpu::Limits {
                        max_push_constant_size: CameraState::SIZE,
                        ..wgpu::Limits::default()
                    },
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| e.to_string())?;
        let caps = surface.get_capabilities(&adapter);
        config.swapchain_format = caps
            .formats
            .first()
            .copied()
            .unwrap_or(wgpu::TextureFormat::Rgba8Unorm);
        let plugin = GlintPlugin::new_with_config(device, queue, config)?;
        drop(surface);
        Ok(Self { instance, plugin })
    }

    fn surface_config(
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> wgpu::SurfaceConfiguration {
        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }
}

impl RenderBackend for GlintWindowBackend {
    fn prepare(&mut self, extracted: &ExtractedMeshes) {
        self.plugin.prepare(extracted);
    }

    fn render_frame(&mut self, view: &ExtractedView) -> Result<(), String> {
        self.plugin.render_frame(view)
    }
}

impl RenderBackendWindow for GlintWindowBackend {
    fn render_frame_to_window(
        &mut self,
        view: &ExtractedView,
        raw_window_handle: raw_window_handle::RawWindowHandle,
        raw_display_handle: raw_window_handle::RawDisplayHandle,
    ) -> Result<(), String> {
        let target = SurfaceTargetUnsafe::RawHandle {
            raw_window_handle,
            raw_display_handle,
        };
        let surface = unsafe {
            self.instance
                .create_surface_unsafe(target)
                .map_err(|e| e.to_string())?
        };
        let (width, height) = view.viewport_size;
        let config = Self::surface_config(
            self.plugin.renderer().config().swapchain_format,
            width.max(1),
            height.max(1),
        );
        surface.configure(self.plugin.device(), &config);

        let frame = match surface.get_current_texture() {
            Ok(f) => f,
            Err(wgpu::SurfaceError::Outdated) | Err(wgpu::SurfaceError::Lost) => {
                surface.configure(self.plugin.device(), &config);
                surface.get_current_texture().map_err(|e| e.to_string())?
            }
            Err(wgpu::SurfaceError::Timeout) => {
                return Err("Surface get_current_texture timeout".to_string())
            }
            Err(e) => return Err(e.to_string()),
        };
        let viewport = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.plugin.render_frame_to_swapchain(view, &viewport)?;
        frame.present();
        Ok(())
    }
}
