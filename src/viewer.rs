//! The viewer application: window and event loop, asset loading at startup,
//! and the per-frame update/render cycle.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::{
    context::Context,
    scene::{
        descriptor::catalog,
        place::{load_descriptor, load_terrain, settle},
        planet::selected_planet,
        registry::ModelRegistry,
    },
};
#[cfg(target_arch = "wasm32")]
use crate::scene::registry::LoadedModel;

/// Events the async parts of startup feed back into the event loop.
pub enum ViewerEvent {
    #[cfg(target_arch = "wasm32")]
    ContextReady(Box<Context>),
    #[cfg(target_arch = "wasm32")]
    ModelLoaded(String, anyhow::Result<LoadedModel>),
}

pub struct Viewer {
    context: Option<Context>,
    registry: ModelRegistry,
    #[allow(dead_code)]
    proxy: EventLoopProxy<ViewerEvent>,
    mouse_pressed: bool,
    last_frame: Option<instant::Instant>,
    #[cfg(not(target_arch = "wasm32"))]
    runtime: tokio::runtime::Runtime,
}

impl Viewer {
    fn new(proxy: EventLoopProxy<ViewerEvent>) -> anyhow::Result<Self> {
        Ok(Self {
            context: None,
            registry: ModelRegistry::new(),
            proxy,
            mouse_pressed: false,
            last_frame: None,
            #[cfg(not(target_arch = "wasm32"))]
            runtime: tokio::runtime::Runtime::new()?,
        })
    }

    /// Load the whole catalog plus the selected planet's terrain against the
    /// ready context and settle the outcomes into the registry. Native only;
    /// on the web the same work runs as spawned tasks reporting back through
    /// [`ViewerEvent::ModelLoaded`].
    #[cfg(not(target_arch = "wasm32"))]
    fn load_scene(&mut self, context: &Context) {
        let device = &context.device;
        let queue = &context.queue;
        let planet = selected_planet();

        let outcomes = self.runtime.block_on(async {
            let models = futures::future::join_all(catalog().into_iter().map(|descriptor| {
                async move {
                    (
                        descriptor.folder.to_string(),
                        load_descriptor(descriptor, device, queue).await,
                    )
                }
            }));
            let terrain = async {
                (
                    format!("surface_terrain_model/{planet}"),
                    load_terrain(&planet, device, queue).await,
                )
            };
            let (mut outcomes, terrain) = futures::join!(models, terrain);
            outcomes.push(terrain);
            outcomes
        });
        settle(outcomes, &mut self.registry);
        log::info!("scene ready with {} models", self.registry.len());
    }

    /// Spawn one browser task per asset; each task reports its outcome back
    /// through the event loop proxy.
    #[cfg(target_arch = "wasm32")]
    fn load_scene(&mut self, context: &Context) {
        let planet = selected_planet();
        for descriptor in catalog() {
            let device = context.device.clone();
            let queue = context.queue.clone();
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let outcome = load_descriptor(descriptor, &device, &queue).await;
                let _ = proxy.send_event(ViewerEvent::ModelLoaded(
                    descriptor.folder.to_string(),
                    outcome,
                ));
            });
        }
        let device = context.device.clone();
        let queue = context.queue.clone();
        let proxy = self.proxy.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = load_terrain(&planet, &device, &queue).await;
            let _ = proxy.send_event(ViewerEvent::ModelLoaded(
                format!("surface_terrain_model/{planet}"),
                outcome,
            ));
        });
    }

    fn toggle_fullscreen(window: &Window) {
        if window.fullscreen().is_some() {
            window.set_fullscreen(None);
        } else {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
    }

    /// Advance camera, animations and world transforms by `dt` seconds and
    /// push the results to the GPU.
    fn update(&mut self, dt: f32) {
        let Some(context) = self.context.as_mut() else {
            return;
        };
        let camera = &mut context.camera;
        camera.controller.update(&mut camera.camera);
        camera.uniform.update_view_proj(&camera.camera, &context.projection);
        context
            .queue
            .write_buffer(&camera.buffer, 0, bytemuck::cast_slice(&[camera.uniform]));

        self.registry.update(dt);
        self.registry.write_to_buffers(&context.queue);
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let Some(context) = self.context.as_ref() else {
            return Ok(());
        };
        let output = context.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(context.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &context.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&context.pipeline);
            self.registry.draw(
                &context.camera.bind_group,
                &context.light.bind_group,
                &mut render_pass,
            );
        }

        context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl ApplicationHandler<ViewerEvent> for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.context.is_some() {
            return;
        }
        let attributes = Window::default_attributes().with_title("marsview");
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(error) => {
                log::error!("failed to create window: {error}");
                event_loop.exit();
                return;
            }
        };

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowExtWebSys;
            web_sys::window()
                .and_then(|win| win.document())
                .and_then(|doc| {
                    let canvas = web_sys::Element::from(window.canvas()?);
                    doc.body()?.append_child(&canvas).ok()
                })
                .expect("couldn't append canvas to document body");
            let _ = window.request_inner_size(winit::dpi::LogicalSize::new(1280, 720));

            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window).await {
                    Ok(context) => {
                        let _ = proxy.send_event(ViewerEvent::ContextReady(Box::new(context)));
                    }
                    Err(error) => log::error!("failed to initialise GPU context: {error:#}"),
                }
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let context = match self.runtime.block_on(Context::new(window)) {
                Ok(context) => context,
                Err(error) => {
                    log::error!("failed to initialise GPU context: {error:#}");
                    event_loop.exit();
                    return;
                }
            };
            self.load_scene(&context);
            context.window.request_redraw();
            self.context = Some(context);
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            #[cfg(target_arch = "wasm32")]
            ViewerEvent::ContextReady(context) => {
                self.load_scene(&context);
                context.window.request_redraw();
                self.context = Some(*context);
            }
            #[cfg(target_arch = "wasm32")]
            ViewerEvent::ModelLoaded(name, outcome) => {
                settle(std::iter::once((name, outcome)), &mut self.registry);
            }
            #[cfg(not(target_arch = "wasm32"))]
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event
            && self.mouse_pressed
            && let Some(context) = self.context.as_mut()
        {
            context.camera.controller.handle_mouse(dx, dy);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::F11),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Some(context) = self.context.as_ref() {
                    Self::toggle_fullscreen(&context.window);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => self.mouse_pressed = state == ElementState::Pressed,
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(context) = self.context.as_mut() {
                    context.camera.controller.handle_scroll(&delta);
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(context) = self.context.as_mut() {
                    context.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let now = instant::Instant::now();
                let dt = self
                    .last_frame
                    .map(|last| (now - last).as_secs_f32())
                    .unwrap_or(0.0);
                self.last_frame = Some(now);

                self.update(dt);
                match self.render() {
                    Ok(()) => {}
                    // The surface is gone or stale; reconfiguring it at the
                    // current size brings it back.
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(context) = self.context.as_mut() {
                            let size = context.window.inner_size();
                            context.resize(size.width, size.height);
                        }
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("out of GPU memory, shutting down");
                        event_loop.exit();
                    }
                    Err(error) => log::warn!("surface error: {error}"),
                }
                if let Some(context) = self.context.as_ref() {
                    context.window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Start the viewer: initialise logging, build the event loop and run the
/// application until the window closes.
pub fn run() -> anyhow::Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            console_log::init_with_level(log::Level::Info)
                .map_err(|error| anyhow::anyhow!("couldn't initialise logger: {error}"))?;
        } else {
            env_logger::init();
        }
    }

    let event_loop = EventLoop::<ViewerEvent>::with_user_event().build()?;
    let proxy = event_loop.create_proxy();
    let mut viewer = Viewer::new(proxy)?;
    event_loop.run_app(&mut viewer)?;
    Ok(())
}
