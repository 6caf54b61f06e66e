mod session;

use anyhow::Result;
use driftview_config::AppConfig;
use driftview_input::{GestureRecognizer, ViewportController, ViewportState};
use driftview_motion::trajectory::TrajectoryStore;
use driftview_motion::FeedClient;
use driftview_renderer::{tessellate, GpuRenderer, PathRenderer};
use session::Session;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Application state.
struct App {
    config: AppConfig,
    session: Session,
    gestures: GestureRecognizer<ViewportController>,
    path_renderer: PathRenderer,
    window: Option<Arc<Window>>,
    gpu: Option<GpuRenderer>,
    /// Store revision, viewport and surface size the uploaded mesh was built for.
    mesh_key: Option<(u64, ViewportState, (u32, u32))>,
    title: String,
    frame_count: u64,
}

impl App {
    fn new(config: AppConfig, session: Session) -> Self {
        let gestures = GestureRecognizer::new()
            .on_scale(|viewport: &mut ViewportController, factor| viewport.apply_scale(factor))
            .on_drag(|viewport: &mut ViewportController, distance| viewport.apply_drag(distance));

        Self {
            path_renderer: PathRenderer::new(config.render.clone()),
            config,
            session,
            gestures,
            window: None,
            gpu: None,
            mesh_key: None,
            title: String::new(),
            frame_count: 0,
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn redraw(&mut self) {
        self.session.poll_pose();

        if let Some(gpu) = &mut self.gpu {
            let (width, height) = gpu.size();
            let viewport = self.session.viewport().state();
            let key = (self.session.store().revision(), viewport, (width, height));

            let snapshot = self.session.store().snapshot();
            let frame =
                self.path_renderer
                    .render_frame(width as f32, height as f32, &viewport, &snapshot);

            if self.mesh_key != Some(key) {
                gpu.upload_mesh(&tessellate(&frame));
                self.mesh_key = Some(key);
            }

            // A failed frame is skipped; the next redraw tries again.
            if let Err(e) = gpu.render(&frame) {
                warn!(?e, "Frame render failed");
            }

            self.frame_count += 1;
            if self.frame_count % 300 == 0 {
                tracing::debug!(
                    frames = self.frame_count,
                    inertial_points = snapshot.inertial.len(),
                    pose_points = snapshot.pose_source.len(),
                    "Render heartbeat"
                );
            }
        }

        let title = self.session.title();
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }
    }

    fn save_viewport(&mut self) {
        self.config.viewport.initial_scale = self.session.viewport().state().scale;
        if let Err(e) = driftview_config::save_config(&self.config) {
            error!(?e, "Failed to save config");
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("driftview")
            .with_inner_size(PhysicalSize::new(1280, 800));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!(?e, "Failed to create window");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let size = window.inner_size();
        match pollster::block_on(GpuRenderer::new(window, size.width, size.height)) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                error!(?e, "Failed to initialize renderer");
                event_loop.exit();
                return;
            }
        }

        info!(
            width = size.width,
            height = size.height,
            scale = self.session.viewport().state().scale,
            "Application initialized"
        );
        self.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.save_viewport();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size.width, size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    match event.physical_key {
                        PhysicalKey::Code(KeyCode::KeyR) => {
                            self.session.reset_session();
                        }
                        PhysicalKey::Code(KeyCode::Escape) => {
                            self.save_viewport();
                            event_loop.exit();
                        }
                        _ => {}
                    }
                }
            }

            WindowEvent::MouseInput { button, state, .. } => {
                self.gestures.mouse_button(button, state);
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.gestures
                    .cursor_moved(self.session.viewport_mut(), position.x, position.y);
            }

            WindowEvent::CursorLeft { .. } => {
                self.gestures.cursor_left();
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.gestures.scroll(self.session.viewport_mut(), delta);
            }

            WindowEvent::PinchGesture { delta, .. } => {
                self.gestures.pinch(self.session.viewport_mut(), delta);
            }

            WindowEvent::RedrawRequested => {
                self.redraw();
                self.request_redraw();
            }

            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "driftview=info,driftview_motion=info,driftview_renderer=info".into()
            }),
        )
        .init();

    info!("driftview starting");

    let config = driftview_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    info!(
        address = %config.feed.address,
        scale = config.viewport.initial_scale,
        "Config loaded"
    );

    // Connect to the sensor feed (fall back to mock if the device is unreachable).
    let store = Arc::new(TrajectoryStore::new());
    let (feed, feed_error) = match FeedClient::connect(
        &config.feed.address,
        Duration::from_millis(config.feed.connect_timeout_ms),
        store.clone(),
    )
    .await
    {
        Ok(client) => (client, None),
        Err(e) => {
            warn!(?e, "Sensor feed not available, using mock (paths stay at origin)");
            (FeedClient::mock(), Some(e.to_string()))
        }
    };

    let session = Session::new(store, feed, feed_error, config.viewport.initial_scale);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, session);
    event_loop.run_app(&mut app)?;

    Ok(())
}
