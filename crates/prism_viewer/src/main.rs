use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use prism_math::Camera;
use prism_raster::{RasterScene, Rasterizer, RenderMode, RenderOptions};
use prism_viewer::camera_control::CameraMovement;
use prism_viewer::cli::RasterArgs;
use prism_viewer::config::ViewerConfig;
use prism_viewer::input::InputState;
use prism_viewer::{init_logging, save_frame, FrameTimer, SCREENSHOT_FILE};
use prism_viewport::Renderer;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

const HELP: &str = "
Rasterizer controls

  I        this help page
  V        toggle orbit / free camera

  Arrows   move
  WASD     move
  Space    up
  LShift   down

  RMB      pivot camera
  LMB      walk forward/backward
  R+L MB   climb up/down
  + -      adjust field of view
  Wheel    adjust focal length

  R        toggle software / hardware
  C        cycle cull mode
  F        cycle sampler (hardware)
  T        toggle transparency (hardware)
  L        toggle specular
  N        toggle normal map
  M        toggle depth view
  X        screenshot
";

/// Application state
struct App {
    config: ViewerConfig,
    scene: RasterScene,
    camera: Camera,
    movement: CameraMovement,
    options: RenderOptions,
    rasterizer: Rasterizer,

    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,

    input: InputState,
    last_frame_time: Instant,
    frame_timer: FrameTimer,
    take_screenshot: bool,
}

impl App {
    fn new(config: ViewerConfig, scene: RasterScene, camera: Camera) -> Self {
        Self {
            rasterizer: Rasterizer::new(config.width, config.height),
            options: config.render,
            config,
            scene,
            camera,
            movement: CameraMovement::rasterizer(),
            window: None,
            renderer: None,
            input: InputState::new(),
            last_frame_time: Instant::now(),
            frame_timer: FrameTimer::default(),
            take_screenshot: false,
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let options = &mut self.options;
        match key {
            KeyCode::KeyR => {
                options.mode = options.mode.toggle();
                log::info!("> Render mode: {:?}", options.mode);
            }
            KeyCode::KeyC => {
                options.cull = options.cull.cycle();
                log::info!("> Cull mode: {:?}", options.cull);
            }
            KeyCode::KeyF => {
                options.sampler = options.sampler.cycle();
                log::info!("> Sampler: {:?}", options.sampler);
            }
            KeyCode::KeyT => {
                options.transparency = !options.transparency;
                log::info!("> Transparency: {}", options.transparency);
            }
            KeyCode::KeyN => {
                options.normal_map = !options.normal_map;
                log::info!("> Normal map: {}", options.normal_map);
            }
            KeyCode::KeyL => {
                options.specular = !options.specular;
                log::info!("> Specular: {}", options.specular);
            }
            KeyCode::KeyM => {
                options.depth_view = !options.depth_view;
                log::info!("> Depth view: {}", options.depth_view);
            }
            KeyCode::KeyV => {
                self.movement.toggle_orbit();
                log::info!("> Orbit camera: {}", self.movement.orbit);
            }
            KeyCode::KeyX => {
                self.take_screenshot = true;
                log::info!("> Screenshot");
            }
            KeyCode::KeyI => println!("{HELP}"),
            _ => {}
        }
    }

    /// Move the camera, draw with the active path, then save a screenshot if one is pending.
    fn redraw(&mut self) -> Result<()> {
        let now = Instant::now();
        let delta_time = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        if let Some(fps) = self.frame_timer.tick(delta_time) {
            log::info!("FPS: {:.1}", fps);
        }

        let input = self.input.take_movement();
        self.movement.update(&mut self.camera, delta_time, &input);

        let Some(renderer) = &mut self.renderer else {
            return Ok(());
        };
        match self.options.mode {
            RenderMode::Software => {
                let image = self.rasterizer.render(&self.camera, &self.scene, &self.options);
                renderer.present_frame(image)?;
            }
            RenderMode::Hardware => renderer.render_scene(&self.camera, &self.options)?,
        }

        if self.take_screenshot {
            self.take_screenshot = false;
            // The software path draws the saved frame in either mode.
            let image = self.rasterizer.render(&self.camera, &self.scene, &self.options);
            if let Err(e) = save_frame(image, Path::new(SCREENSHOT_FILE)) {
                log::error!("Screenshot not saved: {:#}", e);
            }
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("PRISM Rasterizer")
            .with_inner_size(winit::dpi::PhysicalSize::new(self.config.width, self.config.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let mut renderer = match pollster::block_on(Renderer::new(window.clone())) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("Failed to initialize renderer: {:#}", e);
                event_loop.exit();
                return;
            }
        };
        renderer.upload_scene(&self.scene);

        self.window = Some(window);
        self.renderer = Some(renderer);

        log::info!("Window and renderer initialized, press I for help");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.input.handle_mouse(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                let (width, height) = (physical_size.width, physical_size.height);
                if width == 0 || height == 0 {
                    return;
                }
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize((width, height));
                }
                self.rasterizer.resize(width, height);
                self.camera.set_aspect_ratio_from_size(width, height);
                log::info!("Resized to {}x{}", width, height);
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(keycode),
                    state,
                    repeat,
                    ..
                },
                ..
            } => match state {
                ElementState::Pressed => {
                    self.input.key_down(keycode);
                    if !repeat {
                        self.handle_key(keycode);
                    }
                }
                ElementState::Released => self.input.key_up(keycode),
            },
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    log::error!("Render error: {:#}", e);
                    event_loop.exit();
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.input.is_active() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}

fn main() -> Result<()> {
    init_logging();

    let args = RasterArgs::parse();
    let config = args.load_config()?;

    log::info!("Starting PRISM rasterizer");

    let (scene, default_camera) = if args.primitives {
        (RasterScene::primitives(), RasterScene::PRIMITIVES_CAMERA)
    } else {
        (RasterScene::load_vehicle(&config.assets)?, RasterScene::VEHICLE_CAMERA)
    };
    let camera = config.camera_or(default_camera);

    if let Some(path) = &args.common.headless {
        let mut rasterizer = Rasterizer::new(config.width, config.height);
        rasterizer.render(&camera, &scene, &config.render);
        log::info!("Rendered {:?}", rasterizer.stats());
        return save_frame(rasterizer.image(), path);
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, scene, camera);

    log::info!("Running event loop");
    event_loop.run_app(&mut app)?;

    Ok(())
}
