//! Interactive viewer for the CPU ray tracer.

use std::f32::consts::FRAC_PI_4;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Parser;
use prism_math::Camera;
use prism_tracer::scenes::{demo_scenes, DEMO_CAMERA};
use prism_tracer::{TraceScene, TraceSettings, Tracer};
use prism_viewer::camera_control::CameraMovement;
use prism_viewer::cli::TraceArgs;
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
Ray tracer controls

  I        this help page

  Arrows   move
  WASD     move
  Space    up
  LShift   down

  RMB      rotate camera
  LMB      walk forward/backward
  R+L MB   climb up/down
  + -      adjust field of view
  Wheel    adjust focal length

  P        toggle hard shadows
  K        toggle Cook-Torrance / Lambert-Phong
  L        toggle whole-frame tone mapping
  O        next scene
  X        screenshot
";

/// Meshes spin about the Y axis at this rate, in radians per second.
const SPIN_SPEED: f32 = FRAC_PI_4;

struct App {
    config: ViewerConfig,
    scenes: Vec<TraceScene>,
    scene_index: usize,
    camera: Camera,
    movement: CameraMovement,
    settings: TraceSettings,
    tracer: Tracer,

    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,

    input: InputState,
    last_frame_time: Instant,
    frame_timer: FrameTimer,
    take_screenshot: bool,
}

impl App {
    fn new(config: ViewerConfig, scenes: Vec<TraceScene>, scene_index: usize, camera: Camera) -> Self {
        Self {
            tracer: Tracer::new(config.width, config.height),
            settings: config.trace,
            config,
            scenes,
            scene_index,
            camera,
            movement: CameraMovement::tracer(),
            window: None,
            renderer: None,
            input: InputState::new(),
            last_frame_time: Instant::now(),
            frame_timer: FrameTimer::default(),
            take_screenshot: false,
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let settings = &mut self.settings;
        match key {
            KeyCode::KeyP => {
                settings.hard_shadows = !settings.hard_shadows;
                log::info!("> Hard shadows: {}", settings.hard_shadows);
            }
            KeyCode::KeyK => {
                settings.pbr = !settings.pbr;
                log::info!("> Cook-Torrance: {}", settings.pbr);
            }
            KeyCode::KeyL => {
                settings.tone_mapping = settings.tone_mapping.toggle();
                log::info!("> Tone mapping: {:?}", settings.tone_mapping);
            }
            KeyCode::KeyO => {
                self.scene_index = (self.scene_index + 1) % self.scenes.len();
                log::info!("> Scene {}", self.scene_index);
            }
            KeyCode::KeyX => {
                self.take_screenshot = true;
                log::info!("> Screenshot");
            }
            KeyCode::KeyI => println!("{HELP}"),
            _ => {}
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let now = Instant::now();
        let delta_time = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        if let Some(fps) = self.frame_timer.tick(delta_time) {
            log::info!("FPS: {:.1}", fps);
        }

        let input = self.input.take_movement();
        self.movement.update(&mut self.camera, delta_time, &input);

        let scene = &mut self.scenes[self.scene_index];
        scene.spin_meshes(SPIN_SPEED * delta_time);

        let image = self.tracer.render(&self.camera, scene, &self.settings);
        if let Some(renderer) = &mut self.renderer {
            renderer.present_frame(image)?;
        }

        if self.take_screenshot {
            self.take_screenshot = false;
            if let Err(e) = save_frame(self.tracer.image(), Path::new(SCREENSHOT_FILE)) {
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
            .with_title("PRISM Ray Tracer")
            .with_inner_size(winit::dpi::PhysicalSize::new(self.config.width, self.config.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(Renderer::new(window.clone())) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => {
                log::error!("Failed to initialize renderer: {:#}", e);
                event_loop.exit();
                return;
            }
        }
        self.window = Some(window);

        log::info!("Window initialized, press I for help");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.input.handle_mouse(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(physical_size) => {
                let (width, height) = (physical_size.width, physical_size.height);
                if width == 0 || height == 0 {
                    return;
                }
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize((width, height));
                }
                self.tracer.resize(width, height);
                self.camera.set_aspect_ratio_from_size(width, height);
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
                // Meshes keep spinning, so always ask for the next frame.
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    init_logging();

    let args = TraceArgs::parse();
    let config = args.load_config()?;

    let scenes = demo_scenes(&config.assets);
    if config.scene >= scenes.len() {
        bail!("Scene {} does not exist, pick 0 to {}", config.scene, scenes.len() - 1);
    }
    let scene_index = config.scene;
    let camera = config.camera_or(DEMO_CAMERA);

    log::info!("Starting PRISM ray tracer on scene {}", scene_index);

    if let Some(path) = &args.common.headless {
        let mut tracer = Tracer::new(config.width, config.height);
        tracer.render(&camera, &scenes[scene_index], &config.trace);
        return save_frame(tracer.image(), path);
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, scenes, scene_index, camera);
    event_loop.run_app(&mut app)?;

    Ok(())
}
