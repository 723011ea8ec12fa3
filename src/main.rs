use std::collections::HashSet;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Context;
use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use gridcaster::constants::{MOVE_SPEED, PLAYER_SIZE, TURN_SPEED};
use gridcaster::present::{ScaleLut, blit_nearest, build_scale_lut};
use gridcaster::{Camera, Framebuffer, GridMap, Layer, RenderConfig, Raycaster, Sprite, demo};

const DEFAULT_MAP_PATH: &str = "map.bin";

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    map: GridMap,
    map_path: PathBuf,
    sprites: Vec<Sprite>,
    camera: Camera,
    raycaster: Raycaster,

    // HUD
    frame_counter: u32,
    last_fps_print: Instant,

    // Internal fixed-size buffer
    fb: Framebuffer,
    scale_lut: ScaleLut,

    // Input and movement
    keys_down: HashSet<KeyCode>,
    last_tick: Instant,
}

impl App {
    fn new(map_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let map = match &map_path {
            Some(path) => GridMap::load(path)?,
            None => demo::demo_map(),
        };
        let raycaster = Raycaster::new(RenderConfig::default(), demo::demo_textures())?;
        let fb = Framebuffer::for_config(raycaster.config());

        Ok(Self {
            window: None,
            surface: None,
            map,
            map_path: map_path.unwrap_or_else(|| DEFAULT_MAP_PATH.into()),
            sprites: demo::demo_sprites(),
            camera: demo::demo_camera(),
            raycaster,

            frame_counter: 0,
            last_fps_print: Instant::now(),

            fb,
            scale_lut: ScaleLut::empty(),

            keys_down: HashSet::new(),
            last_tick: Instant::now(),
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("gridcaster")
            .with_inner_size(LogicalSize::new(
                self.fb.width() as f64,
                self.fb.height() as f64,
            ));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Rc::new(window),
            Err(e) => {
                error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        let surface = softbuffer::Context::new(window.clone())
            .and_then(|context| softbuffer::Surface::new(&context, window.clone()));
        let surface = match surface {
            Ok(surface) => surface,
            Err(e) => {
                error!("failed to create drawing surface: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.rebuild_lut(size.width as usize, size.height as usize);

        window.request_redraw();
        self.surface = Some(surface);
        self.window = Some(window);
        self.last_tick = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("close requested, stopping");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    if !repeat {
                        self.on_key_pressed(code);
                    }
                    self.keys_down.insert(code);
                }
                ElementState::Released => {
                    self.keys_down.remove(&code);
                }
            },

            WindowEvent::RedrawRequested => {
                self.tick();

                let (window, surface) = match (&self.window, &mut self.surface) {
                    (Some(w), Some(s)) if w.id() == id => (w, s),
                    _ => return,
                };

                let size = window.inner_size();
                let (Some(dw), Some(dh)) =
                    (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                else {
                    return; // Minimized window, skip drawing
                };
                if let Err(e) = surface.resize(dw, dh) {
                    error!("failed to resize surface: {e}");
                    return;
                }
                let dst_size = (dw.get() as usize, dh.get() as usize);
                if self.scale_lut.dst_size() != dst_size {
                    self.scale_lut =
                        build_scale_lut(dst_size.0, dst_size.1, self.fb.width(), self.fb.height());
                }

                self.raycaster
                    .render_into(&mut self.fb, &self.camera, &self.map, &mut self.sprites);

                match surface.buffer_mut() {
                    Ok(mut buf) => {
                        blit_nearest(&mut buf, self.fb.pixels(), self.fb.width(), &self.scale_lut, 0);
                        if let Err(e) = buf.present() {
                            error!("failed to present frame: {e}");
                        }
                    }
                    Err(e) => error!("failed to get surface buffer: {e}"),
                }

                // Print FPS
                self.frame_counter += 1;
                let elapsed = self.last_fps_print.elapsed().as_secs_f32();
                if elapsed >= 1.0 {
                    info!("FPS: {:.1}", self.frame_counter as f32 / elapsed);
                    self.frame_counter = 0;
                    self.last_fps_print = Instant::now();
                }

                window.request_redraw();
            }

            WindowEvent::Resized(new_size) => {
                self.rebuild_lut(new_size.width as usize, new_size.height as usize);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl App {
    fn on_key_pressed(&mut self, code: KeyCode) {
        match code {
            KeyCode::F5 => {
                if self.map.save(&self.map_path).is_ok() {
                    info!("map saved to {}", self.map_path.display());
                }
            }
            KeyCode::F9 => {
                // load_into keeps the current map on failure; the error is logged
                if self.map.load_into(&self.map_path).is_ok() {
                    info!("map loaded from {}", self.map_path.display());
                }
            }
            _ => (),
        }
    }

    fn tick(&mut self) {
        // Compute dt with cap to avoid huge jumps if the app was paused
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).min(Duration::from_millis(100));
        self.last_tick = now;
        let dt_s = dt.as_secs_f32();

        let held = |codes: &[KeyCode]| codes.iter().any(|c| self.keys_down.contains(c));

        let mut turn = 0.0;
        if held(&[KeyCode::ArrowLeft, KeyCode::KeyQ]) {
            turn -= 1.0;
        }
        if held(&[KeyCode::ArrowRight, KeyCode::KeyE]) {
            turn += 1.0;
        }

        let mut fwd: f32 = 0.0;
        let mut strafe: f32 = 0.0;
        if held(&[KeyCode::KeyW, KeyCode::ArrowUp]) {
            fwd += 1.0;
        }
        if held(&[KeyCode::KeyS, KeyCode::ArrowDown]) {
            fwd -= 1.0;
        }
        if held(&[KeyCode::KeyD]) {
            strafe += 1.0;
        }
        if held(&[KeyCode::KeyA]) {
            strafe -= 1.0;
        }

        self.camera.turn(turn * TURN_SPEED * dt_s);

        if fwd == 0.0 && strafe == 0.0 {
            return;
        }
        // Normalize diagonal speed
        let inv = 1.0 / (fwd * fwd + strafe * strafe).sqrt();
        let (s, c) = self.camera.angle.to_radians().sin_cos();
        let step = MOVE_SPEED * dt_s * inv;
        let dx = (c * fwd - s * strafe) * step;
        let dy = (s * fwd + c * strafe) * step;

        // Slide along walls by moving each axis separately
        let [x, y] = self.camera.pos;
        if self.is_free(x + dx, y) {
            self.camera.pos[0] = x + dx;
        }
        if self.is_free(self.camera.pos[0], y + dy) {
            self.camera.pos[1] = y + dy;
        }
    }

    fn is_free(&self, x: f32, y: f32) -> bool {
        let corners = [
            (x - PLAYER_SIZE, y - PLAYER_SIZE),
            (x + PLAYER_SIZE, y - PLAYER_SIZE),
            (x - PLAYER_SIZE, y + PLAYER_SIZE),
            (x + PLAYER_SIZE, y + PLAYER_SIZE),
        ];
        corners.iter().all(|&(cx, cy)| {
            self.map
                .cell(cx.floor() as i32, cy.floor() as i32, Layer::Walls)
                == 0
        })
    }

    fn rebuild_lut(&mut self, dst_w: usize, dst_h: usize) {
        self.scale_lut = build_scale_lut(dst_w, dst_h, self.fb.width(), self.fb.height());
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let map_path = std::env::args_os().nth(1).map(PathBuf::from);
    if map_path.is_none() {
        warn!("no map given, using the demo map (F5 saves to {DEFAULT_MAP_PATH})");
    }

    let mut app = App::new(map_path)?;
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run_app(&mut app).context("event loop failed")?;
    Ok(())
}
