//! Overlay window
//!
//! winit event loop driving the app: keyboard -> actions, then each
//! iteration polls the log, redraws into the software framebuffer and
//! copies it to a softbuffer surface. Wakes every FRAME_DELAY_MS.

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use softbuffer::Surface;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{Window, WindowId};

#[cfg(target_os = "linux")]
use std::path::PathBuf;

#[cfg(target_os = "linux")]
use crate::config::ConfigWatcher;
use crate::app::{App, Keymap};
use crate::config::{Config, WindowConfig};
use crate::constants::FRAME_DELAY_MS;
use crate::render::{Canvas, FrameBuffer, JitterSource};
use crate::utils::Rgba;

type WindowSurface = Surface<Rc<Window>, Rc<Window>>;

/// Framebuffer plus the surface it is presented to
struct SurfaceCanvas<'a> {
    frame: &'a mut FrameBuffer,
    surface: &'a mut WindowSurface,
}

impl Canvas for SurfaceCanvas<'_> {
    fn set_draw_color(&mut self, color: Rgba) {
        self.frame.set_draw_color(color);
    }

    fn draw_point(&mut self, x: i32, y: i32) {
        self.frame.draw_point(x, y);
    }

    fn clear(&mut self, color: Rgba) {
        self.frame.clear(color);
    }

    fn present(&mut self) -> Result<()> {
        let mut buffer = self
            .surface
            .buffer_mut()
            .map_err(|e| anyhow!("Failed to get surface buffer: {}", e))?;
        let src = self.frame.pixels();
        let n = buffer.len().min(src.len());
        buffer[..n].copy_from_slice(&src[..n]);
        buffer
            .present()
            .map_err(|e| anyhow!("Failed to present buffer: {}", e))
    }
}

/// Window state around the app
pub struct Overlay<J> {
    app: App<J>,
    keymap: Keymap,
    window_config: WindowConfig,
    window: Option<Rc<Window>>,
    /// Kept alive for the surface
    _context: Option<softbuffer::Context<Rc<Window>>>,
    surface: Option<WindowSurface>,
    frame: FrameBuffer,
    modifiers: ModifiersState,
    #[cfg(target_os = "linux")]
    config_watcher: Option<(ConfigWatcher, PathBuf)>,
    /// Fatal error that stopped the loop
    error: Option<anyhow::Error>,
}

impl<J: JitterSource> Overlay<J> {
    pub fn new(app: App<J>, config: &Config) -> Self {
        let window_config = config.window.clone();
        let frame = FrameBuffer::new(window_config.width, window_config.height);

        #[cfg(target_os = "linux")]
        let config_watcher = Config::config_path().and_then(|path| {
            match ConfigWatcher::new(&path) {
                Ok(w) => {
                    info!("Watching config: {}", path.display());
                    Some((w, path))
                }
                Err(e) => {
                    warn!("Config watcher unavailable: {}", e);
                    None
                }
            }
        });

        Self {
            app,
            keymap: Keymap::from_config(&config.keybinds),
            window_config,
            window: None,
            _context: None,
            surface: None,
            frame,
            modifiers: ModifiersState::empty(),
            #[cfg(target_os = "linux")]
            config_watcher,
            error: None,
        }
    }

    /// Run until the window closes or Escape is pressed
    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let cfg = &self.window_config;
        let attributes = Window::default_attributes()
            .with_title(cfg.title.clone())
            .with_inner_size(PhysicalSize::new(cfg.width, cfg.height))
            .with_position(PhysicalPosition::new(cfg.x, cfg.y))
            .with_decorations(!cfg.borderless);

        let window = Rc::new(event_loop.create_window(attributes)?);
        let context = softbuffer::Context::new(Rc::clone(&window))
            .map_err(|e| anyhow!("Failed to create softbuffer context: {}", e))?;
        let surface = Surface::new(&context, Rc::clone(&window))
            .map_err(|e| anyhow!("Failed to create surface: {}", e))?;
        let size = window.inner_size();

        self.window = Some(window);
        self._context = Some(context);
        self.surface = Some(surface);
        self.resize(size)?;
        info!("Window created: {}x{}", size.width, size.height);
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            // Minimized
            return Ok(());
        };
        if let Some(surface) = self.surface.as_mut() {
            surface
                .resize(w, h)
                .map_err(|e| anyhow!("Failed to resize surface: {}", e))?;
        }
        self.frame.resize(size.width, size.height);
        self.app.resize(size.width as i32, size.height as i32);
        debug!("Resized to {}x{}", size.width, size.height);
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        if self.frame.width() == 0 || self.frame.height() == 0 {
            return Ok(());
        }
        let mut canvas = SurfaceCanvas {
            frame: &mut self.frame,
            surface,
        };
        self.app.render(&mut canvas)
    }

    fn handle_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        if event.state != ElementState::Pressed {
            return;
        }
        let Some(name) = key_name(&event.logical_key) else {
            return;
        };
        let m = self.modifiers;
        let Some(action) =
            self.keymap
                .action_for(m.control_key(), m.shift_key(), m.alt_key(), &name)
        else {
            return;
        };

        debug!("Key {:?} -> {:?}", name, action);
        if !self.app.apply(action) {
            info!("Quit requested");
            event_loop.exit();
        }
    }

    #[cfg(target_os = "linux")]
    fn check_config_reload(&mut self) {
        let Some((watcher, path)) = &self.config_watcher else {
            return;
        };
        if !watcher.check_reload() {
            return;
        }
        match Config::load_from_file(path) {
            Ok(config) => {
                self.keymap = Keymap::from_config(&config.keybinds);
                self.app.reload(&config);
            }
            Err(e) => warn!("Config reload failed: {:#}", e),
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn check_config_reload(&mut self) {}

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!("{:#}", e);
        self.error = Some(e);
        event_loop.exit();
    }
}

impl<J: JitterSource> ApplicationHandler for Overlay<J> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window closed");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Err(e) = self.resize(size) {
                    self.fail(event_loop, e);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(&event, event_loop);
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.check_config_reload();
        self.app.tick();

        if let Some(window) = &self.window {
            window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(
            Instant::now() + Duration::from_millis(FRAME_DELAY_MS),
        ));
    }
}

/// Normalized key name matched against keybind strings
fn key_name(key: &Key) -> Option<String> {
    match key {
        Key::Named(named) => named_key_name(*named).map(str::to_string),
        Key::Character(c) => Some(c.to_lowercase()),
        _ => None,
    }
}

fn named_key_name(key: NamedKey) -> Option<&'static str> {
    let name = match key {
        NamedKey::Escape => "escape",
        NamedKey::Enter => "enter",
        NamedKey::Tab => "tab",
        NamedKey::Space => "space",
        NamedKey::Backspace => "backspace",
        NamedKey::Home => "home",
        NamedKey::End => "end",
        NamedKey::PageUp => "pageup",
        NamedKey::PageDown => "pagedown",
        NamedKey::ArrowUp => "up",
        NamedKey::ArrowDown => "down",
        NamedKey::ArrowLeft => "left",
        NamedKey::ArrowRight => "right",
        NamedKey::F1 => "f1",
        NamedKey::F2 => "f2",
        NamedKey::F3 => "f3",
        NamedKey::F4 => "f4",
        NamedKey::F5 => "f5",
        NamedKey::F6 => "f6",
        NamedKey::F7 => "f7",
        NamedKey::F8 => "f8",
        NamedKey::F9 => "f9",
        NamedKey::F10 => "f10",
        NamedKey::F11 => "f11",
        NamedKey::F12 => "f12",
        _ => return None,
    };
    Some(name)
}
