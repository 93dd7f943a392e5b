use crate::camera::Viewport;
use crate::graphics::Framebuffer;
use crate::scene::Scene;
use crate::state::AppState;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::Color;
use glam::{DVec2, DVec3};
use std::io::{self, Write};
use std::time::{Duration, Instant};

const ZOOM_STEP: f64 = 0.9;

/// Terminal view of the scene
pub struct SceneWidget {
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
    /// Cell where the left button went down, cleared once the press turns into a drag
    press: Option<(u16, u16)>,
    /// Last mouse position while dragging
    last_mouse_pos: (u16, u16),
    viewport: Viewport,
    frame: Framebuffer,
}

impl SceneWidget {
    pub fn new(width: u16, height: u16, cell_aspect: f64) -> Self {
        SceneWidget {
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
            press: None,
            last_mouse_pos: (0, 0),
            viewport: Viewport::new(width, height, cell_aspect),
            frame: Framebuffer::new(width as usize, height as usize),
        }
    }

    /// Current terminal size and cell shape
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Handle terminal events
    pub fn event(&mut self, event: &Event, scene: &mut Scene, data: &mut AppState) {
        match event {
            Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
                self.key(key_event, scene, data)
            }
            Event::Mouse(mouse_event) if !data.paused => self.mouse(mouse_event, scene),
            Event::Resize(width, height) => {
                self.viewport.width = *width;
                self.viewport.height = *height;
                self.frame.resize(*width as usize, *height as usize);
                log::debug!("resized to {width}x{height}");
            }
            _ => {}
        }
    }

    /// Handle key presses
    fn key(&mut self, key_event: &KeyEvent, scene: &mut Scene, data: &mut AppState) {
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => data.running = false,
            KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                data.running = false
            }
            KeyCode::Char('d') | KeyCode::Char('D') => data.debug = !data.debug,
            KeyCode::Char('p') | KeyCode::Char('P') => {
                data.paused = !data.paused;
                // Reset any mouse events that were captured
                self.press = None;
            }
            _ if data.paused => {}
            KeyCode::Char('w') | KeyCode::Char('W') => data.wireframe = !data.wireframe,
            KeyCode::Char('h') | KeyCode::Char('H') => data.show_helpers = !data.show_helpers,
            KeyCode::Char('r') | KeyCode::Char('R') => scene.reset_camera(),
            KeyCode::Char(' ') => scene.click_spinner(),
            KeyCode::Char(digit @ '1'..='9') => {
                let index = digit as usize - '1' as usize;
                scene.click_target(index);
            }
            _ => {}
        }
    }

    /// Handle mouse clicks, drags and scrolling
    fn mouse(&mut self, mouse_event: &MouseEvent, scene: &mut Scene) {
        let pos = (mouse_event.column, mouse_event.row);
        match mouse_event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.press = Some(pos);
                self.last_mouse_pos = pos;
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.press.is_some_and(|start| start != pos) {
                    self.press = None;
                }
                let dx = pos.0 as f64 - self.last_mouse_pos.0 as f64;
                let dy = pos.1 as f64 - self.last_mouse_pos.1 as f64;
                // Cells are taller than wide
                scene.orbit.rotate(dx, dy * self.viewport.cell_aspect);
                self.last_mouse_pos = pos;
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.press.take().is_some() {
                    let point = DVec2::new(pos.0 as f64 + 0.5, pos.1 as f64 + 0.5);
                    scene.click_at(point, &self.viewport);
                }
            }
            MouseEventKind::ScrollUp => scene.orbit.dolly(ZOOM_STEP),
            MouseEventKind::ScrollDown => scene.orbit.dolly(1.0 / ZOOM_STEP),
            _ => {}
        }
    }

    /// Advances the scene unless paused
    pub fn update(&mut self, scene: &mut Scene, data: &AppState, elapsed: Duration) {
        if !data.paused {
            scene.tick(elapsed);
        }
    }

    /// Paint the scene and overlays
    pub fn paint(&mut self, scene: &Scene, data: &AppState, out: &mut impl Write) -> io::Result<()> {
        // Update FPS calculation
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let duration = now.duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }

        self.frame.clear();
        scene.render(&mut self.frame, &self.viewport, data);

        if data.debug {
            let rotation = scene.spinner.rotation();
            let lines = [
                format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
                format!("Angle X: {:.2}, Angle Y: {:.2}", rotation.x, rotation.y),
                format!(
                    "Box: active={} scale={:.2}",
                    scene.spinner.is_active(),
                    scene.spinner.scale()
                ),
                format!("Time: {:.2}s", scene.now().as_secs_f64()),
                format!("Camera: {}", fmt_vec(scene.camera.position())),
                format!("Facing: {}", fmt_vec(scene.camera.forward())),
                format!("Orbit target: {}", fmt_vec(scene.orbit.target)),
                format!(
                    "Pending steps: {} ({:?}), next in {:?}",
                    scene.pending_steps(),
                    scene.animation.mode,
                    scene.next_step_in().unwrap_or_default()
                ),
                format!("FPS: {:.2}", self.fps),
            ];
            for (row, line) in lines.iter().enumerate() {
                self.frame.draw_text(1, row, line, Color::White);
            }
        }

        // Display 'Paused' if the simulation is paused
        if data.paused {
            let text = "Paused";
            let x = self.frame.width().saturating_sub(text.len()) / 2;
            let y = self.frame.height() / 2;
            self.frame.draw_text(x, y, text, Color::White);
        }

        self.frame.present(out)
    }
}

/// Formats a vector for the debug overlay
fn fmt_vec(v: DVec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}
