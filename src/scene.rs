use crate::camera::{CameraController, OrbitControls, Viewport};
use crate::config::SceneConfig;
use crate::graphics::Framebuffer;
use crate::math::{barycentric, get_vec3};
use crate::spinner::SpinningBox;
use crate::state::{AppState, Lighting};
use crate::target_point::{AnimationMode, AnimationSettings, CameraStep, CameraTween, TargetPoint};
use crate::timers::TimerQueue;
use crate::vertex::ProjectedCube;
use crossterm::style::Color;
use glam::{DMat4, DVec2};
use std::time::Duration;

const HELPER_COLOR: Color = Color::Yellow;

/// Object under the cursor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pick {
    Spinner,
    Target(usize),
}

/// One spinning cube, the target points and the camera rig
pub struct Scene {
    pub spinner: SpinningBox,
    pub targets: Vec<TargetPoint>,
    pub camera: CameraController,
    pub orbit: OrbitControls,
    pub lighting: Lighting,
    pub animation: AnimationSettings,
    timers: TimerQueue<CameraStep>,
    /// Converge mode runs a single tween; a new click replaces it
    tween: Option<CameraTween>,
    /// Scene time; does not advance while paused
    clock: Duration,
    home: (CameraController, OrbitControls),
}

impl Scene {
    /// Builds the scene described by a validated config
    pub fn from_config(config: &SceneConfig) -> Self {
        let look_at = get_vec3(config.camera.look_at);
        let camera = CameraController::new(
            get_vec3(config.camera.position),
            look_at,
            config.camera.fov,
        );
        let orbit = OrbitControls::new(look_at);
        Scene {
            spinner: SpinningBox::new(
                config.spinner.position,
                config.spinner.color,
                config.spinner.spring.config(),
            ),
            targets: config.targets.iter().map(|t| t.to_target()).collect(),
            home: (camera.clone(), orbit.clone()),
            camera,
            orbit,
            lighting: Lighting::from(&config.lighting),
            animation: config.animation_settings(),
            timers: TimerQueue::new(),
            tween: None,
            clock: Duration::ZERO,
        }
    }

    /// Scene time since start
    pub fn now(&self) -> Duration {
        self.clock
    }

    /// Camera steps armed but not yet fired
    pub fn pending_steps(&self) -> usize {
        self.timers.len() + usize::from(self.tween.is_some())
    }

    /// Time until the next armed legacy step fires
    pub fn next_step_in(&self) -> Option<Duration> {
        self.timers
            .next_due()
            .map(|due| due.saturating_sub(self.clock))
    }

    /// Advances scene time by one rendered frame
    pub fn tick(&mut self, elapsed: Duration) {
        self.clock += elapsed;
        self.spinner.on_frame(elapsed.as_secs_f64());

        while let Some(step) = self.timers.pop_due(self.clock) {
            step.apply(&mut self.camera, &mut self.orbit, self.animation.preempt);
        }

        if let Some(tween) = self.tween {
            if tween.advance(&mut self.camera, &mut self.orbit, self.animation.preempt) {
                log::debug!(
                    "tween finished after {:?}",
                    self.clock.saturating_sub(tween.started_at)
                );
                self.tween = None;
            }
        }

        if self.orbit.has_pending_input() {
            self.orbit.update(&mut self.camera);
        }
    }

    /// Toggles the cube as if it was clicked
    pub fn click_spinner(&mut self) {
        self.spinner.on_click();
    }

    /// Starts the camera animation of target `index`. Returns the number of
    /// steps started; unknown targets start nothing.
    pub fn click_target(&mut self, index: usize) -> usize {
        let Some(target) = self.targets.get(index) else {
            return 0;
        };
        match self.animation.mode {
            AnimationMode::Legacy => target.on_click(&mut self.camera, &mut self.timers, self.clock),
            AnimationMode::Converge => {
                match target.start_tween(&mut self.camera, self.clock, self.animation.epsilon) {
                    Some(tween) => {
                        self.tween = Some(tween);
                        1
                    }
                    None => 0,
                }
            }
        }
    }

    /// Unit box centered on the target position
    fn target_model(target: &TargetPoint) -> DMat4 {
        DMat4::from_translation(target.position)
    }

    /// Every object whose projected cube covers the screen point, nearest
    /// first. Target points are hit even though they are never drawn.
    pub fn picks(&self, point: DVec2, viewport: &Viewport) -> Vec<Pick> {
        let spinner = (Pick::Spinner, self.spinner.model_matrix());
        let targets = self
            .targets
            .iter()
            .enumerate()
            .map(|(i, target)| (Pick::Target(i), Self::target_model(target)));

        let mut hits: Vec<(Pick, f64)> = std::iter::once(spinner)
            .chain(targets)
            .filter_map(|(pick, model)| {
                let cube = ProjectedCube::new(&model, &self.camera, viewport);
                cube.triangles()
                    .filter_map(|triangle| {
                        let [v0, v1, v2] = triangle.corners;
                        let [w0, w1, w2] = barycentric(
                            point,
                            v0.screen_position,
                            v1.screen_position,
                            v2.screen_position,
                        )?;
                        Some(v0.depth * w0 + v1.depth * w1 + v2.depth * w2)
                    })
                    .min_by(f64::total_cmp)
                    .map(|depth| (pick, depth))
            })
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.into_iter().map(|(pick, _)| pick).collect()
    }

    /// Delivers a click at a screen point to every object under it, nearest
    /// first. Returns what was hit.
    pub fn click_at(&mut self, point: DVec2, viewport: &Viewport) -> Vec<Pick> {
        let picks = self.picks(point, viewport);
        if !picks.is_empty() {
            log::debug!("click at {point:?} hit {picks:?}");
        }
        for &pick in &picks {
            match pick {
                Pick::Spinner => self.click_spinner(),
                Pick::Target(index) => {
                    self.click_target(index);
                }
            }
        }
        picks
    }

    /// Restores the starting camera and drops pending animation steps
    pub fn reset_camera(&mut self) {
        let (camera, orbit) = &self.home;
        self.camera = camera.clone();
        self.orbit = orbit.clone();
        self.timers = TimerQueue::new();
        self.tween = None;
    }

    /// Draws the cube and, when enabled, the target outlines
    pub fn render(&self, frame: &mut Framebuffer, viewport: &Viewport, state: &AppState) {
        let cube = ProjectedCube::new(&self.spinner.model_matrix(), &self.camera, viewport);
        if state.wireframe {
            for (from, to) in cube.edges() {
                frame.draw_line(from, to, '#', Color::White);
            }
        } else {
            for triangle in cube.triangles() {
                frame.draw_triangle(&triangle, &self.lighting, self.spinner.color);
            }
        }

        if state.show_helpers {
            for target in self.targets.iter().filter(|t| t.visible) {
                let helper = ProjectedCube::new(&Self::target_model(target), &self.camera, viewport);
                for (from, to) in helper.edges() {
                    frame.draw_line(from, to, '.', HELPER_COLOR);
                }
            }
        }
    }
}
