use crate::camera::{AnimationId, CameraController, OrbitControls};
use crate::math::{get_vec3, Vec3Input};
use crate::timers::TimerQueue;
use glam::DVec3;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_SPEED: f64 = 0.1;
pub const DEFAULT_FRAME_RATE: u32 = 60;
/// Most legacy steps a single click may arm
pub const MAX_STEPS: usize = 10_000;

/// How a click moves the camera
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnimationMode {
    /// Fixed batch of frame-spaced timers armed at click time
    #[default]
    Legacy,
    /// One per-frame tween that stops within `epsilon` of the target
    Converge,
}

/// Scene-wide animation behavior
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSettings {
    pub mode: AnimationMode,
    /// Drop steps from animations started before the latest click
    pub preempt: bool,
    /// Stopping distance for converge mode
    pub epsilon: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        AnimationSettings {
            mode: AnimationMode::Legacy,
            preempt: true,
            epsilon: 0.001,
        }
    }
}

/// Number of legacy steps armed for a click
pub fn step_count(distance: f64, speed: f64) -> usize {
    (distance / speed).floor() as usize
}

/// Offset from click time at which step `index` fires
pub fn step_delay(index: usize, frame_rate: u32) -> Duration {
    Duration::from_secs_f64(index as f64 / frame_rate as f64)
}

/// One deferred camera update
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraStep {
    pub animation: AnimationId,
    pub position: DVec3,
    pub look_at: DVec3,
    pub speed: f64,
    pub drives_orbit: bool,
}

impl CameraStep {
    /// Moves the camera `speed` of the way from wherever it is now toward the
    /// target, then points it (and the orbit pivot) at the look-at point.
    /// Returns false if the step was dropped because a newer animation started.
    pub fn apply(
        &self,
        camera: &mut CameraController,
        orbit: &mut OrbitControls,
        preempt: bool,
    ) -> bool {
        if preempt && !camera.is_current(self.animation) {
            log::trace!("dropping step of superseded animation {:?}", self.animation);
            return false;
        }
        let position = camera.position().lerp(self.position, self.speed);
        camera.set_position(position);
        camera.look_at(self.look_at);
        if self.drives_orbit {
            orbit.target = self.look_at;
            orbit.update(camera);
        }
        true
    }
}

/// A converge-mode animation advanced once per rendered frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTween {
    pub step: CameraStep,
    pub started_at: Duration,
    pub epsilon: f64,
}

impl CameraTween {
    /// Applies one step. Returns true once the tween is finished, either
    /// because it arrived (the camera snaps onto the target) or because a
    /// newer animation took over.
    pub fn advance(
        &self,
        camera: &mut CameraController,
        orbit: &mut OrbitControls,
        preempt: bool,
    ) -> bool {
        if !self.step.apply(camera, orbit, preempt) {
            return true;
        }
        if camera.position().distance(self.step.position) >= self.epsilon {
            return false;
        }
        camera.set_position(self.step.position);
        camera.look_at(self.step.look_at);
        true
    }
}

/// An invisible clickable box that stores a camera viewpoint.
///
/// In [`AnimationMode::Legacy`] a click arms `floor(distance / speed)`
/// one-shot timers spaced one frame apart. Each fired step closes `speed` of
/// the remaining distance, so the camera ends short of the target by
/// `(1 - speed)^steps * distance`. [`AnimationMode::Converge`] instead runs a
/// single tween that steps once per rendered frame until within `epsilon`.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetPoint {
    /// Where the camera flies to; also the box center
    pub position: DVec3,
    pub look_at: DVec3,
    /// Fraction of the remaining distance closed per step, in (0, 1]
    pub speed: f64,
    /// Steps per second
    pub frame_rate: u32,
    /// Draw the outline helper
    pub visible: bool,
    /// Move the orbit pivot along with the camera
    pub drives_orbit: bool,
}

impl TargetPoint {
    pub fn new(position: impl Into<Vec3Input>, look_at: impl Into<Vec3Input>) -> Self {
        TargetPoint {
            position: get_vec3(position),
            look_at: get_vec3(look_at),
            speed: DEFAULT_SPEED,
            frame_rate: DEFAULT_FRAME_RATE,
            visible: true,
            drives_orbit: true,
        }
    }

    /// Fraction of the remaining distance closed per step
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Steps per second
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Legacy step budget for a camera currently at `from`, at most `MAX_STEPS`
    pub fn plan(&self, from: DVec3) -> usize {
        let steps = step_count(from.distance(self.position), self.speed);
        if steps > MAX_STEPS {
            log::warn!(
                "speed {} needs {steps} steps to {:?}, arming {MAX_STEPS}",
                self.speed,
                self.position
            );
        }
        steps.min(MAX_STEPS)
    }

    /// The deferred update every step of one animation shares
    fn step(&self, animation: AnimationId) -> CameraStep {
        CameraStep {
            animation,
            position: self.position,
            look_at: self.look_at,
            speed: self.speed,
            drives_orbit: self.drives_orbit,
        }
    }

    /// Arms every legacy step for a click at scene time `now`.
    /// Returns the number of steps armed; zero leaves the camera untouched.
    pub fn on_click(
        &self,
        camera: &mut CameraController,
        timers: &mut TimerQueue<CameraStep>,
        now: Duration,
    ) -> usize {
        let steps = self.plan(camera.position());
        if steps == 0 {
            log::debug!(
                "target {:?} closer than one step ({}), ignoring click",
                self.position,
                self.speed
            );
            return 0;
        }

        let step = self.step(camera.begin_animation());
        for i in 0..steps {
            timers.schedule(now + step_delay(i, self.frame_rate), step);
        }
        log::info!(
            "camera -> {:?} looking at {:?}: {steps} steps over {:?}",
            self.position,
            self.look_at,
            step_delay(steps - 1, self.frame_rate)
        );
        steps
    }

    /// Starts a converge-mode tween, or `None` if the camera is already there
    pub fn start_tween(
        &self,
        camera: &mut CameraController,
        now: Duration,
        epsilon: f64,
    ) -> Option<CameraTween> {
        if camera.position().distance(self.position) < epsilon {
            return None;
        }
        log::info!(
            "camera tween -> {:?} looking at {:?}",
            self.position,
            self.look_at
        );
        Some(CameraTween {
            step: self.step(camera.begin_animation()),
            started_at: now,
            epsilon,
        })
    }
}
