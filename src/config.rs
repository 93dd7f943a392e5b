use crate::math::{get_vec3, Vec3Input};
use crate::spring::SpringPreset;
use crate::state::Lighting;
use crate::target_point::{
    AnimationMode, AnimationSettings, TargetPoint, DEFAULT_FRAME_RATE, DEFAULT_SPEED,
};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A console-based 3D scene with a spinning cube and clickable camera targets
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// RON scene file; the built-in scene is used when omitted
    #[arg(short, long)]
    pub scene: Option<PathBuf>,

    /// Render loop frames per second
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Camera animation mode, overriding the scene file
    #[arg(long, value_enum)]
    pub mode: Option<AnimationMode>,

    /// Let overlapping legacy camera animations interleave instead of the newest winning
    #[arg(long)]
    pub no_preempt: bool,

    /// Spring preset for the cube's scale, overriding the scene file
    #[arg(long, value_enum)]
    pub spring: Option<SpringPreset>,

    /// Start with the debug overlay shown
    #[arg(short, long)]
    pub debug: bool,

    /// Start in wireframe mode
    #[arg(short, long)]
    pub wireframe: bool,

    /// Hide the outlines around target points
    #[arg(long)]
    pub hide_helpers: bool,

    /// Height of a terminal cell relative to its width
    #[arg(long, default_value_t = 2.0)]
    pub cell_aspect: f64,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scene file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse scene file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("target {index}: speed {speed} must be in (0, 1]")]
    Speed { index: usize, speed: f64 },
    #[error("target {index}: frame rate must be positive")]
    FrameRate { index: usize },
    #[error("camera fov {0} must be between 0 and 180 degrees")]
    Fov(f64),
    #[error("animation epsilon {0} must be positive")]
    Epsilon(f64),
    #[error("render fps must be positive")]
    RenderFps,
    #[error("cell aspect {0} must be positive")]
    CellAspect(f64),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3Input,
    pub look_at: Vec3Input,
    pub fov: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            position: [0.0, 0.0, 5.0].into(),
            look_at: [0.0, 0.0, 0.0].into(),
            fov: 75.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpinnerConfig {
    pub position: Vec3Input,
    pub color: [u8; 3],
    pub spring: SpringPreset,
}

impl Default for SpinnerConfig {
    fn default() -> Self {
        SpinnerConfig {
            position: [0.0, 0.0, 0.0].into(),
            color: [255, 105, 180],
            spring: SpringPreset::Wobbly,
        }
    }
}

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

fn default_frame_rate() -> u32 {
    DEFAULT_FRAME_RATE
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TargetConfig {
    pub position: Vec3Input,
    pub look_at: Vec3Input,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub orbit: bool,
}

impl TargetConfig {
    fn new(position: [f64; 3], look_at: [f64; 3]) -> Self {
        TargetConfig {
            position: position.into(),
            look_at: look_at.into(),
            speed: DEFAULT_SPEED,
            frame_rate: DEFAULT_FRAME_RATE,
            visible: true,
            orbit: true,
        }
    }

    /// Builds the scene object for this entry
    pub fn to_target(&self) -> TargetPoint {
        TargetPoint {
            visible: self.visible,
            drives_orbit: self.orbit,
            ..TargetPoint::new(self.position, self.look_at)
                .with_speed(self.speed)
                .with_frame_rate(self.frame_rate)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub mode: AnimationMode,
    pub preempt: bool,
    pub epsilon: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        let settings = AnimationSettings::default();
        AnimationConfig {
            mode: settings.mode,
            preempt: settings.preempt,
            epsilon: settings.epsilon,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient: f64,
    pub point_position: Vec3Input,
    pub point_intensity: f64,
    pub directional_position: Vec3Input,
    pub directional_intensity: f64,
}

impl Default for LightingConfig {
    fn default() -> Self {
        let lighting = Lighting::default();
        LightingConfig {
            ambient: lighting.ambient,
            point_position: lighting.point_position.into(),
            point_intensity: lighting.point_intensity,
            directional_position: lighting.directional_position.into(),
            directional_intensity: lighting.directional_intensity,
        }
    }
}

impl From<&LightingConfig> for Lighting {
    fn from(config: &LightingConfig) -> Self {
        Lighting {
            ambient: config.ambient,
            point_position: get_vec3(config.point_position),
            point_intensity: config.point_intensity,
            directional_position: get_vec3(config.directional_position),
            directional_intensity: config.directional_intensity,
        }
    }
}

/// Everything placed in the scene
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub spinner: SpinnerConfig,
    pub targets: Vec<TargetConfig>,
    pub animation: AnimationConfig,
    pub lighting: LightingConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            camera: CameraConfig::default(),
            spinner: SpinnerConfig::default(),
            targets: vec![
                TargetConfig::new([2.0, 2.0, 2.0], [0.0, 0.0, 0.0]),
                TargetConfig {
                    speed: 0.05,
                    ..TargetConfig::new([1.0, 0.0, -1.0], [0.0, 1.0, 0.0])
                },
                TargetConfig::new([-1.0, -1.0, 2.0], [1.0, 0.0, 1.0]),
            ],
            animation: AnimationConfig::default(),
            lighting: LightingConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Parses a RON scene; missing fields take their defaults
    pub fn parse(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Reads and parses a scene file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Loads the scene named on the command line (or the built-in one),
    /// applies command line overrides and validates the result
    pub fn resolve(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.scene {
            Some(path) => {
                log::info!("loading scene from {}", path.display());
                Self::load(path)?
            }
            None => Self::default(),
        };
        if let Some(mode) = args.mode {
            config.animation.mode = mode;
        }
        if args.no_preempt {
            config.animation.preempt = false;
        }
        if let Some(spring) = args.spring {
            config.spinner.spring = spring;
        }
        if config.animation.mode == AnimationMode::Converge && !config.animation.preempt {
            log::warn!("preempt=false only affects legacy animations; converge mode runs one tween");
        }
        if args.fps == 0 {
            return Err(ConfigError::RenderFps);
        }
        if !(args.cell_aspect > 0.0) {
            return Err(ConfigError::CellAspect(args.cell_aspect));
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges the scene relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            return Err(ConfigError::Fov(self.camera.fov));
        }
        if !(self.animation.epsilon > 0.0) {
            return Err(ConfigError::Epsilon(self.animation.epsilon));
        }
        for (index, target) in self.targets.iter().enumerate() {
            if !(target.speed > 0.0 && target.speed <= 1.0) {
                return Err(ConfigError::Speed {
                    index,
                    speed: target.speed,
                });
            }
            if target.frame_rate == 0 {
                return Err(ConfigError::FrameRate { index });
            }
        }
        Ok(())
    }

    /// Camera animation settings for the scene
    pub fn animation_settings(&self) -> AnimationSettings {
        AnimationSettings {
            mode: self.animation.mode,
            preempt: self.animation.preempt,
            epsilon: self.animation.epsilon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("cube-targets").chain(extra.iter().copied()))
    }

    #[test]
    fn default_scene_matches_built_in_layout() {
        let config = SceneConfig::default();
        assert_eq!(config.targets.len(), 3);
        assert_eq!(config.targets[1].speed, 0.05);
        assert_eq!(get_vec3(config.targets[2].look_at), DVec3::new(1.0, 0.0, 1.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_partial_scene_file() {
        let config = SceneConfig::parse(
            r#"(
                camera: (position: (x: 0.0, y: 1.0, z: 6.0)),
                targets: [
                    (position: [2.0, 2.0, 2.0], look_at: [0.0, 0.0, 0.0]),
                    (position: [1.0, 0.0, -1.0], look_at: [0.0, 1.0, 0.0], speed: 0.05, orbit: false),
                ],
                animation: (mode: converge),
            )"#,
        )
        .unwrap();

        assert_eq!(get_vec3(config.camera.position), DVec3::new(0.0, 1.0, 6.0));
        assert_eq!(config.camera.fov, 75.0);
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[0].speed, DEFAULT_SPEED);
        assert!(!config.targets[1].orbit);
        assert_eq!(config.animation.mode, AnimationMode::Converge);
        assert!(config.animation.preempt);
    }

    #[test]
    fn bundled_scene_file_matches_default() {
        let config = SceneConfig::parse(include_str!("../scenes/default.ron")).unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn target_config_builds_target_point() {
        let config = TargetConfig {
            speed: 0.2,
            visible: false,
            ..TargetConfig::new([1.0, 2.0, 3.0], [0.0, 0.0, 0.0])
        };
        let target = config.to_target();
        assert_eq!(target.position, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(target.speed, 0.2);
        assert_eq!(target.frame_rate, 60);
        assert!(!target.visible);
        assert!(target.drives_orbit);
    }

    #[test]
    fn rejects_out_of_range_speed() {
        let mut config = SceneConfig::default();
        config.targets[0].speed = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Speed { index: 0, .. })
        ));
        config.targets[0].speed = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_frame_rate() {
        let mut config = SceneConfig::default();
        config.targets[2].frame_rate = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FrameRate { index: 2 })
        ));
    }

    #[test]
    fn command_line_overrides_scene() {
        let config =
            SceneConfig::resolve(&args(&["--mode", "converge", "--no-preempt", "--spring", "stiff"]))
                .unwrap();
        assert_eq!(config.animation.mode, AnimationMode::Converge);
        assert!(!config.animation.preempt);
        assert_eq!(config.spinner.spring, SpringPreset::Stiff);
    }

    #[test]
    fn missing_scene_file_is_an_io_error() {
        let err = SceneConfig::resolve(&args(&["--scene", "/nonexistent/scene.ron"])).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn zero_fps_is_rejected() {
        assert!(matches!(
            SceneConfig::resolve(&args(&["--fps", "0"])),
            Err(ConfigError::RenderFps)
        ));
    }
}
