use glam::DVec3;

/// View state toggled from the keyboard
#[derive(Clone, Debug, PartialEq)]
pub struct AppState {
    /// Enable debug overlay
    pub debug: bool,
    /// Scene time frozen
    pub paused: bool,
    /// Wireframe mode enabled
    pub wireframe: bool,
    /// Draw outlines around visible target points
    pub show_helpers: bool,
    /// Cleared when the user asks to quit
    pub running: bool,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            debug: false,
            paused: false,
            wireframe: false,
            show_helpers: true,
            running: true,
        }
    }
}

/// Scene lights: an ambient term, one point light and one directional light
#[derive(Clone, Debug, PartialEq)]
pub struct Lighting {
    pub ambient: f64,
    /// Point light position in world space
    pub point_position: DVec3,
    pub point_intensity: f64,
    /// Directional light shines from this position toward the origin
    pub directional_position: DVec3,
    pub directional_intensity: f64,
}

impl Default for Lighting {
    fn default() -> Self {
        Lighting {
            ambient: 0.25,
            point_position: DVec3::new(3.0, 3.0, 3.0),
            point_intensity: 0.6,
            directional_position: DVec3::new(-2.0, 3.0, 5.0),
            directional_intensity: 0.5,
        }
    }
}
