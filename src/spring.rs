use serde::Deserialize;

/// Spring parameters. Larger tension pulls harder, larger friction settles faster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    pub tension: f64,
    pub friction: f64,
    pub mass: f64,
}

/// Named spring presets
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SpringPreset {
    #[default]
    Default,
    Gentle,
    Wobbly,
    Stiff,
    Slow,
    Molasses,
}

impl SpringPreset {
    /// Tension and friction of the preset
    pub fn config(self) -> SpringConfig {
        let (tension, friction) = match self {
            SpringPreset::Default => (170.0, 26.0),
            SpringPreset::Gentle => (120.0, 14.0),
            SpringPreset::Wobbly => (180.0, 12.0),
            SpringPreset::Stiff => (210.0, 20.0),
            SpringPreset::Slow => (280.0, 60.0),
            SpringPreset::Molasses => (280.0, 120.0),
        };
        SpringConfig {
            tension,
            friction,
            mass: 1.0,
        }
    }
}

/// Integration step; large frame times are split into steps of this size
const STEP_SECONDS: f64 = 0.001;
const REST_VELOCITY: f64 = 0.001;
const REST_DISPLACEMENT: f64 = 0.0005;

/// A scalar pulled toward its target by a damped spring
#[derive(Clone, Debug)]
pub struct Spring {
    value: f64,
    velocity: f64,
    target: f64,
    config: SpringConfig,
}

impl Spring {
    pub fn new(value: f64, config: SpringConfig) -> Self {
        Spring {
            value,
            velocity: 0.0,
            target: value,
            config,
        }
    }

    /// Current animated value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Retargets the spring, keeping its current value and velocity
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Settled on the target with no velocity left
    pub fn is_resting(&self) -> bool {
        self.velocity.abs() < REST_VELOCITY && (self.target - self.value).abs() < REST_DISPLACEMENT
    }

    /// Advances the spring by `elapsed` seconds
    pub fn advance(&mut self, elapsed: f64) {
        if self.is_resting() {
            self.value = self.target;
            self.velocity = 0.0;
            return;
        }

        let mut remaining = elapsed.max(0.0);
        while remaining > 0.0 {
            let dt = remaining.min(STEP_SECONDS);
            let spring_force = -self.config.tension * (self.value - self.target);
            let damping_force = -self.config.friction * self.velocity;
            let acceleration = (spring_force + damping_force) / self.config.mass;
            self.velocity += acceleration * dt;
            self.value += self.velocity * dt;
            remaining -= dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wobbly_preset_values() {
        let config = SpringPreset::Wobbly.config();
        assert_eq!(config.tension, 180.0);
        assert_eq!(config.friction, 12.0);
        assert_eq!(config.mass, 1.0);
    }

    #[test]
    fn spring_at_rest_stays_put() {
        let mut spring = Spring::new(1.0, SpringPreset::Wobbly.config());
        spring.advance(0.5);
        assert_eq!(spring.value(), 1.0);
        assert!(spring.is_resting());
    }

    #[test]
    fn wobbly_spring_overshoots_then_settles() {
        let mut spring = Spring::new(1.0, SpringPreset::Wobbly.config());
        spring.set_target(1.5);

        let mut peak: f64 = 1.0;
        for _ in 0..30 {
            spring.advance(1.0 / 60.0);
            peak = peak.max(spring.value());
        }
        assert!(peak > 1.5, "wobbly spring should overshoot, peak {peak}");

        for _ in 0..600 {
            spring.advance(1.0 / 60.0);
        }
        assert!((spring.value() - 1.5).abs() < 1e-3);
    }

    #[test]
    fn retargeting_mid_flight_keeps_value() {
        let mut spring = Spring::new(1.0, SpringPreset::Default.config());
        spring.set_target(1.5);
        spring.advance(0.05);
        let mid = spring.value();
        spring.set_target(1.0);
        assert_eq!(spring.value(), mid);
        spring.advance(2.0);
        assert!((spring.value() - 1.0).abs() < 1e-3);
    }
}
