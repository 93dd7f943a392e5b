use crate::state::Lighting;
use crossterm::style::Color;
use glam::{DVec2, DVec3};
use serde::Deserialize;

/// A point as supplied by the caller: either a bare triple or a vector
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(from = "RawVec3")]
pub enum Vec3Input {
    Tuple([f64; 3]),
    Vector(DVec3),
}

/// Shapes accepted in scene files: `[x, y, z]` or `(x: .., y: .., z: ..)`
#[derive(Deserialize)]
#[serde(untagged)]
enum RawVec3 {
    Tuple([f64; 3]),
    Fields { x: f64, y: f64, z: f64 },
}

impl From<RawVec3> for Vec3Input {
    fn from(raw: RawVec3) -> Self {
        match raw {
            RawVec3::Tuple(t) => Vec3Input::Tuple(t),
            RawVec3::Fields { x, y, z } => Vec3Input::Vector(DVec3::new(x, y, z)),
        }
    }
}

impl From<[f64; 3]> for Vec3Input {
    fn from(t: [f64; 3]) -> Self {
        Vec3Input::Tuple(t)
    }
}

impl From<(f64, f64, f64)> for Vec3Input {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Vec3Input::Tuple([x, y, z])
    }
}

impl From<DVec3> for Vec3Input {
    fn from(v: DVec3) -> Self {
        Vec3Input::Vector(v)
    }
}

/// Inputs are equal when they coerce to the same vector
impl PartialEq for Vec3Input {
    fn eq(&self, other: &Self) -> bool {
        get_vec3(*self) == get_vec3(*other)
    }
}

impl From<Vec3Input> for DVec3 {
    fn from(input: Vec3Input) -> Self {
        get_vec3(input)
    }
}

/// Normalizes either representation into a vector with identical components
pub fn get_vec3(input: impl Into<Vec3Input>) -> DVec3 {
    match input.into() {
        Vec3Input::Tuple([x, y, z]) => DVec3::new(x, y, z),
        Vec3Input::Vector(v) => v,
    }
}

/// Edge function used in rasterization
pub fn edge_function(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Barycentric weights of `p` in triangle `a, b, c`, regardless of winding.
/// Returns `None` for degenerate triangles or points outside.
pub fn barycentric(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> Option<[f64; 3]> {
    let area = edge_function(a, b, c);
    if area.abs() < f64::EPSILON {
        return None;
    }
    let w0 = edge_function(b, c, p) / area;
    let w1 = edge_function(c, a, p) / area;
    let w2 = edge_function(a, b, p) / area;
    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
        Some([w0, w1, w2])
    } else {
        None
    }
}

/// Calculates the normal vector of a triangle
pub fn calculate_normal(a: DVec3, b: DVec3, c: DVec3) -> DVec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// Lambert intensity from the scene lights at a surface point.
/// Never drops below the ambient term and never exceeds 1.
pub fn calculate_light_intensity(normal: DVec3, position: DVec3, lighting: &Lighting) -> f64 {
    let to_point_light = (lighting.point_position - position).normalize_or_zero();
    let to_directional = lighting.directional_position.normalize_or_zero();

    let point = normal.dot(to_point_light).max(0.0) * lighting.point_intensity;
    let directional = normal.dot(to_directional).max(0.0) * lighting.directional_intensity;

    (lighting.ambient + point + directional).clamp(0.0, 1.0)
}

/// Applies lighting to a color
pub fn apply_lighting(color: [u8; 3], intensity: f64) -> Color {
    let [r, g, b] = color.map(|c| (c as f64 * intensity).min(255.0) as u8);
    Color::Rgb { r, g, b }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_and_vector_coerce_to_same_point() {
        let from_tuple = get_vec3([2.0, -1.5, 0.25]);
        let from_vector = get_vec3(DVec3::new(2.0, -1.5, 0.25));
        assert_eq!(from_tuple, from_vector);
        assert_eq!(get_vec3(from_vector), from_vector);
        assert_eq!(get_vec3((2.0, -1.5, 0.25)), from_vector);
    }

    #[test]
    fn scene_file_accepts_both_point_shapes() {
        let tuple: Vec3Input = ron::from_str("[1.0, 2.0, 3.0]").unwrap();
        let fields: Vec3Input = ron::from_str("(x: 1.0, y: 2.0, z: 3.0)").unwrap();
        assert_eq!(tuple, Vec3Input::Tuple([1.0, 2.0, 3.0]));
        assert_eq!(get_vec3(tuple), get_vec3(fields));
    }

    #[test]
    fn barycentric_hit_test_ignores_winding() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(4.0, 0.0);
        let c = DVec2::new(0.0, 4.0);
        let inside = DVec2::new(1.0, 1.0);
        let outside = DVec2::new(3.0, 3.0);
        let [w0, w1, w2] = barycentric(inside, a, b, c).unwrap();
        assert!((w0 + w1 + w2 - 1.0).abs() < 1e-12);
        assert_eq!(barycentric(inside, a, c, b).map(|[w0, _, _]| w0), Some(w0));
        assert!(barycentric(outside, a, b, c).is_none());
    }

    #[test]
    fn degenerate_triangle_has_no_weights() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(1.0, 1.0);
        let c = DVec2::new(2.0, 2.0);
        assert!(barycentric(DVec2::new(1.0, 1.0), a, b, c).is_none());
    }

    #[test]
    fn light_intensity_stays_within_ambient_and_one() {
        let lighting = Lighting::default();
        let facing = calculate_light_intensity(DVec3::Y, DVec3::ZERO, &lighting);
        let away = calculate_light_intensity(-DVec3::ONE.normalize(), DVec3::ZERO, &lighting);
        assert!(facing <= 1.0);
        assert_eq!(away, lighting.ambient);
        assert!(facing > away);
    }

    #[test]
    fn normal_of_xy_triangle_points_along_z() {
        let n = calculate_normal(DVec3::ZERO, DVec3::X, DVec3::Y);
        assert!((n - DVec3::Z).length() < 1e-12);
    }
}
