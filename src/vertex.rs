use crate::camera::{CameraController, Viewport};
use crate::math::calculate_normal;
use glam::{DMat4, DVec2, DVec3};

/// Vertex structure with world position, screen position and depth
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: DVec3,
    pub screen_position: DVec2,
    pub depth: f64,
}

/// Unit cube centered on the origin
pub const CUBE_VERTICES: [[f64; 3]; 8] = [
    [-0.5, -0.5, -0.5], // 0
    [0.5, -0.5, -0.5],  // 1
    [0.5, 0.5, -0.5],   // 2
    [-0.5, 0.5, -0.5],  // 3
    [-0.5, -0.5, 0.5],  // 4
    [0.5, -0.5, 0.5],   // 5
    [0.5, 0.5, 0.5],    // 6
    [-0.5, 0.5, 0.5],   // 7
];

/// Each face is defined by 4 vertex indices
pub const CUBE_FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [5, 4, 7, 6],
    [4, 0, 3, 7],
    [1, 5, 6, 2],
    [4, 5, 1, 0],
    [3, 2, 6, 7],
];

/// Pairs of vertex indices
pub const CUBE_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0), // Back face
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4), // Front face
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7), // Connecting edges
];

/// A cube placed in the world and projected for one frame
pub struct ProjectedCube {
    /// `None` where the vertex lies behind the camera
    pub vertices: Vec<Option<Vertex>>,
    pub center: DVec3,
}

/// One screen triangle of a cube face with its outward normal
pub struct FaceTriangle<'a> {
    pub corners: [&'a Vertex; 3],
    pub normal: DVec3,
}

impl ProjectedCube {
    /// Transforms the unit cube by `model` and projects its corners
    pub fn new(model: &DMat4, camera: &CameraController, viewport: &Viewport) -> Self {
        let vertices = CUBE_VERTICES
            .iter()
            .map(|&corner| {
                let position = model.transform_point3(DVec3::from_array(corner));
                camera.project(position, viewport).map(|projected| Vertex {
                    position,
                    screen_position: projected.screen,
                    depth: projected.depth,
                })
            })
            .collect();
        ProjectedCube {
            vertices,
            center: model.transform_point3(DVec3::ZERO),
        }
    }

    /// Two triangles per face, skipping any with a vertex behind the camera
    pub fn triangles(&self) -> impl Iterator<Item = FaceTriangle<'_>> + '_ {
        CUBE_FACES
            .iter()
            .flat_map(|&[a, b, c, d]| [[a, b, c], [a, c, d]])
            .filter_map(move |[a, b, c]| {
                let corners = [
                    self.vertices[a].as_ref()?,
                    self.vertices[b].as_ref()?,
                    self.vertices[c].as_ref()?,
                ];
                let mut normal = calculate_normal(
                    corners[0].position,
                    corners[1].position,
                    corners[2].position,
                );
                if normal.dot(corners[0].position - self.center) < 0.0 {
                    normal = -normal;
                }
                Some(FaceTriangle { corners, normal })
            })
    }

    /// Screen segments for every edge with both ends in front of the camera
    pub fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        CUBE_EDGES.iter().filter_map(move |&(start, end)| {
            let a = self.vertices[start].as_ref()?;
            let b = self.vertices[end].as_ref()?;
            Some((a.screen_position, b.screen_position))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_cube_has_twelve_triangles_and_edges() {
        let camera = CameraController::default();
        let viewport = Viewport::new(80, 40, 2.0);
        let cube = ProjectedCube::new(&DMat4::IDENTITY, &camera, &viewport);
        assert_eq!(cube.triangles().count(), 12);
        assert_eq!(cube.edges().count(), 12);
    }

    #[test]
    fn face_normals_point_outward() {
        let camera = CameraController::default();
        let viewport = Viewport::new(80, 40, 2.0);
        let model = DMat4::from_translation(DVec3::new(0.3, -0.2, 0.1));
        let cube = ProjectedCube::new(&model, &camera, &viewport);
        for triangle in cube.triangles() {
            let outward = triangle.corners[0].position - cube.center;
            assert!(triangle.normal.dot(outward) > 0.0);
            assert!((triangle.normal.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn cube_around_camera_drops_hidden_triangles() {
        let camera = CameraController::default();
        let viewport = Viewport::new(80, 40, 2.0);
        let model = DMat4::from_translation(camera.position());
        let cube = ProjectedCube::new(&model, &camera, &viewport);
        assert!(cube.triangles().count() < 12);
    }
}
