//! Camera - data-centering controller and orbit projection
//!
//! Whenever a new point set arrives the controller places the camera above
//! the XY centroid of the data, looking straight down the Z axis. User
//! interaction then orbits around that target.

use std::sync::Arc;

use crate::normalize::NormalizedPoint;

/// Height of the camera above the Z = 0 plane after recentering
pub const DEFAULT_CAMERA_DISTANCE: f64 = 2.0;

const NEAR: f64 = 0.01;
const MAX_PITCH: f64 = 1.5;

/// Where the camera sits and what it looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: [f64; 3],
    pub look_at: [f64; 3],
}

/// Pose centered on the XY bounding box of `points` (Z ignored)
pub fn center_pose(points: &[NormalizedPoint], distance: f64) -> Option<CameraPose> {
    if points.is_empty() {
        return None;
    }

    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for p in points {
        for i in 0..2 {
            min[i] = min[i].min(p.position[i]);
            max[i] = max[i].max(p.position[i]);
        }
    }

    let cx = (min[0] + max[0]) / 2.0;
    let cy = (min[1] + max[1]) / 2.0;
    Some(CameraPose {
        position: [cx, cy, distance],
        look_at: [cx, cy, 0.0],
    })
}

/// A point after projection: view-plane coordinates and distance along the view axis
///
/// `xy[1]` is visible in [-1, 1]; `xy[0]` in [-aspect, aspect].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub xy: [f64; 2],
    pub depth: f64,
}

/// Perspective camera orbiting a target point
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: [f64; 3],
    pub distance: f64,
    /// Rotation around the world Y axis
    pub yaw: f64,
    /// Elevation above the XZ plane
    pub pitch: f64,
    pub fov_y_degrees: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: [0.5, 0.5, 0.0],
            distance: DEFAULT_CAMERA_DISTANCE,
            yaw: 0.0,
            pitch: 0.0,
            fov_y_degrees: 75.0,
        }
    }
}

impl OrbitCamera {
    pub fn new(fov_y_degrees: f64) -> Self {
        Self {
            fov_y_degrees,
            ..Default::default()
        }
    }

    pub fn position(&self) -> [f64; 3] {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        add(self.target, scale([sy * cp, sp, cy * cp], self.distance))
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position(),
            look_at: self.target,
        }
    }

    /// Place the camera at `pose.position` looking at `pose.look_at`
    pub fn set_pose(&mut self, pose: CameraPose) {
        let dir = sub(pose.position, pose.look_at);
        let distance = length(dir);
        self.target = pose.look_at;
        if distance <= f64::EPSILON {
            return;
        }
        self.distance = distance;
        self.pitch = (dir[1] / distance).clamp(-1.0, 1.0).asin().clamp(-MAX_PITCH, MAX_PITCH);
        self.yaw = dir[0].atan2(dir[2]);
    }

    pub fn rotate(&mut self, d_yaw: f64, d_pitch: f64) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Move the target in the view plane; offsets are in view-plane units
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let (right, up, _) = self.basis();
        let k = self.distance;
        self.target = add(self.target, add(scale(right, dx * k), scale(up, dy * k)));
    }

    pub fn zoom(&mut self, factor: f64) {
        self.distance = (self.distance * factor).clamp(0.05, 50.0);
    }

    /// Project a world point; `None` when it is behind the near plane
    pub fn project(&self, p: [f64; 3]) -> Option<Projected> {
        let (right, up, forward) = self.basis();
        let rel = sub(p, self.position());
        let depth = dot(rel, forward);
        if depth <= NEAR {
            return None;
        }
        let s = 1.0 / (self.fov_y_degrees.to_radians() / 2.0).tan();
        Some(Projected {
            xy: [dot(rel, right) * s / depth, dot(rel, up) * s / depth],
            depth,
        })
    }

    fn basis(&self) -> ([f64; 3], [f64; 3], [f64; 3]) {
        let forward = normalize(sub(self.target, self.position()));
        let right = normalize(cross(forward, [0.0, 1.0, 0.0]));
        let up = cross(right, forward);
        (right, up, forward)
    }
}

/// Recenters the camera each time the point set is replaced
#[derive(Debug)]
pub struct CameraController {
    seen: Option<Arc<[NormalizedPoint]>>,
    distance: f64,
}

impl CameraController {
    pub fn new(distance: f64) -> Self {
        Self {
            seen: None,
            distance,
        }
    }

    /// Recenter if `points` is a different set than last time.
    ///
    /// Returns true when the camera was moved.
    pub fn sync(&mut self, points: &Arc<[NormalizedPoint]>, camera: &mut OrbitCamera) -> bool {
        if let Some(seen) = &self.seen {
            if Arc::ptr_eq(seen, points) {
                return false;
            }
        }
        self.seen = Some(Arc::clone(points));
        self.recenter(points, camera)
    }

    /// Unconditionally recenter on `points`; no-op when empty
    pub fn recenter(&self, points: &[NormalizedPoint], camera: &mut OrbitCamera) -> bool {
        match center_pose(points, self.distance) {
            Some(pose) => {
                tracing::debug!(?pose, "Camera recentered");
                camera.set_pose(pose);
                true
            }
            None => false,
        }
    }
}

fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: [f64; 3], k: f64) -> [f64; 3] {
    [a[0] * k, a[1] * k, a[2] * k]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn length(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

fn normalize(a: [f64; 3]) -> [f64; 3] {
    let len = length(a);
    if len == 0.0 {
        a
    } else {
        scale(a, 1.0 / len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::HexColor;

    fn at(x: f64, y: f64, z: f64) -> NormalizedPoint {
        NormalizedPoint {
            id: "p".to_string(),
            position: [x, y, z],
            latitude: 0.0,
            longitude: 0.0,
            timestamp_millis: 0,
            color: HexColor([0, 0, 0]),
        }
    }

    fn close(a: [f64; 3], b: [f64; 3]) -> bool {
        (0..3).all(|i| (a[i] - b[i]).abs() < 1e-9)
    }

    #[test]
    fn test_center_pose_uses_xy_extent() {
        let points = vec![at(0.2, 0.9, 0.0), at(0.8, 0.1, 1.0), at(0.5, 0.5, 0.3)];
        let pose = center_pose(&points, DEFAULT_CAMERA_DISTANCE).unwrap();
        assert!(close(pose.position, [0.5, 0.5, 2.0]));
        assert!(close(pose.look_at, [0.5, 0.5, 0.0]));
    }

    #[test]
    fn test_center_pose_empty() {
        assert_eq!(center_pose(&[], DEFAULT_CAMERA_DISTANCE), None);
    }

    #[test]
    fn test_set_pose_round_trips() {
        let mut camera = OrbitCamera::default();
        let pose = CameraPose {
            position: [0.3, 0.7, 2.0],
            look_at: [0.3, 0.7, 0.0],
        };
        camera.set_pose(pose);
        assert!((camera.distance - 2.0).abs() < 1e-12);
        assert_eq!(camera.yaw, 0.0);
        assert_eq!(camera.pitch, 0.0);
        assert!(close(camera.position(), pose.position));
    }

    #[test]
    fn test_projection() {
        let mut camera = OrbitCamera::new(75.0);
        camera.set_pose(CameraPose {
            position: [0.5, 0.5, 2.0],
            look_at: [0.5, 0.5, 0.0],
        });

        let center = camera.project([0.5, 0.5, 0.0]).unwrap();
        assert!(center.xy[0].abs() < 1e-12 && center.xy[1].abs() < 1e-12);
        assert!((center.depth - 2.0).abs() < 1e-12);

        let right = camera.project([0.6, 0.5, 0.0]).unwrap();
        assert!(right.xy[0] > 0.0);
        let up = camera.project([0.5, 0.6, 0.0]).unwrap();
        assert!(up.xy[1] > 0.0);

        // Closer to the camera means smaller depth
        let near = camera.project([0.5, 0.5, 1.0]).unwrap();
        assert!(near.depth < center.depth);

        assert!(camera.project([0.5, 0.5, 3.0]).is_none());
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = OrbitCamera::default();
        camera.rotate(0.7, 0.4);
        let pos = camera.position();
        assert!((length(sub(pos, camera.target)) - camera.distance).abs() < 1e-9);

        camera.rotate(0.0, 10.0);
        assert_eq!(camera.pitch, MAX_PITCH);

        camera.zoom(0.5);
        assert!((camera.distance - 1.0).abs() < 1e-12);
        camera.zoom(1e-6);
        assert_eq!(camera.distance, 0.05);
    }

    #[test]
    fn test_pan_moves_target_in_view_plane() {
        let mut camera = OrbitCamera::default();
        camera.pan(0.1, 0.0);
        assert!(close(camera.target, [0.7, 0.5, 0.0]));
    }

    #[test]
    fn test_controller_recenters_once_per_set() {
        let mut controller = CameraController::new(DEFAULT_CAMERA_DISTANCE);
        let mut camera = OrbitCamera::default();
        camera.target = [9.0, 9.0, 9.0];

        let points: Arc<[NormalizedPoint]> =
            Arc::from(vec![at(0.2, 0.1, 0.0), at(0.8, 0.9, 1.0)]);
        assert!(controller.sync(&points, &mut camera));
        assert!(close(camera.position(), [0.5, 0.5, 2.0]));

        // Same set again: user orbiting is left alone
        camera.rotate(0.3, 0.0);
        assert!(!controller.sync(&points, &mut camera));
        assert_eq!(camera.yaw, 0.3);

        // Equal contents but a new set still recenters
        let reloaded: Arc<[NormalizedPoint]> = Arc::from(points.to_vec());
        assert!(controller.sync(&reloaded, &mut camera));
        assert_eq!(camera.yaw, 0.0);
    }

    #[test]
    fn test_controller_ignores_empty_set() {
        let mut controller = CameraController::new(DEFAULT_CAMERA_DISTANCE);
        let mut camera = OrbitCamera::default();
        camera.target = [3.0, 4.0, 0.0];
        let empty: Arc<[NormalizedPoint]> = Arc::from(Vec::new());
        assert!(!controller.sync(&empty, &mut camera));
        assert_eq!(camera.target, [3.0, 4.0, 0.0]);
    }
}
