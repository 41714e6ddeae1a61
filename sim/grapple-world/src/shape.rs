//! Collision shapes and analytic ray casts.
//!
//! # Supported Shapes
//!
//! - Sphere: Analytic ray-sphere intersection
//! - Plane: Analytic ray-plane intersection
//! - Box: Ray-box slab test (in local coordinates)

// Allow suspicious_operation_groupings - false positive for quadratic discriminant formula b*b - c
#![allow(clippy::suspicious_operation_groupings)]

use grapple_types::Pose;
use nalgebra::{Point3, UnitVector3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Geometry of a collider, in the collider's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CollisionShape {
    /// Sphere with given radius.
    Sphere {
        /// Sphere radius in meters.
        radius: f64,
    },
    /// Infinite plane with normal and distance from origin.
    /// The plane equation is: normal · x = distance
    Plane {
        /// Unit normal vector of the plane.
        normal: Vector3<f64>,
        /// Distance from origin along the normal.
        distance: f64,
    },
    /// Box with half-extents.
    Box {
        /// Half-extents of the box in each axis.
        half_extents: Vector3<f64>,
    },
}

impl CollisionShape {
    /// Create a sphere.
    #[must_use]
    pub fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Create a plane through the origin of its frame.
    #[must_use]
    pub fn plane(normal: Vector3<f64>) -> Self {
        Self::Plane {
            normal,
            distance: 0.0,
        }
    }

    /// Create a box from half-extents.
    #[must_use]
    pub fn cuboid(half_extents: Vector3<f64>) -> Self {
        Self::Box { half_extents }
    }
}

/// Intersection of a ray with a single shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeHit {
    /// Distance from ray origin to hit point.
    pub distance: f64,
    /// Hit point in world coordinates.
    pub point: Point3<f64>,
    /// Surface normal at hit point (pointing away from surface).
    pub normal: Vector3<f64>,
}

impl ShapeHit {
    fn new(distance: f64, point: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            distance,
            point,
            normal,
        }
    }
}

/// Safe vector normalization with fallback.
#[inline]
fn safe_normalize(v: &Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n > 1e-10 { v / n } else { fallback }
}

/// Cast a ray against a shape placed at `shape_pose`.
///
/// Returns the closest hit within `max_distance`, or `None`.
#[must_use]
pub fn raycast_shape(
    shape: &CollisionShape,
    shape_pose: &Pose,
    ray_origin: Point3<f64>,
    ray_direction: UnitVector3<f64>,
    max_distance: f64,
) -> Option<ShapeHit> {
    match shape {
        CollisionShape::Sphere { radius } => raycast_sphere(
            shape_pose.position,
            *radius,
            ray_origin,
            ray_direction,
            max_distance,
        ),
        CollisionShape::Plane { normal, distance } => {
            let world_normal = safe_normalize(&shape_pose.transform_vector(normal), *normal);
            let world_point = shape_pose.position + world_normal * *distance;
            raycast_plane(
                &world_point,
                &world_normal,
                ray_origin,
                ray_direction,
                max_distance,
            )
        }
        CollisionShape::Box { half_extents } => raycast_box(
            shape_pose,
            *half_extents,
            ray_origin,
            ray_direction,
            max_distance,
        ),
    }
}

fn raycast_sphere(
    center: Point3<f64>,
    radius: f64,
    ray_origin: Point3<f64>,
    ray_direction: UnitVector3<f64>,
    max_distance: f64,
) -> Option<ShapeHit> {
    let oc = ray_origin - center;
    let dir = ray_direction.as_ref();

    // t^2 + 2*b*t + c = 0 where b = oc·dir, c = oc·oc - r²
    let b = oc.dot(dir);
    let c = oc.dot(&oc) - radius * radius;
    let discriminant = b * b - c;

    // NaN < 0.0 is false, so test the positive form
    if !(discriminant >= 0.0) {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let mut t = -b - sqrt_d;
    if t < 0.0 {
        // Origin inside the sphere
        t = -b + sqrt_d;
    }

    if t < 0.0 || t > max_distance {
        return None;
    }

    let point = ray_origin + dir * t;
    let normal = safe_normalize(&(point - center), *dir);

    Some(ShapeHit::new(t, point, normal))
}

fn raycast_plane(
    plane_point: &Point3<f64>,
    plane_normal: &Vector3<f64>,
    ray_origin: Point3<f64>,
    ray_direction: UnitVector3<f64>,
    max_distance: f64,
) -> Option<ShapeHit> {
    if plane_normal.norm_squared() < 1e-20 {
        return None;
    }

    let dir = ray_direction.as_ref();
    let denom = plane_normal.dot(dir);

    // Parallel (or NaN)
    if !(denom.abs() >= 1e-10) {
        return None;
    }

    let t = (plane_point - ray_origin).dot(plane_normal) / denom;
    if t < 0.0 || t > max_distance {
        return None;
    }

    let point = ray_origin + dir * t;
    let normal = if denom > 0.0 {
        -*plane_normal
    } else {
        *plane_normal
    };

    Some(ShapeHit::new(t, point, normal))
}

fn raycast_box(
    pose: &Pose,
    half_extents: Vector3<f64>,
    ray_origin: Point3<f64>,
    ray_direction: UnitVector3<f64>,
    max_distance: f64,
) -> Option<ShapeHit> {
    let local_origin = pose.inverse_transform_point(&ray_origin);
    let local_dir = pose.inverse_transform_vector(ray_direction.as_ref());

    let mut t_min = 0.0_f64;
    let mut t_max = max_distance;
    let mut hit_normal = Vector3::zeros();

    for i in 0..3 {
        let origin_i = local_origin[i];
        let dir_i = local_dir[i];
        let extent = half_extents[i];

        if dir_i.abs() < 1e-10 {
            if origin_i < -extent || origin_i > extent {
                return None;
            }
        } else {
            let inv_dir = 1.0 / dir_i;
            let t1 = (-extent - origin_i) * inv_dir;
            let t2 = (extent - origin_i) * inv_dir;

            let (t_near, t_far, sign) = if t1 < t2 {
                (t1, t2, -1.0)
            } else {
                (t2, t1, 1.0)
            };

            if t_near > t_min {
                t_min = t_near;
                hit_normal = Vector3::zeros();
                hit_normal[i] = sign;
            }

            t_max = t_max.min(t_far);
            if t_min > t_max {
                return None;
            }
        }
    }

    if t_min > max_distance {
        return None;
    }

    let point = ray_origin + ray_direction.as_ref() * t_min;
    let world_normal = safe_normalize(&pose.transform_vector(&hit_normal), hit_normal);

    Some(ShapeHit::new(t_min, point, world_normal))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ray_y() -> UnitVector3<f64> {
        UnitVector3::new_normalize(Vector3::y())
    }

    #[test]
    fn test_raycast_sphere_hit() {
        let shape = CollisionShape::sphere(1.0);
        let pose = Pose::from_position(Point3::new(0.0, 5.0, 0.0));

        let hit = raycast_shape(&shape, &pose, Point3::origin(), ray_y(), 10.0).unwrap();
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1e-10);
        assert_relative_eq!(hit.normal.y, -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_raycast_sphere_max_distance() {
        let shape = CollisionShape::sphere(1.0);
        let pose = Pose::from_position(Point3::new(0.0, 5.0, 0.0));
        assert!(raycast_shape(&shape, &pose, Point3::origin(), ray_y(), 3.9).is_none());
    }

    #[test]
    fn test_raycast_sphere_miss() {
        let shape = CollisionShape::sphere(1.0);
        let pose = Pose::from_position(Point3::new(3.0, 5.0, 0.0));
        assert!(raycast_shape(&shape, &pose, Point3::origin(), ray_y(), 10.0).is_none());
    }

    #[test]
    fn test_raycast_plane_hit() {
        // Wall facing -Y at y = 6
        let shape = CollisionShape::plane(-Vector3::y());
        let pose = Pose::from_position(Point3::new(0.0, 6.0, 0.0));

        let hit = raycast_shape(&shape, &pose, Point3::origin(), ray_y(), 10.0).unwrap();
        assert_relative_eq!(hit.distance, 6.0, epsilon = 1e-10);
        assert_relative_eq!(hit.normal.y, -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_raycast_plane_parallel() {
        let shape = CollisionShape::plane(Vector3::z());
        let pose = Pose::from_position(Point3::new(0.0, 0.0, -1.0));
        assert!(raycast_shape(&shape, &pose, Point3::origin(), ray_y(), 10.0).is_none());
    }

    #[test]
    fn test_raycast_box_hit() {
        let shape = CollisionShape::cuboid(Vector3::new(1.0, 0.5, 1.0));
        let pose = Pose::from_position(Point3::new(0.0, 3.0, 0.0));

        let hit = raycast_shape(&shape, &pose, Point3::origin(), ray_y(), 10.0).unwrap();
        assert_relative_eq!(hit.distance, 2.5, epsilon = 1e-10);
        assert_relative_eq!(hit.normal.y, -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_raycast_rotated_box() {
        let shape = CollisionShape::cuboid(Vector3::new(0.5, 2.0, 0.5));
        // Quarter turn about Z lays the long axis along X
        let pose = Pose::from_position_rotation(
            Point3::new(0.0, 3.0, 0.0),
            nalgebra::UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
        );

        let hit = raycast_shape(&shape, &pose, Point3::origin(), ray_y(), 10.0).unwrap();
        assert_relative_eq!(hit.distance, 2.5, epsilon = 1e-10);
    }

    #[test]
    fn test_raycast_box_miss() {
        let shape = CollisionShape::cuboid(Vector3::new(0.5, 0.5, 0.5));
        let pose = Pose::from_position(Point3::new(2.0, 3.0, 0.0));
        assert!(raycast_shape(&shape, &pose, Point3::origin(), ray_y(), 10.0).is_none());
    }

    #[test]
    fn test_raycast_sphere_nan_discriminant() {
        let shape = CollisionShape::sphere(f64::NAN);
        let pose = Pose::from_position(Point3::new(0.0, 5.0, 0.0));
        assert!(raycast_shape(&shape, &pose, Point3::origin(), ray_y(), 10.0).is_none());
    }
}
