use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point or direction in world space.
///
/// `y` is up. The field is flat, so all planar math works on `x` and `z`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// Right.
    pub x: f64,
    /// Up.
    pub y: f64,
    /// Forward.
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// A horizontal vector of the given length pointing along `heading` radians.
    pub fn planar(heading: f64, length: f64) -> Self {
        Self::new(heading.cos() * length, 0.0, heading.sin() * length)
    }

    /// Dot product restricted to the x-z plane.
    pub fn planar_dot(self, other: Self) -> f64 {
        self.x * other.x + self.z * other.z
    }

    /// Length of the x-z projection.
    pub fn planar_length(self) -> f64 {
        self.planar_dot(self).sqrt()
    }

    /// Distance between two points ignoring height.
    pub fn planar_distance(self, other: Self) -> f64 {
        (self - other).planar_length()
    }

    /// Mirror this vector across the plane whose normal is `normal`.
    ///
    /// `normal` must be a unit vector in the x-z plane. The `y` component is
    /// left untouched.
    pub fn reflect(self, normal: Self) -> Self {
        let d = 2.0 * self.planar_dot(normal);
        Self::new(self.x - d * normal.x, self.y, self.z - d * normal.z)
    }

    /// Whether every component is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// The circular region agents live in. Its boundary reflects movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Center of the circle. Its `y` is the height agents spawn at.
    pub center: Vec3,
    /// Radius of the circle.
    pub radius: f64,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 50.0,
        }
    }
}

/// Where a straight move ends up once the field boundary is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounce {
    /// Final position.
    pub position: Vec3,
    /// Velocity after the move, reflected if the boundary was hit.
    pub velocity: Vec3,
    /// Whether the boundary was hit.
    pub reflected: bool,
}

impl Field {
    /// Create a field with the given center and radius.
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Whether `point` lies on or inside the boundary.
    pub fn contains(&self, point: Vec3) -> bool {
        point.planar_distance(self.center) <= self.radius
    }

    /// Unit normal pointing out of the field at the boundary point nearest `point`.
    ///
    /// Falls back to +x for the exact center, where every direction is outward.
    pub fn outward_normal(&self, point: Vec3) -> Vec3 {
        let offset = point - self.center;
        let len = offset.planar_length();
        if len <= f64::EPSILON {
            return Vec3::new(1.0, 0.0, 0.0);
        }
        Vec3::new(offset.x / len, 0.0, offset.z / len)
    }

    /// Move from `position` with `velocity` for `dt` seconds.
    ///
    /// A move that would leave the field is cut at the boundary crossing, the
    /// velocity is mirrored across the outward normal there, and the rest of
    /// the step continues along the mirrored velocity. This happens once per
    /// call. If a step is long enough to leave the field again after the
    /// bounce, the agent stops at the crossing point instead.
    pub fn advance(&self, position: Vec3, velocity: Vec3, dt: f64) -> Bounce {
        let next = position + velocity * dt;
        if self.contains(next) {
            return Bounce {
                position: next,
                velocity,
                reflected: false,
            };
        }

        let (hit, t_hit) = self.crossing(position, velocity, dt);
        let normal = self.outward_normal(hit);
        let reflected_velocity = if velocity.planar_dot(normal) > 0.0 {
            velocity.reflect(normal)
        } else {
            velocity
        };

        let bounced = hit + reflected_velocity * (dt - t_hit);
        let position = if self.contains(bounced) { bounced } else { hit };
        Bounce {
            position,
            velocity: reflected_velocity,
            reflected: true,
        }
    }

    /// First point along the path where it meets the boundary, and the time
    /// it takes to get there. A start outside the field is projected onto
    /// the boundary at time zero.
    fn crossing(&self, position: Vec3, velocity: Vec3, dt: f64) -> (Vec3, f64) {
        let offset = position - self.center;
        let c = offset.planar_dot(offset) - self.radius * self.radius;
        let a = velocity.planar_dot(velocity);
        if c > 0.0 || a <= f64::EPSILON {
            return (self.pull_inside(position), 0.0);
        }

        // Inside the circle c <= 0, so the discriminant is non-negative and
        // the larger root is the forward exit.
        let b = 2.0 * offset.planar_dot(velocity);
        let disc = (b * b - 4.0 * a * c).max(0.0);
        let t = ((-b + disc.sqrt()) / (2.0 * a)).clamp(0.0, dt);
        let mut hit = position + velocity * t;
        hit.y = position.y;
        (self.pull_inside(hit), t)
    }

    /// `point` if it is inside, otherwise the nearest boundary point that
    /// [`contains`](Self::contains) accepts. Rounding can put a point computed
    /// at exactly `radius` a few ulps outside, so the radius is shrunk until
    /// the check passes.
    fn pull_inside(&self, point: Vec3) -> Vec3 {
        if self.contains(point) {
            return point;
        }
        let normal = self.outward_normal(point);
        let mut radius = self.radius;
        for _ in 0..64 {
            let candidate = Vec3::new(
                self.center.x + normal.x * radius,
                point.y,
                self.center.z + normal.z * radius,
            );
            if self.contains(candidate) {
                return candidate;
            }
            radius -= self.radius * f64::EPSILON * 4.0;
        }
        Vec3::new(self.center.x, point.y, self.center.z)
    }
}
