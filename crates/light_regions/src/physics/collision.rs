//! Collision primitives for ray and overlap queries
//!
//! Broad-phase tests use bounding spheres, narrow-phase tests run against
//! triangle meshes.

use crate::foundation::math::Vec3;

/// Handle of a collider registered with a geometry query backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub u32);

/// A ray for ray casting
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of a ray intersection test
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// The collider that was hit
    pub collider: ColliderId,
    /// The distance from the ray origin to the hit point
    pub distance: f32,
    /// The point of intersection in world space
    pub point: Vec3,
    /// The surface normal at the intersection point, facing the ray
    pub normal: Vec3,
}

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &Self) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Test ray intersection with this sphere
    /// Returns (distance, hit_point, normal) if hit, None otherwise
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        let oc = ray.origin - self.center;

        // Solve: |origin + t*direction - center|^2 = radius^2
        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let t1 = (-b - sqrt_discriminant) / (2.0 * a);
        let t2 = (-b + sqrt_discriminant) / (2.0 * a);

        let t = if t1 > 0.0 {
            t1
        } else if t2 > 0.0 {
            t2
        } else {
            return None;
        };

        let hit_point = ray.point_at(t);
        let normal = (hit_point - self.center).normalize();
        Some((t, hit_point, normal))
    }
}

/// A triangle for collision detection
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Normal of the triangle (right-hand rule), zero for degenerate triangles
    pub fn normal(&self) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        edge1
            .cross(&edge2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::zeros)
    }

    /// Möller-Trumbore ray-triangle intersection
    /// Returns (t, u, v) barycentric coordinates if hit, None otherwise
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32, f32)> {
        const EPSILON: f32 = 0.000_001;

        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Parallel or degenerate
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        if t >= 0.0 {
            Some((t, u, v))
        } else {
            None
        }
    }

    /// Get the closest point on the triangle to a given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let v0_to_point = point - self.v0;

        let d1 = edge1.dot(&v0_to_point);
        let d2 = edge2.dot(&v0_to_point);
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.v0;
        }

        let v1_to_point = point - self.v1;
        let d3 = edge1.dot(&v1_to_point);
        let d4 = edge2.dot(&v1_to_point);
        if d3 >= 0.0 && d4 <= d3 {
            return self.v1;
        }

        let v2_to_point = point - self.v2;
        let d5 = edge1.dot(&v2_to_point);
        let d6 = edge2.dot(&v2_to_point);
        if d6 >= 0.0 && d5 <= d6 {
            return self.v2;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v_val = d1 / (d1 - d3);
            return self.v0 + edge1 * v_val;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return self.v0 + edge2 * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.v1 + (self.v2 - self.v1) * w;
        }

        // Inside the face
        let denom = 1.0 / (va + vb + vc);
        let v_val = vb * denom;
        let w = vc * denom;
        self.v0 + edge1 * v_val + edge2 * w
    }
}

/// A collision mesh composed of triangles
#[derive(Debug, Clone)]
pub struct CollisionMesh {
    /// All triangles in the mesh (world space)
    pub triangles: Vec<Triangle>,
    /// Bounding sphere for broad-phase tests
    pub bounding_sphere: BoundingSphere,
    /// Reference point the mesh was built around
    pub center: Vec3,
}

impl CollisionMesh {
    /// Creates a new collision mesh from local vertices and indices placed at `center`
    pub fn from_vertices(vertices: &[Vec3], indices: &[u32], center: Vec3, scale: f32) -> Self {
        let triangles: Vec<Triangle> = indices
            .chunks_exact(3)
            .map(|chunk| {
                Triangle::new(
                    center + vertices[chunk[0] as usize] * scale,
                    center + vertices[chunk[1] as usize] * scale,
                    center + vertices[chunk[2] as usize] * scale,
                )
            })
            .collect();

        // Bounding sphere from the furthest vertex
        let max_distance_sq = triangles
            .iter()
            .flat_map(|tri| [tri.v0, tri.v1, tri.v2])
            .map(|vertex| (vertex - center).magnitude_squared())
            .fold(0.0f32, f32::max);

        Self {
            triangles,
            bounding_sphere: BoundingSphere::new(center, max_distance_sq.sqrt()),
            center,
        }
    }

    /// Closed box with outward-facing triangles
    pub fn cuboid(center: Vec3, half_extents: Vec3) -> Self {
        let h = half_extents;
        let corners = [
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        let indices: [u32; 36] = [
            0, 2, 1, 0, 3, 2, // -Z
            4, 5, 6, 4, 6, 7, // +Z
            0, 1, 5, 0, 5, 4, // -Y
            3, 7, 6, 3, 6, 2, // +Y
            0, 4, 7, 0, 7, 3, // -X
            1, 2, 6, 1, 6, 5, // +X
        ];
        Self::from_vertices(&corners, &indices, center, 1.0)
    }

    /// Closest hit (t, hit_point, normal) against all triangles in the mesh
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        self.bounding_sphere.intersect_ray(ray)?;
        self.nearest_triangle_hit(ray)
    }

    fn nearest_triangle_hit(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        let mut closest_hit: Option<(f32, Vec3, Vec3)> = None;
        let mut closest_t = f32::MAX;

        for triangle in &self.triangles {
            if let Some((t, _u, _v)) = triangle.intersect_ray(ray) {
                if t < closest_t {
                    closest_t = t;
                    closest_hit = Some((t, ray.point_at(t), triangle.normal()));
                }
            }
        }

        closest_hit
    }

    /// Test sphere intersection against the mesh surface
    /// Returns contact point, normal and penetration if the sphere touches a triangle
    pub fn intersect_sphere(&self, sphere: &BoundingSphere) -> Option<(Vec3, Vec3, f32)> {
        if !self.bounding_sphere.intersects(sphere) {
            return None;
        }

        for triangle in &self.triangles {
            let closest = triangle.closest_point(sphere.center);
            let dist_sq = (closest - sphere.center).magnitude_squared();

            if dist_sq <= sphere.radius * sphere.radius {
                let penetration = sphere.radius - dist_sq.sqrt();
                return Some((closest, triangle.normal(), penetration));
            }
        }

        None
    }

    /// Whether `point` lies inside a mesh that is star-shaped around its center
    ///
    /// Casts from the center towards the point: the point is enclosed when the
    /// first surface along that ray is at or beyond it.
    pub fn encloses_point(&self, point: Vec3) -> bool {
        let offset = point - self.center;
        let distance = offset.magnitude();
        if distance <= f32::EPSILON {
            return !self.triangles.is_empty();
        }
        if distance > self.bounding_sphere.radius {
            return false;
        }

        let ray = Ray::new(self.center, offset);
        self.nearest_triangle_hit(&ray)
            .is_some_and(|(t, _, _)| t >= distance)
    }
}

/// Collision shape types
#[derive(Debug, Clone)]
pub enum CollisionShape {
    /// A spherical collision shape
    Sphere(BoundingSphere),
    /// A triangle mesh collision shape
    Mesh(CollisionMesh),
}

impl CollisionShape {
    /// Creates a spherical collision shape
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        Self::Sphere(BoundingSphere::new(center, radius))
    }

    /// Creates a closed box shape
    pub fn cuboid(center: Vec3, half_extents: Vec3) -> Self {
        Self::Mesh(CollisionMesh::cuboid(center, half_extents))
    }

    /// Test ray intersection with this collision shape
    /// Returns (distance, hit_point, normal) if hit, None otherwise
    pub fn intersect_ray_detailed(&self, ray: &Ray) -> Option<(f32, Vec3, Vec3)> {
        match self {
            Self::Sphere(sphere) => sphere.intersect_ray(ray),
            Self::Mesh(mesh) => mesh.intersect_ray(ray),
        }
    }

    /// Whether a query sphere touches or lies inside this shape
    pub fn overlaps_sphere(&self, sphere: &BoundingSphere) -> bool {
        match self {
            Self::Sphere(own) => own.intersects(sphere),
            Self::Mesh(mesh) => {
                mesh.intersect_sphere(sphere).is_some() || mesh.encloses_point(sphere.center)
            }
        }
    }
}
