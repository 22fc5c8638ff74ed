//! Detection region polygons

use serde::{Deserialize, Serialize};

use crate::DetectionError;

/// A 2-D point in detector frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Point {
    fn from(p: [i32; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Closed detection polygon; first and last vertex implicitly connected.
///
/// Only constructible through [`RegionPolygon::new`], which enforces the
/// minimum vertex count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionPolygon {
    vertices: Vec<Point>,
}

impl RegionPolygon {
    /// Build a polygon, requiring at least 3 vertices
    pub fn new(vertices: Vec<Point>) -> Result<Self, DetectionError> {
        if vertices.len() < 3 {
            return Err(DetectionError::Layout(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Even-odd ray cast: does the polygon contain `p`?
    ///
    /// Used to assign a detection centroid to a region.
    pub fn contains(&self, p: Point) -> bool {
        let mut inside = false;
        let n = self.vertices.len();
        let mut j = n - 1;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[j];
            let crosses = (a.y > p.y) != (b.y > p.y);
            if crosses {
                // Intersection of the edge with the horizontal ray at p.y,
                // in i64 to avoid overflow on large frame coordinates.
                let dy = (b.y - a.y) as i64;
                let t = (p.y - a.y) as i64;
                let x_cross = a.x as i64 + (b.x - a.x) as i64 * t / dy;
                if (p.x as i64) < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}
