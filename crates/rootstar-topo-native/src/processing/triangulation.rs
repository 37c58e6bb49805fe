//! Delaunay triangulation of projected electrode layouts
//!
//! The mesh itself comes from `spade`, whose exact orientation and incircle
//! predicates keep cocircular electrodes (every ring of a montage that
//! shares an elevation) from producing overlapping triangles. This module
//! adds what interpolation needs on top: electrode-indexed triangles,
//! neighbor links, vertex adjacency and point location.

use std::collections::HashMap;

use rootstar_topo_core::types::Point2;
use spade::{DelaunayTriangulation, HasPosition, Triangulation as _};
use tracing::{debug, warn};

use crate::error::{LayoutError, LayoutResult};

/// Relative distance under which two electrodes are treated as coincident
const DUPLICATE_TOLERANCE: f64 = 1e-12;

/// Relative area under which three points are treated as collinear
const COLLINEAR_TOLERANCE: f64 = 1e-12;

/// Barycentric slack when locating points on triangle edges
const LOCATE_TOLERANCE: f64 = 1e-10;

/// One counter-clockwise triangle of the mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle {
    /// Electrode indices, counter-clockwise
    pub vertices: [usize; 3],
    /// Neighbor across the edge opposite `vertices[k]`
    pub neighbors: [Option<usize>; 3],
}

/// Delaunay triangulation over a fixed set of planar points.
#[derive(Clone, Debug)]
pub struct Triangulation {
    points: Vec<Point2>,
    triangles: Vec<Triangle>,
    vertex_neighbors: Vec<Vec<usize>>,
}

/// Mesh vertex carrying its electrode index
#[derive(Clone, Copy, Debug)]
struct MeshVertex {
    position: spade::Point2<f64>,
    electrode: usize,
}

impl HasPosition for MeshVertex {
    type Scalar = f64;

    fn position(&self) -> spade::Point2<f64> {
        self.position
    }
}

/// Twice the signed area of (a, b, c); positive when counter-clockwise.
#[inline]
pub fn orient(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

impl Triangulation {
    /// Triangulate a planar point set.
    ///
    /// Coincident points after the first are left out of the mesh; they keep
    /// their index but own no triangles.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] when fewer than three distinct points remain,
    /// when all points are collinear, or when a coordinate is unusable.
    pub fn new(points: &[Point2]) -> LayoutResult<Self> {
        let n = points.len();
        let (min_x, max_x, min_y, max_y) = points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(x0, x1, y0, y1), p| (x0.min(p.x), x1.max(p.x), y0.min(p.y), y1.max(p.y)),
        );
        let extent = (max_x - min_x).max(max_y - min_y);
        if !extent.is_finite() {
            return Err(LayoutError::TooFewSensors { got: 0 });
        }

        let dup_sq = (DUPLICATE_TOLERANCE * extent).powi(2);
        let mut distinct: Vec<usize> = Vec::with_capacity(n);
        for (i, p) in points.iter().enumerate() {
            if let Some(&j) = distinct.iter().find(|&&j| points[j].distance_sq(p) <= dup_sq) {
                warn!("Electrode {i} coincides with electrode {j}; excluded from triangulation");
                continue;
            }
            distinct.push(i);
        }
        if distinct.len() < 3 {
            return Err(LayoutError::TooFewSensors { got: distinct.len() });
        }

        let area_tol = COLLINEAR_TOLERANCE * extent * extent;
        let (a, b) = (points[distinct[0]], points[distinct[1]]);
        if distinct.iter().all(|&k| orient(a, b, points[k]).abs() <= area_tol) {
            return Err(LayoutError::Collinear { count: n });
        }

        let mut mesh: DelaunayTriangulation<MeshVertex> = DelaunayTriangulation::new();
        for &i in &distinct {
            let vertex = MeshVertex {
                position: spade::Point2::new(points[i].x, points[i].y),
                electrode: i,
            };
            mesh.insert(vertex).map_err(|err| LayoutError::Insertion {
                index: i,
                reason: format!("{err:?}"),
            })?;
        }

        let tris: Vec<[usize; 3]> = mesh
            .inner_faces()
            .map(|face| {
                let mut t = face.vertices().map(|v| v.data().electrode);
                if orient(points[t[0]], points[t[1]], points[t[2]]) < 0.0 {
                    t.swap(1, 2);
                }
                t
            })
            .collect();
        if tris.is_empty() {
            return Err(LayoutError::Collinear { count: n });
        }

        let triangles = link_neighbors(&tris);
        let vertex_neighbors = vertex_adjacency(n, &tris);

        debug!(
            "Triangulated {} electrodes ({} distinct) into {} triangles",
            n,
            distinct.len(),
            triangles.len()
        );

        Ok(Self {
            points: points.to_vec(),
            triangles,
            vertex_neighbors,
        })
    }

    /// Input points, including any excluded duplicates
    #[inline]
    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Mesh triangles
    #[inline]
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Indices of points sharing an edge with `vertex`, ascending
    #[inline]
    #[must_use]
    pub fn neighbors_of(&self, vertex: usize) -> &[usize] {
        &self.vertex_neighbors[vertex]
    }

    /// Barycentric coordinates of `p` with respect to triangle `tri`
    #[must_use]
    pub fn barycentric(&self, tri: usize, p: Point2) -> [f64; 3] {
        let [i0, i1, i2] = self.triangles[tri].vertices;
        let (a, b, c) = (self.points[i0], self.points[i1], self.points[i2]);

        let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
        let l0 = ((b.y - c.y) * (p.x - c.x) + (c.x - b.x) * (p.y - c.y)) / det;
        let l1 = ((c.y - a.y) * (p.x - c.x) + (a.x - c.x) * (p.y - c.y)) / det;
        [l0, l1, 1.0 - l0 - l1]
    }

    /// Find the triangle containing `p` and its barycentric coordinates.
    ///
    /// Points on shared edges resolve to the triangle where `p` is most
    /// interior. Returns `None` outside the convex hull.
    #[must_use]
    pub fn locate(&self, p: Point2) -> Option<(usize, [f64; 3])> {
        let mut best: Option<(usize, [f64; 3], f64)> = None;
        for tri in 0..self.triangles.len() {
            let bary = self.barycentric(tri, p);
            let worst = bary[0].min(bary[1]).min(bary[2]);
            if worst < -LOCATE_TOLERANCE {
                continue;
            }
            if best.map_or(true, |(_, _, w)| worst > w) {
                best = Some((tri, bary, worst));
            }
        }
        best.map(|(tri, bary, _)| (tri, bary))
    }

    /// True when `p` lies inside the convex hull of the layout
    #[must_use]
    pub fn contains(&self, p: Point2) -> bool {
        self.locate(p).is_some()
    }
}

fn link_neighbors(tris: &[[usize; 3]]) -> Vec<Triangle> {
    let mut by_edge: HashMap<(usize, usize), usize> = HashMap::with_capacity(tris.len() * 3);
    for (t, tri) in tris.iter().enumerate() {
        for k in 0..3 {
            by_edge.insert((tri[k], tri[(k + 1) % 3]), t);
        }
    }

    tris.iter()
        .map(|&vertices| {
            let neighbors = std::array::from_fn(|k| {
                // Edge opposite vertex k, looked up in reverse direction
                let a = vertices[(k + 1) % 3];
                let b = vertices[(k + 2) % 3];
                by_edge.get(&(b, a)).copied()
            });
            Triangle { vertices, neighbors }
        })
        .collect()
}

fn vertex_adjacency(n: usize, tris: &[[usize; 3]]) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); n];
    for tri in tris {
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
    }
    for list in &mut adjacency {
        list.sort_unstable();
        list.dedup();
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn diamond() -> Vec<Point2> {
        vec![
            Point2::new(FRAC_PI_2, 0.0),
            Point2::new(0.0, FRAC_PI_2),
            Point2::new(-FRAC_PI_2, 0.0),
            Point2::new(0.0, -FRAC_PI_2),
        ]
    }

    fn hull_area(tri: &Triangulation) -> f64 {
        tri.triangles()
            .iter()
            .map(|t| {
                let [a, b, c] = t.vertices;
                0.5 * orient(tri.points()[a], tri.points()[b], tri.points()[c])
            })
            .sum()
    }

    fn ring(k: usize, radius: f64) -> Vec<Point2> {
        (0..k)
            .map(|i| {
                let a = 2.0 * PI * i as f64 / k as f64;
                Point2::new(radius * a.cos(), radius * a.sin())
            })
            .collect()
    }

    fn assert_tiles_hull(tri: &Triangulation, expected_area: f64) {
        for t in tri.triangles() {
            let [a, b, c] = t.vertices;
            assert!(orient(tri.points()[a], tri.points()[b], tri.points()[c]) > 0.0);
        }
        assert_abs_diff_eq!(hull_area(tri), expected_area, epsilon = 1e-9);
    }

    #[test]
    fn test_diamond_two_triangles() {
        let tri = Triangulation::new(&diamond()).unwrap();
        assert_eq!(tri.triangles().len(), 2);
        // Area of a square with diagonal pi
        assert!((hull_area(&tri) - FRAC_PI_2 * FRAC_PI_2 * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_triangles_are_ccw() {
        let mut pts = diamond();
        pts.push(Point2::new(0.1, 0.2));
        pts.push(Point2::new(-0.4, -0.3));
        let tri = Triangulation::new(&pts).unwrap();
        for t in tri.triangles() {
            let [a, b, c] = t.vertices;
            assert!(orient(pts[a], pts[b], pts[c]) > 0.0);
        }
        // Euler: 2n - 2 - hull vertices
        assert_eq!(tri.triangles().len(), 2 * pts.len() - 2 - 4);
    }

    #[test]
    fn test_collinear_hull_points_are_covered() {
        // Square corners plus edge midpoints, as produced by edgeless padding
        let mut pts = diamond();
        pts.extend([
            Point2::new(-FRAC_PI_2, -FRAC_PI_2),
            Point2::new(-FRAC_PI_2, FRAC_PI_2),
            Point2::new(FRAC_PI_2, -FRAC_PI_2),
            Point2::new(FRAC_PI_2, FRAC_PI_2),
        ]);
        let tri = Triangulation::new(&pts).unwrap();
        assert!((hull_area(&tri) - std::f64::consts::PI.powi(2)).abs() < 1e-9);
        assert!(tri.contains(Point2::new(FRAC_PI_2 - 1e-6, FRAC_PI_2 - 1e-6)));
    }

    #[test]
    fn test_neighbors_are_symmetric() {
        let pts: Vec<Point2> = (0..12)
            .map(|i| {
                let a = i as f64 * 0.7;
                Point2::new(a.cos() * (1.0 + 0.1 * i as f64), a.sin())
            })
            .collect();
        let tri = Triangulation::new(&pts).unwrap();

        for (t, triangle) in tri.triangles().iter().enumerate() {
            for neighbor in triangle.neighbors.iter().flatten() {
                assert!(tri.triangles()[*neighbor].neighbors.contains(&Some(t)));
            }
        }
    }

    #[test]
    fn test_locate_inside_and_outside() {
        let tri = Triangulation::new(&diamond()).unwrap();

        let (t, bary) = tri.locate(Point2::new(0.1, 0.1)).unwrap();
        assert!(t < 2);
        assert!((bary.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        // On a vertex and on a hull edge
        assert!(tri.contains(Point2::new(FRAC_PI_2, 0.0)));
        assert!(tri.contains(Point2::new(FRAC_PI_2 / 2.0, FRAC_PI_2 / 2.0)));

        assert!(!tri.contains(Point2::new(1.2, 1.2)));
        assert!(!tri.contains(Point2::new(-2.0, 0.0)));
    }

    #[test]
    fn test_duplicates_are_excluded() {
        let mut pts = diamond();
        pts.push(pts[0]);
        let tri = Triangulation::new(&pts).unwrap();
        assert_eq!(tri.triangles().len(), 2);
        assert!(tri.neighbors_of(4).is_empty());
    }

    #[test]
    fn test_degenerate_layouts() {
        let line = [Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)];
        assert!(matches!(Triangulation::new(&line), Err(LayoutError::Collinear { .. })));

        let two = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 0.0)];
        assert!(matches!(
            Triangulation::new(&two),
            Err(LayoutError::TooFewSensors { got: 2 })
        ));
    }

    #[test]
    fn test_cocircular_ring() {
        for k in [8, 16, 32] {
            let tri = Triangulation::new(&ring(k, 1.0)).unwrap();
            assert_eq!(tri.triangles().len(), k - 2, "ring of {k}");
            let area = 0.5 * k as f64 * (2.0 * PI / k as f64).sin();
            assert_tiles_hull(&tri, area);
        }
    }

    #[test]
    fn test_ring_with_centre() {
        for k in [8, 16, 32] {
            let mut pts = ring(k, FRAC_PI_2);
            pts.push(Point2::new(0.0, 0.0));
            let tri = Triangulation::new(&pts).unwrap();
            assert_eq!(tri.triangles().len(), k, "ring of {k} plus centre");
            let area = 0.5 * k as f64 * FRAC_PI_2 * FRAC_PI_2 * (2.0 * PI / k as f64).sin();
            assert_tiles_hull(&tri, area);
            assert_eq!(tri.neighbors_of(k).len(), k);
        }
    }

    #[test]
    fn test_ring_with_corner_padding() {
        let mut pts = ring(16, FRAC_PI_2);
        pts.push(Point2::new(0.0, 0.0));
        pts.extend([
            Point2::new(-FRAC_PI_2, -FRAC_PI_2),
            Point2::new(-FRAC_PI_2, FRAC_PI_2),
            Point2::new(FRAC_PI_2, -FRAC_PI_2),
            Point2::new(FRAC_PI_2, FRAC_PI_2),
        ]);
        let tri = Triangulation::new(&pts).unwrap();
        assert_tiles_hull(&tri, PI * PI);
        for v in 0..pts.len() {
            assert!(!tri.neighbors_of(v).is_empty(), "electrode {v} left out of the mesh");
        }
    }

    #[test]
    fn test_ring_mesh_is_reproducible() {
        let mut pts = ring(16, 1.0);
        pts.push(Point2::new(0.1, -0.05));
        let first = Triangulation::new(&pts).unwrap();
        for _ in 0..5 {
            let again = Triangulation::new(&pts).unwrap();
            assert_eq!(again.triangles(), first.triangles());
        }
    }
}
