//! Scattered-to-grid interpolation
//!
//! Electrode values are interpolated onto a square grid with the
//! Clough-Tocher piecewise cubic scheme: each Delaunay triangle is split into
//! three cubic Bézier patches that agree in value and first derivative
//! across every edge, giving a C1 surface over the convex hull.
//!
//! Vertex gradients are not measured, so they are estimated per sample by
//! minimizing the global second-derivative energy along mesh edges. Grid
//! cells outside the hull are set to [`UNDEFINED`].
//!
//! All geometry (triangle lookup per cell, barycentric weights, edge
//! factors) lives in [`InterpolationPlan`] and is computed once per layout.

use rootstar_topo_core::math::linspace;
use rootstar_topo_core::types::{BoundingBox, Point2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LayoutError, LayoutResult};
use crate::processing::triangulation::Triangulation;

/// Marker for grid cells outside the interpolation hull
pub const UNDEFINED: f64 = f64::NAN;

/// Iteration cap for gradient estimation
pub const GRADIENT_MAX_ITER: usize = 400;

/// Convergence tolerance for gradient estimation
pub const GRADIENT_TOLERANCE: f64 = 1e-6;

// ============================================================================
// Grid
// ============================================================================

/// Square sampling grid spanning a layout bounding box.
///
/// Cell `(i, j)` sits at `(xs[i], ys[j])`: the first image axis runs along
/// x and the second along y. Cells are stored row-major, `i * n + j`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    bounds: BoundingBox,
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Grid {
    /// Build an `n × n` grid over `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::DegenerateBoundingBox`] for a zero-area box.
    pub fn new(bounds: BoundingBox, n_gridpoints: usize) -> LayoutResult<Self> {
        if bounds.is_degenerate() {
            return Err(LayoutError::DegenerateBoundingBox {
                width: bounds.width(),
                height: bounds.height(),
            });
        }
        Ok(Self {
            bounds,
            xs: linspace(bounds.min_x, bounds.max_x, n_gridpoints),
            ys: linspace(bounds.min_y, bounds.max_y, n_gridpoints),
        })
    }

    /// Samples per axis
    #[inline]
    #[must_use]
    pub fn n_gridpoints(&self) -> usize {
        self.xs.len()
    }

    /// Total number of cells
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.xs.len() * self.ys.len()
    }

    /// Bounding box covered by the grid
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Coordinates of cell `(i, j)`
    #[inline]
    #[must_use]
    pub fn point(&self, i: usize, j: usize) -> Point2 {
        Point2::new(self.xs[i], self.ys[j])
    }

    /// Coordinates of a flat cell index
    #[inline]
    #[must_use]
    pub fn point_at(&self, cell: usize) -> Point2 {
        let n = self.ys.len();
        self.point(cell / n, cell % n)
    }

    /// Cell closest to `p`, clamped to the grid
    #[must_use]
    pub fn nearest_cell(&self, p: Point2) -> (usize, usize) {
        let snap = |v: f64, lo: f64, hi: f64, n: usize| -> usize {
            let t = ((v - lo) / (hi - lo) * (n - 1) as f64).round();
            t.clamp(0.0, (n - 1) as f64) as usize
        };
        let n = self.n_gridpoints();
        (
            snap(p.x, self.bounds.min_x, self.bounds.max_x, n),
            snap(p.y, self.bounds.min_y, self.bounds.max_y, n),
        )
    }
}

// ============================================================================
// Interpolation Plan
// ============================================================================

/// Triangle and barycentric weights of a grid cell inside the hull.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellLocation {
    /// Containing triangle
    pub triangle: usize,
    /// Barycentric coordinates in that triangle
    pub bary: [f64; 3],
}

/// Precomputed geometry shared by every (sample, channel) interpolation.
#[derive(Clone, Debug)]
pub struct InterpolationPlan {
    triangulation: Triangulation,
    grid: Grid,
    cells: Vec<Option<CellLocation>>,
    edge_factors: Vec<[f64; 3]>,
}

impl InterpolationPlan {
    /// Triangulate `points` and locate every grid cell.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] if the points cannot be triangulated.
    pub fn new(points: &[Point2], grid: Grid) -> LayoutResult<Self> {
        let triangulation = Triangulation::new(points)?;

        let cells: Vec<Option<CellLocation>> = (0..grid.cell_count())
            .map(|cell| {
                triangulation
                    .locate(grid.point_at(cell))
                    .map(|(triangle, bary)| CellLocation { triangle, bary })
            })
            .collect();

        let edge_factors = (0..triangulation.triangles().len())
            .map(|t| edge_factors(&triangulation, t))
            .collect();

        let plan = Self {
            triangulation,
            grid,
            cells,
            edge_factors,
        };
        debug!(
            "Interpolation plan: {} of {} cells inside hull",
            plan.defined_cells(),
            plan.grid.cell_count()
        );
        Ok(plan)
    }

    /// Sampling grid
    #[inline]
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Underlying triangulation
    #[inline]
    #[must_use]
    pub fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    /// Number of sensors the plan expects values for
    #[inline]
    #[must_use]
    pub fn n_sensors(&self) -> usize {
        self.triangulation.points().len()
    }

    /// Number of grid cells inside the hull
    #[must_use]
    pub fn defined_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Interpolate one sample of sensor values into `out` (one grid).
    ///
    /// `values` must hold one value per sensor and `out` one slot per cell.
    pub fn interpolate_into(&self, values: &[f64], out: &mut [f64]) {
        debug_assert_eq!(values.len(), self.n_sensors());
        debug_assert_eq!(out.len(), self.grid.cell_count());

        let (gradients, _) = estimate_gradients(&self.triangulation, values);

        for (slot, cell) in out.iter_mut().zip(&self.cells) {
            *slot = match cell {
                Some(loc) => self.clough_tocher(loc, values, &gradients),
                None => UNDEFINED,
            };
        }
    }

    /// Interpolate one sample into a freshly allocated grid
    #[must_use]
    pub fn interpolate(&self, values: &[f64]) -> Vec<f64> {
        let mut out = vec![UNDEFINED; self.grid.cell_count()];
        self.interpolate_into(values, &mut out);
        out
    }

    #[allow(clippy::similar_names, clippy::many_single_char_names)]
    fn clough_tocher(&self, loc: &CellLocation, f: &[f64], df: &[[f64; 2]]) -> f64 {
        let tri = &self.triangulation.triangles()[loc.triangle];
        let pts = self.triangulation.points();
        let [i1, i2, i3] = tri.vertices;
        let (p1, p2, p3) = (pts[i1], pts[i2], pts[i3]);

        let e12 = (p2.x - p1.x, p2.y - p1.y);
        let e23 = (p3.x - p2.x, p3.y - p2.y);
        let e31 = (p1.x - p3.x, p1.y - p3.y);

        let (f1, f2, f3) = (f[i1], f[i2], f[i3]);

        // Directional derivatives along each edge, from both ends
        let df12 = df[i1][0] * e12.0 + df[i1][1] * e12.1;
        let df21 = -(df[i2][0] * e12.0 + df[i2][1] * e12.1);
        let df23 = df[i2][0] * e23.0 + df[i2][1] * e23.1;
        let df32 = -(df[i3][0] * e23.0 + df[i3][1] * e23.1);
        let df31 = df[i3][0] * e31.0 + df[i3][1] * e31.1;
        let df13 = -(df[i1][0] * e31.0 + df[i1][1] * e31.1);

        // Bézier control net; cABCD weights vertices 1, 2, 3 and the centroid
        let c3000 = f1;
        let c2100 = (df12 + 3.0 * c3000) / 3.0;
        let c2010 = (df13 + 3.0 * c3000) / 3.0;
        let c0300 = f2;
        let c1200 = (df21 + 3.0 * c0300) / 3.0;
        let c0210 = (df23 + 3.0 * c0300) / 3.0;
        let c0030 = f3;
        let c1020 = (df31 + 3.0 * c0030) / 3.0;
        let c0120 = (df32 + 3.0 * c0030) / 3.0;

        let c2001 = (c2100 + c2010 + c3000) / 3.0;
        let c0201 = (c1200 + c0300 + c0210) / 3.0;
        let c0021 = (c1020 + c0120 + c0030) / 3.0;

        // Cross-boundary derivative linear along each edge
        let g = self.edge_factors[loc.triangle];
        let c0111 = (g[0] * (-c0300 + 3.0 * c0210 - 3.0 * c0120 + c0030)
            + (-c0300 + 2.0 * c0210 - c0120 + c0021 + c0201))
            / 2.0;
        let c1011 = (g[1] * (-c0030 + 3.0 * c1020 - 3.0 * c2010 + c3000)
            + (-c0030 + 2.0 * c1020 - c2010 + c2001 + c0021))
            / 2.0;
        let c1101 = (g[2] * (-c3000 + 3.0 * c2100 - 3.0 * c1200 + c0300)
            + (-c3000 + 2.0 * c2100 - c1200 + c2001 + c0201))
            / 2.0;

        let c1002 = (c1101 + c1011 + c2001) / 3.0;
        let c0102 = (c1101 + c0111 + c0201) / 3.0;
        let c0012 = (c1011 + c0111 + c0021) / 3.0;
        let c0003 = (c1002 + c0102 + c0012) / 3.0;

        // Extended barycentric coordinates; one of b1..b3 is zero, which
        // selects the sub-triangle
        let b = loc.bary;
        let minval = b[0].min(b[1]).min(b[2]);
        let b1 = b[0] - minval;
        let b2 = b[1] - minval;
        let b3 = b[2] - minval;
        let b4 = 3.0 * minval;

        b1.powi(3) * c3000
            + 3.0 * b1 * b1 * b2 * c2100
            + 3.0 * b1 * b1 * b3 * c2010
            + 3.0 * b1 * b1 * b4 * c2001
            + 3.0 * b1 * b2 * b2 * c1200
            + 6.0 * b1 * b2 * b4 * c1101
            + 3.0 * b1 * b3 * b3 * c1020
            + 6.0 * b1 * b3 * b4 * c1011
            + 3.0 * b1 * b4 * b4 * c1002
            + b2.powi(3) * c0300
            + 3.0 * b2 * b2 * b3 * c0210
            + 3.0 * b2 * b2 * b4 * c0201
            + 3.0 * b2 * b3 * b3 * c0120
            + 6.0 * b2 * b3 * b4 * c0111
            + 3.0 * b2 * b4 * b4 * c0102
            + b3.powi(3) * c0030
            + 3.0 * b3 * b3 * b4 * c0021
            + 3.0 * b3 * b4 * b4 * c0012
            + b4.powi(3) * c0003
    }
}

/// Affine-invariant cross-edge direction factors for triangle `t`.
///
/// The derivative constraint on each edge is taken along the line joining
/// this triangle's centroid to its neighbor's, so both sides agree. Hull
/// edges fall back to the centroid direction.
fn edge_factors(tri: &Triangulation, t: usize) -> [f64; 3] {
    let triangle = &tri.triangles()[t];
    let pts = tri.points();

    std::array::from_fn(|k| {
        let Some(nb) = triangle.neighbors[k] else {
            return -0.5;
        };
        let [a, b, c] = tri.triangles()[nb].vertices;
        let centroid = Point2::new(
            (pts[a].x + pts[b].x + pts[c].x) / 3.0,
            (pts[a].y + pts[b].y + pts[c].y) / 3.0,
        );
        let cb = tri.barycentric(t, centroid);
        match k {
            0 => (2.0 * cb[2] + cb[1] - 1.0) / (2.0 - 3.0 * cb[2] - 3.0 * cb[1]),
            1 => (2.0 * cb[0] + cb[2] - 1.0) / (2.0 - 3.0 * cb[0] - 3.0 * cb[2]),
            _ => (2.0 * cb[1] + cb[0] - 1.0) / (2.0 - 3.0 * cb[1] - 3.0 * cb[0]),
        }
    })
}

/// Estimate vertex gradients by minimizing edge curvature energy.
///
/// Gauss-Seidel sweeps over vertices; each solves a 2×2 system built from
/// its incident edges. Returns the gradients and the sweeps used. Vertices
/// without edges keep a zero gradient.
#[must_use]
pub fn estimate_gradients(tri: &Triangulation, values: &[f64]) -> (Vec<[f64; 2]>, usize) {
    let pts = tri.points();
    let mut grad = vec![[0.0_f64; 2]; pts.len()];

    for sweep in 0..GRADIENT_MAX_ITER {
        let mut err = 0.0_f64;

        for i in 0..pts.len() {
            let neighbors = tri.neighbors_of(i);
            if neighbors.is_empty() {
                continue;
            }

            let (mut q00, mut q01, mut q11) = (0.0, 0.0, 0.0);
            let (mut s0, mut s1) = (0.0, 0.0);
            for &j in neighbors {
                let ex = pts[j].x - pts[i].x;
                let ey = pts[j].y - pts[i].y;
                let l = ex.hypot(ey);
                let l3 = l * l * l;

                let df2 = -ex * grad[j][0] - ey * grad[j][1];
                let rhs = 6.0 * (values[i] - values[j]) - 2.0 * df2;

                q00 += 4.0 * ex * ex / l3;
                q01 += 4.0 * ex * ey / l3;
                q11 += 4.0 * ey * ey / l3;
                s0 += rhs * ex / l3;
                s1 += rhs * ey / l3;
            }

            let det = q00 * q11 - q01 * q01;
            let r0 = (q11 * s0 - q01 * s1) / det;
            let r1 = (-q01 * s0 + q00 * s1) / det;

            let change = (grad[i][0] + r0).abs().max((grad[i][1] + r1).abs());
            grad[i] = [-r0, -r1];
            err = err.max(change / 1.0_f64.max(r0.abs().max(r1.abs())));
        }

        if err < GRADIENT_TOLERANCE {
            return (grad, sweep + 1);
        }
    }

    (grad, GRADIENT_MAX_ITER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rootstar_topo_core::types::SensorLayout2D;

    fn scattered_points() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.45, 0.55),
            Point2::new(0.2, 0.7),
            Point2::new(0.8, 0.3),
            Point2::new(0.6, 0.9),
            Point2::new(0.3, 0.15),
        ]
    }

    fn plan_for(points: &[Point2], n: usize) -> InterpolationPlan {
        let bounds = SensorLayout2D::new(points.to_vec()).bounding_box().unwrap();
        InterpolationPlan::new(points, Grid::new(bounds, n).unwrap()).unwrap()
    }

    #[test]
    fn test_grid_spans_bounds() {
        let bounds = BoundingBox { min_x: -1.0, max_x: 1.0, min_y: 0.0, max_y: 4.0 };
        let grid = Grid::new(bounds, 5).unwrap();
        assert_eq!(grid.cell_count(), 25);
        assert_eq!(grid.point(0, 0), Point2::new(-1.0, 0.0));
        assert_eq!(grid.point(4, 4), Point2::new(1.0, 4.0));
        assert_eq!(grid.point_at(7), grid.point(1, 2));
        assert_eq!(grid.nearest_cell(Point2::new(0.05, 2.9)), (2, 3));
        assert_eq!(grid.nearest_cell(Point2::new(9.0, -9.0)), (4, 0));
    }

    #[test]
    fn test_degenerate_grid_rejected() {
        let bounds = BoundingBox { min_x: 0.0, max_x: 0.0, min_y: 0.0, max_y: 1.0 };
        assert!(Grid::new(bounds, 4).is_err());
    }

    #[test]
    fn test_constant_field_reproduced() {
        let pts = scattered_points();
        let plan = plan_for(&pts, 9);
        let out = plan.interpolate(&vec![2.5; pts.len()]);
        for v in out {
            assert_abs_diff_eq!(v, 2.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_linear_field_reproduced() {
        let pts = scattered_points();
        let plan = plan_for(&pts, 11);
        let values: Vec<f64> = pts.iter().map(|p| 2.0 * p.x - 3.0 * p.y + 1.0).collect();

        let (grad, _) = estimate_gradients(plan.triangulation(), &values);
        for g in &grad {
            assert_abs_diff_eq!(g[0], 2.0, epsilon = 1e-4);
            assert_abs_diff_eq!(g[1], -3.0, epsilon = 1e-4);
        }

        let out = plan.interpolate(&values);
        for (cell, v) in out.iter().enumerate() {
            let p = plan.grid().point_at(cell);
            assert_abs_diff_eq!(*v, 2.0 * p.x - 3.0 * p.y + 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_vertices_are_interpolated_exactly() {
        let pts = scattered_points();
        let plan = plan_for(&pts, 3);
        let values: Vec<f64> = (0..pts.len()).map(|i| (i as f64).sin()).collect();
        let out = plan.interpolate(&values);

        // Grid corners coincide with the unit-square corners
        assert_abs_diff_eq!(out[0], values[0], epsilon = 1e-9);
        assert_abs_diff_eq!(out[2], values[2], epsilon = 1e-9);
        assert_abs_diff_eq!(out[6], values[1], epsilon = 1e-9);
        assert_abs_diff_eq!(out[8], values[3], epsilon = 1e-9);
    }

    #[test]
    fn test_outside_hull_is_undefined() {
        let pts = vec![
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(-1.0, 0.0),
            Point2::new(0.0, -1.0),
        ];
        let plan = plan_for(&pts, 21);
        let out = plan.interpolate(&[1.0, 2.0, 3.0, 4.0]);

        for (cell, v) in out.iter().enumerate() {
            let p = plan.grid().point_at(cell);
            if p.x.abs() + p.y.abs() > 1.0 + 1e-9 {
                assert!(v.is_nan(), "cell {cell} at {p:?} should be undefined");
            } else if p.x.abs() + p.y.abs() < 1.0 - 1e-9 {
                assert!(v.is_finite(), "cell {cell} at {p:?} should be defined");
            }
        }
    }

    #[test]
    fn test_interpolation_is_deterministic() {
        let pts = scattered_points();
        let plan = plan_for(&pts, 16);
        let values: Vec<f64> = (0..pts.len()).map(|i| (i as f64 * 1.3).cos() * 4.0).collect();

        let a = plan.interpolate(&values);
        let b = plan.interpolate(&values);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn test_smooth_field_is_accurate() {
        // Denser layout for a curved field
        let pts: Vec<Point2> = (0..7)
            .flat_map(|i| (0..7).map(move |j| (i, j)))
            .map(|(i, j)| {
                let jitter = if (i + j) % 2 == 0 { 0.02 } else { -0.02 };
                let x = f64::from(i) / 6.0;
                let y = f64::from(j) / 6.0;
                let on_edge = i == 0 || i == 6 || j == 0 || j == 6;
                if on_edge { Point2::new(x, y) } else { Point2::new(x + jitter, y - jitter) }
            })
            .collect();
        let field = |p: &Point2| (p.x * 2.0).sin() + p.y * p.y;
        let values: Vec<f64> = pts.iter().map(field).collect();

        let plan = plan_for(&pts, 13);
        let out = plan.interpolate(&values);
        for (cell, v) in out.iter().enumerate() {
            let p = plan.grid().point_at(cell);
            assert_abs_diff_eq!(*v, field(&p), epsilon = 5e-2);
        }
    }
}
