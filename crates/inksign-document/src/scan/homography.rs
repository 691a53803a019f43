// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective transform between the detected page quadrilateral and the
// output rectangle.

use inksign_core::error::{InksignError, Result};
use inksign_core::types::{Point, Quadrilateral};
use tracing::{debug, instrument};

/// Pivots smaller than this fraction of the largest system coefficient are
/// treated as zero.
const PIVOT_EPSILON: f64 = 1e-12;

/// `|det(H)|` below this fraction of the product of its row norms means the
/// map collapses the plane onto a line.
const SINGULAR_RATIO: f64 = 1e-9;

/// A projective map stored as a row-major 3x3 matrix with `h[8] == 1`.
///
/// It maps *destination* (output rectangle) coordinates to *source* image
/// coordinates, which is the direction the rectifier needs for every output
/// pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography([f64; 9]);

impl Homography {
    pub const IDENTITY: Self = Self([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    /// Solve for the map taking each corner of `dest` to the matching corner
    /// of `source`.
    ///
    /// Both quadrilaterals must be in canonical order. Collinear
    /// correspondences give `DegenerateGeometry`; convexity is not checked.
    #[instrument]
    pub fn solve(source: &Quadrilateral, dest: &Quadrilateral) -> Result<Self> {
        let mut a = [[0.0f64; 8]; 8];
        let mut b = [0.0f64; 8];

        for (i, (d, s)) in dest.corners().iter().zip(source.corners()).enumerate() {
            let (x, y) = (d.x, d.y);
            let (u, v) = (s.x, s.y);
            // u * (h6 x + h7 y + 1) = h0 x + h1 y + h2
            a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u];
            b[2 * i] = u;
            // v * (h6 x + h7 y + 1) = h3 x + h4 y + h5
            a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v];
            b[2 * i + 1] = v;
        }

        let h = solve_linear_system(a, b)?;
        let homography = Self([h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0]);
        homography.ensure_invertible()?;

        debug!(coefficients = ?homography.0, "Homography solved");
        Ok(homography)
    }

    /// Row-major coefficients.
    pub fn coefficients(&self) -> &[f64; 9] {
        &self.0
    }

    /// Map a destination point into the source image.
    ///
    /// A zero denominator (point on the line at infinity) maps to itself.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> Point {
        let h = &self.0;
        let w = h[6] * x + h[7] * y + h[8];
        if w == 0.0 {
            return Point::new(x, y);
        }
        Point::new(
            (h[0] * x + h[1] * y + h[2]) / w,
            (h[3] * x + h[4] * y + h[5]) / w,
        )
    }

    fn determinant(&self) -> f64 {
        let h = &self.0;
        h[0] * (h[4] * h[8] - h[5] * h[7]) - h[1] * (h[3] * h[8] - h[5] * h[6])
            + h[2] * (h[3] * h[7] - h[4] * h[6])
    }

    fn ensure_invertible(&self) -> Result<()> {
        if self.0.iter().any(|c| !c.is_finite()) {
            return Err(InksignError::DegenerateGeometry(
                "homography has non-finite coefficients".into(),
            ));
        }
        let row_norm = |r: usize| self.0[3 * r..3 * r + 3].iter().map(|c| c * c).sum::<f64>().sqrt();
        // Hadamard's bound: |det| never exceeds the product of the row norms.
        let bound = row_norm(0) * row_norm(1) * row_norm(2);
        let det = self.determinant();
        if det.abs() <= SINGULAR_RATIO * bound {
            return Err(InksignError::DegenerateGeometry(format!(
                "homography is singular (det = {det:e})"
            )));
        }
        Ok(())
    }
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
///
/// At every column the row with the largest absolute entry is swapped into the
/// pivot position before eliminating below it; back-substitution follows.
pub(crate) fn solve_linear_system(mut a: [[f64; 8]; 8], mut b: [f64; 8]) -> Result<[f64; 8]> {
    const N: usize = 8;

    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0f64, |m, v| m.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(InksignError::DegenerateGeometry(
            "linear system has no usable coefficients".into(),
        ));
    }
    let tolerance = PIVOT_EPSILON * scale;

    for col in 0..N {
        let mut pivot_row = col;
        for row in col + 1..N {
            if a[row][col].abs() > a[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        if a[pivot_row][col].abs() <= tolerance {
            return Err(InksignError::DegenerateGeometry(format!(
                "singular system: no pivot in column {col}"
            )));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..N {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..N {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; N];
    for row in (0..N).rev() {
        let mut sum = b[row];
        for k in row + 1..N {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    Ok(x)
}
