// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Inksign scan pipeline.

use serde::{Deserialize, Serialize};

/// A 2D coordinate in image-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Lengths of the four sides of a quadrilateral, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLengths {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Four corners of a document in canonical order:
/// `[top_left, top_right, bottom_right, bottom_left]`.
///
/// Every downstream consumer relies on that order. Use
/// [`Quadrilateral::from_unordered`] when the order is not already known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral(pub [Point; 4]);

impl Quadrilateral {
    /// Wrap corners that are already in canonical order.
    pub const fn new(corners: [Point; 4]) -> Self {
        Self(corners)
    }

    /// The full bounds of a `width` x `height` image:
    /// `[(0,0), (w,0), (w,h), (0,h)]`.
    pub fn from_image_bounds(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self([
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ])
    }

    /// Put four arbitrary points into canonical order.
    ///
    /// Points are split by y into a top pair and a bottom pair, then each
    /// pair is sorted by x. No convexity check is made: a malformed point set
    /// yields a malformed (but ordered) quadrilateral.
    pub fn from_unordered(points: [Point; 4]) -> Self {
        let mut by_y = points;
        by_y.sort_by(|a, b| a.y.total_cmp(&b.y));

        let mut top = [by_y[0], by_y[1]];
        let mut bottom = [by_y[2], by_y[3]];
        top.sort_by(|a, b| a.x.total_cmp(&b.x));
        bottom.sort_by(|a, b| a.x.total_cmp(&b.x));

        Self([top[0], top[1], bottom[1], bottom[0]])
    }

    pub fn top_left(&self) -> Point {
        self.0[0]
    }

    pub fn top_right(&self) -> Point {
        self.0[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.0[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.0[3]
    }

    pub fn corners(&self) -> &[Point; 4] {
        &self.0
    }

    pub fn edge_lengths(&self) -> EdgeLengths {
        let [tl, tr, br, bl] = self.0;
        EdgeLengths {
            top: tl.distance(&tr),
            right: tr.distance(&br),
            bottom: bl.distance(&br),
            left: tl.distance(&bl),
        }
    }
}

/// Standard paper sizes for exported documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

impl std::str::FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "a5" => Ok(Self::A5),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            other => Err(format!("unknown paper size '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn ordering_is_canonical_for_shuffled_corners() {
        let quad = Quadrilateral::from_unordered([
            p(350.0, 580.0),
            p(40.0, 30.0),
            p(50.0, 560.0),
            p(360.0, 50.0),
        ]);
        assert_eq!(quad.top_left(), p(40.0, 30.0));
        assert_eq!(quad.top_right(), p(360.0, 50.0));
        assert_eq!(quad.bottom_right(), p(350.0, 580.0));
        assert_eq!(quad.bottom_left(), p(50.0, 560.0));
    }

    #[test]
    fn ordering_invariant_holds_for_rotated_quads() {
        // A square rotated through a range of angles about (200, 200).
        for step in 0..36 {
            let angle = (step as f64) * 2.5_f64.to_radians();
            let corners: Vec<Point> = (0..4)
                .map(|k| {
                    let a = angle + k as f64 * std::f64::consts::FRAC_PI_2;
                    p(200.0 + 120.0 * a.cos(), 200.0 + 80.0 * a.sin())
                })
                .collect();
            let quad = Quadrilateral::from_unordered([corners[0], corners[1], corners[2], corners[3]]);
            assert!(quad.top_left().y <= quad.bottom_left().y);
            assert!(quad.top_left().x <= quad.top_right().x);
            assert!(quad.bottom_left().x <= quad.bottom_right().x);
        }
    }

    #[test]
    fn image_bounds_quad() {
        let quad = Quadrilateral::from_image_bounds(400, 600);
        assert_eq!(quad.corners()[2], p(400.0, 600.0));
        let edges = quad.edge_lengths();
        assert_eq!(edges.top, 400.0);
        assert_eq!(edges.left, 600.0);
    }

    #[test]
    fn quad_round_trips_through_json() {
        let quad = Quadrilateral::from_image_bounds(10, 20);
        let json = serde_json::to_string(&quad).unwrap();
        let back: Quadrilateral = serde_json::from_str(&json).unwrap();
        assert_eq!(quad, back);
    }

    #[test]
    fn paper_size_parses_case_insensitively() {
        assert_eq!("Letter".parse::<PaperSize>(), Ok(PaperSize::Letter));
        assert!("b5".parse::<PaperSize>().is_err());
    }
}
