// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner extraction — turns an edge field into the four ordered corners of the
// photographed page.
//
// ## Pipeline
//
// 1. Threshold the edge field into a point set
// 2. Graham-scan convex hull of the point set
// 3. Douglas-Peucker simplification with a growing tolerance until at most
//    four vertices remain (farthest-from-centre selection as a last resort)
// 4. Canonical top-left / top-right / bottom-right / bottom-left ordering

use std::cmp::Ordering;

use image::GrayImage;
use inksign_core::config::ScanConfig;
use inksign_core::error::{InksignError, Result};
use inksign_core::types::{Point, Quadrilateral};
use tracing::{debug, instrument};

/// Locate the document quadrilateral in an edge field.
///
/// Detection misses are reported as `InsufficientEdgeSignal` or
/// `NoQuadrilateral`; see [`InksignError::is_detection_miss`].
#[instrument(skip(edges, config), fields(width = edges.width(), height = edges.height()))]
pub fn find_corners(edges: &GrayImage, config: &ScanConfig) -> Result<Quadrilateral> {
    let (width, height) = edges.dimensions();

    let points = edge_points(edges, config.edge_threshold);
    debug!(edge_points = points.len(), "Edge field thresholded");
    if points.len() < config.min_edge_points {
        return Err(InksignError::InsufficientEdgeSignal {
            found: points.len(),
            required: config.min_edge_points,
        });
    }

    let hull = convex_hull(&points);
    debug!(hull_vertices = hull.len(), "Convex hull built");
    if hull.len() < 3 {
        return Err(InksignError::NoQuadrilateral(format!(
            "convex hull has only {} vertices",
            hull.len()
        )));
    }

    let corners = simplify_to_quad(&hull, config, width, height);
    let corners: [Point; 4] = corners.try_into().map_err(|rest: Vec<Point>| {
        InksignError::NoQuadrilateral(format!(
            "simplification left {} vertices instead of 4",
            rest.len()
        ))
    })?;

    Ok(Quadrilateral::from_unordered(corners))
}

/// Coordinates of every pixel whose magnitude exceeds `threshold`.
pub fn edge_points(edges: &GrayImage, threshold: u8) -> Vec<Point> {
    edges
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > threshold)
        .map(|(x, y, _)| Point::new(x as f64, y as f64))
        .collect()
}

/// Z component of `(a - o) x (b - o)`.
///
/// Positive when `o -> a -> b` turns counter-clockwise in a y-up frame, which
/// is clockwise on screen where y grows downward.
#[inline]
fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Graham-scan convex hull.
///
/// The pivot is the point with the largest y (smallest x on ties). The
/// returned vertices start at the pivot and wind clockwise on screen; every
/// consecutive triple, including the wrap-around, has `cross > 0`. Collinear
/// points are dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let Some(pivot) = points.iter().copied().reduce(|best, p| {
        if p.y > best.y || (p.y == best.y && p.x < best.x) {
            p
        } else {
            best
        }
    }) else {
        return Vec::new();
    };

    let mut rest: Vec<Point> = points.iter().copied().filter(|p| *p != pivot).collect();

    // Every other point lies above the pivot or level with it to the right,
    // so all polar angles fall in a half-turn and the cross product is a
    // total order on them. Equal angles go nearest first.
    rest.sort_by(|a, b| {
        let turn = cross(pivot, *a, *b);
        if turn > 0.0 {
            Ordering::Less
        } else if turn < 0.0 {
            Ordering::Greater
        } else {
            pivot.distance(a).total_cmp(&pivot.distance(b))
        }
    });

    let mut hull: Vec<Point> = Vec::with_capacity(rest.len() + 1);
    hull.push(pivot);
    for p in rest {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }

    // Close the loop back onto the pivot.
    while hull.len() >= 3 && cross(hull[hull.len() - 2], hull[hull.len() - 1], pivot) <= 0.0 {
        hull.pop();
    }

    hull
}

/// Reduce a hull to at most four vertices.
///
/// Hulls of four or fewer vertices are returned as-is. Otherwise the hull is
/// simplified as a closed ring (pivot repeated at the end) over the epsilon
/// sweep of `config`; if more than four vertices survive the largest
/// tolerance, the four farthest from the image centre are kept. The result
/// may hold fewer than four points.
pub fn simplify_to_quad(
    hull: &[Point],
    config: &ScanConfig,
    width: u32,
    height: u32,
) -> Vec<Point> {
    if hull.len() <= 4 {
        return hull.to_vec();
    }

    let mut ring = Vec::with_capacity(hull.len() + 1);
    ring.extend_from_slice(hull);
    ring.push(hull[0]);

    let mut simplified = hull.to_vec();
    for epsilon in config.epsilon_sweep() {
        simplified = douglas_peucker(&ring, epsilon);
        // The closing pivot duplicates the first vertex.
        simplified.pop();
        debug!(epsilon, vertices = simplified.len(), "Hull simplified");
        if simplified.len() <= 4 {
            break;
        }
    }

    if simplified.len() > 4 {
        let center = Point::new(width as f64 / 2.0, height as f64 / 2.0);
        simplified.sort_by(|a, b| b.distance(&center).total_cmp(&a.distance(&center)));
        simplified.truncate(4);
        debug!("Kept the four vertices farthest from the image centre");
    }

    simplified
}

/// Douglas-Peucker simplification of a polyline.
///
/// Keeps both endpoints; a closed ring is passed with its first point
/// repeated at the end. Works on index ranges of the input slice and marks
/// the survivors instead of building intermediate sequences.
pub fn douglas_peucker(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;
    mark_survivors(points, 0, last, epsilon, &mut keep);

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, kept)| kept.then_some(*p))
        .collect()
}

fn mark_survivors(points: &[Point], start: usize, end: usize, epsilon: f64, keep: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let (a, b) = (points[start], points[end]);
    let mut max_distance = 0.0;
    let mut split = start;
    for (i, p) in points.iter().enumerate().take(end).skip(start + 1) {
        let d = perpendicular_distance(*p, a, b);
        if d > max_distance {
            max_distance = d;
            split = i;
        }
    }

    if max_distance > epsilon {
        keep[split] = true;
        mark_survivors(points, start, split, epsilon, keep);
        mark_survivors(points, split, end, epsilon, keep);
    }
}

/// Distance from `p` to the infinite line through `a` and `b`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let length = a.distance(&b);
    if length == 0.0 {
        return p.distance(&a);
    }
    cross(a, b, p).abs() / length
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn assert_near(actual: Point, expected: Point, tol: f64) {
        assert!(
            actual.distance(&expected) <= tol,
            "expected {:?} within {} of {:?}",
            actual,
            tol,
            expected
        );
    }

    /// Regular-ish octagon centred on `(c, c)`.
    fn octagon(c: f64) -> Vec<Point> {
        vec![
            p(c - 60.0, c + 150.0),
            p(c - 150.0, c + 60.0),
            p(c - 150.0, c - 60.0),
            p(c - 60.0, c - 150.0),
            p(c + 60.0, c - 150.0),
            p(c + 150.0, c - 60.0),
            p(c + 150.0, c + 60.0),
            p(c + 60.0, c + 150.0),
        ]
    }

    /// Every consecutive triple (wrapping around) turns the same way.
    fn assert_consistently_wound(hull: &[Point]) {
        let n = hull.len();
        for i in 0..n {
            let turn = cross(hull[i], hull[(i + 1) % n], hull[(i + 2) % n]);
            assert!(turn > 0.0, "turn at vertex {} is {}", (i + 1) % n, turn);
        }
    }

    #[test]
    fn hull_of_square_with_interior_points() {
        let mut points = vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)];
        for x in 1..10 {
            for y in 1..10 {
                points.push(p(x as f64, y as f64));
            }
        }
        // Collinear points on an edge must not become vertices.
        points.push(p(5.0, 0.0));
        points.push(p(0.0, 5.0));
        points.push(p(5.0, 10.0));

        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        assert_eq!(hull[0], p(0.0, 10.0), "pivot is bottom-most, then left-most");
        assert_consistently_wound(&hull);
        for corner in [p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0)] {
            assert!(hull.contains(&corner));
        }
    }

    #[test]
    fn hull_size_is_bounded_and_wound() {
        // Deterministic scatter from a small linear congruential sequence.
        let mut state: u64 = 0x2545_f491;
        let mut points = Vec::new();
        for _ in 0..200 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let x = ((state >> 33) % 500) as f64;
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let y = ((state >> 33) % 300) as f64;
            points.push(p(x, y));
        }
        let hull = convex_hull(&points);
        assert!(hull.len() >= 3 && hull.len() <= points.len());
        assert_consistently_wound(&hull);
        // Every input point lies inside or on the hull.
        let n = hull.len();
        for q in &points {
            for i in 0..n {
                assert!(cross(hull[i], hull[(i + 1) % n], *q) >= 0.0);
            }
        }
    }

    #[test]
    fn hull_of_triangle_keeps_all_three() {
        let hull = convex_hull(&[p(0.0, 0.0), p(4.0, 8.0), p(8.0, 1.0)]);
        assert_eq!(hull.len(), 3);
        assert_consistently_wound(&hull);
    }

    #[test]
    fn collinear_points_collapse() {
        let points: Vec<Point> = (0..20).map(|i| p(i as f64, 2.0 * i as f64)).collect();
        assert!(convex_hull(&points).len() < 3);
    }

    #[test]
    fn douglas_peucker_drops_small_wiggles() {
        let line = vec![p(0.0, 0.0), p(10.0, 1.0), p(20.0, -1.0), p(30.0, 0.0)];
        assert_eq!(douglas_peucker(&line, 5.0), vec![p(0.0, 0.0), p(30.0, 0.0)]);
    }

    #[test]
    fn douglas_peucker_keeps_real_corners() {
        let path = vec![
            p(0.0, 100.0),
            p(0.0, 50.0),
            p(1.0, 0.0),
            p(50.0, 1.0),
            p(100.0, 0.0),
            p(100.0, 100.0),
        ];
        let simplified = douglas_peucker(&path, 10.0);
        assert_eq!(
            simplified,
            vec![p(0.0, 100.0), p(1.0, 0.0), p(100.0, 0.0), p(100.0, 100.0)]
        );
    }

    #[test]
    fn small_hull_is_used_directly() {
        let hull = vec![p(0.0, 9.0), p(0.0, 0.0), p(9.0, 0.0)];
        let out = simplify_to_quad(&hull, &ScanConfig::default(), 10, 10);
        assert_eq!(out, hull);
    }

    #[test]
    fn octagon_falls_back_to_farthest_points() {
        // Every vertex deviates far more than the largest tolerance, so the
        // farthest-point rule has to pick four of the eight.
        let hull = octagon(200.0);
        let config = ScanConfig {
            epsilon_max: 10.0,
            ..ScanConfig::default()
        };
        let out = simplify_to_quad(&hull, &config, 400, 400);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn ring_simplification_drops_pivot_neighbour() {
        // The last hull vertex is a rasterisation step a few pixels from the
        // pivot, on the same page corner. It must not survive as a fifth
        // vertex.
        let hull = vec![
            p(100.0, 400.0),
            p(90.0, 250.0),
            p(80.0, 100.0),
            p(300.0, 90.0),
            p(420.0, 380.0),
            p(106.0, 399.0),
        ];
        let out = simplify_to_quad(&hull, &ScanConfig::default(), 600, 600);
        assert_eq!(out, vec![p(100.0, 400.0), p(80.0, 100.0), p(300.0, 90.0), p(420.0, 380.0)]);
    }

    #[test]
    fn unvalidated_epsilon_step_still_terminates() {
        let hull = octagon(200.0);
        for step in [0.0, 1e-300] {
            let config = ScanConfig {
                epsilon_step: step,
                ..ScanConfig::default()
            };
            assert_eq!(simplify_to_quad(&hull, &config, 400, 400).len(), 4);
        }
    }

    #[test]
    fn too_few_edge_points_is_a_detection_miss() {
        let mut edges = GrayImage::new(50, 50);
        for x in 0..50 {
            edges.put_pixel(x, 25, Luma([200]));
        }
        let err = find_corners(&edges, &ScanConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            InksignError::InsufficientEdgeSignal { found: 50, required: 100 }
        ));
        assert!(err.is_detection_miss());
    }

    #[test]
    fn threshold_is_strict() {
        let edges = GrayImage::from_fn(20, 20, |x, _| if x < 10 { Luma([50]) } else { Luma([51]) });
        assert_eq!(edge_points(&edges, 50).len(), 200);
    }

    #[test]
    fn rectangle_outline_yields_its_corners() {
        let mut edges = GrayImage::new(300, 400);
        for x in 50..=250 {
            edges.put_pixel(x, 60, Luma([255]));
            edges.put_pixel(x, 340, Luma([255]));
        }
        for y in 60..=340 {
            edges.put_pixel(50, y, Luma([255]));
            edges.put_pixel(250, y, Luma([255]));
        }

        let quad = find_corners(&edges, &ScanConfig::default()).unwrap();
        assert_eq!(quad.top_left(), p(50.0, 60.0));
        assert_eq!(quad.top_right(), p(250.0, 60.0));
        assert_eq!(quad.bottom_right(), p(250.0, 340.0));
        assert_eq!(quad.bottom_left(), p(50.0, 340.0));
    }

    #[test]
    fn skewed_outline_yields_ordered_corners() {
        let corners = [p(40.0, 30.0), p(360.0, 50.0), p(350.0, 580.0), p(50.0, 580.0)];
        let mut edges = GrayImage::new(400, 600);
        for i in 0..4 {
            let (a, b) = (corners[i], corners[(i + 1) % 4]);
            let steps = a.distance(&b).ceil() as usize;
            for s in 0..=steps {
                let t = s as f64 / steps as f64;
                let x = (a.x + (b.x - a.x) * t).round() as u32;
                let y = (a.y + (b.y - a.y) * t).round() as u32;
                edges.put_pixel(x, y, Luma([255]));
            }
        }

        let quad = find_corners(&edges, &ScanConfig::default()).unwrap();
        for (found, expected) in quad.corners().iter().zip(corners) {
            assert_near(*found, expected, 3.0);
        }
    }
}
