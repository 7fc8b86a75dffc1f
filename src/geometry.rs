//! Coordinate and curve math shared by every adapter.
//!
//! All positions, dimensions, font sizes and offsets in the IR are
//! two-part `RelAbsVector` values (absolute part plus a percentage of the
//! parent extent). `RelAbsVector::resolve` is the single place that
//! composition happens; every shape translator goes through it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Two-part coordinate: `abs + rel% of parent`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelAbsVector {
    pub abs: f64,
    pub rel: f64,
}

impl RelAbsVector {
    pub fn new(abs: f64, rel: f64) -> Self {
        Self { abs, rel }
    }

    pub fn absolute(abs: f64) -> Self {
        Self { abs, rel: 0.0 }
    }

    pub fn relative(rel: f64) -> Self {
        Self { abs: 0.0, rel }
    }

    /// Compose the two parts against a parent extent.
    pub fn resolve(&self, parent: f64) -> f64 {
        self.abs + 0.01 * self.rel * parent
    }

    /// Parse the SBML render textual form: `"10"`, `"50%"`, `"10+50%"`,
    /// `"10-50%"`. Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(stripped) = trimmed.strip_suffix('%') {
            // Either "rel%" or "abs+rel%" / "abs-rel%".
            if let Some(idx) = split_operator(stripped) {
                let abs: f64 = stripped[..idx].trim().parse().ok()?;
                let rel: f64 = stripped[idx..].trim().parse().ok()?;
                return Some(Self { abs, rel });
            }
            let rel: f64 = stripped.trim().parse().ok()?;
            return Some(Self { abs: 0.0, rel });
        }
        let abs: f64 = trimmed.parse().ok()?;
        Some(Self { abs, rel: 0.0 })
    }

    /// Render in the SBML textual form.
    pub fn to_sbml_string(&self) -> String {
        if self.rel == 0.0 {
            return format_number(self.abs);
        }
        if self.abs == 0.0 {
            return format!("{}%", format_number(self.rel));
        }
        if self.rel < 0.0 {
            format!("{}{}%", format_number(self.abs), format_number(self.rel))
        } else {
            format!("{}+{}%", format_number(self.abs), format_number(self.rel))
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1.0e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

// Index of the sign that separates "abs" from "rel", skipping a leading
// sign and exponent signs.
fn split_operator(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    for (idx, byte) in bytes.iter().enumerate().skip(1) {
        if *byte != b'+' && *byte != b'-' {
            continue;
        }
        let prev = bytes[idx - 1];
        if prev == b'e' || prev == b'E' {
            continue;
        }
        return Some(idx);
    }
    None
}

/// Expand a compact `{p1, p2}` chord-percentage descriptor into explicit
/// cubic control points. Percentages are per axis, relative to the chord
/// vector `end - start`.
pub fn expand_base_points(p1: Point, p2: Point, start: Point, end: Point) -> (Point, Point) {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let base1 = Point::new(start.x + 0.01 * p1.x * dx, start.y + 0.01 * p1.y * dy);
    let base2 = Point::new(end.x + 0.01 * p2.x * dx, end.y + 0.01 * p2.y * dy);
    (base1, base2)
}

/// Inverse of [`expand_base_points`]: recover the chord-percentage
/// descriptor from explicit control points. An axis whose chord
/// projection is zero keeps its percentage at 0 rather than dividing by
/// zero.
pub fn compress_base_points(
    base1: Point,
    base2: Point,
    start: Point,
    end: Point,
) -> (Point, Point) {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let mut p1 = Point::default();
    let mut p2 = Point::default();
    if dx != 0.0 {
        p1.x = ((base1.x - start.x) / (0.01 * dx)).round();
        p2.x = ((base2.x - end.x) / (0.01 * dx)).round();
    }
    if dy != 0.0 {
        p1.y = ((base1.y - start.y) / (0.01 * dy)).round();
        p2.y = ((base2.y - end.y) / (0.01 * dy)).round();
    }
    (p1, p2)
}

/// Slope (radians) between two points.
pub fn slope_between(from: Point, to: Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Slope at a segment endpoint: towards the nearest control point when
/// that point is distinct from the endpoint, otherwise along the chord.
pub fn endpoint_slope(endpoint: Point, control: Option<Point>, other_end: Point) -> f64 {
    if let Some(control) = control {
        if control != endpoint {
            return slope_between(endpoint, control);
        }
    }
    slope_between(endpoint, other_end)
}

/// Evaluate a cubic Bézier at parameter `t`.
pub fn cubic_point(start: Point, base1: Point, base2: Point, end: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let x = u * u * u * start.x
        + 3.0 * u * u * t * base1.x
        + 3.0 * u * t * t * base2.x
        + t * t * t * end.x;
    let y = u * u * u * start.y
        + 3.0 * u * u * t * base1.y
        + 3.0 * u * t * t * base2.y
        + t * t * t * end.y;
    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_identities() {
        for parent in [0.0, 1.0, 37.5, 1200.0] {
            assert_eq!(RelAbsVector::absolute(4.5).resolve(parent), 4.5);
            assert_eq!(RelAbsVector::relative(100.0).resolve(parent), parent);
        }
        assert_eq!(RelAbsVector::new(10.0, 50.0).resolve(40.0), 30.0);
    }

    #[test]
    fn parse_textual_forms() {
        assert_eq!(
            RelAbsVector::parse("12.5"),
            Some(RelAbsVector::absolute(12.5))
        );
        assert_eq!(
            RelAbsVector::parse("50%"),
            Some(RelAbsVector::relative(50.0))
        );
        assert_eq!(
            RelAbsVector::parse("10+50%"),
            Some(RelAbsVector::new(10.0, 50.0))
        );
        assert_eq!(
            RelAbsVector::parse("10-50%"),
            Some(RelAbsVector::new(10.0, -50.0))
        );
        assert_eq!(
            RelAbsVector::parse("-3+20%"),
            Some(RelAbsVector::new(-3.0, 20.0))
        );
        assert_eq!(RelAbsVector::parse(""), None);
        assert_eq!(RelAbsVector::parse("abc"), None);
    }

    #[test]
    fn sbml_string_round_trip() {
        for value in [
            RelAbsVector::absolute(7.0),
            RelAbsVector::relative(35.0),
            RelAbsVector::new(2.0, -40.0),
            RelAbsVector::new(-1.5, 12.0),
        ] {
            let text = value.to_sbml_string();
            assert_eq!(RelAbsVector::parse(&text), Some(value), "{text}");
        }
    }

    #[test]
    fn base_point_round_trip() {
        let start = Point::new(10.0, 20.0);
        let end = Point::new(110.0, 60.0);
        let p1 = Point::new(25.0, -40.0);
        let p2 = Point::new(-15.0, 60.0);
        let (base1, base2) = expand_base_points(p1, p2, start, end);
        let (q1, q2) = compress_base_points(base1, base2, start, end);
        assert_eq!(q1, p1);
        assert_eq!(q2, p2);
    }

    #[test]
    fn compress_guards_zero_chord_axis() {
        let start = Point::new(10.0, 20.0);
        let end = Point::new(10.0, 80.0);
        let (p1, p2) = compress_base_points(
            Point::new(40.0, 35.0),
            Point::new(40.0, 65.0),
            start,
            end,
        );
        assert_eq!(p1.x, 0.0);
        assert_eq!(p2.x, 0.0);
        assert_eq!(p1.y, 25.0);
        assert_eq!(p2.y, -25.0);
    }

    #[test]
    fn endpoint_slope_prefers_distinct_control() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(10.0, 0.0);
        let slope = endpoint_slope(start, Some(Point::new(0.0, 5.0)), end);
        assert!((slope - std::f64::consts::FRAC_PI_2).abs() < 1.0e-9);
        // Coincident control point falls back to the chord.
        let slope = endpoint_slope(start, Some(start), end);
        assert_eq!(slope, 0.0);
        let slope = endpoint_slope(start, None, end);
        assert_eq!(slope, 0.0);
    }

    #[test]
    fn cubic_midpoint_of_straight_chord() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(8.0, 4.0);
        let mid = cubic_point(
            start,
            Point::new(2.0, 1.0),
            Point::new(6.0, 3.0),
            end,
            0.5,
        );
        assert!((mid.x - 4.0).abs() < 1.0e-9);
        assert!((mid.y - 2.0).abs() < 1.0e-9);
    }
}
