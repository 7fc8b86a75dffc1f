//! Per-shape geometry translators.
//!
//! Each function turns a relative shape descriptor plus a bounding box
//! into absolute drawing coordinates. An optional offset shifts the whole
//! shape (line-endings are placed this way, at a curve endpoint); the
//! rotation pivot for a shape is the offset point when an offset and a
//! non-zero slope are supplied, otherwise the shape's own center.

use crate::geometry::{Point, RelAbsVector};
use crate::ir::{
    BoundingBox, EllipseShape, HTextAnchor, ImageShape, PolygonShape, RectangleShape,
    RenderCurveShape, RenderVertex, TextShape, VTextAnchor,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub cx: f64,
    pub cy: f64,
    /// Radians.
    pub angle: f64,
}

/// Rotation applied by rendering adapters: about the offset point when an
/// offset accompanies a non-zero slope, else about the shape center.
pub fn shape_rotation(offset: Option<Point>, slope: f64, center: Point) -> Option<Rotation> {
    if slope == 0.0 {
        return None;
    }
    let pivot = offset.unwrap_or(center);
    Some(Rotation {
        cx: pivot.x,
        cy: pivot.y,
        angle: slope,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcreteRectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rx: f64,
    pub ry: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcreteEllipse {
    pub cx: f64,
    pub cy: f64,
    pub rx: f64,
    pub ry: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcreteVertex {
    pub point: Point,
    pub base_point1: Option<Point>,
    pub base_point2: Option<Point>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConcretePath {
    pub vertices: Vec<ConcreteVertex>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcreteImage {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcreteText {
    pub x: f64,
    pub y: f64,
    pub font_size: Option<f64>,
    pub h_anchor: HTextAnchor,
    pub v_anchor: VTextAnchor,
}

fn resolve_or(value: Option<RelAbsVector>, parent: f64, default: RelAbsVector) -> f64 {
    value.unwrap_or(default).resolve(parent)
}

/// Resolve a rectangle against its bounding box. A positive `ratio`
/// (width/height) shrinks the oversized dimension and re-centers along
/// that axis; corner radii resolve against the half-sum of the emitted
/// width and height.
pub fn rectangle_geometry(
    shape: &RectangleShape,
    bbox: &BoundingBox,
    offset_x: f64,
    offset_y: f64,
) -> ConcreteRectangle {
    let mut x = bbox.x + offset_x + resolve_or(shape.x, bbox.width, RelAbsVector::relative(0.0));
    let mut y = bbox.y + offset_y + resolve_or(shape.y, bbox.height, RelAbsVector::relative(0.0));
    let mut width = resolve_or(shape.width, bbox.width, RelAbsVector::relative(100.0));
    let mut height = resolve_or(shape.height, bbox.height, RelAbsVector::relative(100.0));

    if let Some(ratio) = shape.ratio {
        if ratio > 0.0 && height > 0.0 {
            if width / height > ratio {
                let constrained = ratio * height;
                x += 0.5 * (width - constrained);
                width = constrained;
            } else {
                let constrained = width / ratio;
                y += 0.5 * (height - constrained);
                height = constrained;
            }
        }
    }

    let radius_parent = 0.5 * (width + height);
    let rx = resolve_or(shape.rx, radius_parent, RelAbsVector::absolute(0.0));
    let ry = resolve_or(shape.ry, radius_parent, RelAbsVector::absolute(0.0));
    ConcreteRectangle {
        x,
        y,
        width,
        height,
        rx,
        ry,
    }
}

/// Resolve an ellipse; the ratio correction applies to the radii the same
/// way it applies to rectangle dimensions.
pub fn ellipse_geometry(
    shape: &EllipseShape,
    bbox: &BoundingBox,
    offset_x: f64,
    offset_y: f64,
) -> ConcreteEllipse {
    let cx = bbox.x + offset_x + resolve_or(shape.cx, bbox.width, RelAbsVector::relative(50.0));
    let cy = bbox.y + offset_y + resolve_or(shape.cy, bbox.height, RelAbsVector::relative(50.0));
    let mut rx = resolve_or(shape.rx, bbox.width, RelAbsVector::relative(50.0));
    let mut ry = resolve_or(shape.ry, bbox.height, RelAbsVector::relative(50.0));

    if let Some(ratio) = shape.ratio {
        if ratio > 0.0 && ry > 0.0 {
            if rx / ry > ratio {
                rx = ratio * ry;
            } else {
                ry = rx / ratio;
            }
        }
    }

    ConcreteEllipse { cx, cy, rx, ry }
}

fn resolve_vertex(
    vertex: &RenderVertex,
    bbox: &BoundingBox,
    offset_x: f64,
    offset_y: f64,
) -> ConcreteVertex {
    let resolve_pair = |pair: &(RelAbsVector, RelAbsVector)| {
        Point::new(
            bbox.x + offset_x + pair.0.resolve(bbox.width),
            bbox.y + offset_y + pair.1.resolve(bbox.height),
        )
    };
    ConcreteVertex {
        point: Point::new(
            bbox.x + offset_x + vertex.x.resolve(bbox.width),
            bbox.y + offset_y + vertex.y.resolve(bbox.height),
        ),
        base_point1: vertex.base_point1.as_ref().map(resolve_pair),
        base_point2: vertex.base_point2.as_ref().map(resolve_pair),
    }
}

/// Resolve polygon vertices, keeping per-edge Bézier control points.
pub fn polygon_geometry(
    shape: &PolygonShape,
    bbox: &BoundingBox,
    offset_x: f64,
    offset_y: f64,
) -> ConcretePath {
    ConcretePath {
        vertices: shape
            .vertices
            .iter()
            .map(|vertex| resolve_vertex(vertex, bbox, offset_x, offset_y))
            .collect(),
    }
}

/// Resolve a render-curve's vertices; same rules as polygons, but the
/// path is left open.
pub fn render_curve_geometry(
    shape: &RenderCurveShape,
    bbox: &BoundingBox,
    offset_x: f64,
    offset_y: f64,
) -> ConcretePath {
    ConcretePath {
        vertices: shape
            .vertices
            .iter()
            .map(|vertex| resolve_vertex(vertex, bbox, offset_x, offset_y))
            .collect(),
    }
}

pub fn image_geometry(
    shape: &ImageShape,
    bbox: &BoundingBox,
    offset_x: f64,
    offset_y: f64,
) -> ConcreteImage {
    ConcreteImage {
        x: bbox.x + offset_x + resolve_or(shape.x, bbox.width, RelAbsVector::relative(0.0)),
        y: bbox.y + offset_y + resolve_or(shape.y, bbox.height, RelAbsVector::relative(0.0)),
        width: resolve_or(shape.width, bbox.width, RelAbsVector::relative(100.0)),
        height: resolve_or(shape.height, bbox.height, RelAbsVector::relative(100.0)),
    }
}

/// Resolve a text placement. The anchor position is the bounding box
/// corner/center selected by the anchors; `x`/`y` shift it. Font size
/// resolves against the bounding box height.
pub fn text_geometry(
    shape: &TextShape,
    bbox: &BoundingBox,
    offset_x: f64,
    offset_y: f64,
) -> ConcreteText {
    let h_anchor = shape.h_text_anchor.unwrap_or(HTextAnchor::Middle);
    let v_anchor = shape.v_text_anchor.unwrap_or(VTextAnchor::Middle);
    let anchor_x = match h_anchor {
        HTextAnchor::Start => bbox.x,
        HTextAnchor::Middle => bbox.x + bbox.width / 2.0,
        HTextAnchor::End => bbox.x + bbox.width,
    };
    let anchor_y = match v_anchor {
        VTextAnchor::Top => bbox.y,
        VTextAnchor::Middle => bbox.y + bbox.height / 2.0,
        VTextAnchor::Bottom | VTextAnchor::Baseline => bbox.y + bbox.height,
    };
    ConcreteText {
        x: anchor_x + offset_x + resolve_or(shape.x, bbox.width, RelAbsVector::absolute(0.0)),
        y: anchor_y + offset_y + resolve_or(shape.y, bbox.height, RelAbsVector::absolute(0.0)),
        font_size: shape.font_size.map(|size| size.resolve(bbox.height)),
        h_anchor,
        v_anchor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(10.0, 20.0, 80.0, 40.0)
    }

    #[test]
    fn rectangle_defaults_fill_the_box() {
        let rect = rectangle_geometry(&RectangleShape::default(), &bbox(), 0.0, 0.0);
        assert_eq!(rect.x, 10.0);
        assert_eq!(rect.y, 20.0);
        assert_eq!(rect.width, 80.0);
        assert_eq!(rect.height, 40.0);
        assert_eq!(rect.rx, 0.0);
    }

    #[test]
    fn rectangle_ratio_shrinks_wide_box_and_recenters() {
        let shape = RectangleShape {
            ratio: Some(1.0),
            ..Default::default()
        };
        let rect = rectangle_geometry(&shape, &bbox(), 0.0, 0.0);
        assert!((rect.width / rect.height - 1.0).abs() < 1.0e-9);
        assert_eq!(rect.height, 40.0);
        assert_eq!(rect.width, 40.0);
        // Centered along the shrunk axis.
        assert_eq!(rect.x, 10.0 + (80.0 - 40.0) / 2.0);
        assert_eq!(rect.y, 20.0);
    }

    #[test]
    fn rectangle_ratio_shrinks_tall_box() {
        let shape = RectangleShape {
            ratio: Some(4.0),
            ..Default::default()
        };
        let rect = rectangle_geometry(&shape, &bbox(), 0.0, 0.0);
        assert!((rect.width / rect.height - 4.0).abs() < 1.0e-9);
        assert_eq!(rect.width, 80.0);
        assert_eq!(rect.height, 20.0);
        assert_eq!(rect.y, 20.0 + (40.0 - 20.0) / 2.0);
    }

    #[test]
    fn rectangle_corner_radius_resolves_against_half_sum() {
        let shape = RectangleShape {
            rx: Some(RelAbsVector::relative(10.0)),
            ..Default::default()
        };
        let rect = rectangle_geometry(&shape, &bbox(), 0.0, 0.0);
        // 10% of 0.5 * (80 + 40)
        assert!((rect.rx - 6.0).abs() < 1.0e-9);
    }

    #[test]
    fn ellipse_defaults_and_ratio() {
        let ellipse = ellipse_geometry(&EllipseShape::default(), &bbox(), 0.0, 0.0);
        assert_eq!(ellipse.cx, 50.0);
        assert_eq!(ellipse.cy, 40.0);
        assert_eq!(ellipse.rx, 40.0);
        assert_eq!(ellipse.ry, 20.0);

        let shape = EllipseShape {
            ratio: Some(1.0),
            ..Default::default()
        };
        let circle = ellipse_geometry(&shape, &bbox(), 0.0, 0.0);
        assert_eq!(circle.rx, circle.ry);
        assert_eq!(circle.rx, 20.0);
    }

    #[test]
    fn polygon_vertices_resolve_with_offset() {
        let shape = PolygonShape {
            vertices: vec![
                RenderVertex {
                    x: RelAbsVector::relative(0.0),
                    y: RelAbsVector::relative(50.0),
                    ..Default::default()
                },
                RenderVertex {
                    x: RelAbsVector::relative(100.0),
                    y: RelAbsVector::relative(50.0),
                    base_point1: Some((RelAbsVector::relative(50.0), RelAbsVector::relative(0.0))),
                    base_point2: Some((
                        RelAbsVector::relative(50.0),
                        RelAbsVector::relative(100.0),
                    )),
                },
            ],
            ..Default::default()
        };
        let path = polygon_geometry(&shape, &bbox(), 5.0, -5.0);
        assert_eq!(path.vertices[0].point, Point::new(15.0, 35.0));
        assert_eq!(path.vertices[1].point, Point::new(95.0, 35.0));
        assert_eq!(path.vertices[1].base_point1, Some(Point::new(55.0, 15.0)));
        assert_eq!(path.vertices[1].base_point2, Some(Point::new(55.0, 55.0)));
    }

    #[test]
    fn text_anchor_selection() {
        let shape = TextShape {
            v_text_anchor: Some(VTextAnchor::Top),
            h_text_anchor: Some(HTextAnchor::Start),
            font_size: Some(RelAbsVector::relative(50.0)),
            ..Default::default()
        };
        let text = text_geometry(&shape, &bbox(), 0.0, 0.0);
        assert_eq!(text.x, 10.0);
        assert_eq!(text.y, 20.0);
        assert_eq!(text.font_size, Some(20.0));
    }

    #[test]
    fn rotation_pivot_rules() {
        let center = Point::new(50.0, 40.0);
        assert_eq!(shape_rotation(None, 0.0, center), None);
        let about_center = shape_rotation(None, 1.0, center).unwrap();
        assert_eq!(about_center.cx, 50.0);
        let about_offset = shape_rotation(Some(Point::new(5.0, 6.0)), 1.0, center).unwrap();
        assert_eq!(about_offset.cx, 5.0);
        assert_eq!(about_offset.cy, 6.0);
    }
}
