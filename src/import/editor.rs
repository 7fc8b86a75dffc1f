//! Network-editor JSON import.
//!
//! The dialect is the one written by [`crate::export::editor`]: root keys
//! `position`, `dimensions`, `nodes[]` and `edges[]`; a node's
//! `style.category` decides whether it is a Compartment, Species or
//! Reaction, and an edge's `source.node`/`target.node` identify the
//! species and reaction glyphs it connects. Unknown categories and edges
//! with unresolvable endpoints are skipped.

use std::path::Path;

use log::{debug, warn};
use serde_json::Value;

use crate::error::TranslateError;
use crate::geometry::{expand_base_points, Point, RelAbsVector};
use crate::ir::{
    BoundingBox, CentroidShape, Curve, CurveSegment, EllipseShape, Entity, EntityKind, Features,
    GeometricShape, GraphicalCurve, GraphicalShape, GraphicalText, HTextAnchor, ImageShape,
    Network, PolygonShape, RectangleShape, RenderCurveShape, RenderVertex, Role, SpeciesReference,
    TextEntity, TextShape, VTextAnchor,
};

pub fn extract_info_from_file(path: &Path) -> Result<Network, TranslateError> {
    let text = std::fs::read_to_string(path).map_err(|source| TranslateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    extract_info(&text)
}

/// Build the network IR from a network-editor JSON document.
pub fn extract_info(document: &str) -> Result<Network, TranslateError> {
    let root: Value = serde_json::from_str(document)
        .map_err(|err| TranslateError::MalformedDocument(err.to_string()))?;

    let mut network = Network::new();
    if let Some(background) = root.get("background-color").and_then(Value::as_str) {
        network.background_color = background.to_string();
    }

    if let Some(nodes) = root.get("nodes").and_then(Value::as_array) {
        for node in nodes {
            extract_node(node, &mut network);
        }
    }
    if let Some(edges) = root.get("edges").and_then(Value::as_array) {
        for edge in edges {
            extract_edge(edge, &mut network);
        }
    }

    accumulate_extents(&mut network);
    Ok(network)
}

fn extract_node(node: &Value, network: &mut Network) {
    let Some(id) = node.get("id").and_then(Value::as_str) else {
        debug!("node without id, skipping");
        return;
    };
    let category = node
        .pointer("/style/category")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let kind = match category {
        "Compartment" => EntityKind::Compartment,
        "Species" => EntityKind::Species,
        "Reaction" => EntityKind::Reaction,
        other => {
            warn!("node {id} has unknown category {other:?}, skipping");
            return;
        }
    };

    let reference_id = node
        .get("referenceId")
        .and_then(Value::as_str)
        .unwrap_or(id);
    let mut entity = Entity::new(kind, id, reference_id);
    entity.compartment = node
        .get("parent")
        .and_then(Value::as_str)
        .map(|parent| parent.to_string());

    // Node positions are center points.
    if let (Some(center), Some((width, height))) = (read_position(node), read_dimensions(node)) {
        entity.features.bounding_box = Some(BoundingBox::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        ));
    }

    if let Some(style) = node.get("style") {
        entity.features.graphical_shape = Some(read_style_shapes(style));
    }
    if kind == EntityKind::Reaction {
        if let Some(curve) = read_edge_curve_points(node) {
            entity.features.curve = Some(curve);
        }
    }

    if let Some(texts) = node.get("texts").and_then(Value::as_array) {
        for text in texts {
            if let Some(text) = extract_text(text) {
                entity.texts.push(text);
            }
        }
    } else if let Some(name) = node.pointer("/style/name").and_then(Value::as_str) {
        entity.texts.push(TextEntity {
            id: format!("{}_text", entity.id),
            plain_text: Some(name.to_string()),
            origin_of_text: None,
            features: Features {
                bounding_box: entity.features.bounding_box,
                ..Default::default()
            },
        });
    }

    match kind {
        EntityKind::Compartment => network.compartments.push(entity),
        EntityKind::Species => network.species.push(entity),
        EntityKind::Reaction => network.reactions.push(entity),
    }
}

fn extract_text(text: &Value) -> Option<TextEntity> {
    let id = text.get("id").and_then(Value::as_str).unwrap_or_default();
    let plain_text = text
        .get("plain-text")
        .and_then(Value::as_str)
        .map(|t| t.to_string());
    let mut features = Features::default();
    if let (Some(center), Some((width, height))) = (read_position(text), read_dimensions(text)) {
        features.bounding_box = Some(BoundingBox::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        ));
    }
    if let Some(style) = text.get("style") {
        features.graphical_text = Some(GraphicalText {
            stroke: style
                .get("font-color")
                .and_then(Value::as_str)
                .map(|c| c.to_string()),
            font_family: style
                .get("font-family")
                .and_then(Value::as_str)
                .map(|f| f.to_string()),
            font_size: style
                .get("font-size")
                .and_then(Value::as_f64)
                .map(RelAbsVector::absolute),
            font_weight: style
                .get("font-weight")
                .and_then(Value::as_str)
                .map(|w| w.to_string()),
            font_style: style
                .get("font-style")
                .and_then(Value::as_str)
                .map(|s| s.to_string()),
            h_text_anchor: style
                .get("horizontal-alignment")
                .and_then(Value::as_str)
                .and_then(HTextAnchor::parse),
            v_text_anchor: style
                .get("vertical-alignment")
                .and_then(Value::as_str)
                .and_then(VTextAnchor::parse),
        });
    }
    Some(TextEntity {
        id: id.to_string(),
        plain_text,
        origin_of_text: None,
        features,
    })
}

fn extract_edge(edge: &Value, network: &mut Network) {
    let Some(id) = edge.get("id").and_then(Value::as_str) else {
        debug!("edge without id, skipping");
        return;
    };
    let Some(source_node) = edge.pointer("/source/node").and_then(Value::as_str) else {
        debug!("edge {id} has no source node, skipping");
        return;
    };
    let Some(target_node) = edge.pointer("/target/node").and_then(Value::as_str) else {
        debug!("edge {id} has no target node, skipping");
        return;
    };

    let role = edge
        .pointer("/style/category")
        .and_then(Value::as_str)
        .and_then(|category| Role::parse(category.trim_end_matches("Line")))
        .unwrap_or(Role::Substrate);

    // One endpoint must be a reaction glyph; the other is the species.
    let source_is_reaction = network.reactions.iter().any(|r| r.id == source_node);
    let (reaction_glyph, species_glyph) = if source_is_reaction {
        (source_node, target_node)
    } else {
        (target_node, source_node)
    };
    let species = network
        .find_species_glyph(species_glyph)
        .map(|entity| entity.reference_id.clone());
    if species.is_none() {
        debug!("edge {id} references unknown species glyph {species_glyph}");
    }

    let start = edge
        .pointer("/source/position")
        .and_then(read_point);
    let end = edge.pointer("/target/position").and_then(read_point);

    let curve = match (start, end) {
        (Some(start), Some(end)) => Some(build_edge_curve(edge, start, end)),
        _ => None,
    };

    let mut features = Features::default();
    if let Some(curve) = curve {
        features.start_point = curve.start_point();
        features.end_point = curve.end_point();
        features.start_slope = curve.start_slope();
        features.end_slope = curve.end_slope();
        features.curve = Some(curve);
    }
    features.graphical_curve = edge.get("style").map(read_style_curve);

    let reference = SpeciesReference {
        id: id.to_string(),
        reference_id: edge
            .get("referenceId")
            .and_then(Value::as_str)
            .unwrap_or(id)
            .to_string(),
        species,
        species_glyph: Some(species_glyph.to_string()),
        role,
        features,
    };

    let Some(reaction) = network
        .reactions
        .iter_mut()
        .find(|reaction| reaction.id == reaction_glyph)
    else {
        warn!("edge {id} connects no reaction glyph, skipping");
        return;
    };
    reaction.species_references.push(reference);
}

/// Rebuild the edge curve. A line shape with non-zero `p1`/`p2`
/// chord-percentage control points expands into a cubic segment.
fn build_edge_curve(edge: &Value, start: Point, end: Point) -> Curve {
    let shape = edge
        .pointer("/style/shapes")
        .and_then(Value::as_array)
        .and_then(|shapes| {
            shapes.iter().find(|shape| {
                shape
                    .get("shape")
                    .and_then(Value::as_str)
                    .is_some_and(is_line_shape_tag)
            })
        });
    let p1 = shape
        .and_then(|shape| shape.get("p1"))
        .and_then(read_point)
        .unwrap_or_default();
    let p2 = shape
        .and_then(|shape| shape.get("p2"))
        .and_then(read_point)
        .unwrap_or_default();
    let segment = if p1 == Point::default() && p2 == Point::default() {
        CurveSegment::Line { start, end }
    } else {
        let (base_point1, base_point2) = expand_base_points(p1, p2, start, end);
        CurveSegment::Cubic {
            start,
            end,
            base_point1,
            base_point2,
        }
    };
    Curve {
        segments: vec![segment],
    }
}

/// The two spellings of the edge line tag used across dialect versions.
/// Kept closed: new variants are not inferred.
pub(crate) fn is_line_shape_tag(tag: &str) -> bool {
    tag == "line" || tag == "connected-to-source-centroid-shape-line"
}

fn read_style_curve(style: &Value) -> GraphicalCurve {
    let shape = style
        .get("shapes")
        .and_then(Value::as_array)
        .and_then(|shapes| shapes.first());
    let lookup_str = |key: &str| {
        shape
            .and_then(|shape| shape.get(key))
            .or_else(|| style.get(key))
            .and_then(Value::as_str)
            .map(|v| v.to_string())
    };
    GraphicalCurve {
        stroke: lookup_str("stroke"),
        stroke_width: shape
            .and_then(|shape| shape.get("stroke-width"))
            .or_else(|| style.get("stroke-width"))
            .and_then(Value::as_f64),
        stroke_dash_array: None,
        start_head: shape
            .and_then(|shape| shape.pointer("/heads/start"))
            .and_then(Value::as_str)
            .map(|h| h.to_string()),
        end_head: shape
            .and_then(|shape| shape.pointer("/heads/end"))
            .and_then(Value::as_str)
            .map(|h| h.to_string()),
    }
}

fn read_style_shapes(style: &Value) -> GraphicalShape {
    let mut graphical = GraphicalShape {
        stroke: style
            .get("stroke")
            .and_then(Value::as_str)
            .map(|v| v.to_string()),
        stroke_width: style.get("stroke-width").and_then(Value::as_f64),
        fill: style
            .get("fill")
            .and_then(Value::as_str)
            .map(|v| v.to_string()),
        ..Default::default()
    };
    let Some(shapes) = style.get("shapes").and_then(Value::as_array) else {
        return graphical;
    };
    for shape in shapes {
        if let Some(geometric) = read_geometric_shape(shape) {
            graphical.geometric_shapes.push(geometric);
        }
    }
    // Style-level stroke/fill fall back to the first shape's values.
    if graphical.stroke.is_none() {
        graphical.stroke = shapes
            .first()
            .and_then(|shape| shape.get("stroke"))
            .and_then(Value::as_str)
            .map(|v| v.to_string());
    }
    if graphical.stroke_width.is_none() {
        graphical.stroke_width = shapes
            .first()
            .and_then(|shape| shape.get("stroke-width"))
            .and_then(Value::as_f64);
    }
    if graphical.fill.is_none() {
        graphical.fill = shapes
            .first()
            .and_then(|shape| shape.get("fill"))
            .and_then(Value::as_str)
            .map(|v| v.to_string());
    }
    graphical
}

fn read_geometric_shape(shape: &Value) -> Option<GeometricShape> {
    let kind = shape.get("shape").and_then(Value::as_str)?;
    let stroke = shape
        .get("stroke")
        .and_then(Value::as_str)
        .map(|v| v.to_string());
    let stroke_width = shape.get("stroke-width").and_then(Value::as_f64);
    let fill = shape
        .get("fill")
        .and_then(Value::as_str)
        .map(|v| v.to_string());
    match kind {
        "rectangle" => Some(GeometricShape::Rectangle(RectangleShape {
            x: read_relabs(shape.get("x")),
            y: read_relabs(shape.get("y")),
            width: read_relabs(shape.get("width")),
            height: read_relabs(shape.get("height")),
            rx: read_relabs(shape.get("rx")),
            ry: read_relabs(shape.get("ry")),
            ratio: shape.get("ratio").and_then(Value::as_f64),
            stroke,
            stroke_width,
            fill,
        })),
        "ellipse" => Some(GeometricShape::Ellipse(EllipseShape {
            cx: read_relabs(shape.get("cx")),
            cy: read_relabs(shape.get("cy")),
            rx: read_relabs(shape.get("rx")),
            ry: read_relabs(shape.get("ry")),
            ratio: shape.get("ratio").and_then(Value::as_f64),
            stroke,
            stroke_width,
            fill,
        })),
        "polygon" => Some(GeometricShape::Polygon(PolygonShape {
            vertices: read_vertices(shape),
            stroke,
            stroke_width,
            fill,
            fill_rule: shape
                .get("fill-rule")
                .and_then(Value::as_str)
                .map(|v| v.to_string()),
        })),
        "image" => Some(GeometricShape::Image(ImageShape {
            x: read_relabs(shape.get("x")),
            y: read_relabs(shape.get("y")),
            width: read_relabs(shape.get("width")),
            height: read_relabs(shape.get("height")),
            href: shape
                .get("href")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })),
        "text" => Some(GeometricShape::Text(TextShape {
            x: read_relabs(shape.get("x")),
            y: read_relabs(shape.get("y")),
            font_family: shape
                .get("font-family")
                .and_then(Value::as_str)
                .map(|v| v.to_string()),
            font_size: read_relabs(shape.get("font-size")),
            font_weight: shape
                .get("font-weight")
                .and_then(Value::as_str)
                .map(|v| v.to_string()),
            font_style: shape
                .get("font-style")
                .and_then(Value::as_str)
                .map(|v| v.to_string()),
            h_text_anchor: shape
                .get("horizontal-alignment")
                .and_then(Value::as_str)
                .and_then(HTextAnchor::parse),
            v_text_anchor: shape
                .get("vertical-alignment")
                .and_then(Value::as_str)
                .and_then(VTextAnchor::parse),
        })),
        "render-curve" => Some(GeometricShape::RenderCurve(RenderCurveShape {
            vertices: read_vertices(shape),
            stroke,
            stroke_width,
        })),
        "centroid" => Some(GeometricShape::Centroid(CentroidShape {
            rx: read_relabs(shape.get("rx")),
            ry: read_relabs(shape.get("ry")),
            stroke,
            stroke_width,
            fill,
        })),
        other => {
            debug!("unknown node shape tag {other:?}, skipping");
            None
        }
    }
}

fn read_vertices(shape: &Value) -> Vec<RenderVertex> {
    let Some(vertices) = shape.get("vertices").and_then(Value::as_array) else {
        return Vec::new();
    };
    vertices
        .iter()
        .filter_map(|vertex| {
            Some(RenderVertex {
                x: read_relabs(vertex.get("x"))?,
                y: read_relabs(vertex.get("y"))?,
                base_point1: read_relabs_pair(vertex.get("basePoint1")),
                base_point2: read_relabs_pair(vertex.get("basePoint2")),
            })
        })
        .collect()
}

fn read_relabs(value: Option<&Value>) -> Option<RelAbsVector> {
    let value = value?;
    if let Some(number) = value.as_f64() {
        return Some(RelAbsVector::absolute(number));
    }
    Some(RelAbsVector::new(
        value.get("abs").and_then(Value::as_f64).unwrap_or(0.0),
        value.get("rel").and_then(Value::as_f64).unwrap_or(0.0),
    ))
}

fn read_relabs_pair(value: Option<&Value>) -> Option<(RelAbsVector, RelAbsVector)> {
    let value = value?;
    Some((
        read_relabs(value.get("x"))?,
        read_relabs(value.get("y"))?,
    ))
}

fn read_point(value: &Value) -> Option<Point> {
    Some(Point::new(
        value.get("x").and_then(Value::as_f64)?,
        value.get("y").and_then(Value::as_f64)?,
    ))
}

fn read_position(value: &Value) -> Option<Point> {
    value.get("position").and_then(read_point)
}

fn read_dimensions(value: &Value) -> Option<(f64, f64)> {
    let dimensions = value.get("dimensions")?;
    Some((
        dimensions.get("width").and_then(Value::as_f64)?,
        dimensions.get("height").and_then(Value::as_f64)?,
    ))
}

fn read_edge_curve_points(node: &Value) -> Option<Curve> {
    let points = node.get("curve").and_then(Value::as_array)?;
    let mut segments = Vec::new();
    for segment in points {
        let start = segment.get("start").and_then(read_point)?;
        let end = segment.get("end").and_then(read_point)?;
        match (
            segment.get("basePoint1").and_then(read_point),
            segment.get("basePoint2").and_then(read_point),
        ) {
            (Some(base_point1), Some(base_point2)) => segments.push(CurveSegment::Cubic {
                start,
                end,
                base_point1,
                base_point2,
            }),
            _ => segments.push(CurveSegment::Line { start, end }),
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(Curve { segments })
    }
}

fn accumulate_extents(network: &mut Network) {
    let mut extents = network.extents;
    for entity in network
        .compartments
        .iter()
        .chain(network.species.iter())
        .chain(network.reactions.iter())
    {
        if let Some(bbox) = &entity.features.bounding_box {
            extents.expand_box(bbox);
        }
        if let Some(curve) = &entity.features.curve {
            for segment in &curve.segments {
                extents.expand_point(segment.start());
                extents.expand_point(segment.end());
            }
        }
        // Labels can overhang their owner's box.
        for text in &entity.texts {
            if let Some(bbox) = &text.features.bounding_box {
                extents.expand_box(bbox);
            }
        }
        for reference in &entity.species_references {
            if let Some(curve) = &reference.features.curve {
                for segment in &curve.segments {
                    extents.expand_point(segment.start());
                    extents.expand_point(segment.end());
                }
            }
        }
    }
    network.extents = extents;
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDITOR_DOCUMENT: &str = r##"{
      "background-color": "#fafafa",
      "position": {"x": 0, "y": 0},
      "dimensions": {"width": 400, "height": 300},
      "nodes": [
        {
          "id": "c1_glyph",
          "referenceId": "c1",
          "position": {"x": 200, "y": 150},
          "dimensions": {"width": 380, "height": 280},
          "style": {
            "category": "Compartment",
            "name": "cytosol",
            "shapes": [{"shape": "rectangle", "stroke": "#008b8b", "stroke-width": 2,
                        "fill": "#d3d3d3", "rx": {"abs": 0, "rel": 10}}]
          }
        },
        {
          "id": "s1_glyph",
          "referenceId": "s1",
          "parent": "c1",
          "position": {"x": 70, "y": 118},
          "dimensions": {"width": 60, "height": 36},
          "style": {
            "category": "Species",
            "name": "glucose",
            "shapes": [{"shape": "rectangle", "stroke": "#000000", "stroke-width": 2,
                        "fill": "#f0e68c"}]
          }
        },
        {
          "id": "r1_glyph",
          "referenceId": "r1",
          "position": {"x": 200, "y": 118},
          "dimensions": {"width": 20, "height": 20},
          "style": {
            "category": "Reaction",
            "shapes": [{"shape": "centroid", "rx": {"abs": 4, "rel": 0},
                        "ry": {"abs": 4, "rel": 0}}]
          }
        }
      ],
      "edges": [
        {
          "id": "sr1_glyph",
          "source": {"node": "s1_glyph", "position": {"x": 100, "y": 118}},
          "target": {"node": "r1_glyph", "position": {"x": 190, "y": 118}},
          "style": {
            "category": "SubstrateLine",
            "shapes": [{"shape": "line", "stroke": "#000000", "stroke-width": 1.5,
                        "p1": {"x": 33, "y": -30}, "p2": {"x": -33, "y": -30}}]
          }
        }
      ]
    }"##;

    #[test]
    fn categories_route_nodes() {
        let network = extract_info(EDITOR_DOCUMENT).unwrap();
        assert_eq!(network.compartments.len(), 1);
        assert_eq!(network.species.len(), 1);
        assert_eq!(network.reactions.len(), 1);
        assert_eq!(network.background_color, "#fafafa");

        let species = &network.species[0];
        assert_eq!(species.reference_id, "s1");
        assert_eq!(species.compartment.as_deref(), Some("c1"));
        let bbox = species.features.bounding_box.unwrap();
        assert_eq!(bbox.x, 40.0);
        assert_eq!(bbox.y, 100.0);
        assert_eq!(species.display_label(), "glucose");
    }

    #[test]
    fn centroid_shape_survives() {
        let network = extract_info(EDITOR_DOCUMENT).unwrap();
        let reaction = &network.reactions[0];
        let shape = reaction.features.graphical_shape.as_ref().unwrap();
        assert_eq!(shape.geometric_shapes.len(), 1);
        assert!(matches!(
            shape.geometric_shapes[0],
            GeometricShape::Centroid(_)
        ));
    }

    #[test]
    fn edge_becomes_species_reference() {
        let network = extract_info(EDITOR_DOCUMENT).unwrap();
        let reaction = &network.reactions[0];
        assert_eq!(reaction.species_references.len(), 1);
        let reference = &reaction.species_references[0];
        assert_eq!(reference.role, Role::Substrate);
        assert_eq!(reference.species.as_deref(), Some("s1"));
        assert_eq!(reference.species_glyph.as_deref(), Some("s1_glyph"));

        // Non-zero p1/p2 expanded into a cubic segment.
        let curve = reference.features.curve.as_ref().unwrap();
        match curve.segments[0] {
            CurveSegment::Cubic {
                base_point1,
                base_point2,
                ..
            } => {
                // 33% of the 90-long chord, -30% of the zero-height chord.
                assert!((base_point1.x - 129.7).abs() < 0.0001);
                assert_eq!(base_point1.y, 118.0);
                assert!((base_point2.x - 160.3).abs() < 0.0001);
            }
            CurveSegment::Line { .. } => panic!("expected cubic segment"),
        }
    }

    #[test]
    fn extents_include_overhanging_labels() {
        let document = r#"{
          "nodes": [{
            "id": "s1_glyph",
            "style": {"category": "Species"},
            "position": {"x": 50, "y": 50},
            "dimensions": {"width": 20, "height": 10},
            "texts": [{"id": "s1_label", "plain-text": "glyceraldehyde 3-phosphate",
                       "position": {"x": 50, "y": 100},
                       "dimensions": {"width": 120, "height": 20}}]
          }]
        }"#;
        let network = extract_info(document).unwrap();
        assert_eq!(network.extents.min_x, -10.0);
        assert_eq!(network.extents.max_x, 110.0);
        assert_eq!(network.extents.max_y, 110.0);
    }

    #[test]
    fn unknown_category_is_skipped() {
        let document = r#"{"nodes": [{"id": "x", "style": {"category": "Widget"}}]}"#;
        let network = extract_info(document).unwrap();
        assert!(network.compartments.is_empty());
        assert!(network.species.is_empty());
        assert!(network.reactions.is_empty());
    }

    #[test]
    fn edge_without_reaction_is_skipped() {
        let document = r#"{
          "nodes": [{"id": "a", "style": {"category": "Species"}}],
          "edges": [{"id": "e", "source": {"node": "a"}, "target": {"node": "b"}}]
        }"#;
        let network = extract_info(document).unwrap();
        assert!(network.species[0].species_references.is_empty());
    }

    #[test]
    fn malformed_document_is_fatal() {
        assert!(matches!(
            extract_info("{not json"),
            Err(TranslateError::MalformedDocument(_))
        ));
    }
}
