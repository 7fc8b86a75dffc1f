//! Network-editor JSON export.
//!
//! Writes the dialect read back by [`crate::import::editor`]: nodes carry
//! center positions, dimensions and a `style` block with resolved colors,
//! edges carry `source`/`target` glyph references and a single line shape
//! with chord-percentage control points.

use serde_json::{json, Map, Value};

use crate::color::resolve_color;
use crate::error::TranslateError;
use crate::geometry::{compress_base_points, Point, RelAbsVector};
use crate::ir::{
    Curve, CurveSegment, Entity, GeometricShape, Network, Role, SpeciesReference, TextEntity,
};

use super::{extract_graph_info, is_centroid_node, reaction_anchor, NetworkExport};

#[derive(Default)]
pub struct NetworkEditorExport {
    nodes: Vec<Value>,
    edges: Vec<Value>,
}

impl NetworkEditorExport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate the whole network and serialize it.
    pub fn export(&mut self, network: &Network) -> Result<String, TranslateError> {
        extract_graph_info(self, network);
        let document = self.document(network);
        serde_json::to_string_pretty(&document)
            .map_err(|err| TranslateError::ModelConstruction(err.to_string()))
    }

    fn document(&self, network: &Network) -> Value {
        let extents = &network.extents;
        let (x, y, width, height) = if !extents.is_empty() {
            (
                extents.min_x,
                extents.min_y,
                extents.width(),
                extents.height(),
            )
        } else {
            (0.0, 0.0, 0.0, 0.0)
        };
        json!({
            "background-color": resolve_color(network, &network.background_color, false),
            "position": {"x": x, "y": y},
            "dimensions": {"width": width, "height": height},
            "nodes": self.nodes,
            "edges": self.edges,
        })
    }

    fn add_node(&mut self, network: &Network, entity: &Entity) {
        let mut node = Map::new();
        node.insert("id".into(), json!(entity.id));
        node.insert("referenceId".into(), json!(entity.reference_id));
        if let Some(compartment) = &entity.compartment {
            node.insert("parent".into(), json!(compartment));
        }
        if let Some(bbox) = &entity.features.bounding_box {
            let center = bbox.center();
            node.insert("position".into(), json!({"x": center.x, "y": center.y}));
            node.insert(
                "dimensions".into(),
                json!({"width": bbox.width, "height": bbox.height}),
            );
        }
        if let Some(curve) = &entity.features.curve {
            node.insert("curve".into(), curve_value(curve));
        }

        let mut style = Map::new();
        style.insert("category".into(), json!(entity.kind.category()));
        style.insert("name".into(), json!(entity.display_label()));
        if let Some(shape) = &entity.features.graphical_shape {
            if let Some(stroke) = &shape.stroke {
                style.insert(
                    "stroke".into(),
                    json!(resolve_color(network, stroke, false)),
                );
            }
            if let Some(width) = shape.stroke_width {
                style.insert("stroke-width".into(), json!(width));
            }
            if let Some(fill) = &shape.fill {
                style.insert(
                    "fill".into(),
                    json!(resolve_color(network, fill, true)),
                );
            }
            let shapes: Vec<Value> = shape
                .geometric_shapes
                .iter()
                .map(|geometric| geometric_shape_value(network, geometric))
                .collect();
            style.insert("shapes".into(), json!(shapes));
        } else {
            style.insert("shapes".into(), json!([]));
        }
        node.insert("style".into(), Value::Object(style));

        let texts: Vec<Value> = entity
            .texts
            .iter()
            .filter(|text| text.content().is_some())
            .map(|text| text_value(network, text))
            .collect();
        if !texts.is_empty() {
            node.insert("texts".into(), json!(texts));
        }

        self.nodes.push(Value::Object(node));
    }
}

impl NetworkExport for NetworkEditorExport {
    fn reset(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    fn add_compartment(&mut self, network: &Network, compartment: &Entity) {
        self.add_node(network, compartment);
    }

    fn add_species(&mut self, network: &Network, species: &Entity) {
        self.add_node(network, species);
    }

    fn add_reaction(&mut self, network: &Network, reaction: &Entity) {
        self.add_node(network, reaction);
    }

    fn add_species_reference(
        &mut self,
        network: &Network,
        reaction: &Entity,
        reference: &SpeciesReference,
    ) {
        let Some(species_glyph) = reference.species_glyph.as_deref() else {
            log::debug!("species reference {} has no glyph, skipping", reference.id);
            return;
        };

        let species_center = network
            .find_species_glyph(species_glyph)
            .and_then(|species| species.features.bounding_box.as_ref())
            .map(|bbox| bbox.center());
        let anchor = reaction_anchor(reaction);

        // Products run reaction to species; every other role runs species
        // to reaction.
        let towards_species = reference.role.towards_species();
        let (source_node, target_node) = if towards_species {
            (reaction.id.as_str(), species_glyph)
        } else {
            (species_glyph, reaction.id.as_str())
        };

        let (start, end) = match (
            reference.features.start_point,
            reference.features.end_point,
        ) {
            (Some(start), Some(end)) => (Some(start), Some(end)),
            _ => {
                if towards_species {
                    (anchor, species_center)
                } else {
                    (species_center, anchor)
                }
            }
        };

        let mut edge = Map::new();
        edge.insert("id".into(), json!(reference.id));
        edge.insert("referenceId".into(), json!(reference.reference_id));
        edge.insert(
            "source".into(),
            endpoint_value(source_node, start),
        );
        edge.insert("target".into(), endpoint_value(target_node, end));

        let tag = if is_centroid_node(reaction) {
            "connected-to-source-centroid-shape-line"
        } else {
            "line"
        };
        let (p1, p2) = control_percentages(reference, start, end);

        let mut shape = Map::new();
        shape.insert("shape".into(), json!(tag));
        shape.insert("p1".into(), json!({"x": p1.x, "y": p1.y}));
        shape.insert("p2".into(), json!({"x": p2.x, "y": p2.y}));
        let mut heads = Map::new();
        if let Some(curve) = &reference.features.graphical_curve {
            if let Some(stroke) = &curve.stroke {
                shape.insert(
                    "stroke".into(),
                    json!(resolve_color(network, stroke, false)),
                );
            }
            if let Some(width) = curve.stroke_width {
                shape.insert("stroke-width".into(), json!(width));
            }
            if let Some(head) = &curve.start_head {
                heads.insert("start".into(), json!(head));
            }
            if let Some(head) = &curve.end_head {
                heads.insert("end".into(), json!(head));
            }
        }
        if !heads.is_empty() {
            shape.insert("heads".into(), Value::Object(heads));
        }

        edge.insert(
            "style".into(),
            json!({
                "category": role_category(reference.role),
                "shapes": [Value::Object(shape)],
            }),
        );

        self.edges.push(Value::Object(edge));
    }
}

fn role_category(role: Role) -> &'static str {
    match role {
        Role::Substrate => "SubstrateLine",
        Role::SideSubstrate => "SideSubstrateLine",
        Role::Product => "ProductLine",
        Role::SideProduct => "SideProductLine",
        Role::Modifier => "ModifierLine",
        Role::Activator => "ActivatorLine",
        Role::Inhibitor => "InhibitorLine",
    }
}

fn endpoint_value(node: &str, position: Option<Point>) -> Value {
    match position {
        Some(point) => json!({"node": node, "position": {"x": point.x, "y": point.y}}),
        None => json!({"node": node}),
    }
}

/// Chord-percentage control points of a single-segment cubic, zeros for
/// straight lines and multi-segment curves.
fn control_percentages(
    reference: &SpeciesReference,
    start: Option<Point>,
    end: Option<Point>,
) -> (Point, Point) {
    let Some(curve) = &reference.features.curve else {
        return (Point::default(), Point::default());
    };
    if curve.segments.len() != 1 {
        return (Point::default(), Point::default());
    }
    if let CurveSegment::Cubic {
        base_point1,
        base_point2,
        ..
    } = curve.segments[0]
    {
        if let (Some(start), Some(end)) = (start, end) {
            return compress_base_points(base_point1, base_point2, start, end);
        }
    }
    (Point::default(), Point::default())
}

fn curve_value(curve: &Curve) -> Value {
    let segments: Vec<Value> = curve
        .segments
        .iter()
        .map(|segment| match segment {
            CurveSegment::Line { start, end } => json!({
                "start": {"x": start.x, "y": start.y},
                "end": {"x": end.x, "y": end.y},
            }),
            CurveSegment::Cubic {
                start,
                end,
                base_point1,
                base_point2,
            } => json!({
                "start": {"x": start.x, "y": start.y},
                "end": {"x": end.x, "y": end.y},
                "basePoint1": {"x": base_point1.x, "y": base_point1.y},
                "basePoint2": {"x": base_point2.x, "y": base_point2.y},
            }),
        })
        .collect();
    json!(segments)
}

fn text_value(network: &Network, text: &TextEntity) -> Value {
    let mut value = Map::new();
    value.insert("id".into(), json!(text.id));
    if let Some(content) = text.content() {
        value.insert("plain-text".into(), json!(content));
    }
    if let Some(bbox) = &text.features.bounding_box {
        let center = bbox.center();
        value.insert("position".into(), json!({"x": center.x, "y": center.y}));
        value.insert(
            "dimensions".into(),
            json!({"width": bbox.width, "height": bbox.height}),
        );
    }
    if let Some(graphical) = &text.features.graphical_text {
        let mut style = Map::new();
        if let Some(stroke) = &graphical.stroke {
            style.insert(
                "font-color".into(),
                json!(resolve_color(network, stroke, false)),
            );
        }
        if let Some(family) = &graphical.font_family {
            style.insert("font-family".into(), json!(family));
        }
        if let Some(size) = &graphical.font_size {
            style.insert("font-size".into(), json!(size.abs));
        }
        if let Some(weight) = &graphical.font_weight {
            style.insert("font-weight".into(), json!(weight));
        }
        if let Some(font_style) = &graphical.font_style {
            style.insert("font-style".into(), json!(font_style));
        }
        if let Some(anchor) = &graphical.h_text_anchor {
            style.insert("horizontal-alignment".into(), json!(anchor.as_str()));
        }
        if let Some(anchor) = &graphical.v_text_anchor {
            style.insert("vertical-alignment".into(), json!(anchor.as_str()));
        }
        if !style.is_empty() {
            value.insert("style".into(), Value::Object(style));
        }
    }
    Value::Object(value)
}

fn geometric_shape_value(network: &Network, shape: &GeometricShape) -> Value {
    let resolve_fill =
        |fill: &Option<String>| fill.as_deref().map(|f| resolve_color(network, f, true));
    match shape {
        GeometricShape::Rectangle(rect) => {
            let mut value = shape_header("rectangle", &rect.stroke, rect.stroke_width, network);
            insert_relabs(&mut value, "x", &rect.x);
            insert_relabs(&mut value, "y", &rect.y);
            insert_relabs(&mut value, "width", &rect.width);
            insert_relabs(&mut value, "height", &rect.height);
            insert_relabs(&mut value, "rx", &rect.rx);
            insert_relabs(&mut value, "ry", &rect.ry);
            if let Some(ratio) = rect.ratio {
                value.insert("ratio".into(), json!(ratio));
            }
            if let Some(fill) = resolve_fill(&rect.fill) {
                value.insert("fill".into(), json!(fill));
            }
            Value::Object(value)
        }
        GeometricShape::Ellipse(ellipse) => {
            let mut value =
                shape_header("ellipse", &ellipse.stroke, ellipse.stroke_width, network);
            insert_relabs(&mut value, "cx", &ellipse.cx);
            insert_relabs(&mut value, "cy", &ellipse.cy);
            insert_relabs(&mut value, "rx", &ellipse.rx);
            insert_relabs(&mut value, "ry", &ellipse.ry);
            if let Some(ratio) = ellipse.ratio {
                value.insert("ratio".into(), json!(ratio));
            }
            if let Some(fill) = resolve_fill(&ellipse.fill) {
                value.insert("fill".into(), json!(fill));
            }
            Value::Object(value)
        }
        GeometricShape::Polygon(polygon) => {
            let mut value =
                shape_header("polygon", &polygon.stroke, polygon.stroke_width, network);
            value.insert("vertices".into(), vertices_value(&polygon.vertices));
            if let Some(fill) = resolve_fill(&polygon.fill) {
                value.insert("fill".into(), json!(fill));
            }
            if let Some(rule) = &polygon.fill_rule {
                value.insert("fill-rule".into(), json!(rule));
            }
            Value::Object(value)
        }
        GeometricShape::Image(image) => {
            let mut value = Map::new();
            value.insert("shape".into(), json!("image"));
            insert_relabs(&mut value, "x", &image.x);
            insert_relabs(&mut value, "y", &image.y);
            insert_relabs(&mut value, "width", &image.width);
            insert_relabs(&mut value, "height", &image.height);
            value.insert("href".into(), json!(image.href));
            Value::Object(value)
        }
        GeometricShape::Text(text) => {
            let mut value = Map::new();
            value.insert("shape".into(), json!("text"));
            insert_relabs(&mut value, "x", &text.x);
            insert_relabs(&mut value, "y", &text.y);
            if let Some(family) = &text.font_family {
                value.insert("font-family".into(), json!(family));
            }
            insert_relabs(&mut value, "font-size", &text.font_size);
            if let Some(weight) = &text.font_weight {
                value.insert("font-weight".into(), json!(weight));
            }
            if let Some(style) = &text.font_style {
                value.insert("font-style".into(), json!(style));
            }
            if let Some(anchor) = &text.h_text_anchor {
                value.insert("horizontal-alignment".into(), json!(anchor.as_str()));
            }
            if let Some(anchor) = &text.v_text_anchor {
                value.insert("vertical-alignment".into(), json!(anchor.as_str()));
            }
            Value::Object(value)
        }
        GeometricShape::RenderCurve(curve) => {
            let mut value =
                shape_header("render-curve", &curve.stroke, curve.stroke_width, network);
            value.insert("vertices".into(), vertices_value(&curve.vertices));
            Value::Object(value)
        }
        GeometricShape::Centroid(centroid) => {
            let mut value =
                shape_header("centroid", &centroid.stroke, centroid.stroke_width, network);
            insert_relabs(&mut value, "rx", &centroid.rx);
            insert_relabs(&mut value, "ry", &centroid.ry);
            if let Some(fill) = resolve_fill(&centroid.fill) {
                value.insert("fill".into(), json!(fill));
            }
            Value::Object(value)
        }
    }
}

fn shape_header(
    tag: &str,
    stroke: &Option<String>,
    stroke_width: Option<f64>,
    network: &Network,
) -> Map<String, Value> {
    let mut value = Map::new();
    value.insert("shape".into(), json!(tag));
    if let Some(stroke) = stroke {
        value.insert(
            "stroke".into(),
            json!(resolve_color(network, stroke, false)),
        );
    }
    if let Some(width) = stroke_width {
        value.insert("stroke-width".into(), json!(width));
    }
    value
}

fn insert_relabs(value: &mut Map<String, Value>, key: &str, relabs: &Option<RelAbsVector>) {
    if let Some(relabs) = relabs {
        value.insert(key.into(), json!({"abs": relabs.abs, "rel": relabs.rel}));
    }
}

fn vertices_value(vertices: &[crate::ir::RenderVertex]) -> Value {
    let values: Vec<Value> = vertices
        .iter()
        .map(|vertex| {
            let mut value = Map::new();
            value.insert(
                "x".into(),
                json!({"abs": vertex.x.abs, "rel": vertex.x.rel}),
            );
            value.insert(
                "y".into(),
                json!({"abs": vertex.y.abs, "rel": vertex.y.rel}),
            );
            if let Some((x, y)) = &vertex.base_point1 {
                value.insert(
                    "basePoint1".into(),
                    json!({"x": {"abs": x.abs, "rel": x.rel}, "y": {"abs": y.abs, "rel": y.rel}}),
                );
            }
            if let Some((x, y)) = &vertex.base_point2 {
                value.insert(
                    "basePoint2".into(),
                    json!({"x": {"abs": x.abs, "rel": x.rel}, "y": {"abs": y.abs, "rel": y.rel}}),
                );
            }
            Value::Object(value)
        })
        .collect();
    json!(values)
}
