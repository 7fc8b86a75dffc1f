//! Cytoscape.js JSON export.
//!
//! Produces a single document with `data`, `elements` (nodes plus edges)
//! and a per-element `style` sheet keyed by id selectors, ready to hand
//! to `cytoscape({...})` unchanged.

use serde_json::{json, Map, Value};

use crate::color::resolve_color;
use crate::error::TranslateError;
use crate::ir::{Entity, GeometricShape, Network, Role, SpeciesReference};

use super::{extract_graph_info, NetworkExport};

#[derive(Default)]
pub struct CytoscapeExport {
    nodes: Vec<Value>,
    edges: Vec<Value>,
    styles: Vec<Value>,
}

impl CytoscapeExport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export(&mut self, network: &Network) -> Result<String, TranslateError> {
        extract_graph_info(self, network);
        let document = json!({
            "data": {
                "generated_by": env!("CARGO_PKG_NAME"),
                "background_color": resolve_color(network, &network.background_color, false),
            },
            "elements": {
                "nodes": self.nodes,
                "edges": self.edges,
            },
            "style": self.styles,
        });
        serde_json::to_string_pretty(&document)
            .map_err(|err| TranslateError::ModelConstruction(err.to_string()))
    }

    fn add_node(&mut self, network: &Network, entity: &Entity) {
        let mut data = Map::new();
        data.insert("id".into(), json!(entity.id));
        data.insert("name".into(), json!(entity.display_label()));
        if let Some(compartment) = &entity.compartment {
            // Compartments become compound parents; reference the glyph of
            // the containing compartment when one exists.
            let parent = network
                .find_compartment_by_reference(compartment)
                .map(|parent| parent.id.as_str())
                .unwrap_or(compartment.as_str());
            data.insert("parent".into(), json!(parent));
        }

        let mut node = Map::new();
        node.insert("data".into(), Value::Object(data));
        if let Some(bbox) = &entity.features.bounding_box {
            let center = bbox.center();
            node.insert("position".into(), json!({"x": center.x, "y": center.y}));
        }
        self.nodes.push(Value::Object(node));

        self.styles.push(node_style(network, entity));
    }
}

impl NetworkExport for CytoscapeExport {
    fn reset(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.styles.clear();
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
        let (source, target) = if reference.role.towards_species() {
            (reaction.id.as_str(), species_glyph)
        } else {
            (species_glyph, reaction.id.as_str())
        };
        self.edges.push(json!({
            "data": {
                "id": reference.id,
                "source": source,
                "target": target,
            }
        }));
        self.styles.push(edge_style(network, reference));
    }
}

fn node_style(network: &Network, entity: &Entity) -> Value {
    let mut style = Map::new();
    if let Some(bbox) = &entity.features.bounding_box {
        style.insert("width".into(), json!(bbox.width));
        style.insert("height".into(), json!(bbox.height));
    }
    if let Some(shape) = &entity.features.graphical_shape {
        if let Some(stroke) = &shape.stroke {
            style.insert(
                "border-color".into(),
                json!(resolve_color(network, stroke, false)),
            );
        }
        if let Some(width) = shape.stroke_width {
            style.insert("border-width".into(), json!(width));
        }
        if let Some(fill) = &shape.fill {
            style.insert(
                "background-color".into(),
                json!(resolve_color(network, fill, true)),
            );
        }
        if let Some(geometric) = shape.geometric_shapes.first() {
            style.insert("shape".into(), json!(cytoscape_shape(geometric)));
            let stroke = match geometric {
                GeometricShape::Rectangle(rect) => rect.stroke.as_deref(),
                GeometricShape::Ellipse(ellipse) => ellipse.stroke.as_deref(),
                GeometricShape::Polygon(polygon) => polygon.stroke.as_deref(),
                GeometricShape::Centroid(centroid) => centroid.stroke.as_deref(),
                _ => None,
            };
            if let Some(stroke) = stroke {
                style.insert(
                    "border-color".into(),
                    json!(resolve_color(network, stroke, false)),
                );
            }
            let fill = match geometric {
                GeometricShape::Rectangle(rect) => rect.fill.as_deref(),
                GeometricShape::Ellipse(ellipse) => ellipse.fill.as_deref(),
                GeometricShape::Polygon(polygon) => polygon.fill.as_deref(),
                GeometricShape::Centroid(centroid) => centroid.fill.as_deref(),
                _ => None,
            };
            if let Some(fill) = fill {
                style.insert(
                    "background-color".into(),
                    json!(resolve_color(network, fill, true)),
                );
            }
        }
    }
    if let Some(text) = entity.texts.first() {
        if let Some(content) = text.content() {
            style.insert("label".into(), json!(content));
            style.insert("text-halign".into(), json!("center"));
            style.insert("text-valign".into(), json!("center"));
        }
        if let Some(graphical) = &text.features.graphical_text {
            if let Some(stroke) = &graphical.stroke {
                style.insert(
                    "color".into(),
                    json!(resolve_color(network, stroke, false)),
                );
            }
            if let Some(size) = &graphical.font_size {
                style.insert("font-size".into(), json!(size.abs));
            }
            if let Some(family) = &graphical.font_family {
                style.insert("font-family".into(), json!(family));
            }
        }
    }
    json!({
        "selector": format!("node[id = '{}']", entity.id),
        "style": Value::Object(style),
    })
}

fn edge_style(network: &Network, reference: &SpeciesReference) -> Value {
    let mut style = Map::new();
    style.insert("curve-style".into(), json!("bezier"));
    if let Some(curve) = &reference.features.graphical_curve {
        if let Some(stroke) = &curve.stroke {
            let color = resolve_color(network, stroke, false);
            style.insert("line-color".into(), json!(color.clone()));
            style.insert("target-arrow-color".into(), json!(color));
        }
        if let Some(width) = curve.stroke_width {
            style.insert("width".into(), json!(width));
        }
    }
    if let Some(arrow) = arrow_shape(reference.role) {
        style.insert("target-arrow-shape".into(), json!(arrow));
    }
    json!({
        "selector": format!("edge[id = '{}']", reference.id),
        "style": Value::Object(style),
    })
}

fn cytoscape_shape(shape: &GeometricShape) -> &'static str {
    match shape {
        GeometricShape::Rectangle(rect) => {
            if rect.rx.is_some() || rect.ry.is_some() {
                "round-rectangle"
            } else {
                "rectangle"
            }
        }
        GeometricShape::Ellipse(_) | GeometricShape::Centroid(_) => "ellipse",
        GeometricShape::Polygon(_) => "polygon",
        _ => "rectangle",
    }
}

/// Arrow at the edge's target end. Substrates carry none; the remaining
/// roles mirror the default line-ending set.
fn arrow_shape(role: Role) -> Option<&'static str> {
    match role {
        Role::Substrate | Role::SideSubstrate => None,
        Role::Product | Role::SideProduct => Some("triangle"),
        Role::Modifier | Role::Activator => Some("circle"),
        Role::Inhibitor => Some("tee"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::ir::{BoundingBox, EntityKind, Features, GraphicalShape, RectangleShape};

    fn sample_network() -> Network {
        let mut network = Network::new();
        let mut compartment = Entity::new(EntityKind::Compartment, "c1_glyph", "c1");
        compartment.features.bounding_box = Some(BoundingBox::new(10.0, 10.0, 380.0, 280.0));
        network.compartments.push(compartment);

        let mut species = Entity::new(EntityKind::Species, "s1_glyph", "s1");
        species.compartment = Some("c1".to_string());
        species.features.bounding_box = Some(BoundingBox::new(40.0, 100.0, 60.0, 36.0));
        species.features.graphical_shape = Some(GraphicalShape {
            stroke: Some("#000000".to_string()),
            stroke_width: Some(2.0),
            fill: Some("#f0e68c".to_string()),
            geometric_shapes: vec![GeometricShape::Rectangle(RectangleShape::default())],
            ..Default::default()
        });
        network.species.push(species);

        let mut reaction = Entity::new(EntityKind::Reaction, "r1_glyph", "r1");
        reaction.features.bounding_box = Some(BoundingBox::new(190.0, 108.0, 20.0, 20.0));
        reaction.species_references.push(SpeciesReference {
            id: "sr1_glyph".to_string(),
            reference_id: "sr1".to_string(),
            species: Some("s1".to_string()),
            species_glyph: Some("s1_glyph".to_string()),
            role: Role::Product,
            features: Features {
                start_point: Some(Point::new(200.0, 118.0)),
                end_point: Some(Point::new(100.0, 118.0)),
                ..Default::default()
            },
        });
        network.reactions.push(reaction);
        network
    }

    #[test]
    fn elements_and_styles_line_up() {
        let network = sample_network();
        let mut export = CytoscapeExport::new();
        let document: Value =
            serde_json::from_str(&export.export(&network).unwrap()).unwrap();

        assert_eq!(document["elements"]["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(document["elements"]["edges"].as_array().unwrap().len(), 1);
        // One style entry per node plus one per edge.
        assert_eq!(document["style"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn compartment_becomes_parent() {
        let network = sample_network();
        let mut export = CytoscapeExport::new();
        let document: Value =
            serde_json::from_str(&export.export(&network).unwrap()).unwrap();

        let species = document["elements"]["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|node| node["data"]["id"] == json!("s1_glyph"))
            .unwrap();
        assert_eq!(species["data"]["parent"], json!("c1_glyph"));
        assert_eq!(species["position"]["x"], json!(70.0));
    }

    #[test]
    fn product_edge_points_at_species() {
        let network = sample_network();
        let mut export = CytoscapeExport::new();
        let document: Value =
            serde_json::from_str(&export.export(&network).unwrap()).unwrap();

        let edge = &document["elements"]["edges"][0];
        assert_eq!(edge["data"]["source"], json!("r1_glyph"));
        assert_eq!(edge["data"]["target"], json!("s1_glyph"));

        let style = document["style"]
            .as_array()
            .unwrap()
            .iter()
            .find(|entry| entry["selector"] == json!("edge[id = 'sr1_glyph']"))
            .unwrap();
        assert_eq!(style["style"]["target-arrow-shape"], json!("triangle"));
    }

    #[test]
    fn node_style_resolves_fill() {
        let network = sample_network();
        let mut export = CytoscapeExport::new();
        let document: Value =
            serde_json::from_str(&export.export(&network).unwrap()).unwrap();

        let style = document["style"]
            .as_array()
            .unwrap()
            .iter()
            .find(|entry| entry["selector"] == json!("node[id = 's1_glyph']"))
            .unwrap();
        assert_eq!(style["style"]["background-color"], json!("#f0e68c"));
        assert_eq!(style["style"]["shape"], json!("rectangle"));
    }
}
