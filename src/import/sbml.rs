//! SBML layout+render import.
//!
//! Reads the first layout of the `layout` package and its local (or the
//! model's global) `render` information, and populates the network IR.
//! Models without layout or render information fall back to a generated
//! default: a grid placement for species with reactions at the centroid
//! of their participants, and a stock style set with arrow-head
//! line-endings. Namespace prefixes are ignored throughout; elements are
//! matched by local name, which tolerates the prefix variety seen in the
//! wild.

use std::path::Path;

use log::{debug, info, warn};
use roxmltree::{Document, Node};

use crate::error::TranslateError;
use crate::geometry::{Point, RelAbsVector};
use crate::ir::{
    BoundingBox, CentroidShape, ColorDefinition, Curve, CurveSegment, EllipseShape, Entity,
    EntityKind, Features, GeometricShape, GradientDefinition, GradientKind, GradientStop,
    GraphicalCurve, GraphicalShape, GraphicalText, HTextAnchor, ImageShape, LineEnding, Network,
    PolygonShape, RectangleShape, RenderCurveShape, RenderVertex, Role, SpeciesReference,
    TextEntity, TextShape, VTextAnchor,
};

pub fn extract_info_from_file(path: &Path) -> Result<Network, TranslateError> {
    let text = std::fs::read_to_string(path).map_err(|source| TranslateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    extract_info(&text)
}

/// Build the network IR from an SBML document.
pub fn extract_info(document: &str) -> Result<Network, TranslateError> {
    let doc = Document::parse(document)
        .map_err(|err| TranslateError::MalformedDocument(err.to_string()))?;
    let model = doc
        .descendants()
        .find(|node| node.has_tag_name("model"))
        .ok_or_else(|| TranslateError::MalformedDocument("no <model> element".to_string()))?;

    let model_info = read_model_info(model);
    let mut network = Network::new();

    let layout = model
        .descendants()
        .find(|node| node.is_element() && node.tag_name().name() == "layout");
    match layout {
        Some(layout) => extract_layout(layout, &model_info, &mut network),
        None => {
            info!("model has no layout information, generating a default layout");
            generate_default_layout(&model_info, &mut network);
        }
    }

    let render = find_render_information(model);
    match render {
        Some(render) => extract_render(render, &mut network),
        None => {
            info!("model has no render information, generating default styles");
            generate_default_render(&mut network);
        }
    }

    accumulate_extents(&mut network);
    Ok(network)
}

// ---------------------------------------------------------------------
// model element tables

struct ModelElement {
    id: String,
    name: Option<String>,
    compartment: Option<String>,
}

struct Participant {
    species: String,
    reference_id: Option<String>,
    role: Role,
}

struct ModelReaction {
    id: String,
    name: Option<String>,
    compartment: Option<String>,
    participants: Vec<Participant>,
}

struct ModelInfo {
    compartments: Vec<ModelElement>,
    species: Vec<ModelElement>,
    reactions: Vec<ModelReaction>,
}

impl ModelInfo {
    fn element_name(&self, id: &str) -> Option<&str> {
        self.compartments
            .iter()
            .chain(self.species.iter())
            .find(|element| element.id == id)
            .and_then(|element| element.name.as_deref())
            .or_else(|| {
                self.reactions
                    .iter()
                    .find(|reaction| reaction.id == id)
                    .and_then(|reaction| reaction.name.as_deref())
            })
    }

    fn species_compartment(&self, species_id: &str) -> Option<&str> {
        self.species
            .iter()
            .find(|element| element.id == species_id)
            .and_then(|element| element.compartment.as_deref())
    }

    fn participant_role(&self, reaction_id: &str, reference_id: &str, species: &str) -> Option<Role> {
        let reaction = self.reactions.iter().find(|r| r.id == reaction_id)?;
        reaction
            .participants
            .iter()
            .find(|p| p.reference_id.as_deref() == Some(reference_id))
            .or_else(|| reaction.participants.iter().find(|p| p.species == species))
            .map(|p| p.role)
    }
}

fn read_model_info(model: Node) -> ModelInfo {
    let mut info = ModelInfo {
        compartments: Vec::new(),
        species: Vec::new(),
        reactions: Vec::new(),
    };

    for node in children_of_list(model, "listOfCompartments", "compartment") {
        info.compartments.push(ModelElement {
            id: attr_string(node, "id").unwrap_or_default(),
            name: attr_string(node, "name"),
            compartment: None,
        });
    }
    for node in children_of_list(model, "listOfSpecies", "species") {
        info.species.push(ModelElement {
            id: attr_string(node, "id").unwrap_or_default(),
            name: attr_string(node, "name"),
            compartment: attr_string(node, "compartment"),
        });
    }
    for node in children_of_list(model, "listOfReactions", "reaction") {
        let mut participants = Vec::new();
        for (list, role) in [
            ("listOfReactants", Role::Substrate),
            ("listOfProducts", Role::Product),
            ("listOfModifiers", Role::Modifier),
        ] {
            for reference in node
                .children()
                .filter(|child| child.has_tag_name(list))
                .flat_map(|child| child.children())
                .filter(|child| {
                    child.is_element() && child.tag_name().name().ends_with("peciesReference")
                })
            {
                let Some(species) = attr_string(reference, "species") else {
                    continue;
                };
                participants.push(Participant {
                    species,
                    reference_id: attr_string(reference, "id"),
                    role,
                });
            }
        }
        info.reactions.push(ModelReaction {
            id: attr_string(node, "id").unwrap_or_default(),
            name: attr_string(node, "name"),
            compartment: attr_string(node, "compartment"),
            participants,
        });
    }
    info
}

// ---------------------------------------------------------------------
// layout extraction

fn extract_layout(layout: Node, model_info: &ModelInfo, network: &mut Network) {
    for glyph in children_of_list(layout, "listOfCompartmentGlyphs", "compartmentGlyph") {
        let reference = attr_string(glyph, "compartment").unwrap_or_default();
        let id = attr_string(glyph, "id").unwrap_or_else(|| format!("{reference}_glyph"));
        let mut entity = Entity::new(EntityKind::Compartment, id, reference);
        entity.meta_id = attr_string(glyph, "metaid");
        entity.features.bounding_box = read_bounding_box(glyph);
        network.compartments.push(entity);
    }

    for glyph in children_of_list(layout, "listOfSpeciesGlyphs", "speciesGlyph") {
        let reference = attr_string(glyph, "species").unwrap_or_default();
        let id = attr_string(glyph, "id").unwrap_or_else(|| format!("{reference}_glyph"));
        let mut entity = Entity::new(EntityKind::Species, id, reference.clone());
        entity.meta_id = attr_string(glyph, "metaid");
        entity.compartment = model_info
            .species_compartment(&reference)
            .map(|c| c.to_string());
        entity.features.bounding_box = read_bounding_box(glyph);
        network.species.push(entity);
    }

    for glyph in children_of_list(layout, "listOfReactionGlyphs", "reactionGlyph") {
        let reference = attr_string(glyph, "reaction").unwrap_or_default();
        let id = attr_string(glyph, "id").unwrap_or_else(|| format!("{reference}_glyph"));
        let mut entity = Entity::new(EntityKind::Reaction, id, reference.clone());
        entity.meta_id = attr_string(glyph, "metaid");
        entity.compartment = model_info
            .reactions
            .iter()
            .find(|reaction| reaction.id == reference)
            .and_then(|reaction| reaction.compartment.clone());
        entity.features.bounding_box = read_bounding_box(glyph);
        entity.features.curve = read_curve(glyph);

        for reference_glyph in children_of_list(
            glyph,
            "listOfSpeciesReferenceGlyphs",
            "speciesReferenceGlyph",
        ) {
            if let Some(sref) =
                read_species_reference_glyph(reference_glyph, &entity.reference_id, model_info, network)
            {
                entity.species_references.push(sref);
            }
        }
        network.reactions.push(entity);
    }

    for glyph in children_of_list(layout, "listOfTextGlyphs", "textGlyph") {
        attach_text_glyph(glyph, model_info, network);
    }
}

fn read_species_reference_glyph(
    glyph: Node,
    reaction_id: &str,
    model_info: &ModelInfo,
    network: &Network,
) -> Option<SpeciesReference> {
    let id = attr_string(glyph, "id")?;
    let reference_id = attr_string(glyph, "speciesReference").unwrap_or_default();
    let species_glyph = attr_string(glyph, "speciesGlyph");
    let species = species_glyph
        .as_deref()
        .and_then(|glyph_id| network.find_species_glyph(glyph_id))
        .map(|entity| entity.reference_id.clone());

    // Explicit role attribute first, then the participant type recorded
    // in the model reaction.
    let role = attr_string(glyph, "role")
        .and_then(|token| Role::parse(&token))
        .or_else(|| {
            model_info.participant_role(
                reaction_id,
                &reference_id,
                species.as_deref().unwrap_or_default(),
            )
        })
        .unwrap_or(Role::Substrate);

    let mut features = Features::default();
    features.curve = read_curve(glyph);
    if let Some(curve) = &features.curve {
        features.start_point = curve.start_point();
        features.end_point = curve.end_point();
        features.start_slope = curve.start_slope();
        features.end_slope = curve.end_slope();
    }

    Some(SpeciesReference {
        id,
        reference_id,
        species,
        species_glyph,
        role,
        features,
    })
}

fn attach_text_glyph(glyph: Node, model_info: &ModelInfo, network: &mut Network) {
    let id = attr_string(glyph, "id").unwrap_or_default();
    let target = attr_string(glyph, "graphicalObject");
    let origin = attr_string(glyph, "originOfText");
    let plain_text = attr_string(glyph, "text");

    let origin_of_text = origin.as_deref().map(|origin| {
        model_info
            .element_name(origin)
            .unwrap_or(origin)
            .to_string()
    });

    let mut features = Features::default();
    features.bounding_box = read_bounding_box(glyph);

    let text = TextEntity {
        id,
        plain_text,
        origin_of_text,
        features,
    };

    let Some(target) = target else {
        debug!("text glyph {} has no graphicalObject, skipping", text.id);
        return;
    };
    for entity in network
        .compartments
        .iter_mut()
        .chain(network.species.iter_mut())
        .chain(network.reactions.iter_mut())
    {
        if entity.id == target {
            entity.texts.push(text);
            return;
        }
    }
    debug!("text glyph {} targets unknown glyph {target}", text.id);
}

fn read_bounding_box(node: Node) -> Option<BoundingBox> {
    let bbox = node
        .children()
        .find(|child| child.has_tag_name("boundingBox"))?;
    let (x, y) = match bbox.children().find(|child| child.has_tag_name("position")) {
        Some(position) => (attr_f64(position, "x")?, attr_f64(position, "y")?),
        None => (attr_f64(bbox, "x")?, attr_f64(bbox, "y")?),
    };
    let (width, height) = match bbox
        .children()
        .find(|child| child.has_tag_name("dimensions"))
    {
        Some(dimensions) => (
            attr_f64(dimensions, "width")?,
            attr_f64(dimensions, "height")?,
        ),
        None => (attr_f64(bbox, "width")?, attr_f64(bbox, "height")?),
    };
    Some(BoundingBox::new(x, y, width, height))
}

fn read_curve(node: Node) -> Option<Curve> {
    let curve = node.children().find(|child| child.has_tag_name("curve"))?;
    let mut segments = Vec::new();
    for segment in curve
        .children()
        .filter(|child| child.has_tag_name("listOfCurveSegments"))
        .flat_map(|list| list.children())
        .filter(|child| child.is_element())
    {
        let Some(start) = read_point_child(segment, "start") else {
            continue;
        };
        let Some(end) = read_point_child(segment, "end") else {
            continue;
        };
        let base_point1 = read_point_child(segment, "basePoint1");
        let base_point2 = read_point_child(segment, "basePoint2");
        let is_cubic =
            base_point1.is_some() || base_point2.is_some() || xsi_type_contains(segment, "CubicBezier");
        if is_cubic {
            segments.push(CurveSegment::Cubic {
                start,
                end,
                base_point1: base_point1.unwrap_or(start),
                base_point2: base_point2.unwrap_or(end),
            });
        } else {
            segments.push(CurveSegment::Line { start, end });
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(Curve { segments })
    }
}

fn read_point_child(node: Node, name: &str) -> Option<Point> {
    let child = node.children().find(|child| child.has_tag_name(name))?;
    Some(Point::new(attr_f64(child, "x")?, attr_f64(child, "y")?))
}

// ---------------------------------------------------------------------
// render extraction

fn find_render_information<'a>(model: Node<'a, 'a>) -> Option<Node<'a, 'a>> {
    // A layout's local render information takes precedence over the
    // model-level global one.
    model
        .descendants()
        .find(|node| {
            node.is_element()
                && node.tag_name().name() == "renderInformation"
                && ancestor_has_name(*node, "listOfRenderInformation")
        })
        .or_else(|| {
            model
                .descendants()
                .find(|node| node.is_element() && node.tag_name().name() == "renderInformation")
        })
}

fn ancestor_has_name(node: Node, name: &str) -> bool {
    node.ancestors()
        .any(|ancestor| ancestor.is_element() && ancestor.tag_name().name() == name)
}

fn extract_render(render: Node, network: &mut Network) {
    if let Some(background) = attr_string(render, "backgroundColor") {
        network.background_color = background;
    }

    for color in children_of_list(render, "listOfColorDefinitions", "colorDefinition") {
        let Some(id) = attr_string(color, "id") else {
            continue;
        };
        network.add_color(ColorDefinition {
            id,
            value: attr_string(color, "value"),
        });
    }

    for list in render
        .children()
        .filter(|child| child.has_tag_name("listOfGradientDefinitions"))
    {
        for gradient in list.children().filter(|child| child.is_element()) {
            if let Some(definition) = read_gradient(gradient) {
                network.add_gradient(definition);
            }
        }
    }

    for ending in children_of_list(render, "listOfLineEndings", "lineEnding") {
        let Some(id) = attr_string(ending, "id") else {
            continue;
        };
        let group = ending.children().find(|child| child.has_tag_name("g"));
        let graphical_shape = group.map(read_shape_group).unwrap_or_default();
        network.add_line_ending(LineEnding {
            id,
            bounding_box: read_bounding_box(ending),
            graphical_shape,
            enable_rotational_mapping: attr_string(ending, "enableRotationalMapping")
                .map(|value| value != "false")
                .unwrap_or(true),
        });
    }

    let styles = read_styles(render);
    apply_styles(&styles, network);
}

fn read_gradient(node: Node) -> Option<GradientDefinition> {
    let id = attr_string(node, "id")?;
    let kind = match node.tag_name().name() {
        "linearGradient" => GradientKind::Linear {
            x1: attr_relabs(node, "x1").unwrap_or(RelAbsVector::relative(0.0)),
            y1: attr_relabs(node, "y1").unwrap_or(RelAbsVector::relative(0.0)),
            x2: attr_relabs(node, "x2").unwrap_or(RelAbsVector::relative(100.0)),
            y2: attr_relabs(node, "y2").unwrap_or(RelAbsVector::relative(100.0)),
        },
        "radialGradient" => GradientKind::Radial {
            cx: attr_relabs(node, "cx").unwrap_or(RelAbsVector::relative(50.0)),
            cy: attr_relabs(node, "cy").unwrap_or(RelAbsVector::relative(50.0)),
            r: attr_relabs(node, "r").unwrap_or(RelAbsVector::relative(50.0)),
        },
        _ => return None,
    };
    let mut stops = Vec::new();
    for stop in node.descendants().filter(|child| {
        child.is_element() && child.tag_name().name() == "stop"
    }) {
        let Some(color) = attr_string(stop, "stop-color") else {
            continue;
        };
        stops.push(GradientStop {
            offset: attr_relabs(stop, "offset").unwrap_or(RelAbsVector::relative(0.0)),
            color,
        });
    }
    Some(GradientDefinition { id, kind, stops })
}

struct RenderStyle {
    id_list: Vec<String>,
    role_list: Vec<String>,
    type_list: Vec<String>,
    shape: GraphicalShape,
    curve: GraphicalCurve,
    text: GraphicalText,
}

fn read_styles(render: Node) -> Vec<RenderStyle> {
    let mut styles = Vec::new();
    for list in render
        .children()
        .filter(|child| child.has_tag_name("listOfStyles"))
    {
        for style in list
            .children()
            .filter(|child| child.is_element() && child.tag_name().name() == "style")
        {
            let Some(group) = style.children().find(|child| child.has_tag_name("g")) else {
                continue;
            };
            styles.push(RenderStyle {
                id_list: attr_tokens(style, "idList"),
                role_list: attr_tokens(style, "roleList"),
                type_list: attr_tokens(style, "typeList"),
                shape: read_shape_group(group),
                curve: read_curve_group(group),
                text: read_text_group(group),
            });
        }
    }
    styles
}

fn read_shape_group(group: Node) -> GraphicalShape {
    GraphicalShape {
        stroke: attr_string(group, "stroke"),
        stroke_width: attr_f64(group, "stroke-width"),
        stroke_dash_array: read_dash_array(group),
        fill: attr_string(group, "fill"),
        fill_rule: attr_string(group, "fill-rule"),
        geometric_shapes: group
            .children()
            .filter(|child| child.is_element())
            .filter_map(read_geometric_shape)
            .collect(),
    }
}

fn read_curve_group(group: Node) -> GraphicalCurve {
    GraphicalCurve {
        stroke: attr_string(group, "stroke"),
        stroke_width: attr_f64(group, "stroke-width"),
        stroke_dash_array: read_dash_array(group),
        start_head: attr_string(group, "startHead"),
        end_head: attr_string(group, "endHead"),
    }
}

fn read_text_group(group: Node) -> GraphicalText {
    GraphicalText {
        stroke: attr_string(group, "stroke"),
        font_family: attr_string(group, "font-family"),
        font_size: attr_relabs(group, "font-size"),
        font_weight: attr_string(group, "font-weight"),
        font_style: attr_string(group, "font-style"),
        h_text_anchor: attr_string(group, "text-anchor").and_then(|t| HTextAnchor::parse(&t)),
        v_text_anchor: attr_string(group, "vtext-anchor").and_then(|t| VTextAnchor::parse(&t)),
    }
}

fn read_dash_array(node: Node) -> Option<Vec<f64>> {
    let raw = attr_string(node, "stroke-dasharray")?;
    let values: Vec<f64> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn read_geometric_shape(node: Node) -> Option<GeometricShape> {
    match node.tag_name().name() {
        "rectangle" => Some(GeometricShape::Rectangle(RectangleShape {
            x: attr_relabs(node, "x"),
            y: attr_relabs(node, "y"),
            width: attr_relabs(node, "width"),
            height: attr_relabs(node, "height"),
            rx: attr_relabs(node, "rx"),
            ry: attr_relabs(node, "ry"),
            ratio: attr_f64(node, "ratio"),
            stroke: attr_string(node, "stroke"),
            stroke_width: attr_f64(node, "stroke-width"),
            fill: attr_string(node, "fill"),
        })),
        "ellipse" => Some(GeometricShape::Ellipse(EllipseShape {
            cx: attr_relabs(node, "cx"),
            cy: attr_relabs(node, "cy"),
            rx: attr_relabs(node, "rx"),
            ry: attr_relabs(node, "ry"),
            ratio: attr_f64(node, "ratio"),
            stroke: attr_string(node, "stroke"),
            stroke_width: attr_f64(node, "stroke-width"),
            fill: attr_string(node, "fill"),
        })),
        "polygon" => Some(GeometricShape::Polygon(PolygonShape {
            vertices: read_render_vertices(node),
            stroke: attr_string(node, "stroke"),
            stroke_width: attr_f64(node, "stroke-width"),
            fill: attr_string(node, "fill"),
            fill_rule: attr_string(node, "fill-rule"),
        })),
        "image" => Some(GeometricShape::Image(ImageShape {
            x: attr_relabs(node, "x"),
            y: attr_relabs(node, "y"),
            width: attr_relabs(node, "width"),
            height: attr_relabs(node, "height"),
            href: attr_string(node, "href").unwrap_or_default(),
        })),
        "text" => Some(GeometricShape::Text(TextShape {
            x: attr_relabs(node, "x"),
            y: attr_relabs(node, "y"),
            font_family: attr_string(node, "font-family"),
            font_size: attr_relabs(node, "font-size"),
            font_weight: attr_string(node, "font-weight"),
            font_style: attr_string(node, "font-style"),
            h_text_anchor: attr_string(node, "text-anchor").and_then(|t| HTextAnchor::parse(&t)),
            v_text_anchor: attr_string(node, "vtext-anchor").and_then(|t| VTextAnchor::parse(&t)),
        })),
        "curve" | "renderCurve" => Some(GeometricShape::RenderCurve(RenderCurveShape {
            vertices: read_render_vertices(node),
            stroke: attr_string(node, "stroke"),
            stroke_width: attr_f64(node, "stroke-width"),
        })),
        _ => None,
    }
}

fn read_render_vertices(node: Node) -> Vec<RenderVertex> {
    let mut vertices = Vec::new();
    for element in node
        .children()
        .filter(|child| child.has_tag_name("listOfElements"))
        .flat_map(|list| list.children())
        .filter(|child| child.is_element() && child.tag_name().name() == "element")
    {
        let Some(x) = attr_relabs(element, "x") else {
            continue;
        };
        let Some(y) = attr_relabs(element, "y") else {
            continue;
        };
        let base_point1 = match (
            attr_relabs(element, "basePoint1_x"),
            attr_relabs(element, "basePoint1_y"),
        ) {
            (Some(bx), Some(by)) => Some((bx, by)),
            _ => None,
        };
        let base_point2 = match (
            attr_relabs(element, "basePoint2_x"),
            attr_relabs(element, "basePoint2_y"),
        ) {
            (Some(bx), Some(by)) => Some((bx, by)),
            _ => None,
        };
        vertices.push(RenderVertex {
            x,
            y,
            base_point1,
            base_point2,
        });
    }
    vertices
}

fn apply_styles(styles: &[RenderStyle], network: &mut Network) {
    let compartments = std::mem::take(&mut network.compartments);
    network.compartments = compartments
        .into_iter()
        .map(|mut entity| {
            apply_entity_style(styles, &mut entity, "COMPARTMENTGLYPH");
            entity
        })
        .collect();
    let species = std::mem::take(&mut network.species);
    network.species = species
        .into_iter()
        .map(|mut entity| {
            apply_entity_style(styles, &mut entity, "SPECIESGLYPH");
            entity
        })
        .collect();
    let reactions = std::mem::take(&mut network.reactions);
    network.reactions = reactions
        .into_iter()
        .map(|mut entity| {
            apply_entity_style(styles, &mut entity, "REACTIONGLYPH");
            for reference in &mut entity.species_references {
                if let Some(style) = find_style(
                    styles,
                    &reference.id,
                    Some(reference.role.as_str()),
                    "SPECIESREFERENCEGLYPH",
                ) {
                    reference.features.graphical_curve = Some(style.curve.clone());
                }
            }
            entity
        })
        .collect();
}

fn apply_entity_style(styles: &[RenderStyle], entity: &mut Entity, type_name: &str) {
    if let Some(style) = find_style(styles, &entity.id, None, type_name) {
        entity.features.graphical_shape = Some(style.shape.clone());
        if entity.features.curve.is_some() {
            entity.features.graphical_curve = Some(style.curve.clone());
        }
        for text in &mut entity.texts {
            text.features.graphical_text = Some(style.text.clone());
        }
    }
    for text in &mut entity.texts {
        if let Some(style) = find_style(styles, &text.id, None, "TEXTGLYPH") {
            // A wildcard hit must not clobber the text style inherited
            // from the owning glyph's style above.
            let names_text = style.id_list.iter().any(|candidate| candidate == &text.id)
                || style
                    .type_list
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case("TEXTGLYPH"));
            if names_text {
                text.features.graphical_text = Some(style.text.clone());
            }
        }
    }
}

/// Style matching precedence: idList, then roleList, then typeList
/// (including the GRAPHICALOBJECT/ANY wildcards). A style that names
/// roles never applies to an object with a different role, and type-only
/// matching skips id- or role-constrained styles.
fn find_style<'a>(
    styles: &'a [RenderStyle],
    id: &str,
    role: Option<&str>,
    type_name: &str,
) -> Option<&'a RenderStyle> {
    let type_matches = |style: &RenderStyle| {
        style.type_list.iter().any(|candidate| {
            candidate.eq_ignore_ascii_case(type_name)
                || candidate.eq_ignore_ascii_case("GRAPHICALOBJECT")
                || candidate.eq_ignore_ascii_case("ANY")
        })
    };
    styles
        .iter()
        .find(|style| style.id_list.iter().any(|candidate| candidate == id))
        .or_else(|| {
            let role = role?;
            styles.iter().find(|style| {
                style
                    .role_list
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(role))
                    && (style.type_list.is_empty() || type_matches(style))
            })
        })
        .or_else(|| {
            styles.iter().find(|style| {
                style.id_list.is_empty() && style.role_list.is_empty() && type_matches(style)
            })
        })
}

// ---------------------------------------------------------------------
// default layout / render fallbacks

const DEFAULT_SPECIES_WIDTH: f64 = 60.0;
const DEFAULT_SPECIES_HEIGHT: f64 = 36.0;
const DEFAULT_GRID_SPACING_X: f64 = 150.0;
const DEFAULT_GRID_SPACING_Y: f64 = 100.0;
const DEFAULT_GRID_ORIGIN: f64 = 75.0;
const DEFAULT_COMPARTMENT_PADDING: f64 = 50.0;

fn generate_default_layout(model_info: &ModelInfo, network: &mut Network) {
    let count = model_info.species.len().max(1);
    let columns = (count as f64).sqrt().ceil() as usize;

    for (index, species) in model_info.species.iter().enumerate() {
        let column = index % columns;
        let row = index / columns;
        let mut entity = Entity::new(
            EntityKind::Species,
            format!("{}_glyph", species.id),
            species.id.clone(),
        );
        entity.compartment = species.compartment.clone();
        entity.features.bounding_box = Some(BoundingBox::new(
            DEFAULT_GRID_ORIGIN + column as f64 * DEFAULT_GRID_SPACING_X,
            DEFAULT_GRID_ORIGIN + row as f64 * DEFAULT_GRID_SPACING_Y,
            DEFAULT_SPECIES_WIDTH,
            DEFAULT_SPECIES_HEIGHT,
        ));
        entity.texts.push(TextEntity {
            id: format!("{}_text", entity.id),
            plain_text: None,
            origin_of_text: Some(
                species
                    .name
                    .clone()
                    .unwrap_or_else(|| species.id.clone()),
            ),
            features: Features {
                bounding_box: entity.features.bounding_box,
                ..Default::default()
            },
        });
        network.species.push(entity);
    }

    // Every compartment box covers the species grid; overlapping boxes
    // are acceptable for a fallback placement.
    let mut grid = crate::ir::Extents::empty();
    for species in &network.species {
        if let Some(bbox) = &species.features.bounding_box {
            grid.expand_box(bbox);
        }
    }
    for compartment in &model_info.compartments {
        let mut entity = Entity::new(
            EntityKind::Compartment,
            format!("{}_glyph", compartment.id),
            compartment.id.clone(),
        );
        entity.features.bounding_box = Some(if grid.is_empty() {
            BoundingBox::new(0.0, 0.0, 500.0, 500.0)
        } else {
            BoundingBox::new(
                grid.min_x - DEFAULT_COMPARTMENT_PADDING,
                grid.min_y - DEFAULT_COMPARTMENT_PADDING,
                grid.width() + 2.0 * DEFAULT_COMPARTMENT_PADDING,
                grid.height() + 2.0 * DEFAULT_COMPARTMENT_PADDING,
            )
        });
        entity.texts.push(TextEntity {
            id: format!("{}_text", entity.id),
            plain_text: None,
            origin_of_text: Some(
                compartment
                    .name
                    .clone()
                    .unwrap_or_else(|| compartment.id.clone()),
            ),
            features: Features {
                bounding_box: entity.features.bounding_box,
                ..Default::default()
            },
        });
        network.compartments.push(entity);
    }

    for reaction in &model_info.reactions {
        let mut entity = Entity::new(
            EntityKind::Reaction,
            format!("{}_glyph", reaction.id),
            reaction.id.clone(),
        );
        entity.compartment = reaction.compartment.clone();

        let mut centroid = Point::new(0.0, 0.0);
        let mut centers = 0usize;
        for participant in &reaction.participants {
            let glyph_id = format!("{}_glyph", participant.species);
            if let Some(bbox) = network
                .find_species_glyph(&glyph_id)
                .and_then(|entity| entity.features.bounding_box)
            {
                let center = bbox.center();
                centroid.x += center.x;
                centroid.y += center.y;
                centers += 1;
            }
        }
        if centers > 0 {
            centroid.x /= centers as f64;
            centroid.y /= centers as f64;
        } else {
            centroid = Point::new(DEFAULT_GRID_ORIGIN, DEFAULT_GRID_ORIGIN);
        }

        entity.features.curve = Some(Curve {
            segments: vec![CurveSegment::Line {
                start: Point::new(centroid.x - 10.0, centroid.y),
                end: Point::new(centroid.x + 10.0, centroid.y),
            }],
        });

        for (index, participant) in reaction.participants.iter().enumerate() {
            let glyph_id = format!("{}_glyph", participant.species);
            let Some(species_center) = network
                .find_species_glyph(&glyph_id)
                .and_then(|entity| entity.features.bounding_box)
                .map(|bbox| bbox.center())
            else {
                warn!(
                    "reaction {} references species {} without a glyph",
                    reaction.id, participant.species
                );
                continue;
            };
            let (start, end) = if participant.role.towards_species() {
                (centroid, species_center)
            } else {
                (species_center, centroid)
            };
            let curve = Curve {
                segments: vec![CurveSegment::Line { start, end }],
            };
            let features = Features {
                start_point: curve.start_point(),
                end_point: curve.end_point(),
                start_slope: curve.start_slope(),
                end_slope: curve.end_slope(),
                curve: Some(curve),
                ..Default::default()
            };
            entity.species_references.push(SpeciesReference {
                id: format!("{}_srglyph_{}", reaction.id, index + 1),
                reference_id: participant
                    .reference_id
                    .clone()
                    .unwrap_or_else(|| format!("{}_sr_{}", reaction.id, index + 1)),
                species: Some(participant.species.clone()),
                species_glyph: Some(glyph_id),
                role: participant.role,
                features,
            });
        }
        network.reactions.push(entity);
    }
}

fn generate_default_render(network: &mut Network) {
    network.background_color = "#ffffff".to_string();
    for (id, value) in [
        ("white", "#ffffff"),
        ("black", "#000000"),
        ("darkcyan", "#008b8b"),
        ("lightgray", "#d3d3d3"),
        ("khaki", "#f0e68c"),
    ] {
        network.add_color(ColorDefinition {
            id: id.to_string(),
            value: Some(value.to_string()),
        });
    }

    network.add_line_ending(default_arrow_head());
    network.add_line_ending(default_modifier_head());
    network.add_line_ending(default_inhibitor_head());

    for entity in &mut network.compartments {
        entity.features.graphical_shape = Some(GraphicalShape {
            stroke: Some("darkcyan".to_string()),
            stroke_width: Some(2.0),
            fill: Some("lightgray".to_string()),
            geometric_shapes: vec![GeometricShape::Rectangle(RectangleShape {
                rx: Some(RelAbsVector::relative(10.0)),
                ry: Some(RelAbsVector::relative(10.0)),
                ..Default::default()
            })],
            ..Default::default()
        });
        for text in &mut entity.texts {
            text.features.graphical_text = Some(GraphicalText {
                stroke: Some("darkcyan".to_string()),
                font_size: Some(RelAbsVector::absolute(10.0)),
                h_text_anchor: Some(HTextAnchor::Middle),
                v_text_anchor: Some(VTextAnchor::Bottom),
                ..Default::default()
            });
        }
    }

    for entity in &mut network.species {
        entity.features.graphical_shape = Some(GraphicalShape {
            stroke: Some("black".to_string()),
            stroke_width: Some(2.0),
            fill: Some("khaki".to_string()),
            geometric_shapes: vec![GeometricShape::Rectangle(RectangleShape {
                rx: Some(RelAbsVector::absolute(6.0)),
                ry: Some(RelAbsVector::absolute(6.0)),
                ..Default::default()
            })],
            ..Default::default()
        });
        for text in &mut entity.texts {
            text.features.graphical_text = Some(GraphicalText {
                stroke: Some("black".to_string()),
                font_size: Some(RelAbsVector::absolute(12.0)),
                h_text_anchor: Some(HTextAnchor::Middle),
                v_text_anchor: Some(VTextAnchor::Middle),
                ..Default::default()
            });
        }
    }

    for entity in &mut network.reactions {
        entity.features.graphical_curve = Some(GraphicalCurve {
            stroke: Some("black".to_string()),
            stroke_width: Some(1.5),
            ..Default::default()
        });
        entity.features.graphical_shape = Some(GraphicalShape {
            stroke: Some("black".to_string()),
            stroke_width: Some(1.5),
            fill: Some("white".to_string()),
            geometric_shapes: vec![GeometricShape::Centroid(CentroidShape {
                rx: Some(RelAbsVector::absolute(4.0)),
                ry: Some(RelAbsVector::absolute(4.0)),
                ..Default::default()
            })],
            ..Default::default()
        });
        for reference in &mut entity.species_references {
            let end_head = match reference.role {
                Role::Product | Role::SideProduct => Some("arrowHead".to_string()),
                Role::Modifier | Role::Activator => Some("modifierHead".to_string()),
                Role::Inhibitor => Some("inhibitorHead".to_string()),
                Role::Substrate | Role::SideSubstrate => None,
            };
            reference.features.graphical_curve = Some(GraphicalCurve {
                stroke: Some("black".to_string()),
                stroke_width: Some(1.5),
                end_head,
                ..Default::default()
            });
        }
    }
}

fn default_arrow_head() -> LineEnding {
    LineEnding {
        id: "arrowHead".to_string(),
        bounding_box: Some(BoundingBox::new(-12.0, -6.0, 12.0, 12.0)),
        graphical_shape: GraphicalShape {
            stroke: Some("black".to_string()),
            stroke_width: Some(1.5),
            fill: Some("black".to_string()),
            geometric_shapes: vec![GeometricShape::Polygon(PolygonShape {
                vertices: vec![
                    RenderVertex {
                        x: RelAbsVector::relative(0.0),
                        y: RelAbsVector::relative(0.0),
                        ..Default::default()
                    },
                    RenderVertex {
                        x: RelAbsVector::relative(100.0),
                        y: RelAbsVector::relative(50.0),
                        ..Default::default()
                    },
                    RenderVertex {
                        x: RelAbsVector::relative(0.0),
                        y: RelAbsVector::relative(100.0),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            })],
            ..Default::default()
        },
        enable_rotational_mapping: true,
    }
}

fn default_modifier_head() -> LineEnding {
    LineEnding {
        id: "modifierHead".to_string(),
        bounding_box: Some(BoundingBox::new(-12.0, -6.0, 12.0, 12.0)),
        graphical_shape: GraphicalShape {
            stroke: Some("black".to_string()),
            stroke_width: Some(1.5),
            fill: Some("white".to_string()),
            geometric_shapes: vec![GeometricShape::Ellipse(EllipseShape::default())],
            ..Default::default()
        },
        enable_rotational_mapping: true,
    }
}

fn default_inhibitor_head() -> LineEnding {
    LineEnding {
        id: "inhibitorHead".to_string(),
        bounding_box: Some(BoundingBox::new(-3.0, -8.0, 3.0, 16.0)),
        graphical_shape: GraphicalShape {
            stroke: Some("black".to_string()),
            stroke_width: Some(1.5),
            fill: Some("black".to_string()),
            geometric_shapes: vec![GeometricShape::Rectangle(RectangleShape::default())],
            ..Default::default()
        },
        enable_rotational_mapping: true,
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
        expand_with_features(&mut extents, &entity.features);
        for text in &entity.texts {
            expand_with_features(&mut extents, &text.features);
        }
        for reference in &entity.species_references {
            expand_with_features(&mut extents, &reference.features);
        }
    }
    network.extents = extents;
}

fn expand_with_features(extents: &mut crate::ir::Extents, features: &Features) {
    if let Some(bbox) = &features.bounding_box {
        extents.expand_box(bbox);
    }
    if let Some(curve) = &features.curve {
        for segment in &curve.segments {
            extents.expand_point(segment.start());
            extents.expand_point(segment.end());
        }
    }
}

// ---------------------------------------------------------------------
// attribute helpers

fn children_of_list<'a>(
    parent: Node<'a, 'a>,
    list_name: &'a str,
    item_name: &'a str,
) -> impl Iterator<Item = Node<'a, 'a>> {
    parent
        .descendants()
        .filter(move |node| node.is_element() && node.tag_name().name() == list_name)
        .flat_map(|list| list.children())
        .filter(move |node| node.is_element() && node.tag_name().name() == item_name)
}

fn attr_string(node: Node, name: &str) -> Option<String> {
    node.attributes()
        .find(|attribute| attribute.name() == name)
        .map(|attribute| attribute.value().to_string())
}

fn attr_f64(node: Node, name: &str) -> Option<f64> {
    attr_string(node, name).and_then(|value| value.parse().ok())
}

fn attr_relabs(node: Node, name: &str) -> Option<RelAbsVector> {
    attr_string(node, name).and_then(|value| RelAbsVector::parse(&value))
}

fn attr_tokens(node: Node, name: &str) -> Vec<String> {
    attr_string(node, name)
        .map(|value| {
            value
                .split_whitespace()
                .map(|token| token.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn xsi_type_contains(node: Node, needle: &str) -> bool {
    node.attributes()
        .find(|attribute| attribute.name() == "type")
        .is_some_and(|attribute| attribute.value().contains(needle))
}
