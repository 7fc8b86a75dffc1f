//! SBML layout + render export.
//!
//! Rebuilds a complete level 3 document: the core model lists, one layout
//! with glyphs for every entity, and a local render information block
//! with one style per glyph. Inline `#rrggbb` style values are registered
//! as shared color definitions on the fly, so the emitted styles only
//! ever reference colors by id.

use crate::error::TranslateError;
use crate::ir::{
    BoundingBox, ColorDefinition, Curve, CurveSegment, Entity, GeometricShape, GradientKind,
    GraphicalCurve, GraphicalShape, GraphicalText, Network, RenderVertex, Role, SpeciesReference,
};

use super::{extract_graph_info, NetworkExport};

const SBML_CORE_NS: &str = "http://www.sbml.org/sbml/level3/version1/core";
const SBML_LAYOUT_NS: &str = "http://www.sbml.org/sbml/level3/version1/layout/version1";
const SBML_RENDER_NS: &str = "http://www.sbml.org/sbml/level3/version1/render/version1";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

#[derive(Default)]
pub struct SbmlExport {
    model_compartments: Vec<ModelElement>,
    model_species: Vec<ModelElement>,
    model_reactions: Vec<ModelReaction>,
    compartment_glyphs: String,
    species_glyphs: String,
    reaction_glyphs: String,
    text_glyphs: String,
    styles: String,
    /// Shared colors: seeded from the network, grown by style emission.
    colors: Vec<ColorDefinition>,
    seeded: bool,
    open_reaction: Option<OpenReaction>,
    error: Option<TranslateError>,
}

struct ModelElement {
    id: String,
    name: Option<String>,
    compartment: Option<String>,
}

struct ModelReaction {
    id: String,
    name: Option<String>,
    reactants: Vec<(String, String)>,
    products: Vec<(String, String)>,
    modifiers: Vec<(String, String)>,
}

/// Reaction glyph under construction: its species-reference glyphs arrive
/// through later hook calls.
struct OpenReaction {
    header: String,
    reference_glyphs: String,
}

impl SbmlExport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export(&mut self, network: &Network) -> Result<String, TranslateError> {
        extract_graph_info(self, network);
        self.flush_open_reaction();
        if let Some(error) = self.error.take() {
            return Err(error);
        }

        let mut doc = String::new();
        doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        doc.push_str(&format!(
            "<sbml xmlns=\"{SBML_CORE_NS}\" xmlns:layout=\"{SBML_LAYOUT_NS}\" \
             xmlns:render=\"{SBML_RENDER_NS}\" xmlns:xsi=\"{XSI_NS}\" \
             level=\"3\" version=\"1\" layout:required=\"false\" render:required=\"false\">\n"
        ));
        doc.push_str("  <model id=\"model\">\n");
        self.write_model_lists(&mut doc);
        self.write_layout(&mut doc, network);
        doc.push_str("  </model>\n");
        doc.push_str("</sbml>\n");
        Ok(doc)
    }

    fn write_model_lists(&self, doc: &mut String) {
        if !self.model_compartments.is_empty() {
            doc.push_str("    <listOfCompartments>\n");
            for compartment in &self.model_compartments {
                doc.push_str(&format!(
                    "      <compartment id=\"{}\"{} constant=\"true\"/>\n",
                    esc(&compartment.id),
                    name_attr(&compartment.name),
                ));
            }
            doc.push_str("    </listOfCompartments>\n");
        }
        if !self.model_species.is_empty() {
            doc.push_str("    <listOfSpecies>\n");
            for species in &self.model_species {
                let compartment = species
                    .compartment
                    .as_deref()
                    .map(|c| format!(" compartment=\"{}\"", esc(c)))
                    .unwrap_or_default();
                doc.push_str(&format!(
                    "      <species id=\"{}\"{}{} hasOnlySubstanceUnits=\"false\" \
                     boundaryCondition=\"false\" constant=\"false\"/>\n",
                    esc(&species.id),
                    name_attr(&species.name),
                    compartment,
                ));
            }
            doc.push_str("    </listOfSpecies>\n");
        }
        if !self.model_reactions.is_empty() {
            doc.push_str("    <listOfReactions>\n");
            for reaction in &self.model_reactions {
                doc.push_str(&format!(
                    "      <reaction id=\"{}\"{} reversible=\"false\" fast=\"false\">\n",
                    esc(&reaction.id),
                    name_attr(&reaction.name),
                ));
                write_participant_list(doc, "listOfReactants", &reaction.reactants, true);
                write_participant_list(doc, "listOfProducts", &reaction.products, true);
                write_participant_list(doc, "listOfModifiers", &reaction.modifiers, false);
                doc.push_str("      </reaction>\n");
            }
            doc.push_str("    </listOfReactions>\n");
        }
    }

    fn write_layout(&self, doc: &mut String, network: &Network) {
        doc.push_str("    <layout:listOfLayouts>\n");
        doc.push_str("      <layout:layout layout:id=\"layout_1\">\n");
        let extents = &network.extents;
        let (width, height) = if extents.is_empty() {
            (0.0, 0.0)
        } else {
            (extents.max_x, extents.max_y)
        };
        doc.push_str(&format!(
            "        <layout:dimensions layout:width=\"{width}\" layout:height=\"{height}\"/>\n"
        ));
        write_glyph_list(doc, "listOfCompartmentGlyphs", &self.compartment_glyphs);
        write_glyph_list(doc, "listOfSpeciesGlyphs", &self.species_glyphs);
        write_glyph_list(doc, "listOfReactionGlyphs", &self.reaction_glyphs);
        write_glyph_list(doc, "listOfTextGlyphs", &self.text_glyphs);
        self.write_render(doc, network);
        doc.push_str("      </layout:layout>\n");
        doc.push_str("    </layout:listOfLayouts>\n");
    }

    fn write_render(&self, doc: &mut String, network: &Network) {
        doc.push_str("        <render:listOfRenderInformation>\n");
        doc.push_str(&format!(
            "          <render:renderInformation render:id=\"render_1\" \
             render:backgroundColor=\"{}\">\n",
            esc(&network.background_color)
        ));

        if !self.colors.is_empty() {
            doc.push_str("            <render:listOfColorDefinitions>\n");
            for color in &self.colors {
                let value = color
                    .value
                    .as_deref()
                    .map(|v| format!(" render:value=\"{}\"", esc(v)))
                    .unwrap_or_default();
                doc.push_str(&format!(
                    "              <render:colorDefinition render:id=\"{}\"{}/>\n",
                    esc(&color.id),
                    value,
                ));
            }
            doc.push_str("            </render:listOfColorDefinitions>\n");
        }

        if !network.gradients.is_empty() {
            doc.push_str("            <render:listOfGradientDefinitions>\n");
            for gradient in &network.gradients {
                let (tag, attrs) = match &gradient.kind {
                    GradientKind::Linear { x1, y1, x2, y2 } => (
                        "linearGradient",
                        format!(
                            " render:x1=\"{}\" render:y1=\"{}\" render:x2=\"{}\" render:y2=\"{}\"",
                            x1.to_sbml_string(),
                            y1.to_sbml_string(),
                            x2.to_sbml_string(),
                            y2.to_sbml_string(),
                        ),
                    ),
                    GradientKind::Radial { cx, cy, r } => (
                        "radialGradient",
                        format!(
                            " render:cx=\"{}\" render:cy=\"{}\" render:r=\"{}\"",
                            cx.to_sbml_string(),
                            cy.to_sbml_string(),
                            r.to_sbml_string(),
                        ),
                    ),
                };
                doc.push_str(&format!(
                    "              <render:{tag} render:id=\"{}\"{attrs}>\n",
                    esc(&gradient.id),
                ));
                for stop in &gradient.stops {
                    doc.push_str(&format!(
                        "                <render:stop render:offset=\"{}\" \
                         render:stop-color=\"{}\"/>\n",
                        stop.offset.to_sbml_string(),
                        esc(&stop.color),
                    ));
                }
                doc.push_str(&format!("              </render:{tag}>\n"));
            }
            doc.push_str("            </render:listOfGradientDefinitions>\n");
        }

        if !network.line_endings.is_empty() {
            doc.push_str("            <render:listOfLineEndings>\n");
            for ending in &network.line_endings {
                doc.push_str(&format!(
                    "              <render:lineEnding render:id=\"{}\" \
                     render:enableRotationalMapping=\"{}\">\n",
                    esc(&ending.id),
                    ending.enable_rotational_mapping,
                ));
                if let Some(bbox) = &ending.bounding_box {
                    write_bounding_box(doc, bbox, "                ");
                }
                doc.push_str(&group_xml(&ending.graphical_shape, None, "                "));
                doc.push_str("              </render:lineEnding>\n");
            }
            doc.push_str("            </render:listOfLineEndings>\n");
        }

        if !self.styles.is_empty() {
            doc.push_str("            <render:listOfStyles>\n");
            doc.push_str(&self.styles);
            doc.push_str("            </render:listOfStyles>\n");
        }

        doc.push_str("          </render:renderInformation>\n");
        doc.push_str("        </render:listOfRenderInformation>\n");
    }

    fn seed_colors(&mut self, network: &Network) {
        if !self.seeded {
            self.colors = network.colors.clone();
            self.seeded = true;
        }
    }

    /// Style attributes must reference shared resources; literal hex
    /// values get a `colorN` definition allocated on first use.
    fn color_reference(&mut self, value: &str) -> String {
        if !value.starts_with('#') {
            return value.to_string();
        }
        if let Some(existing) = self
            .colors
            .iter()
            .find(|color| color.value.as_deref() == Some(value))
        {
            return existing.id.clone();
        }
        let mut n = 1usize;
        let id = loop {
            let candidate = format!("color{n}");
            if !self.colors.iter().any(|color| color.id == candidate) {
                break candidate;
            }
            n += 1;
        };
        self.colors.push(ColorDefinition {
            id: id.clone(),
            value: Some(value.to_string()),
        });
        id
    }

    fn push_style(&mut self, id_list: &str, body: String) {
        self.styles.push_str(&format!(
            "              <render:style render:idList=\"{}\">\n{body}              </render:style>\n",
            esc(id_list),
        ));
    }

    fn style_for_entity(&mut self, entity: &Entity) {
        let Some(shape) = &entity.features.graphical_shape else {
            return;
        };
        let shape = shape.clone();
        let text = entity
            .texts
            .first()
            .and_then(|text| text.features.graphical_text.clone());
        let body = self.shape_group_xml(&shape, text.as_ref());
        self.push_style(&entity.id, body);
    }

    fn shape_group_xml(&mut self, shape: &GraphicalShape, text: Option<&GraphicalText>) -> String {
        let resolved = GraphicalShape {
            stroke: shape.stroke.as_deref().map(|s| self.color_reference(s)),
            fill: shape.fill.as_deref().map(|f| self.color_reference(f)),
            geometric_shapes: shape
                .geometric_shapes
                .iter()
                .map(|geometric| self.resolve_shape_colors(geometric))
                .collect(),
            ..shape.clone()
        };
        group_xml(&resolved, text, "                ")
    }

    fn resolve_shape_colors(&mut self, shape: &GeometricShape) -> GeometricShape {
        let mut resolved = shape.clone();
        match &mut resolved {
            GeometricShape::Rectangle(rect) => {
                rect.stroke = rect.stroke.as_deref().map(|s| self.color_reference(s));
                rect.fill = rect.fill.as_deref().map(|f| self.color_reference(f));
            }
            GeometricShape::Ellipse(ellipse) => {
                ellipse.stroke = ellipse.stroke.as_deref().map(|s| self.color_reference(s));
                ellipse.fill = ellipse.fill.as_deref().map(|f| self.color_reference(f));
            }
            GeometricShape::Polygon(polygon) => {
                polygon.stroke = polygon.stroke.as_deref().map(|s| self.color_reference(s));
                polygon.fill = polygon.fill.as_deref().map(|f| self.color_reference(f));
            }
            GeometricShape::RenderCurve(curve) => {
                curve.stroke = curve.stroke.as_deref().map(|s| self.color_reference(s));
            }
            GeometricShape::Centroid(centroid) => {
                centroid.stroke = centroid.stroke.as_deref().map(|s| self.color_reference(s));
                centroid.fill = centroid.fill.as_deref().map(|f| self.color_reference(f));
            }
            GeometricShape::Image(_) | GeometricShape::Text(_) => {}
        }
        resolved
    }

    fn style_for_curve(&mut self, id: &str, curve: &GraphicalCurve) {
        let resolved = GraphicalCurve {
            stroke: curve.stroke.as_deref().map(|s| self.color_reference(s)),
            ..curve.clone()
        };
        let mut body = String::from("                <render:g");
        push_curve_attrs(&mut body, &resolved);
        body.push_str("/>\n");
        self.push_style(id, body);
    }

    fn record_entity(&mut self, entity: &Entity) -> bool {
        if entity.reference_id.is_empty() {
            self.error = Some(TranslateError::ModelConstruction(format!(
                "glyph {} has no model reference",
                entity.id
            )));
            return false;
        }
        true
    }

    fn flush_open_reaction(&mut self) {
        let Some(open) = self.open_reaction.take() else {
            return;
        };
        self.reaction_glyphs.push_str(&open.header);
        if !open.reference_glyphs.is_empty() {
            self.reaction_glyphs
                .push_str("            <layout:listOfSpeciesReferenceGlyphs>\n");
            self.reaction_glyphs.push_str(&open.reference_glyphs);
            self.reaction_glyphs
                .push_str("            </layout:listOfSpeciesReferenceGlyphs>\n");
        }
        self.reaction_glyphs
            .push_str("          </layout:reactionGlyph>\n");
    }

    fn add_text_glyphs(&mut self, entity: &Entity) {
        for text in &entity.texts {
            let mut attrs = format!(
                " layout:id=\"{}\" layout:graphicalObject=\"{}\"",
                esc(&text.id),
                esc(&entity.id),
            );
            if let Some(plain) = &text.plain_text {
                attrs.push_str(&format!(" layout:text=\"{}\"", esc(plain)));
            } else if let Some(origin) = &text.origin_of_text {
                attrs.push_str(&format!(" layout:originOfText=\"{}\"", esc(origin)));
            }
            self.text_glyphs
                .push_str(&format!("          <layout:textGlyph{attrs}>\n"));
            if let Some(bbox) = &text.features.bounding_box {
                write_bounding_box(&mut self.text_glyphs, bbox, "            ");
            }
            self.text_glyphs.push_str("          </layout:textGlyph>\n");

            if let Some(graphical) = &text.features.graphical_text {
                let resolved = GraphicalText {
                    stroke: graphical.stroke.as_deref().map(|s| self.color_reference(s)),
                    ..graphical.clone()
                };
                let mut body = String::from("                <render:g");
                push_text_attrs(&mut body, &resolved);
                body.push_str("/>\n");
                self.push_style(&text.id, body);
            }
        }
    }
}

impl NetworkExport for SbmlExport {
    fn reset(&mut self) {
        self.model_compartments.clear();
        self.model_species.clear();
        self.model_reactions.clear();
        self.compartment_glyphs.clear();
        self.species_glyphs.clear();
        self.reaction_glyphs.clear();
        self.text_glyphs.clear();
        self.styles.clear();
        self.colors.clear();
        self.seeded = false;
        self.open_reaction = None;
        self.error = None;
    }

    fn add_compartment(&mut self, network: &Network, compartment: &Entity) {
        self.seed_colors(network);
        if !self.record_entity(compartment) {
            return;
        }
        if !self
            .model_compartments
            .iter()
            .any(|existing| existing.id == compartment.reference_id)
        {
            self.model_compartments.push(ModelElement {
                id: compartment.reference_id.clone(),
                name: text_name(compartment),
                compartment: None,
            });
        }
        self.compartment_glyphs.push_str(&format!(
            "          <layout:compartmentGlyph layout:id=\"{}\" layout:compartment=\"{}\">\n",
            esc(&compartment.id),
            esc(&compartment.reference_id),
        ));
        if let Some(bbox) = &compartment.features.bounding_box {
            write_bounding_box(&mut self.compartment_glyphs, bbox, "            ");
        }
        self.compartment_glyphs
            .push_str("          </layout:compartmentGlyph>\n");
        self.style_for_entity(compartment);
        self.add_text_glyphs(compartment);
    }

    fn add_species(&mut self, network: &Network, species: &Entity) {
        self.seed_colors(network);
        if !self.record_entity(species) {
            return;
        }
        if !self
            .model_species
            .iter()
            .any(|existing| existing.id == species.reference_id)
        {
            self.model_species.push(ModelElement {
                id: species.reference_id.clone(),
                name: text_name(species),
                compartment: species.compartment.clone(),
            });
        }
        self.species_glyphs.push_str(&format!(
            "          <layout:speciesGlyph layout:id=\"{}\" layout:species=\"{}\">\n",
            esc(&species.id),
            esc(&species.reference_id),
        ));
        if let Some(bbox) = &species.features.bounding_box {
            write_bounding_box(&mut self.species_glyphs, bbox, "            ");
        }
        self.species_glyphs
            .push_str("          </layout:speciesGlyph>\n");
        self.style_for_entity(species);
        self.add_text_glyphs(species);
    }

    fn add_reaction(&mut self, network: &Network, reaction: &Entity) {
        self.seed_colors(network);
        self.flush_open_reaction();
        if !self.record_entity(reaction) {
            return;
        }
        if !self
            .model_reactions
            .iter()
            .any(|existing| existing.id == reaction.reference_id)
        {
            self.model_reactions.push(ModelReaction {
                id: reaction.reference_id.clone(),
                name: text_name(reaction),
                reactants: Vec::new(),
                products: Vec::new(),
                modifiers: Vec::new(),
            });
        }

        let mut header = format!(
            "          <layout:reactionGlyph layout:id=\"{}\" layout:reaction=\"{}\">\n",
            esc(&reaction.id),
            esc(&reaction.reference_id),
        );
        if let Some(curve) = &reaction.features.curve {
            header.push_str(&curve_xml(curve, "            "));
        } else if let Some(bbox) = &reaction.features.bounding_box {
            write_bounding_box(&mut header, bbox, "            ");
        }
        self.open_reaction = Some(OpenReaction {
            header,
            reference_glyphs: String::new(),
        });
        self.style_for_entity(reaction);
        self.add_text_glyphs(reaction);
    }

    fn add_species_reference(
        &mut self,
        network: &Network,
        reaction: &Entity,
        reference: &SpeciesReference,
    ) {
        self.seed_colors(network);
        let Some(species) = reference.species.as_deref() else {
            log::debug!(
                "species reference {} has no model species, skipping",
                reference.id
            );
            return;
        };
        let species = species.to_string();

        if let Some(model_reaction) = self
            .model_reactions
            .iter_mut()
            .find(|existing| existing.id == reaction.reference_id)
        {
            let entry = (reference.reference_id.clone(), species.clone());
            let list = match reference.role {
                Role::Substrate | Role::SideSubstrate => &mut model_reaction.reactants,
                Role::Product | Role::SideProduct => &mut model_reaction.products,
                Role::Modifier | Role::Activator | Role::Inhibitor => {
                    &mut model_reaction.modifiers
                }
            };
            if !list.iter().any(|(id, _)| *id == entry.0) {
                list.push(entry);
            }
        }

        let mut glyph = format!(
            "              <layout:speciesReferenceGlyph layout:id=\"{}\" \
             layout:speciesReference=\"{}\"",
            esc(&reference.id),
            esc(&reference.reference_id),
        );
        if let Some(species_glyph) = &reference.species_glyph {
            glyph.push_str(&format!(
                " layout:speciesGlyph=\"{}\"",
                esc(species_glyph)
            ));
        }
        glyph.push_str(&format!(
            " layout:role=\"{}\">\n",
            reference.role.as_str()
        ));
        if let Some(curve) = &reference.features.curve {
            glyph.push_str(&curve_xml(curve, "                "));
        }
        glyph.push_str("              </layout:speciesReferenceGlyph>\n");
        if let Some(open) = &mut self.open_reaction {
            open.reference_glyphs.push_str(&glyph);
        }

        if let Some(curve) = &reference.features.graphical_curve {
            self.style_for_curve(&reference.id, curve);
        }
    }
}

// ---------------------------------------------------------------------
// XML fragments

fn esc(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn name_attr(name: &Option<String>) -> String {
    name.as_deref()
        .map(|n| format!(" name=\"{}\"", esc(n)))
        .unwrap_or_default()
}

/// First attached literal text, used as the model element's name.
fn text_name(entity: &Entity) -> Option<String> {
    entity
        .texts
        .iter()
        .find_map(|text| text.plain_text.clone())
}

fn write_participant_list(
    doc: &mut String,
    list_name: &str,
    entries: &[(String, String)],
    with_stoichiometry: bool,
) {
    if entries.is_empty() {
        return;
    }
    let item = if list_name == "listOfModifiers" {
        "modifierSpeciesReference"
    } else {
        "speciesReference"
    };
    doc.push_str(&format!("        <{list_name}>\n"));
    for (id, species) in entries {
        let id_attr = if id.is_empty() {
            String::new()
        } else {
            format!(" id=\"{}\"", esc(id))
        };
        let tail = if with_stoichiometry {
            " stoichiometry=\"1\" constant=\"true\""
        } else {
            ""
        };
        doc.push_str(&format!(
            "          <{item}{id_attr} species=\"{}\"{tail}/>\n",
            esc(species),
        ));
    }
    doc.push_str(&format!("        </{list_name}>\n"));
}

fn write_glyph_list(doc: &mut String, list_name: &str, body: &str) {
    if body.is_empty() {
        return;
    }
    doc.push_str(&format!("        <layout:{list_name}>\n"));
    doc.push_str(body);
    doc.push_str(&format!("        </layout:{list_name}>\n"));
}

fn write_bounding_box(doc: &mut String, bbox: &BoundingBox, indent: &str) {
    doc.push_str(&format!("{indent}<layout:boundingBox>\n"));
    doc.push_str(&format!(
        "{indent}  <layout:position layout:x=\"{}\" layout:y=\"{}\"/>\n",
        bbox.x, bbox.y
    ));
    doc.push_str(&format!(
        "{indent}  <layout:dimensions layout:width=\"{}\" layout:height=\"{}\"/>\n",
        bbox.width, bbox.height
    ));
    doc.push_str(&format!("{indent}</layout:boundingBox>\n"));
}

fn curve_xml(curve: &Curve, indent: &str) -> String {
    let mut xml = format!("{indent}<layout:curve>\n{indent}  <layout:listOfCurveSegments>\n");
    for segment in &curve.segments {
        match segment {
            CurveSegment::Line { start, end } => {
                xml.push_str(&format!(
                    "{indent}    <layout:curveSegment xsi:type=\"LineSegment\">\n"
                ));
                xml.push_str(&format!(
                    "{indent}      <layout:start layout:x=\"{}\" layout:y=\"{}\"/>\n",
                    start.x, start.y
                ));
                xml.push_str(&format!(
                    "{indent}      <layout:end layout:x=\"{}\" layout:y=\"{}\"/>\n",
                    end.x, end.y
                ));
                xml.push_str(&format!("{indent}    </layout:curveSegment>\n"));
            }
            CurveSegment::Cubic {
                start,
                end,
                base_point1,
                base_point2,
            } => {
                xml.push_str(&format!(
                    "{indent}    <layout:curveSegment xsi:type=\"CubicBezier\">\n"
                ));
                xml.push_str(&format!(
                    "{indent}      <layout:start layout:x=\"{}\" layout:y=\"{}\"/>\n",
                    start.x, start.y
                ));
                xml.push_str(&format!(
                    "{indent}      <layout:end layout:x=\"{}\" layout:y=\"{}\"/>\n",
                    end.x, end.y
                ));
                xml.push_str(&format!(
                    "{indent}      <layout:basePoint1 layout:x=\"{}\" layout:y=\"{}\"/>\n",
                    base_point1.x, base_point1.y
                ));
                xml.push_str(&format!(
                    "{indent}      <layout:basePoint2 layout:x=\"{}\" layout:y=\"{}\"/>\n",
                    base_point2.x, base_point2.y
                ));
                xml.push_str(&format!("{indent}    </layout:curveSegment>\n"));
            }
        }
    }
    xml.push_str(&format!(
        "{indent}  </layout:listOfCurveSegments>\n{indent}</layout:curve>\n"
    ));
    xml
}

fn group_xml(shape: &GraphicalShape, text: Option<&GraphicalText>, indent: &str) -> String {
    let mut xml = format!("{indent}<render:g");
    // The group carries at most one stroke attribute; the shape's wins
    // over the text style's.
    let stroke = shape
        .stroke
        .as_deref()
        .or_else(|| text.and_then(|text| text.stroke.as_deref()));
    if let Some(stroke) = stroke {
        xml.push_str(&format!(" render:stroke=\"{}\"", esc(stroke)));
    }
    if let Some(width) = shape.stroke_width {
        xml.push_str(&format!(" render:stroke-width=\"{width}\""));
    }
    if let Some(fill) = &shape.fill {
        xml.push_str(&format!(" render:fill=\"{}\"", esc(fill)));
    }
    if let Some(rule) = &shape.fill_rule {
        xml.push_str(&format!(" render:fill-rule=\"{}\"", esc(rule)));
    }
    if let Some(text) = text {
        push_font_attrs(&mut xml, text);
    }
    if shape.geometric_shapes.is_empty() {
        xml.push_str("/>\n");
        return xml;
    }
    xml.push_str(">\n");
    for geometric in &shape.geometric_shapes {
        xml.push_str(&geometric_shape_xml(geometric, &format!("{indent}  ")));
    }
    xml.push_str(&format!("{indent}</render:g>\n"));
    xml
}

fn push_curve_attrs(xml: &mut String, curve: &GraphicalCurve) {
    if let Some(stroke) = &curve.stroke {
        xml.push_str(&format!(" render:stroke=\"{}\"", esc(stroke)));
    }
    if let Some(width) = curve.stroke_width {
        xml.push_str(&format!(" render:stroke-width=\"{width}\""));
    }
    if let Some(dashes) = &curve.stroke_dash_array {
        let rendered: Vec<String> = dashes.iter().map(|d| format!("{d}")).collect();
        xml.push_str(&format!(
            " render:stroke-dasharray=\"{}\"",
            rendered.join(", ")
        ));
    }
    if let Some(head) = &curve.start_head {
        xml.push_str(&format!(" render:startHead=\"{}\"", esc(head)));
    }
    if let Some(head) = &curve.end_head {
        xml.push_str(&format!(" render:endHead=\"{}\"", esc(head)));
    }
}

fn push_text_attrs(xml: &mut String, text: &GraphicalText) {
    if let Some(stroke) = &text.stroke {
        xml.push_str(&format!(" render:stroke=\"{}\"", esc(stroke)));
    }
    push_font_attrs(xml, text);
}

fn push_font_attrs(xml: &mut String, text: &GraphicalText) {
    if let Some(family) = &text.font_family {
        xml.push_str(&format!(" render:font-family=\"{}\"", esc(family)));
    }
    if let Some(size) = &text.font_size {
        xml.push_str(&format!(
            " render:font-size=\"{}\"",
            size.to_sbml_string()
        ));
    }
    if let Some(weight) = &text.font_weight {
        xml.push_str(&format!(" render:font-weight=\"{}\"", esc(weight)));
    }
    if let Some(style) = &text.font_style {
        xml.push_str(&format!(" render:font-style=\"{}\"", esc(style)));
    }
    if let Some(anchor) = &text.h_text_anchor {
        xml.push_str(&format!(" render:text-anchor=\"{}\"", anchor.as_str()));
    }
    if let Some(anchor) = &text.v_text_anchor {
        xml.push_str(&format!(" render:vtext-anchor=\"{}\"", anchor.as_str()));
    }
}

fn relabs_attr(name: &str, value: &Option<crate::geometry::RelAbsVector>) -> String {
    value
        .as_ref()
        .map(|v| format!(" render:{name}=\"{}\"", v.to_sbml_string()))
        .unwrap_or_default()
}

fn geometric_shape_xml(shape: &GeometricShape, indent: &str) -> String {
    match shape {
        GeometricShape::Rectangle(rect) => {
            let mut xml = format!("{indent}<render:rectangle");
            xml.push_str(&relabs_attr("x", &rect.x));
            xml.push_str(&relabs_attr("y", &rect.y));
            xml.push_str(&relabs_attr("width", &rect.width));
            xml.push_str(&relabs_attr("height", &rect.height));
            xml.push_str(&relabs_attr("rx", &rect.rx));
            xml.push_str(&relabs_attr("ry", &rect.ry));
            if let Some(ratio) = rect.ratio {
                xml.push_str(&format!(" render:ratio=\"{ratio}\""));
            }
            push_shape_style(&mut xml, &rect.stroke, rect.stroke_width, &rect.fill);
            xml.push_str("/>\n");
            xml
        }
        GeometricShape::Ellipse(ellipse) => {
            let mut xml = format!("{indent}<render:ellipse");
            xml.push_str(&relabs_attr("cx", &ellipse.cx));
            xml.push_str(&relabs_attr("cy", &ellipse.cy));
            xml.push_str(&relabs_attr("rx", &ellipse.rx));
            xml.push_str(&relabs_attr("ry", &ellipse.ry));
            if let Some(ratio) = ellipse.ratio {
                xml.push_str(&format!(" render:ratio=\"{ratio}\""));
            }
            push_shape_style(&mut xml, &ellipse.stroke, ellipse.stroke_width, &ellipse.fill);
            xml.push_str("/>\n");
            xml
        }
        GeometricShape::Polygon(polygon) => {
            let mut xml = format!("{indent}<render:polygon");
            push_shape_style(&mut xml, &polygon.stroke, polygon.stroke_width, &polygon.fill);
            if let Some(rule) = &polygon.fill_rule {
                xml.push_str(&format!(" render:fill-rule=\"{}\"", esc(rule)));
            }
            xml.push_str(">\n");
            xml.push_str(&elements_xml(&polygon.vertices, indent));
            xml.push_str(&format!("{indent}</render:polygon>\n"));
            xml
        }
        GeometricShape::Image(image) => {
            let mut xml = format!("{indent}<render:image");
            xml.push_str(&relabs_attr("x", &image.x));
            xml.push_str(&relabs_attr("y", &image.y));
            xml.push_str(&relabs_attr("width", &image.width));
            xml.push_str(&relabs_attr("height", &image.height));
            xml.push_str(&format!(" render:href=\"{}\"", esc(&image.href)));
            xml.push_str("/>\n");
            xml
        }
        GeometricShape::Text(text) => {
            let mut xml = format!("{indent}<render:text");
            xml.push_str(&relabs_attr("x", &text.x));
            xml.push_str(&relabs_attr("y", &text.y));
            if let Some(family) = &text.font_family {
                xml.push_str(&format!(" render:font-family=\"{}\"", esc(family)));
            }
            xml.push_str(&relabs_attr("font-size", &text.font_size));
            if let Some(weight) = &text.font_weight {
                xml.push_str(&format!(" render:font-weight=\"{}\"", esc(weight)));
            }
            if let Some(style) = &text.font_style {
                xml.push_str(&format!(" render:font-style=\"{}\"", esc(style)));
            }
            if let Some(anchor) = &text.h_text_anchor {
                xml.push_str(&format!(" render:text-anchor=\"{}\"", anchor.as_str()));
            }
            if let Some(anchor) = &text.v_text_anchor {
                xml.push_str(&format!(" render:vtext-anchor=\"{}\"", anchor.as_str()));
            }
            xml.push_str("/>\n");
            xml
        }
        GeometricShape::RenderCurve(curve) => {
            let mut xml = format!("{indent}<render:curve");
            push_shape_style(&mut xml, &curve.stroke, curve.stroke_width, &None);
            xml.push_str(">\n");
            xml.push_str(&elements_xml(&curve.vertices, indent));
            xml.push_str(&format!("{indent}</render:curve>\n"));
            xml
        }
        // No native counterpart; an ellipse with centered radii draws the
        // same marker.
        GeometricShape::Centroid(centroid) => {
            let mut xml = format!("{indent}<render:ellipse");
            xml.push_str(" render:cx=\"50%\" render:cy=\"50%\"");
            xml.push_str(&relabs_attr("rx", &centroid.rx));
            xml.push_str(&relabs_attr("ry", &centroid.ry));
            push_shape_style(&mut xml, &centroid.stroke, centroid.stroke_width, &centroid.fill);
            xml.push_str("/>\n");
            xml
        }
    }
}

fn push_shape_style(
    xml: &mut String,
    stroke: &Option<String>,
    stroke_width: Option<f64>,
    fill: &Option<String>,
) {
    if let Some(stroke) = stroke {
        xml.push_str(&format!(" render:stroke=\"{}\"", esc(stroke)));
    }
    if let Some(width) = stroke_width {
        xml.push_str(&format!(" render:stroke-width=\"{width}\""));
    }
    if let Some(fill) = fill {
        xml.push_str(&format!(" render:fill=\"{}\"", esc(fill)));
    }
}

fn elements_xml(vertices: &[RenderVertex], indent: &str) -> String {
    let mut xml = format!("{indent}  <render:listOfElements>\n");
    for vertex in vertices {
        let kind = if vertex.base_point1.is_some() || vertex.base_point2.is_some() {
            "RenderCubicBezier"
        } else {
            "RenderPoint"
        };
        xml.push_str(&format!(
            "{indent}    <render:element xsi:type=\"{kind}\" render:x=\"{}\" render:y=\"{}\"",
            vertex.x.to_sbml_string(),
            vertex.y.to_sbml_string(),
        ));
        if let Some((x, y)) = &vertex.base_point1 {
            xml.push_str(&format!(
                " render:basePoint1_x=\"{}\" render:basePoint1_y=\"{}\"",
                x.to_sbml_string(),
                y.to_sbml_string(),
            ));
        }
        if let Some((x, y)) = &vertex.base_point2 {
            xml.push_str(&format!(
                " render:basePoint2_x=\"{}\" render:basePoint2_y=\"{}\"",
                x.to_sbml_string(),
                y.to_sbml_string(),
            ));
        }
        xml.push_str("/>\n");
    }
    xml.push_str(&format!("{indent}  </render:listOfElements>\n"));
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::ir::{
        BoundingBox, EntityKind, Features, GraphicalShape, RectangleShape, TextEntity,
    };

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
        species.texts.push(TextEntity {
            id: "s1_text".to_string(),
            plain_text: Some("glucose".to_string()),
            origin_of_text: None,
            features: Features {
                bounding_box: Some(BoundingBox::new(40.0, 100.0, 60.0, 36.0)),
                ..Default::default()
            },
        });
        network.species.push(species);

        let mut reaction = Entity::new(EntityKind::Reaction, "r1_glyph", "r1");
        reaction.features.curve = Some(Curve {
            segments: vec![CurveSegment::Line {
                start: Point::new(190.0, 118.0),
                end: Point::new(210.0, 118.0),
            }],
        });
        reaction.species_references.push(SpeciesReference {
            id: "sr1_glyph".to_string(),
            reference_id: "sr1".to_string(),
            species: Some("s1".to_string()),
            species_glyph: Some("s1_glyph".to_string()),
            role: Role::Substrate,
            features: Features {
                curve: Some(Curve {
                    segments: vec![CurveSegment::Cubic {
                        start: Point::new(100.0, 118.0),
                        end: Point::new(190.0, 118.0),
                        base_point1: Point::new(130.0, 88.0),
                        base_point2: Point::new(160.0, 88.0),
                    }],
                }),
                ..Default::default()
            },
        });
        network.reactions.push(reaction);
        network.extents.expand_box(&BoundingBox::new(10.0, 10.0, 380.0, 280.0));
        network
    }

    #[test]
    fn shape_and_text_strokes_share_one_attribute() {
        let mut network = sample_network();
        network.species[0].texts[0].features.graphical_text = Some(crate::ir::GraphicalText {
            stroke: Some("#333333".to_string()),
            font_size: Some(crate::geometry::RelAbsVector::absolute(11.0)),
            ..Default::default()
        });

        let mut export = SbmlExport::new();
        let document = export.export(&network).unwrap();

        // Duplicate attributes would make the document unreadable.
        roxmltree::Document::parse(&document).unwrap();
        let style_group = document
            .lines()
            .find(|line| line.contains("render:font-size"))
            .unwrap();
        assert_eq!(style_group.matches("render:stroke=").count(), 1);
    }

    #[test]
    fn document_nests_layout_and_render() {
        let network = sample_network();
        let mut export = SbmlExport::new();
        let document = export.export(&network).unwrap();

        assert!(document.contains("<layout:listOfLayouts>"));
        assert!(document.contains("<render:listOfRenderInformation>"));
        assert!(document.contains("layout:speciesGlyph layout:id=\"s1_glyph\""));
        assert!(document.contains("layout:species=\"s1\""));
        assert!(document.contains("<species id=\"s1\" name=\"glucose\" compartment=\"c1\""));
    }

    #[test]
    fn species_reference_glyph_nests_in_reaction() {
        let network = sample_network();
        let mut export = SbmlExport::new();
        let document = export.export(&network).unwrap();

        let reaction_at = document.find("<layout:reactionGlyph").unwrap();
        let reference_at = document.find("<layout:speciesReferenceGlyph").unwrap();
        let close_at = document.find("</layout:reactionGlyph>").unwrap();
        assert!(reaction_at < reference_at && reference_at < close_at);
        assert!(document.contains("layout:role=\"substrate\""));
        assert!(document.contains("xsi:type=\"CubicBezier\""));
        assert!(document.contains("<listOfReactants>"));
    }

    #[test]
    fn inline_colors_become_definitions() {
        let network = sample_network();
        let mut export = SbmlExport::new();
        let document = export.export(&network).unwrap();

        assert!(document.contains("render:value=\"#000000\""));
        assert!(document.contains("render:value=\"#f0e68c\""));
        // The style references ids, never literals.
        let styles_at = document.find("<render:listOfStyles>").unwrap();
        assert!(!document[styles_at..].contains("render:stroke=\"#"));
    }

    #[test]
    fn empty_reference_id_is_fatal() {
        let mut network = sample_network();
        network.species[0].reference_id = String::new();
        let mut export = SbmlExport::new();
        assert!(matches!(
            export.export(&network),
            Err(TranslateError::ModelConstruction(_))
        ));
    }

    #[test]
    fn round_trips_through_the_reader() {
        let network = sample_network();
        let mut export = SbmlExport::new();
        let document = export.export(&network).unwrap();

        let reread = crate::import::sbml::extract_info(&document).unwrap();
        assert_eq!(reread.compartments.len(), 1);
        assert_eq!(reread.species.len(), 1);
        assert_eq!(reread.reactions.len(), 1);
        assert_eq!(reread.reactions[0].species_references.len(), 1);
        assert_eq!(
            reread.species[0].features.bounding_box,
            network.species[0].features.bounding_box
        );
        assert_eq!(reread.species[0].display_label(), "glucose");
    }
}
