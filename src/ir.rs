//! The unified in-memory network model.
//!
//! Import adapters populate a [`Network`] once; export adapters walk it
//! through the traversal in [`crate::export`] and serialize their target
//! format. Optional data is modeled as typed `Option` fields so that a
//! missing piece of geometry or style skips the dependent step instead of
//! failing the whole translation.

use crate::geometry::{cubic_point, endpoint_slope, Point, RelAbsVector};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extents {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extents {
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Grow to cover a point. Extents only ever grow.
    pub fn expand_point(&mut self, point: Point) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }

    pub fn expand_box(&mut self, bbox: &BoundingBox) {
        self.expand_point(Point::new(bbox.x, bbox.y));
        self.expand_point(Point::new(bbox.x + bbox.width, bbox.y + bbox.height));
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }
}

impl Default for Extents {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One segment of a layout curve: a straight line or a cubic Bézier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveSegment {
    Line {
        start: Point,
        end: Point,
    },
    Cubic {
        start: Point,
        end: Point,
        base_point1: Point,
        base_point2: Point,
    },
}

impl CurveSegment {
    pub fn start(&self) -> Point {
        match self {
            Self::Line { start, .. } | Self::Cubic { start, .. } => *start,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            Self::Line { end, .. } | Self::Cubic { end, .. } => *end,
        }
    }

    pub fn point_at(&self, t: f64) -> Point {
        match self {
            Self::Line { start, end } => Point::new(
                start.x + t * (end.x - start.x),
                start.y + t * (end.y - start.y),
            ),
            Self::Cubic {
                start,
                end,
                base_point1,
                base_point2,
            } => cubic_point(*start, *base_point1, *base_point2, *end, t),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Curve {
    pub segments: Vec<CurveSegment>,
}

impl Curve {
    pub fn start_point(&self) -> Option<Point> {
        self.segments.first().map(|segment| segment.start())
    }

    pub fn end_point(&self) -> Option<Point> {
        self.segments.last().map(|segment| segment.end())
    }

    /// Slope at the first vertex, used to orient start line-endings.
    pub fn start_slope(&self) -> Option<f64> {
        let segment = self.segments.first()?;
        let control = match segment {
            CurveSegment::Cubic { base_point1, .. } => Some(*base_point1),
            CurveSegment::Line { .. } => None,
        };
        Some(endpoint_slope(segment.start(), control, segment.end()))
    }

    /// Slope at the last vertex, used to orient end line-endings.
    pub fn end_slope(&self) -> Option<f64> {
        let segment = self.segments.last()?;
        let control = match segment {
            CurveSegment::Cubic { base_point2, .. } => Some(*base_point2),
            CurveSegment::Line { .. } => None,
        };
        Some(endpoint_slope(segment.end(), control, segment.start()))
    }

    /// Midpoint of the curve: the parametric middle of the middle segment.
    /// This is the anchor point for centroid-style reaction nodes.
    pub fn midpoint(&self) -> Option<Point> {
        if self.segments.is_empty() {
            return None;
        }
        let count = self.segments.len();
        if count % 2 == 1 {
            Some(self.segments[count / 2].point_at(0.5))
        } else {
            Some(self.segments[count / 2].start())
        }
    }
}

/// Role of a species-reference edge, parsed case-insensitively with the
/// synonyms the SBML layout specification allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Substrate,
    SideSubstrate,
    Product,
    SideProduct,
    Modifier,
    Activator,
    Inhibitor,
}

impl Role {
    pub fn parse(token: &str) -> Option<Self> {
        let normalized: String = token
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "substrate" | "reactant" => Some(Self::Substrate),
            "sidesubstrate" | "sidereactant" => Some(Self::SideSubstrate),
            "product" => Some(Self::Product),
            "sideproduct" => Some(Self::SideProduct),
            "modifier" => Some(Self::Modifier),
            "activator" => Some(Self::Activator),
            "inhibitor" => Some(Self::Inhibitor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Substrate => "substrate",
            Self::SideSubstrate => "sidesubstrate",
            Self::Product => "product",
            Self::SideProduct => "sideproduct",
            Self::Modifier => "modifier",
            Self::Activator => "activator",
            Self::Inhibitor => "inhibitor",
        }
    }

    /// True for the roles whose edge is drawn from the reaction towards
    /// the species (products); all other roles point at the reaction.
    pub fn towards_species(&self) -> bool {
        matches!(self, Self::Product | Self::SideProduct)
    }

    pub fn is_modifier_like(&self) -> bool {
        matches!(self, Self::Modifier | Self::Activator | Self::Inhibitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HTextAnchor {
    Start,
    Middle,
    End,
}

impl HTextAnchor {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "start" | "left" => Some(Self::Start),
            "middle" | "center" => Some(Self::Middle),
            "end" | "right" => Some(Self::End),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VTextAnchor {
    Top,
    Middle,
    Bottom,
    Baseline,
}

impl VTextAnchor {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "middle" | "center" => Some(Self::Middle),
            "bottom" => Some(Self::Bottom),
            "baseline" => Some(Self::Baseline),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
            Self::Baseline => "baseline",
        }
    }
}

/// A polygon or render-curve vertex in relative coordinates, with
/// optional Bézier control points for the edge arriving at it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderVertex {
    pub x: RelAbsVector,
    pub y: RelAbsVector,
    pub base_point1: Option<(RelAbsVector, RelAbsVector)>,
    pub base_point2: Option<(RelAbsVector, RelAbsVector)>,
}

/// A primitive shape descriptor, resolved against a bounding box by the
/// translators in [`crate::shapes`].
#[derive(Debug, Clone, PartialEq)]
pub enum GeometricShape {
    Rectangle(RectangleShape),
    Ellipse(EllipseShape),
    Polygon(PolygonShape),
    Image(ImageShape),
    Text(TextShape),
    RenderCurve(RenderCurveShape),
    /// Reaction drawn as a centroid marker: edges meet the curve midpoint
    /// instead of the bounding box.
    Centroid(CentroidShape),
}

impl GeometricShape {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rectangle(_) => "rectangle",
            Self::Ellipse(_) => "ellipse",
            Self::Polygon(_) => "polygon",
            Self::Image(_) => "image",
            Self::Text(_) => "text",
            Self::RenderCurve(_) => "renderCurve",
            Self::Centroid(_) => "centroid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CentroidShape {
    pub rx: Option<RelAbsVector>,
    pub ry: Option<RelAbsVector>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub fill: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RectangleShape {
    pub x: Option<RelAbsVector>,
    pub y: Option<RelAbsVector>,
    pub width: Option<RelAbsVector>,
    pub height: Option<RelAbsVector>,
    pub rx: Option<RelAbsVector>,
    pub ry: Option<RelAbsVector>,
    pub ratio: Option<f64>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub fill: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EllipseShape {
    pub cx: Option<RelAbsVector>,
    pub cy: Option<RelAbsVector>,
    pub rx: Option<RelAbsVector>,
    pub ry: Option<RelAbsVector>,
    pub ratio: Option<f64>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub fill: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolygonShape {
    pub vertices: Vec<RenderVertex>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub fill: Option<String>,
    pub fill_rule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageShape {
    pub x: Option<RelAbsVector>,
    pub y: Option<RelAbsVector>,
    pub width: Option<RelAbsVector>,
    pub height: Option<RelAbsVector>,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextShape {
    pub x: Option<RelAbsVector>,
    pub y: Option<RelAbsVector>,
    pub font_family: Option<String>,
    pub font_size: Option<RelAbsVector>,
    pub font_weight: Option<String>,
    pub font_style: Option<String>,
    pub h_text_anchor: Option<HTextAnchor>,
    pub v_text_anchor: Option<VTextAnchor>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderCurveShape {
    pub vertices: Vec<RenderVertex>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
}

/// Style group applied to an entity drawn from its bounding box.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphicalShape {
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub stroke_dash_array: Option<Vec<f64>>,
    pub fill: Option<String>,
    pub fill_rule: Option<String>,
    pub geometric_shapes: Vec<GeometricShape>,
}

/// Style group applied to an entity drawn from its curve.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphicalCurve {
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub stroke_dash_array: Option<Vec<f64>>,
    pub start_head: Option<String>,
    pub end_head: Option<String>,
}

/// Style group applied to attached text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphicalText {
    pub stroke: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<RelAbsVector>,
    pub font_weight: Option<String>,
    pub font_style: Option<String>,
    pub h_text_anchor: Option<HTextAnchor>,
    pub v_text_anchor: Option<VTextAnchor>,
}

/// The tagged-optional feature bag attached to every entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    pub bounding_box: Option<BoundingBox>,
    pub curve: Option<Curve>,
    pub start_point: Option<Point>,
    pub end_point: Option<Point>,
    pub start_slope: Option<f64>,
    pub end_slope: Option<f64>,
    pub graphical_shape: Option<GraphicalShape>,
    pub graphical_curve: Option<GraphicalCurve>,
    pub graphical_text: Option<GraphicalText>,
}

/// A text glyph attached to an entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextEntity {
    pub id: String,
    /// Literal text, when the glyph carries one.
    pub plain_text: Option<String>,
    /// Reference to the model element whose name/id supplies the text.
    pub origin_of_text: Option<String>,
    pub features: Features,
}

impl TextEntity {
    /// The string actually rendered for this glyph, when any is known.
    pub fn content(&self) -> Option<&str> {
        self.plain_text
            .as_deref()
            .or(self.origin_of_text.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesReference {
    pub id: String,
    pub reference_id: String,
    /// `reference_id` of the connected species glyph's model element.
    pub species: Option<String>,
    /// Glyph-level id of the connected species glyph.
    pub species_glyph: Option<String>,
    pub role: Role,
    pub features: Features,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Compartment,
    Species,
    Reaction,
}

impl EntityKind {
    pub fn category(&self) -> &'static str {
        match self {
            Self::Compartment => "Compartment",
            Self::Species => "Species",
            Self::Reaction => "Reaction",
        }
    }
}

/// A glyph-level entity. `id` is the glyph id (may repeat across visual
/// instances); `reference_id` points back at the model element.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub id: String,
    pub reference_id: String,
    pub meta_id: Option<String>,
    pub compartment: Option<String>,
    pub features: Features,
    pub texts: Vec<TextEntity>,
    /// Populated for reactions only.
    pub species_references: Vec<SpeciesReference>,
}

impl Entity {
    pub fn new(kind: EntityKind, id: impl Into<String>, reference_id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            reference_id: reference_id.into(),
            meta_id: None,
            compartment: None,
            features: Features::default(),
            texts: Vec::new(),
            species_references: Vec::new(),
        }
    }

    /// First non-empty attached text, falling back to the reference id.
    pub fn display_label(&self) -> &str {
        self.texts
            .iter()
            .find_map(|text| text.content())
            .unwrap_or(&self.reference_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorDefinition {
    pub id: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    pub offset: RelAbsVector,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GradientKind {
    Linear {
        x1: RelAbsVector,
        y1: RelAbsVector,
        x2: RelAbsVector,
        y2: RelAbsVector,
    },
    Radial {
        cx: RelAbsVector,
        cy: RelAbsVector,
        r: RelAbsVector,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientDefinition {
    pub id: String,
    pub kind: GradientKind,
    pub stops: Vec<GradientStop>,
}

/// A reusable arrow-head/marker shape attached to curve ends.
#[derive(Debug, Clone, PartialEq)]
pub struct LineEnding {
    pub id: String,
    pub bounding_box: Option<BoundingBox>,
    pub graphical_shape: GraphicalShape,
    pub enable_rotational_mapping: bool,
}

/// The translation session root. Built once by an import adapter,
/// consumed by one export call, then discarded.
#[derive(Debug, Clone)]
pub struct Network {
    pub extents: Extents,
    pub background_color: String,
    pub compartments: Vec<Entity>,
    pub species: Vec<Entity>,
    pub reactions: Vec<Entity>,
    pub colors: Vec<ColorDefinition>,
    pub gradients: Vec<GradientDefinition>,
    pub line_endings: Vec<LineEnding>,
}

impl Network {
    pub fn new() -> Self {
        Self {
            extents: Extents::empty(),
            background_color: "white".to_string(),
            compartments: Vec::new(),
            species: Vec::new(),
            reactions: Vec::new(),
            colors: Vec::new(),
            gradients: Vec::new(),
            line_endings: Vec::new(),
        }
    }

    pub fn find_color(&self, id: &str) -> Option<&ColorDefinition> {
        self.colors.iter().find(|color| color.id == id)
    }

    pub fn find_gradient(&self, id: &str) -> Option<&GradientDefinition> {
        self.gradients.iter().find(|gradient| gradient.id == id)
    }

    pub fn find_line_ending(&self, id: &str) -> Option<&LineEnding> {
        self.line_endings.iter().find(|ending| ending.id == id)
    }

    pub fn find_species_by_reference(&self, reference_id: &str) -> Option<&Entity> {
        self.species
            .iter()
            .find(|entity| entity.reference_id == reference_id)
    }

    pub fn find_species_glyph(&self, glyph_id: &str) -> Option<&Entity> {
        self.species.iter().find(|entity| entity.id == glyph_id)
    }

    pub fn find_compartment_by_reference(&self, reference_id: &str) -> Option<&Entity> {
        self.compartments
            .iter()
            .find(|entity| entity.reference_id == reference_id)
    }

    /// Register a shared color, deduplicating by id.
    pub fn add_color(&mut self, color: ColorDefinition) {
        if self.find_color(&color.id).is_none() {
            self.colors.push(color);
        }
    }

    pub fn add_gradient(&mut self, gradient: GradientDefinition) {
        if self.find_gradient(&gradient.id).is_none() {
            self.gradients.push(gradient);
        }
    }

    pub fn add_line_ending(&mut self, ending: LineEnding) {
        if self.find_line_ending(&ending.id).is_none() {
            self.line_endings.push(ending);
        }
    }

    /// Grow the accumulated extents with everything an entity's features
    /// cover: its bounding box and its curve vertices.
    pub fn expand_extents(&mut self, features: &Features) {
        if let Some(bbox) = &features.bounding_box {
            self.extents.expand_box(bbox);
        }
        if let Some(curve) = &features.curve {
            for segment in &curve.segments {
                self.extents.expand_point(segment.start());
                self.extents.expand_point(segment.end());
            }
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_synonyms() {
        assert_eq!(Role::parse("SUBSTRATE"), Some(Role::Substrate));
        assert_eq!(Role::parse("reactant"), Some(Role::Substrate));
        assert_eq!(Role::parse("side substrate"), Some(Role::SideSubstrate));
        assert_eq!(Role::parse("side_product"), Some(Role::SideProduct));
        assert_eq!(Role::parse("Inhibitor"), Some(Role::Inhibitor));
        assert_eq!(Role::parse("unknown"), None);
    }

    #[test]
    fn role_direction() {
        assert!(!Role::Substrate.towards_species());
        assert!(Role::Product.towards_species());
        assert!(Role::SideProduct.towards_species());
        assert!(!Role::Modifier.towards_species());
    }

    #[test]
    fn extents_union_is_order_independent() {
        let boxes = [
            BoundingBox::new(10.0, 10.0, 30.0, 20.0),
            BoundingBox::new(-5.0, 40.0, 10.0, 10.0),
            BoundingBox::new(100.0, 0.0, 1.0, 1.0),
        ];
        let mut forward = Extents::empty();
        for bbox in &boxes {
            forward.expand_box(bbox);
        }
        let mut reverse = Extents::empty();
        for bbox in boxes.iter().rev() {
            reverse.expand_box(bbox);
        }
        assert_eq!(forward, reverse);
        assert_eq!(forward.min_x, -5.0);
        assert_eq!(forward.min_y, 0.0);
        assert_eq!(forward.max_x, 101.0);
        assert_eq!(forward.max_y, 50.0);
    }

    #[test]
    fn extents_never_shrink() {
        let mut extents = Extents::empty();
        extents.expand_box(&BoundingBox::new(0.0, 0.0, 100.0, 100.0));
        extents.expand_box(&BoundingBox::new(40.0, 40.0, 10.0, 10.0));
        assert_eq!(extents.width(), 100.0);
        assert_eq!(extents.height(), 100.0);
    }

    #[test]
    fn curve_slopes_and_midpoint() {
        let curve = Curve {
            segments: vec![CurveSegment::Cubic {
                start: Point::new(0.0, 0.0),
                end: Point::new(10.0, 0.0),
                base_point1: Point::new(0.0, 10.0),
                base_point2: Point::new(10.0, 10.0),
            }],
        };
        let start = curve.start_slope().unwrap();
        assert!((start - std::f64::consts::FRAC_PI_2).abs() < 1.0e-9);
        let end = curve.end_slope().unwrap();
        assert!((end - std::f64::consts::FRAC_PI_2).abs() < 1.0e-9);
        let mid = curve.midpoint().unwrap();
        assert!((mid.x - 5.0).abs() < 1.0e-9);
        assert!((mid.y - 7.5).abs() < 1.0e-9);
    }

    #[test]
    fn display_label_falls_back_to_reference() {
        let mut entity = Entity::new(EntityKind::Species, "s1_glyph", "s1");
        assert_eq!(entity.display_label(), "s1");
        entity.texts.push(TextEntity {
            id: "t1".to_string(),
            plain_text: Some("ATP".to_string()),
            origin_of_text: None,
            features: Features::default(),
        });
        assert_eq!(entity.display_label(), "ATP");
    }
}
