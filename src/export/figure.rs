//! Figure export: SVG, PDF behind the `pdf` feature, rasterized to
//! PNG/JPG behind the `png` feature.
//!
//! The traversal fills a canvas with draw operations in paint order
//! (compartments first, reactions and their edges last), all in network
//! coordinates. Serialization flips the y axis and pads the extents with
//! a margin, so figures come out with the conventional upward y axis.

use std::path::Path;

use crate::color::resolve_color;
use crate::config::FigureConfig;
use crate::error::TranslateError;
use crate::geometry::Point;
use crate::ir::{
    BoundingBox, Curve, CurveSegment, Entity, Extents, GeometricShape, GraphicalShape,
    HTextAnchor, LineEnding, Network, SpeciesReference, VTextAnchor,
};
use crate::shapes::{
    ellipse_geometry, image_geometry, polygon_geometry, rectangle_geometry, render_curve_geometry,
    shape_rotation, text_geometry, ConcreteEllipse, ConcretePath, ConcreteRectangle, ConcreteText,
    Rotation,
};

use super::{extract_graph_info, NetworkExport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureFormat {
    Svg,
    Pdf,
    Png,
    Jpg,
}

impl FigureFormat {
    /// Pick the output format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, TranslateError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            other => Err(TranslateError::UnsupportedFigureFormat(format!(
                "unrecognized figure extension {other:?}, expected svg, pdf, png or jpg"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PaintStyle {
    stroke: Option<String>,
    stroke_width: Option<f64>,
    fill: Option<String>,
    dash: Option<Vec<f64>>,
}

enum DrawOp {
    Rectangle {
        rect: ConcreteRectangle,
        rotation: Option<Rotation>,
        style: PaintStyle,
    },
    Ellipse {
        ellipse: ConcreteEllipse,
        rotation: Option<Rotation>,
        style: PaintStyle,
    },
    Path {
        path: ConcretePath,
        close: bool,
        rotation: Option<Rotation>,
        style: PaintStyle,
    },
    Curve {
        curve: Curve,
        style: PaintStyle,
    },
    Text {
        text: ConcreteText,
        content: String,
        font_family: Option<String>,
        fill: Option<String>,
        font_weight: Option<String>,
        font_style: Option<String>,
    },
}

pub struct FigureExport {
    config: FigureConfig,
    ops: Vec<DrawOp>,
    background: String,
}

impl Default for FigureExport {
    fn default() -> Self {
        Self::with_config(FigureConfig::default())
    }
}

impl FigureExport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FigureConfig) -> Self {
        Self {
            config,
            ops: Vec::new(),
            background: String::new(),
        }
    }

    /// Translate the network and serialize the figure as SVG text.
    pub fn export_svg(&mut self, network: &Network) -> Result<String, TranslateError> {
        extract_graph_info(self, network);
        self.background = self
            .config
            .background
            .clone()
            .unwrap_or_else(|| resolve_color(network, &network.background_color, false));
        Ok(self.serialize(&network.extents))
    }

    /// Translate and write the figure in the format the extension names.
    pub fn save(&mut self, network: &Network, path: &Path) -> Result<(), TranslateError> {
        let format = FigureFormat::from_path(path)?;
        let svg = self.export_svg(network)?;
        match format {
            FigureFormat::Svg => std::fs::write(path, &svg).map_err(|source| TranslateError::Io {
                path: path.to_path_buf(),
                source,
            }),
            FigureFormat::Pdf => write_pdf(&svg, path),
            FigureFormat::Png | FigureFormat::Jpg => write_raster(&svg, path, format),
        }
    }

    fn serialize(&self, extents: &Extents) -> String {
        let margin = self.config.margin;
        let mapper = Mapper::new(extents, margin);
        let width = mapper.width;
        let height = mapper.height;

        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
             viewBox=\"0 0 {width} {height}\">\n"
        ));
        svg.push_str(&format!(
            "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"{}\"/>\n",
            escape_xml(&self.background)
        ));
        for op in &self.ops {
            svg.push_str(&self.op_svg(op, &mapper));
        }
        svg.push_str("</svg>\n");
        svg
    }

    fn op_svg(&self, op: &DrawOp, mapper: &Mapper) -> String {
        match op {
            DrawOp::Rectangle {
                rect,
                rotation,
                style,
            } => {
                let y = mapper.map_y(rect.y + rect.height);
                format!(
                    "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" \
                     rx=\"{:.2}\" ry=\"{:.2}\"{}{}/>\n",
                    mapper.map_x(rect.x),
                    y,
                    rect.width,
                    rect.height,
                    rect.rx,
                    rect.ry,
                    style_attrs(style),
                    rotation_attr(rotation.as_ref(), mapper),
                )
            }
            DrawOp::Ellipse {
                ellipse,
                rotation,
                style,
            } => format!(
                "<ellipse cx=\"{:.2}\" cy=\"{:.2}\" rx=\"{:.2}\" ry=\"{:.2}\"{}{}/>\n",
                mapper.map_x(ellipse.cx),
                mapper.map_y(ellipse.cy),
                ellipse.rx,
                ellipse.ry,
                style_attrs(style),
                rotation_attr(rotation.as_ref(), mapper),
            ),
            DrawOp::Path {
                path,
                close,
                rotation,
                style,
            } => {
                let mut d = String::new();
                for (idx, vertex) in path.vertices.iter().enumerate() {
                    let point = mapper.map_point(vertex.point);
                    if idx == 0 {
                        d.push_str(&format!("M {:.2} {:.2}", point.x, point.y));
                    } else if let (Some(b1), Some(b2)) =
                        (vertex.base_point1, vertex.base_point2)
                    {
                        let b1 = mapper.map_point(b1);
                        let b2 = mapper.map_point(b2);
                        d.push_str(&format!(
                            " C {:.2} {:.2}, {:.2} {:.2}, {:.2} {:.2}",
                            b1.x, b1.y, b2.x, b2.y, point.x, point.y
                        ));
                    } else {
                        d.push_str(&format!(" L {:.2} {:.2}", point.x, point.y));
                    }
                }
                if *close {
                    d.push_str(" Z");
                }
                format!(
                    "<path d=\"{d}\"{}{}/>\n",
                    style_attrs(style),
                    rotation_attr(rotation.as_ref(), mapper),
                )
            }
            DrawOp::Curve { curve, style } => {
                let mut d = String::new();
                for (idx, segment) in curve.segments.iter().enumerate() {
                    let start = mapper.map_point(segment.start());
                    if idx == 0 {
                        d.push_str(&format!("M {:.2} {:.2}", start.x, start.y));
                    }
                    match segment {
                        CurveSegment::Line { end, .. } => {
                            let end = mapper.map_point(*end);
                            d.push_str(&format!(" L {:.2} {:.2}", end.x, end.y));
                        }
                        CurveSegment::Cubic {
                            end,
                            base_point1,
                            base_point2,
                            ..
                        } => {
                            let b1 = mapper.map_point(*base_point1);
                            let b2 = mapper.map_point(*base_point2);
                            let end = mapper.map_point(*end);
                            d.push_str(&format!(
                                " C {:.2} {:.2}, {:.2} {:.2}, {:.2} {:.2}",
                                b1.x, b1.y, b2.x, b2.y, end.x, end.y
                            ));
                        }
                    }
                }
                format!("<path d=\"{d}\"{}/>\n", style_attrs(style))
            }
            DrawOp::Text {
                text,
                content,
                font_family,
                fill,
                font_weight,
                font_style,
            } => {
                let anchor = match text.h_anchor {
                    HTextAnchor::Start => "start",
                    HTextAnchor::Middle => "middle",
                    HTextAnchor::End => "end",
                };
                let baseline = match text.v_anchor {
                    VTextAnchor::Top => "hanging",
                    VTextAnchor::Middle => "central",
                    VTextAnchor::Bottom => "text-top",
                    VTextAnchor::Baseline => "auto",
                };
                let family = font_family
                    .as_deref()
                    .unwrap_or(&self.config.font_family);
                let size = text.font_size.unwrap_or(self.config.font_size);
                let mut attrs = format!(
                    " font-family=\"{}\" font-size=\"{size:.2}\" text-anchor=\"{anchor}\" \
                     dominant-baseline=\"{baseline}\"",
                    escape_xml(family),
                );
                if let Some(fill) = fill {
                    attrs.push_str(&format!(" fill=\"{}\"", escape_xml(fill)));
                }
                if let Some(weight) = font_weight {
                    attrs.push_str(&format!(" font-weight=\"{}\"", escape_xml(weight)));
                }
                if let Some(style) = font_style {
                    attrs.push_str(&format!(" font-style=\"{}\"", escape_xml(style)));
                }
                format!(
                    "<text x=\"{:.2}\" y=\"{:.2}\"{attrs}>{}</text>\n",
                    mapper.map_x(text.x),
                    mapper.map_y(text.y),
                    escape_xml(content),
                )
            }
        }
    }

    fn draw_shapes(
        &mut self,
        network: &Network,
        shape: &GraphicalShape,
        bbox: &BoundingBox,
        offset: Point,
        rotation: Option<Rotation>,
    ) {
        let group_style = PaintStyle {
            stroke: shape
                .stroke
                .as_deref()
                .map(|s| resolve_color(network, s, false)),
            stroke_width: shape.stroke_width,
            fill: shape
                .fill
                .as_deref()
                .map(|f| resolve_color(network, f, true)),
            dash: shape.stroke_dash_array.clone(),
        };

        if shape.geometric_shapes.is_empty() {
            self.ops.push(DrawOp::Rectangle {
                rect: rectangle_geometry(&Default::default(), bbox, offset.x, offset.y),
                rotation,
                style: group_style,
            });
            return;
        }

        for geometric in &shape.geometric_shapes {
            let style = |stroke: &Option<String>, width: Option<f64>, fill: &Option<String>| {
                PaintStyle {
                    stroke: stroke
                        .as_deref()
                        .map(|s| resolve_color(network, s, false))
                        .or_else(|| group_style.stroke.clone()),
                    stroke_width: width.or(group_style.stroke_width),
                    fill: fill
                        .as_deref()
                        .map(|f| resolve_color(network, f, true))
                        .or_else(|| group_style.fill.clone()),
                    dash: group_style.dash.clone(),
                }
            };
            match geometric {
                GeometricShape::Rectangle(rect) => self.ops.push(DrawOp::Rectangle {
                    rect: rectangle_geometry(rect, bbox, offset.x, offset.y),
                    rotation,
                    style: style(&rect.stroke, rect.stroke_width, &rect.fill),
                }),
                GeometricShape::Ellipse(ellipse) => self.ops.push(DrawOp::Ellipse {
                    ellipse: ellipse_geometry(ellipse, bbox, offset.x, offset.y),
                    rotation,
                    style: style(&ellipse.stroke, ellipse.stroke_width, &ellipse.fill),
                }),
                GeometricShape::Polygon(polygon) => self.ops.push(DrawOp::Path {
                    path: polygon_geometry(polygon, bbox, offset.x, offset.y),
                    close: true,
                    rotation,
                    style: style(&polygon.stroke, polygon.stroke_width, &polygon.fill),
                }),
                GeometricShape::RenderCurve(curve) => self.ops.push(DrawOp::Path {
                    path: render_curve_geometry(curve, bbox, offset.x, offset.y),
                    close: false,
                    rotation,
                    style: style(&curve.stroke, curve.stroke_width, &None),
                }),
                // Centroid markers draw as a small centered ellipse.
                GeometricShape::Centroid(centroid) => {
                    let ellipse = crate::ir::EllipseShape {
                        rx: centroid.rx,
                        ry: centroid.ry,
                        stroke: centroid.stroke.clone(),
                        stroke_width: centroid.stroke_width,
                        fill: centroid.fill.clone(),
                        ..Default::default()
                    };
                    self.ops.push(DrawOp::Ellipse {
                        ellipse: ellipse_geometry(&ellipse, bbox, offset.x, offset.y),
                        rotation,
                        style: style(&centroid.stroke, centroid.stroke_width, &centroid.fill),
                    });
                }
                GeometricShape::Image(image) => {
                    // No raster embedding; the image footprint is kept as
                    // an outlined placeholder.
                    let footprint = image_geometry(image, bbox, offset.x, offset.y);
                    self.ops.push(DrawOp::Rectangle {
                        rect: ConcreteRectangle {
                            x: footprint.x,
                            y: footprint.y,
                            width: footprint.width,
                            height: footprint.height,
                            rx: 0.0,
                            ry: 0.0,
                        },
                        rotation,
                        style: PaintStyle {
                            stroke: Some("#808080".to_string()),
                            stroke_width: Some(1.0),
                            fill: None,
                            dash: Some(vec![4.0, 4.0]),
                        },
                    });
                }
                GeometricShape::Text(text_shape) => {
                    self.ops.push(DrawOp::Text {
                        text: text_geometry(text_shape, bbox, offset.x, offset.y),
                        content: String::new(),
                        font_family: text_shape.font_family.clone(),
                        fill: group_style.stroke.clone(),
                        font_weight: text_shape.font_weight.clone(),
                        font_style: text_shape.font_style.clone(),
                    });
                }
            }
        }
    }

    fn draw_entity(&mut self, network: &Network, entity: &Entity) {
        if let (Some(shape), Some(bbox)) = (
            entity.features.graphical_shape.clone(),
            entity.features.bounding_box,
        ) {
            self.draw_shapes(network, &shape, &bbox, Point::default(), None);
        }
        if let Some(curve) = entity.features.curve.clone() {
            let style = curve_paint(network, entity.features.graphical_curve.as_ref());
            self.ops.push(DrawOp::Curve { curve, style });
        }
        self.draw_texts(network, entity);
    }

    fn draw_texts(&mut self, network: &Network, entity: &Entity) {
        for text in &entity.texts {
            let Some(content) = text.content() else {
                continue;
            };
            let Some(bbox) = text
                .features
                .bounding_box
                .or(entity.features.bounding_box)
            else {
                continue;
            };
            let graphical = text.features.graphical_text.clone().unwrap_or_default();
            let shape = crate::ir::TextShape {
                font_size: graphical.font_size,
                h_text_anchor: graphical.h_text_anchor,
                v_text_anchor: graphical.v_text_anchor,
                ..Default::default()
            };
            self.ops.push(DrawOp::Text {
                text: text_geometry(&shape, &bbox, 0.0, 0.0),
                content: content.to_string(),
                font_family: graphical.font_family.clone(),
                fill: graphical
                    .stroke
                    .as_deref()
                    .map(|s| resolve_color(network, s, false)),
                font_weight: graphical.font_weight.clone(),
                font_style: graphical.font_style.clone(),
            });
        }
    }

    fn draw_line_ending(
        &mut self,
        network: &Network,
        ending: &LineEnding,
        point: Point,
        slope: f64,
    ) {
        let Some(bbox) = &ending.bounding_box else {
            log::debug!("line ending {} has no bounding box, skipping", ending.id);
            return;
        };
        // The ending's box is relative to the curve endpoint.
        let placed = BoundingBox::new(point.x + bbox.x, point.y + bbox.y, bbox.width, bbox.height);
        let rotation = if ending.enable_rotational_mapping {
            shape_rotation(Some(point), slope, placed.center())
        } else {
            None
        };
        let shape = ending.graphical_shape.clone();
        self.draw_shapes(network, &shape, &placed, Point::default(), rotation);
    }
}

impl NetworkExport for FigureExport {
    fn reset(&mut self) {
        self.ops.clear();
        self.background.clear();
    }

    fn add_compartment(&mut self, network: &Network, compartment: &Entity) {
        self.draw_entity(network, compartment);
    }

    fn add_species(&mut self, network: &Network, species: &Entity) {
        self.draw_entity(network, species);
    }

    fn add_reaction(&mut self, network: &Network, reaction: &Entity) {
        self.draw_entity(network, reaction);
    }

    fn add_species_reference(
        &mut self,
        network: &Network,
        _reaction: &Entity,
        reference: &SpeciesReference,
    ) {
        let Some(curve) = reference.features.curve.clone() else {
            log::debug!("species reference {} has no curve, skipping", reference.id);
            return;
        };
        let style = curve_paint(network, reference.features.graphical_curve.as_ref());
        self.ops.push(DrawOp::Curve {
            curve: curve.clone(),
            style,
        });

        let graphical = reference.features.graphical_curve.as_ref();
        if let Some(head) = graphical.and_then(|g| g.start_head.as_deref()) {
            if let (Some(ending), Some(point)) = (
                network.find_line_ending(head).cloned(),
                curve.start_point(),
            ) {
                let slope = reference
                    .features
                    .start_slope
                    .or_else(|| curve.start_slope())
                    .unwrap_or(0.0);
                self.draw_line_ending(network, &ending, point, slope);
            }
        }
        if let Some(head) = graphical.and_then(|g| g.end_head.as_deref()) {
            if let (Some(ending), Some(point)) =
                (network.find_line_ending(head).cloned(), curve.end_point())
            {
                let slope = reference
                    .features
                    .end_slope
                    .or_else(|| curve.end_slope())
                    .unwrap_or(0.0);
                self.draw_line_ending(network, &ending, point, slope);
            }
        }
    }
}

fn curve_paint(network: &Network, graphical: Option<&crate::ir::GraphicalCurve>) -> PaintStyle {
    match graphical {
        Some(curve) => PaintStyle {
            stroke: curve
                .stroke
                .as_deref()
                .map(|s| resolve_color(network, s, false))
                .or_else(|| Some("#000000".to_string())),
            stroke_width: curve.stroke_width.or(Some(1.0)),
            fill: None,
            dash: curve.stroke_dash_array.clone(),
        },
        None => PaintStyle {
            stroke: Some("#000000".to_string()),
            stroke_width: Some(1.0),
            fill: None,
            dash: None,
        },
    }
}

/// Network-to-canvas coordinate mapping: translate to the margin and flip
/// the y axis.
struct Mapper {
    min_x: f64,
    max_y: f64,
    margin: f64,
    width: f64,
    height: f64,
}

impl Mapper {
    fn new(extents: &Extents, margin: f64) -> Self {
        if extents.is_empty() {
            return Self {
                min_x: 0.0,
                max_y: 0.0,
                margin,
                width: 2.0 * margin,
                height: 2.0 * margin,
            };
        }
        Self {
            min_x: extents.min_x,
            max_y: extents.max_y,
            margin,
            width: extents.width() + 2.0 * margin,
            height: extents.height() + 2.0 * margin,
        }
    }

    fn map_x(&self, x: f64) -> f64 {
        x - self.min_x + self.margin
    }

    fn map_y(&self, y: f64) -> f64 {
        self.max_y - y + self.margin
    }

    fn map_point(&self, point: Point) -> Point {
        Point::new(self.map_x(point.x), self.map_y(point.y))
    }
}

fn style_attrs(style: &PaintStyle) -> String {
    let mut attrs = String::new();
    match &style.stroke {
        Some(stroke) => attrs.push_str(&format!(" stroke=\"{}\"", escape_xml(stroke))),
        None => attrs.push_str(" stroke=\"none\""),
    }
    if let Some(width) = style.stroke_width {
        attrs.push_str(&format!(" stroke-width=\"{width}\""));
    }
    if let Some(fill) = &style.fill {
        attrs.push_str(&format!(" fill=\"{}\"", escape_xml(fill)));
    } else {
        attrs.push_str(" fill=\"none\"");
    }
    if let Some(dash) = &style.dash {
        let rendered: Vec<String> = dash.iter().map(|d| format!("{d}")).collect();
        attrs.push_str(&format!(" stroke-dasharray=\"{}\"", rendered.join(" ")));
    }
    attrs
}

fn rotation_attr(rotation: Option<&Rotation>, mapper: &Mapper) -> String {
    match rotation {
        // The y flip mirrors angles.
        Some(rotation) => format!(
            " transform=\"rotate({:.2} {:.2} {:.2})\"",
            -rotation.angle.to_degrees(),
            mapper.map_x(rotation.cx),
            mapper.map_y(rotation.cy),
        ),
        None => String::new(),
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(feature = "png")]
fn write_raster(svg: &str, output: &Path, format: FigureFormat) -> Result<(), TranslateError> {
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|err| TranslateError::ModelConstruction(err.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(
        || TranslateError::ModelConstruction("failed to allocate pixmap".to_string()),
    )?;
    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    if format == FigureFormat::Jpg {
        // JPEG has no alpha channel; the pixmap is opaque anyway since
        // the figure always paints a background rectangle.
        let mut rgb = Vec::with_capacity(size.width() as usize * size.height() as usize * 3);
        for pixel in pixmap.pixels() {
            let color = pixel.demultiply();
            rgb.extend_from_slice(&[color.red(), color.green(), color.blue()]);
        }
        let buffer = image::RgbImage::from_raw(size.width(), size.height(), rgb).ok_or_else(
            || TranslateError::ModelConstruction("pixel buffer size mismatch".to_string()),
        )?;
        return buffer
            .save_with_format(output, image::ImageFormat::Jpeg)
            .map_err(|err| TranslateError::ModelConstruction(err.to_string()));
    }
    pixmap
        .save_png(output)
        .map_err(|err| TranslateError::ModelConstruction(err.to_string()))
}

#[cfg(not(feature = "png"))]
fn write_raster(_svg: &str, _output: &Path, _format: FigureFormat) -> Result<(), TranslateError> {
    Err(TranslateError::UnsupportedFigureFormat(
        "raster output requires the png feature".to_string(),
    ))
}

#[cfg(feature = "pdf")]
fn write_pdf(svg: &str, output: &Path) -> Result<(), TranslateError> {
    let opt = svg2pdf::usvg::Options::default();
    let tree = svg2pdf::usvg::Tree::from_str(svg, &opt)
        .map_err(|err| TranslateError::ModelConstruction(err.to_string()))?;
    let pdf = svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|err| TranslateError::ModelConstruction(format!("{err:?}")))?;
    std::fs::write(output, pdf).map_err(|source| TranslateError::Io {
        path: output.to_path_buf(),
        source,
    })
}

#[cfg(not(feature = "pdf"))]
fn write_pdf(_svg: &str, _output: &Path) -> Result<(), TranslateError> {
    Err(TranslateError::UnsupportedFigureFormat(
        "pdf output requires the pdf feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EntityKind, Features, RectangleShape, Role, TextEntity};

    fn sample_network() -> Network {
        let mut network = Network::new();
        let mut species = Entity::new(EntityKind::Species, "s1_glyph", "s1");
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
        reaction.species_references.push(SpeciesReference {
            id: "sr1_glyph".to_string(),
            reference_id: "sr1".to_string(),
            species: Some("s1".to_string()),
            species_glyph: Some("s1_glyph".to_string()),
            role: Role::Substrate,
            features: Features {
                curve: Some(Curve {
                    segments: vec![CurveSegment::Line {
                        start: Point::new(100.0, 118.0),
                        end: Point::new(190.0, 118.0),
                    }],
                }),
                ..Default::default()
            },
        });
        network.reactions.push(reaction);
        network.extents.expand_box(&BoundingBox::new(40.0, 100.0, 160.0, 36.0));
        network
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            FigureFormat::from_path(Path::new("out.svg")).unwrap(),
            FigureFormat::Svg
        );
        assert_eq!(
            FigureFormat::from_path(Path::new("out.PNG")).unwrap(),
            FigureFormat::Png
        );
        assert_eq!(
            FigureFormat::from_path(Path::new("out.jpeg")).unwrap(),
            FigureFormat::Jpg
        );
        assert_eq!(
            FigureFormat::from_path(Path::new("out.pdf")).unwrap(),
            FigureFormat::Pdf
        );
        assert!(matches!(
            FigureFormat::from_path(Path::new("out.tiff")),
            Err(TranslateError::UnsupportedFigureFormat(_))
        ));
    }

    #[test]
    fn svg_contains_species_and_label() {
        let network = sample_network();
        let mut export = FigureExport::new();
        let svg = export.export_svg(&network).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<rect"));
        assert!(svg.contains("glucose"));
        assert!(svg.contains("fill=\"#f0e68c\""));
    }

    #[test]
    fn y_axis_is_flipped() {
        let network = sample_network();
        let margin = FigureConfig::default().margin;
        let mut export = FigureExport::new();
        let svg = export.export_svg(&network).unwrap();

        // The species box spans the full extents height, so its top-left
        // corner lands at the margin corner after the flip.
        let expected = format!("<rect x=\"{margin:.2}\" y=\"{margin:.2}\"");
        assert!(svg.contains(&expected), "{svg}");
    }

    #[test]
    fn edge_curves_are_painted() {
        let network = sample_network();
        let mut export = FigureExport::new();
        let svg = export.export_svg(&network).unwrap();
        assert!(svg.contains("<path d=\"M "));
    }

    #[cfg(feature = "png")]
    #[test]
    fn jpg_output_is_jpeg_encoded() {
        let network = sample_network();
        let path = std::env::temp_dir().join("sbmlplot_figure_test.jpg");
        let mut export = FigureExport::new();
        export.save(&network, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xff, 0xd8, 0xff]);
        std::fs::remove_file(&path).ok();
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn pdf_output_is_pdf_encoded() {
        let network = sample_network();
        let path = std::env::temp_dir().join("sbmlplot_figure_test.pdf");
        let mut export = FigureExport::new();
        export.save(&network, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..5], b"%PDF-");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn background_override_applies_without_compartments() {
        let network = sample_network();
        let mut export = FigureExport::with_config(FigureConfig {
            background: Some("#123456".to_string()),
            ..Default::default()
        });
        let svg = export.export_svg(&network).unwrap();
        assert!(svg.contains("fill=\"#123456\""));
    }

    #[test]
    fn empty_network_gets_default_background() {
        let network = Network::new();
        let mut export = FigureExport::new();
        let svg = export.export_svg(&network).unwrap();
        assert!(svg.contains("fill=\"#ffffff\""));
    }

    #[test]
    fn export_is_repeatable() {
        let network = sample_network();
        let mut export = FigureExport::new();
        let first = export.export_svg(&network).unwrap();
        let second = export.export_svg(&network).unwrap();
        assert_eq!(first, second);
    }
}
