//! Escher map export.
//!
//! An Escher document is a two-element array: metadata, then the map with
//! `canvas`, `nodes`, `reactions` and `text_labels`. Species become
//! metabolite nodes, each reaction contributes a midmarker node, and
//! species references become segments between the two. Escher has no
//! compartment concept, so compartments are carried as text labels.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::config::EscherConfig;
use crate::error::TranslateError;
use crate::geometry::Point;
use crate::ir::{CurveSegment, Entity, Network, SpeciesReference};

use super::{extract_graph_info, reaction_anchor, NetworkExport};

const ESCHER_SCHEMA: &str = "https://escher.github.io/escher/jsonschema/1-0-0#";
const ESCHER_HOMEPAGE: &str = "https://escher.github.io";

#[derive(Default)]
pub struct EscherExport {
    config: EscherConfig,
    nodes: Map<String, Value>,
    reactions: Map<String, Value>,
    text_labels: Map<String, Value>,
    /// Species glyph id to Escher node key.
    species_nodes: HashMap<String, String>,
    /// Reaction glyph id to its reaction entry and marker node keys.
    reaction_nodes: HashMap<String, ReactionMarkers>,
    next_id: u64,
}

#[derive(Clone)]
struct ReactionMarkers {
    reaction_key: String,
    midmarker: String,
    /// Multimarkers flanking the midmarker, present for reactions with
    /// more than two participants.
    upstream: Option<String>,
    downstream: Option<String>,
}

impl EscherExport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EscherConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn export(&mut self, network: &Network) -> Result<String, TranslateError> {
        extract_graph_info(self, network);
        let extents = &network.extents;
        let canvas = if extents.is_empty() {
            json!({"x": 0.0, "y": 0.0, "width": 0.0, "height": 0.0})
        } else {
            json!({
                "x": extents.min_x,
                "y": extents.min_y,
                "width": extents.width(),
                "height": extents.height(),
            })
        };
        let document = json!([
            {
                "map_name": self.config.map_name,
                "map_id": env!("CARGO_PKG_NAME"),
                "map_description": self.config.map_description,
                "homepage": ESCHER_HOMEPAGE,
                "schema": ESCHER_SCHEMA,
            },
            {
                "canvas": canvas,
                "nodes": self.nodes,
                "reactions": self.reactions,
                "text_labels": self.text_labels,
            }
        ]);
        serde_json::to_string_pretty(&document)
            .map_err(|err| TranslateError::ModelConstruction(err.to_string()))
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }
}

impl NetworkExport for EscherExport {
    fn reset(&mut self) {
        self.nodes.clear();
        self.reactions.clear();
        self.text_labels.clear();
        self.species_nodes.clear();
        self.reaction_nodes.clear();
        self.next_id = 0;
    }

    fn add_compartment(&mut self, _network: &Network, compartment: &Entity) {
        let Some(bbox) = &compartment.features.bounding_box else {
            return;
        };
        let key = self.allocate_id();
        self.text_labels.insert(
            key,
            json!({
                "x": bbox.x,
                "y": bbox.y,
                "text": compartment.display_label(),
            }),
        );
    }

    fn add_species(&mut self, _network: &Network, species: &Entity) {
        let center = species
            .features
            .bounding_box
            .as_ref()
            .map(|bbox| bbox.center())
            .unwrap_or_default();
        let label = species
            .features
            .bounding_box
            .as_ref()
            .map(|bbox| Point::new(bbox.x, bbox.y + bbox.height + 10.0))
            .unwrap_or(center);
        let key = self.allocate_id();
        self.nodes.insert(
            key.clone(),
            json!({
                "node_type": "metabolite",
                "x": center.x,
                "y": center.y,
                "bigg_id": species.reference_id,
                "name": species.display_label(),
                "label_x": label.x,
                "label_y": label.y,
                "node_is_primary": true,
            }),
        );
        self.species_nodes.insert(species.id.clone(), key);
    }

    fn add_reaction(&mut self, _network: &Network, reaction: &Entity) {
        let anchor = reaction_anchor(reaction).unwrap_or_default();
        let midmarker = self.allocate_id();
        self.nodes.insert(
            midmarker.clone(),
            json!({
                "node_type": "midmarker",
                "x": anchor.x,
                "y": anchor.y,
            }),
        );

        // Reactions with more than two participants get multimarkers on
        // either side of the midmarker, joined to it by plain segments.
        let mut upstream = None;
        let mut downstream = None;
        let mut segments = Map::new();
        if reaction.species_references.len() > 2 {
            let (up_pos, down_pos) = multimarker_positions(reaction, anchor);
            for (slot, position) in [(&mut upstream, up_pos), (&mut downstream, down_pos)] {
                let key = self.allocate_id();
                self.nodes.insert(
                    key.clone(),
                    json!({
                        "node_type": "multimarker",
                        "x": position.x,
                        "y": position.y,
                    }),
                );
                *slot = Some(key);
            }
            for (from, to) in [
                (upstream.clone().unwrap(), midmarker.clone()),
                (midmarker.clone(), downstream.clone().unwrap()),
            ] {
                let key = self.allocate_id();
                segments.insert(
                    key,
                    json!({
                        "from_node_id": from,
                        "to_node_id": to,
                        "b1": Value::Null,
                        "b2": Value::Null,
                    }),
                );
            }
        }

        let reaction_key = self.allocate_id();
        self.reactions.insert(
            reaction_key.clone(),
            json!({
                "name": reaction.display_label(),
                "bigg_id": reaction.reference_id,
                "reversibility": false,
                "label_x": anchor.x,
                "label_y": anchor.y - 10.0,
                "segments": segments,
                "metabolites": [],
            }),
        );
        self.reaction_nodes.insert(
            reaction.id.clone(),
            ReactionMarkers {
                reaction_key,
                midmarker,
                upstream,
                downstream,
            },
        );
    }

    fn add_species_reference(
        &mut self,
        _network: &Network,
        reaction: &Entity,
        reference: &SpeciesReference,
    ) {
        let Some(species_glyph) = reference.species_glyph.as_deref() else {
            log::debug!("species reference {} has no glyph, skipping", reference.id);
            return;
        };
        let Some(species_key) = self.species_nodes.get(species_glyph).cloned() else {
            log::debug!(
                "species reference {} targets unknown glyph {species_glyph}",
                reference.id
            );
            return;
        };
        let Some(markers) = self.reaction_nodes.get(&reaction.id).cloned() else {
            return;
        };

        let (from_node, to_node) = if reference.role.towards_species() {
            let attach = markers
                .downstream
                .unwrap_or_else(|| markers.midmarker.clone());
            (attach, species_key)
        } else {
            let attach = markers
                .upstream
                .unwrap_or_else(|| markers.midmarker.clone());
            (species_key, attach)
        };
        let (b1, b2) = bezier_points(reference);

        let segment_key = self.allocate_id();
        let Some(entry) = self.reactions.get_mut(&markers.reaction_key) else {
            return;
        };
        if let Some(segments) = entry
            .get_mut("segments")
            .and_then(Value::as_object_mut)
        {
            segments.insert(
                segment_key,
                json!({
                    "from_node_id": from_node,
                    "to_node_id": to_node,
                    "b1": b1,
                    "b2": b2,
                }),
            );
        }
        if let Some(metabolites) = entry
            .get_mut("metabolites")
            .and_then(Value::as_array_mut)
        {
            let coefficient = if reference.role.towards_species() {
                1.0
            } else if reference.role.is_modifier_like() {
                0.0
            } else {
                -1.0
            };
            metabolites.push(json!({
                "coefficient": coefficient,
                "bigg_id": reference.species.as_deref().unwrap_or_default(),
            }));
        }
    }
}

/// Multimarkers sit halfway between the reaction curve's ends and the
/// midmarker; without a curve they flank it horizontally.
fn multimarker_positions(reaction: &Entity, anchor: Point) -> (Point, Point) {
    if let Some(curve) = &reaction.features.curve {
        if let (Some(start), Some(end)) = (curve.start_point(), curve.end_point()) {
            return (
                Point::new((start.x + anchor.x) / 2.0, (start.y + anchor.y) / 2.0),
                Point::new((anchor.x + end.x) / 2.0, (anchor.y + end.y) / 2.0),
            );
        }
    }
    (
        Point::new(anchor.x - 15.0, anchor.y),
        Point::new(anchor.x + 15.0, anchor.y),
    )
}

/// Control points of a single-segment cubic, `null` otherwise.
fn bezier_points(reference: &SpeciesReference) -> (Value, Value) {
    if let Some(curve) = &reference.features.curve {
        if curve.segments.len() == 1 {
            if let CurveSegment::Cubic {
                base_point1,
                base_point2,
                ..
            } = curve.segments[0]
            {
                return (
                    json!({"x": base_point1.x, "y": base_point1.y}),
                    json!({"x": base_point2.x, "y": base_point2.y}),
                );
            }
        }
    }
    (Value::Null, Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BoundingBox, Curve, EntityKind, Features, Role};

    fn sample_network() -> Network {
        let mut network = Network::new();
        let mut compartment = Entity::new(EntityKind::Compartment, "c1_glyph", "c1");
        compartment.features.bounding_box = Some(BoundingBox::new(10.0, 10.0, 380.0, 280.0));
        network.compartments.push(compartment);

        let mut species = Entity::new(EntityKind::Species, "s1_glyph", "s1");
        species.features.bounding_box = Some(BoundingBox::new(40.0, 100.0, 60.0, 36.0));
        network.species.push(species);

        let mut reaction = Entity::new(EntityKind::Reaction, "r1_glyph", "r1");
        reaction.features.bounding_box = Some(BoundingBox::new(190.0, 108.0, 20.0, 20.0));
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
                        end: Point::new(200.0, 118.0),
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
    fn document_is_metadata_then_map() {
        let network = sample_network();
        let mut export = EscherExport::new();
        let document: Value =
            serde_json::from_str(&export.export(&network).unwrap()).unwrap();

        let array = document.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["schema"], json!(ESCHER_SCHEMA));
        assert_eq!(array[1]["canvas"]["width"], json!(380.0));
    }

    #[test]
    fn species_and_midmarker_nodes() {
        let network = sample_network();
        let mut export = EscherExport::new();
        let document: Value =
            serde_json::from_str(&export.export(&network).unwrap()).unwrap();

        let nodes = document[1]["nodes"].as_object().unwrap();
        assert_eq!(nodes.len(), 2);
        let kinds: Vec<&str> = nodes
            .values()
            .map(|node| node["node_type"].as_str().unwrap())
            .collect();
        assert!(kinds.contains(&"metabolite"));
        assert!(kinds.contains(&"midmarker"));
    }

    #[test]
    fn substrate_segment_runs_into_midmarker() {
        let network = sample_network();
        let mut export = EscherExport::new();
        let document: Value =
            serde_json::from_str(&export.export(&network).unwrap()).unwrap();

        let reactions = document[1]["reactions"].as_object().unwrap();
        assert_eq!(reactions.len(), 1);
        let reaction = reactions.values().next().unwrap();
        let segments = reaction["segments"].as_object().unwrap();
        assert_eq!(segments.len(), 1);
        let segment = segments.values().next().unwrap();
        assert_eq!(segment["b1"]["y"], json!(88.0));

        let metabolites = reaction["metabolites"].as_array().unwrap();
        assert_eq!(metabolites[0]["coefficient"], json!(-1.0));
        assert_eq!(metabolites[0]["bigg_id"], json!("s1"));
    }

    #[test]
    fn large_reactions_get_multimarkers() {
        let mut network = sample_network();
        for (species_id, glyph_id) in [("s2", "s2_glyph"), ("s3", "s3_glyph")] {
            let mut species = Entity::new(EntityKind::Species, glyph_id, species_id);
            species.features.bounding_box = Some(BoundingBox::new(300.0, 100.0, 60.0, 36.0));
            network.species.push(species);
        }
        let reaction = &mut network.reactions[0];
        reaction.species_references.push(SpeciesReference {
            id: "sr2_glyph".to_string(),
            reference_id: "sr2".to_string(),
            species: Some("s2".to_string()),
            species_glyph: Some("s2_glyph".to_string()),
            role: Role::Product,
            features: Features::default(),
        });
        reaction.species_references.push(SpeciesReference {
            id: "sr3_glyph".to_string(),
            reference_id: "sr3".to_string(),
            species: Some("s3".to_string()),
            species_glyph: Some("s3_glyph".to_string()),
            role: Role::Modifier,
            features: Features::default(),
        });

        let mut export = EscherExport::new();
        let document: Value =
            serde_json::from_str(&export.export(&network).unwrap()).unwrap();

        let nodes = document[1]["nodes"].as_object().unwrap();
        let multimarkers = nodes
            .values()
            .filter(|node| node["node_type"] == json!("multimarker"))
            .count();
        assert_eq!(multimarkers, 2);
        assert_eq!(nodes.len(), 6);

        // Three participant segments plus the two marker connectors.
        let reaction = document[1]["reactions"].as_object().unwrap();
        let segments = reaction.values().next().unwrap()["segments"]
            .as_object()
            .unwrap();
        assert_eq!(segments.len(), 5);
    }

    #[test]
    fn compartments_become_text_labels() {
        let network = sample_network();
        let mut export = EscherExport::new();
        let document: Value =
            serde_json::from_str(&export.export(&network).unwrap()).unwrap();

        let labels = document[1]["text_labels"].as_object().unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.values().next().unwrap()["text"], json!("c1"));
    }
}
