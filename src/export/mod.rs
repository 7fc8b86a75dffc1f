//! Export adapter contract.
//!
//! Every exporter implements the [`NetworkExport`] hooks and is driven by
//! [`extract_graph_info`], which owns the fixed visitation order:
//! compartments, then species, then reactions, then each reaction's
//! species-references. Adapters accumulate into internal buffers and
//! serialize in their `export` method; `reset` clears the buffers so an
//! instance can be reused for a second translation without duplicating
//! output.

pub mod cytoscape;
pub mod editor;
pub mod escher;
pub mod figure;
pub mod sbml;

use crate::ir::{Entity, Network, SpeciesReference};

pub use cytoscape::CytoscapeExport;
pub use editor::NetworkEditorExport;
pub use escher::EscherExport;
pub use figure::{FigureExport, FigureFormat};
pub use sbml::SbmlExport;

/// Hooks called by the traversal, one per entity class.
pub trait NetworkExport {
    /// Clear all accumulated state. Called by [`extract_graph_info`]
    /// before a traversal begins.
    fn reset(&mut self);

    fn add_compartment(&mut self, network: &Network, compartment: &Entity);

    fn add_species(&mut self, network: &Network, species: &Entity);

    fn add_reaction(&mut self, network: &Network, reaction: &Entity);

    fn add_species_reference(
        &mut self,
        network: &Network,
        reaction: &Entity,
        reference: &SpeciesReference,
    );
}

/// Walk the IR in the fixed order and feed it to an exporter.
pub fn extract_graph_info<E: NetworkExport + ?Sized>(export: &mut E, network: &Network) {
    export.reset();
    for compartment in &network.compartments {
        export.add_compartment(network, compartment);
    }
    for species in &network.species {
        export.add_species(network, species);
    }
    for reaction in &network.reactions {
        export.add_reaction(network, reaction);
        for reference in &reaction.species_references {
            export.add_species_reference(network, reaction, reference);
        }
    }
}

/// Endpoint of a species-reference edge at its reaction: the reaction's
/// curve midpoint for centroid-style nodes, otherwise the bounding box
/// center. Shared by the JSON dialect exporters.
pub(crate) fn reaction_anchor(reaction: &Entity) -> Option<crate::geometry::Point> {
    if let Some(curve) = &reaction.features.curve {
        if let Some(midpoint) = curve.midpoint() {
            return Some(midpoint);
        }
    }
    reaction
        .features
        .bounding_box
        .as_ref()
        .map(|bbox| bbox.center())
}

/// True when a node style selects the centroid drawing mode: exactly one
/// geometric shape and it is tagged `"centroid"`.
pub(crate) fn is_centroid_node(entity: &Entity) -> bool {
    let Some(shape) = &entity.features.graphical_shape else {
        return false;
    };
    shape.geometric_shapes.len() == 1
        && matches!(
            shape.geometric_shapes[0],
            crate::ir::GeometricShape::Centroid(_)
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BoundingBox, EntityKind, Role};

    #[derive(Default)]
    struct RecordingExport {
        visits: Vec<String>,
    }

    impl NetworkExport for RecordingExport {
        fn reset(&mut self) {
            self.visits.clear();
        }

        fn add_compartment(&mut self, _network: &Network, compartment: &Entity) {
            self.visits.push(format!("c:{}", compartment.id));
        }

        fn add_species(&mut self, _network: &Network, species: &Entity) {
            self.visits.push(format!("s:{}", species.id));
        }

        fn add_reaction(&mut self, _network: &Network, reaction: &Entity) {
            self.visits.push(format!("r:{}", reaction.id));
        }

        fn add_species_reference(
            &mut self,
            _network: &Network,
            _reaction: &Entity,
            reference: &SpeciesReference,
        ) {
            self.visits.push(format!("sr:{}", reference.id));
        }
    }

    fn sample_network() -> Network {
        let mut network = Network::new();
        network
            .compartments
            .push(Entity::new(EntityKind::Compartment, "c1_glyph", "c1"));
        network
            .species
            .push(Entity::new(EntityKind::Species, "s1_glyph", "s1"));
        let mut reaction = Entity::new(EntityKind::Reaction, "r1_glyph", "r1");
        reaction.species_references.push(SpeciesReference {
            id: "sr1_glyph".to_string(),
            reference_id: "sr1".to_string(),
            species: Some("s1".to_string()),
            species_glyph: Some("s1_glyph".to_string()),
            role: Role::Substrate,
            features: Default::default(),
        });
        network.reactions.push(reaction);
        network
    }

    #[test]
    fn traversal_order_is_fixed() {
        let network = sample_network();
        let mut export = RecordingExport::default();
        extract_graph_info(&mut export, &network);
        assert_eq!(
            export.visits,
            vec!["c:c1_glyph", "s:s1_glyph", "r:r1_glyph", "sr:sr1_glyph"]
        );
    }

    #[test]
    fn traversal_resets_first() {
        let network = sample_network();
        let mut export = RecordingExport::default();
        extract_graph_info(&mut export, &network);
        extract_graph_info(&mut export, &network);
        assert_eq!(export.visits.len(), 4);
    }

    #[test]
    fn reaction_anchor_prefers_curve_midpoint() {
        let mut reaction = Entity::new(EntityKind::Reaction, "r1_glyph", "r1");
        reaction.features.bounding_box = Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            reaction_anchor(&reaction),
            Some(crate::geometry::Point::new(5.0, 5.0))
        );
        reaction.features.curve = Some(crate::ir::Curve {
            segments: vec![crate::ir::CurveSegment::Line {
                start: crate::geometry::Point::new(20.0, 20.0),
                end: crate::geometry::Point::new(40.0, 20.0),
            }],
        });
        assert_eq!(
            reaction_anchor(&reaction),
            Some(crate::geometry::Point::new(30.0, 20.0))
        );
    }
}
