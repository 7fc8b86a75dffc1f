use std::path::{Path, PathBuf};

use serde_json::Value;

use sbmlplot_rs::export::{
    CytoscapeExport, EscherExport, FigureExport, NetworkEditorExport, SbmlExport,
};
use sbmlplot_rs::import;
use sbmlplot_rs::ir::{Network, Role};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn minimal_network() -> Network {
    import::extract_info_from_path(&fixture("minimal.xml")).expect("fixture import failed")
}

fn find_node<'a>(document: &'a Value, id: &str) -> &'a Value {
    document["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|node| node["id"] == Value::from(id))
        .unwrap_or_else(|| panic!("no node {id}"))
}

#[test]
fn editor_dialect_end_to_end() {
    let network = minimal_network();
    let mut export = NetworkEditorExport::new();
    let document: Value = serde_json::from_str(&export.export(&network).unwrap()).unwrap();

    assert_eq!(document["background-color"], Value::from("#fffef7"));
    assert_eq!(find_node(&document, "c1_glyph")["style"]["category"], "Compartment");
    assert_eq!(find_node(&document, "s1_glyph")["style"]["category"], "Species");
    assert_eq!(find_node(&document, "r1_glyph")["style"]["category"], "Reaction");

    // Species positions are centers, not corners.
    let s1 = find_node(&document, "s1_glyph");
    assert_eq!(s1["position"]["x"], Value::from(70.0));
    assert_eq!(s1["position"]["y"], Value::from(118.0));
    assert_eq!(s1["style"]["fill"], Value::from("#f0e68c"));

    let edges = document["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 2);

    // Substrates run species to reaction, products the other way around.
    let substrate = edges.iter().find(|edge| edge["id"] == "sr1_glyph").unwrap();
    assert_eq!(substrate["style"]["category"], "SubstrateLine");
    assert_eq!(substrate["source"]["node"], "s1_glyph");
    assert_eq!(substrate["target"]["node"], "r1_glyph");

    let product = edges.iter().find(|edge| edge["id"] == "sr2_glyph").unwrap();
    assert_eq!(product["style"]["category"], "ProductLine");
    assert_eq!(product["source"]["node"], "r1_glyph");
    assert_eq!(product["target"]["node"], "s2_glyph");
}

#[test]
fn repeated_export_does_not_duplicate() {
    let network = minimal_network();
    let mut export = NetworkEditorExport::new();
    let first = export.export(&network).unwrap();
    let second = export.export(&network).unwrap();
    assert_eq!(first, second);

    let document: Value = serde_json::from_str(&second).unwrap();
    assert_eq!(document["nodes"].as_array().unwrap().len(), 4);
}

#[test]
fn editor_json_reimports() {
    let network = minimal_network();
    let mut export = NetworkEditorExport::new();
    let document = export.export(&network).unwrap();

    let round_tripped = import::editor::extract_info(&document).unwrap();
    assert_eq!(round_tripped.compartments.len(), 1);
    assert_eq!(round_tripped.species.len(), 2);
    assert_eq!(round_tripped.reactions.len(), 1);

    let s1 = &round_tripped.species[0];
    let bbox = s1.features.bounding_box.as_ref().unwrap();
    assert_eq!(bbox.x, 40.0);
    assert_eq!(bbox.y, 100.0);

    let reaction = &round_tripped.reactions[0];
    assert_eq!(reaction.species_references.len(), 2);
    assert_eq!(reaction.species_references[0].role, Role::Substrate);
}

#[test]
fn sbml_round_trip_preserves_structure() {
    let network = minimal_network();
    let mut export = SbmlExport::new();
    let document = export.export(&network).unwrap();

    let round_tripped = import::sbml::extract_info(&document).unwrap();
    assert_eq!(round_tripped.compartments.len(), 1);
    assert_eq!(round_tripped.species.len(), 2);
    assert_eq!(round_tripped.reactions.len(), 1);
    assert_eq!(round_tripped.species[0].id, "s1_glyph");
    assert_eq!(round_tripped.species[0].reference_id, "s1");

    let reaction = &round_tripped.reactions[0];
    let roles: Vec<Role> = reaction
        .species_references
        .iter()
        .map(|reference| reference.role)
        .collect();
    assert_eq!(roles, vec![Role::Substrate, Role::Product]);

    // Render resources survive, including the attached line ending.
    assert!(round_tripped.find_line_ending("arrowHead").is_some());
    let product = &reaction.species_references[1];
    let curve = product.features.graphical_curve.as_ref().unwrap();
    assert_eq!(curve.end_head.as_deref(), Some("arrowHead"));
}

#[test]
fn bare_model_gets_default_layout_and_styles() {
    let network = import::extract_info_from_path(&fixture("no_layout.xml")).unwrap();
    assert_eq!(network.species.len(), 3);
    assert_eq!(network.reactions.len(), 1);
    assert!(!network.extents.is_empty());

    for species in &network.species {
        assert!(species.features.bounding_box.is_some());
        assert!(species.features.graphical_shape.is_some());
    }

    // Modifiers came from the model participant table.
    let reaction = &network.reactions[0];
    assert_eq!(reaction.species_references.len(), 3);
    assert!(reaction
        .species_references
        .iter()
        .any(|reference| reference.role == Role::Modifier));

    // A generated layout still feeds every exporter.
    let mut export = NetworkEditorExport::new();
    let document: Value = serde_json::from_str(&export.export(&network).unwrap()).unwrap();
    assert_eq!(document["nodes"].as_array().unwrap().len(), 5);
}

#[test]
fn figure_svg_is_well_formed() {
    let network = minimal_network();
    let mut export = FigureExport::new();
    let svg = export.export_svg(&network).unwrap();

    assert!(svg.starts_with("<svg"));
    assert!(svg.ends_with("</svg>\n") || svg.ends_with("</svg>"));
    assert!(svg.contains("glucose"));
    assert!(svg.contains("fill=\"#f0e68c\""));
}

#[test]
fn cytoscape_structure() {
    let network = minimal_network();
    let mut export = CytoscapeExport::new();
    let document: Value = serde_json::from_str(&export.export(&network).unwrap()).unwrap();

    assert_eq!(document["elements"]["nodes"].as_array().unwrap().len(), 4);
    assert_eq!(document["elements"]["edges"].as_array().unwrap().len(), 2);
    assert_eq!(document["style"].as_array().unwrap().len(), 6);

    let edge = document["elements"]["edges"]
        .as_array()
        .unwrap()
        .iter()
        .find(|edge| edge["data"]["id"] == "sr2_glyph")
        .unwrap();
    assert_eq!(edge["data"]["source"], "r1_glyph");
    assert_eq!(edge["data"]["target"], "s2_glyph");
}

#[test]
fn escher_structure() {
    let network = minimal_network();
    let mut export = EscherExport::new();
    let document: Value = serde_json::from_str(&export.export(&network).unwrap()).unwrap();

    let array = document.as_array().unwrap();
    assert_eq!(array.len(), 2);

    // Two metabolites plus one midmarker.
    let nodes = array[1]["nodes"].as_object().unwrap();
    assert_eq!(nodes.len(), 3);

    let reactions = array[1]["reactions"].as_object().unwrap();
    assert_eq!(reactions.len(), 1);
    let reaction = reactions.values().next().unwrap();
    assert_eq!(reaction["bigg_id"], "r1");
    assert_eq!(reaction["segments"].as_object().unwrap().len(), 2);

    // The compartment has no Escher counterpart and lands in text_labels.
    assert_eq!(array[1]["text_labels"].as_object().unwrap().len(), 1);
}
