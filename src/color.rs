//! Color and gradient resolution.
//!
//! Style attributes in the IR refer to colors by shared-resource id, by
//! SVG 1.1 name, or as a literal `#rrggbb`/`#rrggbbaa` value. Gradient
//! references resolve to the arithmetic mean of their stop colors when a
//! flat representative color is required. The fallback for anything
//! unresolvable is `#ffffff`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ir::{ColorDefinition, Network};

pub const FALLBACK_COLOR: &str = "#ffffff";

static NAMED_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("black", "#000000"),
        ("white", "#ffffff"),
        ("red", "#ff0000"),
        ("green", "#008000"),
        ("lime", "#00ff00"),
        ("blue", "#0000ff"),
        ("yellow", "#ffff00"),
        ("cyan", "#00ffff"),
        ("magenta", "#ff00ff"),
        ("gray", "#808080"),
        ("grey", "#808080"),
        ("lightgray", "#d3d3d3"),
        ("lightgrey", "#d3d3d3"),
        ("darkgray", "#a9a9a9"),
        ("darkgrey", "#a9a9a9"),
        ("silver", "#c0c0c0"),
        ("darkcyan", "#008b8b"),
        ("darkslategray", "#2f4f4f"),
        ("orange", "#ffa500"),
        ("gold", "#ffd700"),
        ("purple", "#800080"),
        ("brown", "#a52a2a"),
        ("pink", "#ffc0cb"),
        ("khaki", "#f0e68c"),
        ("lightskyblue", "#87cefa"),
        ("lightsalmon", "#ffa07a"),
        ("deepskyblue", "#00bfff"),
        ("whitesmoke", "#f5f5f5"),
        ("transparent", "#ffffff00"),
        ("none", "#ffffff00"),
    ])
});

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` into RGB channels.
pub fn parse_hex(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.strip_prefix('#')?;
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
            Some((r * 17, g * 17, b * 17))
        }
        6 | 8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

pub fn format_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Look up an SVG color name, normalized to lower case.
pub fn named_color(name: &str) -> Option<&'static str> {
    NAMED_COLORS.get(name.to_ascii_lowercase().as_str()).copied()
}

/// Resolve a color or gradient reference to a concrete color string.
///
/// Resolution order: gradient id (when `search_gradients_first`), shared
/// color id, literal `#...` passthrough, SVG name, then the `#ffffff`
/// fallback. Gradient references average their stop colors, each stop
/// being resolved recursively.
pub fn resolve_color(network: &Network, reference: &str, search_gradients_first: bool) -> String {
    resolve_color_depth(network, reference, search_gradients_first, 0)
}

fn resolve_color_depth(
    network: &Network,
    reference: &str,
    search_gradients_first: bool,
    depth: usize,
) -> String {
    // Self-referential gradient stops would otherwise recurse forever.
    if depth > 8 {
        return FALLBACK_COLOR.to_string();
    }
    if search_gradients_first {
        if let Some(gradient) = network.find_gradient(reference) {
            if !gradient.stops.is_empty() {
                return average_stop_colors(network, gradient.stops.iter().map(|s| s.color.as_str()), depth);
            }
        }
    }
    if let Some(color) = network.find_color(reference) {
        if let Some(value) = &color.value {
            return value.clone();
        }
    }
    if reference.starts_with('#') {
        return reference.to_string();
    }
    if let Some(value) = named_color(reference) {
        return value.to_string();
    }
    log::debug!("unresolvable color reference {reference:?}, using fallback");
    FALLBACK_COLOR.to_string()
}

// Arithmetic mean per channel over all stops, not weighted by offset.
// Integer division keeps the documented #000000 + #ffffff -> #7f7f7f.
fn average_stop_colors<'a>(
    network: &Network,
    stop_colors: impl Iterator<Item = &'a str>,
    depth: usize,
) -> String {
    let mut sum = (0u32, 0u32, 0u32);
    let mut count = 0u32;
    for stop in stop_colors {
        let resolved = resolve_color_depth(network, stop, true, depth + 1);
        let (r, g, b) = parse_hex(&resolved).unwrap_or((255, 255, 255));
        sum.0 += u32::from(r);
        sum.1 += u32::from(g);
        sum.2 += u32::from(b);
        count += 1;
    }
    if count == 0 {
        return FALLBACK_COLOR.to_string();
    }
    format_hex(
        (sum.0 / count) as u8,
        (sum.1 / count) as u8,
        (sum.2 / count) as u8,
    )
}

/// Find a registered color with this value, or register it under a fresh
/// `colorN` id (smallest unused N) and return the id. Export dialects
/// that require every color to be a named resource use this for inline
/// literals.
pub fn find_or_register_color(network: &mut Network, value: &str) -> String {
    if let Some(existing) = network
        .colors
        .iter()
        .find(|color| color.value.as_deref() == Some(value))
    {
        return existing.id.clone();
    }
    let id = allocate_color_id(network);
    network.colors.push(ColorDefinition {
        id: id.clone(),
        value: Some(value.to_string()),
    });
    id
}

fn allocate_color_id(network: &Network) -> String {
    let mut n = 1usize;
    loop {
        let candidate = format!("color{n}");
        if network.find_color(&candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}
