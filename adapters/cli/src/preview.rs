//! Plain-text presentation of a cave layout.

use std::{collections::HashMap, fmt::Write as _};

use abyssal_core::{CellCoord, FeatureKind};
use sha2::{Digest, Sha256};

use crate::layout_transfer::CaveLayout;

/// Renders the layout as one line of symbols per grid row.
///
/// Features win over route cells, route cells over open water.
#[must_use]
pub(crate) fn render_map(layout: &CaveLayout, route_cells: &[CellCoord]) -> String {
    let features: HashMap<CellCoord, FeatureKind> = layout
        .features
        .iter()
        .map(|feature| (feature.cell, feature.kind))
        .collect();
    let width = layout.width as usize;
    let mut map = String::with_capacity((width + 1) * layout.height as usize);

    for (index, open) in layout.open.iter().enumerate() {
        let cell = CellCoord::new((index % width) as u32, (index / width) as u32);
        let symbol = match features.get(&cell) {
            Some(kind) => feature_symbol(*kind),
            None if route_cells.contains(&cell) => '*',
            None if *open => '.',
            None => '#',
        };
        map.push(symbol);
        if index % width == width - 1 {
            map.push('\n');
        }
    }

    map
}

/// Symbol drawn for a feature on the map.
#[must_use]
pub(crate) fn feature_symbol(kind: FeatureKind) -> char {
    match kind {
        FeatureKind::Start => 'S',
        FeatureKind::Goal => 'G',
        FeatureKind::Midpoint => 'M',
        FeatureKind::Rendezvous => 'R',
        FeatureKind::Mine(index) => char::from_digit(u32::from(index % 10), 10).unwrap_or('?'),
    }
}

/// Hex-encoded SHA-256 digest of the layout's cells and features.
#[must_use]
pub(crate) fn fingerprint(layout: &CaveLayout) -> String {
    let mut hasher = Sha256::new();
    hasher.update(layout.width.to_le_bytes());
    hasher.update(layout.height.to_le_bytes());
    hasher.update(
        layout
            .open
            .iter()
            .map(|&open| u8::from(open))
            .collect::<Vec<_>>(),
    );
    for feature in &layout.features {
        hasher.update(feature.kind.to_string().as_bytes());
        hasher.update(feature.cell.column().to_le_bytes());
        hasher.update(feature.cell.row().to_le_bytes());
    }

    hasher
        .finalize()
        .iter()
        .fold(String::with_capacity(64), |mut hex, byte| {
            let _ = write!(hex, "{byte:02x}");
            hex
        })
}
