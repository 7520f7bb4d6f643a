#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use abyssal_core::{CellCoord, CellState, FeatureKind};
use abyssal_system_generation::Generation;
use abyssal_world::Grid;
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

const LAYOUT_DOMAIN: &str = "cave";
const LAYOUT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout payload.
pub(crate) const LAYOUT_HEADER: &str = "cave:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Finished cave reduced to its open cells and feature locations.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CaveLayout {
    /// Number of cell columns contained in the grid.
    pub width: u32,
    /// Number of cell rows contained in the grid.
    pub height: u32,
    /// Row-major open flags, one per cell.
    pub open: Vec<bool>,
    /// Features placed within the cave.
    pub features: Vec<LayoutFeature>,
}

impl CaveLayout {
    /// Captures the grid and features of a finished generation.
    #[must_use]
    pub(crate) fn from_generation(generation: &Generation) -> Self {
        let grid = generation.grid();
        let open = (0..grid.height())
            .flat_map(|row| (0..grid.width()).map(move |column| CellCoord::new(column, row)))
            .map(|cell| grid.is_open(cell))
            .collect();
        let features = generation
            .features()
            .iter()
            .map(|feature| LayoutFeature {
                kind: feature.kind,
                cell: feature.cell,
            })
            .collect();

        Self {
            width: grid.width(),
            height: grid.height(),
            open,
            features,
        }
    }

    /// Rebuilds the grid described by the layout.
    #[must_use]
    pub(crate) fn to_grid(&self) -> Grid {
        let mut grid = Grid::walled(self.width, self.height);
        for (cell, open) in self.cells().zip(&self.open) {
            if *open {
                grid.set(cell, CellState::Open);
            }
        }
        grid
    }

    /// Encodes the layout into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let payload = SerializableLayout {
            cells: self.open.iter().map(|&open| if open { '1' } else { '0' }).collect(),
            features: self
                .features
                .iter()
                .map(|feature| SerializableFeature {
                    kind: feature.kind.to_string(),
                    cell: feature.cell,
                })
                .collect(),
        };
        let json = serde_json::to_vec(&payload).map_err(LayoutTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{LAYOUT_HEADER}:{}x{}:{encoded}",
            self.width, self.height
        ))
    }

    /// Decodes a layout from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != LAYOUT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != LAYOUT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (width, height) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let decoded: SerializableLayout =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        let expected = u64::from(width) * u64::from(height);
        let open = decoded
            .cells
            .chars()
            .map(|flag| match flag {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(LayoutTransferError::InvalidCell(other)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        if open.len() as u64 != expected {
            return Err(LayoutTransferError::CellCountMismatch {
                expected,
                actual: open.len(),
            });
        }

        let features = decoded
            .features
            .into_iter()
            .map(|feature| {
                let kind = FeatureKind::from_label(&feature.kind)
                    .ok_or_else(|| LayoutTransferError::UnknownFeature(feature.kind.clone()))?;
                if feature.cell.column() >= width || feature.cell.row() >= height {
                    return Err(LayoutTransferError::FeatureOutOfBounds {
                        kind,
                        cell: feature.cell,
                    });
                }
                Ok(LayoutFeature {
                    kind,
                    cell: feature.cell,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            width,
            height,
            open,
            features,
        })
    }

    fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let width = self.width;
        (0..self.height)
            .flat_map(move |row| (0..width).map(move |column| CellCoord::new(column, row)))
    }
}

/// Feature description captured within a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LayoutFeature {
    /// Kind of feature placed in the cave.
    pub kind: FeatureKind,
    /// Cell holding the feature.
    pub cell: CellCoord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableLayout {
    cells: String,
    features: Vec<SerializableFeature>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableFeature {
    kind: String,
    cell: CellCoord,
}

/// Errors that can occur while encoding or decoding layout strings.
#[derive(Debug)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded layout.
    MissingPrefix,
    /// The encoded layout did not contain a version segment.
    MissingVersion,
    /// The encoded layout did not include grid dimensions.
    MissingDimensions,
    /// The encoded layout did not include the payload segment.
    MissingPayload,
    /// The encoded layout used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded layout used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded layout.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    InvalidPayload(serde_json::Error),
    /// The cell bitstring held something other than `0` or `1`.
    InvalidCell(char),
    /// The cell bitstring did not cover the grid exactly.
    CellCountMismatch {
        /// Cells implied by the dimensions.
        expected: u64,
        /// Cells present in the bitstring.
        actual: usize,
    },
    /// A feature label did not name a known feature kind.
    UnknownFeature(String),
    /// A feature sat outside the grid.
    FeatureOutOfBounds {
        /// Kind of the misplaced feature.
        kind: FeatureKind,
        /// Cell the feature claimed.
        cell: CellCoord,
    },
}

impl fmt::Display for LayoutTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "layout string was empty"),
            Self::MissingPrefix => write!(f, "layout string is missing the prefix"),
            Self::MissingVersion => write!(f, "layout string is missing the version"),
            Self::MissingDimensions => write!(f, "layout string is missing the grid dimensions"),
            Self::MissingPayload => write!(f, "layout string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "layout prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "layout version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode layout payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not process layout payload: {error}")
            }
            Self::InvalidCell(flag) => write!(f, "cell flag '{flag}' is neither '0' nor '1'"),
            Self::CellCountMismatch { expected, actual } => {
                write!(f, "layout holds {actual} cells but its dimensions need {expected}")
            }
            Self::UnknownFeature(label) => write!(f, "feature '{label}' is not recognised"),
            Self::FeatureOutOfBounds { kind, cell } => {
                write!(f, "feature '{kind}' at {cell} lies outside the grid")
            }
        }
    }
}

impl Error for LayoutTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (width, height) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
    let height = height.trim().parse::<u32>().map_err(|_| invalid())?;

    if width == 0 || height == 0 {
        return Err(invalid());
    }

    Ok((width, height))
}
