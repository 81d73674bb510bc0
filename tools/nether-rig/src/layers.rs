//! Bone layer bitfields
//!
//! Bones belong to up to 32 layers, stored as one bit each in a `u32`.
//! Interchange files describe layers as whitespace separated tokens which are
//! either layer numbers (`"0 3 5"`) or free-form labels (`"spine ik"`).
//! Labels are mapped to bit indices through a [`LayerLabels`] table that lives
//! for one import session, so the mapping depends on the order labels are seen.

use crate::error::RigError;

/// Number of layers in a bitfield
pub const LAYER_COUNT: u32 = 32;

/// Highest layer index; labels beyond it are folded onto this layer
pub const MAX_LAYER: u32 = LAYER_COUNT - 1;

/// Session-scoped, append-only table mapping layer labels to bit indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerLabels {
    labels: Vec<String>,
}

impl LayerLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in assignment order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Returns the index of `label`, appending it when seen for the first time.
    ///
    /// The returned index is not clamped; callers fold it onto [`MAX_LAYER`].
    pub fn assign(&mut self, label: &str) -> usize {
        match self.index_of(label) {
            Some(index) => index,
            None => {
                self.labels.push(label.to_string());
                self.labels.len() - 1
            }
        }
    }
}

#[inline]
fn bit(layer: u32) -> u32 {
    debug_assert!(layer < LAYER_COUNT);
    1u32 << layer
}

/// Set or clear one layer bit
///
/// Indices outside `0..32` are rejected instead of wrapping.
pub fn set_layer(bitfield: u32, layer: u32, enable: bool) -> Result<u32, RigError> {
    if layer >= LAYER_COUNT {
        return Err(RigError::LayerOutOfRange(layer));
    }

    Ok(if enable {
        bitfield | bit(layer)
    } else {
        bitfield & !bit(layer)
    })
}

/// Enable one layer bit
pub fn enable_layer(bitfield: u32, layer: u32) -> Result<u32, RigError> {
    set_layer(bitfield, layer, true)
}

/// Parse a token as a layer number in `0..32`
///
/// Signed numbers are accepted so that `"-1"` or `"+40"` fall through to the
/// label path like any other out-of-range token.
fn numeric_layer(token: &str) -> Option<u32> {
    token
        .parse::<i64>()
        .ok()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&n| n < LAYER_COUNT)
}

/// Decode a layer string into a bitfield
///
/// Numeric tokens set their bit directly. Any other token is looked up in (or
/// appended to) `labels` and its index sets the bit, clamped to [`MAX_LAYER`].
///
/// Numbers and labels share the same 32 bits. A label may therefore land on a
/// bit that a number already named; no attempt is made to keep them apart.
pub fn decode_layers(layer_string: &str, labels: &mut LayerLabels) -> u32 {
    let mut bitfield = 0u32;

    for token in layer_string.split_whitespace() {
        if let Some(layer) = numeric_layer(token) {
            bitfield |= bit(layer);
            continue;
        }

        let index = labels.assign(token);
        let layer = match u32::try_from(index) {
            Ok(layer) if layer <= MAX_LAYER => layer,
            _ => {
                tracing::warn!(
                    "Too many layers in import. Layer '{}' mapped to layer {}",
                    token,
                    MAX_LAYER
                );
                MAX_LAYER
            }
        };

        bitfield |= bit(layer);
    }

    bitfield
}

/// Render the set bits of a bitfield as ascending, space separated indices
pub fn encode_layers(bitfield: u32) -> String {
    (0..LAYER_COUNT)
        .filter(|&layer| bitfield & bit(layer) != 0)
        .map(|layer| layer.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Layers a bone is actually shown in: an empty field means layer 0
pub fn effective_layers(bone_layers: u32) -> u32 {
    if bone_layers == 0 { 1 } else { bone_layers }
}
