//! Collision layer masks for filtering geometry queries
//!
//! Regions, influence meshes and occluding geometry live on separate layers so
//! a query only ever sees the colliders it is interested in.

use serde::{Deserialize, Serialize};

/// Bit mask over the 32 collision layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// No collision layer
    pub const NONE: Self = Self(0);

    /// All collision layers
    pub const ALL: Self = Self(0xFFFF_FFFF);

    /// Mask containing a single layer
    pub const fn from_layer(layer: u8) -> Self {
        Self(1 << (layer & 31))
    }

    /// Helper to create a mask from multiple layers
    pub fn from_layers(layers: &[u8]) -> Self {
        layers
            .iter()
            .fold(Self::NONE, |acc, &layer| acc | Self::from_layer(layer))
    }

    /// Whether the two masks share any layer
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Whether `layer` is part of this mask
    pub const fn contains_layer(self, layer: u8) -> bool {
        self.intersects(Self::from_layer(layer))
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_creation() {
        let mask = LayerMask::from_layers(&[0, 3, 8]);
        assert_eq!(mask, LayerMask(0b1_0000_1001));
        assert!(mask.contains_layer(3));
        assert!(!mask.contains_layer(9));
    }
}
