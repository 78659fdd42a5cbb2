//! Version-bound world parameters with sensible defaults.
//!
//! Everything the store needs to know about the protocol version it speaks is
//! collected here: the vertical extent of a chunk column and the palette width
//! parameters for block states and biomes. The defaults describe MC 1.21.1.

use serde::{Deserialize, Serialize};

/// Parameters bound at construction that vary across protocol versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionProfile {
    /// Lowest block Y coordinate in the world.
    pub min_y: i32,
    /// Number of 16-block-tall sections in a chunk column.
    pub section_count: usize,
    /// Smallest indirect palette width for block states.
    pub block_min_indirect_bits: u8,
    /// Largest indirect palette width for block states; one more goes direct.
    pub block_max_indirect_bits: u8,
    /// Width of a direct (global-id) block entry.
    pub block_direct_bits: u8,
    /// Smallest indirect palette width for biomes.
    pub biome_min_indirect_bits: u8,
    /// Largest indirect palette width for biomes; one more goes direct.
    pub biome_max_indirect_bits: u8,
    /// Width of a direct (global-id) biome entry.
    pub biome_direct_bits: u8,
}

impl Default for VersionProfile {
    fn default() -> Self {
        Self {
            min_y: -64,
            section_count: 24,
            block_min_indirect_bits: 4,
            block_max_indirect_bits: 8,
            block_direct_bits: 15,
            biome_min_indirect_bits: 1,
            biome_max_indirect_bits: 3,
            biome_direct_bits: 6,
        }
    }
}

/// Errors produced by [`VersionProfile::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// The profile has no sections at all.
    #[error("section count must be at least 1")]
    NoSections,
    /// An indirect width range is empty or inverted.
    #[error("indirect bit range [{min}, {max}] is invalid")]
    BadIndirectRange {
        /// Configured minimum indirect width.
        min: u8,
        /// Configured maximum indirect width.
        max: u8,
    },
    /// A direct width does not fit the wire format.
    #[error("direct width {0} must be above the indirect range and at most 32")]
    BadDirectWidth(u8),
}

impl VersionProfile {
    /// First Y coordinate above the world (exclusive upper bound).
    pub fn max_y(&self) -> i32 {
        self.min_y + self.section_count as i32 * 16
    }

    /// Maps an absolute world Y to a section index, or `None` when out of range.
    pub fn section_index_of(&self, y: i32) -> Option<usize> {
        // Widen so extreme coordinates cannot wrap.
        let dy = i64::from(y) - i64::from(self.min_y);
        if dy < 0 {
            return None;
        }
        let index = (dy >> 4) as usize;
        (index < self.section_count).then_some(index)
    }

    /// Checks the profile for degenerate values.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.section_count == 0 {
            return Err(ProfileError::NoSections);
        }
        for (min, max, direct) in [
            (
                self.block_min_indirect_bits,
                self.block_max_indirect_bits,
                self.block_direct_bits,
            ),
            (
                self.biome_min_indirect_bits,
                self.biome_max_indirect_bits,
                self.biome_direct_bits,
            ),
        ] {
            if min == 0 || min > max {
                return Err(ProfileError::BadIndirectRange { min, max });
            }
            if direct <= max || direct > 32 {
                return Err(ProfileError::BadDirectWidth(direct));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_1_21() {
        let p = VersionProfile::default();
        assert_eq!(p.min_y, -64);
        assert_eq!(p.section_count, 24);
        assert_eq!(p.max_y(), 320);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_section_index_of_bounds() {
        let p = VersionProfile::default();
        assert_eq!(p.section_index_of(-64), Some(0));
        assert_eq!(p.section_index_of(-49), Some(0));
        assert_eq!(p.section_index_of(-48), Some(1));
        assert_eq!(p.section_index_of(0), Some(4));
        assert_eq!(p.section_index_of(319), Some(23));
        assert_eq!(p.section_index_of(320), None);
        assert_eq!(p.section_index_of(-65), None);
    }

    #[test]
    fn test_validate_rejects_degenerate_profiles() {
        let mut p = VersionProfile {
            section_count: 0,
            ..VersionProfile::default()
        };
        assert!(matches!(p.validate(), Err(ProfileError::NoSections)));

        p.section_count = 24;
        p.block_min_indirect_bits = 9;
        assert!(matches!(
            p.validate(),
            Err(ProfileError::BadIndirectRange { .. })
        ));

        p.block_min_indirect_bits = 4;
        p.block_direct_bits = 8;
        assert!(matches!(p.validate(), Err(ProfileError::BadDirectWidth(8))));
    }
}
