//! A 16³ chunk section: block states, biomes, light, and a solid-block count.

use crate::light::NibbleArray;
use crate::paletted::{PaletteLayout, PalettedContainer};

/// Side length of a section in blocks.
pub const SECTION_WIDTH: usize = 16;

/// Total number of blocks in a section (16³).
pub const SECTION_VOLUME: usize = SECTION_WIDTH * SECTION_WIDTH * SECTION_WIDTH;

/// Side length of the biome grid in a section (biomes are 4×4×4 cells).
pub const BIOME_WIDTH: usize = 4;

/// Total number of biome cells in a section (4³).
pub const BIOME_VOLUME: usize = BIOME_WIDTH * BIOME_WIDTH * BIOME_WIDTH;

/// Linear index into a section's block array; `lx` varies fastest.
pub fn block_index(lx: usize, ly: usize, lz: usize) -> usize {
    debug_assert!(lx < SECTION_WIDTH && ly < SECTION_WIDTH && lz < SECTION_WIDTH);
    (ly * SECTION_WIDTH + lz) * SECTION_WIDTH + lx
}

/// Linear index into a section's biome array; `bx` varies fastest.
pub fn biome_index(bx: usize, by: usize, bz: usize) -> usize {
    debug_assert!(bx < BIOME_WIDTH && by < BIOME_WIDTH && bz < BIOME_WIDTH);
    (by * BIOME_WIDTH + bz) * BIOME_WIDTH + bx
}

/// One 16-block-tall slice of a chunk column.
///
/// Light arrays are optional: the chunk payload does not carry them, so they
/// stay absent until a light ingestion installs them. Reads fall back to the
/// protocol defaults (block light 0, sky light 15).
#[derive(Clone, Debug)]
pub struct Section {
    blocks: PalettedContainer,
    biomes: PalettedContainer,
    block_light: Option<NibbleArray>,
    sky_light: Option<NibbleArray>,
    solid_count: u16,
}

impl Section {
    /// Creates an all-air section with uniform biome zero.
    pub fn air(block_layout: PaletteLayout, biome_layout: PaletteLayout) -> Self {
        Self {
            blocks: PalettedContainer::single(block_layout, 0),
            biomes: PalettedContainer::single(biome_layout, 0),
            block_light: None,
            sky_light: None,
            solid_count: 0,
        }
    }

    /// Assembles a section from parsed containers and recounts solids.
    pub(crate) fn from_parsed(blocks: PalettedContainer, biomes: PalettedContainer) -> Self {
        let mut section = Self {
            blocks,
            biomes,
            block_light: None,
            sky_light: None,
            solid_count: 0,
        };
        section.recount_solid();
        section
    }

    /// Returns the block state id at local coordinates.
    pub fn block_state(&self, lx: usize, ly: usize, lz: usize) -> u32 {
        self.blocks.get(block_index(lx, ly, lz))
    }

    /// Writes a block state and returns the previous id, keeping the solid
    /// count in step.
    pub fn set_block_state(&mut self, lx: usize, ly: usize, lz: usize, state_id: u32) -> u32 {
        let previous = self.blocks.set(block_index(lx, ly, lz), state_id);
        match (previous != 0, state_id != 0) {
            (true, false) => self.solid_count -= 1,
            (false, true) => self.solid_count += 1,
            _ => {}
        }
        previous
    }

    /// Returns the biome id at biome-grid coordinates.
    pub fn biome(&self, bx: usize, by: usize, bz: usize) -> u32 {
        self.biomes.get(biome_index(bx, by, bz))
    }

    /// Writes a biome id and returns the previous one.
    pub fn set_biome(&mut self, bx: usize, by: usize, bz: usize, biome_id: u32) -> u32 {
        self.biomes.set(biome_index(bx, by, bz), biome_id)
    }

    /// Block light at a linear block index; 0 when no array is installed.
    pub fn block_light(&self, index: usize) -> u8 {
        self.block_light.as_ref().map_or(0, |arr| arr.get(index))
    }

    /// Sky light at a linear block index; 15 when no array is installed.
    pub fn sky_light(&self, index: usize) -> u8 {
        self.sky_light.as_ref().map_or(15, |arr| arr.get(index))
    }

    /// Installs or clears the light arrays.
    pub fn set_light(&mut self, block_light: Option<NibbleArray>, sky_light: Option<NibbleArray>) {
        self.block_light = block_light;
        self.sky_light = sky_light;
    }

    /// Number of non-air blocks in the section.
    pub fn solid_count(&self) -> u16 {
        self.solid_count
    }

    /// `true` when every block is air.
    pub fn is_empty(&self) -> bool {
        self.solid_count == 0
    }

    /// Recomputes the solid count from the block container.
    pub fn recount_solid(&mut self) {
        self.solid_count = self.blocks.iter().filter(|&id| id != 0).count() as u16;
    }

    /// The block-state container.
    pub fn blocks(&self) -> &PalettedContainer {
        &self.blocks
    }

    /// The biome container.
    pub fn biomes(&self) -> &PalettedContainer {
        &self.biomes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::VersionProfile;

    fn air_section() -> Section {
        let profile = VersionProfile::default();
        Section::air(
            PaletteLayout::blocks(&profile),
            PaletteLayout::biomes(&profile),
        )
    }

    #[test]
    fn test_linear_index_order() {
        // lx varies fastest, then lz, then ly.
        assert_eq!(block_index(0, 0, 0), 0);
        assert_eq!(block_index(1, 0, 0), 1);
        assert_eq!(block_index(0, 0, 1), 16);
        assert_eq!(block_index(0, 1, 0), 256);
        assert_eq!(block_index(15, 15, 15), 4095);

        assert_eq!(biome_index(0, 0, 0), 0);
        assert_eq!(biome_index(1, 0, 0), 1);
        assert_eq!(biome_index(0, 0, 1), 4);
        assert_eq!(biome_index(0, 1, 0), 16);
        assert_eq!(biome_index(3, 3, 3), 63);
    }

    #[test]
    fn test_solid_count_tracks_writes() {
        let mut section = air_section();
        assert_eq!(section.solid_count(), 0);

        section.set_block_state(0, 0, 0, 5);
        section.set_block_state(1, 0, 0, 5);
        assert_eq!(section.solid_count(), 2);

        // Overwriting solid with solid leaves the count alone.
        section.set_block_state(0, 0, 0, 7);
        assert_eq!(section.solid_count(), 2);

        section.set_block_state(0, 0, 0, 0);
        assert_eq!(section.solid_count(), 1);

        // Air over air is a no-op.
        section.set_block_state(9, 9, 9, 0);
        assert_eq!(section.solid_count(), 1);
    }

    #[test]
    fn test_light_defaults_without_arrays() {
        let section = air_section();
        assert_eq!(section.block_light(0), 0);
        assert_eq!(section.sky_light(0), 15);
    }

    #[test]
    fn test_installed_light_is_read_back() {
        let mut section = air_section();
        let mut block = crate::light::NibbleArray::new();
        block.set(block_index(3, 2, 1), 11);
        section.set_light(Some(block), Some(crate::light::NibbleArray::filled(4)));
        assert_eq!(section.block_light(block_index(3, 2, 1)), 11);
        assert_eq!(section.block_light(0), 0);
        assert_eq!(section.sky_light(0), 4);
    }

    #[test]
    fn test_biome_roundtrip() {
        let mut section = air_section();
        assert_eq!(section.set_biome(2, 1, 3, 6), 0);
        assert_eq!(section.biome(2, 1, 3), 6);
        assert_eq!(section.biome(0, 0, 0), 0);
    }
}
