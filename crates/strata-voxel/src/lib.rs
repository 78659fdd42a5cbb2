//! Palette-compressed voxel storage: packed arrays, paletted containers, chunk
//! sections and columns, and the network wire codec that feeds them.

pub mod column;
pub mod light;
pub mod packed;
pub mod paletted;
pub mod profile;
pub mod section;
pub mod wire;

pub use column::Column;
pub use light::{LIGHT_BYTES, NibbleArray};
pub use packed::PackedArray;
pub use paletted::{PaletteLayout, PalettedContainer};
pub use profile::{ProfileError, VersionProfile};
pub use section::{
    BIOME_VOLUME, BIOME_WIDTH, SECTION_VOLUME, SECTION_WIDTH, Section, biome_index, block_index,
};
pub use wire::{WireError, encode_column, encode_section, parse_column};
