//! The concurrent world store: a map of chunk columns behind per-column
//! locks, with the external query, mutation, export, and raycast surface.

pub mod error;
mod lookup;
pub mod world;

pub use error::WorldError;
pub use strata_raycast::{BlockLookup, Face, RaycastHit};
pub use strata_voxel::{VersionProfile, WireError};
pub use world::{BlockInfo, ColumnPos, World};
