//! The world store: chunk columns keyed by position, safe for concurrent use.
//!
//! The column map is a [`DashMap`], so lookups from many threads proceed in
//! parallel and insertion or removal only contends on a shard. Each column
//! sits behind its own `RwLock`: point reads take a shared guard, writes an
//! exclusive one, and chunk payloads are parsed before any lock is touched.

use std::sync::Arc;

use dashmap::DashMap;
use glam::DVec3;
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};
use tracing::debug;

use strata_raycast::RaycastHit;
use strata_voxel::{Column, NibbleArray, VersionProfile, wire};

use crate::error::WorldError;
use crate::lookup::ColumnCachingLookup;

/// Identifies a chunk column's position in the world grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnPos {
    /// Chunk-grid X coordinate (`world x >> 4`).
    pub x: i32,
    /// Chunk-grid Z coordinate (`world z >> 4`).
    pub z: i32,
}

impl ColumnPos {
    /// Creates a column position from chunk-grid coordinates.
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The column containing the given world-space block coordinates.
    pub fn containing(x: i32, z: i32) -> Self {
        Self {
            x: x >> 4,
            z: z >> 4,
        }
    }
}

/// Everything the store knows about one block position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Block state id; 0 is air.
    pub state_id: u32,
    /// Block light level (0–15).
    pub block_light: u8,
    /// Sky light level (0–15).
    pub sky_light: u8,
    /// Biome id of the containing 4×4×4 cell.
    pub biome_id: u32,
}

pub(crate) type ColumnHandle = Arc<RwLock<Column>>;

/// An in-memory voxel world: chunk columns, block/biome/light queries, bulk
/// section export, and raycasting.
///
/// Every instance owns its own state; any number of worlds may coexist.
pub struct World {
    columns: DashMap<ColumnPos, ColumnHandle, FxBuildHasher>,
    profile: VersionProfile,
}

impl World {
    /// Creates an empty world with the default (MC 1.21.1) profile.
    pub fn new() -> Self {
        Self::with_profile(VersionProfile::default())
    }

    /// Creates an empty world with an explicit version profile.
    pub fn with_profile(profile: VersionProfile) -> Self {
        Self {
            columns: DashMap::with_hasher(FxBuildHasher),
            profile,
        }
    }

    /// The profile this world was built with.
    pub fn profile(&self) -> &VersionProfile {
        &self.profile
    }

    /// Parses a chunk payload and inserts (or replaces) the column at
    /// `(cx, cz)`.
    ///
    /// Parsing happens entirely off-lock; only the final publish touches the
    /// map. On a parse error the previously loaded column, if any, is left
    /// untouched.
    pub fn load_column(&self, cx: i32, cz: i32, payload: &[u8]) -> Result<(), WorldError> {
        let sections = wire::parse_column(payload, &self.profile)
            .map_err(|source| WorldError::Parse { cx, cz, source })?;
        let column = Column::from_sections(&self.profile, sections);
        self.columns
            .insert(ColumnPos::new(cx, cz), Arc::new(RwLock::new(column)));
        debug!(cx, cz, "loaded chunk column");
        Ok(())
    }

    /// Removes the column at `(cx, cz)`. Idempotent.
    ///
    /// Returns `true` if a column was actually removed.
    pub fn unload_column(&self, cx: i32, cz: i32) -> bool {
        let removed = self.columns.remove(&ColumnPos::new(cx, cz)).is_some();
        if removed {
            debug!(cx, cz, "unloaded chunk column");
        }
        removed
    }

    /// Block state id at world coordinates.
    ///
    /// Returns 0 when the column is not loaded, the section is absent, or
    /// `y` is outside the vertical range.
    pub fn block_state_at(&self, x: i32, y: i32, z: i32) -> u32 {
        self.column_handle(ColumnPos::containing(x, z))
            .map_or(0, |handle| handle.read().state_at(x, y, z))
    }

    /// Writes a block state at world coordinates.
    ///
    /// Fails with [`WorldError::NotLoaded`] when the column is absent and
    /// [`WorldError::OutOfRange`] when `y` is outside the vertical bounds.
    /// `y` is absolute world Y; producers working in section-relative space
    /// add `sy * 16 + min_y` before calling.
    pub fn set_block_state(&self, x: i32, y: i32, z: i32, state_id: u32) -> Result<(), WorldError> {
        // Column presence is resolved before the vertical bounds: a write to
        // unloaded space reports NotLoaded even when y is also out of range.
        let pos = ColumnPos::containing(x, z);
        let handle = self
            .column_handle(pos)
            .ok_or(WorldError::NotLoaded { cx: pos.x, cz: pos.z })?;
        if self.profile.section_index_of(y).is_none() {
            return Err(WorldError::OutOfRange {
                y,
                min_y: self.profile.min_y,
                max_y: self.profile.max_y(),
            });
        }
        handle.write().set_state(x, y, z, state_id);
        Ok(())
    }

    /// Everything known about one block, or `None` when the column is not
    /// loaded. Absent sections read as air with default light.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Option<BlockInfo> {
        let handle = self.column_handle(ColumnPos::containing(x, z))?;
        let column = handle.read();
        Some(BlockInfo {
            state_id: column.state_at(x, y, z),
            block_light: column.block_light_at(x, y, z),
            sky_light: column.sky_light_at(x, y, z),
            biome_id: column.biome_at(x, y, z),
        })
    }

    /// Biome id at world coordinates; 0 when nothing is loaded there.
    pub fn biome_at(&self, x: i32, y: i32, z: i32) -> u32 {
        self.column_handle(ColumnPos::containing(x, z))
            .map_or(0, |handle| handle.read().biome_at(x, y, z))
    }

    /// Block light at world coordinates; 0 when nothing is loaded there.
    pub fn block_light_at(&self, x: i32, y: i32, z: i32) -> u8 {
        self.column_handle(ColumnPos::containing(x, z))
            .map_or(0, |handle| handle.read().block_light_at(x, y, z))
    }

    /// Sky light at world coordinates; 15 when nothing is loaded there.
    pub fn sky_light_at(&self, x: i32, y: i32, z: i32) -> u8 {
        self.column_handle(ColumnPos::containing(x, z))
            .map_or(15, |handle| handle.read().sky_light_at(x, y, z))
    }

    /// Installs light arrays on one section, the ingestion path for a light
    /// packet. Slices must be 2048 bytes when present; `None` clears.
    pub fn load_section_light(
        &self,
        cx: i32,
        cz: i32,
        sy: i32,
        block_light: Option<&[u8]>,
        sky_light: Option<&[u8]>,
    ) -> Result<(), WorldError> {
        if sy < 0 || sy as usize >= self.profile.section_count {
            return Err(WorldError::OutOfRange {
                y: sy.saturating_mul(16).saturating_add(self.profile.min_y),
                min_y: self.profile.min_y,
                max_y: self.profile.max_y(),
            });
        }
        let block = match block_light {
            Some(bytes) => Some(
                NibbleArray::from_bytes(bytes)
                    .ok_or(WorldError::InvalidArgument("block light must be 2048 bytes"))?,
            ),
            None => None,
        };
        let sky = match sky_light {
            Some(bytes) => Some(
                NibbleArray::from_bytes(bytes)
                    .ok_or(WorldError::InvalidArgument("sky light must be 2048 bytes"))?,
            ),
            None => None,
        };
        let handle = self
            .column_handle(ColumnPos::new(cx, cz))
            .ok_or(WorldError::NotLoaded { cx, cz })?;
        handle.write().install_light(sy as usize, block, sky);
        Ok(())
    }

    /// Exports the block states of one section as 4096 little-endian `u32`
    /// values (16384 bytes).
    ///
    /// Returns `None` when the column is not loaded, the section is absent,
    /// or `sy` is outside `[0, section_count)`.
    pub fn export_section_states(&self, cx: i32, cz: i32, sy: i32) -> Option<Vec<u8>> {
        if sy < 0 {
            return None;
        }
        let handle = self.column_handle(ColumnPos::new(cx, cz))?;
        let column = handle.read();
        column.export_section(sy as usize)
    }

    /// Snapshot of the currently loaded column positions.
    pub fn loaded_columns(&self) -> Vec<ColumnPos> {
        self.columns.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of currently loaded columns.
    pub fn loaded_count(&self) -> usize {
        self.columns.len()
    }

    /// Casts a ray from `origin` along `direction`, returning the first
    /// non-air block within `max_distance` whose state the optional `ignore`
    /// predicate does not exclude.
    ///
    /// Fails with [`WorldError::InvalidArgument`] for a zero direction or a
    /// negative `max_distance`. Traversal holds no global lock; column locks
    /// are taken per lookup as the ray crosses columns.
    pub fn raycast(
        &self,
        origin: DVec3,
        direction: DVec3,
        max_distance: f64,
        ignore: Option<&dyn Fn(u32) -> bool>,
    ) -> Result<Option<RaycastHit>, WorldError> {
        if direction == DVec3::ZERO {
            return Err(WorldError::InvalidArgument("direction must be non-zero"));
        }
        if max_distance < 0.0 {
            return Err(WorldError::InvalidArgument(
                "max distance must be non-negative",
            ));
        }
        let lookup = ColumnCachingLookup::new(self);
        Ok(strata_raycast::raycast(
            &lookup,
            origin,
            direction,
            max_distance,
            ignore,
        ))
    }

    /// Clones out the handle for a column, holding the map shard only for
    /// the lookup itself.
    pub(crate) fn column_handle(&self, pos: ColumnPos) -> Option<ColumnHandle> {
        self.columns.get(&pos).map(|entry| Arc::clone(entry.value()))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
