//! Block lookup adapter used by raycasts.
//!
//! A ray visits long runs of blocks inside one column before crossing into
//! the next, so the adapter caches the handle of the column it last touched
//! (including negative lookups) and only goes back to the map when the ray
//! crosses a column boundary. No global lock is ever held; each read takes
//! the cached column's shared lock for the single lookup.

use std::cell::RefCell;

use glam::IVec3;
use strata_raycast::BlockLookup;

use crate::world::{ColumnHandle, ColumnPos, World};

pub(crate) struct ColumnCachingLookup<'a> {
    world: &'a World,
    cached: RefCell<Option<(ColumnPos, Option<ColumnHandle>)>>,
}

impl<'a> ColumnCachingLookup<'a> {
    pub(crate) fn new(world: &'a World) -> Self {
        Self {
            world,
            cached: RefCell::new(None),
        }
    }
}

impl BlockLookup for ColumnCachingLookup<'_> {
    fn state_at(&self, pos: IVec3) -> u32 {
        let key = ColumnPos::containing(pos.x, pos.z);
        let mut slot = self.cached.borrow_mut();
        let handle = match slot.as_ref() {
            Some((cached_key, handle)) if *cached_key == key => handle.clone(),
            _ => {
                let handle = self.world.column_handle(key);
                *slot = Some((key, handle.clone()));
                handle
            }
        };
        handle.map_or(0, |column| column.read().state_at(pos.x, pos.y, pos.z))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_reads_across_columns_and_unloaded_space() {
        let world = World::new();
        let payload = strata_voxel::encode_column(
            &vec![None; world.profile().section_count],
            world.profile(),
        );
        world.load_column(0, 0, &payload).unwrap();
        world.load_column(1, 0, &payload).unwrap();
        world.set_block_state(2, 0, 2, 4).unwrap();
        world.set_block_state(17, 0, 2, 6).unwrap();

        let lookup = ColumnCachingLookup::new(&world);
        assert_eq!(lookup.state_at(IVec3::new(2, 0, 2)), 4);
        // Same column again: served from the cached handle.
        assert_eq!(lookup.state_at(IVec3::new(3, 0, 2)), 0);
        // Next column over.
        assert_eq!(lookup.state_at(IVec3::new(17, 0, 2)), 6);
        // Unloaded space reads air, and the negative result is cached too.
        assert_eq!(lookup.state_at(IVec3::new(-5, 0, 2)), 0);
        assert_eq!(lookup.state_at(IVec3::new(-6, 0, 2)), 0);
    }
}
