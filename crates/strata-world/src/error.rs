//! World-level error types.

use strata_voxel::WireError;

/// Errors surfaced by the mutating entry points of [`World`](crate::World).
///
/// Read entry points never error; they degrade to protocol defaults instead.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A write targeted a chunk column that is not loaded.
    #[error("chunk column ({cx}, {cz}) is not loaded")]
    NotLoaded {
        /// Chunk X of the targeted column.
        cx: i32,
        /// Chunk Z of the targeted column.
        cz: i32,
    },

    /// A coordinate fell outside the world's vertical bounds.
    #[error("y {y} is outside the vertical range [{min_y}, {max_y})")]
    OutOfRange {
        /// The rejected Y coordinate.
        y: i32,
        /// Lowest valid Y.
        min_y: i32,
        /// First Y above the world.
        max_y: i32,
    },

    /// A caller-supplied argument was unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The chunk payload for a column failed to decode.
    #[error("failed to parse chunk column ({cx}, {cz})")]
    Parse {
        /// Chunk X of the targeted column.
        cx: i32,
        /// Chunk Z of the targeted column.
        cz: i32,
        /// The wire-level cause, including the byte offset.
        #[source]
        source: WireError,
    },
}
