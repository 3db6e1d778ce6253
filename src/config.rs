//! This module contains constants and configuration parameters used by the codec and value generators.

/// Initial size of the scratch buffer used when encoding a value to a fresh buffer.
/// The buffer is grown to the exact required size if a value does not fit.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;
/// Largest scratch buffer kept around between encodes; bigger ones are shrunk
/// back to [`DEFAULT_BUFFER_SIZE`] once the value has been copied out.
pub const MAX_SCRATCH_SIZE: usize = 64 * 1024;
/// Maximum number of bytes a zig-zag encoded long can occupy.
pub const MAX_VARINT_LEN: usize = 10;
/// Upper bound (exclusive) for randomly generated ints.
pub const RANDOM_INT_BOUND: i32 = 1000;
/// Upper bound (exclusive) for randomly generated floats.
pub const RANDOM_FLOAT_BOUND: f32 = 1e3;
/// Upper bound (exclusive) for the length of randomly generated strings and bytes.
pub const RANDOM_BYTES_LEN: usize = 32;
/// Upper bound (exclusive) for the number of items in randomly generated arrays and maps.
pub const RANDOM_COLLECTION_LEN: usize = 10;
/// Upper bound (exclusive) for the length of randomly generated map keys.
pub const RANDOM_KEY_LEN: usize = 20;
