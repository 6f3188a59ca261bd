use crate::loader::FailurePolicy;

/// Gravity used by the scene world (meters per second squared, applied along -Y).
pub const GRAVITY_MPS2: f32 = 9.81;

/// Magnitude of the impulse applied when a mesh is clicked (newton-seconds).
///
/// Tuned for the built-in catalog: a 5 kg asset gains ~2 m/s.
pub const IMPULSE_STRENGTH: f32 = 10.0;

/// Below this squared distance the impulse source and target are treated as coincident.
pub const IMPULSE_DIRECTION_EPS_SQ: f32 = 1.0e-12;

/// Exclusive upper bound of the random suffix in string IDs (`0..=9999`).
pub const ID_SUFFIX_RANGE: u32 = 10_000;

/// Prefix used by [`crate::IdAllocator::generate_asset_id`].
pub const ASSET_ID_PREFIX: &str = "asset";

/// A failed load stays failed for the process lifetime unless a caller opts into retries.
pub const DEFAULT_FAILURE_POLICY: FailurePolicy = FailurePolicy::Sticky;
