//! Shared memory layouts and naming.
//!
//! - `layout`: byte-compatible overlays of the records the tracking
//!   process publishes. Mapping lives in `nozzle_shared_memory`.

pub mod layout;

/// Segment name without its optional leading slash.
///
/// `None` if nothing is left or the remainder contains another `/`.
pub fn segment_basename(name: &str) -> Option<&str> {
    let bare = name.strip_prefix('/').unwrap_or(name);
    (!bare.is_empty() && !bare.contains('/')).then_some(bare)
}
