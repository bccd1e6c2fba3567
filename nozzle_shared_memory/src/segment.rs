//! Typed overlay of a named shared memory segment.
//!
//! A [`SharedSegment<T>`] maps exactly `size_of::<T>()` bytes and exposes
//! them as a live view of `T`. There is no header, version counter or lock:
//! the tracking process does not support one, so reads are plain volatile
//! copies and may observe a record that is half old, half new.

use crate::error::{ShmError, ShmResult};
use crate::platform::{create_segment_mmap, open_segment_mmap, unlink_segment};
use memmap2::MmapMut;
use nozzle::shm::layout::{CloseSignal, TrackingFrame};
use std::marker::PhantomData;
use tracing::warn;

/// Layouts that may be overlaid on foreign shared memory.
///
/// # Safety
/// Implementors must be `#[repr(C)]`, contain only plain numeric fields,
/// and accept every bit pattern as a valid value.
pub unsafe trait SegmentLayout: Copy + 'static {}

// SAFETY: repr(C), only i32/f64 fields.
unsafe impl SegmentLayout for TrackingFrame {}
// SAFETY: repr(C), single i32 field.
unsafe impl SegmentLayout for CloseSignal {}

/// Named shared memory segment holding one `T`.
pub struct SharedSegment<T: SegmentLayout> {
    name: String,
    mmap: MmapMut,
    /// Created by this process; the name is unlinked on drop.
    owner: bool,
    _marker: PhantomData<T>,
}

impl<T: SegmentLayout> SharedSegment<T> {
    /// Attach to an existing segment whose size is exactly `size_of::<T>()`.
    ///
    /// # Errors
    /// - `ShmError::NotFound` if no segment has this name.
    /// - `ShmError::SizeMismatch` if the segment size differs from `T`.
    pub fn open(name: &str) -> ShmResult<Self> {
        let mmap = open_segment_mmap(name, Self::size())?;
        Self::wrap(name, mmap, false)
    }

    /// Create a zero-filled segment sized for `T` (producer side).
    ///
    /// The segment name is removed again when the returned value is dropped.
    pub fn create(name: &str) -> ShmResult<Self> {
        let mmap = create_segment_mmap(name, Self::size())?;
        Self::wrap(name, mmap, true)
    }

    fn wrap(name: &str, mmap: MmapMut, owner: bool) -> ShmResult<Self> {
        validate_alignment::<T>(mmap.as_ptr() as usize)?;
        Ok(Self {
            name: name.to_string(),
            mmap,
            owner,
            _marker: PhantomData,
        })
    }

    /// Copy the record currently resident in the segment.
    #[inline]
    pub fn read(&self) -> T {
        // SAFETY: the mapping is exactly size_of::<T>() bytes, aligned for T
        // (checked in wrap) and every bit pattern is a valid T.
        unsafe { std::ptr::read_volatile(self.mmap.as_ptr() as *const T) }
    }

    /// Store a whole record into the segment.
    #[inline]
    pub fn write(&mut self, value: T) {
        // SAFETY: see read().
        unsafe { std::ptr::write_volatile(self.mmap.as_mut_ptr() as *mut T, value) }
    }

    /// Segment name as given at open/create.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mapped size in bytes.
    pub const fn size() -> usize {
        core::mem::size_of::<T>()
    }
}

impl<T: SegmentLayout> Drop for SharedSegment<T> {
    fn drop(&mut self) {
        if self.owner {
            if let Err(e) = unlink_segment(&self.name) {
                warn!("Failed to unlink segment {}: {}", self.name, e);
            }
        }
    }
}

/// Validate that a mapping address can hold a `T`.
pub fn validate_alignment<T>(address: usize) -> ShmResult<()> {
    let alignment = core::mem::align_of::<T>();
    if address % alignment != 0 {
        return Err(ShmError::AlignmentError { address, alignment });
    }
    Ok(())
}
