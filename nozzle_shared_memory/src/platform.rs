//! Platform specific segment mapping.

pub mod linux;

pub use linux::{create_segment_mmap, open_segment_mmap, shm_object_name, unlink_segment};
