//! Linux-specific shared memory operations
//!
//! Segments are POSIX shared memory objects (`shm_open`), visible under
//! `/dev/shm/<name>`. They are mapped read/write with `MAP_SHARED` so
//! stores from either side are visible to the other immediately.

use crate::error::{ShmError, ShmResult};
use memmap2::{MmapMut, MmapOptions};
use nozzle::shm::segment_basename;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::mman::{shm_open, shm_unlink};
use nix::sys::stat::Mode;
use std::fs::File;
use tracing::debug;

/// POSIX object name for a segment: exactly one leading slash.
pub fn shm_object_name(name: &str) -> ShmResult<String> {
    let bare = segment_basename(name).ok_or_else(|| ShmError::InvalidName {
        name: name.to_string(),
    })?;
    Ok(format!("/{bare}"))
}

/// Attach to an existing segment of exactly `size` bytes.
pub fn open_segment_mmap(name: &str, size: usize) -> ShmResult<MmapMut> {
    let object = shm_object_name(name)?;

    let fd = shm_open(object.as_str(), OFlag::O_RDWR, Mode::empty())
        .map_err(|e| map_errno(e, name))?;
    let file = File::from(fd);

    let actual = file.metadata()?.len() as usize;
    if actual != size {
        return Err(ShmError::SizeMismatch {
            name: name.to_string(),
            expected: size,
            actual,
        });
    }

    // SAFETY: the object holds exactly `size` bytes (checked above) and the
    // mapping is only accessed through volatile reads and writes.
    let mmap = unsafe { MmapOptions::new().len(size).map_mut(&file)? };
    debug!("Attached segment {} ({} bytes)", object, size);
    Ok(mmap)
}

/// Create (or truncate) a segment of exactly `size` bytes, zero-filled.
pub fn create_segment_mmap(name: &str, size: usize) -> ShmResult<MmapMut> {
    let object = shm_object_name(name)?;

    let fd = shm_open(
        object.as_str(),
        OFlag::O_CREAT | OFlag::O_RDWR | OFlag::O_TRUNC,
        Mode::S_IRUSR | Mode::S_IWUSR,
    )
    .map_err(|e| map_errno(e, name))?;
    let file = File::from(fd);
    file.set_len(size as u64)?;

    // SAFETY: `set_len` sized the object to `size` bytes; concurrent
    // writers are tolerated since all access is volatile.
    let mmap = unsafe { MmapOptions::new().len(size).map_mut(&file)? };
    debug!("Created segment {} ({} bytes)", object, size);
    Ok(mmap)
}

/// Remove a segment name. Mappings already held stay valid.
pub fn unlink_segment(name: &str) -> ShmResult<()> {
    let object = shm_object_name(name)?;
    shm_unlink(object.as_str()).map_err(|e| map_errno(e, name))
}

fn map_errno(errno: Errno, name: &str) -> ShmError {
    match errno {
        Errno::ENOENT => ShmError::NotFound {
            name: name.to_string(),
        },
        Errno::EACCES | Errno::EPERM => ShmError::PermissionDenied {
            name: name.to_string(),
        },
        Errno::EINVAL | Errno::ENAMETOOLONG => ShmError::InvalidName {
            name: name.to_string(),
        },
        other => ShmError::Nix { source: other },
    }
}
