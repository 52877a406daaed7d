// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shared memory arena
//!
//! All emulated RAM lives in one anonymous shared-memory segment. Every
//! address the guest can see is a *view* of that segment, so mirrors of the
//! same physical memory are just several views of the same offset and a write
//! through one shows up in all of them without copying.
//!
//! ```text
//!  backing segment    [ MEM1 | L1 | EXRAM ]
//!                        │  │
//!  reserved region    ───┼──┼──────────────────────────────
//!   0x00000000 ◄─────────┘  │
//!   0x80000000 ◄────────────┘   (same bytes, second view)
//! ```
//!
//! The fastmem region is reserved up front with `PROT_NONE` so nothing else
//! in the process can land inside it. Views are then mapped over parts of the
//! reservation with `MAP_FIXED`, and unmapping puts a fresh `PROT_NONE`
//! reservation back over the hole.
//!
//! OS failures are logged and reported as `None`; the caller decides whether
//! the session can continue.

use super::region_map::RegionMap;
use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::ptr::{self, NonNull};

#[cfg(not(unix))]
compile_error!("the shared memory arena requires a unix host");

/// Size of the reserved fastmem region
///
/// 64-bit hosts reserve the whole 32-bit guest address space. 32-bit hosts
/// cannot, so they only reserve enough for the RAM mirrors.
#[cfg(target_pointer_width = "64")]
pub const FASTMEM_REGION_SIZE: usize = 0x1_0000_0000;
#[cfg(not(target_pointer_width = "64"))]
pub const FASTMEM_REGION_SIZE: usize = 0x3100_0000;

#[cfg(target_os = "macos")]
const SHM_MODE: libc::c_uint = 0o600;
#[cfg(all(unix, not(any(target_os = "linux", target_os = "macos"))))]
const SHM_MODE: libc::mode_t = 0o600;

struct Reservation {
    base: NonNull<u8>,
    map: RegionMap,
}

/// Anonymous shared-memory segment plus an optional reserved address range
pub struct MemArena {
    shm: Option<OwnedFd>,
    segment_size: usize,
    reserved: Option<Reservation>,
}

impl MemArena {
    pub fn new() -> Self {
        Self {
            shm: None,
            segment_size: 0,
            reserved: None,
        }
    }

    /// Allocate the backing segment
    ///
    /// Any previous segment is released first. On failure the error is
    /// logged and the arena is left without a segment; check
    /// [`has_segment`](Self::has_segment) afterwards.
    pub fn grab_segment(&mut self, size: usize, name: &str) {
        self.release_segment();

        let fd = match open_shared_memory(name) {
            Ok(fd) => fd,
            Err(e) => {
                log::error!("MemArena: failed to create shared memory '{}': {}", name, e);
                return;
            }
        };

        // SAFETY: fd is a freshly created, owned shared memory descriptor.
        if unsafe { libc::ftruncate(fd.as_raw_fd(), size as libc::off_t) } != 0 {
            log::error!(
                "MemArena: failed to size segment to 0x{:X} bytes: {}",
                size,
                io::Error::last_os_error()
            );
            return;
        }

        log::debug!("MemArena: grabbed 0x{:X} byte segment '{}'", size, name);
        self.shm = Some(fd);
        self.segment_size = size;
    }

    /// Close the backing segment
    ///
    /// Views that are still mapped stay valid until they are unmapped.
    pub fn release_segment(&mut self) {
        if self.shm.take().is_some() {
            log::debug!("MemArena: released segment");
        }
        self.segment_size = 0;
    }

    pub fn has_segment(&self) -> bool {
        self.shm.is_some()
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    /// Map `[offset, offset + size)` of the segment at an OS-chosen address
    pub fn create_view(&self, offset: usize, size: usize) -> Option<NonNull<u8>> {
        self.map_view(offset, size, None)
    }

    /// Unmap a view returned by [`create_view`](Self::create_view)
    pub fn release_view(&self, view: NonNull<u8>, size: usize) {
        // SAFETY: the caller hands back a view of `size` bytes that it
        // obtained from this arena and no longer references.
        if unsafe { libc::munmap(view.as_ptr().cast(), size) } != 0 {
            log::error!(
                "MemArena: failed to unmap view at {:p}: {}",
                view,
                io::Error::last_os_error()
            );
        }
    }

    /// Reserve `size` bytes of address space without committing memory
    ///
    /// A previous reservation is released first.
    pub fn reserve_region(&mut self, size: usize) -> Option<NonNull<u8>> {
        self.release_region();

        // SAFETY: anonymous PROT_NONE mapping at an OS-chosen address.
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                size,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_NORESERVE,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            log::error!(
                "MemArena: failed to reserve 0x{:X} bytes: {}",
                size,
                io::Error::last_os_error()
            );
            return None;
        }

        let base = NonNull::new(ptr.cast::<u8>())?;
        log::info!("MemArena: reserved 0x{:X} bytes at {:p}", size, base);
        self.reserved = Some(Reservation {
            base,
            map: RegionMap::new(size),
        });
        Some(base)
    }

    /// Give the whole reservation, and any views inside it, back to the OS
    pub fn release_region(&mut self) {
        let Some(reservation) = self.reserved.take() else {
            return;
        };
        // SAFETY: the reservation was created by reserve_region with this size.
        if unsafe { libc::munmap(reservation.base.as_ptr().cast(), reservation.map.size()) } != 0 {
            log::error!(
                "MemArena: failed to release region at {:p}: {}",
                reservation.base,
                io::Error::last_os_error()
            );
        }
    }

    /// Base of the current reservation
    pub fn reserved_base(&self) -> Option<NonNull<u8>> {
        self.reserved.as_ref().map(|r| r.base)
    }

    /// Sub-region bookkeeping of the current reservation
    pub fn region_map(&self) -> Option<&RegionMap> {
        self.reserved.as_ref().map(|r| &r.map)
    }

    /// Map `[offset, offset + size)` of the segment at `base`
    ///
    /// `base` must lie inside the reservation, together with the whole view.
    /// Whatever was mapped there before is replaced.
    pub fn map_in_region(
        &mut self,
        offset: usize,
        size: usize,
        base: NonNull<u8>,
    ) -> Option<NonNull<u8>> {
        let region_offset = self.region_offset(base, size)?;
        let view = self.map_view(offset, size, Some(base))?;
        if let Some(reservation) = self.reserved.as_mut() {
            reservation.map.map(region_offset, size);
        }
        Some(view)
    }

    /// Unmap a view created with [`map_in_region`](Self::map_in_region)
    ///
    /// The range is reserved again so the hole cannot be reused by the host.
    pub fn unmap_from_region(&mut self, view: NonNull<u8>, size: usize) {
        let Some(region_offset) = self.region_offset(view, size) else {
            return;
        };

        // SAFETY: the range lies inside our own reservation; MAP_FIXED only
        // replaces pages we own.
        let ptr = unsafe {
            libc::mmap(
                view.as_ptr().cast(),
                size,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_NORESERVE | libc::MAP_FIXED,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            log::error!(
                "MemArena: failed to unmap view at {:p}: {}",
                view,
                io::Error::last_os_error()
            );
            return;
        }

        if let Some(reservation) = self.reserved.as_mut() {
            reservation.map.unmap(region_offset, size);
        }
    }

    fn region_offset(&self, view: NonNull<u8>, size: usize) -> Option<usize> {
        let Some(reservation) = self.reserved.as_ref() else {
            log::error!("MemArena: no reserved region for view at {:p}", view);
            return None;
        };
        let offset = (view.as_ptr() as usize).checked_sub(reservation.base.as_ptr() as usize);
        match offset {
            Some(offset) if reservation.map.in_bounds(offset, size) => Some(offset),
            _ => {
                log::error!(
                    "MemArena: view {:p} (+0x{:X}) is outside the reserved region",
                    view,
                    size
                );
                None
            }
        }
    }

    fn map_view(
        &self,
        offset: usize,
        size: usize,
        base: Option<NonNull<u8>>,
    ) -> Option<NonNull<u8>> {
        let Some(fd) = self.shm.as_ref() else {
            log::error!("MemArena: cannot map a view without a segment");
            return None;
        };
        if size == 0
            || offset
                .checked_add(size)
                .is_none_or(|end| end > self.segment_size)
        {
            log::error!(
                "MemArena: view 0x{:X}+0x{:X} exceeds segment of 0x{:X} bytes",
                offset,
                size,
                self.segment_size
            );
            return None;
        }

        let mut flags = libc::MAP_SHARED;
        if base.is_some() {
            flags |= libc::MAP_FIXED;
        }
        let addr = base.map_or(ptr::null_mut(), |b| b.as_ptr().cast());

        // SAFETY: fd is our segment and the range was checked against its size.
        // With MAP_FIXED the target lies in our own reservation.
        let ptr = unsafe {
            libc::mmap(
                addr,
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                flags,
                fd.as_raw_fd(),
                offset as libc::off_t,
            )
        };
        if ptr == libc::MAP_FAILED {
            log::error!(
                "MemArena: failed to map view 0x{:X}+0x{:X}: {}",
                offset,
                size,
                io::Error::last_os_error()
            );
            return None;
        }
        NonNull::new(ptr.cast())
    }
}

impl Default for MemArena {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemArena {
    fn drop(&mut self) {
        self.release_region();
    }
}

#[cfg(target_os = "linux")]
fn open_shared_memory(name: &str) -> io::Result<OwnedFd> {
    let c_name =
        CString::new(name).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: c_name is a valid NUL-terminated string.
    let fd = unsafe { libc::memfd_create(c_name.as_ptr(), libc::MFD_CLOEXEC) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: fd was just returned by memfd_create and is owned by nobody else.
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

#[cfg(all(unix, not(target_os = "linux")))]
fn open_shared_memory(name: &str) -> io::Result<OwnedFd> {
    let c_name = CString::new(format!("/{}.{}", name, std::process::id()))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: c_name is a valid NUL-terminated string.
    let fd = unsafe {
        libc::shm_open(
            c_name.as_ptr(),
            libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
            SHM_MODE,
        )
    };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // The name is only needed to obtain the descriptor.
    // SAFETY: same valid string as above.
    unsafe { libc::shm_unlink(c_name.as_ptr()) };
    // SAFETY: fd was just returned by shm_open and is owned by nobody else.
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}
