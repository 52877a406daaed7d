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

//! Emulated address space
//!
//! [`Memory`] lays the console memory map out on top of a [`MemArena`]. Every
//! RAM block is one range of the shared backing segment, and each logical
//! mirror of it is a separate view of that range.
//!
//! # Memory Map
//!
//! | Logical address        | Backing            | Size    | Notes        |
//! |------------------------|--------------------|---------|--------------|
//! | 0x00000000-0x017FFFFF  | MEM1               | 24 MiB  | physical     |
//! | 0x80000000-0x817FFFFF  | MEM1               |         | cached       |
//! | 0xC0000000-0xC17FFFFF  | MEM1               |         | uncached     |
//! | 0xE0000000-0xE003FFFF  | L1 locked cache    | 256 KiB | data only    |
//! | 0x10000000-0x13FFFFFF  | EXRAM              | 64 MiB  | Wii only     |
//! | 0x90000000-0x93FFFFFF  | EXRAM              |         | Wii only     |
//! | 0xD0000000-0xD3FFFFFF  | EXRAM              |         | Wii only     |
//! | 0x0C000000 / 0xCC000000| MMIO               |         | [`IODevice`] |
//!
//! With fastmem the views are placed inside a reserved region so that a host
//! pointer for guest address `a` is simply `base + a`. Without it each view is
//! mapped wherever the OS likes and accesses go through the view table, which
//! is also what the interpreter uses in both modes.
//!
//! All multi-byte accesses are big-endian and may be unaligned.

pub mod arena;
mod io_device;
pub mod region_map;

pub use arena::{MemArena, FASTMEM_REGION_SIZE};
pub use io_device::IODevice;
pub use region_map::{RegionMap, SubRegion};

use crate::core::error::{EmulatorError, Result};
use crate::core::save_state::{MemoryState, StateSave};
use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::Rc;

/// MEM1 size (24 MiB)
pub const MEM1_SIZE: u32 = 0x0180_0000;

/// Locked L1 data cache size (256 KiB)
pub const L1_CACHE_SIZE: u32 = 0x0004_0000;

/// Wii EXRAM size (64 MiB)
pub const EXRAM_SIZE: u32 = 0x0400_0000;

/// Physical base of the MMIO window
pub const MMIO_BASE: u32 = 0x0C00_0000;

/// A block of RAM inside the backing segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamBlock {
    Mem1,
    L1Cache,
    ExRam,
}

impl RamBlock {
    fn segment_offset(self) -> usize {
        match self {
            RamBlock::Mem1 => 0,
            RamBlock::L1Cache => 0x0200_0000,
            RamBlock::ExRam => 0x0400_0000,
        }
    }

    fn size(self) -> u32 {
        match self {
            RamBlock::Mem1 => MEM1_SIZE,
            RamBlock::L1Cache => L1_CACHE_SIZE,
            RamBlock::ExRam => EXRAM_SIZE,
        }
    }

    fn holds_instructions(self) -> bool {
        !matches!(self, RamBlock::L1Cache)
    }
}

/// Logical placement of every RAM mirror
const LAYOUT: [(u32, RamBlock); 7] = [
    (0x0000_0000, RamBlock::Mem1),
    (0x8000_0000, RamBlock::Mem1),
    (0xC000_0000, RamBlock::Mem1),
    (0xE000_0000, RamBlock::L1Cache),
    (0x1000_0000, RamBlock::ExRam),
    (0x9000_0000, RamBlock::ExRam),
    (0xD000_0000, RamBlock::ExRam),
];

#[derive(Debug)]
struct View {
    logical_base: u32,
    block: RamBlock,
    ptr: NonNull<u8>,
    in_region: bool,
}

impl View {
    fn size(&self) -> u32 {
        self.block.size()
    }

    /// Host pointer for `len` bytes at `addr`, if they all fall in this view
    fn host_ptr(&self, addr: u32, len: u32) -> Option<*mut u8> {
        let offset = addr.checked_sub(self.logical_base)?;
        if offset.checked_add(len)? > self.size() {
            return None;
        }
        // SAFETY: offset + len is within the mapped view.
        Some(unsafe { self.ptr.as_ptr().add(offset as usize) })
    }
}

/// The console address space
pub struct Memory {
    arena: MemArena,
    wii: bool,
    fastmem_base: Option<NonNull<u8>>,
    views: Vec<View>,
    devices: Vec<Rc<RefCell<dyn IODevice>>>,
}

impl Memory {
    /// Build the memory map
    ///
    /// When `fastmem` is requested but the region cannot be reserved, the
    /// map falls back to free-standing views.
    ///
    /// # Errors
    ///
    /// Returns [`EmulatorError::Arena`] if the backing segment or a view
    /// cannot be created.
    pub fn new(wii: bool, fastmem: bool) -> Result<Self> {
        let segment_size = if wii {
            RamBlock::ExRam.segment_offset() + EXRAM_SIZE as usize
        } else {
            RamBlock::L1Cache.segment_offset() + L1_CACHE_SIZE as usize
        };

        let mut arena = MemArena::new();
        arena.grab_segment(segment_size, if wii { "gcrx-wii" } else { "gcrx-gc" });
        if !arena.has_segment() {
            return Err(EmulatorError::Arena(format!(
                "could not allocate 0x{:X} byte backing segment",
                segment_size
            )));
        }

        let fastmem_base = if fastmem && cfg!(target_pointer_width = "64") {
            arena.reserve_region(FASTMEM_REGION_SIZE)
        } else {
            None
        };
        if fastmem && fastmem_base.is_none() {
            log::warn!("Memory: fastmem unavailable, using standalone views");
        }

        let mut memory = Self {
            arena,
            wii,
            fastmem_base,
            views: Vec::with_capacity(LAYOUT.len()),
            devices: Vec::new(),
        };

        for (logical_base, block) in LAYOUT {
            if block == RamBlock::ExRam && !wii {
                continue;
            }
            memory.map_view(logical_base, block)?;
        }

        log::info!(
            "Memory: {} map ready ({} views, fastmem={})",
            if wii { "Wii" } else { "GameCube" },
            memory.views.len(),
            memory.fastmem_base.is_some()
        );
        Ok(memory)
    }

    fn map_view(&mut self, logical_base: u32, block: RamBlock) -> Result<()> {
        let offset = block.segment_offset();
        let size = block.size() as usize;

        let (ptr, in_region) = match self.fastmem_base {
            Some(base) => {
                // SAFETY: logical addresses are below FASTMEM_REGION_SIZE on
                // hosts where a fastmem region is reserved.
                let target = unsafe { base.as_ptr().add(logical_base as usize) };
                let target = NonNull::new(target).ok_or_else(|| {
                    EmulatorError::Arena(format!("null view target for 0x{:08X}", logical_base))
                })?;
                (self.arena.map_in_region(offset, size, target), true)
            }
            None => (self.arena.create_view(offset, size), false),
        };

        let ptr = ptr.ok_or_else(|| {
            EmulatorError::Arena(format!(
                "could not map {:?} view at 0x{:08X}",
                block, logical_base
            ))
        })?;

        log::debug!(
            "Memory: {:?} mapped at 0x{:08X} (0x{:X} bytes)",
            block,
            logical_base,
            size
        );
        self.views.push(View {
            logical_base,
            block,
            ptr,
            in_region,
        });
        Ok(())
    }

    /// Whether the Wii-only blocks are present
    pub fn is_wii(&self) -> bool {
        self.wii
    }

    /// Base of the fastmem region, if one was reserved
    pub fn fastmem_base(&self) -> Option<NonNull<u8>> {
        self.fastmem_base
    }

    /// The arena backing this address space
    pub fn arena(&self) -> &MemArena {
        &self.arena
    }

    /// Attach a memory-mapped device
    pub fn register_device(&mut self, device: Rc<RefCell<dyn IODevice>>) {
        {
            let d = device.borrow();
            let (start, end) = d.address_range();
            log::debug!(
                "Memory: {} registered at 0x{:08X}-0x{:08X}",
                d.name(),
                start,
                end
            );
        }
        self.devices.push(device);
    }

    /// Zero every RAM block
    pub fn clear(&mut self) {
        for block in self.blocks() {
            if let Some(view) = self.views.iter().find(|v| v.block == block) {
                // SAFETY: the view covers the whole block.
                unsafe { std::ptr::write_bytes(view.ptr.as_ptr(), 0, block.size() as usize) };
            }
        }
    }

    fn blocks(&self) -> Vec<RamBlock> {
        let mut blocks = vec![RamBlock::Mem1, RamBlock::L1Cache];
        if self.wii {
            blocks.push(RamBlock::ExRam);
        }
        blocks
    }

    fn find_view(&self, addr: u32, len: u32) -> Option<(&View, *mut u8)> {
        self.views
            .iter()
            .find_map(|v| v.host_ptr(addr, len).map(|p| (v, p)))
    }

    /// Whether `addr` is backed by RAM
    pub fn is_ram_address(&self, addr: u32) -> bool {
        self.find_view(addr, 1).is_some()
    }

    /// Whether `addr` is RAM that instructions can be fetched from
    pub fn is_instruction_ram_address(&self, addr: u32) -> bool {
        self.find_view(addr, 1)
            .is_some_and(|(view, _)| view.block.holds_instructions())
    }

    /// Fetch an instruction word
    pub fn read_instruction(&self, addr: u32) -> Result<u32> {
        if addr & 0x3 != 0 {
            return Err(EmulatorError::UnalignedAccess {
                address: addr,
                size: 4,
            });
        }
        if !self.is_instruction_ram_address(addr) {
            return Err(EmulatorError::InvalidMemoryAccess { address: addr });
        }
        self.read_u32(addr)
    }

    pub fn read_u8(&self, addr: u32) -> Result<u8> {
        if let Some((_, ptr)) = self.find_view(addr, 1) {
            // SAFETY: ptr points at one mapped byte.
            return Ok(unsafe { ptr.read() });
        }
        let (device, offset) = self.device_for(addr)?;
        device.borrow().read_register8(offset)
    }

    pub fn read_u16(&self, addr: u32) -> Result<u16> {
        if let Some((_, ptr)) = self.find_view(addr, 2) {
            // SAFETY: ptr points at two mapped bytes.
            return Ok(u16::from_be(unsafe { ptr.cast::<u16>().read_unaligned() }));
        }
        Self::check_mmio_alignment(addr, 2)?;
        let (device, offset) = self.device_for(addr)?;
        device.borrow().read_register16(offset)
    }

    pub fn read_u32(&self, addr: u32) -> Result<u32> {
        if let Some((_, ptr)) = self.find_view(addr, 4) {
            // SAFETY: ptr points at four mapped bytes.
            return Ok(u32::from_be(unsafe { ptr.cast::<u32>().read_unaligned() }));
        }
        Self::check_mmio_alignment(addr, 4)?;
        let (device, offset) = self.device_for(addr)?;
        device.borrow().read_register(offset)
    }

    pub fn write_u8(&mut self, addr: u32, value: u8) -> Result<()> {
        if let Some((_, ptr)) = self.find_view(addr, 1) {
            // SAFETY: ptr points at one mapped byte.
            unsafe { ptr.write(value) };
            return Ok(());
        }
        let (device, offset) = self.device_for(addr)?;
        device.borrow_mut().write_register8(offset, value)
    }

    pub fn write_u16(&mut self, addr: u32, value: u16) -> Result<()> {
        if let Some((_, ptr)) = self.find_view(addr, 2) {
            // SAFETY: ptr points at two mapped bytes.
            unsafe { ptr.cast::<u16>().write_unaligned(value.to_be()) };
            return Ok(());
        }
        Self::check_mmio_alignment(addr, 2)?;
        let (device, offset) = self.device_for(addr)?;
        device.borrow_mut().write_register16(offset, value)
    }

    pub fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        if let Some((_, ptr)) = self.find_view(addr, 4) {
            // SAFETY: ptr points at four mapped bytes.
            unsafe { ptr.cast::<u32>().write_unaligned(value.to_be()) };
            return Ok(());
        }
        Self::check_mmio_alignment(addr, 4)?;
        let (device, offset) = self.device_for(addr)?;
        device.borrow_mut().write_register(offset, value)
    }

    /// Copy `data` into RAM starting at `addr`
    ///
    /// The whole range must fall inside one RAM block.
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        let len = u32::try_from(data.len()).map_err(|_| EmulatorError::ProgramTooLarge {
            address: addr,
            size: data.len(),
        })?;
        if len == 0 {
            return Ok(());
        }
        let (_, ptr) = self
            .find_view(addr, len)
            .ok_or(EmulatorError::InvalidMemoryAccess { address: addr })?;
        // SAFETY: the view holds `len` bytes at ptr and cannot overlap `data`,
        // which lives on the Rust heap or stack.
        unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), ptr, data.len()) };
        Ok(())
    }

    /// Copy `len` bytes of RAM starting at `addr`
    pub fn read_bytes(&self, addr: u32, len: usize) -> Result<Vec<u8>> {
        let len32 = u32::try_from(len)
            .map_err(|_| EmulatorError::InvalidMemoryAccess { address: addr })?;
        if len == 0 {
            return Ok(Vec::new());
        }
        let (_, ptr) = self
            .find_view(addr, len32)
            .ok_or(EmulatorError::InvalidMemoryAccess { address: addr })?;
        // SAFETY: the view holds `len` bytes at ptr.
        Ok(unsafe { std::slice::from_raw_parts(ptr, len) }.to_vec())
    }

    fn block_bytes(&self, block: RamBlock) -> Vec<u8> {
        self.views
            .iter()
            .find(|v| v.block == block)
            // SAFETY: the view covers the whole block.
            .map(|v| unsafe { std::slice::from_raw_parts(v.ptr.as_ptr(), block.size() as usize) }.to_vec())
            .unwrap_or_default()
    }

    fn restore_block(&mut self, block: RamBlock, data: &[u8]) {
        let Some(view) = self.views.iter().find(|v| v.block == block) else {
            return;
        };
        let size = block.size() as usize;
        if data.len() != size {
            log::warn!(
                "Memory: {:?} snapshot is 0x{:X} bytes, expected 0x{:X}",
                block,
                data.len(),
                size
            );
        }
        let len = data.len().min(size);
        // SAFETY: the view covers `size` bytes and len <= size.
        unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), view.ptr.as_ptr(), len) };
    }

    fn check_mmio_alignment(addr: u32, size: u8) -> Result<()> {
        if addr & (size as u32 - 1) != 0 {
            return Err(EmulatorError::UnalignedAccess {
                address: addr,
                size,
            });
        }
        Ok(())
    }

    fn device_for(&self, addr: u32) -> Result<(&Rc<RefCell<dyn IODevice>>, u32)> {
        let physical = match addr >> 24 {
            0x0C | 0xCC => addr & 0x0FFF_FFFF,
            _ => return Err(EmulatorError::InvalidMemoryAccess { address: addr }),
        };
        self.devices
            .iter()
            .find(|d| d.borrow().contains(physical))
            .map(|d| {
                let (start, _) = d.borrow().address_range();
                (d, physical - start)
            })
            .ok_or_else(|| {
                log::warn!("Memory: unmapped MMIO access at 0x{:08X}", addr);
                EmulatorError::InvalidMemoryAccess { address: addr }
            })
    }
}

impl StateSave for Memory {
    type State = MemoryState;

    fn to_state(&self) -> MemoryState {
        MemoryState {
            mem1: self.block_bytes(RamBlock::Mem1),
            l1_cache: self.block_bytes(RamBlock::L1Cache),
            exram: if self.wii {
                self.block_bytes(RamBlock::ExRam)
            } else {
                Vec::new()
            },
        }
    }

    fn restore_from_state(&mut self, state: &MemoryState) {
        self.restore_block(RamBlock::Mem1, &state.mem1);
        self.restore_block(RamBlock::L1Cache, &state.l1_cache);
        if self.wii {
            self.restore_block(RamBlock::ExRam, &state.exram);
        }
    }
}

impl Drop for Memory {
    fn drop(&mut self) {
        for view in self.views.drain(..) {
            if view.in_region {
                self.arena.unmap_from_region(view.ptr, view.block.size() as usize);
            } else {
                self.arena.release_view(view.ptr, view.block.size() as usize);
            }
        }
    }
}

#[cfg(test)]
mod tests;
