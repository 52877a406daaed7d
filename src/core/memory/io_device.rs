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

//! Memory-mapped I/O device trait
//!
//! Hardware blocks behind the MMIO window (`0x0C000000` physical,
//! `0xCC000000` uncached logical) implement [`IODevice`]. [`Memory`](super::Memory)
//! strips the segment bits, finds the device whose range contains the
//! physical address and passes it the offset from the device base.
//!
//! The guest is big-endian, so sub-word accesses address the *high* end of a
//! register first: a 16-bit read at offset `+0` returns bits 31..16 and a
//! read at `+2` returns bits 15..0.
//!
//! # Example
//!
//! ```no_run
//! use gcrx::core::memory::IODevice;
//! use gcrx::core::error::Result;
//!
//! struct Scratch {
//!     registers: [u32; 4],
//! }
//!
//! impl IODevice for Scratch {
//!     fn address_range(&self) -> (u32, u32) {
//!         (0x0C00F000, 0x0C00F00F)
//!     }
//!
//!     fn read_register(&self, offset: u32) -> Result<u32> {
//!         Ok(self.registers[(offset / 4) as usize])
//!     }
//!
//!     fn write_register(&mut self, offset: u32, value: u32) -> Result<()> {
//!         self.registers[(offset / 4) as usize] = value;
//!         Ok(())
//!     }
//! }
//! ```

use crate::core::error::Result;

/// Trait for memory-mapped I/O devices
///
/// Devices must implement the 32-bit accessors. The narrower accessors have
/// big-endian defaults built on top of them; a device whose registers reject
/// narrow writes overrides them.
pub trait IODevice {
    /// Physical address range this device responds to, inclusive
    fn address_range(&self) -> (u32, u32);

    /// Whether `addr` falls inside [`address_range`](Self::address_range)
    fn contains(&self, addr: u32) -> bool {
        let (start, end) = self.address_range();
        addr >= start && addr <= end
    }

    /// Read a 32-bit register at `offset` from the device base
    fn read_register(&self, offset: u32) -> Result<u32>;

    /// Write a 32-bit register at `offset` from the device base
    fn write_register(&mut self, offset: u32, value: u32) -> Result<()>;

    /// Read one big-endian half of a 32-bit register
    fn read_register16(&self, offset: u32) -> Result<u16> {
        let value = self.read_register(offset & !0x03)?;
        let shift = 16 - (offset & 0x02) * 8;
        Ok((value >> shift) as u16)
    }

    /// Replace one big-endian half of a 32-bit register
    fn write_register16(&mut self, offset: u32, value: u16) -> Result<()> {
        let aligned = offset & !0x03;
        let shift = 16 - (offset & 0x02) * 8;
        let mask = !(0xFFFFu32 << shift);
        let current = self.read_register(aligned)?;
        self.write_register(aligned, (current & mask) | ((value as u32) << shift))
    }

    /// Read one byte of a 32-bit register, most significant byte at `+0`
    fn read_register8(&self, offset: u32) -> Result<u8> {
        let value = self.read_register(offset & !0x03)?;
        let shift = (3 - (offset & 0x03)) * 8;
        Ok((value >> shift) as u8)
    }

    /// Replace one byte of a 32-bit register, most significant byte at `+0`
    fn write_register8(&mut self, offset: u32, value: u8) -> Result<()> {
        let aligned = offset & !0x03;
        let shift = (3 - (offset & 0x03)) * 8;
        let mask = !(0xFFu32 << shift);
        let current = self.read_register(aligned)?;
        self.write_register(aligned, (current & mask) | ((value as u32) << shift))
    }

    /// Human-readable name for logging
    fn name(&self) -> &str {
        "Unknown Device"
    }
}
