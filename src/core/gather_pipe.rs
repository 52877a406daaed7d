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

//! Write-gather pipe
//!
//! Stores to `0x0C008000` are collected byte by byte and handed out in
//! 32-byte bursts. The system copies each burst to the command FIFO in RAM at
//! the processor interface's write pointer.

use crate::core::error::Result;
use crate::core::memory::IODevice;

/// Physical address of the gather pipe window
pub const GATHER_PIPE_BASE: u32 = 0x0C00_8000;

/// Bytes per burst
pub const BURST_SIZE: usize = 32;

const BUFFER_SIZE: usize = BURST_SIZE * 16;

/// Write-gather pipe
#[derive(Debug, Default)]
pub struct GatherPipe {
    buffer: Vec<u8>,
}

impl GatherPipe {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(BUFFER_SIZE),
        }
    }

    /// Drop everything gathered so far
    pub fn reset(&mut self) {
        if !self.buffer.is_empty() {
            log::debug!("GatherPipe: reset with {} bytes pending", self.buffer.len());
        }
        self.buffer.clear();
    }

    /// Number of bytes waiting to form a burst
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Remove and return every complete burst
    pub fn take_bursts(&mut self) -> Vec<[u8; BURST_SIZE]> {
        let used = self.buffer.len() / BURST_SIZE * BURST_SIZE;
        let bursts = self.buffer[..used]
            .chunks_exact(BURST_SIZE)
            .filter_map(|chunk| <[u8; BURST_SIZE]>::try_from(chunk).ok())
            .collect();
        self.buffer.drain(..used);
        bursts
    }

    fn push(&mut self, bytes: &[u8]) {
        if self.buffer.len() + bytes.len() > BUFFER_SIZE {
            log::warn!(
                "GatherPipe: overflow, dropping {} bytes",
                self.buffer.len() + bytes.len() - BUFFER_SIZE
            );
            self.buffer.truncate(BUFFER_SIZE - bytes.len());
        }
        self.buffer.extend_from_slice(bytes);
    }
}

impl IODevice for GatherPipe {
    fn address_range(&self) -> (u32, u32) {
        (GATHER_PIPE_BASE, GATHER_PIPE_BASE + 0xFFF)
    }

    fn read_register(&self, offset: u32) -> Result<u32> {
        log::warn!("GatherPipe: read at offset 0x{:03X}", offset);
        Ok(0)
    }

    fn write_register(&mut self, _offset: u32, value: u32) -> Result<()> {
        self.push(&value.to_be_bytes());
        Ok(())
    }

    fn read_register16(&self, offset: u32) -> Result<u16> {
        log::warn!("GatherPipe: read16 at offset 0x{:03X}", offset);
        Ok(0)
    }

    fn write_register16(&mut self, _offset: u32, value: u16) -> Result<()> {
        self.push(&value.to_be_bytes());
        Ok(())
    }

    fn read_register8(&self, offset: u32) -> Result<u8> {
        log::warn!("GatherPipe: read8 at offset 0x{:03X}", offset);
        Ok(0)
    }

    fn write_register8(&mut self, _offset: u32, value: u8) -> Result<()> {
        self.push(&[value]);
        Ok(())
    }

    fn name(&self) -> &str {
        "GatherPipe"
    }
}
