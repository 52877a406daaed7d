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

//! Save state serialization
//!
//! This module provides functionality to save and restore the complete core
//! state so a session can be resumed at the exact instruction it was saved at.
//!
//! # Save State Format
//!
//! Save states are serialized using bincode for efficient binary encoding.
//! The state includes:
//! - Metadata (timestamp, program name, frame count)
//! - CPU state (GPRs, CR, XER, PC/NPC, MSR, SRR0/SRR1, pending exceptions)
//! - Processor interface state (cause, mask, FIFO pointers, reset code)
//! - Memory state (MEM1, locked L1 cache, EXRAM on Wii)
//!
//! Every component struct is a fixed-order bincode record, so the field order
//! below is the on-disk order.
//!
//! # Version Compatibility
//!
//! Save states include a version number to ensure compatibility.
//! Loading a save state with a different version will fail with an error.
//!
//! # Example
//!
//! ```no_run
//! use gcrx::core::save_state::SaveState;
//! use gcrx::core::{EmulatorConfig, System};
//!
//! let mut system = System::new(EmulatorConfig::default()).unwrap();
//! // ... run emulation ...
//!
//! let state = system.save_state();
//! state.save_to_file("session.state").unwrap();
//!
//! let loaded = SaveState::load_from_file("session.state").unwrap();
//! system.load_state(&loaded).unwrap();
//! ```

use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::core::error::{EmulatorError, Result};

/// Save state version for compatibility checking
///
/// This version number should be incremented whenever the save state format changes
/// in a way that breaks backward compatibility.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Complete core save state
#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct SaveState {
    /// Version number for compatibility checking
    pub version: u32,

    /// Save state metadata
    pub metadata: SaveStateMetadata,

    /// CPU state
    pub cpu: CpuState,

    /// Processor interface state
    pub interrupts: InterruptState,

    /// Memory state (MEM1, L1 cache, EXRAM)
    pub memory: MemoryState,
}

/// Save state metadata
#[derive(Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct SaveStateMetadata {
    /// Timestamp when the save state was created
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Name of the loaded program image
    pub program_name: String,

    /// Frame count at save time
    pub frame_count: u64,

    /// Global tick counter at save time
    pub ticks: u64,

    /// Console kind the state was taken on
    pub wii: bool,
}

/// CPU state (Gekko/Broadway integer core)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct CpuState {
    /// General purpose registers (r0-r31)
    pub gpr: [u32; 32],

    /// Packed condition register
    pub cr: u32,

    /// Packed XER
    pub xer: u32,

    pub pc: u32,
    pub npc: u32,
    pub msr: u32,
    pub srr0: u32,
    pub srr1: u32,

    /// Pending exception bits
    pub exceptions: u32,

    /// Pending program exception cause, as its SRR1 bits
    pub program_cause: Option<u32>,
}

/// Processor interface state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct InterruptState {
    pub cause: u32,
    pub mask: u32,
    pub fifo_base: u32,
    pub fifo_end: u32,
    pub fifo_write_pointer: u32,
    pub reset_code: u32,
}

/// Memory state
///
/// EXRAM is empty on GameCube.
#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct MemoryState {
    /// MEM1 (24 MiB)
    pub mem1: Vec<u8>,

    /// Locked L1 cache (256 KiB)
    pub l1_cache: Vec<u8>,

    /// EXRAM (64 MiB, Wii only)
    pub exram: Vec<u8>,
}

impl SaveState {
    /// Assemble a save state from component states
    pub fn new(
        metadata: SaveStateMetadata,
        cpu: CpuState,
        interrupts: InterruptState,
        memory: MemoryState,
    ) -> Self {
        Self {
            version: SAVE_STATE_VERSION,
            metadata,
            cpu,
            interrupts,
            memory,
        }
    }

    /// Encode to bincode bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::encode_to_vec(self, config::standard())
            .map_err(|e| EmulatorError::SaveState(e.to_string()))
    }

    /// Decode from bincode bytes and verify the version
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (state, _): (SaveState, usize) =
            bincode::decode_from_slice(bytes, config::standard())
                .map_err(|e| EmulatorError::SaveState(e.to_string()))?;

        if state.version != SAVE_STATE_VERSION {
            return Err(EmulatorError::SaveStateVersion {
                expected: SAVE_STATE_VERSION,
                got: state.version,
            });
        }

        Ok(state)
    }

    /// Save state to file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be created
    /// - Serialization fails
    /// - Write operation fails
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let encoded = self.to_bytes()?;
        let mut file = File::create(path.as_ref())?;
        file.write_all(&encoded)?;
        log::info!(
            "Save state written to {} ({} bytes)",
            path.as_ref().display(),
            encoded.len()
        );
        Ok(())
    }

    /// Load state from file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be opened
    /// - File cannot be read
    /// - Deserialization fails
    /// - Version is incompatible
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path.as_ref())?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        let state = Self::from_bytes(&buffer)?;
        log::info!("Save state loaded from {}", path.as_ref().display());
        Ok(state)
    }

    /// Approximate serialized size in bytes
    pub fn estimated_size(&self) -> usize {
        self.memory.mem1.len() + self.memory.l1_cache.len() + self.memory.exram.len() + 1024
    }
}

/// Trait for components that can be saved and restored
///
/// # Example
///
/// ```
/// use gcrx::core::save_state::{InterruptState, StateSave};
///
/// struct Latch {
///     value: u32,
/// }
///
/// impl StateSave for Latch {
///     type State = InterruptState;
///
///     fn to_state(&self) -> Self::State {
///         InterruptState {
///             cause: self.value,
///             mask: 0,
///             fifo_base: 0,
///             fifo_end: 0,
///             fifo_write_pointer: 0,
///             reset_code: 0,
///         }
///     }
///
///     fn restore_from_state(&mut self, state: &Self::State) {
///         self.value = state.cause;
///     }
/// }
///
/// let mut latch = Latch { value: 7 };
/// let saved = latch.to_state();
/// latch.value = 0;
/// latch.restore_from_state(&saved);
/// assert_eq!(latch.value, 7);
/// ```
pub trait StateSave {
    /// The state type for this component
    type State: Serialize + for<'de> Deserialize<'de>;

    /// Convert this component to a saveable state
    fn to_state(&self) -> Self::State;

    /// Restore this component from a saved state
    fn restore_from_state(&mut self, state: &Self::State);
}
