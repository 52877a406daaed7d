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

//! Patch engine
//!
//! Two kinds of patches are written into guest memory once per frame:
//!
//! - **Frame patches**: named groups of [`PatchEntry`] loaded from a patch
//!   list and enabled by name.
//! - **Debugger patches**: raw byte patches in a shared [`MemoryPatches`]
//!   registry. Only the indices added with
//!   [`PatchControl::add_memory_patch`] are re-applied every frame.
//!
//! Patches are only applied while the guest runs with translation on and a
//! plausible call stack, so a frame boundary that lands inside an exception
//! handler is retried later (see [`PatchEngine::apply_frame_patches`]).

mod debug;
mod entry;

pub use debug::{MemoryPatch, MemoryPatches, PatchKind};
pub use entry::{parse_patches, Patch, PatchEntry, PatchType};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::cpu::{Msr, PowerPcState};
use crate::core::error::Result;
use crate::core::memory::Memory;

/// Cross-thread side of the patch engine
#[derive(Debug, Clone, Default)]
pub struct PatchControl {
    on_frame_memory: Arc<Mutex<Vec<usize>>>,
    registry: MemoryPatches,
}

impl PatchControl {
    fn indices(&self) -> MutexGuard<'_, Vec<usize>> {
        self.on_frame_memory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Re-apply debugger patch `index` every frame
    pub fn add_memory_patch(&self, index: usize) {
        self.indices().push(index);
    }

    /// Stop re-applying debugger patch `index`
    pub fn remove_memory_patch(&self, index: usize) {
        self.indices().retain(|&i| i != index);
    }

    /// Snapshot of the per-frame debugger patch indices
    pub fn memory_patch_indices(&self) -> Vec<usize> {
        self.indices().clone()
    }

    /// The debugger patch registry
    pub fn registry(&self) -> &MemoryPatches {
        &self.registry
    }
}

/// Patch engine
///
/// # Example
///
/// ```
/// use gcrx::core::patch::PatchEngine;
///
/// let mut engine = PatchEngine::new();
/// engine.load_from_str("$Fast\n0x80003000:dword:0x60000000\n");
/// assert!(engine.set_enabled("Fast", true));
/// assert!(!engine.set_enabled("Missing", true));
/// assert_eq!(engine.patches().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct PatchEngine {
    on_frame: Vec<Patch>,
    control: PatchControl,
}

impl PatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the frame patches with the groups in `text`
    ///
    /// Returns the number of groups loaded.
    pub fn load_from_str(&mut self, text: &str) -> usize {
        self.on_frame = parse_patches(text);
        log::info!("Patch: loaded {} patch group(s)", self.on_frame.len());
        self.on_frame.len()
    }

    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::info!("Patch: reading {}", path.as_ref().display());
        Ok(self.load_from_str(&text))
    }

    /// Enable or disable a group by name; false when no group has that name
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let mut found = false;
        for patch in self.on_frame.iter_mut().filter(|p| p.name == name) {
            patch.enabled = enabled;
            found = true;
        }
        if found {
            log::debug!(
                "Patch: {} {:?}",
                if enabled { "enabled" } else { "disabled" },
                name
            );
        } else {
            log::warn!("Patch: no patch group named {:?}", name);
        }
        found
    }

    /// Enable every group named in `names`
    pub fn enable_patches<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            self.set_enabled(name.as_ref(), true);
        }
    }

    /// Add an already-built group
    pub fn add_patch(&mut self, patch: Patch) {
        self.on_frame.push(patch);
    }

    pub fn patches(&self) -> &[Patch] {
        &self.on_frame
    }

    /// Drop every frame patch
    ///
    /// The debugger registry and its per-frame indices are owned by the
    /// debugger and survive.
    pub fn clear(&mut self) {
        self.on_frame.clear();
    }

    /// Clear, then load `text`
    pub fn reload(&mut self, text: &str) -> usize {
        self.clear();
        self.load_from_str(text)
    }

    /// Cloneable handle for the debugger thread
    pub fn control(&self) -> PatchControl {
        self.control.clone()
    }

    pub fn debug_patches(&self) -> &MemoryPatches {
        &self.control.registry
    }

    /// Apply every enabled patch once
    ///
    /// Returns `false` without touching memory when data or instruction
    /// translation is off or the stack does not look sane; the caller is
    /// expected to try again shortly.
    pub fn apply_frame_patches(&self, state: &PowerPcState, memory: &mut Memory) -> bool {
        if !state.msr.contains(Msr::DR | Msr::IR) || !is_stack_sane(state, memory) {
            log::debug!(
                "Patch: need to retry later, PC = 0x{:08X}, MSR = 0x{:08X}",
                state.pc,
                state.msr.bits()
            );
            return false;
        }

        self.apply_patches(memory);
        self.apply_memory_patches(memory);
        true
    }

    fn apply_patches(&self, memory: &mut Memory) {
        for patch in self.on_frame.iter().filter(|p| p.enabled) {
            for entry in &patch.entries {
                if let Err(e) = apply_entry(entry, memory) {
                    log::warn!("Patch: {:?} entry {} failed: {}", patch.name, entry, e);
                }
            }
        }
    }

    fn apply_memory_patches(&self, memory: &mut Memory) {
        let indices = self.control.memory_patch_indices();
        for index in indices {
            if let Err(e) = self.control.registry.apply_existing_patch(index, memory) {
                log::warn!("Patch: debugger patch {} failed: {}", index, e);
            }
        }
    }
}

fn apply_entry(entry: &PatchEntry, memory: &mut Memory) -> Result<()> {
    let addr = entry.address;
    match entry.kind {
        PatchType::Byte => {
            let matches = match entry.comparand {
                Some(c) => memory.read_u8(addr)? == c as u8,
                None => true,
            };
            if matches {
                memory.write_u8(addr, entry.value as u8)?;
            }
        }
        PatchType::Word => {
            let matches = match entry.comparand {
                Some(c) => memory.read_u16(addr)? == c as u16,
                None => true,
            };
            if matches {
                memory.write_u16(addr, entry.value as u16)?;
            }
        }
        PatchType::DWord => {
            let matches = match entry.comparand {
                Some(c) => memory.read_u32(addr)? == c,
                None => true,
            };
            if matches {
                memory.write_u32(addr, entry.value)?;
            }
        }
    }
    Ok(())
}

/// Heuristic for "the guest is in normal code"
///
/// Requires two stack frames: r1 in RAM, the back chain `[r1]` above r1 and
/// in RAM, and the saved link register at `[back_chain + 4]` pointing at a
/// non-zero instruction.
pub fn is_stack_sane(state: &PowerPcState, memory: &Memory) -> bool {
    let sp = state.gpr[1];
    if !memory.is_ram_address(sp) {
        return false;
    }

    let Ok(next_sp) = memory.read_u32(sp) else {
        return false;
    };
    if next_sp <= sp
        || !memory.is_ram_address(next_sp)
        || !memory.is_ram_address(next_sp.wrapping_add(4))
    {
        return false;
    }

    let Ok(link) = memory.read_u32(next_sp.wrapping_add(4)) else {
        return false;
    };
    memory.is_instruction_ram_address(link)
        && memory.read_instruction(link).is_ok_and(|word| word != 0)
}
