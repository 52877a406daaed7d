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

//! Debugger memory patches
//!
//! A debugger thread edits the registry through a cloned [`MemoryPatches`];
//! the CPU thread copies a patch out under the lock and writes it to guest
//! memory without holding the lock.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::error::{EmulatorError, Result};
use crate::core::memory::Memory;

/// How a debugger patch finds its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    /// Write at the patch address
    Fixed,
    /// Scan forward from the address in `stride` steps for the original bytes
    Search { stride: u32 },
}

/// One debugger patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryPatch {
    pub address: u32,
    pub value: Vec<u8>,
    /// Bytes expected before writing; nothing is written on mismatch
    pub original_value: Option<Vec<u8>>,
    pub kind: PatchKind,
    pub enabled: bool,
}

impl MemoryPatch {
    pub fn new(address: u32, value: Vec<u8>) -> Self {
        Self {
            address,
            value,
            original_value: None,
            kind: PatchKind::Fixed,
            enabled: true,
        }
    }

    /// Only write while memory still holds `original`
    pub fn with_original(mut self, original: Vec<u8>) -> Self {
        self.original_value = Some(original);
        self
    }

    pub fn search(address: u32, value: Vec<u8>, original: Vec<u8>, stride: u32) -> Self {
        Self {
            address,
            value,
            original_value: Some(original),
            kind: PatchKind::Search { stride },
            enabled: true,
        }
    }

    /// Write the patch into `memory`; returns whether bytes were written
    pub fn apply(&self, memory: &mut Memory) -> Result<bool> {
        if !self.enabled || self.value.is_empty() {
            return Ok(false);
        }
        if let Some(original) = &self.original_value {
            let current = memory.read_bytes(self.address, original.len().max(self.value.len()))?;
            if current[..original.len()] != original[..]
                && current[..self.value.len()] != self.value[..]
            {
                log::debug!(
                    "Patch: memory at 0x{:08X} no longer matches, skipping",
                    self.address
                );
                return Ok(false);
            }
        }
        memory.write_bytes(self.address, &self.value)?;
        Ok(true)
    }
}

/// Shared registry of debugger patches
#[derive(Debug, Clone, Default)]
pub struct MemoryPatches {
    patches: Arc<Mutex<Vec<MemoryPatch>>>,
}

impl MemoryPatches {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MemoryPatch>> {
        self.patches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a patch and return its index
    ///
    /// # Errors
    ///
    /// [`EmulatorError::UnsupportedPatch`] for search patches.
    pub fn set_patch(&self, patch: MemoryPatch) -> Result<usize> {
        if let PatchKind::Search { .. } = patch.kind {
            log::warn!(
                "Patch: search patch at 0x{:08X} rejected",
                patch.address
            );
            return Err(EmulatorError::UnsupportedPatch {
                address: patch.address,
                reason: "search patches are not supported",
            });
        }
        let mut patches = self.lock();
        patches.push(patch);
        Ok(patches.len() - 1)
    }

    /// Copy of the patch at `index`
    pub fn get(&self, index: usize) -> Option<MemoryPatch> {
        self.lock().get(index).cloned()
    }

    pub fn patches(&self) -> Vec<MemoryPatch> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn has_enabled_patches(&self) -> bool {
        self.lock().iter().any(|p| p.enabled)
    }

    pub fn enable_patch(&self, index: usize) -> bool {
        self.set_enabled(index, true)
    }

    pub fn disable_patch(&self, index: usize) -> bool {
        self.set_enabled(index, false)
    }

    fn set_enabled(&self, index: usize, enabled: bool) -> bool {
        match self.lock().get_mut(index) {
            Some(patch) => {
                patch.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Remove a patch; later indices shift down by one
    pub fn remove_patch(&self, index: usize) -> Option<MemoryPatch> {
        let mut patches = self.lock();
        (index < patches.len()).then(|| patches.remove(index))
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Apply the patch at `index` if it exists
    pub fn apply_existing_patch(&self, index: usize, memory: &mut Memory) -> Result<bool> {
        match self.get(index) {
            Some(patch) => patch.apply(memory),
            None => {
                log::debug!("Patch: no debugger patch at index {}", index);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Memory {
        Memory::new(false, false).unwrap()
    }

    #[test]
    fn test_fixed_patch_writes() {
        let mut mem = memory();
        let patches = MemoryPatches::new();
        let index = patches
            .set_patch(MemoryPatch::new(0x8000_1000, vec![0x60, 0, 0, 0]))
            .unwrap();

        assert!(patches.apply_existing_patch(index, &mut mem).unwrap());
        assert_eq!(mem.read_u32(0x8000_1000).unwrap(), 0x6000_0000);
    }

    #[test]
    fn test_original_mismatch_skips() {
        let mut mem = memory();
        mem.write_u32(0x8000_2000, 0x1111_1111).unwrap();
        let patch = MemoryPatch::new(0x8000_2000, vec![0xAA, 0xBB])
            .with_original(vec![0x22, 0x22]);

        assert!(!patch.apply(&mut mem).unwrap());
        assert_eq!(mem.read_u32(0x8000_2000).unwrap(), 0x1111_1111);

        mem.write_u16(0x8000_2000, 0x2222).unwrap();
        assert!(patch.apply(&mut mem).unwrap());
        assert_eq!(mem.read_u16(0x8000_2000).unwrap(), 0xAABB);

        // Already patched stays applicable
        assert!(patch.apply(&mut mem).unwrap());
    }

    #[test]
    fn test_already_patched_with_longer_value() {
        let mut mem = memory();
        mem.write_u32(0x8000_2100, 0x6000_0000).unwrap();
        let patch = MemoryPatch::new(0x8000_2100, vec![0x60, 0, 0, 0])
            .with_original(vec![0x48, 0x00]);

        assert!(patch.apply(&mut mem).unwrap());
        assert_eq!(mem.read_u32(0x8000_2100).unwrap(), 0x6000_0000);

        mem.write_u32(0x8000_2100, 0x4800_1234).unwrap();
        assert!(patch.apply(&mut mem).unwrap());
        assert_eq!(mem.read_u32(0x8000_2100).unwrap(), 0x6000_0000);

        mem.write_u32(0x8000_2100, 0x7C00_0000).unwrap();
        assert!(!patch.apply(&mut mem).unwrap());
    }

    #[test]
    fn test_already_patched_with_shorter_value() {
        let mut mem = memory();
        mem.write_u32(0x8000_2200, 0xAABB_0000).unwrap();
        let patch = MemoryPatch::new(0x8000_2200, vec![0xAA, 0xBB])
            .with_original(vec![0x11, 0x22, 0x33, 0x44]);

        assert!(patch.apply(&mut mem).unwrap());
        assert_eq!(mem.read_u32(0x8000_2200).unwrap(), 0xAABB_0000);
    }

    #[test]
    fn test_disabled_patch_not_written() {
        let mut mem = memory();
        let patches = MemoryPatches::new();
        let index = patches
            .set_patch(MemoryPatch::new(0x8000_3000, vec![0xFF]))
            .unwrap();
        assert!(patches.disable_patch(index));
        assert!(!patches.has_enabled_patches());

        assert!(!patches.apply_existing_patch(index, &mut mem).unwrap());
        assert_eq!(mem.read_u8(0x8000_3000).unwrap(), 0);
    }

    #[test]
    fn test_search_patch_rejected() {
        let patches = MemoryPatches::new();
        let result = patches.set_patch(MemoryPatch::search(
            0x8000_0000,
            vec![1],
            vec![2],
            4,
        ));
        assert!(matches!(
            result,
            Err(EmulatorError::UnsupportedPatch {
                address: 0x8000_0000,
                ..
            })
        ));
        assert!(patches.is_empty());
    }

    #[test]
    fn test_registry_shared_between_clones() {
        let patches = MemoryPatches::new();
        let remote = patches.clone();

        std::thread::spawn(move || {
            remote
                .set_patch(MemoryPatch::new(0x8000_0000, vec![1]))
                .unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(patches.len(), 1);
        assert!(patches.remove_patch(0).is_some());
        assert!(patches.remove_patch(0).is_none());
    }

    #[test]
    fn test_missing_index_is_noop() {
        let mut mem = memory();
        let patches = MemoryPatches::new();
        assert!(!patches.apply_existing_patch(3, &mut mem).unwrap());
        assert!(!patches.enable_patch(3));
    }
}
