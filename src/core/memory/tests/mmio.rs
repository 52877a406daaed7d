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

use super::*;
use crate::core::gather_pipe::{GatherPipe, GATHER_PIPE_BASE};

struct Latch {
    value: u32,
}

impl IODevice for Latch {
    fn address_range(&self) -> (u32, u32) {
        (0x0C00_F000, 0x0C00_F003)
    }

    fn read_register(&self, _offset: u32) -> Result<u32> {
        Ok(self.value)
    }

    fn write_register(&mut self, _offset: u32, value: u32) -> Result<()> {
        self.value = value;
        Ok(())
    }
}

#[test]
fn test_mmio_reaches_device_through_both_windows() {
    let mut memory = gamecube_memory();
    let latch = Rc::new(RefCell::new(Latch { value: 0 }));
    memory.register_device(latch.clone());

    memory.write_u32(0xCC00_F000, 0x1234_5678).unwrap();
    assert_eq!(latch.borrow().value, 0x1234_5678);
    assert_eq!(memory.read_u32(0x0C00_F000).unwrap(), 0x1234_5678);
    assert_eq!(memory.read_u16(0xCC00_F002).unwrap(), 0x5678);
}

#[test]
fn test_unmapped_mmio_is_an_error() {
    let mut memory = gamecube_memory();
    assert!(matches!(
        memory.read_u32(0xCC00_F000),
        Err(EmulatorError::InvalidMemoryAccess {
            address: 0xCC00_F000
        })
    ));
    assert!(memory.write_u32(0x7000_0000, 0).is_err());
}

#[test]
fn test_unaligned_mmio_is_rejected() {
    let mut memory = gamecube_memory();
    memory.register_device(Rc::new(RefCell::new(Latch { value: 0 })));
    assert!(matches!(
        memory.read_u32(0xCC00_F001),
        Err(EmulatorError::UnalignedAccess { size: 4, .. })
    ));
}

#[test]
fn test_gather_pipe_collects_stores() {
    let mut memory = gamecube_memory();
    let pipe = Rc::new(RefCell::new(GatherPipe::new()));
    memory.register_device(pipe.clone());

    memory
        .write_u32(0xC000_0000 | GATHER_PIPE_BASE, 0x6100_0000)
        .unwrap();
    memory.write_u8(0xC000_0000 | GATHER_PIPE_BASE, 0x08).unwrap();
    assert_eq!(pipe.borrow().pending_bytes(), 5);
}
