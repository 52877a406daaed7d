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

#[test]
fn test_mem1_mirrors_share_storage() {
    let mut memory = gamecube_memory();
    memory.write_u32(0x8000_1000, 0x1234_5678).unwrap();

    assert_eq!(memory.read_u32(0x0000_1000).unwrap(), 0x1234_5678);
    assert_eq!(memory.read_u32(0xC000_1000).unwrap(), 0x1234_5678);
}

#[test]
fn test_accesses_are_big_endian() {
    let mut memory = gamecube_memory();
    memory.write_u32(0x8000_0000, 0xAABB_CCDD).unwrap();

    assert_eq!(memory.read_u8(0x8000_0000).unwrap(), 0xAA);
    assert_eq!(memory.read_u8(0x8000_0003).unwrap(), 0xDD);
    assert_eq!(memory.read_u16(0x8000_0002).unwrap(), 0xCCDD);

    memory.write_u16(0x8000_0001, 0x1122).unwrap();
    assert_eq!(memory.read_u32(0x8000_0000).unwrap(), 0xAA11_22DD);
}

#[test]
fn test_access_straddling_end_of_mem1_fails() {
    let memory = gamecube_memory();
    assert!(memory.read_u32(0x8000_0000 + MEM1_SIZE - 4).is_ok());
    assert!(memory.read_u32(0x8000_0000 + MEM1_SIZE - 2).is_err());
}

#[test]
fn test_ram_predicates() {
    let memory = gamecube_memory();

    assert!(memory.is_ram_address(0x8000_0000));
    assert!(memory.is_ram_address(0x817F_FFFF));
    assert!(!memory.is_ram_address(0x8180_0000));
    assert!(memory.is_ram_address(0xE000_0000));
    assert!(!memory.is_instruction_ram_address(0xE000_0000));
    assert!(memory.is_instruction_ram_address(0x8000_3100));
    assert!(!memory.is_ram_address(0x9000_0000));
}

#[test]
fn test_wii_map_has_exram() {
    let mut memory = Memory::new(true, false).unwrap();
    assert!(memory.is_wii());

    memory.write_u32(0x9000_0010, 0xCAFE_F00D).unwrap();
    assert_eq!(memory.read_u32(0x1000_0010).unwrap(), 0xCAFE_F00D);
    assert_eq!(memory.read_u32(0xD000_0010).unwrap(), 0xCAFE_F00D);
    assert!(memory.is_instruction_ram_address(0x9000_0000));
}

#[test]
fn test_read_instruction_checks_alignment_and_region() {
    let mut memory = gamecube_memory();
    memory.write_u32(0x8000_3100, 0x3860_0001).unwrap();

    assert_eq!(memory.read_instruction(0x8000_3100).unwrap(), 0x3860_0001);
    assert!(matches!(
        memory.read_instruction(0x8000_3102),
        Err(EmulatorError::UnalignedAccess { .. })
    ));
    assert!(matches!(
        memory.read_instruction(0xE000_0000),
        Err(EmulatorError::InvalidMemoryAccess { .. })
    ));
}

#[test]
fn test_bytes_round_trip_and_clear() {
    let mut memory = gamecube_memory();
    memory.write_bytes(0x8000_4000, &[1, 2, 3, 4, 5]).unwrap();
    assert_eq!(memory.read_bytes(0x8000_4000, 5).unwrap(), vec![1, 2, 3, 4, 5]);

    memory.clear();
    assert_eq!(memory.read_u32(0x8000_4000).unwrap(), 0);
}

#[test]
fn test_snapshot_restores_ram() {
    let mut memory = gamecube_memory();
    memory.write_u32(0x8000_0100, 0x0BAD_F00D).unwrap();
    memory.write_u32(0xE000_0000, 0x1111_2222).unwrap();
    let state = memory.to_state();
    assert_eq!(state.mem1.len(), MEM1_SIZE as usize);
    assert!(state.exram.is_empty());

    memory.clear();
    memory.restore_from_state(&state);
    assert_eq!(memory.read_u32(0x8000_0100).unwrap(), 0x0BAD_F00D);
    assert_eq!(memory.read_u32(0xE000_0000).unwrap(), 0x1111_2222);
}

#[cfg(target_pointer_width = "64")]
#[test]
fn test_fastmem_views_live_in_reserved_region() {
    let mut memory = Memory::new(false, true).unwrap();
    let Some(base) = memory.fastmem_base() else {
        // Hosts with a capped address space fall back to standalone views.
        return;
    };
    memory.write_u32(0x8000_0020, 0x0102_0304).unwrap();

    let bytes = unsafe { std::slice::from_raw_parts(base.as_ptr().add(0x20), 4) };
    assert_eq!(bytes, &[1, 2, 3, 4]);

    let map = memory.arena().region_map().unwrap();
    assert!(map.is_mapped(0x8000_0000, MEM1_SIZE as usize));
    assert!(!map.is_mapped(0x4000_0000, 0x1000));
}
