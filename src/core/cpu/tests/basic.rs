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

use super::super::*;
use crate::core::save_state::StateSave;

#[test]
fn test_cpu_initialization() {
    let cpu = CPU::new();
    assert_eq!(cpu.pc(), 0);
    assert_eq!(cpu.state.npc, 0);
    assert_eq!(cpu.state.msr, Msr::empty());
    assert!(cpu.state.exceptions.is_empty());
    assert!(!cpu.block_ended());
}

#[test]
fn test_r0_is_an_ordinary_register() {
    let mut cpu = CPU::new();
    cpu.set_reg(0, 0xDEADBEEF);
    assert_eq!(cpu.reg(0), 0xDEADBEEF);
}

#[test]
fn test_multiple_registers() {
    let mut cpu = CPU::new();

    for i in 0..32 {
        cpu.set_reg(i, i as u32 * 100);
    }

    for i in 0..32 {
        assert_eq!(cpu.reg(i), i as u32 * 100);
    }
}

#[test]
fn test_cpu_reset() {
    let mut cpu = CPU::new();

    cpu.set_reg(1, 0xFFFFFFFF);
    cpu.set_pc(0x80003100);
    cpu.state.msr = Msr::DR | Msr::IR;
    cpu.state.xer.so = true;
    cpu.state.cr.set(0x1234_5678);

    cpu.reset();

    assert_eq!(cpu.reg(1), 0);
    assert_eq!(cpu.pc(), 0);
    assert_eq!(cpu.state.msr, Msr::empty());
    assert!(!cpu.state.xer.so);
    assert_eq!(cpu.state.cr.get(), 0);
}

#[test]
fn test_set_pc_aligns_npc() {
    let mut cpu = CPU::new();
    cpu.set_pc(0x80004000);
    assert_eq!(cpu.pc(), 0x80004000);
    assert_eq!(cpu.state.npc, 0x80004000);
}

#[test]
fn test_state_save_round_trip() {
    let mut cpu = CPU::new();
    cpu.set_reg(3, 0x1234);
    cpu.set_reg(31, 0xFFFF_0000);
    cpu.set_pc(0x8000_1000);
    cpu.state.cr.set(0x8000_0002);
    cpu.state.xer.set(0xA000_0010);
    cpu.state.msr = Msr::EE | Msr::DR | Msr::IR;
    cpu.state.srr0 = 0x8000_0FFC;
    cpu.state.srr1 = 0x0002_9032;
    cpu.generate_program_exception(ProgramExceptionCause::Trap);

    let saved = cpu.to_state();
    let mut restored = CPU::new();
    restored.restore_from_state(&saved);

    assert_eq!(restored.state, cpu.state);
}
