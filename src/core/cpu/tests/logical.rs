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
use super::*;

fn cpu_with(regs: &[(usize, u32)]) -> CPU {
    let mut cpu = CPU::new();
    for &(index, value) in regs {
        cpu.set_reg(index, value);
    }
    cpu
}

// === Logical immediate ===

#[test]
fn test_andi_rc_always_records() {
    let mut cpu = cpu_with(&[(3, 0x1234_5678)]);
    exec(&mut cpu, d_form(28, 3, 4, 0x00F0));
    assert_eq!(cpu.reg(4), 0x70);
    assert_eq!(cpu.state.cr.field(0), CR_GT);

    cpu.set_reg(3, 0x0F);
    exec(&mut cpu, d_form(28, 3, 4, 0x00F0));
    assert_eq!(cpu.reg(4), 0);
    assert_eq!(cpu.state.cr.field(0), CR_EQ);
}

#[test]
fn test_andis_rc() {
    let mut cpu = cpu_with(&[(3, 0x8000_0001)]);
    exec(&mut cpu, d_form(29, 3, 4, 0x8000));
    assert_eq!(cpu.reg(4), 0x8000_0000);
    assert_eq!(cpu.state.cr.field(0), CR_LT);
}

#[test]
fn test_or_xor_immediates_leave_cr_alone() {
    let mut cpu = cpu_with(&[(3, 0x1234_0000)]);
    exec(&mut cpu, d_form(24, 3, 4, 0x00FF));
    assert_eq!(cpu.reg(4), 0x1234_00FF);

    exec(&mut cpu, d_form(25, 3, 4, 0xABCD));
    assert_eq!(cpu.reg(4), 0xBBFD_0000);

    cpu.set_reg(3, 0xFF00_FF00);
    exec(&mut cpu, d_form(26, 3, 4, 0xFFFF));
    assert_eq!(cpu.reg(4), 0xFF00_00FF);

    exec(&mut cpu, d_form(27, 3, 4, 0xFFFF));
    assert_eq!(cpu.reg(4), 0x00FF_FF00);

    assert_eq!(cpu.state.cr.get(), 0);
}

// === Logical register ===

#[test]
fn test_and_andc_or_orc() {
    let mut cpu = cpu_with(&[(3, 0xF0F0), (5, 0xFF00)]);
    exec(&mut cpu, x_form(3, 4, 5, 28, false));
    assert_eq!(cpu.reg(4), 0xF000);

    exec(&mut cpu, x_form(3, 4, 5, 60, false));
    assert_eq!(cpu.reg(4), 0x00F0);

    cpu.set_reg(5, 0x0F0F);
    exec(&mut cpu, x_form(3, 4, 5, 444, false));
    assert_eq!(cpu.reg(4), 0xFFFF);

    cpu.set_reg(3, 0);
    cpu.set_reg(5, 0xFFFF_0000);
    exec(&mut cpu, x_form(3, 4, 5, 412, false));
    assert_eq!(cpu.reg(4), 0x0000_FFFF);
}

#[test]
fn test_xor_nor_nand_eqv() {
    let mut cpu = cpu_with(&[(3, 0xFF), (5, 0x0F)]);
    exec(&mut cpu, x_form(3, 4, 5, 316, false));
    assert_eq!(cpu.reg(4), 0xF0);

    cpu.set_reg(3, 0);
    cpu.set_reg(5, 0);
    exec(&mut cpu, x_form(3, 4, 5, 124, true));
    assert_eq!(cpu.reg(4), 0xFFFF_FFFF);
    assert_eq!(cpu.state.cr.field(0), CR_LT);

    cpu.set_reg(3, 0xFFFF_FFFF);
    cpu.set_reg(5, 0xFFFF_FFFF);
    exec(&mut cpu, x_form(3, 4, 5, 476, true));
    assert_eq!(cpu.reg(4), 0);
    assert_eq!(cpu.state.cr.field(0), CR_EQ);

    cpu.set_reg(3, 0x1234);
    cpu.set_reg(5, 0x1234);
    exec(&mut cpu, x_form(3, 4, 5, 284, false));
    assert_eq!(cpu.reg(4), 0xFFFF_FFFF);
}

#[test]
fn test_mr_idiom() {
    let mut cpu = cpu_with(&[(3, 0xCAFE_BABE)]);
    exec(&mut cpu, x_form(3, 4, 3, 444, false));
    assert_eq!(cpu.reg(4), 0xCAFE_BABE);
}

#[test]
fn test_sign_extension() {
    let mut cpu = cpu_with(&[(3, 0x0000_0080)]);
    exec(&mut cpu, x_form(3, 4, 0, 954, false));
    assert_eq!(cpu.reg(4), 0xFFFF_FF80);

    cpu.set_reg(3, 0x1234_567F);
    exec(&mut cpu, x_form(3, 4, 0, 954, false));
    assert_eq!(cpu.reg(4), 0x7F);

    cpu.set_reg(3, 0x0000_8000);
    exec(&mut cpu, x_form(3, 4, 0, 922, true));
    assert_eq!(cpu.reg(4), 0xFFFF_8000);
    assert_eq!(cpu.state.cr.field(0), CR_LT);
}

#[test]
fn test_cntlzw() {
    let mut cpu = cpu_with(&[(3, 0)]);
    exec(&mut cpu, x_form(3, 4, 0, 26, false));
    assert_eq!(cpu.reg(4), 32);

    cpu.set_reg(3, 1);
    exec(&mut cpu, x_form(3, 4, 0, 26, false));
    assert_eq!(cpu.reg(4), 31);

    cpu.set_reg(3, 0x8000_0000);
    exec(&mut cpu, x_form(3, 4, 0, 26, true));
    assert_eq!(cpu.reg(4), 0);
    assert_eq!(cpu.state.cr.field(0), CR_EQ);
}

// === Rotate ===

#[test]
fn test_rlwinm_extract() {
    let mut cpu = cpu_with(&[(3, 0x1234_5678)]);
    exec(&mut cpu, m_form(21, 3, 4, 8, 16, 23, false));
    assert_eq!(cpu.reg(4), 0x0000_7800);
}

#[test]
fn test_rlwinm_shift_idioms() {
    let mut cpu = cpu_with(&[(3, 0x1234_5678)]);
    // slwi r4, r3, 4
    exec(&mut cpu, m_form(21, 3, 4, 4, 0, 27, false));
    assert_eq!(cpu.reg(4), 0x2345_6780);

    // srwi r4, r3, 4
    exec(&mut cpu, m_form(21, 3, 4, 28, 4, 31, true));
    assert_eq!(cpu.reg(4), 0x0123_4567);
    assert_eq!(cpu.state.cr.field(0), CR_GT);
}

#[test]
fn test_rlwinm_wrapping_mask() {
    let mut cpu = cpu_with(&[(3, 0xFFFF_FFFF)]);
    exec(&mut cpu, m_form(21, 3, 4, 0, 30, 1, false));
    assert_eq!(cpu.reg(4), 0xC000_0003);
}

#[test]
fn test_rlwimi_inserts() {
    let mut cpu = cpu_with(&[(3, 0x0000_ABCD), (4, 0x1111_2222)]);
    exec(&mut cpu, m_form(20, 3, 4, 16, 0, 15, false));
    assert_eq!(cpu.reg(4), 0xABCD_2222);
}

#[test]
fn test_rlwnm_masks_amount() {
    let mut cpu = cpu_with(&[(3, 0x1234_5678), (5, 36)]);
    exec(&mut cpu, m_form(23, 3, 4, 5, 0, 31, false));
    assert_eq!(cpu.reg(4), 0x2345_6781);
}

// === Shift ===

#[test]
fn test_slw() {
    let mut cpu = cpu_with(&[(3, 1), (5, 31)]);
    exec(&mut cpu, x_form(3, 4, 5, 24, false));
    assert_eq!(cpu.reg(4), 0x8000_0000);

    cpu.set_reg(5, 32);
    exec(&mut cpu, x_form(3, 4, 5, 24, false));
    assert_eq!(cpu.reg(4), 0);

    cpu.set_reg(5, 33);
    exec(&mut cpu, x_form(3, 4, 5, 24, true));
    assert_eq!(cpu.reg(4), 0);
    assert_eq!(cpu.state.cr.field(0), CR_EQ);
}

#[test]
fn test_srw() {
    let mut cpu = cpu_with(&[(3, 0x8000_0000), (5, 31)]);
    exec(&mut cpu, x_form(3, 4, 5, 536, false));
    assert_eq!(cpu.reg(4), 1);

    cpu.set_reg(5, 0x20);
    exec(&mut cpu, x_form(3, 4, 5, 536, false));
    assert_eq!(cpu.reg(4), 0);
}

#[test]
fn test_sraw_carry() {
    let mut cpu = cpu_with(&[(3, (-15i32) as u32), (5, 2)]);
    exec(&mut cpu, x_form(3, 4, 5, 792, false));
    assert_eq!(cpu.reg(4), (-4i32) as u32);
    assert!(cpu.state.xer.ca);

    cpu.set_reg(3, (-16i32) as u32);
    exec(&mut cpu, x_form(3, 4, 5, 792, false));
    assert_eq!(cpu.reg(4), (-4i32) as u32);
    assert!(!cpu.state.xer.ca);

    cpu.set_reg(3, 0x0F);
    exec(&mut cpu, x_form(3, 4, 5, 792, false));
    assert_eq!(cpu.reg(4), 3);
    assert!(!cpu.state.xer.ca);
}

#[test]
fn test_sraw_large_amount_fills_with_sign() {
    let mut cpu = cpu_with(&[(3, 0x8000_0000), (5, 40)]);
    exec(&mut cpu, x_form(3, 4, 5, 792, true));
    assert_eq!(cpu.reg(4), 0xFFFF_FFFF);
    assert!(cpu.state.xer.ca);
    assert_eq!(cpu.state.cr.field(0), CR_LT);

    cpu.set_reg(3, 0x7FFF_FFFF);
    exec(&mut cpu, x_form(3, 4, 5, 792, false));
    assert_eq!(cpu.reg(4), 0);
    assert!(!cpu.state.xer.ca);
}

#[test]
fn test_srawi() {
    let mut cpu = cpu_with(&[(3, 0x8000_0001)]);
    exec(&mut cpu, x_form(3, 4, 4, 824, false));
    assert_eq!(cpu.reg(4), 0xF800_0000);
    assert!(cpu.state.xer.ca);

    exec(&mut cpu, x_form(3, 4, 0, 824, false));
    assert_eq!(cpu.reg(4), 0x8000_0001);
    assert!(!cpu.state.xer.ca);
}
