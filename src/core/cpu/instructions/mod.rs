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

//! CPU instruction implementations
//!
//! This module contains the PowerPC fixed-point instruction set,
//! organized by instruction type for better maintainability.

use super::decode::Instruction;
use super::{ProgramExceptionCause, CPU};

// Instruction modules organized by type
mod arithmetic;
mod compare;
mod logical;
mod multiply;
mod rotate;
mod shift;
mod trap;

/// Carry out of `a + b`
///
/// ```
/// use gcrx::core::cpu::helper_carry;
///
/// assert!(helper_carry(0xFFFF_FFFF, 1));
/// assert!(!helper_carry(0xFFFF_FFFE, 1));
/// ```
#[inline(always)]
pub fn helper_carry(a: u32, b: u32) -> bool {
    b > !a
}

/// Signed overflow of `a + b` given its 32-bit `result`
///
/// ```
/// use gcrx::core::cpu::helper_overflow;
///
/// assert!(helper_overflow(0x7FFF_FFFF, 1, 0x8000_0000));
/// assert!(!helper_overflow(0xFFFF_FFFF, 1, 0));
/// ```
#[inline(always)]
pub fn helper_overflow(a: u32, b: u32, result: u32) -> bool {
    ((a ^ result) & (b ^ result)) >> 31 != 0
}

impl CPU {
    /// Decode and execute one instruction
    ///
    /// Dispatches on the primary opcode (upper 6 bits); opcode 31 continues
    /// in [`execute_extended`](Self::execute_extended).
    pub(super) fn execute_instruction(&mut self, inst: Instruction) {
        match inst.opcd() {
            3 => self.op_twi(inst),
            7 => self.op_mulli(inst),
            8 => self.op_subfic(inst),
            10 => self.op_cmpli(inst),
            11 => self.op_cmpi(inst),
            12 => self.op_addic(inst),
            13 => self.op_addic_rc(inst),
            14 => self.op_addi(inst),
            15 => self.op_addis(inst),
            20 => self.op_rlwimi(inst),
            21 => self.op_rlwinm(inst),
            23 => self.op_rlwnm(inst),
            24 => self.op_ori(inst),
            25 => self.op_oris(inst),
            26 => self.op_xori(inst),
            27 => self.op_xoris(inst),
            28 => self.op_andi_rc(inst),
            29 => self.op_andis_rc(inst),
            31 => self.execute_extended(inst),
            _ => self.op_illegal(inst),
        }
    }

    /// Execute an opcode-31 instruction
    ///
    /// XO-form instructions appear twice: once as the plain form and once with
    /// OE set (extended opcode + 512).
    fn execute_extended(&mut self, inst: Instruction) {
        match inst.subop10() {
            // Compare and trap
            0 => self.op_cmp(inst),
            4 => self.op_tw(inst),
            32 => self.op_cmpl(inst),

            // Add
            266 | 778 => self.op_add(inst),
            10 | 522 => self.op_addc(inst),
            138 | 650 => self.op_adde(inst),
            234 | 746 => self.op_addme(inst),
            202 | 714 => self.op_addze(inst),

            // Subtract
            40 | 552 => self.op_subf(inst),
            8 | 520 => self.op_subfc(inst),
            136 | 648 => self.op_subfe(inst),
            232 | 744 => self.op_subfme(inst),
            200 | 712 => self.op_subfze(inst),
            104 | 616 => self.op_neg(inst),

            // Multiply and divide
            235 | 747 => self.op_mullw(inst),
            75 => self.op_mulhw(inst),
            11 => self.op_mulhwu(inst),
            491 | 1003 => self.op_divw(inst),
            459 | 971 => self.op_divwu(inst),

            // Logical
            28 => self.op_and(inst),
            60 => self.op_andc(inst),
            124 => self.op_nor(inst),
            284 => self.op_eqv(inst),
            316 => self.op_xor(inst),
            412 => self.op_orc(inst),
            444 => self.op_or(inst),
            476 => self.op_nand(inst),
            922 => self.op_extsh(inst),
            954 => self.op_extsb(inst),
            26 => self.op_cntlzw(inst),

            // Shift
            24 => self.op_slw(inst),
            536 => self.op_srw(inst),
            792 => self.op_sraw(inst),
            824 => self.op_srawi(inst),

            _ => self.op_illegal(inst),
        }
    }

    /// Unknown or unimplemented instruction
    fn op_illegal(&mut self, inst: Instruction) {
        log::warn!(
            "CPU: illegal instruction 0x{:08X} (opcode {}, extended {}) at 0x{:08X}",
            inst.raw(),
            inst.opcd(),
            inst.subop10(),
            self.state.pc
        );
        self.generate_program_exception(ProgramExceptionCause::IllegalInstruction);
    }

    /// Write `value` to `rd`, recording CR0 when Rc is set
    #[inline(always)]
    fn set_reg_rc(&mut self, rd: usize, value: u32, inst: Instruction) {
        self.state.gpr[rd] = value;
        if inst.rc() {
            self.state.update_cr0(value);
        }
    }
}
