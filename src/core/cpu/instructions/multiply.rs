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

use super::super::decode::Instruction;
use super::super::CPU;

impl CPU {
    // === Multiply Instructions ===

    /// MULLI: Multiply Low Immediate
    ///
    /// Format: mulli rD, rA, SIMM
    /// Operation: rD = low 32 bits of rA * EXTS(SIMM)
    pub(crate) fn op_mulli(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra()) as i32;
        self.set_reg(inst.rd(), a.wrapping_mul(inst.simm()) as u32);
    }

    /// MULLW: Multiply Low Word
    ///
    /// Format: mullw[o][.] rD, rA, rB
    /// Operation: rD = low 32 bits of rA * rB (signed)
    ///
    /// OV is set when the 64-bit product does not fit in 32 signed bits.
    pub(crate) fn op_mullw(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra()) as i32 as i64;
        let b = self.reg(inst.rb()) as i32 as i64;
        let product = a * b;
        let result = product as u32;

        self.set_reg(inst.rd(), result);
        if inst.oe() {
            self.state
                .set_xer_ov(product < i32::MIN as i64 || product > i32::MAX as i64);
        }
        if inst.rc() {
            self.state.update_cr0(result);
        }
    }

    /// MULHW: Multiply High Word
    ///
    /// Format: mulhw[.] rD, rA, rB
    /// Operation: rD = high 32 bits of rA * rB (signed)
    pub(crate) fn op_mulhw(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra()) as i32 as i64;
        let b = self.reg(inst.rb()) as i32 as i64;
        let result = ((a * b) >> 32) as u32;
        self.set_reg_rc(inst.rd(), result, inst);
    }

    /// MULHWU: Multiply High Word Unsigned
    ///
    /// Format: mulhwu[.] rD, rA, rB
    /// Operation: rD = high 32 bits of rA * rB (unsigned)
    pub(crate) fn op_mulhwu(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra()) as u64;
        let b = self.reg(inst.rb()) as u64;
        let result = ((a * b) >> 32) as u32;
        self.set_reg_rc(inst.rd(), result, inst);
    }

    // === Divide Instructions ===
    //
    // Invalid divisions produce a fixed quotient and never trap on the host.

    /// DIVW: Divide Word
    ///
    /// Format: divw[o][.] rD, rA, rB
    /// Operation: rD = rA / rB (signed, truncating)
    ///
    /// - rB = 0: rD = 0xFFFFFFFF if rA < 0, else 0
    /// - 0x80000000 / -1: rD = 0x80000000
    ///
    /// Both cases set OV when OE is set.
    pub(crate) fn op_divw(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra()) as i32;
        let b = self.reg(inst.rb()) as i32;
        let overflow = b == 0 || (a == i32::MIN && b == -1);

        let result = if b == 0 {
            if a < 0 {
                0xFFFF_FFFF
            } else {
                0
            }
        } else {
            a.wrapping_div(b) as u32
        };

        self.set_reg(inst.rd(), result);
        if inst.oe() {
            self.state.set_xer_ov(overflow);
        }
        if inst.rc() {
            self.state.update_cr0(result);
        }
    }

    /// DIVWU: Divide Word Unsigned
    ///
    /// Format: divwu[o][.] rD, rA, rB
    /// Operation: rD = rA / rB (unsigned), 0 when rB = 0
    pub(crate) fn op_divwu(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        let b = self.reg(inst.rb());
        let overflow = b == 0;
        let result = a.checked_div(b).unwrap_or(0);

        self.set_reg(inst.rd(), result);
        if inst.oe() {
            self.state.set_xer_ov(overflow);
        }
        if inst.rc() {
            self.state.update_cr0(result);
        }
    }
}
