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
use super::{helper_carry, helper_overflow};

impl CPU {
    // === Add/Subtract Immediate ===

    /// ADDI: Add Immediate
    ///
    /// Format: addi rD, rA, SIMM
    /// Operation: rD = (rA|0) + EXTS(SIMM)
    ///
    /// An RA field of 0 means the literal 0, which makes `addi rD, 0, x`
    /// the `li` idiom.
    pub(crate) fn op_addi(&mut self, inst: Instruction) {
        let base = if inst.ra() == 0 { 0 } else { self.reg(inst.ra()) };
        self.set_reg(inst.rd(), base.wrapping_add(inst.simm() as u32));
    }

    /// ADDIS: Add Immediate Shifted
    ///
    /// Format: addis rD, rA, SIMM
    /// Operation: rD = (rA|0) + (SIMM << 16)
    pub(crate) fn op_addis(&mut self, inst: Instruction) {
        let base = if inst.ra() == 0 { 0 } else { self.reg(inst.ra()) };
        self.set_reg(inst.rd(), base.wrapping_add(inst.uimm() << 16));
    }

    /// ADDIC: Add Immediate Carrying
    ///
    /// Format: addic rD, rA, SIMM
    /// Operation: rD = rA + EXTS(SIMM), CA = carry
    pub(crate) fn op_addic(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        let imm = inst.simm() as u32;
        self.set_reg(inst.rd(), a.wrapping_add(imm));
        self.state.set_xer_ca(helper_carry(a, imm));
    }

    /// ADDIC.: Add Immediate Carrying and Record
    ///
    /// Same as ADDIC, always updates CR0.
    pub(crate) fn op_addic_rc(&mut self, inst: Instruction) {
        self.op_addic(inst);
        let result = self.reg(inst.rd());
        self.state.update_cr0(result);
    }

    /// SUBFIC: Subtract From Immediate Carrying
    ///
    /// Format: subfic rD, rA, SIMM
    /// Operation: rD = EXTS(SIMM) - rA, computed as !rA + SIMM + 1
    pub(crate) fn op_subfic(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        let imm = inst.simm() as u32;
        self.set_reg(inst.rd(), imm.wrapping_sub(a));
        self.state
            .set_xer_ca(a == 0 || helper_carry(0u32.wrapping_sub(a), imm));
    }

    // === Add (XO-form) ===

    /// ADD: Add
    ///
    /// Format: add[o][.] rD, rA, rB
    /// Operation: rD = rA + rB
    pub(crate) fn op_add(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        let b = self.reg(inst.rb());
        let result = a.wrapping_add(b);
        self.finish_add(inst, a, b, result);
    }

    /// ADDC: Add Carrying
    ///
    /// Format: addc[o][.] rD, rA, rB
    /// Operation: rD = rA + rB, CA = carry
    pub(crate) fn op_addc(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        let b = self.reg(inst.rb());
        let result = a.wrapping_add(b);
        self.state.set_xer_ca(helper_carry(a, b));
        self.finish_add(inst, a, b, result);
    }

    /// ADDE: Add Extended
    ///
    /// Format: adde[o][.] rD, rA, rB
    /// Operation: rD = rA + rB + CA
    pub(crate) fn op_adde(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        let b = self.reg(inst.rb());
        self.add_extended(inst, a, b);
    }

    /// ADDME: Add to Minus One Extended
    ///
    /// Format: addme[o][.] rD, rA
    /// Operation: rD = rA + CA - 1
    pub(crate) fn op_addme(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        self.add_minus_one_extended(inst, a);
    }

    /// ADDZE: Add to Zero Extended
    ///
    /// Format: addze[o][.] rD, rA
    /// Operation: rD = rA + CA
    pub(crate) fn op_addze(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        self.add_zero_extended(inst, a);
    }

    // === Subtract (XO-form) ===
    //
    // rB - rA is computed as !rA + rB + 1, so carry and overflow use the
    // complemented operand.

    /// SUBF: Subtract From
    ///
    /// Format: subf[o][.] rD, rA, rB
    /// Operation: rD = rB - rA
    pub(crate) fn op_subf(&mut self, inst: Instruction) {
        let a = !self.reg(inst.ra());
        let b = self.reg(inst.rb());
        let result = a.wrapping_add(b).wrapping_add(1);
        self.finish_add(inst, a, b, result);
    }

    /// SUBFC: Subtract From Carrying
    ///
    /// Format: subfc[o][.] rD, rA, rB
    /// Operation: rD = rB - rA, CA = carry of !rA + rB + 1
    pub(crate) fn op_subfc(&mut self, inst: Instruction) {
        let a = !self.reg(inst.ra());
        let b = self.reg(inst.rb());
        let result = a.wrapping_add(b).wrapping_add(1);
        self.state
            .set_xer_ca(a == u32::MAX || helper_carry(b, a.wrapping_add(1)));
        self.finish_add(inst, a, b, result);
    }

    /// SUBFE: Subtract From Extended
    ///
    /// Format: subfe[o][.] rD, rA, rB
    /// Operation: rD = !rA + rB + CA
    pub(crate) fn op_subfe(&mut self, inst: Instruction) {
        let a = !self.reg(inst.ra());
        let b = self.reg(inst.rb());
        self.add_extended(inst, a, b);
    }

    /// SUBFME: Subtract From Minus One Extended
    ///
    /// Format: subfme[o][.] rD, rA
    /// Operation: rD = !rA + CA - 1
    pub(crate) fn op_subfme(&mut self, inst: Instruction) {
        let a = !self.reg(inst.ra());
        self.add_minus_one_extended(inst, a);
    }

    /// SUBFZE: Subtract From Zero Extended
    ///
    /// Format: subfze[o][.] rD, rA
    /// Operation: rD = !rA + CA
    pub(crate) fn op_subfze(&mut self, inst: Instruction) {
        let a = !self.reg(inst.ra());
        self.add_zero_extended(inst, a);
    }

    /// NEG: Negate
    ///
    /// Format: neg[o][.] rD, rA
    /// Operation: rD = !rA + 1
    ///
    /// Overflows only for 0x80000000, whose negation is itself.
    pub(crate) fn op_neg(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        let result = (!a).wrapping_add(1);
        self.set_reg(inst.rd(), result);
        if inst.oe() {
            self.state.set_xer_ov(a == 0x8000_0000);
        }
        if inst.rc() {
            self.state.update_cr0(result);
        }
    }

    /// rD = a + b + CA with CA, OV and CR0 updates
    fn add_extended(&mut self, inst: Instruction, a: u32, b: u32) {
        let carry = self.state.xer_ca();
        let sum = a.wrapping_add(b);
        let result = sum.wrapping_add(carry as u32);
        self.state
            .set_xer_ca(helper_carry(a, b) || (carry && helper_carry(sum, 1)));
        self.finish_add(inst, a, b, result);
    }

    /// rD = a + CA - 1
    ///
    /// CA is the carry of `a + (CA - 1)`, so an incoming carry never
    /// carries out.
    fn add_minus_one_extended(&mut self, inst: Instruction, a: u32) {
        let carry = self.state.xer_ca() as u32;
        let addend = carry.wrapping_sub(1);
        let result = a.wrapping_add(addend);
        self.state.set_xer_ca(helper_carry(a, addend));
        self.finish_add(inst, a, 0xFFFF_FFFF, result);
    }

    /// rD = a + CA
    fn add_zero_extended(&mut self, inst: Instruction, a: u32) {
        let carry = self.state.xer_ca() as u32;
        let result = a.wrapping_add(carry);
        self.state.set_xer_ca(helper_carry(a, carry));
        self.finish_add(inst, a, 0, result);
    }

    /// Store an addition result, then apply OE and Rc
    ///
    /// OV is recorded before CR0 so that CR0.SO sees an overflow produced by
    /// this instruction.
    #[inline(always)]
    fn finish_add(&mut self, inst: Instruction, a: u32, b: u32, result: u32) {
        self.set_reg(inst.rd(), result);
        if inst.oe() {
            self.state.set_xer_ov(helper_overflow(a, b, result));
        }
        if inst.rc() {
            self.state.update_cr0(result);
        }
    }
}
