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
    // === Logical Immediate ===
    //
    // Logical instructions read RS (bits 25..21) and write RA.

    /// ANDI.: AND Immediate (always records CR0)
    ///
    /// Format: andi. rA, rS, UIMM
    pub(crate) fn op_andi_rc(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) & inst.uimm();
        self.set_reg(inst.ra(), result);
        self.state.update_cr0(result);
    }

    /// ANDIS.: AND Immediate Shifted (always records CR0)
    ///
    /// Format: andis. rA, rS, UIMM
    pub(crate) fn op_andis_rc(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) & (inst.uimm() << 16);
        self.set_reg(inst.ra(), result);
        self.state.update_cr0(result);
    }

    /// ORI: OR Immediate
    ///
    /// `ori 0, 0, 0` is the canonical no-op.
    pub(crate) fn op_ori(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) | inst.uimm();
        self.set_reg(inst.ra(), result);
    }

    /// ORIS: OR Immediate Shifted
    pub(crate) fn op_oris(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) | (inst.uimm() << 16);
        self.set_reg(inst.ra(), result);
    }

    /// XORI: XOR Immediate
    pub(crate) fn op_xori(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) ^ inst.uimm();
        self.set_reg(inst.ra(), result);
    }

    /// XORIS: XOR Immediate Shifted
    pub(crate) fn op_xoris(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) ^ (inst.uimm() << 16);
        self.set_reg(inst.ra(), result);
    }

    // === Logical Register (X-form) ===

    /// AND: rA = rS & rB
    pub(crate) fn op_and(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) & self.reg(inst.rb());
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// ANDC: rA = rS & !rB
    pub(crate) fn op_andc(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) & !self.reg(inst.rb());
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// OR: rA = rS | rB
    ///
    /// `or rA, rS, rS` is the `mr` idiom.
    pub(crate) fn op_or(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) | self.reg(inst.rb());
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// ORC: rA = rS | !rB
    pub(crate) fn op_orc(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) | !self.reg(inst.rb());
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// XOR: rA = rS ^ rB
    pub(crate) fn op_xor(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) ^ self.reg(inst.rb());
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// NOR: rA = !(rS | rB)
    pub(crate) fn op_nor(&mut self, inst: Instruction) {
        let result = !(self.reg(inst.rs()) | self.reg(inst.rb()));
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// NAND: rA = !(rS & rB)
    pub(crate) fn op_nand(&mut self, inst: Instruction) {
        let result = !(self.reg(inst.rs()) & self.reg(inst.rb()));
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// EQV: rA = !(rS ^ rB)
    pub(crate) fn op_eqv(&mut self, inst: Instruction) {
        let result = !(self.reg(inst.rs()) ^ self.reg(inst.rb()));
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// EXTSB: Extend Sign Byte
    pub(crate) fn op_extsb(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) as u8 as i8 as i32 as u32;
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// EXTSH: Extend Sign Halfword
    pub(crate) fn op_extsh(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()) as u16 as i16 as i32 as u32;
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// CNTLZW: Count Leading Zeros Word (32 for zero)
    pub(crate) fn op_cntlzw(&mut self, inst: Instruction) {
        let result = self.reg(inst.rs()).leading_zeros();
        self.set_reg_rc(inst.ra(), result, inst);
    }
}
