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
    // === Shift Instructions ===
    //
    // Register shift amounts use the low 6 bits of rB. Amounts 32..=63 shift
    // everything out.

    /// SLW: Shift Left Word
    ///
    /// Format: slw[.] rA, rS, rB
    pub(crate) fn op_slw(&mut self, inst: Instruction) {
        let amount = self.reg(inst.rb());
        let result = if amount & 0x20 != 0 {
            0
        } else {
            self.reg(inst.rs()) << (amount & 0x1F)
        };
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// SRW: Shift Right Word (logical)
    ///
    /// Format: srw[.] rA, rS, rB
    pub(crate) fn op_srw(&mut self, inst: Instruction) {
        let amount = self.reg(inst.rb());
        let result = if amount & 0x20 != 0 {
            0
        } else {
            self.reg(inst.rs()) >> (amount & 0x1F)
        };
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// SRAW: Shift Right Algebraic Word
    ///
    /// Format: sraw[.] rA, rS, rB
    ///
    /// CA is set when the source is negative and any 1 bits were shifted out.
    pub(crate) fn op_sraw(&mut self, inst: Instruction) {
        let amount = self.reg(inst.rb());
        let source = self.reg(inst.rs()) as i32;

        if amount & 0x20 != 0 {
            let negative = source < 0;
            let result = if negative { 0xFFFF_FFFF } else { 0 };
            self.state.set_xer_ca(negative);
            self.set_reg_rc(inst.ra(), result, inst);
        } else {
            self.shift_right_algebraic(inst, source, amount & 0x1F);
        }
    }

    /// SRAWI: Shift Right Algebraic Word Immediate
    ///
    /// Format: srawi[.] rA, rS, SH
    pub(crate) fn op_srawi(&mut self, inst: Instruction) {
        let source = self.reg(inst.rs()) as i32;
        self.shift_right_algebraic(inst, source, inst.sh());
    }

    fn shift_right_algebraic(&mut self, inst: Instruction, source: i32, amount: u32) {
        let result = (source >> amount) as u32;
        let lost_bits = amount > 0 && (source as u32) << (32 - amount) != 0;
        self.state.set_xer_ca(source < 0 && lost_bits);
        self.set_reg_rc(inst.ra(), result, inst);
    }
}
