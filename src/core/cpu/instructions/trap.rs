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
use super::super::{ProgramExceptionCause, CPU};

/// TO field bits
mod cond {
    pub const SIGNED_LT: u32 = 0x10;
    pub const SIGNED_GT: u32 = 0x08;
    pub const EQ: u32 = 0x04;
    pub const UNSIGNED_LT: u32 = 0x02;
    pub const UNSIGNED_GT: u32 = 0x01;
}

/// Whether any condition selected by `to` holds for `a` against `b`
fn trap_condition(to: u32, a: u32, b: u32) -> bool {
    let (sa, sb) = (a as i32, b as i32);
    (to & cond::SIGNED_LT != 0 && sa < sb)
        || (to & cond::SIGNED_GT != 0 && sa > sb)
        || (to & cond::EQ != 0 && a == b)
        || (to & cond::UNSIGNED_LT != 0 && a < b)
        || (to & cond::UNSIGNED_GT != 0 && a > b)
}

impl CPU {
    // === Trap Instructions ===

    /// TWI: Trap Word Immediate
    ///
    /// Format: twi TO, rA, SIMM
    pub(crate) fn op_twi(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        self.trap_if(inst.to(), a, inst.simm() as u32);
    }

    /// TW: Trap Word
    ///
    /// Format: tw TO, rA, rB
    ///
    /// `tw 31, 0, 0` is the unconditional `trap` idiom.
    pub(crate) fn op_tw(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        let b = self.reg(inst.rb());
        self.trap_if(inst.to(), a, b);
    }

    /// Raise and dispatch a trap right away, then end the block
    fn trap_if(&mut self, to: u32, a: u32, b: u32) {
        if !trap_condition(to, a, b) {
            return;
        }
        log::debug!(
            "CPU: trap at 0x{:08X} (TO=0x{:02X}, a=0x{:08X}, b=0x{:08X})",
            self.state.pc,
            to,
            a,
            b
        );
        self.generate_program_exception(ProgramExceptionCause::Trap);
        self.check_exceptions();
        self.end_block = true;
    }
}
