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

use super::super::decode::{rotate_mask, Instruction};
use super::super::CPU;

impl CPU {
    // === Rotate Instructions ===

    /// RLWIMI: Rotate Left Word Immediate then Mask Insert
    ///
    /// Format: rlwimi[.] rA, rS, SH, MB, ME
    /// Operation: rA = (ROTL(rS, SH) & m) | (rA & !m)
    pub(crate) fn op_rlwimi(&mut self, inst: Instruction) {
        let mask = rotate_mask(inst.mb(), inst.me());
        let rotated = self.reg(inst.rs()).rotate_left(inst.sh());
        let result = (self.reg(inst.ra()) & !mask) | (rotated & mask);
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// RLWINM: Rotate Left Word Immediate then AND with Mask
    ///
    /// Format: rlwinm[.] rA, rS, SH, MB, ME
    /// Operation: rA = ROTL(rS, SH) & m
    ///
    /// Covers the `slwi`, `srwi`, `clrlwi` and `extrwi` idioms.
    pub(crate) fn op_rlwinm(&mut self, inst: Instruction) {
        let mask = rotate_mask(inst.mb(), inst.me());
        let result = self.reg(inst.rs()).rotate_left(inst.sh()) & mask;
        self.set_reg_rc(inst.ra(), result, inst);
    }

    /// RLWNM: Rotate Left Word then AND with Mask
    ///
    /// Format: rlwnm[.] rA, rS, rB, MB, ME
    /// Operation: rA = ROTL(rS, rB[27..31]) & m
    pub(crate) fn op_rlwnm(&mut self, inst: Instruction) {
        let mask = rotate_mask(inst.mb(), inst.me());
        let amount = self.reg(inst.rb()) & 0x1F;
        let result = self.reg(inst.rs()).rotate_left(amount) & mask;
        self.set_reg_rc(inst.ra(), result, inst);
    }
}
