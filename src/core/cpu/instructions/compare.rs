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

use std::cmp::Ordering;

use super::super::decode::Instruction;
use super::super::state::{CR_EQ, CR_GT, CR_LT, CR_SO};
use super::super::CPU;

impl CPU {
    // === Compare Instructions ===

    /// CMPI: Compare Immediate (signed)
    ///
    /// Format: cmpi crfD, L, rA, SIMM
    pub(crate) fn op_cmpi(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra()) as i32;
        self.record_compare(inst.crfd(), a.cmp(&inst.simm()));
    }

    /// CMPLI: Compare Logical Immediate (unsigned)
    ///
    /// Format: cmpli crfD, L, rA, UIMM
    pub(crate) fn op_cmpli(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        self.record_compare(inst.crfd(), a.cmp(&inst.uimm()));
    }

    /// CMP: Compare (signed)
    ///
    /// Format: cmp crfD, L, rA, rB
    pub(crate) fn op_cmp(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra()) as i32;
        let b = self.reg(inst.rb()) as i32;
        self.record_compare(inst.crfd(), a.cmp(&b));
    }

    /// CMPL: Compare Logical (unsigned)
    ///
    /// Format: cmpl crfD, L, rA, rB
    pub(crate) fn op_cmpl(&mut self, inst: Instruction) {
        let a = self.reg(inst.ra());
        let b = self.reg(inst.rb());
        self.record_compare(inst.crfd(), a.cmp(&b));
    }

    fn record_compare(&mut self, crfd: usize, ordering: Ordering) {
        let mut field = match ordering {
            Ordering::Less => CR_LT,
            Ordering::Greater => CR_GT,
            Ordering::Equal => CR_EQ,
        };
        if self.state.xer_so() {
            field |= CR_SO;
        }
        self.state.cr.set_field(crfd, field);
    }
}
