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

/// Decoded view of one 32-bit PowerPC instruction word
///
/// Bit numbering below is little-endian (bit 0 = least significant), not the
/// IBM numbering used in the architecture manuals.
///
/// D-form:  | OPCD (6) | RD (5) | RA (5) | SIMM/UIMM (16) |
/// X-form:  | OPCD (6) | RD (5) | RA (5) | RB (5) | XO (10) | Rc (1) |
/// XO-form: | OPCD (6) | RD (5) | RA (5) | RB (5) | OE (1) | XO (9) | Rc (1) |
/// M-form:  | OPCD (6) | RS (5) | RA (5) | SH (5) | MB (5) | ME (5) | Rc (1) |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction(pub u32);

impl Instruction {
    /// Raw instruction word
    #[inline(always)]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Primary opcode
    #[inline(always)]
    pub fn opcd(self) -> u32 {
        self.0 >> 26
    }

    /// Destination register
    #[inline(always)]
    pub fn rd(self) -> usize {
        ((self.0 >> 21) & 0x1F) as usize
    }

    /// Source register (same field as RD)
    #[inline(always)]
    pub fn rs(self) -> usize {
        self.rd()
    }

    #[inline(always)]
    pub fn ra(self) -> usize {
        ((self.0 >> 16) & 0x1F) as usize
    }

    #[inline(always)]
    pub fn rb(self) -> usize {
        ((self.0 >> 11) & 0x1F) as usize
    }

    /// Sign-extended 16-bit immediate
    #[inline(always)]
    pub fn simm(self) -> i32 {
        (self.0 as u16) as i16 as i32
    }

    /// Zero-extended 16-bit immediate
    #[inline(always)]
    pub fn uimm(self) -> u32 {
        self.0 & 0xFFFF
    }

    /// Shift amount for rlwinm/rlwimi/srawi
    #[inline(always)]
    pub fn sh(self) -> u32 {
        (self.0 >> 11) & 0x1F
    }

    /// Mask begin
    #[inline(always)]
    pub fn mb(self) -> u32 {
        (self.0 >> 6) & 0x1F
    }

    /// Mask end
    #[inline(always)]
    pub fn me(self) -> u32 {
        (self.0 >> 1) & 0x1F
    }

    /// Trap condition selector
    #[inline(always)]
    pub fn to(self) -> u32 {
        (self.0 >> 21) & 0x1F
    }

    /// Destination CR field for compares
    #[inline(always)]
    pub fn crfd(self) -> usize {
        ((self.0 >> 23) & 0x7) as usize
    }

    /// Overflow-enable bit of XO-form instructions
    #[inline(always)]
    pub fn oe(self) -> bool {
        (self.0 >> 10) & 1 != 0
    }

    /// Record bit: update CR0 from the result
    #[inline(always)]
    pub fn rc(self) -> bool {
        self.0 & 1 != 0
    }

    /// 10-bit extended opcode (X-form, includes OE for XO-form)
    #[inline(always)]
    pub fn subop10(self) -> u32 {
        (self.0 >> 1) & 0x3FF
    }

    /// 9-bit extended opcode (XO-form, OE stripped)
    #[inline(always)]
    pub fn subop9(self) -> u32 {
        (self.0 >> 1) & 0x1FF
    }
}

impl From<u32> for Instruction {
    fn from(word: u32) -> Self {
        Self(word)
    }
}

/// Rotate mask covering bits `mb` through `me` in IBM order
///
/// Wraps around when `mb > me`: `mask(30, 1)` covers IBM bits 30, 31, 0 and 1.
#[inline(always)]
pub fn rotate_mask(mb: u32, me: u32) -> u32 {
    let begin = u32::MAX >> (mb & 31);
    let end = 0x7FFF_FFFFu32 >> (me & 31);
    let mask = begin ^ end;
    if me < mb {
        !mask
    } else {
        mask
    }
}
