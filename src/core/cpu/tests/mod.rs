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

//! CPU test modules
//!
//! Tests are organized into the following categories:
//! - `basic`: CPU initialization, reset, register access, save state
//! - `decode`: Instruction field extraction and rotate masks
//! - `arithmetic`: Add, subtract, multiply and divide
//! - `logical`: Logical, rotate and shift instructions
//! - `compare_trap`: Compares into CR fields and trap instructions
//! - `exceptions`: Exception dispatch and block execution
//! - `properties`: Carry/overflow and CR0 properties over random operands

use super::decode::Instruction;
use super::CPU;

#[cfg(test)]
mod basic;

#[cfg(test)]
mod decode;


#[cfg(test)]
mod logical;




/// D-form: opcode, rD/rS/TO, rA, 16-bit immediate
pub(super) fn d_form(opcd: u32, rd: u32, ra: u32, imm: u16) -> u32 {
    (opcd << 26) | (rd << 21) | (ra << 16) | imm as u32
}

/// XO-form (opcode 31): rD, rA, rB, OE, 9-bit extended opcode, Rc
pub(super) fn xo_form(rd: u32, ra: u32, rb: u32, oe: bool, xo: u32, rc: bool) -> u32 {
    (31 << 26) | (rd << 21) | (ra << 16) | (rb << 11) | ((oe as u32) << 10) | (xo << 1) | rc as u32
}

/// X-form (opcode 31): rS/rD, rA, rB, 10-bit extended opcode, Rc
pub(super) fn x_form(rs: u32, ra: u32, rb: u32, xo: u32, rc: bool) -> u32 {
    (31 << 26) | (rs << 21) | (ra << 16) | (rb << 11) | (xo << 1) | rc as u32
}

/// M-form: opcode, rS, rA, SH/rB, MB, ME, Rc
pub(super) fn m_form(opcd: u32, rs: u32, ra: u32, sh: u32, mb: u32, me: u32, rc: bool) -> u32 {
    (opcd << 26) | (rs << 21) | (ra << 16) | (sh << 11) | (mb << 6) | (me << 1) | rc as u32
}

/// Execute one instruction word without going through memory
pub(super) fn exec(cpu: &mut CPU, word: u32) {
    cpu.execute_instruction(Instruction(word));
}
