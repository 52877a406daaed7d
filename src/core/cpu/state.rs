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

//! PowerPC architectural state
//!
//! Everything an integer instruction can observe or modify lives in
//! [`PowerPcState`]: the GPR file, CR, XER, PC/NPC, MSR, SRR0/SRR1 and the
//! pending-exception set.

use bitflags::bitflags;

bitflags! {
    /// Machine State Register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Msr: u32 {
        /// Little-endian mode
        const LE = 1 << 0;
        /// Recoverable interrupt
        const RI = 1 << 1;
        /// Data address translation
        const DR = 1 << 4;
        /// Instruction address translation
        const IR = 1 << 5;
        /// Exception prefix (vectors at 0xFFF00000)
        const IP = 1 << 6;
        const FE1 = 1 << 8;
        /// Branch trace enable
        const BE = 1 << 9;
        /// Single-step trace enable
        const SE = 1 << 10;
        const FE0 = 1 << 11;
        /// Machine check enable
        const ME = 1 << 12;
        /// Floating-point available
        const FP = 1 << 13;
        /// Problem (user) state
        const PR = 1 << 14;
        /// External interrupt enable
        const EE = 1 << 15;
        /// Exception little-endian mode, copied to LE on exception entry
        const ILE = 1 << 16;
        /// Power management enable
        const POW = 1 << 18;
    }
}

bitflags! {
    /// Pending exceptions, drained by [`CPU::check_exceptions`](super::CPU::check_exceptions)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Exceptions: u32 {
        const DECREMENTER = 1 << 0;
        const SYSCALL = 1 << 1;
        const EXTERNAL_INT = 1 << 2;
        const DSI = 1 << 3;
        const ISI = 1 << 4;
        const ALIGNMENT = 1 << 5;
        const FPU_UNAVAILABLE = 1 << 6;
        const PROGRAM = 1 << 7;
    }
}

/// Program exception kind, reported in SRR1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ProgramExceptionCause {
    FloatingPoint = 1 << 20,
    IllegalInstruction = 1 << 19,
    PrivilegedInstruction = 1 << 18,
    Trap = 1 << 17,
}

impl ProgramExceptionCause {
    /// SRR1 bits for this cause
    #[inline]
    pub fn srr1_bits(self) -> u32 {
        self as u32
    }

    /// Inverse of [`srr1_bits`](Self::srr1_bits)
    pub fn from_srr1_bits(bits: u32) -> Option<Self> {
        [
            Self::FloatingPoint,
            Self::IllegalInstruction,
            Self::PrivilegedInstruction,
            Self::Trap,
        ]
        .into_iter()
        .find(|cause| cause.srr1_bits() == bits)
    }
}

/// One 4-bit CR field: LT, GT, EQ, SO from high to low
pub const CR_LT: u32 = 0b1000;
pub const CR_GT: u32 = 0b0100;
pub const CR_EQ: u32 = 0b0010;
pub const CR_SO: u32 = 0b0001;

/// Condition Register
///
/// Eight 4-bit fields packed into one word. Field 0 occupies bits 31..28.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionRegister(u32);

impl ConditionRegister {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Packed 32-bit value
    #[inline]
    pub fn get(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn set(&mut self, value: u32) {
        self.0 = value;
    }

    /// Read field `index` (0..=7)
    #[inline]
    pub fn field(&self, index: usize) -> u32 {
        (self.0 >> Self::shift(index)) & 0xF
    }

    /// Replace field `index` (0..=7) with the low 4 bits of `value`
    #[inline]
    pub fn set_field(&mut self, index: usize, value: u32) {
        let shift = Self::shift(index);
        self.0 = (self.0 & !(0xF << shift)) | ((value & 0xF) << shift);
    }

    #[inline]
    fn shift(index: usize) -> u32 {
        (7 - (index as u32 & 7)) * 4
    }
}

/// Fixed-point exception register
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Xer {
    pub so: bool,
    pub ov: bool,
    pub ca: bool,
    /// String instruction byte count (bits 6..0)
    pub byte_count: u8,
}

impl Xer {
    const SO: u32 = 1 << 31;
    const OV: u32 = 1 << 30;
    const CA: u32 = 1 << 29;

    /// Packed architectural value
    pub fn get(&self) -> u32 {
        let mut value = (self.byte_count & 0x7F) as u32;
        if self.so {
            value |= Self::SO;
        }
        if self.ov {
            value |= Self::OV;
        }
        if self.ca {
            value |= Self::CA;
        }
        value
    }

    pub fn set(&mut self, value: u32) {
        self.so = value & Self::SO != 0;
        self.ov = value & Self::OV != 0;
        self.ca = value & Self::CA != 0;
        self.byte_count = (value & 0x7F) as u8;
    }
}

/// Complete integer-unit architectural state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerPcState {
    /// General purpose registers r0-r31
    pub gpr: [u32; 32],
    pub cr: ConditionRegister,
    pub xer: Xer,
    /// Address of the instruction being executed
    pub pc: u32,
    /// Address of the next instruction
    pub npc: u32,
    pub msr: Msr,
    /// Save/restore register 0: return address for exceptions
    pub srr0: u32,
    /// Save/restore register 1: saved MSR bits plus exception detail
    pub srr1: u32,
    pub exceptions: Exceptions,
    /// Cause of the pending program exception, if any
    pub program_cause: Option<ProgramExceptionCause>,
}

impl PowerPcState {
    pub fn new() -> Self {
        Self {
            gpr: [0; 32],
            cr: ConditionRegister::default(),
            xer: Xer::default(),
            pc: 0,
            npc: 0,
            msr: Msr::empty(),
            srr0: 0,
            srr1: 0,
            exceptions: Exceptions::empty(),
            program_cause: None,
        }
    }

    #[inline(always)]
    pub fn xer_ca(&self) -> bool {
        self.xer.ca
    }

    #[inline(always)]
    pub fn set_xer_ca(&mut self, ca: bool) {
        self.xer.ca = ca;
    }

    #[inline(always)]
    pub fn xer_so(&self) -> bool {
        self.xer.so
    }

    /// Set or clear OV. Setting OV also sets the sticky SO bit.
    #[inline(always)]
    pub fn set_xer_ov(&mut self, ov: bool) {
        self.xer.ov = ov;
        if ov {
            self.xer.so = true;
        }
    }

    /// Record CR0 for `value`: LT/GT/EQ from its signed value plus XER.SO
    #[inline(always)]
    pub fn update_cr0(&mut self, value: u32) {
        let signed = value as i32;
        let mut field = if signed < 0 {
            CR_LT
        } else if signed > 0 {
            CR_GT
        } else {
            CR_EQ
        };
        if self.xer.so {
            field |= CR_SO;
        }
        self.cr.set_field(0, field);
    }
}

impl Default for PowerPcState {
    fn default() -> Self {
        Self::new()
    }
}
