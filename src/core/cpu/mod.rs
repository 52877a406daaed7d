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

use crate::core::memory::Memory;
use crate::core::save_state::{CpuState, StateSave};

/// CPU (PowerPC 750CL "Gekko"/"Broadway") integer interpreter
///
/// # Specifications
/// - Architecture: 32-bit PowerPC, big-endian
/// - Registers: 32 GPRs, CR, XER, MSR, SRR0/SRR1
/// - Scope: fixed-point arithmetic, logical, rotate/shift, compare and trap
///
/// # Example
/// ```
/// use gcrx::core::cpu::CPU;
///
/// let mut cpu = CPU::new();
/// cpu.set_reg(3, 42);
/// assert_eq!(cpu.reg(3), 42);
/// ```
pub struct CPU {
    /// Architectural state
    pub state: PowerPcState,

    /// Set by instructions that must end the current block (traps)
    end_block: bool,

    /// Current instruction (for debugging)
    current_instruction: u32,
}

// Module declarations
mod decode;
mod instructions;
mod state;
#[cfg(test)]
mod tests;

// Re-exports
pub use decode::{rotate_mask, Instruction};
pub use instructions::{helper_carry, helper_overflow};
pub use state::{
    ConditionRegister, Exceptions, Msr, PowerPcState, ProgramExceptionCause, Xer, CR_EQ, CR_GT,
    CR_LT, CR_SO,
};

/// SRR1 keeps these MSR bits on exception entry
const SRR1_MSR_MASK: u32 = 0x87C0_FFFF;

/// MSR bits cleared on exception entry
const MSR_CLEAR_ON_EXCEPTION: u32 = 0x0004_EF36;

/// SRR1 bit flagging an instruction fetch fault
const SRR1_ISI_FETCH: u32 = 1 << 30;

mod vector {
    pub const DSI: u32 = 0x0000_0300;
    pub const ISI: u32 = 0x0000_0400;
    pub const EXTERNAL: u32 = 0x0000_0500;
    pub const ALIGNMENT: u32 = 0x0000_0600;
    pub const PROGRAM: u32 = 0x0000_0700;
    pub const FPU_UNAVAILABLE: u32 = 0x0000_0800;
    pub const DECREMENTER: u32 = 0x0000_0900;
    pub const SYSCALL: u32 = 0x0000_0C00;
}

impl CPU {
    /// Create a new CPU with all registers cleared and PC at 0
    pub fn new() -> Self {
        Self {
            state: PowerPcState::new(),
            end_block: false,
            current_instruction: 0,
        }
    }

    /// Reset CPU to power-on state
    pub fn reset(&mut self) {
        self.state = PowerPcState::new();
        self.end_block = false;
        self.current_instruction = 0;
    }

    /// Read a general purpose register
    ///
    /// r0 is an ordinary register. Only `addi`/`addis` treat an
    /// RA field of 0 as the literal value 0.
    #[inline(always)]
    pub fn reg(&self, index: usize) -> u32 {
        self.state.gpr[index]
    }

    /// Write a general purpose register
    #[inline(always)]
    pub fn set_reg(&mut self, index: usize, value: u32) {
        self.state.gpr[index] = value;
    }

    /// Get current PC value
    pub fn pc(&self) -> u32 {
        self.state.pc
    }

    /// Point execution at `addr`
    ///
    /// Between instructions NPC equals PC, so an interrupt taken before the
    /// next step returns to `addr`.
    pub fn set_pc(&mut self, addr: u32) {
        self.state.pc = addr;
        self.state.npc = addr;
    }

    /// Whether the last instruction asked to end the current block
    pub fn block_ended(&self) -> bool {
        self.end_block
    }

    /// Last fetched instruction word
    pub fn current_instruction(&self) -> u32 {
        self.current_instruction
    }

    /// Execute one instruction
    ///
    /// 1. NPC = PC + 4
    /// 2. Fetch from `memory`; a fetch fault raises ISI
    /// 3. Execute
    /// 4. Dispatch any exception the instruction raised
    /// 5. PC = NPC
    ///
    /// # Returns
    ///
    /// Number of cycles consumed (currently always 1)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gcrx::core::cpu::CPU;
    /// use gcrx::core::memory::Memory;
    ///
    /// let mut memory = Memory::new(false, false).unwrap();
    /// memory.write_u32(0x8000_0000, 0x3860_0005).unwrap(); // li r3, 5
    ///
    /// let mut cpu = CPU::new();
    /// cpu.set_pc(0x8000_0000);
    /// assert_eq!(cpu.step(&memory), 1);
    /// assert_eq!(cpu.reg(3), 5);
    /// ```
    pub fn step(&mut self, memory: &Memory) -> u32 {
        self.state.npc = self.state.pc.wrapping_add(4);

        match memory.read_instruction(self.state.pc) {
            Ok(word) => {
                self.current_instruction = word;
                self.execute_instruction(Instruction(word));
            }
            Err(e) => {
                log::warn!("CPU: instruction fetch at 0x{:08X} failed: {}", self.state.pc, e);
                self.state.exceptions |= Exceptions::ISI;
            }
        }

        if !self.state.exceptions.is_empty() {
            self.check_exceptions();
        }
        self.state.pc = self.state.npc;
        1
    }

    /// Run up to `max_instructions`, stopping early when an instruction ends
    /// the block
    ///
    /// # Returns
    ///
    /// Number of cycles consumed
    pub fn execute_block(&mut self, memory: &Memory, max_instructions: u32) -> u32 {
        self.end_block = false;
        let mut cycles = 0;
        while cycles < max_instructions {
            cycles += self.step(memory);
            if self.end_block {
                break;
            }
        }
        cycles
    }

    /// Raise a program exception of kind `cause`
    ///
    /// The exception stays pending until [`check_exceptions`](Self::check_exceptions).
    pub fn generate_program_exception(&mut self, cause: ProgramExceptionCause) {
        self.state.program_cause = Some(cause);
        self.state.exceptions |= Exceptions::PROGRAM;
    }

    /// Assert or clear the external interrupt line
    pub fn set_external_interrupt(&mut self, asserted: bool) {
        self.state.exceptions.set(Exceptions::EXTERNAL_INT, asserted);
    }

    /// Dispatch the highest-priority pending exception
    ///
    /// Synchronous exceptions are taken unconditionally, in the order ISI,
    /// program, syscall, FPU unavailable, DSI, alignment. External interrupt and
    /// decrementer follow and are only taken while MSR.EE is set.
    ///
    /// # Details
    ///
    /// - SRR0: address of the faulting instruction, or of the next
    ///   instruction for syscall and the asynchronous exceptions
    /// - SRR1: MSR & 0x87C0FFFF, plus the program cause where relevant
    /// - MSR.LE takes MSR.ILE; bits 0x04EF36 (EE, PR, IR, DR, ...) are cleared
    /// - PC and NPC both jump to the vector
    pub fn check_exceptions(&mut self) {
        let exceptions = self.state.exceptions;
        let pc = self.state.pc;
        let npc = self.state.npc;

        if exceptions.contains(Exceptions::ISI) {
            self.enter_exception(Exceptions::ISI, vector::ISI, pc, SRR1_ISI_FETCH);
        } else if exceptions.contains(Exceptions::PROGRAM) {
            let cause = self
                .state
                .program_cause
                .take()
                .unwrap_or(ProgramExceptionCause::IllegalInstruction);
            self.enter_exception(Exceptions::PROGRAM, vector::PROGRAM, pc, cause.srr1_bits());
        } else if exceptions.contains(Exceptions::SYSCALL) {
            self.enter_exception(Exceptions::SYSCALL, vector::SYSCALL, npc, 0);
        } else if exceptions.contains(Exceptions::FPU_UNAVAILABLE) {
            self.enter_exception(Exceptions::FPU_UNAVAILABLE, vector::FPU_UNAVAILABLE, pc, 0);
        } else if exceptions.contains(Exceptions::DSI) {
            self.enter_exception(Exceptions::DSI, vector::DSI, pc, 0);
        } else if exceptions.contains(Exceptions::ALIGNMENT) {
            self.enter_exception(Exceptions::ALIGNMENT, vector::ALIGNMENT, pc, 0);
        } else {
            self.check_external_exceptions();
        }
    }

    /// Take a pending external interrupt or decrementer if MSR.EE allows it
    pub fn check_external_exceptions(&mut self) {
        if !self.state.msr.contains(Msr::EE) {
            return;
        }
        let exceptions = self.state.exceptions;
        let npc = self.state.npc;

        if exceptions.contains(Exceptions::EXTERNAL_INT) {
            // The line stays asserted until the interrupt source is cleared.
            self.enter_exception(Exceptions::empty(), vector::EXTERNAL, npc, 0);
        } else if exceptions.contains(Exceptions::DECREMENTER) {
            self.enter_exception(Exceptions::DECREMENTER, vector::DECREMENTER, npc, 0);
        }
    }

    fn enter_exception(&mut self, taken: Exceptions, vector: u32, srr0: u32, srr1_extra: u32) {
        let state = &mut self.state;
        state.srr0 = srr0;
        state.srr1 = (state.msr.bits() & SRR1_MSR_MASK) | srr1_extra;

        let ile = state.msr.contains(Msr::ILE);
        state.msr.set(Msr::LE, ile);
        state.msr = Msr::from_bits_retain(state.msr.bits() & !MSR_CLEAR_ON_EXCEPTION);

        log::debug!(
            "CPU: exception vector=0x{:04X} SRR0=0x{:08X} SRR1=0x{:08X} instruction=0x{:08X}",
            vector,
            srr0,
            state.srr1,
            self.current_instruction
        );

        state.pc = vector;
        state.npc = vector;
        state.exceptions.remove(taken);
    }

    /// Dump all CPU registers for debugging
    pub fn dump_registers(&self) {
        let state = &self.state;
        println!("CPU Registers:");
        println!("PC: 0x{:08X}  NPC: 0x{:08X}", state.pc, state.npc);
        println!(
            "CR: 0x{:08X}  XER: 0x{:08X}  MSR: 0x{:08X}",
            state.cr.get(),
            state.xer.get(),
            state.msr.bits()
        );
        println!("SRR0: 0x{:08X}  SRR1: 0x{:08X}", state.srr0, state.srr1);
        println!();

        for i in 0..32 {
            if i % 4 == 0 && i > 0 {
                println!();
            }
            print!("r{:2}: 0x{:08X}  ", i, self.reg(i));
        }
        println!();
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}

impl StateSave for CPU {
    type State = CpuState;

    fn to_state(&self) -> CpuState {
        let state = &self.state;
        CpuState {
            gpr: state.gpr,
            cr: state.cr.get(),
            xer: state.xer.get(),
            pc: state.pc,
            npc: state.npc,
            msr: state.msr.bits(),
            srr0: state.srr0,
            srr1: state.srr1,
            exceptions: state.exceptions.bits(),
            program_cause: state.program_cause.map(ProgramExceptionCause::srr1_bits),
        }
    }

    fn restore_from_state(&mut self, saved: &CpuState) {
        let state = &mut self.state;
        state.gpr = saved.gpr;
        state.cr.set(saved.cr);
        state.xer.set(saved.xer);
        state.pc = saved.pc;
        state.npc = saved.npc;
        state.msr = Msr::from_bits_retain(saved.msr);
        state.srr0 = saved.srr0;
        state.srr1 = saved.srr1;
        state.exceptions = Exceptions::from_bits_truncate(saved.exceptions);
        state.program_cause = saved
            .program_cause
            .and_then(ProgramExceptionCause::from_srr1_bits);
        self.end_block = false;
    }
}
