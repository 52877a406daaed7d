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

//! Processor Interface (PI)
//!
//! The PI collects interrupt requests from every hardware block and drives the
//! CPU's external interrupt line. It also owns the CPU-side command FIFO
//! pointers and the reset-code register.
//!
//! ## Registers
//!
//! Offsets from `0x0C003000` (physical) / `0xCC003000` (uncached logical):
//!
//! ```text
//! Offset | Name         | Access | Notes
//! -------|--------------|--------|-------------------------------------
//! 0x00   | INT_CAUSE    | R/W1C  | writing 1 clears the bit
//! 0x04   | INT_MASK     | R/W    | write replaces
//! 0x0C   | FIFO_BASE    | R/W    | low 5 bits forced to 0
//! 0x10   | FIFO_END     | R/W    | low 5 bits forced to 0
//! 0x14   | FIFO_WPTR    | R/W    | low 5 bits forced to 0
//! 0x18   | FIFO_RESET   | W      | bit 0 resets the gather pipe
//! 0x24   | RESET_CODE   | R/W    | bit 2 clear resets the drive (GameCube)
//! 0x2C   | FLIPPER_REV  | R      | 0x246500B1
//! ```
//!
//! 16-bit reads return the upper half at `+0` and the lower half at `+2`.
//! 16-bit writes are rejected.
//!
//! ## Interrupt line
//!
//! The line is asserted while `cause & mask != 0`. The reset button cause is
//! a level that reads 1 while the button is *released*.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bitflags::bitflags;
use crossbeam_channel::Sender;

use crate::core::error::{EmulatorError, Result};
use crate::core::gather_pipe::GatherPipe;
use crate::core::memory::IODevice;
use crate::core::save_state::{InterruptState, StateSave};
use crate::core::timing::{EventHandle, EventScheduler, TimingEventManager, TriggeredEvent};

/// Physical base address of the PI register block
pub const PI_BASE: u32 = 0x0C00_3000;

/// Hardware revision reported by FLIPPER_REV
pub const FLIPPER_REV_C: u32 = 0x2465_00B1;

/// Register offsets from [`PI_BASE`]
pub mod regs {
    pub const INTERRUPT_CAUSE: u32 = 0x00;
    pub const INTERRUPT_MASK: u32 = 0x04;
    pub const FIFO_BASE: u32 = 0x0C;
    pub const FIFO_END: u32 = 0x10;
    pub const FIFO_WPTR: u32 = 0x14;
    pub const FIFO_RESET: u32 = 0x18;
    pub const RESET_CODE: u32 = 0x24;
    pub const FLIPPER_REV: u32 = 0x2C;
}

/// FIFO pointer registers keep 32-byte alignment
const FIFO_POINTER_MASK: u32 = 0xFFFF_FFE0;

bitflags! {
    /// Interrupt cause bits (INT_CAUSE / INT_MASK)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterruptCause: u32 {
        /// GP runtime error
        const PI = 1 << 0;
        /// Reset switch
        const RSW = 1 << 1;
        /// DVD interface
        const DI = 1 << 2;
        /// Serial interface
        const SI = 1 << 3;
        /// External interface
        const EXI = 1 << 4;
        /// Audio streaming
        const AI = 1 << 5;
        /// DSP
        const DSP = 1 << 6;
        /// Memory interface
        const MEMORY = 1 << 7;
        /// Video interface
        const VI = 1 << 8;
        const PE_TOKEN = 1 << 9;
        const PE_FINISH = 1 << 10;
        /// Command processor FIFO
        const CP = 1 << 11;
        /// External debugger
        const DEBUG = 1 << 12;
        /// High-speed port
        const HSP = 1 << 13;
        /// Wii IPC
        const WII_IPC = 1 << 14;
        /// Reset button, set while released
        const RST_BUTTON = 1 << 16;
    }
}

/// Side effects that leave the PI for other parts of the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareEvent {
    /// Video thread must reset its view of the command FIFO
    FifoReset,
    /// Disc drive reset requested through RESET_CODE
    DriveReset,
    /// System-management firmware should see a reset button press
    ResetButtonNotify,
    /// System-management firmware should see a power button press
    PowerButtonNotify,
}

/// Timing events owned by the PI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvents {
    /// userdata 1 = pressed, 0 = released
    pub toggle_reset_button: EventHandle,
    pub notify_reset_button: EventHandle,
    pub notify_power_button: EventHandle,
}

/// Processor Interface
///
/// # Example
///
/// ```
/// use gcrx::core::interrupt::{InterruptCause, ProcessorInterface};
///
/// let (sender, _receiver) = crossbeam_channel::unbounded();
/// let mut pi = ProcessorInterface::new(false, sender);
///
/// pi.set_interrupt(InterruptCause::SI, true);
/// assert!(!pi.is_pending());
///
/// pi.write_mask(InterruptCause::SI.bits());
/// assert!(pi.is_pending());
///
/// // Write 1 to clear
/// pi.write_cause(InterruptCause::SI.bits());
/// assert!(!pi.is_pending());
/// ```
pub struct ProcessorInterface {
    /// INT_CAUSE
    cause: u32,

    /// INT_MASK
    mask: u32,

    /// Cached `cause & mask != 0`
    pending: bool,

    fifo_base: u32,
    fifo_end: u32,
    fifo_write_pointer: u32,
    reset_code: u32,

    /// Wii consoles have no drive reset through RESET_CODE
    wii: bool,

    gather_pipe: Option<Rc<RefCell<GatherPipe>>>,
    events: Sender<HardwareEvent>,
    button_events: Option<ButtonEvents>,
}

impl ProcessorInterface {
    /// Create a PI in its power-on state
    ///
    /// INT_CAUSE starts as reset button (released) | VI, everything else 0.
    pub fn new(wii: bool, events: Sender<HardwareEvent>) -> Self {
        let mut pi = Self {
            cause: 0,
            mask: 0,
            pending: false,
            fifo_base: 0,
            fifo_end: 0,
            fifo_write_pointer: 0,
            reset_code: 0,
            wii,
            gather_pipe: None,
            events,
            button_events: None,
        };
        pi.reset();
        pi
    }

    /// Return to the power-on state (cold reset code)
    pub fn reset(&mut self) {
        self.mask = 0;
        self.cause = (InterruptCause::RST_BUTTON | InterruptCause::VI).bits();
        self.fifo_base = 0;
        self.fifo_end = 0;
        self.fifo_write_pointer = 0;
        self.reset_code = 0;
        self.update_pending();
    }

    /// Attach the gather pipe reset by FIFO_RESET
    pub fn set_gather_pipe(&mut self, pipe: Rc<RefCell<GatherPipe>>) {
        self.gather_pipe = Some(pipe);
    }

    /// Register the button timing events
    pub fn register_events(&mut self, timing: &mut TimingEventManager) -> ButtonEvents {
        let events = ButtonEvents {
            toggle_reset_button: timing.register_event("ToggleResetButton"),
            notify_reset_button: timing.register_event("IOSNotifyResetButton"),
            notify_power_button: timing.register_event("IOSNotifyPowerButton"),
        };
        self.button_events = Some(events);
        log::debug!("PI: Timing events registered");
        events
    }

    /// Handles of the registered button events
    pub fn button_events(&self) -> Option<ButtonEvents> {
        self.button_events
    }

    /// Handle triggered button events
    pub fn process_events(&mut self, triggered: &[TriggeredEvent]) {
        let Some(handles) = self.button_events else {
            return;
        };
        for event in triggered {
            if event.handle == handles.toggle_reset_button {
                self.set_reset_button(event.userdata != 0);
            } else if event.handle == handles.notify_reset_button {
                self.send(HardwareEvent::ResetButtonNotify);
            } else if event.handle == handles.notify_power_button {
                self.send(HardwareEvent::PowerButtonNotify);
            }
        }
    }

    /// Assert or clear `cause` and recompute the interrupt line
    ///
    /// Must only be called on the CPU thread. Other threads go through the
    /// timing queue (see [`ButtonTaps`]).
    pub fn set_interrupt(&mut self, cause: InterruptCause, asserted: bool) {
        let bits = cause.bits();
        if asserted && self.cause & bits == 0 {
            log::debug!("PI: setting interrupt {:?}", cause);
        }
        if !asserted && self.cause & bits != 0 {
            log::debug!("PI: clearing interrupt {:?}", cause);
        }

        if asserted {
            self.cause |= bits;
        } else {
            self.cause &= !bits;
        }
        self.update_pending();
    }

    /// Press (`true`) or release (`false`) the reset button
    pub fn set_reset_button(&mut self, pressed: bool) {
        self.set_interrupt(InterruptCause::RST_BUTTON, !pressed);
    }

    /// Whether the external interrupt line is asserted
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn read_cause(&self) -> u32 {
        self.cause
    }

    /// Acknowledge: clear every bit set in `value`
    pub fn write_cause(&mut self, value: u32) {
        self.cause &= !value;
        log::trace!("PI: INT_CAUSE acknowledged 0x{:08X} -> 0x{:08X}", value, self.cause);
        self.update_pending();
    }

    pub fn read_mask(&self) -> u32 {
        self.mask
    }

    pub fn write_mask(&mut self, value: u32) {
        self.mask = value;
        log::debug!("PI: INT_MASK set to 0x{:08X}", self.mask);
        self.update_pending();
    }

    pub fn fifo_base(&self) -> u32 {
        self.fifo_base
    }

    pub fn fifo_end(&self) -> u32 {
        self.fifo_end
    }

    pub fn fifo_write_pointer(&self) -> u32 {
        self.fifo_write_pointer
    }

    /// Move the write pointer after a gather pipe burst
    ///
    /// Wraps to FIFO_BASE once it reaches FIFO_END.
    pub fn advance_fifo_write_pointer(&mut self, bytes: u32) {
        let next = self.fifo_write_pointer.wrapping_add(bytes);
        self.fifo_write_pointer = if self.fifo_end != 0 && next >= self.fifo_end {
            self.fifo_base
        } else {
            next
        };
    }

    pub fn reset_code(&self) -> u32 {
        self.reset_code
    }

    fn update_pending(&mut self) {
        self.pending = self.cause & self.mask != 0;
    }

    fn send(&self, event: HardwareEvent) {
        if self.events.send(event).is_err() {
            log::warn!("PI: dropped {:?}, no receiver", event);
        }
    }

    fn write_reset_code(&mut self, value: u32) {
        self.reset_code = value;
        log::info!("PI: wrote RESET_CODE 0x{:08X}", value);
        if !self.wii && value & 0x4 == 0 {
            self.send(HardwareEvent::DriveReset);
        }
    }

    fn write_fifo_reset(&mut self, value: u32) {
        log::info!("PI: wrote FIFO_RESET 0x{:08X}", value);
        if value & 1 == 0 {
            return;
        }
        if let Some(pipe) = &self.gather_pipe {
            pipe.borrow_mut().reset();
        }
        self.send(HardwareEvent::FifoReset);
    }

    fn reject_write(&self, offset: u32, size: u8) -> EmulatorError {
        log::warn!(
            "PI: rejected {}-bit write at offset 0x{:02X}",
            size as u32 * 8,
            offset
        );
        EmulatorError::InvalidRegisterWrite {
            device: "ProcessorInterface",
            offset,
            size,
        }
    }
}

impl IODevice for ProcessorInterface {
    fn address_range(&self) -> (u32, u32) {
        (PI_BASE, PI_BASE + 0xFFF)
    }

    fn read_register(&self, offset: u32) -> Result<u32> {
        let value = match offset {
            regs::INTERRUPT_CAUSE => self.cause,
            regs::INTERRUPT_MASK => self.mask,
            regs::FIFO_BASE => self.fifo_base,
            regs::FIFO_END => self.fifo_end,
            regs::FIFO_WPTR => self.fifo_write_pointer,
            regs::RESET_CODE => {
                log::debug!("PI: read RESET_CODE 0x{:08X}", self.reset_code);
                self.reset_code
            }
            regs::FLIPPER_REV => FLIPPER_REV_C,
            _ => {
                log::warn!("PI: read from unknown register 0x{:02X}", offset);
                0
            }
        };
        log::trace!("PI: read 0x{:02X} -> 0x{:08X}", offset, value);
        Ok(value)
    }

    fn write_register(&mut self, offset: u32, value: u32) -> Result<()> {
        log::trace!("PI: write 0x{:02X} <- 0x{:08X}", offset, value);
        match offset {
            regs::INTERRUPT_CAUSE => self.write_cause(value),
            regs::INTERRUPT_MASK => self.write_mask(value),
            regs::FIFO_BASE => self.fifo_base = value & FIFO_POINTER_MASK,
            regs::FIFO_END => self.fifo_end = value & FIFO_POINTER_MASK,
            regs::FIFO_WPTR => self.fifo_write_pointer = value & FIFO_POINTER_MASK,
            regs::FIFO_RESET => self.write_fifo_reset(value),
            regs::RESET_CODE => self.write_reset_code(value),
            regs::FLIPPER_REV => return Err(self.reject_write(offset, 4)),
            _ => log::warn!(
                "PI: write to unknown register 0x{:02X} = 0x{:08X}",
                offset,
                value
            ),
        }
        Ok(())
    }

    fn write_register16(&mut self, offset: u32, _value: u16) -> Result<()> {
        Err(self.reject_write(offset, 2))
    }

    fn write_register8(&mut self, offset: u32, _value: u8) -> Result<()> {
        Err(self.reject_write(offset, 1))
    }

    fn name(&self) -> &str {
        "ProcessorInterface"
    }
}

impl StateSave for ProcessorInterface {
    type State = InterruptState;

    fn to_state(&self) -> InterruptState {
        InterruptState {
            cause: self.cause,
            mask: self.mask,
            fifo_base: self.fifo_base,
            fifo_end: self.fifo_end,
            fifo_write_pointer: self.fifo_write_pointer,
            reset_code: self.reset_code,
        }
    }

    fn restore_from_state(&mut self, state: &InterruptState) {
        self.cause = state.cause;
        self.mask = state.mask;
        self.fifo_base = state.fifo_base;
        self.fifo_end = state.fifo_end;
        self.fifo_write_pointer = state.fifo_write_pointer;
        self.reset_code = state.reset_code;
        self.update_pending();
    }
}

/// Button presses from threads other than the CPU thread
///
/// Taps become timing events; the PI sees them on the CPU thread the next
/// time events run. Taps while the machine is not running are ignored.
#[derive(Debug, Clone)]
pub struct ButtonTaps {
    scheduler: EventScheduler,
    events: ButtonEvents,
    ticks_per_second: u64,
    running: Arc<AtomicBool>,
}

impl ButtonTaps {
    pub fn new(
        scheduler: EventScheduler,
        events: ButtonEvents,
        ticks_per_second: u64,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            scheduler,
            events,
            ticks_per_second,
            running,
        }
    }

    /// Press now, notify system management now, release half a second later
    pub fn reset_button_tap(&self) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        let half_second = (self.ticks_per_second / 2).min(i32::MAX as u64) as i32;
        self.scheduler
            .schedule_from_any_thread(self.events.toggle_reset_button, 0, 1);
        self.scheduler
            .schedule_from_any_thread(self.events.notify_reset_button, 0, 0);
        self.scheduler
            .schedule_from_any_thread(self.events.toggle_reset_button, half_second, 0);
    }

    /// Notify system management of a power button press
    pub fn power_button_tap(&self) {
        if !self.running.load(Ordering::Acquire) {
            return;
        }
        self.scheduler
            .schedule_from_any_thread(self.events.notify_power_button, 0, 0);
    }
}

#[cfg(test)]
mod tests;
