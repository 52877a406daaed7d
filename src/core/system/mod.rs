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

//! System integration module
//!
//! This module ties together the emulated components (CPU, memory, processor
//! interface, gather pipe, patch engine) and provides the main emulation loop.
//!
//! The [`System`] lives on the CPU thread. Other threads talk to it through a
//! [`ControlHandle`] and receive [`HardwareEvent`]s from
//! [`System::hardware_events`].

mod control;

pub use control::ControlHandle;

use super::config::EmulatorConfig;
use super::cpu::{Msr, CPU};
use super::error::{EmulatorError, Result};
use super::gather_pipe::GatherPipe;
use super::interrupt::{ButtonEvents, ButtonTaps, HardwareEvent, ProcessorInterface};
use super::memory::Memory;
use super::patch::PatchEngine;
use super::save_state::{SaveState, SaveStateMetadata, StateSave};
use super::timing::{EventHandle, TickCount, TimingEventManager, TriggeredEvent};
use chrono::Utc;
use crossbeam_channel::Receiver;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Upper bound on instructions run between two event checks
const MAX_BLOCK_INSTRUCTIONS: u32 = 1000;

/// Delay before retrying frame patches that could not be applied
pub const PATCH_RETRY_TICKS: TickCount = 1000;

/// Stack pointer handed to a freshly loaded program
pub const INITIAL_STACK_POINTER: u32 = 0x816F_FFF0;

/// GameCube/Wii core system
///
/// # Components
/// - CPU: Gekko/Broadway integer interpreter
/// - Memory: arena-backed address space with MMIO routing
/// - Processor interface: interrupt routing and FIFO pointers
/// - Gather pipe: command FIFO write combining
/// - Patch engine: per-frame and debugger patches
///
/// # Example
/// ```no_run
/// use gcrx::core::{EmulatorConfig, System};
///
/// let mut system = System::new(EmulatorConfig::default()).unwrap();
/// system.load_program(&[0x38, 0x60, 0x00, 0x01], 0x8000_3100, 0x8000_3100).unwrap();
/// system.run_frame();
/// ```
pub struct System {
    config: EmulatorConfig,
    /// CPU instance
    cpu: CPU,
    /// Guest address space
    memory: Memory,
    /// Timing event manager
    timing: TimingEventManager,
    /// Processor interface (shared via Rc<RefCell> for memory-mapped access)
    pi: Rc<RefCell<ProcessorInterface>>,
    /// Gather pipe (shared via Rc<RefCell> for memory-mapped access)
    gather_pipe: Rc<RefCell<GatherPipe>>,
    patches: PatchEngine,
    hardware_events: Receiver<HardwareEvent>,
    running: Arc<AtomicBool>,
    button_events: ButtonEvents,
    patch_event: EventHandle,
    /// Ticks spent retrying since the last frame boundary
    patch_retry_ticks: u64,
    frame_count: u64,
    program_name: String,
}

impl System {
    /// Create a new System instance
    ///
    /// Builds the address space, attaches the memory-mapped devices and
    /// registers timing events. Patches named in the config are loaded and
    /// enabled.
    ///
    /// # Errors
    ///
    /// [`EmulatorError::Arena`] when guest memory cannot be allocated, or any
    /// error reading the configured patch file.
    pub fn new(config: EmulatorConfig) -> Result<Self> {
        let mut memory = Memory::new(config.wii, config.fastmem)?;

        let (event_sender, hardware_events) = crossbeam_channel::unbounded();
        let gather_pipe = Rc::new(RefCell::new(GatherPipe::new()));
        let pi = Rc::new(RefCell::new(ProcessorInterface::new(config.wii, event_sender)));
        pi.borrow_mut().set_gather_pipe(gather_pipe.clone());

        memory.register_device(pi.clone());
        memory.register_device(gather_pipe.clone());

        let mut timing = TimingEventManager::new();
        let button_events = pi.borrow_mut().register_events(&mut timing);
        let patch_event = timing.register_event("PatchEngine");

        let mut patches = PatchEngine::new();
        if let Some(path) = &config.patch_file {
            patches.load_from_file(path)?;
        }
        patches.enable_patches(&config.enabled_patches);

        log::info!(
            "System: {} core initialized ({} Hz, {} fps, fastmem {})",
            if config.wii { "Wii" } else { "GameCube" },
            config.ticks_per_second(),
            config.frame_rate,
            if memory.fastmem_base().is_some() { "on" } else { "off" }
        );

        let mut system = Self {
            config,
            cpu: CPU::new(),
            memory,
            timing,
            pi,
            gather_pipe,
            patches,
            hardware_events,
            running: Arc::new(AtomicBool::new(true)),
            button_events,
            patch_event,
            patch_retry_ticks: 0,
            frame_count: 0,
            program_name: String::new(),
        };
        system.schedule_frame_patches(system.ticks_per_frame());
        Ok(system)
    }

    /// Reset the system to initial state
    ///
    /// Clears guest memory and every component. Loaded patch definitions
    /// are kept.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.memory.clear();
        self.pi.borrow_mut().reset();
        self.gather_pipe.borrow_mut().reset();
        self.timing.reset();
        self.patch_retry_ticks = 0;
        self.frame_count = 0;
        self.program_name.clear();
        self.running.store(true, Ordering::Release);
        self.schedule_frame_patches(self.ticks_per_frame());
        log::info!("System: reset");
    }

    /// Stop accepting button taps
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        self.patches.clear();
        log::info!("System: shut down after {} frame(s)", self.frame_count);
    }

    /// Copy a program image into RAM and point the CPU at `entry`
    ///
    /// The CPU starts with address translation on and r1 at
    /// [`INITIAL_STACK_POINTER`].
    ///
    /// # Errors
    ///
    /// [`EmulatorError::ProgramTooLarge`] if the image does not fit in one
    /// RAM block starting at `load_address`.
    pub fn load_program(&mut self, image: &[u8], load_address: u32, entry: u32) -> Result<()> {
        let fits = !image.is_empty()
            && u32::try_from(image.len() - 1)
                .ok()
                .and_then(|last| load_address.checked_add(last))
                .is_some_and(|end| {
                    self.memory.is_ram_address(load_address) && self.memory.is_ram_address(end)
                });
        if !fits {
            return Err(EmulatorError::ProgramTooLarge {
                address: load_address,
                size: image.len(),
            });
        }
        self.memory.write_bytes(load_address, image)?;

        self.cpu.set_pc(entry);
        self.cpu.state.msr = Msr::DR | Msr::IR | Msr::FP;
        self.cpu.set_reg(1, INITIAL_STACK_POINTER);

        log::info!(
            "System: loaded {} bytes at 0x{:08X}, entry 0x{:08X}",
            image.len(),
            load_address,
            entry
        );
        Ok(())
    }

    /// Load a raw program image from disk
    pub fn load_program_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        load_address: u32,
        entry: u32,
    ) -> Result<()> {
        let path = path.as_ref();
        let image = std::fs::read(path)?;
        self.load_program(&image, load_address, entry)?;
        self.program_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(())
    }

    /// Execute one CPU instruction and run any events that came due
    ///
    /// # Returns
    /// Number of cycles consumed
    pub fn step(&mut self) -> u32 {
        self.cpu
            .set_external_interrupt(self.pi.borrow().is_pending());
        let cycles = self.cpu.step(&self.memory);
        self.advance(cycles);
        cycles
    }

    /// Execute `n` instructions one at a time
    pub fn step_n(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Execute one frame worth of ticks
    ///
    /// The CPU runs in blocks that end at the next timing event, at a trap,
    /// or after [`MAX_BLOCK_INSTRUCTIONS`]. The interrupt line is sampled
    /// from the processor interface before each block.
    pub fn run_frame(&mut self) {
        let ticks = self.ticks_per_frame();
        let target = self.timing.global_tick_counter + ticks;
        self.timing.set_frame_target(ticks);

        while !self.timing.should_exit_loop() {
            self.cpu
                .set_external_interrupt(self.pi.borrow().is_pending());
            let remaining = target.saturating_sub(self.timing.global_tick_counter);
            let budget = (self.timing.downcount.max(1) as u64)
                .min(remaining)
                .clamp(1, MAX_BLOCK_INSTRUCTIONS as u64) as u32;
            let cycles = self.cpu.execute_block(&self.memory, budget);
            self.advance(cycles);
        }

        self.frame_count += 1;
        log::trace!(
            "System: frame {} done at tick {}",
            self.frame_count,
            self.timing.global_tick_counter
        );
    }

    /// Run `frames` frames
    pub fn run_frames(&mut self, frames: u64) {
        for _ in 0..frames {
            self.run_frame();
        }
    }

    fn advance(&mut self, cycles: u32) {
        self.timing.pending_ticks += cycles as TickCount;
        self.flush_gather_pipe();
        let triggered = self.timing.run_events();
        self.process_events(&triggered);
    }

    fn process_events(&mut self, triggered: &[TriggeredEvent]) {
        if triggered.is_empty() {
            return;
        }
        let patch_event = self.patch_event;
        for event in triggered.iter().filter(|e| e.handle == patch_event) {
            self.on_patch_event(event.ticks_late);
        }
        self.pi.borrow_mut().process_events(triggered);
    }

    /// Frame boundary: apply patches or retry shortly
    fn on_patch_event(&mut self, ticks_late: TickCount) {
        let late = ticks_late.max(0) as u64;
        if self.patches.apply_frame_patches(&self.cpu.state, &mut self.memory) {
            let spent = self.patch_retry_ticks + late;
            self.patch_retry_ticks = 0;
            let next = self.ticks_per_frame().saturating_sub(spent).max(1);
            self.schedule_frame_patches(next);
        } else {
            self.patch_retry_ticks += PATCH_RETRY_TICKS as u64 + late;
            self.timing.schedule(self.patch_event, PATCH_RETRY_TICKS);
        }
    }

    fn schedule_frame_patches(&mut self, ticks: u64) {
        let ticks = ticks.min(TickCount::MAX as u64) as TickCount;
        self.timing.schedule(self.patch_event, ticks);
    }

    /// Copy completed gather pipe bursts to the FIFO write pointer
    fn flush_gather_pipe(&mut self) {
        let bursts = self.gather_pipe.borrow_mut().take_bursts();
        if bursts.is_empty() {
            return;
        }
        let mut pi = self.pi.borrow_mut();
        for burst in bursts {
            let target = pi.fifo_write_pointer();
            if let Err(e) = self.memory.write_bytes(target, &burst) {
                log::warn!("System: gather pipe burst to 0x{:08X} dropped: {}", target, e);
            }
            pi.advance_fifo_write_pointer(burst.len() as u32);
        }
    }

    /// Snapshot the core
    pub fn save_state(&self) -> SaveState {
        SaveState::new(
            SaveStateMetadata {
                timestamp: Utc::now(),
                program_name: self.program_name.clone(),
                frame_count: self.frame_count,
                ticks: self.timing.global_tick_counter,
                wii: self.config.wii,
            },
            self.cpu.to_state(),
            self.pi.borrow().to_state(),
            self.memory.to_state(),
        )
    }

    /// Restore a snapshot taken by [`save_state`](Self::save_state)
    ///
    /// Pending timing events are dropped; the frame patch event is
    /// rescheduled one frame ahead.
    pub fn load_state(&mut self, state: &SaveState) -> Result<()> {
        if state.metadata.wii != self.config.wii {
            return Err(EmulatorError::SaveState(format!(
                "state was saved on a {}",
                if state.metadata.wii { "Wii" } else { "GameCube" }
            )));
        }

        self.cpu.restore_from_state(&state.cpu);
        self.pi.borrow_mut().restore_from_state(&state.interrupts);
        self.memory.restore_from_state(&state.memory);
        self.gather_pipe.borrow_mut().reset();

        self.timing.reset();
        self.timing.global_tick_counter = state.metadata.ticks;
        self.timing.event_run_tick_counter = state.metadata.ticks;
        self.patch_retry_ticks = 0;
        self.frame_count = state.metadata.frame_count;
        self.program_name = state.metadata.program_name.clone();
        self.schedule_frame_patches(self.ticks_per_frame());

        log::info!(
            "System: state restored (frame {}, PC 0x{:08X})",
            self.frame_count,
            self.cpu.pc()
        );
        Ok(())
    }

    /// Cross-thread control handle
    pub fn control(&self) -> ControlHandle {
        let buttons = ButtonTaps::new(
            self.timing.scheduler(),
            self.button_events,
            self.config.ticks_per_second(),
            Arc::clone(&self.running),
        );
        ControlHandle::new(buttons, self.patches.control(), Arc::clone(&self.running))
    }

    /// Receiver for side effects the hardware asks of other threads
    pub fn hardware_events(&self) -> Receiver<HardwareEvent> {
        self.hardware_events.clone()
    }

    /// Get current PC value
    pub fn pc(&self) -> u32 {
        self.cpu.pc()
    }

    /// Total ticks since reset
    pub fn cycles(&self) -> u64 {
        self.timing.global_tick_counter
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Emulated clock rate in ticks per second
    pub fn ticks_per_second(&self) -> u64 {
        self.config.ticks_per_second()
    }

    pub fn ticks_per_frame(&self) -> u64 {
        self.config.ticks_per_frame()
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CPU {
        &mut self.cpu
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn processor_interface(&self) -> Rc<RefCell<ProcessorInterface>> {
        self.pi.clone()
    }

    pub fn gather_pipe(&self) -> Rc<RefCell<GatherPipe>> {
        self.gather_pipe.clone()
    }

    pub fn patches(&self) -> &PatchEngine {
        &self.patches
    }

    pub fn patches_mut(&mut self) -> &mut PatchEngine {
        &mut self.patches
    }

    pub fn timing(&self) -> &TimingEventManager {
        &self.timing
    }
}

#[cfg(test)]
mod tests;
