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

//! Timing Event System
//!
//! A single tick counter drives every component. Components register named
//! event types once and then schedule *occurrences* of them at a tick offset,
//! optionally carrying a `u64` of userdata. [`TimingEventManager::run_events`]
//! advances time and returns the occurrences that came due, oldest first.
//!
//! # Threads
//!
//! The manager itself lives on the CPU thread. Other threads schedule through
//! an [`EventScheduler`], a cloneable sender whose requests are folded into
//! the queue at the start of the next `run_events` call. That keeps every
//! mutation of CPU-side state on the CPU thread.
//!
//! # Example
//!
//! ```
//! use gcrx::core::timing::TimingEventManager;
//!
//! let mut timing = TimingEventManager::new();
//! let event = timing.register_event("Test Event");
//! timing.schedule_event(event, 1000, 7);
//!
//! timing.pending_ticks = 1000;
//! let triggered = timing.run_events();
//! assert_eq!(triggered[0].handle, event);
//! assert_eq!(triggered[0].userdata, 7);
//! ```

use crossbeam_channel::{Receiver, Sender};

/// Tick count type (relative time in CPU cycles)
pub type TickCount = i32;

/// Global tick counter type (absolute time in CPU cycles since reset)
pub type GlobalTicks = u64;

/// Event handle (identifier for registered events)
pub type EventHandle = usize;

/// A registered event type
#[derive(Debug)]
pub struct TimingEvent {
    /// Event ID (handle)
    pub id: EventHandle,

    /// Event name (for debugging)
    pub name: &'static str,
}

/// One queued occurrence of an event
#[derive(Debug, Clone, Copy)]
struct Occurrence {
    handle: EventHandle,
    userdata: u64,
    run_time: GlobalTicks,
}

/// An occurrence returned by [`TimingEventManager::run_events`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggeredEvent {
    pub handle: EventHandle,
    pub userdata: u64,
    /// How far past its due time the occurrence was delivered
    pub ticks_late: TickCount,
}

#[derive(Debug, Clone, Copy)]
struct ScheduleRequest {
    handle: EventHandle,
    ticks: TickCount,
    userdata: u64,
}

/// Thread-safe handle for scheduling events onto the CPU thread
#[derive(Debug, Clone)]
pub struct EventScheduler {
    sender: Sender<ScheduleRequest>,
}

impl EventScheduler {
    /// Queue an occurrence `ticks` after the point where the CPU thread next
    /// picks up cross-thread requests
    pub fn schedule_from_any_thread(&self, handle: EventHandle, ticks: TickCount, userdata: u64) {
        let request = ScheduleRequest {
            handle,
            ticks,
            userdata,
        };
        if self.sender.send(request).is_err() {
            log::warn!("Timing: dropped cross-thread event {} (manager gone)", handle);
        }
    }
}

/// Timing Event Manager
///
/// - Global tick counter tracks absolute time
/// - Pending ticks accumulate CPU cycles between event checks
/// - Downcount is the distance to the next queued occurrence
/// - Occurrences are kept sorted by run time, ties in scheduling order
#[derive(Debug)]
pub struct TimingEventManager {
    /// Global tick counter (absolute time since reset)
    pub global_tick_counter: GlobalTicks,

    /// Tick counter at last event run
    pub event_run_tick_counter: GlobalTicks,

    /// Pending ticks (accumulated since last event run)
    pub pending_ticks: TickCount,

    /// Downcount (cycles until next event)
    pub downcount: TickCount,

    /// Registered events
    events: Vec<TimingEvent>,

    /// Queued occurrences, sorted by run time
    queue: Vec<Occurrence>,

    /// Frame target for execution control
    frame_target: Option<GlobalTicks>,

    sender: Sender<ScheduleRequest>,
    receiver: Receiver<ScheduleRequest>,
}

impl TimingEventManager {
    /// Create a new timing event manager
    ///
    /// ```
    /// use gcrx::core::timing::TimingEventManager;
    ///
    /// let timing = TimingEventManager::new();
    /// assert_eq!(timing.global_tick_counter, 0);
    /// assert_eq!(timing.pending_ticks, 0);
    /// ```
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            global_tick_counter: 0,
            event_run_tick_counter: 0,
            pending_ticks: 0,
            downcount: i32::MAX,
            events: Vec::new(),
            queue: Vec::new(),
            frame_target: None,
            sender,
            receiver,
        }
    }

    /// Register a new event type
    pub fn register_event(&mut self, name: &'static str) -> EventHandle {
        let handle = self.events.len();
        self.events.push(TimingEvent { id: handle, name });
        handle
    }

    /// Name of a registered event
    pub fn event_name(&self, handle: EventHandle) -> Option<&'static str> {
        self.events.get(handle).map(|e| e.name)
    }

    /// Cloneable, `Send` handle for scheduling from other threads
    pub fn scheduler(&self) -> EventScheduler {
        EventScheduler {
            sender: self.sender.clone(),
        }
    }

    /// (Re)schedule an event `ticks` from now
    ///
    /// Any occurrences of the event already in the queue are dropped first,
    /// so the event fires exactly once at the new time.
    pub fn schedule(&mut self, handle: EventHandle, ticks: TickCount) {
        self.queue.retain(|o| o.handle != handle);
        self.schedule_event(handle, ticks, 0);
    }

    /// Add an occurrence of an event `ticks` from now
    ///
    /// Unlike [`schedule`](Self::schedule) this keeps existing occurrences,
    /// so the same event can be pending several times with different
    /// userdata.
    pub fn schedule_event(&mut self, handle: EventHandle, ticks: TickCount, userdata: u64) {
        if handle >= self.events.len() {
            log::warn!("Timing: schedule of unknown event {}", handle);
            return;
        }
        let run_time = self.get_current_time() + ticks.max(0) as GlobalTicks;
        self.insert(Occurrence {
            handle,
            userdata,
            run_time,
        });
        self.update_downcount();
    }

    /// Whether any occurrence of the event is queued
    pub fn is_scheduled(&self, handle: EventHandle) -> bool {
        self.queue.iter().any(|o| o.handle == handle)
    }

    /// Current time including ticks not yet folded into the global counter
    #[inline]
    pub fn get_current_time(&self) -> GlobalTicks {
        self.global_tick_counter + self.pending_ticks.max(0) as GlobalTicks
    }

    fn insert(&mut self, occurrence: Occurrence) {
        let index = self
            .queue
            .partition_point(|o| o.run_time <= occurrence.run_time);
        self.queue.insert(index, occurrence);
    }

    /// Update downcount to the next occurrence's run time
    pub fn update_downcount(&mut self) {
        self.downcount = match self.queue.first() {
            Some(next) => {
                let cycles = next.run_time.saturating_sub(self.global_tick_counter);
                cycles.min(i32::MAX as u64) as i32
            }
            None => i32::MAX,
        };
    }

    /// Take requests sent from other threads
    fn move_events(&mut self) {
        while let Ok(request) = self.receiver.try_recv() {
            self.schedule_event(request.handle, request.ticks, request.userdata);
        }
    }

    /// Advance time by `pending_ticks` and return everything that came due
    ///
    /// Cross-thread requests are folded in first, relative to the current
    /// time including `pending_ticks`.
    pub fn run_events(&mut self) -> Vec<TriggeredEvent> {
        self.move_events();

        let new_global_ticks = self.event_run_tick_counter + self.pending_ticks.max(0) as GlobalTicks;
        self.pending_ticks = 0;
        self.global_tick_counter = new_global_ticks;

        let mut triggered = Vec::new();
        while self
            .queue
            .first()
            .is_some_and(|o| o.run_time <= self.global_tick_counter)
        {
            let occurrence = self.queue.remove(0);
            let ticks_late = (self.global_tick_counter - occurrence.run_time)
                .min(i32::MAX as u64) as TickCount;
            let event = &self.events[occurrence.handle];

            log::trace!(
                "Timing: Event '{}' executed (late: {} ticks)",
                event.name,
                ticks_late
            );

            triggered.push(TriggeredEvent {
                handle: occurrence.handle,
                userdata: occurrence.userdata,
                ticks_late,
            });
        }

        self.update_downcount();
        self.event_run_tick_counter = self.global_tick_counter;
        triggered
    }

    /// Stop the run loop `cycles` from now
    pub fn set_frame_target(&mut self, cycles: GlobalTicks) {
        self.frame_target = Some(self.global_tick_counter + cycles);
    }

    /// Whether the frame target has been reached
    pub fn should_exit_loop(&self) -> bool {
        self.frame_target
            .is_some_and(|target| self.global_tick_counter >= target)
    }

    /// Reset the timing system
    ///
    /// Registrations survive; queued occurrences and pending cross-thread
    /// requests are dropped.
    pub fn reset(&mut self) {
        self.global_tick_counter = 0;
        self.event_run_tick_counter = 0;
        self.pending_ticks = 0;
        self.downcount = i32::MAX;
        self.frame_target = None;
        self.queue.clear();
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Default for TimingEventManager {
    fn default() -> Self {
        Self::new()
    }
}
