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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::interrupt::ButtonTaps;
use crate::core::patch::PatchControl;

/// Handle for driving a [`System`](super::System) from other threads
///
/// Everything here reaches the CPU thread through a queue or a lock: button
/// taps become timing events and debugger patches go through the patch
/// registry.
///
/// # Example
///
/// ```
/// use gcrx::core::{EmulatorConfig, System};
///
/// let system = System::new(EmulatorConfig {
///     fastmem: false,
///     ..Default::default()
/// })
/// .unwrap();
/// let control = system.control();
///
/// std::thread::spawn(move || control.power_button_tap())
///     .join()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ControlHandle {
    buttons: ButtonTaps,
    patches: PatchControl,
    running: Arc<AtomicBool>,
}

impl ControlHandle {
    pub(super) fn new(buttons: ButtonTaps, patches: PatchControl, running: Arc<AtomicBool>) -> Self {
        Self {
            buttons,
            patches,
            running,
        }
    }

    /// Press and release the reset button
    pub fn reset_button_tap(&self) {
        self.buttons.reset_button_tap();
    }

    pub fn power_button_tap(&self) {
        self.buttons.power_button_tap();
    }

    /// Debugger patch registry and per-frame indices
    pub fn patches(&self) -> &PatchControl {
        &self.patches
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}
