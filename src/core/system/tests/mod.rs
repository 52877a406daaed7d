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

//! System module tests
//!
//! Frames are shortened to 2000 ticks so whole frames run quickly.


use super::*;
use crate::core::interrupt::InterruptCause;

const CODE: u32 = 0x8000_3100;
const NOP: u32 = 0x6000_0000;

fn test_config() -> EmulatorConfig {
    EmulatorConfig {
        fastmem: false,
        cpu_clock_hz: Some(120_000),
        frame_rate: 60,
        ..Default::default()
    }
}

fn test_system() -> System {
    System::new(test_config()).unwrap()
}

fn to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Load `words` at [`CODE`] and start there
fn load_words(system: &mut System, words: &[u32]) {
    system.load_program(&to_bytes(words), CODE, CODE).unwrap();
}

/// `count` no-ops at [`CODE`]
fn load_nops(system: &mut System, count: usize) {
    load_words(system, &vec![NOP; count]);
}

/// Two plausible stack frames above r1
fn build_stack(system: &mut System) {
    let sp = system.cpu().reg(1);
    let back_chain = sp + 0x100;
    let memory = system.memory_mut();
    memory.write_u32(sp, back_chain).unwrap();
    memory.write_u32(back_chain + 4, CODE).unwrap();
}
