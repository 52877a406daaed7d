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

//! Test fixtures for common test scenarios

use std::path::{Path, PathBuf};

use gcrx::core::{EmulatorConfig, System};

/// Load address used by the fixtures
#[allow(dead_code)]
pub const CODE: u32 = 0x8000_3100;

/// ori r0, r0, 0
#[allow(dead_code)]
pub const NOP: u32 = 0x6000_0000;

/// A GameCube config with 2000-tick frames
#[allow(dead_code)]
pub fn test_config() -> EmulatorConfig {
    EmulatorConfig {
        fastmem: false,
        cpu_clock_hz: Some(120_000),
        frame_rate: 60,
        ..Default::default()
    }
}

/// Create a System from [`test_config`]
#[allow(dead_code)]
pub fn create_test_system() -> System {
    System::new(test_config()).expect("Failed to create system")
}

/// Big-endian image of `words`
#[allow(dead_code)]
pub fn program_image(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Load `program` at [`CODE`] and start there
#[allow(dead_code)]
pub fn load_test_program(system: &mut System, program: &[u32]) {
    system
        .load_program(&program_image(program), CODE, CODE)
        .expect("Failed to load program");
}

/// Load enough no-ops at [`CODE`] to run `frames` frames
#[allow(dead_code)]
pub fn load_nop_sled(system: &mut System, frames: u64) {
    let count = (system.ticks_per_frame() * frames + 16) as usize;
    load_test_program(system, &vec![NOP; count]);
}

/// Write a back chain and saved link register above r1 so frame patches
/// see a sane stack
#[allow(dead_code)]
pub fn build_stack(system: &mut System) {
    let sp = system.cpu().reg(1);
    let back_chain = sp + 0x100;
    let memory = system.memory_mut();
    memory
        .write_u32(sp, back_chain)
        .expect("Failed to write back chain");
    memory
        .write_u32(back_chain + 4, CODE)
        .expect("Failed to write link register");
}

/// Write `contents` to `name` inside `dir`
#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write fixture file");
    path
}
