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

//! Assertions over a running `System`

use gcrx::core::interrupt::InterruptCause;
use gcrx::core::System;

pub fn assert_gpr(system: &System, reg: usize, expected: u32) {
    let actual = system.cpu().reg(reg);
    assert_eq!(
        actual, expected,
        "r{} mismatch after {} cycles: expected 0x{:08X}, got 0x{:08X}",
        reg,
        system.cycles(),
        expected,
        actual
    );
}

/// Assert execution resumes at `expected` on the next step
pub fn assert_resumes_at(system: &System, expected: u32) {
    let actual = system.pc();
    assert_eq!(
        actual, expected,
        "next instruction mismatch at frame {}: expected 0x{:08X}, got 0x{:08X}",
        system.frame_count(),
        expected,
        actual
    );
}

/// Assert the big-endian guest word at `addr`
pub fn assert_guest_word(system: &System, addr: u32, expected: u32) {
    let actual = system
        .memory()
        .read_u32(addr)
        .unwrap_or_else(|e| panic!("read of 0x{:08X} failed: {}", addr, e));
    assert_eq!(
        actual, expected,
        "guest word at 0x{:08X} mismatch: expected 0x{:08X}, got 0x{:08X}",
        addr, expected, actual
    );
}

/// Assert whether `cause` is set in the PI interrupt cause register
pub fn assert_cause(system: &System, cause: InterruptCause, set: bool) {
    let register = system.processor_interface().borrow().read_cause();
    assert_eq!(
        register & cause.bits() != 0,
        set,
        "{:?} expected {} in cause 0x{:08X}",
        cause,
        if set { "set" } else { "clear" },
        register
    );
}
