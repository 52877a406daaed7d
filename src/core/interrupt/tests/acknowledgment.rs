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

use super::*;

#[test]
fn test_cause_write_clears_written_bits() {
    let (mut pi, _events) = make_pi(false);
    pi.write_cause(0xFFFF_FFFF);
    pi.set_interrupt(InterruptCause::SI | InterruptCause::DI, true);

    pi.write_register(regs::INTERRUPT_CAUSE, InterruptCause::SI.bits())
        .unwrap();

    assert_eq!(pi.read_cause(), InterruptCause::DI.bits());
}

#[test]
fn test_cause_write_zero_is_noop() {
    let (mut pi, _events) = make_pi(false);
    let before = pi.read_cause();

    pi.write_register(regs::INTERRUPT_CAUSE, 0).unwrap();

    assert_eq!(pi.read_cause(), before);
}

#[test]
fn test_acknowledge_drops_pending_line() {
    let (mut pi, _events) = make_pi(false);
    pi.write_mask((InterruptCause::VI | InterruptCause::AI).bits());
    assert!(pi.is_pending());

    pi.write_cause(InterruptCause::VI.bits());
    assert!(!pi.is_pending());

    pi.set_interrupt(InterruptCause::AI, true);
    assert!(pi.is_pending());
    pi.write_cause(InterruptCause::AI.bits());
    assert!(!pi.is_pending());
}

#[test]
fn test_acknowledge_can_release_reset_level() {
    let (mut pi, _events) = make_pi(false);

    pi.write_cause(InterruptCause::RST_BUTTON.bits());

    assert_eq!(pi.read_cause() & InterruptCause::RST_BUTTON.bits(), 0);
}
