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

use super::super::decode::*;
use super::*;

#[test]
fn test_decode_d_form() {
    // addi r3, r1, -8 -> 0x3861FFF8
    let inst = Instruction(0x3861FFF8);
    assert_eq!(inst.opcd(), 14);
    assert_eq!(inst.rd(), 3);
    assert_eq!(inst.ra(), 1);
    assert_eq!(inst.simm(), -8);
    assert_eq!(inst.uimm(), 0xFFF8);
}

#[test]
fn test_decode_xo_form() {
    // addo. r5, r6, r7
    let inst = Instruction(xo_form(5, 6, 7, true, 266, true));
    assert_eq!(inst.opcd(), 31);
    assert_eq!(inst.rd(), 5);
    assert_eq!(inst.ra(), 6);
    assert_eq!(inst.rb(), 7);
    assert!(inst.oe());
    assert!(inst.rc());
    assert_eq!(inst.subop9(), 266);
    assert_eq!(inst.subop10(), 266 + 512);
}

#[test]
fn test_decode_m_form() {
    // rlwinm r4, r3, 8, 16, 23
    let inst = Instruction(m_form(21, 3, 4, 8, 16, 23, false));
    assert_eq!(inst.rs(), 3);
    assert_eq!(inst.ra(), 4);
    assert_eq!(inst.sh(), 8);
    assert_eq!(inst.mb(), 16);
    assert_eq!(inst.me(), 23);
    assert!(!inst.rc());
}

#[test]
fn test_decode_compare_and_trap_fields() {
    // cmpwi cr6, r3, 0 -> 0x2F030000
    let inst = Instruction(0x2F03_0000);
    assert_eq!(inst.opcd(), 11);
    assert_eq!(inst.crfd(), 6);
    assert_eq!(inst.ra(), 3);

    // tw 31, 0, 0 -> 0x7FE00008
    let trap = Instruction(0x7FE0_0008);
    assert_eq!(trap.to(), 31);
    assert_eq!(trap.subop10(), 4);
}

#[test]
fn test_rotate_mask_full() {
    assert_eq!(rotate_mask(0, 31), 0xFFFF_FFFF);
}

#[test]
fn test_rotate_mask_single_bit() {
    assert_eq!(rotate_mask(0, 0), 0x8000_0000);
    assert_eq!(rotate_mask(31, 31), 0x0000_0001);
    assert_eq!(rotate_mask(16, 23), 0x0000_FF00);
}

#[test]
fn test_rotate_mask_wraps() {
    // IBM bits 30, 31, 0, 1
    assert_eq!(rotate_mask(30, 1), 0xC000_0003);
    assert_eq!(rotate_mask(1, 0), 0xFFFF_FFFF);
}
