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

//! GameCube/Wii emulator core library
//!
//! This library provides the core emulation components for a GameCube/Wii
//! emulator: the PowerPC integer interpreter, the processor interface, a
//! shared-memory backed address space and the patch engine.
//!
//! # Example
//!
//! ```
//! use gcrx::core::cpu::CPU;
//! use gcrx::core::memory::Memory;
//!
//! let mut memory = Memory::new(false, false).unwrap();
//! memory.write_u32(0x8000_0000, 0x3860_002A).unwrap(); // li r3, 42
//!
//! let mut cpu = CPU::new();
//! cpu.set_pc(0x8000_0000);
//! cpu.step(&memory);
//! assert_eq!(cpu.reg(3), 42);
//! ```

pub mod core;
