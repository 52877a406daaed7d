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

//! Memory map tests
//!
//! - `mapping`: RAM mirrors, endianness, predicates and save-state snapshots
//! - `mmio`: routing of MMIO accesses to registered devices

use super::*;

mod mapping;
mod mmio;

fn gamecube_memory() -> Memory {
    Memory::new(false, false).expect("memory map")
}
