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

/// Emulator error types
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Memory arena error: {0}")]
    Arena(String),

    #[error("Invalid memory access at 0x{address:08X}")]
    InvalidMemoryAccess { address: u32 },

    #[error("Unaligned memory access: {size}-byte access at 0x{address:08X}")]
    UnalignedAccess { address: u32, size: u8 },

    #[error("Invalid {size}-byte register write at offset 0x{offset:02X} on {device}")]
    InvalidRegisterWrite {
        device: &'static str,
        offset: u32,
        size: u8,
    },

    #[error("Program image too large: {size} bytes at 0x{address:08X}")]
    ProgramTooLarge { address: u32, size: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Unsupported memory patch at 0x{address:08X}: {reason}")]
    UnsupportedPatch { address: u32, reason: &'static str },

    #[error("Save state error: {0}")]
    SaveState(String),

    #[error("Save state version mismatch: expected {expected}, got {got}")]
    SaveStateVersion { expected: u32, got: u32 },
}
