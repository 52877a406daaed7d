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

//! Patch entries and the text format
//!
//! ```text
//! $Infinite lives
//! 0x80123456:byte:0x09
//! 0x80123458:dword:0x60000000:0x4BFFFFF1
//! $Skip intro
//! 0x80004000=word:0x4E80
//! ```
//!
//! `$name` starts a group. An entry is `address:width:value[:comparand]`,
//! where the first `:` may be written `=`. Widths are `byte`, `word`
//! (16-bit) and `dword` (32-bit). Numbers are hex with `0x` or decimal.
//! Lines that do not parse are skipped.

use std::fmt;
use std::str::FromStr;

/// Width of one patch write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchType {
    Byte,
    Word,
    DWord,
}

impl PatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            PatchType::Byte => "byte",
            PatchType::Word => "word",
            PatchType::DWord => "dword",
        }
    }

    /// Access size in bytes
    pub fn size(self) -> u32 {
        match self {
            PatchType::Byte => 1,
            PatchType::Word => 2,
            PatchType::DWord => 4,
        }
    }
}

impl FromStr for PatchType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "byte" => Ok(PatchType::Byte),
            "word" => Ok(PatchType::Word),
            "dword" => Ok(PatchType::DWord),
            _ => Err(()),
        }
    }
}

/// One write of a patch group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchEntry {
    pub address: u32,
    pub kind: PatchType,
    pub value: u32,
    /// Write only when memory currently holds this value
    pub comparand: Option<u32>,
}

impl PatchEntry {
    /// Parse one entry line
    ///
    /// ```
    /// use gcrx::core::patch::{PatchEntry, PatchType};
    ///
    /// let entry = PatchEntry::parse_line("0x80003100=word:0x1234").unwrap();
    /// assert_eq!(entry.address, 0x8000_3100);
    /// assert_eq!(entry.kind, PatchType::Word);
    /// assert_eq!(entry.comparand, None);
    ///
    /// assert!(PatchEntry::parse_line("0x80003100:qword:1").is_none());
    /// ```
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.replacen('=', ":", 1);
        let items: Vec<&str> = line.split(':').map(str::trim).collect();
        if items.len() < 3 {
            return None;
        }

        let address = parse_number(items[0])?;
        let value = parse_number(items[2])?;
        let comparand = match items.get(3) {
            Some(text) => Some(parse_number(text)?),
            None => None,
        };
        let kind = items[1].parse().ok()?;

        Some(Self {
            address,
            kind,
            value,
            comparand,
        })
    }
}

impl fmt::Display for PatchEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08X}:{}:0x{:08X}",
            self.address,
            self.kind.as_str(),
            self.value
        )?;
        if let Some(comparand) = self.comparand {
            write!(f, ":0x{:08X}", comparand)?;
        }
        Ok(())
    }
}

/// A named group of entries, enabled as a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub name: String,
    pub entries: Vec<PatchEntry>,
    pub enabled: bool,
}

impl Patch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            enabled: false,
        }
    }
}

/// Parse a patch list; groups start disabled
///
/// A group is kept when it is followed by another `$` line, or when it is
/// the last group and has at least one entry.
pub fn parse_patches(text: &str) -> Vec<Patch> {
    let mut patches = Vec::new();
    let mut current: Option<Patch> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix('$') {
            if let Some(done) = current.take() {
                if !done.name.is_empty() {
                    patches.push(done);
                }
            }
            current = Some(Patch::new(name));
        } else if let Some(entry) = PatchEntry::parse_line(line) {
            current
                .get_or_insert_with(|| Patch::new(""))
                .entries
                .push(entry);
        } else {
            log::debug!("Patch: skipping malformed line {:?}", line);
        }
    }

    if let Some(last) = current {
        if !last.name.is_empty() && !last.entries.is_empty() {
            patches.push(last);
        }
    }
    patches
}

fn parse_number(text: &str) -> Option<u32> {
    match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}
