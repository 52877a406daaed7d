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

//! Core configuration
//!
//! Configuration is assembled from, lowest priority first:
//! 1. Built-in defaults (a GameCube with fastmem)
//! 2. A TOML file passed with `--config`
//! 3. `GCRX_*` environment variables
//!
//! # Config File Format
//!
//! ```toml
//! wii = false
//! fastmem = true
//! # cpu_clock_hz = 486000000  (defaults to the console's clock)
//! frame_rate = 60
//! patch_file = "patches.txt"
//! enabled_patches = ["Infinite lives"]
//! ```
//!
//! # Environment
//!
//! | Variable               | Field             |
//! |------------------------|-------------------|
//! | `GCRX_WII`             | `wii`             |
//! | `GCRX_FASTMEM`         | `fastmem`         |
//! | `GCRX_CPU_CLOCK_HZ`    | `cpu_clock_hz`    |
//! | `GCRX_FRAME_RATE`      | `frame_rate`      |
//! | `GCRX_PATCH_FILE`      | `patch_file`      |
//! | `GCRX_ENABLED_PATCHES` | `enabled_patches` (comma separated) |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::{EmulatorError, Result};

/// GameCube (Gekko) core clock
pub const GAMECUBE_CPU_CLOCK_HZ: u64 = 486_000_000;

/// Wii (Broadway) core clock
pub const WII_CPU_CLOCK_HZ: u64 = 729_000_000;

/// Core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Emulate a Wii instead of a GameCube
    pub wii: bool,

    /// Map guest memory inside one reserved host range
    pub fastmem: bool,

    /// Ticks per emulated second; `None` follows the console kind
    pub cpu_clock_hz: Option<u64>,

    /// Frames per emulated second; per-frame patches run once per frame
    pub frame_rate: u32,

    /// Patch list in `address:width:value` text form
    pub patch_file: Option<PathBuf>,

    /// Names of patch groups to enable after loading
    pub enabled_patches: Vec<String>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            wii: false,
            fastmem: true,
            cpu_clock_hz: None,
            frame_rate: 60,
            patch_file: None,
            enabled_patches: Vec::new(),
        }
    }
}

impl EmulatorConfig {
    /// Parse a TOML document
    ///
    /// ```
    /// use gcrx::core::EmulatorConfig;
    ///
    /// let config = EmulatorConfig::from_toml_str("wii = true\nframe_rate = 50").unwrap();
    /// assert!(config.wii);
    /// assert_eq!(config.frame_rate, 50);
    /// assert!(config.fastmem);
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        log::debug!("Configuration: {:?}", config);
        Ok(config)
    }

    /// Apply `GCRX_*` variables from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("GCRX_WII") {
            override_parsed("GCRX_WII", &value, &mut self.wii);
        }
        if let Some(value) = lookup("GCRX_FASTMEM") {
            override_parsed("GCRX_FASTMEM", &value, &mut self.fastmem);
        }
        if let Some(value) = lookup("GCRX_CPU_CLOCK_HZ") {
            let mut clock = self.ticks_per_second();
            if override_parsed("GCRX_CPU_CLOCK_HZ", &value, &mut clock) {
                self.cpu_clock_hz = Some(clock);
            }
        }
        if let Some(value) = lookup("GCRX_FRAME_RATE") {
            override_parsed("GCRX_FRAME_RATE", &value, &mut self.frame_rate);
        }
        if let Some(value) = lookup("GCRX_PATCH_FILE") {
            log::info!("Using GCRX_PATCH_FILE from environment: {}", value);
            self.patch_file = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("GCRX_ENABLED_PATCHES") {
            self.enabled_patches = value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Ticks in one emulated second
    ///
    /// An explicit `cpu_clock_hz` wins; otherwise Gekko runs at 486 MHz and
    /// Broadway at 729 MHz.
    pub fn ticks_per_second(&self) -> u64 {
        self.cpu_clock_hz.unwrap_or(if self.wii {
            WII_CPU_CLOCK_HZ
        } else {
            GAMECUBE_CPU_CLOCK_HZ
        })
    }

    /// Ticks between two frame boundaries
    pub fn ticks_per_frame(&self) -> u64 {
        self.ticks_per_second() / self.frame_rate.max(1) as u64
    }

    fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 {
            return Err(EmulatorError::Parse("frame_rate must be non-zero".into()));
        }
        if self.ticks_per_frame() > i32::MAX as u64 {
            return Err(EmulatorError::Parse(format!(
                "cpu_clock_hz {} is too high for frame_rate {}",
                self.ticks_per_second(),
                self.frame_rate
            )));
        }
        if self.ticks_per_frame() == 0 {
            return Err(EmulatorError::Parse("cpu_clock_hz must be non-zero".into()));
        }
        Ok(())
    }
}

fn override_parsed<T: std::str::FromStr>(key: &str, value: &str, field: &mut T) -> bool {
    match value.trim().parse() {
        Ok(parsed) => {
            log::info!("Using {} from environment: {}", key, value);
            *field = parsed;
            true
        }
        Err(_) => {
            log::warn!("Ignoring {}: cannot parse {:?}", key, value);
            false
        }
    }
}
