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

use std::path::PathBuf;

use clap::Parser;
use gcrx::core::error::Result;
use gcrx::core::save_state::SaveState;
use gcrx::core::{EmulatorConfig, HardwareEvent, System};
use log::{error, info};

/// GameCube/Wii CPU core runner
#[derive(Parser)]
#[command(name = "gcrx")]
#[command(about = "Run a raw PowerPC program image on the GameCube/Wii core", long_about = None)]
struct Args {
    /// Raw big-endian program image
    program: PathBuf,

    /// Address the image is copied to
    #[arg(short = 'l', long, default_value = "0x80003100", value_parser = parse_address)]
    load_address: u32,

    /// Entry point (defaults to the load address)
    #[arg(short = 'e', long, value_parser = parse_address)]
    entry: Option<u32>,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Patch list (`$name` groups of `address:width:value` lines)
    #[arg(short = 'p', long)]
    patches: Option<PathBuf>,

    /// Enable a patch group by name (repeatable)
    #[arg(long = "enable-patch", value_name = "NAME")]
    enable_patch: Vec<String>,

    /// Emulate a Wii
    #[arg(long)]
    wii: bool,

    /// Number of frames to run
    #[arg(short = 'n', long, default_value = "60")]
    frames: u64,

    /// Restore this save state before running
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Write a save state here after running
    #[arg(short = 's', long)]
    save_state: Option<PathBuf>,
}

fn parse_address(text: &str) -> std::result::Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid address {:?}: {}", text, e))
}

fn main() -> Result<()> {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize logger with default level INFO
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("gcrx v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = EmulatorConfig::load(args.config.as_deref())?;
    if args.wii {
        config.wii = true;
    }
    if let Some(path) = args.patches {
        config.patch_file = Some(path);
    }
    config.enabled_patches.extend(args.enable_patch);

    let mut system = System::new(config)?;
    let events = system.hardware_events();

    let entry = args.entry.unwrap_or(args.load_address);
    if let Err(e) = system.load_program_file(&args.program, args.load_address, entry) {
        error!("Failed to load {}: {}", args.program.display(), e);
        return Err(e);
    }

    if let Some(path) = &args.load_state {
        let state = SaveState::load_from_file(path)?;
        system.load_state(&state)?;
    }

    info!("Starting emulation...");
    let log_interval = (args.frames / 10).max(1);
    for frame in 0..args.frames {
        system.run_frame();

        for event in events.try_iter() {
            match event {
                HardwareEvent::FifoReset => info!("Video: FIFO reset requested"),
                HardwareEvent::DriveReset => info!("DVD: drive reset requested"),
                HardwareEvent::ResetButtonNotify | HardwareEvent::PowerButtonNotify => {
                    info!("System management: {:?}", event)
                }
            }
        }

        if frame > 0 && frame % log_interval == 0 {
            info!(
                "Progress: {}/{} frames | PC: 0x{:08X} | Cycles: {}",
                frame,
                args.frames,
                system.pc(),
                system.cycles()
            );
        }
    }

    info!("Emulation completed");
    info!("Total frames: {}", system.frame_count());
    info!("Total cycles: {}", system.cycles());
    info!("Final PC: 0x{:08X}", system.pc());
    system.cpu().dump_registers();

    if let Some(path) = &args.save_state {
        system.save_state().save_to_file(path)?;
    }

    system.shutdown();
    Ok(())
}
