use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for gcrx")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, test)
    Ci,
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy with warnings denied
    Clippy,
    /// Run tests, optionally limited to core modules
    Test {
        /// Core module to test (repeatable)
        #[arg(short, long, value_enum)]
        module: Vec<CoreModule>,
        /// Run property tests with this many cases
        #[arg(long)]
        proptest_cases: Option<u32>,
    },
    /// Run the criterion benchmarks
    Bench,
    /// Run a raw program image through the gcrx binary
    Smoke {
        /// Raw big-endian program image
        program: String,
        /// Number of frames to run
        #[arg(short = 'n', long, default_value = "60")]
        frames: u64,
        /// Emulate a Wii
        #[arg(long)]
        wii: bool,
    },
}

/// Unit test groups under `src/core`
#[derive(Clone, Copy, ValueEnum)]
enum CoreModule {
    Cpu,
    Interrupt,
    Memory,
    Patch,
    System,
    Timing,
}

impl CoreModule {
    fn filter(self) -> &'static str {
        match self {
            CoreModule::Cpu => "core::cpu",
            CoreModule::Interrupt => "core::interrupt",
            CoreModule::Memory => "core::memory",
            CoreModule::Patch => "core::patch",
            CoreModule::System => "core::system",
            CoreModule::Timing => "core::timing",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci => run_ci(),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy => run_clippy(),
        Commands::Test {
            module,
            proptest_cases,
        } => run_test(&module, proptest_cases),
        Commands::Bench => cargo(&["bench", "--bench", "cpu_bench"]),
        Commands::Smoke {
            program,
            frames,
            wii,
        } => run_smoke(&program, frames, wii),
    }
}

fn run_ci() -> Result<()> {
    println!("{}", "=== gcrx CI ===".bold().blue());
    let start = Instant::now();

    step("Format Check", || run_fmt(true))?;
    step("Clippy", run_clippy)?;
    step("Test", || run_test(&[], None))?;

    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    if check {
        cargo(&["fmt", "--all", "--", "--check"])
    } else {
        cargo(&["fmt", "--all"])
    }
}

fn run_clippy() -> Result<()> {
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
}

fn run_test(modules: &[CoreModule], proptest_cases: Option<u32>) -> Result<()> {
    let test_command = |filter: Option<&str>| {
        let mut cmd = Command::new("cargo");
        match filter {
            Some(filter) => cmd.args(["test", "--lib", filter]),
            None => cmd.args(["test", "--workspace"]),
        };
        if let Some(cases) = proptest_cases {
            cmd.env("PROPTEST_CASES", cases.to_string());
        }
        cmd
    };

    if modules.is_empty() {
        return execute(&mut test_command(None));
    }

    for &module in modules {
        println!("{} {}", "→".blue(), module.filter().bold());
        execute(&mut test_command(Some(module.filter())))?;
    }
    Ok(())
}

fn run_smoke(program: &str, frames: u64, wii: bool) -> Result<()> {
    if !Path::new(program).exists() {
        println!("{} Program image not found: {}", "✗".red().bold(), program.yellow());
        anyhow::bail!("Program image not found");
    }

    println!(
        "{} {} for {} frame(s) on {}",
        "→".blue(),
        program.cyan(),
        frames.to_string().bold(),
        if wii { "Wii" } else { "GameCube" }
    );

    let start = Instant::now();
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "--release", "--bin", "gcrx", "--"])
        .arg(program)
        .arg("-n")
        .arg(frames.to_string());
    if wii {
        cmd.arg("--wii");
    }
    execute(&mut cmd)?;

    println!(
        "{} Smoke run completed in {:.2}s",
        "✓".green().bold(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn step<F>(name: &str, task: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    println!("{} {}", "→".blue(), name);
    let start = Instant::now();
    match task() {
        Ok(()) => {
            println!(
                "{} {} ({:.2}s)",
                "✓".green().bold(),
                name,
                start.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red().bold(), name);
            Err(e)
        }
    }
}

fn cargo(args: &[&str]) -> Result<()> {
    execute(Command::new("cargo").args(args))
}

fn execute(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }
    Ok(())
}
