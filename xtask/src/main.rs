use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::Command;

const WINDOWS_TARGET: &str = "x86_64-pc-windows-msvc";

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest over the workspace
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Type-check the COM backend against the Windows target
    CheckWindows {
        #[arg(long, default_value = WINDOWS_TARGET)]
        target: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release),
        Commands::CheckWindows { target } => check_windows(&target),
    }
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run").arg("--workspace");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    run(cmd, "cargo nextest run")
}

fn check_windows(target: &str) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["check", "--all-targets", "-p", "vbaexport", "--target", target]);
    run(cmd, "cargo check")
}

fn run(mut cmd: Command, what: &str) -> Result<()> {
    let status = cmd
        .status()
        .with_context(|| format!("failed to spawn {what}"))?;
    if !status.success() {
        anyhow::bail!("{what} failed");
    }
    Ok(())
}
