//! Command-line entry point.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::app::export::FileWriter;
use crate::app::run::{RunOptions, RunOutcome, run};
use crate::app::scan::ScannerConfig;
use crate::domain::errors::FatalError;
use crate::infra::config::Config;
use crate::ui::app::SelectorApp;

#[derive(Debug, Parser)]
#[command(name = "vbaexport", version, about = "Export VBA modules from a macro-enabled workbook")]
#[command(
    long_about = "Lists the .xlsm workbooks in the current directory, lets you pick one, \
                  opens it in a hidden Excel instance and writes every non-empty VBA module \
                  to the output directory."
)]
pub struct Cli {
    /// Directory the modules are written to (created if missing)
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Run the tool for parsed arguments.
pub fn execute(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let working_dir = env::current_dir().context("unable to determine working directory")?;
    let options = RunOptions {
        output_dir: cli.output_dir.unwrap_or_else(|| config.output.dir()),
        scanner: ScannerConfig::from_root(working_dir.clone(), &config),
        working_dir,
    };

    let mut picker = SelectorApp::from_config(&config)?;
    let mut writer = FileWriter::new();
    let outcome = run(&options, &host(&config), &mut picker, &mut writer);

    match outcome {
        Ok(RunOutcome::Cancelled) => Ok(()),
        Ok(RunOutcome::Completed {
            document,
            output_dir,
            report,
        }) => {
            println!("Workbook: {}", document.display());
            println!("Output:   {}", output_dir.display());
            for path in report.written() {
                println!("  {}", path.display());
            }
            println!("{}", report.summary());
            Ok(())
        }
        Err(err) => {
            if let Some(hint) = err.downcast_ref::<FatalError>().and_then(FatalError::hint) {
                tracing::error!("hint: {hint}");
            }
            Err(err)
        }
    }
}

#[cfg(windows)]
fn host(config: &Config) -> crate::infra::excel::ExcelHost {
    crate::infra::excel::ExcelHost::from_config(config)
}

#[cfg(not(windows))]
fn host(_config: &Config) -> crate::infra::unsupported::UnsupportedHost {
    crate::infra::unsupported::UnsupportedHost
}
