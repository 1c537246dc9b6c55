use clap::{Parser, Subcommand};
use release_notes::config::{self, OutputFormat, ReportConfig};
use release_notes::source::{DataInventory, DataSource, JsonDataSource, StaticDataSource};
use release_notes::{output, pipeline};
use std::path::{Path, PathBuf};

/// Inputs shared by every command that reads settings and data.
#[derive(clap::Args, Clone)]
struct InputArgs {
    /// Settings file(s); later files override earlier ones
    #[arg(long = "config", short = 'c', required = true, num_args = 1..)]
    configs: Vec<PathBuf>,

    /// JSON data file with facts, records and test cases
    #[arg(long, short = 'd')]
    data: Option<PathBuf>,

    /// Output format (overrides `[output] format`)
    #[arg(long, short = 'f', value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Parser)]
#[command(name = "release-notes")]
#[command(about = "Generate release notes as a workbook, document or web page")]
#[command(long_about = "\
Generate release notes as a workbook, document or web page

Settings come from one or more TOML files, merged in order. Facts, included
requirements and test cases come from a JSON data file; anything it leaves out
falls back to defaults derived from the settings.

Report layout:

  Release Notes
  ├── header graphic + title
  ├── Executive Summary        (key/value, two pairs per row)
  ├── Access                   (link to the web location)
  ├── Details                  (servers, database, changeset)
  └── Included Requirements    (one row per work item)
  Test Cases
  └── Test Cases               (one row per test case)

A table whose data is missing or empty is replaced by an error row; the
report is still written.

Run 'release-notes gen-config' to generate a documented settings file.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the report and write it into the output directory
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Directory the report is written into
        #[arg(long, short = 'o', default_value = ".")]
        output: PathBuf,
    },
    /// Validate settings and data without rendering
    Check {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print a stock settings file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate { input, output } => {
            let (config, format) = load_inputs(&input)?;
            let source = open_source(input.data.as_deref())?;
            let report = pipeline::generate_from_config(&config, format, source.as_ref())?;
            std::fs::create_dir_all(&output)?;
            let path = output.join(&report.artifact.file_name);
            std::fs::write(&path, &report.artifact.bytes)?;
            output::print_generate_output(&report, &path);
        }
        Command::Check { input } => {
            let (config, format) = load_inputs(&input)?;
            let settings = config.report_settings()?;
            let source = open_source(input.data.as_deref())?;
            let inventory = DataInventory::collect(source.as_ref())?;
            output::print_check_output(&settings, format, &inventory);
            println!("==> Settings and data are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load and merge the settings files; `--format` wins over the file.
fn load_inputs(input: &InputArgs) -> Result<(ReportConfig, OutputFormat), config::ConfigError> {
    let config = config::load_config(&input.configs)?;
    let format = input.format.unwrap_or(config.output.format);
    Ok((config, format))
}

/// Without a data file every fact falls back to its default and both tables
/// are replaced by error rows.
fn open_source(
    data: Option<&Path>,
) -> Result<Box<dyn DataSource>, release_notes::source::DataError> {
    Ok(match data {
        Some(path) => Box::new(JsonDataSource::load(path)?),
        None => Box::new(StaticDataSource::new()),
    })
}
