use bulletin_core::config::{OutputFormat, RuntimeOverrides};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(name = "bulletin", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub build: BuildArgs,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log to stderr only; skip the persistent log file.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    pub no_log_file: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Supported subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print the stored parameters for a service date.
    Params(ParamsArgs),
    /// Print one resolved order of worship.
    Outline(OutlineArgs),
}

/// Configuration subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration and where it came from.
    Show,
    /// Write a default config.toml.
    Init {
        /// Overwrite an existing file.
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ParamsArgs {
    /// Service date (YYYY-MM-DD).
    pub date: String,

    /// Directory holding the bulletin_params and order_of_worship tables.
    #[arg(long = "data-dir", value_hint = ValueHint::DirPath)]
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct OutlineArgs {
    /// Service date (YYYY-MM-DD).
    pub date: String,

    /// Service id, e.g. morning or evening.
    pub service: String,

    /// Directory holding the bulletin_params and order_of_worship tables.
    #[arg(long = "data-dir", value_hint = ValueHint::DirPath)]
    pub data_dir: Option<String>,

    /// Print the stored skeleton instead of the resolved outline.
    #[arg(long, action = ArgAction::SetTrue)]
    pub raw: bool,
}

/// Arguments for the main build flow (default command).
#[derive(Debug, Clone, Args, Default)]
pub struct BuildArgs {
    /// Service date to build (YYYY-MM-DD). Defaults to the next service day.
    #[arg(short, long = "date", value_name = "DATE")]
    pub date: Option<String>,

    /// Weeks relative to the next service day (negative looks back).
    #[arg(
        long = "weeks",
        value_name = "N",
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i32)
    )]
    pub weeks: Option<i32>,

    /// Service to include; repeat for several (defaults to config value).
    #[arg(short, long = "service", value_name = "NAME")]
    pub service: Vec<String>,

    /// Directory holding the bulletin_params and order_of_worship tables.
    #[arg(long = "data-dir", value_hint = ValueHint::DirPath)]
    pub data_dir: Option<String>,

    /// Output format: text or json.
    #[arg(short, long = "format", value_name = "FORMAT")]
    pub format: Option<String>,

    /// Output file path ("none" restores the default name).
    #[arg(short, long = "output", value_hint = ValueHint::FilePath)]
    pub output: Option<String>,

    /// Build and render without writing the output file.
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,
}

impl BuildArgs {
    /// Returns true when no overrides were provided.
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.weeks.is_none()
            && self.service.is_empty()
            && self.data_dir.is_none()
            && self.format.is_none()
            && self.output.is_none()
            && !self.dry_run
    }

    /// Convert CLI flags into runtime overrides.
    pub fn to_runtime_overrides(&self) -> Result<RuntimeOverrides, String> {
        let mut overrides = RuntimeOverrides::default();

        if let Some(ref date) = self.date {
            overrides.service_date = Some(date.trim().to_string());
        }

        overrides.weeks_offset = self.weeks;

        if !self.service.is_empty() {
            overrides.services = Some(self.service.clone());
        }

        if let Some(ref dir) = self.data_dir {
            overrides.data_dir = Some(dir.clone());
        }

        if let Some(ref format) = self.format {
            let parsed = OutputFormat::parse(format)
                .ok_or_else(|| format!("Unknown output format '{format}'. Use text or json."))?;
            overrides.output_format = Some(parsed);
        }

        if let Some(ref output) = self.output {
            overrides.output_path = Some(parse_optional_field(output));
        }

        if self.dry_run {
            overrides.dry_run = Some(true);
        }

        Ok(overrides)
    }
}

fn parse_optional_field(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if matches!(
        trimmed.to_ascii_lowercase().as_str(),
        "none" | "null" | "unset"
    ) {
        None
    } else {
        Some(trimmed.to_string())
    }
}
