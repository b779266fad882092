use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use bulletin_cli::{BuildArgs, Cli, Command, ConfigCommand, OutlineArgs, ParamsArgs};
use bulletin_core::bulletin::outline_blocks;
use bulletin_core::logging::{LoggingDestination, LoggingOptions, init_logging};
use bulletin_core::resolver::lookup_outline_id;
use bulletin_core::runtime::expand_path;
use bulletin_core::schedule::parse_service_date;
use bulletin_core::schedule::service_date_key;
use bulletin_core::{
    BuildSettings, Document, FileConfig, JsonDirStore, OutlineResolution, OutlineResolver,
    ParameterStore, apply_runtime_overrides, config_path, load_config, render_config, run_build,
    save_config, settings_from_config,
};
use clap::Parser;
use tracing::warn;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let logging = LoggingOptions {
        destination: if cli.no_log_file {
            LoggingDestination::StderrOnly
        } else {
            LoggingDestination::FileAndStderr
        },
        verbosity: cli.verbose,
        log_dir: None,
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("Warning: structured logging unavailable: {err}");
    }

    match cli.command {
        Some(Command::Config(cmd)) => {
            if !cli.build.is_empty() {
                bail!("Build flags cannot be combined with config commands.");
            }
            handle_config_command(cmd)
        }
        Some(Command::Params(args)) => show_params(&args, &cli.build),
        Some(Command::Outline(args)) => show_outline(&args, &cli.build),
        None => run_build_command(&cli.build),
    }
}

fn load_settings(build: &BuildArgs) -> Result<BuildSettings> {
    let load = load_config();
    let mut warnings = load.warnings;
    let (mut settings, mut config_warnings) = settings_from_config(&load.config);
    warnings.append(&mut config_warnings);

    let overrides = build.to_runtime_overrides().map_err(|err| anyhow!(err))?;
    apply_runtime_overrides(&mut settings, &overrides, &mut warnings)?;

    for warning in warnings {
        warn!("{warning}");
        eprintln!("Warning: {warning}");
    }
    Ok(settings)
}

fn run_build_command(build: &BuildArgs) -> Result<()> {
    let settings = load_settings(build)?;
    let report = run_build(&settings).context("Bulletin build failed")?;

    match report.written_to {
        Some(path) => println!(
            "Bulletin for {} written to {}",
            report.service_date,
            path.display()
        ),
        None => {
            print!("{}", report.rendered);
            eprintln!(
                "Dry run: bulletin for {} would be written to {}",
                report.service_date,
                report.planned_path.display()
            );
        }
    }
    Ok(())
}

/// Store for inspection commands: subcommand flag, then build flag, then config.
fn inspection_store(
    data_dir: Option<&str>,
    build: &BuildArgs,
) -> Result<(JsonDirStore, BuildSettings)> {
    let settings = load_settings(build)?;
    let dir: PathBuf = match data_dir.or(build.data_dir.as_deref()) {
        Some(dir) => expand_path(dir),
        None => settings.data_dir.clone(),
    };
    Ok((JsonDirStore::new(dir), settings))
}

fn require_date(raw: &str) -> Result<String> {
    let date = parse_service_date(raw)
        .ok_or_else(|| anyhow!("Service date '{raw}' is not in YYYY-MM-DD form."))?;
    Ok(service_date_key(date))
}

fn show_params(args: &ParamsArgs, build: &BuildArgs) -> Result<()> {
    let date = require_date(&args.date)?;
    let (store, _) = inspection_store(args.data_dir.as_deref(), build)?;
    let params = ParameterStore::new(&store).get_parameters(&date)?;
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}

fn show_outline(args: &OutlineArgs, build: &BuildArgs) -> Result<()> {
    let date = require_date(&args.date)?;
    let (store, settings) = inspection_store(args.data_dir.as_deref(), build)?;
    let params = ParameterStore::new(&store).get_parameters(&date)?;
    let resolver = OutlineResolver::new(&store);

    let outline = if args.raw {
        let outline_id = lookup_outline_id(&params, &args.service)?.ok_or_else(|| {
            anyhow!("No oow_id configured for {date}; there is no order of worship to show.")
        })?;
        resolver.fetch_skeleton(&outline_id)?
    } else {
        match resolver.resolve(&params, &args.service)? {
            OutlineResolution::Resolved { outline, .. } => outline,
            OutlineResolution::NotConfigured => {
                println!("No order of worship configured for {date}.");
                return Ok(());
            }
        }
    };

    let mut document = Document::new(format!("Order of Worship ({})", args.service), date);
    document.blocks = outline_blocks(&args.service, outline);
    print!("{}", settings.renderer().render(&document)?);
    Ok(())
}

fn handle_config_command(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let load = load_config();
            for warning in &load.warnings {
                eprintln!("Warning: {warning}");
            }
            println!("# source: {:?} ({})", load.source, config_path().display());
            let rendered = render_config(&load.config)
                .map_err(|err| anyhow!("Failed to render configuration: {err}"))?;
            print!("{rendered}");
            Ok(())
        }
        ConfigCommand::Init { force } => {
            let path = config_path();
            if path.exists() && !force {
                bail!(
                    "{} already exists. Pass --force to overwrite it.",
                    path.display()
                );
            }
            let written = save_config(&FileConfig::default())
                .map_err(|err| anyhow!("Failed to write configuration: {err}"))?;
            println!("Wrote default configuration to {}", written.display());
            Ok(())
        }
    }
}
