use crate::bulletin::{BuildOptions, BulletinBuilder};
use crate::config::{FileConfig, OutputFormat, RuntimeOverrides};
use crate::document::{Document, DocumentRenderer, JsonRenderer, RenderError, TextRenderer};
use crate::error::BulletinError;
use crate::schedule::{
    find_service_date, parse_service_date, parse_timezone, parse_weekday, service_date_key,
    today_in,
};
use crate::store::JsonDirStore;
use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

/// Fully resolved settings for one bulletin build.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub data_dir: PathBuf,
    pub services: Vec<String>,
    pub weekday: Weekday,
    pub timezone: Tz,
    pub weeks_offset: i32,
    /// Explicit service date; when unset the next `weekday` is used.
    pub service_date: Option<NaiveDate>,
    pub output_format: OutputFormat,
    pub output_path: Option<PathBuf>,
    pub footnote_glyph: String,
    pub title: Option<String>,
    pub welcome_message: String,
    pub dry_run: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        let (settings, _) = settings_from_config(&FileConfig::default());
        settings
    }
}

impl BuildSettings {
    pub fn build_options(&self) -> BuildOptions {
        let defaults = BuildOptions::default();
        BuildOptions {
            services: self.services.clone(),
            title: self.title.clone().unwrap_or(defaults.title),
            welcome_message: self.welcome_message.clone(),
        }
    }

    pub fn renderer(&self) -> Box<dyn DocumentRenderer> {
        match self.output_format {
            OutputFormat::Text => Box::new(TextRenderer::new(self.footnote_glyph.clone())),
            OutputFormat::Json => Box::new(JsonRenderer),
        }
    }

    pub fn store(&self) -> JsonDirStore {
        JsonDirStore::new(&self.data_dir)
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Bulletin(#[from] BulletinError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid override: {0}")]
    Override(String),
}

/// What a build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub service_date: String,
    pub document: Document,
    pub rendered: String,
    /// Where the output was written; `None` on a dry run.
    pub written_to: Option<PathBuf>,
    pub planned_path: PathBuf,
}

/// Expand `~` and environment variables in a configured path.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(raw),
    }
}

/// Turn persisted preferences into build settings, noting anything unusable.
pub fn settings_from_config(config: &FileConfig) -> (BuildSettings, Vec<String>) {
    let mut warnings = Vec::new();
    let build = &config.build;

    let weekday = parse_weekday(&build.weekday).unwrap_or_else(|| {
        warnings.push(format!(
            "Unknown weekday '{}'; using Sunday.",
            build.weekday
        ));
        Weekday::Sun
    });
    let timezone = parse_timezone(&build.timezone).unwrap_or_else(|| {
        warnings.push(format!(
            "Unknown timezone '{}'; using America/Detroit.",
            build.timezone
        ));
        chrono_tz::America::Detroit
    });

    let settings = BuildSettings {
        data_dir: expand_path(&config.store.data_dir),
        services: build.services.clone(),
        weekday,
        timezone,
        weeks_offset: build.weeks_offset,
        service_date: None,
        output_format: build.output_format,
        output_path: build.output_path.as_deref().map(expand_path),
        footnote_glyph: build.footnote_glyph.clone(),
        title: build.title.clone(),
        welcome_message: build.welcome_message_or_default(),
        dry_run: false,
    };
    (settings, warnings)
}

/// Apply CLI overrides on top of settings derived from the config file.
pub fn apply_runtime_overrides(
    settings: &mut BuildSettings,
    overrides: &RuntimeOverrides,
    warnings: &mut Vec<String>,
) -> Result<(), RuntimeError> {
    if let Some(raw) = overrides.service_date.as_deref() {
        let date = parse_service_date(raw).ok_or_else(|| {
            RuntimeError::Override(format!("service date '{raw}' is not YYYY-MM-DD"))
        })?;
        if overrides.weeks_offset.is_some() {
            warnings.push("--weeks is ignored when --date is given.".to_string());
        }
        settings.service_date = Some(date);
    }

    if let Some(offset) = overrides.weeks_offset {
        settings.weeks_offset = offset;
    }

    if let Some(services) = overrides.services.as_ref() {
        let services: Vec<String> = services
            .iter()
            .map(|service| service.trim().to_string())
            .filter(|service| !service.is_empty())
            .collect();
        if services.is_empty() {
            return Err(RuntimeError::Override(
                "at least one non-empty --service is required".to_string(),
            ));
        }
        settings.services = services;
    }

    if let Some(dir) = overrides.data_dir.as_deref() {
        settings.data_dir = expand_path(dir);
    }

    if let Some(format) = overrides.output_format {
        settings.output_format = format;
    }

    if let Some(path) = overrides.output_path.as_ref() {
        settings.output_path = path.as_deref().map(expand_path);
    }

    if let Some(dry_run) = overrides.dry_run {
        settings.dry_run = dry_run;
    }

    Ok(())
}

/// The service date a build targets, given today's date.
pub fn resolve_service_date(
    settings: &BuildSettings,
    today: NaiveDate,
) -> Result<NaiveDate, RuntimeError> {
    if let Some(date) = settings.service_date {
        return Ok(date);
    }
    find_service_date(today, settings.weekday, settings.weeks_offset).ok_or_else(|| {
        RuntimeError::Override(format!(
            "a weeks offset of {} is outside the supported date range",
            settings.weeks_offset
        ))
    })
}

/// Output path when none is configured: `bulletin-<date>.<ext>` in `working_dir`.
pub fn default_output_path(
    working_dir: &Path,
    service_date: &str,
    format: OutputFormat,
) -> PathBuf {
    working_dir.join(format!("bulletin-{service_date}.{}", format.extension()))
}

/// Build, render and (unless dry-running) write one bulletin.
pub fn run_build(settings: &BuildSettings) -> Result<BuildReport, RuntimeError> {
    let today = today_in(settings.timezone);
    run_build_on(settings, today, Path::new("."))
}

/// [`run_build`] with an injected "today" and working directory.
pub fn run_build_on(
    settings: &BuildSettings,
    today: NaiveDate,
    working_dir: &Path,
) -> Result<BuildReport, RuntimeError> {
    let started = Instant::now();
    let service_date = service_date_key(resolve_service_date(settings, today)?);
    info!(
        service_date = %service_date,
        data_dir = %settings.data_dir.display(),
        services = ?settings.services,
        "Building bulletin"
    );

    let builder = BulletinBuilder::new(settings.store(), settings.build_options());
    let document = builder.build(&service_date)?;
    let rendered = settings.renderer().render(&document)?;

    let planned_path = settings
        .output_path
        .clone()
        .unwrap_or_else(|| {
            default_output_path(working_dir, &service_date, settings.output_format)
        });

    let written_to = if settings.dry_run {
        warn!(path = %planned_path.display(), "Dry run; output not written");
        None
    } else {
        if let Some(parent) = planned_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| RuntimeError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&planned_path, &rendered).map_err(|source| RuntimeError::Write {
            path: planned_path.clone(),
            source,
        })?;
        Some(planned_path.clone())
    };

    info!(
        service_date = %service_date,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Bulletin build complete"
    );

    Ok(BuildReport {
        service_date,
        document,
        rendered,
        written_to,
        planned_path,
    })
}
