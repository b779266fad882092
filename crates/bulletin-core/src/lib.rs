//! Core library for building the weekly church bulletin.
//!
//! Parameters for a service date are read from a [`KeyValueStore`], the
//! order-of-worship skeleton for each service is resolved against them, and
//! the result is assembled into a [`Document`] for a renderer.

pub mod bulletin;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod outline;
pub mod params;
pub mod resolver;
pub mod runtime;
pub mod schedule;
pub mod store;
pub mod template;
pub mod value;

pub use bulletin::{BuildOptions, BulletinBuilder};
pub use config::{
    ConfigError, ConfigLoadResult, ConfigSource, FileConfig, OutputFormat, RuntimeOverrides,
    config_directory, config_path, load_config, load_config_from, render_config, save_config,
    save_config_to,
};
pub use document::{Block, Document, DocumentRenderer, JsonRenderer, RenderError, TextRenderer};
pub use error::{BulletinError, TextLocation};
pub use outline::{LineItem, Section, ServiceOutline};
pub use params::{ParameterStore, Schedule};
pub use resolver::{OutlineResolution, OutlineResolver};
pub use runtime::{
    BuildReport, BuildSettings, RuntimeError, apply_runtime_overrides, run_build, run_build_on,
    settings_from_config,
};
pub use store::{JsonDirStore, KeyValueStore, MemoryStore, StoreError, Table};
pub use template::TemplateError;
pub use value::{ParamValue, ParameterSet, ValueError, ValueShape};
