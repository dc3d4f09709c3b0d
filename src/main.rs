/// Version injected at compile time via GCP_COLLECTION_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("GCP_COLLECTION_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gcp_collection::config::{Config, OutputFormat};
use gcp_collection::resource::registry;
use gcp_collection::{generate_config, Environment, Properties, Template};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Render Deployment Manager descriptors for GCP collection
#[derive(Parser, Debug)]
#[command(name = "gcp-collection", version, about, long_about = None)]
struct Args {
    /// Template variant to render
    #[arg(short, long, value_enum)]
    template: Option<Template>,

    /// YAML or JSON file holding the template properties
    #[arg(short, long)]
    properties: Option<PathBuf>,

    /// Override a property (repeatable), e.g. --set enable_function=False
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Deployment name exposed to the template
    #[arg(long)]
    deployment: Option<String>,

    /// Project owning the deployment
    #[arg(long)]
    project: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// List the available extensions and exit
    #[arg(long)]
    list_extensions: bool,

    /// Remember the effective template and format as defaults
    #[arg(long)]
    save_defaults: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gcp-collection {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gcp-collection").join("gcp-collection.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gcp-collection").join("gcp-collection.log");
    }
    PathBuf::from("gcp-collection.log")
}

fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    if args.list_extensions {
        for key in registry::get_all_extension_keys() {
            if let Some(extension) = registry::get_extension(key) {
                println!("{:<28} {}", key, extension.def.description);
            }
        }
        return Ok(());
    }

    let mut config = Config::load();
    let template = config.effective_template(args.template);
    let format = config.effective_format(args.format);

    if args.save_defaults {
        config
            .set_defaults(template, format)
            .context("Failed to save defaults")?;
    }

    let mut properties = match &args.properties {
        Some(path) => load_properties(path)?,
        None => Properties::new(),
    };
    apply_overrides(&mut properties, &args.set)?;

    let env = Environment {
        deployment: args.deployment.clone(),
        project: config.effective_project(args.project.clone()),
    };

    let descriptor = generate_config(template, &properties, &env)
        .with_context(|| format!("Invalid properties for the {:?} template", template))?;

    let rendered = match format {
        OutputFormat::Yaml => descriptor.to_yaml()?,
        OutputFormat::Json => descriptor.to_json()?,
    };
    print!("{}", rendered);
    if !rendered.ends_with('\n') {
        println!();
    }

    Ok(())
}

/// Read a property mapping from a YAML (or JSON) file
fn load_properties(path: &Path) -> Result<Properties> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read properties from {:?}", path))?;

    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse properties in {:?}", path))?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Properties::new()),
        _ => Err(anyhow::anyhow!(
            "Properties in {:?} must be a mapping",
            path
        )),
    }
}

/// Apply `KEY=VALUE` overrides as string properties
fn apply_overrides(properties: &mut Properties, overrides: &[String]) -> Result<()> {
    for item in overrides {
        let Some((key, value)) = item.split_once('=') else {
            return Err(anyhow::anyhow!(
                "Invalid --set value {:?}, expected KEY=VALUE",
                item
            ));
        };
        tracing::debug!("Property override: {}", key);
        properties.insert(key.trim().to_string(), Value::String(value.to_string()));
    }
    Ok(())
}
