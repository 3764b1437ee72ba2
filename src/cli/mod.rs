//! Command-line front end for the resolvers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use crate::config::ForgeConfig;
use crate::error::{ForgeError, Result};
use crate::generation::{
    CompletionRequest, CompletionResolver, ImageRequest, ImageResolver, PreviewRequest,
    DEFAULT_TEMPERATURE,
};
use crate::models::ModelRegistry;
use crate::provider::{AdapterSet, ImageOptions};

/// Loreforge CLI
#[derive(Parser, Debug)]
#[command(name = "loreforge", version, about = "Structured lore and image generation")]
pub struct Cli {
    /// TOML settings file; environment variables override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List offered models
    Models(ModelsArgs),
    /// Run a structured (JSON or HTML) completion
    Complete(CompleteArgs),
    /// Preview names for several naming styles
    Preview(PreviewArgs),
    /// Generate and store an image
    Image(ImageArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    Text,
    Image,
}

#[derive(Parser, Debug)]
pub struct ModelsArgs {
    #[arg(value_enum)]
    pub kind: ModelKind,
}

#[derive(Parser, Debug)]
pub struct CompleteArgs {
    /// System prompt
    #[arg(short, long)]
    pub system: String,

    /// Temperature (0.0 - 2.0)
    #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f64,

    /// Registry model id
    #[arg(short, long)]
    pub model: Option<String>,

    /// Return sanitized HTML instead of JSON
    #[arg(long)]
    pub html: bool,

    /// User prompt
    pub user: String,
}

#[derive(Parser, Debug)]
pub struct PreviewArgs {
    /// Naming style (repeatable, order is kept)
    #[arg(long = "style", required = true)]
    pub styles: Vec<String>,

    #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f64,

    #[arg(short, long)]
    pub model: Option<String>,

    pub prompt: String,
}

#[derive(Parser, Debug)]
pub struct ImageArgs {
    /// File name prefix for the stored image
    #[arg(long)]
    pub prefix: String,

    /// Vendor option override as key=value (repeatable)
    #[arg(long = "option", value_parser = parse_option)]
    pub options: Vec<(String, Value)>,

    #[arg(short, long)]
    pub model: Option<String>,

    pub prompt: String,
}

/// Parse `key=value`; the value is read as JSON when it parses, else as a string.
pub fn parse_option(raw: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty option key in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Load settings from an optional TOML file, then the environment.
pub fn load_config(path: Option<&Path>) -> Result<ForgeConfig> {
    match path {
        Some(path) => ForgeConfig::from_toml_file(path),
        None => ForgeConfig::from_env(),
    }
}

/// Run one command and return what should be printed on stdout.
pub async fn run(cli: Cli) -> Result<String> {
    let config = load_config(cli.config.as_deref())?;
    let registry = Arc::new(ModelRegistry::with_defaults(
        config.default_text_model.as_deref(),
        config.default_image_model.as_deref(),
    )?);

    match cli.command {
        Commands::Models(args) => {
            let listing = match args.kind {
                ModelKind::Text => registry.list_text(),
                ModelKind::Image => registry.list_image(),
            };
            Ok(serde_json::to_string_pretty(&listing)?)
        }
        Commands::Complete(args) => {
            let resolver = CompletionResolver::new(registry, AdapterSet::from_config(&config), &config)?;
            let request = CompletionRequest {
                system_text: args.system,
                user_text: args.user,
                temperature: args.temperature,
                model_id: args.model,
            };
            if args.html {
                resolver.complete_html(&request).await
            } else {
                let value = resolver.complete(&request).await?;
                Ok(serde_json::to_string_pretty(&value)?)
            }
        }
        Commands::Preview(args) => {
            let resolver = CompletionResolver::new(registry, AdapterSet::from_config(&config), &config)?;
            let request = PreviewRequest {
                styles: args.styles,
                prompt: args.prompt,
                temperature: args.temperature,
                model_id: args.model,
            };
            let examples = resolver.preview(&request).await?;
            Ok(serde_json::to_string_pretty(&examples)?)
        }
        Commands::Image(args) => {
            let storage = crate::storage::from_config(&config)?;
            let resolver =
                ImageResolver::new(registry, AdapterSet::from_config(&config), storage, &config);
            let request = ImageRequest {
                prompt: args.prompt,
                filename_prefix: args.prefix,
                override_options: args.options.into_iter().collect::<ImageOptions>(),
                model_id: args.model,
            };
            let result = resolver.generate(&request).await?;
            Ok(serde_json::to_string_pretty(&result)?)
        }
    }
}

/// Exit code for a failed command.
pub fn exit_code(err: &ForgeError) -> i32 {
    if err.http_status_hint() == 400 {
        2
    } else {
        1
    }
}
