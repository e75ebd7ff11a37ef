//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::features::FeatureConfig;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "mathoid";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 10044;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;
pub(crate) const DEFAULT_ENGINE_COMMAND: &str = "mathoid-typeset";

/// Command-line arguments for the Mathoid binary.
#[derive(Debug, Parser)]
#[command(name = "mathoid", version, about = "Mathoid math rendering service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MATHOID_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the Mathoid HTTP service.
    Serve(Box<ServeArgs>),
    /// Render a single expression and write the response body to stdout.
    Render(Box<RenderArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub features: FeatureOverrides,

    #[command(flatten)]
    pub engine: EngineOverrides,

    /// Input notation (tex, inline-tex, mml, ascii, chem).
    #[arg(long = "type", value_name = "TYPE", default_value = "tex")]
    pub input_type: String,

    /// Output format (svg, png, texvcinfo, graph, json, complete, mml, speech).
    #[arg(long = "format", value_name = "FORMAT")]
    pub format: Option<String>,

    /// Skip speech text generation.
    #[arg(long = "no-speech", action = clap::ArgAction::SetTrue)]
    pub no_speech: bool,

    /// The expression to render.
    #[arg(value_name = "EXPR")]
    pub expression: String,
}

#[derive(Debug, Args, Default, Clone)]
pub struct FeatureOverrides {
    /// Enable or disable SVG output.
    #[arg(long = "feature-svg", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub svg: Option<bool>,

    /// Enable or disable PNG output.
    #[arg(long = "feature-png", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub png: Option<bool>,

    /// Enable or disable the MathML style/box metrics output.
    #[arg(long = "feature-img", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub img: Option<bool>,

    /// Enable or disable the texvcinfo and graph outputs.
    #[arg(
        long = "feature-texvcinfo",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub texvcinfo: Option<bool>,

    /// Enable or disable the speech output format.
    #[arg(long = "feature-speech", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub speech: Option<bool>,

    /// Generate speech text unless the request opts out.
    #[arg(
        long = "feature-speech-on",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub speech_on: Option<bool>,

    /// Enable or disable SVG minimization.
    #[arg(long = "feature-svgo", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub svgo: Option<bool>,

    /// Skip TeX validation for plain TeX input.
    #[arg(long = "no-check", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub no_check: Option<bool>,

    /// Override the PNG resolution.
    #[arg(long = "dpi", value_name = "DPI")]
    pub dpi: Option<u32>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct EngineOverrides {
    /// Override the typesetting engine kind (command|katex).
    #[arg(long = "engine", value_name = "KIND")]
    pub kind: Option<String>,

    /// Override the typesetting engine executable.
    #[arg(long = "engine-command", value_name = "PATH")]
    pub command: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub features: FeatureOverrides,

    #[command(flatten)]
    pub engine: EngineOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the request body limit in bytes.
    #[arg(long = "server-max-body-bytes", value_name = "BYTES")]
    pub server_max_body_bytes: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub features: FeatureConfig,
    pub engine: EngineSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
    pub max_body_bytes: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub kind: EngineKind,
    pub command: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// External renderer process speaking JSON over stdio.
    Command,
    /// In-process KaTeX; MathML only.
    Katex,
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "command" => Ok(Self::Command),
            "katex" => Ok(Self::Katex),
            other => Err(format!("unknown engine `{other}` (expected command|katex)")),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix("MATHOID")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("engine.args")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Render(args)) => {
            raw.apply_feature_overrides(&args.features);
            raw.apply_engine_overrides(&args.engine);
        }
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    features: RawFeatureSettings,
    engine: RawEngineSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(bytes) = overrides.server_max_body_bytes {
            self.server.max_body_bytes = Some(bytes);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }

        self.apply_feature_overrides(&overrides.features);
        self.apply_engine_overrides(&overrides.engine);
    }

    fn apply_feature_overrides(&mut self, overrides: &FeatureOverrides) {
        let features = &mut self.features;
        let pairs = [
            (&mut features.svg, overrides.svg),
            (&mut features.png, overrides.png),
            (&mut features.img, overrides.img),
            (&mut features.texvcinfo, overrides.texvcinfo),
            (&mut features.speech, overrides.speech),
            (&mut features.speech_on, overrides.speech_on),
            (&mut features.svgo, overrides.svgo),
            (&mut features.no_check, overrides.no_check),
        ];
        for (slot, value) in pairs {
            if let Some(value) = value {
                *slot = Some(value);
            }
        }
        if let Some(dpi) = overrides.dpi {
            features.dpi = Some(dpi);
        }
    }

    fn apply_engine_overrides(&mut self, overrides: &EngineOverrides) {
        if let Some(kind) = overrides.kind.as_ref() {
            self.engine.kind = Some(kind.clone());
        }
        if let Some(command) = overrides.command.as_ref() {
            self.engine.command = Some(command.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            features,
            engine,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let features = build_feature_config(features)?;
        let engine = build_engine_settings(engine)?;

        Ok(Self {
            server,
            logging,
            features,
            engine,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    let max_body_value = server.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES);
    let max_body_usize = usize::try_from(max_body_value).map_err(|_| {
        LoadError::invalid(
            "server.max_body_bytes",
            "value exceeds supported range for usize",
        )
    })?;
    let max_body_bytes = NonZeroUsize::new(max_body_usize)
        .ok_or_else(|| LoadError::invalid("server.max_body_bytes", "must be greater than zero"))?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
        max_body_bytes,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_feature_config(features: RawFeatureSettings) -> Result<FeatureConfig, LoadError> {
    let defaults = FeatureConfig::default();

    let dpi = match features.dpi {
        Some(value) => Some(
            NonZeroU32::new(value)
                .ok_or_else(|| LoadError::invalid("features.dpi", "must be greater than zero"))?,
        ),
        None => defaults.dpi,
    };

    Ok(FeatureConfig {
        svg: features.svg.unwrap_or(defaults.svg),
        png: features.png.unwrap_or(defaults.png),
        img: features.img.unwrap_or(defaults.img),
        texvcinfo: features.texvcinfo.unwrap_or(defaults.texvcinfo),
        speech: features.speech.unwrap_or(defaults.speech),
        speech_on: features.speech_on.unwrap_or(defaults.speech_on),
        svgo: features.svgo.unwrap_or(defaults.svgo),
        no_check: features.no_check.unwrap_or(defaults.no_check),
        dpi,
    })
}

fn build_engine_settings(engine: RawEngineSettings) -> Result<EngineSettings, LoadError> {
    let kind = match engine.kind {
        Some(kind) => {
            EngineKind::from_str(&kind).map_err(|reason| LoadError::invalid("engine.kind", reason))?
        }
        None => EngineKind::Command,
    };

    let command = engine
        .command
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE_COMMAND));
    if command.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "engine.command",
            "path must not be empty",
        ));
    }

    Ok(EngineSettings {
        kind,
        command,
        args: engine.args.unwrap_or_default(),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
    max_body_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFeatureSettings {
    svg: Option<bool>,
    png: Option<bool>,
    img: Option<bool>,
    texvcinfo: Option<bool>,
    speech: Option<bool>,
    speech_on: Option<bool>,
    svgo: Option<bool>,
    no_check: Option<bool>,
    dpi: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEngineSettings {
    kind: Option<String>,
    command: Option<PathBuf>,
    args: Option<Vec<String>>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
