use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Runtime mode: development or production
    #[arg(long, env = "NODE_ENV")]
    pub mode: Option<String>,

    /// Disable the render cache
    #[arg(long, env = "RENDER_CACHE_DISABLED")]
    pub cache_disabled: Option<bool>,

    /// Base URL of the Data API
    #[arg(long, env = "DATA_API_URL")]
    pub data_api_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: Option<bool>,
}

/// Development re-renders with detailed errors; production reads the asset
/// manifest and hides internals from error responses.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub app: ModeConfig,
    pub paths: PathsConfig,
    pub cache: CacheConfig,
    pub data_api: DataApiConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub request_timeout_secs: u64,
    pub proxy_api: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModeConfig {
    pub mode: Mode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// HTML shell; when unset it depends on the mode.
    pub template: Option<PathBuf>,
    pub manifest: PathBuf,
    pub static_dir: PathBuf,
    pub static_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
    pub ttl_secs: u64,
    pub bypass_prefixes: Vec<String>,
    pub debug_header: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataApiConfig {
    pub base_url: String,
    pub strip_prefix: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub json: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 6173)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("server.proxy_api", false)?
            .set_default("app.mode", "development")?
            .set_default("paths.manifest", "dist/client/.vite/ssr-manifest.json")?
            .set_default("paths.static_dir", "dist/client/assets")?
            .set_default("paths.static_prefix", "/assets")?
            .set_default("cache.enabled", true)?
            .set_default("cache.max_entries", 500)?
            .set_default("cache.ttl_secs", 60)?
            .set_default("cache.bypass_prefixes", vec!["/api", "/books-export"])?
            .set_default("cache.debug_header", true)?
            .set_default("data_api.base_url", "http://localhost:8000")?
            .set_default("data_api.strip_prefix", "/api")?
            .set_default("data_api.timeout_secs", 10)?
            .set_default("log.json", false)?;

        // 2. Config file: explicit path, else ./config.yaml when present
        match &cli.config {
            Some(path) => {
                builder = builder.add_source(File::with_name(path));
            }
            None if Path::new("config.yaml").exists() => {
                builder = builder.add_source(File::with_name("config.yaml"));
            }
            None => {}
        }

        // 3. Environment variables prefixed with TAMRIEL_, e.g. TAMRIEL_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("TAMRIEL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cache.bypass_prefixes"),
        );

        // 4. CLI flags (clap also resolves their env fallbacks)
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(mode) = cli.mode {
            builder = builder.set_override("app.mode", mode.to_lowercase())?;
        }
        if let Some(disabled) = cli.cache_disabled {
            builder = builder.set_override("cache.enabled", !disabled)?;
        }
        if let Some(url) = cli.data_api_url {
            builder = builder.set_override("data_api.base_url", url)?;
        }
        if let Some(json) = cli.log_json {
            builder = builder.set_override("log.json", json)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.cache.max_entries == 0 {
            return Err(config::ConfigError::Message(
                "cache.max_entries must be greater than zero".to_string(),
            ));
        }
        if self.cache.ttl_secs == 0 {
            return Err(config::ConfigError::Message(
                "cache.ttl_secs must be greater than zero".to_string(),
            ));
        }
        if let Some(prefix) = self
            .cache
            .bypass_prefixes
            .iter()
            .find(|p| !p.starts_with('/'))
        {
            return Err(config::ConfigError::Message(format!(
                "cache bypass prefix '{prefix}' must start with '/'"
            )));
        }
        if !self.paths.static_prefix.starts_with('/') {
            return Err(config::ConfigError::Message(format!(
                "static prefix '{}' must start with '/'",
                self.paths.static_prefix
            )));
        }
        Ok(())
    }

    /// Template location, honouring the mode-specific default.
    pub fn template_path(&self) -> PathBuf {
        self.paths.template.clone().unwrap_or_else(|| {
            if self.app.mode.is_production() {
                PathBuf::from("dist/client/index.html")
            } else {
                PathBuf::from("index.html")
            }
        })
    }

    /// Built-in defaults for the given mode, without reading CLI arguments,
    /// environment or config files.
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            server: ServerConfig {
                port: 6173,
                host: "0.0.0.0".to_string(),
                request_timeout_secs: 30,
                proxy_api: false,
            },
            app: ModeConfig { mode },
            paths: PathsConfig {
                template: None,
                manifest: PathBuf::from("dist/client/.vite/ssr-manifest.json"),
                static_dir: PathBuf::from("dist/client/assets"),
                static_prefix: "/assets".to_string(),
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 500,
                ttl_secs: 60,
                bypass_prefixes: vec!["/api".to_string(), "/books-export".to_string()],
                debug_header: true,
            },
            data_api: DataApiConfig {
                base_url: "http://localhost:8000".to_string(),
                strip_prefix: "/api".to_string(),
                timeout_secs: 10,
            },
            log: LogConfig { json: false },
        }
    }
}
