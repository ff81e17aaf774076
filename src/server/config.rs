use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "TETRABASE_";

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: i64,

    #[serde(default = "default_db_password")]
    pub default_db_password: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    listen_addr: Option<String>,
    poll_interval_ms: Option<u64>,
    stop_timeout_secs: Option<i64>,
    default_db_password: Option<String>,
    log_dir: Option<String>,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3005))
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_stop_timeout_secs() -> i64 {
    10
}

fn default_db_password() -> String {
    "password123".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            poll_interval_ms: default_poll_interval_ms(),
            stop_timeout_secs: default_stop_timeout_secs(),
            default_db_password: default_db_password(),
            log_dir: default_log_dir(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path_str) => {
                let path = Path::new(path_str);
                if path.exists() {
                    let contents = fs::read_to_string(path)
                        .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                    parse_file(&contents).map_err(|e| {
                        format!("Failed to parse TOML from config file at {path:?}: {e}")
                    })?
                } else {
                    PartialServerConfig::default()
                }
            }
            None => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::prefixed(ENV_PREFIX)
            .from_env()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        merge(file_config, env_config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_file(contents: &str) -> Result<PartialServerConfig, toml::de::Error> {
    toml::from_str(contents)
}

fn merge(file: PartialServerConfig, env: PartialServerConfig) -> Result<ServerConfig, String> {
    let listen_addr = match env.listen_addr.or(file.listen_addr) {
        Some(addr) => addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid listen_addr '{addr}': {e}"))?,
        None => default_listen_addr(),
    };

    let poll_interval_ms = env
        .poll_interval_ms
        .or(file.poll_interval_ms)
        .unwrap_or_else(default_poll_interval_ms);
    if poll_interval_ms == 0 {
        return Err("poll_interval_ms must be greater than zero".to_string());
    }

    let stop_timeout_secs = env
        .stop_timeout_secs
        .or(file.stop_timeout_secs)
        .unwrap_or_else(default_stop_timeout_secs);
    if stop_timeout_secs < 0 {
        return Err("stop_timeout_secs must not be negative".to_string());
    }

    Ok(ServerConfig {
        listen_addr,
        poll_interval_ms,
        stop_timeout_secs,
        default_db_password: env
            .default_db_password
            .or(file.default_db_password)
            .unwrap_or_else(default_db_password),
        log_dir: env.log_dir.or(file.log_dir).unwrap_or_else(default_log_dir),
    })
}
