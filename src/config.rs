use serde::Deserialize;

/// Server settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite URL for the store. Without it rooms live in memory only.
    pub database_url: Option<String>,

    #[serde(default = "default_session_inactivity_minutes")]
    pub session_inactivity_minutes: i64,

    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins when set.
    pub log_filter: Option<String>,
}

impl Config {
    /// Reads `.env` when present, then the process environment.
    pub fn load() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        envy::from_env::<Config>()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            session_inactivity_minutes: default_session_inactivity_minutes(),
            log_filter: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_session_inactivity_minutes() -> i64 {
    60
}
