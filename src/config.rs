use serde::Deserialize;
use std::path::PathBuf;

/// Config, read from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// <address>:<port> to serve userfacing endpoints
    pub userfacing_listen_address: String,

    /// <address>:<port> to serve admin endpoints
    pub admin_listen_address: String,

    /// <address>:<port> to serve metrics on
    pub metrics_address: String,

    /// By default, output JSON logs. Only if this flag is set to true, output colourful human-friendly logs
    pub human_logs: bool,

    /// Max JSON body size the API accepts
    #[serde(default = "max_body_size")]
    pub max_body_size: usize,

    /// Max size of a multipart upload (all images of one post together)
    #[serde(default = "max_upload_size")]
    pub max_upload_size: usize,

    /// password to connect to database.
    pub db_dsn: String,

    /// maximum number of connections maintained by PostgresStore
    pub db_pool_size: u32,

    /// maximum seconds waiting for a database connection
    pub db_connection_timeout: u64,

    /// HMAC secret used to sign and verify bearer tokens.
    pub jwt_secret: String,

    /// How long a bearer token stays valid after login.
    #[serde(default = "token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Directory where uploaded post images are written.
    pub upload_dir: PathBuf,
}

impl Config {
    /// Will crash if file isn't found or config is invalid.
    pub fn from_file(filepath: &str) -> Self {
        let contents = std::fs::read_to_string(filepath).expect("Couldn't read from config file");
        Self::from_toml(&contents).expect("couldn't parse config file")
    }

    fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

fn max_body_size() -> usize {
    65536
}

fn max_upload_size() -> usize {
    10 * 1024 * 1024
}

fn token_ttl_secs() -> u64 {
    60 * 60 * 24
}
