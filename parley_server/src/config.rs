#[derive(Debug, serde::Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub db_url: String,
    pub host: String,
    pub port: u16,
    pub logging_config: String,
    /// YAML file with the events and cases this server knows about
    pub catalog_path: String,
    pub page_size: u64,
    pub live_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_url: "sqlite://./parley.sqlite3?mode=rwc".into(),
            host: "0.0.0.0".into(),
            port: 3000,
            logging_config: "info,sqlx::query=error,tower_http=debug".into(),
            catalog_path: "catalog.yaml".into(),
            page_size: 500,
            live_channel_capacity: 100,
        }
    }
}

pub(crate) fn read_config_inner(path: Option<&str>) -> Result<Config, anyhow::Error> {
    let config_path = match path {
        Some(path) => path.to_string(),
        None => std::env::var("PARLEY_SERVER_CONFIG")?,
    };
    let config = std::fs::read_to_string(config_path)?;
    let config = serde_yaml::from_str::<Config>(&config)?;
    Ok(config)
}

pub fn read_config(path: Option<&str>) -> Config {
    match read_config_inner(path) {
        Ok(config) => config,
        Err(e) => {
            //Print to stderr, since logging is set up in the config
            eprintln!("Warning: Failed to read config: {}", e);
            Config::default()
        }
    }
}
