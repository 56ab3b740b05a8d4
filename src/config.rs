use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use log::{info, error};

const CONFIG_FILE: &str = "lookup_config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_file: String,
    /// Prepended to the input filename to derive the output path.
    pub output_prefix: String,
    pub state: String,
    pub state_abbr: String,
    pub name_site_url: String,
    pub address_site_url: String,
    /// Sleep between requests. Off in tests.
    pub throttle: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_file: "residents.csv".to_string(),
            output_prefix: "out_".to_string(),
            state: "Connecticut".to_string(),
            state_abbr: "CT".to_string(),
            name_site_url: "https://voterrecords.com".to_string(),
            address_site_url: "https://www.truepeoplesearch.com".to_string(),
            throttle: true,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        if Path::new(CONFIG_FILE).exists() {
            let mut file = match File::open(CONFIG_FILE) {
                Ok(f) => f,
                Err(e) => {
                    error!("Failed to open config file: {}", e);
                    return Config::default();
                }
            };
            let mut content = String::new();
            if let Err(e) = file.read_to_string(&mut content) {
                error!("Failed to read config file: {}", e);
                return Config::default();
            }
            match serde_json::from_str::<Config>(&content) {
                Ok(config) => {
                    info!("Loaded configuration from {}", CONFIG_FILE);
                    config
                }
                Err(e) => {
                    error!("Failed to parse config file: {}. Using defaults.", e);
                    Config::default()
                }
            }
        } else {
            info!("No {} found. Using default configuration.", CONFIG_FILE);
            Config::default()
        }
    }

    /// Output lands next to the input, filename prefixed.
    pub fn output_path(&self) -> PathBuf {
        let input = Path::new(&self.input_file);
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input_file.clone());
        match input.parent() {
            Some(dir) => dir.join(format!("{}{}", self.output_prefix, name)),
            None => PathBuf::from(format!("{}{}", self.output_prefix, name)),
        }
    }
}
