use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = "charts.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Country-code reference, relative to `data_dir`.
    pub country_codes: String,
    /// Penguin measurements, relative to `data_dir`.
    pub penguins: String,
    /// Ranking files in display order. The first one is the default country.
    pub countries: Vec<CountryFile>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountryFile {
    pub name: String,
    /// Relative to `data_dir`.
    pub file: String,
}

impl Default for Config {
    fn default() -> Self {
        let countries = [
            ("Germany", "Germany.csv"),
            ("France", "France.csv"),
            ("Denmark", "Denmark.csv"),
            ("Belgium", "Belgium.csv"),
            ("Italy", "Italy.csv"),
            ("Spain", "Spain.csv"),
            ("United Kingdom", "England.csv"),
            ("Netherlands", "Netherlands.csv"),
            ("Switzerland", "Switzerland.csv"),
            ("Portugal", "Portugal.csv"),
        ]
        .into_iter()
        .map(|(name, file)| CountryFile {
            name: name.into(),
            file: format!("Country_csv/{file}"),
        })
        .collect();

        Config {
            data_dir: "data".into(),
            out_dir: "out".into(),
            country_codes: "ids.json".into(),
            penguins: "penguins_cleaned.csv".into(),
            countries,
        }
    }
}

impl Config {
    /// Reads the config at `path`, falling back to the defaults if the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {path:?}, using defaults");
            return Ok(Config::default());
        }

        info!("Loading config from {path:?}");
        let file = File::open(path).with_context(|| format!("Failed to open {path:?}"))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid config in {path:?}"))?;
        Ok(config)
    }

    pub fn country_path(&self, country: &CountryFile) -> PathBuf {
        self.data_dir.join(&country.file)
    }

    pub fn country_codes_path(&self) -> PathBuf {
        self.data_dir.join(&self.country_codes)
    }

    pub fn penguins_path(&self) -> PathBuf {
        self.data_dir.join(&self.penguins)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("charts.db")
    }
}
