use crate::config::Config;
use anyhow::{Result, anyhow};
use log::{debug, info, trace, warn};
use reqwest::Client;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tokio::runtime::Runtime;

const COUNTRY_CODES_URL: &str = "https://raw.githubusercontent.com/lukes/ISO-3166-Countries-with-Regional-Codes/master/all/all.json";
const PENGUINS_URL: &str =
    "https://raw.githubusercontent.com/dataprofessor/data/refs/heads/master/penguins_cleaned.csv";

/// Downloads the reference data that isn't already present.
pub fn fetch_reference_data(config: &Config) -> Result<()> {
    let rt = Runtime::new()?;

    rt.block_on(async {
        let client = Client::new();
        for (url, path) in [
            (COUNTRY_CODES_URL, config.country_codes_path()),
            (PENGUINS_URL, config.penguins_path()),
        ] {
            if path.exists() {
                info!("Skipping {path:?}, already present");
                continue;
            }
            if let Err(e) = fetch_file(&client, url, &path).await {
                warn!("Failed to fetch {url}: {e:?}");
            }
        }
        Ok(())
    })
}

async fn fetch_file(client: &Client, url: &str, path: &Path) -> Result<()> {
    info!("Downloading {url}");
    let res = client.get(url).send().await?;
    trace!("Status: {:?}", res.status());
    if !res.status().is_success() {
        return Err(anyhow!("Unexpected status {} for {url}", res.status()));
    }

    let bytes = res.bytes().await?;
    trace!("Received {} bytes", bytes.len());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create_new(path)?;
    debug!("Created new file: {path:?}");
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes)?;
    writer.flush()?;

    Ok(())
}
