use crate::config::Config;
use crate::csv::CsvTable;
use crate::schema::{CountryCodeEntry, RankingRow, Week};
use anyhow::{Context, Result, anyhow};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Weekly rankings of a single country, sorted by week then rank.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CountryTable {
    country: String,
    rows: Vec<RankingRow>,
}

impl CountryTable {
    pub fn new(country: impl Into<String>, mut rows: Vec<RankingRow>) -> Result<Self> {
        let country = country.into();
        let mut seen: BTreeMap<(&Week, u32), &str> = BTreeMap::new();
        for row in &rows {
            if row.rank == 0 {
                return Err(anyhow!(
                    "Rank 0 for {:?} in {country} ({})",
                    row.track_name,
                    row.week
                ));
            }
            if !row.streams.is_finite() || row.streams < 0.0 {
                return Err(anyhow!(
                    "Invalid stream count {} for {:?} in {country} ({})",
                    row.streams,
                    row.track_name,
                    row.week
                ));
            }
            match seen.entry((&row.week, row.rank)) {
                Entry::Occupied(entry) => {
                    return Err(anyhow!(
                        "Duplicate rank {} in {country} ({}): {:?} and {:?}",
                        row.rank,
                        row.week,
                        entry.get(),
                        row.track_name
                    ));
                }
                Entry::Vacant(entry) => {
                    entry.insert(&row.track_name);
                }
            }
        }

        rows.sort_by(|a, b| a.week.cmp(&b.week).then(a.rank.cmp(&b.rank)));
        for row in &mut rows {
            row.country.clone_from(&country);
        }
        Ok(CountryTable { country, rows })
    }

    pub fn from_csv(country: &str, csv: &CsvTable) -> Result<Self> {
        let rank = csv.column("rank")?;
        let track_name = csv.column("track_name")?;
        let artist_names = csv.column("artist_names")?;
        let streams = csv.column("streams")?;
        let week = csv.column("week")?;
        let country_column = csv.optional_column("country");

        let rows = csv
            .records()
            .map(|record| -> Result<RankingRow> {
                if let Some(column) = country_column {
                    let label = record.get(column)?;
                    if label != country {
                        trace!("Line {}: country {label:?} stored as {country:?}", record.line);
                    }
                }
                Ok(RankingRow {
                    country: country.to_owned(),
                    week: Week::from(record.get(week)?),
                    rank: record.parse(rank)?,
                    track_name: record.get(track_name)?.to_owned(),
                    artist_names: record.get(artist_names)?.to_owned(),
                    streams: record.parse(streams)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(country, rows)
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn rows(&self) -> &[RankingRow] {
        &self.rows
    }

    /// Distinct weeks, in ascending order.
    pub fn weeks(&self) -> Vec<&Week> {
        self.rows
            .iter()
            .map(|row| &row.week)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn earliest_week(&self) -> Option<&Week> {
        // Rows are sorted by week.
        self.rows.first().map(|row| &row.week)
    }

    pub fn has_week(&self, week: &Week) -> bool {
        self.week_rows(week).next().is_some()
    }

    /// Rows of the given week, in rank order.
    pub fn week_rows<'a, 'w>(
        &'a self,
        week: &'w Week,
    ) -> impl Iterator<Item = &'a RankingRow> + 'w
    where
        'a: 'w,
    {
        self.rows.iter().filter(move |row| &row.week == week)
    }
}

/// All ranking tables, in configured order. Read-only once built.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataStore {
    tables: Vec<CountryTable>,
    all: Vec<RankingRow>,
}

impl DataStore {
    pub fn new(tables: Vec<CountryTable>) -> Result<Self> {
        let mut names = BTreeSet::new();
        for table in &tables {
            if !names.insert(table.country()) {
                return Err(anyhow!("Duplicate country: {}", table.country()));
            }
        }
        let all = tables
            .iter()
            .flat_map(|table| table.rows().iter().cloned())
            .collect();
        Ok(DataStore { tables, all })
    }

    pub fn load(config: &Config) -> Result<Self> {
        let tables = config
            .countries
            .iter()
            .map(|country| -> Result<_> {
                info!("Loading rankings for {}", country.name);
                let csv = CsvTable::read(config.country_path(country))?;
                let table = CountryTable::from_csv(&country.name, &csv)
                    .with_context(|| format!("Invalid rankings for {}", country.name))?;
                debug!(
                    "Loaded {} rows over {} weeks for {}",
                    table.rows().len(),
                    table.weeks().len(),
                    country.name
                );
                Ok(table)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(tables)
    }

    pub fn serialize(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create_new(path).with_context(|| format!("Failed to create {path:?}"))?;
        postcard::to_io(self, BufWriter::new(file))?;
        Ok(())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        postcard::from_bytes(bytes).map_err(|e| anyhow!("Failed to parse snapshot: {e:?}"))
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|table| table.country())
    }

    pub fn first_country(&self) -> Option<&str> {
        self.tables.first().map(|table| table.country())
    }

    pub fn table(&self, country: &str) -> Option<&CountryTable> {
        self.tables.iter().find(|table| table.country() == country)
    }

    /// Rows of every country, concatenated in configured order.
    pub fn all(&self) -> &[RankingRow] {
        &self.all
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountryCode {
    pub alpha_3: String,
    pub numeric: u16,
}

/// Static lookup from human-readable country name to ISO codes.
#[derive(Clone, Debug, Default)]
pub struct CountryCodes(HashMap<String, CountryCode>);

impl CountryCodes {
    /// Codes of the countries shipped with the default configuration.
    pub fn builtin() -> Self {
        [
            ("Germany", "DEU", 276),
            ("France", "FRA", 250),
            ("Denmark", "DNK", 208),
            ("Belgium", "BEL", 56),
            ("United Kingdom", "GBR", 826),
            ("Spain", "ESP", 724),
            ("Italy", "ITA", 380),
            ("Portugal", "PRT", 620),
            ("Switzerland", "CHE", 756),
            ("Netherlands", "NLD", 528),
        ]
        .into_iter()
        .map(|(name, alpha_3, numeric)| {
            (
                name.to_owned(),
                CountryCode {
                    alpha_3: alpha_3.to_owned(),
                    numeric,
                },
            )
        })
        .collect()
    }

    /// Loads an ISO-3166 `all.json` reference file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading country codes from {path:?}");
        let entries: Vec<CountryCodeEntry> =
            serde_json::from_reader(BufReader::new(File::open(path)?))
                .with_context(|| format!("Invalid country codes in {path:?}"))?;
        Ok(entries.into_iter().collect())
    }

    /// Adds the entries of `other`, which win over existing ones.
    pub fn merge(&mut self, other: CountryCodes) {
        self.0.extend(other.0);
    }

    pub fn lookup(&self, name: &str) -> Option<&CountryCode> {
        self.0.get(name)
    }
}

impl FromIterator<(String, CountryCode)> for CountryCodes {
    fn from_iter<T: IntoIterator<Item = (String, CountryCode)>>(iter: T) -> Self {
        CountryCodes(iter.into_iter().collect())
    }
}

impl FromIterator<CountryCodeEntry> for CountryCodes {
    fn from_iter<T: IntoIterator<Item = CountryCodeEntry>>(iter: T) -> Self {
        iter.into_iter()
            .map(|entry| {
                (
                    entry.name,
                    CountryCode {
                        alpha_3: entry.alpha_3,
                        numeric: entry.country_code,
                    },
                )
            })
            .collect()
    }
}
