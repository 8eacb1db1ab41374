use crate::load::{CountryTable, DataStore};
use crate::schema::Week;
use crate::view::top_ten;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no country available")]
    EmptyStore,
    #[error("unknown country: {0}")]
    UnknownCountry(String),
    #[error("week {week} not available for {country}")]
    UnknownWeek { country: String, week: Week },
    #[error("{song:?} is not among the top songs of the selected week")]
    UnknownSong { song: String },
    #[error("unknown display mode: {0}")]
    UnknownMode(String),
    #[error("unknown axis: {0}")]
    UnknownAxis(String),
    #[error("unknown species: {0}")]
    UnknownSpecies(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayMode {
    #[default]
    Absolute,
    Relative,
}

impl DisplayMode {
    pub fn legend_title(self) -> &'static str {
        match self {
            DisplayMode::Absolute => "Streams",
            DisplayMode::Relative => "Relative Streams (%)",
        }
    }
}

impl Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Absolute => f.write_str("absolute"),
            DisplayMode::Relative => f.write_str("relative"),
        }
    }
}

impl FromStr for DisplayMode {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "absolute" | "absolute streams" => Ok(DisplayMode::Absolute),
            "relative" | "relative streams" => Ok(DisplayMode::Relative),
            _ => Err(SelectionError::UnknownMode(s.to_owned())),
        }
    }
}

// Invariant: `week` belongs to `country` and `song` is one of its top songs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectionState {
    country: String,
    week: Option<Week>,
    song: Option<String>,
    mode: DisplayMode,
}

impl SelectionState {
    pub fn initial(store: &DataStore) -> Result<Self, SelectionError> {
        let country = store.first_country().ok_or(SelectionError::EmptyStore)?;
        Self::for_country(store, country, DisplayMode::default())
    }

    pub fn with_country(&self, store: &DataStore, country: &str) -> Result<Self, SelectionError> {
        Self::for_country(store, country, self.mode)
    }

    pub fn with_week(&self, store: &DataStore, week: &Week) -> Result<Self, SelectionError> {
        let table = self.table(store)?;
        if !table.has_week(week) {
            return Err(SelectionError::UnknownWeek {
                country: self.country.clone(),
                week: week.clone(),
            });
        }
        Ok(SelectionState {
            country: self.country.clone(),
            week: Some(week.clone()),
            song: first_song(table, week),
            mode: self.mode,
        })
    }

    pub fn with_song(&self, store: &DataStore, song: Option<&str>) -> Result<Self, SelectionError> {
        if let Some(song) = song
            && !self.song_options(store).contains(&song)
        {
            return Err(SelectionError::UnknownSong {
                song: song.to_owned(),
            });
        }
        Ok(SelectionState {
            song: song.map(str::to_owned),
            ..self.clone()
        })
    }

    pub fn with_mode(&self, mode: DisplayMode) -> Self {
        SelectionState {
            mode,
            ..self.clone()
        }
    }

    pub fn song_options<'a>(&self, store: &'a DataStore) -> Vec<&'a str> {
        match (store.table(&self.country), &self.week) {
            (Some(table), Some(week)) => top_ten(table, week)
                .map(|row| row.track_name.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn week(&self) -> Option<&Week> {
        self.week.as_ref()
    }

    pub fn song(&self) -> Option<&str> {
        self.song.as_deref()
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    fn for_country(
        store: &DataStore,
        country: &str,
        mode: DisplayMode,
    ) -> Result<Self, SelectionError> {
        let table = store
            .table(country)
            .ok_or_else(|| SelectionError::UnknownCountry(country.to_owned()))?;
        let week = table.earliest_week().cloned();
        let song = week.as_ref().and_then(|week| first_song(table, week));
        Ok(SelectionState {
            country: country.to_owned(),
            week,
            song,
            mode,
        })
    }

    fn table<'a>(&self, store: &'a DataStore) -> Result<&'a CountryTable, SelectionError> {
        store
            .table(&self.country)
            .ok_or_else(|| SelectionError::UnknownCountry(self.country.clone()))
    }
}

fn first_song(table: &CountryTable, week: &Week) -> Option<String> {
    top_ten(table, week).next().map(|row| row.track_name.clone())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::load::test::row;

    fn store() -> DataStore {
        let germany = (1..=12)
            .map(|rank| {
                row(
                    "Germany",
                    "W3",
                    rank,
                    &format!("de-{rank}"),
                    1000.0 - rank as f64,
                )
            })
            .chain([
                row("Germany", "W1", 1, "early", 50.0),
                row("Germany", "W2", 1, "middle", 60.0),
            ])
            .collect();
        DataStore::new(vec![
            CountryTable::new("Germany", germany).unwrap(),
            CountryTable::new(
                "France",
                vec![
                    row("France", "W2", 1, "fr-a", 10.0),
                    row("France", "W2", 2, "fr-b", 5.0),
                    row("France", "W4", 1, "fr-c", 7.0),
                ],
            )
            .unwrap(),
            CountryTable::new("Denmark", vec![]).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn initial_state() {
        let store = store();
        let state = SelectionState::initial(&store).unwrap();
        assert_eq!(state.country(), "Germany");
        assert_eq!(state.week(), Some(&Week::from("W1")));
        assert_eq!(state.song(), Some("early"));
        assert_eq!(state.mode(), DisplayMode::Absolute);
    }

    #[test]
    fn empty_store() {
        let store = DataStore::new(vec![]).unwrap();
        assert_eq!(
            SelectionState::initial(&store),
            Err(SelectionError::EmptyStore)
        );
    }

    #[test]
    fn country_resets_to_earliest_week() {
        let store = store();
        let state = SelectionState::initial(&store).unwrap();
        for country in store.countries() {
            let next = state.with_country(&store, country).unwrap();
            let table = store.table(country).unwrap();
            assert_eq!(next.week(), table.weeks().into_iter().min());
        }

        let france = state.with_country(&store, "France").unwrap();
        assert_eq!(france.week(), Some(&Week::from("W2")));
        assert_eq!(france.song(), Some("fr-a"));
    }

    #[test]
    fn country_keeps_mode() {
        let store = store();
        let state = SelectionState::initial(&store)
            .unwrap()
            .with_mode(DisplayMode::Relative)
            .with_country(&store, "France")
            .unwrap();
        assert_eq!(state.mode(), DisplayMode::Relative);
    }

    #[test]
    fn country_without_rows() {
        let store = store();
        let state = SelectionState::initial(&store)
            .unwrap()
            .with_country(&store, "Denmark")
            .unwrap();
        assert_eq!(state.week(), None);
        assert_eq!(state.song(), None);
        assert!(state.song_options(&store).is_empty());
    }

    #[test]
    fn unknown_country() {
        let store = store();
        let state = SelectionState::initial(&store).unwrap();
        assert_eq!(
            state.with_country(&store, "Atlantis"),
            Err(SelectionError::UnknownCountry("Atlantis".into()))
        );
    }

    #[test]
    fn week_resets_song() {
        let store = store();
        let state = SelectionState::initial(&store)
            .unwrap()
            .with_week(&store, &Week::from("W3"))
            .unwrap();
        assert_eq!(state.song(), Some("de-1"));
        let options = state.song_options(&store);
        assert_eq!(options.len(), 10);
        assert_eq!(options.first(), Some(&"de-1"));
        assert_eq!(options.last(), Some(&"de-10"));
    }

    #[test]
    fn week_of_other_country_rejected() {
        let store = store();
        let state = SelectionState::initial(&store).unwrap();
        // W4 only exists in France.
        assert_eq!(
            state.with_week(&store, &Week::from("W4")),
            Err(SelectionError::UnknownWeek {
                country: "Germany".into(),
                week: Week::from("W4"),
            })
        );
    }

    #[test]
    fn song_options_outlive_state() {
        let store = store();
        let options = {
            let state = SelectionState::initial(&store)
                .unwrap()
                .with_week(&store, &Week::from("W3"))
                .unwrap();
            state.song_options(&store)
        };
        assert_eq!(options.len(), 10);
        assert_eq!(options[0], "de-1");
        assert_eq!(options[9], "de-10");
    }

    #[test]
    fn song_must_be_in_top_ten() {
        let store = store();
        let state = SelectionState::initial(&store)
            .unwrap()
            .with_week(&store, &Week::from("W3"))
            .unwrap();

        let state = state.with_song(&store, Some("de-7")).unwrap();
        assert_eq!(state.song(), Some("de-7"));
        assert_eq!(state.week(), Some(&Week::from("W3")));

        assert_eq!(
            state.with_song(&store, Some("de-11")),
            Err(SelectionError::UnknownSong {
                song: "de-11".into()
            })
        );

        let cleared = state.with_song(&store, None).unwrap();
        assert_eq!(cleared.song(), None);
    }

    #[test]
    fn parse_mode() {
        assert_eq!("relative".parse(), Ok(DisplayMode::Relative));
        assert_eq!("Absolute Streams".parse(), Ok(DisplayMode::Absolute));
        assert!("percent".parse::<DisplayMode>().is_err());
    }
}
