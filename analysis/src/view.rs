use crate::color::{self, Rgb};
use crate::load::{CountryCodes, CountryTable};
use crate::schema::{RankingRow, Week};
use crate::selection::DisplayMode;
use log::{debug, trace};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

pub const TOP_N: usize = 10;

pub fn top_ten<'a, 'w>(
    table: &'a CountryTable,
    week: &'w Week,
) -> impl Iterator<Item = &'a RankingRow> + 'w
where
    'a: 'w,
{
    table.week_rows(week).take(TOP_N)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RankingTable {
    pub country: String,
    pub week: Option<Week>,
    pub rows: Vec<RankingRow>,
}

impl RankingTable {
    pub fn new(table: &CountryTable, week: Option<&Week>) -> Self {
        let rows = match week {
            Some(week) => table.week_rows(week).cloned().collect(),
            None => Vec::new(),
        };
        RankingTable {
            country: table.country().to_owned(),
            week: week.cloned(),
            rows,
        }
    }

    pub fn top(&self) -> &[RankingRow] {
        &self.rows[..self.rows.len().min(TOP_N)]
    }

    pub fn song_options(&self) -> Vec<String> {
        self.top().iter().map(|row| row.track_name.clone()).collect()
    }

    pub fn song_detail(&self, song: Option<&str>) -> Vec<RankingRow> {
        match song {
            Some(song) => self
                .rows
                .iter()
                .filter(|row| row.track_name == song)
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BarChartSpec {
    pub title: String,
    pub x_title: &'static str,
    pub y_title: &'static str,
    pub width: u32,
    pub height: u32,
    /// Sorted by decreasing streams.
    pub bars: Vec<Bar>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bar {
    pub rank: u32,
    pub track_name: String,
    pub artist_names: String,
    pub streams: f64,
    pub color: Rgb,
}

impl BarChartSpec {
    pub fn new(ranking: &RankingTable) -> Self {
        let mut bars: Vec<Bar> = ranking
            .top()
            .iter()
            .enumerate()
            .map(|(i, row)| Bar {
                rank: row.rank,
                track_name: row.track_name.clone(),
                artist_names: row.artist_names.clone(),
                streams: row.streams,
                color: color::categorical(i),
            })
            .collect();
        // Stable, so equal stream counts stay in rank order.
        bars.sort_by_key(|bar| Reverse(OrderedFloat(bar.streams)));

        let title = match &ranking.week {
            Some(week) => format!("Top {TOP_N} in {} ({week})", ranking.country),
            None => format!("Top {TOP_N} in {}", ranking.country),
        };
        BarChartSpec {
            title,
            x_title: "Number of Streams",
            y_title: "Song Title",
            width: 700,
            height: 500,
            bars,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChoroplethSpec {
    Placeholder { message: String },
    Map(ChoroplethMap),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChoroplethMap {
    pub song: String,
    pub week: Week,
    pub mode: DisplayMode,
    pub legend_title: &'static str,
    pub projection: Projection,
    pub base_fill: Rgb,
    /// `None` if no country charted the song.
    pub domain: Option<[f64; 2]>,
    /// Countries where the song charted. Others are absent, not zero.
    pub values: Vec<MapValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapValue {
    pub country: String,
    pub alpha_3: String,
    pub id: u16,
    pub streams: f64,
    pub value: f64,
    pub color: Rgb,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Projection {
    pub kind: &'static str,
    pub center: [f64; 2],
    pub scale: f64,
    pub translate: [f64; 2],
    pub width: u32,
    pub height: u32,
}

pub const EUROPE: Projection = Projection {
    kind: "mercator",
    center: [10.0, 50.0],
    scale: 500.0,
    translate: [200.0, 150.0],
    width: 400,
    height: 300,
};

impl ChoroplethSpec {
    pub fn placeholder() -> Self {
        ChoroplethSpec::Placeholder {
            message: "Select a song to view map".into(),
        }
    }

    /// In relative mode, each value is the song's share of *that country's*
    /// total streams in the week, not the song's share across countries.
    /// Countries without a known ISO code are dropped.
    pub fn new(
        all: &[RankingRow],
        song: Option<&str>,
        week: Option<&Week>,
        mode: DisplayMode,
        codes: &CountryCodes,
    ) -> Self {
        let (Some(song), Some(week)) = (song, week) else {
            return Self::placeholder();
        };

        let totals: HashMap<&str, f64> = match mode {
            DisplayMode::Absolute => HashMap::new(),
            DisplayMode::Relative => {
                let mut totals = HashMap::new();
                for row in all.iter().filter(|row| &row.week == week) {
                    *totals.entry(row.country.as_str()).or_insert(0.0) += row.streams;
                }
                totals
            }
        };

        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for row in all
            .iter()
            .filter(|row| row.track_name == song && &row.week == week)
        {
            if !seen.insert(row.country.as_str()) {
                trace!("Ignoring duplicate entry of {song:?} in {}", row.country);
                continue;
            }

            let value = match mode {
                DisplayMode::Absolute => row.streams,
                DisplayMode::Relative => match totals.get(row.country.as_str()) {
                    Some(&total) if total > 0.0 => 100.0 * row.streams / total,
                    _ => {
                        debug!("No streams in {} for {week}, dropping it", row.country);
                        continue;
                    }
                },
            };

            let Some(code) = codes.lookup(&row.country) else {
                debug!("No country code for {:?}, dropping it from the map", row.country);
                continue;
            };

            values.push(MapValue {
                country: row.country.clone(),
                alpha_3: code.alpha_3.clone(),
                id: code.numeric,
                streams: row.streams,
                value,
                color: color::NEUTRAL,
            });
        }

        let domain = values
            .iter()
            .map(|v| v.value)
            .fold(None, |acc: Option<[f64; 2]>, x| match acc {
                None => Some([x, x]),
                Some([min, max]) => Some([min.min(x), max.max(x)]),
            });
        if let Some([min, max]) = domain {
            for value in &mut values {
                value.color = color::blues(value.value, min, max);
            }
        }

        ChoroplethSpec::Map(ChoroplethMap {
            song: song.to_owned(),
            week: week.clone(),
            mode,
            legend_title: mode.legend_title(),
            projection: EUROPE,
            base_fill: color::NEUTRAL,
            domain,
            values,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendSeries {
    pub title: &'static str,
    pub country: String,
    pub song: String,
    // One point per week of the country.
    pub points: Vec<TrendPoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendPoint {
    pub week: Week,
    pub streams: Option<f64>,
}

impl TrendSeries {
    pub fn new(table: &CountryTable, song: Option<&str>) -> Option<Self> {
        let song = song?;
        let points = table
            .weeks()
            .into_iter()
            .map(|week| TrendPoint {
                week: week.clone(),
                streams: table
                    .week_rows(week)
                    .find(|row| row.track_name == song)
                    .map(|row| row.streams),
            })
            .collect();
        Some(TrendSeries {
            title: "Stream Evolution Of The Selected Song Over Time In The Selected Country",
            country: table.country().to_owned(),
            song: song.to_owned(),
            points,
        })
    }

    /// Runs of consecutive charting weeks, as (week index, streams).
    pub fn segments(&self) -> Vec<Vec<(usize, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (i, point) in self.points.iter().enumerate() {
            match point.streams {
                Some(streams) => current.push((i, streams)),
                None => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    pub fn max_streams(&self) -> Option<f64> {
        self.points
            .iter()
            .filter_map(|point| point.streams)
            .max_by_key(|&streams| OrderedFloat(streams))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::load::test::row;
    use crate::load::{CountryCode, DataStore};

    fn germany_w3() -> CountryTable {
        CountryTable::new(
            "Germany",
            (1..=12)
                .map(|rank| row("Germany", "W3", rank, &format!("t{rank}"), rank as f64))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn top_ten_of_twelve() {
        let table = germany_w3();
        let ranking = RankingTable::new(&table, Some(&Week::from("W3")));
        assert_eq!(ranking.rows.len(), 12);
        let ranks: Vec<_> = ranking.top().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=10).collect::<Vec<_>>());
        assert_eq!(ranking.song_options()[0], "t1");
    }

    #[test]
    fn top_ten_of_few() {
        let table = CountryTable::new(
            "France",
            vec![
                row("France", "W1", 2, "b", 10.0),
                row("France", "W1", 1, "a", 20.0),
                row("France", "W2", 1, "c", 20.0),
            ],
        )
        .unwrap();
        let week = Week::from("W1");
        let ranking = RankingTable::new(&table, Some(&week));
        assert_eq!(ranking.song_options(), vec!["a", "b"]);
        assert_eq!(top_ten(&table, &week).count(), 2);
    }

    #[test]
    fn top_rows_outlive_week_label() {
        let table = germany_w3();
        let rows: Vec<&RankingRow> = {
            let week = Week::from("W3");
            top_ten(&table, &week).collect()
        };
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].track_name, "t1");
    }

    #[test]
    fn empty_week() {
        let table = germany_w3();
        let ranking = RankingTable::new(&table, Some(&Week::from("W9")));
        assert!(ranking.rows.is_empty());
        assert!(ranking.song_options().is_empty());
        assert!(BarChartSpec::new(&ranking).bars.is_empty());

        let ranking = RankingTable::new(&table, None);
        assert!(ranking.rows.is_empty());
    }

    #[test]
    fn song_detail() {
        let table = germany_w3();
        let ranking = RankingTable::new(&table, Some(&Week::from("W3")));
        let detail = ranking.song_detail(Some("t4"));
        assert_eq!(detail.len(), 1);
        assert_eq!(detail[0].rank, 4);
        assert!(ranking.song_detail(None).is_empty());
    }

    #[test]
    fn bars_sorted_by_streams() {
        // Rank and streams disagree here: rank is authoritative for the top ten, streams for the bars.
        let table = germany_w3();
        let ranking = RankingTable::new(&table, Some(&Week::from("W3")));
        let chart = BarChartSpec::new(&ranking);
        assert_eq!(chart.bars.len(), 10);
        let ranks: Vec<_> = chart.bars.iter().map(|b| b.rank).collect();
        assert_eq!(ranks, (1..=10).rev().collect::<Vec<_>>());
        let colors: HashSet<_> = chart.bars.iter().map(|b| b.color).collect();
        assert_eq!(colors.len(), 10);
        assert_eq!(chart.x_title, "Number of Streams");
    }

    fn europe() -> DataStore {
        DataStore::new(vec![
            CountryTable::new(
                "Germany",
                vec![
                    row("Germany", "W1", 1, "X", 1000.0),
                    row("Germany", "W1", 2, "Y", 9000.0),
                    row("Germany", "W2", 1, "Y", 10.0),
                ],
            )
            .unwrap(),
            CountryTable::new(
                "France",
                vec![
                    row("France", "W1", 1, "Y", 4800.0),
                    row("France", "W1", 2, "X", 200.0),
                ],
            )
            .unwrap(),
            CountryTable::new("Atlantis", vec![row("Atlantis", "W1", 1, "X", 5.0)]).unwrap(),
            CountryTable::new("Spain", vec![row("Spain", "W1", 1, "Z", 5.0)]).unwrap(),
        ])
        .unwrap()
    }

    fn values(spec: &ChoroplethSpec) -> Vec<(&str, f64)> {
        match spec {
            ChoroplethSpec::Map(map) => map
                .values
                .iter()
                .map(|v| (v.country.as_str(), v.value))
                .collect(),
            ChoroplethSpec::Placeholder { .. } => panic!("Unexpected placeholder"),
        }
    }

    #[test]
    fn choropleth_absolute() {
        let store = europe();
        let week = Week::from("W1");
        let spec = ChoroplethSpec::new(
            store.all(),
            Some("X"),
            Some(&week),
            DisplayMode::Absolute,
            &CountryCodes::builtin(),
        );
        // Atlantis has no code, Spain didn't chart.
        assert_eq!(values(&spec), vec![("Germany", 1000.0), ("France", 200.0)]);
        let ChoroplethSpec::Map(map) = spec else {
            unreachable!()
        };
        assert_eq!(map.legend_title, "Streams");
        assert_eq!(map.domain, Some([200.0, 1000.0]));
        assert_eq!(map.values[0].id, 276);
        assert_eq!(map.values[0].color, color::blues(1.0, 0.0, 1.0));
    }

    #[test]
    fn choropleth_relative_uses_country_totals() {
        let store = europe();
        let week = Week::from("W1");
        let codes = CountryCodes::builtin();
        let x = ChoroplethSpec::new(
            store.all(),
            Some("X"),
            Some(&week),
            DisplayMode::Relative,
            &codes,
        );
        assert_eq!(values(&x), vec![("Germany", 10.0), ("France", 4.0)]);

        // Same denominators for another song.
        let y = ChoroplethSpec::new(
            store.all(),
            Some("Y"),
            Some(&week),
            DisplayMode::Relative,
            &codes,
        );
        assert_eq!(values(&y), vec![("Germany", 90.0), ("France", 96.0)]);
    }

    #[test]
    fn choropleth_placeholder() {
        let store = europe();
        let week = Week::from("W1");
        let codes = CountryCodes::builtin();
        for (song, week) in [(None, Some(&week)), (Some("X"), None), (None, None)] {
            assert_eq!(
                ChoroplethSpec::new(store.all(), song, week, DisplayMode::Absolute, &codes),
                ChoroplethSpec::placeholder()
            );
        }
    }

    #[test]
    fn choropleth_unknown_song() {
        let store = europe();
        let week = Week::from("W1");
        let spec = ChoroplethSpec::new(
            store.all(),
            Some("nobody"),
            Some(&week),
            DisplayMode::Relative,
            &CountryCodes::builtin(),
        );
        let ChoroplethSpec::Map(map) = spec else {
            panic!("Expected a map")
        };
        assert!(map.values.is_empty());
        assert_eq!(map.domain, None);
    }

    #[test]
    fn choropleth_with_custom_codes() {
        let store = europe();
        let week = Week::from("W1");
        let codes: CountryCodes = [(
            "Atlantis".to_owned(),
            CountryCode {
                alpha_3: "ATL".into(),
                numeric: 999,
            },
        )]
        .into_iter()
        .collect();
        let spec = ChoroplethSpec::new(
            store.all(),
            Some("X"),
            Some(&week),
            DisplayMode::Absolute,
            &codes,
        );
        assert_eq!(values(&spec), vec![("Atlantis", 5.0)]);
    }

    #[test]
    fn trend_keeps_gaps() {
        let table = CountryTable::new(
            "Germany",
            vec![
                row("Germany", "W1", 1, "X", 100.0),
                row("Germany", "W2", 1, "Y", 100.0),
                row("Germany", "W3", 1, "X", 300.0),
                row("Germany", "W4", 2, "X", 200.0),
                row("Germany", "W4", 1, "Y", 400.0),
            ],
        )
        .unwrap();
        let trend = TrendSeries::new(&table, Some("X")).unwrap();
        assert_eq!(trend.points.len(), table.weeks().len());
        let streams: Vec<_> = trend.points.iter().map(|p| p.streams).collect();
        assert_eq!(streams, vec![Some(100.0), None, Some(300.0), Some(200.0)]);
        assert_eq!(
            trend.segments(),
            vec![vec![(0, 100.0)], vec![(2, 300.0), (3, 200.0)]]
        );
        assert_eq!(trend.max_streams(), Some(300.0));

        let never = TrendSeries::new(&table, Some("Z")).unwrap();
        assert_eq!(never.points.len(), 4);
        assert!(never.segments().is_empty());
        assert_eq!(never.max_streams(), None);

        assert!(TrendSeries::new(&table, None).is_none());
    }
}
