use crate::load::{CountryCodes, DataStore};
use crate::schema::{RankingRow, Week};
use crate::selection::{DisplayMode, SelectionError, SelectionState};
use crate::view::{BarChartSpec, ChoroplethSpec, RankingTable, TrendSeries};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt::{self, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pane {
    RankingTable,
    BarChart,
    SongOptions,
    SongDetail,
    Choropleth,
    Trend,
}

impl Display for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pane::RankingTable => "ranking_table",
            Pane::BarChart => "bar_chart",
            Pane::SongOptions => "song_options",
            Pane::SongDetail => "song_detail",
            Pane::Choropleth => "choropleth",
            Pane::Trend => "trend",
        })
    }
}

const ALL_PANES: &[Pane] = &[
    Pane::RankingTable,
    Pane::BarChart,
    Pane::SongOptions,
    Pane::SongDetail,
    Pane::Choropleth,
    Pane::Trend,
];
const SONG_PANES: &[Pane] = &[Pane::SongDetail, Pane::Choropleth, Pane::Trend];
const MODE_PANES: &[Pane] = &[Pane::Choropleth];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dashboard {
    pub ranking_table: RankingTable,
    pub bar_chart: BarChartSpec,
    pub song_options: Vec<String>,
    pub song_detail: Vec<RankingRow>,
    pub choropleth: ChoroplethSpec,
    pub trend: Option<TrendSeries>,
}

/// Each change runs its whole cascade before returning.
pub struct UpdateCoordinator {
    store: DataStore,
    codes: CountryCodes,
    state: SelectionState,
    dashboard: Dashboard,
}

impl UpdateCoordinator {
    pub fn new(store: DataStore, codes: CountryCodes) -> Result<Self, SelectionError> {
        let state = SelectionState::initial(&store)?;
        info!(
            "Initial selection: {} / {:?} / {:?}",
            state.country(),
            state.week(),
            state.song()
        );

        let ranking_table = ranking(&store, &state);
        let song_detail = ranking_table.song_detail(state.song());
        let dashboard = Dashboard {
            bar_chart: BarChartSpec::new(&ranking_table),
            song_options: ranking_table.song_options(),
            song_detail,
            choropleth: choropleth(&store, &codes, &state),
            trend: trend(&store, &state),
            ranking_table,
        };
        Ok(UpdateCoordinator {
            store,
            codes,
            state,
            dashboard,
        })
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn week_options(&self) -> Vec<&Week> {
        self.store
            .table(self.state.country())
            .map(|table| table.weeks())
            .unwrap_or_default()
    }

    pub fn set_country(&mut self, country: &str) -> Result<&'static [Pane], SelectionError> {
        let state = self.state.with_country(&self.store, country);
        self.apply(state, ALL_PANES)
    }

    pub fn set_week(&mut self, week: &Week) -> Result<&'static [Pane], SelectionError> {
        let state = self.state.with_week(&self.store, week);
        self.apply(state, ALL_PANES)
    }

    pub fn set_song(&mut self, song: Option<&str>) -> Result<&'static [Pane], SelectionError> {
        let state = self.state.with_song(&self.store, song);
        self.apply(state, SONG_PANES)
    }

    pub fn set_mode(&mut self, mode: DisplayMode) -> Result<&'static [Pane], SelectionError> {
        let state = Ok(self.state.with_mode(mode));
        self.apply(state, MODE_PANES)
    }

    fn apply(
        &mut self,
        state: Result<SelectionState, SelectionError>,
        panes: &'static [Pane],
    ) -> Result<&'static [Pane], SelectionError> {
        let state = state.inspect_err(|e| warn!("Rejected selection: {e}"))?;
        debug!(
            "Selection: {} / {:?} / {:?} / {}",
            state.country(),
            state.week(),
            state.song(),
            state.mode()
        );
        self.state = state;

        // Upstream panes first: the song may have been reset by the new week.
        for pane in panes {
            self.recompute(*pane);
        }
        Ok(panes)
    }

    fn recompute(&mut self, pane: Pane) {
        debug!("Recomputing {pane}");
        let (store, state, dashboard) = (&self.store, &self.state, &mut self.dashboard);
        match pane {
            Pane::RankingTable => dashboard.ranking_table = ranking(store, state),
            Pane::BarChart => dashboard.bar_chart = BarChartSpec::new(&dashboard.ranking_table),
            Pane::SongOptions => dashboard.song_options = dashboard.ranking_table.song_options(),
            Pane::SongDetail => {
                dashboard.song_detail = dashboard.ranking_table.song_detail(state.song())
            }
            Pane::Choropleth => dashboard.choropleth = choropleth(store, &self.codes, state),
            Pane::Trend => dashboard.trend = trend(store, state),
        }
    }
}

fn ranking(store: &DataStore, state: &SelectionState) -> RankingTable {
    match store.table(state.country()) {
        Some(table) => RankingTable::new(table, state.week()),
        None => RankingTable::default(),
    }
}

fn choropleth(store: &DataStore, codes: &CountryCodes, state: &SelectionState) -> ChoroplethSpec {
    ChoroplethSpec::new(
        store.all(),
        state.song(),
        state.week(),
        state.mode(),
        codes,
    )
}

fn trend(store: &DataStore, state: &SelectionState) -> Option<TrendSeries> {
    store
        .table(state.country())
        .and_then(|table| TrendSeries::new(table, state.song()))
}
