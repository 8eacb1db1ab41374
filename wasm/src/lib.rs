#![forbid(unsafe_code)]

mod plot;

use charts::export::vega_lite_map;
use charts::{CountryCodes, DataStore, DisplayMode, Pane, UpdateCoordinator, Week};
use plot::{plot_bar_chart, plot_trend};
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::wasm_bindgen;
use web_sys::{HtmlCanvasElement, console};

#[wasm_bindgen]
pub struct State {
    coordinator: Option<UpdateCoordinator>,
}

#[wasm_bindgen]
impl State {
    /// Takes the binary snapshot written by `charts snapshot`.
    #[wasm_bindgen(constructor)]
    pub fn new(data: &[u8]) -> Self {
        let coordinator = DataStore::from_bytes(data)
            .and_then(|store| Ok(UpdateCoordinator::new(store, CountryCodes::builtin())?));
        let coordinator = match coordinator {
            Ok(coordinator) => Some(coordinator),
            Err(e) => {
                console::error_1(&JsValue::from_str(&format!("Failed to load data: {e:?}")));
                None
            }
        };
        Self { coordinator }
    }

    pub fn countries(&self) -> Vec<String> {
        match &self.coordinator {
            None => Vec::new(),
            Some(c) => c.store().countries().map(str::to_owned).collect(),
        }
    }

    pub fn weeks(&self) -> Vec<String> {
        match &self.coordinator {
            None => Vec::new(),
            Some(c) => c.week_options().into_iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn songs(&self) -> Vec<String> {
        match &self.coordinator {
            None => Vec::new(),
            Some(c) => c.dashboard().song_options.clone(),
        }
    }

    pub fn set_country(&mut self, country: &str) -> Result<Vec<String>, JsValue> {
        let panes = self.coordinator_mut()?.set_country(country);
        pane_names(panes)
    }

    pub fn set_week(&mut self, week: &str) -> Result<Vec<String>, JsValue> {
        let panes = self.coordinator_mut()?.set_week(&Week::from(week));
        pane_names(panes)
    }

    pub fn set_song(&mut self, song: Option<String>) -> Result<Vec<String>, JsValue> {
        let panes = self.coordinator_mut()?.set_song(song.as_deref());
        pane_names(panes)
    }

    pub fn set_mode(&mut self, mode: &str) -> Result<Vec<String>, JsValue> {
        let mode: DisplayMode = mode.parse().map_err(|e| format!("{e}"))?;
        let panes = self.coordinator_mut()?.set_mode(mode);
        pane_names(panes)
    }

    pub fn plot_bars(&self, canvas: HtmlCanvasElement) -> Result<(), JsValue> {
        plot_bar_chart(canvas, &self.coordinator()?.dashboard().bar_chart)
    }

    pub fn plot_trend(&self, canvas: HtmlCanvasElement) -> Result<(), JsValue> {
        plot_trend(canvas, self.coordinator()?.dashboard().trend.as_ref())
    }

    /// Vega-Lite spec of the choropleth, as JSON.
    pub fn map_spec(&self) -> Result<String, JsValue> {
        let spec = vega_lite_map(&self.coordinator()?.dashboard().choropleth);
        serde_json::to_string(&spec).map_err(|e| format!("Failed to serialize map: {e:?}").into())
    }

    /// Full weekly ranking of the selected country, as JSON.
    pub fn ranking(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.coordinator()?.dashboard().ranking_table)
            .map_err(|e| format!("Failed to serialize ranking: {e:?}").into())
    }
}

impl State {
    fn coordinator(&self) -> Result<&UpdateCoordinator, JsValue> {
        self.coordinator
            .as_ref()
            .ok_or_else(|| "Failed to load data".into())
    }

    fn coordinator_mut(&mut self) -> Result<&mut UpdateCoordinator, JsValue> {
        self.coordinator
            .as_mut()
            .ok_or_else(|| "Failed to load data".into())
    }
}

fn pane_names(panes: Result<&[Pane], charts::SelectionError>) -> Result<Vec<String>, JsValue> {
    let panes = panes.map_err(|e| format!("{e}"))?;
    Ok(panes.iter().map(|pane| pane.to_string()).collect())
}
