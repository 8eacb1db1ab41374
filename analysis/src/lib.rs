//! Weekly music streaming charts across European countries.
//!
//! Rankings are loaded once into a [`DataStore`]. The [`UpdateCoordinator`]
//! owns the current [`SelectionState`] (country, week, song, display mode)
//! and recomputes the dependent panes whenever one of them changes.

#![forbid(unsafe_code)]

pub mod color;
pub mod config;
pub mod coordinator;
pub mod csv;
pub mod export;
#[cfg(feature = "cli")]
pub mod fetch;
pub mod load;
pub mod penguins;
pub mod plot;
pub mod schema;
pub mod selection;
pub mod view;

pub use config::Config;
pub use coordinator::{Dashboard, Pane, UpdateCoordinator};
pub use load::{CountryCodes, CountryTable, DataStore};
pub use schema::{RankingRow, Week};
pub use selection::{DisplayMode, SelectionError, SelectionState};
