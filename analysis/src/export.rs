use crate::coordinator::Dashboard;
use crate::view::ChoroplethSpec;
use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use serde_json::{Value, json};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

const WORLD_110M: &str = "https://cdn.jsdelivr.net/npm/vega-datasets@2/data/world-110m.json";

/// Writes every pane of the dashboard into `out_dir`.
pub fn write_dashboard(out_dir: &Path, dashboard: &Dashboard) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {out_dir:?}"))?;
    write_json(&out_dir.join("dashboard.json"), dashboard)?;
    write_json(&out_dir.join("map.vl.json"), &vega_lite_map(&dashboard.choropleth))?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    info!("Writing {path:?}");
    let file = File::create(path).with_context(|| format!("Failed to create {path:?}"))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

/// Layered Vega-Lite spec: neutral countries below the ones where the song charted.
pub fn vega_lite_map(spec: &ChoroplethSpec) -> Value {
    let map = match spec {
        ChoroplethSpec::Placeholder { message } => {
            return json!({
                "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
                "width": 400,
                "height": 300,
                "mark": {"type": "text", "align": "center"},
                "encoding": {"text": {"value": message}},
            });
        }
        ChoroplethSpec::Map(map) => map,
    };

    let projection = json!({
        "type": map.projection.kind,
        "center": map.projection.center,
        "scale": map.projection.scale,
        "translate": map.projection.translate,
    });
    let countries = json!({
        "url": WORLD_110M,
        "format": {"type": "topojson", "feature": "countries"},
    });
    let values: Vec<Value> = map
        .values
        .iter()
        .map(|v| {
            json!({
                "id": v.id,
                "name": v.country,
                "streams": v.value,
            })
        })
        .collect();

    json!({
        "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
        "title": format!("{} ({})", map.song, map.week),
        "width": map.projection.width,
        "height": map.projection.height,
        "config": {"view": {"stroke": null}},
        "layer": [
            {
                "data": countries,
                "mark": {"type": "geoshape", "fill": map.base_fill, "stroke": "white"},
                "projection": projection,
            },
            {
                "data": countries,
                "transform": [{
                    "lookup": "id",
                    "from": {"data": {"values": values}, "key": "id", "fields": ["streams", "name"]},
                }, {
                    "filter": "isValid(datum.streams)",
                }],
                "mark": {"type": "geoshape", "stroke": "white"},
                "projection": projection,
                "encoding": {
                    "color": {
                        "field": "streams",
                        "type": "quantitative",
                        "scale": {"scheme": "blues"},
                        "title": map.legend_title,
                    },
                    "tooltip": [
                        {"field": "name", "type": "nominal"},
                        {"field": "streams", "type": "quantitative"},
                    ],
                },
            },
        ],
    })
}
