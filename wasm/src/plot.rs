use charts::plot::{draw_bar_chart, draw_trend};
use charts::view::{BarChartSpec, TrendSeries};
use plotters::prelude::*;
use plotters_canvas::CanvasBackend;
use wasm_bindgen::JsValue;
use web_sys::HtmlCanvasElement;

pub fn plot_bar_chart(canvas: HtmlCanvasElement, spec: &BarChartSpec) -> Result<(), JsValue> {
    let backend = CanvasBackend::with_canvas_object(canvas).ok_or("Failed to create backend")?;
    let root = backend.into_drawing_area();
    draw_bar_chart(&root, spec).map_err(|e| format!("Failed to draw bar chart: {e:?}"))?;
    root.present()
        .map_err(|e| format!("Failed to present chart: {e:?}"))?;
    Ok(())
}

pub fn plot_trend(canvas: HtmlCanvasElement, trend: Option<&TrendSeries>) -> Result<(), JsValue> {
    let backend = CanvasBackend::with_canvas_object(canvas).ok_or("Failed to create backend")?;
    let root = backend.into_drawing_area();
    draw_trend(&root, trend).map_err(|e| format!("Failed to draw trend: {e:?}"))?;
    root.present()
        .map_err(|e| format!("Failed to present chart: {e:?}"))?;
    Ok(())
}
