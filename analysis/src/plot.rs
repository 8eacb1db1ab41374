use crate::color::Rgb;
use crate::penguins::{PenguinExplorer, species_color};
use crate::view::{BarChartSpec, TrendSeries};
use anyhow::Result;
use log::{debug, info};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fs;
use std::path::Path;

impl From<Rgb> for RGBColor {
    fn from(color: Rgb) -> Self {
        RGBColor(color.0, color.1, color.2)
    }
}

pub fn plot_bar_chart_svg(spec: &BarChartSpec, path: &Path) -> Result<()> {
    info!("Creating bar chart {path:?}");
    create_parent(path)?;
    let root = SVGBackend::new(path, (spec.width, spec.height)).into_drawing_area();
    draw_bar_chart(&root, spec)?;
    root.present()?;
    Ok(())
}

pub fn plot_trend_svg(trend: Option<&TrendSeries>, path: &Path) -> Result<()> {
    info!("Creating trend chart {path:?}");
    create_parent(path)?;
    let root = SVGBackend::new(path, (700, 300)).into_drawing_area();
    draw_trend(&root, trend)?;
    root.present()?;
    Ok(())
}

pub fn plot_penguins_svg(explorer: &PenguinExplorer, path: &Path) -> Result<()> {
    info!("Creating penguin scatterplot {path:?}");
    create_parent(path)?;
    let root = SVGBackend::new(path, (700, 500)).into_drawing_area();
    draw_penguins(&root, explorer)?;
    root.present()?;
    Ok(())
}

/// Horizontal bars, largest on top, one color per track.
pub fn draw_bar_chart<DB>(root: &DrawingArea<DB, Shift>, spec: &BarChartSpec) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    if spec.bars.is_empty() {
        return draw_message(root, "No songs for this week");
    }

    let n = spec.bars.len();
    let max_streams = spec
        .bars
        .iter()
        .map(|bar| bar.streams)
        .fold(0.0, f64::max)
        .max(1.0);
    debug!("Bar chart with {n} bars, max={max_streams}");

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(30)
        .build_cartesian_2d(0.0..max_streams * 1.05, -0.5..n as f64 - 0.5)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .disable_y_axis()
        .label_style(("sans-serif", 14))
        .x_labels(6)
        .x_desc(spec.x_title)
        .y_desc(spec.y_title)
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    // Row 0 is at the bottom.
    let y = |i: usize| (n - 1 - i) as f64;
    chart.draw_series(spec.bars.iter().enumerate().map(|(i, bar)| {
        Rectangle::new(
            [(0.0, y(i) - 0.4), (bar.streams, y(i) + 0.4)],
            RGBColor::from(bar.color).filled(),
        )
    }))?;

    let label_style = TextStyle::from(("sans-serif", 14).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    chart.draw_series(spec.bars.iter().enumerate().map(|(i, bar)| {
        Text::new(
            format!("#{} {} ({})", bar.rank, bar.track_name, bar.streams),
            (max_streams * 0.01, y(i)),
            label_style.clone(),
        )
    }))?;

    Ok(())
}

/// Weekly streams as a line, broken where the song didn't chart.
pub fn draw_trend<DB>(root: &DrawingArea<DB, Shift>, trend: Option<&TrendSeries>) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let Some(trend) = trend else {
        return draw_message(root, "No song selected");
    };
    if trend.points.is_empty() {
        return draw_message(root, "No weeks for this country");
    }

    let last = trend.points.len() as i32 - 1;
    let max_streams = trend.max_streams().unwrap_or(1.0).max(1.0);
    let mut chart = ChartBuilder::on(root)
        .caption(trend.title, ("sans-serif", 16))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0..last.max(1), 0.0..max_streams * 1.1)?;

    let week_label = |i: &i32| {
        trend
            .points
            .get(*i as usize)
            .map(|point| point.week.to_string())
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .label_style(("sans-serif", 12))
        .x_labels(trend.points.len().min(12))
        .x_label_formatter(&week_label)
        .x_desc("Week")
        .y_desc("Streams")
        .draw()?;

    let color = RGBColor(0x1f, 0x77, 0xb4);
    for segment in trend.segments() {
        chart.draw_series(LineSeries::new(
            segment.iter().map(|&(i, streams)| (i as i32, streams)),
            color.stroke_width(2),
        ))?;
        chart.draw_series(
            segment
                .iter()
                .map(|&(i, streams)| Circle::new((i as i32, streams), 3, color.filled())),
        )?;
    }

    Ok(())
}

/// Selected penguins over a light backdrop of all the others.
pub fn draw_penguins<DB>(root: &DrawingArea<DB, Shift>, explorer: &PenguinExplorer) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let (x_axis, y_axis) = (explorer.x_axis(), explorer.y_axis());
    let (Some(x_range), Some(y_range)) = (
        explorer.range(x_axis),
        explorer.range(y_axis),
    ) else {
        return draw_message(root, "No penguins");
    };

    let pad = |(min, max): (f64, f64)| {
        let margin = ((max - min) * 0.05).max(0.5);
        (min - margin)..(max + margin)
    };
    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(pad(x_range), pad(y_range))?;
    chart
        .configure_mesh()
        .label_style(("sans-serif", 12))
        .x_desc(x_axis.name())
        .y_desc(y_axis.name())
        .draw()?;

    let selected = explorer.filtered();
    chart.draw_series(explorer.rows().iter().map(|row| {
        Circle::new(
            (x_axis.value(row), y_axis.value(row)),
            3,
            RGBColor(0xe0, 0xe0, 0xe0).filled(),
        )
    }))?;
    chart.draw_series(selected.iter().map(|row| {
        Circle::new(
            (x_axis.value(row), y_axis.value(row)),
            3,
            RGBColor::from(species_color(&row.species)).filled(),
        )
    }))?;

    Ok(())
}

fn draw_message<DB>(root: &DrawingArea<DB, Shift>, message: &str) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (width, height) = root.dim_in_pixel();
    let style = TextStyle::from(("sans-serif", 20).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    root.draw(&Text::new(
        message,
        (width as i32 / 2, height as i32 / 2),
        style,
    ))?;
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
