// LABSTATS: Aggregation and Reporting of Network Lab Simulation Results
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Rendering of [`Figure`]s to files.
use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use itertools::Itertools;
use plotly::{
    common::{
        AxisSide, ColorBar, ColorScale, ColorScalePalette, Marker, Mode, Position, TextPosition,
        Title,
    },
    layout::{Annotation, Axis, BarMode, GridPattern, LayoutGrid},
    Bar, Histogram, Layout, Plot, Scatter,
};
use serde::Serialize;

use crate::{
    chart::{ChartKind, ChartSpec, Figure, XValues},
    Error, Result,
};

/// plotly supports at most 8 axes of each direction.
const MAX_AXES: usize = 8;
#[cfg(feature = "kaleido")]
const IMAGE_SCALE: f64 = 3.0;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    /// Static PNG image (requires the `kaleido` feature, falls back to HTML otherwise).
    #[default]
    Png,
    /// Interactive plotly HTML page.
    Html,
    /// The chart description itself, as JSON.
    Json,
}

pub trait Renderer {
    /// Render `figure` to `path`, returning the path of the written file. The extension of `path`
    /// may be replaced to match the output format.
    fn render(&self, figure: &Figure, path: &Path) -> Result<PathBuf>;
}

/// Create the renderer for the requested output format.
pub fn renderer(format: OutputFormat) -> Box<dyn Renderer> {
    match format {
        OutputFormat::Json => Box::new(JsonRenderer),
        format => Box::new(PlotlyRenderer { format }),
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes the figure description as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, figure: &Figure, path: &Path) -> Result<PathBuf> {
        let path = path.with_extension("json");
        ensure_parent(&path)?;
        fs::write(&path, serde_json::to_string_pretty(figure)?)?;
        log::debug!("Wrote chart description {path:?}");
        Ok(path)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlotlyRenderer {
    pub format: OutputFormat,
}

impl Renderer for PlotlyRenderer {
    fn render(&self, figure: &Figure, path: &Path) -> Result<PathBuf> {
        let plot = build_plot(figure)?;
        ensure_parent(path)?;
        match self.format {
            #[cfg(feature = "kaleido")]
            OutputFormat::Png => {
                let path = path.with_extension("png");
                log::debug!("Plotting {path:?}");
                plot.write_image(
                    &path,
                    plotly::ImageFormat::PNG,
                    figure.width,
                    figure.height,
                    IMAGE_SCALE,
                );
                Ok(path)
            }
            format => {
                if format == OutputFormat::Png {
                    log::warn!(
                        "Built without the `kaleido` feature, writing {:?} as HTML instead",
                        path
                    );
                }
                let path = path.with_extension("html");
                log::debug!("Plotting {path:?}");
                plot.write_html(&path);
                Ok(path)
            }
        }
    }
}

fn axis_name(prefix: &str, n: usize) -> String {
    if n == 1 {
        prefix.to_string()
    } else {
        format!("{prefix}{n}")
    }
}

fn set_x_axis(layout: Layout, n: usize, axis: Axis) -> Layout {
    match n {
        1 => layout.x_axis(axis),
        2 => layout.x_axis2(axis),
        3 => layout.x_axis3(axis),
        4 => layout.x_axis4(axis),
        5 => layout.x_axis5(axis),
        6 => layout.x_axis6(axis),
        7 => layout.x_axis7(axis),
        _ => layout.x_axis8(axis),
    }
}

fn set_y_axis(layout: Layout, n: usize, axis: Axis) -> Layout {
    match n {
        1 => layout.y_axis(axis),
        2 => layout.y_axis2(axis),
        3 => layout.y_axis3(axis),
        4 => layout.y_axis4(axis),
        5 => layout.y_axis5(axis),
        6 => layout.y_axis6(axis),
        7 => layout.y_axis7(axis),
        _ => layout.y_axis8(axis),
    }
}

fn title(text: &str) -> Title {
    Title::from(text.to_string())
}

fn value_label(value: &Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_default()
}

/// Build the plotly plot of a figure. Every panel gets its own pair of axes on a grid; secondary
/// y-axes are allocated after all panel axes.
pub fn build_plot(figure: &Figure) -> Result<Plot> {
    let num_panels = figure.panels.len();
    let num_secondary = figure
        .panels
        .iter()
        .filter(|p| p.has_secondary_axis())
        .count();
    if num_panels == 0 || num_panels + num_secondary > MAX_AXES {
        return Err(Error::Chart(format!(
            "cannot lay out {num_panels} panels with {num_secondary} secondary axes"
        )));
    }

    let mut plot = Plot::new();
    let mut layout = Layout::new()
        .width(figure.width)
        .height(figure.height)
        .bar_mode(BarMode::Group);

    if num_panels > 1 {
        layout = layout.grid(
            LayoutGrid::new()
                .rows(figure.rows())
                .columns(figure.columns)
                .pattern(GridPattern::Independent),
        );
        if let Some(text) = &figure.title {
            layout = layout.title(title(text));
        }
    } else {
        let text = figure
            .title
            .as_deref()
            .unwrap_or(figure.panels[0].title.as_str());
        layout = layout.title(title(text));
    }

    let mut annotations = Vec::new();
    let mut next_secondary = num_panels + 1;
    for (i, panel) in figure.panels.iter().enumerate() {
        let n = i + 1;
        let x_ref = axis_name("x", n);
        let y_ref = axis_name("y", n);
        let y2_ref = panel.has_secondary_axis().then(|| {
            next_secondary += 1;
            axis_name("y", next_secondary - 1)
        });

        for trace in traces(panel, &x_ref, &y_ref, y2_ref.as_deref()) {
            plot.add_trace(trace);
        }

        let mut x_axis = Axis::new().title(title(&panel.x_label)).show_grid(true);
        if let Some((min, max)) = panel.x_range {
            x_axis = x_axis.range(vec![min, max]);
        }
        let mut y_axis = Axis::new().title(title(&panel.y_label)).show_grid(true);
        if let Some((min, max)) = panel.y_range() {
            y_axis = y_axis.range(vec![min, max]);
        }
        layout = set_x_axis(layout, n, x_axis);
        layout = set_y_axis(layout, n, y_axis);

        if let Some(y2_ref) = &y2_ref {
            let y2_label = panel.y2_label.as_deref().unwrap_or_default();
            let y2_axis = Axis::new()
                .title(title(y2_label))
                .overlaying(&y_ref)
                .anchor(&x_ref)
                .side(AxisSide::Right)
                .show_grid(false);
            layout = set_y_axis(layout, next_secondary - 1, y2_axis);
            log::trace!("Panel {n} uses {y2_ref} as secondary axis");
        }

        if num_panels > 1 && !panel.title.is_empty() {
            annotations.push(
                Annotation::new()
                    .text(&format!("<b>{}</b>", panel.title))
                    .x_ref(&format!("{x_ref} domain"))
                    .y_ref(&format!("{y_ref} domain"))
                    .x(0.5)
                    .y(1.08)
                    .show_arrow(false),
            );
        }
    }
    if !annotations.is_empty() {
        layout = layout.annotations(annotations);
    }

    plot.set_layout(layout);
    Ok(plot)
}

fn traces(
    panel: &ChartSpec,
    x_ref: &str,
    y_ref: &str,
    y2_ref: Option<&str>,
) -> Vec<Box<dyn plotly::Trace>> {
    let categories = match &panel.x {
        XValues::Categories(c) => c.clone(),
        XValues::Numbers(n) => n.iter().map(|x| crate::aggregate::format_number(*x)).collect(),
        XValues::Empty => Vec::new(),
    };
    let y_axis_of = |secondary: bool| match (secondary, y2_ref) {
        (true, Some(y2)) => y2.to_string(),
        _ => y_ref.to_string(),
    };

    match panel.kind {
        ChartKind::GroupedBar => panel
            .series
            .iter()
            .map(|s| {
                let mut bar = Bar::new(categories.clone(), s.values.clone())
                    .name(&s.label)
                    .x_axis(x_ref)
                    .y_axis(&y_axis_of(s.secondary_axis));
                if panel.value_labels {
                    bar = bar
                        .text_array(s.values.iter().map(value_label).collect_vec())
                        .text_position(TextPosition::Outside);
                }
                bar as Box<dyn plotly::Trace>
            })
            .collect(),
        ChartKind::SingleLineSeries | ChartKind::MultiLineSeries => panel
            .series
            .iter()
            .map(|s| {
                let y_axis = y_axis_of(s.secondary_axis);
                match &panel.x {
                    XValues::Numbers(x) => Scatter::new(x.clone(), s.values.clone())
                        .name(&s.label)
                        .mode(Mode::LinesMarkers)
                        .marker(Marker::new().size(8))
                        .x_axis(x_ref)
                        .y_axis(&y_axis) as Box<dyn plotly::Trace>,
                    _ => Scatter::new(categories.clone(), s.values.clone())
                        .name(&s.label)
                        .mode(Mode::LinesMarkers)
                        .marker(Marker::new().size(8))
                        .x_axis(x_ref)
                        .y_axis(&y_axis) as Box<dyn plotly::Trace>,
                }
            })
            .collect(),
        ChartKind::ScatterWithColorDimension => {
            let x = match &panel.x {
                XValues::Numbers(x) => x.clone(),
                _ => Vec::new(),
            };
            let mut marker = Marker::new().size(12).opacity(0.7);
            if let Some(color) = &panel.color {
                marker = marker
                    .color_array(color.values.clone())
                    .color_scale(ColorScale::Palette(ColorScalePalette::Viridis))
                    .show_scale(true)
                    .color_bar(ColorBar::new().title(title(&color.label)));
            }
            panel
                .series
                .iter()
                .map(|s| {
                    Scatter::new(x.clone(), s.values.clone())
                        .name(&s.label)
                        .mode(Mode::MarkersText)
                        .text_array(panel.point_labels.clone())
                        .text_position(Position::TopRight)
                        .marker(marker.clone())
                        .x_axis(x_ref)
                        .y_axis(y_ref) as Box<dyn plotly::Trace>
                })
                .collect()
        }
        ChartKind::Histogram => panel
            .series
            .iter()
            .map(|s| {
                let mut histogram = Histogram::new(s.values.iter().flatten().copied().collect_vec())
                    .name(&s.label)
                    .x_axis(x_ref)
                    .y_axis(y_ref);
                if let Some(bins) = panel.bins {
                    histogram = histogram.n_bins_x(bins);
                }
                histogram as Box<dyn plotly::Trace>
            })
            .collect(),
    }
}
