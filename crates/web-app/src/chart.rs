use std::{borrow::BorrowMut, collections::BTreeMap};

use chrono::{Days, NaiveDate};
use gloo_utils::window;
use liftr_domain as domain;
use plotters::{
    chart::ChartBuilder,
    prelude::{Circle, IntoDrawingArea, SVGBackend},
    series::{AreaSeries, Histogram, LineSeries},
    style::{Color, IntoFont, Palette, Palette99, RGBColor, TextStyle, WHITE},
};
use wasm_bindgen::JsValue;

pub const COLOR_VOLUME: usize = 6;
pub const COLOR_REPS: usize = 4;
pub const COLOR_WEIGHT: usize = 8;
pub const COLOR_DURATION: usize = 5;

pub const OPACITY_LINE: f64 = 0.9;
pub const OPACITY_AREA: f64 = 0.3;

pub const WIDTH_LINE: u32 = 2;

pub const FONT: (&str, u32) = ("Roboto", 11);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl Interval {
    /// Dates spanned by the given workouts. A single day is widened to keep the x axis non-empty.
    #[must_use]
    pub fn of(workouts: &[domain::Workout]) -> Option<Self> {
        let first = workouts.iter().map(|w| w.date.date_naive()).min()?;
        let last = workouts.iter().map(|w| w.date.date_naive()).max()?;
        if first == last {
            return Some(Self {
                first: first.checked_sub_days(Days::new(1)).unwrap_or(first),
                last: last.checked_add_days(Days::new(1)).unwrap_or(last),
            });
        }
        Some(Self { first, last })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlotType {
    Circle(usize, f64, u32),
    Line(usize, f64, u32),
    Histogram(usize, f64),
    Area(usize, f64),
}

#[must_use]
pub fn plot_line(color: usize) -> Vec<PlotType> {
    vec![PlotType::Line(color, OPACITY_LINE, WIDTH_LINE)]
}

#[must_use]
pub fn plot_line_with_dots(color: usize) -> Vec<PlotType> {
    vec![
        PlotType::Line(color, OPACITY_LINE, WIDTH_LINE),
        PlotType::Circle(color, OPACITY_LINE, WIDTH_LINE),
    ]
}

#[must_use]
pub fn plot_histogram(color: usize) -> Vec<PlotType> {
    vec![PlotType::Histogram(color, OPACITY_AREA)]
}

#[must_use]
pub fn plot_area(color: usize) -> Vec<PlotType> {
    vec![PlotType::Area(color, OPACITY_AREA)]
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PlotParams {
    pub y_min_opt: Option<f32>,
    pub y_max_opt: Option<f32>,
    pub secondary: bool,
}

impl PlotParams {
    pub const SECONDARY: Self = Self {
        y_max_opt: None,
        y_min_opt: None,
        secondary: true,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotData {
    pub values: Vec<(NaiveDate, f32)>,
    pub plots: Vec<PlotType>,
    pub params: PlotParams,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Bounds {
    min: f32,
    max: f32,
}

impl Bounds {
    fn min_with_margin(self) -> f32 {
        if self.min <= f32::EPSILON {
            return self.min;
        }
        self.min - self.margin()
    }

    fn max_with_margin(self) -> f32 {
        self.max + self.margin()
    }

    fn margin(self) -> f32 {
        if (self.max - self.min).abs() > f32::EPSILON {
            return (self.max - self.min) * 0.1;
        }
        0.1
    }
}

/// Total volume of the completed sets per day.
#[must_use]
pub fn volume_per_day(workouts: &[domain::Workout]) -> Vec<(NaiveDate, f32)> {
    per_day(workouts, domain::Workout::volume)
}

/// Total reps of the completed sets per day.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn reps_per_day(workouts: &[domain::Workout]) -> Vec<(NaiveDate, f32)> {
    per_day(workouts, |w| w.total_reps() as f32)
}

/// Workout duration in minutes per day.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn duration_per_day(workouts: &[domain::Workout]) -> Vec<(NaiveDate, f32)> {
    per_day(workouts, |w| w.duration as f32 / 60.0)
}

/// Heaviest completed set of an exercise per day. Days without such a set are omitted.
#[must_use]
pub fn max_weight_per_day(
    workouts: &[domain::Workout],
    exercise_name: &str,
) -> Vec<(NaiveDate, f32)> {
    let mut days: BTreeMap<NaiveDate, f32> = BTreeMap::new();
    for workout in workouts {
        for (_, set) in workout
            .completed_sets()
            .filter(|(exercise, _)| exercise.name == exercise_name)
        {
            let max = days.entry(workout.date.date_naive()).or_insert(0.0);
            *max = f32::max(*max, f32::from(set.weight));
        }
    }
    days.into_iter().collect()
}

fn per_day(
    workouts: &[domain::Workout],
    value: impl Fn(&domain::Workout) -> f32,
) -> Vec<(NaiveDate, f32)> {
    let mut days: BTreeMap<NaiveDate, f32> = BTreeMap::new();
    for workout in workouts {
        *days.entry(workout.date.date_naive()).or_default() += value(workout);
    }
    days.into_iter().collect()
}

/// Volume as histogram and reps as line on the secondary axis.
#[allow(clippy::missing_errors_doc)]
pub fn plot_progress(
    workouts: &[domain::Workout],
    theme: Theme,
    width: u32,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let Some(interval) = Interval::of(workouts) else {
        return Ok(None);
    };
    plot(
        &[
            PlotData {
                values: volume_per_day(workouts),
                plots: plot_histogram(COLOR_VOLUME),
                params: PlotParams::default(),
            },
            PlotData {
                values: reps_per_day(workouts),
                plots: plot_line(COLOR_REPS),
                params: PlotParams::SECONDARY,
            },
        ],
        interval,
        theme,
        width,
    )
}

#[allow(clippy::missing_errors_doc)]
pub fn plot_duration(
    workouts: &[domain::Workout],
    theme: Theme,
    width: u32,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let Some(interval) = Interval::of(workouts) else {
        return Ok(None);
    };
    plot(
        &[PlotData {
            values: duration_per_day(workouts),
            plots: [plot_area(COLOR_DURATION), plot_line(COLOR_DURATION)].concat(),
            params: PlotParams::default(),
        }],
        interval,
        theme,
        width,
    )
}

#[allow(clippy::missing_errors_doc)]
pub fn plot_exercise_weight(
    workouts: &[domain::Workout],
    exercise_name: &str,
    theme: Theme,
    width: u32,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let Some(interval) = Interval::of(workouts) else {
        return Ok(None);
    };
    plot(
        &[PlotData {
            values: max_weight_per_day(workouts, exercise_name),
            plots: plot_line_with_dots(COLOR_WEIGHT),
            params: PlotParams::default(),
        }],
        interval,
        theme,
        width,
    )
}

/// Plot data onto a chart.
///
/// Every `PlotData` element contains a series which is drawn with each of its plot types in order.
/// Series with `params.secondary` set are drawn against a secondary y axis, which is omitted if no
/// such series exists. Returns `None` if there is nothing to show.
#[allow(clippy::missing_errors_doc)]
pub fn plot(
    data: &[PlotData],
    interval: Interval,
    theme: Theme,
    width: u32,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    if all_zeros(data) {
        return Ok(None);
    }

    let (Some(primary_bounds), secondary_bounds) = determine_y_bounds(data) else {
        return Ok(None);
    };

    let mut result = String::new();

    {
        let root = SVGBackend::with_string(&mut result, (width, 200)).into_drawing_area();
        let (color, background_color) = colors(theme);

        root.fill(&background_color)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10f32)
            .x_label_area_size(30f32)
            .y_label_area_size(40f32)
            .right_y_label_area_size(secondary_bounds.map_or_else(|| 0f32, |_| 40f32))
            .build_cartesian_2d(
                interval.first..interval.last,
                primary_bounds.min_with_margin()..primary_bounds.max_with_margin(),
            )?
            .set_secondary_coord(
                interval.first..interval.last,
                secondary_bounds
                    .as_ref()
                    .map_or(0.0..0.0, |b| b.min_with_margin()..b.max_with_margin()),
            );

        chart
            .configure_mesh()
            .disable_x_mesh()
            .set_all_tick_mark_size(3u32)
            .axis_style(color.mix(0.3))
            .bold_line_style(color.mix(0.05))
            .light_line_style(color.mix(0.0))
            .label_style(TextStyle::from(FONT.into_font()).color(&color))
            .x_labels(2)
            .y_labels(6)
            .draw()?;

        if secondary_bounds.is_some() {
            chart
                .configure_secondary_axes()
                .set_all_tick_mark_size(3u32)
                .axis_style(color.mix(0.3))
                .label_style(TextStyle::from(FONT.into_font()).color(&color))
                .draw()?;
        }

        for plot_data in data {
            let mut values = plot_data.values.clone();
            values.sort_by_key(|e| e.0);

            for plot in &plot_data.plots {
                match *plot {
                    PlotType::Circle(color, opacity, size) => {
                        let series = values.iter().map(|(x, y)| {
                            Circle::new((*x, *y), size, Palette99::pick(color).mix(opacity).filled())
                        });
                        if plot_data.params.secondary {
                            chart.draw_secondary_series(series)?;
                        } else {
                            chart.draw_series(series)?;
                        }
                    }
                    PlotType::Line(color, opacity, size) => {
                        let series = LineSeries::new(
                            values.iter().map(|(x, y)| (*x, *y)),
                            Palette99::pick(color).mix(opacity).stroke_width(size),
                        );
                        if plot_data.params.secondary {
                            chart.draw_secondary_series(series)?;
                        } else {
                            chart.draw_series(series)?;
                        }
                    }
                    PlotType::Histogram(color, opacity) => {
                        let series = Histogram::vertical(&chart)
                            .style(Palette99::pick(color).mix(opacity).filled())
                            .margin(0) // https://github.com/plotters-rs/plotters/issues/300
                            .data(values.iter().map(|(x, y)| (*x, *y)));
                        if plot_data.params.secondary {
                            chart.draw_secondary_series(series)?;
                        } else {
                            chart.draw_series(series)?;
                        }
                    }
                    PlotType::Area(color, opacity) => {
                        let series = AreaSeries::new(
                            values.iter().map(|(x, y)| (*x, *y)),
                            0.0,
                            Palette99::pick(color).mix(opacity),
                        );
                        if plot_data.params.secondary {
                            chart.draw_secondary_series(series)?;
                        } else {
                            chart.draw_series(series)?;
                        }
                    }
                }
            }
        }

        root.present()?;
    }

    Ok(Some(result))
}

fn all_zeros(data: &[PlotData]) -> bool {
    data.iter().all(|d| d.values.iter().all(|(_, v)| *v == 0.0))
}

fn colors(theme: Theme) -> (RGBColor, RGBColor) {
    let dark = RGBColor(20, 22, 26);
    match theme {
        Theme::Light => (dark, WHITE),
        Theme::Dark => (WHITE, dark),
    }
}

fn determine_y_bounds(data: &[PlotData]) -> (Option<Bounds>, Option<Bounds>) {
    let mut primary_bounds: Option<Bounds> = None;
    let mut secondary_bounds: Option<Bounds> = None;

    for plot in data.iter().filter(|plot| !plot.values.is_empty()) {
        let min = plot
            .values
            .iter()
            .map(|(_, v)| *v)
            .fold(plot.params.y_min_opt.unwrap_or(f32::MAX), f32::min);
        let max = plot
            .values
            .iter()
            .map(|(_, v)| *v)
            .fold(plot.params.y_max_opt.unwrap_or(0.), f32::max);

        let b = if plot.params.secondary {
            secondary_bounds.borrow_mut()
        } else {
            primary_bounds.borrow_mut()
        }
        .get_or_insert(Bounds { min, max });

        b.min = f32::min(b.min, min);
        b.max = f32::max(b.max, max);
    }

    (primary_bounds, secondary_bounds)
}

/// Width of a chart filling the browser window, limited to a readable range.
#[must_use]
pub fn chart_width() -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let inner_width = window()
        .inner_width()
        .unwrap_or(JsValue::UNDEFINED)
        .as_f64()
        .unwrap_or(420.) as u32;
    inner_width.saturating_sub(20).clamp(300, 960)
}
