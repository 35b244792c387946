//! Plot rendering using egui_plot
//!
//! # Main Types
//!
//! - [`PlotSeries`] - Points and axis titles of one measurement entry, ready
//!   to draw
//!
//! Long series are reduced to at most [`MAX_RENDER_POINTS`] with a min/max
//! bucket decimation that keeps peaks visible. A flipped horizontal axis is
//! drawn by negating x and labelling the ticks with the original values, so
//! spectra can run from high to low wavenumber.

use egui::Ui;
use egui_plot::{Corner, Legend, Line, Plot, PlotPoints};

use crate::types::{Variable, MAX_RENDER_POINTS};

/// One line to draw
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub x_label: String,
    pub y_label: String,
    pub flip_x: bool,
}

impl PlotSeries {
    /// Pair two variables point by point
    ///
    /// The shorter variable bounds the length; pairs with a non-finite
    /// coordinate are dropped.
    pub fn from_variables(
        name: impl Into<String>,
        (x_name, x): (&str, &Variable),
        (y_name, y): (&str, &Variable),
        flip_x: bool,
    ) -> Self {
        let points: Vec<[f64; 2]> = x
            .data
            .iter()
            .zip(y.data.iter())
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .map(|(a, b)| [a, b])
            .collect();

        Self {
            name: name.into(),
            points: decimate_points(&points, MAX_RENDER_POINTS),
            x_label: x.axis_title(x_name),
            y_label: y.axis_title(y_name),
            flip_x,
        }
    }

    /// Points in plot coordinates (x negated when flipped)
    pub fn display_points(&self) -> Vec<[f64; 2]> {
        if self.flip_x {
            self.points.iter().map(|&[x, y]| [-x, y]).collect()
        } else {
            self.points.clone()
        }
    }

    pub fn render(&self, ui: &mut Ui, plot_id: &str) {
        let flip_x = self.flip_x;
        let plot = Plot::new(plot_id)
            .allow_zoom(true)
            .allow_drag(true)
            .allow_boxed_zoom(true)
            .show_axes(true)
            .show_grid(true)
            .x_axis_label(self.x_label.clone())
            .y_axis_label(self.y_label.clone())
            .x_axis_formatter(move |mark, _range| {
                let value = if flip_x { -mark.value } else { mark.value };
                format_tick(value, mark.step_size)
            })
            .legend(Legend::default().position(Corner::RightTop));

        let points = PlotPoints::from(self.display_points());
        plot.show(ui, |plot_ui| {
            plot_ui.line(Line::new(self.name.clone(), points).width(1.5));
        });
    }
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 || step <= 0.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    format!("{:.*}", decimals, value)
}

/// Min/max bucket decimation preserving the original point order
pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points || points.len() < 3 {
        return points.to_vec();
    }

    let inner = &points[1..points.len() - 1];
    let bucket_size = inner.len().div_ceil((max_points.saturating_sub(2) / 2).max(1));
    let mut result = Vec::with_capacity(max_points);

    result.push(points[0]);

    for bucket in inner.chunks(bucket_size) {
        let (min_i, max_i) = bucket
            .iter()
            .enumerate()
            .fold((0, 0), |(min_i, max_i), (i, pt)| {
                (
                    if pt[1] < bucket[min_i][1] { i } else { min_i },
                    if pt[1] > bucket[max_i][1] { i } else { max_i },
                )
            });
        match min_i.cmp(&max_i) {
            std::cmp::Ordering::Less => {
                result.push(bucket[min_i]);
                result.push(bucket[max_i]);
            }
            std::cmp::Ordering::Greater => {
                result.push(bucket[max_i]);
                result.push(bucket[min_i]);
            }
            std::cmp::Ordering::Equal => result.push(bucket[min_i]),
        }
    }

    if let Some(last) = points.last() {
        result.push(*last);
    }

    result
}
