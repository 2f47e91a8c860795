//! Charts of a solved blend: composition, cost per ingredient and stage timings.
//!
//! [ChartData] and the pie geometry are plain data and always available.
//! Opening a window needs the `plot` feature.
use crate::error::{Error, Result};
use crate::report::{label, Labels};
use crate::solve::Blend;
use crate::table::CoefficientTable;
use crate::timing::StageTimings;

/// Slice colours, cycled
pub const PALETTE: [[u8; 3]; 4] = [
    [0xff, 0x99, 0x99],
    [0x66, 0xb3, 0xff],
    [0x99, 0xff, 0x99],
    [0xff, 0xcc, 0x99],
];

/// Number of straight segments used for a full circle
const CIRCLE_SEGMENTS: usize = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub label: String,
    pub quantity: f64,
    /// Percent of the total mass
    pub percent: f64,
}

/// Everything the three charts need
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub composition: Vec<Share>,
    /// `(label, cost)` per ingredient
    pub costs: Vec<(String, f64)>,
    /// `(stage, seconds)`
    pub timings: Vec<(String, f64)>,
}

impl ChartData {
    /// Gather the chart values. Fails when the blend has no mass to split.
    pub fn new(
        table: &CoefficientTable,
        blend: &Blend,
        labels: &Labels,
        timings: &StageTimings,
    ) -> Result<Self> {
        let total: f64 = blend.exact_quantities.iter().sum();
        if !(total > 0.) {
            return Err(Error::Rendering {
                message: format!("cannot draw the composition of a blend weighing {} kg", total),
            });
        }
        let composition = table
            .iter()
            .zip(&blend.exact_quantities)
            .map(|(ingredient, &quantity)| Share {
                label: label(labels, &ingredient.name).to_string(),
                quantity,
                percent: 100. * quantity / total,
            })
            .collect();
        let costs = table
            .iter()
            .zip(&blend.exact_quantities)
            .map(|(ingredient, q)| {
                let name = label(labels, &ingredient.name).to_string();
                (name, q * ingredient.cost)
            })
            .collect();
        let timings = timings.seconds().map(|(stage, s)| (stage.to_string(), s)).collect();
        Ok(ChartData {
            composition,
            costs,
            timings,
        })
    }

    /// One closed polygon per share of a unit pie, starting at twelve o'clock
    /// and running counter-clockwise
    pub fn pie_slices(&self) -> Vec<Vec<[f64; 2]>> {
        let mut start = std::f64::consts::FRAC_PI_2;
        self.composition
            .iter()
            .map(|share| {
                let sweep = std::f64::consts::TAU * share.percent / 100.;
                let segments = CIRCLE_SEGMENTS as f64 * share.percent / 100.;
                let steps = (segments.ceil() as usize).max(1);
                let mut polygon = Vec::with_capacity(steps + 2);
                polygon.push([0., 0.]);
                for step in 0..=steps {
                    let angle = start + sweep * step as f64 / steps as f64;
                    polygon.push([angle.cos(), angle.sin()]);
                }
                start += sweep;
                polygon
            })
            .collect()
    }
}

/// Open a blocking window with the three charts
#[cfg(feature = "plot")]
pub fn show(data: ChartData) -> Result<()> {
    window::run(data).map_err(|e| Error::Rendering { message: e.to_string() })
}

/// Always fails: this build has no windowing support
#[cfg(not(feature = "plot"))]
pub fn show(_data: ChartData) -> Result<()> {
    Err(Error::Rendering {
        message: "feedmix was built without the `plot` feature".to_string(),
    })
}

#[cfg(feature = "plot")]
mod window {
    use eframe::egui::{self, Color32};
    use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoint, Polygon, Text};

    use super::{ChartData, PALETTE};

    pub(super) fn run(data: ChartData) -> Result<(), eframe::Error> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default().with_inner_size([1200., 450.]),
            ..Default::default()
        };
        eframe::run_native(
            "Mezcla optima",
            options,
            Box::new(move |_cc| {
                let slices = data.pie_slices();
                Ok(Box::new(ChartApp { data, slices }))
            }),
        )
    }

    fn colour(index: usize) -> Color32 {
        let [r, g, b] = PALETTE[index % PALETTE.len()];
        Color32::from_rgb(r, g, b)
    }

    fn bars(values: &[(String, f64)], fill: Color32) -> BarChart {
        let bars = values
            .iter()
            .enumerate()
            .map(|(i, (name, value))| Bar::new(i as f64, *value).name(name).fill(fill))
            .collect();
        BarChart::new(bars)
    }

    struct ChartApp {
        data: ChartData,
        slices: Vec<Vec<[f64; 2]>>,
    }

    impl eframe::App for ChartApp {
        fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.columns(3, |columns| {
                    columns[0].heading("Composicion de la mezcla optima");
                    Plot::new("composition")
                        .data_aspect(1.)
                        .show_axes(false)
                        .show_grid(false)
                        .legend(Legend::default())
                        .show(&mut columns[0], |plot_ui| {
                            let shares = self.slices.iter().zip(&self.data.composition);
                            for (i, (slice, share)) in shares.enumerate() {
                                let mid = slice[slice.len() / 2 + 1];
                                plot_ui.polygon(
                                    Polygon::new(slice.clone())
                                        .name(&share.label)
                                        .fill_color(colour(i)),
                                );
                                plot_ui.text(Text::new(
                                    PlotPoint::new(0.7 * mid[0], 0.7 * mid[1]),
                                    format!("{:.1}%", share.percent),
                                ));
                            }
                        });

                    columns[1].heading("Costo total por ingrediente");
                    Plot::new("costs")
                        .y_axis_label("Costo ($)")
                        .legend(Legend::default())
                        .show(&mut columns[1], |plot_ui| {
                            let fill = Color32::from_rgb(0x46, 0x82, 0xb4);
                            plot_ui.bar_chart(bars(&self.data.costs, fill));
                        });

                    columns[2].heading("Tiempos de ejecucion por etapa");
                    Plot::new("timings")
                        .y_axis_label("Segundos")
                        .legend(Legend::default())
                        .show(&mut columns[2], |plot_ui| {
                            let fill = Color32::from_rgb(0x76, 0xd7, 0xc4);
                            plot_ui.bar_chart(bars(&self.data.timings, fill));
                        });
                });
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::evaluate;
    use crate::limits::BlendLimits;
    use crate::report::default_labels;
    use crate::table::worked_example;
    use float_eq::assert_float_eq;
    use std::time::Duration;

    fn blend(x: Vec<f64>) -> Blend {
        let table = worked_example();
        Blend {
            quantities: x.clone(),
            total_cost: 0.,
            report: evaluate(&table, &x, &BlendLimits::default()).unwrap(),
            exact_quantities: x,
            exact_cost: 0.,
            iterations: 0,
        }
    }

    #[test]
    fn composition_in_percent() {
        let timings = StageTimings {
            solve: Duration::from_millis(3),
            ..StageTimings::default()
        };
        let data = ChartData::new(
            &worked_example(),
            &blend(vec![600., 150., 25., 225.]),
            &default_labels(),
            &timings,
        )
        .unwrap();
        for (share, expected) in data.composition.iter().zip([60., 15., 2.5, 22.5]) {
            assert_float_eq!(share.percent, expected, abs <= 1e-12);
        }
        assert_eq!(data.composition[0].label, "Semillas de trigo");
        assert_float_eq!(data.costs[3].1, 9000., abs <= 1e-9);
        assert_eq!(data.timings.len(), 4);
        assert_float_eq!(data.timings[2].1, 0.003, abs <= 1e-12);
    }

    #[test]
    fn pie_slices_close_the_circle() {
        let data = ChartData::new(
            &worked_example(),
            &blend(vec![500., 250., 0., 250.]),
            &Labels::default(),
            &StageTimings::default(),
        )
        .unwrap();
        let slices = data.pie_slices();
        assert_eq!(slices.len(), 4);
        let close =
            |p: [f64; 2], q: [f64; 2]| (p[0] - q[0]).abs() < 1e-9 && (p[1] - q[1]).abs() < 1e-9;
        assert_eq!(slices[0][0], [0., 0.]);
        // first slice starts at twelve o'clock
        assert!(close(slices[0][1], [0., 1.]));
        // half of the pie, so it ends at six o'clock
        assert!(close(*slices[0].last().unwrap(), [0., -1.]));
        // an empty share is a degenerate sliver
        assert_eq!(slices[2].len(), 3);
        // last slice ends where the first began
        assert!(close(*slices[3].last().unwrap(), [0., 1.]));
    }

    #[test]
    fn empty_blend_cannot_be_drawn() {
        let err = ChartData::new(
            &worked_example(),
            &blend(vec![0.; 4]),
            &default_labels(),
            &StageTimings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Rendering { .. }));
    }
}
