// Mean CUR errors of an approximately low-rank matrix as the sample size grows.

use plotters::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rusty_cur::prelude::*;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn main() {
    let dimension = (300, 200);
    let rank = 10;
    let num_trials = 10;

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let mat = f64::random_approximate_low_rank_matrix(dimension, 1.0, 1E-10, &mut rng).unwrap();

    let mut uniform = Vec::new();
    let mut uniform_k = Vec::new();
    let mut adaptive = Vec::new();

    for num_cols in (rank..=60).step_by(5) {
        let config = CurConfig::new(rank, num_cols, num_cols, num_trials)
            .with_metrics(MetricFlags::all())
            .with_seed(1);
        let trials = CurExperiment::new(config.clone())
            .run_parallel(mat.view())
            .unwrap();

        uniform.push((num_cols, mean(trials.froerr.as_ref().unwrap())));
        uniform_k.push((num_cols, mean(trials.froerr_k.as_ref().unwrap())));

        let config = CurConfig {
            num_rows: 2 * num_cols,
            adaptive: true,
            ..config
        };
        let trials = CurExperiment::new(config).run_parallel(mat.view()).unwrap();
        adaptive.push((num_cols, mean(trials.froerr.as_ref().unwrap())));

        println!(
            "c = {:3}: froerr {:.2E}, froerr_k {:.2E}, adaptive froerr {:.2E}",
            num_cols,
            uniform.last().unwrap().1,
            uniform_k.last().unwrap().1,
            adaptive.last().unwrap().1
        );
    }

    let root = BitMapBackend::new("cur_errors.png", (640, 480)).into_drawing_area();
    root.fill(&WHITE).unwrap();
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(rank..60, (1E-12..1.0).log_scale())
        .unwrap();

    chart
        .configure_mesh()
        .x_labels(10)
        .y_labels(10)
        .x_desc("Sampled columns c")
        .y_label_formatter(&|item| format!("{:.1E}", item))
        .y_desc("Mean Frobenius error")
        .draw()
        .unwrap();

    for (series, color, label) in [
        (uniform, BLACK, "CUR, r = c"),
        (uniform_k, RED, "rank k CUR, r = c"),
        (adaptive, BLUE, "adaptive CUR, r = 2c"),
    ] {
        let style = ShapeStyle::from(&color);
        chart
            .draw_series(LineSeries::new(series, style))
            .unwrap()
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    chart.configure_series_labels().draw().unwrap();
}
