//! Ordinary least squares over (x, y) pairs.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

fn means(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0_f64, 0.0_f64), |(sx, sy), (x, y)| (sx + x, sy + y));
    (sx / n, sy / n)
}

/// Least squares line through `points`.
///
/// Returns `None` when no line can be drawn: fewer than two distinct x
/// values, or a zero denominator.
pub fn fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    let first_x = points.first()?.0;
    if points.iter().all(|(x, _)| *x == first_x) {
        return None;
    }

    let (x_mean, y_mean) = means(points);
    let (num, den) = points.iter().fold((0.0_f64, 0.0_f64), |(num, den), (x, y)| {
        let dx = x - x_mean;
        (num + dx * (y - y_mean), den + dx * dx)
    });
    if den == 0.0 {
        return None;
    }

    let slope = num / den;
    Some(LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

/// Pearson correlation coefficient, `None` if either variable is constant.
pub fn pearson(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let (x_mean, y_mean) = means(points);
    let (cov, var_x, var_y) = points
        .iter()
        .fold((0.0_f64, 0.0_f64, 0.0_f64), |(c, vx, vy), (x, y)| {
            let (dx, dy) = (x - x_mean, y - y_mean);
            (c + dx * dy, vx + dx * dx, vy + dy * dy)
        });
    let denominator = (var_x * var_y).sqrt();
    (denominator > 0.0).then(|| cov / denominator)
}
