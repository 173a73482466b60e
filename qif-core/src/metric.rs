//! Distances over finite domains. Domain elements are addressed by index;
//! the same abstraction serves as a privacy metric (secret × secret or
//! secret × output) and as a loss function (secret × output).

use serde::{Deserialize, Serialize};

use crate::scalar::Scalar;

pub trait Metric<T> {
    fn distance(&self, a: usize, b: usize) -> T;
}

impl<T, F> Metric<T> for F
where
    F: Fn(usize, usize) -> T,
{
    fn distance(&self, a: usize, b: usize) -> T {
        self(a, b)
    }
}

/// `0` on the diagonal, `1` everywhere else.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrete;

impl<T: Scalar> Metric<T> for Discrete {
    fn distance(&self, a: usize, b: usize) -> T {
        if a == b {
            T::zero()
        } else {
            T::one()
        }
    }
}

/// Points evenly spaced on a line: `|a - b| * step`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Scalar")]
pub struct LineDistance<T> {
    pub step: T,
}

impl<T: Scalar> LineDistance<T> {
    pub fn new(step: T) -> Self {
        Self { step }
    }
}

impl<T: Scalar> Metric<T> for LineDistance<T> {
    fn distance(&self, a: usize, b: usize) -> T {
        T::of(a.abs_diff(b) as f64) * self.step
    }
}

/// Euclidean distance between cells of a row-major grid `width` cells wide,
/// each `step` units across.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Scalar")]
pub struct GridEuclidean<T> {
    pub width: usize,
    pub step: T,
}

impl<T: Scalar> GridEuclidean<T> {
    pub fn new(width: usize, step: T) -> Self {
        assert!(width > 0, "grid width must be positive");
        Self { width, step }
    }

    pub fn coordinates(&self, cell: usize) -> (usize, usize) {
        (cell % self.width, cell / self.width)
    }
}

impl<T: Scalar> Metric<T> for GridEuclidean<T> {
    fn distance(&self, a: usize, b: usize) -> T {
        let (ax, ay) = self.coordinates(a);
        let (bx, by) = self.coordinates(b);
        let dx = T::of(ax.abs_diff(bx) as f64);
        let dy = T::of(ay.abs_diff(by) as f64);
        dx.hypot(dy) * self.step
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn closures_are_metrics() {
        let d = |a: usize, b: usize| (a as f64 - b as f64).abs();
        assert_eq!(d.distance(1, 4), 3.0);
        assert_eq!(d.distance(4, 1), 3.0);
    }

    #[test]
    fn discrete_is_zero_only_on_the_diagonal() {
        assert_eq!(Metric::<f64>::distance(&Discrete, 2, 2), 0.0);
        assert_eq!(Metric::<f64>::distance(&Discrete, 2, 3), 1.0);
    }

    #[test]
    fn line_distance_scales_by_step() {
        let d = LineDistance::new(0.5f32);
        assert_eq!(d.distance(0, 3), 1.5);
        assert_eq!(d.distance(3, 0), 1.5);
    }

    #[test]
    fn grid_distance_is_euclidean() {
        let d = GridEuclidean::new(3, 2.0f64);
        assert_eq!(d.coordinates(5), (2, 1));
        assert_relative_eq!(d.distance(0, 4), 2.0 * 2f64.sqrt());
        assert_relative_eq!(d.distance(0, 6), 4.0);
    }
}
