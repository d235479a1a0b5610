//! Cubic Hermite evaluation and arc-length tables.

use burrow_math::{Point3, Vec3};

/// Number of chords used to tabulate the length of one segment.
pub(crate) const SAMPLES_PER_SEGMENT: usize = 64;

/// One curve piece between two control points.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HermiteSegment {
    pub p0: Point3,
    pub m0: Vec3,
    pub p1: Point3,
    pub m1: Vec3,
    pub linear: bool,
}

impl HermiteSegment {
    /// Position at parameter `t` in `[0, 1]`.
    pub fn evaluate(&self, t: f64) -> Point3 {
        if self.linear {
            return self.p0 + (self.p1 - self.p0) * t;
        }
        let t2 = t * t;
        let t3 = t2 * t;
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;
        Point3::from(
            self.p0.coords * h00 + self.m0 * h10 + self.p1.coords * h01 + self.m1 * h11,
        )
    }

    /// First derivative at parameter `t`.
    pub fn derivative(&self, t: f64) -> Vec3 {
        if self.linear {
            return self.p1 - self.p0;
        }
        let t2 = t * t;
        let d00 = 6.0 * t2 - 6.0 * t;
        let d10 = 3.0 * t2 - 4.0 * t + 1.0;
        let d01 = -6.0 * t2 + 6.0 * t;
        let d11 = 3.0 * t2 - 2.0 * t;
        self.p0.coords * d00 + self.m0 * d10 + self.p1.coords * d01 + self.m1 * d11
    }

    /// Cumulative chord lengths at `SAMPLES_PER_SEGMENT + 1` uniform parameters.
    pub fn arc_table(&self) -> Vec<f64> {
        let mut table = Vec::with_capacity(SAMPLES_PER_SEGMENT + 1);
        table.push(0.0);
        let mut prev = self.evaluate(0.0);
        let mut total = 0.0;
        for i in 1..=SAMPLES_PER_SEGMENT {
            let p = self.evaluate(i as f64 / SAMPLES_PER_SEGMENT as f64);
            total += (p - prev).norm();
            table.push(total);
            prev = p;
        }
        table
    }
}

/// Invert a cumulative arc table: parameter `t` at which `length` is reached.
pub(crate) fn parameter_at_length(table: &[f64], length: f64) -> f64 {
    let n = table.len().saturating_sub(1);
    if n == 0 {
        return 0.0;
    }
    let total = table[n];
    if length <= 0.0 || total <= 0.0 {
        return 0.0;
    }
    if length >= total {
        return 1.0;
    }
    // First sample whose cumulative length reaches `length`.
    let hi = table.partition_point(|&l| l < length).clamp(1, n);
    let lo = hi - 1;
    let span = table[hi] - table[lo];
    let frac = if span > 0.0 {
        (length - table[lo]) / span
    } else {
        0.0
    };
    (lo as f64 + frac) / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight() -> HermiteSegment {
        HermiteSegment {
            p0: Point3::origin(),
            m0: Vec3::new(100.0, 0.0, 0.0),
            p1: Point3::new(100.0, 0.0, 0.0),
            m1: Vec3::new(100.0, 0.0, 0.0),
            linear: false,
        }
    }

    #[test]
    fn test_endpoints() {
        let seg = straight();
        assert!((seg.evaluate(0.0) - seg.p0).norm() < 1e-12);
        assert!((seg.evaluate(1.0) - seg.p1).norm() < 1e-12);
    }

    #[test]
    fn test_derivative_matches_tangents() {
        let seg = straight();
        assert!((seg.derivative(0.0) - seg.m0).norm() < 1e-9);
        assert!((seg.derivative(1.0) - seg.m1).norm() < 1e-9);
    }

    #[test]
    fn test_arc_table_straight_length() {
        let table = straight().arc_table();
        assert_eq!(table.len(), SAMPLES_PER_SEGMENT + 1);
        assert!((table[SAMPLES_PER_SEGMENT] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_parameter_at_length_bounds() {
        let table = straight().arc_table();
        assert_eq!(parameter_at_length(&table, -5.0), 0.0);
        assert_eq!(parameter_at_length(&table, 500.0), 1.0);
        assert!((parameter_at_length(&table, 50.0) - 0.5).abs() < 1e-9);
    }
}
