//! Small descriptive-statistics helpers.
//!
//! Reductions run sequentially over slices in their given order so results are
//! bit-stable for identical inputs. Percentiles use linear interpolation
//! between closest ranks.

use gr_core::Distribution;

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(xs: &[f64]) -> Option<f64> {
    let m = mean(xs)?;
    let var = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64;
    Some(var.sqrt())
}

/// `p` in `[0, 100]` over an ascending-sorted slice.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Mean, std-dev, p5 and p95. Sorts `samples` in place.
pub fn summarize(samples: &mut [f64]) -> Option<Distribution> {
    let mean = mean(samples)?;
    let std_dev = std_dev(samples)?;
    samples.sort_by(|a, b| a.total_cmp(b));
    Some(Distribution {
        mean,
        std_dev,
        p5: percentile_sorted(samples, 5.0)?,
        p95: percentile_sorted(samples, 95.0)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_yield_none() {
        assert!(mean(&[]).is_none());
        assert!(summarize(&mut []).is_none());
    }

    #[test]
    fn percentiles_interpolate() {
        let xs: Vec<f64> = (1..=11).map(f64::from).collect();
        assert_eq!(percentile_sorted(&xs, 0.0), Some(1.0));
        assert_eq!(percentile_sorted(&xs, 50.0), Some(6.0));
        assert_eq!(percentile_sorted(&xs, 100.0), Some(11.0));
        assert!((percentile_sorted(&xs, 5.0).unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn summarize_constant_samples() {
        let mut xs = vec![4.0; 10];
        let d = summarize(&mut xs).unwrap();
        assert_eq!(d.mean, 4.0);
        assert_eq!(d.std_dev, 0.0);
        assert_eq!(d.p5, 4.0);
        assert_eq!(d.p95, 4.0);
    }

    #[test]
    fn population_std_dev() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(std_dev(&xs), Some(2.0));
    }
}
