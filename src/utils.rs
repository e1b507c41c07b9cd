use rand_distr::LogNormal;

/// Seed used when a configuration leaves the random seed unset.
/// Keeping it fixed makes unseeded runs repeatable too.
pub const DEFAULT_SEED: u64 = 42;

/// Convert mean and standard deviation to log-normal distribution parameters
/// Returns (μ, σ) for LogNormal(μ, σ) that approximates the given mean and stddev
///
/// For LogNormal(μ, σ):
/// - E[X] = exp(μ + σ²/2)
/// - Var[X] = (exp(σ²) - 1) * exp(2μ + σ²)
///
/// To convert from mean (m) and stddev (s):
/// - σ = sqrt(ln(1 + s²/m²))
/// - μ = ln(m) - σ²/2
fn lognormal_from_mean_stddev(mean: f64, stddev: f64) -> (f64, f64) {
    let variance = stddev * stddev;
    let sigma_squared = (1.0 + variance / (mean * mean)).ln();
    let sigma = sigma_squared.sqrt();
    let mu = mean.ln() - sigma_squared / 2.0;
    (mu, sigma)
}

/// Create a log-normal distribution from mean and standard deviation
/// This is a convenience wrapper that converts mean/stddev to log-normal parameters
pub fn lognormal_dist(mean: f64, stddev: f64) -> LogNormal<f64> {
    let (mu, sigma) = lognormal_from_mean_stddev(mean, stddev);
    LogNormal::new(mu, sigma).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::Distribution;

    #[test]
    fn test_lognormal_dist_mean() {
        // Sampled mean should land near the requested mean
        let dist = lognormal_dist(10.0, 3.0);
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20000;
        let sum: f64 = (0..n).map(|_| Distribution::sample(&dist, &mut rng)).sum();
        let mean = sum / n as f64;
        assert!((mean - 10.0).abs() < 0.5, "sampled mean {} too far from 10.0", mean);
    }
}
