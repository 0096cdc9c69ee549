use chrono::{Duration, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::models::{EquityPoint, Position};

/// Mean of the simulated simple daily return.
pub const DAILY_RETURN_MEAN: f64 = 0.001;
/// Standard deviation of the simulated simple daily return.
pub const DAILY_RETURN_STD_DEV: f64 = 0.02;

/// Longest synthetic series accepted: ten years of calendar days.
pub const MAX_SYNTHETIC_DAYS: usize = 3_650;

pub const SYNTHETIC_SYMBOLS: [&str; 8] = ["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA", "META", "JPM"];

// Separate ChaCha stream so the fabricated book does not consume the return series' draws.
const POSITIONS_STREAM: u64 = 1;

/// Draws `count` simple daily returns from Normal(mean, std_dev).
///
/// ChaCha8 output is fixed for a given seed across platforms and crate
/// releases, so a seed fully determines the series.
pub fn generate_daily_returns(seed: u64, count: usize) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let z: f64 = rng.sample(StandardNormal);
            DAILY_RETURN_MEAN + DAILY_RETURN_STD_DEV * z
        })
        .collect()
}

/// Compounds generated returns into `num_days` portfolio values starting at `initial_value`.
pub fn generate_value_series(seed: u64, num_days: usize, initial_value: f64) -> Vec<f64> {
    if num_days == 0 {
        return Vec::new();
    }

    let returns = generate_daily_returns(seed, num_days - 1);
    let mut values = Vec::with_capacity(num_days);
    values.push(initial_value);
    for r in returns {
        let prev = values[values.len() - 1];
        values.push(prev * (1.0 + r));
    }
    values
}

/// Attaches calendar dates to a value series so that the last value falls on `end`.
pub fn dated_series(values: &[f64], end: NaiveDate) -> Vec<EquityPoint> {
    let len = values.len() as i64;
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| EquityPoint::new(end - Duration::days(len - 1 - i as i64), value))
        .collect()
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A deterministic fabricated book for synthetic mode.
pub fn synthetic_positions(seed: u64) -> Vec<Position> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(POSITIONS_STREAM);

    SYNTHETIC_SYMBOLS
        .iter()
        .map(|symbol| {
            let quantity: i64 = rng.random_range(10..=200);
            let entry_price = round_cents(rng.random_range(50.0..500.0));
            let z: f64 = rng.sample(StandardNormal);
            let current_price = round_cents((entry_price * (1.0 + 0.05 + 0.15 * z)).max(0.01));
            Position::from_prices(*symbol, quantity, entry_price, current_price)
        })
        .collect()
}
