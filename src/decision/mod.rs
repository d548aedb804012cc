//! Forecast vs. intrinsic value comparison.

use crate::domain::{Recommendation, Signal};

/// Compare the DCF implied price with the forecast next close.
///
/// The implied price below the forecast means the market is expected to
/// trade above fair value (SHORT); above means LONG. Only exact equality holds.
pub fn compare(predicted_price: f64, implied_price: f64) -> Recommendation {
    let signal = if implied_price < predicted_price {
        Signal::Short
    } else if implied_price > predicted_price {
        Signal::Long
    } else {
        Signal::Hold
    };
    Recommendation {
        signal,
        delta: (implied_price - predicted_price).abs(),
        implied_price,
        predicted_price,
    }
}

/// Human-readable recommendation line.
pub fn recommendation_message(rec: &Recommendation) -> String {
    match rec.signal {
        Signal::Short => format!(
            "Stock is overvalued by ${:.2}. Recommended action: SHORT.",
            rec.delta
        ),
        Signal::Long => format!(
            "Stock is undervalued by ${:.2}. Recommended action: LONG.",
            rec.delta
        ),
        Signal::Hold => "Stock is correctly priced. No recommended trading action.".to_string(),
    }
}
