//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the forecasting/valuation code stays clean and testable
//! - output changes are localized

use crate::decision::recommendation_message;
use crate::domain::{HyperparameterCandidate, Recommendation, Valuation};
use crate::forecast::ForecastRun;

/// Forecast section: data, split, winning candidate, errors, next price.
pub fn format_forecast_summary(run: &ForecastRun, source: &str) -> String {
    let f = &run.output;
    let mut out = String::new();

    out.push_str("=== dsig - Forecast ===\n");
    out.push_str(&format!("Source: {source}\n"));
    out.push_str(&format!(
        "Rows: {} after feature warm-up | train={} test={}\n",
        run.dataset_rows, f.train_rows, f.test_rows
    ));
    out.push_str(&format!("Features ({}): {}\n", f.feature_names.len(), f.feature_names.join(", ")));

    let failed = run.trials.iter().filter(|t| t.mean_mae().is_none()).count();
    out.push_str(&format!(
        "Search: {} trial(s), {} failed | winner = trial {}\n",
        run.trials.len(),
        failed,
        run.winning_trial
    ));
    out.push_str(&format!("- {}\n", fmt_candidate(&f.best_candidate)));

    out.push_str(&format!("CV MAE       : {:.4}\n", f.cv_mae));
    out.push_str(&format!("Held-out MAE : {:.4}\n", f.held_out_mae));
    out.push_str(&format!("Last close   : {:.4}\n", f.last_actual));
    out.push_str(&format!("Next close   : {:.4}\n", f.predicted_next_price));
    out.push_str(&format!("Drift (ln)   : {:+.6}\n", f.drift));

    out
}

/// Valuation section: the per-year table plus headline numbers.
pub fn format_valuation(valuation: &Valuation) -> String {
    let mut out = String::new();
    out.push_str("=== dsig - DCF ===\n");
    out.push_str(&format_cashflow_table(valuation));
    out.push('\n');

    out.push_str(&format!("Terminal value     : {}\n", fmt_money(valuation.terminal_value)));
    out.push_str(&format!("PV terminal value  : {}\n", fmt_money(valuation.pv_terminal_value)));
    out.push_str(&format!(
        "Enterprise value   : {}\n",
        fmt_money(valuation.result.enterprise_value)
    ));
    out.push_str(&format!("Equity value       : {}\n", fmt_money(valuation.result.equity_value)));
    out.push_str(&format!("Implied share price: {:.2}\n", valuation.result.implied_price));

    out
}

/// Decision section.
pub fn format_recommendation(rec: &Recommendation) -> String {
    format!(
        "=== dsig - Decision ===\nPredicted next close: {:.2} | DCF implied price: {:.2}\n{}\n",
        rec.predicted_price,
        rec.implied_price,
        recommendation_message(rec)
    )
}

fn format_cashflow_table(valuation: &Valuation) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>4} {:>16} {:>7} {:>16} {:>14} {:>16} {:>14} {:>16} {:>10} {:>16}",
            "year", "revenue", "margin", "ebitda", "d&a", "nopat", "capex", "fcff", "discount", "pv_fcff"
        )
        .trim_end(),
    );
    out.push('\n');

    for r in &valuation.rows {
        out.push_str(
            format!(
                "{:>4} {:>16} {:>7.3} {:>16} {:>14} {:>16} {:>14} {:>16} {:>10.5} {:>16}",
                r.year,
                fmt_money(r.revenue),
                r.ebitda_margin,
                fmt_money(r.ebitda),
                fmt_money(r.d_and_a),
                fmt_money(r.nopat),
                fmt_money(r.capex),
                fmt_money(r.fcff),
                r.discount_factor,
                fmt_money(r.pv_fcff),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn fmt_candidate(c: &HyperparameterCandidate) -> String {
    format!(
        "trees={} max_depth={} min_split={} min_leaf={} max_features={} bootstrap={} max_leaf_nodes={}",
        c.n_estimators,
        c.max_depth,
        c.min_samples_split,
        c.min_samples_leaf,
        c.max_features.label(),
        c.bootstrap,
        c.max_leaf_nodes
    )
}

/// Two decimals with thousands separators, e.g. `-1,234,567.89`.
pub fn fmt_money(v: f64) -> String {
    if !v.is_finite() {
        return format!("{v}");
    }
    let raw = format!("{:.2}", v.abs());
    let (int_part, frac) = raw.split_once('.').unwrap_or((raw.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 && raw != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}
