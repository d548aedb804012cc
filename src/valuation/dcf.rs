//! Discounted-cash-flow projection.
//!
//! Per forecast year `y = 1..N`:
//!
//! ```text
//! ebitda  = revenue * margin
//! d_and_a = revenue * d_a%
//! ebit    = ebitda - d_and_a
//! nopat   = ebit * (1 - tax)
//! capex   = revenue * capex%
//! nwc     = revenue * nwc%
//! dnwc    = nwc[y] - nwc[y-1]     (year 1: the full nwc[1])
//! fcff    = nopat + d_and_a - capex - dnwc
//! pv      = fcff / (1 + wacc)^y
//! ```
//!
//! Terminal value uses the Gordon growth formula on the final year's FCFF and
//! is discounted over `N` years. All preconditions are checked before any
//! arithmetic, so an error never comes with a partial table.

use tracing::info;

use crate::domain::{CashFlowRow, DcfAssumptions, Valuation, ValuationResult};
use crate::error::ValuationPreconditionError;

pub fn validate(a: &DcfAssumptions) -> Result<(), ValuationPreconditionError> {
    let scalars = [
        ("wacc", a.wacc),
        ("terminal_growth_rate", a.terminal_growth_rate),
        ("tax_rate", a.tax_rate),
        ("d_a_percent_revenue", a.d_a_percent_revenue),
        ("nwc_percent_revenue", a.nwc_percent_revenue),
        ("capex_percent_revenue", a.capex_percent_revenue),
        ("net_debt", a.net_debt),
        ("shares_outstanding", a.shares_outstanding),
    ];
    if let Some((name, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
        return Err(ValuationPreconditionError::NonFinite(name));
    }
    if a.ebitda_margins.iter().any(|m| !m.is_finite()) {
        return Err(ValuationPreconditionError::NonFinite("ebitda_margins"));
    }

    if a.wacc <= a.terminal_growth_rate {
        return Err(ValuationPreconditionError::RateOrdering {
            wacc: a.wacc,
            growth: a.terminal_growth_rate,
        });
    }
    if a.revenues.len() != a.ebitda_margins.len() {
        return Err(ValuationPreconditionError::LengthMismatch {
            revenues: a.revenues.len(),
            margins: a.ebitda_margins.len(),
        });
    }
    if a.revenues.is_empty() {
        return Err(ValuationPreconditionError::EmptyProjection);
    }
    if let Some((i, &value)) = a
        .revenues
        .iter()
        .enumerate()
        .find(|(_, r)| !(r.is_finite() && **r > 0.0))
    {
        return Err(ValuationPreconditionError::NonPositiveRevenue { year: i + 1, value });
    }
    if a.shares_outstanding <= 0.0 {
        return Err(ValuationPreconditionError::NonPositiveShares(a.shares_outstanding));
    }
    Ok(())
}

/// Project cash flows and back out the implied share price.
pub fn calculate_dcf(a: &DcfAssumptions) -> Result<Valuation, ValuationPreconditionError> {
    validate(a)?;

    let mut rows = Vec::with_capacity(a.revenues.len());
    let mut prev_nwc: Option<f64> = None;
    for (i, (&revenue, &margin)) in a.revenues.iter().zip(&a.ebitda_margins).enumerate() {
        let year = i + 1;
        let ebitda = revenue * margin;
        let d_and_a = revenue * a.d_a_percent_revenue;
        let ebit = ebitda - d_and_a;
        let nopat = ebit * (1.0 - a.tax_rate);
        let capex = revenue * a.capex_percent_revenue;
        let nwc = revenue * a.nwc_percent_revenue;
        // No prior-period baseline: year 1 charges its whole working-capital build.
        let change_in_nwc = match prev_nwc {
            Some(prev) => nwc - prev,
            None => nwc,
        };
        prev_nwc = Some(nwc);

        let fcff = nopat + d_and_a - capex - change_in_nwc;
        let discount_factor = (1.0 + a.wacc).powi(year as i32);
        rows.push(CashFlowRow {
            year,
            revenue,
            ebitda_margin: margin,
            ebitda,
            d_and_a,
            ebit,
            nopat,
            capex,
            nwc,
            change_in_nwc,
            fcff,
            discount_factor,
            pv_fcff: fcff / discount_factor,
        });
    }

    let (last_fcff, horizon) = match rows.last() {
        Some(r) => (r.fcff, r.year),
        None => return Err(ValuationPreconditionError::EmptyProjection),
    };
    let g = a.terminal_growth_rate;
    let terminal_value = last_fcff * (1.0 + g) / (a.wacc - g);
    let pv_terminal_value = terminal_value / (1.0 + a.wacc).powi(horizon as i32);

    let enterprise_value = rows.iter().map(|r| r.pv_fcff).sum::<f64>() + pv_terminal_value;
    let equity_value = enterprise_value - a.net_debt;
    let implied_price = equity_value / a.shares_outstanding;

    info!(
        years = rows.len(),
        enterprise_value, equity_value, implied_price, "DCF valuation complete"
    );

    Ok(Valuation {
        rows,
        terminal_value,
        pv_terminal_value,
        result: ValuationResult {
            enterprise_value,
            equity_value,
            implied_price,
        },
    })
}
