//! Tax year report: realized gains, open positions valued at year end,
//! dividends and pending wash sale restrictions.

use crate::models::*;
use lot_engine::dates::year_end;
use lot_engine::{
    collect_underlying_symbols, complete_unrealized, disallowed_wash_sale, effective_symbol,
    wash_sale_restrictions, CompletedLot, HoldingPeriod, LotTotal, TermTotals,
};
use std::collections::BTreeMap;

pub fn build_tax_report(snapshot: &TaxSnapshot) -> TaxReport {
    let completed = snapshot.realized_lots();
    let realized = tax_section(&completed);

    let open = complete_unrealized(&snapshot.lots, &snapshot.quotes, Some(year_end(snapshot.year)));
    let mut pending = tax_section(&open);
    pending.has_wash_sale = false;

    let restrictions = wash_sale_restrictions(&completed);
    tracing::info!(
        "Built {} tax report for {}: {} realized, {} open, {} wash sale restrictions",
        snapshot.year,
        snapshot.account,
        completed.len(),
        open.len(),
        restrictions.len()
    );

    TaxReport {
        year: snapshot.year,
        account: snapshot.account.clone(),
        realized,
        pending,
        dividends: dividend_summary(&snapshot.dividend),
        wash_sale_restrictions: restrictions,
    }
}

/// Lots grouped by underlying symbol within each holding period. Rows of a
/// group run from the most recent lot to the oldest.
pub fn tax_section(lots: &[CompletedLot]) -> TaxSection {
    let symbols = collect_underlying_symbols(lots);
    let mut section = TaxSection {
        totals: lots.iter().collect::<TermTotals>(),
        has_wash_sale: lots.iter().any(|l| l.wash_sale != 0.0),
        ..Default::default()
    };

    for period in [HoldingPeriod::ShortTerm, HoldingPeriod::LongTerm] {
        let groups: Vec<TaxGroup> = symbols
            .iter()
            .filter_map(|symbol| {
                let rows: Vec<TaxRow> = lots
                    .iter()
                    .rev()
                    .filter(|l| effective_symbol(&l.symbol) == *symbol && HoldingPeriod::of(l) == period)
                    .map(tax_row)
                    .collect();
                if rows.is_empty() {
                    return None;
                }
                Some(TaxGroup {
                    symbol: symbol.clone(),
                    total_gain: rows.iter().map(|r| r.gain).sum(),
                    rows,
                })
            })
            .collect();
        match period {
            HoldingPeriod::ShortTerm => section.short_term = groups,
            HoldingPeriod::LongTerm => section.long_term = groups,
        }
    }
    section
}

fn tax_row(lot: &CompletedLot) -> TaxRow {
    let total = LotTotal::of(lot);
    TaxRow {
        symbol: lot.symbol.clone(),
        nshares: lot.nshares,
        start_date: lot.holding_start(),
        end_date: lot.end_date,
        start_share_price: lot.start_share_price,
        end_share_price: lot.end_share_price,
        basis: total.basis,
        amount: total.amount,
        gain: total.gain,
        wash_sale: disallowed_wash_sale(lot),
        account: lot.account.clone(),
    }
}

pub fn dividend_summary(dividend: &BTreeMap<String, f64>) -> DividendSummary {
    DividendSummary {
        rows: dividend.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        total: dividend.values().sum(),
    }
}
