//! Option trading results per underlying, including the stock move
//! realized through assignment and open contracts marked to market.

use crate::models::*;
use lot_engine::{collect_underlying_symbols, complete_unrealized, decode_option_symbol, CompletedLot, LotTotal, OptionContract};

pub fn build_options_report(snapshot: &OptionsSnapshot) -> OptionsReport {
    let mut lots: Vec<CompletedLot> = snapshot
        .completed_lots
        .iter()
        .chain(&snapshot.completed_buckets)
        .cloned()
        .collect();
    let assigned = snapshot.assigned_lots.iter().chain(&snapshot.assigned_buckets);
    lots.extend(assigned.cloned().map(|mut lot| {
        lot.assigned = true;
        lot
    }));
    lots.sort_by_key(|lot| lot.end_date);
    lots.extend(complete_unrealized(&snapshot.lots, &snapshot.quotes, None));

    let mut groups = Vec::new();
    let mut grand_total = 0.0;
    for underlying in collect_underlying_symbols(&lots) {
        let rows: Vec<OptionRow> = lots
            .iter()
            .filter_map(|lot| {
                let contract = decode_option_symbol(&lot.symbol)?;
                if contract.underlying != underlying {
                    return None;
                }
                Some(option_row(lot, &contract, snapshot))
            })
            .collect();
        if rows.is_empty() {
            continue;
        }
        let total: f64 = rows.iter().map(|r| r.gain).sum();
        grand_total += total;
        groups.push(OptionGroup {
            underlying,
            rows,
            total,
        });
    }
    tracing::info!("Built options report: {} underlyings, total {:.2}", groups.len(), grand_total);

    OptionsReport {
        date: snapshot.date,
        account: snapshot.account.clone(),
        groups,
        grand_total,
    }
}

fn option_row(lot: &CompletedLot, contract: &OptionContract, snapshot: &OptionsSnapshot) -> OptionRow {
    let total = LotTotal::of(lot);
    let mut amount = total.amount;
    let mut stock = None;
    if lot.assigned {
        let stock_move = assignment_quote(lot, contract, snapshot) - contract.strike;
        amount += stock_move * lot.nshares * contract.right.sign();
        stock = Some(stock_move);
    }
    OptionRow {
        symbol: lot.symbol.clone(),
        nshares: lot.nshares,
        start_date: lot.start_date,
        end_date: lot.end_date,
        start_share_price: lot.start_share_price,
        end_share_price: lot.end_share_price,
        stock,
        gain: amount - total.basis,
        unrealized: lot.end_date.is_none(),
    }
}

/// Underlying quote on the assignment date, 0 when unknown.
fn assignment_quote(lot: &CompletedLot, contract: &OptionContract, snapshot: &OptionsSnapshot) -> f64 {
    let quote = lot.end_date.and_then(|end| {
        snapshot
            .historical_quotes
            .get(&end.format("%Y-%m-%d").to_string())
            .and_then(|quotes| quotes.get(&contract.underlying))
            .copied()
    });
    if quote.is_none() {
        tracing::warn!(
            "No historical quote for {} on {:?}, using 0",
            contract.underlying,
            lot.end_date
        );
    }
    quote.unwrap_or(0.0)
}
