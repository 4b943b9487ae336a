//! Per-account portfolio report: one row per symbol with its yields, plus
//! account totals and the share of equity that moved up or down.

use crate::models::*;
use chrono::NaiveDate;
use lot_engine::dates::{format_duration, valuation_date};
use lot_engine::{
    collect_underlying_symbols, decode_option_symbol, group_by_symbol, group_info, is_option_symbol, Lot,
    OptionRight,
};
use std::collections::BTreeMap;

/// Quote moves smaller than this count as unchanged.
const QUOTE_CHANGE_THRESHOLD: f64 = 0.0005;

pub fn build_portfolio_report(snapshot: &ReportSnapshot, today: NaiveDate) -> PortfolioReport {
    let date = valuation_date(snapshot.year, snapshot.date, today);
    let accounts: Vec<AccountReport> = snapshot
        .accounts
        .iter()
        .map(|(name, account)| account_report(name, account, date, &snapshot.quotes, &snapshot.oldquotes))
        .collect();
    tracing::info!("Built portfolio report for {} ({} accounts)", date, accounts.len());

    PortfolioReport {
        date,
        year: snapshot.year,
        account: snapshot.account.clone(),
        accounts,
    }
}

pub fn account_report(
    name: &str,
    account: &AccountSnapshot,
    date: NaiveDate,
    quotes: &Quotes,
    old_quotes: &Quotes,
) -> AccountReport {
    let has_options = account.lots.iter().any(Lot::is_option);
    let totals = account_totals(account, quotes, old_quotes);
    let groups = group_by_symbol(&account.lots);

    let rows = groups
        .sorted_symbols()
        .into_iter()
        .filter_map(|symbol| {
            let lots = groups.get(symbol)?;
            let info = group_info(symbol, lots, date, quotes, old_quotes);
            let equity_percent = if totals.equity != 0.0 {
                100.0 * info.current_value / totals.equity
            } else {
                0.0
            };
            Some(GroupRow {
                lot_count: lots.len(),
                is_option: is_option_symbol(symbol),
                equity_percent,
                held: format_duration(info.avg_days_held),
                quote_change: info.quote_change(),
                gain_change: info.gain_change(),
                annual_return: info.annual_return(),
                dividend_yield: info.dividend_yield_percent(),
                info,
            })
        })
        .collect();

    AccountReport {
        name: name.to_string(),
        has_options,
        groups: rows,
        totals,
        up_down: up_down(&account.lots, quotes, old_quotes),
    }
}

/// Equity, cash and their changes since the previous close.
pub fn account_totals(account: &AccountSnapshot, quotes: &Quotes, old_quotes: &Quotes) -> AccountTotals {
    let mut equity = 0.0;
    let mut equity_diff = account.equity_diff;
    let mut put_hold = 0.0;
    for lot in &account.lots {
        let quote = quotes.get(&lot.symbol).copied().unwrap_or(0.0);
        let old_quote = old_quotes.get(&lot.symbol).copied().unwrap_or(0.0);
        equity += lot.nshares * quote;
        equity_diff += lot.nshares * (quote - old_quote);
        if lot.nshares < 0.0 {
            if let Some(contract) = decode_option_symbol(&lot.symbol) {
                if contract.right == OptionRight::Put {
                    put_hold += -lot.nshares * contract.strike;
                }
            }
        }
    }

    let total_value = equity + account.cash;
    let total_diff = equity_diff + account.cash_diff;
    let base = total_value - total_diff;
    AccountTotals {
        cash: account.cash,
        cash_diff: account.cash_diff,
        equity,
        equity_diff,
        put_hold,
        total_value,
        total_diff,
        total_ratio: if base > 0.0 { Some(total_value / base) } else { None },
    }
}

/// Split of long equity into symbols that moved up or down today.
pub fn up_down(lots: &[Lot], quotes: &Quotes, old_quotes: &Quotes) -> UpDown {
    let mut nshares = BTreeMap::new();
    let mut up_amount = 0.0;
    let mut down_amount = 0.0;
    let mut up_equity = 0.0;
    let mut down_equity = 0.0;
    let mut total_equity = 0.0;

    for symbol in collect_underlying_symbols(lots) {
        let total_shares: f64 = lots
            .iter()
            .filter(|l| l.symbol == symbol)
            .map(|l| l.nshares)
            .sum();
        if total_shares > 0.0 {
            let quote = quotes.get(&symbol).copied().unwrap_or(0.0);
            let amount = total_shares * quote;
            total_equity += amount;
            let diff = quote - old_quotes.get(&symbol).copied().unwrap_or(0.0);
            if diff >= QUOTE_CHANGE_THRESHOLD {
                up_equity += amount;
                up_amount += diff * total_shares;
            } else if diff <= -QUOTE_CHANGE_THRESHOLD {
                down_equity += amount;
                down_amount -= diff * total_shares;
            }
        }
        nshares.insert(symbol, total_shares);
    }

    let (up_percent, mut down_percent) = if total_equity > 0.0 {
        (
            (100.0 * up_equity / total_equity).round() as i64,
            (100.0 * down_equity / total_equity).round() as i64,
        )
    } else {
        (0, 0)
    };
    if up_percent + down_percent > 100 {
        down_percent = 100 - up_percent;
    }

    UpDown {
        nshares,
        up_amount,
        down_amount,
        up_percent,
        down_percent,
    }
}
