//! Lot Engine
//!
//! Tax-lot accounting for a brokerage portfolio: gain and basis of closed
//! and marked-to-market lots, long/short-term classification, wash sale
//! restrictions, and cash-flow yields solved from a sparse polynomial over
//! day offsets.

pub mod dates;
pub mod error;
pub mod gain;
pub mod lot;
pub mod option;
pub mod polynomial;
pub mod wash_sale;
pub mod yield_engine;

pub use error::{LotError, LotResult};
pub use gain::{disallowed_wash_sale, gain_type, GainType, HoldingPeriod, LotTotal, TermTotals};
pub use lot::{
    collect_underlying_symbols, complete_unrealized, group_by_symbol, CashEvent, CompletedLot, Lot,
    SymbolGroups, Symbolic,
};
pub use option::{decode_option_symbol, effective_symbol, is_option_symbol, OptionContract, OptionRight};
pub use polynomial::{Polynomial, Term};
pub use wash_sale::{wash_sale_restrictions, WashSaleRestriction, WashSaleStatus};
pub use yield_engine::{annualized_percent, group_info, CashFlowBuilder, GroupInfo, PercentChange};
