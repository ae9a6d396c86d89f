//! Symbols module - domain models and store traits for symbols, company names and index memberships.

mod symbols_model;
mod symbols_traits;

pub use symbols_model::{
    normalize_company_name, normalize_index_name, normalize_symbol, EquityName, IndexSummary,
    Membership, SymbolStats,
};
pub use symbols_traits::{SymbolRepositoryTrait, SymbolStoreTrait};
