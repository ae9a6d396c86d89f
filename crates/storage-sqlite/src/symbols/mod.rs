//! SQLite storage implementation for symbols, company names and index memberships.

mod model;
mod repository;

pub use model::{EquityNameDB, MembershipDB, SymbolDB};
pub use repository::SymbolRepository;

// Re-export trait from core for convenience
pub use symdex_core::symbols::{SymbolRepositoryTrait, SymbolStoreTrait};
