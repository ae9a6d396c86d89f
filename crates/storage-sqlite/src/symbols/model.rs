//! Database models for symbols, company names and index memberships.

use diesel::prelude::*;

use symdex_core::symbols::{
    normalize_company_name, normalize_index_name, normalize_symbol, EquityName, Membership,
};

/// Database model for a row of `equities`.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::equities)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SymbolDB {
    pub symbol: String,
}

impl SymbolDB {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
        }
    }
}

impl From<SymbolDB> for String {
    fn from(db: SymbolDB) -> Self {
        normalize_symbol(&db.symbol)
    }
}

/// Database model for a row of `equity_membership`.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::equity_membership)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MembershipDB {
    pub symbol: String,
    pub index_name: String,
}

impl From<&Membership> for MembershipDB {
    fn from(membership: &Membership) -> Self {
        Self {
            symbol: normalize_symbol(&membership.symbol),
            index_name: normalize_index_name(&membership.index),
        }
    }
}

impl From<MembershipDB> for Membership {
    fn from(db: MembershipDB) -> Self {
        Membership::new(&db.symbol, &db.index_name)
    }
}

/// Database model for a row of `equity_names`. `as_of` is stored as RFC 3339 text.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::equity_names)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EquityNameDB {
    pub symbol: String,
    pub name: String,
    pub source: Option<String>,
    pub as_of: String,
}

impl From<&EquityName> for EquityNameDB {
    fn from(name: &EquityName) -> Self {
        Self {
            symbol: normalize_symbol(&name.symbol),
            name: normalize_company_name(&name.name),
            source: name.source.clone(),
            as_of: name.as_of.to_rfc3339(),
        }
    }
}
