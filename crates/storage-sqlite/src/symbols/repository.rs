use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use symdex_core::symbols::{
    normalize_index_name, normalize_symbol, EquityName, IndexSummary, Membership,
    SymbolRepositoryTrait, SymbolStoreTrait,
};
use symdex_core::Result;

use super::model::{EquityNameDB, MembershipDB, SymbolDB};
use crate::db::get_connection;
use crate::errors::IntoCore;
use crate::schema::{equities, equity_membership, equity_names};
use crate::utils::{chunk_for_sqlite, chunk_rows_for_sqlite, like_prefix_pattern, LIKE_ESCAPE};

/// Bound parameters per `equity_membership` row.
const MEMBERSHIP_PARAMS: usize = 2;

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Repository for equities, their company names and index memberships.
///
/// Symbol columns use `COLLATE NOCASE`, so equality, `IN` and `LIKE` are
/// case-insensitive and still served by the primary key index.
pub struct SymbolRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
}

impl SymbolRepository {
    pub fn new(pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl SymbolStoreTrait for SymbolRepository {
    fn fetch_exact(&self, query: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;

        let row = equities::table
            .select(SymbolDB::as_select())
            .filter(equities::symbol.eq(query))
            .first::<SymbolDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(row.map(String::from))
    }

    fn fetch_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = equities::table
            .select(SymbolDB::as_select())
            .filter(
                equities::symbol
                    .like(like_prefix_pattern(prefix))
                    .escape(LIKE_ESCAPE),
            )
            .order(equities::symbol.asc())
            .limit(sql_limit(limit))
            .load::<SymbolDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(String::from).collect())
    }

    fn fetch_candidate_pool(&self, limit: usize) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = equities::table
            .select(SymbolDB::as_select())
            .order(equities::symbol.asc())
            .limit(sql_limit(limit))
            .load::<SymbolDB>(&mut conn)
            .into_core()?;

        Ok(rows.into_iter().map(String::from).collect())
    }

    fn fetch_memberships(&self, symbols: &[String]) -> Result<BTreeMap<String, Vec<String>>> {
        if symbols.is_empty() {
            return Ok(BTreeMap::new());
        }
        let mut conn = get_connection(&self.pool)?;

        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for chunk in chunk_for_sqlite(symbols) {
            let rows = equity_membership::table
                .select(MembershipDB::as_select())
                .filter(equity_membership::symbol.eq_any(chunk))
                .load::<MembershipDB>(&mut conn)
                .into_core()?;

            for membership in rows.into_iter().map(Membership::from) {
                grouped
                    .entry(membership.symbol)
                    .or_default()
                    .insert(membership.index);
            }
        }

        Ok(grouped
            .into_iter()
            .map(|(symbol, indices)| (symbol, indices.into_iter().collect()))
            .collect())
    }

    fn fetch_names(&self, symbols: &[String]) -> Result<BTreeMap<String, String>> {
        if symbols.is_empty() {
            return Ok(BTreeMap::new());
        }
        let mut conn = get_connection(&self.pool)?;

        let mut names = BTreeMap::new();
        for chunk in chunk_for_sqlite(symbols) {
            let rows = equity_names::table
                .select((equity_names::symbol, equity_names::name))
                .filter(equity_names::symbol.eq_any(chunk))
                .load::<(String, String)>(&mut conn)
                .into_core()?;

            names.extend(
                rows.into_iter()
                    .map(|(symbol, name)| (normalize_symbol(&symbol), name)),
            );
        }
        Ok(names)
    }
}

impl SymbolRepositoryTrait for SymbolRepository {
    fn upsert_symbols(&self, symbols: &[String]) -> Result<usize> {
        let rows: Vec<SymbolDB> = symbols
            .iter()
            .map(|s| SymbolDB::new(s))
            .filter(|row| !row.symbol.is_empty())
            .collect();
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = get_connection(&self.pool)?;
        let inserted = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                let mut inserted = 0;
                for chunk in chunk_for_sqlite(&rows) {
                    inserted += diesel::insert_or_ignore_into(equities::table)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok(inserted)
            })
            .into_core()?;

        debug!("Inserted {} of {} symbols", inserted, rows.len());
        Ok(inserted)
    }

    fn upsert_memberships(&self, memberships: &[Membership]) -> Result<usize> {
        let rows: Vec<MembershipDB> = memberships
            .iter()
            .map(MembershipDB::from)
            .filter(|row| !row.symbol.is_empty() && !row.index_name.is_empty())
            .collect();
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = get_connection(&self.pool)?;
        let inserted = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                let mut inserted = 0;
                for chunk in chunk_rows_for_sqlite(&rows, MEMBERSHIP_PARAMS) {
                    inserted += diesel::insert_or_ignore_into(equity_membership::table)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok(inserted)
            })
            .into_core()?;

        debug!("Inserted {} of {} memberships", inserted, rows.len());
        Ok(inserted)
    }

    fn upsert_names(&self, names: &[EquityName]) -> Result<usize> {
        let rows: Vec<EquityNameDB> = names
            .iter()
            .map(EquityNameDB::from)
            .filter(|row| !row.symbol.is_empty() && !row.name.is_empty())
            .collect();
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = get_connection(&self.pool)?;
        let written = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                let mut written = 0;
                for chunk in chunk_for_sqlite(&rows) {
                    let symbols: Vec<&str> = chunk.iter().map(|r| r.symbol.as_str()).collect();
                    let mut stored: BTreeMap<String, String> = equity_names::table
                        .select((equity_names::symbol, equity_names::name))
                        .filter(equity_names::symbol.eq_any(symbols))
                        .load::<(String, String)>(conn)?
                        .into_iter()
                        .map(|(symbol, name)| (normalize_symbol(&symbol), name))
                        .collect();

                    for row in chunk {
                        if stored.get(&row.symbol) == Some(&row.name) {
                            continue;
                        }
                        diesel::insert_into(equity_names::table)
                            .values(row)
                            .on_conflict(equity_names::symbol)
                            .do_update()
                            .set((
                                equity_names::name.eq(&row.name),
                                equity_names::source.eq(&row.source),
                                equity_names::as_of.eq(&row.as_of),
                            ))
                            .execute(conn)?;
                        stored.insert(row.symbol.clone(), row.name.clone());
                        written += 1;
                    }
                }
                Ok(written)
            })
            .into_core()?;

        debug!("Wrote {} of {} company names", written, rows.len());
        Ok(written)
    }

    fn count_symbols(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        equities::table
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()
    }

    fn count_names(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        equity_names::table
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()
    }

    fn count_memberships(&self, index: Option<&str>) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = equity_membership::table.into_boxed();
        if let Some(index) = index {
            query = query.filter(equity_membership::index_name.eq(normalize_index_name(index)));
        }

        query.count().get_result::<i64>(&mut conn).into_core()
    }

    fn list_indices(&self) -> Result<Vec<IndexSummary>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = equity_membership::table
            .group_by(equity_membership::index_name)
            .select((equity_membership::index_name, diesel::dsl::count_star()))
            .order(equity_membership::index_name.asc())
            .load::<(String, i64)>(&mut conn)
            .into_core()?;

        Ok(rows
            .into_iter()
            .map(|(index, members)| IndexSummary {
                index: normalize_index_name(&index),
                members,
            })
            .collect())
    }
}
