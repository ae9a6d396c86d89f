//! Utility functions for SQLite storage operations.

/// Bound parameter cap of older SQLite builds (SQLITE_MAX_VARIABLE_NUMBER).
pub const SQLITE_MAX_VARIABLES: usize = 999;

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// One parameter per item. Multi-row inserts binding several columns per row
/// use [`chunk_rows_for_sqlite`] instead.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Escape character used with `LIKE ... ESCAPE`.
pub const LIKE_ESCAPE: char = '\\';

/// Chunk a slice into smaller slices for batch SQLite queries.
///
/// ```ignore
/// for chunk in chunk_for_sqlite(&symbols) {
///     rows.extend(query_with_in_clause(chunk)?);
/// }
/// ```
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Chunk rows for a multi-row insert binding `params_per_row` values each,
/// keeping every statement under [`SQLITE_MAX_VARIABLES`].
pub fn chunk_rows_for_sqlite<T>(items: &[T], params_per_row: usize) -> impl Iterator<Item = &[T]> {
    let rows = (SQLITE_MAX_VARIABLES / params_per_row.max(1)).max(1);
    items.chunks(rows)
}

/// Builds a `LIKE` pattern matching values that start with `prefix` literally.
///
/// `%`, `_` and the escape character itself are escaped with [`LIKE_ESCAPE`].
pub fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 2);
    for c in prefix.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
