//! Ticker extraction from NSE-style index exports and company name lists.
//!
//! NSE downloads are "CSV" files that are frequently malformed: the header row
//! may be split across two physical lines (`SYMBOL \n,OPEN \n...`), a byte
//! order mark may precede it, and a summary row such as `NIFTY 50` sits among
//! the constituents. Some downloads are HTML pages saved with a `.csv` name;
//! their first table is read instead.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use crate::constants::TICKER_PATTERN;
use crate::errors::{IngestError, Result};
use crate::symbols::{normalize_company_name, normalize_symbol};

static TICKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TICKER_PATTERN).expect("ticker pattern is valid"));

static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<table\b[^>]*>(.*?)</table>").expect("table pattern is valid")
});
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").expect("row pattern is valid"));
static HEADER_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<th\b[^>]*>(.*?)</th>").expect("header cell pattern is valid")
});
static DATA_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").expect("data cell pattern is valid")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"));

/// Header candidates for the ticker column of a company name list, in preference order.
const NAME_SYMBOL_COLUMNS: &[&str] = &[
    "DISPLAY_NAME",
    "TRADING_SYMBOL",
    "TRADING_SYMBOL_NAME",
    "SEM_TRADING_SYMBOL",
    "SEM_CUSTOM_SYMBOL",
    "SYMBOL",
    "SCRIP_SYMBOL",
];

/// Header candidates for the company name column, in preference order.
const NAME_COLUMNS: &[&str] = &[
    "SYMBOL_NAME",
    "SECURITY_NAME",
    "COMPANY_NAME",
    "NAME_OF_COMPANY",
    "NAME",
    "SM_SYMBOL_NAME",
];

const INSTRUMENT_COLUMNS: &[&str] = &["SEM_INSTRUMENT_NAME", "INSTRUMENT", "INSTRUMENT_TYPE"];
const SERIES_COLUMNS: &[&str] = &["SERIES", "SEM_SERIES"];

/// Cash market series kept from instrument lists; also stripped as ticker suffixes.
const EQUITY_SERIES: &[&str] = &["EQ", "BE", "BZ"];

/// Returns true when the text looks like an HTML table rather than CSV.
pub fn looks_like_html(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("<table") && lower.contains("</table>")
}

/// Returns true when `value` is a plausible ticker once normalized.
pub fn is_ticker(value: &str) -> bool {
    TICKER_RE.is_match(value)
}

/// Joins a header that was split across its first two non-empty lines.
///
/// Only applies when the second line starts with a comma; every other input
/// is returned unchanged apart from dropped blank lines.
pub fn merge_split_header(text: &str) -> String {
    let cleaned = text.trim_start_matches('\u{feff}').replace('\0', "");
    let mut lines: Vec<&str> = cleaned
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.len() >= 2 && lines[1].trim_start().starts_with(',') {
        let merged = format!("{}{}", lines[0], lines[1]);
        debug!("Merged split header into {:?}", merged.trim());
        let mut out = vec![merged.as_str()];
        out.extend(lines.drain(2..));
        return out.join("\n");
    }
    lines.join("\n")
}

/// Header and data rows of the first table in an HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn cell_text(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    normalize_company_name(&decoded)
}

fn cells(row: &str, pattern: &Regex) -> Vec<String> {
    pattern
        .captures_iter(row)
        .map(|c| cell_text(c.get(1).map_or("", |m| m.as_str())))
        .collect()
}

/// Parses the first `<table>` of an HTML page without a DOM.
///
/// The header comes from the first row's `th` cells, or its `td` cells when it
/// has none. Later rows without `td` cells are skipped.
pub fn parse_html_table(text: &str, source: &str) -> Result<HtmlTable> {
    let unsupported = |reason: &str| IngestError::UnsupportedFormat {
        path: source.to_string(),
        reason: reason.to_string(),
    };

    let table = TABLE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or_else(|| unsupported("no <table> element"))?
        .as_str();
    let mut rows = ROW_RE
        .captures_iter(table)
        .filter_map(|c| c.get(1).map(|m| m.as_str()));

    let first = rows.next().ok_or_else(|| unsupported("table has no rows"))?;
    let mut header = cells(first, &HEADER_CELL_RE);
    if header.is_empty() {
        header = cells(first, &DATA_CELL_RE);
    }
    if header.is_empty() {
        return Err(unsupported("table has no header row").into());
    }

    let rows = rows
        .map(|row| cells(row, &DATA_CELL_RE))
        .filter(|row| !row.is_empty())
        .collect();
    Ok(HtmlTable { header, rows })
}

fn symbol_column<'a>(headers: impl IntoIterator<Item = &'a str>, source: &str) -> Result<usize> {
    headers
        .into_iter()
        .position(|h| h.trim().to_uppercase().starts_with("SYMBOL"))
        .ok_or_else(|| {
            IngestError::MissingSymbolColumn {
                path: source.to_string(),
            }
            .into()
        })
}

/// Unique tickers in first-seen order.
#[derive(Default)]
struct TickerSet {
    seen: BTreeSet<String>,
    symbols: Vec<String>,
    skipped: usize,
}

impl TickerSet {
    fn push(&mut self, raw: Option<&str>) {
        let symbol = raw.map(normalize_symbol).unwrap_or_default();
        if !is_ticker(&symbol) {
            self.skipped += 1;
            return;
        }
        if self.seen.insert(symbol.clone()) {
            self.symbols.push(symbol);
        }
    }

    fn finish(self, source: &str) -> Vec<String> {
        debug!(
            "Extracted {} symbols from {} ({} rows skipped)",
            self.symbols.len(),
            source,
            self.skipped
        );
        self.symbols
    }
}

fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
}

/// Extracts unique tickers from CSV text, or from the first table of an HTML
/// page, in first-seen order.
///
/// `source` only labels errors and log lines.
pub fn extract_symbols_from_str(text: &str, source: &str) -> Result<Vec<String>> {
    let mut tickers = TickerSet::default();

    if looks_like_html(text) {
        let table = parse_html_table(text, source)?;
        let column = symbol_column(table.header.iter().map(String::as_str), source)?;
        debug!("Reading HTML table in {} ({} rows)", source, table.rows.len());
        for row in &table.rows {
            tickers.push(row.get(column).map(String::as_str));
        }
        return Ok(tickers.finish(source));
    }

    let fixed = merge_split_header(text);
    let mut reader = csv_reader(&fixed);
    let column = symbol_column(reader.headers().map_err(IngestError::from)?.iter(), source)?;

    for (line, record) in reader.records().enumerate() {
        match record {
            Ok(record) => tickers.push(record.get(column)),
            Err(e) => warn!("Skipping unreadable row {} in {}: {}", line + 2, source, e),
        }
    }
    Ok(tickers.finish(source))
}

fn read_lossy(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(IngestError::PathNotFound(path.display().to_string()).into());
    }
    let bytes = std::fs::read(path).map_err(IngestError::from)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Reads a file and extracts its tickers. Invalid UTF-8 is replaced, not rejected.
pub fn extract_symbols(path: &Path) -> Result<Vec<String>> {
    let text = read_lossy(path)?;
    extract_symbols_from_str(&text, &path.display().to_string())
}

/// Strips a trailing cash market series (`-EQ`, `-BE`, `-BZ`) from a ticker.
pub fn strip_series_suffix(symbol: &str) -> &str {
    EQUITY_SERIES
        .iter()
        .find_map(|series| {
            symbol
                .strip_suffix(series)
                .and_then(|rest| rest.strip_suffix('-'))
        })
        .unwrap_or(symbol)
}

fn name_header_key(header: &str) -> String {
    header.trim().to_uppercase().replace(' ', "_")
}

fn pick_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|candidate| headers.iter().position(|h| h == candidate))
}

/// Extracts `(symbol, company name)` pairs from an instrument or company list.
///
/// Headers are matched case-insensitively with spaces read as underscores.
/// When an instrument column is present only `EQUITY` rows are kept, and when
/// a series column is present only `EQ`, `BE` and `BZ` rows are kept. Series
/// suffixes are stripped from tickers and the first name seen for a symbol wins.
pub fn extract_names_from_str(text: &str, source: &str) -> Result<Vec<(String, String)>> {
    let fixed = merge_split_header(text);
    let mut reader = csv_reader(&fixed);
    let headers: Vec<String> = reader
        .headers()
        .map_err(IngestError::from)?
        .iter()
        .map(name_header_key)
        .collect();

    let missing = || IngestError::MissingNameColumns {
        path: source.to_string(),
    };
    let symbol_col = pick_column(&headers, NAME_SYMBOL_COLUMNS).ok_or_else(missing)?;
    let name_col = pick_column(&headers, NAME_COLUMNS).ok_or_else(missing)?;
    let instrument_col = pick_column(&headers, INSTRUMENT_COLUMNS);
    let series_col = pick_column(&headers, SERIES_COLUMNS);
    debug!(
        "Name columns in {}: symbol={} name={} instrument={:?} series={:?}",
        source, headers[symbol_col], headers[name_col], instrument_col, series_col
    );

    let field = |record: &csv::StringRecord, col: usize| -> String {
        record.get(col).unwrap_or_default().trim().to_uppercase()
    };

    let mut seen = BTreeSet::new();
    let mut pairs = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable row {} in {}: {}", line + 2, source, e);
                continue;
            }
        };
        if instrument_col.is_some_and(|col| field(&record, col) != "EQUITY")
            || series_col.is_some_and(|col| !EQUITY_SERIES.contains(&field(&record, col).as_str()))
        {
            skipped += 1;
            continue;
        }

        let symbol = field(&record, symbol_col);
        let symbol = strip_series_suffix(&symbol).to_string();
        let name = normalize_company_name(record.get(name_col).unwrap_or_default());
        if !is_ticker(&symbol) || name.is_empty() {
            skipped += 1;
            continue;
        }
        if seen.insert(symbol.clone()) {
            pairs.push((symbol, name));
        }
    }

    debug!(
        "Extracted {} names from {} ({} rows skipped)",
        pairs.len(),
        source,
        skipped
    );
    Ok(pairs)
}

/// Reads a company name list from disk. Invalid UTF-8 is replaced, not rejected.
pub fn extract_names(path: &Path) -> Result<Vec<(String, String)>> {
    let text = read_lossy(path)?;
    extract_names_from_str(&text, &path.display().to_string())
}
