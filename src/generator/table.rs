use crate::random::Randomly;
use crate::schema::{Column, Table};
use regex::Regex;
use std::sync::LazyLock;

/// Declared types the generator picks from for non-identity columns.
pub const SUPPORTED_TYPES: &[&str] = &[
    "INTEGER",
    "SMALLINT",
    "BIGINT",
    "DOUBLE",
    "REAL",
    "DECIMAL(10,2)",
    "VARCHAR(50)",
    "CHAR(10)",
    "DATE",
    "TIME",
    "TIMESTAMP",
    "BOOLEAN",
];

pub const ID_COLUMN: &str = "id";
const MIN_EXTRA_COLUMNS: i32 = 1;
const MAX_EXTRA_COLUMNS: i32 = 4;

static CREATE_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*CREATE\s+TABLE\s+([A-Za-z_][A-Za-z0-9_]*)\s*\((.*)\)\s*;?\s*$")
        .expect("static CREATE TABLE pattern")
});

static NOT_NULL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+NOT\s+NULL\s*$").expect("static NOT NULL pattern"));

/// Name that stays unique across runs sharing one database: ordinal, wall
/// clock millis and a run-scoped id.
pub fn unique_table_name(ordinal: usize, timestamp_millis: i64, run_id: u32) -> String {
    format!("t{}_{}_{}", ordinal, timestamp_millis, run_id)
}

/// An identity column followed by 1-4 randomly typed columns, each NOT NULL
/// on a coin flip.
pub fn generate_table(r: &mut Randomly, name: &str) -> Table {
    let mut columns = vec![Column::new(ID_COLUMN, "INTEGER").not_null()];

    let extra = r.integer_in(MIN_EXTRA_COLUMNS, MAX_EXTRA_COLUMNS);
    for i in 0..extra {
        let declared = r.choose_one_of(SUPPORTED_TYPES).copied().unwrap_or("INTEGER");
        let column = Column::new(format!("c{}", i), declared);
        columns.push(if r.boolean() { column.not_null() } else { column });
    }

    Table::new(name, columns)
}

/// Best-effort read of a CREATE TABLE statement this generator wrote.
pub fn parse_create_table(sql: &str) -> Option<Table> {
    let caps = CREATE_TABLE_RE.captures(sql)?;
    let name = caps.get(1)?.as_str();
    let body = caps.get(2)?.as_str();

    let columns: Vec<Column> = split_top_level(body)
        .into_iter()
        .filter_map(|def| {
            let def = def.trim();
            let (col_name, rest) = def.split_once(char::is_whitespace)?;
            let not_null = NOT_NULL_RE.is_match(rest);
            let declared = NOT_NULL_RE.replace(rest, "");
            let column = Column::new(col_name, declared.trim());
            Some(if not_null { column.not_null() } else { column })
        })
        .collect();

    if columns.is_empty() {
        return None;
    }
    Some(Table::new(name, columns))
}

/// Splits on commas that are not inside parentheses.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}
