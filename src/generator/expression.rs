//! Literal and predicate synthesis.
//!
//! Every literal produced here can be pasted straight into a statement:
//! quotes are doubled, and decimals are rendered in fixed-point notation.

use crate::random::Randomly;
use crate::schema::{Column, Schema, SemanticType, Table};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub const MAX_STRING_LEN: usize = 100;
pub const BIGINT_BOUND: i64 = 1_000_000;
const MIN_YEAR: i32 = 2000;
const MAX_YEAR: i32 = 2025;

pub struct ExpressionGenerator<'r> {
    r: &'r mut Randomly,
}

impl<'r> ExpressionGenerator<'r> {
    pub fn new(r: &'r mut Randomly) -> Self {
        Self { r }
    }

    /// A quoted random string or a random integer, chosen uniformly.
    pub fn constant(&mut self) -> String {
        if self.r.boolean() {
            quote_string(&self.r.string())
        } else {
            self.r.integer().to_string()
        }
    }

    pub fn value_for(&mut self, ty: Option<SemanticType>) -> String {
        let Some(ty) = ty else {
            return self.constant();
        };

        match ty {
            SemanticType::Integer => self.r.integer().to_string(),
            SemanticType::SmallInt => self.r.integer_in(-32768, 32767).to_string(),
            SemanticType::BigInt => self.r.long_in(-BIGINT_BOUND, BIGINT_BOUND).to_string(),
            SemanticType::Double | SemanticType::Float | SemanticType::Real => {
                format!("{:.6}", self.r.double())
            }
            SemanticType::Decimal | SemanticType::Numeric => format!("{:.2}", self.r.double()),
            SemanticType::Varchar | SemanticType::Char => {
                let s: String = self.r.string().chars().take(MAX_STRING_LEN).collect();
                quote_string(&s)
            }
            SemanticType::Date => format!("DATE '{}'", self.date().format("%Y-%m-%d")),
            SemanticType::Time => format!("TIME '{}'", self.time().format("%H:%M:%S")),
            SemanticType::Timestamp => {
                let ts = NaiveDateTime::new(self.date(), self.time());
                format!("TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S"))
            }
            SemanticType::Boolean => {
                if self.r.boolean() {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            SemanticType::Blob | SemanticType::Clob => "NULL".to_string(),
        }
    }

    /// Boolean condition over `column`: `LIKE` for text, equality otherwise.
    pub fn predicate_for(&mut self, column: &Column) -> String {
        if column.semantic_type.is_textual() {
            let needle: String = self.r.string().chars().take(MAX_STRING_LEN).collect();
            format!("{} LIKE '%{}%'", column.name, escape(&needle))
        } else {
            format!(
                "{} = {}",
                column.name,
                self.value_for(Some(column.semantic_type))
            )
        }
    }

    /// Predicate on a random column of a random table, paired with that
    /// table; `None` when the chosen table has no columns.
    pub fn random_predicate<'s>(&mut self, schema: &'s Schema) -> Option<(&'s Table, String)> {
        let table = schema.random_table(self.r)?;
        let column = table.random_column(self.r)?;
        Some((table, self.predicate_for(column)))
    }

    fn date(&mut self) -> NaiveDate {
        let year = self.r.integer_in(MIN_YEAR, MAX_YEAR);
        let month = self.r.integer_in(1, 12) as u32;
        let day = self.r.integer_in(1, 28) as u32;
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    fn time(&mut self) -> NaiveTime {
        let hour = self.r.integer_in(0, 23) as u32;
        let minute = self.r.integer_in(0, 59) as u32;
        let second = self.r.integer_in(0, 59) as u32;
        NaiveTime::from_hms_opt(hour, minute, second).unwrap_or_default()
    }
}

pub fn escape(s: &str) -> String {
    s.replace('\'', "''")
}

pub fn quote_string(s: &str) -> String {
    format!("'{}'", escape(s))
}
