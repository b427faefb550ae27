use serde::{Deserialize, Serialize};

/// Normalized classification of a column's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    Integer,
    SmallInt,
    BigInt,
    Double,
    Float,
    Real,
    Decimal,
    Numeric,
    Varchar,
    Char,
    Date,
    Time,
    Timestamp,
    Boolean,
    Blob,
    Clob,
}

/// Every member, longest name first, so a containment scan stops at the most
/// specific match (TIMESTAMP before TIME, VARCHAR before CHAR).
const MEMBER_RULES: &[(&str, SemanticType)] = &[
    ("TIMESTAMP", SemanticType::Timestamp),
    ("SMALLINT", SemanticType::SmallInt),
    ("INTEGER", SemanticType::Integer),
    ("DECIMAL", SemanticType::Decimal),
    ("NUMERIC", SemanticType::Numeric),
    ("VARCHAR", SemanticType::Varchar),
    ("BOOLEAN", SemanticType::Boolean),
    ("BIGINT", SemanticType::BigInt),
    ("DOUBLE", SemanticType::Double),
    ("FLOAT", SemanticType::Float),
    ("REAL", SemanticType::Real),
    ("CHAR", SemanticType::Char),
    ("DATE", SemanticType::Date),
    ("TIME", SemanticType::Time),
    ("BLOB", SemanticType::Blob),
    ("CLOB", SemanticType::Clob),
];

/// Substring heuristics tried in order when no member name is contained.
const HEURISTIC_RULES: &[(&str, SemanticType)] = &[
    ("INT", SemanticType::Integer),
    ("DEC", SemanticType::Decimal),
    ("BOOL", SemanticType::Boolean),
    ("CHAR", SemanticType::Varchar),
    ("TEXT", SemanticType::Varchar),
];

impl SemanticType {
    pub const ALL: [SemanticType; 16] = [
        SemanticType::Integer,
        SemanticType::SmallInt,
        SemanticType::BigInt,
        SemanticType::Double,
        SemanticType::Float,
        SemanticType::Real,
        SemanticType::Decimal,
        SemanticType::Numeric,
        SemanticType::Varchar,
        SemanticType::Char,
        SemanticType::Date,
        SemanticType::Time,
        SemanticType::Timestamp,
        SemanticType::Boolean,
        SemanticType::Blob,
        SemanticType::Clob,
    ];

    /// Classify a declared type string. Never fails; unknown input is VARCHAR.
    pub fn from_declared(declared: &str) -> SemanticType {
        let normalized = strip_type_modifiers(declared).to_uppercase();

        MEMBER_RULES
            .iter()
            .chain(HEURISTIC_RULES)
            .find(|(needle, _)| normalized.contains(needle))
            .map(|(_, ty)| *ty)
            .unwrap_or(SemanticType::Varchar)
    }

    pub fn sql_name(&self) -> &'static str {
        match self {
            SemanticType::Integer => "INTEGER",
            SemanticType::SmallInt => "SMALLINT",
            SemanticType::BigInt => "BIGINT",
            SemanticType::Double => "DOUBLE",
            SemanticType::Float => "FLOAT",
            SemanticType::Real => "REAL",
            SemanticType::Decimal => "DECIMAL",
            SemanticType::Numeric => "NUMERIC",
            SemanticType::Varchar => "VARCHAR",
            SemanticType::Char => "CHAR",
            SemanticType::Date => "DATE",
            SemanticType::Time => "TIME",
            SemanticType::Timestamp => "TIMESTAMP",
            SemanticType::Boolean => "BOOLEAN",
            SemanticType::Blob => "BLOB",
            SemanticType::Clob => "CLOB",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SemanticType::Integer
                | SemanticType::SmallInt
                | SemanticType::BigInt
                | SemanticType::Double
                | SemanticType::Float
                | SemanticType::Real
                | SemanticType::Decimal
                | SemanticType::Numeric
        )
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, SemanticType::Varchar | SemanticType::Char)
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// Remove every parenthesized group, e.g. `DECIMAL(10, 2)` -> `DECIMAL`.
fn strip_type_modifiers(declared: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(declared.len());
    for ch in declared.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out.trim().to_string()
}
