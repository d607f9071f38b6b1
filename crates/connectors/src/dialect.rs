//! Identifier Quoter (§4.2): every identifier interpolated into SQL goes
//! through here first, never through raw string concatenation. Bound
//! values never touch this module.

use crate::error::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    MySql,
    Postgres,
}

impl SqlDialect {
    /// Wraps `name` in the dialect's identifier delimiter, doubling any
    /// embedded delimiter so the identifier cannot escape its quoting.
    pub fn quote(&self, name: &str) -> String {
        match self {
            SqlDialect::MySql => format!("`{}`", name.replace('`', "``")),
            SqlDialect::Postgres => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// ASCII letters, digits, and underscores only — deliberately
    /// conservative, since table/column names here come from a trusted
    /// config file but are still worth bounding.
    pub fn is_valid_identifier(name: &str) -> bool {
        !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    }

    pub fn quote_safe(&self, name: &str) -> Result<String, DbError> {
        if !Self::is_valid_identifier(name) {
            return Err(DbError::InvalidIdentifier(name.to_string()));
        }
        Ok(self.quote(name))
    }

    /// The driver placeholder for the Nth (zero-based) bound parameter.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::MySql => "?".to_string(),
            SqlDialect::Postgres => format!("${}", index + 1),
        }
    }

    /// A comma-joined list of placeholders for an `IN (...)` clause,
    /// starting at `start_index` (zero-based) bound parameters already
    /// emitted earlier in the same statement.
    pub fn placeholders(&self, start_index: usize, count: usize) -> String {
        (0..count)
            .map(|i| self.placeholder(start_index + i))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mysql_quotes_with_backticks_and_doubles_embedded() {
        assert_eq!(SqlDialect::MySql.quote("order`s"), "`order``s`");
    }

    #[test]
    fn postgres_quotes_with_double_quotes() {
        assert_eq!(SqlDialect::Postgres.quote("orders"), "\"orders\"");
    }

    #[test]
    fn quote_safe_rejects_non_alphanumeric_identifiers() {
        assert!(SqlDialect::MySql.quote_safe("orders; DROP TABLE x").is_err());
        assert!(SqlDialect::MySql.quote_safe("orders").is_ok());
    }

    #[test]
    fn postgres_placeholders_are_one_indexed() {
        assert_eq!(SqlDialect::Postgres.placeholder(0), "$1");
        assert_eq!(SqlDialect::Postgres.placeholders(2, 3), "$3, $4, $5");
    }

    #[test]
    fn mysql_placeholders_are_always_question_marks() {
        assert_eq!(SqlDialect::MySql.placeholders(5, 3), "?, ?, ?");
    }
}
