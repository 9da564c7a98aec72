//! SQL predicate assembly.
//!
//! Every user value is bound as a parameter. Substring filters go through
//! [`contains_pattern`] so `%`, `_` and `\` in the term match literally.

use rusqlite::types::Value;

/// Columns selected for every comic row, in the order `ComicCatalog` reads them.
/// Aliased so compound selects can order by bare column names.
pub const COMIC_COLUMNS: &str = "c.id AS id, c.title AS title, c.series AS series, \
     c.number AS number, c.publisher AS publisher, c.year AS year, \
     c.story_arc AS story_arc, c.file_path AS file_path";

/// Escape LIKE wildcards with a backslash. Pair with `ESCAPE '\'`.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// `%term%` with the term escaped.
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// Case-insensitive substring test on `column`.
pub fn like_clause(column: &str) -> String {
    format!("UPPER({column}) LIKE UPPER(?) ESCAPE '\\'")
}

/// Case-insensitive equality on `column`.
pub fn equals_clause(column: &str) -> String {
    format!("UPPER({column}) = UPPER(?)")
}

/// How conditions are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    fn as_sql(self) -> &'static str {
        match self {
            Connector::And => " AND ",
            Connector::Or => " OR ",
        }
    }
}

/// A list of SQL conditions and the parameters they bind, in order.
#[derive(Debug, Default)]
pub struct Predicate {
    conditions: Vec<String>,
    params: Vec<Value>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition with its bound values.
    pub fn push<I>(&mut self, condition: impl Into<String>, params: I) -> &mut Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.conditions.push(condition.into());
        self.params.extend(params);
        self
    }

    /// Substring match on `column`.
    pub fn contains(&mut self, column: &str, term: &str) -> &mut Self {
        self.push(like_clause(column), [Value::Text(contains_pattern(term))])
    }

    /// Case-insensitive equality on `column`.
    pub fn equals(&mut self, column: &str, value: &str) -> &mut Self {
        self.push(equals_clause(column), [Value::Text(value.to_string())])
    }

    /// Equality when `exact`, substring otherwise.
    pub fn text_match(&mut self, column: &str, term: &str, exact: bool) -> &mut Self {
        if exact {
            self.equals(column, term)
        } else {
            self.contains(column, term)
        }
    }

    /// Year filter: `year` wins, otherwise inclusive bounds. Returns false when
    /// nothing was given.
    pub fn years(
        &mut self,
        column: &str,
        year: Option<i64>,
        start_year: Option<i64>,
        end_year: Option<i64>,
    ) -> bool {
        if let Some(year) = year {
            self.push(format!("{column} = ?"), [Value::Integer(year)]);
            return true;
        }

        match (start_year, end_year) {
            (Some(start), Some(end)) => {
                self.push(
                    format!("({column} >= ? AND {column} <= ?)"),
                    [Value::Integer(start), Value::Integer(end)],
                );
            }
            (Some(start), None) => {
                self.push(format!("{column} >= ?"), [Value::Integer(start)]);
            }
            (None, Some(end)) => {
                self.push(format!("{column} <= ?"), [Value::Integer(end)]);
            }
            (None, None) => return false,
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render as a WHERE body. `1=1` when empty.
    pub fn render(&self, connector: Connector) -> String {
        if self.conditions.is_empty() {
            return "1=1".to_string();
        }
        if self.conditions.len() == 1 {
            return self.conditions[0].clone();
        }
        self.conditions
            .iter()
            .map(|c| format!("({c})"))
            .collect::<Vec<_>>()
            .join(connector.as_sql())
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_Real"), r"100\%\_Real");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("Batman's"), "Batman's");
        assert_eq!(escape_like(""), "");
    }

    #[test]
    fn test_contains_pattern() {
        assert_eq!(contains_pattern("X-Men"), "%X-Men%");
        assert_eq!(contains_pattern("50%"), r"%50\%%");
    }

    #[test]
    fn test_like_clause_declares_escape() {
        assert_eq!(
            like_clause("c.title"),
            r"UPPER(c.title) LIKE UPPER(?) ESCAPE '\'"
        );
    }

    #[test]
    fn test_render_joins_with_connector() {
        let mut p = Predicate::new();
        p.contains("c.title", "bat").equals("c.series", "Batman");
        assert_eq!(
            p.render(Connector::Or),
            r"(UPPER(c.title) LIKE UPPER(?) ESCAPE '\') OR (UPPER(c.series) = UPPER(?))"
        );
        assert_eq!(p.params().len(), 2);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(Predicate::new().render(Connector::And), "1=1");
    }

    #[test]
    fn test_years_exact_wins() {
        let mut p = Predicate::new();
        assert!(p.years("year", Some(1986), Some(1980), Some(1990)));
        assert_eq!(p.render(Connector::And), "year = ?");
        assert_eq!(p.params(), &[Value::Integer(1986)]);
    }

    #[test]
    fn test_years_range_is_one_condition() {
        let mut p = Predicate::new();
        assert!(p.years("year", None, Some(1980), Some(1990)));
        assert_eq!(p.render(Connector::Or), "(year >= ? AND year <= ?)");
    }

    #[test]
    fn test_years_none() {
        let mut p = Predicate::new();
        assert!(!p.years("year", None, None, None));
        assert!(p.is_empty());
    }
}
