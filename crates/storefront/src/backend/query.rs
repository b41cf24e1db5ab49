//! Row filters in the data API's query-string dialect.

use std::fmt::Display;

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A single column predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`
    Eq { column: &'static str, value: String },
    /// `column IN (values)`
    In {
        column: &'static str,
        values: Vec<String>,
    },
}

impl Filter {
    /// Column the predicate applies to.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Eq { column, .. } | Self::In { column, .. } => column,
        }
    }

    /// Whether `value` (the column's value rendered as text) satisfies this filter.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Self::Eq { value: want, .. } => want == value,
            Self::In { values, .. } => values.iter().any(|v| v == value),
        }
    }

    fn to_param(&self) -> (String, String) {
        match self {
            Self::Eq { column, value } => ((*column).to_string(), format!("eq.{value}")),
            Self::In { column, values } => {
                let quoted = values
                    .iter()
                    .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
                    .collect::<Vec<_>>()
                    .join(",");
                ((*column).to_string(), format!("in.({quoted})"))
            }
        }
    }
}

/// Conjunction of filters plus an optional ordering.
///
/// ```
/// use stg_catalog_storefront::backend::{Direction, Query};
///
/// let query = Query::new()
///     .eq("user_id", "42")
///     .order_by("created_at", Direction::Desc);
/// assert_eq!(
///     query.params(),
///     vec![
///         ("select".to_string(), "*".to_string()),
///         ("user_id".to_string(), "eq.42".to_string()),
///         ("order".to_string(), "created_at.desc".to_string()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<Filter>,
    order: Option<(&'static str, Direction)>,
}

impl Query {
    /// A query matching every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column` to equal `value`.
    #[must_use]
    pub fn eq(mut self, column: &'static str, value: impl Display) -> Self {
        self.filters.push(Filter::Eq {
            column,
            value: value.to_string(),
        });
        self
    }

    /// Require `column` to be one of `values`.
    #[must_use]
    pub fn in_list<I, V>(mut self, column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        self.filters.push(Filter::In {
            column,
            values: values.into_iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    /// Order results by `column`.
    #[must_use]
    pub const fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order = Some((column, direction));
        self
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[must_use]
    pub const fn order(&self) -> Option<(&'static str, Direction)> {
        self.order
    }

    /// Query-string pairs for a read: every column, then filters, then order.
    #[must_use]
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(self.filter_params());
        if let Some((column, direction)) = self.order {
            params.push((
                "order".to_string(),
                format!("{column}.{}", direction.as_str()),
            ));
        }
        params
    }

    /// Query-string pairs for a write: filters only.
    #[must_use]
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.filters.iter().map(Filter::to_param).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_list_quotes_values() {
        let query = Query::new().in_list("id", ["a", "b"]);
        assert_eq!(
            query.filter_params(),
            vec![("id".to_string(), "in.(\"a\",\"b\")".to_string())]
        );
    }

    #[test]
    fn test_empty_query_selects_everything() {
        assert_eq!(
            Query::new().params(),
            vec![("select".to_string(), "*".to_string())]
        );
        assert!(Query::new().filter_params().is_empty());
    }

    #[test]
    fn test_filter_accepts() {
        let eq = Filter::Eq {
            column: "status",
            value: "pending".to_string(),
        };
        assert!(eq.accepts("pending"));
        assert!(!eq.accepts("paid"));

        let within = Filter::In {
            column: "id",
            values: vec!["1".to_string(), "2".to_string()],
        };
        assert!(within.accepts("2"));
        assert!(!within.accepts("3"));
        assert_eq!(within.column(), "id");
    }
}
