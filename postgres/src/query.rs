//! List query composition.
//!
//! Turns a [`ListQuery`] into one `SELECT` with a dynamic `WHERE` clause.
//! Filter values and the limit are always bound parameters; the SQL text only
//! ever contains fixed fragments and `$n` placeholders.

use mood_todos_core::todo::ListQuery;

/// Columns selected for a todo, with the enum cast back to text for decoding.
pub(crate) const TODO_COLUMNS: &str = "id, mood::text AS mood, text, created_at, completed_at";

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    /// `BIGINT` parameter
    Int(i64),
    /// `TEXT` parameter
    Text(String),
}

/// SQL text plus its bind values, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListStatement {
    /// Statement text
    pub sql: String,
    /// Values for `$1..$n`
    pub binds: Vec<BindValue>,
}

impl ListStatement {
    fn bind(&mut self, value: BindValue) -> String {
        self.binds.push(value);
        format!("${}", self.binds.len())
    }
}

/// Escapes `LIKE` metacharacters so `text` matches literally.
///
/// ```
/// use mood_todos_postgres::query::escape_like;
///
/// assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
/// ```
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the statement for one page of todos.
///
/// Filters are ANDed in a fixed order (completion, search, cursor); the
/// result is ordered by `id DESC` and limited to `limit` rows.
#[must_use]
pub fn compose_list(query: &ListQuery, limit: i64) -> ListStatement {
    let mut statement = ListStatement {
        sql: String::new(),
        binds: Vec::new(),
    };
    let mut conditions = Vec::new();

    if query.unaccomplished_only {
        conditions.push("completed_at IS NULL".to_string());
    }
    if query.has_search() {
        let pattern = format!("%{}%", escape_like(&query.search_text));
        let placeholder = statement.bind(BindValue::Text(pattern));
        conditions.push(format!(r"text ILIKE {placeholder} ESCAPE '\'"));
    }
    if let Some(cursor) = query.cursor {
        let placeholder = statement.bind(BindValue::Int(cursor.get()));
        conditions.push(format!("id < {placeholder}"));
    }

    let mut sql = format!("SELECT {TODO_COLUMNS} FROM todos");
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    let limit_placeholder = statement.bind(BindValue::Int(limit));
    sql.push_str(" ORDER BY id DESC LIMIT ");
    sql.push_str(&limit_placeholder);

    statement.sql = sql;
    statement
}

#[cfg(test)]
mod tests {
    use super::*;
    use mood_todos_core::todo::TodoId;

    #[test]
    fn no_filters() {
        let statement = compose_list(&ListQuery::new(), 10);
        assert_eq!(
            statement.sql,
            "SELECT id, mood::text AS mood, text, created_at, completed_at FROM todos \
             ORDER BY id DESC LIMIT $1"
        );
        assert_eq!(statement.binds, vec![BindValue::Int(10)]);
    }

    #[test]
    fn all_filters_bind_in_order() {
        let query = ListQuery::new()
            .unaccomplished_only(true)
            .search("milk")
            .before(Some(TodoId::new(42)));
        let statement = compose_list(&query, 10);

        assert!(statement.sql.ends_with(
            r"WHERE completed_at IS NULL AND text ILIKE $1 ESCAPE '\' AND id < $2 ORDER BY id DESC LIMIT $3"
        ));
        assert_eq!(
            statement.binds,
            vec![
                BindValue::Text("%milk%".to_string()),
                BindValue::Int(42),
                BindValue::Int(10),
            ]
        );
    }

    #[test]
    fn cursor_only() {
        let statement = compose_list(&ListQuery::new().before(Some(TodoId::new(6))), 10);
        assert!(statement.sql.contains("WHERE id < $1 ORDER BY"));
        assert_eq!(statement.binds, vec![BindValue::Int(6), BindValue::Int(10)]);
    }

    #[test]
    fn search_text_never_reaches_sql() {
        let hostile = "'; DROP TABLE todos; --";
        let statement = compose_list(&ListQuery::new().search(hostile), 10);
        assert!(!statement.sql.contains("DROP"));
        assert_eq!(
            statement.binds[0],
            BindValue::Text(format!("%{hostile}%"))
        );
    }

    #[test]
    fn wildcards_are_escaped() {
        let statement = compose_list(&ListQuery::new().search("50%_off"), 10);
        assert_eq!(
            statement.binds[0],
            BindValue::Text(r"%50\%\_off%".to_string())
        );
    }
}
