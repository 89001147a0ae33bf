//! Positional placeholder translation
//!
//! Query text inside the server is written with portable `?` placeholders.
//! The embedded backend accepts these natively; the networked backend needs
//! sequential `$1..$n` markers. Translation only touches placeholders, never
//! the rest of the query text. `?` inside quoted literals and quoted
//! identifiers is left alone.

/// Rewrite `?` placeholders to `$1..$n`, returning the translated query and
/// the number of placeholders found
pub(crate) fn numbered_placeholders(sql: &str) -> (String, usize) {
    let mut out = String::with_capacity(sql.len() + 4);
    let mut count = 0usize;
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                out.push(ch);
            },
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                out.push(ch);
            },
            '?' if !in_single_quote && !in_double_quote => {
                count += 1;
                out.push('$');
                out.push_str(&count.to_string());
            },
            _ => out.push(ch),
        }
    }

    (out, count)
}

/// Count `?` placeholders without rewriting
pub(crate) fn placeholder_count(sql: &str) -> usize {
    numbered_placeholders(sql).1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_placeholder() {
        let (sql, count) = numbered_placeholders("SELECT * FROM books WHERE id = ?");
        assert_eq!(sql, "SELECT * FROM books WHERE id = $1");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_multiple_placeholders_numbered_sequentially() {
        let (sql, count) =
            numbered_placeholders("INSERT INTO books (id, title, author, date_added) VALUES (?, ?, ?, ?)");
        assert_eq!(
            sql,
            "INSERT INTO books (id, title, author, date_added) VALUES ($1, $2, $3, $4)"
        );
        assert_eq!(count, 4);
    }

    #[test]
    fn test_no_placeholders() {
        let (sql, count) = numbered_placeholders("SELECT 1");
        assert_eq!(sql, "SELECT 1");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_question_mark_inside_string_literal_untouched() {
        let (sql, count) = numbered_placeholders("SELECT * FROM books WHERE title = '?' AND id = ?");
        assert_eq!(sql, "SELECT * FROM books WHERE title = '?' AND id = $1");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_question_mark_inside_quoted_identifier_untouched() {
        let (sql, count) = numbered_placeholders("SELECT \"odd?col\" FROM books WHERE id = ?");
        assert_eq!(sql, "SELECT \"odd?col\" FROM books WHERE id = $1");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_placeholder_count() {
        assert_eq!(placeholder_count("DELETE FROM books WHERE id = ?"), 1);
        assert_eq!(placeholder_count("SELECT * FROM books"), 0);
    }
}
