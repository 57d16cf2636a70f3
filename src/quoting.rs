/// Quotes an identifier for use in generated SQL as needed.
///
/// Identifiers consisting of a lowercase letter or underscore followed by
/// lowercase letters, digits and underscores are emitted as-is; anything
/// else is wrapped in double quotes with embedded quotes doubled.
pub(crate) fn quote_identifier(identifier: &str) -> String {
    if identifier.is_empty() {
        return "\"\"".to_string();
    }

    let mut chars = identifier.chars();
    let safe = matches!(chars.next(), Some('a'..='z' | '_'))
        && chars.all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'));

    if safe {
        identifier.to_string()
    } else {
        let escaped = identifier.replace('"', r#""""#);
        format!("\"{escaped}\"")
    }
}

/// Quotes a string value for usage in generated SQL.
pub(crate) fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
