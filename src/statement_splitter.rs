use itertools::Itertools;

/// Splits raw multi-statement SQL text into individually executable
/// statements.
///
/// Comment lines are dropped first: only lines whose trimmed content starts
/// with `--` count, a marker later in a line is left alone. The remaining
/// text is scanned character by character; semicolons inside single- or
/// double-quoted strings do not delimit statements, a quote preceded by a
/// backslash does not toggle the string state, and a doubled quote inside a
/// string of the same kind is an escaped quote rather than a terminator.
pub fn split_statements(raw_sql: &str) -> Vec<String> {
    let without_comments = raw_sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .join("\n");

    let chars: Vec<char> = without_comments.chars().collect();

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string: Option<char> = None;

    let mut index = 0;
    while index < chars.len() {
        let c = chars[index];
        let escaped = index > 0 && chars[index - 1] == '\\';

        match in_string {
            None => match c {
                ';' => {
                    push_statement(&mut statements, &mut current);
                }
                '\'' | '"' => {
                    if !escaped {
                        in_string = Some(c);
                    }
                    current.push(c);
                }
                _ => current.push(c),
            },
            Some(quote) => {
                current.push(c);

                if c == quote {
                    if chars.get(index + 1) == Some(&quote) {
                        // An escaped quote, both characters belong to the string.
                        current.push(quote);
                        index += 2;
                        continue;
                    }

                    if !escaped {
                        in_string = None;
                    }
                }
            }
        }

        index += 1;
    }

    push_statement(&mut statements, &mut current);

    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
    current.clear();
}
