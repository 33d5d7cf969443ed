//! SQL identifier quoting.
//!
//! Table and column names cannot be bound as parameters, so every identifier
//! that reaches SQL text goes through [`escape_identifier`]. The whole name is
//! wrapped in backticks and embedded backticks are doubled; dotted names are
//! not split.

/// Quote an identifier with backticks, doubling any embedded backtick.
pub fn escape_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_identifier(name, &mut out);
    out
}

pub(crate) fn write_identifier(name: &str, out: &mut String) {
    out.push('`');
    for ch in name.chars() {
        if ch == '`' {
            out.push('`');
            out.push('`');
        } else {
            out.push(ch);
        }
    }
    out.push('`');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        assert_eq!(escape_identifier("users"), "`users`");
    }

    #[test]
    fn ident_doubles_backtick() {
        let escaped = escape_identifier("a`b");
        assert_eq!(escaped, "`a``b`");
        let inner = &escaped[1..escaped.len() - 1];
        assert_eq!(inner, "a``b");
    }

    #[test]
    fn ident_keeps_dots_inside_quotes() {
        assert_eq!(escape_identifier("db.users"), "`db.users`");
    }

    #[test]
    fn ident_neutralizes_injection() {
        let escaped = escape_identifier("x` ; DROP TABLE users; --");
        assert_eq!(escaped, "`x`` ; DROP TABLE users; --`");
        // Only the outer pair is unpaired.
        let inner = &escaped[1..escaped.len() - 1];
        assert_eq!(inner.matches('`').count() % 2, 0);
    }

    #[test]
    fn ident_empty() {
        assert_eq!(escape_identifier(""), "``");
    }
}
