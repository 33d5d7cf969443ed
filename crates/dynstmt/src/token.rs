//! Bind tokens and special-type literals.
//!
//! Ordinary parameters use `:<name>` and list elements `:<name>_<i>`.
//! Where-rule tokens are `:t_<hex>` (or `:t_<i>_<hex>` for list elements) with
//! a random 128-bit suffix, so they never collide with parameter tokens bound
//! on the same prepared statement.

use crate::types::GenericType;
use uuid::Uuid;

/// SQL literal substituted for [`GenericType::Now`].
pub const NOW_LITERAL: &str = "NOW()";

/// SQL literal substituted for [`GenericType::Null`].
pub const NULL_LITERAL: &str = "NULL";

/// Ensure `name` starts with `:`.
pub fn format_token(name: &str) -> String {
    if name.starts_with(':') {
        name.to_string()
    } else {
        format!(":{name}")
    }
}

/// Literal text for NOW / NULL, otherwise the formatted bind token.
pub fn translate_special_token(name: &str, ty: &GenericType) -> String {
    match ty {
        GenericType::Now => NOW_LITERAL.to_string(),
        GenericType::Null => NULL_LITERAL.to_string(),
        _ => format_token(name),
    }
}

/// Random version 4 UUID as lowercase hyphenated text.
pub fn new_uuid() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Token for list element `index` of parameter `name`.
pub fn element_token(name: &str, index: usize) -> String {
    format_token(&format!("{name}_{index}"))
}

/// Fresh where-rule token. `index` is set for list elements.
pub(crate) fn rule_token(index: Option<usize>) -> String {
    let hex = Uuid::new_v4().simple();
    match index {
        Some(i) => format!(":t_{i}_{hex}"),
        None => format!(":t_{hex}"),
    }
}

fn is_token_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Whether `name` can appear as a bind token: `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Drivers that rewrite named tokens to positional markers stop at the first
/// character outside this set.
pub fn is_valid_token_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(is_token_char)
}

/// Replace every whole-token occurrence of `token` in `sql` with `literal`.
///
/// An occurrence followed by another token character is part of a longer
/// token (`:created` inside `:created_at`) and is left alone.
pub fn replace_token(sql: &str, token: &str, literal: &str) -> String {
    if token.is_empty() {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    while let Some(pos) = rest.find(token) {
        let after = &rest[pos + token.len()..];
        out.push_str(&rest[..pos]);
        if after.chars().next().is_some_and(is_token_char) {
            out.push_str(token);
        } else {
            out.push_str(literal);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_token_is_idempotent() {
        assert_eq!(format_token("id"), ":id");
        assert_eq!(format_token(":id"), ":id");
        assert_eq!(format_token(&format_token("id")), ":id");
    }

    #[test]
    fn token_names() {
        for ok in ["id", "_x", "created_at", "T1"] {
            assert!(is_valid_token_name(ok), "{ok}");
        }
        for bad in ["", "1a", "größe", "first-name", "x) OR (1=1", ":id", "a b"] {
            assert!(!is_valid_token_name(bad), "{bad}");
        }
    }

    #[test]
    fn translate_special() {
        assert_eq!(translate_special_token("c", &GenericType::Now), "NOW()");
        assert_eq!(translate_special_token("c", &GenericType::Null), "NULL");
        assert_eq!(translate_special_token("c", &GenericType::Uuid), ":c");
        assert_eq!(translate_special_token(":c", &GenericType::String), ":c");
    }

    #[test]
    fn uuid_shape() {
        let id = new_uuid();
        let groups: Vec<&str> = id.split('-').collect();
        assert_eq!(
            groups.iter().map(|g| g.len()).collect::<Vec<_>>(),
            vec![8, 4, 4, 4, 12]
        );
        assert!(
            id.chars()
                .all(|c| c == '-' || c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
        assert!(groups[2].starts_with('4'));
        assert!(matches!(groups[3].chars().next(), Some('8' | '9' | 'a' | 'b')));
        assert_ne!(new_uuid(), id);
    }

    #[test]
    fn rule_tokens() {
        let t = rule_token(None);
        assert!(t.starts_with(":t_"));
        assert_eq!(t.len(), 3 + 32);
        let e = rule_token(Some(2));
        assert!(e.starts_with(":t_2_"));
        assert_ne!(rule_token(None), t);
    }

    #[test]
    fn element_tokens() {
        assert_eq!(element_token("ids", 0), ":ids_0");
        assert_eq!(element_token("ids", 11), ":ids_11");
    }

    #[test]
    fn replace_whole_tokens_only() {
        let sql = "VALUES ( :created, :created_at, :created )";
        assert_eq!(
            replace_token(sql, ":created", "NOW()"),
            "VALUES ( NOW(), :created_at, NOW() )"
        );
    }

    #[test]
    fn replace_token_at_end() {
        assert_eq!(replace_token("x = :a", ":a", "NULL"), "x = NULL");
        assert_eq!(replace_token("x = :ab", ":a", "NULL"), "x = :ab");
    }
}
