//! Custom WHERE clause builder.
//!
//! Rules are rendered when they are added, and the builder keeps the rendered
//! fragments next to the rules that own their tokens. Three shapes are
//! supported:
//!
//! - flat: [`WhereBuilder::add_rule`] appends `" VERB (field OP value)"`;
//! - grouped: [`WhereBuilder::add_rules_grouped`] appends `" VERB ( r0 OR r1 ) "`;
//! - compound: [`WhereBuilder::group_rules`] renders groups without attaching
//!   them, and [`WhereBuilder::add_compound`] wraps several of them in one more
//!   parenthesized group.
//!
//! # Example
//! ```ignore
//! let mut w = WhereBuilder::new();
//! w.add_rule("", "active", "=", true, "BOOL")?;
//!
//! let overlaps = w.group_rules(vec![
//!     WhereRule::new("", "start", "BETWEEN", vec![from, to], "S")?,
//!     WhereRule::new("OR", "end", "BETWEEN", vec![from, to], "S")?,
//! ])?;
//! let spans = w.group_rules(vec![
//!     WhereRule::new("OR", "start", "<=", from, "S")?,
//!     WhereRule::new("AND", "end", ">=", to, "S")?,
//! ])?;
//! w.add_compound(vec![overlaps, spans], "AND")?;
//! ```

use crate::error::{StmtError, StmtResult};
use crate::ident::escape_identifier;
use crate::token::{format_token, translate_special_token};
use crate::types::GenericType;
use crate::value::Value;
use crate::where_rule::{Conjunction, WhereRule};

/// One appended piece of the WHERE body.
#[derive(Debug, Clone)]
struct Fragment {
    verb: Conjunction,
    body: String,
}

impl Fragment {
    fn to_sql(&self) -> String {
        match self.verb {
            Conjunction::None => format!(" {}", self.body),
            verb => format!(" {verb} {}", self.body),
        }
    }
}

/// A parenthesized group of rules, rendered but not yet attached.
#[derive(Debug, Clone)]
pub struct RuleGroup {
    verb: Conjunction,
    body: String,
    rules: Vec<WhereRule>,
}

impl RuleGroup {
    /// Conjunction that opens the group.
    pub fn verb(&self) -> Conjunction {
        self.verb
    }

    /// The group text without its leading conjunction: `( r0 OR r1 )`.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn rules(&self) -> &[WhereRule] {
        &self.rules
    }

    /// Full group text: `" AND ( r0 OR r1 ) "`.
    pub fn to_sql(&self) -> String {
        format!(" {} {} ", self.verb, self.body)
    }
}

/// Accumulates where rules and their rendered SQL.
#[derive(Debug, Clone, Default)]
pub struct WhereBuilder {
    fragments: Vec<Fragment>,
    rules: Vec<WhereRule>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any fragments have been added.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    // ==================== Flat rules ====================

    /// Add one rule and append its rendered text.
    ///
    /// Returns the appended fragment, e.g. `" AND (`id` = :t_…)"`.
    pub fn add_rule(
        &mut self,
        verb: &str,
        field: &str,
        operator: &str,
        value: impl Into<Value>,
        ty: &str,
    ) -> StmtResult<String> {
        let rule = WhereRule::new(verb, field, operator, value, ty)?;
        self.push_rule(rule)
    }

    /// Append a pre-built rule.
    pub fn push_rule(&mut self, rule: WhereRule) -> StmtResult<String> {
        let fragment = Fragment {
            verb: rule.verb(),
            body: render_rule(&rule)?,
        };
        let sql = fragment.to_sql();
        tracing::trace!(fragment = %sql, "where rule added");
        self.fragments.push(fragment);
        self.rules.push(rule);
        Ok(sql)
    }

    // ==================== Groups ====================

    /// Render `rules` as one parenthesized group without attaching it.
    ///
    /// The first rule's verb opens the group (AND when empty) and is not
    /// repeated inside it; later rules join with their own verb.
    pub fn group_rules(&self, rules: Vec<WhereRule>) -> StmtResult<RuleGroup> {
        let Some(first) = rules.first() else {
            return Err(StmtError::invalid_rule("", "a rule group needs at least one rule"));
        };
        let verb = first.verb().or_and();

        let mut body = String::from("( ");
        for (i, rule) in rules.iter().enumerate() {
            if i > 0 {
                body.push(' ');
                body.push_str(rule.verb().or_and().as_str());
                body.push(' ');
            }
            body.push_str(&render_rule(rule)?);
        }
        body.push_str(" )");

        Ok(RuleGroup { verb, body, rules })
    }

    /// Render `rules` as one group and attach it.
    ///
    /// Returns the group text, e.g. `" AND ( (`a` = :t_…) OR (`b` = :t_…) ) "`.
    pub fn add_rules_grouped(&mut self, rules: Vec<WhereRule>) -> StmtResult<String> {
        let group = self.group_rules(rules)?;
        let sql = group.to_sql();
        self.attach(group.verb, group.body, group.rules);
        Ok(sql)
    }

    /// Wrap detached groups in one more group led by `verb` and attach it.
    ///
    /// The first group's own verb is suppressed; the rest join with theirs.
    pub fn add_compound(&mut self, groups: Vec<RuleGroup>, verb: &str) -> StmtResult<String> {
        let verb = Conjunction::parse(verb)?;
        if groups.is_empty() {
            return Err(StmtError::invalid_rule("", "a compound needs at least one group"));
        }

        let mut body = String::from("( ");
        let mut rules = Vec::new();
        for (i, group) in groups.into_iter().enumerate() {
            if i > 0 {
                body.push(' ');
                body.push_str(group.verb.as_str());
                body.push(' ');
            }
            body.push_str(&group.body);
            rules.extend(group.rules);
        }
        body.push_str(" )");

        let fragment = Fragment { verb, body };
        let sql = fragment.to_sql();
        self.fragments.push(fragment);
        self.rules.extend(rules);
        Ok(sql)
    }

    fn attach(&mut self, verb: Conjunction, body: String, rules: Vec<WhereRule>) {
        tracing::trace!(rules = rules.len(), "where group attached");
        self.fragments.push(Fragment { verb, body });
        self.rules.extend(rules);
    }

    // ==================== Output ====================

    /// The WHERE clause: `"\nWHERE"` followed by every fragment in order.
    ///
    /// The first fragment's conjunction is dropped and later fragments with
    /// an empty verb join with AND. Returns an empty string when nothing has
    /// been added.
    pub fn get_where(&self) -> String {
        if self.fragments.is_empty() {
            return String::new();
        }
        let mut sql = String::from("\nWHERE");
        for (i, fragment) in self.fragments.iter().enumerate() {
            if i == 0 {
                sql.push(' ');
                sql.push_str(&fragment.body);
            } else {
                sql.push_str(
                    &Fragment {
                        verb: fragment.verb.or_and(),
                        body: fragment.body.clone(),
                    }
                    .to_sql(),
                );
            }
        }
        sql
    }

    /// Every attached rule, in attach order.
    pub fn get_rules(&self) -> &[WhereRule] {
        &self.rules
    }

    /// Split into the WHERE text and the rules to bind.
    pub fn into_parts(self) -> (String, Vec<WhereRule>) {
        (self.get_where(), self.rules)
    }
}

fn is_between(operator: &str) -> bool {
    operator == "BETWEEN" || operator == "NOT BETWEEN"
}

/// Render one rule as `(field OP rhs)` without its verb.
fn render_rule(rule: &WhereRule) -> StmtResult<String> {
    let field = escape_identifier(rule.field());
    let op = rule.operator();
    let ty = rule.ty();

    match rule.value() {
        Value::List(items) => {
            if ty.is_special() {
                return Err(StmtError::special_list(rule.field(), ty.as_str()));
            }
            let tokens = rule.tokens();
            if is_between(op) {
                if items.len() != 2 {
                    return Err(StmtError::invalid_rule(
                        rule.field(),
                        format!("{op} needs exactly two values, got {}", items.len()),
                    ));
                }
                return Ok(format!("({field} {op} {} AND {})", tokens[0], tokens[1]));
            }
            if items.is_empty() {
                return match op {
                    "IN" => Ok("(1=0)".to_string()),
                    "NOT IN" => Ok("(1=1)".to_string()),
                    _ => Err(StmtError::invalid_rule(
                        rule.field(),
                        format!("{op} with an empty list"),
                    )),
                };
            }
            Ok(format!("({field} {op} ({}))", tokens.join(", ")))
        }
        _ => {
            if is_between(op) {
                return Err(StmtError::invalid_rule(
                    rule.field(),
                    format!("{op} needs a list of two values"),
                ));
            }
            let token = rule.tokens().first().map(String::as_str).unwrap_or_default();
            let rhs = match ty {
                GenericType::Now | GenericType::Null => translate_special_token(token, ty),
                _ => format_token(token),
            };
            Ok(format!("({field} {op} {rhs})"))
        }
    }
}
