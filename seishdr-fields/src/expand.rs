//! Group and wildcard expansion of requested names.
//!
//! Expansion is purely name-level. Whether an expanded name resolves is up
//! to the resolver, so a non-pattern request always expands to itself.

use regex::Regex;
use std::collections::BTreeSet;

use crate::name::FieldName;
use crate::schema::HeaderSchema;

/// Translate a `*`/`?` glob into an anchored regular expression.
pub fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            other => translated.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    translated.push('$');
    Regex::new(&translated).ok()
}

/// Expand a group or glob into `out`, which keeps the merged result sorted
/// and free of duplicates. Returns `false` when `name` is neither.
fn expand_into(schema: &HeaderSchema, name: &FieldName, out: &mut BTreeSet<String>) -> bool {
    if let Some(members) = schema.group(&name.token) {
        out.extend(members.iter().map(|member| name.with_token(member)));
        return true;
    }

    if name.is_pattern() {
        let Some(regex) = glob_to_regex(&name.token) else {
            return true;
        };
        if name.time_qualifier().is_some() {
            out.extend(
                schema
                    .time_fields()
                    .iter()
                    .filter(|candidate| regex.is_match(candidate))
                    .map(|candidate| name.with_token(candidate)),
            );
        } else {
            out.extend(
                schema
                    .candidate_names()
                    .into_iter()
                    .filter(|candidate| regex.is_match(candidate))
                    .map(|candidate| name.with_token(candidate)),
            );
        }
        return true;
    }

    false
}

/// Concrete names for `request` in one schema, sorted and deduplicated.
///
/// A blank request expands to nothing.
pub fn expand(schema: &HeaderSchema, request: &str) -> Vec<String> {
    expand_across(&[schema], request)
}

/// Merge the expansions of `request` across several schema versions.
pub fn expand_across(schemas: &[&HeaderSchema], request: &str) -> Vec<String> {
    let Some(name) = FieldName::parse(request) else {
        return Vec::new();
    };
    let mut out = BTreeSet::new();
    let mut expanded = false;
    for schema in schemas {
        expanded |= expand_into(schema, &name, &mut out);
    }
    if !expanded {
        out.insert(name.to_string());
    }
    out.into_iter().collect()
}
