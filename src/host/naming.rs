//! Option name ↔ attribute name conversion
//!
//! `myOption` maps to `data-my-option` under the default prefix. The mapping
//! is invertible for names accepted by [`is_valid_option_name`].

use std::sync::OnceLock;

use regex::Regex;

fn option_name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").ok())
        .as_ref()
}

/// Identifier-like names: a lowercase ASCII letter followed by ASCII letters and digits
pub fn is_valid_option_name(name: &str) -> bool {
    option_name_pattern().is_some_and(|re| re.is_match(name))
}

/// `myOption` → `my-option`
pub fn kebab(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for c in camel.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `my-option` → `myOption`
pub fn camel(kebab: &str) -> String {
    let mut out = String::with_capacity(kebab.len());
    let mut upper_next = false;
    for c in kebab.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next && c.is_ascii_lowercase() {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            if upper_next {
                out.push('-');
                upper_next = false;
            }
            out.push(c);
        }
    }
    if upper_next {
        out.push('-');
    }
    out
}

/// Attribute name for an option
pub fn option_to_attribute(prefix: &str, option: &str) -> String {
    format!("{}{}", prefix, kebab(option))
}

/// Option name for an attribute, if it carries the prefix
pub fn attribute_to_option(prefix: &str, attribute: &str) -> Option<String> {
    attribute.strip_prefix(prefix).map(camel)
}
