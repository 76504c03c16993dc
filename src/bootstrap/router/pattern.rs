//! Topic Pattern Compiler
//!
//! Compiles declarative topic patterns like `devices/{device_id}/status` into
//! a match regex with named captures and a broker subscription filter where
//! each placeholder becomes the single-level wildcard `+`.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{RouteError, RouteResult};

/// A compiled topic pattern.
///
/// Matching is case-sensitive and does not normalize trailing slashes: a
/// pattern that does not end with `/` will not match a topic that does.
#[derive(Debug, Clone)]
pub struct TopicPattern {
    pattern: String,
    regex: Regex,
    filter: String,
    params: Vec<String>,
}

impl TopicPattern {
    /// Compile a pattern string into a matcher and subscription filter.
    pub fn compile(pattern: &str) -> RouteResult<TopicPattern> {
        if pattern.is_empty() {
            return Err(RouteError::invalid(pattern, "pattern is empty"));
        }

        let mut regex_src = String::from("^");
        let mut filter = String::new();
        let mut params: Vec<String> = Vec::new();

        for (i, segment) in pattern.split('/').enumerate() {
            if i > 0 {
                regex_src.push('/');
                filter.push('/');
            }

            if segment.starts_with('{') && segment.ends_with('}') && segment.len() >= 2 {
                let name = &segment[1..segment.len() - 1];
                if name.is_empty() {
                    return Err(RouteError::invalid(pattern, "placeholder name is empty"));
                }
                if !is_identifier(name) {
                    return Err(RouteError::invalid(
                        pattern,
                        format!("placeholder name '{}' is not an identifier", name),
                    ));
                }
                if params.iter().any(|p| p == name) {
                    return Err(RouteError::invalid(
                        pattern,
                        format!("duplicate placeholder '{}'", name),
                    ));
                }
                params.push(name.to_string());

                // A placeholder matches exactly one topic segment.
                regex_src.push_str(&format!("(?P<{}>[^/]+)", name));
                filter.push('+');
            } else if segment.contains('{') || segment.contains('}') {
                return Err(RouteError::invalid(
                    pattern,
                    format!("segment '{}' contains a partial placeholder", segment),
                ));
            } else {
                regex_src.push_str(&regex::escape(segment));
                filter.push_str(segment);
            }
        }
        regex_src.push('$');

        let regex = Regex::new(&regex_src)
            .map_err(|e| RouteError::invalid(pattern, format!("regex compilation failed: {}", e)))?;

        Ok(TopicPattern {
            pattern: pattern.to_string(),
            regex,
            filter,
            params,
        })
    }

    /// Match a delivered topic, extracting placeholder values.
    pub fn match_topic(&self, topic: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(topic)?;
        let mut params = HashMap::with_capacity(self.params.len());
        for name in &self.params {
            if let Some(value) = captures.name(name) {
                params.insert(name.clone(), value.as_str().to_string());
            }
        }
        Some(params)
    }

    /// The original pattern string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The broker-facing subscription filter (`+` per placeholder).
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Placeholder names, in pattern order.
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
