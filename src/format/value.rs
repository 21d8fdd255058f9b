//! Value rendering for log output.
//!
//! # Responsibilities
//! - Render a single value through a fixed rule pipeline: structured text,
//!   Basic-auth credentials, oversized-text elision, identity
//! - Render header-style key/value blocks with aligned labels and hanging
//!   indents for multi-valued entries
//! - Render banners and principal summaries
//!
//! # Design Decisions
//! - The rule order is fixed so output is deterministic
//! - The structured-text pre-check is a cheap reject filter keeping obvious
//!   non-JSON away from the parser; parse failures fall through, never
//!   propagate
//! - Basic-auth decoding recurses into the credential text exactly once

use std::sync::OnceLock;

use base64::Engine as _;
use http::HeaderMap;
use regex::Regex;

use crate::config::RenderConfig;
use crate::exchange::Principal;

fn basic_auth_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^Basic ([A-Za-z0-9+/=\-_]+)$").expect("valid literal pattern")
    })
}

/// Matches prefixes that can never start valid structured text.
fn begins_with_invalid_character() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*\d*[\*\w</,\.]").expect("valid literal pattern")
    })
}

/// Render one value through the fixed rule pipeline.
pub fn format_value(value: &str, limits: &RenderConfig) -> String {
    format_with_depth(value, limits, 0)
}

fn format_with_depth(value: &str, limits: &RenderConfig, depth: usize) -> String {
    if let Some(pretty) = try_structured_text(value) {
        return pretty;
    }
    if depth == 0 {
        if let Some(decoded) = try_basic_auth(value, limits) {
            return decoded;
        }
    }
    let length = value.chars().count();
    if length > limits.large_text_threshold {
        return format!("{length} characters");
    }
    value.to_string()
}

fn try_structured_text(value: &str) -> Option<String> {
    if begins_with_invalid_character().is_match(value) {
        return None;
    }
    let parsed: serde_json::Value = serde_json::from_str(value).ok()?;
    serde_json::to_string_pretty(&parsed).ok()
}

fn try_basic_auth(value: &str, limits: &RenderConfig) -> Option<String> {
    let captures = basic_auth_pattern().captures(value)?;
    let token = captures.get(1)?.as_str();
    let data = base64::engine::general_purpose::STANDARD.decode(token).ok()?;
    let credential = String::from_utf8_lossy(&data);
    Some(format!(
        "Basic <from Base64 string>{}",
        format_with_depth(&credential, limits, 1)
    ))
}

/// Join a value list for inline rendering (modified-header diff lines).
pub fn format_value_list(values: &[String], limits: &RenderConfig) -> String {
    values
        .iter()
        .map(|value| format_value(value, limits))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Bordered three-line banner marking the start of a request's log output.
pub fn banner(message: &str) -> String {
    let border = "*".repeat(message.chars().count() + 4);
    format!("\n{border}\n* {message} *\n{border}\n")
}

/// Render key/value entries one per line as `[key] : value`, keys padded to
/// the widest label, extra values indented to align under the value column.
/// Empty collections render as the literal `None`.
pub fn header_block(entries: &[(String, Vec<String>)], limits: &RenderConfig) -> String {
    if entries.is_empty() {
        return "None\n".to_string();
    }
    let width = entries
        .iter()
        .map(|(key, _)| key.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (key, values) in entries {
        let label = format!("[{key:<width$}] : ");
        let indent = label.chars().count();
        let formatted: Vec<String> = values
            .iter()
            .map(|value| format_value(value, limits))
            .collect();
        out.push_str(&label);
        out.push_str(&hanging_indent(&formatted, indent));
        out.push('\n');
    }
    out
}

/// Single-valued convenience over [`header_block`].
pub fn pairs_block(pairs: &[(String, String)], limits: &RenderConfig) -> String {
    let entries: Vec<(String, Vec<String>)> = pairs
        .iter()
        .map(|(key, value)| (key.clone(), vec![value.clone()]))
        .collect();
    header_block(&entries, limits)
}

/// Header map as ordered block entries (value order per key is preserved).
pub fn header_entries(headers: &HeaderMap) -> Vec<(String, Vec<String>)> {
    headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect();
            (name.as_str().to_string(), values)
        })
        .collect()
}

/// Principal summary: identity count, then per identity the authenticated
/// flag and, when authenticated, type, name, and claims.
pub fn format_principal(principal: &Principal, limits: &RenderConfig) -> String {
    let mut pairs: Vec<(String, String)> = Vec::new();
    pairs.push((
        "IdentityCount".to_string(),
        principal.identities().len().to_string(),
    ));
    for identity in principal.identities() {
        pairs.push((
            "IsAuthenticated".to_string(),
            identity.is_authenticated().to_string(),
        ));
        if identity.is_authenticated() {
            pairs.push((
                "AuthenticationType".to_string(),
                identity.authentication_type().to_string(),
            ));
            pairs.push(("Name".to_string(), identity.name().to_string()));
            for claim in identity.claims() {
                pairs.push((
                    format!("Claims.{}", claim.claim_type),
                    format!("<{}>{}", claim.value_type, claim.value),
                ));
            }
        }
    }
    pairs_block(&pairs, limits)
}

fn hanging_indent(lines: &[String], indent: usize) -> String {
    let mut out = String::new();
    if let Some(first) = lines.first() {
        out.push_str(first);
    }
    for line in lines.iter().skip(1) {
        out.push('\n');
        out.push_str(&" ".repeat(indent));
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Identity;
    use base64::Engine as _;

    fn limits() -> RenderConfig {
        RenderConfig::default()
    }

    #[test]
    fn structured_text_is_pretty_printed() {
        let rendered = format_value("{\"a\":1}", &limits());
        assert_ne!(rendered, "{\"a\":1}");
        assert!(rendered.contains('\n'));
        assert!(rendered.contains("\"a\": 1"));
    }

    #[test]
    fn invalid_structured_text_falls_through() {
        assert_eq!(format_value("{not json", &limits()), "{not json");
        assert_eq!(format_value("plain text", &limits()), "plain text");
    }

    #[test]
    fn oversized_text_is_elided() {
        let big = "x".repeat(1500);
        assert_eq!(format_value(&big, &limits()), "1500 characters");
    }

    #[test]
    fn text_at_the_threshold_is_echoed() {
        let exact = "y".repeat(1000);
        assert_eq!(format_value(&exact, &limits()), exact);
    }

    #[test]
    fn basic_auth_credentials_are_decoded() {
        let rendered = format_value("Basic QWxhZGRpbjpvcGVuc2VzYW1l", &limits());
        assert!(rendered.contains("Aladdin:opensesame"), "got: {rendered}");
    }

    #[test]
    fn basic_auth_decoding_is_bounded_to_one_level() {
        let inner = "Basic QWxhZGRpbjpvcGVuc2VzYW1l";
        let outer = format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(inner)
        );
        let rendered = format_value(&outer, &limits());
        // The decoded credential still shows its own encoded token.
        assert!(rendered.contains("QWxhZGRpbjpvcGVuc2VzYW1l"), "got: {rendered}");
        assert!(!rendered.contains("Aladdin:opensesame"));
    }

    #[test]
    fn banner_is_bordered_to_message_width() {
        assert_eq!(
            banner("GET /x"),
            "\n**********\n* GET /x *\n**********\n"
        );
    }

    #[test]
    fn header_block_pads_keys_to_the_widest_label() {
        let entries = vec![
            ("Accept".to_string(), vec!["application/json".to_string()]),
            ("X-Trace-Id".to_string(), vec!["abc".to_string()]),
        ];
        assert_eq!(
            header_block(&entries, &limits()),
            "[Accept    ] : application/json\n[X-Trace-Id] : abc\n"
        );
    }

    #[test]
    fn extra_values_hang_under_the_value_column() {
        let entries = vec![(
            "Via".to_string(),
            vec!["proxy-a".to_string(), "proxy-b".to_string()],
        )];
        assert_eq!(
            header_block(&entries, &limits()),
            "[Via] : proxy-a\n        proxy-b\n"
        );
    }

    #[test]
    fn empty_collections_render_as_none() {
        assert_eq!(header_block(&[], &limits()), "None\n");
    }

    #[test]
    fn principal_summary_lists_identities_and_claims() {
        let principal = Principal::new(vec![Identity::authenticated("Bearer", "jdoe")
            .with_claim("scope", "scim.read", "String")]);
        let rendered = format_principal(&principal, &limits());
        assert!(rendered.contains("[IdentityCount     ] : 1"));
        assert!(rendered.contains("[IsAuthenticated   ] : true"));
        assert!(rendered.contains("[AuthenticationType] : Bearer"));
        assert!(rendered.contains("[Name              ] : jdoe"));
        assert!(rendered.contains("[Claims.scope      ] : <String>scim.read"));
    }

    #[test]
    fn anonymous_principal_reports_zero_identities() {
        let principal = Principal::default();
        assert_eq!(
            format_principal(&principal, &limits()),
            "[IdentityCount] : 0\n"
        );
    }
}
