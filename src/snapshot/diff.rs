//! Structural difference between two exchange snapshots.
//!
//! # Design Decisions
//! - Header comparison is key-based set comparison per side; value lists are
//!   equal only when their ordered sequences are identical
//! - Scalars (status, body length) produce a before/after pair only when the
//!   values differ
//! - Principal comparison is `Arc` pointer identity, not structural equality

use std::sync::Arc;

use http::{HeaderMap, StatusCode};

use crate::exchange::Principal;

use super::snapshot::ExchangeSnapshot;

/// Before/after pair for a modified entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChange<T> {
    pub before: T,
    pub after: T,
}

/// Added, removed, and modified entries of a keyed comparison. A key appears
/// in at most one of the three.
#[derive(Debug, Default)]
pub struct MapDifference<V> {
    pub added: Vec<(String, V)>,
    pub removed: Vec<(String, V)>,
    pub modified: Vec<(String, ValueChange<V>)>,
}

impl<V> MapDifference<V> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Header entries keep their full ordered value list.
pub type HeaderDifference = MapDifference<Vec<String>>;

#[derive(Debug, Default)]
pub struct RequestDifference {
    pub headers: HeaderDifference,
}

impl RequestDifference {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ResponseDifference {
    pub headers: HeaderDifference,
    pub status: Option<ValueChange<StatusCode>>,
    pub body_length: Option<ValueChange<u64>>,
}

impl ResponseDifference {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.status.is_none() && self.body_length.is_none()
    }
}

/// Everything one stage changed between two snapshots.
#[derive(Debug)]
pub struct ExchangeDifference {
    pub request: RequestDifference,
    pub response: ResponseDifference,
    pub principal_changed: bool,
    pub principal: Arc<Principal>,
}

impl ExchangeDifference {
    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.response.is_empty() && !self.principal_changed
    }
}

/// Compute the structural difference between two snapshots.
pub fn compare(before: &ExchangeSnapshot, after: &ExchangeSnapshot) -> ExchangeDifference {
    ExchangeDifference {
        request: RequestDifference {
            headers: diff_headers(&before.request.headers, &after.request.headers),
        },
        response: ResponseDifference {
            headers: diff_headers(&before.response.headers, &after.response.headers),
            status: compare_scalar(before.response.status, after.response.status),
            body_length: compare_scalar(before.response.body_length, after.response.body_length),
        },
        principal_changed: !Arc::ptr_eq(&before.principal, &after.principal),
        principal: Arc::clone(&after.principal),
    }
}

fn compare_scalar<T: PartialEq + Copy>(before: T, after: T) -> Option<ValueChange<T>> {
    if before == after {
        None
    } else {
        Some(ValueChange { before, after })
    }
}

fn diff_headers(before: &HeaderMap, after: &HeaderMap) -> HeaderDifference {
    let mut difference = HeaderDifference::default();
    for name in before.keys() {
        let before_values = ordered_values(before, name.as_str());
        match after.contains_key(name) {
            true => {
                let after_values = ordered_values(after, name.as_str());
                if before_values != after_values {
                    difference.modified.push((
                        name.as_str().to_string(),
                        ValueChange {
                            before: before_values,
                            after: after_values,
                        },
                    ));
                }
            }
            false => difference
                .removed
                .push((name.as_str().to_string(), before_values)),
        }
    }
    for name in after.keys() {
        if !before.contains_key(name) {
            difference
                .added
                .push((name.as_str().to_string(), ordered_values(after, name.as_str())));
        }
    }
    difference
}

fn ordered_values(map: &HeaderMap, name: &str) -> Vec<String> {
    map.get_all(name)
        .iter()
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Exchange;
    use crate::exchange::{Identity, Principal};
    use crate::snapshot::take;
    use http::{HeaderValue, Method, Uri};

    fn snapshot_of(exchange: &Exchange) -> ExchangeSnapshot {
        take(exchange)
    }

    fn header_map(entries: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(name, value) in entries {
            map.append(
                http::header::HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }

    #[test]
    fn identical_snapshots_diff_empty() {
        let exchange = Exchange::builder(Method::GET, Uri::from_static("/Users"))
            .header(http::header::ACCEPT, HeaderValue::from_static("application/json"))
            .build();
        let snapshot = snapshot_of(&exchange);
        let again = snapshot_of(&exchange);
        assert!(compare(&snapshot, &again).is_empty());
    }

    #[test]
    fn added_and_removed_keys_partition() {
        let before = header_map(&[("a", "1"), ("b", "2")]);
        let after = header_map(&[("b", "2"), ("c", "3")]);
        let difference = diff_headers(&before, &after);

        assert_eq!(difference.removed, vec![("a".to_string(), vec!["1".to_string()])]);
        assert_eq!(difference.added, vec![("c".to_string(), vec!["3".to_string()])]);
        assert!(difference.modified.is_empty());
    }

    #[test]
    fn changed_value_reports_before_and_after() {
        let before = header_map(&[("x-marker", "1")]);
        let after = header_map(&[("x-marker", "2")]);
        let difference = diff_headers(&before, &after);

        assert!(difference.added.is_empty());
        assert!(difference.removed.is_empty());
        assert_eq!(
            difference.modified,
            vec![(
                "x-marker".to_string(),
                ValueChange {
                    before: vec!["1".to_string()],
                    after: vec!["2".to_string()],
                }
            )]
        );
    }

    #[test]
    fn value_list_order_is_significant() {
        let before = header_map(&[("via", "proxy-a"), ("via", "proxy-b")]);
        let after = header_map(&[("via", "proxy-b"), ("via", "proxy-a")]);
        let difference = diff_headers(&before, &after);
        assert_eq!(difference.modified.len(), 1);
    }

    #[test]
    fn principal_change_is_pointer_identity() {
        let mut exchange = Exchange::builder(Method::GET, Uri::from_static("/")).build();
        let before = snapshot_of(&exchange);

        exchange.set_principal(std::sync::Arc::new(Principal::new(vec![
            Identity::authenticated("Bearer", "jdoe"),
        ])));
        let after = snapshot_of(&exchange);

        let difference = compare(&before, &after);
        assert!(difference.principal_changed);
        assert!(!difference.is_empty());
        assert_eq!(difference.principal.identities().len(), 1);
    }

    #[test]
    fn status_and_body_length_changes_are_scalar_pairs() {
        let mut exchange = Exchange::builder(Method::POST, Uri::from_static("/Users")).build();
        let before = snapshot_of(&exchange);

        exchange.response_mut().set_status(StatusCode::CREATED);
        let after = snapshot_of(&exchange);

        let difference = compare(&before, &after);
        assert_eq!(
            difference.response.status,
            Some(ValueChange {
                before: StatusCode::OK,
                after: StatusCode::CREATED,
            })
        );
        assert!(difference.response.body_length.is_none());
    }
}
