//! Point-in-time capture of an exchange.

use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode};

use crate::exchange::{Exchange, Principal};

/// Inbound state at one instant.
#[derive(Debug)]
pub struct RequestSnapshot {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub cookies: Vec<(String, String)>,
}

/// Outbound state at one instant.
#[derive(Debug)]
pub struct ResponseSnapshot {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body_length: u64,
}

/// Immutable capture of request, response, and principal. Created once per
/// observation point and never mutated; owned by the logging state that took
/// it until superseded by the next snapshot.
#[derive(Debug)]
pub struct ExchangeSnapshot {
    pub request: RequestSnapshot,
    pub response: ResponseSnapshot,
    pub principal: Arc<Principal>,
}

/// Read the exchange's current state into an immutable copy. The only side
/// effect on the exchange is the read itself.
pub fn take(exchange: &Exchange) -> ExchangeSnapshot {
    ExchangeSnapshot {
        request: RequestSnapshot {
            method: exchange.request().method().clone(),
            path: exchange.request().path().to_string(),
            headers: exchange.request().headers().clone(),
            cookies: exchange.request().cookies().to_vec(),
        },
        response: ResponseSnapshot {
            status: exchange.response().status(),
            headers: exchange.response().headers().clone(),
            body_length: exchange.response().body_len(),
        },
        principal: Arc::clone(exchange.principal()),
    }
}
