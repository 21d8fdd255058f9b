//! The per-request exchange: the crate's view of the hosting framework's
//! request/response context.
//!
//! # Responsibilities
//! - Hold the mutable request and response channels that observed stages act on
//! - Carry the authenticated principal and per-request extensions
//! - Provide the builder that hosting adapters use to construct an exchange
//!
//! # Design Decisions
//! - One exchange per in-flight request; stages receive `&mut Exchange`
//! - Per-request services ride in `http::Extensions`, the usual place for
//!   request-scoped context in the http ecosystem
//! - Response state accrues on the exchange while the request is still being
//!   handled, so instrumentation can snapshot it at any point in the chain

use std::sync::Arc;

use http::{Extensions, HeaderMap, Method, StatusCode, Uri};

use super::body::{InboundBody, InboundStream, OutboundBody, SharedBuffer, TransportSink};
use super::principal::Principal;

/// Inbound half of an exchange.
#[derive(Debug)]
pub struct RequestChannel {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    cookies: Vec<(String, String)>,
    body: InboundBody,
}

impl RequestChannel {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Query parameters as ordered, percent-decoded pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let query = self.uri.query().unwrap_or("");
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    pub fn content_type(&self) -> Option<&str> {
        header_str(&self.headers, http::header::CONTENT_TYPE)
    }

    pub fn body_mut(&mut self) -> &mut InboundBody {
        &mut self.body
    }
}

/// Outbound half of an exchange.
#[derive(Debug)]
pub struct ResponseChannel {
    status: StatusCode,
    headers: HeaderMap,
    body: OutboundBody,
}

impl ResponseChannel {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        header_str(&self.headers, http::header::CONTENT_TYPE)
    }

    pub fn body(&self) -> &OutboundBody {
        &self.body
    }

    /// Number of body bytes visible so far.
    pub fn body_len(&self) -> u64 {
        self.body.len()
    }

    pub async fn write_body(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.body.write_all(bytes).await
    }

    /// Swap the outbound stream for a capture buffer, handing back the
    /// retained transport sink. Returns `None` if a buffer is already
    /// installed, leaving it in place.
    pub(crate) fn swap_in_buffer(
        &mut self,
        buffer: SharedBuffer,
    ) -> Option<(Box<dyn TransportSink>, u64)> {
        match std::mem::replace(&mut self.body, OutboundBody::Captured(buffer)) {
            OutboundBody::Transport { sink, written } => Some((sink, written)),
            OutboundBody::Captured(existing) => {
                self.body = OutboundBody::Captured(existing);
                None
            }
        }
    }

    /// Reinstall the retained transport sink once capture ends.
    pub(crate) fn reinstate_transport(&mut self, sink: Box<dyn TransportSink>, written: u64) {
        self.body = OutboundBody::Transport { sink, written };
    }
}

/// One in-flight request/response pair flowing through the stage chain.
#[derive(Debug)]
pub struct Exchange {
    request: RequestChannel,
    response: ResponseChannel,
    principal: Arc<Principal>,
    extensions: Extensions,
}

impl Exchange {
    pub fn builder(method: Method, uri: Uri) -> ExchangeBuilder {
        ExchangeBuilder::new(method, uri)
    }

    pub fn request(&self) -> &RequestChannel {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut RequestChannel {
        &mut self.request
    }

    pub fn response(&self) -> &ResponseChannel {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseChannel {
        &mut self.response
    }

    pub fn principal(&self) -> &Arc<Principal> {
        &self.principal
    }

    /// Replace the principal (e.g. after an authentication stage). The
    /// differ reports this as a principal change.
    pub fn set_principal(&mut self, principal: Arc<Principal>) {
        self.principal = principal;
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

/// Builder used by hosting adapters (and tests) to assemble an exchange.
pub struct ExchangeBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    cookies: Option<Vec<(String, String)>>,
    body: InboundBody,
    transport: Box<dyn TransportSink>,
    principal: Arc<Principal>,
}

impl ExchangeBuilder {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            cookies: None,
            body: InboundBody::empty(),
            transport: Box::new(tokio::io::sink()),
            principal: Principal::anonymous(),
        }
    }

    /// Append a request header (repeated names keep their order).
    pub fn header(mut self, name: http::header::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn body_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.body = InboundBody::from_bytes(bytes);
        self
    }

    pub fn body_stream(mut self, stream: Box<dyn InboundStream>) -> Self {
        self.body = InboundBody::from_stream(stream);
        self
    }

    /// Where response bytes are finally delivered.
    pub fn transport(mut self, sink: Box<dyn TransportSink>) -> Self {
        self.transport = sink;
        self
    }

    pub fn principal(mut self, principal: Arc<Principal>) -> Self {
        self.principal = principal;
        self
    }

    pub fn build(self) -> Exchange {
        let cookies = self
            .cookies
            .unwrap_or_else(|| cookies_from_headers(&self.headers));
        Exchange {
            request: RequestChannel {
                method: self.method,
                uri: self.uri,
                headers: self.headers,
                cookies,
                body: self.body,
            },
            response: ResponseChannel {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: OutboundBody::transport(self.transport),
            },
            principal: self.principal,
            extensions: Extensions::new(),
        }
    }
}

fn header_str(headers: &HeaderMap, name: http::header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Cookie pairs from the `Cookie` header, in declaration order.
fn cookies_from_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for value in headers.get_all(http::header::COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for piece in raw.split(';') {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            match piece.split_once('=') {
                Some((name, value)) => pairs.push((name.to_string(), value.to_string())),
                None => pairs.push((piece.to_string(), String::new())),
            }
        }
    }
    pairs
}
