//! Typed requests
//!
//! A request knows its header, fills in its body and turns the raw
//! [`QueryResult`] into its own response type. The master drives the line
//! and never interprets opcodes; that knowledge lives here.

mod info;
mod ping;

pub use info::{InfoRequest, InfoResponse};
pub use ping::{PingRequest, PingResponse};

use mkbus_protocol::{Body, FrameError, Profile, QueryResult};

/// One kind of master query
pub trait Request<P: Profile> {
    /// What [`parse_response`](Self::parse_response) produces
    type Response;

    /// Header to send; source and body length are filled in by the master
    fn header(&self) -> P::Header;

    /// Whether the request may be sent now
    ///
    /// A request that is not ready fails with `TX_ERROR` and the line is
    /// left untouched.
    fn is_ready(&self) -> bool {
        true
    }

    /// Write the request body
    fn serialize(&self, _body: &mut Body) -> Result<(), FrameError> {
        Ok(())
    }

    /// Interpret the exchange outcome
    fn parse_response(&self, result: QueryResult<P>) -> Self::Response;
}

/// Request with a caller-supplied header and body
///
/// The response is the untouched [`QueryResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest<P: Profile> {
    header: P::Header,
    body: Body,
}

impl<P: Profile> RawRequest<P> {
    /// Create a request, rejecting bodies above the frame maximum
    pub fn new(header: P::Header, body: &[u8]) -> Result<Self, FrameError> {
        let mut stored = Body::new();
        stored
            .extend_from_slice(body)
            .map_err(|_| FrameError::BodyTooLarge)?;
        Ok(Self {
            header,
            body: stored,
        })
    }
}

impl<P: Profile> Request<P> for RawRequest<P> {
    type Response = QueryResult<P>;

    fn header(&self) -> P::Header {
        self.header.clone()
    }

    fn serialize(&self, body: &mut Body) -> Result<(), FrameError> {
        body.extend_from_slice(&self.body)
            .map_err(|_| FrameError::BodyTooLarge)
    }

    fn parse_response(&self, result: QueryResult<P>) -> QueryResult<P> {
        result
    }
}
