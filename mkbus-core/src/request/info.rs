//! Device description query

use heapless::String;
use mkbus_protocol::{opcode, AddressOf, Frame, Header, Profile, QueryResult, Status, MAX_BODY_SIZE};

use super::Request;

/// Ask a node for its description string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfoRequest<P: Profile> {
    target: AddressOf<P>,
}

impl<P: Profile> InfoRequest<P> {
    /// Query addressed to `target`
    pub fn new(target: AddressOf<P>) -> Self {
        Self { target }
    }

    /// Node being queried
    pub fn target(&self) -> AddressOf<P> {
        self.target
    }
}

/// Answer to an [`InfoRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct InfoResponse<P: Profile> {
    /// Exchange outcome
    pub status: Status,
    /// Description, present only when the exchange succeeded with UTF-8 text
    pub info: Option<String<MAX_BODY_SIZE>>,
    /// Received frame, kept even when faults were flagged
    pub content: Option<Frame<P>>,
}

impl<P: Profile> Request<P> for InfoRequest<P> {
    type Response = InfoResponse<P>;

    fn header(&self) -> P::Header {
        <P::Header as Header>::request(opcode::INFO, self.target)
    }

    fn parse_response(&self, result: QueryResult<P>) -> InfoResponse<P> {
        let info = result.frame().and_then(|frame| {
            let mut text = String::new();
            text.push_str(frame.body_str()?).ok()?;
            Some(text)
        });

        InfoResponse {
            status: result.status,
            info,
            content: result.content,
        }
    }
}
