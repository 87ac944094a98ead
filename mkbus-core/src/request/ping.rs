//! Liveness check

use mkbus_protocol::{opcode, AddressOf, Header, Profile, QueryResult, Status};

use super::Request;

/// Check that a node is answering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingRequest<P: Profile> {
    target: AddressOf<P>,
}

impl<P: Profile> PingRequest<P> {
    /// Ping addressed to `target`
    pub fn new(target: AddressOf<P>) -> Self {
        Self { target }
    }
}

/// Answer to a [`PingRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PingResponse {
    /// Exchange outcome
    pub status: Status,
    /// Node answered with a valid PONG
    pub alive: bool,
}

impl<P: Profile> Request<P> for PingRequest<P> {
    type Response = PingResponse;

    fn header(&self) -> P::Header {
        <P::Header as Header>::request(opcode::PING, self.target)
    }

    fn parse_response(&self, result: QueryResult<P>) -> PingResponse {
        let alive = result
            .frame()
            .is_some_and(|frame| frame.opcode() == opcode::PONG);

        PingResponse {
            status: result.status,
            alive,
        }
    }
}
