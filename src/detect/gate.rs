/// Identifies one classification request.
///
/// Tickets are compared by generation; a completion only applies while its
/// ticket is still the gate's in-flight ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Generation counter allowing at most one in-flight request.
///
/// Issuing a ticket supersedes whatever was in flight; cancelling advances the
/// generation so nothing issued earlier can settle afterwards.
#[derive(Debug, Default)]
pub struct RequestGate {
    generation: u64,
    in_flight: Option<RequestTicket>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket. Returns it together with the ticket it superseded.
    pub fn issue(&mut self) -> (RequestTicket, Option<RequestTicket>) {
        self.generation = self.generation.wrapping_add(1);
        let ticket = RequestTicket {
            generation: self.generation,
        };
        let superseded = self.in_flight.replace(ticket);
        (ticket, superseded)
    }

    /// Cancel the in-flight request, if any.
    pub fn cancel(&mut self) -> Option<RequestTicket> {
        self.generation = self.generation.wrapping_add(1);
        self.in_flight.take()
    }

    /// Settle a completed request. `false` means the ticket is stale and its
    /// result must be dropped.
    pub fn settle(&mut self, ticket: RequestTicket) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    pub fn in_flight(&self) -> Option<RequestTicket> {
        self.in_flight
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
