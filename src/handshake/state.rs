/// Which handshake variant the client selected via the C1 version field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeKind {
    /// All-zero version field: plain echo exchange
    Simple,

    /// Nonzero version field: HMAC-SHA256 digest exchange
    Complex,
}

/// Server-side handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Waiting for C0+C1 from the client
    WaitC0C1,

    /// Sent S0+S1+S2, waiting for C2
    WaitC2(HandshakeKind),

    /// Received C2, handshake complete
    Established(HandshakeKind),
}

impl HandshakeState {
    /// Initial state
    pub fn new() -> Self {
        HandshakeState::WaitC0C1
    }

    /// Record that S0+S1+S2 went out for the given variant
    pub fn sent_response(&mut self, kind: HandshakeKind) {
        *self = HandshakeState::WaitC2(kind);
    }

    /// Record that C2 arrived
    pub fn received_c2(&mut self) {
        if let HandshakeState::WaitC2(kind) = *self {
            *self = HandshakeState::Established(kind);
        }
    }

    /// Check if handshake is complete
    pub fn is_established(&self) -> bool {
        matches!(self, HandshakeState::Established(_))
    }
}

impl Default for HandshakeState {
    fn default() -> Self {
        Self::new()
    }
}
