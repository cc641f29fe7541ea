//! Client side of the Bolt version negotiation.

use super::{BoltVersion, HandshakeError, BOLT_MAGIC, HANDSHAKE_SIZE};

/// Reply sent by servers that speak HTTP on the Bolt port.
const HTTP_REPLY: [u8; 4] = *b"HTTP";

/// One of the four version slots sent after the magic number.
///
/// A proposal covers `version` and the `range` minor versions below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionProposal {
    /// Highest version in the slot
    pub version: BoltVersion,
    /// Number of older minor versions also accepted
    pub range: u8,
}

impl VersionProposal {
    /// Propose exactly one version.
    pub fn exact(version: BoltVersion) -> Self {
        Self { version, range: 0 }
    }

    /// Propose `newest` down to `oldest` (same major).
    pub fn range(newest: BoltVersion, oldest: BoltVersion) -> Self {
        let range = if newest.major() == oldest.major() {
            newest.minor().saturating_sub(oldest.minor())
        } else {
            0
        };
        Self {
            version: newest,
            range,
        }
    }

    /// Wire encoding: `[0, range, minor, major]`.
    pub fn to_bytes(self) -> [u8; 4] {
        [0, self.range, self.version.minor(), self.version.major()]
    }

    /// Whether `version` falls inside this slot.
    pub fn covers(self, version: BoltVersion) -> bool {
        version.major() == self.version.major()
            && version.minor() <= self.version.minor()
            && version.minor() >= self.version.minor().saturating_sub(self.range)
    }
}

/// Client handshake: the proposal to send and validation of the reply.
#[derive(Debug, Clone)]
pub struct Handshake {
    proposals: Vec<VersionProposal>,
}

impl Handshake {
    /// Propose every supported version: 5.4-5.0, 4.4-4.2, 4.1, 4.0.
    pub fn new() -> Self {
        Self {
            proposals: vec![
                VersionProposal::range(BoltVersion::V5_4, BoltVersion::V5_0),
                VersionProposal::range(BoltVersion::V4_4, BoltVersion::V4_2),
                VersionProposal::exact(BoltVersion::V4_1),
                VersionProposal::exact(BoltVersion::V4_0),
            ],
        }
    }

    /// Propose an explicit list of versions, newest first.
    ///
    /// Runs of consecutive minors within one major share a range slot;
    /// anything past the fourth slot is dropped.
    pub fn with_versions(versions: &[BoltVersion]) -> Self {
        let mut proposals: Vec<VersionProposal> = Vec::new();
        for &version in versions {
            match proposals.last_mut() {
                Some(last)
                    if last.version.major() == version.major()
                        && last.version.minor().checked_sub(last.range + 1)
                            == Some(version.minor()) =>
                {
                    last.range += 1;
                }
                _ => proposals.push(VersionProposal::exact(version)),
            }
        }
        proposals.truncate(4);
        Self { proposals }
    }

    /// Proposal slots in send order.
    pub fn proposals(&self) -> &[VersionProposal] {
        &self.proposals
    }

    /// Bytes to send: magic followed by four slots, unused slots zeroed.
    pub fn request(&self) -> [u8; HANDSHAKE_SIZE] {
        let mut data = [0u8; HANDSHAKE_SIZE];
        data[0..4].copy_from_slice(&BOLT_MAGIC);
        for (i, proposal) in self.proposals.iter().take(4).enumerate() {
            let offset = 4 + i * 4;
            data[offset..offset + 4].copy_from_slice(&proposal.to_bytes());
        }
        data
    }

    /// Validate the server's 4-byte reply.
    pub fn parse_response(&self, reply: [u8; 4]) -> Result<BoltVersion, HandshakeError> {
        if reply == [0, 0, 0, 0] {
            return Err(HandshakeError::NoCompatibleVersion);
        }
        if reply == HTTP_REPLY {
            return Err(HandshakeError::InvalidData(
                "server responded HTTP; make sure the Bolt port is used, not the HTTP port".into(),
            ));
        }
        let (major, minor) = (reply[3], reply[2]);
        BoltVersion::new(major, minor)
            .filter(|v| self.proposals.iter().any(|p| p.covers(*v)))
            .ok_or(HandshakeError::UnexpectedVersion { major, minor })
    }
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}
