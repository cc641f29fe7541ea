//! Bolt protocol version definitions.

use std::fmt;

/// Bolt protocol versions understood by this crate.
///
/// The discriminant is `major << 8 | minor`, which makes the derived
/// ordering follow protocol age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum BoltVersion {
    /// Bolt 4.0
    V4_0 = 0x0400,
    /// Bolt 4.1
    V4_1 = 0x0401,
    /// Bolt 4.2
    V4_2 = 0x0402,
    /// Bolt 4.3 - ROUTE message
    V4_3 = 0x0403,
    /// Bolt 4.4 - ROUTE with database context map
    V4_4 = 0x0404,
    /// Bolt 5.0 - element ids, UTC date-times
    V5_0 = 0x0500,
    /// Bolt 5.1 - LOGON/LOGOFF
    V5_1 = 0x0501,
    /// Bolt 5.2 - notification filters
    V5_2 = 0x0502,
    /// Bolt 5.3 - bolt_agent in HELLO
    V5_3 = 0x0503,
    /// Bolt 5.4 - TELEMETRY
    V5_4 = 0x0504,
}

impl BoltVersion {
    /// All supported versions, newest first.
    pub const ALL: [BoltVersion; 10] = [
        BoltVersion::V5_4,
        BoltVersion::V5_3,
        BoltVersion::V5_2,
        BoltVersion::V5_1,
        BoltVersion::V5_0,
        BoltVersion::V4_4,
        BoltVersion::V4_3,
        BoltVersion::V4_2,
        BoltVersion::V4_1,
        BoltVersion::V4_0,
    ];

    /// Look up a version by its numbers.
    pub fn new(major: u8, minor: u8) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.major() == major && v.minor() == minor)
    }

    /// Get the major version number.
    pub fn major(self) -> u8 {
        ((self as u16) >> 8) as u8
    }

    /// Get the minor version number.
    pub fn minor(self) -> u8 {
        ((self as u16) & 0xFF) as u8
    }

    /// Handshake encoding: `[0, 0, minor, major]`.
    pub fn to_bytes(self) -> [u8; 4] {
        [0, 0, self.minor(), self.major()]
    }

    /// Parse a handshake reply.
    pub fn from_bytes(bytes: [u8; 4]) -> Option<Self> {
        Self::new(bytes[3], bytes[2])
    }

    /// ROUTE message is available.
    pub fn supports_route(self) -> bool {
        self >= BoltVersion::V4_3
    }

    /// ROUTE carries a `{db, imp_user}` map instead of a bare database name.
    pub fn route_uses_db_context(self) -> bool {
        self >= BoltVersion::V4_4
    }

    /// Nodes and relationships carry string element ids.
    pub fn uses_element_ids(self) -> bool {
        self >= BoltVersion::V5_0
    }

    /// Date-times count seconds in UTC without needing the "utc" patch.
    pub fn uses_utc_date_time(self) -> bool {
        self >= BoltVersion::V5_0
    }

    /// The server may be asked for UTC date-times with `patch_bolt: ["utc"]`.
    pub fn supports_utc_patch(self) -> bool {
        matches!(self, BoltVersion::V4_3 | BoltVersion::V4_4)
    }

    /// Authentication moved from HELLO to LOGON/LOGOFF.
    pub fn supports_logon(self) -> bool {
        self >= BoltVersion::V5_1
    }

    /// HELLO carries a structured `bolt_agent` map.
    pub fn supports_bolt_agent(self) -> bool {
        self >= BoltVersion::V5_3
    }

    /// TELEMETRY message is available.
    pub fn supports_telemetry(self) -> bool {
        self >= BoltVersion::V5_4
    }
}

impl fmt::Display for BoltVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_lookup() {
        assert_eq!(BoltVersion::new(4, 3), Some(BoltVersion::V4_3));
        assert_eq!(BoltVersion::new(5, 4), Some(BoltVersion::V5_4));
        assert_eq!(BoltVersion::new(3, 0), None);
        assert_eq!(BoltVersion::new(0, 0), None);
    }

    #[test]
    fn test_version_major_minor() {
        assert_eq!(BoltVersion::V4_3.major(), 4);
        assert_eq!(BoltVersion::V4_3.minor(), 3);
        assert_eq!(BoltVersion::V5_1.major(), 5);
        assert_eq!(BoltVersion::V5_1.minor(), 1);
    }

    #[test]
    fn test_version_bytes() {
        assert_eq!(BoltVersion::V4_3.to_bytes(), [0x00, 0x00, 0x03, 0x04]);
        assert_eq!(
            BoltVersion::from_bytes([0x00, 0x00, 0x02, 0x05]),
            Some(BoltVersion::V5_2)
        );
        // "HTTP"
        assert_eq!(BoltVersion::from_bytes(*b"HTTP"), None);
    }

    #[test]
    fn test_version_ordering() {
        for pair in BoltVersion::ALL.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn test_version_display() {
        assert_eq!(BoltVersion::V4_0.to_string(), "4.0");
        assert_eq!(BoltVersion::V5_4.to_string(), "5.4");
    }

    #[test]
    fn test_feature_gates() {
        assert!(!BoltVersion::V4_2.supports_route());
        assert!(BoltVersion::V4_3.supports_route());
        assert!(!BoltVersion::V4_3.route_uses_db_context());
        assert!(BoltVersion::V4_4.route_uses_db_context());

        assert!(!BoltVersion::V4_4.uses_element_ids());
        assert!(BoltVersion::V5_0.uses_element_ids());

        assert!(BoltVersion::V4_4.supports_utc_patch());
        assert!(!BoltVersion::V5_0.supports_utc_patch());
        assert!(!BoltVersion::V4_2.supports_utc_patch());

        assert!(!BoltVersion::V5_0.supports_logon());
        assert!(BoltVersion::V5_1.supports_logon());
        assert!(!BoltVersion::V5_3.supports_telemetry());
        assert!(BoltVersion::V5_4.supports_telemetry());
    }
}
