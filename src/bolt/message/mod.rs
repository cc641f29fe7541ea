//! Bolt protocol message types for versions 4.0 through 5.4.

pub mod metadata;
pub mod request;
pub mod response;

pub use metadata::*;
pub use request::*;
pub use response::*;

/// Structure tags of requests and responses.
///
/// The same tag never means two messages within one protocol version.
pub mod tag {
    // requests
    /// HELLO
    pub const HELLO: u8 = 0x01;
    /// GOODBYE
    pub const GOODBYE: u8 = 0x02;
    /// RESET
    pub const RESET: u8 = 0x0F;
    /// RUN
    pub const RUN: u8 = 0x10;
    /// BEGIN
    pub const BEGIN: u8 = 0x11;
    /// COMMIT
    pub const COMMIT: u8 = 0x12;
    /// ROLLBACK
    pub const ROLLBACK: u8 = 0x13;
    /// DISCARD
    pub const DISCARD: u8 = 0x2F;
    /// PULL
    pub const PULL: u8 = 0x3F;
    /// ROUTE (Bolt 4.3+)
    pub const ROUTE: u8 = 0x66;
    /// LOGON (Bolt 5.1+)
    pub const LOGON: u8 = 0x6A;
    /// LOGOFF (Bolt 5.1+)
    pub const LOGOFF: u8 = 0x6B;
    /// TELEMETRY (Bolt 5.4+)
    pub const TELEMETRY: u8 = 0x54;

    // responses
    /// SUCCESS
    pub const SUCCESS: u8 = 0x70;
    /// RECORD
    pub const RECORD: u8 = 0x71;
    /// IGNORED
    pub const IGNORED: u8 = 0x7E;
    /// FAILURE
    pub const FAILURE: u8 = 0x7F;
}
