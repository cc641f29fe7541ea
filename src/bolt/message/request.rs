//! Bolt protocol request messages.
//!
//! Requests are built by the caller and encoded for one negotiated
//! protocol version; the client never decodes them.

use std::collections::HashMap;
use std::time::Duration;

use super::tag;
use crate::bolt::error::{BoltError, BoltResult};
use crate::bolt::handshake::BoltVersion;
use crate::bolt::packstream::{Metadata, PackStreamStructure, PackStreamValue};

/// Access mode for transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Read-write access (default)
    #[default]
    Write,
    /// Read-only access
    Read,
}

impl AccessMode {
    /// Convert to string for metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Read => "r",
            AccessMode::Write => "w",
        }
    }
}

/// Every request message kind; keys the message catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// HELLO
    Hello,
    /// GOODBYE
    Goodbye,
    /// RESET
    Reset,
    /// RUN
    Run,
    /// BEGIN
    Begin,
    /// COMMIT
    Commit,
    /// ROLLBACK
    Rollback,
    /// DISCARD
    Discard,
    /// PULL
    Pull,
    /// ROUTE (4.3+)
    Route,
    /// LOGON (5.1+)
    Logon,
    /// LOGOFF (5.1+)
    Logoff,
    /// TELEMETRY (5.4+)
    Telemetry,
}

impl MessageType {
    /// Every request kind.
    pub const ALL: [MessageType; 13] = [
        MessageType::Hello,
        MessageType::Goodbye,
        MessageType::Reset,
        MessageType::Run,
        MessageType::Begin,
        MessageType::Commit,
        MessageType::Rollback,
        MessageType::Discard,
        MessageType::Pull,
        MessageType::Route,
        MessageType::Logon,
        MessageType::Logoff,
        MessageType::Telemetry,
    ];

    /// Structure tag on the wire.
    pub fn tag(self) -> u8 {
        match self {
            MessageType::Hello => tag::HELLO,
            MessageType::Goodbye => tag::GOODBYE,
            MessageType::Reset => tag::RESET,
            MessageType::Run => tag::RUN,
            MessageType::Begin => tag::BEGIN,
            MessageType::Commit => tag::COMMIT,
            MessageType::Rollback => tag::ROLLBACK,
            MessageType::Discard => tag::DISCARD,
            MessageType::Pull => tag::PULL,
            MessageType::Route => tag::ROUTE,
            MessageType::Logon => tag::LOGON,
            MessageType::Logoff => tag::LOGOFF,
            MessageType::Telemetry => tag::TELEMETRY,
        }
    }

    /// Name for logging.
    pub fn name(self) -> &'static str {
        match self {
            MessageType::Hello => "HELLO",
            MessageType::Goodbye => "GOODBYE",
            MessageType::Reset => "RESET",
            MessageType::Run => "RUN",
            MessageType::Begin => "BEGIN",
            MessageType::Commit => "COMMIT",
            MessageType::Rollback => "ROLLBACK",
            MessageType::Discard => "DISCARD",
            MessageType::Pull => "PULL",
            MessageType::Route => "ROUTE",
            MessageType::Logon => "LOGON",
            MessageType::Logoff => "LOGOFF",
            MessageType::Telemetry => "TELEMETRY",
        }
    }
}

/// Authentication token for HELLO or LOGON.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    /// Authentication scheme (e.g., "basic", "bearer")
    pub scheme: String,
    /// Principal (username)
    pub principal: Option<String>,
    /// Credentials (password, ticket or token)
    pub credentials: Option<String>,
    /// Realm
    pub realm: Option<String>,
    /// Additional parameters
    pub parameters: Metadata,
}

impl AuthToken {
    fn with_scheme(scheme: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            principal: None,
            credentials: None,
            realm: None,
            parameters: HashMap::new(),
        }
    }

    /// Create a basic auth token.
    pub fn basic(principal: &str, credentials: &str) -> Self {
        Self {
            principal: Some(principal.to_string()),
            credentials: Some(credentials.to_string()),
            ..Self::with_scheme("basic")
        }
    }

    /// Create a bearer (SSO) token.
    pub fn bearer(token: &str) -> Self {
        Self {
            credentials: Some(token.to_string()),
            ..Self::with_scheme("bearer")
        }
    }

    /// Create a kerberos token from a base64 ticket.
    pub fn kerberos(ticket: &str) -> Self {
        Self {
            principal: Some(String::new()),
            credentials: Some(ticket.to_string()),
            ..Self::with_scheme("kerberos")
        }
    }

    /// Create an anonymous auth token (no auth).
    pub fn none() -> Self {
        Self::with_scheme("none")
    }

    /// Add a scheme-specific parameter.
    pub fn with_parameter(mut self, key: &str, value: impl Into<PackStreamValue>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    /// Convert to PackStream map.
    pub fn to_map(&self) -> Metadata {
        let mut map = HashMap::new();
        map.insert("scheme".to_string(), PackStreamValue::String(self.scheme.clone()));
        if let Some(ref p) = self.principal {
            map.insert("principal".to_string(), PackStreamValue::String(p.clone()));
        }
        if let Some(ref c) = self.credentials {
            map.insert("credentials".to_string(), PackStreamValue::String(c.clone()));
        }
        if let Some(ref r) = self.realm {
            map.insert("realm".to_string(), PackStreamValue::String(r.clone()));
        }
        if !self.parameters.is_empty() {
            map.insert("parameters".to_string(), PackStreamValue::Map(self.parameters.clone()));
        }
        map
    }
}

/// Server-side notification filtering (Bolt 5.2+).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFilter {
    /// Lowest severity to report, or "OFF"
    pub minimum_severity: Option<String>,
    /// Categories the server should not report
    pub disabled_categories: Option<Vec<String>>,
}

impl NotificationFilter {
    fn write_into(&self, extra: &mut Metadata, version: BoltVersion) -> BoltResult<()> {
        if self.minimum_severity.is_none() && self.disabled_categories.is_none() {
            return Ok(());
        }
        if version < BoltVersion::V5_2 {
            return Err(BoltError::UnsupportedByProtocolVersion {
                message: "notification filters",
                version,
            });
        }
        if let Some(ref severity) = self.minimum_severity {
            extra.insert(
                "notifications_minimum_severity".to_string(),
                PackStreamValue::String(severity.clone()),
            );
        }
        if let Some(ref categories) = self.disabled_categories {
            extra.insert(
                "notifications_disabled_categories".to_string(),
                PackStreamValue::string_list(categories.iter().cloned()),
            );
        }
        Ok(())
    }
}

/// All Bolt request messages.
#[derive(Debug, Clone)]
pub enum BoltRequest {
    /// HELLO - Initialize connection
    Hello(HelloMessage),
    /// GOODBYE - Close connection gracefully
    Goodbye,
    /// RESET - Reset connection state
    Reset,
    /// RUN - Execute a query
    Run(RunMessage),
    /// PULL - Pull results
    Pull(PullMessage),
    /// DISCARD - Discard results
    Discard(DiscardMessage),
    /// BEGIN - Start transaction
    Begin(BeginMessage),
    /// COMMIT - Commit transaction
    Commit,
    /// ROLLBACK - Rollback transaction
    Rollback,
    /// ROUTE - Request routing information (Bolt 4.3+)
    Route(RouteMessage),
    /// LOGON - Authenticate (Bolt 5.1+)
    Logon(LogonMessage),
    /// LOGOFF - Deauthenticate (Bolt 5.1+)
    Logoff,
    /// TELEMETRY - Report API usage (Bolt 5.4+)
    Telemetry(TelemetryMessage),
}

impl BoltRequest {
    /// Message kind.
    pub fn message_type(&self) -> MessageType {
        match self {
            BoltRequest::Hello(_) => MessageType::Hello,
            BoltRequest::Goodbye => MessageType::Goodbye,
            BoltRequest::Reset => MessageType::Reset,
            BoltRequest::Run(_) => MessageType::Run,
            BoltRequest::Pull(_) => MessageType::Pull,
            BoltRequest::Discard(_) => MessageType::Discard,
            BoltRequest::Begin(_) => MessageType::Begin,
            BoltRequest::Commit => MessageType::Commit,
            BoltRequest::Rollback => MessageType::Rollback,
            BoltRequest::Route(_) => MessageType::Route,
            BoltRequest::Logon(_) => MessageType::Logon,
            BoltRequest::Logoff => MessageType::Logoff,
            BoltRequest::Telemetry(_) => MessageType::Telemetry,
        }
    }

    /// Get the message tag.
    pub fn tag(&self) -> u8 {
        self.message_type().tag()
    }

    /// Get message name for logging.
    pub fn name(&self) -> &'static str {
        self.message_type().name()
    }
}

fn bookmark_list(bookmarks: &[String]) -> PackStreamValue {
    PackStreamValue::string_list(bookmarks.iter().cloned())
}

fn require_impersonation(imp_user: &Option<String>, version: BoltVersion) -> BoltResult<()> {
    if imp_user.is_some() && version < BoltVersion::V4_4 {
        return Err(BoltError::UnsupportedByProtocolVersion {
            message: "impersonation",
            version,
        });
    }
    Ok(())
}

/// HELLO message - Initialize connection.
#[derive(Debug, Clone)]
pub struct HelloMessage {
    /// User agent string
    pub user_agent: String,
    /// Authentication token; sent in HELLO only before Bolt 5.1
    pub auth: Option<AuthToken>,
    /// Routing context; `None` for direct connections
    pub routing: Option<Metadata>,
    /// Protocol patches requested from a 4.x server
    pub patch_bolt: Vec<String>,
    /// Driver identification for the `bolt_agent` map (Bolt 5.3+)
    pub bolt_agent: Option<BoltAgent>,
    /// Notification filtering
    pub notifications: NotificationFilter,
}

/// Structured driver identification sent from Bolt 5.3.
#[derive(Debug, Clone, PartialEq)]
pub struct BoltAgent {
    /// Product name and version
    pub product: String,
    /// Platform description
    pub platform: Option<String>,
    /// Language and version
    pub language: Option<String>,
}

impl HelloMessage {
    /// Create a new HELLO message.
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            auth: None,
            routing: None,
            patch_bolt: Vec::new(),
            bolt_agent: None,
            notifications: NotificationFilter::default(),
        }
    }

    /// Set authentication.
    pub fn with_auth(mut self, auth: AuthToken) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set routing context.
    pub fn with_routing(mut self, routing: Metadata) -> Self {
        self.routing = Some(routing);
        self
    }

    /// Set the bolt agent.
    pub fn with_bolt_agent(mut self, agent: BoltAgent) -> Self {
        self.bolt_agent = Some(agent);
        self
    }

    /// Request a protocol patch (e.g. "utc").
    pub fn with_patch(mut self, patch: &str) -> Self {
        if !self.patch_bolt.iter().any(|p| p == patch) {
            self.patch_bolt.push(patch.to_string());
        }
        self
    }

    /// Set notification filtering.
    pub fn with_notifications(mut self, notifications: NotificationFilter) -> Self {
        self.notifications = notifications;
        self
    }

    /// Encode for `version`.
    ///
    /// From 5.1 credentials travel in LOGON, so `auth` is left out.
    pub fn to_structure(&self, version: BoltVersion) -> BoltResult<PackStreamStructure> {
        let mut extra = HashMap::new();
        extra.insert(
            "user_agent".to_string(),
            PackStreamValue::String(self.user_agent.clone()),
        );
        if !version.supports_logon() {
            if let Some(ref auth) = self.auth {
                extra.extend(auth.to_map());
            }
        }
        if let Some(ref routing) = self.routing {
            extra.insert("routing".to_string(), PackStreamValue::Map(routing.clone()));
        }
        if !self.patch_bolt.is_empty() && version.major() == 4 {
            extra.insert(
                "patch_bolt".to_string(),
                PackStreamValue::string_list(self.patch_bolt.iter().cloned()),
            );
        }
        if let (Some(agent), true) = (&self.bolt_agent, version.supports_bolt_agent()) {
            let mut map = HashMap::new();
            map.insert("product".to_string(), PackStreamValue::String(agent.product.clone()));
            if let Some(ref platform) = agent.platform {
                map.insert("platform".to_string(), PackStreamValue::String(platform.clone()));
            }
            if let Some(ref language) = agent.language {
                map.insert("language".to_string(), PackStreamValue::String(language.clone()));
            }
            extra.insert("bolt_agent".to_string(), PackStreamValue::Map(map));
        }
        self.notifications.write_into(&mut extra, version)?;

        Ok(PackStreamStructure::new(tag::HELLO, vec![PackStreamValue::Map(extra)]))
    }
}

/// RUN message - Execute a query.
#[derive(Debug, Clone)]
pub struct RunMessage {
    /// Query string
    pub query: String,
    /// Query parameters
    pub parameters: Metadata,
    /// Transaction settings for auto-commit queries
    pub config: TransactionConfig,
}

impl RunMessage {
    /// Create a new RUN message.
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            parameters: HashMap::new(),
            config: TransactionConfig::default(),
        }
    }

    /// Set query parameters.
    pub fn with_parameters(mut self, params: Metadata) -> Self {
        self.parameters = params;
        self
    }

    /// Set the auto-commit transaction settings.
    pub fn with_config(mut self, config: TransactionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set database name.
    pub fn with_database(mut self, db: &str) -> Self {
        self.config.database = Some(db.to_string());
        self
    }

    /// Set bookmark(s).
    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        self.config.bookmarks = bookmarks;
        self
    }

    /// Encode for `version`.
    pub fn to_structure(&self, version: BoltVersion) -> BoltResult<PackStreamStructure> {
        Ok(PackStreamStructure::new(
            tag::RUN,
            vec![
                PackStreamValue::String(self.query.clone()),
                PackStreamValue::Map(self.parameters.clone()),
                PackStreamValue::Map(self.config.to_extra(version)?),
            ],
        ))
    }
}

/// Settings shared by BEGIN and auto-commit RUN.
#[derive(Debug, Clone, Default)]
pub struct TransactionConfig {
    /// Bookmarks to wait for
    pub bookmarks: Vec<String>,
    /// Transaction timeout
    pub tx_timeout: Option<Duration>,
    /// Access mode (read/write)
    pub mode: AccessMode,
    /// Database name
    pub database: Option<String>,
    /// Impersonated user (Bolt 4.4+)
    pub imp_user: Option<String>,
    /// Transaction metadata
    pub tx_metadata: Metadata,
    /// Notification filtering
    pub notifications: NotificationFilter,
}

impl TransactionConfig {
    /// The `extra` map for `version`. Defaults are left out.
    pub fn to_extra(&self, version: BoltVersion) -> BoltResult<Metadata> {
        require_impersonation(&self.imp_user, version)?;
        let mut extra = HashMap::new();

        if !self.bookmarks.is_empty() {
            extra.insert("bookmarks".to_string(), bookmark_list(&self.bookmarks));
        }
        if let Some(timeout) = self.tx_timeout {
            // Sub-millisecond timeouts round up so they never read as "no timeout".
            let mut millis = timeout.as_millis();
            if millis == 0 && !timeout.is_zero() {
                millis = 1;
            }
            extra.insert(
                "tx_timeout".to_string(),
                PackStreamValue::Integer(i64::try_from(millis).unwrap_or(i64::MAX)),
            );
        }
        if self.mode == AccessMode::Read {
            extra.insert("mode".to_string(), PackStreamValue::String("r".to_string()));
        }
        if let Some(ref db) = self.database {
            extra.insert("db".to_string(), PackStreamValue::String(db.clone()));
        }
        if let Some(ref user) = self.imp_user {
            extra.insert("imp_user".to_string(), PackStreamValue::String(user.clone()));
        }
        if !self.tx_metadata.is_empty() {
            extra.insert(
                "tx_metadata".to_string(),
                PackStreamValue::Map(self.tx_metadata.clone()),
            );
        }
        self.notifications.write_into(&mut extra, version)?;
        Ok(extra)
    }
}

/// PULL or DISCARD window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamWindow {
    /// Number of records (-1 for all)
    pub n: i64,
    /// Query ID; -1 means the last query
    pub qid: i64,
}

impl StreamWindow {
    fn to_field(self) -> PackStreamValue {
        let mut extra = HashMap::new();
        extra.insert("n".to_string(), PackStreamValue::Integer(self.n));
        if self.qid != -1 {
            extra.insert("qid".to_string(), PackStreamValue::Integer(self.qid));
        }
        PackStreamValue::Map(extra)
    }
}

/// PULL message - Pull query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullMessage(pub StreamWindow);

impl PullMessage {
    /// Pull everything from the last query.
    pub fn all() -> Self {
        Self::with_n(-1)
    }

    /// Pull `n` records.
    pub fn with_n(n: i64) -> Self {
        Self(StreamWindow { n, qid: -1 })
    }

    /// Set query ID.
    pub fn with_qid(mut self, qid: i64) -> Self {
        self.0.qid = qid;
        self
    }

    /// Encode. The layout is the same in every version.
    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(tag::PULL, vec![self.0.to_field()])
    }
}

/// DISCARD message - Discard query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscardMessage(pub StreamWindow);

impl DiscardMessage {
    /// Discard everything from the last query.
    pub fn all() -> Self {
        Self::with_n(-1)
    }

    /// Discard `n` records.
    pub fn with_n(n: i64) -> Self {
        Self(StreamWindow { n, qid: -1 })
    }

    /// Set query ID.
    pub fn with_qid(mut self, qid: i64) -> Self {
        self.0.qid = qid;
        self
    }

    /// Encode. The layout is the same in every version.
    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(tag::DISCARD, vec![self.0.to_field()])
    }
}

/// BEGIN message - Start a transaction.
#[derive(Debug, Clone, Default)]
pub struct BeginMessage {
    /// Transaction settings
    pub config: TransactionConfig,
}

impl BeginMessage {
    /// Create a new BEGIN message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bookmarks.
    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        self.config.bookmarks = bookmarks;
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.tx_timeout = Some(timeout);
        self
    }

    /// Set access mode.
    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set database.
    pub fn with_database(mut self, db: &str) -> Self {
        self.config.database = Some(db.to_string());
        self
    }

    /// Set impersonated user.
    pub fn with_imp_user(mut self, user: &str) -> Self {
        self.config.imp_user = Some(user.to_string());
        self
    }

    /// Encode for `version`.
    pub fn to_structure(&self, version: BoltVersion) -> BoltResult<PackStreamStructure> {
        Ok(PackStreamStructure::new(
            tag::BEGIN,
            vec![PackStreamValue::Map(self.config.to_extra(version)?)],
        ))
    }
}

/// ROUTE message - Get routing information (Bolt 4.3+).
#[derive(Debug, Clone, Default)]
pub struct RouteMessage {
    /// Routing context
    pub routing: Metadata,
    /// Bookmarks
    pub bookmarks: Vec<String>,
    /// Database name; `None` asks for the home database
    pub database: Option<String>,
    /// Impersonated user (Bolt 4.4+)
    pub imp_user: Option<String>,
}

impl RouteMessage {
    /// Create a new ROUTE message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set routing context.
    pub fn with_routing(mut self, routing: Metadata) -> Self {
        self.routing = routing;
        self
    }

    /// Set bookmarks.
    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    /// Set database.
    pub fn with_database(mut self, db: &str) -> Self {
        self.database = Some(db.to_string());
        self
    }

    /// Set impersonated user.
    pub fn with_imp_user(mut self, user: &str) -> Self {
        self.imp_user = Some(user.to_string());
        self
    }

    /// Encode for `version`.
    ///
    /// Bolt 4.3 sends the database name (or null) as the third field;
    /// later versions send a `{db, imp_user}` map.
    pub fn to_structure(&self, version: BoltVersion) -> BoltResult<PackStreamStructure> {
        if !version.supports_route() {
            return Err(BoltError::UnsupportedByProtocolVersion {
                message: "ROUTE",
                version,
            });
        }
        require_impersonation(&self.imp_user, version)?;

        let third = if version.route_uses_db_context() {
            let mut context = HashMap::new();
            if let Some(ref db) = self.database {
                context.insert("db".to_string(), PackStreamValue::String(db.clone()));
            }
            if let Some(ref user) = self.imp_user {
                context.insert("imp_user".to_string(), PackStreamValue::String(user.clone()));
            }
            PackStreamValue::Map(context)
        } else {
            PackStreamValue::from(self.database.clone())
        };

        Ok(PackStreamStructure::new(
            tag::ROUTE,
            vec![
                PackStreamValue::Map(self.routing.clone()),
                bookmark_list(&self.bookmarks),
                third,
            ],
        ))
    }
}

/// LOGON message - Authenticate (Bolt 5.1+).
#[derive(Debug, Clone)]
pub struct LogonMessage {
    /// Authentication token
    pub auth: AuthToken,
}

impl LogonMessage {
    /// Create a new LOGON message.
    pub fn new(auth: AuthToken) -> Self {
        Self { auth }
    }

    /// Encode.
    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(tag::LOGON, vec![PackStreamValue::Map(self.auth.to_map())])
    }
}

/// API kind reported by TELEMETRY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum TelemetryApi {
    /// Transaction functions
    ManagedTransaction = 0,
    /// Explicit transactions
    UnmanagedTransaction = 1,
    /// Auto-commit queries
    AutoCommit = 2,
    /// Driver-level query execution
    DriverLevel = 3,
}

/// TELEMETRY message (Bolt 5.4+).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryMessage {
    /// API used by the caller
    pub api: TelemetryApi,
}

impl TelemetryMessage {
    /// Encode.
    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(tag::TELEMETRY, vec![PackStreamValue::Integer(self.api as i64)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extra_of(s: &PackStreamStructure, i: usize) -> &Metadata {
        s.fields[i].as_map().unwrap()
    }

    #[test]
    fn test_hello_carries_auth_before_logon_exists() {
        let msg = HelloMessage::new("zeta4g-wire/0.1").with_auth(AuthToken::basic("zeta4g", "password"));

        let legacy = msg.to_structure(BoltVersion::V5_0).unwrap();
        assert_eq!(legacy.tag, tag::HELLO);
        let extra = extra_of(&legacy, 0);
        assert_eq!(extra.get("scheme").and_then(|v| v.as_str()), Some("basic"));
        assert_eq!(extra.get("principal").and_then(|v| v.as_str()), Some("zeta4g"));

        let modern = msg.to_structure(BoltVersion::V5_1).unwrap();
        let extra = extra_of(&modern, 0);
        assert!(!extra.contains_key("scheme"));
        assert!(!extra.contains_key("credentials"));
        assert_eq!(extra.get("user_agent").and_then(|v| v.as_str()), Some("zeta4g-wire/0.1"));
    }

    #[test]
    fn test_hello_patch_only_on_4x() {
        let msg = HelloMessage::new("ua").with_patch("utc").with_patch("utc");
        let s = msg.to_structure(BoltVersion::V4_4).unwrap();
        assert_eq!(
            extra_of(&s, 0).get("patch_bolt").and_then(|v| v.as_string_list()),
            Some(vec!["utc".to_string()])
        );
        let s = msg.to_structure(BoltVersion::V5_0).unwrap();
        assert!(!extra_of(&s, 0).contains_key("patch_bolt"));
    }

    #[test]
    fn test_hello_bolt_agent_from_5_3() {
        let msg = HelloMessage::new("ua").with_bolt_agent(BoltAgent {
            product: "zeta4g-wire/0.1".into(),
            platform: None,
            language: Some("Rust".into()),
        });
        let s = msg.to_structure(BoltVersion::V5_2).unwrap();
        assert!(!extra_of(&s, 0).contains_key("bolt_agent"));
        let s = msg.to_structure(BoltVersion::V5_3).unwrap();
        let agent = extra_of(&s, 0).get("bolt_agent").and_then(|v| v.as_map()).unwrap();
        assert_eq!(agent.get("language").and_then(|v| v.as_str()), Some("Rust"));
        assert!(!agent.contains_key("platform"));
    }

    #[test]
    fn test_notification_filter_needs_5_2() {
        let msg = HelloMessage::new("ua").with_notifications(NotificationFilter {
            minimum_severity: Some("WARNING".into()),
            disabled_categories: None,
        });
        assert!(matches!(
            msg.to_structure(BoltVersion::V5_1),
            Err(BoltError::UnsupportedByProtocolVersion { .. })
        ));
        let s = msg.to_structure(BoltVersion::V5_2).unwrap();
        assert!(extra_of(&s, 0).contains_key("notifications_minimum_severity"));
    }

    #[test]
    fn test_run_message() {
        let mut params = HashMap::new();
        params.insert("name".to_string(), PackStreamValue::String("Alice".to_string()));

        let msg = RunMessage::new("MATCH (n:Person {name: $name}) RETURN n")
            .with_parameters(params)
            .with_database("movies")
            .with_bookmarks(vec!["bm:1".into()]);

        let s = msg.to_structure(BoltVersion::V4_4).unwrap();
        assert_eq!(s.tag, tag::RUN);
        assert_eq!(s.len(), 3);
        assert_eq!(s.fields[0].as_str(), Some("MATCH (n:Person {name: $name}) RETURN n"));
        assert!(extra_of(&s, 1).contains_key("name"));
        let extra = extra_of(&s, 2);
        assert_eq!(extra.get("db").and_then(|v| v.as_str()), Some("movies"));
        assert_eq!(
            extra.get("bookmarks").and_then(|v| v.as_string_list()),
            Some(vec!["bm:1".to_string()])
        );
        assert!(!extra.contains_key("mode"));
    }

    #[test]
    fn test_pull_and_discard() {
        let s = PullMessage::all().to_structure();
        assert_eq!(s.tag, tag::PULL);
        let extra = extra_of(&s, 0);
        assert_eq!(extra.get("n").and_then(|v| v.as_int()), Some(-1));
        assert!(!extra.contains_key("qid"));

        let s = DiscardMessage::with_n(100).with_qid(7).to_structure();
        assert_eq!(s.tag, tag::DISCARD);
        assert_eq!(extra_of(&s, 0).get("qid").and_then(|v| v.as_int()), Some(7));
    }

    #[test]
    fn test_begin_message() {
        let msg = BeginMessage::new()
            .with_database("zeta4g")
            .with_mode(AccessMode::Read)
            .with_timeout(Duration::from_micros(10));

        let s = msg.to_structure(BoltVersion::V4_0).unwrap();
        assert_eq!(s.tag, tag::BEGIN);
        let extra = extra_of(&s, 0);
        assert_eq!(extra.get("mode").and_then(|v| v.as_str()), Some("r"));
        assert_eq!(extra.get("tx_timeout").and_then(|v| v.as_int()), Some(1));
    }

    #[test]
    fn test_impersonation_needs_4_4() {
        let msg = BeginMessage::new().with_imp_user("bob");
        assert!(msg.to_structure(BoltVersion::V4_3).is_err());
        let s = msg.to_structure(BoltVersion::V4_4).unwrap();
        assert_eq!(extra_of(&s, 0).get("imp_user").and_then(|v| v.as_str()), Some("bob"));
    }

    #[test]
    fn test_route_third_field_per_version() {
        let msg = RouteMessage::new().with_database("zeta4g");

        let v43 = msg.to_structure(BoltVersion::V4_3).unwrap();
        assert_eq!(v43.tag, tag::ROUTE);
        assert_eq!(v43.len(), 3);
        assert_eq!(v43.fields[2].as_str(), Some("zeta4g"));

        let v44 = msg.to_structure(BoltVersion::V4_4).unwrap();
        assert_eq!(v44.len(), 3);
        assert_eq!(extra_of(&v44, 2).get("db").and_then(|v| v.as_str()), Some("zeta4g"));

        let home = RouteMessage::new().to_structure(BoltVersion::V4_3).unwrap();
        assert_eq!(home.fields[2], PackStreamValue::Null);

        assert!(matches!(
            msg.to_structure(BoltVersion::V4_2),
            Err(BoltError::UnsupportedByProtocolVersion { message: "ROUTE", .. })
        ));
    }

    #[test]
    fn test_logon_and_telemetry() {
        let s = LogonMessage::new(AuthToken::bearer("tok")).to_structure();
        assert_eq!(s.tag, tag::LOGON);
        assert_eq!(extra_of(&s, 0).get("credentials").and_then(|v| v.as_str()), Some("tok"));

        let s = TelemetryMessage { api: TelemetryApi::AutoCommit }.to_structure();
        assert_eq!(s.tag, tag::TELEMETRY);
        assert_eq!(s.fields, vec![PackStreamValue::Integer(2)]);
    }

    #[test]
    fn test_request_names_and_tags() {
        assert_eq!(BoltRequest::Goodbye.tag(), tag::GOODBYE);
        assert_eq!(BoltRequest::Logoff.name(), "LOGOFF");
        assert_eq!(BoltRequest::Run(RunMessage::new("")).name(), "RUN");
        assert_eq!(MessageType::Telemetry.tag(), 0x54);
    }

    #[test]
    fn test_auth_token_parameters_nested() {
        let map = AuthToken::none().with_parameter("realm_hint", "x").to_map();
        assert_eq!(map.get("scheme").and_then(|v| v.as_str()), Some("none"));
        assert!(map.get("parameters").and_then(|v| v.as_map()).is_some());
    }
}
