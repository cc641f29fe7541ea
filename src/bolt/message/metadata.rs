//! Typed views of SUCCESS metadata entries.
//!
//! Parsing is strict: an absent optional entry takes its default, but an
//! entry of the wrong type is a protocol error.

use crate::bolt::error::{BoltError, BoltResult};
use crate::bolt::packstream::{Metadata, PackStreamValue};

fn int_or_zero(map: &Metadata, key: &str) -> BoltResult<i64> {
    match map.get(key) {
        None => Ok(0),
        Some(v) => v
            .as_int()
            .ok_or_else(|| BoltError::protocol(format!("'{}' must be an integer, got {}", key, v.type_name()))),
    }
}

fn bool_or_false(map: &Metadata, key: &str) -> BoltResult<bool> {
    match map.get(key) {
        None => Ok(false),
        Some(v) => v
            .as_bool()
            .ok_or_else(|| BoltError::protocol(format!("'{}' must be a boolean, got {}", key, v.type_name()))),
    }
}

fn optional_str(map: &Metadata, key: &str) -> BoltResult<Option<String>> {
    match map.get(key) {
        None | Some(PackStreamValue::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| BoltError::protocol(format!("'{}' must be a string, got {}", key, v.type_name()))),
    }
}

/// Update counters returned in SUCCESS after PULL or DISCARD.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Nodes created
    pub nodes_created: i64,
    /// Nodes deleted
    pub nodes_deleted: i64,
    /// Relationships created
    pub relationships_created: i64,
    /// Relationships deleted
    pub relationships_deleted: i64,
    /// Properties set
    pub properties_set: i64,
    /// Labels added
    pub labels_added: i64,
    /// Labels removed
    pub labels_removed: i64,
    /// Indexes added
    pub indexes_added: i64,
    /// Indexes removed
    pub indexes_removed: i64,
    /// Constraints added
    pub constraints_added: i64,
    /// Constraints removed
    pub constraints_removed: i64,
    /// System updates
    pub system_updates: i64,
    /// Server-reported `contains-updates`, if sent
    pub contains_updates: bool,
    /// Server-reported `contains-system-updates`, if sent
    pub contains_system_updates: bool,
}

impl QueryStats {
    /// Whether the query changed any data.
    pub fn has_updates(&self) -> bool {
        self.contains_updates
            || [
                self.nodes_created,
                self.nodes_deleted,
                self.relationships_created,
                self.relationships_deleted,
                self.properties_set,
                self.labels_added,
                self.labels_removed,
                self.indexes_added,
                self.indexes_removed,
                self.constraints_added,
                self.constraints_removed,
            ]
            .iter()
            .any(|&n| n > 0)
    }

    /// Whether the query changed system data.
    pub fn has_system_updates(&self) -> bool {
        self.contains_system_updates || self.system_updates > 0
    }

    /// Parse the `stats` map.
    pub fn from_map(map: &Metadata) -> BoltResult<Self> {
        Ok(Self {
            nodes_created: int_or_zero(map, "nodes-created")?,
            nodes_deleted: int_or_zero(map, "nodes-deleted")?,
            relationships_created: int_or_zero(map, "relationships-created")?,
            relationships_deleted: int_or_zero(map, "relationships-deleted")?,
            properties_set: int_or_zero(map, "properties-set")?,
            labels_added: int_or_zero(map, "labels-added")?,
            labels_removed: int_or_zero(map, "labels-removed")?,
            indexes_added: int_or_zero(map, "indexes-added")?,
            indexes_removed: int_or_zero(map, "indexes-removed")?,
            constraints_added: int_or_zero(map, "constraints-added")?,
            constraints_removed: int_or_zero(map, "constraints-removed")?,
            system_updates: int_or_zero(map, "system-updates")?,
            contains_updates: bool_or_false(map, "contains-updates")?,
            contains_system_updates: bool_or_false(map, "contains-system-updates")?,
        })
    }
}

/// Profiling numbers attached to a plan operator under PROFILE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    /// Database hits
    pub db_hits: i64,
    /// Rows produced
    pub rows: i64,
    /// Page cache hits
    pub page_cache_hits: i64,
    /// Page cache misses
    pub page_cache_misses: i64,
    /// Time spent, in nanoseconds
    pub time: i64,
}

/// Execution plan returned under EXPLAIN (`plan`) or PROFILE (`profile`).
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Operator type
    pub operator_type: String,
    /// Arguments
    pub args: Metadata,
    /// Identifiers
    pub identifiers: Vec<String>,
    /// Child plans
    pub children: Vec<QueryPlan>,
    /// Present for profiled plans
    pub profile: Option<ProfileStats>,
}

impl QueryPlan {
    /// Parse one plan node and its children.
    pub fn from_map(map: &Metadata) -> BoltResult<Self> {
        let operator_type = optional_str(map, "operatorType")?
            .ok_or_else(|| BoltError::protocol("plan requires 'operatorType'"))?;

        let args = match map.get("args") {
            None => Metadata::new(),
            Some(v) => v
                .as_map()
                .cloned()
                .ok_or_else(|| BoltError::protocol("plan 'args' must be a map"))?,
        };

        let identifiers = match map.get("identifiers") {
            None => Vec::new(),
            Some(v) => v
                .as_string_list()
                .ok_or_else(|| BoltError::protocol("plan 'identifiers' must be a list of strings"))?,
        };

        let children = match map.get("children") {
            None => Vec::new(),
            Some(v) => v
                .as_list()
                .ok_or_else(|| BoltError::protocol("plan 'children' must be a list"))?
                .iter()
                .map(|child| {
                    child
                        .as_map()
                        .ok_or_else(|| BoltError::protocol("plan child must be a map"))
                        .and_then(QueryPlan::from_map)
                })
                .collect::<BoltResult<_>>()?,
        };

        let profile = if map.contains_key("dbHits") || map.contains_key("rows") {
            Some(ProfileStats {
                db_hits: int_or_zero(map, "dbHits")?,
                rows: int_or_zero(map, "rows")?,
                page_cache_hits: int_or_zero(map, "pageCacheHits")?,
                page_cache_misses: int_or_zero(map, "pageCacheMisses")?,
                time: int_or_zero(map, "time")?,
            })
        } else {
            None
        };

        Ok(Self {
            operator_type,
            args,
            identifiers,
            children,
            profile,
        })
    }
}

/// Notification severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationSeverity {
    /// Warning
    Warning,
    /// Information
    Information,
    /// A level this crate does not know
    Other(String),
}

impl NotificationSeverity {
    /// Parse from string.
    pub fn parse(s: &str) -> Self {
        match s {
            "WARNING" => NotificationSeverity::Warning,
            "INFORMATION" => NotificationSeverity::Information,
            other => NotificationSeverity::Other(other.to_string()),
        }
    }
}

/// Position in query for notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPosition {
    /// Line number (1-based)
    pub line: i64,
    /// Column number (1-based)
    pub column: i64,
    /// Offset from start
    pub offset: i64,
}

/// Notification returned in SUCCESS metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Notification code
    pub code: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Severity
    pub severity: NotificationSeverity,
    /// Category (Bolt 5.2+)
    pub category: Option<String>,
    /// Position in query
    pub position: Option<NotificationPosition>,
}

impl Notification {
    /// Parse one entry of the `notifications` list.
    pub fn from_map(map: &Metadata) -> BoltResult<Self> {
        let code = optional_str(map, "code")?
            .ok_or_else(|| BoltError::protocol("notification requires 'code'"))?;
        let severity = optional_str(map, "severity")?
            .map(|s| NotificationSeverity::parse(&s))
            .unwrap_or(NotificationSeverity::Information);

        let position = match map.get("position") {
            None | Some(PackStreamValue::Null) => None,
            Some(v) => {
                let pos = v
                    .as_map()
                    .ok_or_else(|| BoltError::protocol("notification 'position' must be a map"))?;
                Some(NotificationPosition {
                    line: int_or_zero(pos, "line")?,
                    column: int_or_zero(pos, "column")?,
                    offset: int_or_zero(pos, "offset")?,
                })
            }
        };

        Ok(Self {
            code,
            title: optional_str(map, "title")?.unwrap_or_default(),
            description: optional_str(map, "description")?.unwrap_or_default(),
            severity,
            category: optional_str(map, "category")?,
            position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, PackStreamValue)>) -> Metadata {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_stats_defaults_and_updates() {
        let stats = QueryStats::from_map(&map(vec![("nodes-created", 2.into())])).unwrap();
        assert_eq!(stats.nodes_created, 2);
        assert_eq!(stats.labels_added, 0);
        assert!(stats.has_updates());
        assert!(!stats.has_system_updates());

        let empty = QueryStats::from_map(&Metadata::new()).unwrap();
        assert!(!empty.has_updates());
    }

    #[test]
    fn test_stats_wrong_type_is_error() {
        let result = QueryStats::from_map(&map(vec![("nodes-created", "two".into())]));
        assert!(matches!(result, Err(BoltError::Protocol(_))));
    }

    #[test]
    fn test_plan_with_children_and_profile() {
        let child = map(vec![
            ("operatorType", "AllNodesScan".into()),
            ("identifiers", PackStreamValue::string_list(["n"])),
            ("dbHits", 10.into()),
            ("rows", 5.into()),
        ]);
        let root = map(vec![
            ("operatorType", "ProduceResults".into()),
            ("children", PackStreamValue::List(vec![PackStreamValue::Map(child)])),
        ]);

        let plan = QueryPlan::from_map(&root).unwrap();
        assert_eq!(plan.operator_type, "ProduceResults");
        assert!(plan.profile.is_none());
        assert_eq!(plan.children.len(), 1);
        let child = &plan.children[0];
        assert_eq!(child.identifiers, vec!["n".to_string()]);
        assert_eq!(child.profile.map(|p| p.db_hits), Some(10));
    }

    #[test]
    fn test_plan_requires_operator() {
        assert!(QueryPlan::from_map(&Metadata::new()).is_err());
    }

    #[test]
    fn test_notification() {
        let position = map(vec![("line", 1.into()), ("column", 8.into()), ("offset", 7.into())]);
        let n = Notification::from_map(&map(vec![
            ("code", "Neo.ClientNotification.Statement.CartesianProduct".into()),
            ("title", "Cartesian product".into()),
            ("severity", "WARNING".into()),
            ("category", "PERFORMANCE".into()),
            ("position", PackStreamValue::Map(position)),
        ]))
        .unwrap();
        assert_eq!(n.severity, NotificationSeverity::Warning);
        assert_eq!(n.category.as_deref(), Some("PERFORMANCE"));
        assert_eq!(n.position.map(|p| p.column), Some(8));
        assert_eq!(n.description, "");
    }

    #[test]
    fn test_unknown_severity_is_kept() {
        let n = Notification::from_map(&map(vec![("code", "x".into()), ("severity", "FATAL".into())])).unwrap();
        assert_eq!(n.severity, NotificationSeverity::Other("FATAL".into()));
    }
}
