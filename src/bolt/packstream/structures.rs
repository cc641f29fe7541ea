//! Graph, temporal and spatial values carried as PackStream structures.
//!
//! Field layouts follow the negotiated protocol version: from Bolt 5.0
//! nodes and relationships carry string element ids next to the legacy
//! integer ids, and date-times count seconds in UTC.

use super::marker::*;
use super::types::{Metadata, PackStreamStructure, PackStreamValue};
use super::PackStreamError;
use crate::bolt::handshake::BoltVersion;

/// Positional reader over a structure's fields.
struct Fields<'s> {
    s: &'s PackStreamStructure,
    what: &'static str,
}

impl<'s> Fields<'s> {
    fn open(value: &'s PackStreamValue, tag: u8, what: &'static str) -> Result<Self, PackStreamError> {
        let s = value
            .as_structure()
            .ok_or_else(|| PackStreamError::InvalidStructure(format!("expected {} structure", what)))?;
        Self::of(s, &[tag], what)
    }

    fn of(s: &'s PackStreamStructure, tags: &[u8], what: &'static str) -> Result<Self, PackStreamError> {
        if !tags.contains(&s.tag) {
            return Err(PackStreamError::InvalidStructure(format!(
                "expected {} tag, got 0x{:02X}",
                what, s.tag
            )));
        }
        Ok(Self { s, what })
    }

    fn expect_len(&self, n: usize) -> Result<(), PackStreamError> {
        if self.s.fields.len() != n {
            return Err(PackStreamError::InvalidStructure(format!(
                "{} has {} fields, expected {}",
                self.what,
                self.s.fields.len(),
                n
            )));
        }
        Ok(())
    }

    fn get(&self, i: usize) -> Result<&'s PackStreamValue, PackStreamError> {
        self.s.fields.get(i).ok_or_else(|| {
            PackStreamError::InvalidStructure(format!("{} is missing field {}", self.what, i))
        })
    }

    fn wrong(&self, i: usize, expected: &str) -> PackStreamError {
        PackStreamError::InvalidStructure(format!("{} field {} must be {}", self.what, i, expected))
    }

    fn int(&self, i: usize) -> Result<i64, PackStreamError> {
        self.get(i)?.as_int().ok_or_else(|| self.wrong(i, "an integer"))
    }

    fn float(&self, i: usize) -> Result<f64, PackStreamError> {
        self.get(i)?.as_float().ok_or_else(|| self.wrong(i, "a float"))
    }

    fn string(&self, i: usize) -> Result<String, PackStreamError> {
        self.get(i)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.wrong(i, "a string"))
    }

    fn strings(&self, i: usize) -> Result<Vec<String>, PackStreamError> {
        self.get(i)?
            .as_string_list()
            .ok_or_else(|| self.wrong(i, "a list of strings"))
    }

    fn map(&self, i: usize) -> Result<Metadata, PackStreamError> {
        self.get(i)?
            .as_map()
            .cloned()
            .ok_or_else(|| self.wrong(i, "a map"))
    }

    fn list(&self, i: usize) -> Result<&'s [PackStreamValue], PackStreamError> {
        self.get(i)?.as_list().ok_or_else(|| self.wrong(i, "a list"))
    }
}

fn structure(tag: u8, fields: Vec<PackStreamValue>) -> PackStreamValue {
    PackStreamValue::Structure(PackStreamStructure::new(tag, fields))
}

/// A graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct PackStreamNode {
    /// Legacy integer id
    pub id: i64,
    /// Labels
    pub labels: Vec<String>,
    /// Properties
    pub properties: Metadata,
    /// Element id (5.0+)
    pub element_id: Option<String>,
}

impl PackStreamNode {
    /// Create a node without an element id.
    pub fn new(id: i64, labels: Vec<String>, properties: Metadata) -> Self {
        Self {
            id,
            labels,
            properties,
            element_id: None,
        }
    }

    /// Set the element id.
    pub fn with_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }

    /// Encode in the layout `version` expects.
    pub fn to_value(&self, version: BoltVersion) -> PackStreamValue {
        let mut fields = vec![
            PackStreamValue::Integer(self.id),
            PackStreamValue::string_list(self.labels.iter().cloned()),
            PackStreamValue::Map(self.properties.clone()),
        ];
        if version.uses_element_ids() {
            fields.push(self.element_id_or_legacy(self.id));
        }
        structure(NODE, fields)
    }

    /// Decode from the layout `version` sends.
    pub fn from_value(value: &PackStreamValue, version: BoltVersion) -> Result<Self, PackStreamError> {
        let f = Fields::open(value, NODE, "Node")?;
        f.expect_len(if version.uses_element_ids() { 4 } else { 3 })?;
        Ok(Self {
            id: f.int(0)?,
            labels: f.strings(1)?,
            properties: f.map(2)?,
            element_id: if version.uses_element_ids() { Some(f.string(3)?) } else { None },
        })
    }

    fn element_id_or_legacy(&self, id: i64) -> PackStreamValue {
        PackStreamValue::String(self.element_id.clone().unwrap_or_else(|| id.to_string()))
    }
}

/// A relationship with both endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PackStreamRelationship {
    /// Legacy integer id
    pub id: i64,
    /// Start node id
    pub start_id: i64,
    /// End node id
    pub end_id: i64,
    /// Relationship type
    pub rel_type: String,
    /// Properties
    pub properties: Metadata,
    /// Element ids `(relationship, start, end)` (5.0+)
    pub element_ids: Option<(String, String, String)>,
}

impl PackStreamRelationship {
    /// Create a relationship without element ids.
    pub fn new(id: i64, start_id: i64, end_id: i64, rel_type: impl Into<String>, properties: Metadata) -> Self {
        Self {
            id,
            start_id,
            end_id,
            rel_type: rel_type.into(),
            properties,
            element_ids: None,
        }
    }

    /// Encode in the layout `version` expects.
    pub fn to_value(&self, version: BoltVersion) -> PackStreamValue {
        let mut fields = vec![
            PackStreamValue::Integer(self.id),
            PackStreamValue::Integer(self.start_id),
            PackStreamValue::Integer(self.end_id),
            PackStreamValue::String(self.rel_type.clone()),
            PackStreamValue::Map(self.properties.clone()),
        ];
        if version.uses_element_ids() {
            let (id, start, end) = self.element_ids.clone().unwrap_or_else(|| {
                (self.id.to_string(), self.start_id.to_string(), self.end_id.to_string())
            });
            fields.extend([id.into(), start.into(), end.into()]);
        }
        structure(RELATIONSHIP, fields)
    }

    /// Decode from the layout `version` sends.
    pub fn from_value(value: &PackStreamValue, version: BoltVersion) -> Result<Self, PackStreamError> {
        let f = Fields::open(value, RELATIONSHIP, "Relationship")?;
        f.expect_len(if version.uses_element_ids() { 8 } else { 5 })?;
        let element_ids = if version.uses_element_ids() {
            Some((f.string(5)?, f.string(6)?, f.string(7)?))
        } else {
            None
        };
        Ok(Self {
            id: f.int(0)?,
            start_id: f.int(1)?,
            end_id: f.int(2)?,
            rel_type: f.string(3)?,
            properties: f.map(4)?,
            element_ids,
        })
    }
}

/// A relationship inside a path, without endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PackStreamUnboundRelationship {
    /// Legacy integer id
    pub id: i64,
    /// Relationship type
    pub rel_type: String,
    /// Properties
    pub properties: Metadata,
    /// Element id (5.0+)
    pub element_id: Option<String>,
}

impl PackStreamUnboundRelationship {
    /// Encode in the layout `version` expects.
    pub fn to_value(&self, version: BoltVersion) -> PackStreamValue {
        let mut fields = vec![
            PackStreamValue::Integer(self.id),
            PackStreamValue::String(self.rel_type.clone()),
            PackStreamValue::Map(self.properties.clone()),
        ];
        if version.uses_element_ids() {
            fields.push(PackStreamValue::String(
                self.element_id.clone().unwrap_or_else(|| self.id.to_string()),
            ));
        }
        structure(UNBOUND_RELATIONSHIP, fields)
    }

    /// Decode from the layout `version` sends.
    pub fn from_value(value: &PackStreamValue, version: BoltVersion) -> Result<Self, PackStreamError> {
        let f = Fields::open(value, UNBOUND_RELATIONSHIP, "UnboundRelationship")?;
        f.expect_len(if version.uses_element_ids() { 4 } else { 3 })?;
        Ok(Self {
            id: f.int(0)?,
            rel_type: f.string(1)?,
            properties: f.map(2)?,
            element_id: if version.uses_element_ids() { Some(f.string(3)?) } else { None },
        })
    }
}

/// An alternating sequence of nodes and relationships.
#[derive(Debug, Clone, PartialEq)]
pub struct PackStreamPath {
    /// Distinct nodes
    pub nodes: Vec<PackStreamNode>,
    /// Distinct relationships
    pub relationships: Vec<PackStreamUnboundRelationship>,
    /// Traversal indices into `relationships` (1-based, negative for reverse) and `nodes`
    pub indices: Vec<i64>,
}

impl PackStreamPath {
    /// Encode in the layout `version` expects.
    pub fn to_value(&self, version: BoltVersion) -> PackStreamValue {
        structure(
            PATH,
            vec![
                PackStreamValue::List(self.nodes.iter().map(|n| n.to_value(version)).collect()),
                PackStreamValue::List(self.relationships.iter().map(|r| r.to_value(version)).collect()),
                PackStreamValue::List(self.indices.iter().map(|&i| PackStreamValue::Integer(i)).collect()),
            ],
        )
    }

    /// Decode from the layout `version` sends.
    pub fn from_value(value: &PackStreamValue, version: BoltVersion) -> Result<Self, PackStreamError> {
        let f = Fields::open(value, PATH, "Path")?;
        f.expect_len(3)?;
        let nodes = f
            .list(0)?
            .iter()
            .map(|v| PackStreamNode::from_value(v, version))
            .collect::<Result<_, _>>()?;
        let relationships = f
            .list(1)?
            .iter()
            .map(|v| PackStreamUnboundRelationship::from_value(v, version))
            .collect::<Result<_, _>>()?;
        let indices = f
            .list(2)?
            .iter()
            .map(|v| v.as_int().ok_or_else(|| f.wrong(2, "a list of integers")))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            nodes,
            relationships,
            indices,
        })
    }
}

/// Days since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackStreamDate {
    /// Days since 1970-01-01
    pub days: i64,
}

impl PackStreamDate {
    /// Encode.
    pub fn to_value(&self) -> PackStreamValue {
        structure(DATE, vec![self.days.into()])
    }

    /// Decode.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let f = Fields::open(value, DATE, "Date")?;
        f.expect_len(1)?;
        Ok(Self { days: f.int(0)? })
    }
}

/// Time of day with a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackStreamTime {
    /// Nanoseconds since midnight
    pub nanoseconds: i64,
    /// Offset from UTC in seconds
    pub offset_seconds: i64,
}

impl PackStreamTime {
    /// Encode.
    pub fn to_value(&self) -> PackStreamValue {
        structure(TIME, vec![self.nanoseconds.into(), self.offset_seconds.into()])
    }

    /// Decode.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let f = Fields::open(value, TIME, "Time")?;
        f.expect_len(2)?;
        Ok(Self {
            nanoseconds: f.int(0)?,
            offset_seconds: f.int(1)?,
        })
    }
}

/// Time of day without a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackStreamLocalTime {
    /// Nanoseconds since midnight
    pub nanoseconds: i64,
}

impl PackStreamLocalTime {
    /// Encode.
    pub fn to_value(&self) -> PackStreamValue {
        structure(LOCAL_TIME, vec![self.nanoseconds.into()])
    }

    /// Decode.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let f = Fields::open(value, LOCAL_TIME, "LocalTime")?;
        f.expect_len(1)?;
        Ok(Self { nanoseconds: f.int(0)? })
    }
}

/// Date and time without a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackStreamLocalDateTime {
    /// Seconds since the epoch
    pub seconds: i64,
    /// Nanosecond adjustment
    pub nanoseconds: i64,
}

impl PackStreamLocalDateTime {
    /// Encode.
    pub fn to_value(&self) -> PackStreamValue {
        structure(LOCAL_DATE_TIME, vec![self.seconds.into(), self.nanoseconds.into()])
    }

    /// Decode.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let f = Fields::open(value, LOCAL_DATE_TIME, "LocalDateTime")?;
        f.expect_len(2)?;
        Ok(Self {
            seconds: f.int(0)?,
            nanoseconds: f.int(1)?,
        })
    }
}

/// Zone of a [`PackStreamDateTime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeZone {
    /// Fixed offset from UTC in seconds
    Offset(i64),
    /// IANA zone id
    Id(String),
}

/// Date and time with a zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackStreamDateTime {
    /// Seconds since the epoch; UTC or local depending on `utc`
    pub seconds: i64,
    /// Nanosecond adjustment
    pub nanoseconds: i64,
    /// Zone
    pub zone: TimeZone,
    /// Whether `seconds` counts in UTC
    pub utc: bool,
}

impl PackStreamDateTime {
    fn tag(&self) -> u8 {
        match (&self.zone, self.utc) {
            (TimeZone::Offset(_), true) => DATE_TIME,
            (TimeZone::Id(_), true) => DATE_TIME_ZONE_ID,
            (TimeZone::Offset(_), false) => LEGACY_DATE_TIME,
            (TimeZone::Id(_), false) => LEGACY_DATE_TIME_ZONE_ID,
        }
    }

    /// Encode. The tag is chosen from the zone kind and `utc`.
    pub fn to_value(&self) -> PackStreamValue {
        let zone = match &self.zone {
            TimeZone::Offset(o) => PackStreamValue::Integer(*o),
            TimeZone::Id(id) => PackStreamValue::String(id.clone()),
        };
        structure(self.tag(), vec![self.seconds.into(), self.nanoseconds.into(), zone])
    }

    /// Decode any of the four date-time tags.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = value
            .as_structure()
            .ok_or_else(|| PackStreamError::InvalidStructure("expected DateTime structure".into()))?;
        let f = Fields::of(
            s,
            &[DATE_TIME, DATE_TIME_ZONE_ID, LEGACY_DATE_TIME, LEGACY_DATE_TIME_ZONE_ID],
            "DateTime",
        )?;
        f.expect_len(3)?;
        let zone = match s.tag {
            DATE_TIME | LEGACY_DATE_TIME => TimeZone::Offset(f.int(2)?),
            _ => TimeZone::Id(f.string(2)?),
        };
        Ok(Self {
            seconds: f.int(0)?,
            nanoseconds: f.int(1)?,
            zone,
            utc: matches!(s.tag, DATE_TIME | DATE_TIME_ZONE_ID),
        })
    }
}

/// A temporal amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackStreamDuration {
    /// Months
    pub months: i64,
    /// Days
    pub days: i64,
    /// Seconds
    pub seconds: i64,
    /// Nanoseconds
    pub nanoseconds: i64,
}

impl PackStreamDuration {
    /// Create a duration.
    pub fn new(months: i64, days: i64, seconds: i64, nanoseconds: i64) -> Self {
        Self {
            months,
            days,
            seconds,
            nanoseconds,
        }
    }

    /// Encode.
    pub fn to_value(&self) -> PackStreamValue {
        structure(
            DURATION,
            vec![self.months.into(), self.days.into(), self.seconds.into(), self.nanoseconds.into()],
        )
    }

    /// Decode.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let f = Fields::open(value, DURATION, "Duration")?;
        f.expect_len(4)?;
        Ok(Self::new(f.int(0)?, f.int(1)?, f.int(2)?, f.int(3)?))
    }
}

/// A 2D or 3D point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackStreamPoint {
    /// Coordinate reference system id
    pub srid: i64,
    /// X
    pub x: f64,
    /// Y
    pub y: f64,
    /// Z, for 3D points
    pub z: Option<f64>,
}

impl PackStreamPoint {
    /// Encode as Point2D or Point3D.
    pub fn to_value(&self) -> PackStreamValue {
        let mut fields = vec![self.srid.into(), self.x.into(), self.y.into()];
        match self.z {
            Some(z) => {
                fields.push(z.into());
                structure(POINT_3D, fields)
            }
            None => structure(POINT_2D, fields),
        }
    }

    /// Decode a Point2D or Point3D.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = value
            .as_structure()
            .ok_or_else(|| PackStreamError::InvalidStructure("expected Point structure".into()))?;
        let f = Fields::of(s, &[POINT_2D, POINT_3D], "Point")?;
        let three_d = s.tag == POINT_3D;
        f.expect_len(if three_d { 4 } else { 3 })?;
        Ok(Self {
            srid: f.int(0)?,
            x: f.float(1)?,
            y: f.float(2)?,
            z: if three_d { Some(f.float(3)?) } else { None },
        })
    }
}
