mod schema;

pub use schema::{AttrSpec, AttrType};

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{HearthError, Result};

/// Member key carrying the entity kind in the storage file.
pub const CLASS_TAG: &str = "__class__";

/// The closed set of entity kinds the console knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Base,
    User,
    State,
    City,
    Amenity,
    Place,
    Review,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Base,
        EntityKind::User,
        EntityKind::State,
        EntityKind::City,
        EntityKind::Amenity,
        EntityKind::Place,
        EntityKind::Review,
    ];

    /// Kind name as it appears on the command line, in storage keys, and in
    /// the serialization tag.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Base => "BaseEntity",
            EntityKind::User => "User",
            EntityKind::State => "State",
            EntityKind::City => "City",
            EntityKind::Amenity => "Amenity",
            EntityKind::Place => "Place",
            EntityKind::Review => "Review",
        }
    }

    /// Resolve a kind name. This is the only string-to-kind gate; anything
    /// it rejects is an unknown class as far as the console is concerned.
    pub fn from_name(name: &str) -> Option<EntityKind> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Declared attributes of this kind.
    pub fn attrs(self) -> &'static [AttrSpec] {
        match self {
            EntityKind::Base => schema::BASE,
            EntityKind::User => schema::USER,
            EntityKind::State => schema::STATE,
            EntityKind::City => schema::CITY,
            EntityKind::Amenity => schema::AMENITY,
            EntityKind::Place => schema::PLACE,
            EntityKind::Review => schema::REVIEW,
        }
    }

    /// Declared type of one attribute, if the kind declares it.
    pub fn attr_type(self, name: &str) -> Option<AttrType> {
        self.attrs().iter().find(|spec| spec.name == name).map(|spec| spec.ty)
    }

    /// Storage-key prefix shared by every instance of this kind.
    pub fn key_prefix(self) -> String {
        format!("{}.", self.name())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed, identified, timestamped record.
///
/// The attribute map is sparse: a fresh entity carries no attributes, and a
/// declared attribute that was never assigned reads back as its type's zero
/// value through [`Entity::get`]. Undeclared attributes may be attached at
/// runtime and survive the save/reload round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub attrs: BTreeMap<String, Value>,
}

impl Entity {
    /// Construct a fresh entity: new UUID, both timestamps now, no
    /// attributes. The caller registers it with the store.
    pub fn new(kind: EntityKind) -> Self {
        let now = Utc::now();
        Self {
            kind,
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            attrs: BTreeMap::new(),
        }
    }

    /// Registry and storage key, `"<Kind>.<id>"`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.kind.name(), self.id)
    }

    /// Refresh `updated_at`. Called on every explicit save.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Read an attribute, falling back to the schema-declared default when
    /// it is unset on this instance.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.attrs
            .get(name)
            .cloned()
            .or_else(|| self.kind.attr_type(name).map(AttrType::default_value))
    }

    /// Serialize to the persisted JSON object: `id`, ISO-8601 timestamps,
    /// every instance attribute, and the kind under [`CLASS_TAG`].
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".into(), Value::from(self.id.clone()));
        map.insert("created_at".into(), Value::from(iso(self.created_at)));
        map.insert("updated_at".into(), Value::from(iso(self.updated_at)));
        for (name, value) in &self.attrs {
            map.insert(name.clone(), value.clone());
        }
        map.insert(CLASS_TAG.into(), Value::from(self.kind.name()));
        Value::Object(map)
    }

    /// Reconstruct from a persisted JSON object. The tag must name a known
    /// kind and the timestamps must parse; anything else in the object
    /// becomes an instance attribute. No registration side effect.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(HearthError::Malformed("entity is not a JSON object".into()));
        };
        let kind_name = take_string(&mut map, CLASS_TAG)?;
        let kind = EntityKind::from_name(&kind_name)
            .ok_or(HearthError::UnknownKind(kind_name))?;
        let id = take_string(&mut map, "id")?;
        let created_at = parse_timestamp(&take_string(&mut map, "created_at")?)?;
        let updated_at = parse_timestamp(&take_string(&mut map, "updated_at")?)?;
        Ok(Self {
            kind,
            id,
            created_at,
            updated_at,
            attrs: map.into_iter().collect(),
        })
    }
}

impl fmt::Display for Entity {
    /// Human display form, `[<Kind>] (<id>) <field-map>`. Field order is
    /// fixed: id, created_at, updated_at, then attributes in map order.
    /// Timestamps render as their native debug form here, not ISO strings.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] ({}) {{'id': '{}', 'created_at': {:?}, 'updated_at': {:?}",
            self.kind, self.id, self.id, self.created_at, self.updated_at
        )?;
        for (name, value) in &self.attrs {
            write!(f, ", '{}': {}", name, render_value(value))?;
        }
        write!(f, "}}")
    }
}

/// ISO-8601 encoding used in the storage file. Microsecond resolution
/// bounds the round-trip precision of timestamps.
fn iso(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| HearthError::Malformed(format!("bad timestamp {text:?}: {e}")))
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Result<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(HearthError::Malformed(format!("{key:?} is not a string"))),
        None => Err(HearthError::Malformed(format!("missing {key:?}"))),
    }
}

/// Display rendering for attribute values: strings single-quoted, lists
/// bracketed, numbers as-is.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", items.join(", "))
        }
        other => other.to_string(),
    }
}
