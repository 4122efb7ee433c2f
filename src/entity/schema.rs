//! Declared attributes for every entity kind.
//!
//! This is the closed schema table the console validates against: each kind
//! carries a fixed list of attribute names with their semantic type. The
//! declared type drives coercion of `update` values; the type's zero value
//! is what an unset attribute reads back as.

use serde_json::Value;

/// Semantic type of a declared attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Str,
    Int,
    Float,
    StrList,
}

impl AttrType {
    /// The value an instance falls back to while the attribute is unset.
    pub fn default_value(self) -> Value {
        match self {
            AttrType::Str => Value::from(""),
            AttrType::Int => Value::from(0),
            AttrType::Float => Value::from(0.0),
            AttrType::StrList => Value::Array(Vec::new()),
        }
    }

    /// Name used in coercion diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            AttrType::Str => "string",
            AttrType::Int => "integer",
            AttrType::Float => "float",
            AttrType::StrList => "string list",
        }
    }
}

/// One declared attribute of an entity kind.
#[derive(Debug, Clone, Copy)]
pub struct AttrSpec {
    pub name: &'static str,
    pub ty: AttrType,
}

const fn attr(name: &'static str, ty: AttrType) -> AttrSpec {
    AttrSpec { name, ty }
}

pub(crate) const BASE: &[AttrSpec] = &[];

pub(crate) const USER: &[AttrSpec] = &[
    attr("email", AttrType::Str),
    attr("password", AttrType::Str),
    attr("first_name", AttrType::Str),
    attr("last_name", AttrType::Str),
];

pub(crate) const STATE: &[AttrSpec] = &[attr("name", AttrType::Str)];

pub(crate) const CITY: &[AttrSpec] = &[
    attr("state_id", AttrType::Str),
    attr("name", AttrType::Str),
];

pub(crate) const AMENITY: &[AttrSpec] = &[attr("name", AttrType::Str)];

pub(crate) const PLACE: &[AttrSpec] = &[
    attr("city_id", AttrType::Str),
    attr("user_id", AttrType::Str),
    attr("name", AttrType::Str),
    attr("description", AttrType::Str),
    attr("number_rooms", AttrType::Int),
    attr("number_bathrooms", AttrType::Int),
    attr("max_guest", AttrType::Int),
    attr("price_by_night", AttrType::Int),
    attr("latitude", AttrType::Float),
    attr("longitude", AttrType::Float),
    attr("amenity_ids", AttrType::StrList),
];

pub(crate) const REVIEW: &[AttrSpec] = &[
    attr("place_id", AttrType::Str),
    attr("user_id", AttrType::Str),
    attr("text", AttrType::Str),
];
