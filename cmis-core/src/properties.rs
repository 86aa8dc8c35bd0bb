//! Object properties
//!
//! A name → typed value mapping carried by every object. Only the handful of
//! well-known names the object model reads are interpreted here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::object::ObjectId;

/// Single typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Id(String),
    Integer(i64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::String(s) | PropertyValue::Id(s) => write!(f, "{}", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::DateTime(d) => write!(f, "{}", d.to_rfc3339()),
        }
    }
}

/// Property with one or more values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub values: Vec<PropertyValue>,
}

impl Property {
    /// Create a single-valued property
    pub fn single(value: PropertyValue) -> Self {
        Self {
            values: vec![value],
        }
    }

    /// Create a multi-valued property
    pub fn multi(values: Vec<PropertyValue>) -> Self {
        Self { values }
    }

    /// First value, if any
    pub fn first(&self) -> Option<&PropertyValue> {
        self.values.first()
    }
}

impl From<PropertyValue> for Property {
    fn from(value: PropertyValue) -> Self {
        Property::single(value)
    }
}

/// Property set of one object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default)]
    entries: BTreeMap<String, Property>,
}

impl Properties {
    /// Create an empty property set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a property
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries.get(name)
    }

    /// Set a property, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, property: impl Into<Property>) {
        self.entries.insert(name.into(), property.into());
    }

    /// Builder form of [`Properties::set`]
    pub fn with(mut self, name: impl Into<String>, property: impl Into<Property>) -> Self {
        self.set(name, property);
        self
    }

    /// Remove a property
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.entries.remove(name)
    }

    /// Check if property exists
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over properties in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Property)> {
        self.entries.iter()
    }

    /// Overlay `other` on top of this set
    pub fn merge(&mut self, other: &Properties) {
        for (name, prop) in other.iter() {
            self.entries.insert(name.clone(), prop.clone());
        }
    }

    /// String or id value
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.get(name)?.first()? {
            PropertyValue::String(s) | PropertyValue::Id(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Object reference held by an id (or string) property; empty means unset
    pub fn id(&self, name: &str) -> Option<ObjectId> {
        self.string(name).filter(|s| !s.is_empty()).map(ObjectId::from)
    }

    /// All string or id values of a multi-valued property
    pub fn strings(&self, name: &str) -> Vec<&str> {
        self.get(name)
            .map(|p| {
                p.values
                    .iter()
                    .filter_map(|v| match v {
                        PropertyValue::String(s) | PropertyValue::Id(s) => Some(s.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name)?.first()? {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.get(name)?.first()? {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.get(name)?.first()? {
            PropertyValue::DateTime(d) => Some(*d),
            _ => None,
        }
    }

    pub fn set_string(&mut self, name: &str, value: impl Into<String>) {
        self.set(name, PropertyValue::String(value.into()));
    }

    pub fn set_id(&mut self, name: &str, value: impl Into<String>) {
        self.set(name, PropertyValue::Id(value.into()));
    }

    pub fn set_integer(&mut self, name: &str, value: i64) {
        self.set(name, PropertyValue::Integer(value));
    }

    pub fn set_boolean(&mut self, name: &str, value: bool) {
        self.set(name, PropertyValue::Boolean(value));
    }

    pub fn set_datetime(&mut self, name: &str, value: DateTime<Utc>) {
        self.set(name, PropertyValue::DateTime(value));
    }
}

/// Well-known property names
pub mod props {
    pub const OBJECT_ID: &str = "cmis:objectId";
    pub const NAME: &str = "cmis:name";
    pub const BASE_TYPE_ID: &str = "cmis:baseTypeId";
    pub const OBJECT_TYPE_ID: &str = "cmis:objectTypeId";
    pub const CREATION_DATE: &str = "cmis:creationDate";
    pub const LAST_MODIFICATION_DATE: &str = "cmis:lastModificationDate";

    // Folder
    pub const PARENT_ID: &str = "cmis:parentId";
    pub const PATH: &str = "cmis:path";

    // Document content
    pub const CONTENT_STREAM_MIME_TYPE: &str = "cmis:contentStreamMimeType";
    pub const CONTENT_STREAM_FILE_NAME: &str = "cmis:contentStreamFileName";
    pub const CONTENT_STREAM_LENGTH: &str = "cmis:contentStreamLength";

    // Document versioning
    pub const IS_PRIVATE_WORKING_COPY: &str = "cmis:isPrivateWorkingCopy";
    pub const VERSION_SERIES_ID: &str = "cmis:versionSeriesId";
    pub const IS_VERSION_SERIES_CHECKED_OUT: &str = "cmis:isVersionSeriesCheckedOut";
    pub const VERSION_SERIES_CHECKED_OUT_ID: &str = "cmis:versionSeriesCheckedOutId";
    pub const VERSION_LABEL: &str = "cmis:versionLabel";
    pub const IS_MAJOR_VERSION: &str = "cmis:isMajorVersion";
    pub const IS_LATEST_VERSION: &str = "cmis:isLatestVersion";
    pub const CHECKIN_COMMENT: &str = "cmis:checkinComment";
}
