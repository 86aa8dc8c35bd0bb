//! Core object model
//!
//! Every repository object is one [`ObjectData`] record. Documents and
//! folders wrap that record together with a borrowed [`Session`]; their
//! capability-specific operations live in the `DocumentOps` and `FolderOps`
//! traits rather than in a type hierarchy.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{CmisError, Result};
use crate::folder::Folder;
use crate::properties::{props, Properties};
use crate::session::Session;

/// Repository-assigned object identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Create a new ObjectId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Object type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseType {
    Document,
    Folder,
}

impl BaseType {
    /// Protocol name of the base type
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::Document => "cmis:document",
            BaseType::Folder => "cmis:folder",
        }
    }
}

/// Shared record behind every document and folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    /// Repository-assigned identity
    pub id: ObjectId,
    /// Object type discriminator
    pub base_type: BaseType,
    /// Name → typed value mapping
    #[serde(default)]
    pub properties: Properties,
}

impl ObjectData {
    /// Create a new record with the identity properties filled in
    pub fn new(id: impl Into<ObjectId>, base_type: BaseType) -> Self {
        let id = id.into();
        let mut properties = Properties::new();
        properties.set_id(props::OBJECT_ID, id.as_str());
        properties.set_id(props::BASE_TYPE_ID, base_type.as_str());
        Self {
            id,
            base_type,
            properties,
        }
    }

    /// Builder form for attaching properties
    pub fn with_properties(mut self, properties: &Properties) -> Self {
        self.properties.merge(properties);
        self
    }

    /// Object name, empty when the repository did not report one
    pub fn name(&self) -> &str {
        self.properties.string(props::NAME).unwrap_or("")
    }

    pub fn is_document(&self) -> bool {
        self.base_type == BaseType::Document
    }

    pub fn is_folder(&self) -> bool {
        self.base_type == BaseType::Folder
    }
}

/// Any object materialized through a session
#[derive(Debug, Clone)]
pub enum CmisObject<'s> {
    Document(Document<'s>),
    Folder(Folder<'s>),
}

impl<'s> CmisObject<'s> {
    /// Wrap a record in the handle matching its base type
    pub fn from_data(session: &'s Session, data: ObjectData) -> Self {
        match data.base_type {
            BaseType::Document => CmisObject::Document(Document::new(session, data)),
            BaseType::Folder => CmisObject::Folder(Folder::new(session, data)),
        }
    }

    /// Get the object ID
    pub fn id(&self) -> &ObjectId {
        &self.data().id
    }

    /// Get the underlying record
    pub fn data(&self) -> &ObjectData {
        match self {
            CmisObject::Document(d) => d.data(),
            CmisObject::Folder(f) => f.data(),
        }
    }

    pub fn base_type(&self) -> BaseType {
        self.data().base_type
    }

    /// Narrow to a document
    pub fn into_document(self) -> Result<Document<'s>> {
        match self {
            CmisObject::Document(d) => Ok(d),
            CmisObject::Folder(f) => Err(CmisError::InvalidState(format!(
                "{} is a folder, not a document",
                f.id()
            ))),
        }
    }

    /// Narrow to a folder
    pub fn into_folder(self) -> Result<Folder<'s>> {
        match self {
            CmisObject::Folder(f) => Ok(f),
            CmisObject::Document(d) => Err(CmisError::InvalidState(format!(
                "{} is a document, not a folder",
                d.id()
            ))),
        }
    }
}

impl std::fmt::Display for CmisObject<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CmisObject::Document(d) => d.fmt(f),
            CmisObject::Folder(folder) => folder.fmt(f),
        }
    }
}
