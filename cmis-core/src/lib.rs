//! CMIS Client Core Library
//!
//! Client-side object model for document repositories:
//! - Object model (Document, Folder) over one shared record
//! - Checkout / checkin / cancel state machine and version history
//! - Folder containment and policy-driven tree removal
//! - Content stream upload and download with progress and cancellation
//! - Binding abstraction for the protocol layer
//! - In-memory reference repository

pub mod binding;
pub mod config;
pub mod content;
pub mod document;
pub mod error;
pub mod folder;
pub mod memory;
pub mod object;
pub mod properties;
pub mod session;
pub mod versioning;

pub use binding::{
    Binding, Capabilities, ContentMeta, ContentStream, RepositoryInfo, UploadSink, Updatability,
};
pub use config::SessionConfig;
pub use content::{ContentTransfer, ProgressCallback, TransferProgress};
pub use document::{Document, DocumentOps};
pub use error::{CmisError, ErrorKind, Result, ServerState, TransportError};
pub use folder::{Folder, FolderOps, RemoveTreeOptions, UnfileObjects};
pub use memory::{FailPoint, MemoryRepository};
pub use object::{BaseType, CmisObject, ObjectData, ObjectId};
pub use properties::{props, Properties, Property, PropertyValue};
pub use session::Session;
pub use versioning::{CheckInRequest, CheckoutState, VersionHistory};
