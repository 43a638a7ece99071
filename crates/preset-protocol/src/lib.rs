//! Preset Overlay Protocol Types
//!
//! Defines the JSON shapes exchanged with the write-path and read-path
//! collaborators: write requests, resolved responses, and error payloads.

pub mod error;
pub mod request;
pub mod response;

pub use error::{ErrorKind, ErrorPayload, ReasonCode, ValidationError};
pub use request::{DomainKind, WriteRequest};
pub use response::{InheritanceInfo, PresetRef, ResolvedResponse};
