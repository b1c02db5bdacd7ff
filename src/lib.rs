//! Spec Definitions: a read-only id/name index over parsed cluster
//! definitions of a device-control protocol.
//!
//! Clusters group the commands, attributes, events and data types of the
//! protocol. On the wire every cluster and item is a number; in test scripts
//! and specification text they are names. [`SpecDefinitions`] translates
//! between the two.
//!
//! # Basic Usage
//!
//! ```rust
//! use spec_definitions::{LookupError, ParseSource, SpecDefinitions};
//!
//! let json = r#"{
//!   "clusters": [{
//!     "code": 6,
//!     "name": "On Off",
//!     "commands": [
//!       {"code": 0, "name": "Off"},
//!       {"code": 1, "name": "On"}
//!     ],
//!     "attributes": [
//!       {"definition": {"code": 0, "name": "OnOff", "type": "boolean"},
//!        "qualities": "READABLE"}
//!     ]
//!   }]
//! }"#;
//!
//! let definitions =
//!     SpecDefinitions::new([ParseSource::from_document("on-off.json", json)])
//!         .unwrap();
//!
//! // By id
//! assert_eq!(definitions.get_cluster_name(6), Some("OnOff"));
//! assert_eq!(definitions.get_command_name(6, 1), Some("On"));
//! assert_eq!(definitions.get_attribute_name(6, 0), Some("OnOff"));
//!
//! // By name
//! let on = definitions.get_command_by_name("OnOff", "On").unwrap().unwrap();
//! assert_eq!(on.code, 1);
//!
//! // Casing mistakes are reported with the correct spelling
//! let err = definitions.get_command_by_name("OnOff", "on").unwrap_err();
//! let LookupError::AmbiguousCasing { suggestion, .. } = err;
//! assert_eq!(suggestion, "On");
//! ```
//!
//! # Loading From Disk
//!
//! When the `path-loading` feature is enabled (default), an index can be
//! built from every JSON document matching a glob pattern. The file whose
//! name ends in `global-attributes.json` is parsed first, the others in
//! lexicographic order:
//!
//! ```rust,ignore
//! use spec_definitions::spec_definitions_from_path;
//!
//! let definitions = spec_definitions_from_path("data-model/json/*.json")?;
//! ```
//!
//! See the [`parser`] module for the document format.
//!
//! ## Disabling Path Loading
//!
//! ```toml
//! [dependencies]
//! spec-definitions = { version = "0.1", default-features = false }
//! ```

mod casing;

mod error;
pub use error::{BuildError, Error, ItemKind, LookupError, Result};

pub mod model;
pub use model::{
    Attribute, AttributeQuality, Bitmap, Cluster, Command, CommandQuality,
    ConstantEntry, Entity, Enum, Event, EventPriority, Field, FieldQuality,
    HasQualities, Struct, StructQuality, StructTag, TypeDefinition,
};

pub mod parser;
pub use parser::{ParseError, ParseSource, parse_sources};

mod spec_definitions;
pub use spec_definitions::{CollisionPolicy, SpecDefinitions};

#[cfg(feature = "path-loading")]
mod discovery;

#[cfg(feature = "path-loading")]
pub use discovery::{
    DiscoveryConfig, GLOBAL_DEFINITIONS_SUFFIX, discover_sources, order_sources,
    spec_definitions_from_path,
};
