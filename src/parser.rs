//! The specification parser: turns JSON cluster documents into the flat,
//! merged cluster list the index is built from.
//!
//! # Document Format
//!
//! Every collection is optional:
//!
//! ```json
//! {
//!   "clusters": [
//!     {
//!       "code": 6,
//!       "name": "On Off",
//!       "commands": [{"code": 0, "name": "Off"}],
//!       "attributes": [
//!         {"definition": {"code": 0, "name": "OnOff", "type": "boolean"}}
//!       ]
//!     }
//!   ],
//!   "cluster_extensions": [
//!     {"code": 6, "attributes": [{"definition": {"code": 16384, "name": "GlobalSceneControl"}}]}
//!   ],
//!   "enums": [
//!     {"name": "StatusCode", "clusters": [6, 8], "entries": [{"name": "Busy", "code": 2}]}
//!   ],
//!   "global_attributes": [
//!     {"definition": {"code": 65533, "name": "ClusterRevision", "type": "int16u"}}
//!   ]
//! }
//! ```
//!
//! # Merging
//!
//! Sources are read in the order given. Once all of them have been read:
//!
//! 1. clusters are taken in source order, duplicates included;
//! 2. shared `bitmaps`, `enums` and `structs` are appended to every cluster
//!    whose code they list (an empty list means every cluster);
//! 3. `cluster_extensions` are appended to every cluster with their code;
//! 4. `global_attributes` are appended to every cluster that does not
//!    already define an attribute with the same code.
//!
//! Whitespace is removed from cluster names.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::model::{
    Attribute, Bitmap, Cluster, Command, Enum, Event, Struct, StructTag,
};

/// A document handed to the parser: a file on disk or an in-memory string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseSource {
    Path(PathBuf),
    Document { name: String, content: String },
}

impl ParseSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ParseSource::Path(path.into())
    }

    /// Wraps an in-memory document. `name` is only used in error messages.
    pub fn from_document(
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        ParseSource::Document { name: name.into(), content: content.into() }
    }

    /// A label for diagnostics: the path, or the document name.
    pub fn label(&self) -> String {
        match self {
            ParseSource::Path(path) => path.display().to_string(),
            ParseSource::Document { name, .. } => name.clone(),
        }
    }

    fn read(&self) -> Result<SpecDocument, ParseError> {
        match self {
            ParseSource::Path(path) => read_file(path),
            ParseSource::Document { name, content } => {
                serde_json::from_str(content).map_err(|error| {
                    ParseError::Json { file: name.clone(), error }
                })
            }
        }
    }
}

impl fmt::Display for ParseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<PathBuf> for ParseSource {
    fn from(path: PathBuf) -> Self { ParseSource::Path(path) }
}

impl From<&Path> for ParseSource {
    fn from(path: &Path) -> Self { ParseSource::Path(path.to_path_buf()) }
}

/// A type definition shared by several clusters.
#[derive(Debug, Deserialize)]
pub struct Shared<T> {
    /// Codes of the clusters that own this type. Empty means all clusters.
    #[serde(default)]
    pub clusters: Vec<u32>,
    #[serde(flatten)]
    pub definition: T,
}

/// Items added to a cluster defined elsewhere.
#[derive(Debug, Deserialize)]
pub struct ClusterExtension {
    pub code: u32,
    #[serde(default)]
    pub commands: Vec<Command>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub bitmaps: Vec<Bitmap>,
    #[serde(default)]
    pub enums: Vec<Enum>,
    #[serde(default)]
    pub structs: Vec<Struct>,
}

/// Root structure of a specification document.
#[derive(Debug, Deserialize)]
pub struct SpecDocument {
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub cluster_extensions: Vec<ClusterExtension>,
    #[serde(default)]
    pub bitmaps: Vec<Shared<Bitmap>>,
    #[serde(default)]
    pub enums: Vec<Shared<Enum>>,
    #[serde(default)]
    pub structs: Vec<Shared<Struct>>,
    #[serde(default)]
    pub global_attributes: Vec<Attribute>,
}

/// Errors raised while reading or merging specification documents.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {}: {error}", .file.display())]
    Io {
        file: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("JSON parse error in {file}: {error}")]
    Json {
        file: String,
        #[source]
        error: serde_json::Error,
    },

    #[error("{file}: extension targets unknown cluster code {code}")]
    UnknownExtensionTarget { file: String, code: u32 },

    #[error("{file}: response struct {name} has no code")]
    MissingResponseCode { file: String, name: String },
}

/// Removes whitespace from a cluster name, the same way for documents and
/// for lookups.
pub fn normalize_cluster_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Reads every source in order and returns the merged cluster list.
///
/// The first failing source aborts the whole parse.
///
/// # Examples
///
/// ```
/// use spec_definitions::{ParseSource, parse_sources};
///
/// let source = ParseSource::from_document(
///     "on-off.json",
///     r#"{"clusters": [{"code": 6, "name": "On Off"}]}"#,
/// );
/// let clusters = parse_sources([source]).unwrap();
/// assert_eq!(clusters[0].name, "OnOff");
/// ```
pub fn parse_sources<I>(sources: I) -> Result<Vec<Cluster>, ParseError>
where
    I: IntoIterator<Item = ParseSource>,
{
    let mut documents = Vec::new();
    for source in sources {
        let document = source.read()?;
        let label = source.label();
        validate_responses(&label, &document)?;
        debug!(
            source = %label,
            clusters = document.clusters.len(),
            extensions = document.cluster_extensions.len(),
            "parsed specification source"
        );
        documents.push((label, document));
    }
    merge(documents)
}

fn read_file(path: &Path) -> Result<SpecDocument, ParseError> {
    let content = fs::read_to_string(path).map_err(|error| ParseError::Io {
        file: path.to_path_buf(),
        error,
    })?;
    serde_json::from_str(&content).map_err(|error| ParseError::Json {
        file: path.display().to_string(),
        error,
    })
}

fn validate_responses(
    label: &str,
    document: &SpecDocument,
) -> Result<(), ParseError> {
    let structs = document
        .clusters
        .iter()
        .flat_map(|cluster| cluster.structs.iter())
        .chain(document.cluster_extensions.iter().flat_map(|e| e.structs.iter()))
        .chain(document.structs.iter().map(|shared| &shared.definition));

    for s in structs {
        if s.tag == StructTag::Response && s.code.is_none() {
            return Err(ParseError::MissingResponseCode {
                file: label.to_string(),
                name: s.name.clone(),
            });
        }
    }
    Ok(())
}

fn merge(documents: Vec<(String, SpecDocument)>) -> Result<Vec<Cluster>, ParseError> {
    let mut clusters = Vec::new();
    let mut extensions = Vec::new();
    let mut bitmaps = Vec::new();
    let mut enums = Vec::new();
    let mut structs = Vec::new();
    let mut globals = Vec::new();

    for (label, document) in documents {
        clusters.extend(document.clusters.into_iter().map(|mut cluster| {
            cluster.name = normalize_cluster_name(&cluster.name);
            cluster
        }));
        extensions.extend(
            document.cluster_extensions.into_iter().map(|e| (label.clone(), e)),
        );
        bitmaps.extend(document.bitmaps);
        enums.extend(document.enums);
        structs.extend(document.structs);
        globals.extend(document.global_attributes);
    }

    distribute(&mut clusters, bitmaps, |cluster| &mut cluster.bitmaps);
    distribute(&mut clusters, enums, |cluster| &mut cluster.enums);
    distribute(&mut clusters, structs, |cluster| &mut cluster.structs);

    for (label, extension) in extensions {
        apply_extension(&mut clusters, &label, extension)?;
    }

    for cluster in &mut clusters {
        for global in &globals {
            if !cluster.attributes.iter().any(|a| a.code() == global.code()) {
                cluster.attributes.push(global.clone());
            }
        }
    }

    Ok(clusters)
}

fn distribute<T, F>(clusters: &mut [Cluster], shared: Vec<Shared<T>>, items: F)
where
    T: Clone,
    F: Fn(&mut Cluster) -> &mut Vec<T>,
{
    for Shared { clusters: codes, definition } in shared {
        for cluster in clusters.iter_mut() {
            if codes.is_empty() || codes.contains(&cluster.code) {
                items(cluster).push(definition.clone());
            }
        }
    }
}

fn apply_extension(
    clusters: &mut [Cluster],
    label: &str,
    extension: ClusterExtension,
) -> Result<(), ParseError> {
    let mut targets = clusters
        .iter_mut()
        .filter(|cluster| cluster.code == extension.code)
        .peekable();

    if targets.peek().is_none() {
        return Err(ParseError::UnknownExtensionTarget {
            file: label.to_string(),
            code: extension.code,
        });
    }

    for cluster in targets {
        cluster.commands.extend(extension.commands.iter().cloned());
        cluster.attributes.extend(extension.attributes.iter().cloned());
        cluster.events.extend(extension.events.iter().cloned());
        cluster.bitmaps.extend(extension.bitmaps.iter().cloned());
        cluster.enums.extend(extension.enums.iter().cloned());
        cluster.structs.extend(extension.structs.iter().cloned());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(name: &str, json: &str) -> ParseSource {
        ParseSource::from_document(name, json)
    }

    #[test]
    fn test_parse_minimal_document() {
        let clusters =
            parse_sources([document("a.json", r#"{"clusters": []}"#)]).unwrap();
        assert!(clusters.is_empty());

        let clusters = parse_sources([document("b.json", "{}")]).unwrap();
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_cluster_names_lose_whitespace() {
        let json = r#"{"clusters": [{"code": 8, "name": "Level\tControl "}]}"#;
        let clusters = parse_sources([document("level.json", json)]).unwrap();
        assert_eq!(clusters[0].name, "LevelControl");
        assert_eq!(normalize_cluster_name(" On Off "), "OnOff");
    }

    #[test]
    fn test_clusters_keep_source_order() {
        let first = r#"{"clusters": [{"code": 6, "name": "OnOff"}]}"#;
        let second = r#"{"clusters": [{"code": 6, "name": "Switch"}, {"code": 8, "name": "Level"}]}"#;
        let clusters = parse_sources([
            document("first.json", first),
            document("second.json", second),
        ])
        .unwrap();
        let names: Vec<_> = clusters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["OnOff", "Switch", "Level"]);
    }

    #[test]
    fn test_shared_types_and_globals() {
        let globals = r#"{
            "global_attributes": [
                {"definition": {"code": 65533, "name": "ClusterRevision", "type": "int16u"}}
            ],
            "enums": [{"name": "StatusCode", "clusters": [], "entries": []}]
        }"#;
        let clusters = r#"{
            "clusters": [
                {"code": 6, "name": "OnOff", "attributes": [
                    {"definition": {"code": 65533, "name": "ClusterRevision", "type": "int16u"},
                     "qualities": "READABLE"}
                ]},
                {"code": 8, "name": "LevelControl"}
            ],
            "bitmaps": [{"name": "OptionsBitmap", "clusters": [8]}]
        }"#;
        let clusters = parse_sources([
            document("global-attributes.json", globals),
            document("clusters.json", clusters),
        ])
        .unwrap();

        let on_off = &clusters[0];
        assert_eq!(on_off.attributes.len(), 1);
        assert!(!on_off.attributes[0].qualities.is_empty());
        assert_eq!(on_off.enums[0].name, "StatusCode");
        assert!(on_off.bitmaps.is_empty());

        let level = &clusters[1];
        assert_eq!(level.attributes[0].name(), "ClusterRevision");
        assert_eq!(level.enums[0].name, "StatusCode");
        assert_eq!(level.bitmaps[0].name, "OptionsBitmap");
    }

    #[test]
    fn test_extension_applies_across_documents() {
        let extension = r#"{
            "cluster_extensions": [
                {"code": 6, "commands": [{"code": 64, "name": "OffWithEffect"}]}
            ]
        }"#;
        let base = r#"{"clusters": [{"code": 6, "name": "OnOff",
            "commands": [{"code": 0, "name": "Off"}]}]}"#;
        let clusters = parse_sources([
            document("ext.json", extension),
            document("base.json", base),
        ])
        .unwrap();
        let names: Vec<_> =
            clusters[0].commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Off", "OffWithEffect"]);
    }

    #[test]
    fn test_extension_to_unknown_cluster_fails() {
        let json = r#"{"cluster_extensions": [{"code": 42}]}"#;
        let err = parse_sources([document("ext.json", json)]).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnknownExtensionTarget { code: 42, .. }
        ));
    }

    #[test]
    fn test_response_without_code_fails() {
        let json = r#"{"clusters": [{"code": 4, "name": "Groups",
            "structs": [{"name": "AddGroupResponse", "tag": "response"}]}]}"#;
        let err = parse_sources([document("groups.json", json)]).unwrap_err();
        match err {
            ParseError::MissingResponseCode { file, name } => {
                assert_eq!(file, "groups.json");
                assert_eq!(name, "AddGroupResponse");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_json_names_source() {
        let err =
            parse_sources([document("broken.json", "{ not json }")]).unwrap_err();
        assert!(matches!(err, ParseError::Json { ref file, .. } if file == "broken.json"));
        assert!(err.to_string().starts_with("JSON parse error in broken.json"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = ParseSource::from_path("/nonexistent/path/12345.json");
        let err = parse_sources([source]).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
