use std::collections::BTreeMap;

use tracing::debug;

use crate::casing::{KnownNames, enforce_casing};
use crate::error::{BuildError, ItemKind, LookupError};
use crate::model::{
    Attribute, Bitmap, Cluster, Command, Entity, Enum, Event, Struct,
    TypeDefinition,
};
use crate::parser::{ParseSource, normalize_cluster_name, parse_sources};

/// What the index builder does when a code or name is seen twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CollisionPolicy {
    /// The later cluster or item silently replaces the earlier one in both
    /// the id and the name tables.
    #[default]
    Overwrite,
    /// The build fails with a [`BuildError`] naming the collision.
    Reject,
}

/// Items addressable by numeric code and by name.
///
/// Both maps resolve to a position in the owning cluster's collection, so
/// `codes_by_name` is keyed `name -> code` and `by_code` is keyed
/// `code -> position`.
#[derive(Clone, Debug, Default)]
struct ItemTable {
    by_code: BTreeMap<u32, usize>,
    codes_by_name: BTreeMap<String, u32>,
}

impl ItemTable {
    fn position_of_code(&self, code: u32) -> Option<usize> {
        self.by_code.get(&code).copied()
    }

    fn position_of_name(&self, name: &str) -> Option<usize> {
        self.codes_by_name
            .get(name)
            .and_then(|code| self.position_of_code(*code))
    }

    /// Inserts an item, removing the stale name of any item it replaces.
    fn insert(
        &mut self,
        code: u32,
        name: &str,
        position: usize,
        existing_name: impl Fn(usize) -> Option<String>,
        collision: &Collision<'_>,
    ) -> Result<(), BuildError> {
        if let Some(old) = self.position_of_code(code) {
            collision.check(|| BuildError::DuplicateItemCode {
                cluster: collision.cluster.to_string(),
                kind: collision.kind,
                code,
            })?;
            if let Some(old_name) = existing_name(old)
                && self.codes_by_name.get(&old_name) == Some(&code)
            {
                self.codes_by_name.remove(&old_name);
            }
        }
        if self.codes_by_name.contains_key(name) {
            collision.check(|| BuildError::DuplicateItemName {
                cluster: collision.cluster.to_string(),
                kind: collision.kind,
                name: name.to_string(),
            })?;
        }

        self.by_code.insert(code, position);
        self.codes_by_name.insert(name.to_string(), code);
        Ok(())
    }
}

impl KnownNames for ItemTable {
    fn has_name(&self, name: &str) -> bool {
        self.codes_by_name.contains_key(name)
    }

    fn known_names(&self) -> impl Iterator<Item = &str> {
        self.codes_by_name.keys().map(String::as_str)
    }
}

/// Items addressable by name only (bitmaps, enums and structs).
#[derive(Clone, Debug, Default)]
struct NamedTable {
    by_name: BTreeMap<String, usize>,
}

impl NamedTable {
    fn insert(
        &mut self,
        name: &str,
        position: usize,
        collision: &Collision<'_>,
    ) -> Result<(), BuildError> {
        if self.by_name.contains_key(name) {
            collision.check(|| BuildError::DuplicateItemName {
                cluster: collision.cluster.to_string(),
                kind: collision.kind,
                name: name.to_string(),
            })?;
        }
        self.by_name.insert(name.to_string(), position);
        Ok(())
    }
}

impl KnownNames for NamedTable {
    fn has_name(&self, name: &str) -> bool { self.by_name.contains_key(name) }

    fn known_names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }
}

/// Exact-name resolution shared by both table shapes.
trait NameTable: KnownNames {
    fn position(&self, name: &str) -> Option<usize>;
}

impl NameTable for ItemTable {
    fn position(&self, name: &str) -> Option<usize> {
        self.position_of_name(name)
    }
}

impl NameTable for NamedTable {
    fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

/// Applies the collision policy for one cluster and item kind.
struct Collision<'a> {
    policy: CollisionPolicy,
    cluster: &'a str,
    kind: ItemKind,
}

impl Collision<'_> {
    fn check(
        &self,
        error: impl FnOnce() -> BuildError,
    ) -> Result<(), BuildError> {
        match self.policy {
            CollisionPolicy::Overwrite => {
                debug!(
                    cluster = self.cluster,
                    kind = %self.kind,
                    "overwriting duplicate item"
                );
                Ok(())
            }
            CollisionPolicy::Reject => Err(error()),
        }
    }
}

/// A cluster together with its six per-kind sub-indices.
///
/// Responses live in their own table but point into `cluster.structs`.
#[derive(Clone, Debug)]
struct ClusterIndex {
    cluster: Cluster,
    commands: ItemTable,
    responses: ItemTable,
    attributes: ItemTable,
    events: ItemTable,
    bitmaps: NamedTable,
    enums: NamedTable,
    structs: NamedTable,
}

impl ClusterIndex {
    fn build(
        cluster: Cluster,
        policy: CollisionPolicy,
    ) -> Result<Self, BuildError> {
        let mut index = ClusterIndex {
            commands: ItemTable::default(),
            responses: ItemTable::default(),
            attributes: ItemTable::default(),
            events: ItemTable::default(),
            bitmaps: NamedTable::default(),
            enums: NamedTable::default(),
            structs: NamedTable::default(),
            cluster,
        };
        let cluster = &index.cluster;
        let name = cluster.name.as_str();
        let collision = move |kind| Collision { policy, cluster: name, kind };

        for (i, command) in cluster.commands.iter().enumerate() {
            index.commands.insert(
                command.code,
                &command.name,
                i,
                |old| cluster.commands.get(old).map(|c| c.name.clone()),
                &collision(ItemKind::Command),
            )?;
        }
        for (i, attribute) in cluster.attributes.iter().enumerate() {
            index.attributes.insert(
                attribute.code(),
                attribute.name(),
                i,
                |old| cluster.attributes.get(old).map(|a| a.name().to_string()),
                &collision(ItemKind::Attribute),
            )?;
        }
        for (i, event) in cluster.events.iter().enumerate() {
            index.events.insert(
                event.code,
                &event.name,
                i,
                |old| cluster.events.get(old).map(|e| e.name.clone()),
                &collision(ItemKind::Event),
            )?;
        }
        for (i, bitmap) in cluster.bitmaps.iter().enumerate() {
            index.bitmaps.insert(&bitmap.name, i, &collision(ItemKind::Bitmap))?;
        }
        for (i, e) in cluster.enums.iter().enumerate() {
            index.enums.insert(&e.name, i, &collision(ItemKind::Enum))?;
        }
        for (i, s) in cluster.structs.iter().enumerate() {
            index.structs.insert(&s.name, i, &collision(ItemKind::Struct))?;
            if let Some(code) = s.response_code() {
                index.responses.insert(
                    code,
                    &s.name,
                    i,
                    |old| cluster.structs.get(old).map(|s| s.name.clone()),
                    &collision(ItemKind::Response),
                )?;
            }
        }

        Ok(index)
    }
}

/// Looks up one type kind by name, as part of [`TYPE_RESOLVERS`].
type TypeResolver = for<'a> fn(
    &'a SpecDefinitions,
    &str,
    &str,
) -> Result<Option<TypeDefinition<'a>>, LookupError>;

fn bitmap_type<'a>(
    definitions: &'a SpecDefinitions,
    cluster_name: &str,
    name: &str,
) -> Result<Option<TypeDefinition<'a>>, LookupError> {
    Ok(definitions
        .get_bitmap_by_name(cluster_name, name)?
        .map(TypeDefinition::Bitmap))
}

fn enum_type<'a>(
    definitions: &'a SpecDefinitions,
    cluster_name: &str,
    name: &str,
) -> Result<Option<TypeDefinition<'a>>, LookupError> {
    Ok(definitions
        .get_enum_by_name(cluster_name, name)?
        .map(TypeDefinition::Enum))
}

fn struct_type<'a>(
    definitions: &'a SpecDefinitions,
    cluster_name: &str,
    name: &str,
) -> Result<Option<TypeDefinition<'a>>, LookupError> {
    Ok(definitions
        .get_struct_by_name(cluster_name, name)?
        .map(TypeDefinition::Struct))
}

/// Type kinds in the order `get_type_by_name` tries them.
const TYPE_RESOLVERS: [TypeResolver; 3] = [bitmap_type, enum_type, struct_type];

/// A read-only index over parsed cluster definitions.
///
/// `SpecDefinitions` resolves clusters and their items in both directions:
/// - from a numeric `(cluster code, item code)` pair to the item's name
/// - from a `(cluster name, item name)` pair to the item itself
///
/// By-id lookups return `None` for unknown codes. By-name lookups return
/// `Ok(None)` for unknown names and fail with
/// [`LookupError::AmbiguousCasing`] when the requested item name only
/// differs from a known name in letter case.
///
/// The index is built once and never changes afterwards, so a shared
/// reference can be read from any number of threads.
///
/// # Examples
///
/// ```
/// use spec_definitions::{Cluster, Command, CommandQuality, SpecDefinitions};
///
/// let mut on_off = Cluster::new(6, "OnOff");
/// on_off.commands.push(Command {
///     code: 0,
///     name: "Off".to_string(),
///     input_param: None,
///     output_param: None,
///     qualities: CommandQuality::empty(),
/// });
///
/// let definitions = SpecDefinitions::from_clusters([on_off]).unwrap();
///
/// assert_eq!(definitions.get_cluster_name(6), Some("OnOff"));
/// assert_eq!(definitions.get_command_name(6, 0), Some("Off"));
///
/// let off = definitions.get_command_by_name("On Off", "Off").unwrap();
/// assert_eq!(off.map(|c| c.code), Some(0));
///
/// // Wrong case is an error naming the correct spelling.
/// assert!(definitions.get_command_by_name("OnOff", "off").is_err());
///
/// // Unknown names and codes are simply absent.
/// assert!(definitions.get_command_by_name("OnOff", "Blink").unwrap().is_none());
/// assert_eq!(definitions.get_cluster_name(9999), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SpecDefinitions {
    clusters_by_code: BTreeMap<u32, ClusterIndex>,
    cluster_codes_by_name: BTreeMap<String, u32>,
}

impl SpecDefinitions {
    /// Parses `sources` in order and builds an index with the default
    /// [`CollisionPolicy`].
    ///
    /// Any parser failure is returned unchanged as
    /// [`Error::Parse`](crate::Error::Parse) and no index is built.
    pub fn new<I>(sources: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = ParseSource>,
    {
        Self::with_policy(sources, CollisionPolicy::default())
    }

    /// Like [`SpecDefinitions::new`], with an explicit collision policy.
    pub fn with_policy<I>(
        sources: I,
        policy: CollisionPolicy,
    ) -> crate::Result<Self>
    where
        I: IntoIterator<Item = ParseSource>,
    {
        let clusters = parse_sources(sources)?;
        Ok(Self::from_clusters_with_policy(clusters, policy)?)
    }

    /// Builds an index from already-parsed clusters with the default
    /// [`CollisionPolicy::Overwrite`], which never fails.
    pub fn from_clusters<T>(clusters: T) -> Result<Self, BuildError>
    where
        T: IntoIterator<Item = Cluster>,
    {
        Self::from_clusters_with_policy(clusters, CollisionPolicy::default())
    }

    /// Builds an index from already-parsed clusters in a single pass.
    ///
    /// Clusters are taken as the final, merged list: nothing is re-merged.
    /// Under [`CollisionPolicy::Overwrite`] a later cluster with the code or
    /// name of an earlier one replaces it.
    pub fn from_clusters_with_policy<T>(
        clusters: T,
        policy: CollisionPolicy,
    ) -> Result<Self, BuildError>
    where
        T: IntoIterator<Item = Cluster>,
    {
        let mut definitions = Self::default();
        for cluster in clusters {
            definitions.insert_cluster(cluster, policy)?;
        }
        debug!(
            clusters = definitions.clusters_by_code.len(),
            ?policy,
            "indexed specification clusters"
        );
        Ok(definitions)
    }

    fn insert_cluster(
        &mut self,
        cluster: Cluster,
        policy: CollisionPolicy,
    ) -> Result<(), BuildError> {
        let code = cluster.code;
        let name = cluster.name.clone();

        if let Some(existing) = self.clusters_by_code.get(&code) {
            if policy == CollisionPolicy::Reject {
                return Err(BuildError::DuplicateClusterCode {
                    code,
                    existing: existing.cluster.name.clone(),
                    name,
                });
            }
            debug!(code, existing = %existing.cluster.name, %name, "overwriting cluster");
            let old_name = existing.cluster.name.clone();
            if self.cluster_codes_by_name.get(&old_name) == Some(&code) {
                self.cluster_codes_by_name.remove(&old_name);
            }
        }
        if let Some(&existing) = self.cluster_codes_by_name.get(&name) {
            if policy == CollisionPolicy::Reject {
                return Err(BuildError::DuplicateClusterName {
                    name,
                    existing,
                    code,
                });
            }
            debug!(%name, existing, code, "overwriting cluster name");
        }

        let index = ClusterIndex::build(cluster, policy)?;
        self.clusters_by_code.insert(code, index);
        self.cluster_codes_by_name.insert(name, code);
        Ok(())
    }

    /// Returns the number of indexed clusters.
    pub fn len(&self) -> usize { self.clusters_by_code.len() }

    /// Returns true if no cluster was indexed.
    pub fn is_empty(&self) -> bool { self.clusters_by_code.is_empty() }

    /// Iterates over the indexed clusters in code order.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters_by_code.values().map(|index| &index.cluster)
    }

    /// Returns the cluster with the given code, with all of its items.
    pub fn cluster(&self, cluster_code: u32) -> Option<&Cluster> {
        self.clusters_by_code
            .get(&cluster_code)
            .map(|index| &index.cluster)
    }

    /// Resolves a cluster name (whitespace is ignored) to its code.
    pub fn cluster_code(&self, cluster_name: &str) -> Option<u32> {
        self.cluster_codes_by_name
            .get(&normalize_cluster_name(cluster_name))
            .copied()
    }

    /// Returns the name of a cluster, or `None` for an unknown code.
    ///
    /// # Examples
    ///
    /// ```
    /// use spec_definitions::{Cluster, SpecDefinitions};
    ///
    /// let definitions =
    ///     SpecDefinitions::from_clusters([Cluster::new(6, "OnOff")]).unwrap();
    ///
    /// assert_eq!(definitions.get_cluster_name(6), Some("OnOff"));
    /// assert_eq!(definitions.get_cluster_name(9999), None);
    /// ```
    pub fn get_cluster_name(&self, cluster_code: u32) -> Option<&str> {
        self.cluster(cluster_code).map(|cluster| cluster.name.as_str())
    }

    /// Returns the command with `command_code` in cluster `cluster_code`.
    pub fn get_command(
        &self,
        cluster_code: u32,
        command_code: u32,
    ) -> Option<&Command> {
        self.by_code(cluster_code, command_code, |index| {
            (&index.commands, index.cluster.commands.as_slice())
        })
    }

    /// Returns the response struct with `response_code` in cluster
    /// `cluster_code`. Plain structs are never returned.
    pub fn get_response(
        &self,
        cluster_code: u32,
        response_code: u32,
    ) -> Option<&Struct> {
        self.by_code(cluster_code, response_code, |index| {
            (&index.responses, index.cluster.structs.as_slice())
        })
    }

    /// Returns the attribute with `attribute_code` in cluster
    /// `cluster_code`.
    pub fn get_attribute(
        &self,
        cluster_code: u32,
        attribute_code: u32,
    ) -> Option<&Attribute> {
        self.by_code(cluster_code, attribute_code, |index| {
            (&index.attributes, index.cluster.attributes.as_slice())
        })
    }

    /// Returns the event with `event_code` in cluster `cluster_code`.
    pub fn get_event(&self, cluster_code: u32, event_code: u32) -> Option<&Event> {
        self.by_code(cluster_code, event_code, |index| {
            (&index.events, index.cluster.events.as_slice())
        })
    }

    /// Returns the name of a command, or `None` if either code is unknown.
    pub fn get_command_name(
        &self,
        cluster_code: u32,
        command_code: u32,
    ) -> Option<&str> {
        self.get_command(cluster_code, command_code)
            .map(|command| command.name.as_str())
    }

    /// Returns the name of a response, or `None` if either code is unknown.
    pub fn get_response_name(
        &self,
        cluster_code: u32,
        response_code: u32,
    ) -> Option<&str> {
        self.get_response(cluster_code, response_code)
            .map(|response| response.name.as_str())
    }

    /// Returns the name of an attribute, or `None` if either code is
    /// unknown.
    ///
    /// # Examples
    ///
    /// ```
    /// use spec_definitions::{ParseSource, SpecDefinitions};
    ///
    /// let json = r#"{"clusters": [{
    ///     "code": 8,
    ///     "name": "LevelControl",
    ///     "attributes": [{"definition": {"code": 0, "name": "CurrentLevel"}}]
    /// }]}"#;
    /// let definitions =
    ///     SpecDefinitions::new([ParseSource::from_document("level.json", json)])
    ///         .unwrap();
    ///
    /// assert_eq!(definitions.get_attribute_name(8, 0), Some("CurrentLevel"));
    /// assert_eq!(definitions.get_attribute_name(8, 1), None);
    /// ```
    pub fn get_attribute_name(
        &self,
        cluster_code: u32,
        attribute_code: u32,
    ) -> Option<&str> {
        self.get_attribute(cluster_code, attribute_code)
            .map(Attribute::name)
    }

    /// Returns the name of an event, or `None` if either code is unknown.
    pub fn get_event_name(
        &self,
        cluster_code: u32,
        event_code: u32,
    ) -> Option<&str> {
        self.get_event(cluster_code, event_code)
            .map(|event| event.name.as_str())
    }

    /// Looks up a command by cluster name and command name.
    ///
    /// Returns `Ok(None)` if the cluster or the command is unknown, and
    /// [`LookupError::AmbiguousCasing`] if the command name only matches a
    /// known command when case is ignored.
    pub fn get_command_by_name(
        &self,
        cluster_name: &str,
        command_name: &str,
    ) -> Result<Option<&Command>, LookupError> {
        self.by_name(cluster_name, command_name, |index| {
            (&index.commands, index.cluster.commands.as_slice())
        })
    }

    /// Looks up a response struct by cluster name and response name.
    ///
    /// Responses are matched only against other responses, so a plain
    /// struct of the same name is not found here.
    pub fn get_response_by_name(
        &self,
        cluster_name: &str,
        response_name: &str,
    ) -> Result<Option<&Struct>, LookupError> {
        self.by_name(cluster_name, response_name, |index| {
            (&index.responses, index.cluster.structs.as_slice())
        })
    }

    /// Looks up an attribute by cluster name and attribute name.
    pub fn get_attribute_by_name(
        &self,
        cluster_name: &str,
        attribute_name: &str,
    ) -> Result<Option<&Attribute>, LookupError> {
        self.by_name(cluster_name, attribute_name, |index| {
            (&index.attributes, index.cluster.attributes.as_slice())
        })
    }

    /// Looks up an event by cluster name and event name.
    pub fn get_event_by_name(
        &self,
        cluster_name: &str,
        event_name: &str,
    ) -> Result<Option<&Event>, LookupError> {
        self.by_name(cluster_name, event_name, |index| {
            (&index.events, index.cluster.events.as_slice())
        })
    }

    /// Looks up a bitmap by cluster name and bitmap name.
    pub fn get_bitmap_by_name(
        &self,
        cluster_name: &str,
        bitmap_name: &str,
    ) -> Result<Option<&Bitmap>, LookupError> {
        self.by_name(cluster_name, bitmap_name, |index| {
            (&index.bitmaps, index.cluster.bitmaps.as_slice())
        })
    }

    /// Looks up an enum by cluster name and enum name.
    pub fn get_enum_by_name(
        &self,
        cluster_name: &str,
        enum_name: &str,
    ) -> Result<Option<&Enum>, LookupError> {
        self.by_name(cluster_name, enum_name, |index| {
            (&index.enums, index.cluster.enums.as_slice())
        })
    }

    /// Looks up a struct by name. Response structs are found here too.
    pub fn get_struct_by_name(
        &self,
        cluster_name: &str,
        struct_name: &str,
    ) -> Result<Option<&Struct>, LookupError> {
        self.by_name(cluster_name, struct_name, |index| {
            (&index.structs, index.cluster.structs.as_slice())
        })
    }

    /// Looks up a named type, trying bitmaps, then enums, then structs.
    ///
    /// The first kind that knows `type_name` wins. A casing error from an
    /// earlier kind stops the search.
    ///
    /// # Examples
    ///
    /// ```
    /// use spec_definitions::{ParseSource, SpecDefinitions, TypeDefinition};
    ///
    /// let json = r#"{"clusters": [{
    ///     "code": 8,
    ///     "name": "LevelControl",
    ///     "bitmaps": [{"name": "Options"}],
    ///     "structs": [{"name": "Options"}, {"name": "Transition"}]
    /// }]}"#;
    /// let definitions =
    ///     SpecDefinitions::new([ParseSource::from_document("level.json", json)])
    ///         .unwrap();
    ///
    /// let options = definitions.get_type_by_name("LevelControl", "Options");
    /// assert!(matches!(options, Ok(Some(TypeDefinition::Bitmap(_)))));
    ///
    /// let transition = definitions.get_type_by_name("LevelControl", "Transition");
    /// assert!(matches!(transition, Ok(Some(TypeDefinition::Struct(_)))));
    /// ```
    pub fn get_type_by_name(
        &self,
        cluster_name: &str,
        type_name: &str,
    ) -> Result<Option<TypeDefinition<'_>>, LookupError> {
        for resolve in TYPE_RESOLVERS {
            if let Some(found) = resolve(self, cluster_name, type_name)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Returns true if `target` carries qualities and is fabric-scoped.
    ///
    /// Record kinds without qualities (clusters, events, bitmaps, enums)
    /// are never fabric-scoped.
    pub fn is_fabric_scoped<'a>(&self, target: impl Into<Entity<'a>>) -> bool {
        target
            .into()
            .qualities()
            .is_some_and(|qualities| qualities.is_fabric_scoped())
    }

    /// Returns true if `target` carries field qualities and is nullable.
    pub fn is_nullable<'a>(&self, target: impl Into<Entity<'a>>) -> bool {
        target
            .into()
            .qualities()
            .is_some_and(|qualities| qualities.is_nullable())
    }

    fn by_code<'a, T>(
        &'a self,
        cluster_code: u32,
        code: u32,
        table: impl FnOnce(&'a ClusterIndex) -> (&'a ItemTable, &'a [T]),
    ) -> Option<&'a T> {
        let index = self.clusters_by_code.get(&cluster_code)?;
        let (table, items) = table(index);
        table.position_of_code(code).and_then(|i| items.get(i))
    }

    fn cluster_index_named(&self, cluster_name: &str) -> Option<&ClusterIndex> {
        let code = self.cluster_code(cluster_name)?;
        self.clusters_by_code.get(&code)
    }

    fn by_name<'a, N, T>(
        &'a self,
        cluster_name: &str,
        item_name: &str,
        table: impl FnOnce(&'a ClusterIndex) -> (&'a N, &'a [T]),
    ) -> Result<Option<&'a T>, LookupError>
    where
        N: NameTable + 'a,
    {
        if cluster_name.is_empty() || item_name.is_empty() {
            return Ok(None);
        }
        let Some(index) = self.cluster_index_named(cluster_name) else {
            return Ok(None);
        };

        let (table, items) = table(index);
        enforce_casing(item_name, table)?;
        Ok(table.position(item_name).and_then(|i| items.get(i)))
    }
}
