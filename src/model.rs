//! Value records for parsed cluster definitions.
//!
//! Everything in this module is plain data. Records are produced by the
//! [`parser`](crate::parser) (or built by hand) and are never mutated once
//! they have been handed to [`SpecDefinitions`](crate::SpecDefinitions).
//!
//! Qualities are `bitflags` sets. In documents they are written in the
//! bitflags text format, for example `"FABRIC_SCOPED | TIMED_INVOKE"`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Qualities attached to a field definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FieldQuality: u8 {
        const OPTIONAL = 1 << 0;
        const NULLABLE = 1 << 1;
        const FABRIC_SENSITIVE = 1 << 2;
    }
}

bitflags! {
    /// Qualities attached to an attribute, on top of its field definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct AttributeQuality: u8 {
        const READABLE = 1 << 0;
        const WRITABLE = 1 << 1;
        const NOSUBSCRIBE = 1 << 2;
        const TIMED_WRITE = 1 << 3;
    }
}

bitflags! {
    /// Qualities attached to a struct definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct StructQuality: u8 {
        const FABRIC_SCOPED = 1 << 0;
    }
}

bitflags! {
    /// Qualities attached to a command.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CommandQuality: u8 {
        const TIMED_INVOKE = 1 << 0;
        const FABRIC_SCOPED = 1 << 1;
    }
}

/// A typed, named field. Attributes, struct members and event payload
/// members are all fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub code: u32,
    pub name: String,
    /// Name of the data type, e.g. `boolean` or `LevelControlOptions`.
    #[serde(default, rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub is_list: bool,
    #[serde(default = "FieldQuality::empty")]
    pub qualities: FieldQuality,
}

/// A cluster attribute. The code and name live on the wrapped field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub definition: Field,
    #[serde(default = "AttributeQuality::empty")]
    pub qualities: AttributeQuality,
}

impl Attribute {
    pub fn code(&self) -> u32 { self.definition.code }

    pub fn name(&self) -> &str { &self.definition.name }
}

/// An invocable cluster command (a request).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub code: u32,
    pub name: String,
    /// Name of the request payload struct, if the command takes arguments.
    #[serde(default)]
    pub input_param: Option<String>,
    /// Name of the response struct, if the command answers with one.
    #[serde(default)]
    pub output_param: Option<String>,
    #[serde(default = "CommandQuality::empty")]
    pub qualities: CommandQuality,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EventPriority {
    Critical,
    #[default]
    Info,
    Debug,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub code: u32,
    pub name: String,
    #[serde(default)]
    pub priority: EventPriority,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A named value inside a bitmap or enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantEntry {
    pub name: String,
    pub code: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitmap {
    pub name: String,
    #[serde(default)]
    pub base_type: String,
    #[serde(default)]
    pub entries: Vec<ConstantEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    #[serde(default)]
    pub base_type: String,
    #[serde(default)]
    pub entries: Vec<ConstantEntry>,
}

/// Distinguishes plain structs from command response payloads.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StructTag {
    #[default]
    Regular,
    Response,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    /// Command code of a response struct. Plain structs have none.
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default)]
    pub tag: StructTag,
    #[serde(default = "StructQuality::empty")]
    pub qualities: StructQuality,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Struct {
    /// Returns the response code if this struct is a response payload.
    pub fn response_code(&self) -> Option<u32> {
        match self.tag {
            StructTag::Response => self.code,
            StructTag::Regular => None,
        }
    }
}

/// A cluster and everything it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub code: u32,
    pub name: String,
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

impl Cluster {
    /// Creates a cluster with no items.
    pub fn new(code: u32, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            commands: Vec::new(),
            attributes: Vec::new(),
            events: Vec::new(),
            bitmaps: Vec::new(),
            enums: Vec::new(),
            structs: Vec::new(),
        }
    }
}

/// Capability shared by the records that carry a qualities bitmask.
///
/// Only [`Struct`], [`Command`], [`Attribute`] and [`Field`] implement it.
/// Every other record kind has no qualities at all, which
/// [`Entity::qualities`] reports as `None`.
pub trait HasQualities {
    fn is_fabric_scoped(&self) -> bool;
    fn is_nullable(&self) -> bool;
}

impl HasQualities for Struct {
    fn is_fabric_scoped(&self) -> bool {
        self.qualities.contains(StructQuality::FABRIC_SCOPED)
    }

    fn is_nullable(&self) -> bool { false }
}

impl HasQualities for Command {
    fn is_fabric_scoped(&self) -> bool {
        self.qualities.contains(CommandQuality::FABRIC_SCOPED)
    }

    fn is_nullable(&self) -> bool { false }
}

impl HasQualities for Field {
    fn is_fabric_scoped(&self) -> bool { false }

    fn is_nullable(&self) -> bool {
        self.qualities.contains(FieldQuality::NULLABLE)
    }
}

impl HasQualities for Attribute {
    fn is_fabric_scoped(&self) -> bool { false }

    fn is_nullable(&self) -> bool { self.definition.is_nullable() }
}

/// A borrowed view of any record held by the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity<'a> {
    Cluster(&'a Cluster),
    Command(&'a Command),
    Response(&'a Struct),
    Attribute(&'a Attribute),
    Field(&'a Field),
    Event(&'a Event),
    Bitmap(&'a Bitmap),
    Enum(&'a Enum),
    Struct(&'a Struct),
}

impl<'a> Entity<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            Entity::Cluster(c) => &c.name,
            Entity::Command(c) => &c.name,
            Entity::Response(s) | Entity::Struct(s) => &s.name,
            Entity::Attribute(a) => a.name(),
            Entity::Field(f) => &f.name,
            Entity::Event(e) => &e.name,
            Entity::Bitmap(b) => &b.name,
            Entity::Enum(e) => &e.name,
        }
    }

    /// Returns the qualities capability, or `None` for record kinds that
    /// carry no qualities bitmask.
    pub fn qualities(&self) -> Option<&'a dyn HasQualities> {
        match *self {
            Entity::Command(c) => Some(c),
            Entity::Response(s) | Entity::Struct(s) => Some(s),
            Entity::Attribute(a) => Some(a),
            Entity::Field(f) => Some(f),
            Entity::Cluster(_)
            | Entity::Event(_)
            | Entity::Bitmap(_)
            | Entity::Enum(_) => None,
        }
    }
}

macro_rules! entity_from {
    ($($ty:ident),* $(,)?) => {
        $(
            impl<'a> From<&'a $ty> for Entity<'a> {
                fn from(value: &'a $ty) -> Self { Entity::$ty(value) }
            }
        )*
    };
}

entity_from!(Cluster, Command, Attribute, Field, Event, Bitmap, Enum, Struct);

/// The result of a type lookup: one of the three named type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDefinition<'a> {
    Bitmap(&'a Bitmap),
    Enum(&'a Enum),
    Struct(&'a Struct),
}

impl<'a> TypeDefinition<'a> {
    pub fn name(&self) -> &'a str {
        match *self {
            TypeDefinition::Bitmap(b) => &b.name,
            TypeDefinition::Enum(e) => &e.name,
            TypeDefinition::Struct(s) => &s.name,
        }
    }
}

impl<'a> From<TypeDefinition<'a>> for Entity<'a> {
    fn from(value: TypeDefinition<'a>) -> Self {
        match value {
            TypeDefinition::Bitmap(b) => Entity::Bitmap(b),
            TypeDefinition::Enum(e) => Entity::Enum(e),
            TypeDefinition::Struct(s) => Entity::Struct(s),
        }
    }
}
