//! Abstract schema description. This crate is the input model of the
//! migration core: an immutable bundle of entity types with their
//! properties, keys, foreign keys, indexes and sequences.
//!
//! The model is stored as an arena of nodes addressed by typed ids, and
//! traversed through the copyable walker types in [walkers]. Foreign keys
//! reference other entities by id, never by pointer, so cyclic entity
//! graphs are representable without any sharing.

#![deny(rust_2018_idioms, unsafe_code)]

pub mod walkers;

mod ids;
mod value;

pub use ids::*;
pub use value::ValueLiteral;
pub use walkers::{
    EntityWalker, ForeignKeyWalker, IndexWalker, KeyWalker, PropertyWalker, SequenceWalker, Walker,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A schema-qualified name: an optional schema component and an object name.
///
/// Equality is case-sensitive and component-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: Option<&str>, name: &str) -> Self {
        QualifiedName {
            schema: schema.map(String::from),
            name: name.to_owned(),
        }
    }

    /// The `schema.name` form, or just `name` when no schema is set.
    pub fn dotted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// The primitive kind of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Bool,
    Byte,
    SByte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Char,
    Float,
    Double,
    Decimal,
    Text,
    Bytes,
    DateTime,
    DateTimeOffset,
    TimeSpan,
    Guid,
}

/// Referential action applied on delete of the principal row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForeignKeyAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

/// An entity type: the logical unit mapped to one relational table.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntityType {
    /// The logical name.
    pub name: String,
    /// The relational table name, when it differs from the logical name.
    pub table_name: Option<String>,
    /// The relational schema the table lives in.
    pub schema: Option<String>,
}

/// A scalar property of an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub kind: PrimitiveKind,
    /// The column name, when it differs from the property name.
    pub column_name: Option<String>,
    /// A storage type override. When set, the dialect type mapper is bypassed.
    pub store_type: Option<String>,
    pub is_nullable: bool,
    pub max_length: Option<u32>,
    pub is_concurrency_token: bool,
    /// Store-generated on insert (identity).
    pub is_generated_on_add: bool,
    /// Computed by the store on every access.
    pub is_store_computed: bool,
    pub default_value: Option<ValueLiteral>,
    /// A raw SQL default expression. Takes precedence over `default_value`.
    pub default_sql: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Property {
            name: name.into(),
            kind,
            column_name: None,
            store_type: None,
            is_nullable: false,
            max_length: None,
            is_concurrency_token: false,
            is_generated_on_add: false,
            is_store_computed: false,
            default_value: None,
            default_sql: None,
        }
    }
}

/// A primary or alternate key.
#[derive(Debug, Serialize, Deserialize)]
pub struct Key {
    pub(crate) entity_id: EntityId,
    pub name: Option<String>,
    pub is_primary: bool,
    pub properties: Vec<PropertyId>,
}

/// A foreign key constraint between two entity types.
#[derive(Debug, Serialize, Deserialize)]
pub struct ForeignKey {
    pub(crate) entity_id: EntityId,
    pub name: Option<String>,
    pub referenced_entity_id: EntityId,
    pub constrained_properties: Vec<PropertyId>,
    pub referenced_properties: Vec<PropertyId>,
    pub on_delete: ForeignKeyAction,
}

/// An index over an ordered list of properties.
#[derive(Debug, Serialize, Deserialize)]
pub struct Index {
    pub(crate) entity_id: EntityId,
    pub name: Option<String>,
    pub is_unique: bool,
    pub properties: Vec<PropertyId>,
}

/// A database sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    pub schema: Option<String>,
    pub kind: PrimitiveKind,
    pub start_value: i64,
    pub increment_by: i64,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

impl Sequence {
    pub fn new(name: impl Into<String>) -> Self {
        Sequence {
            name: name.into(),
            schema: None,
            kind: PrimitiveKind::Long,
            start_value: 1,
            increment_by: 1,
            min_value: None,
            max_value: None,
        }
    }
}

/// An immutable schema model, built once and then only read.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SchemaModel {
    pub(crate) entities: Vec<EntityType>,
    pub(crate) properties: Vec<(EntityId, Property)>,
    pub(crate) keys: Vec<Key>,
    pub(crate) foreign_keys: Vec<ForeignKey>,
    pub(crate) indexes: Vec<Index>,
    pub(crate) sequences: Vec<Sequence>,
}

impl SchemaModel {
    pub fn empty() -> SchemaModel {
        SchemaModel::default()
    }

    /// Add an entity type mapped to a table with the same name, in the
    /// default schema.
    pub fn push_entity(&mut self, name: impl Into<String>) -> EntityId {
        self.push_entity_with_table(name, None, None)
    }

    /// Add an entity type with an explicit table mapping.
    pub fn push_entity_with_table(
        &mut self,
        name: impl Into<String>,
        table_name: Option<&str>,
        schema: Option<&str>,
    ) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(EntityType {
            name: name.into(),
            table_name: table_name.map(String::from),
            schema: schema.map(String::from),
        });
        id
    }

    /// Add a property to an entity. Declaration order is preserved and
    /// drives column order in emitted DDL.
    pub fn push_property(&mut self, entity_id: EntityId, property: Property) -> PropertyId {
        let id = PropertyId(self.properties.len() as u32);
        self.properties.push((entity_id, property));
        id
    }

    /// Add the primary key of an entity.
    pub fn push_primary_key(
        &mut self,
        entity_id: EntityId,
        name: Option<String>,
        properties: Vec<PropertyId>,
    ) -> KeyId {
        let id = KeyId(self.keys.len() as u32);
        self.keys.push(Key {
            entity_id,
            name,
            is_primary: true,
            properties,
        });
        id
    }

    /// Add an alternate key to an entity.
    pub fn push_key(
        &mut self,
        entity_id: EntityId,
        name: Option<String>,
        properties: Vec<PropertyId>,
    ) -> KeyId {
        let id = KeyId(self.keys.len() as u32);
        self.keys.push(Key {
            entity_id,
            name,
            is_primary: false,
            properties,
        });
        id
    }

    pub fn push_foreign_key(
        &mut self,
        entity_id: EntityId,
        name: Option<String>,
        referenced_entity_id: EntityId,
        constrained_properties: Vec<PropertyId>,
        referenced_properties: Vec<PropertyId>,
        on_delete: ForeignKeyAction,
    ) -> ForeignKeyId {
        let id = ForeignKeyId(self.foreign_keys.len() as u32);
        self.foreign_keys.push(ForeignKey {
            entity_id,
            name,
            referenced_entity_id,
            constrained_properties,
            referenced_properties,
            on_delete,
        });
        id
    }

    pub fn push_index(
        &mut self,
        entity_id: EntityId,
        name: Option<String>,
        properties: Vec<PropertyId>,
        is_unique: bool,
    ) -> IndexId {
        let id = IndexId(self.indexes.len() as u32);
        self.indexes.push(Index {
            entity_id,
            name,
            is_unique,
            properties,
        });
        id
    }

    pub fn push_sequence(&mut self, sequence: Sequence) -> SequenceId {
        let id = SequenceId(self.sequences.len() as u32);
        self.sequences.push(sequence);
        id
    }

    /// Jump to the item identified by `id`.
    pub fn walk<I>(&self, id: I) -> Walker<'_, I> {
        Walker { model: self, id }
    }

    /// Traverse all entity types, in declaration order.
    pub fn entity_walkers(&self) -> impl ExactSizeIterator<Item = EntityWalker<'_>> {
        (0..self.entities.len()).map(move |idx| self.walk(EntityId(idx as u32)))
    }

    /// Traverse all sequences, in declaration order.
    pub fn sequence_walkers(&self) -> impl ExactSizeIterator<Item = SequenceWalker<'_>> {
        (0..self.sequences.len()).map(move |idx| self.walk(SequenceId(idx as u32)))
    }

    /// Find an entity type by logical name.
    pub fn find_entity(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .position(|entity| entity.name == name)
            .map(|idx| EntityId(idx as u32))
    }
}

impl std::ops::Index<EntityId> for SchemaModel {
    type Output = EntityType;

    fn index(&self, index: EntityId) -> &Self::Output {
        &self.entities[index.0 as usize]
    }
}

impl std::ops::Index<PropertyId> for SchemaModel {
    type Output = (EntityId, Property);

    fn index(&self, index: PropertyId) -> &Self::Output {
        &self.properties[index.0 as usize]
    }
}

impl std::ops::Index<KeyId> for SchemaModel {
    type Output = Key;

    fn index(&self, index: KeyId) -> &Self::Output {
        &self.keys[index.0 as usize]
    }
}

impl std::ops::Index<ForeignKeyId> for SchemaModel {
    type Output = ForeignKey;

    fn index(&self, index: ForeignKeyId) -> &Self::Output {
        &self.foreign_keys[index.0 as usize]
    }
}

impl std::ops::Index<IndexId> for SchemaModel {
    type Output = Index;

    fn index(&self, index: IndexId) -> &Self::Output {
        &self.indexes[index.0 as usize]
    }
}

impl std::ops::Index<SequenceId> for SchemaModel {
    type Output = Sequence;

    fn index(&self, index: SequenceId) -> &Self::Output {
        &self.sequences[index.0 as usize]
    }
}
