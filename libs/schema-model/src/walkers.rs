//! Functions and types for conveniently traversing and querying a
//! SchemaModel.

use crate::{
    EntityId, EntityType, ForeignKey, ForeignKeyAction, ForeignKeyId, Index, IndexId, Key, KeyId,
    PrimitiveKind, Property, PropertyId, SchemaModel, Sequence, SequenceId, ValueLiteral,
};

/// A generic reference to a schema item. It holds a reference to the model
/// so it can offer a convenient API based on the id type.
#[derive(Clone, Copy)]
pub struct Walker<'a, Id> {
    /// The identifier.
    pub id: Id,
    /// The model for which the identifier is valid.
    pub model: &'a SchemaModel,
}

impl<I: std::fmt::Debug> std::fmt::Debug for Walker<'_, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(std::any::type_name::<Self>())
            .field("id", &self.id)
            .finish()
    }
}

impl<'a, Id> Walker<'a, Id> {
    /// Jump to the item identified by `other_id`.
    pub fn walk<I>(self, other_id: I) -> Walker<'a, I> {
        self.model.walk(other_id)
    }
}

/// Traverse an entity type.
pub type EntityWalker<'a> = Walker<'a, EntityId>;

/// Traverse a property.
pub type PropertyWalker<'a> = Walker<'a, PropertyId>;

/// Traverse a key.
pub type KeyWalker<'a> = Walker<'a, KeyId>;

/// Traverse a foreign key.
pub type ForeignKeyWalker<'a> = Walker<'a, ForeignKeyId>;

/// Traverse an index.
pub type IndexWalker<'a> = Walker<'a, IndexId>;

/// Traverse a sequence.
pub type SequenceWalker<'a> = Walker<'a, SequenceId>;

impl<'a> EntityWalker<'a> {
    fn entity(self) -> &'a EntityType {
        &self.model[self.id]
    }

    /// The logical name of the entity type.
    pub fn name(self) -> &'a str {
        &self.entity().name
    }

    /// The explicitly configured table name, if any.
    pub fn explicit_table_name(self) -> Option<&'a str> {
        self.entity().table_name.as_deref()
    }

    /// The explicitly configured schema, if any.
    pub fn explicit_schema(self) -> Option<&'a str> {
        self.entity().schema.as_deref()
    }

    /// The entity's properties, in declaration order.
    pub fn properties(self) -> impl Iterator<Item = PropertyWalker<'a>> {
        let entity_id = self.id;
        let model = self.model;
        model
            .properties
            .iter()
            .enumerate()
            .filter(move |(_, (id, _))| *id == entity_id)
            .map(move |(idx, _)| model.walk(PropertyId(idx as u32)))
    }

    /// Find a property by logical name.
    pub fn find_property(self, name: &str) -> Option<PropertyWalker<'a>> {
        self.properties().find(|property| property.name() == name)
    }

    /// The primary key, if the entity has one.
    pub fn primary_key(self) -> Option<KeyWalker<'a>> {
        let entity_id = self.id;
        let model = self.model;
        model
            .keys
            .iter()
            .position(|key| key.entity_id == entity_id && key.is_primary)
            .map(|idx| model.walk(KeyId(idx as u32)))
    }

    /// The alternate keys of the entity.
    pub fn alternate_keys(self) -> impl Iterator<Item = KeyWalker<'a>> {
        let entity_id = self.id;
        let model = self.model;
        model
            .keys
            .iter()
            .enumerate()
            .filter(move |(_, key)| key.entity_id == entity_id && !key.is_primary)
            .map(move |(idx, _)| model.walk(KeyId(idx as u32)))
    }

    /// The foreign keys declared on this entity.
    pub fn foreign_keys(self) -> impl Iterator<Item = ForeignKeyWalker<'a>> {
        let entity_id = self.id;
        let model = self.model;
        model
            .foreign_keys
            .iter()
            .enumerate()
            .filter(move |(_, fk)| fk.entity_id == entity_id)
            .map(move |(idx, _)| model.walk(ForeignKeyId(idx as u32)))
    }

    /// The indexes declared on this entity.
    pub fn indexes(self) -> impl Iterator<Item = IndexWalker<'a>> {
        let entity_id = self.id;
        let model = self.model;
        model
            .indexes
            .iter()
            .enumerate()
            .filter(move |(_, index)| index.entity_id == entity_id)
            .map(move |(idx, _)| model.walk(IndexId(idx as u32)))
    }
}

impl<'a> PropertyWalker<'a> {
    /// A reference to the underlying Property struct.
    pub fn property(self) -> &'a Property {
        &self.model[self.id].1
    }

    fn entity_id(self) -> EntityId {
        self.model[self.id].0
    }

    /// Traverse to the property's entity type.
    pub fn entity(self) -> EntityWalker<'a> {
        self.walk(self.entity_id())
    }

    /// The logical property name.
    pub fn name(self) -> &'a str {
        &self.property().name
    }

    pub fn kind(self) -> PrimitiveKind {
        self.property().kind
    }

    /// The explicitly configured column name, if any.
    pub fn explicit_column_name(self) -> Option<&'a str> {
        self.property().column_name.as_deref()
    }

    /// The storage type override, if any.
    pub fn store_type(self) -> Option<&'a str> {
        self.property().store_type.as_deref()
    }

    pub fn is_nullable(self) -> bool {
        self.property().is_nullable
    }

    pub fn max_length(self) -> Option<u32> {
        self.property().max_length
    }

    pub fn is_concurrency_token(self) -> bool {
        self.property().is_concurrency_token
    }

    pub fn is_generated_on_add(self) -> bool {
        self.property().is_generated_on_add
    }

    pub fn is_store_computed(self) -> bool {
        self.property().is_store_computed
    }

    pub fn default_value(self) -> Option<&'a ValueLiteral> {
        self.property().default_value.as_ref()
    }

    pub fn default_sql(self) -> Option<&'a str> {
        self.property().default_sql.as_deref()
    }

    /// Is this property part of the entity's primary key?
    pub fn is_part_of_primary_key(self) -> bool {
        match self.entity().primary_key() {
            Some(pk) => pk.property_ids().contains(&self.id),
            None => false,
        }
    }

    /// Is this property part of any key or constrained by a foreign key?
    /// Dialect type mappers use this to pick key-sized storage types.
    pub fn is_part_of_key(self) -> bool {
        if self.is_part_of_primary_key() {
            return true;
        }

        let entity = self.entity();

        entity.alternate_keys().any(|key| key.property_ids().contains(&self.id))
            || entity
                .foreign_keys()
                .any(|fk| fk.fk().constrained_properties.contains(&self.id))
    }
}

impl<'a> KeyWalker<'a> {
    fn key(self) -> &'a Key {
        &self.model[self.id]
    }

    /// Traverse to the key's entity type.
    pub fn entity(self) -> EntityWalker<'a> {
        self.walk(self.key().entity_id)
    }

    /// The explicitly configured constraint name, if any.
    pub fn explicit_name(self) -> Option<&'a str> {
        self.key().name.as_deref()
    }

    pub fn is_primary(self) -> bool {
        self.key().is_primary
    }

    pub fn property_ids(self) -> &'a [PropertyId] {
        &self.key().properties
    }

    /// The key's properties, in key column order.
    pub fn properties(self) -> impl ExactSizeIterator<Item = PropertyWalker<'a>> {
        let model = self.model;
        self.key().properties.iter().map(move |id| model.walk(*id))
    }
}

impl<'a> ForeignKeyWalker<'a> {
    pub(crate) fn fk(self) -> &'a ForeignKey {
        &self.model[self.id]
    }

    /// Traverse to the dependent entity type.
    pub fn entity(self) -> EntityWalker<'a> {
        self.walk(self.fk().entity_id)
    }

    /// Traverse to the principal entity type.
    pub fn referenced_entity(self) -> EntityWalker<'a> {
        self.walk(self.fk().referenced_entity_id)
    }

    /// The explicitly configured constraint name, if any.
    pub fn explicit_name(self) -> Option<&'a str> {
        self.fk().name.as_deref()
    }

    pub fn constrained_properties(self) -> impl ExactSizeIterator<Item = PropertyWalker<'a>> {
        let model = self.model;
        self.fk().constrained_properties.iter().map(move |id| model.walk(*id))
    }

    pub fn referenced_properties(self) -> impl ExactSizeIterator<Item = PropertyWalker<'a>> {
        let model = self.model;
        self.fk().referenced_properties.iter().map(move |id| model.walk(*id))
    }

    pub fn constrained_property_ids(self) -> &'a [PropertyId] {
        &self.fk().constrained_properties
    }

    pub fn referenced_property_ids(self) -> &'a [PropertyId] {
        &self.fk().referenced_properties
    }

    pub fn on_delete(self) -> ForeignKeyAction {
        self.fk().on_delete
    }
}

impl<'a> IndexWalker<'a> {
    fn index(self) -> &'a Index {
        &self.model[self.id]
    }

    /// Traverse to the indexed entity type.
    pub fn entity(self) -> EntityWalker<'a> {
        self.walk(self.index().entity_id)
    }

    /// The explicitly configured index name, if any.
    pub fn explicit_name(self) -> Option<&'a str> {
        self.index().name.as_deref()
    }

    pub fn is_unique(self) -> bool {
        self.index().is_unique
    }

    pub fn property_ids(self) -> &'a [PropertyId] {
        &self.index().properties
    }

    /// The indexed properties, in index column order.
    pub fn properties(self) -> impl ExactSizeIterator<Item = PropertyWalker<'a>> {
        let model = self.model;
        self.index().properties.iter().map(move |id| model.walk(*id))
    }
}

impl<'a> SequenceWalker<'a> {
    /// A reference to the underlying Sequence struct.
    pub fn sequence(self) -> &'a Sequence {
        &self.model[self.id]
    }

    pub fn name(self) -> &'a str {
        &self.sequence().name
    }

    pub fn schema(self) -> Option<&'a str> {
        self.sequence().schema.as_deref()
    }

    pub fn kind(self) -> PrimitiveKind {
        self.sequence().kind
    }

    pub fn start_value(self) -> i64 {
        self.sequence().start_value
    }

    pub fn increment_by(self) -> i64 {
        self.sequence().increment_by
    }

    pub fn min_value(self) -> Option<i64> {
        self.sequence().min_value
    }

    pub fn max_value(self) -> Option<i64> {
        self.sequence().max_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ForeignKeyAction;
    use pretty_assertions::assert_eq;

    #[test]
    fn walkers_traverse_an_entity_graph() {
        let mut model = SchemaModel::empty();

        let parent = model.push_entity_with_table("Parent", None, Some("dbo"));
        let parent_id = model.push_property(parent, Property::new("Id", PrimitiveKind::Int));
        model.push_primary_key(parent, None, vec![parent_id]);

        let child = model.push_entity("Child");
        let child_id = model.push_property(child, Property::new("Id", PrimitiveKind::Int));
        let child_parent_id = model.push_property(child, Property::new("ParentId", PrimitiveKind::Int));
        model.push_primary_key(child, Some("PK_Child".into()), vec![child_id]);
        model.push_foreign_key(
            child,
            None,
            parent,
            vec![child_parent_id],
            vec![parent_id],
            ForeignKeyAction::Cascade,
        );
        model.push_index(child, None, vec![child_parent_id], false);

        let child = model.walk(child);
        assert_eq!(child.properties().count(), 2);
        assert_eq!(child.primary_key().unwrap().explicit_name(), Some("PK_Child"));

        let fk = child.foreign_keys().next().unwrap();
        assert_eq!(fk.referenced_entity().name(), "Parent");
        assert_eq!(fk.on_delete(), ForeignKeyAction::Cascade);
        assert!(model.walk(child_parent_id).is_part_of_key());
        assert!(!model.walk(child_parent_id).is_part_of_primary_key());

        let index = child.indexes().next().unwrap();
        assert_eq!(index.properties().next().unwrap().name(), "ParentId");
    }
}
