use crate::{
    flavour::SqlFlavour,
    names,
    operation_factory::OperationFactory,
    operations::OperationCollection,
    pair::Pair,
};
use schema_model::{
    EntityWalker, ForeignKeyWalker, IndexWalker, KeyWalker, PropertyId, PropertyWalker,
};
use std::collections::{HashMap, HashSet};

/// Diffs one paired entity: columns, keys, foreign keys and indexes.
///
/// All emitted operations reference the target table name, since table moves
/// and renames precede them in the emission order.
pub(crate) struct EntityDiffer<'a, 'schema> {
    pub(crate) flavour: &'a dyn SqlFlavour,
    pub(crate) entities: Pair<EntityWalker<'schema>>,
    pub(crate) property_map: &'a HashMap<PropertyId, PropertyId>,
}

impl EntityDiffer<'_, '_> {
    pub(crate) fn push_operations(
        &self,
        factory: &OperationFactory<'_>,
        collection: &mut OperationCollection,
    ) {
        let property_pairs = super::pair_properties(self.entities);

        self.push_column_operations(&property_pairs, factory, collection);
        self.push_primary_key_operations(factory, collection);
        self.push_unique_constraint_operations(factory, collection);
        self.push_foreign_key_operations(factory, collection);
        self.push_index_operations(factory, collection);
    }

    fn push_column_operations(
        &self,
        property_pairs: &[Pair<PropertyWalker<'_>>],
        factory: &OperationFactory<'_>,
        collection: &mut OperationCollection,
    ) {
        let source_entity = *self.entities.previous();
        let target_entity = *self.entities.next();

        for pair in property_pairs {
            let source = *pair.previous();
            let target = *pair.next();

            let source_column = names::column_name(source);
            let target_column = names::column_name(target);

            if source_column != target_column {
                collection.push(factory.rename_column(target_entity, source_column, target_column));
            }

            let shape_changed = !self.column_shapes_match(source, target);
            let defaults_changed = source.default_value() != target.default_value()
                || source.default_sql() != target.default_sql();

            if shape_changed {
                // An attached default constraint blocks the alter; it is
                // dropped first and re-added for the new column shape.
                if has_default(source) {
                    collection.push(factory.drop_default_constraint(target_entity, target_column));
                }

                collection.push(factory.alter_column(target_entity, target));

                if has_default(target) {
                    collection.push(factory.add_default_constraint(target_entity, target));
                }
            } else if defaults_changed {
                if has_default(source) {
                    collection.push(factory.drop_default_constraint(target_entity, target_column));
                }

                if has_default(target) {
                    collection.push(factory.add_default_constraint(target_entity, target));
                }
            }
        }

        let matched_targets: HashSet<PropertyId> =
            property_pairs.iter().map(|pair| pair.next().id).collect();

        for target in target_entity
            .properties()
            .filter(|target| !matched_targets.contains(&target.id))
        {
            collection.push(factory.add_column(target_entity, target));
        }

        let matched_sources: HashSet<PropertyId> =
            property_pairs.iter().map(|pair| pair.previous().id).collect();

        for source in source_entity
            .properties()
            .filter(|source| !matched_sources.contains(&source.id))
        {
            if has_default(source) {
                collection
                    .push(factory.drop_default_constraint(target_entity, names::column_name(source)));
            }

            collection.push(factory.drop_column(target_entity, names::column_name(source)));
        }
    }

    fn push_primary_key_operations(
        &self,
        factory: &OperationFactory<'_>,
        collection: &mut OperationCollection,
    ) {
        let target_entity = *self.entities.next();

        match (self.entities.previous().primary_key(), target_entity.primary_key()) {
            (Some(source), Some(target)) if self.keys_match(source, target) => (),
            (Some(source), Some(target)) => {
                collection.push(factory.drop_primary_key(target_entity, source));
                collection.push(factory.add_primary_key(target));
            }
            (Some(source), None) => {
                collection.push(factory.drop_primary_key(target_entity, source));
            }
            (None, Some(target)) => {
                collection.push(factory.add_primary_key(target));
            }
            (None, None) => (),
        }
    }

    fn push_unique_constraint_operations(
        &self,
        factory: &OperationFactory<'_>,
        collection: &mut OperationCollection,
    ) {
        let source_entity = *self.entities.previous();
        let target_entity = *self.entities.next();

        for target in target_entity.alternate_keys() {
            if !source_entity.alternate_keys().any(|source| self.keys_match(source, target)) {
                collection.push(factory.add_unique_constraint(target));
            }
        }

        for source in source_entity.alternate_keys() {
            if !target_entity.alternate_keys().any(|target| self.keys_match(source, target)) {
                collection.push(factory.drop_unique_constraint(target_entity, source));
            }
        }
    }

    fn push_foreign_key_operations(
        &self,
        factory: &OperationFactory<'_>,
        collection: &mut OperationCollection,
    ) {
        let source_entity = *self.entities.previous();
        let target_entity = *self.entities.next();

        for target in target_entity.foreign_keys() {
            if !source_entity
                .foreign_keys()
                .any(|source| self.foreign_keys_match(source, target))
            {
                collection.push(factory.add_foreign_key(target));
            }
        }

        for source in source_entity.foreign_keys() {
            if !target_entity
                .foreign_keys()
                .any(|target| self.foreign_keys_match(source, target))
            {
                collection.push(factory.drop_foreign_key(target_entity, source));
            }
        }
    }

    fn push_index_operations(
        &self,
        factory: &OperationFactory<'_>,
        collection: &mut OperationCollection,
    ) {
        let source_entity = *self.entities.previous();
        let target_entity = *self.entities.next();

        for source in source_entity.indexes() {
            match target_entity.indexes().find(|target| self.indexes_match(source, *target)) {
                Some(target) => {
                    let source_name = names::index_name(source);
                    let target_name = names::index_name(target);

                    // Equivalent indexes under different names were renamed.
                    if source_name != target_name {
                        collection.push(factory.rename_index(
                            target_entity,
                            &source_name,
                            &target_name,
                        ));
                    }
                }
                None => collection.push(factory.drop_index(target_entity, source)),
            }
        }

        for target in target_entity.indexes() {
            if !source_entity.indexes().any(|source| self.indexes_match(source, target)) {
                collection.push(factory.create_index(target));
            }
        }
    }

    /// The column-shape half of the column equivalence predicate; defaults
    /// are compared separately because they migrate through the
    /// default-constraint operations.
    fn column_shapes_match(&self, source: PropertyWalker<'_>, target: PropertyWalker<'_>) -> bool {
        source.kind() == target.kind()
            && self.flavour.column_type(source) == self.flavour.column_type(target)
            && source.is_nullable() == target.is_nullable()
            && source.is_generated_on_add() == target.is_generated_on_add()
            && source.is_store_computed() == target.is_store_computed()
            && source.is_concurrency_token() == target.is_concurrency_token()
            && source.max_length() == target.max_length()
    }

    fn keys_match(&self, source: KeyWalker<'_>, target: KeyWalker<'_>) -> bool {
        names::key_name(source) == names::key_name(target)
            && self.property_lists_map(source.property_ids(), target.property_ids())
    }

    fn foreign_keys_match(
        &self,
        source: ForeignKeyWalker<'_>,
        target: ForeignKeyWalker<'_>,
    ) -> bool {
        names::foreign_key_name(source) == names::foreign_key_name(target)
            && self.property_lists_map(
                source.constrained_property_ids(),
                target.constrained_property_ids(),
            )
            && self.property_lists_map(
                source.referenced_property_ids(),
                target.referenced_property_ids(),
            )
    }

    fn indexes_match(&self, source: IndexWalker<'_>, target: IndexWalker<'_>) -> bool {
        source.is_unique() == target.is_unique()
            && self.property_lists_map(source.property_ids(), target.property_ids())
    }

    fn property_lists_map(&self, source: &[PropertyId], target: &[PropertyId]) -> bool {
        source.len() == target.len()
            && source
                .iter()
                .zip(target)
                .all(|(source_id, target_id)| self.property_map.get(source_id) == Some(target_id))
    }
}

fn has_default(property: PropertyWalker<'_>) -> bool {
    property.default_value().is_some() || property.default_sql().is_some()
}
