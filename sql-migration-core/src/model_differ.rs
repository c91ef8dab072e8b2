//! The model differ.
//!
//! Pairs entities, properties, keys, foreign keys, indexes and sequences
//! across two schema models and emits the logical operation stream that
//! evolves the source model into the target model. The differ never fails:
//! constructs it cannot pair or express produce no operation.

mod entity;
mod renames;

use crate::{
    flavour::SqlFlavour,
    names,
    operation_factory::OperationFactory,
    operations::{MigrationOperation, OperationCollection},
    pair::Pair,
};
use entity::EntityDiffer;
use schema_model::{EntityId, EntityWalker, PropertyId, PropertyWalker, SchemaModel};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

/// The property-set overlap two unpaired entity types must reach to be
/// considered the same entity under a new name.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.8;

/// Reserved name prefix marking temporary objects of in-flight migrations.
pub(crate) const TEMP_NAME_PREFIX: &str = "__mig_tmp__";

/// A cooperative cancellation signal.
///
/// When cancelled, the differ stops emitting further operations at the next
/// collection boundary and returns what has been produced so far.
#[derive(Debug, Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

pub(crate) fn calculate_operations(
    models: Pair<&SchemaModel>,
    flavour: &dyn SqlFlavour,
    cancellation: &CancellationToken,
) -> Vec<MigrationOperation> {
    let differ = ModelDiffer { models, flavour };
    let factory = OperationFactory::new(flavour);
    let mut collection = OperationCollection::default();

    let entity_pairs = differ.entity_pairs();
    let property_map = differ.property_map(&entity_pairs);

    if !cancellation.is_cancelled() {
        differ.push_sequence_operations(&factory, &mut collection);
    }

    if !cancellation.is_cancelled() {
        differ.push_table_scope_operations(&entity_pairs, &factory, &mut collection);
    }

    for pair in &entity_pairs {
        if cancellation.is_cancelled() {
            break;
        }

        EntityDiffer {
            flavour,
            entities: *pair,
            property_map: &property_map,
        }
        .push_operations(&factory, &mut collection);
    }

    let mut temp_name_counter = 0;
    renames::resolve_transitive_renames(&mut collection, &mut temp_name_counter);

    collection.into_ordered()
}

struct ModelDiffer<'a> {
    models: Pair<&'a SchemaModel>,
    flavour: &'a dyn SqlFlavour,
}

impl<'a> ModelDiffer<'a> {
    /// Pair source and target entities: first by equal logical name, then
    /// fuzzily over the remainders by property-set overlap. An entity
    /// appears in at most one pair.
    fn entity_pairs(&self) -> Vec<Pair<EntityWalker<'a>>> {
        let source_model: &'a SchemaModel = *self.models.previous();
        let target_model: &'a SchemaModel = *self.models.next();

        let mut pairs = Vec::new();
        let mut paired_sources: HashSet<EntityId> = HashSet::new();
        let mut paired_targets: HashSet<EntityId> = HashSet::new();

        for source in source_model.entity_walkers() {
            let simple_match = target_model
                .entity_walkers()
                .find(|target| !paired_targets.contains(&target.id) && target.name() == source.name());

            if let Some(target) = simple_match {
                paired_sources.insert(source.id);
                paired_targets.insert(target.id);
                pairs.push(Pair::new(source, target));
            }
        }

        for source in source_model
            .entity_walkers()
            .filter(|source| !paired_sources.contains(&source.id))
        {
            let mut best: Option<(EntityWalker<'a>, f64)> = None;

            for target in target_model
                .entity_walkers()
                .filter(|target| !paired_targets.contains(&target.id))
            {
                let score = property_overlap(source, target);

                // Ties break by first-found in source order: only a strictly
                // better score displaces an earlier candidate.
                if score >= FUZZY_MATCH_THRESHOLD
                    && best.map(|(_, best_score)| score > best_score).unwrap_or(true)
                {
                    best = Some((target, score));
                }
            }

            if let Some((target, _)) = best {
                paired_targets.insert(target.id);
                pairs.push(Pair::new(source, target));
            }
        }

        pairs
    }

    /// The global source-property → target-property map used by the
    /// structural equivalence predicates.
    fn property_map(&self, entity_pairs: &[Pair<EntityWalker<'a>>]) -> HashMap<PropertyId, PropertyId> {
        let mut map = HashMap::new();

        for pair in entity_pairs {
            for property_pair in pair_properties(*pair) {
                map.insert(property_pair.previous().id, property_pair.next().id);
            }
        }

        map
    }

    /// Sequences pair by exact (name, schema) equality. Two paired sequences
    /// are equivalent iff they have the same increment.
    fn push_sequence_operations(
        &self,
        factory: &OperationFactory<'_>,
        collection: &mut OperationCollection,
    ) {
        let source_model: &'a SchemaModel = *self.models.previous();
        let target_model: &'a SchemaModel = *self.models.next();

        for source in source_model.sequence_walkers() {
            let paired = target_model.sequence_walkers().find(|target| {
                names::full_sequence_name(*target, self.flavour)
                    == names::full_sequence_name(source, self.flavour)
            });

            match paired {
                Some(target) => {
                    if source.increment_by() != target.increment_by() {
                        collection.push(factory.alter_sequence(target));
                    }
                }
                None => collection.push(factory.drop_sequence(source)),
            }
        }

        for target in target_model.sequence_walkers() {
            let is_new = !source_model.sequence_walkers().any(|source| {
                names::full_sequence_name(source, self.flavour)
                    == names::full_sequence_name(target, self.flavour)
            });

            if is_new {
                collection.push(factory.create_sequence(target));
            }
        }
    }

    fn push_table_scope_operations(
        &self,
        entity_pairs: &[Pair<EntityWalker<'a>>],
        factory: &OperationFactory<'_>,
        collection: &mut OperationCollection,
    ) {
        let source_model: &'a SchemaModel = *self.models.previous();
        let target_model: &'a SchemaModel = *self.models.next();

        let paired_sources: HashSet<EntityId> =
            entity_pairs.iter().map(|pair| pair.previous().id).collect();
        let paired_targets: HashSet<EntityId> =
            entity_pairs.iter().map(|pair| pair.next().id).collect();

        // Created tables come with their foreign keys inlined and their
        // indexes collected alongside.
        for target in target_model
            .entity_walkers()
            .filter(|target| !paired_targets.contains(&target.id))
        {
            collection.push(factory.create_table(target));

            for index in target.indexes() {
                collection.push(factory.create_index(index));
            }
        }

        for source in source_model
            .entity_walkers()
            .filter(|source| !paired_sources.contains(&source.id))
        {
            collection.push(factory.drop_table(source));
        }

        for pair in entity_pairs {
            let source_name = names::full_table_name(*pair.previous(), self.flavour);
            let target_name = names::full_table_name(*pair.next(), self.flavour);

            let mut current = source_name.clone();

            if source_name.schema != target_name.schema {
                if let Some(new_schema) = &target_name.schema {
                    collection.push(factory.move_table(current.clone(), new_schema));
                    current.schema = Some(new_schema.clone());
                }
            }

            if source_name.name != target_name.name {
                collection.push(factory.rename_table(current, &target_name.name));
            }
        }
    }
}

/// Pair the properties of two paired entities: first by property name, then,
/// among the unmatched, by column name.
pub(crate) fn pair_properties<'a>(entities: Pair<EntityWalker<'a>>) -> Vec<Pair<PropertyWalker<'a>>> {
    let mut pairs = Vec::new();
    let mut matched_targets: HashSet<PropertyId> = HashSet::new();

    for source in entities.previous().properties() {
        let by_name = entities
            .next()
            .properties()
            .find(|target| !matched_targets.contains(&target.id) && target.name() == source.name());

        if let Some(target) = by_name {
            matched_targets.insert(target.id);
            pairs.push(Pair::new(source, target));
        }
    }

    let matched_sources: HashSet<PropertyId> =
        pairs.iter().map(|pair| pair.previous().id).collect();

    for source in entities
        .previous()
        .properties()
        .filter(|source| !matched_sources.contains(&source.id))
    {
        let by_column = entities.next().properties().find(|target| {
            !matched_targets.contains(&target.id)
                && names::column_name(*target) == names::column_name(source)
        });

        if let Some(target) = by_column {
            matched_targets.insert(target.id);
            pairs.push(Pair::new(source, target));
        }
    }

    pairs
}

/// The share of properties two entities have in common, counted over the
/// mean of their property counts.
fn property_overlap(source: EntityWalker<'_>, target: EntityWalker<'_>) -> f64 {
    let denominator = (source.properties().count() + target.properties().count()) as f64 / 2.0;

    if denominator == 0.0 {
        return 0.0;
    }

    let matches = source
        .properties()
        .filter(|source_property| {
            target
                .properties()
                .any(|target_property| equivalent_properties(*source_property, target_property))
        })
        .count();

    matches as f64 / denominator
}

fn equivalent_properties(source: PropertyWalker<'_>, target: PropertyWalker<'_>) -> bool {
    source.name() == target.name() && source.kind() == target.kind()
}
