//! Dialect operation pre-processing.
//!
//! The generic dialect passes the canonical operation stream through
//! unchanged. Restricted dialects rewrite it into an executable plan; see
//! [sqlite].

pub(crate) mod sqlite;

use crate::{flavour::SqlFlavour, names};
use schema_model::{EntityWalker, QualifiedName, SchemaModel};

/// Find the entity whose resolved relational name equals `table`.
pub(crate) fn find_entity_by_table_name<'a>(
    model: &'a SchemaModel,
    table: &QualifiedName,
    flavour: &dyn SqlFlavour,
) -> Option<EntityWalker<'a>> {
    model
        .entity_walkers()
        .find(|entity| &names::full_table_name(*entity, flavour) == table)
}
