//! Canonical name derivation.
//!
//! Every function returns the explicitly configured name when the metadata
//! supplies one and synthesizes the convention-based name otherwise. All
//! functions are pure.

use crate::flavour::SqlFlavour;
use crate::sql_generator::common::IteratorJoin;
use schema_model::{
    EntityWalker, ForeignKeyWalker, IndexWalker, KeyWalker, PropertyWalker, QualifiedName,
    SequenceWalker,
};

pub(crate) fn full_table_name(
    entity: EntityWalker<'_>,
    flavour: &dyn SqlFlavour,
) -> QualifiedName {
    QualifiedName {
        schema: table_schema(entity, flavour),
        name: table_name(entity).to_owned(),
    }
}

pub(crate) fn table_name(entity: EntityWalker<'_>) -> &str {
    entity.explicit_table_name().unwrap_or_else(|| entity.name())
}

pub(crate) fn table_schema(entity: EntityWalker<'_>, flavour: &dyn SqlFlavour) -> Option<String> {
    entity
        .explicit_schema()
        .map(ToOwned::to_owned)
        .or_else(|| flavour.default_schema().map(ToOwned::to_owned))
}

pub(crate) fn column_name(property: PropertyWalker<'_>) -> &str {
    property.explicit_column_name().unwrap_or_else(|| property.name())
}

/// `PK_<Table>` for primary keys, `AK_<Table>_<Cols>` for alternate keys.
pub(crate) fn key_name(key: KeyWalker<'_>) -> String {
    if let Some(name) = key.explicit_name() {
        return name.to_owned();
    }

    let table = table_name(key.entity());

    if key.is_primary() {
        format!("PK_{}", table)
    } else {
        format!("AK_{}_{}", table, key.properties().map(column_name).join("_"))
    }
}

/// `FK_<Table>_<ReferencedTable>_<Cols>`.
pub(crate) fn foreign_key_name(foreign_key: ForeignKeyWalker<'_>) -> String {
    if let Some(name) = foreign_key.explicit_name() {
        return name.to_owned();
    }

    format!(
        "FK_{}_{}_{}",
        table_name(foreign_key.entity()),
        table_name(foreign_key.referenced_entity()),
        foreign_key.constrained_properties().map(column_name).join("_"),
    )
}

/// `IX_<Table>_<Cols>`.
pub(crate) fn index_name(index: IndexWalker<'_>) -> String {
    if let Some(name) = index.explicit_name() {
        return name.to_owned();
    }

    format!(
        "IX_{}_{}",
        table_name(index.entity()),
        index.properties().map(column_name).join("_"),
    )
}

pub(crate) fn full_sequence_name(
    sequence: SequenceWalker<'_>,
    flavour: &dyn SqlFlavour,
) -> QualifiedName {
    QualifiedName {
        schema: sequence_schema(sequence, flavour),
        name: sequence_name(sequence).to_owned(),
    }
}

pub(crate) fn sequence_name(sequence: SequenceWalker<'_>) -> &str {
    sequence.name()
}

pub(crate) fn sequence_schema(
    sequence: SequenceWalker<'_>,
    flavour: &dyn SqlFlavour,
) -> Option<String> {
    sequence
        .schema()
        .map(ToOwned::to_owned)
        .or_else(|| flavour.default_schema().map(ToOwned::to_owned))
}
