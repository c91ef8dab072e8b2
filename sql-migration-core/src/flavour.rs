//! Dialect flavours. Each supported database backend is represented by one
//! unit struct that implements the type-mapping, pre-processing and SQL
//! generation traits, so the rest of the crate can stay dialect-agnostic
//! behind `&dyn SqlFlavour`.

mod sqlite;
mod sqlserver;

pub(crate) use sqlite::SqliteFlavour;
pub(crate) use sqlserver::SqlServerFlavour;

use crate::{
    error::CoreResult, operations::MigrationOperation, pair::Pair, sql_generator::SqlGenerator,
};
use schema_model::{PrimitiveKind, PropertyWalker, SchemaModel};

/// The target database dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    SqlServer,
    Sqlite,
}

impl Dialect {
    pub(crate) fn flavour(self) -> &'static dyn SqlFlavour {
        match self {
            Dialect::SqlServer => &SqlServerFlavour,
            Dialect::Sqlite => &SqliteFlavour,
        }
    }
}

/// Maps logical properties to dialect storage types.
///
/// The mapping is total over the primitive-kind × (is-key,
/// is-concurrency-token) matrix; an explicit storage-type override on the
/// property bypasses the mapper.
pub(crate) trait TypeMapper {
    fn column_type(&self, property: PropertyWalker<'_>) -> String;

    /// The storage type of a sequence with the given numeric kind.
    fn sequence_type(&self, kind: PrimitiveKind) -> &'static str;
}

/// Everything the pipeline needs from a dialect.
pub(crate) trait SqlFlavour: TypeMapper + SqlGenerator {
    /// The schema objects land in when the model does not name one.
    fn default_schema(&self) -> Option<&'static str> {
        None
    }

    /// Rewrite the canonical operation stream into a dialect-legal execution
    /// plan. The default is a pass-through.
    fn preprocess(
        &self,
        operations: Vec<MigrationOperation>,
        _models: Pair<&SchemaModel>,
    ) -> CoreResult<Vec<MigrationOperation>> {
        Ok(operations)
    }
}
