use super::{SqlFlavour, TypeMapper};
use crate::{error::CoreResult, operations::MigrationOperation, pair::Pair, preprocessor};
use schema_model::{PrimitiveKind, PropertyWalker, SchemaModel};

#[derive(Debug)]
pub(crate) struct SqliteFlavour;

impl TypeMapper for SqliteFlavour {
    fn column_type(&self, property: PropertyWalker<'_>) -> String {
        if let Some(store_type) = property.store_type() {
            return store_type.to_owned();
        }

        // SQLite types are affinity classes; length and key-ness do not
        // change the storage class.
        let mapped = match property.kind() {
            PrimitiveKind::Bool
            | PrimitiveKind::Byte
            | PrimitiveKind::SByte
            | PrimitiveKind::Short
            | PrimitiveKind::UShort
            | PrimitiveKind::Int
            | PrimitiveKind::UInt
            | PrimitiveKind::Long
            | PrimitiveKind::ULong
            | PrimitiveKind::Char => "INTEGER",
            PrimitiveKind::Float | PrimitiveKind::Double => "REAL",
            PrimitiveKind::Decimal
            | PrimitiveKind::Text
            | PrimitiveKind::DateTime
            | PrimitiveKind::DateTimeOffset
            | PrimitiveKind::TimeSpan
            | PrimitiveKind::Guid => "TEXT",
            PrimitiveKind::Bytes => "BLOB",
        };

        mapped.to_owned()
    }

    fn sequence_type(&self, _kind: PrimitiveKind) -> &'static str {
        "INTEGER"
    }
}

impl SqlFlavour for SqliteFlavour {
    fn preprocess(
        &self,
        operations: Vec<MigrationOperation>,
        models: Pair<&SchemaModel>,
    ) -> CoreResult<Vec<MigrationOperation>> {
        preprocessor::sqlite::preprocess(operations, models, self)
    }
}
