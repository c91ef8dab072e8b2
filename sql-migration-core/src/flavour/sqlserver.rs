use super::{SqlFlavour, TypeMapper};
use schema_model::{PrimitiveKind, PropertyWalker};

#[derive(Debug)]
pub(crate) struct SqlServerFlavour;

impl TypeMapper for SqlServerFlavour {
    fn column_type(&self, property: PropertyWalker<'_>) -> String {
        if let Some(store_type) = property.store_type() {
            return store_type.to_owned();
        }

        let mapped = match property.kind() {
            PrimitiveKind::Bool => "bit",
            PrimitiveKind::Byte => "tinyint",
            PrimitiveKind::SByte | PrimitiveKind::Short => "smallint",
            PrimitiveKind::Int | PrimitiveKind::UShort | PrimitiveKind::Char => "int",
            PrimitiveKind::Long | PrimitiveKind::UInt => "bigint",
            PrimitiveKind::ULong => "numeric(20,0)",
            PrimitiveKind::Float => "real",
            PrimitiveKind::Double => "float",
            PrimitiveKind::Decimal => "decimal(18,2)",
            PrimitiveKind::DateTime => "datetime2",
            PrimitiveKind::DateTimeOffset => "datetimeoffset",
            PrimitiveKind::TimeSpan => "time",
            PrimitiveKind::Guid => "uniqueidentifier",
            PrimitiveKind::Text => {
                return match (property.max_length(), property.is_part_of_key()) {
                    (Some(len), _) => format!("nvarchar({})", len),
                    (None, true) => "nvarchar(128)".to_owned(),
                    (None, false) => "nvarchar(max)".to_owned(),
                }
            }
            PrimitiveKind::Bytes => {
                // Concurrency tokens get the store-versioned type regardless
                // of any configured length.
                if property.is_concurrency_token() {
                    "rowversion"
                } else {
                    return match (property.max_length(), property.is_part_of_key()) {
                        (Some(len), _) => format!("varbinary({})", len),
                        (None, true) => "varbinary(128)".to_owned(),
                        (None, false) => "varbinary(max)".to_owned(),
                    };
                }
            }
        };

        mapped.to_owned()
    }

    fn sequence_type(&self, kind: PrimitiveKind) -> &'static str {
        match kind {
            PrimitiveKind::Byte => "tinyint",
            PrimitiveKind::Short => "smallint",
            PrimitiveKind::Int => "int",
            _ => "bigint",
        }
    }
}

impl SqlFlavour for SqlServerFlavour {
    fn default_schema(&self) -> Option<&'static str> {
        Some("dbo")
    }
}
