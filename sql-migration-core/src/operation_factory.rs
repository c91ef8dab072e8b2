//! Pure constructor service for migration operations.
//!
//! One method per operation kind. Each method snapshots the walkers it
//! receives into a value-typed operation, resolving names through the name
//! generator and column storage types through the dialect type mapper. The
//! factory never mutates its inputs and never consults a database.

use crate::{
    flavour::{Dialect, SqlFlavour},
    names,
    operations::{
        AddColumn, AddDefaultConstraint, AddForeignKey, AddPrimaryKey, AddUniqueConstraint,
        AlterColumn, AlterSequence, ColumnDefinition, CopyData, CreateDatabase, CreateIndex,
        CreateSequence, CreateTable, DropColumn, DropDatabase, DropDefaultConstraint,
        DropForeignKey, DropIndex, DropPrimaryKey, DropSequence, DropTable, DropUniqueConstraint,
        MigrationOperation, MoveSequence, MoveTable, RenameColumn, RenameIndex, RenameSequence,
        RenameTable,
    },
};
use schema_model::{
    EntityWalker, ForeignKeyWalker, IndexWalker, KeyWalker, PropertyWalker, QualifiedName,
    SequenceWalker,
};

pub struct OperationFactory<'a> {
    flavour: &'a dyn SqlFlavour,
}

impl<'a> OperationFactory<'a> {
    /// A factory resolving names and storage types for the given dialect.
    pub fn for_dialect(dialect: Dialect) -> OperationFactory<'static> {
        OperationFactory {
            flavour: dialect.flavour(),
        }
    }

    pub(crate) fn new(flavour: &'a dyn SqlFlavour) -> Self {
        OperationFactory { flavour }
    }

    pub fn create_database(&self, name: &str) -> MigrationOperation {
        MigrationOperation::CreateDatabase(CreateDatabase { name: name.to_owned() })
    }

    pub fn drop_database(&self, name: &str) -> MigrationOperation {
        MigrationOperation::DropDatabase(DropDatabase { name: name.to_owned() })
    }

    pub fn create_sequence(&self, sequence: SequenceWalker<'_>) -> MigrationOperation {
        MigrationOperation::CreateSequence(CreateSequence {
            sequence: names::full_sequence_name(sequence, self.flavour),
            store_type: self.flavour.sequence_type(sequence.kind()).to_owned(),
            start_value: sequence.start_value(),
            increment_by: sequence.increment_by(),
            min_value: sequence.min_value(),
            max_value: sequence.max_value(),
        })
    }

    pub fn drop_sequence(&self, sequence: SequenceWalker<'_>) -> MigrationOperation {
        MigrationOperation::DropSequence(DropSequence {
            sequence: names::full_sequence_name(sequence, self.flavour),
        })
    }

    pub fn move_sequence(
        &self,
        sequence: SequenceWalker<'_>,
        new_schema: &str,
    ) -> MigrationOperation {
        MigrationOperation::MoveSequence(MoveSequence {
            sequence: names::full_sequence_name(sequence, self.flavour),
            new_schema: new_schema.to_owned(),
        })
    }

    pub fn rename_sequence(
        &self,
        sequence: SequenceWalker<'_>,
        new_name: &str,
    ) -> MigrationOperation {
        MigrationOperation::RenameSequence(RenameSequence {
            sequence: names::full_sequence_name(sequence, self.flavour),
            new_name: new_name.to_owned(),
        })
    }

    /// Takes the target sequence; increment and bounds are snapshotted from it.
    pub fn alter_sequence(&self, sequence: SequenceWalker<'_>) -> MigrationOperation {
        MigrationOperation::AlterSequence(AlterSequence {
            sequence: names::full_sequence_name(sequence, self.flavour),
            increment_by: sequence.increment_by(),
            min_value: sequence.min_value(),
            max_value: sequence.max_value(),
        })
    }

    /// The create carries the full table shape: columns, primary key, unique
    /// constraints and foreign keys, all inline.
    pub fn create_table(&self, entity: EntityWalker<'_>) -> MigrationOperation {
        MigrationOperation::CreateTable(CreateTable {
            table: names::full_table_name(entity, self.flavour),
            columns: entity
                .properties()
                .map(|property| self.column_definition(property))
                .collect(),
            primary_key: entity.primary_key().map(|key| self.primary_key_fragment(key)),
            unique_constraints: entity
                .alternate_keys()
                .map(|key| self.unique_constraint_fragment(key))
                .collect(),
            foreign_keys: entity
                .foreign_keys()
                .map(|fk| self.foreign_key_fragment(fk))
                .collect(),
        })
    }

    pub fn drop_table(&self, entity: EntityWalker<'_>) -> MigrationOperation {
        MigrationOperation::DropTable(DropTable {
            table: names::full_table_name(entity, self.flavour),
        })
    }

    pub fn rename_table(&self, table: QualifiedName, new_name: &str) -> MigrationOperation {
        MigrationOperation::RenameTable(RenameTable {
            table,
            new_name: new_name.to_owned(),
        })
    }

    pub fn move_table(&self, table: QualifiedName, new_schema: &str) -> MigrationOperation {
        MigrationOperation::MoveTable(MoveTable {
            table,
            new_schema: new_schema.to_owned(),
        })
    }

    pub fn add_column(
        &self,
        entity: EntityWalker<'_>,
        property: PropertyWalker<'_>,
    ) -> MigrationOperation {
        MigrationOperation::AddColumn(AddColumn {
            table: names::full_table_name(entity, self.flavour),
            column: self.column_definition(property),
        })
    }

    pub fn drop_column(&self, entity: EntityWalker<'_>, column: &str) -> MigrationOperation {
        MigrationOperation::DropColumn(DropColumn {
            table: names::full_table_name(entity, self.flavour),
            name: column.to_owned(),
        })
    }

    pub fn alter_column(
        &self,
        entity: EntityWalker<'_>,
        property: PropertyWalker<'_>,
    ) -> MigrationOperation {
        MigrationOperation::AlterColumn(AlterColumn {
            table: names::full_table_name(entity, self.flavour),
            column: self.column_definition(property),
        })
    }

    pub fn add_default_constraint(
        &self,
        entity: EntityWalker<'_>,
        property: PropertyWalker<'_>,
    ) -> MigrationOperation {
        MigrationOperation::AddDefaultConstraint(AddDefaultConstraint {
            table: names::full_table_name(entity, self.flavour),
            column: names::column_name(property).to_owned(),
            default_value: property.default_value().cloned(),
            default_sql: property.default_sql().map(ToOwned::to_owned),
        })
    }

    pub fn drop_default_constraint(
        &self,
        entity: EntityWalker<'_>,
        column: &str,
    ) -> MigrationOperation {
        MigrationOperation::DropDefaultConstraint(DropDefaultConstraint {
            table: names::full_table_name(entity, self.flavour),
            column: column.to_owned(),
        })
    }

    pub fn rename_column(
        &self,
        entity: EntityWalker<'_>,
        old_column: &str,
        new_column: &str,
    ) -> MigrationOperation {
        MigrationOperation::RenameColumn(RenameColumn {
            table: names::full_table_name(entity, self.flavour),
            name: old_column.to_owned(),
            new_name: new_column.to_owned(),
        })
    }

    pub fn add_primary_key(&self, key: KeyWalker<'_>) -> MigrationOperation {
        MigrationOperation::AddPrimaryKey(self.primary_key_fragment(key))
    }

    /// The key is the source-side key; the entity names the table the
    /// constraint currently lives on.
    pub fn drop_primary_key(
        &self,
        entity: EntityWalker<'_>,
        key: KeyWalker<'_>,
    ) -> MigrationOperation {
        MigrationOperation::DropPrimaryKey(DropPrimaryKey {
            table: names::full_table_name(entity, self.flavour),
            name: names::key_name(key),
        })
    }

    pub fn add_unique_constraint(&self, key: KeyWalker<'_>) -> MigrationOperation {
        MigrationOperation::AddUniqueConstraint(self.unique_constraint_fragment(key))
    }

    pub fn drop_unique_constraint(
        &self,
        entity: EntityWalker<'_>,
        key: KeyWalker<'_>,
    ) -> MigrationOperation {
        MigrationOperation::DropUniqueConstraint(DropUniqueConstraint {
            table: names::full_table_name(entity, self.flavour),
            name: names::key_name(key),
        })
    }

    pub fn add_foreign_key(&self, foreign_key: ForeignKeyWalker<'_>) -> MigrationOperation {
        MigrationOperation::AddForeignKey(self.foreign_key_fragment(foreign_key))
    }

    pub fn drop_foreign_key(
        &self,
        entity: EntityWalker<'_>,
        foreign_key: ForeignKeyWalker<'_>,
    ) -> MigrationOperation {
        MigrationOperation::DropForeignKey(DropForeignKey {
            table: names::full_table_name(entity, self.flavour),
            name: names::foreign_key_name(foreign_key),
        })
    }

    pub fn create_index(&self, index: IndexWalker<'_>) -> MigrationOperation {
        MigrationOperation::CreateIndex(CreateIndex {
            table: names::full_table_name(index.entity(), self.flavour),
            name: names::index_name(index),
            columns: index.properties().map(|p| names::column_name(p).to_owned()).collect(),
            is_unique: index.is_unique(),
            clustered: None,
        })
    }

    pub fn drop_index(
        &self,
        entity: EntityWalker<'_>,
        index: IndexWalker<'_>,
    ) -> MigrationOperation {
        MigrationOperation::DropIndex(DropIndex {
            table: names::full_table_name(entity, self.flavour),
            name: names::index_name(index),
        })
    }

    pub fn rename_index(
        &self,
        entity: EntityWalker<'_>,
        old_name: &str,
        new_name: &str,
    ) -> MigrationOperation {
        MigrationOperation::RenameIndex(RenameIndex {
            table: names::full_table_name(entity, self.flavour),
            name: old_name.to_owned(),
            new_name: new_name.to_owned(),
        })
    }

    pub fn copy_data(
        &self,
        source_table: QualifiedName,
        source_columns: Vec<String>,
        target_table: QualifiedName,
        target_columns: Vec<String>,
    ) -> MigrationOperation {
        MigrationOperation::CopyData(CopyData {
            source_table,
            source_columns,
            target_table,
            target_columns,
        })
    }

    /// Snapshot a property into a column definition, resolving the storage
    /// type through the dialect type mapper.
    pub fn column_definition(&self, property: PropertyWalker<'_>) -> ColumnDefinition {
        ColumnDefinition {
            name: names::column_name(property).to_owned(),
            store_type: self.flavour.column_type(property),
            is_nullable: property.is_nullable(),
            default_value: property.default_value().cloned(),
            default_sql: property.default_sql().map(ToOwned::to_owned),
            is_identity: property.is_generated_on_add(),
            is_computed: property.is_store_computed(),
        }
    }

    fn primary_key_fragment(&self, key: KeyWalker<'_>) -> AddPrimaryKey {
        AddPrimaryKey {
            table: names::full_table_name(key.entity(), self.flavour),
            name: names::key_name(key),
            columns: key.properties().map(|p| names::column_name(p).to_owned()).collect(),
            clustered: None,
        }
    }

    fn unique_constraint_fragment(&self, key: KeyWalker<'_>) -> AddUniqueConstraint {
        AddUniqueConstraint {
            table: names::full_table_name(key.entity(), self.flavour),
            name: names::key_name(key),
            columns: key.properties().map(|p| names::column_name(p).to_owned()).collect(),
        }
    }

    fn foreign_key_fragment(&self, foreign_key: ForeignKeyWalker<'_>) -> AddForeignKey {
        AddForeignKey {
            table: names::full_table_name(foreign_key.entity(), self.flavour),
            name: names::foreign_key_name(foreign_key),
            columns: foreign_key
                .constrained_properties()
                .map(|p| names::column_name(p).to_owned())
                .collect(),
            referenced_table: names::full_table_name(foreign_key.referenced_entity(), self.flavour),
            referenced_columns: foreign_key
                .referenced_properties()
                .map(|p| names::column_name(p).to_owned())
                .collect(),
            on_delete: foreign_key.on_delete(),
        }
    }
}
