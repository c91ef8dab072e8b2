//! The migration operation catalog.
//!
//! Operations are value-typed and immutable: every variant snapshots the
//! names, column definitions and literals it needs to regenerate itself in
//! SQL, so no operation references live model metadata once emitted.

use schema_model::{ForeignKeyAction, QualifiedName, ValueLiteral};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single migration instruction at the relational-DDL level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MigrationOperation {
    CreateDatabase(CreateDatabase),
    DropDatabase(DropDatabase),
    CreateSequence(CreateSequence),
    DropSequence(DropSequence),
    MoveSequence(MoveSequence),
    RenameSequence(RenameSequence),
    AlterSequence(AlterSequence),
    CreateTable(CreateTable),
    DropTable(DropTable),
    RenameTable(RenameTable),
    MoveTable(MoveTable),
    AddColumn(AddColumn),
    DropColumn(DropColumn),
    AlterColumn(AlterColumn),
    AddDefaultConstraint(AddDefaultConstraint),
    DropDefaultConstraint(DropDefaultConstraint),
    RenameColumn(RenameColumn),
    AddPrimaryKey(AddPrimaryKey),
    DropPrimaryKey(DropPrimaryKey),
    AddUniqueConstraint(AddUniqueConstraint),
    DropUniqueConstraint(DropUniqueConstraint),
    AddForeignKey(AddForeignKey),
    DropForeignKey(DropForeignKey),
    CreateIndex(CreateIndex),
    DropIndex(DropIndex),
    RenameIndex(RenameIndex),
    CopyData(CopyData),
}

impl MigrationOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            MigrationOperation::CreateDatabase(_) => OperationKind::CreateDatabase,
            MigrationOperation::DropDatabase(_) => OperationKind::DropDatabase,
            MigrationOperation::CreateSequence(_) => OperationKind::CreateSequence,
            MigrationOperation::DropSequence(_) => OperationKind::DropSequence,
            MigrationOperation::MoveSequence(_) => OperationKind::MoveSequence,
            MigrationOperation::RenameSequence(_) => OperationKind::RenameSequence,
            MigrationOperation::AlterSequence(_) => OperationKind::AlterSequence,
            MigrationOperation::CreateTable(_) => OperationKind::CreateTable,
            MigrationOperation::DropTable(_) => OperationKind::DropTable,
            MigrationOperation::RenameTable(_) => OperationKind::RenameTable,
            MigrationOperation::MoveTable(_) => OperationKind::MoveTable,
            MigrationOperation::AddColumn(_) => OperationKind::AddColumn,
            MigrationOperation::DropColumn(_) => OperationKind::DropColumn,
            MigrationOperation::AlterColumn(_) => OperationKind::AlterColumn,
            MigrationOperation::AddDefaultConstraint(_) => OperationKind::AddDefaultConstraint,
            MigrationOperation::DropDefaultConstraint(_) => OperationKind::DropDefaultConstraint,
            MigrationOperation::RenameColumn(_) => OperationKind::RenameColumn,
            MigrationOperation::AddPrimaryKey(_) => OperationKind::AddPrimaryKey,
            MigrationOperation::DropPrimaryKey(_) => OperationKind::DropPrimaryKey,
            MigrationOperation::AddUniqueConstraint(_) => OperationKind::AddUniqueConstraint,
            MigrationOperation::DropUniqueConstraint(_) => OperationKind::DropUniqueConstraint,
            MigrationOperation::AddForeignKey(_) => OperationKind::AddForeignKey,
            MigrationOperation::DropForeignKey(_) => OperationKind::DropForeignKey,
            MigrationOperation::CreateIndex(_) => OperationKind::CreateIndex,
            MigrationOperation::DropIndex(_) => OperationKind::DropIndex,
            MigrationOperation::RenameIndex(_) => OperationKind::RenameIndex,
            MigrationOperation::CopyData(_) => OperationKind::CopyData,
        }
    }

    /// A stable kind-name string, for logs and plan summaries.
    pub fn description(&self) -> &'static str {
        self.kind().as_str()
    }
}

/// The discriminant of a [MigrationOperation].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    CreateDatabase,
    DropDatabase,
    CreateSequence,
    DropSequence,
    MoveSequence,
    RenameSequence,
    AlterSequence,
    CreateTable,
    DropTable,
    RenameTable,
    MoveTable,
    AddColumn,
    DropColumn,
    AlterColumn,
    AddDefaultConstraint,
    DropDefaultConstraint,
    RenameColumn,
    AddPrimaryKey,
    DropPrimaryKey,
    AddUniqueConstraint,
    DropUniqueConstraint,
    AddForeignKey,
    DropForeignKey,
    CreateIndex,
    DropIndex,
    RenameIndex,
    CopyData,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::CreateDatabase => "CreateDatabase",
            OperationKind::DropDatabase => "DropDatabase",
            OperationKind::CreateSequence => "CreateSequence",
            OperationKind::DropSequence => "DropSequence",
            OperationKind::MoveSequence => "MoveSequence",
            OperationKind::RenameSequence => "RenameSequence",
            OperationKind::AlterSequence => "AlterSequence",
            OperationKind::CreateTable => "CreateTable",
            OperationKind::DropTable => "DropTable",
            OperationKind::RenameTable => "RenameTable",
            OperationKind::MoveTable => "MoveTable",
            OperationKind::AddColumn => "AddColumn",
            OperationKind::DropColumn => "DropColumn",
            OperationKind::AlterColumn => "AlterColumn",
            OperationKind::AddDefaultConstraint => "AddDefaultConstraint",
            OperationKind::DropDefaultConstraint => "DropDefaultConstraint",
            OperationKind::RenameColumn => "RenameColumn",
            OperationKind::AddPrimaryKey => "AddPrimaryKey",
            OperationKind::DropPrimaryKey => "DropPrimaryKey",
            OperationKind::AddUniqueConstraint => "AddUniqueConstraint",
            OperationKind::DropUniqueConstraint => "DropUniqueConstraint",
            OperationKind::AddForeignKey => "AddForeignKey",
            OperationKind::DropForeignKey => "DropForeignKey",
            OperationKind::CreateIndex => "CreateIndex",
            OperationKind::DropIndex => "DropIndex",
            OperationKind::RenameIndex => "RenameIndex",
            OperationKind::CopyData => "CopyData",
        }
    }
}

/// The canonical emission precedence. Buckets of the operation collection
/// are drained in this order; order within a bucket is insertion order.
pub(crate) const EMISSION_ORDER: &[OperationKind] = &[
    OperationKind::CreateDatabase,
    OperationKind::DropDatabase,
    OperationKind::MoveSequence,
    OperationKind::RenameSequence,
    OperationKind::CreateSequence,
    OperationKind::DropSequence,
    OperationKind::AlterSequence,
    OperationKind::MoveTable,
    OperationKind::RenameTable,
    OperationKind::CreateTable,
    OperationKind::DropTable,
    OperationKind::RenameColumn,
    OperationKind::DropDefaultConstraint,
    OperationKind::AddColumn,
    OperationKind::DropColumn,
    OperationKind::AlterColumn,
    OperationKind::AddDefaultConstraint,
    OperationKind::DropPrimaryKey,
    OperationKind::AddPrimaryKey,
    OperationKind::AddUniqueConstraint,
    OperationKind::DropUniqueConstraint,
    OperationKind::AddForeignKey,
    OperationKind::DropForeignKey,
    OperationKind::RenameIndex,
    OperationKind::CreateIndex,
    OperationKind::DropIndex,
    OperationKind::CopyData,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDatabase {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropDatabase {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSequence {
    pub sequence: QualifiedName,
    /// The resolved storage type of the sequence values.
    pub store_type: String,
    pub start_value: i64,
    pub increment_by: i64,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSequence {
    pub sequence: QualifiedName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveSequence {
    pub sequence: QualifiedName,
    pub new_schema: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameSequence {
    pub sequence: QualifiedName,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterSequence {
    pub sequence: QualifiedName,
    pub increment_by: i64,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

/// A snapshotted column shape, sufficient to render the column in DDL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    /// The resolved dialect storage type.
    pub store_type: String,
    pub is_nullable: bool,
    pub default_value: Option<ValueLiteral>,
    /// A raw SQL default expression. Takes precedence over `default_value`.
    pub default_sql: Option<String>,
    /// Store-generated on insert.
    pub is_identity: bool,
    /// Computed by the store.
    pub is_computed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTable {
    pub table: QualifiedName,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Option<AddPrimaryKey>,
    pub unique_constraints: Vec<AddUniqueConstraint>,
    pub foreign_keys: Vec<AddForeignKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTable {
    pub table: QualifiedName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameTable {
    pub table: QualifiedName,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveTable {
    pub table: QualifiedName,
    pub new_schema: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddColumn {
    pub table: QualifiedName,
    pub column: ColumnDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropColumn {
    pub table: QualifiedName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterColumn {
    pub table: QualifiedName,
    pub column: ColumnDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddDefaultConstraint {
    pub table: QualifiedName,
    pub column: String,
    pub default_value: Option<ValueLiteral>,
    pub default_sql: Option<String>,
}

/// Dropping a default constraint whose name the server generated requires a
/// deferred-name lookup at execution time; the operation itself only knows
/// the table and column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropDefaultConstraint {
    pub table: QualifiedName,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameColumn {
    pub table: QualifiedName,
    pub name: String,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPrimaryKey {
    pub table: QualifiedName,
    pub name: String,
    pub columns: Vec<String>,
    /// `None` lets the dialect pick its default at render time.
    pub clustered: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropPrimaryKey {
    pub table: QualifiedName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddUniqueConstraint {
    pub table: QualifiedName,
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropUniqueConstraint {
    pub table: QualifiedName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddForeignKey {
    pub table: QualifiedName,
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_table: QualifiedName,
    pub referenced_columns: Vec<String>,
    pub on_delete: ForeignKeyAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropForeignKey {
    pub table: QualifiedName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndex {
    pub table: QualifiedName,
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    /// `None` lets the dialect pick its default at render time.
    pub clustered: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIndex {
    pub table: QualifiedName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameIndex {
    pub table: QualifiedName,
    pub name: String,
    pub new_name: String,
}

/// Bulk-copies rows between two tables with compatible column lists. Internal
/// to the restricted-dialect rebuild protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyData {
    pub source_table: QualifiedName,
    pub source_columns: Vec<String>,
    pub target_table: QualifiedName,
    pub target_columns: Vec<String>,
}

/// An ordered multimap of operations keyed by kind.
///
/// Append order is preserved within a kind; draining follows the canonical
/// [EMISSION_ORDER] precedence.
#[derive(Debug, Default)]
pub(crate) struct OperationCollection {
    buckets: BTreeMap<OperationKind, Vec<MigrationOperation>>,
}

impl OperationCollection {
    pub(crate) fn push(&mut self, operation: MigrationOperation) {
        self.buckets.entry(operation.kind()).or_default().push(operation);
    }

    pub(crate) fn take(&mut self, kind: OperationKind) -> Vec<MigrationOperation> {
        self.buckets.remove(&kind).unwrap_or_default()
    }

    pub(crate) fn replace(&mut self, kind: OperationKind, operations: Vec<MigrationOperation>) {
        if operations.is_empty() {
            self.buckets.remove(&kind);
        } else {
            self.buckets.insert(kind, operations);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Drain the collection into the canonical global emission order.
    pub(crate) fn into_ordered(mut self) -> Vec<MigrationOperation> {
        let mut out = Vec::with_capacity(self.len());

        for kind in EMISSION_ORDER {
            out.append(&mut self.take(*kind));
        }

        debug_assert!(self.buckets.is_empty());

        out
    }
}

/// A complete migration plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    pub operations: Vec<MigrationOperation>,
}

impl Migration {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// A human-readable per-kind count summary of the plan.
    pub fn summary(&self) -> String {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();

        for operation in &self.operations {
            *counts.entry(operation.description()).or_default() += 1;
        }

        counts
            .into_iter()
            .map(|(kind, count)| format!("{}: {}", kind, count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(name: &str) -> QualifiedName {
        QualifiedName::new(None, name)
    }

    #[test]
    fn collection_drains_in_canonical_order() {
        let mut collection = OperationCollection::default();

        collection.push(MigrationOperation::AddColumn(AddColumn {
            table: table("A"),
            column: ColumnDefinition {
                name: "c".into(),
                store_type: "int".into(),
                is_nullable: false,
                default_value: None,
                default_sql: None,
                is_identity: false,
                is_computed: false,
            },
        }));
        collection.push(MigrationOperation::RenameTable(RenameTable {
            table: table("A"),
            new_name: "B".into(),
        }));
        collection.push(MigrationOperation::CreateSequence(CreateSequence {
            sequence: table("S"),
            store_type: "bigint".into(),
            start_value: 1,
            increment_by: 1,
            min_value: None,
            max_value: None,
        }));

        let kinds: Vec<OperationKind> = collection.into_ordered().iter().map(|op| op.kind()).collect();

        assert_eq!(
            kinds,
            vec![
                OperationKind::CreateSequence,
                OperationKind::RenameTable,
                OperationKind::AddColumn
            ]
        );
    }

    #[test]
    fn operations_round_trip_through_serde() {
        let operation = MigrationOperation::RenameColumn(RenameColumn {
            table: QualifiedName::new(Some("dbo"), "MyTable"),
            name: "Foo".into(),
            new_name: "Bar".into(),
        });

        let json = serde_json::to_string(&operation).unwrap();
        let back: MigrationOperation = serde_json::from_str(&json).unwrap();

        assert_eq!(back, operation);
        assert_eq!(back.description(), "RenameColumn");
    }

    #[test]
    fn migration_summary_counts_kinds() {
        let migration = Migration {
            operations: vec![
                MigrationOperation::DropTable(DropTable { table: table("A") }),
                MigrationOperation::DropTable(DropTable { table: table("B") }),
            ],
        };

        assert_eq!(migration.summary(), "DropTable: 2");
        assert!(!migration.is_empty());
    }
}
