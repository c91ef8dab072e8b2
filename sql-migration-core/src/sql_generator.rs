//! Render SQL DDL statements.
//!
//! Conventions:
//!
//! - Use 4 spaces for indentation (see common::SQL_INDENTATION)
//! - SQL types and keywords, like CREATE TABLE and VARCHAR, should be upper
//!   case, for consistency.
//! - Generators do not add semicolons at the end of statements; every
//!   rendered string is one complete statement, possibly with embedded
//!   newlines.

pub(crate) mod common;

mod sqlite_generator;
mod sqlserver_generator;

use crate::{
    error::{CoreResult, MigrationError},
    operations::*,
};
use common::Quoted;
use schema_model::QualifiedName;

/// Dialect-specific rendering of migration operations to SQL text.
///
/// The dispatch match in [render_operation](SqlGenerator::render_operation)
/// is exhaustive over the operation enum, so adding an operation kind forces
/// every dialect to decide how to handle it. Kinds a dialect cannot express
/// fall through to [not_supported](SqlGenerator::not_supported).
pub(crate) trait SqlGenerator {
    fn dialect_name(&self) -> &'static str;

    /// Wrap an identifier in the dialect delimiters, doubling embedded
    /// delimiter characters.
    fn quote<'a>(&self, name: &'a str) -> Quoted<&'a str>;

    /// Render a schema-qualified name. Dialects without schema support
    /// flatten the pair into a single identifier.
    fn render_qualified_name(&self, name: &QualifiedName) -> String;

    fn render_operation(&self, operation: &MigrationOperation) -> CoreResult<String> {
        match operation {
            MigrationOperation::CreateDatabase(op) => self.render_create_database(op),
            MigrationOperation::DropDatabase(op) => self.render_drop_database(op),
            MigrationOperation::CreateSequence(op) => self.render_create_sequence(op),
            MigrationOperation::DropSequence(op) => self.render_drop_sequence(op),
            MigrationOperation::MoveSequence(op) => self.render_move_sequence(op),
            MigrationOperation::RenameSequence(op) => self.render_rename_sequence(op),
            MigrationOperation::AlterSequence(op) => self.render_alter_sequence(op),
            MigrationOperation::CreateTable(op) => self.render_create_table(op),
            MigrationOperation::DropTable(op) => self.render_drop_table(op),
            MigrationOperation::RenameTable(op) => self.render_rename_table(op),
            MigrationOperation::MoveTable(op) => self.render_move_table(op),
            MigrationOperation::AddColumn(op) => self.render_add_column(op),
            MigrationOperation::DropColumn(op) => self.render_drop_column(op),
            MigrationOperation::AlterColumn(op) => self.render_alter_column(op),
            MigrationOperation::AddDefaultConstraint(op) => self.render_add_default_constraint(op),
            MigrationOperation::DropDefaultConstraint(op) => {
                self.render_drop_default_constraint(op)
            }
            MigrationOperation::RenameColumn(op) => self.render_rename_column(op),
            MigrationOperation::AddPrimaryKey(op) => self.render_add_primary_key(op),
            MigrationOperation::DropPrimaryKey(op) => self.render_drop_primary_key(op),
            MigrationOperation::AddUniqueConstraint(op) => self.render_add_unique_constraint(op),
            MigrationOperation::DropUniqueConstraint(op) => self.render_drop_unique_constraint(op),
            MigrationOperation::AddForeignKey(op) => self.render_add_foreign_key(op),
            MigrationOperation::DropForeignKey(op) => self.render_drop_foreign_key(op),
            MigrationOperation::CreateIndex(op) => self.render_create_index(op),
            MigrationOperation::DropIndex(op) => self.render_drop_index(op),
            MigrationOperation::RenameIndex(op) => self.render_rename_index(op),
            MigrationOperation::CopyData(op) => self.render_copy_data(op),
        }
    }

    fn not_supported(&self, operation: &'static str) -> CoreResult<String> {
        Err(MigrationError::OperationNotSupported {
            dialect: self.dialect_name(),
            operation,
        })
    }

    fn render_create_database(&self, _op: &CreateDatabase) -> CoreResult<String> {
        self.not_supported("CreateDatabase")
    }

    fn render_drop_database(&self, _op: &DropDatabase) -> CoreResult<String> {
        self.not_supported("DropDatabase")
    }

    fn render_create_sequence(&self, _op: &CreateSequence) -> CoreResult<String> {
        self.not_supported("CreateSequence")
    }

    fn render_drop_sequence(&self, _op: &DropSequence) -> CoreResult<String> {
        self.not_supported("DropSequence")
    }

    fn render_move_sequence(&self, _op: &MoveSequence) -> CoreResult<String> {
        self.not_supported("MoveSequence")
    }

    fn render_rename_sequence(&self, _op: &RenameSequence) -> CoreResult<String> {
        self.not_supported("RenameSequence")
    }

    fn render_alter_sequence(&self, _op: &AlterSequence) -> CoreResult<String> {
        self.not_supported("AlterSequence")
    }

    fn render_create_table(&self, _op: &CreateTable) -> CoreResult<String> {
        self.not_supported("CreateTable")
    }

    fn render_drop_table(&self, _op: &DropTable) -> CoreResult<String> {
        self.not_supported("DropTable")
    }

    fn render_rename_table(&self, _op: &RenameTable) -> CoreResult<String> {
        self.not_supported("RenameTable")
    }

    fn render_move_table(&self, _op: &MoveTable) -> CoreResult<String> {
        self.not_supported("MoveTable")
    }

    fn render_add_column(&self, _op: &AddColumn) -> CoreResult<String> {
        self.not_supported("AddColumn")
    }

    fn render_drop_column(&self, _op: &DropColumn) -> CoreResult<String> {
        self.not_supported("DropColumn")
    }

    fn render_alter_column(&self, _op: &AlterColumn) -> CoreResult<String> {
        self.not_supported("AlterColumn")
    }

    fn render_add_default_constraint(&self, _op: &AddDefaultConstraint) -> CoreResult<String> {
        self.not_supported("AddDefaultConstraint")
    }

    fn render_drop_default_constraint(&self, _op: &DropDefaultConstraint) -> CoreResult<String> {
        self.not_supported("DropDefaultConstraint")
    }

    fn render_rename_column(&self, _op: &RenameColumn) -> CoreResult<String> {
        self.not_supported("RenameColumn")
    }

    fn render_add_primary_key(&self, _op: &AddPrimaryKey) -> CoreResult<String> {
        self.not_supported("AddPrimaryKey")
    }

    fn render_drop_primary_key(&self, _op: &DropPrimaryKey) -> CoreResult<String> {
        self.not_supported("DropPrimaryKey")
    }

    fn render_add_unique_constraint(&self, _op: &AddUniqueConstraint) -> CoreResult<String> {
        self.not_supported("AddUniqueConstraint")
    }

    fn render_drop_unique_constraint(&self, _op: &DropUniqueConstraint) -> CoreResult<String> {
        self.not_supported("DropUniqueConstraint")
    }

    fn render_add_foreign_key(&self, _op: &AddForeignKey) -> CoreResult<String> {
        self.not_supported("AddForeignKey")
    }

    fn render_drop_foreign_key(&self, _op: &DropForeignKey) -> CoreResult<String> {
        self.not_supported("DropForeignKey")
    }

    fn render_create_index(&self, _op: &CreateIndex) -> CoreResult<String> {
        self.not_supported("CreateIndex")
    }

    fn render_drop_index(&self, _op: &DropIndex) -> CoreResult<String> {
        self.not_supported("DropIndex")
    }

    fn render_rename_index(&self, _op: &RenameIndex) -> CoreResult<String> {
        self.not_supported("RenameIndex")
    }

    fn render_copy_data(&self, _op: &CopyData) -> CoreResult<String> {
        self.not_supported("CopyData")
    }
}
