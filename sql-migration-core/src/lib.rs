//! The schema-migration core of the object-mapping toolkit.
//!
//! Given two [schema models](schema_model::SchemaModel) and a [Dialect], the
//! pipeline produces the ordered SQL statements that evolve a database
//! matching the source model into one matching the target model:
//!
//! ```text
//! (source, target) → diff → operations → pre-process → ordered plan → render → SQL
//! ```
//!
//! The whole core is synchronous and pure: it performs no I/O, reads no
//! environment and owns no connections. Executing the emitted statements,
//! and wrapping them in a transaction where the dialect permits one, is the
//! host's business.

#![deny(rust_2018_idioms, unsafe_code)]

mod error;
mod flavour;
mod model_differ;
mod names;
mod operation_factory;
mod operations;
mod pair;
mod preprocessor;
mod sql_generator;

pub use error::{CoreResult, MigrationError};
pub use flavour::Dialect;
pub use model_differ::{CancellationToken, FUZZY_MATCH_THRESHOLD};
pub use operation_factory::OperationFactory;
pub use operations::{
    AddColumn, AddDefaultConstraint, AddForeignKey, AddPrimaryKey, AddUniqueConstraint,
    AlterColumn, AlterSequence, ColumnDefinition, CopyData, CreateDatabase, CreateIndex,
    CreateSequence, CreateTable, DropColumn, DropDatabase, DropDefaultConstraint, DropForeignKey,
    DropIndex, DropPrimaryKey, DropSequence, DropTable, DropUniqueConstraint, Migration,
    MigrationOperation, MoveSequence, MoveTable, OperationKind, RenameColumn, RenameIndex,
    RenameSequence, RenameTable,
};

use pair::Pair;
use schema_model::SchemaModel;

/// Compare two schema models and produce the logical operation stream that
/// evolves the source into the target.
///
/// The diff is a deterministic, infallible function of its inputs: unknown
/// constructs produce no operation.
pub fn diff(source: &SchemaModel, target: &SchemaModel, dialect: Dialect) -> Vec<MigrationOperation> {
    diff_with_cancellation(source, target, dialect, &CancellationToken::new())
}

/// Like [diff], honoring a cooperative cancellation signal at operation
/// collection boundaries.
pub fn diff_with_cancellation(
    source: &SchemaModel,
    target: &SchemaModel,
    dialect: Dialect,
    cancellation: &CancellationToken,
) -> Vec<MigrationOperation> {
    let operations =
        model_differ::calculate_operations(Pair::new(source, target), dialect.flavour(), cancellation);

    tracing::debug!(operation_count = operations.len(), "model diff complete");

    operations
}

/// Diff two models and rewrite the operation stream into a dialect-legal
/// execution plan.
pub fn plan_operations(
    source: &SchemaModel,
    target: &SchemaModel,
    dialect: Dialect,
) -> CoreResult<Vec<MigrationOperation>> {
    let flavour = dialect.flavour();
    let operations = diff(source, target, dialect);
    let plan = flavour.preprocess(operations, Pair::new(source, target))?;

    tracing::debug!(operation_count = plan.len(), "pre-processing complete");

    Ok(plan)
}

/// Render an executable operation plan to SQL statements. Each returned
/// string is one complete statement.
pub fn render_operations(
    operations: &[MigrationOperation],
    dialect: Dialect,
) -> CoreResult<Vec<String>> {
    use sql_generator::SqlGenerator as _;

    let flavour = dialect.flavour();

    operations
        .iter()
        .map(|operation| {
            let statement = flavour.render_operation(operation)?;
            tracing::debug!(operation = operation.description(), %statement, "rendered statement");
            Ok(statement)
        })
        .collect()
}

/// The full pipeline: diff, pre-process and render.
pub fn generate_migration(
    source: &SchemaModel,
    target: &SchemaModel,
    dialect: Dialect,
) -> CoreResult<Vec<String>> {
    let plan = plan_operations(source, target, dialect)?;

    render_operations(&plan, dialect)
}
