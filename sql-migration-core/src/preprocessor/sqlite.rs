//! The restricted-dialect pre-processor.
//!
//! SQLite cannot alter most table subordinates in place. Operations
//! targeting a table accumulate in a per-table handler. Handlers upgrade one
//! way, from create-or-alter to rebuild, on the first unsupported
//! subordinate. A rebuild flushes as the protocol from the SQLite
//! documentation on table schema changes: rename the old table aside when
//! its name is wanted, create the target shape, copy the surviving columns,
//! and drop the old table after everything else.

use super::find_entity_by_table_name;
use crate::{
    error::{CoreResult, MigrationError},
    flavour::SqlFlavour,
    model_differ::TEMP_NAME_PREFIX,
    names,
    operation_factory::OperationFactory,
    operations::{DropIndex, DropTable, MigrationOperation, MoveTable, RenameIndex, RenameTable},
    pair::Pair,
};
use schema_model::{QualifiedName, SchemaModel};

pub(crate) fn preprocess(
    operations: Vec<MigrationOperation>,
    models: Pair<&SchemaModel>,
    flavour: &dyn SqlFlavour,
) -> CoreResult<Vec<MigrationOperation>> {
    let mut preprocessor = PreProcessor {
        models,
        flavour,
        handlers: Vec::new(),
        deferred_drops: Vec::new(),
        output: Vec::new(),
    };

    for operation in operations {
        preprocessor.apply(operation)?;
    }

    preprocessor.finish()
}

struct PreProcessor<'a> {
    models: Pair<&'a SchemaModel>,
    flavour: &'a dyn SqlFlavour,
    /// Pending handlers, in installation order, keyed by the current table
    /// name.
    handlers: Vec<TableHandler>,
    /// Rebuild drops, emitted after all other handler output.
    deferred_drops: Vec<MigrationOperation>,
    output: Vec<MigrationOperation>,
}

enum TableHandler {
    Create(CreateTableHandler),
    Alter(AlterTableHandler),
    Rebuild(RebuildTableHandler),
}

impl TableHandler {
    fn current_table(&self) -> &QualifiedName {
        match self {
            TableHandler::Create(handler) => &handler.create.table,
            TableHandler::Alter(handler) => &handler.current_table,
            TableHandler::Rebuild(handler) => &handler.current_table,
        }
    }
}

struct CreateTableHandler {
    create: crate::operations::CreateTable,
}

struct AlterTableHandler {
    source_table: QualifiedName,
    current_table: QualifiedName,
    operations: Vec<MigrationOperation>,
}

struct RebuildTableHandler {
    /// The on-disk name of the table, as it exists in the source model.
    source_table: QualifiedName,
    /// The target name, tracking swallowed renames and moves.
    current_table: QualifiedName,
    /// current target column name → original source column name. Renames
    /// re-key an entry, drops remove it.
    column_name_pairs: Vec<(String, String)>,
}

impl RebuildTableHandler {
    fn absorb(&mut self, operation: &MigrationOperation) {
        match operation {
            MigrationOperation::RenameColumn(rename) => {
                if let Some(pair) = self
                    .column_name_pairs
                    .iter_mut()
                    .find(|(current, _)| current == &rename.name)
                {
                    pair.0 = rename.new_name.clone();
                }
            }
            MigrationOperation::DropColumn(drop) => {
                self.column_name_pairs.retain(|(current, _)| current != &drop.name);
            }
            _ => (),
        }
    }
}

impl<'a> PreProcessor<'a> {
    fn apply(&mut self, operation: MigrationOperation) -> CoreResult<()> {
        match operation {
            MigrationOperation::CreateTable(create) => {
                // A second create for a handled name flushes the old handler
                // and starts over.
                let table = create.table.clone();
                self.flush_table(&table)?;
                self.handlers
                    .push(TableHandler::Create(CreateTableHandler { create }));
                Ok(())
            }
            MigrationOperation::AddColumn(add) => {
                let table = add.table.clone();
                self.apply_supported(table, MigrationOperation::AddColumn(add))
            }
            MigrationOperation::RenameTable(rename) => self.apply_rename_table(rename),
            MigrationOperation::MoveTable(mv) => self.apply_move_table(mv),
            MigrationOperation::DropTable(drop) => {
                self.flush_table(&drop.table)?;
                self.output.push(MigrationOperation::DropTable(drop));
                Ok(())
            }
            MigrationOperation::RenameIndex(rename) => self.expand_rename_index(rename),
            MigrationOperation::AlterColumn(_)
            | MigrationOperation::DropColumn(_)
            | MigrationOperation::AddDefaultConstraint(_)
            | MigrationOperation::DropDefaultConstraint(_)
            | MigrationOperation::RenameColumn(_)
            | MigrationOperation::AddPrimaryKey(_)
            | MigrationOperation::DropPrimaryKey(_)
            | MigrationOperation::AddUniqueConstraint(_)
            | MigrationOperation::DropUniqueConstraint(_)
            | MigrationOperation::AddForeignKey(_)
            | MigrationOperation::DropForeignKey(_) => self.apply_unsupported(operation),
            other => {
                // Globally ordered operations force pending handlers out
                // first, so their output lands in a consistent plan.
                self.flush_all()?;
                self.output.push(other);
                Ok(())
            }
        }
    }

    fn apply_supported(
        &mut self,
        table: QualifiedName,
        operation: MigrationOperation,
    ) -> CoreResult<()> {
        match self.handler_index(&table) {
            Some(idx) => match &mut self.handlers[idx] {
                TableHandler::Create(_) => Err(MigrationError::invalid_sequence(format!(
                    "unexpected {} for freshly created table '{}'",
                    operation.description(),
                    table.dotted(),
                ))),
                TableHandler::Alter(handler) => {
                    handler.operations.push(operation);
                    Ok(())
                }
                // The rebuilt table already has the target shape.
                TableHandler::Rebuild(_) => Ok(()),
            },
            None => {
                self.handlers.push(TableHandler::Alter(AlterTableHandler {
                    source_table: table.clone(),
                    current_table: table,
                    operations: vec![operation],
                }));
                Ok(())
            }
        }
    }

    fn apply_rename_table(&mut self, rename: RenameTable) -> CoreResult<()> {
        match self.handler_index(&rename.table) {
            Some(idx) if matches!(self.handlers[idx], TableHandler::Create(_)) => {
                // Renaming a table created in the same plan: emit the create,
                // then the rename.
                self.flush_table(&rename.table)?;
                self.output.push(MigrationOperation::RenameTable(rename));
                Ok(())
            }
            Some(idx) => match &mut self.handlers[idx] {
                TableHandler::Alter(handler) => {
                    handler.current_table.name = rename.new_name.clone();
                    handler.operations.push(MigrationOperation::RenameTable(rename));
                    Ok(())
                }
                TableHandler::Rebuild(handler) => {
                    handler.current_table.name = rename.new_name;
                    Ok(())
                }
                TableHandler::Create(_) => unreachable!("handled above"),
            },
            None => {
                let current_table = QualifiedName {
                    schema: rename.table.schema.clone(),
                    name: rename.new_name.clone(),
                };

                self.handlers.push(TableHandler::Alter(AlterTableHandler {
                    source_table: rename.table.clone(),
                    current_table,
                    operations: vec![MigrationOperation::RenameTable(rename)],
                }));
                Ok(())
            }
        }
    }

    fn apply_move_table(&mut self, mv: MoveTable) -> CoreResult<()> {
        match self.handler_index(&mv.table) {
            Some(idx) if matches!(self.handlers[idx], TableHandler::Create(_)) => {
                self.flush_table(&mv.table)?;
                self.output.push(MigrationOperation::MoveTable(mv));
                Ok(())
            }
            Some(idx) => match &mut self.handlers[idx] {
                TableHandler::Alter(handler) => {
                    handler.current_table.schema = Some(mv.new_schema.clone());
                    handler.operations.push(MigrationOperation::MoveTable(mv));
                    Ok(())
                }
                TableHandler::Rebuild(handler) => {
                    handler.current_table.schema = Some(mv.new_schema);
                    Ok(())
                }
                TableHandler::Create(_) => unreachable!("handled above"),
            },
            None => {
                let current_table = QualifiedName {
                    schema: Some(mv.new_schema.clone()),
                    name: mv.table.name.clone(),
                };

                self.handlers.push(TableHandler::Alter(AlterTableHandler {
                    source_table: mv.table.clone(),
                    current_table,
                    operations: vec![MigrationOperation::MoveTable(mv)],
                }));
                Ok(())
            }
        }
    }

    fn apply_unsupported(&mut self, operation: MigrationOperation) -> CoreResult<()> {
        let table = subordinate_table(&operation).clone();

        match self.handler_index(&table) {
            Some(idx) => {
                if let TableHandler::Create(handler) = &self.handlers[idx] {
                    if let MigrationOperation::AddForeignKey(fk) = &operation {
                        // Foreign keys of freshly created tables are already
                        // inlined in the create.
                        if handler.create.foreign_keys.iter().any(|inline| inline.name == fk.name) {
                            return Ok(());
                        }

                        return Err(MigrationError::invalid_sequence(format!(
                            "foreign key '{}' is not declared on created table '{}'",
                            fk.name,
                            table.dotted(),
                        )));
                    }

                    return Err(MigrationError::invalid_sequence(format!(
                        "unexpected {} for freshly created table '{}'",
                        operation.description(),
                        table.dotted(),
                    )));
                }

                if let TableHandler::Alter(alter) = &self.handlers[idx] {
                    let source_table = alter.source_table.clone();
                    let current_table = alter.current_table.clone();
                    let rebuild = self.new_rebuild_handler(source_table, current_table)?;
                    self.handlers[idx] = TableHandler::Rebuild(rebuild);
                }

                match &mut self.handlers[idx] {
                    TableHandler::Rebuild(handler) => {
                        handler.absorb(&operation);
                        Ok(())
                    }
                    _ => unreachable!("table handler upgrade"),
                }
            }
            None => {
                let mut rebuild = self.new_rebuild_handler(table.clone(), table)?;
                rebuild.absorb(&operation);
                self.handlers.push(TableHandler::Rebuild(rebuild));
                Ok(())
            }
        }
    }

    fn new_rebuild_handler(
        &self,
        source_table: QualifiedName,
        current_table: QualifiedName,
    ) -> CoreResult<RebuildTableHandler> {
        let source_entity =
            find_entity_by_table_name(self.models.previous(), &source_table, self.flavour)
                .ok_or_else(|| {
                    MigrationError::invalid_sequence(format!(
                        "table '{}' does not exist in the source model",
                        source_table.dotted(),
                    ))
                })?;

        let column_name_pairs = source_entity
            .properties()
            .map(|property| {
                let name = names::column_name(property).to_owned();
                (name.clone(), name)
            })
            .collect();

        Ok(RebuildTableHandler {
            source_table,
            current_table,
            column_name_pairs,
        })
    }

    /// Expanded because the dialect cannot rename an index in place. The
    /// recreated index is recovered from the target model.
    fn expand_rename_index(&mut self, rename: RenameIndex) -> CoreResult<()> {
        self.flush_all()?;

        let factory = OperationFactory::new(self.flavour);

        let entity = find_entity_by_table_name(self.models.next(), &rename.table, self.flavour)
            .ok_or_else(|| {
                MigrationError::invalid_sequence(format!(
                    "table '{}' does not exist in the target model",
                    rename.table.dotted(),
                ))
            })?;

        let index = entity
            .indexes()
            .find(|index| names::index_name(*index) == rename.new_name)
            .ok_or_else(|| {
                MigrationError::invalid_sequence(format!(
                    "index '{}' does not exist on table '{}' in the target model",
                    rename.new_name,
                    rename.table.dotted(),
                ))
            })?;

        self.output.push(MigrationOperation::DropIndex(DropIndex {
            table: rename.table.clone(),
            name: rename.name.clone(),
        }));
        self.output.push(factory.create_index(index));

        Ok(())
    }

    fn handler_index(&self, table: &QualifiedName) -> Option<usize> {
        self.handlers.iter().position(|handler| handler.current_table() == table)
    }

    fn flush_table(&mut self, table: &QualifiedName) -> CoreResult<()> {
        if let Some(idx) = self.handler_index(table) {
            let handler = self.handlers.remove(idx);
            self.flush_handler(handler)?;
        }

        Ok(())
    }

    fn flush_all(&mut self) -> CoreResult<()> {
        let handlers = std::mem::take(&mut self.handlers);

        for handler in handlers {
            self.flush_handler(handler)?;
        }

        Ok(())
    }

    fn flush_handler(&mut self, handler: TableHandler) -> CoreResult<()> {
        match handler {
            TableHandler::Create(handler) => {
                self.output.push(MigrationOperation::CreateTable(handler.create));
                Ok(())
            }
            TableHandler::Alter(handler) => {
                self.output.extend(handler.operations);
                Ok(())
            }
            TableHandler::Rebuild(handler) => self.flush_rebuild(handler),
        }
    }

    fn flush_rebuild(&mut self, handler: RebuildTableHandler) -> CoreResult<()> {
        let factory = OperationFactory::new(self.flavour);

        let target_entity =
            find_entity_by_table_name(self.models.next(), &handler.current_table, self.flavour)
                .ok_or_else(|| {
                    MigrationError::invalid_sequence(format!(
                        "table '{}' does not exist in the target model",
                        handler.current_table.dotted(),
                    ))
                })?;

        // When the target keeps the source name, the old table is renamed
        // aside first; its reserved prefix marks incomplete rebuilds.
        let copy_source = if handler.current_table == handler.source_table {
            let temp_name = format!("{}{}", TEMP_NAME_PREFIX, handler.source_table.name);
            self.output
                .push(factory.rename_table(handler.source_table.clone(), &temp_name));

            QualifiedName {
                schema: handler.source_table.schema.clone(),
                name: temp_name,
            }
        } else {
            handler.source_table.clone()
        };

        self.output.push(factory.create_table(target_entity));

        // The copied column lists come from inverting the pair map, in
        // target column order.
        let mut target_columns = Vec::new();
        let mut source_columns = Vec::new();

        for property in target_entity.properties() {
            let column = names::column_name(property);

            if let Some((_, original)) = handler
                .column_name_pairs
                .iter()
                .find(|(current, _)| current == column)
            {
                target_columns.push(column.to_owned());
                source_columns.push(original.clone());
            }
        }

        self.output.push(factory.copy_data(
            copy_source.clone(),
            source_columns,
            handler.current_table.clone(),
            target_columns,
        ));

        self.deferred_drops
            .push(MigrationOperation::DropTable(DropTable { table: copy_source }));

        Ok(())
    }

    fn finish(mut self) -> CoreResult<Vec<MigrationOperation>> {
        self.flush_all()?;

        let mut output = self.output;
        output.append(&mut self.deferred_drops);

        Ok(output)
    }
}

fn subordinate_table(operation: &MigrationOperation) -> &QualifiedName {
    match operation {
        MigrationOperation::AlterColumn(op) => &op.table,
        MigrationOperation::DropColumn(op) => &op.table,
        MigrationOperation::AddDefaultConstraint(op) => &op.table,
        MigrationOperation::DropDefaultConstraint(op) => &op.table,
        MigrationOperation::RenameColumn(op) => &op.table,
        MigrationOperation::AddPrimaryKey(op) => &op.table,
        MigrationOperation::DropPrimaryKey(op) => &op.table,
        MigrationOperation::AddUniqueConstraint(op) => &op.table,
        MigrationOperation::DropUniqueConstraint(op) => &op.table,
        MigrationOperation::AddForeignKey(op) => &op.table,
        MigrationOperation::DropForeignKey(op) => &op.table,
        other => unreachable!("{} is not a table subordinate", other.description()),
    }
}
