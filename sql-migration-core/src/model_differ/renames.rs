//! Transitive rename resolution.
//!
//! Within each rename category, a later rename whose source name equals an
//! earlier rename's new name would collide at execution time. Such renames
//! are split: the earlier rename targets a fresh temporary name, and a
//! trailing rename moves the temporary to the intended name. Every prefix of
//! the fixed sequence keeps all names unique.

use super::TEMP_NAME_PREFIX;
use crate::operations::{
    MigrationOperation, OperationCollection, OperationKind, RenameColumn, RenameIndex,
    RenameSequence, RenameTable,
};
use schema_model::QualifiedName;

pub(crate) fn resolve_transitive_renames(
    collection: &mut OperationCollection,
    temp_name_counter: &mut u32,
) {
    resolve(
        collection,
        OperationKind::RenameSequence,
        temp_name_counter,
        |op| match op {
            MigrationOperation::RenameSequence(rename) => (
                rename.sequence.schema.clone().unwrap_or_default(),
                rename.sequence.name.clone(),
                rename.new_name.clone(),
            ),
            _ => unreachable!(),
        },
        |op, temp| match op {
            MigrationOperation::RenameSequence(rename) => {
                MigrationOperation::RenameSequence(RenameSequence {
                    sequence: rename.sequence.clone(),
                    new_name: temp,
                })
            }
            _ => unreachable!(),
        },
        |op, temp| match op {
            MigrationOperation::RenameSequence(rename) => {
                MigrationOperation::RenameSequence(RenameSequence {
                    sequence: QualifiedName {
                        schema: rename.sequence.schema.clone(),
                        name: temp,
                    },
                    new_name: rename.new_name.clone(),
                })
            }
            _ => unreachable!(),
        },
    );

    resolve(
        collection,
        OperationKind::RenameTable,
        temp_name_counter,
        |op| match op {
            MigrationOperation::RenameTable(rename) => (
                rename.table.schema.clone().unwrap_or_default(),
                rename.table.name.clone(),
                rename.new_name.clone(),
            ),
            _ => unreachable!(),
        },
        |op, temp| match op {
            MigrationOperation::RenameTable(rename) => MigrationOperation::RenameTable(RenameTable {
                table: rename.table.clone(),
                new_name: temp,
            }),
            _ => unreachable!(),
        },
        |op, temp| match op {
            MigrationOperation::RenameTable(rename) => MigrationOperation::RenameTable(RenameTable {
                table: QualifiedName {
                    schema: rename.table.schema.clone(),
                    name: temp,
                },
                new_name: rename.new_name.clone(),
            }),
            _ => unreachable!(),
        },
    );

    resolve(
        collection,
        OperationKind::RenameColumn,
        temp_name_counter,
        |op| match op {
            MigrationOperation::RenameColumn(rename) => (
                rename.table.dotted(),
                rename.name.clone(),
                rename.new_name.clone(),
            ),
            _ => unreachable!(),
        },
        |op, temp| match op {
            MigrationOperation::RenameColumn(rename) => {
                MigrationOperation::RenameColumn(RenameColumn {
                    table: rename.table.clone(),
                    name: rename.name.clone(),
                    new_name: temp,
                })
            }
            _ => unreachable!(),
        },
        |op, temp| match op {
            MigrationOperation::RenameColumn(rename) => {
                MigrationOperation::RenameColumn(RenameColumn {
                    table: rename.table.clone(),
                    name: temp,
                    new_name: rename.new_name.clone(),
                })
            }
            _ => unreachable!(),
        },
    );

    resolve(
        collection,
        OperationKind::RenameIndex,
        temp_name_counter,
        |op| match op {
            MigrationOperation::RenameIndex(rename) => (
                rename.table.dotted(),
                rename.name.clone(),
                rename.new_name.clone(),
            ),
            _ => unreachable!(),
        },
        |op, temp| match op {
            MigrationOperation::RenameIndex(rename) => MigrationOperation::RenameIndex(RenameIndex {
                table: rename.table.clone(),
                name: rename.name.clone(),
                new_name: temp,
            }),
            _ => unreachable!(),
        },
        |op, temp| match op {
            MigrationOperation::RenameIndex(rename) => MigrationOperation::RenameIndex(RenameIndex {
                table: rename.table.clone(),
                name: temp,
                new_name: rename.new_name.clone(),
            }),
            _ => unreachable!(),
        },
    );
}

/// One rename category. `entry` projects an operation to (scope, name,
/// new-name); `retarget` points the original rename at the temporary;
/// `trailing` moves the temporary to the intended name.
fn resolve(
    collection: &mut OperationCollection,
    kind: OperationKind,
    temp_name_counter: &mut u32,
    entry: impl Fn(&MigrationOperation) -> (String, String, String),
    retarget: impl Fn(&MigrationOperation, String) -> MigrationOperation,
    trailing: impl Fn(&MigrationOperation, String) -> MigrationOperation,
) {
    let operations = collection.take(kind);

    if operations.len() < 2 {
        collection.replace(kind, operations);
        return;
    }

    let entries: Vec<(String, String, String)> = operations.iter().map(&entry).collect();

    let mut fixed = Vec::with_capacity(operations.len());
    let mut trailing_renames = Vec::new();

    for (idx, operation) in operations.iter().enumerate() {
        let (scope, _, new_name) = &entries[idx];

        let conflicts = entries[idx + 1..]
            .iter()
            .any(|(later_scope, later_name, _)| later_scope == scope && later_name == new_name);

        if conflicts {
            let temp = format!("{}{}", TEMP_NAME_PREFIX, temp_name_counter);
            *temp_name_counter += 1;

            fixed.push(retarget(operation, temp.clone()));
            trailing_renames.push(trailing(operation, temp));
        } else {
            fixed.push(operation.clone());
        }
    }

    fixed.append(&mut trailing_renames);
    collection.replace(kind, fixed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rename_column(table: &str, name: &str, new_name: &str) -> MigrationOperation {
        MigrationOperation::RenameColumn(RenameColumn {
            table: QualifiedName::new(None, table),
            name: name.to_owned(),
            new_name: new_name.to_owned(),
        })
    }

    fn as_tuples(operations: &[MigrationOperation]) -> Vec<(String, String)> {
        operations
            .iter()
            .map(|op| match op {
                MigrationOperation::RenameColumn(rename) => {
                    (rename.name.clone(), rename.new_name.clone())
                }
                _ => unreachable!(),
            })
            .collect()
    }

    fn resolve_columns(operations: Vec<MigrationOperation>) -> Vec<MigrationOperation> {
        let mut collection = OperationCollection::default();

        for operation in operations {
            collection.push(operation);
        }

        let mut counter = 0;
        resolve_transitive_renames(&mut collection, &mut counter);

        collection.into_ordered()
    }

    #[test]
    fn a_swap_cycle_goes_through_a_temporary_name() {
        let resolved = resolve_columns(vec![
            rename_column("T", "A", "B"),
            rename_column("T", "B", "A"),
        ]);

        assert_eq!(
            as_tuples(&resolved),
            &[
                ("A".to_owned(), "__mig_tmp__0".to_owned()),
                ("B".to_owned(), "A".to_owned()),
                ("__mig_tmp__0".to_owned(), "B".to_owned()),
            ]
        );
    }

    #[test]
    fn a_rename_chain_goes_through_a_temporary_name() {
        let resolved = resolve_columns(vec![
            rename_column("T", "A", "B"),
            rename_column("T", "B", "C"),
        ]);

        assert_eq!(
            as_tuples(&resolved),
            &[
                ("A".to_owned(), "__mig_tmp__0".to_owned()),
                ("B".to_owned(), "C".to_owned()),
                ("__mig_tmp__0".to_owned(), "B".to_owned()),
            ]
        );
    }

    #[test]
    fn renames_in_different_scopes_do_not_interfere() {
        let resolved = resolve_columns(vec![
            rename_column("T1", "A", "B"),
            rename_column("T2", "B", "C"),
        ]);

        assert_eq!(
            as_tuples(&resolved),
            &[("A".to_owned(), "B".to_owned()), ("B".to_owned(), "C".to_owned())]
        );
    }

    #[test]
    fn every_prefix_of_the_fixed_sequence_keeps_names_unique() {
        let resolved = resolve_columns(vec![
            rename_column("T", "A", "B"),
            rename_column("T", "B", "C"),
            rename_column("T", "C", "A"),
        ]);

        // Simulate execution over the live set of column names.
        let mut live: Vec<String> = vec!["A".to_owned(), "B".to_owned(), "C".to_owned()];

        for (from, to) in as_tuples(&resolved) {
            assert!(live.contains(&from), "renaming unknown column {}", from);
            assert!(!live.contains(&to), "rename target {} already exists", to);
            live.retain(|name| name != &from);
            live.push(to);
        }

        assert_eq!(live.len(), 3);
    }
}
