use pretty_assertions::assert_eq;
use schema_model::{ForeignKeyAction, PrimitiveKind, Property, QualifiedName, SchemaModel};
use sql_migration_core::{
    generate_migration, plan_operations, Dialect, MigrationOperation, OperationKind,
};

fn unqualified(name: &str) -> QualifiedName {
    QualifiedName::new(None, name)
}

fn kinds(operations: &[MigrationOperation]) -> Vec<OperationKind> {
    operations.iter().map(|op| op.kind()).collect()
}

/// T1(Id pk) and T2(Id pk, C), with an optional foreign key T2.C → T1.Id and
/// an optional new name for T2.
fn two_table_model(foreign_key: bool, child_name: &str) -> SchemaModel {
    let mut model = SchemaModel::empty();

    let parent = model.push_entity("T1");
    let parent_id = model.push_property(parent, Property::new("Id", PrimitiveKind::Int));
    model.push_primary_key(parent, Some("PK_T1".to_owned()), vec![parent_id]);

    let child = model.push_entity(child_name);
    let child_id = model.push_property(child, Property::new("Id", PrimitiveKind::Int));
    let child_ref = model.push_property(
        child,
        Property {
            is_nullable: true,
            ..Property::new("C", PrimitiveKind::Int)
        },
    );
    model.push_primary_key(child, Some("PK_Child".to_owned()), vec![child_id]);

    if foreign_key {
        model.push_foreign_key(
            child,
            Some("FK_Child_Parent".to_owned()),
            parent,
            vec![child_ref],
            vec![parent_id],
            ForeignKeyAction::NoAction,
        );
    }

    model
}

#[test]
fn an_added_foreign_key_triggers_the_rebuild_protocol() {
    let source = two_table_model(false, "T2");
    let target = two_table_model(true, "T2");

    let plan = plan_operations(&source, &target, Dialect::Sqlite).unwrap();

    assert_eq!(
        kinds(&plan),
        vec![
            OperationKind::RenameTable,
            OperationKind::CreateTable,
            OperationKind::CopyData,
            OperationKind::DropTable,
        ]
    );

    match &plan[0] {
        MigrationOperation::RenameTable(rename) => {
            assert_eq!(rename.table, unqualified("T2"));
            assert_eq!(rename.new_name, "__mig_tmp__T2");
        }
        other => panic!("expected RenameTable, got {}", other.description()),
    }

    match &plan[1] {
        MigrationOperation::CreateTable(create) => {
            assert_eq!(create.table, unqualified("T2"));
            assert_eq!(create.foreign_keys.len(), 1);
            assert_eq!(create.foreign_keys[0].name, "FK_Child_Parent");
        }
        other => panic!("expected CreateTable, got {}", other.description()),
    }

    match &plan[2] {
        MigrationOperation::CopyData(copy) => {
            assert_eq!(copy.source_table, unqualified("__mig_tmp__T2"));
            assert_eq!(copy.target_table, unqualified("T2"));
            assert_eq!(copy.source_columns, vec!["Id".to_owned(), "C".to_owned()]);
            assert_eq!(copy.target_columns, vec!["Id".to_owned(), "C".to_owned()]);
        }
        other => panic!("expected CopyData, got {}", other.description()),
    }

    match &plan[3] {
        MigrationOperation::DropTable(drop) => {
            assert_eq!(drop.table, unqualified("__mig_tmp__T2"));
        }
        other => panic!("expected DropTable, got {}", other.description()),
    }
}

#[test]
fn the_rebuild_protocol_renders_end_to_end() {
    let source = two_table_model(false, "T2");
    let target = two_table_model(true, "T2");

    let statements = generate_migration(&source, &target, Dialect::Sqlite).unwrap();

    assert_eq!(statements.len(), 4);
    assert_eq!(statements[0], "ALTER TABLE \"T2\" RENAME TO \"__mig_tmp__T2\"");
    assert!(statements[1].starts_with("CREATE TABLE \"T2\" ("));
    assert!(statements[1].contains("CONSTRAINT \"FK_Child_Parent\" FOREIGN KEY (\"C\") REFERENCES \"T1\" (\"Id\")"));
    assert_eq!(
        statements[2],
        "INSERT INTO \"T2\" (\"Id\", \"C\") SELECT \"Id\", \"C\" FROM \"__mig_tmp__T2\""
    );
    assert_eq!(statements[3], "DROP TABLE \"__mig_tmp__T2\"");
}

#[test]
fn a_renamed_table_rebuild_copies_from_the_old_name() {
    let source = two_table_model(false, "T2");
    let target = two_table_model(true, "T3");

    let plan = plan_operations(&source, &target, Dialect::Sqlite).unwrap();

    assert_eq!(
        kinds(&plan),
        vec![
            OperationKind::CreateTable,
            OperationKind::CopyData,
            OperationKind::DropTable,
        ]
    );

    match &plan[1] {
        MigrationOperation::CopyData(copy) => {
            assert_eq!(copy.source_table, unqualified("T2"));
            assert_eq!(copy.target_table, unqualified("T3"));
        }
        other => panic!("expected CopyData, got {}", other.description()),
    }

    match &plan[2] {
        MigrationOperation::DropTable(drop) => {
            assert_eq!(drop.table, unqualified("T2"));
        }
        other => panic!("expected DropTable, got {}", other.description()),
    }
}

#[test]
fn rename_index_expands_to_drop_and_create() {
    let mut source = SchemaModel::empty();
    let entity = source.push_entity("T");
    let c = source.push_property(entity, Property::new("C", PrimitiveKind::Int));
    source.push_index(entity, Some("IX".to_owned()), vec![c], false);

    let mut target = SchemaModel::empty();
    let entity = target.push_entity("T");
    let c = target.push_property(entity, Property::new("C", PrimitiveKind::Int));
    target.push_index(entity, Some("IX2".to_owned()), vec![c], false);

    let plan = plan_operations(&source, &target, Dialect::Sqlite).unwrap();

    assert_eq!(
        kinds(&plan),
        vec![OperationKind::DropIndex, OperationKind::CreateIndex]
    );

    match (&plan[0], &plan[1]) {
        (MigrationOperation::DropIndex(drop), MigrationOperation::CreateIndex(create)) => {
            assert_eq!(drop.name, "IX");
            assert_eq!(create.name, "IX2");
            assert_eq!(create.columns, vec!["C".to_owned()]);
            assert_eq!(create.table, unqualified("T"));
        }
        other => panic!("unexpected plan: {:?}", other),
    }
}

#[test]
fn supported_subordinates_pass_through_unchanged() {
    let mut source = SchemaModel::empty();
    let entity = source.push_entity("T");
    source.push_property(entity, Property::new("Id", PrimitiveKind::Int));

    let mut target = SchemaModel::empty();
    let entity = target.push_entity("T");
    target.push_property(entity, Property::new("Id", PrimitiveKind::Int));
    target.push_property(
        entity,
        Property {
            is_nullable: true,
            ..Property::new("C", PrimitiveKind::Int)
        },
    );

    let plan = plan_operations(&source, &target, Dialect::Sqlite).unwrap();

    assert_eq!(kinds(&plan), vec![OperationKind::AddColumn]);
}

#[test]
fn a_dropped_column_is_not_copied_into_the_rebuilt_table() {
    let mut source = SchemaModel::empty();
    let entity = source.push_entity("T");
    source.push_property(entity, Property::new("Id", PrimitiveKind::Int));
    source.push_property(
        entity,
        Property {
            is_nullable: true,
            ..Property::new("Obsolete", PrimitiveKind::Text)
        },
    );

    let mut target = SchemaModel::empty();
    let entity = target.push_entity("T");
    target.push_property(entity, Property::new("Id", PrimitiveKind::Int));

    let plan = plan_operations(&source, &target, Dialect::Sqlite).unwrap();

    assert_eq!(
        kinds(&plan),
        vec![
            OperationKind::RenameTable,
            OperationKind::CreateTable,
            OperationKind::CopyData,
            OperationKind::DropTable,
        ]
    );

    match &plan[2] {
        MigrationOperation::CopyData(copy) => {
            assert_eq!(copy.source_columns, vec!["Id".to_owned()]);
            assert_eq!(copy.target_columns, vec!["Id".to_owned()]);
        }
        other => panic!("expected CopyData, got {}", other.description()),
    }
}
