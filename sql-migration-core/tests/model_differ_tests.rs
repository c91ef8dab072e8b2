use pretty_assertions::assert_eq;
use schema_model::{
    ForeignKeyAction, PrimitiveKind, Property, QualifiedName, SchemaModel, Sequence, ValueLiteral,
};
use sql_migration_core::{
    diff, diff_with_cancellation, CancellationToken, Dialect, MigrationOperation, OperationKind,
    RenameTable,
};

fn dbo(name: &str) -> QualifiedName {
    QualifiedName::new(Some("dbo"), name)
}

fn kinds(operations: &[MigrationOperation]) -> Vec<OperationKind> {
    operations.iter().map(|op| op.kind()).collect()
}

/// A model with one of everything: keys, a foreign key, an index, a sequence.
fn webshop_model() -> SchemaModel {
    let mut model = SchemaModel::empty();

    let customer = model.push_entity("Customer");
    let customer_id = model.push_property(
        customer,
        Property {
            is_generated_on_add: true,
            ..Property::new("Id", PrimitiveKind::Int)
        },
    );
    let email = model.push_property(
        customer,
        Property {
            max_length: Some(256),
            ..Property::new("Email", PrimitiveKind::Text)
        },
    );
    model.push_primary_key(customer, None, vec![customer_id]);
    model.push_key(customer, None, vec![email]);

    let order = model.push_entity("Order");
    let order_id = model.push_property(order, Property::new("Id", PrimitiveKind::Int));
    let order_customer = model.push_property(order, Property::new("CustomerId", PrimitiveKind::Int));
    model.push_property(
        order,
        Property {
            default_value: Some(ValueLiteral::Int(0)),
            ..Property::new("Total", PrimitiveKind::Decimal)
        },
    );
    model.push_primary_key(order, None, vec![order_id]);
    model.push_foreign_key(
        order,
        None,
        customer,
        vec![order_customer],
        vec![customer_id],
        ForeignKeyAction::Cascade,
    );
    model.push_index(order, None, vec![order_customer], false);

    model.push_sequence(Sequence::new("OrderNumbers"));

    model
}

#[test]
fn diffing_a_model_against_itself_is_empty() {
    let source = webshop_model();
    let target = webshop_model();

    assert_eq!(diff(&source, &target, Dialect::SqlServer), vec![]);
    assert_eq!(diff(&source, &target, Dialect::Sqlite), vec![]);
}

#[test]
fn entities_with_matching_property_sets_are_paired_fuzzily() {
    let mut source = SchemaModel::empty();
    let pony = source.push_entity("Pony");
    source.push_property(pony, Property::new("Id", PrimitiveKind::Int));
    source.push_property(pony, Property::new("Name", PrimitiveKind::Text));
    source.push_property(pony, Property::new("Age", PrimitiveKind::Int));

    let mut target = SchemaModel::empty();
    let horse = target.push_entity("Horse");
    target.push_property(horse, Property::new("Id", PrimitiveKind::Int));
    target.push_property(horse, Property::new("Name", PrimitiveKind::Text));
    target.push_property(horse, Property::new("Age", PrimitiveKind::Int));

    let operations = diff(&source, &target, Dialect::SqlServer);

    assert_eq!(
        operations,
        vec![MigrationOperation::RenameTable(RenameTable {
            table: dbo("Pony"),
            new_name: "Horse".to_owned(),
        })]
    );

    // The reverse diff renames back.
    let reverse = diff(&target, &source, Dialect::SqlServer);

    assert_eq!(
        reverse,
        vec![MigrationOperation::RenameTable(RenameTable {
            table: dbo("Horse"),
            new_name: "Pony".to_owned(),
        })]
    );
}

#[test]
fn entities_below_the_overlap_threshold_are_dropped_and_created() {
    let mut source = SchemaModel::empty();
    let pony = source.push_entity("Pony");
    source.push_property(pony, Property::new("Id", PrimitiveKind::Int));
    source.push_property(pony, Property::new("Name", PrimitiveKind::Text));

    let mut target = SchemaModel::empty();
    let horse = target.push_entity("Horse");
    target.push_property(horse, Property::new("Id", PrimitiveKind::Int));
    target.push_property(horse, Property::new("Color", PrimitiveKind::Text));

    let operations = diff(&source, &target, Dialect::SqlServer);

    assert_eq!(
        kinds(&operations),
        vec![OperationKind::CreateTable, OperationKind::DropTable]
    );
}

#[test]
fn properties_pair_by_column_name_when_logical_names_changed() {
    let mut source = SchemaModel::empty();
    let entity = source.push_entity("T");
    source.push_property(
        entity,
        Property {
            column_name: Some("SharedCol".to_owned()),
            ..Property::new("OldProp", PrimitiveKind::Int)
        },
    );

    let mut target = SchemaModel::empty();
    let entity = target.push_entity("T");
    target.push_property(
        entity,
        Property {
            column_name: Some("SharedCol".to_owned()),
            ..Property::new("NewProp", PrimitiveKind::Int)
        },
    );

    assert_eq!(diff(&source, &target, Dialect::SqlServer), vec![]);
}

#[test]
fn a_changed_column_name_becomes_a_rename() {
    let mut source = SchemaModel::empty();
    let entity = source.push_entity("T");
    source.push_property(entity, Property::new("Name", PrimitiveKind::Text));

    let mut target = SchemaModel::empty();
    let entity = target.push_entity("T");
    target.push_property(
        entity,
        Property {
            column_name: Some("FullName".to_owned()),
            ..Property::new("Name", PrimitiveKind::Text)
        },
    );

    let operations = diff(&source, &target, Dialect::SqlServer);

    assert_eq!(kinds(&operations), vec![OperationKind::RenameColumn]);
}

#[test]
fn a_default_only_change_migrates_through_default_constraints() {
    let mut source = SchemaModel::empty();
    let entity = source.push_entity("T");
    source.push_property(
        entity,
        Property {
            default_value: Some(ValueLiteral::Int(5)),
            ..Property::new("Foo", PrimitiveKind::Int)
        },
    );

    let mut target = SchemaModel::empty();
    let entity = target.push_entity("T");
    target.push_property(
        entity,
        Property {
            default_value: Some(ValueLiteral::Int(6)),
            ..Property::new("Foo", PrimitiveKind::Int)
        },
    );

    let operations = diff(&source, &target, Dialect::SqlServer);

    assert_eq!(
        kinds(&operations),
        vec![
            OperationKind::DropDefaultConstraint,
            OperationKind::AddDefaultConstraint
        ]
    );
}

#[test]
fn a_reshaped_column_is_altered_with_its_default_reattached() {
    let mut source = SchemaModel::empty();
    let entity = source.push_entity("T");
    source.push_property(
        entity,
        Property {
            default_value: Some(ValueLiteral::Int(5)),
            ..Property::new("Foo", PrimitiveKind::Int)
        },
    );

    let mut target = SchemaModel::empty();
    let entity = target.push_entity("T");
    target.push_property(
        entity,
        Property {
            column_name: Some("Foo2".to_owned()),
            is_nullable: true,
            default_value: Some(ValueLiteral::Int(6)),
            ..Property::new("Foo", PrimitiveKind::Long)
        },
    );

    let operations = diff(&source, &target, Dialect::SqlServer);

    assert_eq!(
        kinds(&operations),
        vec![
            OperationKind::RenameColumn,
            OperationKind::DropDefaultConstraint,
            OperationKind::AlterColumn,
            OperationKind::AddDefaultConstraint,
        ]
    );

    match &operations[2] {
        MigrationOperation::AlterColumn(alter) => {
            assert_eq!(alter.column.store_type, "bigint");
            assert!(alter.column.is_nullable);
        }
        other => panic!("expected AlterColumn, got {}", other.description()),
    }
}

#[test]
fn table_rename_cycles_go_through_temporary_names() {
    let mut source = SchemaModel::empty();
    let first = source.push_entity_with_table("First", Some("A"), None);
    source.push_property(first, Property::new("Id", PrimitiveKind::Int));
    let second = source.push_entity_with_table("Second", Some("B"), None);
    source.push_property(second, Property::new("Id", PrimitiveKind::Int));

    let mut target = SchemaModel::empty();
    let first = target.push_entity_with_table("First", Some("B"), None);
    target.push_property(first, Property::new("Id", PrimitiveKind::Int));
    let second = target.push_entity_with_table("Second", Some("A"), None);
    target.push_property(second, Property::new("Id", PrimitiveKind::Int));

    let operations = diff(&source, &target, Dialect::Sqlite);

    let renames: Vec<(String, String)> = operations
        .iter()
        .map(|op| match op {
            MigrationOperation::RenameTable(rename) => {
                (rename.table.name.clone(), rename.new_name.clone())
            }
            other => panic!("expected only renames, got {}", other.description()),
        })
        .collect();

    assert_eq!(
        renames,
        vec![
            ("A".to_owned(), "__mig_tmp__0".to_owned()),
            ("B".to_owned(), "A".to_owned()),
            ("__mig_tmp__0".to_owned(), "B".to_owned()),
        ]
    );
}

#[test]
fn sequences_pair_exactly_and_compare_by_increment() {
    let mut source = SchemaModel::empty();
    source.push_sequence(Sequence::new("S1"));
    source.push_sequence(Sequence::new("S2"));

    let mut target = SchemaModel::empty();
    target.push_sequence(Sequence {
        increment_by: 5,
        ..Sequence::new("S1")
    });
    target.push_sequence(Sequence::new("S3"));

    let operations = diff(&source, &target, Dialect::SqlServer);

    assert_eq!(
        kinds(&operations),
        vec![
            OperationKind::CreateSequence,
            OperationKind::DropSequence,
            OperationKind::AlterSequence,
        ]
    );

    match &operations[2] {
        MigrationOperation::AlterSequence(alter) => {
            assert_eq!(alter.sequence, dbo("S1"));
            assert_eq!(alter.increment_by, 5);
        }
        other => panic!("expected AlterSequence, got {}", other.description()),
    }
}

#[test]
fn created_tables_inline_their_foreign_keys_and_collect_their_indexes() {
    let source = {
        let mut model = SchemaModel::empty();
        let customer = model.push_entity("Customer");
        let id = model.push_property(customer, Property::new("Id", PrimitiveKind::Int));
        model.push_primary_key(customer, None, vec![id]);
        model
    };

    let mut target = SchemaModel::empty();
    let customer = target.push_entity("Customer");
    let customer_id = target.push_property(customer, Property::new("Id", PrimitiveKind::Int));
    target.push_primary_key(customer, None, vec![customer_id]);

    let order = target.push_entity("Order");
    let order_id = target.push_property(order, Property::new("Id", PrimitiveKind::Int));
    let order_customer = target.push_property(order, Property::new("CustomerId", PrimitiveKind::Int));
    target.push_primary_key(order, None, vec![order_id]);
    target.push_foreign_key(
        order,
        None,
        customer,
        vec![order_customer],
        vec![customer_id],
        ForeignKeyAction::Cascade,
    );
    target.push_index(order, None, vec![order_customer], false);

    let operations = diff(&source, &target, Dialect::SqlServer);

    assert_eq!(
        kinds(&operations),
        vec![OperationKind::CreateTable, OperationKind::CreateIndex]
    );

    match &operations[0] {
        MigrationOperation::CreateTable(create) => {
            assert_eq!(create.table, dbo("Order"));
            assert_eq!(create.foreign_keys.len(), 1);
            assert_eq!(create.foreign_keys[0].referenced_table, dbo("Customer"));
            assert_eq!(create.foreign_keys[0].on_delete, ForeignKeyAction::Cascade);
            assert!(create.primary_key.is_some());
        }
        other => panic!("expected CreateTable, got {}", other.description()),
    }
}

#[test]
fn a_cancelled_token_stops_emission_at_the_first_boundary() {
    let source = SchemaModel::empty();
    let target = webshop_model();

    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let operations = diff_with_cancellation(&source, &target, Dialect::SqlServer, &cancellation);

    assert_eq!(operations, vec![]);
}
