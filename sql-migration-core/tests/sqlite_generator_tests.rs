use indoc::indoc;
use pretty_assertions::assert_eq;
use schema_model::{ForeignKeyAction, QualifiedName, ValueLiteral};
use sql_migration_core::{
    render_operations, AddColumn, AddForeignKey, AddPrimaryKey, AlterColumn, ColumnDefinition,
    CopyData, CreateDatabase, CreateTable, Dialect, DropIndex, MigrationError, MigrationOperation,
    MoveTable, RenameTable,
};

fn unqualified(name: &str) -> QualifiedName {
    QualifiedName::new(None, name)
}

fn render_one(operation: MigrationOperation) -> String {
    let mut statements = render_operations(&[operation], Dialect::Sqlite).unwrap();
    assert_eq!(statements.len(), 1);
    statements.remove(0)
}

fn column(name: &str, store_type: &str) -> ColumnDefinition {
    ColumnDefinition {
        name: name.to_owned(),
        store_type: store_type.to_owned(),
        is_nullable: false,
        default_value: None,
        default_sql: None,
        is_identity: false,
        is_computed: false,
    }
}

#[test]
fn create_database_is_not_expressible() {
    let error = render_operations(
        &[MigrationOperation::CreateDatabase(CreateDatabase {
            name: "MyDb".to_owned(),
        })],
        Dialect::Sqlite,
    )
    .unwrap_err();

    assert_eq!(
        error,
        MigrationError::OperationNotSupported {
            dialect: "SQLite",
            operation: "CreateDatabase",
        }
    );

    assert_eq!(
        error.to_string(),
        "The 'SQLite' dialect does not support the 'CreateDatabase' operation."
    );
}

#[test]
fn alter_column_is_not_expressible() {
    let error = render_operations(
        &[MigrationOperation::AlterColumn(AlterColumn {
            table: unqualified("T"),
            column: column("C", "INTEGER"),
        })],
        Dialect::Sqlite,
    )
    .unwrap_err();

    assert_eq!(
        error,
        MigrationError::OperationNotSupported {
            dialect: "SQLite",
            operation: "AlterColumn",
        }
    );
}

#[test]
fn move_table_flattens_the_schema_into_the_name() {
    let sql = render_one(MigrationOperation::MoveTable(MoveTable {
        table: QualifiedName::new(Some("my"), "Pony"),
        new_schema: "bro".to_owned(),
    }));

    assert_eq!(sql, "ALTER TABLE \"my.Pony\" RENAME TO \"bro.Pony\"");
}

#[test]
fn create_table_inlines_primary_key_and_foreign_keys() {
    let sql = render_one(MigrationOperation::CreateTable(CreateTable {
        table: unqualified("T2"),
        columns: vec![
            column("Id", "INTEGER"),
            ColumnDefinition {
                is_nullable: true,
                ..column("C", "INTEGER")
            },
        ],
        primary_key: Some(AddPrimaryKey {
            table: unqualified("T2"),
            name: "PK_T2".to_owned(),
            columns: vec!["Id".to_owned()],
            clustered: None,
        }),
        unique_constraints: vec![],
        foreign_keys: vec![AddForeignKey {
            table: unqualified("T2"),
            name: "FK1".to_owned(),
            columns: vec!["C".to_owned()],
            referenced_table: unqualified("T1"),
            referenced_columns: vec!["Id".to_owned()],
            on_delete: ForeignKeyAction::NoAction,
        }],
    }));

    let expected = indoc!(
        r#"
        CREATE TABLE "T2" (
            "Id" INTEGER NOT NULL,
            "C" INTEGER,
            CONSTRAINT "PK_T2" PRIMARY KEY ("Id"),
            CONSTRAINT "FK1" FOREIGN KEY ("C") REFERENCES "T1" ("Id")
        )"#
    );

    assert_eq!(sql, expected);
}

#[test]
fn rename_table_quotes_both_names() {
    let sql = render_one(MigrationOperation::RenameTable(RenameTable {
        table: unqualified("T2"),
        new_name: "__mig_tmp__T2".to_owned(),
    }));

    assert_eq!(sql, "ALTER TABLE \"T2\" RENAME TO \"__mig_tmp__T2\"");
}

#[test]
fn add_column_renders_type_nullability_and_default() {
    let sql = render_one(MigrationOperation::AddColumn(AddColumn {
        table: unqualified("T"),
        column: ColumnDefinition {
            default_value: Some(ValueLiteral::Int(5)),
            ..column("C", "INTEGER")
        },
    }));

    assert_eq!(sql, "ALTER TABLE \"T\" ADD COLUMN \"C\" INTEGER NOT NULL DEFAULT 5");
}

#[test]
fn byte_array_defaults_use_the_x_literal_form() {
    let sql = render_one(MigrationOperation::AddColumn(AddColumn {
        table: unqualified("T"),
        column: ColumnDefinition {
            is_nullable: true,
            default_value: Some(ValueLiteral::Bytes(vec![0xab, 0x01])),
            ..column("Blob", "BLOB")
        },
    }));

    assert_eq!(sql, "ALTER TABLE \"T\" ADD COLUMN \"Blob\" BLOB DEFAULT X'AB01'");
}

#[test]
fn copy_data_renders_an_insert_select() {
    let sql = render_one(MigrationOperation::CopyData(CopyData {
        source_table: unqualified("__mig_tmp__T2"),
        source_columns: vec!["Id".to_owned(), "C".to_owned()],
        target_table: unqualified("T2"),
        target_columns: vec!["Id".to_owned(), "C".to_owned()],
    }));

    assert_eq!(
        sql,
        "INSERT INTO \"T2\" (\"Id\", \"C\") SELECT \"Id\", \"C\" FROM \"__mig_tmp__T2\""
    );
}

#[test]
fn identifiers_with_embedded_quotes_are_doubled() {
    let sql = render_one(MigrationOperation::DropIndex(DropIndex {
        table: unqualified("T"),
        name: "foo\"bar".to_owned(),
    }));

    assert_eq!(sql, "DROP INDEX \"foo\"\"bar\"");
}
