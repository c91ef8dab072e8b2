use super::common::{escape_string_literal, format_hex, IteratorJoin, Quoted};
use super::SqlGenerator;
use crate::{error::CoreResult, flavour::SqlServerFlavour, operations::*};
use indoc::formatdoc;
use schema_model::{ForeignKeyAction, QualifiedName, ValueLiteral};
use std::fmt::Write as _;

impl SqlGenerator for SqlServerFlavour {
    fn dialect_name(&self) -> &'static str {
        "SQL Server"
    }

    fn quote<'a>(&self, name: &'a str) -> Quoted<&'a str> {
        Quoted::mssql_ident(name)
    }

    fn render_qualified_name(&self, name: &QualifiedName) -> String {
        match &name.schema {
            Some(schema) => format!("{}.{}", self.quote(schema), self.quote(&name.name)),
            None => self.quote(&name.name).to_string(),
        }
    }

    fn render_create_database(&self, op: &CreateDatabase) -> CoreResult<String> {
        Ok(format!("CREATE DATABASE {}", self.quote(&op.name)))
    }

    fn render_drop_database(&self, op: &DropDatabase) -> CoreResult<String> {
        Ok(format!("DROP DATABASE {}", self.quote(&op.name)))
    }

    fn render_create_sequence(&self, op: &CreateSequence) -> CoreResult<String> {
        let mut stmt = format!(
            "CREATE SEQUENCE {} AS {} START WITH {} INCREMENT BY {}",
            self.render_qualified_name(&op.sequence),
            op.store_type,
            op.start_value,
            op.increment_by,
        );

        push_sequence_bounds(&mut stmt, op.min_value, op.max_value);

        Ok(stmt)
    }

    fn render_drop_sequence(&self, op: &DropSequence) -> CoreResult<String> {
        Ok(format!("DROP SEQUENCE {}", self.render_qualified_name(&op.sequence)))
    }

    fn render_move_sequence(&self, op: &MoveSequence) -> CoreResult<String> {
        Ok(format!(
            "ALTER SCHEMA {} TRANSFER {}",
            self.quote(&op.new_schema),
            self.render_qualified_name(&op.sequence),
        ))
    }

    fn render_rename_sequence(&self, op: &RenameSequence) -> CoreResult<String> {
        Ok(render_sp_rename(&op.sequence.dotted(), &op.new_name, "OBJECT"))
    }

    fn render_alter_sequence(&self, op: &AlterSequence) -> CoreResult<String> {
        let mut stmt = format!(
            "ALTER SEQUENCE {} INCREMENT BY {}",
            self.render_qualified_name(&op.sequence),
            op.increment_by,
        );

        push_sequence_bounds(&mut stmt, op.min_value, op.max_value);

        Ok(stmt)
    }

    fn render_create_table(&self, op: &CreateTable) -> CoreResult<String> {
        let mut lines: Vec<String> = op.columns.iter().map(render_column).collect();

        if let Some(primary_key) = &op.primary_key {
            lines.push(render_primary_key_constraint(primary_key));
        }

        for unique in &op.unique_constraints {
            lines.push(render_unique_constraint_body(unique));
        }

        for foreign_key in &op.foreign_keys {
            lines.push(render_foreign_key_constraint(self, foreign_key));
        }

        Ok(format!(
            "CREATE TABLE {} (\n{}{}\n)",
            self.render_qualified_name(&op.table),
            super::common::SQL_INDENTATION,
            lines.join(&format!(",\n{}", super::common::SQL_INDENTATION)),
        ))
    }

    fn render_drop_table(&self, op: &DropTable) -> CoreResult<String> {
        Ok(format!("DROP TABLE {}", self.render_qualified_name(&op.table)))
    }

    fn render_rename_table(&self, op: &RenameTable) -> CoreResult<String> {
        Ok(render_sp_rename(&op.table.dotted(), &op.new_name, "OBJECT"))
    }

    fn render_move_table(&self, op: &MoveTable) -> CoreResult<String> {
        Ok(format!(
            "ALTER SCHEMA {} TRANSFER {}",
            self.quote(&op.new_schema),
            self.render_qualified_name(&op.table),
        ))
    }

    fn render_add_column(&self, op: &AddColumn) -> CoreResult<String> {
        Ok(format!(
            "ALTER TABLE {} ADD {}",
            self.render_qualified_name(&op.table),
            render_column(&op.column),
        ))
    }

    fn render_drop_column(&self, op: &DropColumn) -> CoreResult<String> {
        Ok(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.render_qualified_name(&op.table),
            self.quote(&op.name),
        ))
    }

    fn render_alter_column(&self, op: &AlterColumn) -> CoreResult<String> {
        // Defaults are never part of ALTER COLUMN; they travel through the
        // default-constraint operations.
        let nullability = if op.column.is_nullable { "" } else { " NOT NULL" };

        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} {}{}",
            self.render_qualified_name(&op.table),
            self.quote(&op.column.name),
            op.column.store_type,
            nullability,
        ))
    }

    fn render_add_default_constraint(&self, op: &AddDefaultConstraint) -> CoreResult<String> {
        let default = render_default(op.default_value.as_ref(), op.default_sql.as_deref())
            .unwrap_or_else(|| "NULL".to_owned());

        Ok(format!(
            "ALTER TABLE {} ADD DEFAULT {} FOR {}",
            self.render_qualified_name(&op.table),
            default,
            self.quote(&op.column),
        ))
    }

    fn render_drop_default_constraint(&self, op: &DropDefaultConstraint) -> CoreResult<String> {
        // The constraint name is server-generated, so it has to be looked up
        // at execution time.
        Ok(formatdoc!(
            r#"
            DECLARE @var0 nvarchar(128)
            SELECT @var0 = name FROM sys.default_constraints WHERE parent_object_id = OBJECT_ID(N{table_name}) AND COL_NAME(parent_object_id, parent_column_id) = N{column_name}
            EXECUTE('ALTER TABLE {table} DROP CONSTRAINT "' + @var0 + '"')"#,
            table_name = Quoted::Single(op.table.dotted()),
            column_name = Quoted::Single(&op.column),
            table = self.render_qualified_name(&op.table),
        ))
    }

    fn render_rename_column(&self, op: &RenameColumn) -> CoreResult<String> {
        let object = format!("{}.{}", op.table.dotted(), op.name);

        Ok(render_sp_rename(&object, &op.new_name, "COLUMN"))
    }

    fn render_add_primary_key(&self, op: &AddPrimaryKey) -> CoreResult<String> {
        Ok(format!(
            "ALTER TABLE {} ADD {}",
            self.render_qualified_name(&op.table),
            render_primary_key_constraint(op),
        ))
    }

    fn render_drop_primary_key(&self, op: &DropPrimaryKey) -> CoreResult<String> {
        Ok(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.render_qualified_name(&op.table),
            self.quote(&op.name),
        ))
    }

    fn render_add_unique_constraint(&self, op: &AddUniqueConstraint) -> CoreResult<String> {
        Ok(format!(
            "ALTER TABLE {} ADD {}",
            self.render_qualified_name(&op.table),
            render_unique_constraint_body(op),
        ))
    }

    fn render_drop_unique_constraint(&self, op: &DropUniqueConstraint) -> CoreResult<String> {
        Ok(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.render_qualified_name(&op.table),
            self.quote(&op.name),
        ))
    }

    fn render_add_foreign_key(&self, op: &AddForeignKey) -> CoreResult<String> {
        Ok(format!(
            "ALTER TABLE {} ADD {}",
            self.render_qualified_name(&op.table),
            render_foreign_key_constraint(self, op),
        ))
    }

    fn render_drop_foreign_key(&self, op: &DropForeignKey) -> CoreResult<String> {
        Ok(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.render_qualified_name(&op.table),
            self.quote(&op.name),
        ))
    }

    fn render_create_index(&self, op: &CreateIndex) -> CoreResult<String> {
        let unique = if op.is_unique { "UNIQUE " } else { "" };
        // Indexes default to nonclustered; only an explicit request emits the
        // keyword.
        let clustered = if op.clustered == Some(true) { "CLUSTERED " } else { "" };

        Ok(format!(
            "CREATE {}{}INDEX {} ON {} ({})",
            unique,
            clustered,
            self.quote(&op.name),
            self.render_qualified_name(&op.table),
            op.columns.iter().map(|c| Quoted::mssql_ident(c)).join(", "),
        ))
    }

    fn render_drop_index(&self, op: &DropIndex) -> CoreResult<String> {
        Ok(format!(
            "DROP INDEX {} ON {}",
            self.quote(&op.name),
            self.render_qualified_name(&op.table),
        ))
    }

    fn render_rename_index(&self, op: &RenameIndex) -> CoreResult<String> {
        let object = format!("{}.{}", op.table.dotted(), op.name);

        Ok(render_sp_rename(&object, &op.new_name, "INDEX"))
    }
}

fn render_sp_rename(object: &str, new_name: &str, object_type: &str) -> String {
    format!(
        "EXECUTE sp_rename @objname = N{}, @newname = N{}, @objtype = N{}",
        Quoted::Single(object),
        Quoted::Single(new_name),
        Quoted::Single(object_type),
    )
}

fn render_column(column: &ColumnDefinition) -> String {
    let mut out = format!("{} {}", Quoted::mssql_ident(&column.name), column.store_type);

    if !column.is_nullable {
        out.push_str(" NOT NULL");
    }

    if column.is_identity {
        out.push_str(" IDENTITY");
    } else if let Some(default) =
        render_default(column.default_value.as_ref(), column.default_sql.as_deref())
    {
        write!(out, " DEFAULT {}", default).unwrap();
    }

    out
}

fn render_default(value: Option<&ValueLiteral>, sql: Option<&str>) -> Option<String> {
    if let Some(expression) = sql {
        return Some(format!("({})", expression));
    }

    value.map(|value| match value {
        ValueLiteral::Int(i) => i.to_string(),
        ValueLiteral::Double(d) => d.to_string(),
        ValueLiteral::Bool(true) => "1".to_owned(),
        ValueLiteral::Bool(false) => "0".to_owned(),
        ValueLiteral::Text(s) => format!("'{}'", escape_string_literal(s)),
        ValueLiteral::Bytes(bytes) => format!("0x{}", format_hex(bytes)),
    })
}

fn render_primary_key_constraint(primary_key: &AddPrimaryKey) -> String {
    // Primary keys are nonclustered unless explicitly requested otherwise.
    let clustered = match primary_key.clustered {
        Some(true) => "CLUSTERED",
        _ => "NONCLUSTERED",
    };

    format!(
        "CONSTRAINT {} PRIMARY KEY {} ({})",
        Quoted::mssql_ident(&primary_key.name),
        clustered,
        primary_key.columns.iter().map(|c| Quoted::mssql_ident(c)).join(", "),
    )
}

fn render_unique_constraint_body(unique: &AddUniqueConstraint) -> String {
    format!(
        "CONSTRAINT {} UNIQUE ({})",
        Quoted::mssql_ident(&unique.name),
        unique.columns.iter().map(|c| Quoted::mssql_ident(c)).join(", "),
    )
}

fn render_foreign_key_constraint(flavour: &SqlServerFlavour, foreign_key: &AddForeignKey) -> String {
    let mut out = format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        Quoted::mssql_ident(&foreign_key.name),
        foreign_key.columns.iter().map(|c| Quoted::mssql_ident(c)).join(", "),
        flavour.render_qualified_name(&foreign_key.referenced_table),
        foreign_key
            .referenced_columns
            .iter()
            .map(|c| Quoted::mssql_ident(c))
            .join(", "),
    );

    match foreign_key.on_delete {
        ForeignKeyAction::NoAction => (),
        ForeignKeyAction::Restrict => out.push_str(" ON DELETE NO ACTION"),
        ForeignKeyAction::Cascade => out.push_str(" ON DELETE CASCADE"),
        ForeignKeyAction::SetNull => out.push_str(" ON DELETE SET NULL"),
        ForeignKeyAction::SetDefault => out.push_str(" ON DELETE SET DEFAULT"),
    }

    out
}

fn push_sequence_bounds(stmt: &mut String, min_value: Option<i64>, max_value: Option<i64>) {
    if let Some(min) = min_value {
        write!(stmt, " MINVALUE {}", min).unwrap();
    }

    if let Some(max) = max_value {
        write!(stmt, " MAXVALUE {}", max).unwrap();
    }
}
