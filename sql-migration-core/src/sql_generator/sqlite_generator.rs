use super::common::{
    escape_string_literal, format_hex, render_on_delete, IteratorJoin, Quoted, SQL_INDENTATION,
};
use super::SqlGenerator;
use crate::{error::CoreResult, flavour::SqliteFlavour, operations::*};
use schema_model::{QualifiedName, ValueLiteral};
use std::fmt::Write as _;

impl SqlGenerator for SqliteFlavour {
    fn dialect_name(&self) -> &'static str {
        "SQLite"
    }

    fn quote<'a>(&self, name: &'a str) -> Quoted<&'a str> {
        Quoted::sqlite_ident(name)
    }

    /// SQLite has no schemas; a qualified name is flattened into a single
    /// identifier by concatenation with a period.
    fn render_qualified_name(&self, name: &QualifiedName) -> String {
        Quoted::Double(name.dotted()).to_string()
    }

    fn render_create_table(&self, op: &CreateTable) -> CoreResult<String> {
        let mut lines: Vec<String> = op.columns.iter().map(render_column).collect();

        if let Some(primary_key) = &op.primary_key {
            lines.push(format!(
                "CONSTRAINT {} PRIMARY KEY ({})",
                Quoted::sqlite_ident(&primary_key.name),
                primary_key.columns.iter().map(|c| Quoted::sqlite_ident(c)).join(", "),
            ));
        }

        for unique in &op.unique_constraints {
            lines.push(format!(
                "CONSTRAINT {} UNIQUE ({})",
                Quoted::sqlite_ident(&unique.name),
                unique.columns.iter().map(|c| Quoted::sqlite_ident(c)).join(", "),
            ));
        }

        for foreign_key in &op.foreign_keys {
            lines.push(render_foreign_key_constraint(self, foreign_key));
        }

        Ok(format!(
            "CREATE TABLE {} (\n{}{}\n)",
            self.render_qualified_name(&op.table),
            SQL_INDENTATION,
            lines.join(&format!(",\n{}", SQL_INDENTATION)),
        ))
    }

    fn render_drop_table(&self, op: &DropTable) -> CoreResult<String> {
        Ok(format!("DROP TABLE {}", self.render_qualified_name(&op.table)))
    }

    fn render_rename_table(&self, op: &RenameTable) -> CoreResult<String> {
        let new_name = QualifiedName {
            schema: op.table.schema.clone(),
            name: op.new_name.clone(),
        };

        Ok(format!(
            "ALTER TABLE {} RENAME TO {}",
            self.render_qualified_name(&op.table),
            self.render_qualified_name(&new_name),
        ))
    }

    /// A move is a rename under the flattened-name convention.
    fn render_move_table(&self, op: &MoveTable) -> CoreResult<String> {
        let new_name = QualifiedName {
            schema: Some(op.new_schema.clone()),
            name: op.table.name.clone(),
        };

        Ok(format!(
            "ALTER TABLE {} RENAME TO {}",
            self.render_qualified_name(&op.table),
            self.render_qualified_name(&new_name),
        ))
    }

    fn render_add_column(&self, op: &AddColumn) -> CoreResult<String> {
        Ok(format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.render_qualified_name(&op.table),
            render_column(&op.column),
        ))
    }

    fn render_create_index(&self, op: &CreateIndex) -> CoreResult<String> {
        let unique = if op.is_unique { "UNIQUE " } else { "" };

        Ok(format!(
            "CREATE {}INDEX {} ON {} ({})",
            unique,
            self.quote(&op.name),
            self.render_qualified_name(&op.table),
            op.columns.iter().map(|c| Quoted::sqlite_ident(c)).join(", "),
        ))
    }

    fn render_drop_index(&self, op: &DropIndex) -> CoreResult<String> {
        Ok(format!("DROP INDEX {}", self.quote(&op.name)))
    }

    fn render_copy_data(&self, op: &CopyData) -> CoreResult<String> {
        Ok(format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            self.render_qualified_name(&op.target_table),
            op.target_columns.iter().map(|c| Quoted::sqlite_ident(c)).join(", "),
            op.source_columns.iter().map(|c| Quoted::sqlite_ident(c)).join(", "),
            self.render_qualified_name(&op.source_table),
        ))
    }
}

fn render_column(column: &ColumnDefinition) -> String {
    let mut out = format!("{} {}", Quoted::sqlite_ident(&column.name), column.store_type);

    if !column.is_nullable {
        out.push_str(" NOT NULL");
    }

    if let Some(default) = render_default(column.default_value.as_ref(), column.default_sql.as_deref())
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
        ValueLiteral::Bytes(bytes) => format!("X'{}'", format_hex(bytes)),
    })
}

fn render_foreign_key_constraint(flavour: &SqliteFlavour, foreign_key: &AddForeignKey) -> String {
    let mut out = format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        Quoted::sqlite_ident(&foreign_key.name),
        foreign_key.columns.iter().map(|c| Quoted::sqlite_ident(c)).join(", "),
        flavour.render_qualified_name(&foreign_key.referenced_table),
        foreign_key
            .referenced_columns
            .iter()
            .map(|c| Quoted::sqlite_ident(c))
            .join(", "),
    );

    let on_delete = render_on_delete(foreign_key.on_delete);

    if !on_delete.is_empty() {
        out.push(' ');
        out.push_str(on_delete);
    }

    out
}
