use once_cell::sync::Lazy;
use regex::Regex;
use schema_model::ForeignKeyAction;
use std::borrow::Cow;
use std::fmt::{self, Display, Write as _};

pub(crate) const SQL_INDENTATION: &str = "    ";

/// An identifier or literal wrapped in dialect delimiters. Embedded
/// delimiter characters are doubled on display.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Quoted<T> {
    SquareBrackets(T),
    Double(T),
    Single(T),
}

impl<'a> Quoted<&'a str> {
    pub(crate) fn mssql_ident(name: &'a str) -> Quoted<&'a str> {
        Quoted::SquareBrackets(name)
    }

    pub(crate) fn sqlite_ident(name: &'a str) -> Quoted<&'a str> {
        Quoted::Double(name)
    }
}

impl<T: Display> Display for Quoted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Only the closing delimiter can terminate the identifier, so
            // only it gets doubled.
            Quoted::SquareBrackets(inner) => {
                write!(f, "[{}]", inner.to_string().replace(']', "]]"))
            }
            Quoted::Double(inner) => write!(f, "\"{}\"", inner.to_string().replace('"', "\"\"")),
            Quoted::Single(inner) => write!(f, "'{}'", inner.to_string().replace('\'', "''")),
        }
    }
}

pub(crate) trait IteratorJoin {
    fn join(self, sep: &str) -> String;
}

impl<T, I> IteratorJoin for T
where
    T: Iterator<Item = I>,
    I: Display,
{
    fn join(mut self, sep: &str) -> String {
        let (lower_bound, _) = self.size_hint();
        let mut out = String::with_capacity(sep.len() * lower_bound);

        if let Some(first_item) = self.next() {
            write!(out, "{}", first_item).unwrap();
        }

        for item in self {
            out.push_str(sep);
            write!(out, "{}", item).unwrap();
        }

        out
    }
}

static STRING_LITERAL_CHARACTER_TO_ESCAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new("'").unwrap());

pub(crate) fn escape_string_literal(s: &str) -> Cow<'_, str> {
    STRING_LITERAL_CHARACTER_TO_ESCAPE_RE.replace_all(s, "''")
}

pub(crate) fn format_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);

    for byte in bytes {
        write!(out, "{:02X}", byte).unwrap();
    }

    out
}

pub(crate) fn render_on_delete(on_delete: ForeignKeyAction) -> &'static str {
    match on_delete {
        ForeignKeyAction::NoAction => "",
        ForeignKeyAction::Restrict => "ON DELETE RESTRICT",
        ForeignKeyAction::Cascade => "ON DELETE CASCADE",
        ForeignKeyAction::SetNull => "ON DELETE SET NULL",
        ForeignKeyAction::SetDefault => "ON DELETE SET DEFAULT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quoted_doubles_embedded_delimiters() {
        assert_eq!(Quoted::mssql_ident("foo[]bar").to_string(), "[foo[]]bar]");
        assert_eq!(Quoted::sqlite_ident("foo\"bar").to_string(), "\"foo\"\"bar\"");
        assert_eq!(Quoted::Single("foo'bar").to_string(), "'foo''bar'");
    }

    #[test]
    fn quoted_leaves_clean_identifiers_alone() {
        assert_eq!(Quoted::mssql_ident("MyTable").to_string(), "[MyTable]");
        assert_eq!(Quoted::sqlite_ident("MyTable").to_string(), "\"MyTable\"");
    }

    #[test]
    fn string_literals_double_single_quotes() {
        assert_eq!(escape_string_literal("foo'bar"), "foo''bar");
        assert_eq!(escape_string_literal("nothing to do"), "nothing to do");
    }

    #[test]
    fn hex_is_rendered_in_upper_case_pairs() {
        assert_eq!(format_hex(&[0x00, 0xab, 0x1f]), "00AB1F");
    }
}
