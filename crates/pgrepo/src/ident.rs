//! SQL identifiers for table bindings and columns.
//!
//! Table names go through [`Ident::parse`], which accepts dotted and quoted
//! forms (`public.users`, `"Users"`). Column names come from record schemas
//! and are rendered with [`Ident::column`], which always quotes so that the
//! declared case survives PostgreSQL identifier folding.
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow any characters except NUL and escape `"` as `""`

use crate::error::{RepoError, RepoResult};

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z_][A-Za-z0-9_$]*`.
    Unquoted(String),
    /// Quoted identifier: allows any characters except NUL.
    Quoted(String),
}

/// A SQL identifier (table or column name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

/// Whether `s` is a plain column name: `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Record column names double as parameter names, so they are held to this
/// stricter rule.
pub fn is_plain_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

impl Ident {
    /// A single quoted column identifier.
    ///
    /// The name must be a plain identifier (see [`is_plain_ident`]).
    pub fn column(name: &str) -> RepoResult<Self> {
        if !is_plain_ident(name) {
            return Err(RepoError::validation(format!(
                "Invalid column name '{name}' (expected [A-Za-z_][A-Za-z0-9_]*)"
            )));
        }
        Ok(Self {
            parts: vec![IdentPart::Quoted(name.to_string())],
        })
    }

    /// Parse an identifier string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table`
    /// - Quoted: `"CamelCase"."UserTable"`
    /// - Mixed: `public."UserTable"`
    pub fn parse(s: &str) -> RepoResult<Self> {
        if s.is_empty() {
            return Err(RepoError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(RepoError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(RepoError::validation("Trailing '.' in identifier"));
                        }
                    }
                    Some(c) => {
                        return Err(RepoError::validation(format!(
                            "Expected '.' between identifier parts, got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                name.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => return Err(RepoError::validation("Unclosed quoted identifier")),
                    }
                }
                if name.is_empty() {
                    return Err(RepoError::validation("Empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let valid = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !valid {
                    return Err(RepoError::validation(format!(
                        "Invalid character '{c}' in identifier '{s}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(RepoError::validation("Empty identifier segment"));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        Ok(Self { parts })
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    for ch in s.chars() {
                        if ch == '"' {
                            out.push_str("\"\"");
                        } else {
                            out.push(ch);
                        }
                    }
                    out.push('"');
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_simple() {
        assert_eq!(Ident::parse("Users").unwrap().to_sql(), "Users");
    }

    #[test]
    fn table_dotted() {
        assert_eq!(Ident::parse("public.users").unwrap().to_sql(), "public.users");
    }

    #[test]
    fn table_quoted_with_escape() {
        let ident = Ident::parse(r#""has""quote""#).unwrap();
        assert_eq!(ident.to_sql(), r#""has""quote""#);
    }

    #[test]
    fn table_mixed_quoted_unquoted() {
        let ident = Ident::parse(r#"public."Users""#).unwrap();
        assert_eq!(ident.to_sql(), r#"public."Users""#);
    }

    #[test]
    fn table_rejects_injection() {
        assert!(Ident::parse("users; DROP TABLE users").is_err());
        assert!(Ident::parse("users--").is_err());
    }

    #[test]
    fn table_rejects_malformed() {
        assert!(Ident::parse("").is_err());
        assert!(Ident::parse("1users").is_err());
        assert!(Ident::parse("schema..users").is_err());
        assert!(Ident::parse("schema.").is_err());
        assert!(Ident::parse(r#""unclosed"#).is_err());
    }

    #[test]
    fn column_is_always_quoted() {
        assert_eq!(Ident::column("FirstName").unwrap().to_sql(), r#""FirstName""#);
        assert_eq!(Ident::column("id").unwrap().to_sql(), r#""id""#);
    }

    #[test]
    fn column_rejects_non_plain_names() {
        assert!(Ident::column("first name").is_err());
        assert!(Ident::column("a\"b").is_err());
        assert!(Ident::column("").is_err());
        assert!(Ident::column("price$").is_err());
    }
}
