//! `__all__` manifest for exported modules.

use std::collections::BTreeSet;
use std::fmt;

/// Leading character of module-private names.
const PRIVATE_PREFIX: char = '_';

/// Sorted public names of an exported module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicManifest {
    names: Vec<String>,
}

impl PublicManifest {
    /// Keep the public names, sorted and deduplicated.
    pub fn from_definitions<'a, I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let names: BTreeSet<&String> = definitions
            .into_iter()
            .filter(|name| !name.starts_with(PRIVATE_PREFIX))
            .collect();

        Self {
            names: names.into_iter().cloned().collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for PublicManifest {
    /// Renders as a Python assignment: `__all__ = ['Baz', 'foo']`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.names.iter().map(|name| python_str(name)).collect();
        write!(f, "__all__ = [{}]", items.join(", "))
    }
}

/// Python `repr()` of a string.
fn python_str(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
