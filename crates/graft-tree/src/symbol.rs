//! Interned names.
//!
//! Element names, attribute keys and fragment field names are compared far
//! more often than they are created, so they are interned once per process.

use std::borrow::Cow;
use std::sync::LazyLock;

use lasso::{Rodeo, Spur};
use parking_lot::RwLock;

static NAMES: LazyLock<RwLock<Rodeo>> = LazyLock::new(|| RwLock::new(Rodeo::default()));

/// An element, attribute or field name.
///
/// Two symbols are equal exactly when their names are equal, so tree
/// matching compares keys instead of strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Spur);

impl Symbol {
    /// Name from a literal, such as `"groupId"` in a fragment schema.
    pub fn new(name: &'static str) -> Self {
        Symbol(lookup_or_insert(name, |names| names.get_or_intern_static(name)))
    }

    /// Name read from a document or a configuration file.
    pub fn from_dynamic(name: &str) -> Self {
        Symbol(lookup_or_insert(name, |names| names.get_or_intern(name)))
    }

    /// Run `f` on the name. Comparing or printing another symbol inside `f`
    /// is allowed.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let names = NAMES.read_recursive();
        f(names.resolve(&self.0))
    }
}

/// The write lock is taken only for a name not yet interned.
fn lookup_or_insert(name: &str, insert: impl FnOnce(&mut Rodeo) -> Spur) -> Spur {
    if let Some(key) = NAMES.read().get(name) {
        return key;
    }
    insert(&mut NAMES.write())
}

impl From<&'static str> for Symbol {
    fn from(text: &'static str) -> Self {
        Symbol::new(text)
    }
}

impl From<Cow<'_, str>> for Symbol {
    fn from(text: Cow<'_, str>) -> Self {
        Symbol::from_dynamic(&text)
    }
}

impl From<&String> for Symbol {
    fn from(text: &String) -> Self {
        Symbol::from_dynamic(text)
    }
}

impl From<String> for Symbol {
    fn from(text: String) -> Self {
        Symbol::from_dynamic(&text)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|s| s == other)
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.with_str(|s| s == *other)
    }
}

impl PartialEq<Symbol> for str {
    fn eq(&self, other: &Symbol) -> bool {
        other == self
    }
}

impl PartialEq<Symbol> for &str {
    fn eq(&self, other: &Symbol) -> bool {
        other == *self
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}
