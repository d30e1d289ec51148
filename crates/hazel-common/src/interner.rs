//! Global string interner.
//!
//! The optimizer deals exclusively in *static* strings: every string that can
//! appear in a type is interned once and referred to by a copyable `Str`
//! atom. Equality and hashing are O(1) on the atom; the text itself lives for
//! the duration of the process.

use std::fmt;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};

/// A handle to an interned static string.
///
/// `Str` is a plain `u32` index into the global interner, so it is `Copy`
/// and compares/hashes without touching the text.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Str(u32);

struct Interner {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

static INTERNER: Lazy<RwLock<Interner>> = Lazy::new(|| {
    let mut int = Interner {
        map: FxHashMap::default(),
        strings: Vec::new(),
    };
    // Atom 0 is always the empty string.
    int.map.insert("", 0);
    int.strings.push("");
    RwLock::new(int)
});

impl Str {
    /// The interned empty string.
    pub const EMPTY: Str = Str(0);

    /// Intern `s`, returning its atom. Repeated calls with equal text return
    /// equal atoms.
    pub fn intern(s: &str) -> Str {
        {
            let int = INTERNER.read().unwrap();
            if let Some(&id) = int.map.get(s) {
                return Str(id);
            }
        }
        let mut int = INTERNER.write().unwrap();
        if let Some(&id) = int.map.get(s) {
            return Str(id);
        }
        let id = int.strings.len() as u32;
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        int.map.insert(leaked, id);
        int.strings.push(leaked);
        Str(id)
    }

    /// The interned text.
    pub fn as_str(self) -> &'static str {
        INTERNER.read().unwrap().strings[self.0 as usize]
    }

    pub fn is_empty(self) -> bool {
        self == Str::EMPTY
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Str {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl From<&str> for Str {
    fn from(s: &str) -> Str {
        Str::intern(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_dedups() {
        let a = Str::intern("foo");
        let b = Str::intern("foo");
        let c = Str::intern("bar");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "foo");
    }

    #[test]
    fn empty_is_reserved() {
        assert_eq!(Str::intern(""), Str::EMPTY);
        assert!(Str::EMPTY.is_empty());
        assert_eq!(Str::EMPTY.as_str(), "");
    }
}
