//! A tiny fixed class hierarchy for tests, standing in for the
//! whole-program index.
//!
//! Layout:
//!
//! ```text
//!   Base ---- ChildA ---- Leaf (not overridable)
//!       \---- ChildB
//!   Awaitable          (the designated wait-handle class)
//!   BoolMagic          (user boolean conversion)
//!   IFace              (interface-like bound)
//!   Lonely             (no relatives)
//! ```

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use hazel_common::Str;

use crate::class::{ClassLike, ClsHandle};

#[derive(Debug)]
struct TestClass {
    name: Str,
    /// Proper ancestors, nearest first.
    ancestors: Vec<Str>,
    overridable: bool,
    interface: bool,
    magic_bool: bool,
}

static REGISTRY: Lazy<Mutex<FxHashMap<Str, Arc<TestClass>>>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    let mut define = |name: &str, ancestors: &[&str], overridable, interface, magic_bool| {
        let name = Str::intern(name);
        m.insert(
            name,
            Arc::new(TestClass {
                name,
                ancestors: ancestors.iter().map(|a| Str::intern(a)).collect(),
                overridable,
                interface,
                magic_bool,
            }),
        );
    };
    define("Base", &[], true, false, false);
    define("ChildA", &["Base"], true, false, false);
    define("ChildB", &["Base"], true, false, false);
    define("Leaf", &["ChildA", "Base"], false, false, false);
    define("Awaitable", &[], true, false, false);
    define("BoolMagic", &[], true, false, true);
    define("IFace", &[], true, true, false);
    define("Lonely", &[], true, false, false);
    Mutex::new(m)
});

fn lookup(name: Str) -> Arc<TestClass> {
    REGISTRY
        .lock()
        .unwrap()
        .get(&name)
        .expect("unknown test class")
        .clone()
}

fn chain(name: Str) -> Vec<Str> {
    let c = lookup(name);
    let mut out = vec![c.name];
    out.extend(c.ancestors.iter().copied());
    out
}

impl ClassLike for TestClass {
    fn name(&self) -> Str {
        self.name
    }

    fn subtype_of(&self, other: &dyn ClassLike) -> bool {
        let o = other.name();
        self.name == o || self.ancestors.contains(&o)
    }

    fn could_be(&self, other: &dyn ClassLike) -> bool {
        // Unrelated classes can still share instances through an
        // interface bound.
        if self.interface || other.could_be_interface() {
            return true;
        }
        self.subtype_of(other) || chain(other.name()).contains(&self.name)
    }

    fn could_be_overridden(&self) -> bool {
        self.overridable
    }

    fn could_have_magic_bool(&self) -> bool {
        self.magic_bool
    }

    fn could_be_interface(&self) -> bool {
        self.interface
    }

    fn common_ancestor(&self, other: &dyn ClassLike) -> Option<ClsHandle> {
        let other_chain = chain(other.name());
        let mut mine = vec![self.name];
        mine.extend(self.ancestors.iter().copied());
        for c in mine {
            if other_chain.contains(&c) {
                return Some(cls(c.as_str()));
            }
        }
        None
    }
}

/// Handle to one of the fixed test classes.
pub(crate) fn cls(name: &str) -> ClsHandle {
    ClsHandle::new(lookup(Str::intern(name)))
}
