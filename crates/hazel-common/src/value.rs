//! Immutable host values.
//!
//! The lattice attaches concrete values to types in two places: scalar
//! literals and whole-container constants. Both are immutable and fully
//! known at analysis time. The lattice only ever consumes them through the
//! small capability surface here: classify kind, report size, iterate as
//! (key, value) pairs, and compare structurally.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::interner::Str;

/// Classification of a host value, as the bytecode encodes it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ValueKind {
    Uninit,
    Null,
    Bool,
    Int,
    Dbl,
    Str,
    Arr,
    Vec,
    Dict,
    Keyset,
    Obj,
    Res,
    Ref,
    Cls,
}

/// Which container family (and, for the plain family, which variant) a
/// constant container belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ArrKind {
    /// Plain array, no variant tag.
    Plain,
    /// Plain array, vector variant (contiguous integer keys enforced).
    VArray,
    /// Plain array, hash variant.
    DArray,
    /// Vector-indexed family.
    Vec,
    /// Dict-indexed family.
    Dict,
    /// Set-valued family (elements are their own keys).
    Keyset,
}

impl ArrKind {
    /// True for the three variants of the plain-array family.
    pub fn is_plain_family(self) -> bool {
        matches!(self, ArrKind::Plain | ArrKind::VArray | ArrKind::DArray)
    }
}

/// A concrete array key: integer or interned string.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ConstKey {
    Int(i64),
    Str(Str),
}

/// An immutable scalar or container constant.
#[derive(Clone, Debug)]
pub enum Value {
    Uninit,
    Null,
    Bool(bool),
    Int(i64),
    Dbl(f64),
    Str(Str),
    Arr(ArrConstRef),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Uninit => ValueKind::Uninit,
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Dbl(_) => ValueKind::Dbl,
            Value::Str(_) => ValueKind::Str,
            Value::Arr(a) => match a.kind() {
                k if k.is_plain_family() => ValueKind::Arr,
                ArrKind::Vec => ValueKind::Vec,
                ArrKind::Dict => ValueKind::Dict,
                _ => ValueKind::Keyset,
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Uninit, Value::Uninit) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // NaNs compare equal to each other; +0.0 and -0.0 are distinct.
            (Value::Dbl(a), Value::Dbl(b)) => {
                if a == b {
                    a.is_sign_negative() == b.is_sign_negative()
                } else {
                    a.is_nan() && b.is_nan()
                }
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Arr(a), Value::Arr(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Uninit | Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Dbl(d) => {
                // All NaNs are one value for hashing purposes.
                let bits = if d.is_nan() {
                    f64::NAN.to_bits()
                } else {
                    d.to_bits()
                };
                bits.hash(state);
            }
            Value::Str(s) => s.hash(state),
            Value::Arr(a) => a.hash(state),
        }
    }
}

/// Shared handle to an immutable container constant.
pub type ArrConstRef = Arc<ArrConst>;

/// An immutable container constant: a kind tag plus ordered (key, value)
/// entries.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ArrConst {
    kind: ArrKind,
    entries: Vec<(ConstKey, Value)>,
}

impl ArrConst {
    /// Build a container constant.
    ///
    /// Panics if the entries violate the kind's structural invariants: a
    /// `VArray` or `Vec` must have contiguous 0-based integer keys, and a
    /// `Keyset` must have each element equal to its own key.
    pub fn new(kind: ArrKind, entries: Vec<(ConstKey, Value)>) -> ArrConst {
        match kind {
            ArrKind::VArray | ArrKind::Vec => {
                for (idx, (k, _)) in entries.iter().enumerate() {
                    assert!(
                        matches!(k, ConstKey::Int(i) if *i == idx as i64),
                        "vector-indexed constant must have contiguous keys"
                    );
                }
            }
            ArrKind::Keyset => {
                for (k, v) in &entries {
                    let key_as_value = match k {
                        ConstKey::Int(i) => Value::Int(*i),
                        ConstKey::Str(s) => Value::Str(*s),
                    };
                    assert!(
                        *v == key_as_value,
                        "keyset constant elements must be their own keys"
                    );
                }
            }
            _ => {}
        }
        ArrConst { kind, entries }
    }

    pub fn kind(&self) -> ArrKind {
        self.kind
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(ConstKey, Value)> {
        self.entries.iter()
    }

    /// Look up a key.
    pub fn get(&self, key: &ConstKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// True when the keys are exactly 0..len, in order.
    pub fn is_packed(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(idx, (k, _))| matches!(k, ConstKey::Int(i) if *i == idx as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dbl_equality_follows_value_identity() {
        assert_eq!(Value::Dbl(f64::NAN), Value::Dbl(f64::NAN));
        assert_ne!(Value::Dbl(0.0), Value::Dbl(-0.0));
        assert_eq!(Value::Dbl(1.5), Value::Dbl(1.5));
    }

    #[test]
    fn packed_detection() {
        let a = ArrConst::new(
            ArrKind::Plain,
            vec![
                (ConstKey::Int(0), Value::Int(10)),
                (ConstKey::Int(1), Value::Int(11)),
            ],
        );
        assert!(a.is_packed());

        let b = ArrConst::new(
            ArrKind::Plain,
            vec![
                (ConstKey::Int(1), Value::Int(10)),
                (ConstKey::Str(Str::intern("x")), Value::Int(11)),
            ],
        );
        assert!(!b.is_packed());
        assert_eq!(b.get(&ConstKey::Int(1)), Some(&Value::Int(10)));
    }

    #[test]
    #[should_panic(expected = "contiguous")]
    fn vec_constant_rejects_holes() {
        ArrConst::new(ArrKind::Vec, vec![(ConstKey::Int(1), Value::Int(0))]);
    }
}
