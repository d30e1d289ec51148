//! Conversions between host values and lattice points, and value-level
//! queries over types.

use std::sync::Arc;

use hazel_common::{ArrConst, ArrKind, ConstKey, Str, Value, ValueKind};

use crate::bits::Trep;
use crate::operations::union_of;
use crate::types::{
    aval, dict_val, dval, is_opt, ival, keyset_val, sval, vec_val, Data, DataTag, MapKey, Type,
};

/// Create a type from a concrete host value.
///
/// Pre: the value is non-reference-counted (scalar, or a static
/// container).
pub fn from_cell(v: Value) -> Type {
    match v {
        Value::Uninit => Type::UNINIT,
        Value::Null => Type::INIT_NULL,
        Value::Bool(true) => Type::TRUE,
        Value::Bool(false) => Type::FALSE,
        Value::Int(i) => ival(i),
        Value::Dbl(d) => dval(d),
        Value::Str(s) => sval(s),
        Value::Arr(a) => match a.kind() {
            k if k.is_plain_family() => aval(a),
            ArrKind::Vec => vec_val(a),
            ArrKind::Dict => dict_val(a),
            ArrKind::Keyset => keyset_val(a),
            _ => unreachable!(),
        },
    }
}

/// Create a type from a value-kind classification. String kinds are all
/// `Str`; container kinds lose their staticness.
pub fn from_data_kind(k: ValueKind) -> Type {
    match k {
        ValueKind::Uninit => Type::UNINIT,
        ValueKind::Null => Type::INIT_NULL,
        ValueKind::Bool => Type::BOOL,
        ValueKind::Int => Type::INT,
        ValueKind::Dbl => Type::DBL,
        ValueKind::Str => Type::STR,
        ValueKind::Arr => Type::ARR,
        ValueKind::Vec => Type::VEC,
        ValueKind::Dict => Type::DICT,
        ValueKind::Keyset => Type::KEYSET,
        ValueKind::Obj => Type::OBJ,
        ValueKind::Res => Type::RES,
        ValueKind::Ref => Type::REF,
        ValueKind::Cls => panic!("class pointers are not value constants"),
    }
}

/// Create a type from a builtin-constraint name, as used by native class
/// property declarations. The names are trusted; unknown names are
/// conservatively `Gen`.
pub fn from_hni_constraint(s: Option<Str>) -> Type {
    let Some(s) = s else {
        return Type::GEN;
    };
    let mut name = s.as_str();
    let mut ret = Type::BOTTOM;
    if let Some(rest) = name.strip_prefix('?') {
        ret = union_of(ret, Type::INIT_NULL);
        name = rest;
    }

    let base = match name.to_ascii_lowercase().as_str() {
        "resource" => Type::RES,
        "bool" => Type::BOOL,
        "int" => Type::INT,
        "float" => Type::DBL,
        "num" => Type::NUM,
        "string" => Type::STR,
        "dict" => Type::DICT,
        "vec" => Type::VEC,
        "keyset" => Type::KEYSET,
        "varray" | "darray" | "varray_or_darray" | "array" => Type::ARR,
        "arraykey" => Type::ARRKEY,
        "mixed" => return Type::INIT_GEN,
        // Could be an object or an alias; be conservative.
        _ => return Type::GEN,
    };
    union_of(ret, base)
}

/// The bytecode's type-predicate operations.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum IsTypeOp {
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
    VArr,
    DArr,
    Scalar,
}

/// The type a successful `is`-check of `op` proves.
///
/// Pre: `op != IsTypeOp::Scalar`.
pub fn type_of_istype(op: IsTypeOp) -> Type {
    match op {
        IsTypeOp::Uninit => Type::UNINIT,
        IsTypeOp::Null => Type::NULL,
        IsTypeOp::Bool => Type::BOOL,
        IsTypeOp::Int => Type::INT,
        IsTypeOp::Dbl => Type::DBL,
        IsTypeOp::Str => Type::STR,
        IsTypeOp::Arr => Type::ARR,
        IsTypeOp::Vec => Type::VEC,
        IsTypeOp::Dict => Type::DICT,
        IsTypeOp::Keyset => Type::KEYSET,
        IsTypeOp::Obj => Type::OBJ,
        IsTypeOp::VArr => Type::VARR,
        IsTypeOp::DArr => Type::DARR,
        IsTypeOp::Scalar => panic!("scalar checks do not name a type"),
    }
}

//////////////////////////////////////////////////////////////////////
// Extracting constants from types.

fn empty_const(kind: ArrKind) -> Value {
    Value::Arr(Arc::new(ArrConst::new(kind, Vec::new())))
}

fn const_from_packed(kind: ArrKind, elems: &[Type]) -> Option<Value> {
    let mut entries = Vec::with_capacity(elems.len());
    for (idx, t) in elems.iter().enumerate() {
        let v = tv(t)?;
        if kind == ArrKind::Keyset {
            // Keyset "elements" are the keys themselves.
            let k = match &v {
                Value::Int(i) => ConstKey::Int(*i),
                Value::Str(s) => ConstKey::Str(*s),
                _ => return None,
            };
            entries.push((k, v));
        } else {
            entries.push((ConstKey::Int(idx as i64), v));
        }
    }
    Some(Value::Arr(Arc::new(ArrConst::new(kind, entries))))
}

fn const_from_map(kind: ArrKind, m: &crate::types::DArrMap) -> Option<Value> {
    let mut entries = Vec::with_capacity(m.map.len());
    for (k, t) in m.map.iter() {
        let v = tv(t)?;
        let k = match k {
            MapKey::Int(i) => ConstKey::Int(*i),
            MapKey::Str(s) => ConstKey::Str(*s),
        };
        entries.push((k, v));
    }
    Some(Value::Arr(Arc::new(ArrConst::new(kind, entries))))
}

/// The concrete value of `t`, when `t` denotes exactly one
/// non-reference-counted value.
pub fn tv(t: &Type) -> Option<Value> {
    debug_assert!(t.check_invariants());

    let b = t.bits;
    if b == Trep::UNINIT {
        return Some(Value::Uninit);
    }
    if b == Trep::INIT_NULL {
        return Some(Value::Null);
    }
    if b == Trep::TRUE {
        return Some(Value::Bool(true));
    }
    if b == Trep::FALSE {
        return Some(Value::Bool(false));
    }
    if b == Trep::PARR_E || b == Trep::SPARR_E {
        return Some(empty_const(ArrKind::Plain));
    }
    if b == Trep::VARR_E || b == Trep::SVARR_E {
        return Some(empty_const(ArrKind::VArray));
    }
    if b == Trep::DARR_E || b == Trep::SDARR_E {
        return Some(empty_const(ArrKind::DArray));
    }
    if b == Trep::VEC_E || b == Trep::SVEC_E {
        return Some(empty_const(ArrKind::Vec));
    }
    if b == Trep::DICT_E || b == Trep::SDICT_E {
        return Some(empty_const(ArrKind::Dict));
    }
    if b == Trep::KEYSET_E || b == Trep::SKEYSET_E {
        return Some(empty_const(ArrKind::Keyset));
    }

    if is_opt(t) {
        return None;
    }

    match &t.data {
        Data::Int(i) => Some(Value::Int(*i)),
        Data::Dbl(d) => Some(Value::Dbl(*d)),
        Data::Str(s) => Some(Value::Str(*s)),
        Data::ArrVal(a) => {
            let non_empty_families = [
                Trep::ARR_N,
                Trep::VEC_N,
                Trep::DICT_N,
                Trep::KEYSET_N,
            ];
            if non_empty_families.iter().any(|f| f.contains(t.bits)) {
                Some(Value::Arr(a.clone()))
            } else {
                None
            }
        }
        Data::Map(m) => {
            if Trep::DICT_N.contains(t.bits) {
                const_from_map(ArrKind::Dict, m)
            } else if Trep::KEYSET_N.contains(t.bits) {
                const_from_map(ArrKind::Keyset, m)
            } else if Trep::PARR_N.contains(t.bits) {
                const_from_map(ArrKind::Plain, m)
            } else if Trep::DARR_N.contains(t.bits) {
                const_from_map(ArrKind::DArray, m)
            } else {
                None
            }
        }
        Data::Packed(p) => {
            if Trep::VEC_N.contains(t.bits) {
                const_from_packed(ArrKind::Vec, &p.elems)
            } else if Trep::DICT_N.contains(t.bits) {
                const_from_packed(ArrKind::Dict, &p.elems)
            } else if Trep::KEYSET_N.contains(t.bits) {
                const_from_packed(ArrKind::Keyset, &p.elems)
            } else if Trep::PARR_N.contains(t.bits) {
                const_from_packed(ArrKind::Plain, &p.elems)
            } else if Trep::VARR_N.contains(t.bits) {
                const_from_packed(ArrKind::VArray, &p.elems)
            } else if Trep::DARR_N.contains(t.bits) {
                const_from_packed(ArrKind::DArray, &p.elems)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Whether `t` denotes exactly one known value.
pub fn is_scalar(t: &Type) -> bool {
    tv(t).is_some()
}

/// The canonical scalar type equivalent to `from_cell(tv(t))`. Used to
/// canonicalize contexts keyed by argument types so immaterial
/// representation differences do not split entries.
///
/// Pre: `is_scalar(t)`.
pub fn scalarize(mut t: Type) -> Type {
    debug_assert!(is_scalar(&t));

    match t.tag() {
        DataTag::None => {
            debug_assert!(t.subtype_of_any(&[
                &Type::NULL,
                &Type::TRUE,
                &Type::FALSE,
                &Type::ARR_E,
                &Type::VEC_E,
                &Type::DICT_E,
                &Type::KEYSET_E,
            ]));
            t
        }
        DataTag::Int | DataTag::Dbl | DataTag::Str => t,
        DataTag::ArrVal => {
            t.bits &= Trep::SARR_N | Trep::SVEC_N | Trep::SDICT_N | Trep::SKEYSET_N;
            t
        }
        DataTag::Map | DataTag::Packed => from_cell(tv(&t).expect("scalar type")),
        _ => panic!("scalarize on a non-scalar type"),
    }
}

//////////////////////////////////////////////////////////////////////
// Structural queries over array specializations.

/// The exact element count, when the specialization pins it down.
pub fn arr_size(t: &Type) -> Option<i64> {
    match &t.data {
        Data::ArrVal(a) => Some(a.size() as i64),
        Data::Map(m) => Some(m.map.len() as i64),
        Data::Packed(p) => Some(p.elems.len() as i64),
        _ => None,
    }
}

/// Key-structure classification of an array specialization.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ArrayCatKind {
    None,
    Empty,
    Packed,
    Struct,
    Mixed,
}

/// Classification plus whether the whole array is a known constant.
#[derive(Copy, Clone, Debug)]
pub struct ArrayCat {
    pub cat: ArrayCatKind,
    pub has_value: bool,
}

/// Classify the key structure of `t`'s specialization and report whether
/// the array's value is fully known.
pub fn categorize_array(t: &Type) -> ArrayCat {
    let mut has_ints = false;
    let mut has_strs = false;
    let mut is_packed = true;
    // A constant can only be produced when the plain-array variant is
    // pinned down.
    let mut val = t.subtype_of_any(&[&Type::PARR, &Type::VARR, &Type::DARR]);
    let mut idx: i64 = 0;

    let mut check_key = |k: &MapKey| -> bool {
        match k {
            MapKey::Str(_) => {
                has_strs = true;
                is_packed = false;
                has_ints
            }
            MapKey::Int(i) => {
                has_ints = true;
                if *i != idx {
                    is_packed = false;
                }
                idx += 1;
                has_strs && !is_packed
            }
        }
    };

    match &t.data {
        Data::ArrVal(a) => {
            for (k, _) in a.iter() {
                if check_key(&MapKey::from_const(k)) {
                    break;
                }
            }
        }
        Data::Map(m) => {
            for (k, v) in m.map.iter() {
                if check_key(k) && !val {
                    break;
                }
                val = val && tv(v).is_some();
            }
        }
        Data::Packed(p) => {
            for elem in &p.elems {
                has_ints = true;
                val = val && tv(elem).is_some();
                if !val {
                    break;
                }
            }
        }
        _ => {
            return ArrayCat {
                cat: ArrayCatKind::None,
                has_value: false,
            }
        }
    }

    let cat = if has_ints {
        if is_packed {
            ArrayCatKind::Packed
        } else {
            ArrayCatKind::Mixed
        }
    } else if has_strs {
        ArrayCatKind::Struct
    } else {
        ArrayCatKind::Empty
    };

    ArrayCat {
        cat,
        has_value: val,
    }
}

/// The string keys of a struct-like specialization, in order.
///
/// Pre: every key of the specialization is a string.
pub fn get_string_keys(t: &Type) -> Vec<Str> {
    let mut strs = Vec::new();
    match &t.data {
        Data::ArrVal(a) => {
            for (k, _) in a.iter() {
                match k {
                    ConstKey::Str(s) => strs.push(*s),
                    ConstKey::Int(_) => panic!("integer key in string-keyed array"),
                }
            }
        }
        Data::Map(m) => {
            for (k, _) in m.map.iter() {
                match k {
                    MapKey::Str(s) => strs.push(*s),
                    MapKey::Int(_) => panic!("integer key in string-keyed array"),
                }
            }
        }
        _ => panic!("get_string_keys on a non-struct specialization"),
    }
    strs
}
