//! Array-key disection.
//!
//! Before an indexed read or write can be refined, the key type is
//! normalized to an `ArrKey`: a possible literal integer, a possible
//! literal string, the effective type the key acts as, and whether the
//! coercion could raise. The plain-array family coerces null, bool, double
//! and resource keys to integer or string equivalents; an integer-spelled
//! string literal acts as the integer. A key that might be something
//! strange (an array, an object) keeps its type so the access site can
//! detect it, and always counts as possibly throwing.

use hazel_common::numeric::strictly_integer;
use hazel_common::{numeric::double_to_int64, options, Str, Value};

use crate::types::{is_opt, ival, sempty, unopt, Data, DataTag, MapKey, Type};

/// A disected array key.
#[derive(Clone, Debug)]
pub struct ArrKey {
    /// Known integer key, if the key is a single known integer.
    pub i: Option<i64>,
    /// Known string key, if the key is a single known string.
    pub s: Option<Str>,
    /// The effective type the key acts as after coercion.
    pub ty: Type,
    /// Whether the coercion at this site could raise.
    pub may_throw: bool,
}

impl ArrKey {
    fn new() -> ArrKey {
        ArrKey {
            i: None,
            s: None,
            ty: Type::BOTTOM,
            may_throw: false,
        }
    }

    /// The key as a concrete value, when fully known.
    pub fn tv(&self) -> Option<Value> {
        debug_assert!(self.i.is_none() || self.s.is_none());
        if let Some(i) = self.i {
            return Some(Value::Int(i));
        }
        self.s.map(Value::Str)
    }

    /// The key as a literal map key, when fully known.
    pub(crate) fn map_key(&self) -> Option<MapKey> {
        if let Some(i) = self.i {
            return Some(MapKey::Int(i));
        }
        self.s.map(MapKey::Str)
    }
}

/// Disect a key for the plain-array family, applying its lossy coercions.
///
/// For strings that spell integers both the integer and the effective
/// integer type are produced, so the integer case must be checked first by
/// consumers. If the key might coerce to an integer, `Int` is unioned into
/// the effective type; an effective type of `Str` therefore implies no
/// coercion happens.
pub fn disect_array_key(key_ty: &Type) -> ArrKey {
    let notices = options::array_key_notices();
    let mut ret = ArrKey::new();

    if key_ty.subtype_of(&Type::OPT_INT) {
        if key_ty.subtype_of(&Type::INT) {
            if let Data::Int(i) = key_ty.data {
                ret.i = Some(i);
                ret.ty = ival(i);
                return ret;
            }
            ret.ty = key_ty.clone();
            return ret;
        }
        // Integer or null; a null key becomes the empty string. Either way
        // the key stays uncounted.
        ret.ty = Type::UNC_ARRKEY;
        ret.may_throw = notices;
        return ret;
    }

    if key_ty.subtype_of(&Type::OPT_STR) {
        if key_ty.subtype_of(&Type::STR) {
            if let Data::Str(s) = key_ty.data {
                if let Some(i) = strictly_integer(s.as_str()) {
                    ret.i = Some(i);
                    ret.ty = ival(i);
                    ret.may_throw = notices;
                } else {
                    ret.s = Some(s);
                    ret.ty = key_ty.clone();
                }
                return ret;
            }
            // Might stay a string or become an integer; uncounted when the
            // string is static.
            ret.ty = if key_ty.subtype_of(&Type::SSTR) {
                Type::UNC_ARRKEY
            } else {
                Type::ARRKEY
            };
            ret.may_throw = notices;
            return ret;
        }
        // A string literal rules out integer-like strings, but the null
        // side of the optional may still become the empty string, so the
        // literal itself cannot be kept.
        if key_ty.strict_subtype_of(&Type::OPT_STR) && key_ty.tag() == DataTag::Str {
            if let Data::Str(s) = key_ty.data {
                if strictly_integer(s.as_str()).is_none() {
                    ret.ty = if key_ty.strict_subtype_of(&Type::OPT_SSTR) {
                        Type::SSTR
                    } else {
                        Type::STR
                    };
                    ret.may_throw = notices;
                    return ret;
                }
            }
        }
        ret.ty = if key_ty.subtype_of(&Type::OPT_SSTR) {
            Type::UNC_ARRKEY
        } else {
            Type::ARRKEY
        };
        ret.may_throw = notices;
        return ret;
    }

    if key_ty.subtype_of(&Type::OPT_ARRKEY) {
        // Integer, string or null; null becomes the empty string.
        ret.ty = if is_opt(key_ty) {
            unopt(key_ty.clone())
        } else {
            key_ty.clone()
        };
        return ret;
    }

    if key_ty.strict_subtype_of(&Type::DBL) {
        if let Data::Dbl(d) = key_ty.data {
            let i = double_to_int64(d);
            ret.i = Some(i);
            ret.ty = ival(i);
            ret.may_throw = notices;
            return ret;
        }
    }
    if key_ty.subtype_of(&Type::NUM) {
        ret.ty = Type::INT;
        ret.may_throw = notices;
        return ret;
    }
    if key_ty.subtype_of(&Type::NULL) {
        ret.s = Some(Str::EMPTY);
        ret.ty = sempty();
        ret.may_throw = notices;
        return ret;
    }
    if key_ty.subtype_of(&Type::RES) {
        ret.ty = Type::INT;
        ret.may_throw = notices;
        return ret;
    }
    if key_ty.subtype_of(&Type::TRUE) {
        ret.i = Some(1);
        ret.ty = ival(1);
        ret.may_throw = notices;
        return ret;
    }
    if key_ty.subtype_of(&Type::FALSE) {
        ret.i = Some(0);
        ret.ty = ival(0);
        ret.may_throw = notices;
        return ret;
    }
    if key_ty.subtype_of(&Type::BOOL) {
        ret.ty = Type::INT;
        ret.may_throw = notices;
        return ret;
    }
    if key_ty.subtype_of(&Type::PRIM) {
        ret.ty = Type::UNC_ARRKEY;
        ret.may_throw = notices;
        return ret;
    }

    // Something strange (array, object). Such keys raise; the type is kept
    // so the access site can see the strangeness.
    if !key_ty.subtype_of(&Type::INIT_CELL) {
        ret.ty = Type::INIT_CELL;
        ret.may_throw = true;
        return ret;
    }
    ret.ty = key_ty.clone();
    ret.may_throw = true;
    ret
}

/// Disect a key for the vector-indexed family: only integers ever succeed.
pub fn disect_vec_key(key_ty: &Type) -> ArrKey {
    let mut ret = ArrKey::new();

    if !key_ty.could_be(&Type::INT) {
        ret.ty = Type::BOTTOM;
        ret.may_throw = true;
        return ret;
    }

    // A null key throws, so the effective type can assume the integer side
    // of an optional (marked as possibly throwing).
    if key_ty.subtype_of(&Type::OPT_INT) {
        if let Data::Int(i) = key_ty.data {
            ret.i = Some(i);
            ret.ty = ival(i);
        } else {
            ret.ty = Type::INT;
        }
        ret.may_throw = !key_ty.subtype_of(&Type::INT);
        return ret;
    }

    ret.ty = Type::INT;
    ret.may_throw = true;
    ret
}

/// Disect a key for the dict-indexed and set-valued families: integers and
/// strings succeed, with no coercions.
pub fn disect_strict_key(key_ty: &Type) -> ArrKey {
    let mut ret = ArrKey::new();

    if !key_ty.could_be(&Type::ARRKEY) {
        ret.ty = Type::BOTTOM;
        ret.may_throw = true;
        return ret;
    }

    // As with the vector families, a null key throws rather than coercing.
    if key_ty.subtype_of(&Type::OPT_ARRKEY) {
        match key_ty.data {
            Data::Int(i) => ret.i = Some(i),
            Data::Str(s) => ret.s = Some(s),
            _ => {}
        }
        ret.ty = if is_opt(key_ty) {
            unopt(key_ty.clone())
        } else {
            key_ty.clone()
        };
        ret.may_throw = !key_ty.subtype_of(&Type::ARRKEY);
        return ret;
    }

    ret.ty = Type::ARRKEY;
    ret.may_throw = true;
    ret
}
