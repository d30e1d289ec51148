//! Loss operators: monotone coarsenings that each forget one dimension of
//! knowledge, and the truthiness refinements that sharpen a type by the
//! outcome of an emptiness test.

use crate::bits::{self, Trep};
use crate::operations::{could_have_magic_bool_conversion, union_of};
use crate::types::{
    dval, is_opt, ival, map_impl, opt, packed_impl, sempty, to_arr_map, to_arr_packed, unopt,
    Data, Type,
};

/// Forget staticness: wherever a static or counted bit is set, set both.
/// A string literal cannot survive (a counted string has no payload), so
/// string values widen to `Str` first.
pub fn loosen_staticness(mut t: Type) -> Type {
    if t.could_be(&Type::STR) {
        t = union_of(t, Type::STR);
    }
    let mut check = |a: Trep| {
        if t.bits.intersects(a) {
            t.bits |= a;
        }
    };
    check(Trep::PARR_E);
    check(Trep::PARR_N);
    check(Trep::VARR_E);
    check(Trep::VARR_N);
    check(Trep::DARR_E);
    check(Trep::DARR_N);
    check(Trep::VEC_E);
    check(Trep::VEC_N);
    check(Trep::DICT_E);
    check(Trep::DICT_N);
    check(Trep::KEYSET_E);
    check(Trep::KEYSET_N);
    t
}

/// Forget the plain-array variant dimension: any variant bit admits the
/// whole family slice with the same staticness and emptiness. A constant
/// container payload is reified to its packed or map shape, since the
/// variantless pattern cannot carry a constant.
pub fn loosen_dvarrayness(mut t: Type) -> Type {
    if t.could_be(&Type::ARR) && t.tag() == crate::types::DataTag::ArrVal {
        let reified = match &t.data {
            Data::ArrVal(av) => {
                if let Some(p) = to_arr_packed(av) {
                    packed_impl(t.bits, p.elems)
                } else {
                    let m = to_arr_map(av).expect("non-packed constant");
                    map_impl(t.bits, m.map)
                }
            }
            _ => unreachable!(),
        };
        t = reified;
    }
    let mut check = |a: Trep| {
        if t.bits.intersects(a) {
            t.bits |= a;
        }
    };
    check(Trep::SARR_E);
    check(Trep::CARR_E);
    check(Trep::SARR_N);
    check(Trep::CARR_N);
    t
}

/// Admit all four array-like families wherever any one is admitted.
pub fn loosen_arrays(mut a: Type) -> Type {
    if a.could_be(&Type::ARR) {
        a = union_of(a, Type::ARR);
    }
    if a.could_be(&Type::VEC) {
        a = union_of(a, Type::VEC);
    }
    if a.could_be(&Type::DICT) {
        a = union_of(a, Type::DICT);
    }
    if a.could_be(&Type::KEYSET) {
        a = union_of(a, Type::KEYSET);
    }
    a
}

/// Drop value knowledge: scalar, array and reference payloads go away
/// (class and object payloads stay), and a known boolean becomes `Bool`.
pub fn loosen_values(a: Type) -> Type {
    let t = match a.data {
        Data::Str(_)
        | Data::Int(_)
        | Data::Dbl(_)
        | Data::RefInner(_)
        | Data::ArrVal(_)
        | Data::Packed(_)
        | Data::PackedN(_)
        | Data::Map(_)
        | Data::MapN(_) => Type::of(a.bits),
        Data::None | Data::Obj(_) | Data::Cls(_) => a,
    };
    if t.could_be(&Type::FALSE) || t.could_be(&Type::TRUE) {
        union_of(t, Type::BOOL)
    } else {
        t
    }
}

/// Forget emptiness: any family slice present admits both its empty and
/// non-empty cells. Counted slices pull in the static side as well to stay
/// predefined.
pub fn loosen_emptiness(mut t: Type) -> Type {
    let mut check = |a: Trep, b: Trep| {
        if t.bits.intersects(a) {
            t.bits |= b;
        }
    };
    check(Trep::SPARR, Trep::SPARR);
    check(Trep::CPARR, Trep::PARR);
    check(Trep::SVARR, Trep::SVARR);
    check(Trep::CVARR, Trep::VARR);
    check(Trep::SDARR, Trep::SDARR);
    check(Trep::CDARR, Trep::DARR);
    check(Trep::SVEC, Trep::SVEC);
    check(Trep::CVEC, Trep::VEC);
    check(Trep::SDICT, Trep::SDICT);
    check(Trep::CDICT, Trep::DICT);
    check(Trep::SKEYSET, Trep::SKEYSET);
    check(Trep::CKEYSET, Trep::KEYSET);
    t
}

/// Apply every loss operator: the most basic form of the type, keeping only
/// object/class information.
pub fn loosen_all(t: Type) -> Type {
    loosen_dvarrayness(loosen_staticness(loosen_emptiness(loosen_values(t))))
}

/// Admit the non-empty cells alongside any empty cells present.
pub fn add_nonemptiness(mut t: Type) -> Type {
    let mut check = |a: Trep, b: Trep| {
        if t.bits.intersects(a) {
            t.bits |= b;
        }
    };
    check(Trep::SPARR_E, Trep::SPARR_N);
    check(Trep::CPARR_E, Trep::PARR_N);
    check(Trep::SVARR_E, Trep::SVARR_N);
    check(Trep::CVARR_E, Trep::VARR_N);
    check(Trep::SDARR_E, Trep::SDARR_N);
    check(Trep::CDARR_E, Trep::DARR_N);
    check(Trep::SVEC_E, Trep::SVEC_N);
    check(Trep::CVEC_E, Trep::VEC_N);
    check(Trep::SDICT_E, Trep::SDICT_N);
    check(Trep::CDICT_E, Trep::DICT_N);
    check(Trep::SKEYSET_E, Trep::SKEYSET_N);
    check(Trep::CKEYSET_E, Trep::KEYSET_N);
    t
}

/// The tightest predefined supertype of `t` that excludes `Uninit`.
/// `Uninit` itself goes to bottom.
///
/// Pre: `t.subtype_of(&Type::CELL)`.
pub fn remove_uninit(t: Type) -> Type {
    assert!(t.subtype_of(&Type::CELL));
    if !t.could_be(&Type::UNINIT) {
        return t;
    }
    if t.subtype_of(&Type::UNINIT) {
        return Type::BOTTOM;
    }
    if t.subtype_of(&Type::NULL) {
        return Type::INIT_NULL;
    }
    if t.subtype_of(&Type::PRIM) {
        return Type::INIT_PRIM;
    }
    if t.subtype_of(&Type::UNC) {
        return Type::INIT_UNC;
    }
    Type::INIT_CELL
}

/// Refine `t` by the knowledge that it tested empty (falsy).
pub fn assert_emptiness(mut t: Type) -> Type {
    if t.subtype_of_any(&[
        &Type::TRUE,
        &Type::ARR_N,
        &Type::VEC_N,
        &Type::DICT_N,
        &Type::KEYSET_N,
    ]) {
        return Type::BOTTOM;
    }
    // An object without a user boolean conversion is always truthy, so a
    // falsy optional object must have been the null.
    if !could_have_magic_bool_conversion(&t) && t.subtype_of(&Type::OPT_OBJ) {
        return Type::INIT_NULL;
    }

    let mut remove = |t: &mut Type, m: Trep, e: Trep| {
        if m.contains(t.bits) {
            let bits = t.bits & e;
            if t.has_data() && !bits::may_have_data(bits) {
                *t = Type::of(bits);
            } else {
                t.bits = bits;
            }
            true
        } else {
            false
        }
    };

    if remove(&mut t, Trep::OPT_ARR, Trep::OPT_ARR_E)
        || remove(&mut t, Trep::OPT_VEC, Trep::OPT_VEC_E)
        || remove(&mut t, Trep::OPT_DICT, Trep::OPT_DICT_E)
        || remove(&mut t, Trep::OPT_KEYSET, Trep::OPT_KEYSET_E)
    {
        return t;
    }

    if t.subtype_of(&Type::INT) {
        return ival(0);
    }
    if t.subtype_of(&Type::BOOL) {
        return Type::FALSE;
    }
    if t.subtype_of(&Type::DBL) {
        return dval(0.0);
    }
    if t.subtype_of(&Type::SSTR) {
        return sempty();
    }

    if t.subtype_of(&Type::OPT_INT) {
        return opt(ival(0));
    }
    if t.subtype_of(&Type::OPT_BOOL) {
        return opt(Type::FALSE);
    }
    if t.subtype_of(&Type::OPT_DBL) {
        return opt(dval(0.0));
    }
    if t.subtype_of(&Type::OPT_SSTR) {
        return opt(sempty());
    }

    t
}

/// Refine `t` by the knowledge that it tested non-empty (truthy).
pub fn assert_nonemptiness(mut t: Type) -> Type {
    if is_opt(&t) {
        t = unopt(t);
    }
    if t.subtype_of_any(&[
        &Type::NULL,
        &Type::FALSE,
        &Type::ARR_E,
        &Type::VEC_E,
        &Type::DICT_E,
        &Type::KEYSET_E,
    ]) {
        return Type::BOTTOM;
    }
    if t.subtype_of(&Type::BOOL) {
        return Type::TRUE;
    }

    let mut remove = |t: &mut Type, m: Trep, e: Trep| {
        if m.contains(t.bits) {
            t.bits &= e;
            true
        } else {
            false
        }
    };

    if remove(&mut t, Trep::OPT_ARR, Trep::OPT_ARR_N)
        || remove(&mut t, Trep::OPT_VEC, Trep::OPT_VEC_N)
        || remove(&mut t, Trep::OPT_DICT, Trep::OPT_DICT_N)
        || remove(&mut t, Trep::OPT_KEYSET, Trep::OPT_KEYSET_N)
    {
        return t;
    }

    remove_uninit(t)
}
