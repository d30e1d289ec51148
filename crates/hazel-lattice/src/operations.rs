//! Union, intersection and widening.
//!
//! `union_of` and `intersection_of` are the lattice's join and meet. Both
//! decide as much as possible on the bit patterns, then run the payload
//! dispatch when the surviving pattern can carry one. Neither is allowed to
//! leave the predefined set, which is where the bit combinators and the
//! named-union probe table below come in.
//!
//! Chains of `union_of` over array shapes can grow forever (deeper nesting,
//! longer tuples); fixed-point iteration must go through `widening_union`,
//! which bounds payload nesting depth.

use tracing::trace;

use crate::bits::{self, combine_arr_like_bits, Trep};
use crate::conv::tv;
use crate::types::{
    dobj_of, is_opt, is_ref_with_inner, is_specialized_array, is_specialized_array_like,
    is_specialized_dict, is_specialized_keyset, is_specialized_obj, is_specialized_vec,
    is_specialized_wait_handle, map_impl, map_key_values, mapn_impl, opt, packed_impl,
    packed_values, packedn_impl, ref_to, sempty, set_trep, sub_cls, sub_obj, to_arr_map,
    to_arr_mapn, to_arr_packed, to_arr_packedn, unopt, Bound, Data, Emptiness, MapElems, MapKey,
    Type,
};

/// Nesting depth past which widening drops array-shape payloads.
const TYPE_WIDEN_MAX_DEPTH: u32 = 8;

//////////////////////////////////////////////////////////////////////
// Intersection.

/// Intersect `a`'s packed elements with a stream of other-side types,
/// absorbing bottom.
fn intersect_packed<F>(bits: Trep, elems: &[Type], mut next: F) -> Type
where
    F: FnMut(usize) -> Type,
{
    let mut out = Vec::with_capacity(elems.len());
    for (i, e) in elems.iter().enumerate() {
        let v = intersection_of(e.clone(), next(i));
        if v == Type::BOTTOM {
            return Type::BOTTOM;
        }
        out.push(v);
    }
    packed_impl(bits, out)
}

/// Intersect a fixed map with a stream of (key-bound, value-bound) pairs,
/// absorbing bottom and checking key-kind compatibility.
fn intersect_map<F>(bits: Trep, map: &MapElems, mut next: F) -> Type
where
    F: FnMut(usize) -> (Type, Type),
{
    let mut out = MapElems::new();
    for (i, (k, v)) in map.iter().enumerate() {
        let (other_key, other_val) = next(i);
        let compatible = match k {
            MapKey::Int(_) => other_key.could_be(&Type::INT),
            MapKey::Str(_) => other_key.could_be(&Type::STR),
        };
        if !compatible {
            return Type::BOTTOM;
        }
        let val = intersection_of(v.clone(), other_val);
        if val == Type::BOTTOM {
            return Type::BOTTOM;
        }
        out.push(*k, val);
    }
    map_impl(bits, out)
}

/// Payload meet for array shapes, after subtype shortcuts have failed.
/// A constant container that is not a subtype of the other side shares no
/// value with it, so every constant pairing is bottom.
fn intersect_arr_data(a: &Type, b: &Type, bits: Trep) -> Type {
    if let Some(t) = intersect_arr_cross(a, b, bits) {
        return t;
    }
    if let Some(t) = intersect_arr_cross(b, a, bits) {
        return t;
    }
    unreachable!("intersection dispatch on non-array payloads");
}

fn intersect_arr_cross(a: &Type, b: &Type, bits: Trep) -> Option<Type> {
    let t = match (&a.data, &b.data) {
        (Data::ArrVal(_), _) | (_, Data::ArrVal(_)) => Type::BOTTOM,

        (Data::Packed(x), Data::Packed(y)) => {
            if x.elems.len() != y.elems.len() {
                Type::BOTTOM
            } else {
                intersect_packed(bits, &x.elems, |i| y.elems[i].clone())
            }
        }
        (Data::Packed(x), Data::PackedN(y)) => {
            intersect_packed(bits, &x.elems, |_| y.ty.clone())
        }
        (Data::Packed(x), Data::MapN(y)) => {
            if y.key.could_be(&Type::INT) {
                intersect_packed(bits, &x.elems, |_| y.val.clone())
            } else {
                Type::BOTTOM
            }
        }
        // A valid map is never packed.
        (Data::Packed(_), Data::Map(_)) => Type::BOTTOM,

        (Data::PackedN(x), Data::PackedN(y)) => {
            let isect = intersection_of(x.ty.clone(), y.ty.clone());
            if isect == Type::BOTTOM {
                Type::BOTTOM
            } else {
                packedn_impl(bits, isect)
            }
        }
        (Data::PackedN(x), Data::MapN(y)) => {
            if y.key.could_be(&Type::INT) {
                let val = intersection_of(y.val.clone(), x.ty.clone());
                if val != Type::BOTTOM {
                    return Some(packedn_impl(bits, val));
                }
            }
            Type::BOTTOM
        }
        (Data::PackedN(_), Data::Map(_)) => Type::BOTTOM,

        (Data::MapN(x), Data::MapN(y)) => {
            let k = intersection_of(x.key.clone(), y.key.clone());
            let v = intersection_of(x.val.clone(), y.val.clone());
            if k == Type::BOTTOM || v == Type::BOTTOM {
                Type::BOTTOM
            } else {
                mapn_impl(bits, k, v)
            }
        }
        (Data::MapN(x), Data::Map(y)) => {
            intersect_map(bits, &y.map, |_| (x.key.clone(), x.val.clone()))
        }

        (Data::Map(x), Data::Map(y)) => {
            // Fixed maps imply their exact key sequence, so any key
            // difference empties the meet.
            if x.map.len() != y.map.len() {
                Type::BOTTOM
            } else if x.map.iter().zip(y.map.iter()).any(|((ka, _), (kb, _))| ka != kb) {
                Type::BOTTOM
            } else {
                let other: Vec<_> = y.map.iter().cloned().collect();
                intersect_map(bits, &x.map, |i| {
                    let (k, v) = &other[i];
                    (k.to_type(), v.clone())
                })
            }
        }
        _ => return None,
    };
    Some(t)
}

/// The meet. Total; returns bottom when the operands share no value.
pub fn intersection_of(a: Type, b: Type) -> Type {
    let isect = a.bits & b.bits;
    if !bits::may_have_data(isect) {
        return Type::of(isect);
    }

    let fix = |t: Type| set_trep(t, isect);

    if !b.has_data() {
        return fix(a);
    }
    if !a.has_data() {
        return fix(b);
    }
    if crate::relations::subtype_data(&a, &b) {
        return fix(a);
    }
    if crate::relations::subtype_data(&b, &a) {
        return fix(b);
    }

    trace!(?a, ?b, "payload meet");

    let t = if a.tag() == b.tag() {
        match (&a.data, &b.data) {
            (Data::Obj(x), Data::Obj(y)) => {
                let merge_wh = |mut keep: Type| -> Type {
                    let wh = match (&x.wh, &y.wh) {
                        (None, wh) | (wh, None) => wh.clone(),
                        (Some(xw), Some(yw)) => {
                            let inner = intersection_of((**xw).clone(), (**yw).clone());
                            if inner == Type::BOTTOM {
                                return Type::BOTTOM;
                            }
                            Some(hazel_common::CowBox::new(inner))
                        }
                    };
                    match &mut keep.data {
                        Data::Obj(d) => d.wh = wh,
                        _ => unreachable!(),
                    }
                    set_trep(keep, isect)
                };
                if x.kind == y.kind && x.cls.same(&y.cls) {
                    merge_wh(a.clone())
                } else if y.kind == Bound::Sub && x.cls.subtype_of(&y.cls) {
                    merge_wh(a.clone())
                } else if x.kind == Bound::Sub && y.cls.subtype_of(&x.cls) {
                    merge_wh(b.clone())
                } else if x.kind == Bound::Sub && y.kind == Bound::Sub {
                    // Two open interface-side bounds can overlap without
                    // either side being narrower.
                    if x.cls.could_be_interface() {
                        if !y.cls.could_be_interface() {
                            merge_wh(b.clone())
                        } else {
                            Type::of(isect)
                        }
                    } else if y.cls.could_be_interface() {
                        merge_wh(a.clone())
                    } else {
                        Type::BOTTOM
                    }
                } else {
                    Type::BOTTOM
                }
            }
            (Data::Cls(x), Data::Cls(y)) => {
                // Neither bound is narrower; related bounds still admit an
                // overlap, without a class to name it.
                if (x.kind == Bound::Sub || y.kind == Bound::Sub) && x.cls.could_be(&y.cls) {
                    Type::of(isect)
                } else {
                    Type::BOTTOM
                }
            }
            // Neither literal is a subtype of the other, so they differ.
            (Data::Str(_), _)
            | (Data::ArrVal(_), _)
            | (Data::Int(_), _)
            | (Data::Dbl(_), _) => Type::BOTTOM,
            (Data::RefInner(x), Data::RefInner(y)) => {
                let inner = intersection_of((**x).clone(), (**y).clone());
                if inner == Type::BOTTOM {
                    Type::BOTTOM
                } else {
                    fix(ref_to(inner))
                }
            }
            _ => intersect_arr_data(&a, &b, isect),
        }
    } else {
        intersect_arr_data(&a, &b, isect)
    };

    if t != Type::BOTTOM {
        return t;
    }
    // The payloads conflict. Keep the shell of the pattern that cannot
    // carry the conflicting refinement.
    let shell = isect
        - (Trep::INT
            | Trep::DBL
            | Trep::SSTR
            | Trep::ARR_N
            | Trep::VEC_N
            | Trep::DICT_N
            | Trep::KEYSET_N
            | Trep::OBJ
            | Trep::CLS
            | Trep::REF);
    Type::of(shell)
}

//////////////////////////////////////////////////////////////////////
// Union.

/// Payload join for array shapes. Operands are same-family array-likes and
/// neither payload subsumes the other.
fn union_arr_data(a: &Type, b: &Type, bits: Trep) -> Type {
    if let Some(t) = union_arr_cross(a, b, bits) {
        return t;
    }
    if let Some(t) = union_arr_cross(b, a, bits) {
        return t;
    }
    unreachable!("union dispatch on non-array payloads");
}

fn union_arr_cross(a: &Type, b: &Type, bits: Trep) -> Option<Type> {
    let t = match (&a.data, &b.data) {
        (Data::Packed(x), Data::Packed(y)) => {
            if x.elems.len() != y.elems.len() {
                packedn_impl(bits, union_of(packed_values(x), packed_values(y)))
            } else {
                let elems = x
                    .elems
                    .iter()
                    .zip(&y.elems)
                    .map(|(l, r)| union_of(l.clone(), r.clone()))
                    .collect();
                packed_impl(bits, elems)
            }
        }
        (Data::Packed(x), Data::PackedN(y)) => {
            packedn_impl(bits, union_of(packed_values(x), y.ty.clone()))
        }
        (Data::PackedN(x), Data::PackedN(y)) => {
            packedn_impl(bits, union_of(x.ty.clone(), y.ty.clone()))
        }

        (Data::Map(x), Data::Map(y)) => {
            // Struct shapes imply the exact key set, so differing keys
            // degrade to the homogeneous map of both key/value unions.
            let to_map = || {
                let (ka, va) = map_key_values(x);
                let (kb, vb) = map_key_values(y);
                mapn_impl(bits, union_of(ka, kb), union_of(va, vb))
            };
            if x.map.len() != y.map.len() {
                to_map()
            } else {
                let mut out = MapElems::new();
                for ((ka, va), (kb, vb)) in x.map.iter().zip(y.map.iter()) {
                    if ka != kb {
                        return Some(to_map());
                    }
                    out.push(*ka, union_of(va.clone(), vb.clone()));
                }
                map_impl(bits, out)
            }
        }

        (Data::ArrVal(x), Data::ArrVal(y)) => {
            let p1 = to_arr_packed(x);
            let p2 = to_arr_packed(y);
            debug_assert!(!bits.intersects(Trep::VEC) || (p1.is_some() && p2.is_some()));
            match (p1, p2) {
                (Some(p1), Some(p2)) => union_arr_data(
                    &packed_impl(bits, p1.elems),
                    &packed_impl(bits, p2.elems),
                    bits,
                ),
                (Some(p1), None) => {
                    let m = to_arr_map(y).expect("non-packed constant");
                    union_arr_data(&packed_impl(bits, p1.elems), &map_impl(bits, m.map), bits)
                }
                (None, Some(p2)) => {
                    let m = to_arr_map(x).expect("non-packed constant");
                    union_arr_data(&packed_impl(bits, p2.elems), &map_impl(bits, m.map), bits)
                }
                (None, None) => {
                    let ma = to_arr_map(x).expect("non-packed constant");
                    let mb = to_arr_map(y).expect("non-packed constant");
                    union_arr_data(&map_impl(bits, ma.map), &map_impl(bits, mb.map), bits)
                }
            }
        }

        (Data::MapN(x), Data::MapN(y)) => mapn_impl(
            bits,
            union_of(x.key.clone(), y.key.clone()),
            union_of(x.val.clone(), y.val.clone()),
        ),

        (Data::Packed(_), Data::ArrVal(av)) => {
            if let Some(p) = to_arr_packed(av) {
                return Some(union_arr_data(a, &packed_impl(bits, p.elems), bits));
            }
            let m = to_arr_map(av).expect("non-packed constant");
            union_arr_data(a, &map_impl(bits, m.map), bits)
        }
        (Data::PackedN(_), Data::ArrVal(av)) => {
            if let Some(p) = to_arr_packedn(av) {
                return Some(union_arr_data(a, &packedn_impl(bits, p.ty), bits));
            }
            let m = to_arr_map(av).expect("non-packed constant");
            union_arr_data(a, &map_impl(bits, m.map), bits)
        }
        (Data::Map(_), Data::ArrVal(av)) => {
            if let Some(m) = to_arr_map(av) {
                return Some(union_arr_data(a, &map_impl(bits, m.map), bits));
            }
            let p = to_arr_packed(av).expect("packed constant");
            union_arr_data(&packed_impl(bits, p.elems), a, bits)
        }
        (Data::MapN(_), Data::ArrVal(av)) => {
            if let Some(m) = to_arr_mapn(av) {
                return Some(union_arr_data(a, &mapn_impl(bits, m.key, m.val), bits));
            }
            if let Some(m) = to_arr_map(av) {
                return Some(union_arr_data(&map_impl(bits, m.map), a, bits));
            }
            let p = to_arr_packedn(av).expect("packed constant");
            union_arr_data(&packedn_impl(bits, p.ty), a, bits)
        }

        (Data::Packed(x), Data::Map(y)) => {
            let (mk, mv) = map_key_values(y);
            mapn_impl(
                bits,
                union_of(Type::INT, mk),
                union_of(packed_values(x), mv),
            )
        }
        (Data::Packed(x), Data::MapN(y)) => mapn_impl(
            bits,
            union_of(y.key.clone(), Type::INT),
            union_of(packed_values(x), y.val.clone()),
        ),
        (Data::PackedN(x), Data::Map(y)) => {
            let (mk, mv) = map_key_values(y);
            mapn_impl(
                bits,
                union_of(Type::INT, mk),
                union_of(x.ty.clone(), mv),
            )
        }
        (Data::PackedN(x), Data::MapN(y)) => mapn_impl(
            bits,
            union_of(Type::INT, y.key.clone()),
            union_of(x.ty.clone(), y.val.clone()),
        ),
        (Data::Map(x), Data::MapN(y)) => {
            let (mk, mv) = map_key_values(x);
            mapn_impl(
                bits,
                union_of(mk, y.key.clone()),
                union_of(mv, y.val.clone()),
            )
        }
        _ => return None,
    };
    Some(t)
}

/// Join two specialized array-likes of the same family.
fn union_arr_like(a: Type, b: Type) -> Type {
    let new_bits = combine_arr_like_bits(a.bits, b.bits);
    if crate::relations::subtype_data(&a, &b) {
        return set_trep(b, new_bits);
    }
    if crate::relations::subtype_data(&b, &a) {
        return set_trep(a, new_bits);
    }
    union_arr_data(&a, &b, new_bits)
}

/// Union a specialized array-like `spec_a` with a same-family `b`.
/// `opt_e` and `opt` are the family's nullable-empty and nullable patterns.
/// Returns bottom when `b` is not of the family, signalling the caller to
/// fall through to the generic path.
fn spec_array_like_union(spec_a: Type, b: Type, opt_e: &Type, opt_all: &Type) -> Type {
    if !b.subtype_of(opt_all) {
        return Type::BOTTOM;
    }
    let bits = combine_arr_like_bits(spec_a.bits, b.bits);
    if !is_specialized_array_like(&b) {
        // An empty or nullable-empty other side keeps the specialization.
        if b.subtype_of(opt_e) {
            return set_trep(spec_a, bits);
        }
        return Type::of(bits);
    }

    let should_be_opt = is_opt(&spec_a) || is_opt(&b);
    let t = union_arr_like(spec_a, b);
    debug_assert!(!should_be_opt || is_opt(&t));
    t
}

/// The join. Prefers to keep specialization where a single payload can
/// cover both sides; otherwise falls back to the first named union that is
/// a supertype of both, and finally to Top.
pub fn union_of(a: Type, b: Type) -> Type {
    if a.subtype_of(&b) {
        return b;
    }
    if b.subtype_of(&a) {
        return a;
    }

    trace!(?a, ?b, "union_of");

    // Wait handles first: the generic object path would lose the inner
    // type, and null merges into the optional wait handle.
    if is_specialized_wait_handle(&a) {
        if is_specialized_wait_handle(&b) {
            let keep_opt = is_opt(&a) || is_opt(&b);
            let mut a = a;
            match (&mut a.data, &b.data) {
                (Data::Obj(da), Data::Obj(db)) => {
                    let aw = da.wh.as_mut().unwrap();
                    let bw = db.wh.as_ref().unwrap();
                    let merged = union_of((**aw).clone(), (**bw).clone());
                    *aw.make_mut() = merged;
                }
                _ => unreachable!(),
            }
            if keep_opt && !is_opt(&a) {
                return opt(a);
            }
            return a;
        }
        if b == Type::INIT_NULL {
            return opt(a);
        }
    }
    if is_specialized_wait_handle(&b) && a == Type::INIT_NULL {
        return opt(b);
    }

    if is_specialized_obj(&a) && is_specialized_obj(&b) {
        let keep_opt = is_opt(&a) || is_opt(&b);
        let da = dobj_of(&a);
        let db = dobj_of(&b);
        // `Obj<=Ancestor` covers both exact and bounded children, so the
        // result is always an upper bound.
        return match da.cls.common_ancestor(&db.cls) {
            Some(anc) => {
                if keep_opt {
                    opt(sub_obj(anc))
                } else {
                    sub_obj(anc)
                }
            }
            None if keep_opt => Type::OPT_OBJ,
            None => Type::OBJ,
        };
    }
    if a.strict_subtype_of(&Type::CLS) && b.strict_subtype_of(&Type::CLS) {
        let da = crate::types::dcls_of(&a);
        let db = crate::types::dcls_of(&b);
        return match da.cls.common_ancestor(&db.cls) {
            Some(anc) => sub_cls(anc),
            None => Type::CLS,
        };
    }

    if is_specialized_array(&a) {
        let t = spec_array_like_union(a.clone(), b.clone(), &Type::OPT_ARR_E, &Type::OPT_ARR);
        if t != Type::BOTTOM {
            return t;
        }
    } else if is_specialized_array(&b) {
        let t = spec_array_like_union(b.clone(), a.clone(), &Type::OPT_ARR_E, &Type::OPT_ARR);
        if t != Type::BOTTOM {
            return t;
        }
    }

    if is_specialized_vec(&a) {
        let t = spec_array_like_union(a.clone(), b.clone(), &Type::OPT_VEC_E, &Type::OPT_VEC);
        if t != Type::BOTTOM {
            return t;
        }
    } else if is_specialized_vec(&b) {
        let t = spec_array_like_union(b.clone(), a.clone(), &Type::OPT_VEC_E, &Type::OPT_VEC);
        if t != Type::BOTTOM {
            return t;
        }
    }

    if is_specialized_dict(&a) {
        let t = spec_array_like_union(a.clone(), b.clone(), &Type::OPT_DICT_E, &Type::OPT_DICT);
        if t != Type::BOTTOM {
            return t;
        }
    } else if is_specialized_dict(&b) {
        let t = spec_array_like_union(b.clone(), a.clone(), &Type::OPT_DICT_E, &Type::OPT_DICT);
        if t != Type::BOTTOM {
            return t;
        }
    }

    if is_specialized_keyset(&a) {
        let t =
            spec_array_like_union(a.clone(), b.clone(), &Type::OPT_KEYSET_E, &Type::OPT_KEYSET);
        if t != Type::BOTTOM {
            return t;
        }
    } else if is_specialized_keyset(&b) {
        let t =
            spec_array_like_union(b.clone(), a.clone(), &Type::OPT_KEYSET_E, &Type::OPT_KEYSET);
        if t != Type::BOTTOM {
            return t;
        }
    }

    if is_ref_with_inner(&a) && is_ref_with_inner(&b) {
        match (&a.data, &b.data) {
            (Data::RefInner(x), Data::RefInner(y)) => {
                return ref_to(union_of((**x).clone(), (**y).clone()));
            }
            _ => unreachable!(),
        }
    }

    macro_rules! try_union {
        ($($name:ident)*) => {
            $(
                if a.subtype_of(&Type::$name) && b.subtype_of(&Type::$name) {
                    return Type::$name;
                }
            )*
        };
    }

    try_union! {
        INT DBL SSTR

        SPARR PARR_E PARR_N PARR
        SVARR VARR_E VARR_N VARR
        SDARR DARR_E DARR_N DARR
        SARR_E SARR_N SARR ARR_E ARR_N ARR

        OBJ CLS NULL BOOL NUM STR

        SVEC VEC_E VEC_N VEC
        SDICT DICT_E DICT_N DICT
        SKEYSET KEYSET_E KEYSET_N KEYSET

        UNC_ARRKEY ARRKEY
    }

    // Unioning null into a type prefers the optional form so the non-null
    // refinement is not lost.
    if a == Type::INIT_NULL && bits::can_be_optional(b.bits) {
        return opt(b);
    }
    if b == Type::INIT_NULL && bits::can_be_optional(a.bits) {
        return opt(a);
    }

    try_union! {
        OPT_BOOL OPT_INT OPT_DBL OPT_NUM OPT_SSTR OPT_STR OPT_OBJ

        OPT_SPARR OPT_PARR_E OPT_PARR_N OPT_PARR
        OPT_SVARR OPT_VARR_E OPT_VARR_N OPT_VARR
        OPT_SDARR OPT_DARR_E OPT_DARR_N OPT_DARR
        OPT_SARR_E OPT_SARR_N OPT_SARR OPT_ARR_E OPT_ARR_N OPT_ARR

        OPT_SVEC OPT_VEC_E OPT_VEC_N OPT_VEC
        OPT_SDICT OPT_DICT_E OPT_DICT_N OPT_DICT
        OPT_SKEYSET OPT_KEYSET_E OPT_KEYSET_N OPT_KEYSET

        OPT_UNC_ARRKEY OPT_ARRKEY

        INIT_PRIM PRIM INIT_UNC UNC INIT_CELL CELL INIT_GEN GEN
    }

    Type::TOP
}

//////////////////////////////////////////////////////////////////////
// Widening.

fn widen_type_impl(t: &mut Type, depth: u32) {
    // Termination comes from bounding the nesting depth of array shapes;
    // scalar, class and object payloads cannot grow.
    if depth >= TYPE_WIDEN_MAX_DEPTH
        && matches!(
            t.data,
            Data::Packed(_) | Data::PackedN(_) | Data::Map(_) | Data::MapN(_)
        )
    {
        *t = Type::of(t.bits);
        return;
    }

    match &mut t.data {
        Data::None | Data::Str(_) | Data::Int(_) | Data::Dbl(_) | Data::Cls(_)
        | Data::ArrVal(_) => {}

        Data::Obj(d) => {
            if let Some(wh) = &mut d.wh {
                widen_type_impl(wh.make_mut(), depth + 1);
            }
        }

        Data::RefInner(inner) => widen_type_impl(inner.make_mut(), depth + 1),

        Data::Packed(p) => {
            for e in &mut p.make_mut().elems {
                widen_type_impl(e, depth + 1);
            }
        }

        Data::PackedN(p) => {
            widen_type_impl(&mut p.make_mut().ty, depth + 1);
        }

        Data::Map(m) => {
            for v in m.make_mut().map.values_mut() {
                widen_type_impl(v, depth + 1);
            }
        }

        Data::MapN(m) => {
            // The key is already at most an array key; only the value can
            // deepen.
            widen_type_impl(&mut m.make_mut().val, depth + 1);
        }
    }
}

/// A supertype of `t` whose payload nesting is bounded, so chains of
/// widened unions reach a fixed point.
pub fn widen_type(mut t: Type) -> Type {
    widen_type_impl(&mut t, 0);
    t
}

/// The union to use in fixed-point iteration.
pub fn widening_union(a: &Type, b: &Type) -> Type {
    if a.subtype_of(b) {
        return b.clone();
    }
    if b.subtype_of(a) {
        return a.clone();
    }
    widen_type(union_of(a.clone(), b.clone()))
}

//////////////////////////////////////////////////////////////////////
// Emptiness and friends.

/// A union that also strips the "emptyish" part of `a` (null, false, empty
/// string) when that is easy, used when member instructions promote such
/// bases. Only correct where `union_of(a, b)` would also be correct.
pub fn promote_emptyish(mut a: Type, b: Type) -> Type {
    if is_opt(&a) {
        a = unopt(a);
    }
    if a.subtype_of(&sempty()) {
        return b;
    }
    let t = a.bits - (Trep::NULL | Trep::FALSE);
    if !bits::is_predefined(t) {
        let widened = if Trep::INIT_PRIM.contains(t) {
            Trep::INIT_PRIM
        } else if Trep::INIT_UNC.contains(t) {
            Trep::INIT_UNC
        } else if Trep::INIT_CELL.contains(t) {
            Trep::INIT_CELL
        } else {
            Trep::INIT_GEN
        };
        return union_of(Type::of(widened), b);
    }
    a.bits = t;
    union_of(a, b)
}

/// Whether `t` could hold an object with a user-defined boolean
/// conversion.
pub fn could_have_magic_bool_conversion(t: &Type) -> bool {
    if !t.could_be(&Type::OBJ) {
        return false;
    }
    if is_specialized_obj(t)
        && (t.strict_subtype_of(&Type::OBJ)
            || (is_opt(t) && unopt(t.clone()).strict_subtype_of(&Type::OBJ)))
    {
        return dobj_of(t).cls.could_have_magic_bool();
    }
    true
}

/// What we know about the truthiness of `t`.
pub fn emptiness(t: &Type) -> Emptiness {
    let empty_mask = Trep::NULL | Trep::FALSE | Trep::ARR_E | Trep::VEC_E | Trep::DICT_E
        | Trep::KEYSET_E;
    if empty_mask.contains(t.bits) {
        return Emptiness::Empty;
    }
    let non_empty_mask =
        Trep::TRUE | Trep::ARR_N | Trep::VEC_N | Trep::DICT_N | Trep::KEYSET_N;
    if non_empty_mask.contains(t.bits) {
        return Emptiness::NonEmpty;
    }
    if t.strict_subtype_of(&Type::OBJ) {
        if !could_have_magic_bool_conversion(t) {
            return Emptiness::NonEmpty;
        }
    } else if let Some(v) = tv(t) {
        return if value_to_bool(&v) {
            Emptiness::NonEmpty
        } else {
            Emptiness::Empty
        };
    }
    Emptiness::Maybe
}

fn value_to_bool(v: &hazel_common::Value) -> bool {
    use hazel_common::Value;
    match v {
        Value::Uninit | Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Dbl(d) => *d != 0.0,
        Value::Str(s) => {
            let s = s.as_str();
            !s.is_empty() && s != "0"
        }
        Value::Arr(a) => !a.is_empty(),
    }
}

/// The coarsest stack-discipline classification of `a`.
///
/// Pre: `a` is a subtype of `Gen` or of `Cls`.
pub fn stack_flav(a: &Type) -> Type {
    if a.subtype_of(&Type::UNINIT) {
        return Type::UNINIT;
    }
    if a.subtype_of(&Type::INIT_CELL) {
        return Type::INIT_CELL;
    }
    if a.subtype_of(&Type::REF) {
        return Type::REF;
    }
    if a.subtype_of(&Type::CLS) {
        return Type::CLS;
    }
    if a.subtype_of(&Type::GEN) {
        return Type::GEN;
    }
    panic!("stack_flav passed an invalid type");
}
