//! Indexed projection and mutation over array-like types.
//!
//! `array_like_elem`, `array_like_set` and `array_like_newelem` model
//! `arr[key]`, `arr[key] = val` and `arr[] = val` on the lattice. They
//! dispatch on the payload shape and return a `ThrowMode` describing what
//! the modeled program might do at the site. The plain-array family treats
//! a missed read as null; the vector and set families treat ill-kinded
//! operations as statically bad.

use tracing::trace;

use crate::bits::{combine_dv_arr_like_bits, maybe_promote_varray, promote_varray, Trep};
use crate::conv::from_cell;
use crate::keys::{disect_array_key, disect_strict_key, disect_vec_key, ArrKey};
use crate::operations::union_of;
use crate::types::{
    is_opt, is_specialized_array_like, ival, map_impl, map_key_values, mapn_impl, packed_impl,
    packed_values, packedn_impl, to_arr_map, to_arr_packed, val_key_values, Data, MapElems,
    MapKey, ThrowMode, Type,
};

//////////////////////////////////////////////////////////////////////
// Per-payload reads. Each returns the element type and whether the element
// definitely exists.

fn arr_val_elem(aval: &Type, key: &ArrKey) -> (Type, bool) {
    let Data::ArrVal(ad) = &aval.data else {
        unreachable!("arr_val_elem on a non-constant payload")
    };
    let is_plain = Trep::OPT_ARR.contains(aval.bits);
    let miss = || {
        if is_plain {
            Type::INIT_NULL
        } else {
            Type::BOTTOM
        }
    };

    if let Some(mk) = key.map_key() {
        let k = match mk {
            MapKey::Int(i) => hazel_common::ConstKey::Int(i),
            MapKey::Str(s) => hazel_common::ConstKey::Str(s),
        };
        return match ad.get(&k) {
            Some(v) => (from_cell(v.clone()), true),
            None => (miss(), false),
        };
    }

    let could_be_int = key.ty.could_be(&Type::INT);
    let could_be_str = key.ty.could_be(&Type::STR);
    let mut ty = miss();
    for (k, v) in ad.iter() {
        let reachable = match k {
            hazel_common::ConstKey::Int(_) => could_be_int,
            hazel_common::ConstKey::Str(_) => could_be_str,
        };
        if reachable {
            ty = union_of(ty, from_cell(v.clone()));
            if Type::INIT_CELL.subtype_of(&ty) {
                break;
            }
        }
    }
    (ty, false)
}

fn arr_map_elem(map: &Type, key: &ArrKey) -> (Type, bool) {
    let Data::Map(m) = &map.data else {
        unreachable!("arr_map_elem on a non-map payload")
    };
    let is_plain = Trep::OPT_ARR.contains(map.bits);
    let miss = || {
        if is_plain {
            Type::INIT_NULL
        } else {
            Type::BOTTOM
        }
    };

    if let Some(k) = key.map_key() {
        return match m.map.get(&k) {
            Some(v) => (v.clone(), true),
            None => (miss(), false),
        };
    }

    let could_be_int = key.ty.could_be(&Type::INT);
    let could_be_str = key.ty.could_be(&Type::STR);
    let mut ty = miss();
    for (k, v) in m.map.iter() {
        let reachable = match k {
            MapKey::Int(_) => could_be_int,
            MapKey::Str(_) => could_be_str,
        };
        if reachable {
            ty = union_of(ty, v.clone());
            if Type::INIT_CELL.subtype_of(&ty) {
                break;
            }
        }
    }
    (ty, false)
}

fn arr_packed_elem(pack: &Type, key: &ArrKey) -> (Type, bool) {
    let Data::Packed(p) = &pack.data else {
        unreachable!("arr_packed_elem on a non-packed payload")
    };
    let is_plain = Trep::OPT_ARR.contains(pack.bits);
    let miss = || {
        if is_plain {
            Type::INIT_NULL
        } else {
            Type::BOTTOM
        }
    };

    if let Some(i) = key.i {
        if i >= 0 && (i as usize) < p.elems.len() {
            return (p.elems[i as usize].clone(), true);
        }
        return (miss(), false);
    }
    if !key.ty.could_be(&Type::INT) {
        return (miss(), false);
    }
    let mut ret = packed_values(p);
    if is_plain {
        ret = union_of(ret, Type::INIT_NULL);
    }
    (ret, false)
}

fn arr_packedn_elem(pack: &Type, key: &ArrKey) -> (Type, bool) {
    let Data::PackedN(p) = &pack.data else {
        unreachable!("arr_packedn_elem on a non-packed payload")
    };
    let is_plain = Trep::OPT_ARR.contains(pack.bits);

    if key.s.is_some() || !key.ty.could_be(&Type::INT) || matches!(key.i, Some(i) if i < 0) {
        let miss = if is_plain {
            Type::INIT_NULL
        } else {
            Type::BOTTOM
        };
        return (miss, false);
    }

    if is_plain {
        return (union_of(p.ty.clone(), Type::INIT_NULL), false);
    }
    (p.ty.clone(), false)
}

//////////////////////////////////////////////////////////////////////
// Per-payload writes. Each applies `pack[key] = val` in place and reports
// whether the key is known to land.

fn arr_packedn_set(pack: &mut Type, key: &ArrKey, val: &Type, maybe_empty: bool) -> bool {
    debug_assert!(key.ty.subtype_of(&Type::ARRKEY));
    let is_plain = Trep::OPT_ARR.contains(pack.bits);
    let is_vector = Trep::OPT_VEC.contains(pack.bits);

    let ty = {
        let Data::PackedN(p) = &mut pack.data else {
            unreachable!("arr_packedn_set on a non-packed payload")
        };
        let p = p.make_mut();
        p.ty = union_of(p.ty.clone(), val.clone());
        p.ty.clone()
    };

    if let Some(i) = key.i {
        // A key known to be in range keeps the homogeneous packed shape.
        if is_plain {
            if i == 0 {
                return true;
            }
            if !maybe_empty && i == 1 {
                return true;
            }
        } else if !maybe_empty && i == 0 {
            return true;
        }
        pack.bits = if i < 0 {
            promote_varray(pack.bits)
        } else {
            maybe_promote_varray(pack.bits)
        };
    } else {
        pack.bits = if key.ty.subtype_of(&Type::STR) {
            promote_varray(pack.bits)
        } else {
            maybe_promote_varray(pack.bits)
        };
    }

    if !is_vector {
        *pack = mapn_impl(pack.bits, union_of(Type::INT, key.ty.clone()), ty);
    }
    false
}

fn arr_map_set(map: &mut Type, key: &ArrKey, val: &Type) -> bool {
    debug_assert!(key.ty.subtype_of(&Type::ARRKEY));
    debug_assert!(!Trep::VARR.contains(map.bits - Trep::INIT_NULL));

    if let Some(k) = key.map_key() {
        let Data::Map(m) = &mut map.data else {
            unreachable!("arr_map_set on a non-map payload")
        };
        let m = m.make_mut();
        match m.map.position(&k) {
            Some(idx) => {
                if m.map.value_at(idx).subtype_of(&Type::INIT_CELL) {
                    m.map.set_value_at(idx, val.clone());
                }
            }
            None => m.map.push(k, val.clone()),
        }
        return true;
    }

    let (mk, mv) = match &map.data {
        Data::Map(m) => map_key_values(m),
        _ => unreachable!(),
    };
    *map = mapn_impl(
        map.bits,
        union_of(mk, key.ty.clone()),
        union_of(mv, val.clone()),
    );
    true
}

fn arr_packed_set(pack: &mut Type, key: &ArrKey, val: &Type) -> bool {
    debug_assert!(key.ty.subtype_of(&Type::ARRKEY));
    let is_vector = Trep::OPT_VEC.contains(pack.bits);

    let len = match &pack.data {
        Data::Packed(p) => p.elems.len(),
        _ => unreachable!("arr_packed_set on a non-packed payload"),
    };

    if let Some(i) = key.i {
        if i >= 0 {
            if (i as usize) < len {
                let Data::Packed(p) = &mut pack.data else {
                    unreachable!()
                };
                let elem = &mut p.make_mut().elems[i as usize];
                if elem.subtype_of(&Type::INIT_CELL) {
                    *elem = val.clone();
                }
                return true;
            }
            if !is_vector && i as usize == len {
                let Data::Packed(p) = &mut pack.data else {
                    unreachable!()
                };
                p.make_mut().elems.push(val.clone());
                return true;
            }
        }
        if is_vector {
            *pack = Type::BOTTOM;
            return false;
        }
        pack.bits = promote_varray(pack.bits);
    } else {
        pack.bits = if key.ty.subtype_of(&Type::STR) {
            promote_varray(pack.bits)
        } else {
            maybe_promote_varray(pack.bits)
        };
    }

    if !is_vector {
        if let Some(k) = key.map_key() {
            let Data::Packed(p) = &pack.data else {
                unreachable!()
            };
            let mut elems = MapElems::new();
            for (idx, t) in p.elems.iter().enumerate() {
                elems.push(MapKey::Int(idx as i64), t.clone());
            }
            // The new key cannot collide with the packed prefix, or the
            // in-range path above would have taken it.
            elems.push(k, val.clone());
            *pack = map_impl(pack.bits, elems);
            return true;
        }

        let ty = {
            let Data::Packed(p) = &pack.data else {
                unreachable!()
            };
            union_of(packed_values(p), val.clone())
        };
        *pack = mapn_impl(pack.bits, union_of(Type::INT, key.ty.clone()), ty);
        return false;
    }

    let ty = {
        let Data::Packed(p) = &pack.data else {
            unreachable!()
        };
        union_of(packed_values(p), val.clone())
    };
    *pack = packedn_impl(pack.bits, ty);
    false
}

fn arr_mapn_set(map: &mut Type, key: &ArrKey, val: &Type) -> bool {
    debug_assert!(key.ty.subtype_of(&Type::ARRKEY));
    debug_assert!(!Trep::VARR.contains(map.bits - Trep::INIT_NULL));
    let bits = map.bits;
    let (k, v) = match &map.data {
        Data::MapN(m) => (
            union_of(m.key.clone(), key.ty.clone()),
            union_of(m.val.clone(), val.clone()),
        ),
        _ => unreachable!("arr_mapn_set on a non-map payload"),
    };
    *map = mapn_impl(bits, k, v);
    debug_assert!(map.check_invariants());
    true
}

/// Append to a fixed map: the next unused integer key. Returns the type of
/// the appended key; an exhausted integer key space degrades to `Int`.
fn arr_map_newelem(map: &mut Type, val: &Type) -> Type {
    let Data::Map(m) = &mut map.data else {
        unreachable!("arr_map_newelem on a non-map payload")
    };
    let mut last_k: i64 = -1;
    for (k, _) in m.map.iter() {
        if let MapKey::Int(i) = k {
            if *i > last_k {
                last_k = *i;
            }
        }
    }
    if last_k == i64::MAX {
        return Type::INT;
    }
    m.make_mut().map.push(MapKey::Int(last_k + 1), val.clone());
    ival(last_k + 1)
}

//////////////////////////////////////////////////////////////////////
// The public refinement operators.

/// The refined type of `arr[key]`.
pub fn array_like_elem(arr: &Type, key: &ArrKey) -> (Type, ThrowMode) {
    let maybe_empty = arr.bits.intersects(Trep::ARR_LIKE_E);
    let must_be_static = Trep::S_ARR_LIKE.contains(arr.bits);
    let is_plain = Trep::OPT_ARR.contains(arr.bits);

    if !arr.bits.intersects(Trep::ARR_LIKE_N) {
        debug_assert!(maybe_empty);
        // A read from a definitely-empty plain array yields null; the
        // other families have no missed-read value and always fault.
        if is_plain {
            return (Type::INIT_NULL, ThrowMode::MissingElement);
        }
        return (Type::BOTTOM, ThrowMode::BadOperation);
    }

    let (ty, present) = match &arr.data {
        Data::None => {
            let ty = if must_be_static {
                Type::INIT_UNC
            } else {
                Type::INIT_CELL
            };
            (ty, false)
        }
        Data::ArrVal(_) => arr_val_elem(arr, key),
        Data::Packed(_) => arr_packed_elem(arr, key),
        Data::PackedN(_) => arr_packedn_elem(arr, key),
        Data::Map(_) => arr_map_elem(arr, key),
        Data::MapN(m) => {
            let ty = if is_plain {
                union_of(m.val.clone(), Type::INIT_NULL)
            } else {
                m.val.clone()
            };
            (ty, false)
        }
        _ => unreachable!("array payload expected"),
    };

    let mut mode = if key.may_throw {
        ThrowMode::MaybeBadKey
    } else if present {
        ThrowMode::None
    } else {
        ThrowMode::MaybeMissingElement
    };
    let mut ty = if ty.subtype_of(&Type::INIT_CELL) {
        ty
    } else {
        Type::INIT_CELL
    };

    if maybe_empty {
        if is_plain {
            ty = union_of(ty, Type::INIT_NULL);
        }
        if mode == ThrowMode::None {
            mode = ThrowMode::MaybeMissingElement;
        }
    }

    // Outside the plain family a missed read has no value to produce: the
    // access is statically bad.
    if ty == Type::BOTTOM && !is_plain {
        mode = ThrowMode::BadOperation;
    }

    (ty, mode)
}

/// The refined array type after `arr[key] = val`.
pub fn array_like_set(arr: Type, key: &ArrKey, val_in: &Type) -> (Type, ThrowMode) {
    let maybe_empty = arr.bits.intersects(Trep::ARR_LIKE_E);
    let is_vector = arr.bits.intersects(Trep::OPT_VEC);
    let is_plain = arr.bits.intersects(Trep::OPT_ARR);
    let key_bound = if is_vector { Type::INT } else { Type::ARRKEY };
    let valid_key = key.ty.subtype_of(&key_bound);

    trace!(?arr, ?key, "array_like_set");

    let mut bits = combine_dv_arr_like_bits(arr.bits, Trep::ARR_LIKE_N);
    if valid_key {
        bits -= Trep::ARR_LIKE_E;
    }

    // A reference stored into a shared array may revert to a plain cell on
    // copy, so only the plain family can track it; others store a cell.
    let fix_ref = !is_plain && val_in.could_be(&Type::REF);
    let throw_mode = if !fix_ref && valid_key && !key.may_throw {
        ThrowMode::None
    } else {
        ThrowMode::BadOperation
    };
    let val = if fix_ref {
        Type::INIT_CELL
    } else {
        val_in.clone()
    };

    // A strange key (array, object) must not leak into specialized keys.
    let fixed_key: ArrKey = if valid_key {
        key.clone()
    } else {
        ArrKey {
            i: None,
            s: None,
            ty: Type::ARRKEY,
            may_throw: true,
        }
    };

    if !arr.bits.intersects(Trep::ARR_LIKE_N) {
        debug_assert!(maybe_empty);
        if is_vector {
            return (Type::BOTTOM, ThrowMode::BadOperation);
        }
        if let Some(i) = fixed_key.i {
            if i == 0 {
                return (packed_impl(bits, vec![val]), throw_mode);
            }
            bits = promote_varray(bits);
        } else {
            bits = if fixed_key.ty.subtype_of(&Type::STR) {
                promote_varray(bits)
            } else {
                maybe_promote_varray(bits)
            };
        }
        if let Some(k) = fixed_key.map_key() {
            let mut m = MapElems::new();
            m.push(k, val);
            return (map_impl(bits, m), throw_mode);
        }
        return (mapn_impl(bits, fixed_key.ty.clone(), val), throw_mode);
    }

    let empty_helper = |bits: Trep, in_key: Type, in_val: Type| -> (Type, ThrowMode) {
        let bits = if fixed_key.ty.subtype_of(&Type::STR) {
            promote_varray(bits)
        } else {
            maybe_promote_varray(bits)
        };
        (
            mapn_impl(
                bits,
                union_of(in_key, fixed_key.ty.clone()),
                union_of(in_val, val.clone()),
            ),
            throw_mode,
        )
    };

    let mut arr = arr;
    arr.bits = bits;

    match &arr.data {
        Data::None => {
            arr.bits = if fixed_key.ty.subtype_of(&Type::STR) {
                promote_varray(arr.bits)
            } else {
                maybe_promote_varray(arr.bits)
            };
            (arr, ThrowMode::BadOperation)
        }

        Data::ArrVal(av) => {
            if maybe_empty && !is_vector {
                let (k, v) = val_key_values(av);
                empty_helper(bits, k, v)
            } else if let Some(p) = to_arr_packed(av) {
                array_like_set(packed_impl(bits, p.elems), key, val_in)
            } else {
                debug_assert!(!is_vector);
                let m = to_arr_map(av).expect("non-packed constant");
                array_like_set(map_impl(bits, m.map), key, val_in)
            }
        }

        Data::Packed(p) => {
            // Setting element zero of a maybe-empty one-element packed
            // array still yields a one-element packed array.
            let keeps_shape = matches!(fixed_key.i, Some(0)) && p.elems.len() == 1;
            if maybe_empty && !is_vector && !keeps_shape {
                let v = packed_values(p);
                empty_helper(bits, Type::INT, v)
            } else {
                let in_range = arr_packed_set(&mut arr, &fixed_key, &val);
                let mode = if in_range {
                    throw_mode
                } else {
                    ThrowMode::BadOperation
                };
                (arr, mode)
            }
        }

        Data::PackedN(p) => {
            if maybe_empty && !is_vector {
                let v = p.ty.clone();
                empty_helper(bits, Type::INT, v)
            } else {
                let in_range = arr_packedn_set(&mut arr, &fixed_key, &val, false);
                let mode = if in_range {
                    throw_mode
                } else {
                    ThrowMode::BadOperation
                };
                (arr, mode)
            }
        }

        Data::Map(m) => {
            debug_assert!(!is_vector);
            if maybe_empty {
                let (k, v) = map_key_values(m);
                empty_helper(bits, k, v)
            } else {
                let in_range = arr_map_set(&mut arr, &fixed_key, &val);
                let mode = if in_range {
                    throw_mode
                } else {
                    ThrowMode::BadOperation
                };
                (arr, mode)
            }
        }

        Data::MapN(m) => {
            debug_assert!(!is_vector);
            if maybe_empty {
                let (k, v) = (m.key.clone(), m.val.clone());
                empty_helper(bits, k, v)
            } else {
                let in_range = arr_mapn_set(&mut arr, &fixed_key, &val);
                let mode = if in_range {
                    throw_mode
                } else {
                    ThrowMode::BadOperation
                };
                (arr, mode)
            }
        }

        _ => unreachable!("array payload expected"),
    }
}

/// The refined array type after an append, plus the type of the appended
/// key.
pub fn array_like_newelem(arr: Type, val: &Type) -> (Type, Type) {
    // Appending to a set-valued array is a strict-key set with the value as
    // its own key.
    if arr.bits.intersects(Trep::OPT_KEYSET) {
        let key = disect_strict_key(val);
        if key.ty == Type::BOTTOM {
            return (Type::BOTTOM, Type::INIT_CELL);
        }
        let ty = key.ty.clone();
        return (array_like_set(arr, &key, &ty).0, val.clone());
    }

    let maybe_empty = arr.bits.intersects(Trep::ARR_LIKE_E);
    let is_vector = arr.bits.intersects(Trep::OPT_VEC);
    let is_varray = Trep::OPT_VARR.contains(arr.bits);

    let bits = combine_dv_arr_like_bits(arr.bits, Trep::ARR_LIKE_N) - Trep::ARR_LIKE_E;

    if !arr.bits.intersects(Trep::ARR_LIKE_N) {
        debug_assert!(maybe_empty);
        return (packed_impl(bits, vec![val.clone()]), ival(0));
    }

    let empty_helper = |in_key: Type, in_val: Type| -> (Type, Type) {
        if is_vector || is_varray {
            debug_assert!(in_key.subtype_of(&Type::INT));
            return (packedn_impl(bits, union_of(in_val, val.clone())), Type::INT);
        }
        (
            mapn_impl(
                bits,
                union_of(in_key, Type::INT),
                union_of(in_val, val.clone()),
            ),
            Type::INT,
        )
    };

    let mut arr = arr;
    match &arr.data {
        Data::None => {
            arr.bits = bits;
            (arr, Type::INT)
        }

        Data::ArrVal(av) => {
            if maybe_empty {
                let (k, v) = val_key_values(av);
                empty_helper(k, v)
            } else if let Some(p) = to_arr_packed(av) {
                array_like_newelem(packed_impl(bits, p.elems), val)
            } else {
                debug_assert!(!is_vector);
                let m = to_arr_map(av).expect("non-packed constant");
                array_like_newelem(map_impl(bits, m.map), val)
            }
        }

        Data::Packed(p) => {
            if maybe_empty {
                let v = packed_values(p);
                empty_helper(Type::INT, v)
            } else {
                arr.bits = bits;
                let Data::Packed(p) = &mut arr.data else {
                    unreachable!()
                };
                let len = p.elems.len();
                p.make_mut().elems.push(val.clone());
                (arr, ival(len as i64))
            }
        }

        Data::PackedN(p) => {
            if maybe_empty {
                let v = p.ty.clone();
                empty_helper(Type::INT, v)
            } else {
                arr.bits = bits;
                let Data::PackedN(p) = &mut arr.data else {
                    unreachable!()
                };
                let p = p.make_mut();
                p.ty = union_of(p.ty.clone(), val.clone());
                (arr, Type::INT)
            }
        }

        Data::Map(m) => {
            debug_assert!(!is_vector && !is_varray);
            if maybe_empty {
                let (k, v) = map_key_values(m);
                empty_helper(k, v)
            } else {
                arr.bits = bits;
                let idx = arr_map_newelem(&mut arr, val);
                (arr, idx)
            }
        }

        Data::MapN(m) => {
            debug_assert!(!is_vector && !is_varray);
            if maybe_empty {
                let (k, v) = (m.key.clone(), m.val.clone());
                empty_helper(k, v)
            } else {
                let t = mapn_impl(
                    bits,
                    union_of(m.key.clone(), Type::INT),
                    union_of(m.val.clone(), val.clone()),
                );
                (t, Type::INT)
            }
        }

        _ => unreachable!("array payload expected"),
    }
}

//////////////////////////////////////////////////////////////////////
// Per-family wrappers.

/// `arr[key]` on the plain-array family.
///
/// Pre: `arr.subtype_of(&Type::ARR)`.
pub fn array_elem(arr: &Type, key: &Type) -> (Type, ThrowMode) {
    debug_assert!(arr.subtype_of(&Type::ARR));
    let key = disect_array_key(key);
    array_like_elem(arr, &key)
}

/// `arr[key] = val` on the plain-array family.
pub fn array_set(arr: Type, key: &Type, val: &Type) -> (Type, ThrowMode) {
    debug_assert!(arr.subtype_of(&Type::ARR));
    // A stored reference may or may not survive a copy of the array, so
    // callers model it as a generic cell instead.
    assert!(
        *val == Type::BOTTOM || !val.subtype_of(&Type::REF),
        "reference types do not belong in arrays"
    );

    let key = disect_array_key(key);
    debug_assert!(key.ty != Type::BOTTOM);
    array_like_set(arr, &key, val)
}

/// `arr[] = val` on the plain-array family; also returns the appended key
/// type.
pub fn array_newelem(arr: Type, val: &Type) -> (Type, Type) {
    debug_assert!(arr.subtype_of(&Type::ARR));
    assert!(
        *val == Type::BOTTOM || !val.subtype_of(&Type::REF),
        "reference types do not belong in arrays"
    );
    array_like_newelem(arr, val)
}

/// `vec[key]`.
pub fn vec_elem(vec: &Type, key: &Type) -> (Type, ThrowMode) {
    let key = disect_vec_key(key);
    if key.ty == Type::BOTTOM {
        return (Type::BOTTOM, ThrowMode::BadOperation);
    }
    array_like_elem(vec, &key)
}

/// `vec[key] = val`.
pub fn vec_set(vec: Type, key: &Type, val: &Type) -> (Type, ThrowMode) {
    if !val.could_be(&Type::INIT_CELL) {
        return (Type::BOTTOM, ThrowMode::BadOperation);
    }
    let key = disect_vec_key(key);
    if key.ty == Type::BOTTOM {
        return (Type::BOTTOM, ThrowMode::BadOperation);
    }
    array_like_set(vec, &key, val)
}

/// `vec[] = val`.
pub fn vec_newelem(vec: Type, val: &Type) -> (Type, Type) {
    let val = if val.subtype_of(&Type::INIT_CELL) {
        val.clone()
    } else {
        Type::INIT_CELL
    };
    array_like_newelem(vec, &val)
}

/// `dict[key]`.
pub fn dict_elem(dict: &Type, key: &Type) -> (Type, ThrowMode) {
    let key = disect_strict_key(key);
    if key.ty == Type::BOTTOM {
        return (Type::BOTTOM, ThrowMode::BadOperation);
    }
    array_like_elem(dict, &key)
}

/// `dict[key] = val`.
pub fn dict_set(dict: Type, key: &Type, val: &Type) -> (Type, ThrowMode) {
    if !val.could_be(&Type::INIT_CELL) {
        return (Type::BOTTOM, ThrowMode::BadOperation);
    }
    let key = disect_strict_key(key);
    if key.ty == Type::BOTTOM {
        return (Type::BOTTOM, ThrowMode::BadOperation);
    }
    array_like_set(dict, &key, val)
}

/// `dict[] = val`.
pub fn dict_newelem(dict: Type, val: &Type) -> (Type, Type) {
    let val = if val.subtype_of(&Type::INIT_CELL) {
        val.clone()
    } else {
        Type::INIT_CELL
    };
    array_like_newelem(dict, &val)
}

/// `keyset[key]`.
pub fn keyset_elem(keyset: &Type, key: &Type) -> (Type, ThrowMode) {
    let key = disect_strict_key(key);
    if key.ty == Type::BOTTOM {
        return (Type::BOTTOM, ThrowMode::BadOperation);
    }
    array_like_elem(keyset, &key)
}

/// Keyed writes into set-valued arrays are statically ill-typed.
pub fn keyset_set(_keyset: Type, _key: &Type, _val: &Type) -> (Type, ThrowMode) {
    (Type::BOTTOM, ThrowMode::BadOperation)
}

/// `keyset[] = val`.
pub fn keyset_newelem(keyset: Type, val: &Type) -> (Type, Type) {
    array_like_newelem(keyset, val)
}

//////////////////////////////////////////////////////////////////////
// Iteration.

/// Best known facts about iterating a value of some type.
#[derive(Clone, Debug)]
pub struct IterTypes {
    pub key: Type,
    pub value: Type,
    pub count: IterCount,
    pub may_throw_on_init: bool,
    pub may_throw_on_next: bool,
}

/// Bound on the number of elements iterated.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum IterCount {
    /// No elements.
    Empty,
    /// Exactly one element.
    Single,
    /// Zero or one element.
    ZeroOrOne,
    /// Non-empty, unknown bound.
    NonEmpty,
    /// Nothing known.
    Any,
}

/// What a non-mutating loop over `iterable` sees.
pub fn iter_types(iterable: &Type) -> IterTypes {
    // Only array-likes and objects iterate; anything else raises and skips
    // the loop.
    if !iterable.could_be_any(&[
        &Type::ARR,
        &Type::VEC,
        &Type::DICT,
        &Type::KEYSET,
        &Type::OBJ,
    ]) {
        return IterTypes {
            key: Type::BOTTOM,
            value: Type::BOTTOM,
            count: IterCount::Empty,
            may_throw_on_init: true,
            may_throw_on_next: true,
        };
    }

    // Optional array-likes are fine: a null initializes no locals (but may
    // raise on init).
    if !iterable.subtype_of_any(&[
        &Type::OPT_ARR,
        &Type::OPT_VEC,
        &Type::OPT_DICT,
        &Type::OPT_KEYSET,
    ]) {
        return IterTypes {
            key: Type::INIT_CELL,
            value: Type::INIT_CELL,
            count: IterCount::Any,
            may_throw_on_init: true,
            may_throw_on_next: iterable.could_be(&Type::OBJ),
        };
    }

    let may_throw = is_opt(iterable);

    if iterable.subtype_of_any(&[
        &Type::OPT_ARR_E,
        &Type::OPT_VEC_E,
        &Type::OPT_DICT_E,
        &Type::OPT_KEYSET_E,
    ]) {
        return IterTypes {
            key: Type::BOTTOM,
            value: Type::BOTTOM,
            count: IterCount::Empty,
            may_throw_on_init: may_throw,
            may_throw_on_next: false,
        };
    }

    // A null base acts like an empty array, so it also counts as "maybe
    // empty".
    let maybe_empty = may_throw
        || !iterable.subtype_of_any(&[
            &Type::OPT_ARR_N,
            &Type::OPT_VEC_N,
            &Type::OPT_DICT_N,
            &Type::OPT_KEYSET_N,
        ]);

    let count = |size: Option<i64>| -> IterCount {
        if let Some(size) = size {
            debug_assert!(size > 0);
            if size == 1 {
                return if maybe_empty {
                    IterCount::ZeroOrOne
                } else {
                    IterCount::Single
                };
            }
        }
        if maybe_empty {
            IterCount::Any
        } else {
            IterCount::NonEmpty
        }
    };

    if !is_specialized_array_like(iterable) {
        let (key, value) = if iterable.subtype_of(&Type::OPT_SVEC) {
            (Type::INT, Type::INIT_UNC)
        } else if iterable.subtype_of(&Type::OPT_SDICT) {
            (Type::UNC_ARRKEY, Type::INIT_UNC)
        } else if iterable.subtype_of(&Type::OPT_SKEYSET) {
            (Type::UNC_ARRKEY, Type::UNC_ARRKEY)
        } else if iterable.subtype_of(&Type::OPT_SVARR) {
            (Type::INT, Type::INIT_UNC)
        } else if iterable.subtype_of(&Type::OPT_SARR) {
            (Type::UNC_ARRKEY, Type::INIT_UNC)
        } else if iterable.subtype_of(&Type::OPT_VEC) {
            (Type::INT, Type::INIT_CELL)
        } else if iterable.subtype_of(&Type::OPT_DICT) {
            (Type::ARRKEY, Type::INIT_CELL)
        } else if iterable.subtype_of(&Type::OPT_KEYSET) {
            (Type::ARRKEY, Type::ARRKEY)
        } else if iterable.subtype_of(&Type::OPT_VARR) {
            (Type::INT, Type::INIT_CELL)
        } else if iterable.subtype_of(&Type::OPT_ARR) {
            (Type::ARRKEY, Type::INIT_CELL)
        } else {
            unreachable!("array-like expected")
        };
        return IterTypes {
            key,
            value,
            count: count(None),
            may_throw_on_init: may_throw,
            may_throw_on_next: false,
        };
    }

    let (key, value, size) = match &iterable.data {
        Data::ArrVal(av) => {
            let (k, v) = val_key_values(av);
            (k, v, Some(av.size() as i64))
        }
        Data::Packed(p) => (
            Type::INT,
            packed_values(p),
            Some(p.elems.len() as i64),
        ),
        Data::PackedN(p) => (Type::INT, p.ty.clone(), None),
        Data::Map(m) => {
            let (k, v) = map_key_values(m);
            (k, v, Some(m.map.len() as i64))
        }
        Data::MapN(m) => (m.key.clone(), m.val.clone(), None),
        _ => unreachable!("specialized array payload expected"),
    };

    IterTypes {
        key,
        value,
        count: count(size),
        may_throw_on_init: may_throw,
        may_throw_on_next: false,
    }
}

//////////////////////////////////////////////////////////////////////
// Destructor and copy-on-write probes.

/// Could releasing a value of this type run user code?
pub fn could_run_destructor(t: &Type) -> bool {
    if t.could_be(&Type::OBJ) {
        return true;
    }

    // Only counted non-empty containers can hold destructible values;
    // keysets cannot hold objects at all.
    let counted_arr = t
        .bits
        .intersects(Trep::CARR_N | Trep::CVEC_N | Trep::CDICT_N);

    if t.could_be(&Type::REF) {
        if !counted_arr {
            if let Data::RefInner(inner) = &t.data {
                return could_run_destructor(inner);
            }
        }
        return true;
    }

    if !counted_arr {
        return false;
    }

    match &t.data {
        Data::ArrVal(_) => false,
        Data::Packed(p) => p.elems.iter().any(could_run_destructor),
        Data::PackedN(p) => could_run_destructor(&p.ty),
        Data::Map(m) => m.map.iter().any(|(_, v)| could_run_destructor(v)),
        Data::MapN(m) => could_run_destructor(&m.val),
        _ => true,
    }
}

/// Could a write to a value of this type trigger a copy?
pub fn could_copy_on_write(t: &Type) -> bool {
    t.bits.intersects(
        Trep::CSTR | Trep::CARR_N | Trep::CVEC_N | Trep::CDICT_N | Trep::CKEYSET_N,
    )
}
