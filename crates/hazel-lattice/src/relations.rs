//! Equality, subtype and could-be over lattice points.
//!
//! All three relations decide the coarse answer on the bit patterns first
//! and consult payloads only when both operands carry one. Payload pairs of
//! different shapes go through the dispatch matrix at the bottom of this
//! file: a constant container is first viewed as a packed or map shape and
//! the relation then reduces to the shape/shape case. Subtype is the one
//! relation that is not symmetric, so it spells out every directed pair;
//! the symmetric relations canonicalize the operand order instead.
//!
//! `could_be` is reflexive and symmetric but NOT transitive. It must never
//! be chained.

use hazel_common::ArrConst;

use crate::bits::{self, Trep};
use crate::conv::from_cell;
use crate::types::{
    to_arr_map, to_arr_packed, to_arr_packedn, Bound, DArrMap, DArrMapN, DArrPacked, DArrPackedN,
    Data, Type,
};

impl Type {
    /// Is every value of `self` also a value of `o`? A `false` answer may
    /// mean "unknown"; a `true` answer is definite.
    pub fn subtype_of(&self, o: &Type) -> bool {
        let isect = self.bits & o.bits;
        if isect != self.bits {
            return false;
        }

        // No payload is always more general.
        if !o.has_data() {
            return true;
        }
        if !self.has_data() {
            return !bits::may_have_data(self.bits);
        }

        subtype_data(self, o)
    }

    pub fn strict_subtype_of(&self, o: &Type) -> bool {
        debug_assert!(self.check_invariants());
        debug_assert!(o.check_invariants());
        self != o && self.subtype_of(o)
    }

    /// Subtype of at least one of `ts`.
    pub fn subtype_of_any(&self, ts: &[&Type]) -> bool {
        ts.iter().any(|t| self.subtype_of(t))
    }

    /// Do `self` and `o` share any value? Conservative: must be precise
    /// when answering `false`.
    pub fn could_be(&self, o: &Type) -> bool {
        debug_assert!(self.check_invariants());
        debug_assert!(o.check_invariants());

        let isect = self.bits & o.bits;
        if isect.is_empty() {
            return false;
        }
        // If the overlap admits a cell that never carries a payload the
        // overlap is certainly inhabited.
        if isect.intersects(Trep::NULL | Trep::BOOL | Trep::ARR_LIKE_E | Trep::CSTR) {
            return true;
        }
        if !self.has_data() || !o.has_data() {
            return true;
        }
        // Both carry payloads. If the overlap cannot carry one, the
        // payloads cannot conflict on it.
        if !bits::may_have_data(isect) {
            return true;
        }
        could_be_data(self, o)
    }

    /// Could-be of at least one of `ts`.
    pub fn could_be_any(&self, ts: &[&Type]) -> bool {
        ts.iter().any(|t| self.could_be(t))
    }
}

//////////////////////////////////////////////////////////////////////
// Element-wise helpers.

fn subtype_packed(a: &DArrPacked, b: &DArrPacked) -> bool {
    if a.elems.len() != b.elems.len() {
        return false;
    }
    a.elems
        .iter()
        .zip(&b.elems)
        .all(|(x, y)| x.subtype_of(y))
}

fn subtype_map(a: &DArrMap, b: &DArrMap) -> bool {
    if a.map.len() != b.map.len() {
        return false;
    }
    a.map
        .iter()
        .zip(b.map.iter())
        .all(|((ka, va), (kb, vb))| ka == kb && va.subtype_of(vb))
}

fn could_be_packed(a: &DArrPacked, b: &DArrPacked) -> bool {
    if a.elems.len() != b.elems.len() {
        return false;
    }
    a.elems.iter().zip(&b.elems).all(|(x, y)| x.could_be(y))
}

fn could_be_map(a: &DArrMap, b: &DArrMap) -> bool {
    if a.map.len() != b.map.len() {
        return false;
    }
    a.map
        .iter()
        .zip(b.map.iter())
        .all(|((ka, va), (kb, vb))| ka == kb && va.could_be(vb))
}

//////////////////////////////////////////////////////////////////////
// Equality.

pub(crate) fn equiv_data(a: &Type, b: &Type) -> bool {
    if a.tag() != b.tag() {
        return equiv_data_cross(a, b) || equiv_data_cross(b, a);
    }

    match (&a.data, &b.data) {
        (Data::Str(x), Data::Str(y)) => x == y,
        (Data::ArrVal(x), Data::ArrVal(y)) => x == y,
        (Data::Int(x), Data::Int(y)) => x == y,
        // NaNs are equal for type identity; +0.0 and -0.0 are not.
        (Data::Dbl(x), Data::Dbl(y)) => {
            if x == y {
                x.is_sign_negative() == y.is_sign_negative()
            } else {
                x.is_nan() && y.is_nan()
            }
        }
        (Data::Obj(x), Data::Obj(y)) => {
            if x.wh.is_some() != y.wh.is_some() {
                return false;
            }
            if let (Some(xw), Some(yw)) = (&x.wh, &y.wh) {
                if **xw != **yw {
                    return false;
                }
            }
            x.kind == y.kind && x.cls.same(&y.cls)
        }
        (Data::Cls(x), Data::Cls(y)) => x.kind == y.kind && x.cls.same(&y.cls),
        (Data::RefInner(x), Data::RefInner(y)) => **x == **y,
        (Data::Packed(x), Data::Packed(y)) => x.elems == y.elems,
        (Data::PackedN(x), Data::PackedN(y)) => x.ty == y.ty,
        (Data::Map(x), Data::Map(y)) => x.map == y.map,
        (Data::MapN(x), Data::MapN(y)) => x.key == y.key && x.val == y.val,
        _ => unreachable!("tags already matched"),
    }
}

fn equiv_data_cross(a: &Type, b: &Type) -> bool {
    match (&a.data, &b.data) {
        (Data::Packed(p), Data::ArrVal(av)) => {
            if p.elems.len() != av.size() {
                return false;
            }
            matches!(to_arr_packed(av), Some(q) if p.elems == q.elems)
        }
        (Data::Map(m), Data::ArrVal(av)) => {
            if m.map.len() != av.size() {
                return false;
            }
            matches!(to_arr_map(av), Some(q) if m.map == q.map)
        }
        _ => false,
    }
}

//////////////////////////////////////////////////////////////////////
// Subtype.

pub(crate) fn subtype_data(a: &Type, b: &Type) -> bool {
    if a.tag() != b.tag() {
        return subtype_data_cross(a, b);
    }

    match (&a.data, &b.data) {
        (Data::Obj(x), Data::Obj(y)) => {
            let outer_ok = (x.kind == y.kind && x.cls.same(&y.cls))
                || (y.kind == Bound::Sub && x.cls.subtype_of(&y.cls));
            if !outer_ok {
                return false;
            }
            match (&x.wh, &y.wh) {
                (_, None) => true,
                (None, Some(_)) => false,
                (Some(xw), Some(yw)) => xw.subtype_of(yw),
            }
        }
        (Data::Cls(x), Data::Cls(y)) => {
            if x.kind == y.kind && x.cls.same(&y.cls) {
                return true;
            }
            y.kind == Bound::Sub && x.cls.subtype_of(&y.cls)
        }
        (Data::Str(_), _)
        | (Data::ArrVal(_), _)
        | (Data::Int(_), _)
        | (Data::Dbl(_), _) => equiv_data(a, b),
        (Data::RefInner(x), Data::RefInner(y)) => x.subtype_of(y),
        (Data::Packed(x), Data::Packed(y)) => subtype_packed(x, y),
        (Data::PackedN(x), Data::PackedN(y)) => x.ty.subtype_of(&y.ty),
        (Data::Map(x), Data::Map(y)) => subtype_map(x, y),
        (Data::MapN(x), Data::MapN(y)) => {
            x.key.subtype_of(&y.key) && x.val.subtype_of(&y.val)
        }
        _ => unreachable!("tags already matched"),
    }
}

/// Every entry of the constant satisfies the homogeneous map bound.
/// Written with could-be on the singleton types of the concrete entries,
/// which is exact for singletons.
fn val_within_mapn(av: &ArrConst, m: &DArrMapN) -> bool {
    assert!(!av.is_empty());
    av.iter().all(|(k, v)| {
        m.key
            .could_be(&crate::types::MapKey::from_const(k).to_type())
            && m.val.could_be(&from_cell(v.clone()))
    })
}

fn subtype_data_cross(a: &Type, b: &Type) -> bool {
    match (&a.data, &b.data) {
        (Data::Map(x), Data::ArrVal(av)) => {
            if x.map.len() != av.size() {
                return false;
            }
            matches!(to_arr_map(av), Some(m) if subtype_map(x, &m))
        }
        (Data::ArrVal(av), Data::Map(y)) => {
            if av.size() != y.map.len() {
                return false;
            }
            matches!(to_arr_map(av), Some(m) if subtype_map(&m, y))
        }
        (Data::ArrVal(av), Data::Packed(y)) => {
            if av.size() != y.elems.len() {
                return false;
            }
            matches!(to_arr_packed(av), Some(p) if subtype_packed(&p, y))
        }
        (Data::Packed(x), Data::ArrVal(av)) => {
            if x.elems.len() != av.size() {
                return false;
            }
            matches!(to_arr_packed(av), Some(p) if subtype_packed(x, &p))
        }
        (Data::PackedN(x), Data::MapN(y)) => {
            y.key.could_be(&Type::INT) && x.ty.subtype_of(&y.val)
        }
        (Data::Packed(x), Data::MapN(y)) => {
            y.key.could_be(&Type::INT) && x.elems.iter().all(|v| v.subtype_of(&y.val))
        }
        (Data::Map(x), Data::MapN(y)) => x.map.iter().all(|(k, v)| {
            k.to_type().subtype_of(&y.key) && v.subtype_of(&y.val)
        }),
        (Data::ArrVal(av), Data::MapN(y)) => val_within_mapn(av, y),
        (Data::Packed(x), Data::PackedN(y)) => {
            x.elems.iter().all(|v| v.subtype_of(&y.ty))
        }
        (Data::ArrVal(av), Data::PackedN(y)) => {
            matches!(to_arr_packedn(av), Some(p) if p.ty.subtype_of(&y.ty))
        }
        // A homogeneous shape always contains arrays a fixed shape or a
        // single constant cannot, and a map never contains packed arrays.
        _ => false,
    }
}

//////////////////////////////////////////////////////////////////////
// Could-be.

pub(crate) fn could_be_data(a: &Type, b: &Type) -> bool {
    if a.tag() != b.tag() {
        if let Some(r) = could_be_data_cross(a, b) {
            return r;
        }
        if let Some(r) = could_be_data_cross(b, a) {
            return r;
        }
        return false;
    }

    match (&a.data, &b.data) {
        (Data::Obj(x), Data::Obj(y)) => {
            let outer = if x.kind == y.kind && x.cls.same(&y.cls) {
                true
            } else if x.kind == Bound::Sub {
                if y.kind == Bound::Sub {
                    y.cls.could_be(&x.cls)
                } else {
                    y.cls.subtype_of(&x.cls)
                }
            } else if y.kind == Bound::Sub {
                x.cls.subtype_of(&y.cls)
            } else {
                false
            };
            outer
                && match (&x.wh, &y.wh) {
                    (Some(xw), Some(yw)) => xw.could_be(yw),
                    _ => true,
                }
        }
        (Data::Cls(x), Data::Cls(y)) => {
            if x.kind == y.kind && x.cls.same(&y.cls) {
                return true;
            }
            (x.kind == Bound::Sub || y.kind == Bound::Sub) && x.cls.could_be(&y.cls)
        }
        (Data::RefInner(x), Data::RefInner(y)) => x.could_be(y),
        (Data::Str(_), _) | (Data::ArrVal(_), _) | (Data::Int(_), _) | (Data::Dbl(_), _) => {
            equiv_data(a, b)
        }
        (Data::Packed(x), Data::Packed(y)) => could_be_packed(x, y),
        (Data::PackedN(x), Data::PackedN(y)) => x.ty.could_be(&y.ty),
        (Data::Map(x), Data::Map(y)) => could_be_map(x, y),
        (Data::MapN(x), Data::MapN(y)) => {
            x.key.could_be(&y.key) && x.val.could_be(&y.val)
        }
        _ => unreachable!("tags already matched"),
    }
}

fn could_be_packedn_val(x: &DArrPackedN, av: &ArrConst) -> bool {
    matches!(to_arr_packedn(av), Some(p) if x.ty.could_be(&p.ty))
}

fn could_be_data_cross(a: &Type, b: &Type) -> Option<bool> {
    let r = match (&a.data, &b.data) {
        (Data::Packed(x), Data::ArrVal(av)) => {
            x.elems.len() == av.size()
                && matches!(to_arr_packed(av), Some(p) if could_be_packed(x, &p))
        }
        (Data::Map(x), Data::ArrVal(av)) => {
            x.map.len() == av.size()
                && matches!(to_arr_map(av), Some(m) if could_be_map(x, &m))
        }
        (Data::PackedN(x), Data::ArrVal(av)) => could_be_packedn_val(x, av),
        (Data::MapN(x), Data::ArrVal(av)) => val_within_mapn(av, x),
        (Data::Packed(x), Data::PackedN(y)) => {
            x.elems.iter().all(|t| t.could_be(&y.ty))
        }
        (Data::PackedN(x), Data::MapN(y)) => {
            Type::INT.could_be(&y.key) && x.ty.could_be(&y.val)
        }
        (Data::Map(x), Data::MapN(y)) => x.map.iter().all(|(k, v)| {
            k.to_type().could_be(&y.key) && v.could_be(&y.val)
        }),
        (Data::Packed(x), Data::MapN(y)) => {
            Type::INT.could_be(&y.key) && x.elems.iter().all(|t| t.could_be(&y.val))
        }
        // A map never contains packed arrays.
        (Data::Packed(_), Data::Map(_)) | (Data::PackedN(_), Data::Map(_)) => false,
        _ => return None,
    };
    Some(r)
}
