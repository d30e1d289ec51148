//! The lattice point representation.
//!
//! A `Type` is a predefined bit pattern plus an optional specialized
//! payload. Payloads refine the pattern with literal values, class bounds,
//! reference inner types, or one of the four array-shape descriptors.
//! Constructors here always produce canonical forms: a map whose keys are a
//! contiguous 0-based integer prefix becomes packed, a homogeneous map with
//! a single known key becomes a fixed map, and constant containers are
//! tagged with the exact family bits their kind dictates.

use std::hash::{Hash, Hasher};

use hazel_common::{ArrConst, ArrConstRef, ConstKey, CowBox, Str, Value};

use crate::bits::{self, Trep};
use crate::class::ClsHandle;
use crate::conv::from_cell;
use crate::relations;

/// Discriminates the payload of a `Type`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DataTag {
    None,
    Str,
    Int,
    Dbl,
    ArrVal,
    Obj,
    Cls,
    RefInner,
    Packed,
    PackedN,
    Map,
    MapN,
}

/// Whether a class bound is exact or an upper bound.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Bound {
    Exact,
    Sub,
}

/// Class information attached to a class-pointer type.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DCls {
    pub kind: Bound,
    pub cls: ClsHandle,
}

/// Class information attached to an object type. When the class is the
/// designated wait-handle class, `wh` may track the type its completion
/// produces.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DObj {
    pub kind: Bound,
    pub cls: ClsHandle,
    pub wh: Option<CowBox<Type>>,
}

/// A literal array key: integer or interned static string.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum MapKey {
    Int(i64),
    Str(Str),
}

impl MapKey {
    pub fn from_const(k: &ConstKey) -> MapKey {
        match k {
            ConstKey::Int(i) => MapKey::Int(*i),
            ConstKey::Str(s) => MapKey::Str(*s),
        }
    }

    pub fn to_value(self) -> Value {
        match self {
            MapKey::Int(i) => Value::Int(i),
            MapKey::Str(s) => Value::Str(s),
        }
    }

    /// The singleton type of this key.
    pub fn to_type(self) -> Type {
        match self {
            MapKey::Int(i) => ival(i),
            MapKey::Str(s) => sval(s),
        }
    }

    pub fn is_int(self) -> bool {
        matches!(self, MapKey::Int(_))
    }
}

/// Ordered key/value elements of a fixed keyed map. Insertion order is
/// significant: two maps are equal only if their key sequences match.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct MapElems {
    elems: Vec<(MapKey, Type)>,
}

impl MapElems {
    pub fn new() -> MapElems {
        MapElems { elems: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (MapKey, Type)> {
        self.elems.iter()
    }

    pub fn get(&self, key: &MapKey) -> Option<&Type> {
        self.elems.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn position(&self, key: &MapKey) -> Option<usize> {
        self.elems.iter().position(|(k, _)| k == key)
    }

    pub fn push(&mut self, key: MapKey, val: Type) {
        debug_assert!(self.position(&key).is_none());
        self.elems.push((key, val));
    }

    pub fn value_at(&self, idx: usize) -> &Type {
        &self.elems[idx].1
    }

    pub fn set_value_at(&mut self, idx: usize, val: Type) {
        self.elems[idx].1 = val;
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Type> {
        self.elems.iter_mut().map(|(_, v)| v)
    }
}

impl FromIterator<(MapKey, Type)> for MapElems {
    fn from_iter<I: IntoIterator<Item = (MapKey, Type)>>(iter: I) -> MapElems {
        MapElems {
            elems: iter.into_iter().collect(),
        }
    }
}

/// Fixed-length sequence of element types (tuple-like array shape).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DArrPacked {
    pub elems: Vec<Type>,
}

/// Homogeneous non-empty sequence (unknown length).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DArrPackedN {
    pub ty: Type,
}

/// Fixed keyed map (struct-like array shape).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DArrMap {
    pub map: MapElems,
}

/// Homogeneous keyed map (unknown keys).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DArrMapN {
    pub key: Type,
    pub val: Type,
}

/// Specialized payload of a `Type`.
#[derive(Clone, Debug)]
pub enum Data {
    None,
    Str(Str),
    Int(i64),
    Dbl(f64),
    ArrVal(ArrConstRef),
    Obj(DObj),
    Cls(DCls),
    RefInner(CowBox<Type>),
    Packed(CowBox<DArrPacked>),
    PackedN(CowBox<DArrPackedN>),
    Map(CowBox<DArrMap>),
    MapN(CowBox<DArrMapN>),
}

impl Data {
    pub fn tag(&self) -> DataTag {
        match self {
            Data::None => DataTag::None,
            Data::Str(_) => DataTag::Str,
            Data::Int(_) => DataTag::Int,
            Data::Dbl(_) => DataTag::Dbl,
            Data::ArrVal(_) => DataTag::ArrVal,
            Data::Obj(_) => DataTag::Obj,
            Data::Cls(_) => DataTag::Cls,
            Data::RefInner(_) => DataTag::RefInner,
            Data::Packed(_) => DataTag::Packed,
            Data::PackedN(_) => DataTag::PackedN,
            Data::Map(_) => DataTag::Map,
            Data::MapN(_) => DataTag::MapN,
        }
    }
}

/// What we know about the truthiness of a type.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Emptiness {
    Empty,
    NonEmpty,
    Maybe,
}

/// What the modeled program might do at a refined array access. This is not
/// a failure of the lattice operation itself; lattice operations are total.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ThrowMode {
    None,
    MaybeMissingElement,
    MaybeBadKey,
    MissingElement,
    BadOperation,
}

/// A point in the abstract value lattice.
#[derive(Clone)]
pub struct Type {
    pub(crate) bits: Trep,
    pub(crate) data: Data,
}

macro_rules! predefined_consts {
    ($( ($name:ident, $opt:expr, $data:expr) ),* $(,)?) => {
        impl Type {
            $( pub const $name: Type = Type::of(Trep::$name); )*
        }
    };
}

crate::bits::for_each_predefined!(predefined_consts);

impl Type {
    pub(crate) const fn of(bits: Trep) -> Type {
        Type {
            bits,
            data: Data::None,
        }
    }

    /// Build the unspecialized type of a predefined pattern.
    pub fn from_bits(bits: Trep) -> Type {
        let t = Type::of(bits);
        debug_assert!(t.check_invariants());
        t
    }

    pub fn bits(&self) -> Trep {
        self.bits
    }

    pub(crate) fn has_data(&self) -> bool {
        !matches!(self.data, Data::None)
    }

    pub(crate) fn tag(&self) -> DataTag {
        self.data.tag()
    }

    /// Verify every representation invariant. Used in debug assertions at
    /// construction sites; a violation is a programmer error.
    pub fn check_invariants(&self) -> bool {
        assert!(bits::is_predefined(self.bits), "non-predefined bits");
        assert!(
            !self.has_data() || bits::may_have_data(self.bits),
            "payload on a pattern that cannot carry one"
        );

        let check = |c: Trep, s: Trep| {
            if self.bits.intersects(c) {
                assert!(self.bits.intersects(s), "bare counted bit");
            }
        };
        check(Trep::CSTR, Trep::SSTR);
        check(Trep::CPARR_E, Trep::SPARR_E);
        check(Trep::CPARR_N, Trep::SPARR_N);
        check(Trep::CVARR_E, Trep::SVARR_E);
        check(Trep::CVARR_N, Trep::SVARR_N);
        check(Trep::CDARR_E, Trep::SDARR_E);
        check(Trep::CDARR_N, Trep::SDARR_N);
        check(Trep::CVEC_E, Trep::SVEC_E);
        check(Trep::CVEC_N, Trep::SVEC_N);
        check(Trep::CDICT_E, Trep::SDICT_E);
        check(Trep::CDICT_N, Trep::SDICT_N);
        check(Trep::CKEYSET_E, Trep::SKEYSET_E);
        check(Trep::CKEYSET_N, Trep::SKEYSET_N);

        let key_ty = if Trep::S_ARR_LIKE.contains(self.bits) {
            Type::UNC_ARRKEY
        } else {
            Type::ARRKEY
        };
        let val_ty = if Trep::OPT_ARR.contains(self.bits) {
            Type::INIT_GEN
        } else if Trep::OPT_KEYSET.contains(self.bits) {
            Type::ARRKEY
        } else {
            Type::INIT_CELL
        };
        let key_ty = &key_ty;
        let val_ty = &val_ty;
        let is_varr = Trep::OPT_VARR.contains(self.bits);
        let is_darr = Trep::OPT_DARR.contains(self.bits);
        let is_parr = Trep::OPT_PARR.contains(self.bits);
        let is_plain_family = Trep::OPT_ARR.contains(self.bits);
        let is_vector = Trep::OPT_VEC.contains(self.bits);
        let is_keyset = Trep::OPT_KEYSET.contains(self.bits);
        let is_dict = Trep::OPT_DICT.contains(self.bits);

        match &self.data {
            Data::None | Data::Int(_) | Data::Dbl(_) | Data::Cls(_) | Data::Obj(_) => {}
            Data::Str(_) => {
                // Interned strings are static by construction.
            }
            Data::RefInner(inner) => {
                assert!(!inner.could_be(&Type::REF), "ref inner admits ref");
            }
            Data::ArrVal(av) => {
                assert!(!av.is_empty(), "constant container payload must be non-empty");
                // The variant dimension must be pinned down for a constant.
                assert!(!is_plain_family || is_varr || is_darr || is_parr);
                use hazel_common::ArrKind;
                match av.kind() {
                    ArrKind::Plain => assert!(is_parr),
                    ArrKind::VArray => assert!(is_varr),
                    ArrKind::DArray => assert!(is_darr),
                    ArrKind::Vec => assert!(is_vector),
                    ArrKind::Dict => assert!(is_dict),
                    ArrKind::Keyset => assert!(is_keyset),
                }
            }
            Data::Packed(p) => {
                assert!(!p.elems.is_empty());
                for (idx, v) in p.elems.iter().enumerate() {
                    assert!(v.subtype_of(val_ty) && *v != Type::BOTTOM);
                    if is_keyset {
                        assert!(*v == ival(idx as i64));
                    }
                }
            }
            Data::PackedN(p) => {
                assert!(p.ty.subtype_of(val_ty));
                assert!(p.ty != Type::BOTTOM);
                if is_keyset {
                    assert!(p.ty == Type::INT);
                }
            }
            Data::Map(m) => {
                assert!(!is_vector && !is_varr);
                assert!(!m.map.is_empty());
                let mut packed = true;
                for (idx, (k, v)) in m.map.iter().enumerate() {
                    assert!(v.subtype_of(val_ty) && *v != Type::BOTTOM);
                    if is_keyset {
                        assert!(k.to_type() == *v);
                    }
                    if packed {
                        packed = matches!(k, MapKey::Int(i) if *i == idx as i64);
                    }
                }
                // A packed-keyed map should have been canonicalized.
                assert!(!packed, "map with contiguous 0-based keys");
            }
            Data::MapN(m) => {
                assert!(!is_vector && !is_varr);
                assert!(m.key.subtype_of(key_ty));
                // A known key would make this a fixed map instead.
                assert!(!m.key.has_data(), "map-n key carries a payload");
                assert!(m.val.subtype_of(val_ty));
                assert!(m.key != Type::BOTTOM && m.val != Type::BOTTOM);
                if is_keyset {
                    assert!(m.key == m.val);
                }
            }
        }
        true
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        if self.bits != other.bits {
            return false;
        }
        if self.has_data() != other.has_data() {
            return false;
        }
        if !self.has_data() {
            return true;
        }
        relations::equiv_data(self, other)
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Payloads of different tags can compare equal (a packed payload and
        // an equal constant container), so only the bits participate.
        self.bits.bits().hash(state);
    }
}

impl std::fmt::Debug for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_data() {
            write!(f, "Type({:?}, {:?})", self.bits, self.data)
        } else {
            write!(f, "Type({:?})", self.bits)
        }
    }
}

//////////////////////////////////////////////////////////////////////
// Constructors for literal and constant types.

/// Integer literal type.
pub fn ival(v: i64) -> Type {
    Type {
        bits: Trep::INT,
        data: Data::Int(v),
    }
}

/// Double literal type.
pub fn dval(v: f64) -> Type {
    Type {
        bits: Trep::DBL,
        data: Data::Dbl(v),
    }
}

/// Static string literal type.
pub fn sval(v: Str) -> Type {
    Type {
        bits: Trep::SSTR,
        data: Data::Str(v),
    }
}

/// The empty static string.
pub fn sempty() -> Type {
    sval(Str::EMPTY)
}

/// Constant plain-array type. The variant tag of the constant decides which
/// variant bits the type gets; empty constants collapse to the empty
/// singletons.
pub fn aval(v: ArrConstRef) -> Type {
    use hazel_common::ArrKind;
    assert!(v.kind().is_plain_family());
    if v.is_empty() {
        return match v.kind() {
            ArrKind::DArray => aempty_darray(),
            ArrKind::VArray => aempty_varray(),
            _ => aempty(),
        };
    }
    let bits = match v.kind() {
        ArrKind::DArray => Trep::SDARR_N,
        ArrKind::VArray => Trep::SVARR_N,
        _ => Trep::SPARR_N,
    };
    let t = Type {
        bits,
        data: Data::ArrVal(v),
    };
    debug_assert!(t.check_invariants());
    t
}

/// Constant vector type.
pub fn vec_val(v: ArrConstRef) -> Type {
    assert!(v.kind() == hazel_common::ArrKind::Vec);
    if v.is_empty() {
        return vec_empty();
    }
    Type {
        bits: Trep::SVEC_N,
        data: Data::ArrVal(v),
    }
}

/// Constant dict type.
pub fn dict_val(v: ArrConstRef) -> Type {
    assert!(v.kind() == hazel_common::ArrKind::Dict);
    if v.is_empty() {
        return dict_empty();
    }
    Type {
        bits: Trep::SDICT_N,
        data: Data::ArrVal(v),
    }
}

/// Constant keyset type.
pub fn keyset_val(v: ArrConstRef) -> Type {
    assert!(v.kind() == hazel_common::ArrKind::Keyset);
    if v.is_empty() {
        return keyset_empty();
    }
    Type {
        bits: Trep::SKEYSET_N,
        data: Data::ArrVal(v),
    }
}

pub fn aempty() -> Type {
    Type::SPARR_E
}

pub fn aempty_varray() -> Type {
    Type::SVARR_E
}

pub fn aempty_darray() -> Type {
    Type::SDARR_E
}

pub fn vec_empty() -> Type {
    Type::SVEC_E
}

pub fn dict_empty() -> Type {
    Type::SDICT_E
}

pub fn keyset_empty() -> Type {
    Type::SKEYSET_E
}

/// Any-countedness empty forms.
pub fn some_aempty() -> Type {
    Type::PARR_E
}

pub fn some_aempty_darray() -> Type {
    Type::DARR_E
}

pub fn some_vec_empty() -> Type {
    Type::VEC_E
}

pub fn some_dict_empty() -> Type {
    Type::DICT_E
}

pub fn some_keyset_empty() -> Type {
    Type::KEYSET_E
}

//////////////////////////////////////////////////////////////////////
// Object, class and reference specializations.

/// Object of `cls` or any subclass. Collapses to an exact bound when the
/// index proves nothing can override `cls`.
pub fn sub_obj(cls: ClsHandle) -> Type {
    let kind = if cls.could_be_overridden() {
        Bound::Sub
    } else {
        Bound::Exact
    };
    Type {
        bits: Trep::OBJ,
        data: Data::Obj(DObj {
            kind,
            cls,
            wh: None,
        }),
    }
}

/// Object of exactly `cls`.
pub fn obj_exact(cls: ClsHandle) -> Type {
    Type {
        bits: Trep::OBJ,
        data: Data::Obj(DObj {
            kind: Bound::Exact,
            cls,
            wh: None,
        }),
    }
}

/// Class pointer bounded above by `cls`.
pub fn sub_cls(cls: ClsHandle) -> Type {
    let kind = if cls.could_be_overridden() {
        Bound::Sub
    } else {
        Bound::Exact
    };
    Type {
        bits: Trep::CLS,
        data: Data::Cls(DCls { kind, cls }),
    }
}

/// Class pointer to exactly `cls`.
pub fn cls_exact(cls: ClsHandle) -> Type {
    Type {
        bits: Trep::CLS,
        data: Data::Cls(DCls {
            kind: Bound::Exact,
            cls,
        }),
    }
}

/// A wait handle (of the designated class `wh_cls`) whose completion
/// produces `inner`.
pub fn wait_handle(wh_cls: ClsHandle, inner: Type) -> Type {
    let mut t = sub_obj(wh_cls);
    match &mut t.data {
        Data::Obj(d) => d.wh = Some(CowBox::new(inner)),
        _ => unreachable!(),
    }
    t
}

pub fn is_specialized_wait_handle(t: &Type) -> bool {
    matches!(&t.data, Data::Obj(d) if d.wh.is_some())
}

/// The completion type of a wait handle.
///
/// Pre: `is_specialized_wait_handle(t)`.
pub fn wait_handle_inner(t: &Type) -> Type {
    match &t.data {
        Data::Obj(DObj { wh: Some(wh), .. }) => (**wh).clone(),
        _ => panic!("wait_handle_inner on a non-wait-handle type"),
    }
}

/// A reference whose inner cell has type `t`.
pub fn ref_to(t: Type) -> Type {
    assert!(t.subtype_of(&Type::INIT_CELL));
    Type {
        bits: Trep::REF,
        data: Data::RefInner(CowBox::new(t)),
    }
}

pub fn is_ref_with_inner(t: &Type) -> bool {
    t.tag() == DataTag::RefInner
}

//////////////////////////////////////////////////////////////////////
// Array-shape specializations.

pub(crate) fn packed_impl(bits: Trep, elems: Vec<Type>) -> Type {
    assert!(!elems.is_empty());
    let t = Type {
        bits,
        data: Data::Packed(CowBox::new(DArrPacked { elems })),
    };
    debug_assert!(t.check_invariants());
    t
}

pub(crate) fn packedn_impl(bits: Trep, ty: Type) -> Type {
    let t = Type {
        bits,
        data: Data::PackedN(CowBox::new(DArrPackedN { ty })),
    };
    debug_assert!(t.check_invariants());
    t
}

pub(crate) fn map_impl(bits: Trep, m: MapElems) -> Type {
    assert!(!m.is_empty());

    // A map with contiguous 0-based integer keys is a packed array.
    let packed = m
        .iter()
        .enumerate()
        .all(|(idx, (k, _))| matches!(k, MapKey::Int(i) if *i == idx as i64));
    if packed {
        let elems = m.iter().map(|(_, v)| v.clone()).collect();
        return packed_impl(bits, elems);
    }

    let t = Type {
        bits,
        data: Data::Map(CowBox::new(DArrMap { map: m })),
    };
    debug_assert!(t.check_invariants());
    t
}

pub(crate) fn mapn_impl(bits: Trep, key: Type, val: Type) -> Type {
    assert!(key.subtype_of(&Type::ARRKEY));

    // A single known key makes this a fixed map, which in turn may
    // canonicalize to packed.
    if let Some(k) = crate::conv::tv(&key) {
        let mk = match k {
            Value::Int(i) => MapKey::Int(i),
            Value::Str(s) => MapKey::Str(s),
            _ => unreachable!("array key constant must be int or string"),
        };
        let mut m = MapElems::new();
        m.push(mk, val);
        return map_impl(bits, m);
    }

    let t = Type {
        bits,
        data: Data::MapN(CowBox::new(DArrMapN { key, val })),
    };
    debug_assert!(t.check_invariants());
    t
}

/// Tuple-like plain arrays with known element types.
///
/// Pre: `!elems.is_empty()`.
pub fn arr_packed(elems: Vec<Type>) -> Type {
    packed_impl(Trep::PARR_N, elems)
}

pub fn arr_packed_varray(elems: Vec<Type>) -> Type {
    packed_impl(Trep::VARR_N, elems)
}

pub fn sarr_packed(elems: Vec<Type>) -> Type {
    packed_impl(Trep::SPARR_N, elems)
}

/// Homogeneous non-empty plain arrays of unknown length.
pub fn arr_packedn(t: Type) -> Type {
    packedn_impl(Trep::PARR_N, t)
}

pub fn sarr_packedn(t: Type) -> Type {
    packedn_impl(Trep::SPARR_N, t)
}

/// Struct-like plain arrays.
///
/// Pre: `!m.is_empty()`.
pub fn arr_map(m: MapElems) -> Type {
    map_impl(Trep::PARR_N, m)
}

pub fn arr_map_darray(m: MapElems) -> Type {
    map_impl(Trep::DARR_N, m)
}

pub fn sarr_map(m: MapElems) -> Type {
    map_impl(Trep::SPARR_N, m)
}

/// Map-like plain arrays.
pub fn arr_mapn(k: Type, v: Type) -> Type {
    mapn_impl(Trep::PARR_N, k, v)
}

pub fn sarr_mapn(k: Type, v: Type) -> Type {
    mapn_impl(Trep::SPARR_N, k, v)
}

/// Vectors with known size.
///
/// Pre: `!elems.is_empty()`.
pub fn vec(elems: Vec<Type>) -> Type {
    packed_impl(Trep::VEC_N, elems)
}

pub fn svec(elems: Vec<Type>) -> Type {
    packed_impl(Trep::SVEC_N, elems)
}

/// Vectors of unknown size.
pub fn vec_n(t: Type) -> Type {
    packedn_impl(Trep::VEC_N, t)
}

pub fn svec_n(t: Type) -> Type {
    packedn_impl(Trep::SVEC_N, t)
}

/// Struct-like dicts.
pub fn dict_map(m: MapElems) -> Type {
    map_impl(Trep::DICT_N, m)
}

/// Dicts with key/value types.
pub fn dict_n(k: Type, v: Type) -> Type {
    mapn_impl(Trep::DICT_N, k, v)
}

pub fn sdict_n(k: Type, v: Type) -> Type {
    mapn_impl(Trep::SDICT_N, k, v)
}

/// Keysets with a key type (values equal keys).
pub fn keyset_n(kv: Type) -> Type {
    assert!(kv.subtype_of(&Type::ARRKEY));
    let v = kv.clone();
    mapn_impl(Trep::KEYSET_N, kv, v)
}

pub fn skeyset_n(kv: Type) -> Type {
    assert!(kv.subtype_of(&Type::UNC_ARRKEY));
    let v = kv.clone();
    mapn_impl(Trep::SKEYSET_N, kv, v)
}

/// Keysets with fixed elements.
pub fn keyset_map(m: MapElems) -> Type {
    map_impl(Trep::KEYSET_N, m)
}

//////////////////////////////////////////////////////////////////////
// Optionality.

/// The optional (null-admitting) version of `t`.
///
/// Pre: an optional version of `t` exists.
pub fn opt(t: Type) -> Type {
    assert!(bits::can_be_optional(t.bits));
    Type {
        bits: t.bits | Trep::INIT_NULL,
        data: t.data,
    }
}

/// Strip the null-admission from an optional type.
///
/// Pre: `is_opt(t)`.
pub fn unopt(t: Type) -> Type {
    debug_assert!(is_opt(&t));
    let t = Type {
        bits: t.bits - Trep::INIT_NULL,
        data: t.data,
    };
    debug_assert!(!is_opt(&t));
    t
}

/// Whether `t` is one of the predefined optional types (`InitNull` alone is
/// not).
pub fn is_opt(t: &Type) -> bool {
    if t.bits == Trep::INIT_NULL {
        return false;
    }
    if !t.couldbe_initnull() {
        return false;
    }
    let non_null = t.bits - Trep::INIT_NULL;
    bits::is_predefined(non_null) && bits::can_be_optional(non_null)
}

impl Type {
    fn couldbe_initnull(&self) -> bool {
        self.bits.intersects(Trep::INIT_NULL)
    }
}

//////////////////////////////////////////////////////////////////////
// Specialization queries.

pub fn is_specialized_obj(t: &Type) -> bool {
    t.tag() == DataTag::Obj
}

pub fn is_specialized_cls(t: &Type) -> bool {
    t.tag() == DataTag::Cls
}

pub fn is_specialized_array_like(t: &Type) -> bool {
    matches!(
        t.tag(),
        DataTag::ArrVal | DataTag::Packed | DataTag::PackedN | DataTag::Map | DataTag::MapN
    )
}

pub fn is_specialized_array(t: &Type) -> bool {
    t.subtype_of(&Type::OPT_ARR) && is_specialized_array_like(t)
}

pub fn is_specialized_vec(t: &Type) -> bool {
    t.subtype_of(&Type::OPT_VEC) && is_specialized_array_like(t)
}

pub fn is_specialized_dict(t: &Type) -> bool {
    t.subtype_of(&Type::OPT_DICT) && is_specialized_array_like(t)
}

pub fn is_specialized_keyset(t: &Type) -> bool {
    t.subtype_of(&Type::OPT_KEYSET) && is_specialized_array_like(t)
}

/// The object payload of a specialized object type.
///
/// Pre: `is_specialized_obj(t)`.
pub fn dobj_of(t: &Type) -> DObj {
    match &t.data {
        Data::Obj(d) => d.clone(),
        _ => panic!("dobj_of on a non-specialized object type"),
    }
}

/// The class payload of a specialized class type.
///
/// Pre: `is_specialized_cls(t)`.
pub fn dcls_of(t: &Type) -> DCls {
    match &t.data {
        Data::Cls(d) => d.clone(),
        _ => panic!("dcls_of on a non-specialized class type"),
    }
}

/// The best known class-pointer type for an object type.
///
/// Pre: `t.subtype_of(&Type::OBJ)`.
pub fn objcls(t: &Type) -> Type {
    if t.subtype_of(&Type::OBJ) && is_specialized_obj(t) {
        let d = dobj_of(t);
        match d.kind {
            Bound::Exact => cls_exact(d.cls),
            Bound::Sub => sub_cls(d.cls),
        }
    } else {
        Type::CLS
    }
}

//////////////////////////////////////////////////////////////////////
// Payload utilities shared by the operator modules.

/// View a constant container as a packed shape, if its keys are exactly
/// 0..n. `None` means it definitely is not packed.
pub(crate) fn to_arr_packed(ar: &ArrConst) -> Option<DArrPacked> {
    assert!(!ar.is_empty());
    let mut elems = Vec::with_capacity(ar.size());
    for (idx, (k, v)) in ar.iter().enumerate() {
        match k {
            ConstKey::Int(i) if *i == idx as i64 => {}
            _ => return None,
        }
        elems.push(from_cell(v.clone()));
    }
    Some(DArrPacked { elems })
}

/// View a constant container as a homogeneous packed shape.
pub(crate) fn to_arr_packedn(ar: &ArrConst) -> Option<DArrPackedN> {
    assert!(!ar.is_empty());
    let mut ty = Type::BOTTOM;
    for (idx, (k, v)) in ar.iter().enumerate() {
        match k {
            ConstKey::Int(i) if *i == idx as i64 => {}
            _ => return None,
        }
        ty = crate::operations::union_of(ty, from_cell(v.clone()));
    }
    Some(DArrPackedN { ty })
}

/// View a constant container as a fixed map. `None` means it is packed and
/// must be viewed with `to_arr_packed` instead.
pub(crate) fn to_arr_map(ar: &ArrConst) -> Option<DArrMap> {
    assert!(!ar.is_empty());
    let mut map = MapElems::new();
    let mut packed = true;
    for (idx, (k, v)) in ar.iter().enumerate() {
        if packed {
            packed = matches!(k, ConstKey::Int(i) if *i == idx as i64);
        }
        map.push(MapKey::from_const(k), from_cell(v.clone()));
    }
    if packed {
        return None;
    }
    Some(DArrMap { map })
}

/// View a constant container as a homogeneous map. `None` if the container
/// is packed or has a single known key.
pub(crate) fn to_arr_mapn(ar: &ArrConst) -> Option<DArrMapN> {
    assert!(!ar.is_empty());
    let mut key = Type::BOTTOM;
    let mut val = Type::BOTTOM;
    let mut packed = true;
    for (idx, (k, v)) in ar.iter().enumerate() {
        key = crate::operations::union_of(key, MapKey::from_const(k).to_type());
        val = crate::operations::union_of(val, from_cell(v.clone()));
        if packed {
            packed = matches!(k, ConstKey::Int(i) if *i == idx as i64);
        }
    }
    if packed || crate::conv::tv(&key).is_some() {
        return None;
    }
    Some(DArrMapN { key, val })
}

/// Union of the key types and of the value types of a constant container.
pub(crate) fn val_key_values(ar: &ArrConst) -> (Type, Type) {
    let mut key = Type::BOTTOM;
    let mut val = Type::BOTTOM;
    for (k, v) in ar.iter() {
        key = crate::operations::union_of(key, MapKey::from_const(k).to_type());
        val = crate::operations::union_of(val, from_cell(v.clone()));
    }
    (key, val)
}

/// Union of the key types and of the value types of a fixed map.
pub(crate) fn map_key_values(m: &DArrMap) -> (Type, Type) {
    let mut key = Type::BOTTOM;
    let mut val = Type::BOTTOM;
    for (k, v) in m.map.iter() {
        key = crate::operations::union_of(key, k.to_type());
        val = crate::operations::union_of(val, v.clone());
    }
    (key, val)
}

/// Union of all element types of a packed payload.
pub(crate) fn packed_values(p: &DArrPacked) -> Type {
    let mut ret = Type::BOTTOM;
    for e in &p.elems {
        ret = crate::operations::union_of(ret, e.clone());
    }
    ret
}

/// Retag `a` with `bits`. If the variant dimension of a constant container
/// no longer agrees with the new bits, the constant is reified into the
/// equivalent packed or map payload first.
pub(crate) fn set_trep(mut a: Type, bits: Trep) -> Type {
    if let Data::ArrVal(av) = &a.data {
        let mismatched = (Trep::OPT_PARR.contains(a.bits) && !Trep::OPT_PARR.contains(bits))
            || (Trep::OPT_VARR.contains(a.bits) && !Trep::OPT_VARR.contains(bits))
            || (Trep::OPT_DARR.contains(a.bits) && !Trep::OPT_DARR.contains(bits));
        if mismatched {
            if let Some(p) = to_arr_packed(av) {
                return packed_impl(bits, p.elems);
            }
            let m = to_arr_map(av).expect("non-packed constant must convert to map");
            return map_impl(bits, m.map);
        }
    }
    a.bits = bits;
    a
}
