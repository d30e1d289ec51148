//! The coarse bit lattice.
//!
//! Every type carries a `Trep`: a bitset over disjoint cells of the value
//! space. Each atomic bit fixes a kind, a staticness (static vs counted, for
//! strings and array-likes), and an emptiness (empty vs non-empty, for
//! array-likes). Unions of cells are expressed by OR-ing bits, but only the
//! enumerated *predefined* combinations may ever appear in a `Type`; the
//! allow-list, together with the "may carry a payload" and "admits an
//! optional form" predicates, is one table (`for_each_predefined!`).
//!
//! The plain-array family has a variant dimension (plain / vector-variant /
//! hash-variant, spelled PARR / VARR / DARR below) on top of the staticness
//! and emptiness axes. The vector-indexed, dict-indexed and set-valued
//! families (VEC / DICT / KEYSET) have no variant dimension.

use bitflags::bitflags;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

bitflags! {
    #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
    pub struct Trep: u64 {
        const UNINIT    = 1 << 0;
        const INIT_NULL = 1 << 1;
        const FALSE     = 1 << 2;
        const TRUE      = 1 << 3;
        const INT       = 1 << 4;
        const DBL       = 1 << 5;
        /// Static string.
        const SSTR      = 1 << 6;
        /// Counted string.
        const CSTR      = 1 << 7;

        const SPARR_E   = 1 << 8;
        const CPARR_E   = 1 << 9;
        const SPARR_N   = 1 << 10;
        const CPARR_N   = 1 << 11;

        const SVARR_E   = 1 << 12;
        const CVARR_E   = 1 << 13;
        const SVARR_N   = 1 << 14;
        const CVARR_N   = 1 << 15;

        const SDARR_E   = 1 << 16;
        const CDARR_E   = 1 << 17;
        const SDARR_N   = 1 << 18;
        const CDARR_N   = 1 << 19;

        const OBJ       = 1 << 20;
        const RES       = 1 << 21;
        const CLS       = 1 << 22;
        const REF       = 1 << 23;

        const SVEC_E    = 1 << 24;
        const CVEC_E    = 1 << 25;
        const SVEC_N    = 1 << 26;
        const CVEC_N    = 1 << 27;
        const SDICT_E   = 1 << 28;
        const CDICT_E   = 1 << 29;
        const SDICT_N   = 1 << 30;
        const CDICT_N   = 1 << 31;
        const SKEYSET_E = 1 << 32;
        const CKEYSET_E = 1 << 33;
        const SKEYSET_N = 1 << 34;
        const CKEYSET_N = 1 << 35;

        // Per-variant unions of the plain-array family.
        const SPARR  = Self::SPARR_E.bits() | Self::SPARR_N.bits();
        const CPARR  = Self::CPARR_E.bits() | Self::CPARR_N.bits();
        const PARR_E = Self::SPARR_E.bits() | Self::CPARR_E.bits();
        const PARR_N = Self::SPARR_N.bits() | Self::CPARR_N.bits();
        const PARR   = Self::PARR_E.bits() | Self::PARR_N.bits();

        const SVARR  = Self::SVARR_E.bits() | Self::SVARR_N.bits();
        const CVARR  = Self::CVARR_E.bits() | Self::CVARR_N.bits();
        const VARR_E = Self::SVARR_E.bits() | Self::CVARR_E.bits();
        const VARR_N = Self::SVARR_N.bits() | Self::CVARR_N.bits();
        const VARR   = Self::VARR_E.bits() | Self::VARR_N.bits();

        const SDARR  = Self::SDARR_E.bits() | Self::SDARR_N.bits();
        const CDARR  = Self::CDARR_E.bits() | Self::CDARR_N.bits();
        const DARR_E = Self::SDARR_E.bits() | Self::CDARR_E.bits();
        const DARR_N = Self::SDARR_N.bits() | Self::CDARR_N.bits();
        const DARR   = Self::DARR_E.bits() | Self::DARR_N.bits();

        const SARR_E = Self::SPARR_E.bits() | Self::SVARR_E.bits() | Self::SDARR_E.bits();
        const CARR_E = Self::CPARR_E.bits() | Self::CVARR_E.bits() | Self::CDARR_E.bits();
        const SARR_N = Self::SPARR_N.bits() | Self::SVARR_N.bits() | Self::SDARR_N.bits();
        const CARR_N = Self::CPARR_N.bits() | Self::CVARR_N.bits() | Self::CDARR_N.bits();

        const NULL = Self::UNINIT.bits() | Self::INIT_NULL.bits();
        const BOOL = Self::FALSE.bits() | Self::TRUE.bits();
        const NUM  = Self::INT.bits() | Self::DBL.bits();
        const STR  = Self::SSTR.bits() | Self::CSTR.bits();

        const SARR  = Self::SARR_E.bits() | Self::SARR_N.bits();
        const CARR  = Self::CARR_E.bits() | Self::CARR_N.bits();
        const ARR_E = Self::SARR_E.bits() | Self::CARR_E.bits();
        const ARR_N = Self::SARR_N.bits() | Self::CARR_N.bits();
        const ARR   = Self::ARR_E.bits() | Self::ARR_N.bits();

        const SVEC  = Self::SVEC_E.bits() | Self::SVEC_N.bits();
        const CVEC  = Self::CVEC_E.bits() | Self::CVEC_N.bits();
        const VEC_E = Self::SVEC_E.bits() | Self::CVEC_E.bits();
        const VEC_N = Self::SVEC_N.bits() | Self::CVEC_N.bits();
        const VEC   = Self::VEC_E.bits() | Self::VEC_N.bits();

        const SDICT  = Self::SDICT_E.bits() | Self::SDICT_N.bits();
        const CDICT  = Self::CDICT_E.bits() | Self::CDICT_N.bits();
        const DICT_E = Self::SDICT_E.bits() | Self::CDICT_E.bits();
        const DICT_N = Self::SDICT_N.bits() | Self::CDICT_N.bits();
        const DICT   = Self::DICT_E.bits() | Self::DICT_N.bits();

        const SKEYSET  = Self::SKEYSET_E.bits() | Self::SKEYSET_N.bits();
        const CKEYSET  = Self::CKEYSET_E.bits() | Self::CKEYSET_N.bits();
        const KEYSET_E = Self::SKEYSET_E.bits() | Self::CKEYSET_E.bits();
        const KEYSET_N = Self::SKEYSET_N.bits() | Self::CKEYSET_N.bits();
        const KEYSET   = Self::KEYSET_E.bits() | Self::KEYSET_N.bits();

        // Optional (null-admitting) forms.
        const OPT_TRUE   = Self::INIT_NULL.bits() | Self::TRUE.bits();
        const OPT_FALSE  = Self::INIT_NULL.bits() | Self::FALSE.bits();
        const OPT_BOOL   = Self::INIT_NULL.bits() | Self::BOOL.bits();
        const OPT_INT    = Self::INIT_NULL.bits() | Self::INT.bits();
        const OPT_DBL    = Self::INIT_NULL.bits() | Self::DBL.bits();
        const OPT_NUM    = Self::INIT_NULL.bits() | Self::NUM.bits();
        const OPT_SSTR   = Self::INIT_NULL.bits() | Self::SSTR.bits();
        const OPT_STR    = Self::INIT_NULL.bits() | Self::STR.bits();
        const OPT_SARR_E = Self::INIT_NULL.bits() | Self::SARR_E.bits();
        const OPT_SARR_N = Self::INIT_NULL.bits() | Self::SARR_N.bits();
        const OPT_SARR   = Self::INIT_NULL.bits() | Self::SARR.bits();
        const OPT_CARR   = Self::INIT_NULL.bits() | Self::CARR.bits();
        const OPT_CARR_N = Self::INIT_NULL.bits() | Self::CARR_N.bits();
        const OPT_ARR_E  = Self::INIT_NULL.bits() | Self::ARR_E.bits();
        const OPT_ARR_N  = Self::INIT_NULL.bits() | Self::ARR_N.bits();
        const OPT_ARR    = Self::INIT_NULL.bits() | Self::ARR.bits();
        const OPT_OBJ    = Self::INIT_NULL.bits() | Self::OBJ.bits();
        const OPT_RES    = Self::INIT_NULL.bits() | Self::RES.bits();

        const OPT_SVEC_E = Self::INIT_NULL.bits() | Self::SVEC_E.bits();
        const OPT_SVEC_N = Self::INIT_NULL.bits() | Self::SVEC_N.bits();
        const OPT_SVEC   = Self::INIT_NULL.bits() | Self::SVEC.bits();
        const OPT_VEC_E  = Self::INIT_NULL.bits() | Self::VEC_E.bits();
        const OPT_VEC_N  = Self::INIT_NULL.bits() | Self::VEC_N.bits();
        const OPT_VEC    = Self::INIT_NULL.bits() | Self::VEC.bits();

        const OPT_SDICT_E = Self::INIT_NULL.bits() | Self::SDICT_E.bits();
        const OPT_SDICT_N = Self::INIT_NULL.bits() | Self::SDICT_N.bits();
        const OPT_SDICT   = Self::INIT_NULL.bits() | Self::SDICT.bits();
        const OPT_DICT_E  = Self::INIT_NULL.bits() | Self::DICT_E.bits();
        const OPT_DICT_N  = Self::INIT_NULL.bits() | Self::DICT_N.bits();
        const OPT_DICT    = Self::INIT_NULL.bits() | Self::DICT.bits();

        const OPT_SKEYSET_E = Self::INIT_NULL.bits() | Self::SKEYSET_E.bits();
        const OPT_SKEYSET_N = Self::INIT_NULL.bits() | Self::SKEYSET_N.bits();
        const OPT_SKEYSET   = Self::INIT_NULL.bits() | Self::SKEYSET.bits();
        const OPT_KEYSET_E  = Self::INIT_NULL.bits() | Self::KEYSET_E.bits();
        const OPT_KEYSET_N  = Self::INIT_NULL.bits() | Self::KEYSET_N.bits();
        const OPT_KEYSET    = Self::INIT_NULL.bits() | Self::KEYSET.bits();

        const OPT_SPARR_E = Self::INIT_NULL.bits() | Self::SPARR_E.bits();
        const OPT_SPARR_N = Self::INIT_NULL.bits() | Self::SPARR_N.bits();
        const OPT_SPARR   = Self::INIT_NULL.bits() | Self::SPARR.bits();
        const OPT_PARR_E  = Self::INIT_NULL.bits() | Self::PARR_E.bits();
        const OPT_PARR_N  = Self::INIT_NULL.bits() | Self::PARR_N.bits();
        const OPT_PARR    = Self::INIT_NULL.bits() | Self::PARR.bits();

        const OPT_SVARR_E = Self::INIT_NULL.bits() | Self::SVARR_E.bits();
        const OPT_SVARR_N = Self::INIT_NULL.bits() | Self::SVARR_N.bits();
        const OPT_SVARR   = Self::INIT_NULL.bits() | Self::SVARR.bits();
        const OPT_VARR_E  = Self::INIT_NULL.bits() | Self::VARR_E.bits();
        const OPT_VARR_N  = Self::INIT_NULL.bits() | Self::VARR_N.bits();
        const OPT_VARR    = Self::INIT_NULL.bits() | Self::VARR.bits();

        const OPT_SDARR_E = Self::INIT_NULL.bits() | Self::SDARR_E.bits();
        const OPT_SDARR_N = Self::INIT_NULL.bits() | Self::SDARR_N.bits();
        const OPT_SDARR   = Self::INIT_NULL.bits() | Self::SDARR.bits();
        const OPT_DARR_E  = Self::INIT_NULL.bits() | Self::DARR_E.bits();
        const OPT_DARR_N  = Self::INIT_NULL.bits() | Self::DARR_N.bits();
        const OPT_DARR    = Self::INIT_NULL.bits() | Self::DARR.bits();

        const UNC_ARRKEY     = Self::INT.bits() | Self::SSTR.bits();
        const ARRKEY         = Self::UNC_ARRKEY.bits() | Self::CSTR.bits();
        const OPT_UNC_ARRKEY = Self::INIT_NULL.bits() | Self::UNC_ARRKEY.bits();
        const OPT_ARRKEY     = Self::INIT_NULL.bits() | Self::ARRKEY.bits();

        const INIT_PRIM = Self::INIT_NULL.bits() | Self::BOOL.bits() | Self::NUM.bits();
        const PRIM      = Self::INIT_PRIM.bits() | Self::UNINIT.bits();
        const INIT_UNC  = Self::INIT_PRIM.bits() | Self::SSTR.bits() | Self::SARR.bits()
                        | Self::SVEC.bits() | Self::SDICT.bits() | Self::SKEYSET.bits();
        const UNC       = Self::INIT_UNC.bits() | Self::UNINIT.bits();
        const INIT_CELL = Self::INIT_NULL.bits() | Self::BOOL.bits() | Self::NUM.bits()
                        | Self::STR.bits() | Self::ARR.bits() | Self::OBJ.bits()
                        | Self::RES.bits() | Self::VEC.bits() | Self::DICT.bits()
                        | Self::KEYSET.bits();
        const CELL      = Self::UNINIT.bits() | Self::INIT_CELL.bits();
        const INIT_GEN  = Self::INIT_CELL.bits() | Self::REF.bits();
        const GEN       = Self::UNINIT.bits() | Self::INIT_GEN.bits();

        const TOP = Self::GEN.bits() | Self::CLS.bits();
    }
}

impl Trep {
    pub const BOTTOM: Trep = Trep::empty();

    // Masks that cut across families. They are not predefined types
    // themselves, only convenient tests.
    pub const ARR_LIKE_E: Trep = Trep::ARR_E
        .union(Trep::VEC_E)
        .union(Trep::DICT_E)
        .union(Trep::KEYSET_E);
    pub const ARR_LIKE_N: Trep = Trep::ARR_N
        .union(Trep::VEC_N)
        .union(Trep::DICT_N)
        .union(Trep::KEYSET_N);
    pub const S_ARR_LIKE: Trep = Trep::SARR
        .union(Trep::SVEC)
        .union(Trep::SDICT)
        .union(Trep::SKEYSET);
}

/// The predefined-pattern table. One entry per legal bit pattern:
/// `(NAME, can_be_optional, may_have_data)`. Everything the rest of the
/// crate knows about legal patterns is generated from this list, and the
/// `Type::NAME` singletons in `types.rs` come from the same invocation.
macro_rules! for_each_predefined {
    ($x:ident) => {
        $x! {
            (BOTTOM, false, false),
            (UNINIT, false, false),
            (INIT_NULL, false, false),
            (FALSE, true, false),
            (TRUE, true, false),
            (INT, true, true),
            (DBL, true, true),
            (SSTR, true, true),
            (SARR_E, true, false),
            (SARR_N, true, true),
            (OBJ, true, true),
            (RES, true, false),
            (CLS, false, true),
            (REF, false, true),
            (SVEC_E, true, false),
            (SVEC_N, true, true),
            (SDICT_E, true, false),
            (SDICT_N, true, true),
            (SKEYSET_E, true, false),
            (SKEYSET_N, true, true),
            (NULL, true, false),
            (BOOL, true, false),
            (NUM, true, false),
            (STR, true, false),
            (SARR, true, true),
            (ARR_E, true, false),
            (ARR_N, true, true),
            (ARR, true, true),
            (SVEC, true, true),
            (VEC_E, true, false),
            (VEC_N, true, true),
            (VEC, true, true),
            (SDICT, true, true),
            (DICT_E, true, false),
            (DICT_N, true, true),
            (DICT, true, true),
            (SKEYSET, true, true),
            (KEYSET_E, true, false),
            (KEYSET_N, true, true),
            (KEYSET, true, true),
            (SPARR_E, true, false),
            (SPARR_N, true, true),
            (SPARR, true, true),
            (PARR_E, true, false),
            (PARR_N, true, true),
            (PARR, true, true),
            (SVARR_E, true, false),
            (SVARR_N, true, true),
            (SVARR, true, true),
            (VARR_E, true, false),
            (VARR_N, true, true),
            (VARR, true, true),
            (SDARR_E, true, false),
            (SDARR_N, true, true),
            (SDARR, true, true),
            (DARR_E, true, false),
            (DARR_N, true, true),
            (DARR, true, true),
            (UNC_ARRKEY, true, false),
            (ARRKEY, true, false),
            (INIT_PRIM, false, false),
            (PRIM, false, false),
            (INIT_UNC, false, false),
            (UNC, false, false),
            (OPT_TRUE, false, false),
            (OPT_FALSE, false, false),
            (OPT_BOOL, false, false),
            (OPT_INT, false, true),
            (OPT_DBL, false, true),
            (OPT_NUM, false, false),
            (OPT_SSTR, false, true),
            (OPT_STR, false, false),
            (OPT_SARR_E, false, false),
            (OPT_SARR_N, false, true),
            (OPT_SARR, false, true),
            (OPT_ARR_E, false, false),
            (OPT_ARR_N, false, true),
            (OPT_ARR, false, true),
            (OPT_OBJ, false, true),
            (OPT_RES, false, false),
            (OPT_SVEC_E, false, false),
            (OPT_SVEC_N, false, true),
            (OPT_SVEC, false, true),
            (OPT_VEC_E, false, false),
            (OPT_VEC_N, false, true),
            (OPT_VEC, false, true),
            (OPT_SDICT_E, false, false),
            (OPT_SDICT_N, false, true),
            (OPT_SDICT, false, true),
            (OPT_DICT_E, false, false),
            (OPT_DICT_N, false, true),
            (OPT_DICT, false, true),
            (OPT_SKEYSET_E, false, false),
            (OPT_SKEYSET_N, false, true),
            (OPT_SKEYSET, false, true),
            (OPT_KEYSET_E, false, false),
            (OPT_KEYSET_N, false, true),
            (OPT_KEYSET, false, true),
            (OPT_SPARR_E, false, false),
            (OPT_SPARR_N, false, true),
            (OPT_SPARR, false, true),
            (OPT_PARR_E, false, false),
            (OPT_PARR_N, false, true),
            (OPT_PARR, false, true),
            (OPT_SVARR_E, false, false),
            (OPT_SVARR_N, false, true),
            (OPT_SVARR, false, true),
            (OPT_VARR_E, false, false),
            (OPT_VARR_N, false, true),
            (OPT_VARR, false, true),
            (OPT_SDARR_E, false, false),
            (OPT_SDARR_N, false, true),
            (OPT_SDARR, false, true),
            (OPT_DARR_E, false, false),
            (OPT_DARR_N, false, true),
            (OPT_DARR, false, true),
            (OPT_UNC_ARRKEY, false, false),
            (OPT_ARRKEY, false, false),
            (INIT_CELL, false, false),
            (CELL, false, false),
            (INIT_GEN, false, false),
            (GEN, false, false),
            (TOP, false, false),
        }
    };
}

pub(crate) use for_each_predefined;

macro_rules! predefined_entries {
    ($( ($name:ident, $opt:expr, $data:expr) ),* $(,)?) => {
        pub(crate) static PREDEFINED: &[(Trep, bool, bool)] =
            &[ $( (Trep::$name, $opt, $data) ),* ];
    };
}

for_each_predefined!(predefined_entries);

struct PredefFlags {
    can_be_optional: bool,
    may_have_data: bool,
}

static PREDEF_LOOKUP: Lazy<FxHashMap<u64, PredefFlags>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    for &(bits, opt, data) in PREDEFINED {
        m.insert(
            bits.bits(),
            PredefFlags {
                can_be_optional: opt,
                may_have_data: data,
            },
        );
    }
    m
});

// Counted-only array-like patterns can also carry a payload. They are not
// predefined (a type never holds bare counted bits), but the intersection
// arithmetic may probe them.
static EXTRA_DATA: Lazy<FxHashMap<u64, ()>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    let data_bases = [
        Trep::CARR,
        Trep::CARR_N,
        Trep::CPARR,
        Trep::CPARR_N,
        Trep::CVARR,
        Trep::CVARR_N,
        Trep::CDARR,
        Trep::CDARR_N,
        Trep::CVEC,
        Trep::CVEC_N,
        Trep::CDICT,
        Trep::CDICT_N,
        Trep::CKEYSET,
        Trep::CKEYSET_N,
    ];
    for b in data_bases {
        m.insert(b.bits(), ());
        m.insert((b | Trep::INIT_NULL).bits(), ());
    }
    m
});

/// Whether `bits` is in the predefined allow-list. A `Type` may only ever
/// hold predefined bits.
pub(crate) fn is_predefined(bits: Trep) -> bool {
    PREDEF_LOOKUP.contains_key(&bits.bits())
}

/// Whether a type with these bits may carry a specialized payload. Legal to
/// call with non-predefined bits.
pub(crate) fn may_have_data(bits: Trep) -> bool {
    if let Some(flags) = PREDEF_LOOKUP.get(&bits.bits()) {
        return flags.may_have_data;
    }
    EXTRA_DATA.contains_key(&bits.bits())
}

/// Whether OR-ing `INIT_NULL` into these bits yields another predefined
/// pattern.
///
/// Pre: `is_predefined(bits)`.
pub(crate) fn can_be_optional(bits: Trep) -> bool {
    let flags = PREDEF_LOOKUP
        .get(&bits.bits())
        .expect("can_be_optional on non-predefined bits");
    flags.can_be_optional
}

/// OR two patterns drawn from one array-like family without leaving the
/// predefined set: if the family part of the union is not predefined, widen
/// it to the whole family (keeping staticness, emptiness and null bits).
fn combine_arrish_bits(family: Trep, a: Trep, b: Trep) -> Trep {
    let combined = a | b;
    debug_assert!((family | Trep::INIT_NULL).contains(combined));
    let arr_part = combined & family;
    if !is_predefined(arr_part) {
        return combined | family;
    }
    debug_assert!(is_predefined(combined));
    combined
}

pub(crate) fn combine_arr_bits(a: Trep, b: Trep) -> Trep {
    combine_arrish_bits(Trep::ARR, a, b)
}

pub(crate) fn combine_parr_bits(a: Trep, b: Trep) -> Trep {
    combine_arrish_bits(Trep::PARR, a, b)
}

pub(crate) fn combine_varr_bits(a: Trep, b: Trep) -> Trep {
    combine_arrish_bits(Trep::VARR, a, b)
}

pub(crate) fn combine_darr_bits(a: Trep, b: Trep) -> Trep {
    combine_arrish_bits(Trep::DARR, a, b)
}

pub(crate) fn combine_vec_bits(a: Trep, b: Trep) -> Trep {
    combine_arrish_bits(Trep::VEC, a, b)
}

pub(crate) fn combine_dict_bits(a: Trep, b: Trep) -> Trep {
    combine_arrish_bits(Trep::DICT, a, b)
}

pub(crate) fn combine_keyset_bits(a: Trep, b: Trep) -> Trep {
    combine_arrish_bits(Trep::KEYSET, a, b)
}

/// Combine plain-array bits coming from *different* variants of the family.
/// The union is promoted to the variantless plain-array pattern that keeps
/// the staticness and emptiness information.
pub(crate) fn combine_dv_arrish_bits(a: Trep, b: Trep) -> Trep {
    let combined = a | b;
    let nonopt = combined - Trep::INIT_NULL;
    let check = |x: Trep| x.contains(nonopt);
    let ret = |x: Trep| {
        if combined.intersects(Trep::INIT_NULL) {
            x | Trep::INIT_NULL
        } else {
            x
        }
    };
    if check(Trep::SARR_E) {
        return ret(Trep::SARR_E);
    }
    if check(Trep::SARR_N) {
        return ret(Trep::SARR_N);
    }
    if check(Trep::SARR) {
        return ret(Trep::SARR);
    }
    if check(Trep::ARR_E) {
        return ret(Trep::ARR_E);
    }
    if check(Trep::ARR_N) {
        return ret(Trep::ARR_N);
    }
    if check(Trep::ARR) {
        return ret(Trep::ARR);
    }
    unreachable!("combine_dv_arrish_bits on non-array bits");
}

/// Union `b`'s bits into `a`'s array-like family, dropping the bits of `b`
/// outside it. `b` may be a repeated set such as
/// `SARR_E | SVEC_E | SDICT_E | SKEYSET_E`, so callers can OR in a
/// particular S/C/E/N slice without knowing the family. Plain-array inputs
/// whose variants differ promote to the variantless plain-array union.
pub(crate) fn combine_arr_like_bits(a: Trep, b: Trep) -> Trep {
    let check = |a: Trep, x: Trep| x.contains(a);
    debug_assert!(!a.is_empty() && is_predefined(a) && !check(a, Trep::INIT_NULL));
    // Same variant on both sides: combine within the variant.
    if check(a, Trep::OPT_PARR) && check(b, Trep::OPT_PARR) {
        return combine_parr_bits(a, b);
    }
    if check(a, Trep::OPT_VARR) && check(b, Trep::OPT_VARR) {
        return combine_varr_bits(a, b);
    }
    if check(a, Trep::OPT_DARR) && check(b, Trep::OPT_DARR) {
        return combine_darr_bits(a, b);
    }
    // Mixed plain-array variants promote to the family union.
    if check(a, Trep::OPT_ARR) {
        return combine_dv_arrish_bits(a, b & Trep::OPT_ARR);
    }
    if check(a, Trep::OPT_VEC) {
        return combine_vec_bits(a, b & Trep::OPT_VEC);
    }
    if check(a, Trep::OPT_DICT) {
        return combine_dict_bits(a, b & Trep::OPT_DICT);
    }
    if check(a, Trep::OPT_KEYSET) {
        return combine_keyset_bits(a, b & Trep::OPT_KEYSET);
    }
    unreachable!("combine_arr_like_bits on non-array-like bits");
}

/// Like `combine_arr_like_bits`, but the plain-array variants are kept as
/// separate types: a vector-variant pattern never promotes to the
/// variantless plain-array union.
pub(crate) fn combine_dv_arr_like_bits(a: Trep, b: Trep) -> Trep {
    let check = |a: Trep, x: Trep| x.contains(a);
    debug_assert!(!a.is_empty() && is_predefined(a) && !check(a, Trep::INIT_NULL));
    if check(a, Trep::OPT_PARR) {
        return combine_parr_bits(a, b & Trep::OPT_PARR);
    }
    if check(a, Trep::OPT_VARR) {
        return combine_varr_bits(a, b & Trep::OPT_VARR);
    }
    if check(a, Trep::OPT_DARR) {
        return combine_darr_bits(a, b & Trep::OPT_DARR);
    }
    if check(a, Trep::OPT_ARR) {
        return combine_arr_bits(a, b & Trep::OPT_ARR);
    }
    if check(a, Trep::OPT_VEC) {
        return combine_vec_bits(a, b & Trep::OPT_VEC);
    }
    if check(a, Trep::OPT_DICT) {
        return combine_dict_bits(a, b & Trep::OPT_DICT);
    }
    if check(a, Trep::OPT_KEYSET) {
        return combine_keyset_bits(a, b & Trep::OPT_KEYSET);
    }
    unreachable!("combine_dv_arr_like_bits on non-array-like bits");
}

/// Admit the variantless plain-array bits alongside any vector-variant bits
/// present, without removing the vector-variant bits.
pub(crate) fn maybe_promote_varray(mut a: Trep) -> Trep {
    debug_assert!(is_predefined(a));
    let mut check = |b: Trep, c: Trep| {
        if a.intersects(b) {
            a |= c;
        }
    };
    check(Trep::SVARR_E, Trep::SARR_E);
    check(Trep::CVARR_E, Trep::CARR_E);
    check(Trep::SVARR_N, Trep::SARR_N);
    check(Trep::CVARR_N, Trep::CARR_N);
    debug_assert!(is_predefined(a));
    a
}

/// Reclassify vector-variant bits as hash-variant bits, used when an
/// operation (a string key, a negative integer key) forces the variant
/// change. A pattern wider than the vector variant cannot swap bits and stay
/// predefined, so it takes the admitting path instead.
pub(crate) fn promote_varray(mut a: Trep) -> Trep {
    debug_assert!(is_predefined(a));
    if !Trep::OPT_VARR.contains(a) {
        return maybe_promote_varray(a);
    }
    let mut check = |b: Trep, c: Trep| {
        if a.intersects(b) {
            a = (a | c) - b;
        }
    };
    check(Trep::SVARR_E, Trep::SDARR_E);
    check(Trep::CVARR_E, Trep::CDARR_E);
    check(Trep::SVARR_N, Trep::SDARR_N);
    check(Trep::CVARR_N, Trep::CDARR_N);
    debug_assert!(is_predefined(a));
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_entry_is_self_consistent() {
        for &(bits, opt, _data) in PREDEFINED {
            assert!(is_predefined(bits));
            if opt {
                assert!(
                    is_predefined(bits | Trep::INIT_NULL),
                    "optional form of {bits:?} must be predefined"
                );
            }
        }
    }

    #[test]
    fn counted_bits_imply_static_bits_in_table() {
        let pairs = [
            (Trep::CSTR, Trep::SSTR),
            (Trep::CPARR_E, Trep::SPARR_E),
            (Trep::CPARR_N, Trep::SPARR_N),
            (Trep::CVARR_E, Trep::SVARR_E),
            (Trep::CVARR_N, Trep::SVARR_N),
            (Trep::CDARR_E, Trep::SDARR_E),
            (Trep::CDARR_N, Trep::SDARR_N),
            (Trep::CVEC_E, Trep::SVEC_E),
            (Trep::CVEC_N, Trep::SVEC_N),
            (Trep::CDICT_E, Trep::SDICT_E),
            (Trep::CDICT_N, Trep::SDICT_N),
            (Trep::CKEYSET_E, Trep::SKEYSET_E),
            (Trep::CKEYSET_N, Trep::SKEYSET_N),
        ];
        for &(bits, _, _) in PREDEFINED {
            for (counted, stat) in pairs {
                if bits.intersects(counted) {
                    assert!(
                        bits.intersects(stat),
                        "{bits:?} has a bare counted bit"
                    );
                }
            }
        }
    }

    #[test]
    fn bare_counted_is_not_predefined() {
        assert!(!is_predefined(Trep::CSTR));
        assert!(!is_predefined(Trep::CPARR_N));
        assert!(!is_predefined(Trep::CVEC));
        // ...but the counted array-like masks still admit payloads.
        assert!(may_have_data(Trep::CVEC_N));
        assert!(may_have_data(Trep::CARR));
        assert!(!may_have_data(Trep::CSTR));
    }

    #[test]
    fn combine_promotes_out_of_family_unions() {
        // SPArrN | CVArrN is no plain-array variant; the plain family keeps
        // it predefined.
        let combined = combine_dv_arrish_bits(Trep::SPARR_N, Trep::CVARR_N);
        assert!(is_predefined(combined));
        assert!(Trep::ARR_N.contains(combined - Trep::INIT_NULL));

        let v = combine_vec_bits(Trep::SVEC_N, Trep::CVEC_E);
        assert!(is_predefined(v));
    }

    #[test]
    fn promote_varray_swaps_variant() {
        assert_eq!(promote_varray(Trep::SVARR_N), Trep::SDARR_N);
        assert_eq!(
            promote_varray(Trep::VARR_N),
            Trep::DARR_N
        );
        // Wider than the vector variant: admit instead of swap.
        let promoted = promote_varray(Trep::SARR_N);
        assert!(promoted.contains(Trep::SVARR_N));
        assert!(promoted.contains(Trep::SARR_N));
    }

    #[test]
    fn top_is_everything() {
        assert_eq!(Trep::TOP, Trep::all());
    }
}
