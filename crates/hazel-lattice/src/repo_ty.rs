//! The persistent type-annotation sink.
//!
//! A later stage persists what the analysis proved about each value as a
//! compact tag. `make_repo_type` compresses a lattice point into that tag;
//! array shapes worth keeping are interned into an `ArrayTypeTable` shared
//! by the whole emit, and object refinements keep the class name.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::types::{dobj_of, is_opt, Bound, Data, Type};

/// The persisted tag vocabulary.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum RepoTag {
    Uninit,
    InitNull,
    Null,
    Int,
    OptInt,
    Dbl,
    OptDbl,
    Res,
    OptRes,
    Bool,
    OptBool,
    SStr,
    OptSStr,
    Str,
    OptStr,
    SVArr,
    OptSVArr,
    VArr,
    OptVArr,
    SDArr,
    OptSDArr,
    DArr,
    OptDArr,
    SArr,
    OptSArr,
    Arr,
    OptArr,
    SVec,
    OptSVec,
    Vec,
    OptVec,
    SDict,
    OptSDict,
    Dict,
    OptDict,
    SKeyset,
    OptSKeyset,
    Keyset,
    OptKeyset,
    Obj,
    OptObj,
    UncArrKey,
    ArrKey,
    OptUncArrKey,
    OptArrKey,
    InitUnc,
    Unc,
    InitCell,
    Cell,
    Ref,
    InitGen,
    Gen,
    ExactObj,
    SubObj,
    OptExactObj,
    OptSubObj,
}

/// Handle to an interned array shape in the table.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct ArrTypeId(u32);

/// Whether the persisted array might be empty.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum RepoArrEmpty {
    Maybe,
    No,
}

/// A persisted array shape.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum RepoArrShape {
    /// Fixed-length, per-element tags.
    Packed(Vec<RepoAuthType>),
    /// Unknown length, one element tag.
    PackedN(RepoAuthType),
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct RepoArr {
    pub empty: RepoArrEmpty,
    pub shape: RepoArrShape,
}

/// A persisted type annotation: a tag plus an optional class name or array
/// shape.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct RepoAuthType {
    pub tag: RepoTag,
    pub cls: Option<hazel_common::Str>,
    pub arr: Option<ArrTypeId>,
}

impl RepoAuthType {
    fn tag_only(tag: RepoTag) -> RepoAuthType {
        RepoAuthType {
            tag,
            cls: None,
            arr: None,
        }
    }
}

/// Interning table for persisted array shapes.
#[derive(Default)]
pub struct ArrayTypeTable {
    shapes: Vec<RepoArr>,
    lookup: FxHashMap<RepoArr, ArrTypeId>,
}

impl ArrayTypeTable {
    pub fn new() -> ArrayTypeTable {
        ArrayTypeTable::default()
    }

    fn intern(&mut self, arr: RepoArr) -> ArrTypeId {
        if let Some(&id) = self.lookup.get(&arr) {
            return id;
        }
        let id = ArrTypeId(self.shapes.len() as u32);
        self.shapes.push(arr.clone());
        self.lookup.insert(arr, id);
        id
    }

    pub fn packed(&mut self, empty: RepoArrEmpty, elems: Vec<RepoAuthType>) -> ArrTypeId {
        self.intern(RepoArr {
            empty,
            shape: RepoArrShape::Packed(elems),
        })
    }

    pub fn packedn(&mut self, empty: RepoArrEmpty, elem: RepoAuthType) -> ArrTypeId {
        self.intern(RepoArr {
            empty,
            shape: RepoArrShape::PackedN(elem),
        })
    }

    pub fn get(&self, id: ArrTypeId) -> &RepoArr {
        &self.shapes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

fn make_repo_type_arr(table: &mut ArrayTypeTable, t: &Type) -> RepoAuthType {
    let empty = if Type::ARR_E.could_be(t) {
        RepoArrEmpty::Maybe
    } else {
        RepoArrEmpty::No
    };

    let arr = match &t.data {
        Data::PackedN(p) => {
            let elem = make_repo_type(table, &p.ty);
            Some(table.packedn(empty, elem))
        }
        Data::Packed(p) => {
            let elems = p
                .elems
                .iter()
                .map(|e| make_repo_type(table, e))
                .collect();
            Some(table.packed(empty, elems))
        }
        // Constant, map-shaped and homogeneous-map refinements have no
        // persisted form.
        _ => None,
    };

    let tag = if t.subtype_of(&Type::SVARR) {
        RepoTag::SVArr
    } else if t.subtype_of(&Type::VARR) {
        RepoTag::VArr
    } else if t.subtype_of(&Type::OPT_SVARR) {
        RepoTag::OptSVArr
    } else if t.subtype_of(&Type::OPT_VARR) {
        RepoTag::OptVArr
    } else if t.subtype_of(&Type::SDARR) {
        RepoTag::SDArr
    } else if t.subtype_of(&Type::DARR) {
        RepoTag::DArr
    } else if t.subtype_of(&Type::OPT_SDARR) {
        RepoTag::OptSDArr
    } else if t.subtype_of(&Type::OPT_DARR) {
        RepoTag::OptDArr
    } else if t.subtype_of(&Type::SARR) {
        RepoTag::SArr
    } else if t.subtype_of(&Type::ARR) {
        RepoTag::Arr
    } else if t.subtype_of(&Type::OPT_SARR) {
        RepoTag::OptSArr
    } else if t.subtype_of(&Type::OPT_ARR) {
        RepoTag::OptArr
    } else {
        unreachable!("plain-array type expected")
    };

    RepoAuthType {
        tag,
        cls: None,
        arr,
    }
}

/// Compress `t` into its persisted annotation.
///
/// Pre: `!t.could_be(&Type::CLS)` and `t` is not bottom.
pub fn make_repo_type(table: &mut ArrayTypeTable, t: &Type) -> RepoAuthType {
    assert!(!t.could_be(&Type::CLS));
    assert!(!t.subtype_of(&Type::BOTTOM));

    if crate::types::is_specialized_obj(t)
        && (t.strict_subtype_of(&Type::OBJ)
            || (is_opt(t) && t.strict_subtype_of(&Type::OPT_OBJ)))
    {
        let dobj = dobj_of(t);
        let tag = if is_opt(t) {
            if dobj.kind == Bound::Exact {
                RepoTag::OptExactObj
            } else {
                RepoTag::OptSubObj
            }
        } else if dobj.kind == Bound::Exact {
            RepoTag::ExactObj
        } else {
            RepoTag::SubObj
        };
        return RepoAuthType {
            tag,
            cls: Some(dobj.cls.name()),
            arr: None,
        };
    }

    if t.strict_subtype_of(&Type::ARR) || (is_opt(t) && t.strict_subtype_of(&Type::OPT_ARR)) {
        return make_repo_type_arr(table, t);
    }

    macro_rules! try_tag {
        ($($name:ident => $ty:ident),* $(,)?) => {
            $(
                if t.subtype_of(&Type::$ty) {
                    return RepoAuthType::tag_only(RepoTag::$name);
                }
            )*
        };
    }

    try_tag! {
        Uninit => UNINIT,
        InitNull => INIT_NULL,
        Null => NULL,
        Int => INT,
        OptInt => OPT_INT,
        Dbl => DBL,
        OptDbl => OPT_DBL,
        Res => RES,
        OptRes => OPT_RES,
        Bool => BOOL,
        OptBool => OPT_BOOL,
        SStr => SSTR,
        OptSStr => OPT_SSTR,
        Str => STR,
        OptStr => OPT_STR,
        SVArr => SVARR,
        OptSVArr => OPT_SVARR,
        VArr => VARR,
        OptVArr => OPT_VARR,
        SDArr => SDARR,
        OptSDArr => OPT_SDARR,
        DArr => DARR,
        OptDArr => OPT_DARR,
        SArr => SARR,
        OptSArr => OPT_SARR,
        Arr => ARR,
        OptArr => OPT_ARR,
        SVec => SVEC,
        OptSVec => OPT_SVEC,
        Vec => VEC,
        OptVec => OPT_VEC,
        SDict => SDICT,
        OptSDict => OPT_SDICT,
        Dict => DICT,
        OptDict => OPT_DICT,
        SKeyset => SKEYSET,
        OptSKeyset => OPT_SKEYSET,
        Keyset => KEYSET,
        OptKeyset => OPT_KEYSET,
        Obj => OBJ,
        OptObj => OPT_OBJ,
        UncArrKey => UNC_ARRKEY,
        ArrKey => ARRKEY,
        OptUncArrKey => OPT_UNC_ARRKEY,
        OptArrKey => OPT_ARRKEY,
        InitUnc => INIT_UNC,
        Unc => UNC,
        InitCell => INIT_CELL,
        Cell => CELL,
        Ref => REF,
        InitGen => INIT_GEN,
        Gen => GEN,
    }
    unreachable!("no persisted tag covers {t:?}")
}
