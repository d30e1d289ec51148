//! The abstract value lattice for the hazel whole-program bytecode
//! optimizer.
//!
//! Everything the analysis knows about a value is a point in this lattice:
//! a predefined bit pattern over kind/staticness/emptiness cells, plus an
//! optional specialized payload (a literal, a class bound, an array shape,
//! a reference inner type). This crate provides:
//! - `bits` - The coarse bit lattice and its predefined-pattern table
//! - `types` - The `Type` representation and constructors
//! - `relations` - `subtype_of`, `could_be`, equality
//! - `operations` - `union_of`, `intersection_of`, widening
//! - `loosen` - Loss operators and truthiness refinement
//! - `keys` / `array_ops` - Indexed read/write refinement and iteration
//! - `conv` - Host-value conversions and scalar extraction
//! - `repo_ty` - The persistent annotation sink
//!
//! Lattice points are plain values: cheap to clone (nested payloads share
//! structure copy-on-write), hashable, and free of interior mutability.
//! All operations are total; invariant violations are programmer errors
//! and abort.

pub mod bits;
pub mod class;
pub mod conv;
pub mod keys;
pub mod loosen;
pub mod operations;
pub mod relations;
pub mod repo_ty;
pub mod types;

pub mod array_ops;

pub use bits::Trep;
pub use class::{ClassLike, ClsHandle};
pub use conv::{
    arr_size, categorize_array, from_cell, from_data_kind, from_hni_constraint, get_string_keys,
    is_scalar, scalarize, tv, type_of_istype, ArrayCat, ArrayCatKind, IsTypeOp,
};
pub use keys::{disect_array_key, disect_strict_key, disect_vec_key, ArrKey};
pub use loosen::{
    add_nonemptiness, assert_emptiness, assert_nonemptiness, loosen_all, loosen_arrays,
    loosen_dvarrayness, loosen_emptiness, loosen_staticness, loosen_values, remove_uninit,
};
pub use operations::{
    could_have_magic_bool_conversion, emptiness, intersection_of, promote_emptyish, stack_flav,
    union_of, widen_type, widening_union,
};
pub use repo_ty::{make_repo_type, ArrTypeId, ArrayTypeTable, RepoAuthType, RepoTag};
pub use types::{
    aempty, aempty_darray, aempty_varray, arr_map, arr_map_darray, arr_mapn, arr_packed,
    arr_packed_varray, arr_packedn, aval, cls_exact, dcls_of, dict_empty, dict_map, dict_n,
    dict_val, dobj_of, dval, is_opt, is_ref_with_inner, is_specialized_array,
    is_specialized_array_like, is_specialized_cls, is_specialized_dict, is_specialized_keyset,
    is_specialized_obj, is_specialized_vec, is_specialized_wait_handle, ival, keyset_empty,
    keyset_map, keyset_n, keyset_val, obj_exact, objcls, opt,
    ref_to, sarr_map, sarr_mapn, sarr_packed, sarr_packedn, sdict_n, sempty, skeyset_n,
    some_aempty, some_aempty_darray, some_dict_empty, some_keyset_empty, some_vec_empty, sub_cls,
    sub_obj, sval, svec, svec_n, unopt, vec, vec_empty, vec_n, vec_val, wait_handle,
    wait_handle_inner, Bound, DArrMap, DArrMapN, DArrPacked, DArrPackedN, DCls, DObj, Data,
    DataTag, Emptiness, MapElems, MapKey, ThrowMode, Type,
};

pub use array_ops::{
    array_elem, array_like_elem, array_like_newelem, array_like_set, array_newelem, array_set,
    could_copy_on_write, could_run_destructor, dict_elem, dict_newelem, dict_set, iter_types,
    keyset_elem, keyset_newelem, keyset_set, vec_elem, vec_newelem, vec_set, IterCount,
    IterTypes,
};

#[cfg(test)]
mod types_tests;

#[cfg(test)]
mod relations_tests;

#[cfg(test)]
mod operations_tests;

#[cfg(test)]
mod array_ops_tests;

#[cfg(test)]
pub(crate) mod test_index;
