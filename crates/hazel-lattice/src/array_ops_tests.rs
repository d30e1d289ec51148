//! Tests for indexed projection/mutation, key disection and iteration.

use hazel_common::{options, Str};

use crate::test_index::cls;
use crate::*;

#[test]
fn packed_reads_by_literal_index() {
    let arr = arr_packed(vec![Type::STR, Type::INT]);
    assert_eq!(array_elem(&arr, &ival(1)), (Type::INT, ThrowMode::None));
    assert_eq!(array_elem(&arr, &ival(0)), (Type::STR, ThrowMode::None));
    // An out-of-range read on a plain array misses and produces null.
    assert_eq!(
        array_elem(&arr, &ival(5)),
        (Type::INIT_NULL, ThrowMode::MaybeMissingElement)
    );
    // An unknown integer key reads any element, or misses.
    assert_eq!(
        array_elem(&arr, &Type::INT),
        (Type::OPT_ARRKEY, ThrowMode::MaybeMissingElement)
    );
}

#[test]
fn vector_reads_fault_instead_of_missing() {
    let v = vec(vec![Type::STR, Type::INT]);
    assert_eq!(vec_elem(&v, &ival(1)), (Type::INT, ThrowMode::None));
    assert_eq!(
        vec_elem(&v, &ival(5)),
        (Type::BOTTOM, ThrowMode::BadOperation)
    );
    // Non-integer keys can never succeed on a vector.
    assert_eq!(
        vec_elem(&v, &sval(Str::intern("k"))),
        (Type::BOTTOM, ThrowMode::BadOperation)
    );
}

#[test]
fn map_reads_by_literal_key() {
    let mut m = MapElems::new();
    m.push(MapKey::Str(Str::intern("x")), Type::INT);
    m.push(MapKey::Str(Str::intern("y")), Type::DBL);
    let map = arr_map(m);
    assert_eq!(
        array_elem(&map, &sval(Str::intern("x"))),
        (Type::INT, ThrowMode::None)
    );
    assert_eq!(
        array_elem(&map, &sval(Str::intern("z"))),
        (Type::INIT_NULL, ThrowMode::MaybeMissingElement)
    );
    // A key of the wrong kind reaches no entry.
    assert_eq!(
        array_elem(&map, &Type::INT),
        (Type::INIT_NULL, ThrowMode::MaybeMissingElement)
    );
}

#[test]
fn homogeneous_reads() {
    let arr = arr_packedn(Type::INT);
    let (ty, mode) = array_elem(&arr, &ival(3));
    assert_eq!(ty, Type::OPT_INT);
    assert_eq!(mode, ThrowMode::MaybeMissingElement);

    let v = vec_n(Type::INT);
    assert_eq!(
        vec_elem(&v, &ival(3)),
        (Type::INT, ThrowMode::MaybeMissingElement)
    );

    let d = dict_n(Type::ARRKEY, Type::STR);
    let (ty, mode) = dict_elem(&d, &ival(3));
    assert_eq!(ty, Type::STR);
    assert_eq!(mode, ThrowMode::MaybeMissingElement);
}

#[test]
fn unspecialized_reads_use_the_family_bound() {
    assert_eq!(
        array_elem(&Type::SARR_N, &ival(0)),
        (Type::INIT_UNC, ThrowMode::MaybeMissingElement)
    );
    assert_eq!(
        array_elem(&Type::ARR_N, &ival(0)),
        (Type::INIT_CELL, ThrowMode::MaybeMissingElement)
    );
}

#[test]
fn empty_array_reads_always_miss() {
    assert_eq!(
        array_elem(&aempty(), &ival(0)),
        (Type::INIT_NULL, ThrowMode::MissingElement)
    );
    assert_eq!(
        vec_elem(&vec_empty(), &ival(0)),
        (Type::BOTTOM, ThrowMode::BadOperation)
    );
}

#[test]
fn packed_set_appends_or_replaces() {
    let arr = arr_packed(vec![Type::STR]);
    let (t, mode) = array_set(arr.clone(), &ival(1), &Type::INT);
    assert_eq!(t, arr_packed(vec![Type::STR, Type::INT]));
    assert_eq!(mode, ThrowMode::None);

    let (t, mode) = array_set(arr.clone(), &ival(0), &Type::INT);
    assert_eq!(t, arr_packed(vec![Type::INT]));
    assert_eq!(mode, ThrowMode::None);

    // A far out-of-range write turns the shape into a fixed map.
    let (t, _) = array_set(arr, &ival(5), &Type::INT);
    let mut m = MapElems::new();
    m.push(MapKey::Int(0), Type::STR);
    m.push(MapKey::Int(5), Type::INT);
    assert_eq!(t, arr_map(m));
}

#[test]
fn vector_set_is_strict_about_bounds() {
    let v = vec(vec![Type::STR]);
    let (t, mode) = vec_set(v.clone(), &ival(0), &Type::INT);
    assert_eq!(t, vec(vec![Type::INT]));
    assert_eq!(mode, ThrowMode::None);

    let (t, mode) = vec_set(v.clone(), &ival(5), &Type::INT);
    assert_eq!(t, Type::BOTTOM);
    assert_eq!(mode, ThrowMode::BadOperation);

    let (t, mode) = vec_set(v, &sval(Str::intern("k")), &Type::INT);
    assert_eq!(t, Type::BOTTOM);
    assert_eq!(mode, ThrowMode::BadOperation);
}

#[test]
fn string_keys_demote_the_vector_variant() {
    let arr = arr_packed_varray(vec![Type::INT]);
    let (t, _) = array_set(arr, &sval(Str::intern("k")), &Type::DBL);
    // The write forces the hash variant; the packed shape is gone.
    assert!(t.subtype_of(&Type::DARR_N));
    let mut m = MapElems::new();
    m.push(MapKey::Int(0), Type::INT);
    m.push(MapKey::Str(Str::intern("k")), Type::DBL);
    assert_eq!(t, arr_map_darray(m));
}

#[test]
fn set_into_an_empty_array_builds_the_shape() {
    let (t, mode) = array_set(aempty(), &ival(0), &Type::INT);
    assert_eq!(mode, ThrowMode::None);
    assert!(is_specialized_array(&t));
    assert_eq!(array_elem(&t, &ival(0)).0, Type::INT);

    let (t, _) = array_set(aempty(), &sval(Str::intern("x")), &Type::INT);
    let mut m = MapElems::new();
    m.push(MapKey::Str(Str::intern("x")), Type::INT);
    assert_eq!(t, arr_map(m));
    assert_eq!(array_elem(&t, &sval(Str::intern("x"))).0, Type::INT);
}

#[test]
fn maybe_empty_arrays_lose_fixed_shape_on_set() {
    // Arr(Int,Int): empty or a two-element tuple.
    let arr = union_of(
        arr_packed(vec![Type::INT, Type::INT]),
        some_aempty(),
    );
    let (t, _) = array_set(arr, &ival(1), &Type::STR);
    // The result covers both the tuple-update and the write-into-empty
    // outcome, so only a homogeneous bound survives.
    assert!(!matches!(t.tag(), DataTag::Packed));
    assert_eq!(array_elem(&t, &ival(1)).0, union_of(Type::OPT_INT, Type::STR));
}

#[test]
fn newelem_appends_with_the_next_key() {
    let (t, k) = array_newelem(arr_packed(vec![Type::STR]), &Type::INT);
    assert_eq!(t, arr_packed(vec![Type::STR, Type::INT]));
    assert_eq!(k, ival(1));

    let (t, k) = array_newelem(aempty(), &Type::INT);
    assert_eq!(t, arr_packed(vec![Type::INT]));
    assert_eq!(k, ival(0));

    let mut m = MapElems::new();
    m.push(MapKey::Int(4), Type::STR);
    let (t, k) = array_newelem(arr_map(m), &Type::INT);
    let mut expect = MapElems::new();
    expect.push(MapKey::Int(4), Type::STR);
    expect.push(MapKey::Int(5), Type::INT);
    assert_eq!(t, arr_map(expect));
    assert_eq!(k, ival(5));
}

#[test]
fn keyset_append_is_a_strict_keyed_insert() {
    let (t, k) = keyset_newelem(keyset_empty(), &sval(Str::intern("s")));
    assert_eq!(k, sval(Str::intern("s")));
    let mut m = MapElems::new();
    m.push(MapKey::Str(Str::intern("s")), sval(Str::intern("s")));
    assert_eq!(t, keyset_map(m));

    // Keyed writes on keysets are statically bad.
    let (t, mode) = keyset_set(keyset_n(Type::INT), &ival(0), &ival(0));
    assert_eq!(t, Type::BOTTOM);
    assert_eq!(mode, ThrowMode::BadOperation);

    // A value that cannot be a key cannot be appended.
    let (t, _) = keyset_newelem(keyset_empty(), &Type::OBJ);
    assert_eq!(t, Type::BOTTOM);
}

#[test]
fn set_then_elem_sees_the_written_value() {
    let cases = [
        (arr_packed(vec![Type::STR]), ival(0)),
        (arr_packed(vec![Type::STR]), ival(1)),
        (arr_packedn(Type::STR), ival(2)),
        (arr_mapn(Type::STR, Type::STR), sval(Str::intern("x"))),
    ];
    for (arr, key) in cases {
        let (after, _) = array_set(arr, &key, &Type::DBL);
        let (read, _) = array_elem(&after, &key);
        assert!(
            Type::DBL.subtype_of(&read),
            "written value lost: {after:?}[{key:?}] = {read:?}"
        );
    }
}

#[test]
fn key_disection_coerces_scalars() {
    let k = disect_array_key(&sval(Str::intern("10")));
    assert_eq!(k.i, Some(10));
    assert_eq!(k.ty, ival(10));

    let k = disect_array_key(&sval(Str::intern("x")));
    assert_eq!(k.s, Some(Str::intern("x")));

    let k = disect_array_key(&Type::TRUE);
    assert_eq!(k.i, Some(1));

    let k = disect_array_key(&Type::NULL);
    assert_eq!(k.s, Some(Str::EMPTY));

    let k = disect_array_key(&Type::OBJ);
    assert!(k.may_throw);
    assert_eq!(k.ty, Type::OBJ);

    let k = disect_vec_key(&Type::OPT_INT);
    assert_eq!(k.ty, Type::INT);
    assert!(k.may_throw);

    let k = disect_strict_key(&Type::NULL);
    assert_eq!(k.ty, Type::BOTTOM);
    assert!(k.may_throw);
}

#[test]
fn key_notices_flag_marks_lossy_coercions() {
    // The double key always rounds; only the notice mode decides whether
    // the site may raise.
    let quiet = disect_array_key(&dval(1.5));
    assert_eq!(quiet.i, Some(1));
    assert!(!quiet.may_throw);

    options::set_array_key_notices(true);
    let noisy = disect_array_key(&dval(1.5));
    options::set_array_key_notices(false);
    assert_eq!(noisy.i, Some(1));
    assert!(noisy.may_throw);
}

#[test]
fn iter_types_over_shapes() {
    let it = iter_types(&vec(vec![Type::INT]));
    assert_eq!(it.key, Type::INT);
    assert_eq!(it.value, Type::INT);
    assert_eq!(it.count, IterCount::Single);
    assert!(!it.may_throw_on_init);

    let it = iter_types(&arr_packed(vec![Type::INT, Type::STR]));
    assert_eq!(it.count, IterCount::NonEmpty);
    assert_eq!(it.value, Type::ARRKEY);

    let it = iter_types(&Type::OPT_ARR);
    assert_eq!(it.key, Type::ARRKEY);
    assert_eq!(it.value, Type::INIT_CELL);
    assert_eq!(it.count, IterCount::Any);
    assert!(it.may_throw_on_init);

    let it = iter_types(&Type::ARR_E);
    assert_eq!(it.count, IterCount::Empty);

    let it = iter_types(&Type::INT);
    assert_eq!(it.count, IterCount::Empty);
    assert!(it.may_throw_on_init);

    let it = iter_types(&sub_obj(cls("ChildA")));
    assert_eq!(it.count, IterCount::Any);
    assert!(it.may_throw_on_next);
}

#[test]
fn destructor_and_cow_probes() {
    assert!(!could_run_destructor(&Type::INT));
    assert!(could_run_destructor(&Type::OBJ));
    assert!(could_run_destructor(&Type::REF));
    assert!(!could_run_destructor(&ref_to(Type::INT)));
    assert!(!could_run_destructor(&arr_packed(vec![Type::INT])));
    assert!(could_run_destructor(&arr_packed(vec![Type::OBJ])));
    assert!(!could_run_destructor(&Type::SARR_N));
    assert!(could_run_destructor(&Type::ARR_N));

    assert!(!could_copy_on_write(&Type::SARR_N));
    assert!(could_copy_on_write(&Type::ARR_N));
    assert!(could_copy_on_write(&Type::STR));
    assert!(!could_copy_on_write(&Type::SSTR));
}
