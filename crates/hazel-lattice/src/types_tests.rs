//! Tests for the type representation: predefined singletons, optionality,
//! constructor canonicalization and scalar extraction.

use std::sync::Arc;

use hazel_common::{ArrConst, ArrKind, ConstKey, Str, Value};

use crate::test_index::cls;
use crate::types::map_key_values;
use crate::*;

fn sarr_const(kind: ArrKind, entries: Vec<(ConstKey, Value)>) -> hazel_common::ArrConstRef {
    Arc::new(ArrConst::new(kind, entries))
}

#[test]
fn every_predefined_pattern_is_a_valid_type() {
    for &(bits, _, _) in crate::bits::PREDEFINED {
        let t = Type::from_bits(bits);
        assert!(t.check_invariants());
    }
}

#[test]
fn opt_round_trips() {
    let t = opt(ival(3));
    assert!(is_opt(&t));
    assert_eq!(unopt(t), ival(3));

    assert!(is_opt(&Type::OPT_INT));
    assert!(!is_opt(&Type::INIT_NULL));
    assert!(!is_opt(&Type::INT));
    // InitCell admits null but is not one of the Opt types.
    assert!(!is_opt(&Type::INIT_CELL));
}

#[test]
fn map_with_contiguous_keys_normalizes_to_packed() {
    let mut m = MapElems::new();
    m.push(MapKey::Int(0), Type::INT);
    let t = arr_map(m);
    assert_eq!(t, arr_packed(vec![Type::INT]));

    // A single known key makes a homogeneous map a fixed map.
    let t = arr_mapn(ival(5), Type::INT);
    let mut m = MapElems::new();
    m.push(MapKey::Int(5), Type::INT);
    assert_eq!(t, arr_map(m));
}

#[test]
fn struct_maps_keep_their_key_order() {
    let mut ab = MapElems::new();
    ab.push(MapKey::Str(Str::intern("a")), Type::INT);
    ab.push(MapKey::Str(Str::intern("b")), Type::STR);
    let mut ba = MapElems::new();
    ba.push(MapKey::Str(Str::intern("b")), Type::STR);
    ba.push(MapKey::Str(Str::intern("a")), Type::INT);
    assert_ne!(arr_map(ab), arr_map(ba));
}

#[test]
fn constant_constructors_pick_family_bits() {
    let empty = sarr_const(ArrKind::Plain, vec![]);
    assert_eq!(aval(empty), aempty());

    let empty_d = sarr_const(ArrKind::DArray, vec![]);
    assert_eq!(aval(empty_d), aempty_darray());

    let a = sarr_const(
        ArrKind::Plain,
        vec![
            (ConstKey::Int(0), Value::Int(1)),
            (ConstKey::Int(1), Value::Int(2)),
        ],
    );
    let t = aval(a);
    assert!(t.subtype_of(&Type::SPARR_N));
    assert!(is_specialized_array(&t));

    let v = sarr_const(ArrKind::Vec, vec![(ConstKey::Int(0), Value::Bool(true))]);
    let t = vec_val(v);
    assert!(t.subtype_of(&Type::SVEC_N));
    assert!(is_specialized_vec(&t));
}

#[test]
fn wait_handles_carry_an_inner_type() {
    let wh = wait_handle(cls("Awaitable"), Type::INT);
    assert!(is_specialized_wait_handle(&wh));
    assert_eq!(wait_handle_inner(&wh), Type::INT);
    assert!(is_specialized_obj(&wh));
    // An object of the wait-handle class with no tracked inner type is not
    // a specialized wait handle.
    assert!(!is_specialized_wait_handle(&sub_obj(cls("Awaitable"))));
}

#[test]
fn sub_obj_collapses_to_exact_when_final() {
    let t = sub_obj(cls("Leaf"));
    assert_eq!(dobj_of(&t).kind, Bound::Exact);
    let t = sub_obj(cls("Base"));
    assert_eq!(dobj_of(&t).kind, Bound::Sub);
}

#[test]
fn objcls_projects_the_class_bound() {
    assert_eq!(objcls(&obj_exact(cls("Base"))), cls_exact(cls("Base")));
    assert_eq!(objcls(&sub_obj(cls("Base"))), sub_cls(cls("Base")));
    assert_eq!(objcls(&Type::OBJ), Type::CLS);
}

#[test]
fn tv_extracts_known_values() {
    assert_eq!(tv(&ival(7)), Some(Value::Int(7)));
    assert_eq!(tv(&Type::TRUE), Some(Value::Bool(true)));
    assert_eq!(tv(&Type::INT), None);
    assert_eq!(tv(&opt(ival(7))), None);

    // A fixed shape whose elements are all known is itself known.
    let t = sarr_packed(vec![ival(1), ival(2)]);
    let expected = sarr_const(
        ArrKind::Plain,
        vec![
            (ConstKey::Int(0), Value::Int(1)),
            (ConstKey::Int(1), Value::Int(2)),
        ],
    );
    assert_eq!(tv(&t), Some(Value::Arr(expected)));

    assert_eq!(tv(&sarr_packed(vec![ival(1), Type::INT])), None);
}

#[test]
fn scalarize_matches_from_cell_of_tv() {
    let cases = [
        ival(3),
        dval(2.5),
        sval(Str::intern("k")),
        Type::FALSE,
        aempty(),
        sarr_packed(vec![ival(1)]),
    ];
    for t in cases {
        assert!(is_scalar(&t), "{t:?}");
        let via_cell = from_cell(tv(&t).unwrap());
        assert_eq!(via_cell, scalarize(t.clone()), "{t:?}");
    }
}

#[test]
fn arr_size_comes_from_the_specialization() {
    assert_eq!(arr_size(&arr_packed(vec![Type::INT, Type::STR])), Some(2));
    assert_eq!(arr_size(&arr_packedn(Type::INT)), None);
    assert_eq!(arr_size(&Type::ARR_N), None);
}

#[test]
fn categorize_array_sees_key_structure() {
    let t = sarr_packed(vec![ival(1), ival(2)]);
    let cat = categorize_array(&t);
    assert_eq!(cat.cat, ArrayCatKind::Packed);
    assert!(cat.has_value);

    let mut m = MapElems::new();
    m.push(MapKey::Str(Str::intern("x")), ival(1));
    m.push(MapKey::Str(Str::intern("y")), Type::INT);
    let t = sarr_map(m);
    let cat = categorize_array(&t);
    assert_eq!(cat.cat, ArrayCatKind::Struct);
    assert!(!cat.has_value);
    assert_eq!(
        get_string_keys(&t),
        vec![Str::intern("x"), Str::intern("y")]
    );
}

#[test]
fn map_key_values_unions_both_sides() {
    let mut m = MapElems::new();
    m.push(MapKey::Int(3), Type::INT);
    m.push(MapKey::Str(Str::intern("x")), Type::DBL);
    let t = arr_map(m);
    match &t.data {
        Data::Map(dm) => {
            let (k, v) = map_key_values(dm);
            assert_eq!(k, Type::UNC_ARRKEY);
            assert_eq!(v, Type::NUM);
        }
        _ => panic!("expected a map payload"),
    }
}

#[test]
fn from_hni_constraint_names() {
    let t = |s: &str| from_hni_constraint(Some(Str::intern(s)));
    assert_eq!(t("int"), Type::INT);
    assert_eq!(t("?int"), Type::OPT_INT);
    assert_eq!(t("string"), Type::STR);
    assert_eq!(t("num"), Type::NUM);
    assert_eq!(t("varray_or_darray"), Type::ARR);
    assert_eq!(t("mixed"), Type::INIT_GEN);
    assert_eq!(t("SomeClass"), Type::GEN);
    assert_eq!(from_hni_constraint(None), Type::GEN);
}

#[test]
fn istype_operations_name_their_types() {
    assert_eq!(type_of_istype(IsTypeOp::Null), Type::NULL);
    assert_eq!(type_of_istype(IsTypeOp::Str), Type::STR);
    assert_eq!(type_of_istype(IsTypeOp::VArr), Type::VARR);
}

#[test]
fn from_data_kind_forgets_staticness() {
    use hazel_common::ValueKind;
    assert_eq!(from_data_kind(ValueKind::Str), Type::STR);
    assert_eq!(from_data_kind(ValueKind::Vec), Type::VEC);
    assert_eq!(from_data_kind(ValueKind::Uninit), Type::UNINIT);
}
