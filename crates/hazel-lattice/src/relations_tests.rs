//! Tests for subtype, could-be and equality.

use std::sync::Arc;

use hazel_common::{ArrConst, ArrKind, ConstKey, Str, Value};

use crate::test_index::cls;
use crate::*;

#[test]
fn subtype_on_bits_is_subset() {
    assert!(Type::INT.subtype_of(&Type::NUM));
    assert!(Type::NUM.subtype_of(&Type::INIT_PRIM));
    assert!(!Type::NUM.subtype_of(&Type::INT));
    assert!(Type::BOTTOM.subtype_of(&Type::INT));
    assert!(Type::CLS.subtype_of(&Type::TOP));
    assert!(!Type::CLS.subtype_of(&Type::GEN));
}

#[test]
fn literals_are_strict_subtypes_of_their_kind() {
    assert!(ival(1).strict_subtype_of(&Type::INT));
    assert!(dval(0.5).strict_subtype_of(&Type::DBL));
    assert!(sval(Str::intern("s")).strict_subtype_of(&Type::SSTR));
    assert!(!ival(1).subtype_of(&ival(2)));
    assert!(ival(1).subtype_of(&ival(1)));
}

#[test]
fn double_literal_identity() {
    assert_eq!(dval(f64::NAN), dval(f64::NAN));
    assert_ne!(dval(0.0), dval(-0.0));
    assert!(dval(f64::NAN).subtype_of(&dval(f64::NAN)));
}

#[test]
fn fixed_packed_within_homogeneous_packed() {
    // A tuple of known element types fits any homogeneous bound covering
    // them; the reverse direction loses length information.
    let fixed = arr_packed(vec![Type::INT, Type::STR]);
    let homo = arr_packedn(Type::ARRKEY);
    assert!(fixed.subtype_of(&homo));
    assert!(!arr_packedn(Type::INT).subtype_of(&arr_packed(vec![Type::INT])));
}

#[test]
fn packed_and_map_shapes_are_disjoint() {
    let packed = arr_packed(vec![Type::INT]);
    let mut m = MapElems::new();
    m.push(MapKey::Str(Str::intern("k")), Type::INT);
    let map = arr_map(m);
    assert!(!packed.subtype_of(&map));
    assert!(!map.subtype_of(&packed));
    assert!(!packed.could_be(&map));
}

#[test]
fn shapes_relate_to_homogeneous_maps() {
    let packed = arr_packed(vec![Type::INT]);
    let mapn_int = arr_mapn(Type::ARRKEY, Type::INT);
    assert!(packed.subtype_of(&mapn_int));

    let mapn_str_keys = arr_mapn(Type::STR, Type::INT);
    assert!(!packed.subtype_of(&mapn_str_keys));
    assert!(!packed.could_be(&mapn_str_keys));
}

#[test]
fn constants_relate_through_their_shape() {
    let a: hazel_common::ArrConstRef = Arc::new(ArrConst::new(
        ArrKind::Plain,
        vec![
            (ConstKey::Int(0), Value::Int(1)),
            (ConstKey::Int(1), Value::Int(2)),
        ],
    ));
    let t = aval(a);
    assert!(t.subtype_of(&sarr_packedn(Type::INT)));
    assert!(t.subtype_of(&sarr_packed(vec![ival(1), ival(2)])));
    assert!(!t.subtype_of(&sarr_packed(vec![ival(1), ival(3)])));

    // Equal content in shape form and constant form is the same type.
    assert_eq!(t, sarr_packed(vec![ival(1), ival(2)]));
}

#[test]
fn object_bounds_follow_the_class_index() {
    let sub_a = sub_obj(cls("ChildA"));
    let sub_b = sub_obj(cls("ChildB"));
    let base = sub_obj(cls("Base"));
    let leaf = obj_exact(cls("Leaf"));

    assert!(sub_a.subtype_of(&base));
    assert!(!base.subtype_of(&sub_a));
    assert!(leaf.subtype_of(&sub_a));
    assert!(!sub_a.could_be(&sub_b));
    assert!(sub_a.could_be(&base));
    assert!(sub_a.subtype_of(&Type::OBJ));
}

#[test]
fn class_pointers_follow_the_class_index() {
    let a = sub_cls(cls("ChildA"));
    let base = sub_cls(cls("Base"));
    assert!(a.subtype_of(&base));
    assert!(!base.subtype_of(&a));
    assert!(cls_exact(cls("Base")).subtype_of(&base));
}

#[test]
fn wait_handle_inner_participates_in_subtype() {
    let wh_int = wait_handle(cls("Awaitable"), Type::INT);
    let wh_num = wait_handle(cls("Awaitable"), Type::NUM);
    let plain = sub_obj(cls("Awaitable"));

    assert!(wh_int.subtype_of(&wh_num));
    assert!(!wh_num.subtype_of(&wh_int));
    // No tracked inner type on the right is more general; on the left it
    // is not.
    assert!(wh_int.subtype_of(&plain));
    assert!(!plain.subtype_of(&wh_int));
    assert!(wh_int.could_be(&wh_num));
}

#[test]
fn references_compare_by_inner_type() {
    let r_int = ref_to(Type::INT);
    let r_num = ref_to(Type::NUM);
    assert!(r_int.subtype_of(&r_num));
    assert!(!r_num.subtype_of(&r_int));
    assert!(r_int.could_be(&r_num));
    assert!(!r_int.could_be(&ref_to(Type::STR)));
}

#[test]
fn could_be_is_not_transitive() {
    let one = ival(1);
    let two = ival(2);
    assert!(one.could_be(&Type::INT));
    assert!(Type::INT.could_be(&two));
    assert!(!one.could_be(&two));
}

#[test]
fn could_be_needs_a_shared_cell() {
    assert!(!Type::INT.could_be(&Type::STR));
    assert!(Type::OPT_INT.could_be(&Type::OPT_STR)); // both admit null
    assert!(Type::ARR_E.could_be(&Type::ARR));
    assert!(!Type::BOTTOM.could_be(&Type::TOP));
}

#[test]
fn payloadless_patterns_absorb_payloads() {
    // No payload is always more general...
    assert!(ival(1).subtype_of(&Type::INT));
    // ...but a payload-less type only fits under a payload if its pattern
    // cannot carry data at all.
    assert!(!Type::INT.subtype_of(&ival(1)));
    assert!(Type::SPARR_E.subtype_of(&Type::SPARR));
}
