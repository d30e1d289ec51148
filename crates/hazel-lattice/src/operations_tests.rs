//! Tests for union, intersection, widening and the loss operators.

use hazel_common::Str;

use crate::test_index::cls;
use crate::*;

#[test]
fn union_of_literals_widens_to_their_kind() {
    assert_eq!(union_of(ival(1), ival(2)), Type::INT);
    assert_eq!(union_of(dval(1.0), dval(2.0)), Type::DBL);
    assert_eq!(
        union_of(sval(Str::intern("a")), sval(Str::intern("b"))),
        Type::SSTR
    );
    assert_eq!(union_of(ival(1), ival(1)), ival(1));
}

#[test]
fn union_walks_the_named_union_table() {
    assert_eq!(union_of(Type::INT, Type::DBL), Type::NUM);
    assert_eq!(union_of(Type::TRUE, Type::FALSE), Type::BOOL);
    assert_eq!(union_of(ival(1), sval(Str::intern("k"))), Type::UNC_ARRKEY);
    assert_eq!(union_of(Type::INT, Type::OBJ), Type::INIT_CELL);
    assert_eq!(union_of(Type::STR, Type::CLS), Type::TOP);
    assert_eq!(union_of(Type::INIT_CELL, Type::REF), Type::INIT_GEN);
}

#[test]
fn union_with_null_prefers_optional_forms() {
    assert_eq!(union_of(Type::INIT_NULL, Type::INT), Type::OPT_INT);
    assert_eq!(union_of(Type::INIT_NULL, ival(2)), opt(ival(2)));
    assert_eq!(union_of(Type::OPT_INT, Type::DBL), Type::OPT_NUM);
}

#[test]
fn intersection_refines_and_bottoms_out() {
    assert_eq!(intersection_of(ival(1), Type::INT), ival(1));
    assert_eq!(intersection_of(ival(1), ival(2)), Type::BOTTOM);
    assert_eq!(intersection_of(Type::INIT_UNC, Type::ARRKEY), Type::UNC_ARRKEY);
    assert_eq!(intersection_of(Type::INT, Type::STR), Type::BOTTOM);
    // Conflicting payloads keep the pattern's shell.
    assert_eq!(
        intersection_of(opt(ival(1)), opt(ival(2))),
        Type::INIT_NULL
    );
}

#[test]
fn object_union_uses_the_common_ancestor() {
    let a = sub_obj(cls("ChildA"));
    let b = sub_obj(cls("ChildB"));
    assert_eq!(union_of(a.clone(), b), sub_obj(cls("Base")));
    assert_eq!(union_of(a.clone(), sub_obj(cls("Lonely"))), Type::OBJ);
    assert_eq!(
        union_of(opt(a.clone()), sub_obj(cls("ChildB"))),
        opt(sub_obj(cls("Base")))
    );
    assert_eq!(
        union_of(sub_cls(cls("ChildA")), sub_cls(cls("ChildB"))),
        sub_cls(cls("Base"))
    );
}

#[test]
fn object_intersection_keeps_the_narrow_side() {
    let a = sub_obj(cls("ChildA"));
    let base = sub_obj(cls("Base"));
    assert_eq!(intersection_of(a.clone(), base.clone()), a);
    assert_eq!(intersection_of(base, a.clone()), a);
    assert_eq!(
        intersection_of(a, sub_obj(cls("ChildB"))),
        Type::BOTTOM
    );
}

#[test]
fn interface_bounds_meet_without_narrowing() {
    // An interface upper bound can overlap an unrelated class bound; the
    // meet keeps the class side rather than inventing a bound for the
    // overlap.
    let iface = sub_obj(cls("IFace"));
    let base = sub_obj(cls("Base"));
    assert!(iface.could_be(&base));
    assert_eq!(intersection_of(iface.clone(), base.clone()), base);
    assert_eq!(intersection_of(base.clone(), iface), base);
}

#[test]
fn wait_handle_union_merges_inner_types() {
    let wa = wait_handle(cls("Awaitable"), Type::INT);
    let wb = wait_handle(cls("Awaitable"), Type::DBL);
    let merged = union_of(wa.clone(), wb);
    assert!(is_specialized_wait_handle(&merged));
    assert_eq!(wait_handle_inner(&merged), Type::NUM);

    assert_eq!(
        union_of(wa.clone(), Type::INIT_NULL),
        opt(wait_handle(cls("Awaitable"), Type::INT))
    );
    let merged = union_of(opt(wa.clone()), wait_handle(cls("Awaitable"), Type::DBL));
    assert!(is_opt(&merged));
    assert_eq!(wait_handle_inner(&merged), Type::NUM);
}

#[test]
fn packed_unions_line_up_or_go_homogeneous() {
    let a = arr_packed(vec![Type::INT, Type::STR]);
    let b = arr_packed(vec![Type::DBL, Type::STR]);
    assert_eq!(union_of(a, b), arr_packed(vec![Type::NUM, Type::STR]));

    let a = arr_packed(vec![Type::INT]);
    let b = arr_packed(vec![Type::INT, Type::INT]);
    assert_eq!(union_of(a, b), arr_packedn(Type::INT));
}

#[test]
fn packed_map_union_goes_to_homogeneous_map() {
    let packed = arr_packed(vec![Type::DBL]);
    let mut m = MapElems::new();
    m.push(MapKey::Str(Str::intern("k")), Type::INT);
    let map = arr_map(m);
    let u = union_of(packed, map);
    // Key domain covers both the integer keys and the string key; values
    // cover both element types.
    let expect = arr_mapn(Type::UNC_ARRKEY, Type::NUM);
    assert_eq!(u, expect);
}

#[test]
fn specialized_union_with_empty_keeps_the_shape() {
    let v = vec(vec![ival(1)]);
    let u = union_of(v, vec_empty());
    assert!(is_specialized_vec(&u));
    assert!(Type::SVEC_E.subtype_of(&u));
    assert!(vec(vec![ival(1)]).subtype_of(&u));
}

#[test]
fn widen_type_is_a_supertype() {
    let cases = [
        ival(1),
        arr_packed(vec![Type::INT]),
        arr_packed(vec![arr_packed(vec![arr_packed(vec![Type::INT])])]),
        wait_handle(cls("Awaitable"), arr_packedn(Type::INT)),
        ref_to(arr_mapn(Type::INT, Type::INT)),
    ];
    for t in cases {
        assert!(t.subtype_of(&widen_type(t.clone())), "{t:?}");
    }
}

#[test]
fn widening_union_reaches_a_fixed_point() {
    // Modeled after `$a = [$a]` in a loop: each round nests the
    // accumulated type one level deeper. Plain unions would grow forever;
    // the widening union must stabilize once the nesting bound is hit.
    let mut acc = aempty();
    let mut last_change = 0;
    let mut prev = acc.clone();
    for i in 1..32 {
        acc = widening_union(&acc, &sarr_packed(vec![acc.clone()]));
        if acc != prev {
            last_change = i;
            prev = acc.clone();
        }
    }
    assert!(last_change <= 12, "still changing at round {last_change}");
    assert!(aempty().subtype_of(&acc));
}

#[test]
fn emptiness_classification() {
    assert_eq!(emptiness(&ival(0)), Emptiness::Empty);
    assert_eq!(emptiness(&ival(3)), Emptiness::NonEmpty);
    assert_eq!(emptiness(&Type::INT), Emptiness::Maybe);
    assert_eq!(emptiness(&Type::NULL), Emptiness::Empty);
    assert_eq!(emptiness(&Type::ARR_E), Emptiness::Empty);
    assert_eq!(emptiness(&Type::ARR_N), Emptiness::NonEmpty);
    assert_eq!(emptiness(&Type::ARR), Emptiness::Maybe);
    assert_eq!(emptiness(&sval(Str::EMPTY)), Emptiness::Empty);
    // An object without a boolean conversion hook is always truthy.
    assert_eq!(emptiness(&sub_obj(cls("ChildA"))), Emptiness::NonEmpty);
    assert_eq!(emptiness(&sub_obj(cls("BoolMagic"))), Emptiness::Maybe);
}

#[test]
fn loosen_staticness_forgets_counting() {
    assert_eq!(loosen_staticness(sval(Str::intern("x"))), Type::STR);
    assert_eq!(loosen_staticness(Type::SPARR_N), Type::PARR_N);
    assert_eq!(loosen_staticness(Type::SVEC), Type::VEC);
    assert_eq!(loosen_staticness(Type::INT), Type::INT);
}

#[test]
fn loosen_dvarrayness_merges_the_variants() {
    assert_eq!(loosen_dvarrayness(Type::SVARR_N), Type::SARR_N);
    assert_eq!(loosen_dvarrayness(Type::VEC), Type::VEC);
    // A variant-tagged constant is reified into its shape.
    let t = loosen_dvarrayness(aval(std::sync::Arc::new(hazel_common::ArrConst::new(
        hazel_common::ArrKind::VArray,
        vec![(hazel_common::ConstKey::Int(0), hazel_common::Value::Int(5))],
    ))));
    assert!(t.subtype_of(&Type::SARR_N));
    assert!(is_specialized_array(&t));
    assert_eq!(arr_size(&t), Some(1));
}

#[test]
fn loosen_values_keeps_class_information() {
    assert_eq!(loosen_values(ival(1)), Type::INT);
    assert_eq!(loosen_values(Type::TRUE), Type::BOOL);
    assert_eq!(loosen_values(arr_packed(vec![Type::INT])), Type::PARR_N);
    let o = sub_obj(cls("ChildA"));
    assert_eq!(loosen_values(o.clone()), o);
}

#[test]
fn loosen_emptiness_and_add_nonemptiness() {
    assert_eq!(loosen_emptiness(Type::SVEC_N), Type::SVEC);
    assert_eq!(add_nonemptiness(Type::SVEC_E), Type::SVEC);
    assert_eq!(add_nonemptiness(Type::SVEC_N), Type::SVEC_N);
}

#[test]
fn remove_uninit_steps_up_the_chain() {
    assert_eq!(remove_uninit(Type::UNINIT), Type::BOTTOM);
    assert_eq!(remove_uninit(Type::NULL), Type::INIT_NULL);
    assert_eq!(remove_uninit(Type::PRIM), Type::INIT_PRIM);
    assert_eq!(remove_uninit(Type::CELL), Type::INIT_CELL);
    assert_eq!(remove_uninit(Type::INT), Type::INT);
}

#[test]
fn truthiness_refinement() {
    assert_eq!(assert_emptiness(Type::BOOL), Type::FALSE);
    assert_eq!(assert_emptiness(Type::INT), ival(0));
    assert_eq!(assert_emptiness(Type::OPT_INT), opt(ival(0)));
    assert_eq!(assert_emptiness(Type::TRUE), Type::BOTTOM);
    assert_eq!(assert_emptiness(Type::ARR), Type::ARR_E);
    assert_eq!(assert_emptiness(opt(sub_obj(cls("ChildA")))), Type::INIT_NULL);

    assert_eq!(assert_nonemptiness(Type::BOOL), Type::TRUE);
    assert_eq!(assert_nonemptiness(Type::OPT_ARR), Type::ARR_N);
    assert_eq!(assert_nonemptiness(Type::NULL), Type::BOTTOM);
    assert_eq!(assert_nonemptiness(Type::CELL), Type::INIT_CELL);
}

#[test]
fn promote_emptyish_strips_the_empty_part() {
    assert_eq!(promote_emptyish(sempty(), Type::INT), Type::INT);
    assert_eq!(promote_emptyish(Type::NULL, Type::OBJ), Type::OBJ);
    assert_eq!(
        promote_emptyish(Type::OPT_BOOL, Type::OBJ),
        union_of(Type::TRUE, Type::OBJ)
    );
}

#[test]
fn stack_flavors() {
    assert_eq!(stack_flav(&Type::UNINIT), Type::UNINIT);
    assert_eq!(stack_flav(&ival(1)), Type::INIT_CELL);
    assert_eq!(stack_flav(&Type::REF), Type::REF);
    assert_eq!(stack_flav(&Type::CLS), Type::CLS);
    assert_eq!(stack_flav(&Type::GEN), Type::GEN);
}

#[test]
fn magic_bool_awareness() {
    assert!(!could_have_magic_bool_conversion(&Type::INT));
    assert!(could_have_magic_bool_conversion(&Type::OBJ));
    assert!(!could_have_magic_bool_conversion(&sub_obj(cls("ChildA"))));
    assert!(could_have_magic_bool_conversion(&sub_obj(cls("BoolMagic"))));
}
