//! Unit tests for the inline corrector's region handling.
//!
//! Straight-line runs share one counter after propagation, so the tests park
//! distinguishable counters inside branch bodies, where branch heads keep
//! their own values.

use teplo_ir::{Function, NodeKind, Pos, Unit};

use crate::counters::load_counters;
use crate::inline::correct_profile_after_inline;
use crate::test_utils::*;

/// Marker never sampled: the region count falls back to the callee's entry
/// counter.
#[test]
fn marker_falls_back_to_callee_entry_counter() {
    let mut unit = Unit::new();
    let callee_stmt = {
        let arena = &mut unit.arena;
        let s = name(arena, "s");
        let one = lit(arena, "1");
        add_assign(arena, s, one, 44)
    };
    unit.add_func(Function::new("pkg.helper", vec![callee_stmt], 43));

    let mark_index = unit.inline_tree.push("pkg.helper");
    let arena = &mut unit.arena;
    let s = name(arena, "s");
    let one = lit(arena, "1");
    let marker = arena.alloc(NodeKind::InlineMark { index: mark_index }, Pos::line(9));
    let spliced = add_assign(arena, s, one, 44);
    let label = arena.alloc(NodeKind::Label { name: ".i0".into() }, Pos::line(9));
    let caller = unit.add_func(Function::new("pkg.f", vec![marker, spliced, label], 8));

    // Only the callee is sampled; line 9 never shows up.
    let prof = profile(vec![sample(70, &[("pkg.helper", 44)])]);
    let index = load_counters(&prof, &mut unit);

    assert_eq!(unit.func(caller).counters.get(marker), 0);
    correct_profile_after_inline(&index, &prof, &mut unit, caller);

    let counters = &unit.func(caller).counters;
    assert_eq!(counters.get(marker), 70);
    assert_eq!(counters.get(spliced), 70);
}

/// The end label restores the enclosing region, so statements after it are
/// seeded from the outer callee's tables again.
#[test]
fn nested_regions_restore_outer_tables() {
    let mut unit = Unit::new();

    // Outer callee: `if v { hot@30 } else { cold@32 }` keeps lines 30 and 32
    // at distinct counters in its propagated table.
    {
        let arena = &mut unit.arena;
        let v = name(arena, "v");
        let s = name(arena, "s");
        let one = lit(arena, "1");
        let hot = add_assign(arena, s, one, 30);
        let cold = add_assign(arena, s, one, 32);
        let branch = if_stmt(arena, v, vec![hot], vec![cold], 29);
        unit.add_func(Function::new("pkg.outer", vec![branch], 28));
    }
    // Inner callee: single statement at line 60.
    {
        let arena = &mut unit.arena;
        let t = name(arena, "t");
        let one = lit(arena, "1");
        let stmt = add_assign(arena, t, one, 60);
        unit.add_func(Function::new("pkg.inner", vec![stmt], 59));
    }

    let outer_index = unit.inline_tree.push("pkg.outer");
    let inner_index = unit.inline_tree.push("pkg.inner");

    let arena = &mut unit.arena;
    let v = name(arena, "v");
    let w = name(arena, "w");
    let s = name(arena, "s");
    let t = name(arena, "t");
    let one = lit(arena, "1");

    let outer_mark = arena.alloc(NodeKind::InlineMark { index: outer_index }, Pos::line(5));
    let copy_hot = add_assign(arena, s, one, 30);
    let copy_cold = add_assign(arena, s, one, 32);
    let copy_branch = if_stmt(arena, v, vec![copy_hot], vec![copy_cold], 29);
    let inner_mark = arena.alloc(NodeKind::InlineMark { index: inner_index }, Pos::line(31));
    let copy_inner = add_assign(arena, t, one, 60);
    let guard_inner = if_stmt(arena, w, vec![copy_inner], vec![], 59);
    let inner_label = arena.alloc(NodeKind::Label { name: ".i1".into() }, Pos::line(31));
    let copy_after = add_assign(arena, s, one, 32);
    let guard_after = if_stmt(arena, v, vec![copy_after], vec![], 29);
    let outer_label = arena.alloc(NodeKind::Label { name: ".i0".into() }, Pos::line(5));
    let caller = unit.add_func(Function::new(
        "pkg.f",
        vec![
            outer_mark,
            copy_branch,
            inner_mark,
            guard_inner,
            inner_label,
            guard_after,
            outer_label,
        ],
        4,
    ));

    let prof = profile(vec![
        sample(400, &[("pkg.outer", 29)]),
        sample(201, &[("pkg.outer", 30)]),
        sample(199, &[("pkg.outer", 32)]),
        sample(77, &[("pkg.inner", 60)]),
    ]);
    let index = load_counters(&prof, &mut unit);
    correct_profile_after_inline(&index, &prof, &mut unit, caller);

    let counters = &unit.func(caller).counters;
    assert_eq!(counters.get(copy_hot), 201);
    assert_eq!(counters.get(copy_cold), 199);
    assert_eq!(counters.get(copy_inner), 77);
    // Seeded from pkg.outer's line 32 again, not from pkg.inner.
    assert_eq!(counters.get(copy_after), 199);
}

/// A dangling marker nested inside a live region neither changes the seed
/// tables nor unwinds the enclosing region at its end label.
#[test]
fn dangling_marker_inside_a_region_keeps_the_outer_tables() {
    let mut unit = Unit::new();

    // Outer callee as in `nested_regions_restore_outer_tables`: lines 30
    // and 32 carry distinct counters.
    {
        let arena = &mut unit.arena;
        let v = name(arena, "v");
        let s = name(arena, "s");
        let one = lit(arena, "1");
        let hot = add_assign(arena, s, one, 30);
        let cold = add_assign(arena, s, one, 32);
        let branch = if_stmt(arena, v, vec![hot], vec![cold], 29);
        unit.add_func(Function::new("pkg.outer", vec![branch], 28));
    }

    let outer_index = unit.inline_tree.push("pkg.outer");
    // The inner marker's index resolves to nothing.
    let dangling_index = 99;

    let arena = &mut unit.arena;
    let v = name(arena, "v");
    let s = name(arena, "s");
    let one = lit(arena, "1");

    let outer_mark = arena.alloc(NodeKind::InlineMark { index: outer_index }, Pos::line(5));
    let copy_hot = add_assign(arena, s, one, 30);
    let copy_cold = add_assign(arena, s, one, 32);
    let copy_branch = if_stmt(arena, v, vec![copy_hot], vec![copy_cold], 29);
    let inner_mark = arena.alloc(
        NodeKind::InlineMark { index: dangling_index },
        Pos::line(31),
    );
    let copy_inside = add_assign(arena, s, one, 30);
    let guard_inside = if_stmt(arena, v, vec![copy_inside], vec![], 29);
    let inner_label = arena.alloc(NodeKind::Label { name: ".i1".into() }, Pos::line(31));
    let copy_after = add_assign(arena, s, one, 32);
    let guard_after = if_stmt(arena, v, vec![copy_after], vec![], 29);
    let outer_label = arena.alloc(NodeKind::Label { name: ".i0".into() }, Pos::line(5));
    let caller = unit.add_func(Function::new(
        "pkg.f",
        vec![
            outer_mark,
            copy_branch,
            inner_mark,
            guard_inside,
            inner_label,
            guard_after,
            outer_label,
        ],
        4,
    ));

    let prof = profile(vec![
        sample(200, &[("pkg.f", 5)]),
        sample(400, &[("pkg.outer", 29)]),
        sample(201, &[("pkg.outer", 30)]),
        sample(199, &[("pkg.outer", 32)]),
    ]);
    let index = load_counters(&prof, &mut unit);
    correct_profile_after_inline(&index, &prof, &mut unit, caller);

    let counters = &unit.func(caller).counters;
    assert_eq!(counters.get(copy_hot), 201);
    assert_eq!(counters.get(copy_cold), 199);
    // The dangling region keeps seeding from pkg.outer.
    assert_eq!(counters.get(copy_inside), 201);
    // Its `.i` label does not tear down the enclosing region: line 32 still
    // seeds from pkg.outer after it.
    assert_eq!(counters.get(copy_after), 199);
}

/// When the callee's propagated table has nothing for a line, seeding falls
/// back to its raw sample buckets.
#[test]
fn raw_buckets_seed_when_propagation_has_no_entry() {
    let mut unit = Unit::new();
    // The callee is known to the unit but its body was already consumed by
    // inlining, so its propagated table is empty.
    unit.add_func(Function::new("dep.helper", vec![], 87));
    let mark_index = unit.inline_tree.push("dep.helper");

    let arena = &mut unit.arena;
    let v = name(arena, "v");
    let s = name(arena, "s");
    let one = lit(arena, "1");
    let marker = arena.alloc(NodeKind::InlineMark { index: mark_index }, Pos::line(12));
    let spliced = add_assign(arena, s, one, 88);
    let guard = if_stmt(arena, v, vec![spliced], vec![], 88);
    let label = arena.alloc(NodeKind::Label { name: ".i0".into() }, Pos::line(12));
    let caller = unit.add_func(Function::new("pkg.f", vec![marker, guard, label], 11));

    let prof = profile(vec![
        sample(30, &[("pkg.f", 12)]),
        sample(25, &[("dep.helper", 88)]),
    ]);
    let index = load_counters(&prof, &mut unit);
    correct_profile_after_inline(&index, &prof, &mut unit, caller);

    assert_eq!(unit.func(caller).counters.get(spliced), 25);
}
