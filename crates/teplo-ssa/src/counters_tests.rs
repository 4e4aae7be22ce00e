use teplo_ir::{Arena, Function, NodeKind, Pos, PosTable};

use crate::counters::set_block_counters;
use crate::func::{SsaFunc, Value, ValueKind};

/// An annotated IR function with statements at lines 10 (hot) and 20 (cold).
fn annotated() -> (Arena, PosTable, Function) {
    let mut arena = Arena::new();
    let hot = arena.alloc(NodeKind::Return { results: vec![] }, Pos::line(10));
    let cold = arena.alloc(NodeKind::Return { results: vec![] }, Pos::line(20));
    let mut func = Function::new("pkg.f", vec![hot, cold], 1);
    func.counters.set(hot, 500);
    func.counters.set(cold, 3);
    (arena, PosTable::new(), func)
}

#[test]
fn block_counter_is_the_line_maximum() {
    let (arena, positions, ir) = annotated();
    let mut f = SsaFunc::new("pkg.f");
    f.add_block(vec![Value::plain(20), Value::plain(10)]);

    set_block_counters(&arena, &positions, &ir, &mut f);
    assert_eq!(f.blocks[0].counter, 500);
}

#[test]
fn unmatched_lines_leave_zero() {
    let (arena, positions, ir) = annotated();
    let mut f = SsaFunc::new("pkg.f");
    f.add_block(vec![Value::plain(99)]);

    set_block_counters(&arena, &positions, &ir, &mut f);
    assert_eq!(f.blocks[0].counter, 0);
}

#[test]
fn bounds_panic_pins_the_block_to_zero() {
    let (arena, positions, ir) = annotated();
    let mut f = SsaFunc::new("pkg.f");
    f.add_block(vec![
        Value::plain(10),
        Value { kind: ValueKind::PanicBounds, pos: Pos::line(10) },
    ]);

    set_block_counters(&arena, &positions, &ir, &mut f);
    assert_eq!(f.blocks[0].counter, 0);
}

#[test]
fn panic_helper_calls_pin_the_block_to_zero() {
    let (arena, positions, ir) = annotated();
    let mut f = SsaFunc::new("pkg.f");
    f.add_block(vec![Value::plain(10), Value::call("rt.panic_divide", 10)]);

    set_block_counters(&arena, &positions, &ir, &mut f);
    assert_eq!(f.blocks[0].counter, 0);
}

#[test]
fn unknown_helpers_count_as_normal_calls() {
    let (arena, positions, ir) = annotated();
    let mut f = SsaFunc::new("pkg.f");
    f.add_block(vec![Value::call("pkg.other", 10)]);

    set_block_counters(&arena, &positions, &ir, &mut f);
    assert_eq!(f.blocks[0].counter, 500);
}
