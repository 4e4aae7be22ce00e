use crate::func::{Function, Unit};
use crate::node::{visit_list, Arena, BinOp, Child, NodeKind, Op};
use crate::pos::{Pos, PosTable};
use crate::is_inline_end_label;

fn sample_arena() -> (Arena, Vec<crate::NodeId>) {
    let mut arena = Arena::new();
    let n = arena.alloc(NodeKind::Name { ident: "n".into() }, Pos::line(0));
    let zero = arena.alloc(NodeKind::Lit { repr: "0".into() }, Pos::line(0));
    let cond = arena.alloc(
        NodeKind::Binary { op: BinOp::Eq, lhs: n, rhs: zero },
        Pos::line(2),
    );
    let ret = arena.alloc(NodeKind::Return { results: vec![] }, Pos::line(3));
    let incr = arena.alloc(
        NodeKind::OpAssign { op: BinOp::Add, lhs: n, rhs: zero },
        Pos::line(5),
    );
    let if_node = arena.alloc(
        NodeKind::If { cond, body: vec![ret], else_: vec![] },
        Pos::line(2),
    );
    (arena, vec![if_node, incr])
}

#[test]
fn visit_reaches_every_node_in_source_order() {
    let (arena, body) = sample_arena();
    let mut ops = Vec::new();
    visit_list(&arena, &body, &mut |id| ops.push(arena.op(id)));
    assert_eq!(
        ops,
        vec![Op::If, Op::Binary, Op::Name, Op::Lit, Op::Return, Op::OpAssign, Op::Name, Op::Lit]
    );
}

#[test]
fn shared_leaves_are_visited_per_occurrence() {
    let (arena, body) = sample_arena();
    let mut names = 0;
    visit_list(&arena, &body, &mut |id| {
        if arena.kind(id).is_shareable_leaf() && matches!(arena.op(id), Op::Name) {
            names += 1;
        }
    });
    // `n` is one arena node referenced from the condition and the increment.
    assert_eq!(names, 2);
}

#[test]
fn children_cover_all_fields() {
    let mut arena = Arena::new();
    let a = arena.alloc(NodeKind::Name { ident: "a".into() }, Pos::line(0));
    let body_stmt = arena.alloc(NodeKind::Return { results: vec![] }, Pos::line(8));
    let for_node = arena.alloc(
        NodeKind::For {
            init: Some(a),
            cond: Some(a),
            body: vec![body_stmt],
            post: None,
        },
        Pos::line(7),
    );
    let children = arena.kind(for_node).children();
    assert_eq!(children.len(), 3);
    assert!(matches!(children[2], Child::List(list) if list == [body_stmt]));
}

#[test]
fn leaves_have_no_children() {
    let mut arena = Arena::new();
    let lit = arena.alloc(NodeKind::Lit { repr: "1".into() }, Pos::line(0));
    let mark = arena.alloc(NodeKind::InlineMark { index: 0 }, Pos::line(4));
    assert!(arena.kind(lit).children().is_empty());
    assert!(arena.kind(mark).children().is_empty());
}

#[test]
fn inline_end_label_predicate() {
    assert!(is_inline_end_label(".i3"));
    assert!(!is_inline_end_label("loop_top"));
    assert!(!is_inline_end_label("i3"));
}

#[test]
fn counters_by_line_keeps_the_maximum() {
    let mut unit = Unit::new();
    let a = unit.arena.alloc(
        NodeKind::Label { name: "top".into() },
        Pos::line(4),
    );
    let b = unit.arena.alloc(NodeKind::Return { results: vec![] }, Pos::line(4));
    let mut func = Function::new("pkg.f", vec![a, b], 1);
    func.counters.set(a, 3);
    func.counters.set(b, 11);
    let by_line = func.counters_by_line(&unit.arena, &unit.positions);
    assert_eq!(by_line.get(&4), Some(&11));
}

#[test]
fn counters_by_line_applies_directives() {
    let mut arena = Arena::new();
    let mut positions = PosTable::new();
    positions.push_directive(0, 10, 1, 100);
    let stmt = arena.alloc(NodeKind::Return { results: vec![] }, Pos::line(12));
    let mut func = Function::new("pkg.f", vec![stmt], 1);
    func.counters.set(stmt, 5);
    let by_line = func.counters_by_line(&arena, &positions);
    assert_eq!(by_line.get(&102), Some(&5));
    assert_eq!(by_line.get(&12), None);
}

#[test]
fn unit_lookup_by_link_name() {
    let mut unit = Unit::new();
    let f = unit.add_func(Function::new("pkg.alpha", vec![], 1));
    let g = unit.add_func(Function::new("pkg.beta", vec![], 10));
    assert_eq!(unit.by_link_name("pkg.alpha"), Some(f));
    assert_eq!(unit.by_link_name("pkg.beta"), Some(g));
    assert_eq!(unit.by_link_name("pkg.gamma"), None);
}
