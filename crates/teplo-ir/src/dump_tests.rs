use crate::dump::dump_func;
use crate::func::Function;
use crate::node::{Arena, BinOp, NodeKind};
use crate::pos::Pos;

#[test]
fn dump_shows_counters_and_structure() {
    let mut arena = Arena::new();
    let n = arena.alloc(NodeKind::Name { ident: "n".into() }, Pos::line(0));
    let nil = arena.alloc(NodeKind::Lit { repr: "nil".into() }, Pos::line(0));
    let cond = arena.alloc(
        NodeKind::Binary { op: BinOp::Eq, lhs: n, rhs: nil },
        Pos::line(2),
    );
    let ret = arena.alloc(NodeKind::Return { results: vec![] }, Pos::line(3));
    let if_node = arena.alloc(
        NodeKind::If { cond, body: vec![ret], else_: vec![] },
        Pos::line(2),
    );

    let mut func = Function::new("pkg.testIf1", vec![if_node], 1);
    func.counters.set(if_node, 5);
    func.counters.set(cond, 5);
    func.counters.set(ret, 5);

    insta::assert_snapshot!(dump_func(&arena, &func), @r"
    func pkg.testIf1 line 1
      5 IF:2
        5 BINOP:2
          . NAME n
          . LIT nil
        5 RETURN:3
    ");
}
