//! Integration tests for lowering programs to the block tree

use qdyn_core::{
    build, Block, BuildError, ClassicalTarget, Condition, Expr, GateKind, Operand, Program,
    RegisterLayout, Statement,
};
use std::f64::consts::PI;

fn registers(qregs: &[(&str, usize)], cregs: &[(&str, usize)]) -> RegisterLayout {
    let mut layout = RegisterLayout::new();
    for &(name, size) in qregs {
        layout.add_qreg(name, size).unwrap();
    }
    for &(name, size) in cregs {
        layout.add_creg(name, size).unwrap();
    }
    layout
}

fn op_kinds(blocks: &[Block]) -> Vec<GateKind> {
    let mut kinds = Vec::new();
    for block in blocks {
        block.for_each_op(&mut |op| kinds.push(op.kind()));
    }
    kinds
}

/// Repeat-until-success: retry `h; t; h` until the flag reads 0
fn rus_program() -> Program {
    let mut program = Program::new(registers(&[("anc", 1), ("q", 1)], &[("flag", 1), ("out", 1)]));
    let anc = || Operand::new("anc", 0);
    let flag = || Operand::new("flag", 0);
    let body = || {
        vec![
            Statement::gate("h", [anc()]),
            Statement::gate("t", [anc()]),
            Statement::gate("h", [anc()]),
            Statement::measure(anc(), flag()),
        ]
    };
    program.statements.extend(body());
    program
        .push(Statement::while_loop(
            Condition::bit(flag()),
            std::iter::once(Statement::gate("x", [anc()])).chain(body()).collect(),
        ))
        .push(Statement::gate("h", [Operand::new("q", 0)]))
        .push(Statement::measure(Operand::new("q", 0), Operand::new("out", 0)));
    program
}

#[test]
fn test_multiple_registers_flatten_in_order() {
    let mut program = Program::new(registers(&[("a", 2), ("b", 2)], &[]));
    program.push(Statement::gate("cx", [Operand::new("a", 1), Operand::new("b", 0)]));

    let blocks = build(&program).unwrap();
    let Block::Flat(flat) = &blocks[0] else {
        panic!("expected flat block");
    };
    assert_eq!(flat.ops()[0].qubits(), &[1, 2]);
}

#[test]
fn test_rotations_lower_to_clifford_t() {
    let mut program = Program::new(registers(&[("q", 1)], &[]));
    let q = || Operand::new("q", 0);
    program
        .push(Statement::rotation("rx", [Expr::Pi / Expr::Int(2)], [q()]))
        .push(Statement::rotation("ry", [-(Expr::Pi / Expr::Int(2))], [q()]))
        .push(Statement::rotation("rz", [Expr::Pi / Expr::Int(4)], [q()]))
        .push(Statement::rotation("p", [Expr::Float(-PI / 2.0)], [q()]))
        .push(Statement::gate("id", [q()]));

    let blocks = build(&program).unwrap();
    assert_eq!(
        op_kinds(&blocks),
        vec![
            GateKind::X2p,
            GateKind::X,
            GateKind::Y2p,
            GateKind::X,
            GateKind::T,
            GateKind::Sdg,
        ]
    );
}

#[test]
fn test_non_clifford_angle_rejected() {
    let mut program = Program::new(registers(&[("q", 1)], &[]));
    program.push(Statement::rotation(
        "rz",
        [Expr::Pi / Expr::Int(8)],
        [Operand::new("q", 0)],
    ));
    assert!(matches!(
        build(&program),
        Err(BuildError::UnsupportedAngle { .. })
    ));
}

#[test]
fn test_rus_structure() {
    let blocks = build(&rus_program()).unwrap();
    assert_eq!(blocks.len(), 3);

    let Block::Loop(lp) = &blocks[1] else {
        panic!("expected loop block, got {}", blocks[1]);
    };
    assert_eq!(lp.selector().clbits(), &[0]);
    assert_eq!(lp.expected(), 1);
    assert_eq!(lp.external_qubits().iter().copied().collect::<Vec<_>>(), vec![0]);
    assert_eq!(lp.internal_qubits().iter().copied().collect::<Vec<_>>(), vec![1]);

    let mut measures = Vec::new();
    for block in &blocks {
        block.for_each_op(&mut |op| {
            if op.is_measure() {
                measures.push((op.qubits()[0], op.clbits()[0], op.is_final()));
            }
        });
    }
    assert_eq!(measures, vec![(0, 0, false), (0, 0, false), (1, 1, true)]);
}

#[test]
fn test_trigger_reuse_rejected_at_build_time() {
    let mut program = Program::new(registers(&[("q", 1)], &[("c", 1)]));
    let q = || Operand::new("q", 0);
    let c = || Operand::new("c", 0);
    program.push(Statement::while_loop(
        Condition::bit(c()),
        vec![Statement::measure(q(), c()), Statement::gate("h", [q()])],
    ));
    assert_eq!(
        build(&program),
        Err(BuildError::TriggerOrder {
            op: "h".into(),
            qubits: vec![0]
        })
    );
}

#[test]
fn test_loop_without_flag_measurement_rejected() {
    let mut program = Program::new(registers(&[("q", 1)], &[("c", 2)]));
    program.push(Statement::while_loop(
        Condition::bit(Operand::new("c", 0)),
        vec![Statement::measure(Operand::new("q", 0), Operand::new("c", 1))],
    ));
    assert_eq!(build(&program), Err(BuildError::LoopWithoutTrigger(vec![0])));
}

#[test]
fn test_switch_cases_in_order() {
    let mut program = Program::new(registers(&[("q", 2)], &[("c", 2)]));
    program.push(Statement::Switch {
        target: ClassicalTarget::Register("c".into()),
        cases: vec![
            (3, vec![Statement::gate("x", [Operand::new("q", 0)])]),
            (1, vec![Statement::gate("z", [Operand::new("q", 1)])]),
        ],
        default: vec![Statement::gate("h", [Operand::new("q", 0)])],
    });

    let blocks = build(&program).unwrap();
    let Block::Branch(branch) = &blocks[0] else {
        panic!("expected branch block");
    };
    let values: Vec<u64> = branch.cases().iter().map(|(v, _)| *v).collect();
    assert_eq!(values, vec![3, 1]);
    assert_eq!(op_kinds(branch.dispatch(1)), vec![GateKind::Z]);
    assert_eq!(op_kinds(branch.dispatch(2)), vec![GateKind::H]);
}

#[test]
fn test_unknown_gate_and_register() {
    let mut program = Program::new(registers(&[("q", 1)], &[]));
    program.push(Statement::gate("u2", [Operand::new("q", 0)]));
    assert_eq!(
        build(&program),
        Err(BuildError::UnsupportedGate("u2".into()))
    );

    let mut program = Program::new(registers(&[("q", 1)], &[]));
    program.push(Statement::gate("x", [Operand::new("r", 0)]));
    assert_eq!(
        build(&program),
        Err(BuildError::UnknownRegister("r".into()))
    );
}

#[test]
fn test_for_loop_with_nested_branch() {
    let mut program = Program::new(registers(&[("q", 2)], &[("c", 2)]));
    let i = || Expr::var("i");
    program.push(Statement::for_range(
        "i",
        0,
        1,
        vec![
            Statement::gate("h", [Operand::new("q", i())]),
            Statement::measure(Operand::new("q", i()), Operand::new("c", i())),
            Statement::if_then(
                Condition::bit(Operand::new("c", i())),
                vec![Statement::gate("x", [Operand::new("q", i())])],
            ),
        ],
    ));

    let blocks = build(&program).unwrap();
    let shapes: Vec<&str> = blocks
        .iter()
        .map(|b| match b {
            Block::Flat(_) => "flat",
            Block::Branch(_) => "branch",
            Block::Loop(_) => "loop",
        })
        .collect();
    assert_eq!(shapes, vec!["flat", "branch", "flat", "branch"]);
}
