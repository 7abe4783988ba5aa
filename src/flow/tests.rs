//! Unit tests for the control-flow algebra.

use crate::{
    flow::{
        algebra::{
            branch_union, do_while_exit, filter_caught, loop_exit, sequence, switch_exit, try_catch,
            uncovered_exceptions, CatchClause,
        },
        status::{ControlFlow, FlowStatus, Jump},
    },
    hierarchy::class_graph::{ClassGraph, ClassId, ClassKind, ClassNode},
    Position,
};

struct Exceptions {
    graph: ClassGraph,
    exception: ClassId,
    io: ClassId,
    file_missing: ClassId,
    parse: ClassId,
    error: ClassId,
}

fn exceptions() -> Exceptions {
    let mut graph = ClassGraph::new();
    let exception = graph.add(ClassNode::stub("Exception", ClassKind::Class, Position::null()));
    let io = graph.add(ClassNode::stub("IOException", ClassKind::Class, Position::null()));
    let file_missing = graph.add(ClassNode::stub("FileMissing", ClassKind::Class, Position::null()));
    let parse = graph.add(ClassNode::stub("ParseException", ClassKind::Class, Position::null()));
    let error = graph.add(ClassNode::stub("Error", ClassKind::Class, Position::null()));
    graph.get_mut(io).extended = Some(exception);
    graph.get_mut(file_missing).extended = Some(io);
    graph.get_mut(parse).extended = Some(exception);
    graph.get_mut(error).is_unchecked = true;

    Exceptions {
        graph,
        exception,
        io,
        file_missing,
        parse,
        error,
    }
}

#[test]
fn test_sequence_keeps_jumps_visible() {
    let head = FlowStatus::new(ControlFlow::FALLS_THROUGH | ControlFlow::BREAKS);
    let tail = FlowStatus::falls_through();

    let result = sequence(head, tail);

    assert_eq!(result.flow, ControlFlow::FALLS_THROUGH | ControlFlow::BREAKS);
}

#[test]
fn test_sequence_after_termination_keeps_head() {
    let head = FlowStatus::terminates();
    let tail = FlowStatus::breaks();

    assert_eq!(sequence(head.clone(), tail), head);
}

#[test]
fn test_sequence_is_associative() {
    let statuses = [
        FlowStatus::falls_through(),
        FlowStatus::new(ControlFlow::FALLS_THROUGH | ControlFlow::CONTINUES),
        FlowStatus::terminates(),
        FlowStatus::new(ControlFlow::FALLS_THROUGH | ControlFlow::TERMINATES),
        FlowStatus::breaks(),
    ];

    for a in &statuses {
        for b in &statuses {
            for c in &statuses {
                let left = sequence(sequence(a.clone(), b.clone()), c.clone());
                let right = sequence(a.clone(), sequence(b.clone(), c.clone()));
                assert_eq!(left, right, "{:?} ; {:?} ; {:?}", a.flow, b.flow, c.flow);
            }
        }
    }
}

#[test]
fn test_sequence_unions_exceptions() {
    let e = exceptions();
    let head = FlowStatus::falls_through().with_raises([e.io]);
    let tail = FlowStatus::terminates().with_raises([e.parse]);

    let result = sequence(head, tail);

    assert_eq!(result.flow, ControlFlow::TERMINATES);
    assert_eq!(result.raises.into_iter().collect::<Vec<_>>(), vec![e.io, e.parse]);
}

#[test]
fn test_branch_union_is_commutative_and_idempotent() {
    let a = FlowStatus::terminates();
    let b = FlowStatus::falls_through();

    assert_eq!(branch_union([a.clone(), b.clone()]), branch_union([b.clone(), a.clone()]));
    assert_eq!(branch_union([a.clone(), a.clone()]), a);
    assert_eq!(
        branch_union([a, b]).flow,
        ControlFlow::FALLS_THROUGH | ControlFlow::TERMINATES
    );
}

#[test]
fn test_infinite_loop_with_break_exits() {
    let body = branch_union([FlowStatus::breaks(), FlowStatus::falls_through()]);

    let result = loop_exit(body, Some(true));

    assert!(result.can_fall_through());
    assert!(!result.can_break());
}

#[test]
fn test_infinite_loop_without_break_never_exits() {
    let result = loop_exit(FlowStatus::new(ControlFlow::FALLS_THROUGH | ControlFlow::CONTINUES), Some(true));
    assert_eq!(result.flow, ControlFlow::TERMINATES);

    let result = loop_exit(FlowStatus::terminates(), Some(true));
    assert_eq!(result.flow, ControlFlow::TERMINATES);
}

#[test]
fn test_loop_absorbs_continue_and_may_skip_body() {
    let result = loop_exit(FlowStatus::new(ControlFlow::CONTINUES | ControlFlow::TERMINATES), None);

    assert_eq!(result.flow, ControlFlow::FALLS_THROUGH | ControlFlow::TERMINATES);
}

#[test]
fn test_do_while_exit() {
    assert_eq!(
        do_while_exit(FlowStatus::terminates(), None).flow,
        ControlFlow::TERMINATES
    );
    assert_eq!(
        do_while_exit(FlowStatus::continues(), None).flow,
        ControlFlow::FALLS_THROUGH
    );
    assert_eq!(
        do_while_exit(FlowStatus::falls_through(), Some(true)).flow,
        ControlFlow::TERMINATES
    );
    assert_eq!(
        do_while_exit(FlowStatus::new(ControlFlow::BREAKS | ControlFlow::FALLS_THROUGH), Some(true)).flow,
        ControlFlow::FALLS_THROUGH
    );
}

#[test]
fn test_switch_with_returning_groups_terminates() {
    let groups = [FlowStatus::terminates(), FlowStatus::terminates()];

    assert_eq!(switch_exit(&groups, true).flow, ControlFlow::TERMINATES);
    assert_eq!(
        switch_exit(&groups, false).flow,
        ControlFlow::FALLS_THROUGH | ControlFlow::TERMINATES
    );
}

#[test]
fn test_switch_breaks_become_fall_through() {
    let groups = [FlowStatus::breaks(), FlowStatus::terminates()];

    let result = switch_exit(&groups, true);

    assert_eq!(result.flow, ControlFlow::FALLS_THROUGH | ControlFlow::TERMINATES);
}

#[test]
fn test_switch_continue_passes_through() {
    let groups = [FlowStatus::continues()];

    assert_eq!(switch_exit(&groups, true).flow, ControlFlow::CONTINUES);
}

#[test]
fn test_leveled_break_reaches_enclosing_loop() {
    // while (true) { switch (..) { case 1: break 2; } }
    let group = sequence(FlowStatus::falls_through(), FlowStatus::breaks_out(2));
    assert!(group.flow.is_empty());

    let switch = switch_exit(&[group], false);
    assert_eq!(switch.flow, ControlFlow::FALLS_THROUGH | ControlFlow::BREAKS);
    assert!(switch.jumps.is_empty());

    assert_eq!(loop_exit(switch, Some(true)).flow, ControlFlow::FALLS_THROUGH);
}

#[test]
fn test_leveled_jumps_count_down_per_construct() {
    let inner = loop_exit(FlowStatus::breaks_out(3), Some(true));
    assert!(inner.flow.is_empty());
    assert_eq!(inner.jumps.iter().copied().collect::<Vec<_>>(), vec![Jump::Break(2)]);

    let middle = do_while_exit(inner, None);
    assert_eq!(middle.flow, ControlFlow::BREAKS);

    let continued = loop_exit(FlowStatus::continues_out(2), Some(true));
    assert_eq!(continued.flow, ControlFlow::CONTINUES);
    assert_eq!(FlowStatus::breaks_out(1), FlowStatus::breaks());
}

#[test]
fn test_catch_filters_by_supertype() {
    let e = exceptions();
    let raises = [e.file_missing, e.parse].into_iter().collect();

    let remaining = filter_caught(&raises, &[e.io], &e.graph);

    assert_eq!(remaining.into_iter().collect::<Vec<_>>(), vec![e.parse]);
}

#[test]
fn test_try_catch_removes_caught_exceptions() {
    let e = exceptions();
    let try_body = FlowStatus::falls_through().with_raises([e.io]);
    let catches = [CatchClause {
        types: vec![e.io],
        body: FlowStatus::falls_through(),
    }];

    let result = try_catch(try_body, &catches, None, &e.graph);

    assert!(result.raises.is_empty());
    assert_eq!(result.flow, ControlFlow::FALLS_THROUGH);
}

#[test]
fn test_catch_bodies_add_their_exceptions() {
    let e = exceptions();
    let try_body = FlowStatus::terminates().with_raises([e.io]);
    let catches = [CatchClause {
        types: vec![e.exception],
        body: FlowStatus::terminates().with_raises([e.parse]),
    }];

    let result = try_catch(try_body, &catches, None, &e.graph);

    assert_eq!(result.raises.into_iter().collect::<Vec<_>>(), vec![e.parse]);
    assert_eq!(result.flow, ControlFlow::TERMINATES);
}

#[test]
fn test_terminating_finally_overrides() {
    let e = exceptions();
    let try_body = FlowStatus::falls_through().with_raises([e.io]);
    let finally = FlowStatus::terminates();

    let result = try_catch(try_body, &[], Some(finally.clone()), &e.graph);

    assert_eq!(result, finally);
}

#[test]
fn test_uncovered_exceptions() {
    let e = exceptions();
    let raises = [e.file_missing, e.parse, e.error].into_iter().collect();

    assert_eq!(uncovered_exceptions(&raises, &[e.io], &e.graph), vec![e.parse]);
    assert!(uncovered_exceptions(&raises, &[e.exception], &e.graph).is_empty());
}
