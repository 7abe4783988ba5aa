//! Combinators over [`FlowStatus`]. All of them are pure; reporting
//! unreachable statements is left to the handlers.

use std::collections::BTreeSet;

use crate::hierarchy::class_graph::{ClassGraph, ClassId};

use super::status::{ControlFlow, FlowStatus, Jump};

/// A loop that can neither exit nor escape never completes; it is treated
/// like `exit`.
fn never_empty(mut status: FlowStatus) -> FlowStatus {
    if status.flow.is_empty() && status.jumps.is_empty() {
        status.flow = ControlFlow::TERMINATES;
    }
    status
}

/// Moves the jumps of a body out of one loop or switch. Jumps that reach
/// the enclosing construct turn into its `BREAKS`/`CONTINUES` flags.
fn leave_breakable(jumps: BTreeSet<Jump>) -> (ControlFlow, BTreeSet<Jump>) {
    let mut flow = ControlFlow::empty();
    let mut outer = BTreeSet::new();
    for jump in jumps {
        match jump {
            Jump::Break(2) => flow |= ControlFlow::BREAKS,
            Jump::Continue(2) => flow |= ControlFlow::CONTINUES,
            Jump::Break(level) => {
                outer.insert(Jump::Break(level - 1));
            }
            Jump::Continue(level) => {
                outer.insert(Jump::Continue(level - 1));
            }
        }
    }
    (flow, outer)
}

/// `a; b`. When `a` cannot fall through, `b` is unreachable and `a` is
/// returned unchanged.
pub fn sequence(a: FlowStatus, b: FlowStatus) -> FlowStatus {
    if !a.can_fall_through() {
        return a;
    }

    FlowStatus {
        flow: (a.flow - ControlFlow::FALLS_THROUGH) | b.flow,
        raises: &a.raises | &b.raises,
        jumps: &a.jumps | &b.jumps,
    }
}

/// Union of the branches that may be taken.
pub fn branch_union(branches: impl IntoIterator<Item = FlowStatus>) -> FlowStatus {
    let mut result = FlowStatus::new(ControlFlow::empty());
    for branch in branches {
        result.flow |= branch.flow;
        result.raises.extend(branch.raises);
        result.jumps.extend(branch.jumps);
    }
    never_empty(result)
}

/// Exit status of `while` and `for`. `condition` is the statically known
/// value of the loop condition, if any. A statically false condition is the
/// caller's business since the body is then never analyzed.
pub fn loop_exit(body: FlowStatus, condition: Option<bool>) -> FlowStatus {
    let (mut flow, jumps) = leave_breakable(body.jumps);
    flow |= body.flow & ControlFlow::TERMINATES;
    if condition != Some(true) || body.flow.contains(ControlFlow::BREAKS) {
        flow |= ControlFlow::FALLS_THROUGH;
    }

    never_empty(FlowStatus {
        flow,
        raises: body.raises,
        jumps,
    })
}

/// Exit status of `do ... while`. The condition is only evaluated when the
/// body falls through or continues.
pub fn do_while_exit(body: FlowStatus, condition: Option<bool>) -> FlowStatus {
    let condition_reachable = body.can_fall_through() || body.can_continue();

    let (mut flow, jumps) = leave_breakable(body.jumps);
    flow |= body.flow & ControlFlow::TERMINATES;
    if (condition_reachable && condition != Some(true)) || body.flow.contains(ControlFlow::BREAKS) {
        flow |= ControlFlow::FALLS_THROUGH;
    }

    never_empty(FlowStatus {
        flow,
        raises: body.raises,
        jumps,
    })
}

/// Exit status of `switch`, given the status of each case group in order.
/// A group that falls through runs into the next one, so only the last
/// group's fall-through leaves the switch. `break` leaves it too.
pub fn switch_exit(groups: &[FlowStatus], has_default: bool) -> FlowStatus {
    let mut result = FlowStatus::new(ControlFlow::empty());
    if !has_default {
        result.flow |= ControlFlow::FALLS_THROUGH;
    }

    for (index, group) in groups.iter().enumerate() {
        let is_last = index + 1 == groups.len();
        if group.can_break() || (is_last && group.can_fall_through()) {
            result.flow |= ControlFlow::FALLS_THROUGH;
        }
        result.flow |= group.flow & (ControlFlow::CONTINUES | ControlFlow::TERMINATES);
        result.raises.extend(group.raises.iter().copied());

        let (flow, jumps) = leave_breakable(group.jumps.clone());
        result.flow |= flow;
        result.jumps.extend(jumps);
    }

    if groups.is_empty() {
        result.flow |= ControlFlow::FALLS_THROUGH;
    }

    never_empty(result)
}

/// Removes the exceptions caught by a clause for any of `catch_types`. A
/// clause catches a raised kind when it names that kind or a supertype.
pub fn filter_caught(raises: &BTreeSet<ClassId>, catch_types: &[ClassId], classes: &ClassGraph) -> BTreeSet<ClassId> {
    raises
        .iter()
        .copied()
        .filter(|raised| !catch_types.iter().any(|caught| classes.is_subclass_of(*raised, *caught)))
        .collect()
}

/// One `catch` clause: the types it names and the status of its body.
#[derive(Debug, Clone)]
pub struct CatchClause {
    pub types: Vec<ClassId>,
    pub body: FlowStatus,
}

/// `try { .. } catch .. finally { .. }`. A `finally` that cannot fall
/// through decides the outcome on its own.
pub fn try_catch(
    try_body: FlowStatus,
    catches: &[CatchClause],
    finally: Option<FlowStatus>,
    classes: &ClassGraph,
) -> FlowStatus {
    let caught: Vec<ClassId> = catches.iter().flat_map(|clause| clause.types.iter().copied()).collect();

    let mut result = FlowStatus {
        flow: try_body.flow,
        raises: filter_caught(&try_body.raises, &caught, classes),
        jumps: try_body.jumps,
    };
    for clause in catches {
        result.flow |= clause.body.flow;
        result.raises.extend(clause.body.raises.iter().copied());
        result.jumps.extend(clause.body.jumps.iter().copied());
    }

    match finally {
        Some(finally) if !finally.can_fall_through() => finally,
        Some(finally) => {
            result.flow |= finally.flow - ControlFlow::FALLS_THROUGH;
            result.raises.extend(finally.raises);
            result.jumps.extend(finally.jumps);
            never_empty(result)
        }
        None => never_empty(result),
    }
}

/// Raised checked exceptions not covered by a `throws` list.
pub fn uncovered_exceptions(raises: &BTreeSet<ClassId>, throws: &[ClassId], classes: &ClassGraph) -> Vec<ClassId> {
    raises
        .iter()
        .copied()
        .filter(|raised| !classes.is_unchecked(*raised))
        .filter(|raised| !throws.iter().any(|declared| classes.is_subclass_of(*raised, *declared)))
        .collect()
}
