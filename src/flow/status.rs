use std::collections::BTreeSet;

use bitflags::bitflags;

use crate::hierarchy::class_graph::ClassId;

bitflags! {
    /// How control may leave a statement. A statement that cannot complete
    /// normally simply lacks `FALLS_THROUGH`. Empty only when every way out
    /// is a [`Jump`] past the innermost loop or switch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControlFlow: u8 {
        const FALLS_THROUGH = 0b0001;
        const CONTINUES = 0b0010;
        const BREAKS = 0b0100;
        /// `return`, `throw` and `exit`.
        const TERMINATES = 0b1000;
    }
}

/// `break N` or `continue N` aimed past the innermost loop or switch. The
/// level counts the constructs still to leave, so it is always at least 2;
/// once a single construct remains the jump becomes a plain flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Jump {
    Break(u32),
    Continue(u32),
}

/// Control-flow flags together with the checked exceptions that may escape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStatus {
    pub flow: ControlFlow,
    pub raises: BTreeSet<ClassId>,
    pub jumps: BTreeSet<Jump>,
}

impl Default for FlowStatus {
    fn default() -> Self {
        FlowStatus::new(ControlFlow::FALLS_THROUGH)
    }
}

impl FlowStatus {
    pub fn new(flow: ControlFlow) -> Self {
        FlowStatus {
            flow,
            raises: BTreeSet::new(),
            jumps: BTreeSet::new(),
        }
    }

    pub fn falls_through() -> Self {
        FlowStatus::new(ControlFlow::FALLS_THROUGH)
    }

    pub fn terminates() -> Self {
        FlowStatus::new(ControlFlow::TERMINATES)
    }

    pub fn breaks() -> Self {
        FlowStatus::new(ControlFlow::BREAKS)
    }

    pub fn continues() -> Self {
        FlowStatus::new(ControlFlow::CONTINUES)
    }

    /// `break level;` with `level` counted from the innermost construct.
    pub fn breaks_out(level: u32) -> Self {
        match level {
            0 | 1 => FlowStatus::breaks(),
            level => FlowStatus::jumping(Jump::Break(level)),
        }
    }

    /// `continue level;`
    pub fn continues_out(level: u32) -> Self {
        match level {
            0 | 1 => FlowStatus::continues(),
            level => FlowStatus::jumping(Jump::Continue(level)),
        }
    }

    fn jumping(jump: Jump) -> Self {
        let mut status = FlowStatus::new(ControlFlow::empty());
        status.jumps.insert(jump);
        status
    }

    pub fn with_raises(mut self, raises: impl IntoIterator<Item = ClassId>) -> Self {
        self.raises.extend(raises);
        self
    }

    pub fn can_fall_through(&self) -> bool {
        self.flow.contains(ControlFlow::FALLS_THROUGH)
    }

    pub fn can_break(&self) -> bool {
        self.flow.contains(ControlFlow::BREAKS)
    }

    pub fn can_continue(&self) -> bool {
        self.flow.contains(ControlFlow::CONTINUES)
    }

    pub fn can_terminate(&self) -> bool {
        self.flow.contains(ControlFlow::TERMINATES)
    }
}
