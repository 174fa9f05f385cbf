//! Pointer drag-to-reorder for one list.
//!
//! While a drag is in progress the dragged node is moved live inside the
//! view; nothing else is touched until the drop. The drop yields a
//! [`DragCommit`] carrying the index the row started at and the index it
//! ended at, which the caller pushes into the store and the backend.

use thiserror::Error;

use crate::view::{NodeId, ViewError, ViewTree};

/// Class carried by the node being dragged.
pub const DRAGGING_CLASS: &str = "dragging";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging {
        node: NodeId,
        previous_index: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragCommit {
    pub node: NodeId,
    pub previous_index: usize,
    pub new_index: usize,
}

impl DragCommit {
    pub fn is_noop(&self) -> bool {
        self.previous_index == self.new_index
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DragError {
    #[error("a drag of {active:?} is already in progress")]
    AlreadyDragging { active: NodeId },
    #[error("{0:?} is not a row of this list")]
    NotInList(NodeId),
    #[error(transparent)]
    View(#[from] ViewError),
}

#[derive(Debug, Clone)]
pub struct DragController {
    list: NodeId,
    state: DragState,
}

impl DragController {
    pub fn new(list: NodeId) -> Self {
        Self {
            list,
            state: DragState::Idle,
        }
    }

    pub fn list(&self) -> NodeId {
        self.list
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn dragged(&self) -> Option<NodeId> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { node, .. } => Some(node),
        }
    }

    pub fn start<A>(&mut self, tree: &mut ViewTree<A>, node: NodeId) -> Result<(), DragError> {
        if let DragState::Dragging { node: active, .. } = self.state {
            return Err(DragError::AlreadyDragging { active });
        }
        if tree.parent(node) != Some(self.list) {
            return Err(DragError::NotInList(node));
        }

        tree.add_class(node, DRAGGING_CLASS)?;
        self.state = DragState::Dragging {
            node,
            previous_index: tree.sibling_index(node),
        };
        Ok(())
    }

    /// Pointer moved over the list at vertical position `pointer_y`.
    pub fn over<A>(&mut self, tree: &mut ViewTree<A>, pointer_y: f32) -> Result<(), DragError> {
        let DragState::Dragging { node, .. } = self.state else {
            return Ok(());
        };
        let before = drop_target(tree, self.list, node, pointer_y);
        tree.insert_before(self.list, node, before)?;
        tree.layout_column(self.list)?;
        Ok(())
    }

    /// Finish the gesture. `None` when there is nothing to commit.
    pub fn end<A>(&mut self, tree: &mut ViewTree<A>) -> Result<Option<DragCommit>, DragError> {
        let DragState::Dragging {
            node,
            previous_index,
        } = std::mem::replace(&mut self.state, DragState::Idle)
        else {
            return Ok(None);
        };
        if !tree.contains(node) {
            return Ok(None);
        }
        tree.remove_class(node, DRAGGING_CLASS)?;

        let (Some(previous_index), Some(new_index)) = (previous_index, tree.sibling_index(node))
        else {
            return Ok(None);
        };
        Ok(Some(DragCommit {
            node,
            previous_index,
            new_index,
        }))
    }

    /// Forget the current gesture without committing, e.g. when the dragged
    /// row disappears underneath it.
    pub fn abandon<A>(&mut self, tree: &mut ViewTree<A>) {
        if let DragState::Dragging { node, .. } = std::mem::replace(&mut self.state, DragState::Idle)
        {
            let _ = tree.remove_class(node, DRAGGING_CLASS);
        }
    }
}

/// The draggable sibling the dragged node should sit right before: the first
/// one whose vertical midpoint the pointer has not yet passed. `None` means
/// the end of the list.
pub fn drop_target<A>(
    tree: &ViewTree<A>,
    list: NodeId,
    dragged: NodeId,
    pointer_y: f32,
) -> Option<NodeId> {
    let mut closest: Option<(f32, NodeId)> = None;
    for sibling in tree.children(list) {
        if *sibling == dragged || !tree.is_draggable(*sibling) {
            continue;
        }
        let Some(bounds) = tree.bounds(*sibling) else {
            continue;
        };
        let offset = pointer_y - bounds.midpoint();
        if offset < 0.0 && closest.is_none_or(|(best, _)| offset > best) {
            closest = Some((offset, *sibling));
        }
    }
    closest.map(|(_, node)| node)
}
