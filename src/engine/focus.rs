//! Focus resolution - directional navigation over the view tree.
//!
//! Focus is exclusive across the whole tree: at most one view holds it. A
//! container remembers which direct child last contained focus and prefers
//! it when asked for a default; directional queries run a two-phase
//! bottom-up search - a sibling scan inside the container whose axis
//! services the direction, then escalation through the ancestor chain when
//! the local container is exhausted or the direction does not apply to it.

use crate::types::{FocusDirection, Visibility};

use super::view::{FocusCallbacks, NavigationHook};
use super::{ViewId, ViewTree};

impl ViewTree {
    // =========================================================================
    // Focus state
    // =========================================================================

    /// The view currently holding focus, if any.
    pub fn focused(&self) -> Option<ViewId> {
        self.focused
    }

    pub fn is_focused(&self, id: ViewId) -> bool {
        self.focused == Some(id)
    }

    /// Recursively true when any descendant of a container holds focus.
    pub fn is_child_focused(&self, id: ViewId) -> bool {
        if let Some(container) = &self.view(id).container {
            for &child in &container.children {
                if self.focused == Some(child) {
                    return true;
                }
                if self.view(child).is_container() && self.is_child_focused(child) {
                    return true;
                }
            }
        }
        false
    }

    pub fn set_focus_callbacks(&mut self, id: ViewId, callbacks: FocusCallbacks) {
        self.view_mut(id).focus_callbacks = callbacks;
    }

    pub fn set_navigation_hook(&mut self, id: ViewId, hook: NavigationHook) {
        self.view_mut(id).container_mut().navigation_hook = Some(hook);
    }

    /// Remembered direct child that last contained focus.
    pub fn last_focused(&self, id: ViewId) -> Option<ViewId> {
        self.view(id).container().last_focused
    }

    pub fn set_last_focused(&mut self, id: ViewId, child: Option<ViewId>) {
        self.view_mut(id).container_mut().last_focused = child;
    }

    // =========================================================================
    // Default focus resolution
    // =========================================================================

    /// Resolve the view that should receive focus when `id` is asked to
    /// take it: self if focusable, else the remembered last-focused child's
    /// resolution, else the default-index child's, else the first child
    /// that resolves.
    pub fn default_focus(&self, id: ViewId) -> Option<ViewId> {
        let view = self.view(id);
        let self_focusable = view.focusable && view.visibility == Visibility::Visible;

        let Some(container) = &view.container else {
            return self_focusable.then_some(id);
        };

        if self_focusable {
            return Some(id);
        }

        if let Some(last) = container.last_focused {
            if let Some(focus) = self.default_focus(last) {
                return Some(focus);
            }
        }

        if let Some(&preferred) = container.children.get(container.default_focused_index) {
            if let Some(focus) = self.default_focus(preferred) {
                return Some(focus);
            }
        }

        container
            .children
            .iter()
            .find_map(|&child| self.default_focus(child))
    }

    // =========================================================================
    // Directional navigation
    // =========================================================================

    /// Resolve the next focus in `direction` starting from `current`, a
    /// direct child of the container `id`.
    ///
    /// A direction the container's axis does not service is delegated
    /// upward immediately; otherwise siblings are scanned from the current
    /// view's cached index, skipping any whose default-focus resolution is
    /// empty. Whatever the scan produces passes through the ancestor
    /// navigation-decision chain before falling back to the parent.
    pub fn next_focus(
        &self,
        id: ViewId,
        direction: FocusDirection,
        current: ViewId,
    ) -> Option<ViewId> {
        let container = self.view(id).container();

        if !direction.is_aligned(container.axis) {
            let mut next = self.parent_navigation_decision(id, id, None, direction);
            if next.is_none() {
                if let Some(parent) = self.view(id).parent {
                    next = self.next_focus(parent, direction, id);
                }
            }
            return next;
        }

        let offset = direction.offset();
        let mut index = self.view(current).index_in_parent as isize + offset;
        let mut candidate = None;

        while candidate.is_none() && index >= 0 && (index as usize) < container.children.len() {
            candidate = self.default_focus(container.children[index as usize]);
            index += offset;
        }

        candidate = self.parent_navigation_decision(id, id, candidate, direction);
        if candidate.is_none() {
            if let Some(parent) = self.view(id).parent {
                candidate = self.next_focus(parent, direction, id);
            }
        }
        candidate
    }

    /// Run the candidate through every ancestor's navigation hook, starting
    /// at `at` and always recursing to the real root, which passes it
    /// through unchanged.
    pub fn parent_navigation_decision(
        &self,
        at: ViewId,
        from: ViewId,
        candidate: Option<ViewId>,
        direction: FocusDirection,
    ) -> Option<ViewId> {
        let view = self.view(at);
        let mut candidate = candidate;
        if let Some(container) = &view.container {
            if let Some(hook) = &container.navigation_hook {
                candidate = hook(self, from, candidate, direction);
            }
        }
        match view.parent {
            Some(parent) => self.parent_navigation_decision(parent, from, candidate, direction),
            None => candidate,
        }
    }

    /// Resolve and apply one navigation step from the currently focused
    /// view. Returns the new focus when navigation succeeded.
    pub fn navigate(&mut self, direction: FocusDirection) -> Option<ViewId> {
        let current = self.focused?;
        let parent = self.view(current).parent?;
        let next = self.next_focus(parent, direction, current)?;
        if next != current {
            self.give_focus(next);
        }
        Some(next)
    }

    // =========================================================================
    // Focus transfer
    // =========================================================================

    /// Give focus to `id`'s default-focus resolution. Fires blur on the
    /// previous holder, focus on the new one, propagates parent-focus
    /// events through both subtrees and updates `last_focused` along the
    /// new holder's ancestor chain.
    pub fn give_focus(&mut self, id: ViewId) {
        let Some(new_focus) = self.default_focus(id) else {
            return;
        };
        if self.focused == Some(new_focus) {
            return;
        }

        if let Some(old_focus) = self.focused.take() {
            self.fire_focus_lost(old_focus);
        }

        self.focused = Some(new_focus);
        self.fire_focus_gained(new_focus);

        // Remember the path on every ancestor container.
        let mut child = new_focus;
        while let Some(parent) = self.view(child).parent {
            self.view_mut(parent).container_mut().last_focused = Some(child);
            child = parent;
        }
    }

    /// Drop focus entirely, firing blur on the current holder.
    pub fn clear_focus(&mut self) {
        if let Some(old_focus) = self.focused.take() {
            self.fire_focus_lost(old_focus);
        }
    }

    fn fire_focus_gained(&self, id: ViewId) {
        if let Some(on_focus) = &self.view(id).focus_callbacks.on_focus {
            on_focus();
        }
        self.propagate_parent_focus(id, true);
    }

    fn fire_focus_lost(&self, id: ViewId) {
        if let Some(on_blur) = &self.view(id).focus_callbacks.on_blur {
            on_blur();
        }
        self.propagate_parent_focus(id, false);
    }

    /// Deliver parent-focus events to every child of a container subtree,
    /// not just the focused one.
    fn propagate_parent_focus(&self, id: ViewId, gained: bool) {
        if let Some(container) = &self.view(id).container {
            for &child in &container.children {
                let callbacks = &self.view(child).focus_callbacks;
                let callback = if gained {
                    &callbacks.on_parent_focus
                } else {
                    &callbacks.on_parent_blur
                };
                if let Some(callback) = callback {
                    callback();
                }
                self.propagate_parent_focus(child, gained);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Axis;

    fn focusable(tree: &mut ViewTree) -> ViewId {
        let view = tree.create_view();
        tree.set_focusable(view, true);
        view
    }

    #[test]
    fn test_default_focus_empty_box() {
        let mut tree = ViewTree::new();
        let empty = tree.create_box(Axis::Row);
        assert_eq!(tree.default_focus(empty), None);
    }

    #[test]
    fn test_default_focus_finds_nested_descendant() {
        let mut tree = ViewTree::new();
        let root = tree.create_box(Axis::Column);
        let middle = tree.create_box(Axis::Row);
        let inner = tree.create_box(Axis::Row);
        let leaf = focusable(&mut tree);
        tree.add_view(root, middle);
        tree.add_view(middle, inner);
        tree.add_view(inner, leaf);

        assert_eq!(tree.default_focus(root), Some(leaf));
    }

    #[test]
    fn test_default_focus_prefers_self() {
        let mut tree = ViewTree::new();
        let root = tree.create_box(Axis::Row);
        tree.set_focusable(root, true);
        let child = focusable(&mut tree);
        tree.add_view(root, child);

        assert_eq!(tree.default_focus(root), Some(root));
    }

    #[test]
    fn test_default_focus_prefers_default_index() {
        let mut tree = ViewTree::new();
        let root = tree.create_box(Axis::Row);
        let first = focusable(&mut tree);
        let second = focusable(&mut tree);
        tree.add_view(root, first);
        tree.add_view(root, second);
        tree.set_default_focused_index(root, 1);

        assert_eq!(tree.default_focus(root), Some(second));
    }

    #[test]
    fn test_default_focus_prefers_last_focused() {
        let mut tree = ViewTree::new();
        let root = tree.create_box(Axis::Row);
        let first = focusable(&mut tree);
        let second = focusable(&mut tree);
        tree.add_view(root, first);
        tree.add_view(root, second);

        tree.give_focus(second);
        assert_eq!(tree.last_focused(root), Some(second));
        assert_eq!(tree.default_focus(root), Some(second));
    }

    #[test]
    fn test_invisible_views_are_not_focusable() {
        let mut tree = ViewTree::new();
        let root = tree.create_box(Axis::Row);
        let hidden = focusable(&mut tree);
        tree.set_visibility(hidden, crate::types::Visibility::Invisible);
        let shown = focusable(&mut tree);
        tree.add_view(root, hidden);
        tree.add_view(root, shown);

        assert_eq!(tree.default_focus(root), Some(shown));
    }

    #[test]
    fn test_next_focus_scans_siblings() {
        let mut tree = ViewTree::new();
        let row = tree.create_box(Axis::Row);
        let a = focusable(&mut tree);
        let b = focusable(&mut tree);
        let c = focusable(&mut tree);
        tree.add_view(row, a);
        tree.add_view(row, b);
        tree.add_view(row, c);

        assert_eq!(tree.next_focus(row, FocusDirection::Right, a), Some(b));
        assert_eq!(tree.next_focus(row, FocusDirection::Right, b), Some(c));
        assert_eq!(tree.next_focus(row, FocusDirection::Left, c), Some(b));
        assert_eq!(tree.next_focus(row, FocusDirection::Left, a), None);
        // Exhausting the row with no ancestor to handle it yields nothing.
        assert_eq!(tree.next_focus(row, FocusDirection::Right, c), None);
    }

    #[test]
    fn test_next_focus_skips_unfocusable_siblings() {
        let mut tree = ViewTree::new();
        let row = tree.create_box(Axis::Row);
        let a = focusable(&mut tree);
        let spacer = tree.create_view(); // resolves to nothing
        let b = focusable(&mut tree);
        tree.add_view(row, a);
        tree.add_view(row, spacer);
        tree.add_view(row, b);

        assert_eq!(tree.next_focus(row, FocusDirection::Right, a), Some(b));
        assert_eq!(tree.next_focus(row, FocusDirection::Left, b), Some(a));
    }

    #[test]
    fn test_misaligned_direction_delegates_to_parent() {
        // column [ row [a, b], row [c, d] ] - a grid.
        let mut tree = ViewTree::new();
        let column = tree.create_box(Axis::Column);
        let top = tree.create_box(Axis::Row);
        let bottom = tree.create_box(Axis::Row);
        let a = focusable(&mut tree);
        let b = focusable(&mut tree);
        let c = focusable(&mut tree);
        let d = focusable(&mut tree);
        tree.add_view(column, top);
        tree.add_view(column, bottom);
        tree.add_view(top, a);
        tree.add_view(top, b);
        tree.add_view(bottom, c);
        tree.add_view(bottom, d);

        // DOWN from a: the row cannot service it, the column scans to the
        // second row whose default focus is c.
        assert_eq!(tree.next_focus(top, FocusDirection::Down, a), Some(c));
        // UP from d: delegates to the column, lands on the first row.
        assert_eq!(tree.next_focus(bottom, FocusDirection::Up, d), Some(a));
        // UP from the top row escapes the whole tree.
        assert_eq!(tree.next_focus(top, FocusDirection::Up, a), None);
        // RIGHT from b: the row is exhausted and the column cannot service
        // LEFT/RIGHT either.
        assert_eq!(tree.next_focus(top, FocusDirection::Right, b), None);
    }

    #[test]
    fn test_navigation_hook_redirects() {
        let mut tree = ViewTree::new();
        let column = tree.create_box(Axis::Column);
        let row = tree.create_box(Axis::Row);
        let a = focusable(&mut tree);
        let target = focusable(&mut tree);
        tree.add_view(column, row);
        tree.add_view(column, target);
        tree.add_view(row, a);

        // The column intercepts RIGHT (which it cannot service) and wraps
        // it to its second child.
        tree.set_navigation_hook(
            column,
            Box::new(move |tree, _from, candidate, direction| {
                if direction == FocusDirection::Right && candidate.is_none() {
                    return tree.default_focus(target);
                }
                candidate
            }),
        );

        assert_eq!(tree.next_focus(row, FocusDirection::Right, a), Some(target));
    }

    #[test]
    fn test_give_focus_updates_last_focused_chain() {
        let mut tree = ViewTree::new();
        let root = tree.create_box(Axis::Column);
        let row = tree.create_box(Axis::Row);
        let leaf = focusable(&mut tree);
        tree.add_view(root, row);
        tree.add_view(row, leaf);

        tree.give_focus(root);

        assert_eq!(tree.focused(), Some(leaf));
        assert!(tree.is_focused(leaf));
        assert_eq!(tree.last_focused(row), Some(leaf));
        assert_eq!(tree.last_focused(root), Some(row));
        assert!(tree.is_child_focused(root));
        assert!(tree.is_child_focused(row));
    }

    #[test]
    fn test_focus_callbacks_fire() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut tree = ViewTree::new();
        let row = tree.create_box(Axis::Row);
        let a = focusable(&mut tree);
        let b = focusable(&mut tree);
        tree.add_view(row, a);
        tree.add_view(row, b);

        let focus_count = Rc::new(Cell::new(0));
        let blur_count = Rc::new(Cell::new(0));
        let f = focus_count.clone();
        let bl = blur_count.clone();
        tree.set_focus_callbacks(
            a,
            FocusCallbacks {
                on_focus: Some(Box::new(move || f.set(f.get() + 1))),
                on_blur: Some(Box::new(move || bl.set(bl.get() + 1))),
                ..Default::default()
            },
        );

        tree.give_focus(a);
        assert_eq!(focus_count.get(), 1);
        assert_eq!(blur_count.get(), 0);

        tree.give_focus(b);
        assert_eq!(focus_count.get(), 1);
        assert_eq!(blur_count.get(), 1);

        tree.give_focus(a);
        assert_eq!(focus_count.get(), 2);
    }

    #[test]
    fn test_parent_focus_events_reach_all_children() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut tree = ViewTree::new();
        let row = tree.create_box(Axis::Row);
        tree.set_focusable(row, true);
        let a = tree.create_view();
        let b = tree.create_view();
        tree.add_view(row, a);
        tree.add_view(row, b);

        let notified = Rc::new(Cell::new(0));
        for view in [a, b] {
            let n = notified.clone();
            tree.set_focus_callbacks(
                view,
                FocusCallbacks {
                    on_parent_focus: Some(Box::new(move || n.set(n.get() + 1))),
                    ..Default::default()
                },
            );
        }

        // The row is focusable itself, so it takes focus directly and both
        // children observe the gain.
        tree.give_focus(row);
        assert_eq!(notified.get(), 2);
    }

    #[test]
    fn test_navigate_moves_focus() {
        let mut tree = ViewTree::new();
        let row = tree.create_box(Axis::Row);
        let a = focusable(&mut tree);
        let b = focusable(&mut tree);
        tree.add_view(row, a);
        tree.add_view(row, b);
        tree.set_root(row);

        tree.give_focus(a);
        assert_eq!(tree.navigate(FocusDirection::Right), Some(b));
        assert_eq!(tree.focused(), Some(b));

        // Dead end: focus stays put.
        assert_eq!(tree.navigate(FocusDirection::Right), None);
        assert_eq!(tree.focused(), Some(b));
    }

    #[test]
    fn test_removing_focused_subtree_clears_focus() {
        let mut tree = ViewTree::new();
        let root = tree.create_box(Axis::Column);
        let row = tree.create_box(Axis::Row);
        let leaf = focusable(&mut tree);
        tree.add_view(root, row);
        tree.add_view(row, leaf);

        tree.give_focus(leaf);
        assert_eq!(tree.focused(), Some(leaf));
        assert_eq!(tree.last_focused(root), Some(row));

        tree.remove_view(root, row, false);
        assert_eq!(tree.focused(), None);
        assert_eq!(tree.last_focused(root), None);
    }
}
