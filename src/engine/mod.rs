//! Engine module - the retained view tree.
//!
//! The tree is a slot arena: views live in recycled slots addressed by
//! [`ViewId`] handles, the way a component registry allocates indices from a
//! free pool. Parent links are non-owning handles and every child carries an
//! explicit index cache that the insert/remove operations keep in sync.
//!
//! Mutations mirror themselves into the persistent taffy tree (restricted to
//! non-detached views, in sibling order) and mark layout dirty; a frame tick
//! asks the root node to recompute geometry.

mod view;

pub mod focus;

pub use view::{Container, DrawFn, FocusCallbacks, LifecycleFn, NavigationHook, View, ViewId};

use taffy::{AvailableSpace, Display, Size, Style, TaffyTree, TraversePartialTree};

use crate::layout::{
    lp, lpa, to_taffy_align_items, to_taffy_dimension, to_taffy_flex_direction,
    to_taffy_justify_content,
};
use crate::render::{Canvas, FrameContext};
use crate::types::{
    AlignItems, Axis, Dimension, Direction, JustifyContent, Ownership, Point, Rect, Visibility,
};

// =============================================================================
// ViewTree
// =============================================================================

/// Arena owning every view and the taffy tree that mirrors it.
pub struct ViewTree {
    slots: Vec<Option<View>>,
    free: Vec<usize>,
    pub(crate) taffy: TaffyTree<()>,
    root: Option<ViewId>,
    pub(crate) focused: Option<ViewId>,
    dirty: bool,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            taffy: TaffyTree::new(),
            root: None,
            focused: None,
            dirty: false,
        }
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Create a plain (leaf) view.
    pub fn create_view(&mut self) -> ViewId {
        let node = self
            .taffy
            .new_leaf(Style::default())
            .expect("taffy node allocation failed");
        self.alloc(View::new(node, None))
    }

    /// Create a container view with the given main axis.
    pub fn create_box(&mut self, axis: Axis) -> ViewId {
        let style = Style {
            flex_direction: to_taffy_flex_direction(axis, Direction::Inherit),
            ..Default::default()
        };
        let node = self
            .taffy
            .new_leaf(style)
            .expect("taffy node allocation failed");
        self.alloc(View::new(node, Some(Container::new(axis))))
    }

    fn alloc(&mut self, view: View) -> ViewId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(view);
                ViewId(index)
            }
            None => {
                self.slots.push(Some(view));
                ViewId(self.slots.len() - 1)
            }
        }
    }

    /// Whether the handle still points at a live view.
    pub fn is_allocated(&self, id: ViewId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    pub(crate) fn view(&self, id: ViewId) -> &View {
        self.slots
            .get(id.0)
            .and_then(|slot| slot.as_ref())
            .unwrap_or_else(|| panic!("stale view handle #{}", id.0))
    }

    pub(crate) fn view_mut(&mut self, id: ViewId) -> &mut View {
        self.slots
            .get_mut(id.0)
            .and_then(|slot| slot.as_mut())
            .unwrap_or_else(|| panic!("stale view handle #{}", id.0))
    }

    pub(crate) fn describe(&self, id: ViewId) -> String {
        format!("{}#{}", self.view(id).describe(), id.0)
    }

    // =========================================================================
    // Root & lookup
    // =========================================================================

    pub fn set_root(&mut self, id: ViewId) {
        self.view(id); // validate
        self.root = Some(id);
        self.dirty = true;
    }

    pub fn root(&self) -> Option<ViewId> {
        self.root
    }

    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.view(id).parent
    }

    pub fn is_container(&self, id: ViewId) -> bool {
        self.view(id).is_container()
    }

    /// Cached position of a view inside its parent's child sequence.
    pub fn index_in_parent(&self, id: ViewId) -> usize {
        self.view(id).index_in_parent
    }

    /// Ordered children of a container.
    pub fn children(&self, id: ViewId) -> &[ViewId] {
        &self.view(id).container().children
    }

    pub fn child_count(&self, id: ViewId) -> usize {
        self.view(id).container().children.len()
    }

    /// Recursive lookup of a view by string id, starting at `from`.
    pub fn get_view(&self, from: ViewId, id: &str) -> Option<ViewId> {
        let view = self.view(from);
        if view.id.as_deref() == Some(id) {
            return Some(from);
        }
        if let Some(container) = &view.container {
            for &child in &container.children {
                if let Some(found) = self.get_view(child, id) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Whether `ancestor` appears on `id`'s parent chain.
    pub(crate) fn is_ancestor(&self, ancestor: ViewId, id: ViewId) -> bool {
        let mut current = self.view(id).parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.view(parent).parent;
        }
        false
    }

    // =========================================================================
    // Child management
    // =========================================================================

    /// Append a child to a container.
    pub fn add_view(&mut self, parent: ViewId, child: ViewId) {
        let position = self.child_count(parent);
        self.insert_view(parent, child, position);
    }

    /// Insert a child at `position`. Panics when `position` exceeds the
    /// current child count.
    pub fn insert_view(&mut self, parent: ViewId, child: ViewId, position: usize) {
        let count = self.child_count(parent);
        if position > count {
            panic!(
                "cannot insert view at {}: {}/{}",
                self.describe(parent),
                count,
                position
            );
        }

        let parent_node = self.view(parent).node;
        let child_node = self.view(child).node;
        let child_detached = self.view(child).detached;

        // The taffy mirror holds non-detached children only, so the layout
        // position counts the non-detached siblings before the insertion
        // point.
        if !child_detached {
            let layout_position = self.view(parent).container().children[..position]
                .iter()
                .filter(|&&sibling| !self.view(sibling).detached)
                .count();
            self.taffy
                .insert_child_at_index(parent_node, layout_position, child_node)
                .expect("layout mirror out of sync");
        }

        self.view_mut(parent)
            .container_mut()
            .children
            .insert(position, child);

        {
            let view = self.view_mut(child);
            view.parent = Some(parent);
            view.index_in_parent = position;
        }
        self.restamp_from(parent, position + 1);

        self.invalidate();
        self.will_appear(child);
    }

    /// Remove a child from a container. A view absent from the child
    /// sequence is a no-op. With `free`, the view (and its owned subtree)
    /// is deallocated after detachment.
    pub fn remove_view(&mut self, parent: ViewId, child: ViewId, free: bool) {
        let Some(position) = self
            .view(parent)
            .container()
            .children
            .iter()
            .position(|&c| c == child)
        else {
            return;
        };

        // Drop tree focus if it lives inside the removed subtree.
        if let Some(focused) = self.focused {
            if focused == child || self.is_ancestor(child, focused) {
                self.focused = None;
            }
        }

        let parent_node = self.view(parent).node;
        let child_node = self.view(child).node;
        if !self.view(child).detached {
            self.taffy
                .remove_child(parent_node, child_node)
                .expect("layout mirror out of sync");
        }

        {
            let container = self.view_mut(parent).container_mut();
            container.children.remove(position);
            if container.last_focused == Some(child) {
                container.last_focused = None;
            }
        }
        self.view_mut(child).parent = None;
        self.restamp_from(parent, position);

        self.will_disappear(child);
        if free {
            self.free_view(child);
        }
        self.invalidate();
    }

    /// Remove every child, in reverse order, optionally deallocating each.
    pub fn clear_views(&mut self, parent: ViewId, free: bool) {
        self.view_mut(parent).container_mut().last_focused = None;

        if let Some(focused) = self.focused {
            if focused != parent && self.is_ancestor(parent, focused) {
                self.focused = None;
            }
        }

        let parent_node = self.view(parent).node;
        while let Some(child) = self.view(parent).container().children.last().copied() {
            let child_node = self.view(child).node;
            if !self.view(child).detached {
                self.taffy
                    .remove_child(parent_node, child_node)
                    .expect("layout mirror out of sync");
            }
            self.view_mut(parent).container_mut().children.pop();
            self.view_mut(child).parent = None;

            self.will_disappear(child);
            if free {
                self.free_view(child);
            }
        }

        self.invalidate();
    }

    /// Tear down a view. Attached views detach from their parent first.
    /// Owned children are deallocated recursively; External children are
    /// only detached and stay alive for their external owner.
    pub fn free_view(&mut self, id: ViewId) {
        if let Some(parent) = self.view(id).parent {
            self.remove_view(parent, id, true);
            return;
        }

        if self.view(id).is_container() {
            let node = self.view(id).node;
            let children: Vec<ViewId> = self.view(id).container().children.clone();
            for child in children {
                self.view_mut(child).parent = None;
                let child_node = self.view(child).node;
                if !self.view(child).detached {
                    self.taffy
                        .remove_child(node, child_node)
                        .expect("layout mirror out of sync");
                }
                match self.view(child).ownership {
                    Ownership::Owned => self.free_view(child),
                    Ownership::External => {}
                }
            }
            self.view_mut(id).container_mut().children.clear();
        }

        self.dealloc(id);
    }

    fn dealloc(&mut self, id: ViewId) {
        if self.focused == Some(id) {
            self.focused = None;
        }
        if self.root == Some(id) {
            self.root = None;
        }
        let view = self.slots[id.0]
            .take()
            .unwrap_or_else(|| panic!("stale view handle #{}", id.0));
        let _ = self.taffy.remove(view.node);
        self.free.push(id.0);
    }

    /// Re-stamp the index cache of every child from `start` onward.
    fn restamp_from(&mut self, parent: ViewId, start: usize) {
        let trailing: Vec<ViewId> = self.view(parent).container().children[start..].to_vec();
        for (offset, sibling) in trailing.into_iter().enumerate() {
            self.view_mut(sibling).index_in_parent = start + offset;
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub(crate) fn will_appear(&mut self, id: ViewId) {
        if let Some(mut hook) = self.view_mut(id).on_appear.take() {
            hook();
            self.view_mut(id).on_appear = Some(hook);
        }
        if self.view(id).is_container() {
            let children: Vec<ViewId> = self.view(id).container().children.clone();
            for child in children {
                self.will_appear(child);
            }
        }
    }

    pub(crate) fn will_disappear(&mut self, id: ViewId) {
        if let Some(mut hook) = self.view_mut(id).on_disappear.take() {
            hook();
            self.view_mut(id).on_disappear = Some(hook);
        }
        if self.view(id).is_container() {
            let children: Vec<ViewId> = self.view(id).container().children.clone();
            for child in children {
                self.will_disappear(child);
            }
        }
    }

    // =========================================================================
    // View state setters
    // =========================================================================

    pub fn set_id(&mut self, id: ViewId, name: impl Into<String>) {
        self.view_mut(id).id = Some(name.into());
    }

    pub fn set_alpha(&mut self, id: ViewId, alpha: f32) {
        self.view_mut(id).alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn alpha(&self, id: ViewId) -> f32 {
        self.view(id).alpha
    }

    pub fn set_visibility(&mut self, id: ViewId, visibility: Visibility) {
        self.view_mut(id).visibility = visibility;
        let display = match visibility {
            Visibility::Gone => Display::None,
            _ => Display::Flex,
        };
        self.with_style(id, |style| style.display = display);
    }

    pub fn visibility(&self, id: ViewId) -> Visibility {
        self.view(id).visibility
    }

    pub fn set_focusable(&mut self, id: ViewId, focusable: bool) {
        self.view_mut(id).focusable = focusable;
    }

    pub fn is_focusable(&self, id: ViewId) -> bool {
        self.view(id).focusable
    }

    pub fn set_cullable(&mut self, id: ViewId, cullable: bool) {
        self.view_mut(id).cullable = cullable;
    }

    /// Mark a view as excluded from the layout tree. Must be set before the
    /// view is added to a parent.
    pub fn set_detached(&mut self, id: ViewId, detached: bool) {
        assert!(
            self.view(id).parent.is_none(),
            "cannot change detachment of {} while attached",
            self.describe(id)
        );
        self.view_mut(id).detached = detached;
    }

    pub fn is_detached(&self, id: ViewId) -> bool {
        self.view(id).detached
    }

    pub fn set_detached_position(&mut self, id: ViewId, position: Point) {
        self.view_mut(id).detached_position = position;
    }

    pub fn set_detached_size(&mut self, id: ViewId, width: f32, height: f32) {
        self.view_mut(id).detached_size = (width, height);
        self.invalidate();
    }

    pub fn set_ownership(&mut self, id: ViewId, ownership: Ownership) {
        self.view_mut(id).ownership = ownership;
    }

    pub fn set_text(&mut self, id: ViewId, text: impl Into<String>) {
        self.view_mut(id).text = Some(text.into());
        self.invalidate();
    }

    pub fn text(&self, id: ViewId) -> Option<&str> {
        self.view(id).text.as_deref()
    }

    pub fn set_draw_fn(&mut self, id: ViewId, draw: DrawFn) {
        self.view_mut(id).draw_fn = Some(draw);
    }

    pub fn set_on_appear(&mut self, id: ViewId, hook: LifecycleFn) {
        self.view_mut(id).on_appear = Some(hook);
    }

    pub fn set_on_disappear(&mut self, id: ViewId, hook: LifecycleFn) {
        self.view_mut(id).on_disappear = Some(hook);
    }

    // =========================================================================
    // Container setters
    // =========================================================================

    pub fn axis(&self, id: ViewId) -> Axis {
        self.view(id).container().axis
    }

    pub fn set_axis(&mut self, id: ViewId, axis: Axis) {
        self.view_mut(id).container_mut().axis = axis;
        self.refresh_flex_direction(id);
        self.invalidate();
    }

    pub fn set_direction(&mut self, id: ViewId, direction: Direction) {
        self.view_mut(id).container_mut().direction = direction;
        // INHERIT descendants resolve against this container, so the whole
        // subtree's flex direction must be refreshed.
        self.refresh_subtree_directions(id);
        self.invalidate();
    }

    /// Resolve the effective direction of a view against its ancestor chain.
    pub fn effective_direction(&self, id: ViewId) -> Direction {
        let mut current = Some(id);
        while let Some(view_id) = current {
            let view = self.view(view_id);
            if let Some(container) = &view.container {
                if container.direction != Direction::Inherit {
                    return container.direction;
                }
            }
            current = view.parent;
        }
        Direction::LeftToRight
    }

    fn refresh_flex_direction(&mut self, id: ViewId) {
        let axis = self.view(id).container().axis;
        let direction = self.effective_direction(id);
        self.with_style(id, |style| {
            style.flex_direction = to_taffy_flex_direction(axis, direction);
        });
    }

    fn refresh_subtree_directions(&mut self, id: ViewId) {
        if self.view(id).is_container() {
            self.refresh_flex_direction(id);
            let children: Vec<ViewId> = self.view(id).container().children.clone();
            for child in children {
                self.refresh_subtree_directions(child);
            }
        }
    }

    pub fn set_justify_content(&mut self, id: ViewId, justify: JustifyContent) {
        let _ = self.view(id).container(); // containers only
        self.with_style(id, |style| {
            style.justify_content = to_taffy_justify_content(justify);
        });
    }

    pub fn set_align_items(&mut self, id: ViewId, align: AlignItems) {
        let _ = self.view(id).container();
        self.with_style(id, |style| {
            style.align_items = to_taffy_align_items(align);
        });
    }

    pub fn set_default_focused_index(&mut self, id: ViewId, index: usize) {
        self.view_mut(id).container_mut().default_focused_index = index;
    }

    pub fn default_focused_index(&self, id: ViewId) -> usize {
        self.view(id).container().default_focused_index
    }

    // =========================================================================
    // Padding
    // =========================================================================

    pub fn set_padding(&mut self, id: ViewId, top: f32, right: f32, bottom: f32, left: f32) {
        self.with_style(id, |style| {
            style.padding.top = lp(top);
            style.padding.right = lp(right);
            style.padding.bottom = lp(bottom);
            style.padding.left = lp(left);
        });
    }

    pub fn set_padding_top(&mut self, id: ViewId, value: f32) {
        self.with_style(id, |style| style.padding.top = lp(value));
    }

    pub fn set_padding_right(&mut self, id: ViewId, value: f32) {
        self.with_style(id, |style| style.padding.right = lp(value));
    }

    pub fn set_padding_bottom(&mut self, id: ViewId, value: f32) {
        self.with_style(id, |style| style.padding.bottom = lp(value));
    }

    pub fn set_padding_left(&mut self, id: ViewId, value: f32) {
        self.with_style(id, |style| style.padding.left = lp(value));
    }

    // =========================================================================
    // Size & flex setters
    // =========================================================================

    pub fn set_width(&mut self, id: ViewId, width: Dimension) {
        self.with_style(id, |style| style.size.width = to_taffy_dimension(width));
    }

    pub fn set_height(&mut self, id: ViewId, height: Dimension) {
        self.with_style(id, |style| style.size.height = to_taffy_dimension(height));
    }

    pub fn set_size(&mut self, id: ViewId, width: Dimension, height: Dimension) {
        self.with_style(id, |style| {
            style.size.width = to_taffy_dimension(width);
            style.size.height = to_taffy_dimension(height);
        });
    }

    pub fn set_grow(&mut self, id: ViewId, grow: f32) {
        self.with_style(id, |style| style.flex_grow = grow);
    }

    pub fn set_shrink(&mut self, id: ViewId, shrink: f32) {
        self.with_style(id, |style| style.flex_shrink = shrink);
    }

    pub fn set_margin(&mut self, id: ViewId, top: f32, right: f32, bottom: f32, left: f32) {
        self.with_style(id, |style| {
            style.margin.top = lpa(top);
            style.margin.right = lpa(right);
            style.margin.bottom = lpa(bottom);
            style.margin.left = lpa(left);
        });
    }

    fn with_style(&mut self, id: ViewId, mutate: impl FnOnce(&mut Style)) {
        let node = self.view(id).node;
        let mut style = self
            .taffy
            .style(node)
            .expect("layout mirror out of sync")
            .clone();
        mutate(&mut style);
        self.taffy
            .set_style(node, style)
            .expect("layout mirror out of sync");
        self.invalidate();
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Mark the layout dirty; the next tick recomputes geometry.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Compute geometry for the whole tree inside the given window size.
    /// Detached subtrees are computed against their own detached size.
    pub fn compute_layout(&mut self, width: f32, height: f32) {
        let Some(root) = self.root else {
            self.dirty = false;
            return;
        };

        let root_node = self.view(root).node;
        let available = Size {
            width: AvailableSpace::Definite(width),
            height: AvailableSpace::Definite(height),
        };
        self.taffy
            .compute_layout(root_node, available)
            .expect("layout computation failed");

        let mut detached = Vec::new();
        self.collect_detached(root, &mut detached);
        for id in detached {
            let (w, h) = self.view(id).detached_size;
            let node = self.view(id).node;
            let available = if w > 0.0 || h > 0.0 {
                Size {
                    width: AvailableSpace::Definite(w),
                    height: AvailableSpace::Definite(h),
                }
            } else {
                Size {
                    width: AvailableSpace::MaxContent,
                    height: AvailableSpace::MaxContent,
                }
            };
            self.taffy
                .compute_layout(node, available)
                .expect("layout computation failed");
        }

        self.dirty = false;
    }

    fn collect_detached(&self, id: ViewId, out: &mut Vec<ViewId>) {
        if let Some(container) = &self.view(id).container {
            for &child in &container.children {
                if self.view(child).detached {
                    out.push(child);
                }
                if self.view(child).is_container() {
                    self.collect_detached(child, out);
                }
            }
        }
    }

    /// Resolved absolute frame of a view.
    pub fn rect(&self, id: ViewId) -> Rect {
        let view = self.view(id);
        let parent_origin = match view.parent {
            Some(parent) => {
                let rect = self.rect(parent);
                Point::new(rect.x, rect.y)
            }
            None => Point::default(),
        };

        if view.detached {
            return Rect::new(
                parent_origin.x + view.detached_position.x,
                parent_origin.y + view.detached_position.y,
                view.detached_size.0,
                view.detached_size.1,
            );
        }

        let layout = self
            .taffy
            .layout(view.node)
            .expect("layout mirror out of sync");
        Rect::new(
            parent_origin.x + layout.location.x,
            parent_origin.y + layout.location.y,
            layout.size.width,
            layout.size.height,
        )
    }

    /// Number of children in the taffy mirror (non-detached children only).
    pub fn layout_child_count(&self, id: ViewId) -> usize {
        self.taffy.child_count(self.view(id).node)
    }

    // =========================================================================
    // Draw
    // =========================================================================

    /// Views to draw this frame, in draw order, with resolved frames.
    /// Cullable leaves outside any ancestor container's bounds are skipped;
    /// nested containers always recurse and cull their own leaves.
    pub fn collect_draw_list(&self, root: ViewId) -> Vec<(ViewId, Rect)> {
        let mut out = Vec::new();
        self.collect_draw_into(root, &mut out);
        out
    }

    fn collect_draw_into(&self, id: ViewId, out: &mut Vec<(ViewId, Rect)>) {
        let view = self.view(id);
        if !view.is_drawable() {
            return;
        }
        out.push((id, self.rect(id)));

        if let Some(container) = &view.container {
            for &child in &container.children {
                let child_view = self.view(child);
                if !child_view.is_container() && child_view.cullable && child_view.is_drawable() {
                    let child_rect = self.rect(child);
                    if self.is_culled(id, &child_rect) {
                        continue;
                    }
                }
                self.collect_draw_into(child, out);
            }
        }
    }

    /// Test a child frame against every ancestor container's bounds,
    /// walking upward from `from`. Any ancestor that excludes it culls it.
    fn is_culled(&self, from: ViewId, child_rect: &Rect) -> bool {
        let mut current = Some(from);
        while let Some(id) = current {
            let view = self.view(id);
            if view.is_container() && !self.rect(id).overlaps(child_rect) {
                return true;
            }
            current = view.parent;
        }
        false
    }

    /// Run the draw pass: every visible, unculled view's draw callback is
    /// invoked with its resolved frame.
    pub fn draw(
        &mut self,
        canvas: &mut dyn Canvas,
        style: &crate::theme::Style,
        frame: &FrameContext,
    ) {
        let Some(root) = self.root else { return };
        for (id, rect) in self.collect_draw_list(root) {
            if let Some(mut draw) = self.view_mut(id).draw_fn.take() {
                draw(self.view(id), canvas, rect, style, frame);
                self.view_mut(id).draw_fn = Some(draw);
            }
        }
    }

    // =========================================================================
    // Hit testing
    // =========================================================================

    /// Topmost view containing `point`, preferring later (topmost) children.
    /// Transparent or non-visible views never hit.
    pub fn hit_test(&self, id: ViewId, point: Point) -> Option<ViewId> {
        let view = self.view(id);
        if view.alpha == 0.0 || view.visibility != Visibility::Visible {
            return None;
        }
        if !self.rect(id).contains(point) {
            return None;
        }
        if let Some(container) = &view.container {
            for &child in container.children.iter().rev() {
                if let Some(hit) = self.hit_test(child, point) {
                    return Some(hit);
                }
            }
        }
        Some(id)
    }
}

// =============================================================================
// Tests
// =============================================================================
