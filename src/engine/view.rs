//! View and Container - the units of the retained tree.
//!
//! A `View` is one slot in the [`ViewTree`](super::ViewTree) arena. Whether a
//! view is a composite container is decided at construction by the presence
//! of its `Container` state; nothing in the crate does runtime type
//! inspection.
//!
//! Views hold requested state (visibility, alpha, focusability) and exactly
//! one taffy node; computed geometry always comes from the layout tree, never
//! from the view itself.

use std::collections::HashMap;

use taffy::NodeId;

use crate::render::{Canvas, FrameContext};
use crate::theme::Style;
use crate::types::{Axis, Direction, FocusDirection, Ownership, Point, Rect, Visibility};

use super::ViewTree;

// =============================================================================
// ViewId
// =============================================================================

/// Handle to a view slot in the tree arena.
///
/// Handles are plain indices with free-list reuse; using a handle after its
/// slot was freed is a contract violation and panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub(crate) usize);

impl ViewId {
    /// Raw slot index, for diagnostics.
    pub fn index(self) -> usize {
        self.0
    }
}

// =============================================================================
// Callback types
// =============================================================================

/// Per-frame draw callback: receives the view being drawn, the canvas, the
/// view's resolved absolute frame, the active style and the frame context.
pub type DrawFn = Box<dyn FnMut(&View, &mut dyn Canvas, Rect, &Style, &FrameContext)>;

/// Lifecycle callback (will-appear / will-disappear).
pub type LifecycleFn = Box<dyn FnMut()>;

/// Callbacks fired when a view gains or loses focus.
///
/// The parent variants fire on every child of a container whose subtree
/// gained or lost focus, not just on the focused view itself.
#[derive(Default)]
pub struct FocusCallbacks {
    pub on_focus: Option<Box<dyn Fn()>>,
    pub on_blur: Option<Box<dyn Fn()>>,
    pub on_parent_focus: Option<Box<dyn Fn()>>,
    pub on_parent_blur: Option<Box<dyn Fn()>>,
}

/// Hook letting a container intercept or redirect a focus navigation result
/// bubbling up through it. Receives the tree, the container the request came
/// from, the candidate so far, and the direction; returns the (possibly
/// replaced) candidate.
pub type NavigationHook =
    Box<dyn Fn(&ViewTree, ViewId, Option<ViewId>, FocusDirection) -> Option<ViewId>>;

// =============================================================================
// Container
// =============================================================================

/// Composite state of a container ("box") view.
pub struct Container {
    /// Main layout axis; also selects which focus directions this
    /// container services.
    pub(crate) axis: Axis,
    /// Horizontal direction (INHERIT resolves against ancestors).
    pub(crate) direction: Direction,
    /// Ordered child sequence. Mirrored into the taffy tree for
    /// non-detached children, in the same order.
    pub(crate) children: Vec<ViewId>,
    /// The direct child that last contained focus. Cleared when that
    /// child is removed.
    pub(crate) last_focused: Option<ViewId>,
    /// Child index preferred when this container first receives focus.
    pub(crate) default_focused_index: usize,
    /// Attribute name -> (target attribute name, target view).
    pub(crate) forwarded_attributes: HashMap<String, (String, ViewId)>,
    /// Optional navigation-decision override.
    pub(crate) navigation_hook: Option<NavigationHook>,
}

impl Container {
    pub(crate) fn new(axis: Axis) -> Self {
        Self {
            axis,
            direction: Direction::Inherit,
            children: Vec::new(),
            last_focused: None,
            default_focused_index: 0,
            forwarded_attributes: HashMap::new(),
            navigation_hook: None,
        }
    }
}

// =============================================================================
// View
// =============================================================================

/// One view slot: identity, requested state, the owned taffy node, and the
/// optional container capability.
pub struct View {
    /// Optional string id for markup lookups.
    pub(crate) id: Option<String>,
    pub(crate) alpha: f32,
    pub(crate) visibility: Visibility,
    pub(crate) focusable: bool,
    /// Leaves with this flag set are skipped when outside every ancestor
    /// container's bounds.
    pub(crate) cullable: bool,
    /// Detached views do not participate in the layout tree; they are
    /// positioned through `detached_position` / `detached_size`.
    pub(crate) detached: bool,
    pub(crate) detached_position: Point,
    pub(crate) detached_size: (f32, f32),
    pub(crate) ownership: Ownership,
    pub(crate) parent: Option<ViewId>,
    /// Cached position inside the parent's child sequence. Re-stamped by
    /// every sibling insertion and removal.
    pub(crate) index_in_parent: usize,
    /// The taffy node this view exclusively owns.
    pub(crate) node: NodeId,
    /// Optional text payload (labels).
    pub(crate) text: Option<String>,
    pub(crate) focus_callbacks: FocusCallbacks,
    pub(crate) on_appear: Option<LifecycleFn>,
    pub(crate) on_disappear: Option<LifecycleFn>,
    pub(crate) draw_fn: Option<DrawFn>,
    /// Present when this view is a composite container.
    pub(crate) container: Option<Container>,
}

impl View {
    pub(crate) fn new(node: NodeId, container: Option<Container>) -> Self {
        Self {
            id: None,
            alpha: 1.0,
            visibility: Visibility::Visible,
            focusable: false,
            cullable: true,
            detached: false,
            detached_position: Point::default(),
            detached_size: (0.0, 0.0),
            ownership: Ownership::Owned,
            parent: None,
            index_in_parent: 0,
            node,
            text: None,
            focus_callbacks: FocusCallbacks::default(),
            on_appear: None,
            on_disappear: None,
            draw_fn: None,
            container,
        }
    }

    /// Whether this view is a composite container.
    pub fn is_container(&self) -> bool {
        self.container.is_some()
    }

    /// String id assigned by markup or [`ViewTree::set_id`](super::ViewTree::set_id).
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Text payload (labels).
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_focusable(&self) -> bool {
        self.focusable
    }

    /// Whether this view participates in drawing at all.
    pub(crate) fn is_drawable(&self) -> bool {
        self.visibility == Visibility::Visible && self.alpha > 0.0
    }

    pub(crate) fn container(&self) -> &Container {
        self.container
            .as_ref()
            .expect("view is not a container")
    }

    pub(crate) fn container_mut(&mut self) -> &mut Container {
        self.container
            .as_mut()
            .expect("view is not a container")
    }

    /// Short human-readable description for fatal messages.
    pub(crate) fn describe(&self) -> String {
        let kind = if self.is_container() { "Box" } else { "View" };
        match &self.id {
            Some(id) => format!("{kind}({id})"),
            None => kind.to_string(),
        }
    }
}
