//! Markup module - declarative construction of view trees.
//!
//! Parsing is somebody else's job: this module consumes an already-parsed
//! [`Element`] tree (name, string attributes, children) and produces views
//! through the same `add_view` path direct construction uses.
//!
//! Element names resolve through a per-thread registry of view creators;
//! attributes are string-keyed property sets that containers may intercept
//! via forwarding. Unknown element names are contract violations; unknown
//! attributes are logged and reported unhandled.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::warn;

use crate::engine::{View, ViewId, ViewTree};
use crate::render::{Canvas, FrameContext};
use crate::theme::Style;
use crate::types::{
    AlignItems, Attr, Axis, Dimension, Direction, JustifyContent, Rect, Visibility,
};

// =============================================================================
// Element
// =============================================================================

/// One parsed markup element: the inflation engine's entire input contract.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }
}

// =============================================================================
// View creator registry
// =============================================================================

/// Creates one view of a named kind.
pub type Creator = fn(&mut ViewTree) -> ViewId;

thread_local! {
    static CREATORS: RefCell<HashMap<String, Creator>> = RefCell::new(HashMap::new());
}

/// Register a view creator under an element name. Later registrations
/// replace earlier ones.
pub fn register_view(name: impl Into<String>, creator: Creator) {
    CREATORS.with(|creators| {
        creators.borrow_mut().insert(name.into(), creator);
    });
}

/// Register the built-in element kinds: `Box`, `Label`, `Spacer`.
pub fn register_builtin_views() {
    register_view("Box", |tree| tree.create_box(Axis::Row));
    register_view("Label", |tree| {
        let id = tree.create_view();
        tree.set_draw_fn(id, Box::new(draw_label));
        id
    });
    register_view("Spacer", |tree| {
        let id = tree.create_view();
        tree.set_grow(id, 1.0);
        id
    });
}

fn draw_label(view: &View, canvas: &mut dyn Canvas, rect: Rect, style: &Style, _: &FrameContext) {
    if let Some(text) = view.text() {
        canvas.draw_text(rect.x, rect.y, text, style.text, Attr::NONE);
    }
}

/// Create a view for an element name. Unknown names are fatal.
pub fn create_from_name(tree: &mut ViewTree, name: &str) -> ViewId {
    let creator = CREATORS.with(|creators| creators.borrow().get(name).copied());
    match creator {
        Some(creator) => creator(tree),
        None => panic!("unknown view element \"{name}\""),
    }
}

// =============================================================================
// Inflation
// =============================================================================

/// Build a view subtree from a parsed element, applying its attributes and
/// inflating its children through `add_view`.
pub fn inflate(tree: &mut ViewTree, element: &Element) -> ViewId {
    let id = create_from_name(tree, &element.name);

    for (name, value) in &element.attributes {
        if !apply_attribute(tree, id, name, value) {
            warn!(
                "unknown attribute \"{}\" on {}",
                name,
                tree.describe(id)
            );
        }
    }

    if !element.children.is_empty() && !tree.view(id).is_container() {
        panic!(
            "element <{}> is not a container and cannot have children",
            element.name
        );
    }
    for child_element in &element.children {
        let child = inflate(tree, child_element);
        tree.add_view(id, child);
    }

    id
}

// =============================================================================
// Attribute application
// =============================================================================

/// Attributes every view understands.
const VIEW_ATTRIBUTES: &[&str] = &[
    "id",
    "alpha",
    "visibility",
    "focusable",
    "width",
    "height",
    "grow",
    "shrink",
    "text",
];

/// Attributes only containers understand.
const CONTAINER_ATTRIBUTES: &[&str] = &[
    "axis",
    "direction",
    "justifyContent",
    "alignItems",
    "padding",
    "paddingTop",
    "paddingRight",
    "paddingBottom",
    "paddingLeft",
    "defaultFocusedIndex",
];

/// Whether `name` is settable on the given view, through its own attribute
/// set or its forwarding table.
pub fn is_attribute_valid(tree: &ViewTree, id: ViewId, name: &str) -> bool {
    if VIEW_ATTRIBUTES.contains(&name) {
        return true;
    }
    if let Some(container) = tree.view(id).container.as_ref() {
        return CONTAINER_ATTRIBUTES.contains(&name)
            || container.forwarded_attributes.contains_key(name);
    }
    false
}

/// Apply a string attribute to a view. Containers consult their forwarding
/// table first. Returns whether the attribute was handled; malformed values
/// for known attributes are fatal.
pub fn apply_attribute(tree: &mut ViewTree, id: ViewId, name: &str, value: &str) -> bool {
    if let Some(container) = tree.view(id).container.as_ref() {
        if let Some((target_name, target)) = container.forwarded_attributes.get(name).cloned() {
            return apply_attribute(tree, target, &target_name, value);
        }
    }
    apply_own_attribute(tree, id, name, value)
}

fn apply_own_attribute(tree: &mut ViewTree, id: ViewId, name: &str, value: &str) -> bool {
    match name {
        "id" => tree.set_id(id, value),
        "alpha" => {
            let alpha = parse_float(tree, id, name, value);
            tree.set_alpha(id, alpha);
        }
        "visibility" => {
            let visibility = match value {
                "visible" => Visibility::Visible,
                "invisible" => Visibility::Invisible,
                "gone" => Visibility::Gone,
                _ => bad_value(tree, id, name, value),
            };
            tree.set_visibility(id, visibility);
        }
        "focusable" => {
            let focusable = parse_bool(tree, id, name, value);
            tree.set_focusable(id, focusable);
        }
        "width" => {
            let width = parse_dimension(tree, id, name, value);
            tree.set_width(id, width);
        }
        "height" => {
            let height = parse_dimension(tree, id, name, value);
            tree.set_height(id, height);
        }
        "grow" => {
            let grow = parse_float(tree, id, name, value);
            tree.set_grow(id, grow);
        }
        "shrink" => {
            let shrink = parse_float(tree, id, name, value);
            tree.set_shrink(id, shrink);
        }
        "text" => tree.set_text(id, value),
        _ if tree.view(id).is_container() => return apply_container_attribute(tree, id, name, value),
        _ => return false,
    }
    true
}

fn apply_container_attribute(tree: &mut ViewTree, id: ViewId, name: &str, value: &str) -> bool {
    match name {
        "axis" => {
            let axis = match value {
                "row" => Axis::Row,
                "column" => Axis::Column,
                _ => bad_value(tree, id, name, value),
            };
            tree.set_axis(id, axis);
        }
        "direction" => {
            let direction = match value {
                "inherit" => Direction::Inherit,
                "leftToRight" => Direction::LeftToRight,
                "rightToLeft" => Direction::RightToLeft,
                _ => bad_value(tree, id, name, value),
            };
            tree.set_direction(id, direction);
        }
        "justifyContent" => {
            let justify = match value {
                "flexStart" => JustifyContent::FlexStart,
                "center" => JustifyContent::Center,
                "flexEnd" => JustifyContent::FlexEnd,
                "spaceBetween" => JustifyContent::SpaceBetween,
                "spaceAround" => JustifyContent::SpaceAround,
                "spaceEvenly" => JustifyContent::SpaceEvenly,
                _ => bad_value(tree, id, name, value),
            };
            tree.set_justify_content(id, justify);
        }
        "alignItems" => {
            let align = match value {
                "auto" => AlignItems::Auto,
                "flexStart" => AlignItems::FlexStart,
                "center" => AlignItems::Center,
                "flexEnd" => AlignItems::FlexEnd,
                "stretch" => AlignItems::Stretch,
                "baseline" => AlignItems::Baseline,
                _ => bad_value(tree, id, name, value),
            };
            tree.set_align_items(id, align);
        }
        "padding" => {
            let padding = parse_float(tree, id, name, value);
            tree.set_padding(id, padding, padding, padding, padding);
        }
        "paddingTop" => {
            let padding = parse_float(tree, id, name, value);
            tree.set_padding_top(id, padding);
        }
        "paddingRight" => {
            let padding = parse_float(tree, id, name, value);
            tree.set_padding_right(id, padding);
        }
        "paddingBottom" => {
            let padding = parse_float(tree, id, name, value);
            tree.set_padding_bottom(id, padding);
        }
        "paddingLeft" => {
            let padding = parse_float(tree, id, name, value);
            tree.set_padding_left(id, padding);
        }
        "defaultFocusedIndex" => {
            let index = value
                .parse::<usize>()
                .unwrap_or_else(|_| bad_value(tree, id, name, value));
            tree.set_default_focused_index(id, index);
        }
        _ => return false,
    }
    true
}

// =============================================================================
// Attribute forwarding
// =============================================================================

/// Re-expose `target`'s attribute under this container's own `name`.
/// Fatal when `target_name` is not settable on the target or when `name`
/// was already forwarded.
pub fn forward_attribute(
    tree: &mut ViewTree,
    id: ViewId,
    name: &str,
    target: ViewId,
    target_name: &str,
) {
    if !is_attribute_valid(tree, target, target_name) {
        panic!(
            "cannot forward \"{}\" of {}: \"{}\" is not a valid attribute of {}",
            name,
            tree.describe(id),
            target_name,
            tree.describe(target)
        );
    }
    let container = tree.view_mut(id).container_mut();
    if container.forwarded_attributes.contains_key(name) {
        panic!(
            "cannot forward \"{name}\" twice on the same container"
        );
    }
    container
        .forwarded_attributes
        .insert(name.to_string(), (target_name.to_string(), target));
}

/// Forward under the same name on both sides.
pub fn forward_attribute_as_is(tree: &mut ViewTree, id: ViewId, name: &str, target: ViewId) {
    forward_attribute(tree, id, name, target, name);
}

// =============================================================================
// Value parsing
// =============================================================================

fn bad_value(tree: &ViewTree, id: ViewId, name: &str, value: &str) -> ! {
    panic!(
        "invalid value \"{}\" for attribute \"{}\" on {}",
        value,
        name,
        tree.describe(id)
    );
}

fn parse_float(tree: &ViewTree, id: ViewId, name: &str, value: &str) -> f32 {
    value
        .parse::<f32>()
        .unwrap_or_else(|_| bad_value(tree, id, name, value))
}

fn parse_bool(tree: &ViewTree, id: ViewId, name: &str, value: &str) -> bool {
    match value {
        "true" => true,
        "false" => false,
        _ => bad_value(tree, id, name, value),
    }
}

fn parse_dimension(tree: &ViewTree, id: ViewId, name: &str, value: &str) -> Dimension {
    if value == "auto" {
        return Dimension::Auto;
    }
    if let Some(percent) = value.strip_suffix('%') {
        let percent = percent
            .parse::<f32>()
            .unwrap_or_else(|_| bad_value(tree, id, name, value));
        return Dimension::Percent(percent);
    }
    Dimension::Points(parse_float(tree, id, name, value))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ViewTree {
        register_builtin_views();
        ViewTree::new()
    }

    #[test]
    fn test_inflate_builds_tree() {
        let mut tree = setup();
        let element = Element::new("Box")
            .attribute("axis", "column")
            .attribute("id", "root")
            .attribute("width", "100")
            .child(
                Element::new("Label")
                    .attribute("id", "title")
                    .attribute("text", "hello"),
            )
            .child(Element::new("Spacer"))
            .child(Element::new("Box").attribute("axis", "row"));

        let root = inflate(&mut tree, &element);

        assert!(tree.view(root).is_container());
        assert_eq!(tree.axis(root), Axis::Column);
        assert_eq!(tree.child_count(root), 3);

        let title = tree.get_view(root, "title").expect("title exists");
        assert_eq!(tree.text(title), Some("hello"));
        assert_eq!(tree.index_in_parent(title), 0);
    }

    #[test]
    #[should_panic(expected = "unknown view element")]
    fn test_unknown_element_is_fatal() {
        let mut tree = setup();
        inflate(&mut tree, &Element::new("Carousel"));
    }

    #[test]
    #[should_panic(expected = "cannot have children")]
    fn test_leaf_with_children_is_fatal() {
        let mut tree = setup();
        let element = Element::new("Label").child(Element::new("Label"));
        inflate(&mut tree, &element);
    }

    #[test]
    fn test_unknown_attribute_is_unhandled() {
        let mut tree = setup();
        let id = tree.create_view();
        assert!(!apply_attribute(&mut tree, id, "frobnicate", "yes"));
        // Container attributes are unknown on leaves.
        assert!(!apply_attribute(&mut tree, id, "axis", "row"));
    }

    #[test]
    #[should_panic(expected = "invalid value")]
    fn test_malformed_value_is_fatal() {
        let mut tree = setup();
        let id = tree.create_box(Axis::Row);
        apply_attribute(&mut tree, id, "axis", "diagonal");
    }

    #[test]
    fn test_dimension_parsing() {
        let mut tree = setup();
        let id = tree.create_view();
        assert!(apply_attribute(&mut tree, id, "width", "auto"));
        assert!(apply_attribute(&mut tree, id, "width", "120"));
        assert!(apply_attribute(&mut tree, id, "height", "50%"));
    }

    #[test]
    fn test_forwarding_redirects_application() {
        let mut tree = setup();
        let container = tree.create_box(Axis::Row);
        let label = create_from_name(&mut tree, "Label");
        tree.add_view(container, label);

        forward_attribute(&mut tree, container, "title", label, "text");
        assert!(is_attribute_valid(&tree, container, "title"));

        assert!(apply_attribute(&mut tree, container, "title", "forwarded"));
        assert_eq!(tree.text(label), Some("forwarded"));
        // The container itself did not grow a "title" of its own.
        assert_eq!(tree.text(container), None);
    }

    #[test]
    #[should_panic(expected = "is not a valid attribute")]
    fn test_forwarding_to_invalid_attribute_is_fatal() {
        let mut tree = setup();
        let container = tree.create_box(Axis::Row);
        let child = tree.create_view();
        tree.add_view(container, child);

        forward_attribute(&mut tree, container, "title", child, "missing");
    }

    #[test]
    #[should_panic(expected = "cannot forward \"title\" twice")]
    fn test_duplicate_forwarding_is_fatal() {
        let mut tree = setup();
        let container = tree.create_box(Axis::Row);
        let child = tree.create_view();
        tree.add_view(container, child);

        forward_attribute(&mut tree, container, "title", child, "text");
        forward_attribute(&mut tree, container, "title", child, "text");
    }

    #[test]
    fn test_forwarding_during_inflation() {
        let mut tree = setup();
        let container = tree.create_box(Axis::Row);
        let label = create_from_name(&mut tree, "Label");
        tree.add_view(container, label);
        forward_attribute(&mut tree, container, "title", label, "text");

        // Inflation-time attribute application goes through the same path.
        assert!(apply_attribute(&mut tree, container, "title", "composite"));
        assert_eq!(tree.text(label), Some("composite"));
    }
}
