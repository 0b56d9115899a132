//! Core types for lantern-ui.
//!
//! The small vocabulary everything else builds on: tree axes and directions,
//! visibility, focus directions, geometry, dimensions and colors.

// =============================================================================
// Axis & Direction
// =============================================================================

/// Main layout axis of a container.
///
/// The axis also decides which focus directions the container services:
/// ROW handles LEFT/RIGHT, COLUMN handles UP/DOWN. Everything else is
/// delegated to the parent container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    Row,
    Column,
}

/// Horizontal layout direction of a container.
///
/// `Inherit` resolves against the closest ancestor that sets an explicit
/// direction (left-to-right when no ancestor does).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Inherit,
    LeftToRight,
    RightToLeft,
}

// =============================================================================
// Visibility
// =============================================================================

/// View visibility state.
///
/// - `Visible`: laid out and drawn.
/// - `Invisible`: laid out (keeps its space) but not drawn.
/// - `Gone`: neither laid out nor drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Invisible,
    Gone,
}

// =============================================================================
// Focus direction
// =============================================================================

/// Direction of a focus navigation request (d-pad / arrow keys).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDirection {
    Up,
    Down,
    Left,
    Right,
}

impl FocusDirection {
    /// Whether a container with the given axis services this direction
    /// itself (as opposed to delegating to its parent).
    pub fn is_aligned(self, axis: Axis) -> bool {
        match axis {
            Axis::Row => matches!(self, Self::Left | Self::Right),
            Axis::Column => matches!(self, Self::Up | Self::Down),
        }
    }

    /// Traversal offset through the child sequence: +1 toward higher
    /// indices (RIGHT on ROW, DOWN on COLUMN), -1 toward lower indices.
    pub fn offset(self) -> isize {
        match self {
            Self::Right | Self::Down => 1,
            Self::Left | Self::Up => -1,
        }
    }
}

// =============================================================================
// Ownership
// =============================================================================

/// Who is responsible for deallocating a view when its parent container
/// tears down.
///
/// `External` children are only detached on teardown; the external owner
/// frees them explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ownership {
    #[default]
    Owned,
    External,
}

// =============================================================================
// Geometry
// =============================================================================

/// A point in absolute window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in absolute window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether the point falls inside this rect (edges inclusive).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }

    /// Inclusive overlap test used by the culling walk: rects that merely
    /// touch still count as overlapping.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(other.bottom() < self.y
            || other.right() < self.x
            || other.x > self.right()
            || other.y > self.bottom())
    }
}

// =============================================================================
// Dimension
// =============================================================================

/// A requested size that can be absolute, relative, or content-driven.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Dimension {
    /// Size from content / flex rules.
    #[default]
    Auto,
    /// Absolute size in window units.
    Points(f32),
    /// Percentage of the parent (0-100).
    Percent(f32),
}

impl From<f32> for Dimension {
    fn from(value: f32) -> Self {
        Self::Points(value)
    }
}

// =============================================================================
// Flex alignment
// =============================================================================

/// Main-axis distribution of a container's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JustifyContent {
    #[default]
    FlexStart,
    Center,
    FlexEnd,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

/// Cross-axis alignment of a container's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignItems {
    /// Let the solver pick (stretch).
    #[default]
    Auto,
    FlexStart,
    Center,
    FlexEnd,
    Stretch,
    Baseline,
}

// =============================================================================
// Color
// =============================================================================

/// RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

// =============================================================================
// Text attributes (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Text attributes as a bitfield.
    ///
    /// Combine with bitwise OR: `Attr::BOLD | Attr::UNDERLINE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attr: u8 {
        const NONE = 0;
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_alignment() {
        assert!(FocusDirection::Left.is_aligned(Axis::Row));
        assert!(FocusDirection::Right.is_aligned(Axis::Row));
        assert!(!FocusDirection::Up.is_aligned(Axis::Row));
        assert!(FocusDirection::Up.is_aligned(Axis::Column));
        assert!(FocusDirection::Down.is_aligned(Axis::Column));
        assert!(!FocusDirection::Left.is_aligned(Axis::Column));
    }

    #[test]
    fn test_direction_offset() {
        assert_eq!(FocusDirection::Right.offset(), 1);
        assert_eq!(FocusDirection::Down.offset(), 1);
        assert_eq!(FocusDirection::Left.offset(), -1);
        assert_eq!(FocusDirection::Up.offset(), -1);
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(30.0, 30.0)));
        assert!(rect.contains(Point::new(15.0, 25.0)));
        assert!(!rect.contains(Point::new(9.0, 15.0)));
        assert!(!rect.contains(Point::new(15.0, 31.0)));
    }

    #[test]
    fn test_rect_overlaps() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        // Touching edges still overlap (inclusive test).
        assert!(a.overlaps(&Rect::new(10.0, 0.0, 5.0, 5.0)));
        assert!(!a.overlaps(&Rect::new(11.0, 0.0, 5.0, 5.0)));
        assert!(!a.overlaps(&Rect::new(0.0, 20.0, 5.0, 5.0)));
    }
}
