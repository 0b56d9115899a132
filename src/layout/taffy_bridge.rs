//! Taffy bridge - conversions between lantern-ui style values and taffy.
//!
//! The view tree owns one persistent `TaffyTree`; every view owns one node in
//! it. These helpers translate the crate's style vocabulary into taffy's so
//! the tree's setters can write straight through to the solver, treating it
//! as a black box that turns style into geometry.

use taffy::{
    AlignItems as TaffyAlignItems, Dimension as TaffyDimension, FlexDirection,
    JustifyContent as TaffyJustifyContent, LengthPercentage, LengthPercentageAuto,
};

use crate::types::{AlignItems, Axis, Dimension, Direction, JustifyContent};

// =============================================================================
// DIMENSION CONVERSION
// =============================================================================

/// Convert our Dimension to taffy's Dimension.
pub(crate) fn to_taffy_dimension(dim: Dimension) -> TaffyDimension {
    match dim {
        Dimension::Auto => TaffyDimension::Auto,
        Dimension::Points(n) => TaffyDimension::Length(n),
        Dimension::Percent(p) => TaffyDimension::Percent(p / 100.0),
    }
}

/// Absolute length as taffy LengthPercentage (padding edges).
pub(crate) fn lp(value: f32) -> LengthPercentage {
    LengthPercentage::Length(value)
}

/// Absolute length as taffy LengthPercentageAuto (margin edges).
pub(crate) fn lpa(value: f32) -> LengthPercentageAuto {
    LengthPercentageAuto::Length(value)
}

// =============================================================================
// ENUM CONVERSIONS
// =============================================================================

/// Resolve an axis plus an already-resolved direction into a taffy flex
/// direction. Taffy has no `direction` style property, so right-to-left on
/// a ROW container maps to the reversed main axis; columns are unaffected.
pub(crate) fn to_taffy_flex_direction(axis: Axis, direction: Direction) -> FlexDirection {
    match (axis, direction) {
        (Axis::Row, Direction::RightToLeft) => FlexDirection::RowReverse,
        (Axis::Row, _) => FlexDirection::Row,
        (Axis::Column, _) => FlexDirection::Column,
    }
}

pub(crate) fn to_taffy_justify_content(justify: JustifyContent) -> Option<TaffyJustifyContent> {
    Some(match justify {
        JustifyContent::FlexStart => TaffyJustifyContent::FlexStart,
        JustifyContent::Center => TaffyJustifyContent::Center,
        JustifyContent::FlexEnd => TaffyJustifyContent::FlexEnd,
        JustifyContent::SpaceBetween => TaffyJustifyContent::SpaceBetween,
        JustifyContent::SpaceAround => TaffyJustifyContent::SpaceAround,
        JustifyContent::SpaceEvenly => TaffyJustifyContent::SpaceEvenly,
    })
}

pub(crate) fn to_taffy_align_items(align: AlignItems) -> Option<TaffyAlignItems> {
    match align {
        AlignItems::Auto => None,
        AlignItems::FlexStart => Some(TaffyAlignItems::FlexStart),
        AlignItems::Center => Some(TaffyAlignItems::Center),
        AlignItems::FlexEnd => Some(TaffyAlignItems::FlexEnd),
        AlignItems::Stretch => Some(TaffyAlignItems::Stretch),
        AlignItems::Baseline => Some(TaffyAlignItems::Baseline),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_conversion() {
        assert!(matches!(
            to_taffy_dimension(Dimension::Auto),
            TaffyDimension::Auto
        ));
        assert!(matches!(
            to_taffy_dimension(Dimension::Points(50.0)),
            TaffyDimension::Length(v) if v == 50.0
        ));
        // Percent: 50% -> 0.5
        if let TaffyDimension::Percent(p) = to_taffy_dimension(Dimension::Percent(50.0)) {
            assert!((p - 0.5).abs() < 0.001);
        } else {
            panic!("expected Percent variant");
        }
    }

    #[test]
    fn test_flex_direction_resolution() {
        assert_eq!(
            to_taffy_flex_direction(Axis::Row, Direction::LeftToRight),
            FlexDirection::Row
        );
        assert_eq!(
            to_taffy_flex_direction(Axis::Row, Direction::RightToLeft),
            FlexDirection::RowReverse
        );
        // Columns ignore horizontal direction.
        assert_eq!(
            to_taffy_flex_direction(Axis::Column, Direction::RightToLeft),
            FlexDirection::Column
        );
        assert_eq!(
            to_taffy_flex_direction(Axis::Row, Direction::Inherit),
            FlexDirection::Row
        );
    }

    #[test]
    fn test_align_items_auto_is_none() {
        assert!(to_taffy_align_items(AlignItems::Auto).is_none());
        assert_eq!(
            to_taffy_align_items(AlignItems::Center),
            Some(TaffyAlignItems::Center)
        );
    }
}
