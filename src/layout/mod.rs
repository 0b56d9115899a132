//! Layout module - flexbox computation for the view tree.
//!
//! Layout uses [Taffy](https://github.com/DioxusLabs/taffy) for W3C-compliant
//! flexbox computation. The view tree maintains a persistent taffy tree that
//! mirrors the non-detached views in sibling order; style setters write
//! through to taffy, and a frame tick asks the root node to compute geometry
//! when the tree is dirty.

mod taffy_bridge;

pub(crate) use taffy_bridge::{
    lp, lpa, to_taffy_align_items, to_taffy_dimension, to_taffy_flex_direction,
    to_taffy_justify_content,
};
