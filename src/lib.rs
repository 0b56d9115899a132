//! # lantern-ui
//!
//! Retained-mode UI toolkit for Rust: a tree of views laid out with
//! flexbox, drawn through a pluggable canvas, and driven by directional
//! (d-pad / remote / arrow-key) focus navigation instead of pointer-only
//! interaction.
//!
//! ## Architecture
//!
//! Views live in a slot arena ([`engine::ViewTree`]) addressed by handles.
//! Container mutations mirror themselves into a persistent
//! [Taffy](https://github.com/DioxusLabs/taffy) tree and mark layout dirty;
//! a frame tick recomputes geometry, then the draw pass walks the tree
//! within computed bounds, culling leaves that fall outside every ancestor
//! container:
//!
//! ```text
//! View tree -> taffy mirror -> compute_layout -> culled draw pass
//! ```
//!
//! Input arrives through the [`platform::Platform`] contract; arrow/d-pad
//! events resolve "next focus" queries bottom-up across the tree. A
//! three-queue [`tasks::TaskScheduler`] services deferred, delayed and
//! background callbacks, synchronized with the render tick.
//!
//! ## Modules
//!
//! - [`types`] - core vocabulary (axes, directions, visibility, geometry)
//! - [`engine`] - the view tree: child management, focus, culling, hit tests
//! - [`layout`] - taffy bridge for flexbox computation
//! - [`render`] - canvas contract and the terminal cell canvas
//! - [`markup`] - declarative construction from parsed elements
//! - [`tasks`] - the cooperative task scheduler
//! - [`platform`] - windowing/input/audio contract plus bundled backends
//! - [`app`] - the frame loop tying everything together

pub mod app;
pub mod engine;
pub mod layout;
pub mod markup;
pub mod platform;
pub mod render;
pub mod tasks;
pub mod theme;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use engine::{
    Container, DrawFn, FocusCallbacks, LifecycleFn, NavigationHook, View, ViewId, ViewTree,
};

pub use markup::{
    Element, apply_attribute, create_from_name, forward_attribute, forward_attribute_as_is,
    inflate, is_attribute_valid, register_builtin_views, register_view,
};

pub use render::{Canvas, Cell, CellCanvas, FrameContext};

pub use tasks::{Clock, DelayId, MonotonicClock, Task, TaskScheduler};

pub use platform::{
    AudioPlayer, Button, InputEvent, InputManager, NullAudioPlayer, Platform, Sound, VideoContext,
};

pub use app::App;
pub use theme::Style;
