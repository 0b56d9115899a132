//! Platform module - the windowing/input/audio contract.
//!
//! The core never talks to a concrete windowing toolkit: it consumes
//! capability providers behind the [`Platform`] trait - one main-loop pump
//! step, an input manager yielding directional button events, a video
//! context wrapping a [`Canvas`](crate::render::Canvas), and an audio
//! player for fire-and-forget cues.
//!
//! Two implementations ship with the crate: a crossterm-backed
//! [`terminal::TerminalPlatform`] and a [`headless::HeadlessPlatform`] for
//! tests and tooling.

pub mod headless;
pub mod terminal;

use crate::render::Canvas;
use crate::types::FocusDirection;

// =============================================================================
// Input
// =============================================================================

/// Abstract button vocabulary for directional (d-pad / remote) control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    Ok,
    Back,
}

impl Button {
    /// The focus direction a button maps to, when it is directional.
    pub fn focus_direction(self) -> Option<FocusDirection> {
        match self {
            Self::Up => Some(FocusDirection::Up),
            Self::Down => Some(FocusDirection::Down),
            Self::Left => Some(FocusDirection::Left),
            Self::Right => Some(FocusDirection::Right),
            Self::Ok | Self::Back => None,
        }
    }
}

/// Events the core consumes from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Button(Button),
    /// New window size.
    Resize(u16, u16),
    Quit,
}

/// Queue of already-translated input events.
pub trait InputManager {
    /// Take every event received since the last drain, in arrival order.
    fn drain_events(&mut self) -> Vec<InputEvent>;
}

// =============================================================================
// Video
// =============================================================================

/// Access to the drawing surface for one frame.
pub trait VideoContext {
    /// Current surface size in canvas units.
    fn size(&self) -> (f32, f32);

    fn begin_frame(&mut self);

    fn canvas(&mut self) -> &mut dyn Canvas;

    /// Present the frame.
    fn end_frame(&mut self);
}

// =============================================================================
// Audio
// =============================================================================

/// Fire-and-forget sound cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    FocusChange,
    FocusError,
    Click,
}

pub trait AudioPlayer {
    /// Play a cue. Returns whether the platform actually emitted it.
    fn play(&mut self, sound: Sound) -> bool;
}

/// Audio player that swallows every cue.
pub struct NullAudioPlayer;

impl AudioPlayer for NullAudioPlayer {
    fn play(&mut self, _sound: Sound) -> bool {
        false
    }
}

// =============================================================================
// Platform
// =============================================================================

/// The platform contract consumed by the core.
pub trait Platform {
    /// Pump platform events into the input manager. Returns false when the
    /// platform wants the main loop to exit.
    fn main_loop_iteration(&mut self) -> bool;

    fn input_manager(&mut self) -> &mut dyn InputManager;

    fn video_context(&mut self) -> &mut dyn VideoContext;

    fn audio_player(&mut self) -> &mut dyn AudioPlayer;
}
