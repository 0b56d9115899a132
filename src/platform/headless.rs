//! Headless platform - scripted input, in-memory canvas, recorded audio.
//!
//! Drives the full frame path without a terminal: tests queue input events,
//! tick the app, then inspect the shared cell canvas and the recorded sound
//! cues.

use std::cell::RefCell;
use std::rc::Rc;

use crate::render::{Canvas, CellCanvas};
use crate::types::{Attr, Rect, Rgba};

use super::{AudioPlayer, InputEvent, InputManager, Platform, Sound, VideoContext};

// =============================================================================
// Shared canvas
// =============================================================================

/// A cell canvas behind an `Rc` so a test can keep inspecting it after the
/// platform moved into the app.
#[derive(Clone)]
pub struct SharedCanvas(Rc<RefCell<CellCanvas>>);

impl SharedCanvas {
    pub fn new(width: u16, height: u16) -> Self {
        Self(Rc::new(RefCell::new(CellCanvas::new(width, height))))
    }

    /// Run a closure against the underlying canvas.
    pub fn with<R>(&self, f: impl FnOnce(&CellCanvas) -> R) -> R {
        f(&self.0.borrow())
    }

    /// The character at a cell position (space when out of bounds).
    pub fn char_at(&self, x: u16, y: u16) -> char {
        self.0.borrow().cell(x, y).map(|cell| cell.ch).unwrap_or(' ')
    }

    /// The text content of one row, trailing spaces trimmed.
    pub fn row_text(&self, y: u16) -> String {
        let canvas = self.0.borrow();
        let text: String = canvas.row(y).iter().map(|cell| cell.ch).collect();
        text.trim_end().to_string()
    }
}

impl Canvas for SharedCanvas {
    fn size(&self) -> (f32, f32) {
        self.0.borrow().size()
    }

    fn clear(&mut self, color: Rgba) {
        self.0.borrow_mut().clear(color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.0.borrow_mut().fill_rect(rect, color);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba) {
        self.0.borrow_mut().stroke_rect(rect, color);
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str, fg: Rgba, attrs: Attr) {
        self.0.borrow_mut().draw_text(x, y, text, fg, attrs);
    }
}

// =============================================================================
// Components
// =============================================================================

struct QueuedInput {
    pending: Vec<InputEvent>,
}

impl InputManager for QueuedInput {
    fn drain_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.pending)
    }
}

struct HeadlessVideo {
    canvas: SharedCanvas,
}

impl VideoContext for HeadlessVideo {
    fn size(&self) -> (f32, f32) {
        self.canvas.size()
    }

    fn begin_frame(&mut self) {
        self.canvas.clear(Rgba::TRANSPARENT);
    }

    fn canvas(&mut self) -> &mut dyn Canvas {
        &mut self.canvas
    }

    fn end_frame(&mut self) {}
}

/// Records every cue it is asked to play.
pub struct RecordingAudioPlayer {
    played: Rc<RefCell<Vec<Sound>>>,
}

impl AudioPlayer for RecordingAudioPlayer {
    fn play(&mut self, sound: Sound) -> bool {
        self.played.borrow_mut().push(sound);
        true
    }
}

// =============================================================================
// HeadlessPlatform
// =============================================================================

pub struct HeadlessPlatform {
    input: QueuedInput,
    video: HeadlessVideo,
    audio: RecordingAudioPlayer,
    played: Rc<RefCell<Vec<Sound>>>,
}

impl HeadlessPlatform {
    pub fn new(width: u16, height: u16) -> Self {
        let played = Rc::new(RefCell::new(Vec::new()));
        Self {
            input: QueuedInput {
                pending: Vec::new(),
            },
            video: HeadlessVideo {
                canvas: SharedCanvas::new(width, height),
            },
            audio: RecordingAudioPlayer {
                played: played.clone(),
            },
            played,
        }
    }

    /// Queue an event for the next drain.
    pub fn push_event(&mut self, event: InputEvent) {
        self.input.pending.push(event);
    }

    /// Handle to the canvas, valid after the platform moves into an app.
    pub fn canvas(&self) -> SharedCanvas {
        self.video.canvas.clone()
    }

    /// Handle to the recorded sound cues.
    pub fn played_sounds(&self) -> Rc<RefCell<Vec<Sound>>> {
        self.played.clone()
    }
}

impl Platform for HeadlessPlatform {
    fn main_loop_iteration(&mut self) -> bool {
        true
    }

    fn input_manager(&mut self) -> &mut dyn InputManager {
        &mut self.input
    }

    fn video_context(&mut self) -> &mut dyn VideoContext {
        &mut self.video
    }

    fn audio_player(&mut self) -> &mut dyn AudioPlayer {
        &mut self.audio
    }
}
