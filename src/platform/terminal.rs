//! Terminal platform - the crossterm-backed reference implementation.
//!
//! Raw mode plus the alternate screen for the lifetime of the platform,
//! arrow keys translated to directional buttons, and a cell canvas flushed
//! row by row on frame end. No audio device: cues fall through to the null
//! player.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute, queue,
    style::{Attribute as TermAttribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use thiserror::Error;
use tracing::error;

use crate::render::{Canvas, Cell, CellCanvas};
use crate::types::{Attr, Rgba};

use super::{AudioPlayer, Button, InputEvent, InputManager, NullAudioPlayer, Platform, VideoContext};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("terminal io error: {0}")]
    Io(#[from] io::Error),
}

// =============================================================================
// Event conversion
// =============================================================================

/// Translate one crossterm event into the core's vocabulary.
fn convert_event(event: Event) -> Option<InputEvent> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            let button = match key.code {
                KeyCode::Up => Button::Up,
                KeyCode::Down => Button::Down,
                KeyCode::Left => Button::Left,
                KeyCode::Right => Button::Right,
                KeyCode::Enter => Button::Ok,
                KeyCode::Backspace => Button::Back,
                KeyCode::Esc | KeyCode::Char('q') => return Some(InputEvent::Quit),
                _ => return None,
            };
            Some(InputEvent::Button(button))
        }
        Event::Resize(width, height) => Some(InputEvent::Resize(width, height)),
        _ => None,
    }
}

fn to_term_color(color: Rgba) -> Color {
    if color.is_transparent() {
        Color::Reset
    } else {
        Color::Rgb {
            r: color.r,
            g: color.g,
            b: color.b,
        }
    }
}

// =============================================================================
// Input
// =============================================================================

struct TerminalInput {
    pending: Vec<InputEvent>,
}

impl InputManager for TerminalInput {
    fn drain_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.pending)
    }
}

// =============================================================================
// Video
// =============================================================================

struct TerminalVideo {
    canvas: CellCanvas,
    out: Stdout,
}

impl TerminalVideo {
    fn flush(&mut self) -> io::Result<()> {
        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.canvas.height() {
            queue!(self.out, cursor::MoveTo(0, y))?;
            for cell in self.canvas.row(y).iter().copied() {
                let Cell { ch, fg, bg, attrs } = cell;
                if last_fg != Some(fg) {
                    queue!(self.out, SetForegroundColor(to_term_color(fg)))?;
                    last_fg = Some(fg);
                }
                if last_bg != Some(bg) {
                    queue!(self.out, SetBackgroundColor(to_term_color(bg)))?;
                    last_bg = Some(bg);
                }
                if attrs != Attr::NONE {
                    for (flag, attribute) in [
                        (Attr::BOLD, TermAttribute::Bold),
                        (Attr::DIM, TermAttribute::Dim),
                        (Attr::ITALIC, TermAttribute::Italic),
                        (Attr::UNDERLINE, TermAttribute::Underlined),
                    ] {
                        if attrs.contains(flag) {
                            queue!(self.out, SetAttribute(attribute))?;
                        }
                    }
                    queue!(self.out, Print(ch), SetAttribute(TermAttribute::Reset))?;
                    // The attribute reset also dropped the colors.
                    last_fg = None;
                    last_bg = None;
                } else {
                    queue!(self.out, Print(ch))?;
                }
            }
        }

        queue!(self.out, ResetColor)?;
        self.out.flush()
    }
}

impl VideoContext for TerminalVideo {
    fn size(&self) -> (f32, f32) {
        self.canvas.size()
    }

    fn begin_frame(&mut self) {
        self.canvas.clear(Rgba::TRANSPARENT);
    }

    fn canvas(&mut self) -> &mut dyn Canvas {
        &mut self.canvas
    }

    fn end_frame(&mut self) {
        if let Err(err) = self.flush() {
            error!("terminal flush failed: {err}");
        }
    }
}

// =============================================================================
// TerminalPlatform
// =============================================================================

pub struct TerminalPlatform {
    input: TerminalInput,
    video: TerminalVideo,
    audio: NullAudioPlayer,
    quit_requested: bool,
}

impl TerminalPlatform {
    /// Enter raw mode and the alternate screen, sized to the terminal.
    pub fn new() -> Result<Self, PlatformError> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide)?;

        let (width, height) = terminal::size()?;
        Ok(Self {
            input: TerminalInput {
                pending: Vec::new(),
            },
            video: TerminalVideo {
                canvas: CellCanvas::new(width, height),
                out,
            },
            audio: NullAudioPlayer,
            quit_requested: false,
        })
    }
}

impl Platform for TerminalPlatform {
    fn main_loop_iteration(&mut self) -> bool {
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    error!("terminal event poll failed: {err}");
                    break;
                }
            }
            let raw = match event::read() {
                Ok(raw) => raw,
                Err(err) => {
                    error!("terminal event read failed: {err}");
                    break;
                }
            };
            if let Some(converted) = convert_event(raw) {
                match converted {
                    InputEvent::Quit => self.quit_requested = true,
                    InputEvent::Resize(width, height) => {
                        self.video.canvas.resize(width, height);
                    }
                    InputEvent::Button(_) => {}
                }
                self.input.pending.push(converted);
            }
        }
        !self.quit_requested
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

impl Drop for TerminalPlatform {
    fn drop(&mut self) {
        let _ = execute!(self.video.out, LeaveAlternateScreen, cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_arrow_keys_become_buttons() {
        assert_eq!(
            convert_event(key(KeyCode::Up)),
            Some(InputEvent::Button(Button::Up))
        );
        assert_eq!(
            convert_event(key(KeyCode::Right)),
            Some(InputEvent::Button(Button::Right))
        );
        assert_eq!(
            convert_event(key(KeyCode::Enter)),
            Some(InputEvent::Button(Button::Ok))
        );
    }

    #[test]
    fn test_escape_and_q_quit() {
        assert_eq!(convert_event(key(KeyCode::Esc)), Some(InputEvent::Quit));
        assert_eq!(
            convert_event(key(KeyCode::Char('q'))),
            Some(InputEvent::Quit)
        );
    }

    #[test]
    fn test_unmapped_keys_are_dropped() {
        assert_eq!(convert_event(key(KeyCode::Char('x'))), None);
        assert_eq!(convert_event(key(KeyCode::Tab)), None);
    }

    #[test]
    fn test_resize_passes_through() {
        assert_eq!(
            convert_event(Event::Resize(120, 40)),
            Some(InputEvent::Resize(120, 40))
        );
    }

    #[test]
    fn test_transparent_maps_to_reset() {
        assert_eq!(to_term_color(Rgba::TRANSPARENT), Color::Reset);
        assert_eq!(
            to_term_color(Rgba::rgb(1, 2, 3)),
            Color::Rgb { r: 1, g: 2, b: 3 }
        );
    }
}
