//! App runtime - platform, tree and scheduler behind one frame loop.
//!
//! One [`App::frame`] call is one main-loop iteration: pump the platform,
//! route directional input through focus navigation, drain the scheduler's
//! render-tick queues, recompute layout when dirty, then run the culled
//! draw pass.

use crate::engine::{ViewId, ViewTree};
use crate::markup::{self, Element};
use crate::platform::{Button, InputEvent, Platform, Sound};
use crate::render::FrameContext;
use crate::tasks::TaskScheduler;
use crate::theme::Style;

pub struct App {
    tree: ViewTree,
    scheduler: TaskScheduler,
    platform: Box<dyn Platform>,
    style: Style,
    frame_index: u64,
}

impl App {
    pub fn new(platform: Box<dyn Platform>) -> Self {
        markup::register_builtin_views();
        Self {
            tree: ViewTree::new(),
            scheduler: TaskScheduler::new(),
            platform,
            style: Style::default(),
            frame_index: 0,
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ViewTree {
        &mut self.tree
    }

    pub fn scheduler(&self) -> &TaskScheduler {
        &self.scheduler
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Install a root view and hand it default focus.
    pub fn set_root(&mut self, root: ViewId) {
        self.tree.set_root(root);
        self.tree.give_focus(root);
    }

    /// Inflate a markup element and install it as the root.
    pub fn inflate_root(&mut self, element: &Element) -> ViewId {
        let root = markup::inflate(&mut self.tree, element);
        self.set_root(root);
        root
    }

    // =========================================================================
    // Frame loop
    // =========================================================================

    /// Run one main-loop iteration. Returns false when the app should exit.
    pub fn frame(&mut self) -> bool {
        let mut running = self.platform.main_loop_iteration();

        for event in self.platform.input_manager().drain_events() {
            match event {
                InputEvent::Button(button) => self.handle_button(button),
                InputEvent::Resize(_, _) => self.tree.invalidate(),
                InputEvent::Quit => running = false,
            }
        }

        self.scheduler.perform_sync_tasks();

        let (width, height) = self.platform.video_context().size();
        if self.tree.is_dirty() {
            self.tree.compute_layout(width, height);
        }

        self.frame_index += 1;
        let frame = FrameContext {
            frame: self.frame_index,
            window: (width, height),
        };

        let video = self.platform.video_context();
        video.begin_frame();
        self.tree.draw(video.canvas(), &self.style, &frame);
        video.end_frame();

        running
    }

    /// Run frames until the platform or an event asks to quit, then stop
    /// the scheduler.
    pub fn run(&mut self) {
        while self.frame() {}
        self.scheduler.stop();
    }

    fn handle_button(&mut self, button: Button) {
        let Some(direction) = button.focus_direction() else {
            if button == Button::Ok {
                self.platform.audio_player().play(Sound::Click);
            }
            return;
        };

        if self.tree.focused().is_none() {
            // Nothing holds focus yet; directional input lands on the
            // root's default focus.
            if let Some(root) = self.tree.root() {
                self.tree.give_focus(root);
                if self.tree.focused().is_some() {
                    self.platform.audio_player().play(Sound::FocusChange);
                }
            }
            return;
        }

        let sound = match self.tree.navigate(direction) {
            Some(_) => Sound::FocusChange,
            None => Sound::FocusError,
        };
        self.platform.audio_player().play(sound);
    }
}

// =============================================================================
// Tests
// =============================================================================
