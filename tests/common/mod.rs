#![allow(dead_code)]

use mathmemo::{
    app::AppState,
    clipboard::MemoryClipboard,
    config::AppConfig,
    render::{ChannelError, ChannelEvent, RenderChannel},
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

/// A 2:1 box in MathJax's style: sized in ex, painted with `currentColor`.
pub const BOX_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4ex" height="2ex" viewBox="0 -750 2000 1000"><rect x="0" y="-750" width="2000" height="1000" fill="currentColor"/></svg>"#;

#[derive(Debug, Default)]
pub struct FakeState {
    /// Every formula ever submitted, in order.
    pub submitted: Vec<String>,
    /// Submitted and not yet answered, oldest first.
    pub outstanding: VecDeque<String>,
    pub max_outstanding: usize,
    pub refuse: bool,
}

/// Channel half handed to the code under test.
pub struct FakeChannel {
    state: Rc<RefCell<FakeState>>,
}

impl RenderChannel for FakeChannel {
    fn submit(&mut self, formula: &str) -> Result<(), ChannelError> {
        let mut state = self.state.borrow_mut();
        if state.refuse {
            return Err(ChannelError::NotConnected);
        }
        state.submitted.push(formula.to_string());
        state.outstanding.push_back(formula.to_string());
        state.max_outstanding = state.max_outstanding.max(state.outstanding.len());
        Ok(())
    }
}

/// Test side of the fake engine: answers submissions by hand.
pub struct FakeEngine {
    pub state: Rc<RefCell<FakeState>>,
    pub events: Sender<ChannelEvent>,
}

impl FakeEngine {
    pub fn new() -> (Self, FakeChannel, Receiver<ChannelEvent>) {
        let (events, receiver) = mpsc::channel();
        let state = Rc::new(RefCell::new(FakeState::default()));
        let channel = FakeChannel {
            state: Rc::clone(&state),
        };
        (Self { state, events }, channel, receiver)
    }

    pub fn ready(&self) {
        self.events.send(ChannelEvent::Ready).unwrap();
    }

    pub fn submitted(&self) -> Vec<String> {
        self.state.borrow().submitted.clone()
    }

    pub fn max_outstanding(&self) -> usize {
        self.state.borrow().max_outstanding
    }

    /// Renders the oldest outstanding formula. Returns it.
    pub fn complete_next(&self) -> Option<String> {
        let formula = self.state.borrow_mut().outstanding.pop_front()?;
        self.events
            .send(ChannelEvent::Rendered {
                formula: formula.clone(),
                markup: BOX_SVG.as_bytes().to_vec(),
            })
            .unwrap();
        Some(formula)
    }

    pub fn fail_next(&self, message: &str) -> Option<String> {
        let formula = self.state.borrow_mut().outstanding.pop_front()?;
        self.events
            .send(ChannelEvent::Failed {
                formula: formula.clone(),
                message: message.to_string(),
            })
            .unwrap();
        Some(formula)
    }

    /// Sends a result nobody asked for.
    pub fn send_unrequested(&self, formula: &str) {
        self.events
            .send(ChannelEvent::Rendered {
                formula: formula.to_string(),
                markup: BOX_SVG.as_bytes().to_vec(),
            })
            .unwrap();
    }
}

pub struct Harness {
    pub app: AppState,
    pub engine: FakeEngine,
    pub clipboard: MemoryClipboard,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let (engine, channel, receiver) = FakeEngine::new();
        let clipboard = MemoryClipboard::new();
        let mut app = AppState::new(
            config,
            Box::new(channel),
            receiver,
            Box::new(clipboard.clone()),
        );
        engine.ready();
        app.pump(Instant::now());
        Self {
            app,
            engine,
            clipboard,
        }
    }

    pub fn pump(&mut self) {
        self.app.pump(Instant::now());
    }

    /// Answers every submission, including the ones answers trigger.
    pub fn render_all(&mut self) {
        while self.engine.complete_next().is_some() {
            self.pump();
        }
    }

    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            mathmemo::actions::type_char(&mut self.app, c);
        }
    }

    /// A harness whose list holds rendered `formulas`, none selected for edit.
    pub fn with_entries(formulas: &[&str]) -> Self {
        let mut harness = Self::new();
        let formulas: Vec<String> = formulas.iter().map(|f| f.to_string()).collect();
        harness.app.enqueue_formulas(&formulas);
        harness.render_all();
        harness
    }
}
