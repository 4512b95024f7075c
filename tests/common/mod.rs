//! In-memory page and operator used by the integration tests
//!
//! `FakePage` recognizes the automation scripts by the markers they contain
//! and emulates the application state they touch.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use codegen_bridge::driver::{FrameCandidate, FrameRef, Key, PageDriver};
use codegen_bridge::extractor::{CODE_TAB_SCRIPT, EDITOR_TEXT_SCRIPT};
use codegen_bridge::operator::OperatorConsole;
use codegen_bridge::overlay::{INJECT_SCRIPT, PRESENT_SCRIPT, READY_SCRIPT};
use codegen_bridge::{BridgeError, BridgeResult, Config};

pub const APP_URL: &str = "https://app.example/flash";
pub const SIGN_IN_URL: &str = "https://accounts.google.com/v3/signin/identifier";

/// A child frame and the composer signatures it contains
#[derive(Debug, Clone)]
pub struct FakeFrame {
    pub id: String,
    pub url: String,
    pub signatures: Vec<&'static str>,
    /// Every evaluation in this frame fails
    pub detached: bool,
}

impl FakeFrame {
    pub fn new(id: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            url: url.to_string(),
            signatures: Vec::new(),
            detached: false,
        }
    }

    pub fn with_signature(mut self, signature: &'static str) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }
}

/// A fill the page received
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub frame: FrameRef,
    pub signature: &'static str,
    pub value: String,
}

#[derive(Debug, Default)]
struct State {
    gotos: usize,
    /// current_url stays on the identity provider until this many navigations
    signed_in_after_gotos: usize,
    body_text: String,
    html: String,
    frames: Vec<FakeFrame>,
    main_signatures: Vec<&'static str>,
    viewport: (f64, f64),

    control_nodes: usize,
    injections: usize,
    ready: bool,
    ready_checks: usize,
    ready_after_checks: Option<usize>,
    vanish_on_presence_check: Option<usize>,
    presence_checks: usize,
    /// Presence checks whose evaluation errors
    failing_presence_checks: Vec<usize>,

    has_code_tab: bool,
    code_view: bool,
    files: Vec<(String, String)>,
    active_file: Option<String>,
    /// Extra prose shown under the file tree
    code_view_note: String,
    /// Files whose editor read errors
    unreadable_files: Vec<String>,

    fills: Vec<Fill>,
    evaluated_frames: Vec<FrameRef>,
    keys: Vec<Key>,
    clicks: Vec<(f64, f64)>,
    clipboard: Option<String>,
    screenshots: Vec<(PathBuf, bool)>,
}

pub struct FakePage {
    state: Mutex<State>,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                body_text: "Describe the UI you want to build".to_string(),
                html: "<html><body></body></html>".to_string(),
                viewport: (1440.0, 900.0),
                has_code_tab: true,
                ..State::default()
            }),
        }
    }

    pub fn with_frame(self, frame: FakeFrame) -> Self {
        self.state.lock().frames.push(frame);
        self
    }

    pub fn with_main_signature(self, signature: &'static str) -> Self {
        self.state.lock().main_signatures.push(signature);
        self
    }

    pub fn with_files(self, files: &[(&str, &str)]) -> Self {
        self.state.lock().files = files
            .iter()
            .map(|(name, text)| (name.to_string(), text.to_string()))
            .collect();
        self
    }

    pub fn with_body_text(self, text: &str) -> Self {
        self.state.lock().body_text = text.to_string();
        self
    }

    pub fn with_html(self, html: &str) -> Self {
        self.state.lock().html = html.to_string();
        self
    }

    pub fn without_code_tab(self) -> Self {
        self.state.lock().has_code_tab = false;
        self
    }

    /// Redirect to the identity provider until `gotos` navigations happened
    pub fn signed_in_after_gotos(self, gotos: usize) -> Self {
        self.state.lock().signed_in_after_gotos = gotos;
        self
    }

    /// The operator clicks the overlay button on the n-th readiness check
    pub fn ready_after_checks(self, checks: usize) -> Self {
        self.state.lock().ready_after_checks = Some(checks);
        self
    }

    /// The application re-renders away the overlay before the n-th presence check
    pub fn vanish_overlay_on_check(self, check: usize) -> Self {
        self.state.lock().vanish_on_presence_check = Some(check);
        self
    }

    /// Presence checks numbered in `checks` fail as if the page were re-rendering
    pub fn fail_presence_checks(self, checks: &[usize]) -> Self {
        self.state.lock().failing_presence_checks = checks.to_vec();
        self
    }

    /// Prose the code view shows after the file names
    pub fn with_code_view_note(self, note: &str) -> Self {
        self.state.lock().code_view_note = note.to_string();
        self
    }

    /// Reading the editor while `name` is open fails
    pub fn unreadable_file(self, name: &str) -> Self {
        self.state.lock().unreadable_files.push(name.to_string());
        self
    }

    pub fn fills(&self) -> Vec<Fill> {
        self.state.lock().fills.clone()
    }

    pub fn keys(&self) -> Vec<Key> {
        self.state.lock().keys.clone()
    }

    pub fn enter_presses(&self) -> usize {
        self.state.lock().keys.iter().filter(|k| **k == Key::Enter).count()
    }

    pub fn clicks(&self) -> Vec<(f64, f64)> {
        self.state.lock().clicks.clone()
    }

    pub fn clipboard(&self) -> Option<String> {
        self.state.lock().clipboard.clone()
    }

    pub fn control_nodes(&self) -> usize {
        self.state.lock().control_nodes
    }

    pub fn injections(&self) -> usize {
        self.state.lock().injections
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    /// Operator clicks the overlay button
    pub fn click_ready(&self) {
        let mut state = self.state.lock();
        if state.control_nodes > 0 {
            state.ready = true;
        }
    }

    pub fn gotos(&self) -> usize {
        self.state.lock().gotos
    }

    pub fn evaluated_frames(&self) -> Vec<FrameRef> {
        self.state.lock().evaluated_frames.clone()
    }

    pub fn screenshots(&self) -> Vec<(PathBuf, bool)> {
        self.state.lock().screenshots.clone()
    }
}

/// Value embedded as the trailing call argument `...})(<json>)`
fn trailing_argument(script: &str) -> Option<String> {
    let start = script.rfind("})(")? + 3;
    let end = script.len().checked_sub(1)?;
    serde_json::from_str(script.get(start..end)?).ok()
}

fn fill_signature(script: &str) -> &'static str {
    if script.contains(".floating-input-container") {
        "floating-input"
    } else if script.contains(".input-wrapper") {
        "wrapper-input"
    } else if script.contains("textarea") {
        "main-input"
    } else {
        "fallback-input"
    }
}

impl State {
    fn current_url(&self) -> &str {
        if self.gotos < self.signed_in_after_gotos {
            SIGN_IN_URL
        } else {
            APP_URL
        }
    }

    fn visible_text(&self) -> String {
        if self.gotos < self.signed_in_after_gotos {
            return "Sign in to continue to the app".to_string();
        }
        if self.code_view {
            let names: Vec<&str> = self.files.iter().map(|(name, _)| name.as_str()).collect();
            return format!(
                "Preview Code\n{}\n{}\n{}",
                names.join("\n"),
                names.join(" "),
                self.code_view_note
            );
        }
        self.body_text.clone()
    }

    fn signatures(&self, frame: &FrameRef) -> BridgeResult<Vec<&'static str>> {
        match frame {
            FrameRef::Main => Ok(self.main_signatures.clone()),
            FrameRef::Child(id) => {
                let found = self
                    .frames
                    .iter()
                    .find(|f| &f.id == id)
                    .ok_or_else(|| BridgeError::Page(format!("no frame {}", id)))?;
                if found.detached {
                    return Err(BridgeError::Page(format!("frame {} detached", id)));
                }
                Ok(found.signatures.clone())
            }
        }
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, _url: &str) -> Result<(), BridgeError> {
        let mut state = self.state.lock();
        state.gotos += 1;
        state.control_nodes = 0;
        state.code_view = false;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BridgeError> {
        Ok(self.state.lock().current_url().to_string())
    }

    async fn frames(&self) -> Result<Vec<FrameCandidate>, BridgeError> {
        let state = self.state.lock();
        let mut frames = vec![FrameCandidate {
            frame: FrameRef::Main,
            url: state.current_url().to_string(),
        }];
        frames.extend(state.frames.iter().map(|f| FrameCandidate {
            frame: FrameRef::Child(f.id.clone()),
            url: f.url.clone(),
        }));
        Ok(frames)
    }

    async fn evaluate(&self, frame: &FrameRef, script: &str) -> Result<Value, BridgeError> {
        let mut state = self.state.lock();
        state.evaluated_frames.push(frame.clone());

        if script.contains("performance.getEntriesByType") {
            return Ok(json!(12));
        }

        if script == INJECT_SCRIPT {
            state.control_nodes = 1;
            state.injections += 1;
            state.ready = false;
            return Ok(json!(true));
        }
        if script == PRESENT_SCRIPT {
            state.presence_checks += 1;
            if state.failing_presence_checks.contains(&state.presence_checks) {
                return Err(BridgeError::Page("execution context destroyed".into()));
            }
            if state.vanish_on_presence_check == Some(state.presence_checks) {
                state.control_nodes = 0;
            }
            return Ok(json!(state.control_nodes > 0));
        }
        if script == READY_SCRIPT {
            state.ready_checks += 1;
            if state.ready_after_checks == Some(state.ready_checks) && state.control_nodes > 0 {
                state.ready = true;
            }
            return Ok(json!(state.ready));
        }

        if script == CODE_TAB_SCRIPT {
            state.code_view = state.has_code_tab;
            return Ok(json!(state.has_code_tab));
        }
        if script == EDITOR_TEXT_SCRIPT {
            let active = state.active_file.clone();
            if let Some(name) = &active
                && state.unreadable_files.contains(name)
            {
                return Err(BridgeError::Page(format!("editor for {} detached", name)));
            }
            let text = active.and_then(|name| {
                state
                    .files
                    .iter()
                    .find(|(file, _)| *file == name)
                    .map(|(_, text)| text.clone())
            });
            return Ok(text.map(Value::String).unwrap_or(Value::Null));
        }
        if script.contains("querySelectorAll('body *')") && script.contains("target.click()") {
            let name = trailing_argument(script).unwrap_or_default();
            let exists = state.code_view && state.files.iter().any(|(file, _)| *file == name);
            if exists {
                state.active_file = Some(name);
            }
            return Ok(json!(exists));
        }

        if script.contains("descriptor.set.call") {
            let signature = fill_signature(script);
            let present = state.signatures(frame)?.contains(&signature);
            if present {
                let value = trailing_argument(script).unwrap_or_default();
                state.fills.push(Fill {
                    frame: frame.clone(),
                    signature,
                    value,
                });
            }
            return Ok(json!(present));
        }

        if script.contains("document.body ? document.body.innerText") {
            state.signatures(frame)?;
            return Ok(json!(state.visible_text()));
        }

        // Surveys, modal checks and anything else the page does not model
        state.signatures(frame)?;
        Ok(Value::Null)
    }

    async fn content(&self) -> Result<String, BridgeError> {
        Ok(self.state.lock().html.clone())
    }

    async fn viewport(&self) -> Result<(f64, f64), BridgeError> {
        Ok(self.state.lock().viewport)
    }

    async fn click_at(&self, x: f64, y: f64) -> Result<(), BridgeError> {
        self.state.lock().clicks.push((x, y));
        Ok(())
    }

    async fn press_key(&self, key: Key) -> Result<(), BridgeError> {
        self.state.lock().keys.push(key);
        Ok(())
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), BridgeError> {
        self.state.lock().clipboard = Some(text.to_string());
        Ok(())
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), BridgeError> {
        self.state.lock().screenshots.push((path.to_path_buf(), full_page));
        Ok(())
    }
}

/// Operator that acknowledges every prompt immediately
#[derive(Default)]
pub struct ScriptedOperator {
    messages: Mutex<Vec<String>>,
}

impl ScriptedOperator {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl OperatorConsole for ScriptedOperator {
    async fn confirm(&self, message: &str) -> BridgeResult<()> {
        self.messages.lock().push(message.to_string());
        Ok(())
    }
}

/// Defaults with artifacts under `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.app.url = APP_URL.to_string();
    config.extraction.artifact_dir = Some(dir.to_path_buf());
    config
}

/// Editor text long enough to be kept
pub fn long_source(name: &str) -> String {
    format!(
        "// {name}\nexport default function Component() {{\n  return <main className=\"pricing\">Plans</main>;\n}}\n"
    )
}

pub fn file_map(result: &codegen_bridge::ExtractionResult) -> HashMap<String, String> {
    result.files.clone().into_iter().collect()
}
