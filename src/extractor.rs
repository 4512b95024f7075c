//! Pulling generated source files out of the application's code view
//!
//! The code view shows a file tree next to an editor. File names are taken
//! from the visible page text, then each one is clicked and the editor's text
//! is read back.

use std::sync::LazyLock;
use std::time::Duration;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::TimingConfig;
use crate::diagnostics::Checkpoints;
use crate::driver::{FrameRef, PageDriver};
use crate::navigator::BODY_TEXT_SCRIPT;
use crate::utils::BridgeResult;
use crate::utils::constants::{CODE_TAB_SCREENSHOT, RESULT_SCREENSHOT};

/// `stem.ext` where the stem starts with a letter; longest extension first
static FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[a-zA-Z][a-zA-Z0-9_-]*\.(?i:tsx|ts|jsx|js|css|html|json)\b")
        .expect("file name pattern is a valid regex")
});

/// Clicks the first tab or button labelled exactly "Code"
pub const CODE_TAB_SCRIPT: &str = r#"(() => {
  for (const el of document.querySelectorAll('button, [role="tab"]')) {
    if ((el.innerText || '').trim() === 'Code') {
      el.click();
      return true;
    }
  }
  return false;
})()"#;

/// Editor text, or its rendered lines joined when no editor root is found
pub const EDITOR_TEXT_SCRIPT: &str = r#"(() => {
  const editor = document.querySelector('.cm-content, .monaco-editor, pre code, .view-lines');
  if (editor) return editor.innerText;
  const lines = document.querySelectorAll('.cm-line, .view-line');
  if (lines.length > 0) return Array.from(lines).map((line) => line.textContent).join('\n');
  return null;
})()"#;

/// Script clicking the element labelled exactly `name`
///
/// Takes the first match in document order, then descends into its deepest
/// descendant with the same label so the click lands on the tree row itself.
pub fn activate_file_script(name: &str) -> BridgeResult<String> {
    Ok(format!(
        r#"((name) => {{
  const matches = Array.from(document.querySelectorAll('body *'))
    .filter((el) => (el.innerText || '').trim() === name);
  if (matches.length === 0) return false;
  let target = matches[0];
  for (const el of matches) {{
    if (target.contains(el)) target = el;
  }}
  target.click();
  return true;
}})({})"#,
        serde_json::to_string(name)?
    ))
}

/// Candidate file names in first-seen order, without duplicates
pub fn scan_file_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for found in FILE_NAME.find_iter(text) {
        let name = found.as_str();
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Files pulled from the code view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Name to text in extraction order, only for files whose text exceeded
    /// the minimum length
    pub files: IndexMap<String, String>,

    /// Every candidate name, in first-seen order
    #[serde(rename = "fileList")]
    pub file_list: Vec<String>,

    /// Visible page text at extraction time
    #[serde(rename = "fullText")]
    pub full_text: String,
}

pub struct CodeExtractor<'a> {
    driver: &'a dyn PageDriver,
    timing: &'a TimingConfig,
    min_file_chars: usize,
    checkpoints: &'a Checkpoints,
}

impl<'a> CodeExtractor<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        timing: &'a TimingConfig,
        min_file_chars: usize,
        checkpoints: &'a Checkpoints,
    ) -> Self {
        Self {
            driver,
            timing,
            min_file_chars,
            checkpoints,
        }
    }

    pub async fn extract_all(&self) -> BridgeResult<ExtractionResult> {
        info!("Switching to the Code tab...");
        match self.driver.evaluate(&FrameRef::Main, CODE_TAB_SCRIPT).await? {
            Value::Bool(true) => {}
            _ => warn!("No Code tab found, reading the current view"),
        }
        tokio::time::sleep(Duration::from_millis(self.timing.code_tab_settle_ms)).await;
        self.checkpoints
            .capture(self.driver, CODE_TAB_SCREENSHOT, false)
            .await;

        let file_list = scan_file_names(&self.body_text().await?);
        info!("Found {} files: {}", file_list.len(), file_list.join(", "));

        let mut files = IndexMap::new();
        for name in &file_list {
            match self.read_file(name).await {
                Ok(Some(code)) if code.chars().count() > self.min_file_chars => {
                    info!("  {} ({} chars)", name, code.chars().count());
                    files.insert(name.clone(), code);
                }
                Ok(Some(code)) => debug!("  {} too short ({} chars), skipped", name, code.chars().count()),
                Ok(None) => debug!("  {} not openable or empty, skipped", name),
                Err(e) => warn!("  {}: {}", name, e),
            }
        }

        let full_text = self.full_text().await?;
        self.checkpoints
            .capture(self.driver, RESULT_SCREENSHOT, true)
            .await;

        Ok(ExtractionResult {
            files,
            file_list,
            full_text,
        })
    }

    /// Editor text for `name`, or `None` when nothing on the page opens it
    ///
    /// Names seen only in prose have no element of their own; reading the
    /// editor then would return whichever file was open before.
    async fn read_file(&self, name: &str) -> BridgeResult<Option<String>> {
        let activate = activate_file_script(name)?;
        if self.driver.evaluate(&FrameRef::Main, &activate).await? != Value::Bool(true) {
            debug!("No element labelled {}", name);
            return Ok(None);
        }
        tokio::time::sleep(Duration::from_millis(self.timing.file_settle_ms)).await;

        match self.driver.evaluate(&FrameRef::Main, EDITOR_TEXT_SCRIPT).await? {
            Value::String(code) => Ok(Some(code)),
            _ => Ok(None),
        }
    }

    async fn body_text(&self) -> BridgeResult<String> {
        match self.driver.evaluate(&FrameRef::Main, BODY_TEXT_SCRIPT).await? {
            Value::String(text) => Ok(text),
            _ => Ok(String::new()),
        }
    }

    /// Body text, or the document converted to text when nothing is rendered
    async fn full_text(&self) -> BridgeResult<String> {
        let text = self.body_text().await?;
        if !text.trim().is_empty() {
            return Ok(text);
        }
        debug!("Body text empty, converting page HTML");
        let html = self.driver.content().await?;
        Ok(html2md::parse_html(&html))
    }
}
