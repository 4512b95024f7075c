//! Page survey and screenshot checkpoints
//!
//! Neither affects the flow. They exist so an operator can tell why the
//! composer was not found after the application changed its layout.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Config;
use crate::driver::{FrameRef, PageDriver};
use crate::utils::BridgeResult;

pub const SURVEY_SCRIPT: &str = r#"(() => {
  const box = (el) => {
    const r = el.getBoundingClientRect();
    return { x: Math.round(r.x), y: Math.round(r.y), w: Math.round(r.width), h: Math.round(r.height) };
  };
  const iframes = Array.from(document.querySelectorAll('iframe')).map((el) => ({
    src: el.src || '',
    id: el.id || '',
    className: String(el.className || ''),
  }));
  const inputs = Array.from(document.querySelectorAll('input, textarea')).map((el) => {
    const rect = box(el);
    return {
      tag: el.tagName,
      type: el.type || '',
      placeholder: el.placeholder || '',
      visible: rect.w > 0 && rect.h > 0,
      rect,
    };
  });
  const bottomEdge = window.innerHeight - 200;
  const bottomElements = [];
  for (const el of document.querySelectorAll('body *')) {
    const rect = box(el);
    if (rect.y > bottomEdge && rect.w > 100 && rect.h > 20 && rect.h < 100) {
      bottomElements.push({
        tag: el.tagName,
        className: String(el.className || '').substring(0, 50),
        text: (el.innerText || '').substring(0, 30),
        rect,
      });
    }
  }
  return { iframes, inputs, bottomElements };
})()"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IframeSummary {
    pub src: String,
    pub id: String,
    pub class_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSummary {
    pub tag: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub placeholder: String,
    pub visible: bool,
    pub rect: Rect,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeElement {
    pub tag: String,
    pub class_name: String,
    pub text: String,
    pub rect: Rect,
}

/// Frames, fields and bottom-edge elements of the top-level document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSurvey {
    #[serde(default)]
    pub iframes: Vec<IframeSummary>,
    #[serde(default)]
    pub inputs: Vec<InputSummary>,
    /// Elements in the bottom 200px of the viewport, where the composer sits
    #[serde(default)]
    pub bottom_elements: Vec<EdgeElement>,
}

pub async fn survey_page(driver: &dyn PageDriver) -> BridgeResult<PageSurvey> {
    let value = driver.evaluate(&FrameRef::Main, SURVEY_SCRIPT).await?;
    Ok(serde_json::from_value(value)?)
}

pub fn log_survey(survey: &PageSurvey) {
    info!(
        "Page survey: {} iframes, {} inputs, {} bottom-edge elements",
        survey.iframes.len(),
        survey.inputs.len(),
        survey.bottom_elements.len()
    );
    for frame in &survey.iframes {
        debug!("  iframe src={} id={}", frame.src, frame.id);
    }
    for input in &survey.inputs {
        debug!(
            "  {} type={} placeholder={:?} visible={} at ({}, {}) {}x{}",
            input.tag,
            input.kind,
            input.placeholder,
            input.visible,
            input.rect.x,
            input.rect.y,
            input.rect.w,
            input.rect.h
        );
    }
    for el in &survey.bottom_elements {
        debug!("  bottom {}.{} {:?}", el.tag, el.class_name, el.text);
    }
}

/// Screenshot sink under the artifact directory
#[derive(Debug, Clone)]
pub struct Checkpoints {
    dir: PathBuf,
    enabled: bool,
}

impl Checkpoints {
    pub fn new(dir: PathBuf, enabled: bool) -> Self {
        Self { dir, enabled }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.artifact_dir(), config.extraction.screenshots)
    }

    /// Save a screenshot as `name`; failures are only logged
    pub async fn capture(
        &self,
        driver: &dyn PageDriver,
        name: &str,
        full_page: bool,
    ) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        let path = self.dir.join(name);
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!("Cannot create {}: {}", self.dir.display(), e);
            return None;
        }
        match driver.screenshot(&path, full_page).await {
            Ok(()) => {
                info!("Screenshot: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Screenshot {} failed: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn survey_parses_page_payload() {
        let payload = json!({
            "iframes": [{ "src": "https://sandbox.example/", "id": "", "className": "preview" }],
            "inputs": [{
                "tag": "INPUT", "type": "text", "placeholder": "Describe your app",
                "visible": true, "rect": { "x": 620, "y": 780, "w": 480, "h": 40 }
            }],
            "bottomElements": []
        });
        let survey: PageSurvey = serde_json::from_value(payload).unwrap();
        assert_eq!(survey.iframes[0].class_name, "preview");
        assert_eq!(survey.inputs[0].kind, "text");
        assert_eq!(survey.inputs[0].rect.w, 480);
        assert!(survey.bottom_elements.is_empty());
    }
}
