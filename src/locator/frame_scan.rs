//! Composer search across every frame of the page

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{FillConfidence, InputTarget, LocateStrategy, fill_element_script};
use crate::driver::PageDriver;
use crate::utils::BridgeResult;
use crate::utils::constants::SKIPPED_FRAME_MARKERS;

/// How a probe finds its element inside one frame
#[derive(Debug, Clone)]
pub enum ProbeMatch {
    /// First element matching a CSS selector
    Selector(&'static str),
    /// First text input wider than 100px that is not the edit sidebar
    WideTextInput,
}

/// One element signature tried inside a frame
#[derive(Debug, Clone)]
pub struct FrameProbe {
    pub name: &'static str,
    pub matcher: ProbeMatch,
}

impl FrameProbe {
    pub const fn selector(name: &'static str, selector: &'static str) -> Self {
        Self {
            name,
            matcher: ProbeMatch::Selector(selector),
        }
    }

    /// Script that fills the matched element and yields true, or yields false
    pub fn script(&self, prompt: &str) -> BridgeResult<String> {
        let finder = match &self.matcher {
            ProbeMatch::Selector(selector) => {
                format!("document.querySelector({})", serde_json::to_string(selector)?)
            }
            ProbeMatch::WideTextInput => "Array.from(document.querySelectorAll('input[type=\"text\"]'))\
                 .find((el) => el.getBoundingClientRect().width > 100 && \
                 !(el.placeholder || '').includes('Make changes'))"
                .to_string(),
        };
        fill_element_script(&finder, prompt)
    }
}

/// The application's composer signatures, most specific first
pub fn default_probes() -> Vec<FrameProbe> {
    vec![
        FrameProbe::selector(
            "floating-input",
            ".floating-input-container input[type=\"text\"]",
        ),
        FrameProbe::selector("wrapper-input", ".input-wrapper input[type=\"text\"]"),
        FrameProbe {
            name: "fallback-input",
            matcher: ProbeMatch::WideTextInput,
        },
    ]
}

/// Frame URLs that never host the composer
pub fn is_skipped_frame(url: &str) -> bool {
    SKIPPED_FRAME_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Tries each probe in each frame, in frame order then probe order
pub struct FrameScan {
    probes: Vec<FrameProbe>,
}

impl FrameScan {
    pub fn new(probes: Vec<FrameProbe>) -> Self {
        Self { probes }
    }
}

impl Default for FrameScan {
    fn default() -> Self {
        Self::new(default_probes())
    }
}

#[async_trait]
impl LocateStrategy for FrameScan {
    fn name(&self) -> &'static str {
        "frame-scan"
    }

    async fn try_fill(
        &self,
        driver: &dyn PageDriver,
        prompt: &str,
    ) -> BridgeResult<Option<(InputTarget, FillConfidence)>> {
        let scripts = self
            .probes
            .iter()
            .map(|probe| probe.script(prompt).map(|script| (probe.name, script)))
            .collect::<BridgeResult<Vec<_>>>()?;

        let frames = driver.frames().await?;
        debug!("Scanning {} frames for the composer", frames.len());

        for candidate in frames {
            if is_skipped_frame(&candidate.url) {
                debug!("Skipping {} ({})", candidate.frame, candidate.url);
                continue;
            }

            for (name, script) in &scripts {
                match driver.evaluate(&candidate.frame, script).await {
                    Ok(Value::Bool(true)) => {
                        debug!("Filled {} in {} ({})", name, candidate.frame, candidate.url);
                        let target = InputTarget {
                            strategy: *name,
                            frame: candidate.frame,
                        };
                        return Ok(Some((target, FillConfidence::High)));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Frame {} not probeable: {}", candidate.frame, e);
                        break;
                    }
                }
            }
        }
        Ok(None)
    }
}
