use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::{FillConfidence, InputTarget, LocateStrategy};
use crate::driver::{FrameRef, Key, PageDriver};
use crate::utils::BridgeResult;

/// Composer position as a fraction of the viewport
const CLICK_X_RATIO: f64 = 0.65;
const CLICK_Y_RATIO: f64 = 0.85;

/// Blind paste where the composer usually sits
///
/// Nothing confirms the text landed, so success is reported with low
/// confidence.
#[derive(Debug)]
pub struct ClickPasteStrategy {
    settle: Duration,
}

impl ClickPasteStrategy {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }
}

#[async_trait]
impl LocateStrategy for ClickPasteStrategy {
    fn name(&self) -> &'static str {
        "click-paste-fallback"
    }

    async fn try_fill(
        &self,
        driver: &dyn PageDriver,
        prompt: &str,
    ) -> BridgeResult<Option<(InputTarget, FillConfidence)>> {
        let (width, height) = driver.viewport().await?;
        let (x, y) = (width * CLICK_X_RATIO, height * CLICK_Y_RATIO);
        info!("No composer found, clicking at ({:.0}, {:.0}) and pasting", x, y);

        driver.click_at(x, y).await?;
        tokio::time::sleep(self.settle).await;

        driver.write_clipboard(prompt).await?;
        driver.press_key(Key::SelectAll).await?;
        driver.press_key(Key::Paste).await?;

        Ok(Some((
            InputTarget {
                strategy: self.name(),
                frame: FrameRef::Main,
            },
            FillConfidence::Low,
        )))
    }
}
