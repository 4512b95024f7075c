use async_trait::async_trait;
use serde_json::Value;

use super::{FillConfidence, InputTarget, LocateStrategy, fill_element_script};
use crate::driver::{FrameRef, PageDriver};
use crate::utils::BridgeResult;
use crate::utils::constants::SIDEBAR_PLACEHOLDERS;

/// Left edge (px) below which a field belongs to the edit sidebar
const MIN_LEFT_EDGE: u32 = 500;

/// Any sizeable field in the top-level document right of the edit sidebar
#[derive(Debug, Default)]
pub struct MainDocumentStrategy;

impl MainDocumentStrategy {
    fn finder() -> BridgeResult<String> {
        Ok(format!(
            "Array.from(document.querySelectorAll(\
             'textarea, input:not([type=\"file\"]):not([type=\"hidden\"]):not([type=\"search\"])'))\
             .find((el) => {{\
               const placeholder = el.placeholder || '';\
               if ({sidebar}.some((text) => placeholder.includes(text))) return false;\
               const rect = el.getBoundingClientRect();\
               return rect.x >= {left} && rect.width > 100 && rect.height > 10;\
             }})",
            sidebar = serde_json::to_string(SIDEBAR_PLACEHOLDERS)?,
            left = MIN_LEFT_EDGE,
        ))
    }
}

#[async_trait]
impl LocateStrategy for MainDocumentStrategy {
    fn name(&self) -> &'static str {
        "main-input"
    }

    async fn try_fill(
        &self,
        driver: &dyn PageDriver,
        prompt: &str,
    ) -> BridgeResult<Option<(InputTarget, FillConfidence)>> {
        let script = fill_element_script(&Self::finder()?, prompt)?;
        match driver.evaluate(&FrameRef::Main, &script).await? {
            Value::Bool(true) => Ok(Some((
                InputTarget {
                    strategy: self.name(),
                    frame: FrameRef::Main,
                },
                FillConfidence::High,
            ))),
            _ => Ok(None),
        }
    }
}
