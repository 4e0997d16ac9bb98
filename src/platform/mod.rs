//! Platform abstraction layer
//!
//! Browser lookups and the DOM-backed HUD. Failures here are host problems
//! (a page without the expected elements), never simulation errors.

use thiserror::Error;

/// Host page problems found during startup
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("no global window")]
    NoWindow,
    #[error("window has no document")]
    NoDocument,
    #[error("missing element #{0}")]
    MissingElement(String),
    #[error("element #{0} is not a canvas")]
    NotACanvas(String),
}

/// Element ids the host page provides
pub mod ids {
    pub const CANVAS: &str = "renderCanvas";
    pub const START_BUTTON: &str = "startBtn";
    pub const MAIN_MENU: &str = "main";
    pub const LOADING_SCREEN: &str = "loadingScreen";
    pub const HEALTH_BAR: &str = "healthBar";
    pub const HEALTH_BAR_PROGRESS: &str = "healthBarProgress";
    pub const GAME_OVER_SCREEN: &str = "gameOverScreen";
    pub const MESSAGE: &str = "message";
}

#[cfg(target_arch = "wasm32")]
pub use dom::*;

#[cfg(target_arch = "wasm32")]
mod dom {
    use wasm_bindgen::JsCast;
    use web_sys::{Document, HtmlCanvasElement, HtmlElement, Window};

    use super::{PlatformError, ids};
    use crate::sim::HudSink;

    pub fn window() -> Result<Window, PlatformError> {
        web_sys::window().ok_or(PlatformError::NoWindow)
    }

    pub fn document() -> Result<Document, PlatformError> {
        window()?.document().ok_or(PlatformError::NoDocument)
    }

    pub fn html_element(document: &Document, id: &str) -> Result<HtmlElement, PlatformError> {
        document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .ok_or_else(|| PlatformError::MissingElement(id.to_string()))
    }

    pub fn canvas(document: &Document) -> Result<HtmlCanvasElement, PlatformError> {
        document
            .get_element_by_id(ids::CANVAS)
            .ok_or_else(|| PlatformError::MissingElement(ids::CANVAS.to_string()))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| PlatformError::NotACanvas(ids::CANVAS.to_string()))
    }

    /// Set `display` on an element, ignoring pages that lack it
    pub fn set_display(document: &Document, id: &str, display: &str) {
        match html_element(document, id) {
            Ok(el) => {
                let _ = el.style().set_property("display", display);
            }
            Err(e) => log::warn!("{e}"),
        }
    }

    /// HUD widgets on the host page. Missing widgets are skipped.
    pub struct DomHud {
        health_bar: Option<HtmlElement>,
        health_progress: Option<HtmlElement>,
        game_over: Option<HtmlElement>,
        message: Option<HtmlElement>,
    }

    impl DomHud {
        pub fn new(document: &Document) -> Self {
            let lookup = |id: &str| match html_element(document, id) {
                Ok(el) => Some(el),
                Err(e) => {
                    log::warn!("HUD degraded: {e}");
                    None
                }
            };
            Self {
                health_bar: lookup(ids::HEALTH_BAR),
                health_progress: lookup(ids::HEALTH_BAR_PROGRESS),
                game_over: lookup(ids::GAME_OVER_SCREEN),
                message: lookup(ids::MESSAGE),
            }
        }

        pub fn show_health(&self) {
            if let Some(el) = &self.health_bar {
                let _ = el.style().set_property("display", "block");
            }
        }
    }

    impl HudSink for DomHud {
        fn set_player_health(&mut self, percent: f32) {
            if let Some(el) = &self.health_progress {
                let _ = el.style().set_property("width", &format!("{percent}%"));
            }
        }

        fn hide_player_health(&mut self) {
            if let Some(el) = &self.health_bar {
                let _ = el.style().set_property("display", "none");
            }
        }

        fn show_game_over(&mut self, message: &str) {
            if let Some(el) = &self.game_over {
                let _ = el.style().set_property("display", "block");
            }
            if let Some(el) = &self.message {
                el.set_inner_html(message);
            }
        }
    }
}
