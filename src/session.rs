//! Session start-up: read what the last visit left behind, describe the page,
//! and hand both to the engine exactly once.

use crate::engine::Engine;
use crate::error::{BootError, Result};
use crate::model::{SessionFlags, Viewport};
use crate::redirect::Location;
use crate::storage::HistoryStore;

/// Page state read once at load. Resizes later are the engine's business.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserContext {
    pub location: Location,
    pub viewport: Viewport,
}

impl BrowserContext {
    /// `location` should already be normalized.
    pub fn read(location: Location) -> Result<Self> {
        let window = web_sys::window().ok_or(BootError::NoWindow)?;
        let width = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let height = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        Ok(Self {
            location,
            viewport: Viewport {
                width: width.max(0.0) as u32,
                height: height.max(0.0) as u32,
            },
        })
    }
}

pub fn build_flags(store: &impl HistoryStore, ctx: &BrowserContext) -> SessionFlags {
    SessionFlags::new(store.load(), ctx.viewport, ctx.location.pathname.clone())
}

pub struct Session<H, E> {
    store: H,
    engine: E,
    mount_id: String,
}

impl<H: HistoryStore, E: Engine> Session<H, E> {
    pub fn new(store: H, engine: E, mount_id: impl Into<String>) -> Self {
        Self {
            store,
            engine,
            mount_id: mount_id.into(),
        }
    }

    /// Consumes the session: the engine is started at most once per page.
    pub fn initialize(self, ctx: &BrowserContext) -> Result<E::Handle> {
        let flags = build_flags(&self.store, ctx);
        tracing::debug!(
            games = flags.history.len(),
            width = flags.width,
            height = flags.height,
            path = %flags.init_path,
            "starting engine"
        );
        self.engine.start(&self.mount_id, flags)
    }
}
