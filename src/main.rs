use std::rc::Rc;

mod config;
mod engine;
mod error;
mod model;
mod persist;
mod redirect;
mod session;
mod storage;

use config::BootConfig;
use engine::ElmEngine;
use error::Result;
use persist::HistoryPersister;
use redirect::{BrowserHistory, Location};
use session::{BrowserContext, Session};
use storage::{HistoryStore, JsonHistoryStore, LocalStore, MemoryStore};

fn main() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }

    if let Err(e) = boot(&BootConfig::default()) {
        tracing::error!(error = %e, "session bootstrap failed");
    }
}

fn boot(config: &BootConfig) -> Result<()> {
    // Must run before anything reads the location.
    let location = Location::current()?;
    let location = match BrowserHistory::open() {
        Ok(mut history) => redirect::normalize(&location, &mut history),
        Err(e) => {
            tracing::warn!(error = %e, "history API unavailable, skipping redirect repair");
            location
        }
    };
    let ctx = BrowserContext::read(location)?;

    let store = open_store(config);
    let engine = ElmEngine::new(config.commit_port.clone());
    let mut handle = Session::new(store.clone(), engine, config.mount_id.clone()).initialize(&ctx)?;

    match HistoryPersister::new(store).subscribe(&mut handle) {
        Some(run) => wasm_bindgen_futures::spawn_local(async move {
            run.await;
        }),
        None => tracing::warn!("engine exposed no commit stream"),
    }
    Ok(())
}

// Without localStorage the game still runs; history just lasts one page.
fn open_store(config: &BootConfig) -> Rc<dyn HistoryStore> {
    match LocalStore::open() {
        Ok(local) => Rc::new(JsonHistoryStore::new(local, config.history_key.clone())),
        Err(e) => {
            tracing::warn!(error = %e, "falling back to in-memory history");
            Rc::new(JsonHistoryStore::new(MemoryStore::new(), config.history_key.clone()))
        }
    }
}
