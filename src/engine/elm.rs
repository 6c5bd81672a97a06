use js_sys::{Function, Object, Reflect};
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::wasm_bindgen;

use super::{CommitReceiver, CommitSender, Engine, EngineHandle, commit_channel};
use crate::error::{BootError, Result, js_message};
use crate::model::{History, SessionFlags};

#[wasm_bindgen]
extern "C" {
    // Global installed by the compiled Elm bundle.
    #[wasm_bindgen(catch, js_namespace = ["Elm", "Main"], js_name = init)]
    fn elm_main_init(options: &JsValue) -> std::result::Result<JsValue, JsValue>;
}

/// Binding to `Elm.Main.init({ node, flags })` and one outgoing port.
pub struct ElmEngine {
    commit_port: String,
}

impl ElmEngine {
    pub fn new(commit_port: impl Into<String>) -> Self {
        Self {
            commit_port: commit_port.into(),
        }
    }
}

pub struct ElmHandle {
    _app: JsValue,
    commits: Option<CommitReceiver>,
}

impl EngineHandle for ElmHandle {
    fn take_commits(&mut self) -> Option<CommitReceiver> {
        self.commits.take()
    }
}

impl Engine for ElmEngine {
    type Handle = ElmHandle;

    fn start(&self, mount_id: &str, flags: SessionFlags) -> Result<ElmHandle> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(BootError::NoWindow)?;
        let node = document
            .get_element_by_id(mount_id)
            .ok_or_else(|| BootError::MountPointMissing(mount_id.to_string()))?;

        let flags_json = serde_json::to_string(&flags)?;
        let flags_js = js_sys::JSON::parse(&flags_json).map_err(engine_err)?;
        let options = Object::new();
        Reflect::set(&options, &"node".into(), &node).map_err(engine_err)?;
        Reflect::set(&options, &"flags".into(), &flags_js).map_err(engine_err)?;

        let app = elm_main_init(&options).map_err(engine_err)?;
        let (tx, rx) = commit_channel();
        if let Err(e) = subscribe_port(&app, &self.commit_port, tx) {
            // Elm drops ports the program never uses; history just stays unsaved.
            tracing::warn!(port = %self.commit_port, error = %e, "commit port unavailable");
        }
        Ok(ElmHandle {
            _app: app,
            commits: Some(rx),
        })
    }
}

fn subscribe_port(app: &JsValue, name: &str, tx: CommitSender) -> Result<()> {
    let ports = Reflect::get(app, &"ports".into()).map_err(engine_err)?;
    let port = Reflect::get(&ports, &name.into()).map_err(engine_err)?;
    let subscribe: Function = Reflect::get(&port, &"subscribe".into())
        .map_err(engine_err)?
        .dyn_into()
        .map_err(|_| BootError::Engine(format!("port `{name}` has no subscribe")))?;

    let on_commit = Closure::<dyn FnMut(JsValue)>::new(move |payload: JsValue| {
        let decoded = js_sys::JSON::stringify(&payload)
            .ok()
            .and_then(|s| s.as_string())
            .and_then(|s| decode_commit(&s));
        match decoded {
            Some(history) => {
                if tx.unbounded_send(history).is_err() {
                    tracing::debug!("commit receiver gone, snapshot not stored");
                }
            }
            None => tracing::warn!("dropping commit payload that is not a list"),
        }
    });
    subscribe
        .call1(&port, on_commit.as_ref().unchecked_ref())
        .map_err(engine_err)?;
    // Subscribed for the life of the page.
    on_commit.forget();
    Ok(())
}

fn decode_commit(json: &str) -> Option<History> {
    match serde_json::from_str::<Value>(json).ok()? {
        Value::Array(items) => Some(items.into_iter().collect()),
        _ => None,
    }
}

fn engine_err(e: JsValue) -> BootError {
    BootError::Engine(js_message(&e))
}
