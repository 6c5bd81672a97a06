//! Static-host deep-link repair.
//!
//! The host's 404 page redirects `/app/some/path?x` to a single query string
//! beginning with `?/`, escaping `&` as `~and~`. Before the engine reads the
//! location we decode that query and rewrite the current history entry in
//! place, so the engine never sees the encoded form and nothing reloads.

use wasm_bindgen::JsValue;

use crate::error::{BootError, Result, js_message};

const ESCAPED_AMP: &str = "~and~";
const PARTIAL_ESCAPE: &str = "~and";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    pub search: String,
    pub hash: String,
}

impl Location {
    pub fn new(
        pathname: impl Into<String>,
        search: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            pathname: pathname.into(),
            search: search.into(),
            hash: hash.into(),
        }
    }

    pub fn current() -> Result<Self> {
        let loc = web_sys::window().ok_or(BootError::NoWindow)?.location();
        let read = |r: std::result::Result<String, JsValue>| {
            r.map_err(|e| BootError::History(js_message(&e)))
        };
        Ok(Self::new(
            read(loc.pathname())?,
            read(loc.search())?,
            read(loc.hash())?,
        ))
    }

    pub fn href(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// Browser history entry replacement, without navigation.
pub trait HistoryApi {
    fn replace(&mut self, url: &str) -> Result<()>;
}

pub struct BrowserHistory {
    inner: web_sys::History,
}

impl BrowserHistory {
    pub fn open() -> Result<Self> {
        let inner = web_sys::window()
            .ok_or(BootError::NoWindow)?
            .history()
            .map_err(|e| BootError::History(js_message(&e)))?;
        Ok(Self { inner })
    }
}

impl HistoryApi for BrowserHistory {
    fn replace(&mut self, url: &str) -> Result<()> {
        self.inner
            .replace_state_with_url(&JsValue::NULL, "", Some(url))
            .map_err(|e| BootError::History(js_message(&e)))
    }
}

/// Decoded fragments of a `?/`-encoded redirect query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectQuery {
    fragments: Vec<String>,
}

impl RedirectQuery {
    pub fn has_sentinel(search: &str) -> bool {
        search.starts_with("?/")
    }

    /// `None` when the sentinel is absent or the query is malformed: an empty
    /// body, an empty fragment, or an escape left half-written.
    pub fn parse(search: &str) -> Option<Self> {
        let body = search.strip_prefix("?/")?;
        if body.is_empty() {
            return None;
        }
        let mut fragments = Vec::new();
        for raw in body.split('&') {
            let fragment = raw.replace(ESCAPED_AMP, "&");
            if fragment.is_empty() || fragment.contains(PARTIAL_ESCAPE) {
                return None;
            }
            fragments.push(fragment);
        }
        Some(Self { fragments })
    }

    #[cfg(test)]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Query string with each fragment introduced by `?`.
    pub fn decoded(&self) -> String {
        format!("?{}", self.fragments.join("?"))
    }
}

/// Returns the location the rest of startup should see. The history entry is
/// replaced at most once, and only for a well-formed redirect query.
pub fn normalize(location: &Location, history: &mut impl HistoryApi) -> Location {
    if !RedirectQuery::has_sentinel(&location.search) {
        return location.clone();
    }
    let Some(query) = RedirectQuery::parse(&location.search) else {
        tracing::warn!(search = %location.search, "ignoring malformed redirect query");
        return location.clone();
    };

    let target = Location {
        pathname: trimmed_pathname(&location.pathname),
        search: query.decoded(),
        hash: location.hash.clone(),
    };
    let url = target.href();
    match history.replace(&url) {
        Ok(()) => {
            tracing::debug!(from = %location.href(), to = %url, "rewrote redirect location");
            target
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not rewrite redirect location");
            location.clone()
        }
    }
}

// The redirect rule appends one synthetic character to the path. A site
// served from `/` still needs a rooted path for the engine and the URL.
fn trimmed_pathname(pathname: &str) -> String {
    match drop_last_char(pathname) {
        "" => "/".to_string(),
        trimmed => trimmed.to_string(),
    }
}

fn drop_last_char(s: &str) -> &str {
    match s.char_indices().next_back() {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingHistory {
        replaced: Vec<String>,
        fail: bool,
    }

    impl HistoryApi for RecordingHistory {
        fn replace(&mut self, url: &str) -> Result<()> {
            if self.fail {
                return Err(BootError::History("SecurityError".into()));
            }
            self.replaced.push(url.to_string());
            Ok(())
        }
    }

    #[test]
    fn decodes_redirect_and_replaces_once() {
        let mut h = RecordingHistory::default();
        let loc = Location::new("/app/", "?/foo~and~bar=1", "");
        let out = normalize(&loc, &mut h);
        assert_eq!(h.replaced, vec!["/app?foo&bar=1".to_string()]);
        assert_eq!(out.href(), "/app?foo&bar=1");
        assert_eq!(out.pathname, "/app");
    }

    #[test]
    fn no_sentinel_is_untouched() {
        let mut h = RecordingHistory::default();
        let loc = Location::new("/app/", "?x=1", "");
        let out = normalize(&loc, &mut h);
        assert!(h.replaced.is_empty());
        assert_eq!(out, loc);
    }

    #[test]
    fn empty_search_is_untouched() {
        let mut h = RecordingHistory::default();
        let loc = Location::new("/", "", "");
        assert_eq!(normalize(&loc, &mut h), loc);
        assert!(h.replaced.is_empty());
    }

    #[test]
    fn hash_is_carried_over() {
        let mut h = RecordingHistory::default();
        let loc = Location::new("/app/", "?/expert", "#board");
        normalize(&loc, &mut h);
        assert_eq!(h.replaced, vec!["/app?expert#board".to_string()]);
    }

    #[test]
    fn root_hosted_redirect_keeps_a_rooted_path() {
        let mut h = RecordingHistory::default();
        let loc = Location::new("/", "?/expert", "");
        let out = normalize(&loc, &mut h);
        assert_eq!(h.replaced, vec!["/?expert".to_string()]);
        assert_eq!(out.pathname, "/");
        assert_eq!(out.search, "?expert");
    }

    #[test]
    fn fragments_split_on_ampersand_before_unescaping() {
        let q = RedirectQuery::parse("?/stats&a=1~and~b=2").unwrap();
        assert_eq!(q.fragments(), ["stats", "a=1&b=2"]);
        assert_eq!(q.decoded(), "?stats?a=1&b=2");
    }

    #[test]
    fn malformed_queries_are_no_ops() {
        for search in ["?/", "?/a&&b", "?/a~and", "?/x=1~and~~andy"] {
            let mut h = RecordingHistory::default();
            let loc = Location::new("/app/", search, "");
            assert_eq!(normalize(&loc, &mut h), loc, "search {search:?}");
            assert!(h.replaced.is_empty(), "search {search:?}");
        }
    }

    #[test]
    fn failed_replace_keeps_original_location() {
        let mut h = RecordingHistory {
            fail: true,
            ..Default::default()
        };
        let loc = Location::new("/app/", "?/foo", "");
        assert_eq!(normalize(&loc, &mut h), loc);
    }

    #[test]
    fn drops_multibyte_trailing_char() {
        assert_eq!(drop_last_char("/ü"), "/");
        assert_eq!(drop_last_char(""), "");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn browser_history_replaces_without_navigation() {
        let before = Location::current().unwrap();
        let mut history = BrowserHistory::open().unwrap();
        history.replace("/replaced?ok=1").unwrap();
        let after = Location::current().unwrap();
        assert_eq!(after.pathname, "/replaced");
        assert_eq!(after.search, "?ok=1");
        history.replace(&before.href()).unwrap();
    }
}
