//! In-process backend for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use cycleways_core::{Request, Response, ResponseKind};

use crate::fetch::{Network, NetworkError};

pub(crate) const ORIGIN: &str = "http://localhost:8000";

pub(crate) fn url(path: &str) -> url::Url {
    url::Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub(crate) fn json(body: &str) -> Response {
    Response::new(200, "OK", vec![("Content-Type".into(), "application/json".into())], body.to_string())
}

pub(crate) fn html(body: &str) -> Response {
    Response::new(200, "OK", vec![("Content-Type".into(), "text/html".into())], body.to_string())
}

/// Answers requests from a URL -> response table and records every call.
///
/// Unscripted URLs and everything while offline fail with
/// `NetworkError::Connect`. Scripted opaque redirects are followed for
/// non-navigation requests unless registered with [`Self::respond_raw`].
#[derive(Default)]
pub(crate) struct ScriptedNetwork {
    routes: Mutex<HashMap<String, (Response, bool)>>,
    calls: Mutex<Vec<(String, String)>>,
    offline: AtomicBool,
}

impl ScriptedNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, path: &str, response: Response) {
        self.routes.lock().unwrap().insert(url(path).to_string(), (response, false));
    }

    /// Return `response` exactly as scripted, whatever the request mode.
    pub(crate) fn respond_raw(&self, path: &str, response: Response) {
        self.routes.lock().unwrap().insert(url(path).to_string(), (response, true));
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls_to(&self, path: &str) -> usize {
        let target = url(path).to_string();
        self.calls.lock().unwrap().iter().filter(|(_, u)| *u == target).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn methods(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }
}

#[async_trait::async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.method.clone(), request.url.to_string()));

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Connect("network unreachable".into()));
        }

        let scripted = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        match scripted {
            // Non-navigation fetches follow redirects, so the page sees the target.
            Some((resp, false)) if resp.kind == ResponseKind::OpaqueRedirect && !request.is_navigation() => {
                Ok(Response { redirected: true, ..html("<form>login</form>") })
            }
            Some((resp, _)) => Ok(resp),
            None => Err(NetworkError::Connect(format!("no route to {}", request.url))),
        }
    }
}
