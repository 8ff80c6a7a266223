//! Scripted transport for tests

use crate::error::{FetchError, FetchResult};
use crate::transport::{HttpReply, HttpTransport};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
enum Scripted {
    Reply(HttpReply),
    Fail,
    Panic,
}

/// Answers each URL from a script; unscripted URLs fail like an unreachable host
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<HashMap<String, Scripted>>>,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, url: &str, status: u16, content_type: Option<&str>, body: &str) {
        let reply = HttpReply {
            status,
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
        };
        self.script.lock().unwrap().insert(url.to_string(), Scripted::Reply(reply));
    }

    pub fn reply_json(&self, url: &str, body: &str) {
        self.reply(url, 200, Some("application/json; charset=utf-8"), body);
    }

    pub fn fail(&self, url: &str) {
        self.script.lock().unwrap().insert(url.to_string(), Scripted::Fail);
    }

    /// Panic inside the request, as a bug in a transport would
    pub fn panic_on(&self, url: &str) {
        self.script.lock().unwrap().insert(url.to_string(), Scripted::Panic);
    }

    /// Drop every scripted reply so all URLs fail
    pub fn fail_everything(&self) {
        self.script.lock().unwrap().clear();
    }

    /// Sleep this long inside every request
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, _accept_json: bool) -> FetchResult<HttpReply> {
        self.calls.lock().unwrap().push(url.to_string());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().unwrap().get(url).cloned();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match scripted {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Panic) => panic!("scripted panic for {url}"),
            Some(Scripted::Fail) | None => Err(FetchError::transport(url, "connection refused")),
        }
    }
}
