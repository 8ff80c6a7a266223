//! Direct-then-relay request resolution
//!
//! A [`ResolutionChain`] is an ordered list of [`Route`]s. Resolving a target
//! URL tries each route strictly in sequence and stops at the first reply
//! that has a success status and deserializes into the expected shape.

use crate::error::{FetchError, FetchResult};
use crate::transport::HttpTransport;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Placeholder replaced by the percent-encoded target URL
const ENCODED_PLACEHOLDER: &str = "{url}";

/// Placeholder replaced by the target URL as-is
const RAW_PLACEHOLDER: &str = "{raw_url}";

/// A public CORS relay that forwards a GET to the target URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayTemplate {
    pub name: String,
    pub template: String,
}

impl RelayTemplate {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self { name: name.into(), template: template.into() }
    }

    /// The four relays used in production, in the order they are tried
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("allorigins", "https://api.allorigins.win/raw?url={url}"),
            Self::new("codetabs", "https://api.codetabs.com/v1/proxy?quest={url}"),
            Self::new("corsproxy", "https://corsproxy.io/?{url}"),
            Self::new("thingproxy", "https://thingproxy.freeboard.io/fetch/{raw_url}"),
        ]
    }

    pub fn has_placeholder(&self) -> bool {
        self.template.contains(ENCODED_PLACEHOLDER) || self.template.contains(RAW_PLACEHOLDER)
    }

    /// Build the relay URL for a target
    pub fn render(&self, target: &str) -> String {
        self.template
            .replace(ENCODED_PLACEHOLDER, &urlencoding::encode(target))
            .replace(RAW_PLACEHOLDER, target)
    }
}

/// One way of reaching the upstream API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Direct,
    Relay(RelayTemplate),
}

impl Route {
    pub fn name(&self) -> &str {
        match self {
            Route::Direct => "direct",
            Route::Relay(relay) => &relay.name,
        }
    }

    /// Try this route once
    pub async fn attempt<T: DeserializeOwned>(
        &self,
        transport: &dyn HttpTransport,
        target: &str,
    ) -> FetchResult<T> {
        match self {
            Route::Direct => {
                let reply = transport.get(target, false).await?;
                if !reply.is_success() {
                    return Err(FetchError::Status { url: target.to_string(), status: reply.status });
                }
                parse_body(target, &reply.body)
            }
            Route::Relay(relay) => {
                let url = relay.render(target);
                let reply = transport.get(&url, true).await?;

                if reply.is_rejection() {
                    warn!("Relay {} returned {}: {}", relay.name, reply.status, url);
                    return Err(FetchError::Rejected {
                        relay: relay.name.clone(),
                        status: reply.status,
                    });
                }

                if !reply.is_success() {
                    return Err(FetchError::Status { url, status: reply.status });
                }

                if !reply.is_json() {
                    // some relays hand the body back as text/plain or text/html
                    debug!(
                        "Relay {} replied with {:?}, parsing body as JSON",
                        relay.name, reply.content_type
                    );
                }
                parse_body(&url, &reply.body)
            }
        }
    }
}

fn parse_body<T: DeserializeOwned>(url: &str, body: &str) -> FetchResult<T> {
    serde_json::from_str(body)
        .map_err(|source| FetchError::MalformedBody { url: url.to_string(), source })
}

/// Ordered list of routes folded with first-success-wins semantics
#[derive(Debug, Clone)]
pub struct ResolutionChain {
    routes: Vec<Route>,
}

impl ResolutionChain {
    /// Direct request first, then each relay in order
    pub fn new(relays: &[RelayTemplate]) -> Self {
        let mut routes = Vec::with_capacity(relays.len() + 1);
        routes.push(Route::Direct);
        routes.extend(relays.iter().cloned().map(Route::Relay));
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Resolve `target` through the first route that yields a `T`
    pub async fn resolve<T: DeserializeOwned>(
        &self,
        transport: &dyn HttpTransport,
        target: &str,
    ) -> FetchResult<T> {
        for route in &self.routes {
            match route.attempt::<T>(transport, target).await {
                Ok(value) => {
                    if *route != Route::Direct {
                        info!("Resolved {} via relay {}", target, route.name());
                    }
                    return Ok(value);
                }
                Err(e) if e.is_rejection() => continue,
                Err(e) => {
                    warn!("Route {} failed: {}", route.name(), e);
                }
            }
        }

        Err(FetchError::Exhausted { target: target.to_string(), attempts: self.routes.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        data: Vec<u64>,
    }

    const TARGET: &str = "https://games.roblox.com/v1/games?universeIds=1,2";

    #[test]
    fn test_render_encodes_target() {
        let relays = RelayTemplate::defaults();
        assert_eq!(
            relays[0].render(TARGET),
            "https://api.allorigins.win/raw?url=https%3A%2F%2Fgames.roblox.com%2Fv1%2Fgames%3FuniverseIds%3D1%2C2"
        );
        assert_eq!(
            relays[3].render(TARGET),
            "https://thingproxy.freeboard.io/fetch/https://games.roblox.com/v1/games?universeIds=1,2"
        );
    }

    #[test]
    fn test_chain_starts_with_direct() {
        let chain = ResolutionChain::new(&RelayTemplate::defaults());
        let names: Vec<_> = chain.routes().iter().map(Route::name).collect();
        assert_eq!(names, vec!["direct", "allorigins", "codetabs", "corsproxy", "thingproxy"]);
    }

    #[tokio::test]
    async fn test_direct_success_skips_relays() {
        let transport = ScriptedTransport::new();
        transport.reply_json(TARGET, r#"{"data":[1,2]}"#);

        let chain = ResolutionChain::new(&RelayTemplate::defaults());
        let payload: Payload = chain.resolve(&transport, TARGET).await.unwrap();

        assert_eq!(payload.data, vec![1, 2]);
        assert_eq!(transport.calls(), vec![TARGET.to_string()]);
    }

    #[tokio::test]
    async fn test_rejection_moves_to_next_relay_without_retry() {
        let relays = RelayTemplate::defaults();
        let transport = ScriptedTransport::new();
        transport.fail(TARGET);
        transport.reply(&relays[0].render(TARGET), 403, None, "Forbidden");
        transport.reply_json(&relays[1].render(TARGET), r#"{"data":[7]}"#);

        let chain = ResolutionChain::new(&relays);
        let payload: Payload = chain.resolve(&transport, TARGET).await.unwrap();

        assert_eq!(payload.data, vec![7]);
        assert_eq!(transport.call_count(&relays[0].render(TARGET)), 1);
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_text_body_parsed_speculatively() {
        let relays = RelayTemplate::defaults();
        let transport = ScriptedTransport::new();
        transport.fail(TARGET);
        transport.reply(&relays[0].render(TARGET), 200, Some("text/plain"), r#"{"data":[3]}"#);

        let chain = ResolutionChain::new(&relays);
        let payload: Payload = chain.resolve(&transport, TARGET).await.unwrap();
        assert_eq!(payload.data, vec![3]);
    }

    #[tokio::test]
    async fn test_unparseable_text_skips_relay() {
        let relays = RelayTemplate::defaults();
        let transport = ScriptedTransport::new();
        transport.fail(TARGET);
        transport.reply(&relays[0].render(TARGET), 200, Some("text/html"), "<html>busy</html>");
        transport.reply_json(&relays[1].render(TARGET), r#"{"data":[4]}"#);

        let chain = ResolutionChain::new(&relays);
        let payload: Payload = chain.resolve(&transport, TARGET).await.unwrap();
        assert_eq!(payload.data, vec![4]);
    }

    #[tokio::test]
    async fn test_wrong_shape_moves_on() {
        let relays = RelayTemplate::defaults();
        let transport = ScriptedTransport::new();
        transport.reply_json(TARGET, r#"{"errors":[{"code":0}]}"#);
        transport.reply_json(&relays[0].render(TARGET), r#"{"data":[5]}"#);

        let chain = ResolutionChain::new(&relays);
        let payload: Payload = chain.resolve(&transport, TARGET).await.unwrap();
        assert_eq!(payload.data, vec![5]);
    }

    #[tokio::test]
    async fn test_fourth_relay_wins_when_first_three_fail() {
        let relays = RelayTemplate::defaults();
        let transport = ScriptedTransport::new();
        transport.fail(TARGET);
        transport.fail(&relays[0].render(TARGET));
        transport.reply(&relays[1].render(TARGET), 500, None, "");
        transport.reply(&relays[2].render(TARGET), 401, None, "");
        transport.reply_json(&relays[3].render(TARGET), r#"{"data":[9]}"#);

        let chain = ResolutionChain::new(&relays);
        let payload: Payload = chain.resolve(&transport, TARGET).await.unwrap();

        assert_eq!(payload.data, vec![9]);
        let expected: Vec<String> = std::iter::once(TARGET.to_string())
            .chain(relays.iter().map(|r| r.render(TARGET)))
            .collect();
        assert_eq!(transport.calls(), expected);
    }

    #[tokio::test]
    async fn test_exhausted_after_all_routes() {
        let transport = ScriptedTransport::new();
        let chain = ResolutionChain::new(&RelayTemplate::defaults());

        let err = chain.resolve::<Payload>(&transport, TARGET).await.unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { attempts: 5, .. }));
        assert_eq!(transport.calls().len(), 5);
    }
}
