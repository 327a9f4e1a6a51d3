//! Navigation intents coming from the page.
//!
//! A document navigation loads the whole page through the shell merge. A
//! fragment navigation only loads the content fragment, which the page swaps
//! into place while the address bar still shows the page path.

use herodex_client::site_url;
use herodex_core::classify::fragment_path;
use herodex_core::{Error, Request, Response};

use super::{Intercept, Worker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    Document,
    Fragment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub path: String,
    pub mode: NavigationMode,
}

impl NavigationIntent {
    pub fn document(path: impl Into<String>) -> Self {
        Self { path: path.into(), mode: NavigationMode::Document }
    }

    pub fn fragment(path: impl Into<String>) -> Self {
        Self { path: path.into(), mode: NavigationMode::Fragment }
    }
}

#[derive(Debug)]
pub struct Navigation {
    /// Path the page shows as its location.
    pub location: String,
    pub response: Response,
}

impl Worker {
    /// Answer a navigation intent. Paths the worker declines go straight to
    /// the network.
    pub async fn navigate(&self, intent: NavigationIntent) -> Result<Navigation, Error> {
        let target = match intent.mode {
            NavigationMode::Document => intent.path.clone(),
            NavigationMode::Fragment => fragment_path(&intent.path, &self.paths.default_fragment)
                .unwrap_or_else(|| intent.path.clone()),
        };
        tracing::debug!(location = %intent.path, target = %target, mode = ?intent.mode, "navigating");

        let url = site_url(&self.origin, &target).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let request = Request::get(url);
        let response = match self.intercept(request.clone()).await? {
            Intercept::Respond(response) => response,
            Intercept::Decline => self.fetcher.network().fetch(&request).await?,
        };

        Ok(Navigation { location: intent.path, response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::worker::testing::{Route, StubNetwork, worker};

    fn network() -> Arc<StubNetwork> {
        let network = StubNetwork::site();
        network.route(
            "/heroes/thor-content.part.html",
            Route::ok("text/html", "<article>Thor</article>").with_delay(Duration::from_millis(20)),
        );
        network.route("/api/search", Route::ok("text/plain", "results"));
        Arc::new(network)
    }

    #[tokio::test]
    async fn test_document_navigation_merges_shell() {
        let (worker, _) = worker(network());
        worker.install().await.unwrap();

        let nav = worker.navigate(NavigationIntent::document("/heroes/thor.html")).await.unwrap();
        assert_eq!(nav.location, "/heroes/thor.html");
        assert_eq!(
            nav.response.text().await.unwrap(),
            "<html><body><main><article>Thor</article></main></body></html>"
        );
    }

    #[tokio::test]
    async fn test_fragment_navigation_loads_content_only() {
        let network = network();
        let (worker, _) = worker(network.clone());
        worker.install().await.unwrap();

        let nav = worker.navigate(NavigationIntent::fragment("/heroes/thor.html")).await.unwrap();
        assert_eq!(nav.location, "/heroes/thor.html");
        assert_eq!(nav.response.text().await.unwrap(), "<article>Thor</article>");
        assert_eq!(network.calls_to("/site-shell-top.part.html"), 1);
    }

    #[tokio::test]
    async fn test_declined_navigation_goes_to_network() {
        let (worker, _) = worker(network());
        let nav = worker.navigate(NavigationIntent::document("/api/search")).await.unwrap();
        assert_eq!(nav.response.text().await.unwrap(), "results");
    }
}
