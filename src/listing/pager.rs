use crate::api::{ApiClient, ApiError, Article, ListingScope};
use crate::listing::state::{ListingState, PageOutcome, PageRequest};
use crate::listing::MAX_ACCUMULATED_PAGES;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Completion of a spawned page fetch.
struct PagerEvent {
    request: PageRequest,
    result: Result<Vec<Article>, ApiError>,
}

/// Drives a [`ListingState`] with background page fetches.
///
/// At most one fetch is in flight. Its task handle is aborted on
/// [`Pager::cancel`], on refresh and when the pager is dropped, so a listing
/// that is no longer shown never keeps a request alive.
///
/// The HTTP server renders whole pages and uses [`load_through`] instead.
/// `Pager` is for clients that grow a listing one page at a time.
pub struct Pager {
    client: ApiClient,
    scope: ListingScope,
    state: ListingState,
    handle: Option<JoinHandle<()>>,
    event_tx: mpsc::Sender<PagerEvent>,
    event_rx: mpsc::Receiver<PagerEvent>,
}

impl Pager {
    pub fn new(client: ApiClient, scope: ListingScope) -> Self {
        let (event_tx, event_rx) = mpsc::channel(8);
        Self {
            client,
            scope,
            state: ListingState::new(),
            handle: None,
            event_tx,
            event_rx,
        }
    }

    pub fn scope(&self) -> ListingScope {
        self.scope
    }

    pub fn state(&self) -> &ListingState {
        &self.state
    }

    /// Start over from page 0. Any in-flight fetch is aborted.
    pub fn refresh(&mut self) {
        self.abort_in_flight();
        let request = self.state.begin(0);
        self.spawn(request);
    }

    /// Request the next page.
    ///
    /// Returns false without doing anything while a fetch is in flight or
    /// once the listing is exhausted.
    pub fn load_more(&mut self) -> bool {
        if self.state.is_loading() || !self.state.has_more() {
            return false;
        }
        let page = self.state.next_page();
        if page == 0 {
            self.refresh();
            return true;
        }
        if page >= MAX_ACCUMULATED_PAGES {
            tracing::debug!(page = page, "Page cap reached, not loading more");
            return false;
        }
        let request = self.state.begin(page);
        self.spawn(request);
        true
    }

    /// Wait for the in-flight fetch and apply it.
    ///
    /// Returns `None` when nothing is in flight. Stale completions are
    /// skipped.
    pub async fn next_event(&mut self) -> Option<PageOutcome> {
        while self.state.is_loading() {
            let event = self.event_rx.recv().await?;
            let outcome = self.state.complete(event.request, event.result);
            if outcome != PageOutcome::Discarded {
                self.handle = None;
                return Some(outcome);
            }
        }
        None
    }

    /// Abort the in-flight fetch. The accumulated list is kept.
    pub fn cancel(&mut self) {
        self.abort_in_flight();
        self.state.cancel();
    }

    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(scope = ?self.scope, "Aborted in-flight page fetch");
        }
    }

    fn spawn(&mut self, request: PageRequest) {
        let client = self.client.clone();
        let scope = self.scope;
        let tx = self.event_tx.clone();

        self.handle = Some(tokio::spawn(async move {
            let result = client.fetch_page(scope, request.page).await;
            // Receiver gone means the pager was dropped
            let _ = tx.send(PagerEvent { request, result }).await;
        }));
    }
}

impl Drop for Pager {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("Aborted page fetch on Pager drop");
        }
    }
}

/// Fetch pages `0..=through` of `scope` in order and return the resulting
/// state.
///
/// Stops early once the listing is exhausted or a page fails; the failure
/// is logged and the pages already applied are kept. `through` is capped
/// at [`MAX_ACCUMULATED_PAGES`]` - 1`.
pub async fn load_through(client: &ApiClient, scope: ListingScope, through: u32) -> ListingState {
    let last = through.min(MAX_ACCUMULATED_PAGES.saturating_sub(1));
    let mut state = ListingState::new();

    for page in 0..=last {
        let request = state.begin(page);
        let result = client.fetch_page(scope, page).await;
        match state.complete(request, result) {
            PageOutcome::Applied(_) if state.has_more() => {}
            _ => break,
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::LoadPhase;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn articles_json(start: i64, len: i64) -> Value {
        Value::Array(
            (start..start + len)
                .map(|id| json!({ "id": id, "title": format!("Article {}", id), "url": format!("https://example.com/{}", id) }))
                .collect(),
        )
    }

    async fn mount_page(server: &MockServer, offset: u32, body: Value) {
        Mock::given(method("GET"))
            .and(path("/articles"))
            .and(query_param("offset", offset.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_refresh_then_load_more_until_exhausted() {
        let server = MockServer::start().await;
        mount_page(&server, 0, articles_json(1, 20)).await;
        mount_page(&server, 20, articles_json(21, 7)).await;

        let mut pager = Pager::new(client(&server), ListingScope::All);
        pager.refresh();
        assert!(pager.state().is_loading());
        assert_eq!(pager.next_event().await, Some(PageOutcome::Applied(20)));

        assert!(pager.load_more());
        // Second call while in flight is a no-op
        assert!(!pager.load_more());
        assert_eq!(pager.next_event().await, Some(PageOutcome::Applied(7)));

        assert_eq!(pager.state().articles().len(), 27);
        assert!(!pager.state().has_more());
        assert!(!pager.load_more());
        assert_eq!(pager.next_event().await, None);
    }

    #[tokio::test]
    async fn test_load_more_without_refresh_starts_at_page_zero() {
        let server = MockServer::start().await;
        mount_page(&server, 0, articles_json(1, 3)).await;

        let mut pager = Pager::new(client(&server), ListingScope::All);
        assert!(pager.load_more());
        assert_eq!(pager.next_event().await, Some(PageOutcome::Applied(3)));
    }

    #[tokio::test]
    async fn test_failure_keeps_has_more() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/articles/otani"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let mut pager = Pager::new(client(&server), ListingScope::Topic);
        pager.refresh();
        assert_eq!(pager.next_event().await, Some(PageOutcome::Failed));
        assert!(pager.state().has_more());
        assert_eq!(pager.state().phase(), LoadPhase::Failed);
        // No automatic retry
        assert_eq!(pager.next_event().await, None);
    }

    #[tokio::test]
    async fn test_cancel_discards_delayed_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/articles"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(articles_json(1, 20))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let mut pager = Pager::new(client(&server), ListingScope::All);
        pager.refresh();
        pager.cancel();

        assert!(!pager.state().is_loading());
        assert_eq!(pager.next_event().await, None);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(pager.state().articles().is_empty());
        assert_eq!(pager.state().phase(), LoadPhase::Idle);
    }

    #[tokio::test]
    async fn test_refresh_supersedes_in_flight() {
        let server = MockServer::start().await;
        mount_page(&server, 0, articles_json(1, 5)).await;

        let mut pager = Pager::new(client(&server), ListingScope::All);
        pager.refresh();
        pager.refresh();
        assert_eq!(pager.next_event().await, Some(PageOutcome::Applied(5)));
        assert_eq!(pager.state().articles().len(), 5);
    }

    #[tokio::test]
    async fn test_load_through_accumulates_pages() {
        let server = MockServer::start().await;
        mount_page(&server, 0, articles_json(1, 20)).await;
        mount_page(&server, 20, articles_json(21, 20)).await;
        mount_page(&server, 40, articles_json(41, 7)).await;

        let state = load_through(&client(&server), ListingScope::All, 5).await;
        assert_eq!(state.articles().len(), 47);
        assert!(!state.has_more());
        assert_eq!(state.applied_page(), Some(2));
    }

    #[tokio::test]
    async fn test_load_through_stops_at_requested_page() {
        let server = MockServer::start().await;
        mount_page(&server, 0, articles_json(1, 20)).await;
        mount_page(&server, 20, articles_json(21, 20)).await;

        let state = load_through(&client(&server), ListingScope::All, 1).await;
        assert_eq!(state.articles().len(), 40);
        assert!(state.has_more());
    }

    #[tokio::test]
    async fn test_load_through_keeps_pages_before_failure() {
        let server = MockServer::start().await;
        mount_page(&server, 0, articles_json(1, 20)).await;
        Mock::given(method("GET"))
            .and(path("/articles"))
            .and(query_param("offset", "20"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let state = load_through(&client(&server), ListingScope::All, 3).await;
        assert_eq!(state.articles().len(), 20);
        assert!(state.has_more());
        assert_eq!(state.next_page(), 1);
    }
}
