use crate::api::{ApiError, Article, PAGE_SIZE};
use std::collections::HashSet;

/// Lifecycle of a listing: `idle → loading → {populated | empty | failed}`.
///
/// `Failed` renders exactly like `Empty`; it only exists so callers and logs
/// can tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Populated,
    Empty,
    Failed,
}

impl LoadPhase {
    /// True when the page should show its "nothing to show" message.
    pub fn shows_nothing(self) -> bool {
        matches!(self, LoadPhase::Empty | LoadPhase::Failed)
    }
}

/// Reducer actions over the accumulated list.
#[derive(Debug, Clone)]
pub enum PageAction {
    /// Replace the whole list (page 0 / refresh). Resets `has_more`.
    Replace(Vec<Article>),
    /// Append a later page, no de-duplication and no reordering.
    Append(Vec<Article>),
    SetHasMore(bool),
}

/// Tag attached to every page request.
///
/// `generation` changes on refresh and cancel, so responses issued before
/// either are recognisably stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub generation: u64,
}

/// What happened to a completed page response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Applied; carries the number of articles the page contributed.
    Applied(usize),
    /// Provider returned zero items; `has_more` is now false.
    Exhausted,
    /// Transport or decode failure; list and `has_more` unchanged.
    Failed,
    /// Response belonged to an older generation or an already-passed page.
    Discarded,
}

/// Explicit state of one paged listing.
///
/// All mutation of the article list goes through [`ListingState::reduce`];
/// [`ListingState::begin`] and [`ListingState::complete`] wrap it with the
/// loading phase and stale-response checks.
#[derive(Debug, Clone)]
pub struct ListingState {
    articles: Vec<Article>,
    has_more: bool,
    phase: LoadPhase,
    generation: u64,
    /// Highest page index whose items were applied.
    applied_page: Option<u32>,
    in_flight: Option<PageRequest>,
}

impl Default for ListingState {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingState {
    pub fn new() -> Self {
        Self {
            articles: Vec::new(),
            has_more: true,
            phase: LoadPhase::Idle,
            generation: 0,
            applied_page: None,
            in_flight: None,
        }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn into_articles(self) -> Vec<Article> {
        self.articles
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Highest page applied so far, if any.
    pub fn applied_page(&self) -> Option<u32> {
        self.applied_page
    }

    /// Index of the page a "load more" should request.
    pub fn next_page(&self) -> u32 {
        self.applied_page.map_or(0, |p| p.saturating_add(1))
    }

    /// Apply one reducer action.
    pub fn reduce(&mut self, action: PageAction) {
        match action {
            PageAction::Replace(articles) => {
                self.articles = articles;
                self.has_more = true;
            }
            PageAction::Append(articles) => {
                let overlap = self.overlapping_ids(&articles);
                if overlap > 0 {
                    // Offsets shifted between requests (new articles published ahead)
                    tracing::warn!(
                        overlap = overlap,
                        existing = self.articles.len(),
                        "Appended page repeats article ids already listed"
                    );
                }
                self.articles.extend(articles);
            }
            PageAction::SetHasMore(has_more) => {
                self.has_more = has_more;
            }
        }
    }

    /// Mark `page` as requested and return the tag its response must carry.
    ///
    /// Requesting page 0 starts a new generation: anything still in flight
    /// becomes stale.
    pub fn begin(&mut self, page: u32) -> PageRequest {
        if page == 0 {
            self.generation = self.generation.wrapping_add(1);
        }
        let request = PageRequest {
            page,
            generation: self.generation,
        };
        self.in_flight = Some(request);
        self.phase = LoadPhase::Loading;
        request
    }

    /// Drop whatever is in flight; its response will be discarded.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.in_flight.take().is_some() {
            self.phase = self.settled_phase(false);
        }
    }

    /// Apply a completed response.
    pub fn complete(
        &mut self,
        request: PageRequest,
        result: Result<Vec<Article>, ApiError>,
    ) -> PageOutcome {
        if request.generation != self.generation {
            tracing::debug!(
                page = request.page,
                generation = request.generation,
                current = self.generation,
                "Discarding response from an older generation"
            );
            return PageOutcome::Discarded;
        }
        if request.page > 0 && self.applied_page.is_some_and(|p| p >= request.page) {
            tracing::debug!(
                page = request.page,
                applied = ?self.applied_page,
                "Discarding response for a page already passed"
            );
            return PageOutcome::Discarded;
        }

        if self.in_flight == Some(request) {
            self.in_flight = None;
        }

        match result {
            Err(e) => {
                tracing::error!(
                    page = request.page,
                    kind = ?e.kind(),
                    error = %e,
                    "Failed to load listing page"
                );
                self.phase = self.settled_phase(true);
                PageOutcome::Failed
            }
            Ok(articles) if articles.is_empty() => {
                self.reduce(PageAction::SetHasMore(false));
                self.phase = self.settled_phase(false);
                PageOutcome::Exhausted
            }
            Ok(articles) => {
                let count = articles.len();
                if request.page == 0 {
                    self.reduce(PageAction::Replace(articles));
                } else {
                    self.reduce(PageAction::Append(articles));
                }
                if count < PAGE_SIZE as usize {
                    self.reduce(PageAction::SetHasMore(false));
                }
                self.applied_page = Some(request.page);
                self.phase = LoadPhase::Populated;
                PageOutcome::Applied(count)
            }
        }
    }

    fn settled_phase(&self, failed: bool) -> LoadPhase {
        if !self.articles.is_empty() {
            LoadPhase::Populated
        } else if failed {
            LoadPhase::Failed
        } else if self.applied_page.is_none() && self.has_more {
            LoadPhase::Idle
        } else {
            LoadPhase::Empty
        }
    }

    fn overlapping_ids(&self, incoming: &[Article]) -> usize {
        if self.articles.is_empty() || incoming.is_empty() {
            return 0;
        }
        let known: HashSet<i64> = self.articles.iter().map(|a| a.id).collect();
        incoming.iter().filter(|a| known.contains(&a.id)).count()
    }
}
