//! Paged article listings.
//!
//! [`ListingState`] is the explicit state of one listing and the only place
//! its article list is mutated. [`load_through`] fetches a known range of
//! pages in order and is what the server's page handlers use. [`Pager`]
//! runs fetches for a state in the background; it is library API for
//! incremental clients that append one page per "more" action.

mod pager;
mod state;

pub use pager::{load_through, Pager};
pub use state::{ListingState, LoadPhase, PageAction, PageOutcome, PageRequest};

/// Upper bound on pages accumulated into a single listing.
pub const MAX_ACCUMULATED_PAGES: u32 = 50;
