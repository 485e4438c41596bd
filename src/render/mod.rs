//! HTML rendering.
//!
//! - [`listing`] projects articles into listing entries and renders them
//! - [`sources`] is the "browse by source" menu
//! - [`page`] wraps content in the site chrome
//! - [`locale`] formats timestamps for readers

pub mod listing;
pub mod locale;
pub mod page;
pub mod sources;

pub use listing::{render_list, Layout, ListingEntry, SourceBadge, UNTITLED};
pub use locale::{DisplayLocale, TimestampStyle};
pub use page::{PageShell, LOAD_MORE, NOTHING_FOUND};
pub use sources::{source_route, SourceMenu};
