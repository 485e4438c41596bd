//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **Link validation**: only `http`/`https` targets reach an `href` or `src`
//! - **Text processing**: HTML escaping and stripping characters XML cannot carry
//!
//! # Examples
//!
//! ```
//! use matome::util::{escape_html, validate_link};
//!
//! assert_eq!(escape_html("<b>"), "&lt;b&gt;");
//! assert!(validate_link("javascript:alert(1)").is_err());
//! ```

mod link;
mod text;

pub use link::{validate_link, LinkError};
pub use text::{escape_html, script_safe_json, strip_control_chars};
