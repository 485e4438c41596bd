//! matome: a server-rendered front end for a news-aggregation fan site.
//!
//! Article records come from an external HTTP provider ([`api`]). Pages
//! accumulate them through an explicit paging state ([`listing`]), render
//! them as HTML ([`render`]) and project them into JSON-LD, RSS and a
//! sitemap ([`project`]). [`server`] wires it all into axum routes.

pub mod api;
pub mod config;
pub mod listing;
pub mod project;
pub mod render;
pub mod server;
pub mod util;
