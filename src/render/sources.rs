use crate::api::Source;
use crate::util::{escape_html, validate_link};
use std::fmt::Write;

/// Label of the source menu trigger.
pub const MENU_LABEL: &str = "出典で探す";
/// Title used when a source cannot be named.
pub const UNKNOWN_SOURCE: &str = "不明な出典";

/// Site route of a per-source listing.
pub fn source_route(id: i64) -> String {
    format!("/articles/source/{}", id)
}

/// The "browse by source" menu.
///
/// Sources are fetched once per page render. The menu is not paginated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMenu {
    sources: Vec<Source>,
    open: bool,
}

impl SourceMenu {
    pub fn new(sources: Vec<Source>) -> Self {
        Self {
            sources,
            open: false,
        }
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Route to navigate to for `id`. Selecting closes the menu.
    ///
    /// Ids that are not in the list still resolve to their route.
    pub fn select(&mut self, id: i64) -> String {
        self.open = false;
        source_route(id)
    }

    pub fn name_of(&self, id: i64) -> Option<&str> {
        self.sources
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
    }

    /// Render as a `<details>` disclosure so it opens without script.
    pub fn render(&self) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            "<details class=\"source-menu\"{}><summary>{} ▼</summary>",
            if self.open { " open" } else { "" },
            MENU_LABEL
        );
        html.push_str("<ul>");
        for source in &self.sources {
            html.push_str("<li>");
            let _ = write!(html, r#"<a href="{}">"#, source_route(source.id));
            if let Some(icon) = source
                .icon_url
                .as_deref()
                .filter(|u| validate_link(u).is_ok())
            {
                let _ = write!(
                    html,
                    r#"<img class="source-icon" src="{}" alt="">"#,
                    escape_html(icon)
                );
            }
            html.push_str(&escape_html(&source.name));
            html.push_str("</a></li>");
        }
        html.push_str("</ul></details>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn menu() -> SourceMenu {
        SourceMenu::new(vec![
            Source {
                id: 3,
                name: "Example".to_string(),
                icon_url: Some("https://example.com/i.png".to_string()),
            },
            Source {
                id: 4,
                name: "A & B".to_string(),
                icon_url: None,
            },
        ])
    }

    #[test]
    fn test_toggle_and_select_closes() {
        let mut m = menu();
        assert!(!m.is_open());
        m.toggle();
        assert!(m.is_open());
        assert_eq!(m.select(4), "/articles/source/4");
        assert!(!m.is_open());
        m.toggle();
        m.toggle();
        assert!(!m.is_open());
    }

    #[test]
    fn test_name_lookup() {
        let m = menu();
        assert_eq!(m.name_of(3), Some("Example"));
        assert_eq!(m.name_of(99), None);
    }

    #[test]
    fn test_render_links_each_source() {
        let html = menu().render();
        assert!(html.contains(r#"<a href="/articles/source/3">"#));
        assert!(html.contains(r#"<a href="/articles/source/4">A &amp; B</a>"#));
        assert!(html.contains(r#"src="https://example.com/i.png""#));
        assert!(!html.contains(" open>"));
    }

    #[test]
    fn test_render_open_state() {
        let mut m = SourceMenu::default();
        m.toggle();
        let html = m.render();
        assert!(html.starts_with("<details class=\"source-menu\" open>"));
        assert!(html.contains("<ul></ul>"));
    }
}
