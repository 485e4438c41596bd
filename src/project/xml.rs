use crate::util::strip_control_chars;
use anyhow::{Context, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// Indented XML document writer shared by the RSS and sitemap projectors.
pub(crate) struct XmlDoc {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlDoc {
    /// Start a UTF-8 document with its XML declaration.
    pub fn new() -> Result<Self> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .context("Failed to write XML declaration")?;
        Ok(Self { writer })
    }

    pub fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(name);
        for &(key, value) in attributes {
            element.push_attribute((key, value));
        }
        self.writer
            .write_event(Event::Start(element))
            .with_context(|| format!("Failed to write <{}>", name))
    }

    pub fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .with_context(|| format!("Failed to write </{}>", name))
    }

    /// `<name>text</name>`, escaped. Empty text yields `<name></name>`.
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.text_element_with(name, &[], text)
    }

    pub fn text_element_with(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> Result<()> {
        self.start(name, attributes)?;
        let clean = strip_control_chars(text);
        // An empty text event also keeps the end tag on the same line
        self.writer
            .write_event(Event::Text(BytesText::new(&clean)))
            .with_context(|| format!("Failed to write <{}> text", name))?;
        self.end(name)
    }

    /// `<name><![CDATA[text]]></name>`. A `]]>` inside `text` is split
    /// across two sections.
    pub fn cdata_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(name, &[])?;
        let clean = strip_control_chars(text);
        let mut rest: &str = &clean;
        while let Some(idx) = rest.find("]]>") {
            let (head, tail) = rest.split_at(idx + 2);
            self.write_cdata(name, head)?;
            rest = tail;
        }
        self.write_cdata(name, rest)?;
        self.writer
            .write_event(Event::Text(BytesText::new("")))
            .with_context(|| format!("Failed to write <{}> text", name))?;
        self.end(name)
    }

    fn write_cdata(&mut self, name: &str, piece: &str) -> Result<()> {
        self.writer
            .write_event(Event::CData(BytesCData::new(piece)))
            .with_context(|| format!("Failed to write <{}> CDATA", name))
    }

    pub fn finish(self) -> Result<String> {
        let bytes = self.writer.into_inner().into_inner();
        String::from_utf8(bytes).context("Generated XML contains invalid UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdata_split() {
        let mut doc = XmlDoc::new().unwrap();
        doc.cdata_element("t", "a]]>b").unwrap();
        let xml = doc.finish().unwrap();
        assert!(xml.contains("<t><![CDATA[a]]]]><![CDATA[>b]]></t>"), "{}", xml);
    }

    #[test]
    fn test_empty_text_element_stays_inline() {
        let mut doc = XmlDoc::new().unwrap();
        doc.start("root", &[]).unwrap();
        doc.text_element("pubDate", "").unwrap();
        doc.end("root").unwrap();
        let xml = doc.finish().unwrap();
        assert!(xml.contains("<pubDate></pubDate>"), "{}", xml);
    }

    #[test]
    fn test_text_escaped_and_cleaned() {
        let mut doc = XmlDoc::new().unwrap();
        doc.text_element("link", "https://x/?a=1&b=2\u{1}").unwrap();
        let xml = doc.finish().unwrap();
        assert!(xml.contains("<link>https://x/?a=1&amp;b=2</link>"), "{}", xml);
    }
}
