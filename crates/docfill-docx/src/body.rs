//! Paragraph view over the main document part.
//!
//! Each `w:p` becomes one line of the text layer; its text is the
//! concatenation of its `w:t` nodes. Edits address byte ranges of that
//! paragraph text and are distributed back onto the underlying runs, so a
//! blank that Word split over several runs is still replaced as one span.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use docfill_core::Result;

use crate::xml::{parse_events, write_events, XmlEvent};

static PARAGRAPH_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"</w:p>|<w:p/>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

const PARAGRAPH: &str = "w:p";
const TEXT: &str = "w:t";

#[derive(Debug, Clone, Copy)]
struct TextNode {
    /// Index of the `w:t` start event.
    elem: usize,
    /// Index of the text event inside it.
    text: usize,
}

#[derive(Debug, Default, Clone)]
struct Paragraph {
    nodes: Vec<TextNode>,
}

pub struct DocumentBody {
    events: Vec<XmlEvent>,
    paragraphs: Vec<Paragraph>,
}

impl DocumentBody {
    pub fn parse(xml: &str) -> Result<Self> {
        let events = parse_events(xml.as_bytes())?;

        let mut paragraphs: Vec<Paragraph> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        let mut text_elem: Option<usize> = None;

        for (i, ev) in events.iter().enumerate() {
            match ev {
                XmlEvent::Start { name, .. } if name == PARAGRAPH => {
                    open.push(paragraphs.len());
                    paragraphs.push(Paragraph::default());
                }
                XmlEvent::Empty { name, .. } if name == PARAGRAPH => {
                    paragraphs.push(Paragraph::default());
                }
                XmlEvent::End { name } if name == PARAGRAPH => {
                    open.pop();
                }
                XmlEvent::Start { name, .. } if name == TEXT => text_elem = Some(i),
                XmlEvent::End { name } if name == TEXT => text_elem = None,
                XmlEvent::Text { .. } => {
                    if let (Some(elem), Some(&p)) = (text_elem, open.last()) {
                        paragraphs[p].nodes.push(TextNode { elem, text: i });
                    }
                }
                _ => {}
            }
        }

        Ok(Self { events, paragraphs })
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    fn node_text(&self, node: TextNode) -> &str {
        match &self.events[node.text] {
            XmlEvent::Text { text } => text,
            _ => "",
        }
    }

    pub fn paragraph_text(&self, index: usize) -> String {
        self.paragraphs
            .get(index)
            .map(|p| p.nodes.iter().map(|n| self.node_text(*n)).collect())
            .unwrap_or_default()
    }

    /// One line per paragraph, in document order.
    pub fn text_layer(&self) -> String {
        (0..self.paragraphs.len())
            .map(|i| self.paragraph_text(i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace `range` of paragraph `index`'s text with `replacement`.
    ///
    /// The replacement lands in the first run touched by the range; the
    /// covered text is removed from any following runs.
    pub fn replace_range(&mut self, index: usize, range: Range<usize>, replacement: &str) -> bool {
        let Some(paragraph) = self.paragraphs.get(index) else {
            return false;
        };
        let nodes = paragraph.nodes.clone();

        let mut offset = 0;
        let mut placed = false;
        for node in nodes {
            let text = self.node_text(node).to_string();
            let (start, end) = (offset, offset + text.len());
            offset = end;
            if end <= range.start || start >= range.end {
                continue;
            }

            let cut_from = range.start.saturating_sub(start);
            let cut_to = range.end.min(end) - start;
            let updated = if placed {
                text[cut_to..].to_string()
            } else {
                placed = true;
                format!("{}{}{}", &text[..cut_from], replacement, &text[cut_to..])
            };

            if updated.starts_with(' ') || updated.ends_with(' ') {
                self.events[node.elem].set_attr("xml:space", "preserve");
            }
            self.events[node.text] = XmlEvent::Text { text: updated };
        }
        placed
    }

    pub fn to_xml(&self) -> String {
        write_events(&self.events)
    }
}

/// Text layer for a part that does not parse: paragraph ends become line
/// breaks and all other markup is dropped.
pub fn flat_text_layer(xml: &str) -> String {
    let lines = PARAGRAPH_END_RE.replace_all(xml, "\n");
    TAG_RE
        .replace_all(&lines, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPLIT: &str = r#"<w:document><w:body><w:p><w:r><w:t>Otec: </w:t></w:r><w:r><w:t>.....</w:t></w:r><w:r><w:t>.....</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>IBAN: ____</w:t></w:r></w:p></w:body></w:document>"#;

    #[test]
    fn test_text_layer_one_line_per_paragraph() {
        let body = DocumentBody::parse(SPLIT).unwrap();
        assert_eq!(body.paragraph_count(), 3);
        assert_eq!(body.text_layer(), "Otec: ..........\n\nIBAN: ____");
    }

    #[test]
    fn test_replace_across_runs() {
        let mut body = DocumentBody::parse(SPLIT).unwrap();
        assert!(body.replace_range(0, 6..16, "{{father.fullName}}"));
        assert_eq!(body.paragraph_text(0), "Otec: {{father.fullName}}");
        let xml = body.to_xml();
        assert!(xml.contains("<w:t>Otec: </w:t></w:r><w:r><w:t>{{father.fullName}}</w:t>"));
        assert!(xml.contains("<w:t></w:t>"));
    }

    #[test]
    fn test_trailing_space_is_preserved() {
        let mut body = DocumentBody::parse(SPLIT).unwrap();
        assert!(body.replace_range(2, 6..10, ""));
        assert!(body.to_xml().contains(r#"<w:t xml:space="preserve">IBAN: </w:t>"#));
    }

    #[test]
    fn test_flat_text_layer() {
        let xml = "<w:p><w:r><w:t>A &amp; B: ....</w:t></w:p><w:p/><w:p><w:t>IBAN</w:t></w:p>";
        assert_eq!(flat_text_layer(xml), "A & B: ....\n\nIBAN\n");
    }

    #[test]
    fn test_replace_out_of_range() {
        let mut body = DocumentBody::parse(SPLIT).unwrap();
        assert!(!body.replace_range(7, 0..1, "x"));
        assert!(!body.replace_range(1, 0..1, "x"));
    }
}
