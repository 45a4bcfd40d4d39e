//! Lossless XML event list for OOXML parts.
//!
//! Parsing keeps every event in document order; writing re-emits them so an
//! untouched part round-trips. Attribute values are stored raw (still
//! escaped) and written back verbatim. Text is unescaped on read and escaped
//! on write.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use docfill_core::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub enum XmlEvent {
    Decl {
        version: String,
        encoding: Option<String>,
        standalone: Option<String>,
    },
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Empty {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
    CData {
        text: String,
    },
    Comment {
        text: String,
    },
    PI {
        content: String,
    },
    DocType {
        text: String,
    },
}

impl XmlEvent {
    /// Set (or add) an attribute on a start-like event. No-op otherwise.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        if let XmlEvent::Start { attrs, .. } | XmlEvent::Empty { attrs, .. } = self {
            if let Some((_, v)) = attrs.iter_mut().find(|(k, _)| k == key) {
                *v = value.to_string();
            } else {
                attrs.push((key.to_string(), value.to_string()));
            }
        }
    }
}

fn xml_err(context: &str, e: impl std::fmt::Display) -> Error {
    Error::Xml(format!("{}: {}", context, e))
}

pub fn parse_events(xml: &[u8]) -> Result<Vec<XmlEvent>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut events = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let ev = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_err("read event", e))?;
        match ev {
            Event::Eof => break,
            Event::Decl(d) => {
                let version = lossy(d.version().map_err(|e| xml_err("decl version", e))?);
                let encoding = d.encoding().and_then(|r| r.ok()).map(lossy);
                let standalone = d.standalone().and_then(|r| r.ok()).map(lossy);
                events.push(XmlEvent::Decl {
                    version,
                    encoding,
                    standalone,
                });
            }
            Event::Start(s) => events.push(XmlEvent::Start {
                name: lossy(s.name().as_ref()),
                attrs: raw_attrs(&s)?,
            }),
            Event::End(e) => events.push(XmlEvent::End {
                name: lossy(e.name().as_ref()),
            }),
            Event::Empty(s) => events.push(XmlEvent::Empty {
                name: lossy(s.name().as_ref()),
                attrs: raw_attrs(&s)?,
            }),
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| xml_err("unescape text", e))?;
                events.push(XmlEvent::Text {
                    text: text.into_owned(),
                });
            }
            Event::CData(t) => events.push(XmlEvent::CData {
                text: lossy(t.into_inner()),
            }),
            Event::Comment(t) => events.push(XmlEvent::Comment {
                text: lossy(t.into_inner()),
            }),
            Event::PI(t) => events.push(XmlEvent::PI {
                content: format!("{}{}", lossy(t.target()), lossy(t.content())),
            }),
            Event::DocType(t) => events.push(XmlEvent::DocType {
                text: lossy(t.into_inner()),
            }),
        }
    }
    Ok(events)
}

fn raw_attrs(s: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for a in s.attributes() {
        let a = a.map_err(|e| xml_err("attribute", e))?;
        attrs.push((lossy(a.key.as_ref()), lossy(a.value.as_ref())));
    }
    Ok(attrs)
}

fn lossy(bytes: impl AsRef<[u8]>) -> String {
    String::from_utf8_lossy(bytes.as_ref()).into_owned()
}

pub fn write_events(events: &[XmlEvent]) -> String {
    let mut out = String::new();
    for ev in events {
        match ev {
            XmlEvent::Decl {
                version,
                encoding,
                standalone,
            } => {
                out.push_str("<?xml version=\"");
                out.push_str(version);
                out.push('"');
                if let Some(enc) = encoding {
                    out.push_str(" encoding=\"");
                    out.push_str(enc);
                    out.push('"');
                }
                if let Some(sa) = standalone {
                    out.push_str(" standalone=\"");
                    out.push_str(sa);
                    out.push('"');
                }
                out.push_str("?>");
            }
            XmlEvent::Start { name, attrs } => write_tag(&mut out, name, attrs, false),
            XmlEvent::Empty { name, attrs } => write_tag(&mut out, name, attrs, true),
            XmlEvent::End { name } => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            XmlEvent::Text { text } => escape_text_into(&mut out, text),
            XmlEvent::CData { text } => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
            XmlEvent::Comment { text } => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            XmlEvent::PI { content } => {
                out.push_str("<?");
                out.push_str(content);
                out.push_str("?>");
            }
            XmlEvent::DocType { text } => {
                out.push_str("<!DOCTYPE");
                out.push_str(text);
                out.push('>');
            }
        }
    }
    out
}

fn write_tag(out: &mut String, name: &str, attrs: &[(String, String)], empty: bool) {
    out.push('<');
    out.push_str(name);
    for (k, v) in attrs {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        out.push_str(v);
        out.push('"');
    }
    out.push_str(if empty { "/>" } else { ">" });
}

fn escape_text_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
