//! Textual XML helpers: tag writing for the outbound path, stanza boundary
//! detection for the inbound path, and the namespace rewriting that makes a
//! captured stanza parse as a document of its own.

use std::fmt::{self, Write};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, ProtocolError};

/// XML-escape a text or attribute value.
pub fn escape(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\'' => result.push_str("&apos;"),
            '"' => result.push_str("&quot;"),
            o => result.push(o),
        }
    }
    result
}

/// Write a possibly prefixed element or attribute name.
///
/// The prefix is rendered textually (`prefix:local`); the surrounding stream
/// is expected to have declared it.
pub fn write_name<W: Write>(w: &mut W, prefix: &str, local: &str) -> fmt::Result {
    if prefix.is_empty() {
        w.write_str(local)
    } else {
        write!(w, "{}:{}", prefix, local)
    }
}

/// Write a single-quoted, escaped attribute.
pub fn write_attr<W: Write>(w: &mut W, prefix: &str, local: &str, value: &str) -> fmt::Result {
    write_name(w, prefix, local)?;
    write!(w, "='{}'", escape(value))
}

/// Write a start tag with its attributes.
pub fn write_start<W: Write>(
    w: &mut W,
    prefix: &str,
    local: &str,
    attrs: &[(&str, &str)],
) -> fmt::Result {
    w.write_char('<')?;
    write_name(w, prefix, local)?;
    for (name, value) in attrs {
        w.write_char(' ')?;
        write_attr(w, "", name, value)?;
    }
    w.write_char('>')
}

/// Write an end tag.
pub fn write_end<W: Write>(w: &mut W, prefix: &str, local: &str) -> fmt::Result {
    w.write_str("</")?;
    write_name(w, prefix, local)?;
    w.write_char('>')
}

/// Write ` name='value'` onto a tag under construction.
pub fn push_attr<W: Write>(w: &mut W, name: &str, value: &str) -> fmt::Result {
    w.write_char(' ')?;
    write_attr(w, "", name, value)
}

/// Serialize an element subtree, including its namespace declarations.
pub fn element_to_string(elem: &minidom::Element) -> Result<String, Error> {
    let mut bytes = Vec::new();
    elem.write_to(&mut bytes).map_err(ProtocolError::Parser)?;
    String::from_utf8(bytes).map_err(|e| Error::Utf8(e.utf8_error()))
}

/// The xmlns bindings of a stream's root element.
#[derive(Clone, Debug, Default)]
pub struct NamespaceBindings {
    /// Default namespace (`xmlns='…'`)
    pub default_ns: String,
    /// Prefixed namespaces (`xmlns:prefix='…'`)
    pub prefixes: Vec<(String, String)>,
}

impl NamespaceBindings {
    /// Collect the bindings declared by a root element's attribute list.
    pub fn from_attrs(attrs: &[(String, String)]) -> NamespaceBindings {
        let mut bindings = NamespaceBindings::default();
        for (name, value) in attrs {
            if name == "xmlns" {
                bindings.default_ns = value.clone();
            } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                bindings.prefixes.push((prefix.to_owned(), value.clone()));
            }
        }
        bindings
    }

    /// Look up the namespace bound to `prefix`.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }
}

/// One step of inbound framing.
#[derive(Debug)]
pub(crate) enum Frame {
    /// The peer's root start tag, with its raw attribute list.
    Root {
        name: String,
        attrs: Vec<(String, String)>,
        consumed: usize,
    },
    /// A complete direct child of the root: `buf[start..end]`.
    Child {
        start: usize,
        end: usize,
        consumed: usize,
    },
    /// The root's end tag: the peer has closed the stream.
    StreamEnd { consumed: usize },
    /// The buffer does not hold a complete unit yet.
    Incomplete,
}

fn reader_for(buf: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(buf);
    reader.config_mut().check_end_names = false;
    reader
}

/// Find the peer's root start tag in `buf`.
pub(crate) fn extract_root(buf: &[u8]) -> Result<Frame, Error> {
    let mut reader = reader_for(buf);
    loop {
        match reader.read_event() {
            Ok(Event::Decl(_))
            | Ok(Event::PI(_))
            | Ok(Event::Comment(_))
            | Ok(Event::DocType(_))
            | Ok(Event::Text(_)) => continue,
            Ok(Event::Start(e)) => {
                let consumed = reader.buffer_position() as usize;
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let mut attrs = Vec::new();
                for attr in e.attributes() {
                    let attr = match attr {
                        Ok(attr) => attr,
                        Err(_) => return Err(ProtocolError::InvalidStreamStart.into()),
                    };
                    attrs.push((
                        String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                        String::from_utf8_lossy(&attr.value).into_owned(),
                    ));
                }
                return Ok(Frame::Root {
                    name,
                    attrs,
                    consumed,
                });
            }
            Ok(Event::Eof) => return Ok(Frame::Incomplete),
            Ok(_) => return Err(ProtocolError::InvalidStreamStart.into()),
            Err(quick_xml::Error::Syntax(_)) => return Ok(Frame::Incomplete),
            Err(e) => return Err(ProtocolError::Framing(e).into()),
        }
    }
}

/// Find the next complete direct child of the root in `buf`.
///
/// Text at the top level (whitespace keep-alives) is skipped; an end tag at
/// the top level is the end of the stream.
pub(crate) fn extract_child(buf: &[u8]) -> Result<Frame, Error> {
    let mut reader = reader_for(buf);
    let mut depth = 0usize;
    let mut start = 0usize;
    loop {
        let pos = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Decl(_))
            | Ok(Event::PI(_))
            | Ok(Event::Comment(_))
            | Ok(Event::DocType(_))
            | Ok(Event::Text(_))
            | Ok(Event::CData(_)) => continue,
            Ok(Event::Start(_)) => {
                if depth == 0 {
                    start = pos;
                }
                depth += 1;
            }
            Ok(Event::Empty(_)) => {
                if depth == 0 {
                    let end = reader.buffer_position() as usize;
                    return Ok(Frame::Child {
                        start: pos,
                        end,
                        consumed: end,
                    });
                }
            }
            Ok(Event::End(_)) => {
                if depth == 0 {
                    return Ok(Frame::StreamEnd {
                        consumed: reader.buffer_position() as usize,
                    });
                }
                depth -= 1;
                if depth == 0 {
                    let end = reader.buffer_position() as usize;
                    return Ok(Frame::Child {
                        start,
                        end,
                        consumed: end,
                    });
                }
            }
            Ok(Event::Eof) => return Ok(Frame::Incomplete),
            Err(quick_xml::Error::Syntax(_)) => return Ok(Frame::Incomplete),
            Err(e) => return Err(ProtocolError::Framing(e).into()),
        }
    }
}

/// Rewrite an extracted child element so that it parses as a standalone
/// document.
///
/// The underlying parser resolves a child's namespace from declarations on
/// the stream's root element, which the captured text no longer carries. A
/// prefixed root (`<stream:features>`) has its prefix stripped and the bound
/// namespace declared inline; an unprefixed root without its own `xmlns`
/// gets the stream's default namespace declared inline.
pub(crate) fn into_standalone(raw: &str, bindings: &NamespaceBindings) -> String {
    let raw = raw.trim_start();
    let name_end = raw[1..]
        .find([' ', '\t', '\r', '\n', '>', '/'])
        .map(|i| i + 1)
        .unwrap_or(raw.len());
    let qname = &raw[1..name_end];

    if let Some((prefix, _)) = qname.split_once(':') {
        let uri = match bindings.resolve(prefix) {
            Some(uri) => uri.to_owned(),
            None => return raw.to_owned(),
        };
        let opening = format!("<{}:", prefix);
        let closing = format!("</{}:", prefix);
        let mut result = String::with_capacity(raw.len());
        let mut rest = raw;
        while !rest.is_empty() {
            if rest.starts_with(&closing) {
                result.push_str("</");
                rest = &rest[closing.len()..];
            } else if rest.starts_with(&opening) {
                result.push('<');
                rest = &rest[opening.len()..];
            } else {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    result.push(c);
                }
                rest = chars.as_str();
            }
        }
        return declare_xmlns(result, &uri);
    }

    declare_xmlns(raw.to_owned(), &bindings.default_ns)
}

/// Insert ` xmlns='…'` into the root tag of `doc` unless it already declares
/// a default namespace.
fn declare_xmlns(doc: String, ns: &str) -> String {
    if ns.is_empty() {
        return doc;
    }
    let root_end = doc.find('>').unwrap_or(doc.len());
    if doc[..root_end].contains(" xmlns=") {
        return doc;
    }
    match doc.find([' ', '>', '/']) {
        Some(pos) => {
            let mut out = String::with_capacity(doc.len() + ns.len() + 10);
            out.push_str(&doc[..pos]);
            out.push_str(" xmlns='");
            out.push_str(ns);
            out.push('\'');
            out.push_str(&doc[pos..]);
            out
        }
        None => doc,
    }
}
