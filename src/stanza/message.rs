//! `<message/>`: one-shot delivery.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::jid::Jid;
use crate::xml;

use super::{jid_attr, StanzaError};

/// The `type` attribute of a `<message/>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MessageType {
    /// One-to-one conversation
    Chat,
    /// Delivery failure report
    Error,
    /// Multi-user chat
    Groupchat,
    /// Broadcast that expects no reply
    Headline,
    /// Anything else
    #[default]
    Normal,
}

impl MessageType {
    /// The attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Chat => "chat",
            MessageType::Error => "error",
            MessageType::Groupchat => "groupchat",
            MessageType::Headline => "headline",
            MessageType::Normal => "normal",
        }
    }

    fn from_attr(value: &str) -> Result<MessageType, ParseError> {
        match value {
            "chat" => Ok(MessageType::Chat),
            "error" => Ok(MessageType::Error),
            "groupchat" => Ok(MessageType::Groupchat),
            "headline" => Ok(MessageType::Headline),
            "normal" => Ok(MessageType::Normal),
            _ => Err(ParseError("unknown message type")),
        }
    }
}

/// One `<body/>` of a message, optionally language-tagged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageBody {
    /// `xml:lang` of this body
    pub lang: Option<String>,
    /// The text itself
    pub value: String,
}

/// A `<message/>` stanza.
#[derive(Clone, Debug, Default)]
pub struct Message {
    /// Optional stanza id
    pub id: Option<String>,
    /// What kind of message this is
    pub type_: MessageType,
    /// Addressee
    pub to: Option<Jid>,
    /// Sender; servers fill this in for routed stanzas
    pub from: Option<Jid>,
    /// `<subject/>` text
    pub subject: Option<String>,
    /// `<thread/>` id
    pub thread: Option<String>,
    /// The message bodies, one per language
    pub bodies: Vec<MessageBody>,
    /// Extension children (chat states, receipts, …)
    pub payloads: Vec<Element>,
    /// Embedded error, present on `type='error'` bounces
    pub error: Option<StanzaError>,
}

impl Message {
    /// A plain chat message.
    pub fn chat(to: Jid, body: &str) -> Message {
        Message {
            type_: MessageType::Chat,
            to: Some(to),
            bodies: vec![MessageBody {
                lang: None,
                value: body.to_owned(),
            }],
            ..Message::default()
        }
    }

    /// The first body's text, if any.
    pub fn body(&self) -> Option<&str> {
        self.bodies.first().map(|body| body.value.as_str())
    }

    pub(crate) fn to_xml(&self) -> Result<String, Error> {
        let mut out = String::new();
        out.push_str("<message");
        if let Some(id) = &self.id {
            xml::push_attr(&mut out, "id", id)?;
        }
        xml::push_attr(&mut out, "type", self.type_.as_str())?;
        if let Some(to) = &self.to {
            xml::push_attr(&mut out, "to", &to.full())?;
        }
        if let Some(from) = &self.from {
            xml::push_attr(&mut out, "from", &from.full())?;
        }
        out.push('>');
        if let Some(subject) = &self.subject {
            out.push_str("<subject>");
            out.push_str(&xml::escape(subject));
            out.push_str("</subject>");
        }
        for body in &self.bodies {
            match &body.lang {
                Some(lang) => {
                    out.push_str("<body");
                    out.push(' ');
                    xml::write_attr(&mut out, "xml", "lang", lang)?;
                    out.push('>');
                }
                None => out.push_str("<body>"),
            }
            out.push_str(&xml::escape(&body.value));
            out.push_str("</body>");
        }
        if let Some(thread) = &self.thread {
            out.push_str("<thread>");
            out.push_str(&xml::escape(thread));
            out.push_str("</thread>");
        }
        for payload in &self.payloads {
            out.push_str(&xml::element_to_string(payload)?);
        }
        if let Some(error) = &self.error {
            error.write_xml(&mut out)?;
        }
        out.push_str("</message>");
        Ok(out)
    }
}

impl TryFrom<Element> for Message {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Message, Error> {
        if elem.name() != "message" {
            return Err(ParseError("expected a <message/> element").into());
        }
        let mut message = Message {
            id: elem.attr("id").map(str::to_owned),
            type_: match elem.attr("type") {
                Some(value) => MessageType::from_attr(value)?,
                None => MessageType::Normal,
            },
            to: jid_attr(&elem, "to")?,
            from: jid_attr(&elem, "from")?,
            ..Message::default()
        };
        for child in elem.children() {
            if child.ns() == elem.ns() {
                match child.name() {
                    "subject" => {
                        message.subject = Some(child.text());
                        continue;
                    }
                    "thread" => {
                        message.thread = Some(child.text());
                        continue;
                    }
                    "body" => {
                        message.bodies.push(MessageBody {
                            lang: child.attr("xml:lang").map(str::to_owned),
                            value: child.text(),
                        });
                        continue;
                    }
                    "error" => {
                        message.error = Some(StanzaError::try_from(child.clone())?);
                        continue;
                    }
                    _ => {}
                }
            }
            message.payloads.push(child.clone());
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ns;

    #[test]
    fn test_parse() {
        let elem: Element = "<message xmlns='jabber:client' type='chat' \
             from='alice@wonderland.lit/rabbit-hole' id='m1'>\
             <subject>greeting</subject>\
             <body>hello</body><body xml:lang='de'>hallo</body>\
             <thread>t1</thread>\
             <active xmlns='http://jabber.org/protocol/chatstates'/>\
             </message>"
            .parse()
            .unwrap();
        let message = Message::try_from(elem).unwrap();
        assert_eq!(message.type_, MessageType::Chat);
        assert_eq!(message.subject.as_deref(), Some("greeting"));
        assert_eq!(message.thread.as_deref(), Some("t1"));
        assert_eq!(message.body(), Some("hello"));
        assert_eq!(message.bodies[1].lang.as_deref(), Some("de"));
        assert_eq!(message.payloads.len(), 1);
        assert!(message.payloads[0].is("active", ns::CHATSTATES));
    }

    #[test]
    fn test_default_type_is_normal() {
        let elem: Element = "<message xmlns='jabber:client'><body>hi</body></message>"
            .parse()
            .unwrap();
        let message = Message::try_from(elem).unwrap();
        assert_eq!(message.type_, MessageType::Normal);
    }

    #[test]
    fn test_to_xml() {
        let message = Message::chat("bob@example.com".parse().unwrap(), "hi & bye");
        assert_eq!(
            message.to_xml().unwrap(),
            "<message type='chat' to='bob@example.com'><body>hi &amp; bye</body></message>"
        );
    }
}
