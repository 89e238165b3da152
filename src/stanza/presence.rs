//! `<presence/>`: availability broadcast.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::jid::Jid;
use crate::xml;

use super::{jid_attr, StanzaError};

/// The `type` attribute of a `<presence/>`. Absence of the attribute means
/// "available", modeled as [`PresenceType::None`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PresenceType {
    /// Available (no attribute on the wire)
    #[default]
    None,
    /// Delivery failure report
    Error,
    /// Server probe for current presence
    Probe,
    /// Subscription request
    Subscribe,
    /// Subscription request granted
    Subscribed,
    /// No longer available
    Unavailable,
    /// Subscription cancelled by the subscriber
    Unsubscribe,
    /// Subscription cancelled by the subscribee
    Unsubscribed,
}

impl PresenceType {
    /// The attribute value; `None` for the default type, which is encoded
    /// by omitting the attribute.
    pub fn as_attr(&self) -> Option<&'static str> {
        match self {
            PresenceType::None => None,
            PresenceType::Error => Some("error"),
            PresenceType::Probe => Some("probe"),
            PresenceType::Subscribe => Some("subscribe"),
            PresenceType::Subscribed => Some("subscribed"),
            PresenceType::Unavailable => Some("unavailable"),
            PresenceType::Unsubscribe => Some("unsubscribe"),
            PresenceType::Unsubscribed => Some("unsubscribed"),
        }
    }

    fn from_attr(value: &str) -> Result<PresenceType, ParseError> {
        match value {
            "error" => Ok(PresenceType::Error),
            "probe" => Ok(PresenceType::Probe),
            "subscribe" => Ok(PresenceType::Subscribe),
            "subscribed" => Ok(PresenceType::Subscribed),
            "unavailable" => Ok(PresenceType::Unavailable),
            "unsubscribe" => Ok(PresenceType::Unsubscribe),
            "unsubscribed" => Ok(PresenceType::Unsubscribed),
            _ => Err(ParseError("unknown presence type")),
        }
    }
}

/// The `<show/>` child, refining an available presence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Show {
    /// Temporarily away
    Away,
    /// Interested in chatting
    Chat,
    /// Do not disturb
    Dnd,
    /// Away for an extended period
    Xa,
}

impl Show {
    /// The element text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Show::Away => "away",
            Show::Chat => "chat",
            Show::Dnd => "dnd",
            Show::Xa => "xa",
        }
    }

    fn from_text(value: &str) -> Result<Show, ParseError> {
        match value {
            "away" => Ok(Show::Away),
            "chat" => Ok(Show::Chat),
            "dnd" => Ok(Show::Dnd),
            "xa" => Ok(Show::Xa),
            _ => Err(ParseError("unknown presence show value")),
        }
    }
}

/// A `<presence/>` stanza.
#[derive(Clone, Debug, Default)]
pub struct Presence {
    /// Optional stanza id
    pub id: Option<String>,
    /// What kind of presence this is
    pub type_: PresenceType,
    /// Addressee; usually absent for broadcasts
    pub to: Option<Jid>,
    /// Sender; servers fill this in for routed stanzas
    pub from: Option<Jid>,
    /// `<show/>` refinement
    pub show: Option<Show>,
    /// `<status/>` free-form text
    pub status: Option<String>,
    /// Extension children (avatars, nicknames, …)
    pub payloads: Vec<Element>,
    /// Embedded error, present on `type='error'` bounces
    pub error: Option<StanzaError>,
}

impl Presence {
    /// An available presence with the given show and status.
    pub fn available(show: Option<Show>, status: &str) -> Presence {
        Presence {
            show,
            status: if status.is_empty() {
                None
            } else {
                Some(status.to_owned())
            },
            ..Presence::default()
        }
    }

    pub(crate) fn to_xml(&self) -> Result<String, Error> {
        let mut out = String::new();
        out.push_str("<presence");
        if let Some(id) = &self.id {
            xml::push_attr(&mut out, "id", id)?;
        }
        if let Some(type_) = self.type_.as_attr() {
            xml::push_attr(&mut out, "type", type_)?;
        }
        if let Some(to) = &self.to {
            xml::push_attr(&mut out, "to", &to.full())?;
        }
        if let Some(from) = &self.from {
            xml::push_attr(&mut out, "from", &from.full())?;
        }
        out.push('>');
        if let Some(show) = &self.show {
            out.push_str("<show>");
            out.push_str(show.as_str());
            out.push_str("</show>");
        }
        if let Some(status) = &self.status {
            out.push_str("<status>");
            out.push_str(&xml::escape(status));
            out.push_str("</status>");
        }
        for payload in &self.payloads {
            out.push_str(&xml::element_to_string(payload)?);
        }
        if let Some(error) = &self.error {
            error.write_xml(&mut out)?;
        }
        out.push_str("</presence>");
        Ok(out)
    }
}

impl TryFrom<Element> for Presence {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Presence, Error> {
        if elem.name() != "presence" {
            return Err(ParseError("expected a <presence/> element").into());
        }
        let mut presence = Presence {
            id: elem.attr("id").map(str::to_owned),
            type_: match elem.attr("type") {
                Some(value) => PresenceType::from_attr(value)?,
                None => PresenceType::None,
            },
            to: jid_attr(&elem, "to")?,
            from: jid_attr(&elem, "from")?,
            ..Presence::default()
        };
        for child in elem.children() {
            if child.ns() == elem.ns() {
                match child.name() {
                    "show" => {
                        presence.show = Some(Show::from_text(child.text().trim())?);
                        continue;
                    }
                    "status" => {
                        presence.status = Some(child.text());
                        continue;
                    }
                    "error" => {
                        presence.error = Some(StanzaError::try_from(child.clone())?);
                        continue;
                    }
                    _ => {}
                }
            }
            presence.payloads.push(child.clone());
        }
        Ok(presence)
    }
}
