//! The four top-level stanza types and their common plumbing.

use minidom::Element;

use crate::error::{Error, ProtocolError};
use crate::jid::Jid;

mod error;
mod iq;
mod message;
mod presence;

pub use error::{ErrorCondition, ErrorType, StanzaError};
pub use iq::{Iq, IqType};
pub use message::{Message, MessageBody, MessageType};
pub use presence::{Presence, PresenceType, Show};

/// Any top-level element of an XMPP stream.
#[derive(Clone, Debug)]
pub enum Stanza {
    /// `<iq/>`: request/response
    Iq(Iq),
    /// `<message/>`: one-shot delivery
    Message(Message),
    /// `<presence/>`: availability broadcast
    Presence(Presence),
    /// Top-level `<error/>`
    Error(StanzaError),
}

impl Stanza {
    /// The stanza's element name.
    pub fn name(&self) -> &'static str {
        match self {
            Stanza::Iq(_) => "iq",
            Stanza::Message(_) => "message",
            Stanza::Presence(_) => "presence",
            Stanza::Error(_) => "error",
        }
    }

    /// Serialize for transmission inside a stream. The stream's default
    /// namespace applies, so no `xmlns` is written on the stanza itself.
    pub fn to_xml(&self) -> Result<String, Error> {
        match self {
            Stanza::Iq(iq) => iq.to_xml(),
            Stanza::Message(message) => message.to_xml(),
            Stanza::Presence(presence) => presence.to_xml(),
            Stanza::Error(error) => {
                let mut out = String::new();
                error.write_xml(&mut out)?;
                Ok(out)
            }
        }
    }
}

impl TryFrom<Element> for Stanza {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Stanza, Error> {
        match elem.name() {
            "iq" => Iq::try_from(elem).map(Stanza::Iq),
            "message" => Message::try_from(elem).map(Stanza::Message),
            "presence" => Presence::try_from(elem).map(Stanza::Presence),
            "error" => StanzaError::try_from(elem).map(Stanza::Error),
            other => Err(ProtocolError::UnexpectedElement(other.to_owned()).into()),
        }
    }
}

impl From<Iq> for Stanza {
    fn from(iq: Iq) -> Stanza {
        Stanza::Iq(iq)
    }
}

impl From<Message> for Stanza {
    fn from(message: Message) -> Stanza {
        Stanza::Message(message)
    }
}

impl From<Presence> for Stanza {
    fn from(presence: Presence) -> Stanza {
        Stanza::Presence(presence)
    }
}

impl From<StanzaError> for Stanza {
    fn from(error: StanzaError) -> Stanza {
        Stanza::Error(error)
    }
}

pub(crate) fn jid_attr(elem: &Element, name: &str) -> Result<Option<Jid>, Error> {
    match elem.attr(name) {
        Some(value) => Ok(Some(value.parse()?)),
        None => Ok(None),
    }
}
