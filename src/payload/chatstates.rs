//! XEP-0085: Chat State Notifications.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::ns;

/// A chat state, carried as a message payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatState {
    /// Actively participating
    Active,
    /// Composing a message
    Composing,
    /// Left the conversation
    Gone,
    /// Not paying attention
    Inactive,
    /// Paused after composing
    Paused,
}

impl ChatState {
    /// The element name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatState::Active => "active",
            ChatState::Composing => "composing",
            ChatState::Gone => "gone",
            ChatState::Inactive => "inactive",
            ChatState::Paused => "paused",
        }
    }
}

impl From<ChatState> for Element {
    fn from(state: ChatState) -> Element {
        Element::builder(state.as_str(), ns::CHATSTATES).build()
    }
}

impl TryFrom<Element> for ChatState {
    type Error = Error;

    fn try_from(elem: Element) -> Result<ChatState, Error> {
        if elem.ns() != ns::CHATSTATES {
            return Err(ParseError("expected a chat state element").into());
        }
        match elem.name() {
            "active" => Ok(ChatState::Active),
            "composing" => Ok(ChatState::Composing),
            "gone" => Ok(ChatState::Gone),
            "inactive" => Ok(ChatState::Inactive),
            "paused" => Ok(ChatState::Paused),
            _ => Err(ParseError("unknown chat state").into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for state in [
            ChatState::Active,
            ChatState::Composing,
            ChatState::Gone,
            ChatState::Inactive,
            ChatState::Paused,
        ] {
            let elem = Element::from(state);
            assert_eq!(ChatState::try_from(elem).unwrap(), state);
        }
    }

    #[test]
    fn test_unknown_state() {
        let elem: Element = "<typing xmlns='http://jabber.org/protocol/chatstates'/>"
            .parse()
            .unwrap();
        assert!(ChatState::try_from(elem).is_err());
    }
}
