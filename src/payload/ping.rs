//! XEP-0199: XMPP Ping.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::ns;

/// A ping, to be answered with an empty result or an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ping;

impl From<Ping> for Element {
    fn from(_: Ping) -> Element {
        Element::builder("ping", ns::PING).build()
    }
}

impl TryFrom<Element> for Ping {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Ping, Error> {
        if !elem.is("ping", ns::PING) {
            return Err(ParseError("expected a <ping/> element").into());
        }
        Ok(Ping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let elem: Element = "<ping xmlns='urn:xmpp:ping'/>".parse().unwrap();
        Ping::try_from(elem).unwrap();
        let elem = Element::from(Ping);
        assert!(elem.is("ping", ns::PING));
    }

    #[test]
    fn test_wrong_namespace() {
        let elem: Element = "<ping xmlns='urn:example'/>".parse().unwrap();
        assert!(Ping::try_from(elem).is_err());
    }
}
