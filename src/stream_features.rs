//! Typed view of `<stream:features/>`.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::ns;

/// The features the peer advertised after the stream was opened.
///
/// Only the features the negotiation acts on are modeled; anything else the
/// server offers is ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamFeatures {
    /// `<starttls/>` offer, if any
    pub starttls: Option<StartTls>,
    /// SASL mechanism names from `<mechanisms/>`
    pub mechanisms: Vec<String>,
    /// Whether resource binding is offered
    pub bind: bool,
    /// Whether session establishment is offered
    pub session: bool,
}

/// The `<starttls/>` feature.
#[derive(Clone, Debug, PartialEq)]
pub struct StartTls {
    /// The server refuses to continue without TLS
    pub required: bool,
}

impl TryFrom<Element> for StreamFeatures {
    type Error = Error;

    fn try_from(elem: Element) -> Result<StreamFeatures, Error> {
        if !elem.is("features", ns::STREAM) {
            return Err(ParseError("expected a <stream:features/> element").into());
        }
        let mut features = StreamFeatures::default();
        for child in elem.children() {
            if child.is("starttls", ns::TLS) {
                features.starttls = Some(StartTls {
                    required: child.has_child("required", ns::TLS),
                });
            } else if child.is("mechanisms", ns::SASL) {
                for mechanism in child.children() {
                    if mechanism.is("mechanism", ns::SASL) {
                        features.mechanisms.push(mechanism.text());
                    }
                }
            } else if child.is("bind", ns::BIND) {
                features.bind = true;
            } else if child.is("session", ns::SESSION) {
                features.session = true;
            }
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full() {
        let elem: Element = "<features xmlns='http://etherx.jabber.org/streams'>\
             <starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'><required/></starttls>\
             <mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
             <mechanism>SCRAM-SHA-1</mechanism><mechanism>PLAIN</mechanism></mechanisms>\
             <bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/>\
             <session xmlns='urn:ietf:params:xml:ns:xmpp-session'/>\
             </features>"
            .parse()
            .unwrap();
        let features = StreamFeatures::try_from(elem).unwrap();
        assert_eq!(features.starttls, Some(StartTls { required: true }));
        assert_eq!(features.mechanisms, vec!["SCRAM-SHA-1", "PLAIN"]);
        assert!(features.bind);
        assert!(features.session);
    }

    #[test]
    fn test_empty() {
        let elem: Element = "<features xmlns='http://etherx.jabber.org/streams'/>"
            .parse()
            .unwrap();
        let features = StreamFeatures::try_from(elem).unwrap();
        assert_eq!(features, StreamFeatures::default());
    }

    #[test]
    fn test_optional_starttls() {
        let elem: Element = "<features xmlns='http://etherx.jabber.org/streams'>\
             <starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'/></features>"
            .parse()
            .unwrap();
        let features = StreamFeatures::try_from(elem).unwrap();
        assert_eq!(features.starttls, Some(StartTls { required: false }));
    }

    #[test]
    fn test_wrong_element() {
        let elem: Element = "<foo xmlns='http://etherx.jabber.org/streams'/>"
            .parse()
            .unwrap();
        assert!(StreamFeatures::try_from(elem).is_err());
    }
}
