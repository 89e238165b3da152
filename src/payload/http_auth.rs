//! XEP-0070: Verifying HTTP Requests via XMPP.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::ns;

/// A `<confirm/>` request asking the user to approve an HTTP request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirm {
    /// Transaction identifier from the HTTP side
    pub id: String,
    /// HTTP method of the request being confirmed
    pub method: String,
    /// URL of the request being confirmed
    pub url: String,
}

impl From<Confirm> for Element {
    fn from(confirm: Confirm) -> Element {
        Element::builder("confirm", ns::HTTP_AUTH)
            .attr("id", confirm.id)
            .attr("method", confirm.method)
            .attr("url", confirm.url)
            .build()
    }
}

impl TryFrom<Element> for Confirm {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Confirm, Error> {
        if !elem.is("confirm", ns::HTTP_AUTH) {
            return Err(ParseError("expected a <confirm/> element").into());
        }
        Ok(Confirm {
            id: elem
                .attr("id")
                .ok_or(ParseError("confirm requires an id attribute"))?
                .to_owned(),
            method: elem
                .attr("method")
                .ok_or(ParseError("confirm requires a method attribute"))?
                .to_owned(),
            url: elem
                .attr("url")
                .ok_or(ParseError("confirm requires a url attribute"))?
                .to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let confirm = Confirm {
            id: "a7374jnjlalasdf82".to_owned(),
            method: "GET".to_owned(),
            url: "https://files.shakespeare.lit:9345/missive.html".to_owned(),
        };
        let elem = Element::from(confirm.clone());
        assert_eq!(Confirm::try_from(elem).unwrap(), confirm);
    }

    #[test]
    fn test_missing_attribute() {
        let elem: Element = "<confirm xmlns='http://jabber.org/protocol/http-auth' id='x'/>"
            .parse()
            .unwrap();
        assert!(Confirm::try_from(elem).is_err());
    }
}
