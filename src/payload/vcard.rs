//! XEP-0054: vcard-temp.
//!
//! vCards are large and loosely structured; the library transports them
//! opaquely and leaves interpretation to the application.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::ns;

/// A `<vCard/>` payload, kept as its raw child elements.
#[derive(Clone, Debug, Default)]
pub struct VCard {
    /// The vCard's fields, uninterpreted
    pub fields: Vec<Element>,
}

impl From<VCard> for Element {
    fn from(vcard: VCard) -> Element {
        let mut builder = Element::builder("vCard", ns::VCARD);
        for field in vcard.fields {
            builder = builder.append(field);
        }
        builder.build()
    }
}

impl TryFrom<Element> for VCard {
    type Error = Error;

    fn try_from(elem: Element) -> Result<VCard, Error> {
        if !elem.is("vCard", ns::VCARD) {
            return Err(ParseError("expected a <vCard/> element").into());
        }
        Ok(VCard {
            fields: elem.children().cloned().collect(),
        })
    }
}
