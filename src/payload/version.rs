//! XEP-0092: Software Version.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::ns;

/// A `jabber:iq:version` query or result. All fields are empty in requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SoftwareVersion {
    /// Software name
    pub name: Option<String>,
    /// Software version
    pub version: Option<String>,
    /// Operating system
    pub os: Option<String>,
}

impl From<SoftwareVersion> for Element {
    fn from(version: SoftwareVersion) -> Element {
        let mut builder = Element::builder("query", ns::VERSION);
        if let Some(name) = version.name {
            builder = builder.append(Element::builder("name", ns::VERSION).append(name).build());
        }
        if let Some(value) = version.version {
            builder = builder.append(Element::builder("version", ns::VERSION).append(value).build());
        }
        if let Some(os) = version.os {
            builder = builder.append(Element::builder("os", ns::VERSION).append(os).build());
        }
        builder.build()
    }
}

impl TryFrom<Element> for SoftwareVersion {
    type Error = Error;

    fn try_from(elem: Element) -> Result<SoftwareVersion, Error> {
        if !elem.is("query", ns::VERSION) {
            return Err(ParseError("expected a jabber:iq:version <query/> element").into());
        }
        let mut version = SoftwareVersion::default();
        for child in elem.children() {
            if child.is("name", ns::VERSION) {
                version.name = Some(child.text());
            } else if child.is("version", ns::VERSION) {
                version.version = Some(child.text());
            } else if child.is("os", ns::VERSION) {
                version.os = Some(child.text());
            }
        }
        Ok(version)
    }
}
