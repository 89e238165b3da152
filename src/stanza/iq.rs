//! `<iq/>`: the request/response stanza.

use std::fmt;

use minidom::Element;

use crate::error::{Error, ParseError, ProtocolError};
use crate::jid::Jid;
use crate::xml;

use super::{jid_attr, StanzaError};

/// The `type` attribute of an `<iq/>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IqType {
    /// Request for information
    Get,
    /// Request changing state
    Set,
    /// Successful response
    Result,
    /// Failure response
    Error,
}

impl IqType {
    /// The attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            IqType::Get => "get",
            IqType::Set => "set",
            IqType::Result => "result",
            IqType::Error => "error",
        }
    }

    fn from_attr(value: &str) -> Result<IqType, ParseError> {
        match value {
            "get" => Ok(IqType::Get),
            "set" => Ok(IqType::Set),
            "result" => Ok(IqType::Result),
            "error" => Ok(IqType::Error),
            _ => Err(ParseError("unknown iq type")),
        }
    }
}

impl fmt::Display for IqType {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.as_str())
    }
}

/// An `<iq/>` stanza.
///
/// The payload is kept as raw inner XML so that unknown extensions pass
/// through unharmed; [`Iq::payload_encode`] and [`Iq::payload_decode`]
/// convert to and from typed values on demand.
#[derive(Clone, Debug)]
pub struct Iq {
    /// Request/response correlation id
    pub id: String,
    /// What kind of exchange this is
    pub type_: IqType,
    /// Addressee
    pub to: Option<Jid>,
    /// Sender; servers fill this in for routed stanzas
    pub from: Option<Jid>,
    /// Raw inner XML, excluding any `<error/>` child
    pub payload: String,
    /// Embedded error, present on `type='error'` responses
    pub error: Option<StanzaError>,
}

impl Iq {
    /// A fresh iq with no addressing and no payload.
    pub fn new(type_: IqType, id: impl Into<String>) -> Iq {
        Iq {
            id: id.into(),
            type_,
            to: None,
            from: None,
            payload: String::new(),
            error: None,
        }
    }

    /// Marshal `payload` to XML and store it as this iq's payload.
    pub fn payload_encode<T: Into<Element>>(&mut self, payload: T) -> Result<(), Error> {
        self.payload = xml::element_to_string(&payload.into())?;
        Ok(())
    }

    /// Decode the stored payload into a typed value.
    pub fn payload_decode<T>(&self) -> Result<T, Error>
    where
        T: TryFrom<Element, Error = Error>,
    {
        if self.payload.is_empty() {
            return Err(ParseError("iq carries no payload").into());
        }
        let elem: Element = self.payload.parse().map_err(ProtocolError::Parser)?;
        T::try_from(elem)
    }

    /// The qualified name `(namespace, local)` of the payload element, used
    /// for dispatch without fully decoding it.
    pub fn payload_name(&self) -> Option<(String, String)> {
        let elem: Element = self.payload.parse().ok()?;
        Some((elem.ns().to_string(), elem.name().to_owned()))
    }

    /// A response to this iq: same id, `to` and `from` swapped, no payload.
    pub fn response(&self, type_: IqType) -> Iq {
        Iq {
            id: self.id.clone(),
            type_,
            to: self.from.clone(),
            from: self.to.clone(),
            payload: String::new(),
            error: None,
        }
    }

    pub(crate) fn to_xml(&self) -> Result<String, Error> {
        let mut out = String::new();
        out.push_str("<iq");
        xml::push_attr(&mut out, "id", &self.id)?;
        xml::push_attr(&mut out, "type", self.type_.as_str())?;
        if let Some(to) = &self.to {
            xml::push_attr(&mut out, "to", &to.full())?;
        }
        if let Some(from) = &self.from {
            xml::push_attr(&mut out, "from", &from.full())?;
        }
        out.push('>');
        out.push_str(&self.payload);
        if let Some(error) = &self.error {
            error.write_xml(&mut out)?;
        }
        out.push_str("</iq>");
        Ok(out)
    }
}

impl TryFrom<Element> for Iq {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Iq, Error> {
        if elem.name() != "iq" {
            return Err(ParseError("expected an <iq/> element").into());
        }
        let id = elem.attr("id").unwrap_or_default().to_owned();
        let type_ = IqType::from_attr(
            elem.attr("type")
                .ok_or(ParseError("iq requires a type attribute"))?,
        )?;
        let to = jid_attr(&elem, "to")?;
        let from = jid_attr(&elem, "from")?;
        let mut payload = String::new();
        let mut error = None;
        for child in elem.children() {
            if child.name() == "error" && child.ns() == elem.ns() {
                error = Some(StanzaError::try_from(child.clone())?);
            } else {
                payload.push_str(&xml::element_to_string(child)?);
            }
        }
        Ok(Iq {
            id,
            type_,
            to,
            from,
            payload,
            error,
        })
    }
}
