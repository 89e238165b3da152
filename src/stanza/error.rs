//! `<error/>` payloads, both embedded and top-level.

use std::error::Error as StdError;
use std::fmt;

use minidom::Element;

use crate::error::{Error, ParseError, ProtocolError};
use crate::ns;
use crate::xml;

/// The `type` attribute of an error, telling the sender how to react.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorType {
    /// Retry after providing credentials
    Auth,
    /// Do not retry
    Cancel,
    /// The condition was only a warning
    Continue,
    /// Retry after changing the data sent
    Modify,
    /// Retry after waiting
    Wait,
}

impl ErrorType {
    /// The attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Auth => "auth",
            ErrorType::Cancel => "cancel",
            ErrorType::Continue => "continue",
            ErrorType::Modify => "modify",
            ErrorType::Wait => "wait",
        }
    }

    fn from_attr(value: &str) -> Result<ErrorType, ParseError> {
        match value {
            "auth" => Ok(ErrorType::Auth),
            "cancel" => Ok(ErrorType::Cancel),
            "continue" => Ok(ErrorType::Continue),
            "modify" => Ok(ErrorType::Modify),
            "wait" => Ok(ErrorType::Wait),
            _ => Err(ParseError("unknown error type")),
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.as_str())
    }
}

/// A defined condition: a qualified name in the stanza- or stream-error
/// namespace.
///
/// The named variants are the conditions this library raises or recognises
/// itself; everything else is carried verbatim in `Other`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorCondition {
    /// `<conflict/>`
    Conflict,
    /// `<feature-not-implemented/>`
    FeatureNotImplemented,
    /// `<forbidden/>`
    Forbidden,
    /// `<not-acceptable/>`
    NotAcceptable,
    /// `<not-authorized/>`
    NotAuthorized,
    /// `<remote-server-not-found/>`
    RemoteServerNotFound,
    /// `<service-unavailable/>`
    ServiceUnavailable,
    /// Any other condition in either error namespace
    Other {
        /// The condition's namespace
        ns: String,
        /// The condition's element name
        name: String,
    },
}

impl ErrorCondition {
    /// The condition's element name.
    pub fn name(&self) -> &str {
        match self {
            ErrorCondition::Conflict => "conflict",
            ErrorCondition::FeatureNotImplemented => "feature-not-implemented",
            ErrorCondition::Forbidden => "forbidden",
            ErrorCondition::NotAcceptable => "not-acceptable",
            ErrorCondition::NotAuthorized => "not-authorized",
            ErrorCondition::RemoteServerNotFound => "remote-server-not-found",
            ErrorCondition::ServiceUnavailable => "service-unavailable",
            ErrorCondition::Other { name, .. } => name,
        }
    }

    /// The condition's namespace.
    pub fn ns(&self) -> &str {
        match self {
            ErrorCondition::Other { ns, .. } => ns,
            _ => ns::XMPP_STANZAS,
        }
    }

    fn from_name(ns_: &str, name: &str) -> ErrorCondition {
        if ns_ == ns::XMPP_STANZAS {
            match name {
                "conflict" => return ErrorCondition::Conflict,
                "feature-not-implemented" => return ErrorCondition::FeatureNotImplemented,
                "forbidden" => return ErrorCondition::Forbidden,
                "not-acceptable" => return ErrorCondition::NotAcceptable,
                "not-authorized" => return ErrorCondition::NotAuthorized,
                "remote-server-not-found" => return ErrorCondition::RemoteServerNotFound,
                "service-unavailable" => return ErrorCondition::ServiceUnavailable,
                _ => {}
            }
        }
        ErrorCondition::Other {
            ns: ns_.to_owned(),
            name: name.to_owned(),
        }
    }
}

/// An `<error/>` element: a `type` attribute, an optional legacy `code`
/// attribute, and an opaque payload holding the defined condition and an
/// optional descriptive text.
#[derive(Clone, Debug)]
pub struct StanzaError {
    /// How the sender should react
    pub type_: ErrorType,
    /// Legacy numeric code, kept verbatim
    pub code: Option<String>,
    /// Raw inner XML
    pub payload: String,
}

impl StanzaError {
    /// Build an error with the given condition and, if `text` is non-empty,
    /// a `<text/>` child describing it.
    pub fn new(type_: ErrorType, condition: ErrorCondition, text: &str) -> StanzaError {
        let mut payload = String::new();
        payload.push('<');
        payload.push_str(condition.name());
        payload.push_str(" xmlns='");
        payload.push_str(condition.ns());
        payload.push_str("'/>");
        if !text.is_empty() {
            payload.push_str("<text xmlns='");
            payload.push_str(condition.ns());
            payload.push_str("'>");
            payload.push_str(&xml::escape(text));
            payload.push_str("</text>");
        }
        StanzaError {
            type_,
            code: None,
            payload,
        }
    }

    /// Like [`StanzaError::new`], with a legacy code attribute.
    pub fn with_code(
        code: &str,
        type_: ErrorType,
        condition: ErrorCondition,
        text: &str,
    ) -> StanzaError {
        let mut error = StanzaError::new(type_, condition, text);
        error.code = Some(code.to_owned());
        error
    }

    /// Extract the defined condition from the payload.
    ///
    /// A payload without a condition child in one of the two error
    /// namespaces is reported as an error rather than papered over.
    pub fn condition(&self) -> Result<ErrorCondition, Error> {
        for child in self.payload_children()? {
            let child_ns = child.ns();
            if child.name() != "text"
                && (child_ns == ns::XMPP_STANZAS || child_ns == ns::XMPP_STREAMS)
            {
                return Ok(ErrorCondition::from_name(&child_ns, child.name()));
            }
        }
        Err(ProtocolError::MissingErrorCondition.into())
    }

    /// The descriptive `<text/>` from the payload, if present.
    pub fn text(&self) -> Option<String> {
        let children = self.payload_children().ok()?;
        children.into_iter().find_map(|child| {
            let child_ns = child.ns();
            if child.name() == "text"
                && (child_ns == ns::XMPP_STANZAS || child_ns == ns::XMPP_STREAMS)
            {
                Some(child.text())
            } else {
                None
            }
        })
    }

    /// Parse the payload into its child elements. The payload is a
    /// sequence of elements, not a document, so it is parsed under a
    /// throwaway wrapper.
    fn payload_children(&self) -> Result<Vec<Element>, Error> {
        let doc = format!("<error xmlns='{}'>{}</error>", ns::JABBER_CLIENT, self.payload);
        let wrapper: Element = doc.parse().map_err(ProtocolError::Parser)?;
        Ok(wrapper.children().cloned().collect())
    }

    pub(crate) fn write_xml(&self, w: &mut String) -> Result<(), Error> {
        w.push_str("<error");
        if let Some(code) = &self.code {
            xml::push_attr(w, "code", code)?;
        }
        xml::push_attr(w, "type", self.type_.as_str())?;
        w.push('>');
        w.push_str(&self.payload);
        w.push_str("</error>");
        Ok(())
    }
}

impl TryFrom<Element> for StanzaError {
    type Error = Error;

    fn try_from(elem: Element) -> Result<StanzaError, Error> {
        if elem.name() != "error" {
            return Err(ParseError("expected an <error/> element").into());
        }
        let type_ = ErrorType::from_attr(
            elem.attr("type")
                .ok_or(ParseError("error requires a type attribute"))?,
        )?;
        let code = elem.attr("code").map(str::to_owned);
        let mut payload = String::new();
        for child in elem.children() {
            payload.push_str(&xml::element_to_string(child)?);
        }
        Ok(StanzaError {
            type_,
            code,
            payload,
        })
    }
}

impl fmt::Display for StanzaError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let condition = match self.condition() {
            Ok(condition) => condition.name().to_owned(),
            Err(_) => "unknown-condition".to_owned(),
        };
        match self.text() {
            Some(text) => write!(fmt, "[{}] {}, {}", self.type_, condition, text),
            None => write!(fmt, "[{}] {}", self.type_, condition),
        }
    }
}

impl StdError for StanzaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_roundtrips() {
        let error = StanzaError::new(
            ErrorType::Cancel,
            ErrorCondition::FeatureNotImplemented,
            "not yet",
        );
        assert_eq!(
            error.condition().unwrap(),
            ErrorCondition::FeatureNotImplemented
        );
        assert_eq!(error.text().as_deref(), Some("not yet"));
        assert_eq!(format!("{}", error), "[cancel] feature-not-implemented, not yet");
    }

    #[test]
    fn test_new_without_text() {
        let error = StanzaError::new(ErrorType::Wait, ErrorCondition::ServiceUnavailable, "");
        assert_eq!(error.text(), None);
        assert_eq!(format!("{}", error), "[wait] service-unavailable");
    }

    #[test]
    fn test_parse() {
        let elem: Element = "<error xmlns='jabber:client' code='404' type='cancel'>\
             <remote-server-not-found xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/>\
             <text xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'>gone</text></error>"
            .parse()
            .unwrap();
        let error = StanzaError::try_from(elem).unwrap();
        assert_eq!(error.type_, ErrorType::Cancel);
        assert_eq!(error.code.as_deref(), Some("404"));
        assert_eq!(
            error.condition().unwrap(),
            ErrorCondition::RemoteServerNotFound
        );
        assert_eq!(error.text().as_deref(), Some("gone"));
    }

    #[test]
    fn test_missing_condition_is_reported() {
        let error = StanzaError {
            type_: ErrorType::Cancel,
            code: None,
            payload: String::new(),
        };
        assert!(matches!(
            error.condition(),
            Err(Error::Protocol(ProtocolError::MissingErrorCondition))
        ));
    }

    #[test]
    fn test_unknown_condition_is_kept() {
        let error = StanzaError::new(
            ErrorType::Modify,
            ErrorCondition::Other {
                ns: ns::XMPP_STANZAS.to_owned(),
                name: "policy-violation".to_owned(),
            },
            "",
        );
        match error.condition().unwrap() {
            ErrorCondition::Other { ns: ns_, name } => {
                assert_eq!(ns_, ns::XMPP_STANZAS);
                assert_eq!(name, "policy-violation");
            }
            other => panic!("unexpected condition: {:?}", other),
        }
    }

    #[test]
    fn test_stream_error_namespace_condition() {
        let elem: Element = "<error xmlns='jabber:client' type='cancel'>\
             <system-shutdown xmlns='urn:ietf:params:xml:ns:xmpp-streams'/></error>"
            .parse()
            .unwrap();
        let error = StanzaError::try_from(elem).unwrap();
        match error.condition().unwrap() {
            ErrorCondition::Other { ns: ns_, name } => {
                assert_eq!(ns_, ns::XMPP_STREAMS);
                assert_eq!(name, "system-shutdown");
            }
            other => panic!("unexpected condition: {:?}", other),
        }
    }

    #[test]
    fn test_write_xml() {
        let mut out = String::new();
        StanzaError::with_code("501", ErrorType::Cancel, ErrorCondition::FeatureNotImplemented, "")
            .write_xml(&mut out)
            .unwrap();
        assert_eq!(
            out,
            "<error code='501' type='cancel'>\
             <feature-not-implemented xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/></error>"
        );
    }
}
