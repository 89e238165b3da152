//! Error types for stream setup, negotiation and stanza handling.

use hickory_resolver::{
    error::ResolveError as DnsResolveError, proto::error::ProtoError as DnsProtoError,
};
use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;
use std::str::Utf8Error;

use crate::jid::JidParseError;
use crate::session::FilterId;
use crate::stanza::StanzaError;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(IoError),
    /// Error parsing a Jabber-Id
    JidParse(JidParseError),
    /// Protocol-level error
    Protocol(ProtocolError),
    /// Authentication error
    Auth(AuthError),
    /// Stanza-level error returned by the peer
    Stanza(StanzaError),
    /// TLS handshake or configuration error
    Tls(native_tls::Error),
    /// DNS protocol error
    Dns(DnsProtoError),
    /// DNS resolution error
    Resolve(DnsResolveError),
    /// DNS label conversion error, no details available from module `idna`
    Idna,
    /// Utf8 error
    Utf8(Utf8Error),
    /// Fmt error
    Fmt(fmt::Error),
    /// No filter registered under this id
    InvalidFilter(FilterId),
    /// Connection closed
    Disconnected,
    /// Should never happen
    InvalidState,
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(fmt, "IO error: {}", e),
            Error::JidParse(e) => write!(fmt, "jid parse error: {}", e),
            Error::Protocol(e) => write!(fmt, "protocol error: {}", e),
            Error::Auth(e) => write!(fmt, "authentication error: {}", e),
            Error::Stanza(e) => write!(fmt, "stanza error: {}", e),
            Error::Tls(e) => write!(fmt, "TLS error: {}", e),
            Error::Dns(e) => write!(fmt, "{:?}", e),
            Error::Resolve(e) => write!(fmt, "{:?}", e),
            Error::Idna => write!(fmt, "IDNA error"),
            Error::Utf8(e) => write!(fmt, "Utf8 error: {}", e),
            Error::Fmt(e) => write!(fmt, "Fmt error: {}", e),
            Error::InvalidFilter(id) => write!(fmt, "invalid filter id: {}", id),
            Error::Disconnected => write!(fmt, "disconnected"),
            Error::InvalidState => write!(fmt, "invalid state"),
        }
    }
}

impl StdError for Error {}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

impl From<JidParseError> for Error {
    fn from(e: JidParseError) -> Self {
        Error::JidParse(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<AuthError> for Error {
    fn from(e: AuthError) -> Self {
        Error::Auth(e)
    }
}

impl From<StanzaError> for Error {
    fn from(e: StanzaError) -> Self {
        Error::Stanza(e)
    }
}

impl From<native_tls::Error> for Error {
    fn from(e: native_tls::Error) -> Self {
        Error::Tls(e)
    }
}

impl From<DnsProtoError> for Error {
    fn from(e: DnsProtoError) -> Self {
        Error::Dns(e)
    }
}

impl From<DnsResolveError> for Error {
    fn from(e: DnsResolveError) -> Self {
        Error::Resolve(e)
    }
}

impl From<idna::Errors> for Error {
    fn from(_e: idna::Errors) -> Self {
        Error::Idna
    }
}

impl From<Utf8Error> for Error {
    fn from(e: Utf8Error) -> Self {
        Error::Utf8(e)
    }
}

impl From<fmt::Error> for Error {
    fn from(e: fmt::Error) -> Self {
        Error::Fmt(e)
    }
}

impl From<minidom::Error> for Error {
    fn from(e: minidom::Error) -> Self {
        ProtocolError::Parser(e).into()
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        ProtocolError::Framing(e).into()
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        ProtocolError::Parse(e).into()
    }
}

/// XMPP protocol-level error
#[derive(Debug)]
pub enum ProtocolError {
    /// XML parser error
    Parser(minidom::Error),
    /// Stanza framing error
    Framing(quick_xml::Error),
    /// Error with expected element schema
    Parse(ParseError),
    /// Malformed or unexpected `<stream:stream>`
    InvalidStreamStart,
    /// No id attribute in `<stream:stream>`
    NoStreamId,
    /// Invalid response to resource binding
    InvalidBindResponse,
    /// Encountered an element that is not valid at this point of the stream
    UnexpectedElement(String),
    /// An error payload carries no defined condition
    MissingErrorCondition,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProtocolError::Parser(e) => write!(fmt, "XML parser error: {}", e),
            ProtocolError::Framing(e) => write!(fmt, "stanza framing error: {}", e),
            ProtocolError::Parse(e) => write!(fmt, "element schema error: {}", e),
            ProtocolError::InvalidStreamStart => write!(fmt, "unexpected <stream:stream>"),
            ProtocolError::NoStreamId => write!(fmt, "no id attribute in <stream:stream>"),
            ProtocolError::InvalidBindResponse => {
                write!(fmt, "invalid response to resource binding")
            }
            ProtocolError::UnexpectedElement(name) => {
                write!(fmt, "unexpected element <{}/>", name)
            }
            ProtocolError::MissingErrorCondition => {
                write!(fmt, "error payload carries no defined condition")
            }
        }
    }
}

impl StdError for ProtocolError {}

impl From<minidom::Error> for ProtocolError {
    fn from(e: minidom::Error) -> Self {
        ProtocolError::Parser(e)
    }
}

impl From<ParseError> for ProtocolError {
    fn from(e: ParseError) -> Self {
        ProtocolError::Parse(e)
    }
}

/// Mismatch between a received element and the shape a typed value expects
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseError(pub &'static str);

impl fmt::Display for ParseError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

impl StdError for ParseError {}

/// Authentication error
#[derive(Debug)]
pub enum AuthError {
    /// No matching SASL mechanism available
    NoMechanism,
    /// `<failure/>` from the server, with the condition it names
    Fail(String),
    /// The selected handler cannot answer a server challenge
    Unsupported(&'static str),
    /// Component authentication failure
    ComponentFail,
}

impl fmt::Display for AuthError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::NoMechanism => write!(fmt, "no matching SASL mechanism available"),
            AuthError::Fail(condition) => write!(fmt, "failure from the server: {}", condition),
            AuthError::Unsupported(mechanism) => {
                write!(fmt, "mechanism {} cannot answer a challenge", mechanism)
            }
            AuthError::ComponentFail => write!(fmt, "component authentication failure"),
        }
    }
}

impl StdError for AuthError {}
