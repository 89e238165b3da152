//! XMPP clients and components with asynchronous I/O using [tokio](https://tokio.rs/).
//!
//! The library is built around the concept of an XML stream: a pair of XML
//! documents written to and read from one TCP (or, after STARTTLS, TLS)
//! connection, whose top-level elements form the messages either end
//! processes. A freshly-opened [`Stream`] is negotiated into a [`Session`]
//! either as a client (chat accounts and bots) or as a component (a
//! service plugged into a server).
//!
//! Create a client:
//!
//! ```no_run
//! # async fn run() -> Result<(), tokio_jabber::Error> {
//! use tokio_jabber::{client_login, home_server_addrs, ClientConfig, Jid, Stream, StreamConfig};
//!
//! let jid: Jid = "alice@wonderland.lit/looking-glass".parse()?;
//! let addrs = home_server_addrs(&jid).await?;
//! let stream = Stream::connect(&addrs[0], StreamConfig::default()).await?;
//! let session = client_login(stream, jid, "password", ClientConfig::default()).await?;
//! # let _ = session; Ok(())
//! # }
//! ```
//!
//! Create a component:
//!
//! ```no_run
//! # async fn run() -> Result<(), tokio_jabber::Error> {
//! use tokio_jabber::{component_login, Jid, Stream, StreamConfig};
//!
//! let jid: Jid = "rabbithole.wonderland.lit".parse()?;
//! let stream = Stream::connect("localhost:5347", StreamConfig::default()).await?;
//! let session = component_login(stream, jid, "secret").await?;
//! # let _ = session; Ok(())
//! # }
//! ```
//!
//! Stanzas go out through [`Session::send`] and come in through
//! [`Session::recv`], unless a filter registered with
//! [`Session::add_filter`] claims them first; [`Session::send_recv`] pairs
//! an `<iq/>` request with its response. The last value `recv` yields
//! before the inbound channel closes is the terminating error, if the
//! stream did not end cleanly.
//!
//! Note: the JID bound during negotiation may differ from the one the
//! connection was set up with. Always address stanzas from
//! [`Session::jid`].

#![deny(unsafe_code, bare_trait_objects)]

mod client;
mod component;
pub mod connect;
pub mod error;
mod jid;
pub mod ns;
pub mod payload;
mod session;
pub mod stanza;
mod stream;
mod stream_features;
mod uuid;
pub mod xml;

pub use client::{client_login, AuthHandler, ClientConfig, Plain};
pub use component::component_login;
pub use connect::home_server_addrs;
pub use error::{AuthError, Error, ParseError, ProtocolError};
pub use jid::{Jid, JidParseError};
pub use payload::Disco;
pub use session::{iq_payload_ns, iq_result, FilterId, Matcher, Session};
pub use stanza::{
    ErrorCondition, ErrorType, Iq, IqType, Message, MessageBody, MessageType, Presence,
    PresenceType, Show, Stanza, StanzaError,
};
pub use stream::{Stream, StreamConfig, StreamHeader, StreamReader, StreamWriter, Transport};
pub use stream_features::{StartTls, StreamFeatures};
pub use uuid::uuid4;
