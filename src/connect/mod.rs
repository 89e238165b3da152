//! Locating a JID's home server.

mod dns;

pub use dns::{home_server_addrs, XMPP_CLIENT_PORT};
