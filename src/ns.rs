//! XML namespaces used by the protocol.

/// RFC 6120: XML streams root namespace
pub const STREAM: &str = "http://etherx.jabber.org/streams";
/// RFC 6120: client-to-server stanzas
pub const JABBER_CLIENT: &str = "jabber:client";
/// XEP-0114: component connections
pub const COMPONENT_ACCEPT: &str = "jabber:component:accept";
/// RFC 6120: STARTTLS negotiation
pub const TLS: &str = "urn:ietf:params:xml:ns:xmpp-tls";
/// RFC 6120: SASL authentication
pub const SASL: &str = "urn:ietf:params:xml:ns:xmpp-sasl";
/// RFC 6120: resource binding
pub const BIND: &str = "urn:ietf:params:xml:ns:xmpp-bind";
/// RFC 3921: session establishment
pub const SESSION: &str = "urn:ietf:params:xml:ns:xmpp-session";
/// RFC 6120: stanza error conditions
pub const XMPP_STANZAS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";
/// RFC 6120: stream error conditions
pub const XMPP_STREAMS: &str = "urn:ietf:params:xml:ns:xmpp-streams";

/// XEP-0030: Service Discovery, common prefix of both query namespaces
pub const DISCO: &str = "http://jabber.org/protocol/disco";
/// XEP-0030: `disco#info` queries
pub const DISCO_INFO: &str = "http://jabber.org/protocol/disco#info";
/// XEP-0030: `disco#items` queries
pub const DISCO_ITEMS: &str = "http://jabber.org/protocol/disco#items";
/// XEP-0199: XMPP Ping
pub const PING: &str = "urn:xmpp:ping";
/// RFC 6121: roster management
pub const ROSTER: &str = "jabber:iq:roster";
/// XEP-0092: Software Version
pub const VERSION: &str = "jabber:iq:version";
/// XEP-0077: In-Band Registration
pub const REGISTER: &str = "jabber:iq:register";
/// XEP-0054: vcard-temp
pub const VCARD: &str = "vcard-temp";
/// XEP-0085: Chat State Notifications
pub const CHATSTATES: &str = "http://jabber.org/protocol/chatstates";
/// XEP-0070: Verifying HTTP Requests via XMPP
pub const HTTP_AUTH: &str = "http://jabber.org/protocol/http-auth";
/// XEP-0050: Ad-Hoc Commands
pub const COMMANDS: &str = "http://jabber.org/protocol/commands";
/// XEP-0004: Data Forms
pub const DATA_FORMS: &str = "jabber:x:data";
