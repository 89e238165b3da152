//! DNS SRV resolution for client connections.

use hickory_resolver::{IntoName, TokioAsyncResolver};
use log::debug;

use crate::error::Error;
use crate::jid::Jid;

/// Standard port for XMPP clients to connect to.
pub const XMPP_CLIENT_PORT: u16 = 5222;

/// Resolve the `host:port` addresses of the JID's home server, in SRV
/// record order. When DNS has no `_xmpp-client._tcp` records, assume the
/// JID's domain listens on the standard port.
pub async fn home_server_addrs(jid: &Jid) -> Result<Vec<String>, Error> {
    let ascii_domain = idna::domain_to_ascii(&jid.domain)?;

    if ascii_domain.parse::<std::net::IpAddr>().is_ok() {
        return Ok(vec![format!("{}:{}", ascii_domain, XMPP_CLIENT_PORT)]);
    }

    let resolver = TokioAsyncResolver::tokio_from_system_conf()?;
    let srv_domain = format!("_xmpp-client._tcp.{}.", ascii_domain).into_name()?;

    let mut addrs = Vec::new();
    if let Ok(lookup) = resolver.srv_lookup(srv_domain).await {
        for srv in lookup.iter() {
            let target = srv.target().to_utf8();
            addrs.push(format!("{}:{}", target.trim_end_matches('.'), srv.port()));
        }
    }
    if addrs.is_empty() {
        debug!(
            "no SRV records for {}, assuming {}:{}",
            jid.domain, ascii_domain, XMPP_CLIENT_PORT
        );
        addrs.push(format!("{}:{}", ascii_domain, XMPP_CLIENT_PORT));
    }
    Ok(addrs)
}
