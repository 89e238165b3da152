//! Component negotiation: the shared-secret handshake of XEP-0114.
//!
//! Components are services that log into an XMPP server under a bare
//! domain JID and may then use any addresses below it in their stanzas.

use std::fmt::Write;

use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{AuthError, Error, ProtocolError};
use crate::jid::Jid;
use crate::ns;
use crate::session::Session;
use crate::stream::{Stream, StreamHeader};

/// The handshake credential: lowercase hex of SHA-1 over the server-issued
/// stream id concatenated with the shared secret.
fn handshake_digest(stream_id: &str, secret: &str) -> Result<String, Error> {
    let mut hash = Sha1::new();
    hash.update(stream_id.as_bytes());
    hash.update(secret.as_bytes());
    let digest = hash.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        write!(hex, "{:02x}", byte)?;
    }
    Ok(hex)
}

/// Negotiate a freshly-opened stream into a component session.
///
/// Opens a `jabber:component:accept` stream, answers the server's stream
/// id with the secret-derived `<handshake/>` digest and waits for the empty
/// handshake acknowledgement. Any other reply aborts the bring-up.
pub async fn component_login<S>(
    mut stream: Stream<S>,
    jid: Jid,
    secret: &str,
) -> Result<Session, Error>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let peer = stream.send_header(&StreamHeader::component(&jid)).await?;
    let stream_id = peer.id.ok_or(ProtocolError::NoStreamId)?;

    let mut request = String::from("<handshake>");
    request.push_str(&handshake_digest(&stream_id, secret)?);
    request.push_str("</handshake>");
    stream.send(&request).await?;

    let reply = stream.next().await?.ok_or(Error::Disconnected)?;
    if reply.is("handshake", ns::COMPONENT_ACCEPT) {
        return Ok(Session::new(stream, jid));
    }
    Err(AuthError::ComponentFail.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamConfig;
    use crate::test_util::read_until_contains;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_handshake_digest() {
        // sha1("ABCs3cr3t"), byte for byte
        assert_eq!(
            handshake_digest("ABC", "s3cr3t").unwrap(),
            "14ff654f79367fa2ecf457bd3f49476910cbcbca"
        );
        assert_eq!(
            handshake_digest("1234", "secret").unwrap(),
            "32532c0f7dbf1253c095b18b18e36d38d94c1256"
        );
    }

    #[tokio::test]
    async fn test_component_login() {
        let (client, mut server) = tokio::io::duplex(65536);
        let stream = Stream::new(client, StreamConfig::default()).await.unwrap();

        let server_task = tokio::spawn(async move {
            let header = read_until_contains(&mut server, "<stream:stream").await;
            assert!(header.contains("xmlns='jabber:component:accept'"));
            assert!(header.contains("to='gateway.example.com'"));
            server
                .write_all(
                    b"<stream:stream xmlns='jabber:component:accept' \
                      xmlns:stream='http://etherx.jabber.org/streams' \
                      from='gateway.example.com' id='ABC'>",
                )
                .await
                .unwrap();
            let handshake = read_until_contains(&mut server, "</handshake>").await;
            assert!(handshake.contains("14ff654f79367fa2ecf457bd3f49476910cbcbca"));
            server.write_all(b"<handshake/>").await.unwrap();
            server
        });

        let jid: Jid = "gateway.example.com".parse().unwrap();
        let session = component_login(stream, jid, "s3cr3t").await.unwrap();
        assert_eq!(session.jid().full(), "gateway.example.com");
        let _server = server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_component_login_requires_stream_id() {
        let (client, mut server) = tokio::io::duplex(65536);
        let stream = Stream::new(client, StreamConfig::default()).await.unwrap();

        let server_task = tokio::spawn(async move {
            let _ = read_until_contains(&mut server, "<stream:stream").await;
            server
                .write_all(
                    b"<stream:stream xmlns='jabber:component:accept' \
                      xmlns:stream='http://etherx.jabber.org/streams'>",
                )
                .await
                .unwrap();
            server
        });

        let jid: Jid = "gateway.example.com".parse().unwrap();
        let result = component_login(stream, jid, "s3cr3t").await;
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::NoStreamId))
        ));
        let _server = server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_component_login_rejected() {
        let (client, mut server) = tokio::io::duplex(65536);
        let stream = Stream::new(client, StreamConfig::default()).await.unwrap();

        let server_task = tokio::spawn(async move {
            let _ = read_until_contains(&mut server, "<stream:stream").await;
            server
                .write_all(
                    b"<stream:stream xmlns='jabber:component:accept' \
                      xmlns:stream='http://etherx.jabber.org/streams' id='XYZ'>",
                )
                .await
                .unwrap();
            let _ = read_until_contains(&mut server, "</handshake>").await;
            server
                .write_all(
                    b"<stream:error><not-authorized \
                      xmlns='urn:ietf:params:xml:ns:xmpp-streams'/></stream:error>",
                )
                .await
                .unwrap();
            server
        });

        let jid: Jid = "gateway.example.com".parse().unwrap();
        let result = component_login(stream, jid, "wrong").await;
        assert!(matches!(result, Err(Error::Auth(AuthError::ComponentFail))));
        let _server = server_task.await.unwrap();
    }
}
