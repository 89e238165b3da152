//! Client-side stream negotiation: features, STARTTLS, SASL, resource
//! binding and session establishment.

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Error, ParseError};
use crate::jid::Jid;
use crate::ns;
use crate::session::Session;
use crate::stream::{Stream, StreamHeader};
use crate::stream_features::StreamFeatures;

mod auth;
mod bind;

pub use auth::{AuthHandler, Plain};

/// Knobs for client negotiation.
pub struct ClientConfig {
    /// Leave the stream plaintext unless the server requires TLS.
    pub no_tls: bool,
    /// Skip certificate chain verification on upgrade.
    pub insecure_skip_verify: bool,
    /// SASL handlers, tried in order against the server's mechanism list.
    pub auth_handlers: Vec<Box<dyn AuthHandler>>,
}

impl Default for ClientConfig {
    fn default() -> ClientConfig {
        ClientConfig {
            no_tls: false,
            insecure_skip_verify: false,
            auth_handlers: vec![Box::new(Plain)],
        }
    }
}

/// Negotiate a freshly-opened stream into an authenticated client session.
///
/// Drives the stream through the feature loop: STARTTLS when offered (or
/// required), SASL, resource binding and session establishment, restarting
/// the stream after each security layer. The session's JID is the one the
/// server bound, which may differ from `jid`.
pub async fn client_login<S>(
    mut stream: Stream<S>,
    jid: Jid,
    password: &str,
    mut config: ClientConfig,
) -> Result<Session, Error>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let username = jid
        .node
        .clone()
        .ok_or(ParseError("a client JID requires a node"))?;
    let mut jid = jid;
    let mut authenticated = false;

    loop {
        stream.send_header(&StreamHeader::client(&jid)).await?;
        let features: StreamFeatures = stream.read().await?;

        if let Some(starttls) = &features.starttls {
            if !stream.is_tls() && (starttls.required || !config.no_tls) {
                let request = format!("<starttls xmlns='{}'/>", ns::TLS);
                stream.send(&request).await?;
                let reply = stream.next().await?.ok_or(Error::Disconnected)?;
                if !reply.is("proceed", ns::TLS) {
                    return Err(
                        crate::error::ProtocolError::UnexpectedElement(reply.name().to_owned())
                            .into(),
                    );
                }
                let domain = jid.domain.clone();
                stream = stream
                    .upgrade_tls(&domain, config.insecure_skip_verify)
                    .await?;
                continue; // restart
            }
        }

        if !authenticated && !features.mechanisms.is_empty() {
            auth::authenticate(
                &mut stream,
                &features.mechanisms,
                &mut config.auth_handlers,
                &username,
                password,
            )
            .await?;
            authenticated = true;
            continue; // restart
        }

        if features.bind {
            jid = bind::bind(&mut stream, &jid).await?;
            debug!("bound as {}", jid);
        }
        if features.session {
            let domain = jid.domain.clone();
            bind::establish_session(&mut stream, &domain).await?;
        }
        break;
    }

    Ok(Session::new(stream, jid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::stanza::Stanza;
    use crate::stream::StreamConfig;
    use crate::test_util::{extract_attr, read_until_contains};
    use tokio::io::{AsyncWriteExt, DuplexStream};

    const HEADER: &str = "<stream:stream xmlns='jabber:client' \
         xmlns:stream='http://etherx.jabber.org/streams' id='s1' from='example.com' \
         version='1.0'>";

    async fn client_stream() -> (Stream<DuplexStream>, DuplexStream) {
        let (client, server) = tokio::io::duplex(65536);
        let stream = Stream::new(client, StreamConfig::default()).await.unwrap();
        (stream, server)
    }

    async fn serve_plain_bind_session(mut server: DuplexStream, bound: &str) -> DuplexStream {
        // first stream: offer SASL PLAIN
        let _ = read_until_contains(&mut server, "<stream:stream").await;
        server.write_all(HEADER.as_bytes()).await.unwrap();
        server
            .write_all(
                b"<stream:features><mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
                  <mechanism>PLAIN</mechanism></mechanisms></stream:features>",
            )
            .await
            .unwrap();

        let auth = read_until_contains(&mut server, "</auth>").await;
        assert!(auth.contains("mechanism='PLAIN'"));
        assert!(auth.contains("AGFsaWNlAHNlY3JldA=="));
        server
            .write_all(b"<success xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>")
            .await
            .unwrap();

        // restarted stream: offer bind and session
        let _ = read_until_contains(&mut server, "<stream:stream").await;
        server.write_all(HEADER.as_bytes()).await.unwrap();
        server
            .write_all(
                b"<stream:features><bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/>\
                  <session xmlns='urn:ietf:params:xml:ns:xmpp-session'/></stream:features>",
            )
            .await
            .unwrap();

        let bind = read_until_contains(&mut server, "</iq>").await;
        let bind_id = extract_attr(&bind, "id");
        server
            .write_all(
                format!(
                    "<iq type='result' id='{}'>\
                     <bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'><jid>{}</jid></bind></iq>",
                    bind_id, bound
                )
                .as_bytes(),
            )
            .await
            .unwrap();

        let session = read_until_contains(&mut server, "</iq>").await;
        assert!(session.contains("urn:ietf:params:xml:ns:xmpp-session"));
        let session_id = extract_attr(&session, "id");
        server
            .write_all(format!("<iq type='result' id='{}'/>", session_id).as_bytes())
            .await
            .unwrap();
        server
    }

    #[tokio::test]
    async fn test_login_plain_bind_session() {
        let (stream, server) = client_stream().await;
        let server_task =
            tokio::spawn(
                async move { serve_plain_bind_session(server, "alice@example.com/res").await },
            );

        let jid: Jid = "alice@example.com/res".parse().unwrap();
        let session = client_login(stream, jid, "secret", ClientConfig::default())
            .await
            .unwrap();
        assert_eq!(session.jid().full(), "alice@example.com/res");
        let _server = server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_login_adopts_server_chosen_resource() {
        let (stream, server) = client_stream().await;
        let server_task = tokio::spawn(async move {
            serve_plain_bind_session(server, "alice@example.com/server-chosen").await
        });

        // no resource requested; the server picks one
        let jid: Jid = "alice@example.com".parse().unwrap();
        let session = client_login(stream, jid, "secret", ClientConfig::default())
            .await
            .unwrap();
        assert_eq!(session.jid().full(), "alice@example.com/server-chosen");
        let _server = server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_login_reports_sasl_failure() {
        let (stream, server) = client_stream().await;
        let server_task = tokio::spawn(async move {
            let mut server = server;
            let _ = read_until_contains(&mut server, "<stream:stream").await;
            server.write_all(HEADER.as_bytes()).await.unwrap();
            server
                .write_all(
                    b"<stream:features><mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
                      <mechanism>PLAIN</mechanism></mechanisms></stream:features>",
                )
                .await
                .unwrap();
            let _ = read_until_contains(&mut server, "</auth>").await;
            server
                .write_all(
                    b"<failure xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
                      <not-authorized/></failure>",
                )
                .await
                .unwrap();
            server
        });

        let jid: Jid = "alice@example.com".parse().unwrap();
        let result = client_login(stream, jid, "wrong", ClientConfig::default()).await;
        match result {
            Err(Error::Auth(AuthError::Fail(condition))) => {
                assert_eq!(condition, "not-authorized");
            }
            other => panic!("unexpected login result: {:?}", other.map(|_| ())),
        }
        let _server = server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_login_skips_optional_starttls_when_told_to() {
        let (stream, server) = client_stream().await;
        let server_task = tokio::spawn(async move {
            let mut server = server;
            let _ = read_until_contains(&mut server, "<stream:stream").await;
            server.write_all(HEADER.as_bytes()).await.unwrap();
            // starttls offered but not required; the client was configured
            // to stay plaintext
            server
                .write_all(
                    b"<stream:features><starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'/>\
                      <mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
                      <mechanism>PLAIN</mechanism></mechanisms></stream:features>",
                )
                .await
                .unwrap();
            let auth = read_until_contains(&mut server, "</auth>").await;
            assert!(!auth.contains("<starttls"));
            server
                .write_all(b"<success xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>")
                .await
                .unwrap();
            let _ = read_until_contains(&mut server, "<stream:stream").await;
            server.write_all(HEADER.as_bytes()).await.unwrap();
            server
                .write_all(b"<stream:features/>")
                .await
                .unwrap();
            server
        });

        let jid: Jid = "alice@example.com/res".parse().unwrap();
        let config = ClientConfig {
            no_tls: true,
            ..ClientConfig::default()
        };
        let session = client_login(stream, jid, "secret", config).await.unwrap();
        // no bind offered either, so the requested JID stands
        assert_eq!(session.jid().full(), "alice@example.com/res");
        let _server = server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_login_without_common_mechanism() {
        let (stream, server) = client_stream().await;
        let server_task = tokio::spawn(async move {
            let mut server = server;
            let _ = read_until_contains(&mut server, "<stream:stream").await;
            server.write_all(HEADER.as_bytes()).await.unwrap();
            server
                .write_all(
                    b"<stream:features><mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
                      <mechanism>SCRAM-SHA-1</mechanism></mechanisms></stream:features>",
                )
                .await
                .unwrap();
            server
        });

        let jid: Jid = "alice@example.com".parse().unwrap();
        let result = client_login(stream, jid, "secret", ClientConfig::default()).await;
        assert!(matches!(result, Err(Error::Auth(AuthError::NoMechanism))));
        let _server = server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_session_usable_after_login() {
        let (stream, server) = client_stream().await;
        let server_task = tokio::spawn(async move {
            let mut server = serve_plain_bind_session(server, "alice@example.com/res").await;
            server
                .write_all(b"<message from='bob@example.com'><body>welcome</body></message>")
                .await
                .unwrap();
            server
        });

        let jid: Jid = "alice@example.com/res".parse().unwrap();
        let session = client_login(stream, jid, "secret", ClientConfig::default())
            .await
            .unwrap();
        match session.recv().await {
            Some(Ok(Stanza::Message(message))) => assert_eq!(message.body(), Some("welcome")),
            other => panic!("unexpected inbound value: {:?}", other),
        }
        let _server = server_task.await.unwrap();
    }
}
