//! Stanza dispatch over an authenticated stream.
//!
//! A [`Session`] owns the stream and two long-lived tasks. The sender task
//! drains the outbound channel and serializes onto the wire; the receiver
//! task decodes inbound elements and routes each one through the filter
//! table, falling back to the inbound channel. The stream itself is never
//! touched from anywhere else, which is what keeps the framer correct
//! without locks around it.

use std::fmt;
use std::sync::{Arc, Mutex};

use log::warn;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Error, ProtocolError};
use crate::jid::Jid;
use crate::stanza::{Iq, Stanza};
use crate::stream::{Stream, StreamReader, StreamWriter};

/// Handle to a registered filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FilterId(u64);

impl fmt::Display for FilterId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

/// A predicate deciding whether a filter wants a stanza.
///
/// Any `Fn(&Stanza) -> bool` closure is a matcher; the functions below build
/// the common ones.
pub trait Matcher: Send + Sync {
    /// Does this filter want `stanza`?
    fn matches(&self, stanza: &Stanza) -> bool;
}

impl<F> Matcher for F
where
    F: Fn(&Stanza) -> bool + Send + Sync,
{
    fn matches(&self, stanza: &Stanza) -> bool {
        self(stanza)
    }
}

/// Match the `<iq/>` response carrying the given id.
pub fn iq_result(id: impl Into<String>) -> impl Matcher {
    let id = id.into();
    move |stanza: &Stanza| matches!(stanza, Stanza::Iq(iq) if iq.id == id)
}

/// Match any `<iq/>` whose payload namespace starts with `prefix`.
pub fn iq_payload_ns(prefix: impl Into<String>) -> impl Matcher {
    let prefix = prefix.into();
    move |stanza: &Stanza| match stanza {
        Stanza::Iq(iq) => iq
            .payload_name()
            .map_or(false, |(payload_ns, _)| payload_ns.starts_with(&prefix)),
        _ => false,
    }
}

struct Filter {
    id: FilterId,
    matcher: Arc<dyn Matcher>,
    tx: mpsc::Sender<Stanza>,
}

#[derive(Default)]
struct FilterTable {
    next_id: u64,
    // newest first; a narrow request/response filter registered late gets
    // to intercept before long-lived wildcard observers
    filters: Vec<Filter>,
}

/// An XMPP conversation over an established stream.
///
/// Incoming stanzas arrive via [`Session::recv`] unless a filter claims
/// them; outgoing stanzas go through [`Session::send`]. All methods take
/// `&self`, so a session can be shared across tasks.
pub struct Session {
    jid: Jid,
    out: Mutex<Option<mpsc::Sender<Stanza>>>,
    inbound: tokio::sync::Mutex<mpsc::Receiver<Result<Stanza, Error>>>,
    filters: Arc<Mutex<FilterTable>>,
    sender: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Wrap a negotiated stream and spawn the sender and receiver tasks.
    ///
    /// `jid` is the bound JID: use it, not the one the connection was set
    /// up with, in any stanza the application sends.
    pub fn new<S>(stream: Stream<S>, jid: Jid) -> Session
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (reader, writer) = stream.split();
        let (out_tx, out_rx) = mpsc::channel(1);
        let (in_tx, in_rx) = mpsc::channel(1);
        let filters: Arc<Mutex<FilterTable>> = Arc::default();
        let sender = tokio::spawn(sender_task(writer, out_rx));
        tokio::spawn(receiver_task(reader, in_tx, Arc::clone(&filters)));
        Session {
            jid,
            out: Mutex::new(Some(out_tx)),
            inbound: tokio::sync::Mutex::new(in_rx),
            filters,
            sender: Mutex::new(Some(sender)),
        }
    }

    /// The JID bound to this session.
    pub fn jid(&self) -> &Jid {
        &self.jid
    }

    /// Queue a stanza for transmission.
    pub async fn send(&self, stanza: impl Into<Stanza>) -> Result<(), Error> {
        let tx = match &*self.out.lock().unwrap() {
            Some(tx) => tx.clone(),
            None => return Err(Error::Disconnected),
        };
        tx.send(stanza.into())
            .await
            .map_err(|_| Error::Disconnected)
    }

    /// The next unfiltered inbound value. The last value before the channel
    /// closes is the terminating error, if the stream did not end cleanly.
    pub async fn recv(&self) -> Option<Result<Stanza, Error>> {
        self.inbound.lock().await.recv().await
    }

    /// Register a filter. Matching stanzas are diverted to the returned
    /// channel instead of [`Session::recv`]; filters added later are
    /// consulted first, and every matching filter receives the stanza.
    pub fn add_filter(&self, matcher: impl Matcher + 'static) -> (FilterId, mpsc::Receiver<Stanza>) {
        let (tx, rx) = mpsc::channel(1);
        let mut table = self.filters.lock().unwrap();
        let id = FilterId(table.next_id);
        table.next_id += 1;
        table.filters.insert(
            0,
            Filter {
                id,
                matcher: Arc::new(matcher),
                tx,
            },
        );
        (id, rx)
    }

    /// Drop a filter, closing its channel.
    pub fn remove_filter(&self, id: FilterId) -> Result<(), Error> {
        let mut table = self.filters.lock().unwrap();
        match table.filters.iter().position(|filter| filter.id == id) {
            Some(index) => {
                table.filters.remove(index);
                Ok(())
            }
            None => Err(Error::InvalidFilter(id)),
        }
    }

    /// Send an `<iq/>` and wait for the response carrying the same id.
    ///
    /// The temporary filter is removed on every exit path.
    pub async fn send_recv(&self, iq: Iq) -> Result<Iq, Error> {
        let (id, mut rx) = self.add_filter(iq_result(iq.id.clone()));
        let result = self.send_recv_inner(iq, &mut rx).await;
        let _ = self.remove_filter(id);
        result
    }

    async fn send_recv_inner(
        &self,
        iq: Iq,
        rx: &mut mpsc::Receiver<Stanza>,
    ) -> Result<Iq, Error> {
        self.send(iq).await?;
        match rx.recv().await {
            Some(Stanza::Iq(reply)) => Ok(reply),
            Some(other) => Err(ProtocolError::UnexpectedElement(other.name().to_owned()).into()),
            None => Err(Error::Disconnected),
        }
    }

    /// Clean shutdown: close the outbound channel, let the sender drain,
    /// emit the stream end tag and wait for the sender task to finish.
    ///
    /// The inbound channel stays open until the peer closes its side.
    pub async fn close(&self) {
        let tx = self.out.lock().unwrap().take();
        drop(tx);
        let handle = self.sender.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

async fn sender_task<S>(mut writer: StreamWriter<S>, mut rx: mpsc::Receiver<Stanza>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(stanza) = rx.recv().await {
        let xml = match stanza.to_xml() {
            Ok(xml) => xml,
            Err(e) => {
                warn!("dropping unserializable outbound stanza: {}", e);
                continue;
            }
        };
        if writer.send(&xml).await.is_err() {
            return;
        }
    }
    let _ = writer.send_end().await;
    let _ = writer.shutdown().await;
}

async fn receiver_task<S>(
    mut reader: StreamReader<S>,
    in_tx: mpsc::Sender<Result<Stanza, Error>>,
    filters: Arc<Mutex<FilterTable>>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let stanza = match reader.next().await {
            Ok(Some(elem)) => match Stanza::try_from(elem) {
                Ok(stanza) => stanza,
                Err(e) => {
                    let _ = in_tx.send(Err(e)).await;
                    break;
                }
            },
            Ok(None) => break,
            Err(e) => {
                let _ = in_tx.send(Err(e)).await;
                break;
            }
        };

        // snapshot the table under the lock; predicates run and channels are
        // fed unlocked, so a slow consumer cannot wedge add/remove_filter
        let snapshot: Vec<(Arc<dyn Matcher>, mpsc::Sender<Stanza>)> = {
            let table = filters.lock().unwrap();
            table
                .filters
                .iter()
                .map(|filter| (Arc::clone(&filter.matcher), filter.tx.clone()))
                .collect()
        };

        let mut filtered = false;
        for (matcher, tx) in &snapshot {
            if matcher.matches(&stanza) {
                let _ = tx.send(stanza.clone()).await;
                filtered = true;
            }
        }
        if !filtered && in_tx.send(Ok(stanza)).await.is_err() {
            break;
        }
    }
    // close every filter channel so their consumers learn of the shutdown
    filters.lock().unwrap().filters.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stanza::{IqType, Message};
    use crate::stream::{StreamConfig, StreamHeader};
    use crate::test_util::read_until_contains;
    use tokio::io::{AsyncWriteExt, DuplexStream};

    const SERVER_HEADER: &[u8] = b"<stream:stream xmlns='jabber:client' \
         xmlns:stream='http://etherx.jabber.org/streams' id='s1' version='1.0'>";

    // negotiation is covered elsewhere; these tests boot a session on a
    // bare, already-rooted stream
    async fn session_pair() -> (Session, DuplexStream) {
        let (client, mut server) = tokio::io::duplex(65536);
        let mut stream = Stream::new(client, StreamConfig::default()).await.unwrap();
        let jid: Jid = "alice@example.com/res".parse().unwrap();
        let header = StreamHeader::client(&jid);
        let server_task = tokio::spawn(async move {
            let _ = read_until_contains(&mut server, "<stream:stream").await;
            server.write_all(SERVER_HEADER).await.unwrap();
            server
        });
        stream.send_header(&header).await.unwrap();
        let server = server_task.await.unwrap();
        (Session::new(stream, jid), server)
    }

    #[tokio::test]
    async fn test_unfiltered_stanzas_arrive_inbound() {
        let (session, mut server) = session_pair().await;
        server
            .write_all(b"<message from='bob@example.com'><body>hi</body></message>")
            .await
            .unwrap();
        match session.recv().await {
            Some(Ok(Stanza::Message(message))) => assert_eq!(message.body(), Some("hi")),
            other => panic!("unexpected inbound value: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_filters_intercept_and_fan_out() {
        let (session, mut server) = session_pair().await;
        let (_wildcard_id, mut wildcard) =
            session.add_filter(|stanza: &Stanza| matches!(stanza, Stanza::Message(_)));
        let (_narrow_id, mut narrow) = session.add_filter(|stanza: &Stanza| {
            matches!(stanza, Stanza::Message(message) if message.body() == Some("ping"))
        });

        server
            .write_all(b"<message from='bob@example.com'><body>ping</body></message>")
            .await
            .unwrap();

        // both matching filters receive the stanza, in registration order
        // (newest first); nothing reaches the inbound channel
        let got = narrow.recv().await.unwrap();
        assert!(matches!(got, Stanza::Message(_)));
        let got = wildcard.recv().await.unwrap();
        assert!(matches!(got, Stanza::Message(_)));

        server
            .write_all(b"<presence from='bob@example.com'/>")
            .await
            .unwrap();
        match session.recv().await {
            Some(Ok(Stanza::Presence(_))) => {}
            other => panic!("unexpected inbound value: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_filter_preserves_arrival_order() {
        let (session, mut server) = session_pair().await;
        let (_id, mut rx) =
            session.add_filter(|stanza: &Stanza| matches!(stanza, Stanza::Message(_)));
        server
            .write_all(
                b"<message><body>first</body></message>\
                  <message><body>second</body></message>\
                  <message><body>third</body></message>",
            )
            .await
            .unwrap();
        for expected in ["first", "second", "third"] {
            match rx.recv().await.unwrap() {
                Stanza::Message(message) => assert_eq!(message.body(), Some(expected)),
                other => panic!("unexpected stanza: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_remove_filter_twice_fails() {
        let (session, _server) = session_pair().await;
        let (id, _rx) = session.add_filter(|_: &Stanza| false);
        assert!(session.remove_filter(id).is_ok());
        assert!(matches!(
            session.remove_filter(id),
            Err(Error::InvalidFilter(_))
        ));
    }

    #[tokio::test]
    async fn test_send_recv_correlates_out_of_order_responses() {
        let (session, mut server) = session_pair().await;
        let session = Arc::new(session);

        let server_task = tokio::spawn(async move {
            // wait for both requests, then answer b before a so at least
            // one response arrives out of request order
            let requests = crate::test_util::read_until(&mut server, |seen| {
                seen.matches("</iq>").count() >= 2
            })
            .await;
            assert!(requests.contains("req-a") && requests.contains("req-b"));
            server
                .write_all(
                    b"<iq type='result' id='req-b'><pong-b xmlns='urn:example:b'/></iq>\
                      <iq type='result' id='req-a'><pong-a xmlns='urn:example:a'/></iq>",
                )
                .await
                .unwrap();
            server
        });

        let a = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                let mut iq = Iq::new(IqType::Get, "req-a");
                iq.payload = "<ping-a xmlns='urn:example:a'/>".to_owned();
                session.send_recv(iq).await
            })
        };
        let b = {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                let mut iq = Iq::new(IqType::Get, "req-b");
                iq.payload = "<ping-b xmlns='urn:example:b'/>".to_owned();
                session.send_recv(iq).await
            })
        };

        let reply_a = a.await.unwrap().unwrap();
        let reply_b = b.await.unwrap().unwrap();
        assert_eq!(reply_a.id, "req-a");
        assert_eq!(reply_a.payload_name().unwrap().1, "pong-a");
        assert_eq!(reply_b.id, "req-b");
        assert_eq!(reply_b.payload_name().unwrap().1, "pong-b");
        let _ = server_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_clean_shutdown_sends_end_tag_last() {
        let (session, mut server) = session_pair().await;
        for text in ["one", "two", "three"] {
            session
                .send(Message::chat("bob@example.com".parse().unwrap(), text))
                .await
                .unwrap();
        }
        session.close().await;

        let log = read_until_contains(&mut server, "</stream:stream>").await;
        let one = log.find("one").unwrap();
        let two = log.find("two").unwrap();
        let three = log.find("three").unwrap();
        let end = log.find("</stream:stream>").unwrap();
        assert!(one < two && two < three && three < end);
        assert!(log.ends_with("</stream:stream>"));

        // further sends fail
        assert!(matches!(
            session
                .send(Message::chat("bob@example.com".parse().unwrap(), "late"))
                .await,
            Err(Error::Disconnected)
        ));

        // peer closes its side; the inbound channel then closes cleanly
        server.write_all(b"</stream:stream>").await.unwrap();
        assert!(session.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_filter_channels_close_when_stream_ends() {
        let (session, mut server) = session_pair().await;
        let (_id, mut rx) = session.add_filter(|_: &Stanza| false);
        server.write_all(b"</stream:stream>").await.unwrap();
        assert!(session.recv().await.is_none());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_io_error_is_last_inbound_value() {
        let (session, server) = session_pair().await;
        // peer drops the connection without a stream end tag
        drop(server);
        match session.recv().await {
            Some(Err(Error::Disconnected)) | Some(Err(Error::Io(_))) => {}
            other => panic!("unexpected inbound value: {:?}", other),
        }
        assert!(session.recv().await.is_none());
    }
}
