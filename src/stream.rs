//! The XML stream: a pair of XML documents exchanged over one TCP or TLS
//! connection, surfaced as a flow of elements.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::BytesMut;
use log::debug;
use minidom::Element;
use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf, ReadHalf, WriteHalf,
};
use tokio::net::TcpStream;
use tokio_native_tls::TlsStream;

use crate::error::{Error, ProtocolError};
use crate::jid::Jid;
use crate::ns;
use crate::xml::{self, Frame, NamespaceBindings};

const XML_PROLOG: &str = "<?xml version='1.0' encoding='utf-8'?>";
const STREAM_END: &str = "</stream:stream>";

/// Stream-level configuration.
#[derive(Clone, Debug, Default)]
pub struct StreamConfig {
    /// Log every stanza sent and received via `log`'s debug level.
    pub log_stanzas: bool,
}

/// The byte pipe under a stream, before or after the TLS upgrade.
pub enum Transport<S> {
    /// Plaintext connection
    Plain(S),
    /// Connection upgraded via STARTTLS
    Tls(Box<TlsStream<S>>),
}

impl<S: AsyncRead + AsyncWrite + Unpin> AsyncRead for Transport<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> AsyncWrite for Transport<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Transport::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(s) => Pin::new(s).poll_flush(cx),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Attributes of a `<stream:stream>` root element, sent or received.
#[derive(Clone, Debug, Default)]
pub struct StreamHeader {
    /// Default stanza namespace (`jabber:client` or `jabber:component:accept`)
    pub ns: String,
    /// `to` attribute
    pub to: Option<String>,
    /// `from` attribute
    pub from: Option<String>,
    /// `id` attribute; assigned by the server
    pub id: Option<String>,
    /// `version` attribute
    pub version: Option<String>,
}

impl StreamHeader {
    /// Header opening a client stream towards the JID's home server.
    pub fn client(jid: &Jid) -> StreamHeader {
        StreamHeader {
            ns: ns::JABBER_CLIENT.to_owned(),
            to: Some(jid.domain.clone()),
            from: Some(jid.full()),
            id: None,
            version: Some("1.0".to_owned()),
        }
    }

    /// Header opening a component stream. Component streams carry no
    /// version attribute.
    pub fn component(jid: &Jid) -> StreamHeader {
        StreamHeader {
            ns: ns::COMPONENT_ACCEPT.to_owned(),
            to: Some(jid.full()),
            from: None,
            id: None,
            version: None,
        }
    }

    fn serialize(&self) -> Result<String, Error> {
        let mut attrs: Vec<(&str, &str)> =
            vec![("xmlns", &self.ns), ("xmlns:stream", ns::STREAM)];
        if let Some(to) = &self.to {
            attrs.push(("to", to));
        }
        if let Some(from) = &self.from {
            attrs.push(("from", from));
        }
        if let Some(version) = &self.version {
            attrs.push(("version", version));
        }
        let mut out = String::new();
        xml::write_start(&mut out, "stream", "stream", &attrs)?;
        Ok(out)
    }
}

fn attr_of(attrs: &[(String, String)], name: &str) -> Option<String> {
    attrs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.clone())
}

/// An XML stream over a TCP or TLS connection.
///
/// The stream owns the byte pipe exclusively; it is driven from a single
/// task at a time. [`Stream::split`] hands the two directions to the
/// session's sender and receiver tasks once negotiation is done.
pub struct Stream<S> {
    transport: Transport<S>,
    buf: BytesMut,
    bindings: NamespaceBindings,
    config: StreamConfig,
}

impl Stream<TcpStream> {
    /// Connect to `addr` and write the XML prolog.
    pub async fn connect(addr: &str, config: StreamConfig) -> Result<Stream<TcpStream>, Error> {
        debug!("connecting to {}", addr);
        let tcp = TcpStream::connect(addr).await?;
        Stream::new(tcp, config).await
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Stream<S> {
    /// Wrap an established connection and write the XML prolog.
    pub async fn new(io: S, config: StreamConfig) -> Result<Stream<S>, Error> {
        let mut stream = Stream {
            transport: Transport::Plain(io),
            buf: BytesMut::with_capacity(4096),
            bindings: NamespaceBindings::default(),
            config,
        };
        stream.send(XML_PROLOG).await?;
        Ok(stream)
    }

    /// Whether the transport has been upgraded to TLS.
    pub fn is_tls(&self) -> bool {
        matches!(self.transport, Transport::Tls(_))
    }

    /// Send our root element and read the peer's, recording its namespace
    /// bindings. Returns the peer's header; its `id` matters for component
    /// handshakes.
    pub async fn send_header(&mut self, header: &StreamHeader) -> Result<StreamHeader, Error> {
        self.send(&header.serialize()?).await?;
        loop {
            match xml::extract_root(&self.buf)? {
                Frame::Root {
                    name,
                    attrs,
                    consumed,
                } => {
                    let _ = self.buf.split_to(consumed);
                    let mut bindings = NamespaceBindings::from_attrs(&attrs);
                    let valid = match name.split_once(':') {
                        Some((prefix, local)) => {
                            local == "stream" && bindings.resolve(prefix) == Some(ns::STREAM)
                        }
                        None => name == "stream" && bindings.default_ns == ns::STREAM,
                    };
                    if !valid {
                        return Err(ProtocolError::InvalidStreamStart.into());
                    }
                    // Stanzas live in the default namespace; if the peer did
                    // not declare one, ours applies.
                    if bindings.default_ns.is_empty() {
                        bindings.default_ns = header.ns.clone();
                    }
                    let peer = StreamHeader {
                        ns: bindings.default_ns.clone(),
                        to: attr_of(&attrs, "to"),
                        from: attr_of(&attrs, "from"),
                        id: attr_of(&attrs, "id"),
                        version: attr_of(&attrs, "version"),
                    };
                    self.bindings = bindings;
                    return Ok(peer);
                }
                Frame::Incomplete => fill(&mut self.transport, &mut self.buf).await?,
                _ => return Err(ProtocolError::InvalidStreamStart.into()),
            }
        }
    }

    /// Transmit a serialized element (or any raw XML text).
    pub async fn send(&mut self, xml: &str) -> Result<(), Error> {
        send_raw(&mut self.transport, xml, self.config.log_stanzas).await
    }

    /// Close our side of the stream.
    pub async fn send_end(&mut self) -> Result<(), Error> {
        self.send(STREAM_END).await
    }

    /// The next direct child element of the peer's root, or `None` once the
    /// peer has closed the stream.
    pub async fn next(&mut self) -> Result<Option<Element>, Error> {
        next_element(
            &mut self.transport,
            &mut self.buf,
            &self.bindings,
            self.config.log_stanzas,
        )
        .await
    }

    /// Read the next element and decode it into a typed value.
    pub async fn read<T>(&mut self) -> Result<T, Error>
    where
        T: TryFrom<Element, Error = Error>,
    {
        match self.next().await? {
            Some(elem) => T::try_from(elem),
            None => Err(Error::Disconnected),
        }
    }

    /// Read and discard the next element.
    pub async fn skip(&mut self) -> Result<(), Error> {
        self.next().await.map(|_| ())
    }

    /// Perform the TLS handshake over the underlying connection and rebuild
    /// the stream on top of it.
    ///
    /// The caller must have completed the STARTTLS exchange first. All
    /// parser state is discarded; the stream is back to its pre-root state
    /// and a fresh header must be sent.
    pub async fn upgrade_tls(
        self,
        domain: &str,
        insecure_skip_verify: bool,
    ) -> Result<Stream<S>, Error> {
        let io = match self.transport {
            Transport::Plain(io) => io,
            Transport::Tls(_) => return Err(Error::InvalidState),
        };
        debug!("upgrading stream to TLS");
        let connector = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()?;
        let connector = tokio_native_tls::TlsConnector::from(connector);
        let tls = connector.connect(domain, io).await?;
        Ok(Stream {
            transport: Transport::Tls(Box::new(tls)),
            buf: BytesMut::with_capacity(4096),
            bindings: NamespaceBindings::default(),
            config: self.config,
        })
    }

    /// Split into the two halves the session's tasks own: all reads go
    /// through the returned reader, all writes through the writer.
    pub fn split(self) -> (StreamReader<S>, StreamWriter<S>) {
        let (read, write) = tokio::io::split(self.transport);
        (
            StreamReader {
                io: read,
                buf: self.buf,
                bindings: self.bindings,
                config: self.config.clone(),
            },
            StreamWriter {
                io: write,
                config: self.config,
            },
        )
    }
}

/// Receiving half of a split [`Stream`].
pub struct StreamReader<S> {
    io: ReadHalf<Transport<S>>,
    buf: BytesMut,
    bindings: NamespaceBindings,
    config: StreamConfig,
}

impl<S: AsyncRead + AsyncWrite + Unpin> StreamReader<S> {
    /// See [`Stream::next`].
    pub async fn next(&mut self) -> Result<Option<Element>, Error> {
        next_element(
            &mut self.io,
            &mut self.buf,
            &self.bindings,
            self.config.log_stanzas,
        )
        .await
    }
}

/// Sending half of a split [`Stream`].
pub struct StreamWriter<S> {
    io: WriteHalf<Transport<S>>,
    config: StreamConfig,
}

impl<S: AsyncRead + AsyncWrite + Unpin> StreamWriter<S> {
    /// See [`Stream::send`].
    pub async fn send(&mut self, xml: &str) -> Result<(), Error> {
        send_raw(&mut self.io, xml, self.config.log_stanzas).await
    }

    /// See [`Stream::send_end`].
    pub async fn send_end(&mut self) -> Result<(), Error> {
        self.send(STREAM_END).await
    }

    /// Shut the write direction down after the stream end tag went out.
    pub async fn shutdown(&mut self) -> Result<(), Error> {
        self.io.shutdown().await?;
        Ok(())
    }
}

async fn send_raw<W: AsyncWrite + Unpin>(
    io: &mut W,
    xml: &str,
    log_stanzas: bool,
) -> Result<(), Error> {
    if log_stanzas {
        debug!(">> {}", xml);
    }
    io.write_all(xml.as_bytes()).await?;
    io.flush().await?;
    Ok(())
}

async fn fill<R: AsyncRead + Unpin>(io: &mut R, buf: &mut BytesMut) -> Result<(), Error> {
    buf.reserve(4096);
    let n = io.read_buf(buf).await?;
    if n == 0 {
        return Err(Error::Disconnected);
    }
    Ok(())
}

async fn next_element<R: AsyncRead + Unpin>(
    io: &mut R,
    buf: &mut BytesMut,
    bindings: &NamespaceBindings,
    log_stanzas: bool,
) -> Result<Option<Element>, Error> {
    loop {
        match xml::extract_child(buf)? {
            Frame::Child {
                start,
                end,
                consumed,
            } => {
                let raw = std::str::from_utf8(&buf[start..end])?.to_owned();
                let _ = buf.split_to(consumed);
                let text = xml::into_standalone(&raw, bindings);
                if log_stanzas {
                    debug!("<< {}", text);
                }
                let elem: Element = text.parse().map_err(ProtocolError::Parser)?;
                return Ok(Some(elem));
            }
            Frame::StreamEnd { consumed } => {
                let _ = buf.split_to(consumed);
                return Ok(None);
            }
            Frame::Incomplete => fill(io, buf).await?,
            Frame::Root { .. } => return Err(ProtocolError::InvalidStreamStart.into()),
        }
    }
}
