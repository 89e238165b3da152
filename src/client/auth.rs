//! SASL authentication for client streams.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{AuthError, Error, ParseError, ProtocolError};
use crate::ns;
use crate::stream::Stream;
use crate::xml;

/// One SASL mechanism implementation.
///
/// Handlers are tried in the order the [`crate::ClientConfig`] lists them;
/// the first whose mechanism the server offers runs the exchange. The only
/// built-in handler is [`Plain`]; implement this trait to add others.
pub trait AuthHandler: Send {
    /// The mechanism name as advertised in `<mechanisms/>`.
    fn mechanism(&self) -> &'static str;

    /// The initial response carried in `<auth/>`, before base64.
    fn initial(&mut self, username: &str, password: &str) -> Result<Vec<u8>, Error>;

    /// Answer a server `<challenge/>`. Mechanisms that complete in one
    /// round-trip keep the default, which fails the negotiation.
    fn respond(&mut self, _challenge: &[u8]) -> Result<Vec<u8>, Error> {
        Err(AuthError::Unsupported(self.mechanism()).into())
    }
}

/// SASL PLAIN: the credential is `\0username\0password`.
pub struct Plain;

impl AuthHandler for Plain {
    fn mechanism(&self) -> &'static str {
        "PLAIN"
    }

    fn initial(&mut self, username: &str, password: &str) -> Result<Vec<u8>, Error> {
        let mut payload = Vec::with_capacity(username.len() + password.len() + 2);
        payload.push(0);
        payload.extend_from_slice(username.as_bytes());
        payload.push(0);
        payload.extend_from_slice(password.as_bytes());
        Ok(payload)
    }
}

pub(crate) async fn authenticate<S>(
    stream: &mut Stream<S>,
    offered: &[String],
    handlers: &mut [Box<dyn AuthHandler>],
    username: &str,
    password: &str,
) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    for handler in handlers {
        if !offered.iter().any(|m| m == handler.mechanism()) {
            continue;
        }
        debug!("authenticating with {}", handler.mechanism());

        let initial = handler.initial(username, password)?;
        let mut request = String::new();
        xml::write_start(
            &mut request,
            "",
            "auth",
            &[("xmlns", ns::SASL), ("mechanism", handler.mechanism())],
        )?;
        request.push_str(&BASE64.encode(&initial));
        xml::write_end(&mut request, "", "auth")?;
        stream.send(&request).await?;

        loop {
            let elem = stream.next().await?.ok_or(Error::Disconnected)?;
            if elem.is("success", ns::SASL) {
                return Ok(());
            } else if elem.is("failure", ns::SASL) {
                let condition = elem
                    .children()
                    .find(|child| child.name() != "text")
                    .map(|child| child.name().to_owned())
                    .unwrap_or_else(|| "failure".to_owned());
                return Err(AuthError::Fail(condition).into());
            } else if elem.is("challenge", ns::SASL) {
                let challenge = BASE64
                    .decode(elem.text().trim())
                    .map_err(|_| ParseError("invalid base64 in SASL challenge"))?;
                let response = handler.respond(&challenge)?;
                let mut reply = String::new();
                xml::write_start(&mut reply, "", "response", &[("xmlns", ns::SASL)])?;
                reply.push_str(&BASE64.encode(&response));
                xml::write_end(&mut reply, "", "response")?;
                stream.send(&reply).await?;
            } else {
                return Err(ProtocolError::UnexpectedElement(elem.name().to_owned()).into());
            }
        }
    }
    Err(AuthError::NoMechanism.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_initial() {
        let payload = Plain.initial("alice", "secret").unwrap();
        assert_eq!(payload, b"\0alice\0secret");
        assert_eq!(BASE64.encode(&payload), "AGFsaWNlAHNlY3JldA==");
    }

    #[test]
    fn test_plain_rejects_challenges() {
        assert!(matches!(
            Plain.respond(b"anything"),
            Err(Error::Auth(AuthError::Unsupported("PLAIN")))
        ));
    }
}
