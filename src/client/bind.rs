//! Resource binding and session establishment, the post-authentication
//! steps of client negotiation.

use minidom::Element;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Error, ParseError, ProtocolError};
use crate::jid::Jid;
use crate::ns;
use crate::stanza::{Iq, IqType};
use crate::stream::Stream;
use crate::uuid::uuid4;
use crate::xml;

/// The server's answer to a bind request.
struct BindResponse {
    jid: Jid,
}

impl TryFrom<Element> for BindResponse {
    type Error = Error;

    fn try_from(elem: Element) -> Result<BindResponse, Error> {
        if !elem.is("bind", ns::BIND) {
            return Err(ParseError("expected a <bind/> element").into());
        }
        let jid = elem
            .get_child("jid", ns::BIND)
            .ok_or(ParseError("bind response carries no jid"))?;
        Ok(BindResponse {
            jid: jid.text().trim().parse()?,
        })
    }
}

/// Bind a resource, requesting the JID's resource if it names one, and
/// return the JID the server actually bound.
pub(crate) async fn bind<S>(stream: &mut Stream<S>, jid: &Jid) -> Result<Jid, Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let id = uuid4();
    let mut request = String::new();
    request.push_str("<iq");
    xml::push_attr(&mut request, "id", &id)?;
    xml::push_attr(&mut request, "type", "set")?;
    request.push_str("><bind");
    xml::push_attr(&mut request, "xmlns", ns::BIND)?;
    request.push('>');
    if let Some(resource) = &jid.resource {
        request.push_str("<resource>");
        request.push_str(&xml::escape(resource));
        request.push_str("</resource>");
    }
    request.push_str("</bind></iq>");
    stream.send(&request).await?;

    let reply: Iq = stream.read().await?;
    if reply.id != id {
        return Err(ProtocolError::InvalidBindResponse.into());
    }
    match reply.type_ {
        IqType::Result => {
            let bound: BindResponse = reply.payload_decode()?;
            Ok(bound.jid)
        }
        IqType::Error => match reply.error {
            Some(error) => Err(Error::Stanza(error)),
            None => Err(ProtocolError::InvalidBindResponse.into()),
        },
        _ => Err(ProtocolError::InvalidBindResponse.into()),
    }
}

/// Establish a session with the server, the legacy RFC 3921 step some
/// servers still require after binding.
pub(crate) async fn establish_session<S>(stream: &mut Stream<S>, domain: &str) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let id = uuid4();
    let mut request = String::new();
    request.push_str("<iq");
    xml::push_attr(&mut request, "id", &id)?;
    xml::push_attr(&mut request, "type", "set")?;
    xml::push_attr(&mut request, "to", domain)?;
    request.push_str("><session");
    xml::push_attr(&mut request, "xmlns", ns::SESSION)?;
    request.push_str("/></iq>");
    stream.send(&request).await?;

    let reply: Iq = stream.read().await?;
    match reply.type_ {
        IqType::Result => Ok(()),
        IqType::Error => match reply.error {
            Some(error) => Err(Error::Stanza(error)),
            None => Err(ProtocolError::UnexpectedElement("error".to_owned()).into()),
        },
        _ => Err(ProtocolError::UnexpectedElement("iq".to_owned()).into()),
    }
}
