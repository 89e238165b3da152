//! XEP-0030: Service Discovery, plus a thin request helper over the
//! session's request/response machinery.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::jid::Jid;
use crate::ns;
use crate::session::{Matcher, Session};
use crate::stanza::{Iq, IqType};
use crate::uuid::uuid4;

/// One `<identity/>` of a disco#info result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoIdentity {
    /// Broad category (`server`, `gateway`, …)
    pub category: String,
    /// Specific type within the category
    pub type_: String,
    /// Human-readable name
    pub name: Option<String>,
}

/// One `<feature/>` of a disco#info result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoFeature {
    /// The feature's namespace
    pub var: String,
}

/// A `disco#info` query or result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscoInfo {
    /// Optional node the query addresses
    pub node: Option<String>,
    /// Who/what the entity is
    pub identities: Vec<DiscoIdentity>,
    /// What the entity supports
    pub features: Vec<DiscoFeature>,
}

impl From<DiscoInfo> for Element {
    fn from(info: DiscoInfo) -> Element {
        let mut builder = Element::builder("query", ns::DISCO_INFO);
        if let Some(node) = info.node {
            builder = builder.attr("node", node);
        }
        for identity in info.identities {
            let mut identity_builder = Element::builder("identity", ns::DISCO_INFO)
                .attr("category", identity.category)
                .attr("type", identity.type_);
            if let Some(name) = identity.name {
                identity_builder = identity_builder.attr("name", name);
            }
            builder = builder.append(identity_builder.build());
        }
        for feature in info.features {
            builder = builder.append(
                Element::builder("feature", ns::DISCO_INFO)
                    .attr("var", feature.var)
                    .build(),
            );
        }
        builder.build()
    }
}

impl TryFrom<Element> for DiscoInfo {
    type Error = Error;

    fn try_from(elem: Element) -> Result<DiscoInfo, Error> {
        if !elem.is("query", ns::DISCO_INFO) {
            return Err(ParseError("expected a disco#info <query/> element").into());
        }
        let mut info = DiscoInfo {
            node: elem.attr("node").map(str::to_owned),
            ..DiscoInfo::default()
        };
        for child in elem.children() {
            if child.is("identity", ns::DISCO_INFO) {
                info.identities.push(DiscoIdentity {
                    category: child.attr("category").unwrap_or_default().to_owned(),
                    type_: child.attr("type").unwrap_or_default().to_owned(),
                    name: child.attr("name").map(str::to_owned),
                });
            } else if child.is("feature", ns::DISCO_INFO) {
                info.features.push(DiscoFeature {
                    var: child.attr("var").unwrap_or_default().to_owned(),
                });
            }
        }
        Ok(info)
    }
}

/// One `<item/>` of a disco#items result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoItem {
    /// The item's address
    pub jid: String,
    /// Optional node within the entity
    pub node: Option<String>,
    /// Human-readable name
    pub name: Option<String>,
}

/// A `disco#items` query or result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscoItems {
    /// Optional node the query addresses
    pub node: Option<String>,
    /// The entity's items
    pub items: Vec<DiscoItem>,
}

impl From<DiscoItems> for Element {
    fn from(items: DiscoItems) -> Element {
        let mut builder = Element::builder("query", ns::DISCO_ITEMS);
        if let Some(node) = items.node {
            builder = builder.attr("node", node);
        }
        for item in items.items {
            let mut item_builder =
                Element::builder("item", ns::DISCO_ITEMS).attr("jid", item.jid);
            if let Some(node) = item.node {
                item_builder = item_builder.attr("node", node);
            }
            if let Some(name) = item.name {
                item_builder = item_builder.attr("name", name);
            }
            builder = builder.append(item_builder.build());
        }
        builder.build()
    }
}

impl TryFrom<Element> for DiscoItems {
    type Error = Error;

    fn try_from(elem: Element) -> Result<DiscoItems, Error> {
        if !elem.is("query", ns::DISCO_ITEMS) {
            return Err(ParseError("expected a disco#items <query/> element").into());
        }
        let mut items = DiscoItems {
            node: elem.attr("node").map(str::to_owned),
            ..DiscoItems::default()
        };
        for child in elem.children() {
            if child.is("item", ns::DISCO_ITEMS) {
                items.items.push(DiscoItem {
                    jid: child.attr("jid").unwrap_or_default().to_owned(),
                    node: child.attr("node").map(str::to_owned),
                    name: child.attr("name").map(str::to_owned),
                });
            }
        }
        Ok(items)
    }
}

/// Service discovery requests over an established session.
pub struct Disco<'a> {
    session: &'a Session,
}

impl<'a> Disco<'a> {
    /// Wrap a session.
    pub fn new(session: &'a Session) -> Disco<'a> {
        Disco { session }
    }

    /// Ask `to` what it is. `from` defaults to the session's bound JID.
    pub async fn info(&self, to: Jid, from: Option<Jid>) -> Result<DiscoInfo, Error> {
        self.query(to, from, DiscoInfo::default()).await
    }

    /// Ask `to` what items it holds. `from` defaults to the session's
    /// bound JID.
    pub async fn items(&self, to: Jid, from: Option<Jid>) -> Result<DiscoItems, Error> {
        self.query(to, from, DiscoItems::default()).await
    }

    async fn query<T>(&self, to: Jid, from: Option<Jid>, request: T) -> Result<T, Error>
    where
        T: Into<Element> + TryFrom<Element, Error = Error>,
    {
        let mut iq = Iq::new(IqType::Get, uuid4());
        iq.to = Some(to);
        iq.from = Some(from.unwrap_or_else(|| self.session.jid().clone()));
        iq.payload_encode(request)?;
        let response = self.session.send_recv(iq).await?;
        if let Some(error) = response.error {
            return Err(Error::Stanza(error));
        }
        response.payload_decode()
    }
}

/// A filter matcher selecting `<iq/>` stanzas whose payload lives under the
/// service discovery namespace, both `#info` and `#items`.
pub fn disco_filter() -> impl Matcher {
    crate::session::iq_payload_ns(ns::DISCO)
}
