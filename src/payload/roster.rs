//! RFC 6121: roster queries and pushes.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::jid::Jid;
use crate::ns;

/// The subscription state of a roster item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Subscription {
    /// No subscription in either direction
    #[default]
    None,
    /// The contact sees our presence
    From,
    /// We see the contact's presence
    To,
    /// Mutual subscription
    Both,
    /// Remove the item (only valid in sets)
    Remove,
}

impl Subscription {
    /// The attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Subscription::None => "none",
            Subscription::From => "from",
            Subscription::To => "to",
            Subscription::Both => "both",
            Subscription::Remove => "remove",
        }
    }

    fn from_attr(value: &str) -> Result<Subscription, ParseError> {
        match value {
            "none" => Ok(Subscription::None),
            "from" => Ok(Subscription::From),
            "to" => Ok(Subscription::To),
            "both" => Ok(Subscription::Both),
            "remove" => Ok(Subscription::Remove),
            _ => Err(ParseError("unknown roster subscription")),
        }
    }
}

/// One `<item/>` of a roster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterItem {
    /// The contact's address
    pub jid: Jid,
    /// Display name
    pub name: Option<String>,
    /// Subscription state
    pub subscription: Subscription,
    /// Groups the contact is filed under
    pub groups: Vec<String>,
}

/// A `jabber:iq:roster` query or result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RosterQuery {
    /// The roster's items; empty in requests
    pub items: Vec<RosterItem>,
}

impl From<RosterQuery> for Element {
    fn from(query: RosterQuery) -> Element {
        let mut builder = Element::builder("query", ns::ROSTER);
        for item in query.items {
            let mut item_builder = Element::builder("item", ns::ROSTER)
                .attr("jid", item.jid.full())
                .attr("subscription", item.subscription.as_str());
            if let Some(name) = item.name {
                item_builder = item_builder.attr("name", name);
            }
            for group in item.groups {
                item_builder =
                    item_builder.append(Element::builder("group", ns::ROSTER).append(group).build());
            }
            builder = builder.append(item_builder.build());
        }
        builder.build()
    }
}

impl TryFrom<Element> for RosterQuery {
    type Error = Error;

    fn try_from(elem: Element) -> Result<RosterQuery, Error> {
        if !elem.is("query", ns::ROSTER) {
            return Err(ParseError("expected a roster <query/> element").into());
        }
        let mut query = RosterQuery::default();
        for child in elem.children() {
            if !child.is("item", ns::ROSTER) {
                continue;
            }
            query.items.push(RosterItem {
                jid: child
                    .attr("jid")
                    .ok_or(ParseError("roster item requires a jid"))?
                    .parse()?,
                name: child.attr("name").map(str::to_owned),
                subscription: match child.attr("subscription") {
                    Some(value) => Subscription::from_attr(value)?,
                    None => Subscription::None,
                },
                groups: child
                    .children()
                    .filter(|sub| sub.is("group", ns::ROSTER))
                    .map(|sub| sub.text())
                    .collect(),
            });
        }
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let query = RosterQuery {
            items: vec![RosterItem {
                jid: "bob@example.com".parse().unwrap(),
                name: Some("Bob".to_owned()),
                subscription: Subscription::Both,
                groups: vec!["Friends".to_owned(), "Work".to_owned()],
            }],
        };
        let elem = Element::from(query.clone());
        assert_eq!(RosterQuery::try_from(elem).unwrap(), query);
    }

    #[test]
    fn test_item_without_jid_is_rejected() {
        let elem: Element = "<query xmlns='jabber:iq:roster'><item name='x'/></query>"
            .parse()
            .unwrap();
        assert!(RosterQuery::try_from(elem).is_err());
    }
}
