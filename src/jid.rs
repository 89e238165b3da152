//! Jabber-Id handling.

use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;

/// A Jabber-Id: `[node@]domain[/resource]`.
///
/// The node identifies an account on a server, the domain the server itself
/// and the resource one connected session of the account. Equality is
/// componentwise.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Jid {
    /// Account part, left of the `@`
    pub node: Option<String>,
    /// Server part, always present
    pub domain: String,
    /// Session part, right of the `/`
    pub resource: Option<String>,
}

impl Jid {
    /// Build a JID from its components.
    pub fn new(node: Option<&str>, domain: &str, resource: Option<&str>) -> Jid {
        Jid {
            node: node.map(str::to_owned),
            domain: domain.to_owned(),
            resource: resource.map(str::to_owned),
        }
    }

    /// The JID without its resource: `node@domain`, or `domain` alone when
    /// there is no node.
    pub fn bare(&self) -> String {
        match &self.node {
            Some(node) => format!("{}@{}", node, self.domain),
            None => self.domain.clone(),
        }
    }

    /// The full textual form, omitting empty components.
    pub fn full(&self) -> String {
        match &self.resource {
            Some(resource) => format!("{}/{}", self.bare(), resource),
            None => self.bare(),
        }
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.full())
    }
}

/// Ways in which a JID string can be malformed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JidParseError {
    /// `@domain`: the node is present but empty
    EmptyNode,
    /// The domain part is empty
    EmptyDomain,
    /// `bare/`: the resource is present but empty
    EmptyResource,
}

impl fmt::Display for JidParseError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JidParseError::EmptyNode => write!(fmt, "empty node in JID"),
            JidParseError::EmptyDomain => write!(fmt, "empty domain in JID"),
            JidParseError::EmptyResource => write!(fmt, "empty resource in JID"),
        }
    }
}

impl StdError for JidParseError {}

impl FromStr for Jid {
    type Err = JidParseError;

    fn from_str(s: &str) -> Result<Jid, JidParseError> {
        let (bare, resource) = match s.split_once('/') {
            Some((_, "")) => return Err(JidParseError::EmptyResource),
            Some((bare, resource)) => (bare, Some(resource.to_owned())),
            None => (s, None),
        };
        let (node, domain) = match bare.split_once('@') {
            Some(("", _)) => return Err(JidParseError::EmptyNode),
            Some((node, domain)) => (Some(node.to_owned()), domain),
            None => (None, bare),
        };
        if domain.is_empty() {
            return Err(JidParseError::EmptyDomain);
        }
        Ok(Jid {
            node,
            domain: domain.to_owned(),
            resource,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            "node@domain/resource".parse(),
            Ok(Jid::new(Some("node"), "domain", Some("resource")))
        );
        assert_eq!(
            "node@domain".parse(),
            Ok(Jid::new(Some("node"), "domain", None))
        );
        assert_eq!("domain".parse(), Ok(Jid::new(None, "domain", None)));
        assert_eq!(
            "domain/resource".parse(),
            Ok(Jid::new(None, "domain", Some("resource")))
        );
        // resources may contain further slashes
        assert_eq!(
            "node@domain/a/b".parse(),
            Ok(Jid::new(Some("node"), "domain", Some("a/b")))
        );
    }

    #[test]
    fn test_parse_rejects_empty_components() {
        assert_eq!("".parse::<Jid>(), Err(JidParseError::EmptyDomain));
        assert_eq!("node@".parse::<Jid>(), Err(JidParseError::EmptyDomain));
        assert_eq!("@domain".parse::<Jid>(), Err(JidParseError::EmptyNode));
        assert_eq!("domain/".parse::<Jid>(), Err(JidParseError::EmptyResource));
        assert_eq!("node@/res".parse::<Jid>(), Err(JidParseError::EmptyDomain));
    }

    #[test]
    fn test_bare() {
        assert_eq!(
            Jid::new(Some("node"), "domain", Some("resource")).bare(),
            "node@domain"
        );
        assert_eq!(Jid::new(None, "domain", Some("resource")).bare(), "domain");
    }

    #[test]
    fn test_full() {
        assert_eq!(
            Jid::new(Some("node"), "domain", Some("resource")).full(),
            "node@domain/resource"
        );
        assert_eq!(Jid::new(Some("node"), "domain", None).full(), "node@domain");
        assert_eq!(Jid::new(None, "domain", None).full(), "domain");
    }

    #[test]
    fn test_full_reparses() {
        for s in ["node@domain/resource", "node@domain", "domain", "a@b/c@d"] {
            let jid: Jid = s.parse().unwrap();
            assert_eq!(jid.full().parse::<Jid>().unwrap(), jid);
        }
    }
}
