//! XEP-0077: In-Band Registration.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::ns;

use super::DataForm;

/// A `jabber:iq:register` query, request or submission.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegisterQuery {
    /// Instructions from the server
    pub instructions: Option<String>,
    /// Desired or registered username
    pub username: Option<String>,
    /// Password for the account
    pub password: Option<String>,
    /// The entity is already registered
    pub registered: bool,
    /// Unregister instead of registering
    pub remove: bool,
    /// Extended registration form
    pub form: Option<DataForm>,
}

impl From<RegisterQuery> for Element {
    fn from(query: RegisterQuery) -> Element {
        let mut builder = Element::builder("query", ns::REGISTER);
        if let Some(instructions) = query.instructions {
            builder = builder.append(
                Element::builder("instructions", ns::REGISTER)
                    .append(instructions)
                    .build(),
            );
        }
        if let Some(username) = query.username {
            builder =
                builder.append(Element::builder("username", ns::REGISTER).append(username).build());
        }
        if let Some(password) = query.password {
            builder =
                builder.append(Element::builder("password", ns::REGISTER).append(password).build());
        }
        if query.registered {
            builder = builder.append(Element::builder("registered", ns::REGISTER).build());
        }
        if query.remove {
            builder = builder.append(Element::builder("remove", ns::REGISTER).build());
        }
        if let Some(form) = query.form {
            builder = builder.append(Element::from(form));
        }
        builder.build()
    }
}

impl TryFrom<Element> for RegisterQuery {
    type Error = Error;

    fn try_from(elem: Element) -> Result<RegisterQuery, Error> {
        if !elem.is("query", ns::REGISTER) {
            return Err(ParseError("expected a jabber:iq:register <query/> element").into());
        }
        let mut query = RegisterQuery::default();
        for child in elem.children() {
            if child.is("instructions", ns::REGISTER) {
                query.instructions = Some(child.text());
            } else if child.is("username", ns::REGISTER) {
                query.username = Some(child.text());
            } else if child.is("password", ns::REGISTER) {
                query.password = Some(child.text());
            } else if child.is("registered", ns::REGISTER) {
                query.registered = true;
            } else if child.is("remove", ns::REGISTER) {
                query.remove = true;
            } else if child.is("x", ns::DATA_FORMS) {
                query.form = Some(DataForm::try_from(child.clone())?);
            }
        }
        Ok(query)
    }
}
