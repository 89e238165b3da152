//! Typed payloads for the protocol extensions the library ships with.
//!
//! Every payload converts to and from a [`minidom::Element`]; an
//! [`crate::Iq`] stores the serialized form and decodes on demand, so
//! extensions unknown to this crate pass through untouched.

mod chatstates;
mod commands;
mod disco;
mod forms;
mod http_auth;
mod ping;
mod register;
mod roster;
mod vcard;
mod version;

pub use chatstates::ChatState;
pub use commands::{AdHocCommand, CommandAction, CommandNote, CommandNoteType, CommandStatus};
pub use disco::{
    disco_filter, Disco, DiscoFeature, DiscoIdentity, DiscoInfo, DiscoItem, DiscoItems,
};
pub use forms::{DataForm, FormField, FormFieldOption, FormType};
pub use http_auth::Confirm;
pub use ping::Ping;
pub use register::RegisterQuery;
pub use roster::{RosterItem, RosterQuery, Subscription};
pub use vcard::VCard;
pub use version::SoftwareVersion;
