//! XEP-0050: Ad-Hoc Commands.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::ns;

use super::DataForm;

/// The `action` attribute of a command request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandAction {
    /// Abort the command
    Cancel,
    /// Finish a multi-stage command
    Complete,
    /// Run or start the command
    Execute,
    /// Advance to the next stage
    Next,
    /// Return to the previous stage
    Prev,
}

impl CommandAction {
    /// The attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandAction::Cancel => "cancel",
            CommandAction::Complete => "complete",
            CommandAction::Execute => "execute",
            CommandAction::Next => "next",
            CommandAction::Prev => "prev",
        }
    }

    fn from_attr(value: &str) -> Result<CommandAction, ParseError> {
        match value {
            "cancel" => Ok(CommandAction::Cancel),
            "complete" => Ok(CommandAction::Complete),
            "execute" => Ok(CommandAction::Execute),
            "next" => Ok(CommandAction::Next),
            "prev" => Ok(CommandAction::Prev),
            _ => Err(ParseError("unknown command action")),
        }
    }
}

/// The `status` attribute of a command response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandStatus {
    /// The command was aborted
    Canceled,
    /// The command has finished
    Completed,
    /// The command awaits further interaction
    Executing,
}

impl CommandStatus {
    /// The attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Canceled => "canceled",
            CommandStatus::Completed => "completed",
            CommandStatus::Executing => "executing",
        }
    }

    fn from_attr(value: &str) -> Result<CommandStatus, ParseError> {
        match value {
            "canceled" => Ok(CommandStatus::Canceled),
            "completed" => Ok(CommandStatus::Completed),
            "executing" => Ok(CommandStatus::Executing),
            _ => Err(ParseError("unknown command status")),
        }
    }
}

/// Severity of a command `<note/>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandNoteType {
    /// Error note
    Error,
    /// Informational note
    Info,
    /// Warning note
    Warn,
}

impl CommandNoteType {
    /// The attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandNoteType::Error => "error",
            CommandNoteType::Info => "info",
            CommandNoteType::Warn => "warn",
        }
    }

    fn from_attr(value: &str) -> Result<CommandNoteType, ParseError> {
        match value {
            "error" => Ok(CommandNoteType::Error),
            "info" => Ok(CommandNoteType::Info),
            "warn" => Ok(CommandNoteType::Warn),
            _ => Err(ParseError("unknown command note type")),
        }
    }
}

/// A `<note/>` accompanying a command response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandNote {
    /// Severity
    pub type_: CommandNoteType,
    /// The note's text
    pub value: String,
}

/// A `<command/>` payload.
#[derive(Clone, Debug, PartialEq)]
pub struct AdHocCommand {
    /// Which command to run
    pub node: String,
    /// Requested action, on requests
    pub action: Option<CommandAction>,
    /// Session id tying multi-stage exchanges together
    pub session_id: Option<String>,
    /// Execution status, on responses
    pub status: Option<CommandStatus>,
    /// Attached data form
    pub form: Option<DataForm>,
    /// Attached note
    pub note: Option<CommandNote>,
}

impl AdHocCommand {
    /// A request running `node` with the given action.
    pub fn new(node: &str, action: CommandAction) -> AdHocCommand {
        AdHocCommand {
            node: node.to_owned(),
            action: Some(action),
            session_id: None,
            status: None,
            form: None,
            note: None,
        }
    }
}

impl From<AdHocCommand> for Element {
    fn from(command: AdHocCommand) -> Element {
        let mut builder = Element::builder("command", ns::COMMANDS).attr("node", command.node);
        if let Some(action) = command.action {
            builder = builder.attr("action", action.as_str());
        }
        if let Some(session_id) = command.session_id {
            builder = builder.attr("sessionid", session_id);
        }
        if let Some(status) = command.status {
            builder = builder.attr("status", status.as_str());
        }
        if let Some(form) = command.form {
            builder = builder.append(Element::from(form));
        }
        if let Some(note) = command.note {
            builder = builder.append(
                Element::builder("note", ns::COMMANDS)
                    .attr("type", note.type_.as_str())
                    .append(note.value)
                    .build(),
            );
        }
        builder.build()
    }
}

impl TryFrom<Element> for AdHocCommand {
    type Error = Error;

    fn try_from(elem: Element) -> Result<AdHocCommand, Error> {
        if !elem.is("command", ns::COMMANDS) {
            return Err(ParseError("expected a <command/> element").into());
        }
        let mut command = AdHocCommand {
            node: elem
                .attr("node")
                .ok_or(ParseError("command requires a node attribute"))?
                .to_owned(),
            action: match elem.attr("action") {
                Some(value) => Some(CommandAction::from_attr(value)?),
                None => None,
            },
            session_id: elem.attr("sessionid").map(str::to_owned),
            status: match elem.attr("status") {
                Some(value) => Some(CommandStatus::from_attr(value)?),
                None => None,
            },
            form: None,
            note: None,
        };
        for child in elem.children() {
            if child.is("x", ns::DATA_FORMS) {
                command.form = Some(DataForm::try_from(child.clone())?);
            } else if child.is("note", ns::COMMANDS) {
                command.note = Some(CommandNote {
                    type_: match child.attr("type") {
                        Some(value) => CommandNoteType::from_attr(value)?,
                        None => CommandNoteType::Info,
                    },
                    value: child.text(),
                });
            }
        }
        Ok(command)
    }
}
