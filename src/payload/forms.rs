//! XEP-0004: Data Forms, the `jabber:x:data` payloads embedded in
//! registration and ad-hoc command exchanges.

use minidom::Element;

use crate::error::{Error, ParseError};
use crate::ns;

/// The `type` attribute of a form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormType {
    /// Cancel a form in progress
    Cancel,
    /// A form requesting answers
    Form,
    /// Results of a submitted form
    Result,
    /// A filled-in form
    Submit,
}

impl FormType {
    /// The attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Cancel => "cancel",
            FormType::Form => "form",
            FormType::Result => "result",
            FormType::Submit => "submit",
        }
    }

    fn from_attr(value: &str) -> Result<FormType, ParseError> {
        match value {
            "cancel" => Ok(FormType::Cancel),
            "form" => Ok(FormType::Form),
            "result" => Ok(FormType::Result),
            "submit" => Ok(FormType::Submit),
            _ => Err(ParseError("unknown data form type")),
        }
    }
}

/// One selectable `<option/>` of a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormFieldOption {
    /// The option's value
    pub value: String,
}

/// One `<field/>` of a form.
///
/// The field type is kept textual; the library only transports forms, it
/// does not render them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormField {
    /// `var` attribute naming the field
    pub var: Option<String>,
    /// Human-readable label
    pub label: Option<String>,
    /// Field type (`text-single`, `list-multi`, …)
    pub type_: Option<String>,
    /// Current or submitted values
    pub values: Vec<String>,
    /// Choices for list fields
    pub options: Vec<FormFieldOption>,
}

/// A `jabber:x:data` form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataForm {
    /// What stage of the exchange this form is
    pub type_: FormType,
    /// Form title
    pub title: Option<String>,
    /// Filling instructions
    pub instructions: Option<String>,
    /// The fields themselves
    pub fields: Vec<FormField>,
}

impl DataForm {
    /// An empty form of the given type.
    pub fn new(type_: FormType) -> DataForm {
        DataForm {
            type_,
            title: None,
            instructions: None,
            fields: Vec::new(),
        }
    }
}

impl From<DataForm> for Element {
    fn from(form: DataForm) -> Element {
        let mut builder = Element::builder("x", ns::DATA_FORMS).attr("type", form.type_.as_str());
        if let Some(title) = form.title {
            builder = builder.append(Element::builder("title", ns::DATA_FORMS).append(title).build());
        }
        if let Some(instructions) = form.instructions {
            builder = builder.append(
                Element::builder("instructions", ns::DATA_FORMS)
                    .append(instructions)
                    .build(),
            );
        }
        for field in form.fields {
            let mut field_builder = Element::builder("field", ns::DATA_FORMS);
            if let Some(var) = field.var {
                field_builder = field_builder.attr("var", var);
            }
            if let Some(label) = field.label {
                field_builder = field_builder.attr("label", label);
            }
            if let Some(type_) = field.type_ {
                field_builder = field_builder.attr("type", type_);
            }
            for value in field.values {
                field_builder = field_builder
                    .append(Element::builder("value", ns::DATA_FORMS).append(value).build());
            }
            for option in field.options {
                field_builder = field_builder.append(
                    Element::builder("option", ns::DATA_FORMS)
                        .append(
                            Element::builder("value", ns::DATA_FORMS)
                                .append(option.value)
                                .build(),
                        )
                        .build(),
                );
            }
            builder = builder.append(field_builder.build());
        }
        builder.build()
    }
}

impl TryFrom<Element> for DataForm {
    type Error = Error;

    fn try_from(elem: Element) -> Result<DataForm, Error> {
        if !elem.is("x", ns::DATA_FORMS) {
            return Err(ParseError("expected a jabber:x:data <x/> element").into());
        }
        let mut form = DataForm::new(FormType::from_attr(
            elem.attr("type")
                .ok_or(ParseError("data form requires a type attribute"))?,
        )?);
        for child in elem.children() {
            if child.is("title", ns::DATA_FORMS) {
                form.title = Some(child.text());
            } else if child.is("instructions", ns::DATA_FORMS) {
                form.instructions = Some(child.text());
            } else if child.is("field", ns::DATA_FORMS) {
                let mut field = FormField {
                    var: child.attr("var").map(str::to_owned),
                    label: child.attr("label").map(str::to_owned),
                    type_: child.attr("type").map(str::to_owned),
                    ..FormField::default()
                };
                for sub in child.children() {
                    if sub.is("value", ns::DATA_FORMS) {
                        field.values.push(sub.text());
                    } else if sub.is("option", ns::DATA_FORMS) {
                        if let Some(value) = sub.get_child("value", ns::DATA_FORMS) {
                            field.options.push(FormFieldOption {
                                value: value.text(),
                            });
                        }
                    }
                }
                form.fields.push(field);
            }
        }
        Ok(form)
    }
}
