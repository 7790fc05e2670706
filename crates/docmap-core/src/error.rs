use thiserror::Error;

use crate::types::Visibility;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("Method \"{method}\" in class \"{class}\" is not callable. Change visibility from {visibility} to public.")]
    NotCallable {
        method: String,
        class: String,
        visibility: Visibility,
    },

    #[error("{message} for entity {class}")]
    InvalidBoost { message: String, class: String },

    #[error("no identifier declared in entity {0}")]
    NoIdentifierDeclared(String),

    #[error("entity {class} declares more than one identifier: \"{first}\" and \"{second}\"")]
    DuplicateIdentifier {
        class: String,
        first: String,
        second: String,
    },

    #[error("synchronization callback \"{callback}\" is not registered for entity {class}")]
    UnknownCallback { class: String, callback: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),
}

pub type Result<T> = std::result::Result<T, Error>;
