use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::host::HostError;

#[derive(Error, Debug, Diagnostic)]
pub enum TokenError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error("document contains no importable tokens")]
    #[diagnostic(
        code(import::empty_document),
        help("Every leaf needs a `$value` and a `$type` (its own, or inherited from an ancestor group).")
    )]
    EmptyDocument,

    #[error("host store operation failed: {0}")]
    #[diagnostic(code(import::host_failure))]
    Host(#[from] HostError),
}

#[derive(Error, Debug, Diagnostic, Clone)]
#[error("Parse Error")]
pub enum ParseError {
    #[error("invalid JSON: {message}")]
    #[diagnostic(
        code(parse::invalid_json),
        help("The token document must be well-formed JSON.")
    )]
    InvalidJson {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    #[error("document root must be an object")]
    #[diagnostic(
        code(parse::invalid_root),
        help("The top level of a token document is a group: an object whose keys name tokens or nested groups.")
    )]
    InvalidRoot {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected a token group here")]
        span: SourceSpan,
    },
}
