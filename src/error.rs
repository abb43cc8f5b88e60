//! Rich diagnostic error types for the semnet core.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so callers know exactly
//! what went wrong and how to fix it. There is no exception mechanism anywhere
//! in the crate: fallible operations return `Result`, and the degrapher surface
//! returns `Option<String>` (a failed generation is an empty answer, not a fault).

use miette::Diagnostic;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Pool errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PoolError {
    #[error("cannot switch to hashed bins: pool already holds {count} node(s)")]
    #[diagnostic(
        code(semnet::pool::bins_after_nodes),
        help(
            "Call `make_bins()` before creating any node. Converting a populated \
             flat pool to hashed mode is rejected rather than silently re-filed; \
             call `purge_all()` first if you really want a hashed restart."
        )
    )]
    BinsAfterNodes { count: usize },

    #[error("node {nick} not found in this pool")]
    #[diagnostic(
        code(semnet::pool::unknown_node),
        help(
            "The node id does not belong to this pool. Edges are non-owning: a \
             removed node leaves dangling references behind, which the caller \
             is expected to purge first."
        )
    )]
    UnknownNode { nick: String },

    #[error("argument limit reached: node {nick} already has {max} argument slots")]
    #[diagnostic(
        code(semnet::pool::arg_limit),
        help("Argument slots are bounded. Split the predication into several nodes.")
    )]
    ArgLimit { nick: String, max: usize },

    #[error("bin index {bin} out of range (pool has {bins} bins)")]
    #[diagnostic(
        code(semnet::pool::bad_bin),
        help("Flat pools have a single bin 0; hashed pools have bins 0..=675.")
    )]
    BadBin { bin: usize, bins: usize },
}

// ---------------------------------------------------------------------------
// Assertion errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum AssertError {
    #[error("binding failure: pattern item {nick} could not be resolved or created")]
    #[diagnostic(
        code(semnet::assert::unresolved),
        help(
            "Each pattern item must either be pre-bound, live outside the pattern \
             universe (and so be adopted directly), or be creatable in the target \
             pool. Earlier items remain committed; no edges were added for the \
             offending item."
        )
    )]
    Unresolved { nick: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pool(#[from] PoolError),
}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CodecError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(semnet::codec::io),
        help("A filesystem operation failed. Check the path and permissions.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("parse error at line {line}: {text}")]
    #[diagnostic(
        code(semnet::codec::parse),
        help(
            "The line does not match the node-record grammar \
             (`kind-n -slot-> kind-m`, `-lex- ...`, `-tag- ...`). \
             Nodes built from earlier lines remain in the pool."
        )
    )]
    Parse { line: usize, text: String },

    #[error("bad node reference \"{text}\" at line {line}")]
    #[diagnostic(
        code(semnet::codec::bad_ref),
        help("Node references look like `kind-3` (main band) or `kind+3` (halo).")
    )]
    BadRef { line: usize, text: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pool(#[from] PoolError),
}

impl From<std::io::Error> for CodecError {
    fn from(source: std::io::Error) -> Self {
        CodecError::Io { source }
    }
}

// ---------------------------------------------------------------------------
// Matcher errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum MatchError {
    #[error("empty pattern: nothing to match")]
    #[diagnostic(
        code(semnet::matcher::empty_pattern),
        help("A pattern graphlet needs at least one item (its main focus).")
    )]
    EmptyPattern,

    #[error("pattern item {nick} does not belong to the pattern pool")]
    #[diagnostic(
        code(semnet::matcher::foreign_item),
        help("Every graphlet item must resolve in the pool passed alongside it.")
    )]
    ForeignItem { nick: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_error_wraps_pool_error() {
        let pool_err = PoolError::ArgLimit {
            nick: "act-2".into(),
            max: 16,
        };
        let assert_err: AssertError = pool_err.into();
        assert!(matches!(assert_err, AssertError::Pool(PoolError::ArgLimit { .. })));
    }

    #[test]
    fn codec_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CodecError = io.into();
        assert!(matches!(err, CodecError::Io { .. }));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = PoolError::UnknownNode {
            nick: "obj-7".into(),
        };
        assert!(format!("{err}").contains("obj-7"));
        let err = PoolError::BadBin { bin: 900, bins: 676 };
        let msg = format!("{err}");
        assert!(msg.contains("900"));
        assert!(msg.contains("676"));
    }

    #[test]
    fn parse_error_carries_line_number() {
        let err = CodecError::Parse {
            line: 12,
            text: "garbage".into(),
        };
        assert!(format!("{err}").contains("12"));
    }
}
