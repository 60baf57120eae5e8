//! Diagnostics.
//!
//! Every condition the parser can report is a [`MsgKind`] with a fixed
//! [`Severity`]. Reports flow through an injectable sink, the
//! [`MsgHandler`]: the sink formats or collects the [`Diagnostic`] and
//! decides whether parsing continues. The default sink writes to stderr and
//! aborts on error severity by returning the [`ParseError`] that the entry
//! point propagates; warnings always continue with a best-effort fallback.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Hint,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Hint => write!(f, "Hint"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgKind {
    CannotOpenFile,
    Expected,
    GridTableNotImplemented,
    NewSectionExpected,
    GeneralParseError,
    InvalidDirective,
    RecursiveInclude,
    RedefinitionOfLabel,
    UnknownSubstitution,
    UnsupportedLanguage,
    UnsupportedField,
}

impl MsgKind {
    pub fn severity(self) -> Severity {
        match self {
            MsgKind::CannotOpenFile
            | MsgKind::Expected
            | MsgKind::GridTableNotImplemented
            | MsgKind::NewSectionExpected
            | MsgKind::GeneralParseError
            | MsgKind::InvalidDirective
            | MsgKind::RecursiveInclude => Severity::Error,
            MsgKind::RedefinitionOfLabel
            | MsgKind::UnknownSubstitution
            | MsgKind::UnsupportedLanguage
            | MsgKind::UnsupportedField => Severity::Warning,
        }
    }

    fn message(self, arg: &str) -> String {
        match self {
            MsgKind::CannotOpenFile => format!("cannot open '{}'", arg),
            MsgKind::Expected => format!("'{}' expected", arg),
            MsgKind::GridTableNotImplemented => "grid table is not implemented".to_string(),
            MsgKind::NewSectionExpected => "new section expected".to_string(),
            MsgKind::GeneralParseError => "general parse error".to_string(),
            MsgKind::InvalidDirective => format!("invalid directive: '{}'", arg),
            MsgKind::RecursiveInclude => format!("recursive inclusion of '{}'", arg),
            MsgKind::RedefinitionOfLabel => format!("redefinition of label '{}'", arg),
            MsgKind::UnknownSubstitution => format!("unknown substitution '{}'", arg),
            MsgKind::UnsupportedLanguage => format!("language '{}' not supported", arg),
            MsgKind::UnsupportedField => format!("field '{}' not supported", arg),
        }
    }
}

/// One report: where, what, and the offending text if any.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub filename: String,
    pub line: usize,
    pub col: usize,
    pub kind: MsgKind,
    pub arg: String,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn message(&self) -> String {
        self.kind.message(&self.arg)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}, {}) {}: {}",
            self.filename,
            self.line,
            self.col,
            self.severity(),
            self.message()
        )
    }
}

/// Fatal parse failure, carrying the diagnostic that caused it.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub diagnostic: Diagnostic,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.diagnostic)
    }
}

impl std::error::Error for ParseError {}

/// Diagnostic sink. Returning `Err` unwinds the parse; returning `Ok(())`
/// lets it continue with the local fallback for that condition.
pub type MsgHandler = Box<dyn FnMut(&Diagnostic) -> Result<(), ParseError>>;

/// The default sink: print to stderr, abort on error severity.
pub fn default_msg_handler() -> MsgHandler {
    Box::new(|diag| {
        eprintln!("{}", diag);
        match diag.severity() {
            Severity::Error => Err(ParseError {
                diagnostic: diag.clone(),
            }),
            _ => Ok(()),
        }
    })
}
