//! Error and diagnostic types for datconf
//!
//! Every problem found while resolving a configuration is an [`Error`] with
//! context: the config path it concerns, the file (and line, when the parser
//! reports one) it came from, and an actionable help message. Stages that
//! collect several problems at once return them as [`Diagnostics`].

use std::fmt;

/// Result type alias for datconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single diagnostic produced while resolving a configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Path in the config where the error occurred (e.g., "component.foo.foo")
    pub path: Option<String>,
    /// Source location (file, line) if available
    pub source_location: Option<SourceLocation>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl SourceLocation {
    /// A location that only knows its file
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
        }
    }
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed HCL source
    Parse,
    /// An expression failed to evaluate
    Evaluation {
        /// The variable the expression referenced but could not find, if any
        variable: Option<String>,
    },
    /// A component block names a type with no registry entry
    UnknownComponentType { name: String },
    /// A required attribute is absent from a block body
    MissingRequiredAttribute { attribute: String },
    /// An attribute evaluated to a value of the wrong type
    TypeMismatch { attribute: String, expected: String },
    /// An attribute the block's shape does not declare
    UnsupportedAttribute { attribute: String },
    /// A block kind that is not allowed where it appears
    UnsupportedBlock { kind: String },
    /// A block carries the wrong number of labels
    InvalidLabels { kind: String },
    /// A singleton block is absent
    MissingBlock { kind: String },
    /// Something that must be unique was declared more than once
    DuplicateDeclaration { kind: String, name: String },
    /// A component type was registered twice
    AlreadyRegistered { name: String },
    /// A decoded value failed a constraint
    Validation,
    /// I/O error (unreadable file, bad glob pattern, etc.)
    Io,
    /// Internal error (bug in datconf)
    Internal,
}

impl Error {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            source_location: None,
            help: None,
            cause: None,
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Parse)
        }
    }

    /// Create an expression evaluation error
    ///
    /// When `variable` is set the help text points at the missing declaration.
    pub fn evaluation(
        path: impl Into<String>,
        message: impl Into<String>,
        variable: Option<String>,
    ) -> Self {
        let help = match &variable {
            Some(name) => format!(
                "Declare `variable \"{}\"` with a default, or set `{} = ...` in the values file",
                name, name
            ),
            None => "Check the expression for typos and type errors".to_string(),
        };
        Self {
            path: Some(path.into()),
            help: Some(help),
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Evaluation { variable })
        }
    }

    /// Create an unknown component type error
    pub fn unknown_component_type(name: impl Into<String>, path: Option<String>) -> Self {
        let n = name.into();
        Self {
            path,
            help: Some(format!(
                "Register the '{}' component type or check for typos",
                n
            )),
            ..Self::new(ErrorKind::UnknownComponentType { name: n })
        }
    }

    /// Create a missing required attribute error
    pub fn missing_attribute(block_path: &str, attribute: impl Into<String>) -> Self {
        let attr = attribute.into();
        Self {
            path: Some(block_path.to_string()),
            help: Some(format!("Add `{} = ...` to the block", attr)),
            ..Self::new(ErrorKind::MissingRequiredAttribute { attribute: attr })
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(
        block_path: &str,
        attribute: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        let attr = attribute.into();
        let expected = expected.into();
        Self {
            path: Some(join_path(block_path, &attr)),
            help: Some(format!("Ensure the value is {}", expected)),
            cause: Some(format!("Got: {}", got.into())),
            ..Self::new(ErrorKind::TypeMismatch {
                attribute: attr,
                expected,
            })
        }
    }

    /// Create an unsupported attribute error
    pub fn unsupported_attribute(block_path: &str, attribute: impl Into<String>) -> Self {
        let attr = attribute.into();
        Self {
            path: Some(join_path(block_path, &attr)),
            help: Some(format!("Remove `{}` or check for typos", attr)),
            ..Self::new(ErrorKind::UnsupportedAttribute { attribute: attr })
        }
    }

    /// Create an unsupported block error
    pub fn unsupported_block(block_path: &str, kind: impl Into<String>) -> Self {
        let k = kind.into();
        Self {
            path: Some(join_path(block_path, &k)),
            help: Some(format!("Blocks of type '{}' are not expected here", k)),
            ..Self::new(ErrorKind::UnsupportedBlock { kind: k })
        }
    }

    /// Create an invalid label count error
    pub fn invalid_labels(kind: impl Into<String>, found: usize) -> Self {
        let k = kind.into();
        Self {
            path: Some(k.clone()),
            help: Some(format!("Write the block as `{} \"name\" {{ ... }}`", k)),
            cause: Some(format!("Expected exactly one label, found {}", found)),
            ..Self::new(ErrorKind::InvalidLabels { kind: k })
        }
    }

    /// Create a missing singleton block error
    pub fn missing_block(kind: impl Into<String>) -> Self {
        let k = kind.into();
        Self {
            help: Some(format!(
                "Add exactly one `{} \"name\" {{ ... }}` block to a configuration file",
                k
            )),
            ..Self::new(ErrorKind::MissingBlock { kind: k })
        }
    }

    /// Create a duplicate declaration error
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        let k = kind.into();
        let n = name.into();
        Self {
            path: Some(join_path(&k, &n)),
            help: Some(format!(
                "Remove one of the '{}' declarations; datconf never picks one silently",
                n
            )),
            ..Self::new(ErrorKind::DuplicateDeclaration { kind: k, name: n })
        }
    }

    /// Create a component type already registered error
    pub fn already_registered(name: impl Into<String>) -> Self {
        let n = name.into();
        Self {
            help: Some(format!(
                "Use register_with_force(..., true) to override the '{}' component type",
                n
            )),
            ..Self::new(ErrorKind::AlreadyRegistered { name: n })
        }
    }

    /// Create a validation error
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        let p = path.into();
        Self {
            path: if p.is_empty() { None } else { Some(p) },
            help: Some("Fix the value to satisfy the block's constraints".into()),
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Validation)
        }
    }

    /// Create an I/O error
    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_location: Some(SourceLocation::file(path)),
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Io)
        }
    }

    /// Create an internal error (bug in datconf)
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            help: Some("This is likely a bug in datconf. Please report it.".into()),
            cause: Some(message.into()),
            ..Self::new(ErrorKind::Internal)
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add source location to the error
    pub fn with_source_location(mut self, loc: SourceLocation) -> Self {
        self.source_location = Some(loc);
        self
    }

    /// Attach the originating file unless a more precise location is already known
    pub fn in_file(mut self, file: &str) -> Self {
        if self.source_location.is_none() {
            self.source_location = Some(SourceLocation::file(file));
        }
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}.{}", parent, child)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Main error message
        match &self.kind {
            ErrorKind::Parse => write!(f, "Parse error")?,
            ErrorKind::Evaluation { variable } => match variable {
                Some(name) => write!(f, "Evaluation error: undefined variable '{}'", name)?,
                None => write!(f, "Evaluation error")?,
            },
            ErrorKind::UnknownComponentType { name } => {
                write!(f, "Unknown component type: {}", name)?
            }
            ErrorKind::MissingRequiredAttribute { attribute } => {
                write!(f, "Missing required attribute: {}", attribute)?
            }
            ErrorKind::TypeMismatch {
                attribute,
                expected,
            } => write!(f, "Type mismatch for '{}': expected {}", attribute, expected)?,
            ErrorKind::UnsupportedAttribute { attribute } => {
                write!(f, "Unsupported attribute: {}", attribute)?
            }
            ErrorKind::UnsupportedBlock { kind } => write!(f, "Unsupported block type: {}", kind)?,
            ErrorKind::InvalidLabels { kind } => {
                write!(f, "Invalid labels on '{}' block", kind)?
            }
            ErrorKind::MissingBlock { kind } => write!(f, "Missing '{}' block", kind)?,
            ErrorKind::DuplicateDeclaration { kind, name } => {
                write!(f, "Duplicate {} declaration: {}", kind, name)?
            }
            ErrorKind::AlreadyRegistered { name } => {
                write!(f, "Component type '{}' is already registered", name)?
            }
            ErrorKind::Validation => write!(f, "Validation error")?,
            ErrorKind::Io => write!(f, "I/O error")?,
            ErrorKind::Internal => write!(f, "Internal error")?,
        }

        // Path context
        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        // Source location
        if let Some(loc) = &self.source_location {
            write!(f, "\n  File: {}", loc.file)?;
            if let Some(line) = loc.line {
                write!(f, ":{}", line)?;
                if let Some(column) = loc.column {
                    write!(f, ":{}", column)?;
                }
            }
        }

        // Cause
        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        // Help
        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

/// An ordered set of diagnostics collected within one stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics(Vec<Error>);

impl Diagnostics {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: Error) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    /// Returns `value` when nothing was collected, otherwise the diagnostics
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, Diagnostics> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Tag every diagnostic with the file it came from
    pub fn in_file(self, file: &str) -> Self {
        self.0.into_iter().map(|e| e.in_file(file)).collect()
    }
}

impl From<Error> for Diagnostics {
    fn from(error: Error) -> Self {
        Self(vec![error])
    }
}

impl Extend<Error> for Diagnostics {
    fn extend<I: IntoIterator<Item = Error>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<Error> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Error>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

/// A value produced by a stage together with the diagnostics it collected
///
/// Stages that collect-all (the values loader, the variable resolver) return
/// whatever they managed to build alongside every problem they hit.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Outcome<T> {
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    pub fn ok(value: T) -> Self {
        Self::new(value, Diagnostics::new())
    }

    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn into_result(self) -> std::result::Result<T, Diagnostics> {
        self.diagnostics.into_result(self.value)
    }
}
