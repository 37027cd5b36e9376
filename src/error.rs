use thiserror::Error;

use crate::metadata::token::TypeToken;

macro_rules! synthesis_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::SynthesisFailed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::SynthesisFailed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while registering type
/// descriptors and while synthesizing or running the per-type derivations (mutability,
/// cycles, deep copy, structural equality). Each variant provides specific context about
/// the failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## Registry Errors
/// - [`Error::TypeInsert`] - Failed to register a new descriptor in the type registry
/// - [`Error::TypeNotFound`] - A descriptor reference could not be resolved
///
/// ## Derivation Errors
/// - [`Error::NoBindableConstructor`] - Deep-copy synthesis cannot satisfy read-only fields
/// - [`Error::AmbiguousConstructor`] - Two constructors bind the same read-only field set
/// - [`Error::DispatchMissing`] - No specialization exists for a runtime type
/// - [`Error::SynthesisFailed`] - General derivation failure with source context
///
/// ## Walker Errors
/// - [`Error::TypeMismatch`] - A value's runtime type is not assignable to the
///   requested static type
///
/// # Examples
///
/// ```rust,no_run
/// use structwalk::{Engine, Error, Value};
///
/// # fn demo(engine: &Engine, token: structwalk::TypeToken, value: &Value) {
/// match engine.copy(token, value) {
///     Ok(copy) => {
///         // use the copy
///     }
///     Err(Error::NoBindableConstructor { type_name, fields }) => {
///         eprintln!("cannot copy {type_name}: unsatisfied fields {fields}");
///     }
///     Err(e) => {
///         eprintln!("derivation error: {e}");
///     }
/// }
/// # }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to insert a new descriptor into the [`crate::TypeRegistry`].
    ///
    /// This error occurs when registering a descriptor whose token is already
    /// occupied, typically when a client re-registers a type under a reserved
    /// or previously allocated token.
    ///
    /// The associated [`TypeToken`] identifies which descriptor caused the failure.
    #[error("Failed to insert new descriptor into TypeRegistry - {0}")]
    TypeInsert(TypeToken),

    /// Failed to find a descriptor in the [`crate::TypeRegistry`].
    ///
    /// This error occurs when a field type, base type, element type, or generic
    /// argument references a token that was never registered. Registration-time
    /// validation reports it early so derivations can rely on closed graphs.
    ///
    /// The associated [`TypeToken`] identifies which reference was dangling.
    #[error("Failed to find descriptor in TypeRegistry - {0}")]
    TypeNotFound(TypeToken),

    /// Deep-copy synthesis cannot satisfy the read-only fields from the
    /// constructor set.
    ///
    /// Synthesis for a type with init-only fields (or without a no-argument
    /// constructor) must find one declared constructor that absorbs every
    /// read-only initializer. If none binds, this error names the type and the
    /// unsatisfied field set. The cache slot is left empty, so a subsequent
    /// [`crate::Engine::override_copier`] may still populate it.
    #[error("No constructor of '{type_name}' can bind read-only fields [{fields}]")]
    NoBindableConstructor {
        /// Full name of the type whose synthesis failed
        type_name: String,
        /// Comma-separated normalized names of the unsatisfied fields
        fields: String,
    },

    /// More than one constructor binds the read-only field set.
    ///
    /// Constructor selection is deterministic and fails fast on ambiguity
    /// instead of silently picking a candidate that may only partially
    /// initialize the copy.
    #[error("Multiple constructors of '{type_name}' bind the same read-only field set")]
    AmbiguousConstructor {
        /// Full name of the type whose synthesis was ambiguous
        type_name: String,
    },

    /// No specialization could be synthesized for a runtime type.
    ///
    /// This error occurs when an instance-level operation receives a value
    /// whose concrete runtime type has no descriptor in the registry, so a
    /// downcast-and-dispatch thunk cannot be built for it.
    #[error("No dispatch specialization available for runtime type '{type_name}'")]
    DispatchMissing {
        /// Name of the runtime type that could not be dispatched
        type_name: String,
    },

    /// A value's runtime type is not assignable to the requested static type.
    ///
    /// Walkers verify that the instance they are handed belongs to the type
    /// graph they were synthesized for before recursing into its fields.
    #[error("Value of runtime type '{found}' is not assignable to '{expected}'")]
    TypeMismatch {
        /// Full name of the requested static type
        expected: String,
        /// Full name of the value's runtime type
        found: String,
    },

    /// A derivation failed for a reason outside the dedicated categories.
    ///
    /// The error includes the source location where the failure was detected
    /// for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what failed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Synthesis failed - {file}:{line}: {message}")]
    SynthesisFailed {
        /// The message to be printed for the synthesis failure
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}
