/// The executor.
///
/// Walks intermediate programs, resolves operands, calls functions, and
/// drives host event loops and frame loops.
pub mod core;

/// Variable storage with call frames.
pub mod store;

/// The function registry and the native calling convention.
pub mod registry;

/// The boundary to the collaborator that owns windows, widgets and output.
///
/// # Responsibilities
/// - Hands `ui`/`gfx` commands over untouched, with read access to variables.
/// - Defines replies for read forms and event loops.
/// - Resolves callback tokens late, against the variables of the moment.
pub mod host;

/// A host without a display, for the command line and for tests.
pub mod headless;

/// Native libraries: the core output functions and the `use` modules.
pub mod library;
