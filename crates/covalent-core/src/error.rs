use thiserror::Error;

/// Engine failures. All of them are programming errors in the embedding
/// application; the panicking entry points use the `Display` text of the
/// variant as the panic message.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A positional hook ran with no active scope, i.e. outside of any
    /// function wrapped by `create_common_hook`.
    #[error("no active scope for {hook}; the enclosing hook must be wrapped by create_common_hook")]
    MissingScope { hook: &'static str },
}
