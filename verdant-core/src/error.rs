//! Render errors.

use thiserror::Error;

/// Errors surfaced by mounting and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A component reached mount without a render function.
    #[error("component `{component}` has no render function")]
    MissingRender { component: String },

    /// `App::mount` was called on an application that is already mounted.
    #[error("application is already mounted")]
    AlreadyMounted,
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
