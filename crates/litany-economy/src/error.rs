//! Error types for the litany-economy crate.
//!
//! These are contract violations, not gameplay outcomes. A player asking for
//! something they cannot have is a [`Rejection`](litany_types::Rejection);
//! a malformed recipe table or a non-finite amount is an [`EconomyError`].

/// Errors raised when economy data breaks its invariants.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    /// A recipe definition is malformed.
    #[error("invalid recipe {recipe}: {reason}")]
    InvalidRecipe {
        /// The offending recipe.
        recipe: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two recipes share a name.
    #[error("duplicate recipe name: {0}")]
    DuplicateRecipe(String),

    /// A recipe name was not found in the book.
    #[error("recipe not found: {0}")]
    UnknownRecipe(String),

    /// A numeric value was negative, NaN or infinite where that is not allowed.
    #[error("invalid amount in {context}: {value}")]
    InvalidAmount {
        /// What was being set.
        context: String,
        /// The rejected value.
        value: f64,
    },
}
