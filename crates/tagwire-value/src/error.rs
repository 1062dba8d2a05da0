use crate::variant::VariantType;

/// Errors raised by strict `Variant` accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// The accessor asked for a payload the variant does not carry.
    #[error("type mismatch (expected {expected}, found {found})")]
    TypeMismatch {
        expected: VariantType,
        found: VariantType,
    },
}

pub type Result<T> = std::result::Result<T, ValueError>;
