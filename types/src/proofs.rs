//! Proof types for validated content.
//!
//! These types enforce invariants at construction time. Once you hold a value,
//! you know it satisfies all required constraints.

/// A `'static` string literal that is known to be non-empty. Validated at
/// compile time via `const` assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NonEmptyStaticStr(&'static str);

impl NonEmptyStaticStr {
    #[must_use]
    pub const fn new(value: &'static str) -> Self {
        assert!(!value.is_empty(), "NonEmptyStaticStr must not be empty");
        Self(value)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl AsRef<str> for NonEmptyStaticStr {
    fn as_ref(&self) -> &str {
        self.0
    }
}
