// SPDX-License-Identifier: MIT

//! Small declarative macros shared across the workspace.

/// Implement `Display` for a fieldless enum from a list of variant -> literal
/// mappings.
#[macro_export]
macro_rules! simple_display {
    ($ty:ty { $($variant:ident => $text:expr),+ $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let s = match self {
                    $(<$ty>::$variant => $text,)+
                };
                f.write_str(s)
            }
        }
    };
}

/// Generate `with_x`-style setter methods that consume and return `Self`,
/// for production builder/config structs.
#[macro_export]
macro_rules! setters {
    ($ty:ty { $($field:ident: $fty:ty),+ $(,)? }) => {
        impl $ty {
            $(
                pub fn $field(mut self, value: $fty) -> Self {
                    self.$field = value;
                    self
                }
            )+
        }
    };
}