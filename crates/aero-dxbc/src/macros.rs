/// Declares a fieldless enum backed by a raw integer, with an `Unknown(raw)`
/// catch-all variant so decoding never loses information.
macro_rules! raw_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $repr:ty {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal,
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )*
            /// A raw value this crate does not recognize.
            Unknown($repr),
        }

        impl $name {
            /// Converts a raw encoded value into the enum.
            pub const fn from_raw(raw: $repr) -> Self {
                match raw {
                    $($value => Self::$variant,)*
                    other => Self::Unknown(other),
                }
            }

            /// Returns the raw encoded value.
            pub const fn raw(self) -> $repr {
                match self {
                    $(Self::$variant => $value,)*
                    Self::Unknown(raw) => raw,
                }
            }
        }
    };
}
