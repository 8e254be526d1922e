/// Declares a newtype over [`Felt252`](crate::felt::Felt252) whose values must stay below an
/// exclusive upper bound.
///
/// The generated type shares the representation of `Felt252` but is a distinct type, so the
/// compiler rejects passing e.g. a class hash where a contract address is expected.
macro_rules! bounded_felt {
    (
        $(#[$meta:meta])*
        $name:ident, bound = $bound:expr, display = $display:literal
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name($crate::felt::Felt252);

        impl $name {
            pub const ZERO: Self = Self($crate::felt::Felt252::ZERO);

            /// Exclusive upper bound of the value.
            pub const BOUND: $crate::felt::Felt252 = $bound;

            /// Wraps a field element, failing if it is not below [`Self::BOUND`].
            pub fn new(
                felt: $crate::felt::Felt252,
            ) -> ::core::result::Result<Self, $crate::error::PrimitiveError> {
                if felt >= Self::BOUND {
                    return Err($crate::error::PrimitiveError::Range(format!(
                        "{} {} must be less than {:#x}",
                        $display,
                        felt.to_hex_stripped(),
                        Self::BOUND
                    )));
                }
                Ok(Self(felt))
            }

            /// Whether the field element is a valid value of this type.
            pub fn is_valid(felt: &$crate::felt::Felt252) -> bool {
                *felt < Self::BOUND
            }

            #[doc(hidden)]
            pub const fn from_raw(bytes: [u8; $crate::felt::FELT_BYTES]) -> Self {
                Self($crate::felt::Felt252::from_raw(bytes))
            }

            pub fn from_hex(s: &str) -> ::core::result::Result<Self, $crate::error::PrimitiveError> {
                Self::new($crate::felt::Felt252::from_hex(s)?)
            }

            pub const fn felt(&self) -> $crate::felt::Felt252 {
                self.0
            }

            pub fn to_hex(&self) -> String {
                self.0.to_hex()
            }

            pub fn to_biguint(&self) -> ::num_bigint::BigUint {
                self.0.to_biguint()
            }
        }

        impl TryFrom<$crate::felt::Felt252> for $name {
            type Error = $crate::error::PrimitiveError;

            fn try_from(felt: $crate::felt::Felt252) -> ::core::result::Result<Self, Self::Error> {
                Self::new(felt)
            }
        }

        impl From<$name> for $crate::felt::Felt252 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl ::core::ops::Deref for $name {
            type Target = $crate::felt::Felt252;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::error::PrimitiveError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::new(s.parse()?)
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_tuple(stringify!($name))
                    .field(&format_args!("{}", self.0.to_hex_stripped()))
                    .finish()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::fmt::LowerHex for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::LowerHex::fmt(&self.0, f)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::core::result::Result<S::Ok, S::Error> {
                ::serde::Serialize::serialize(&self.0, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::core::result::Result<Self, D::Error> {
                let felt =
                    <$crate::felt::Felt252 as ::serde::Deserialize<'de>>::deserialize(deserializer)?;
                Self::new(felt).map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use bounded_felt;
