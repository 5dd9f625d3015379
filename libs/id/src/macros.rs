//! Macros for defining typed ID types.

/// Macro to define a typed numeric ID with a specific label prefix.
///
/// This generates a newtype wrapper around `i64` with:
/// - A `PREFIX` constant used in labels and parse errors
/// - `new()` to wrap a store-assigned value (must be positive)
/// - `parse()` accepting `12` or `{prefix}_12`
/// - `Display` (bare number) and `FromStr` implementations
/// - `Serialize` and `Deserialize` as plain JSON integers
/// - `Ord`, `Hash`, and other standard traits
///
/// # Example
///
/// ```ignore
/// define_id!(StaffId, "staff");
///
/// let id = StaffId::new(7)?;
/// let parsed: StaffId = "staff_7".parse()?;
/// assert_eq!(id, parsed);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        /// A typed ID for this resource type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            /// The prefix for this ID type.
            pub const PREFIX: &'static str = $prefix;

            /// Wraps a store-assigned value.
            pub fn new(value: i64) -> Result<Self, $crate::IdError> {
                if value <= 0 {
                    return Err($crate::IdError::NotPositive(value));
                }
                Ok(Self(value))
            }

            /// Returns the underlying integer.
            #[must_use]
            pub const fn value(&self) -> i64 {
                self.0
            }

            /// Returns the prefixed label, e.g. `staff_12`.
            #[must_use]
            pub fn label(&self) -> String {
                format!("{}_{}", Self::PREFIX, self.0)
            }

            /// Parses an ID from a string.
            ///
            /// Accepts the bare number or `{prefix}_{number}`.
            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                let s = s.trim();
                if s.is_empty() {
                    return Err($crate::IdError::Empty);
                }

                let digits = match s.split_once('_') {
                    Some((prefix, rest)) => {
                        if prefix != Self::PREFIX {
                            return Err($crate::IdError::InvalidPrefix {
                                expected: Self::PREFIX,
                                actual: prefix.to_string(),
                            });
                        }
                        rest
                    }
                    None => s,
                };

                let value = digits
                    .parse::<i64>()
                    .map_err(|e| $crate::IdError::InvalidNumber(e.to_string()))?;

                Self::new(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = $crate::IdError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_i64(self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = i64::deserialize(deserializer)?;
                Self::new(value).map_err(serde::de::Error::custom)
            }
        }
    };
}
