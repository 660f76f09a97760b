//! Utility macros for reducing boilerplate

/// Macro to declare a closed enum whose members carry both a script name and
/// an engine value.
///
/// Generates `ALL`, `name()`, `value()`, `from_name()`, `from_value()`,
/// `Display` and `FromStr` (via [`crate::UnknownMember`]).
///
/// # Example
/// ```ignore
/// named_enum! {
///     /// How an assigner picks its target.
///     pub enum AssignLocality: u8 {
///         Nearby = "NEARBY" => 0,
///         Local = "LOCAL" => 1,
///     }
/// }
/// ```
#[macro_export]
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $repr:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $text:literal => $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every member in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Name used in AgentLab source.
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }

            /// Value stored in bytecode.
            pub fn value(self) -> $repr {
                match self {
                    $( $name::$variant => $value ),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $text => Some($name::$variant), )+
                    _ => None,
                }
            }

            pub fn from_value(value: $repr) -> Option<Self> {
                Self::ALL.iter().copied().find(|member| member.value() == value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::UnknownMember;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_name(s).ok_or_else(|| $crate::UnknownMember {
                    enum_name: stringify!($name),
                    member: s.to_string(),
                })
            }
        }
    };
}
