/// Give a closed, fieldless enum a fixed text label per variant.
///
/// Generates `COUNT`, `ALL` (variants in declaration order), `as_str`,
/// a case-insensitive `from_label`, `Display`, `From<T> for String`, and
/// `TryFrom<String> for T` (exact match, unknown labels are an error).
/// Add `#[serde(into = "String", try_from = "String")]` to the enum to
/// serialize it by label.
macro_rules! labeled_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub const COUNT: usize = [$(stringify!($variant)),+].len();

            pub const ALL: [$name; Self::COUNT] = [$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Match a label ignoring case and surrounding whitespace.
            pub fn from_label(raw: &str) -> Option<Self> {
                let raw = raw.trim();
                Self::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(raw))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                v.as_str().to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                match s.as_str() {
                    $($label => Ok($name::$variant),)+
                    other => Err(format!("unknown {} label: {other}", stringify!($name))),
                }
            }
        }
    };
}
