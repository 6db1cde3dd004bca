//! The [`declario!`] macro.

/// Declare a struct whose fields are saved and loaded as one archive.
///
/// Implements [`Declared`](crate::Declared) from the field list, in field
/// order, and adds inherent `declario()`, `declare()`, `save()`, `load()` and
/// `from_file()` methods. Explicit codecs go in an optional `codecs` block;
/// every other field gets an inferred codec.
///
/// Every `codecs` key must name a field; an unknown key fails the build:
///
/// ```compile_fail
/// use classio::codec::TextCodec;
///
/// classio::declario! {
///     struct Misconfigured {
///         documentation: String,
///     }
///     codecs {
///         "nonexistent" => TextCodec,
///     }
/// }
///
/// fn main() {}
/// ```
///
/// The same declaration with a known key compiles:
///
/// ```
/// use classio::codec::TextCodec;
///
/// classio::declario! {
///     struct Configured {
///         documentation: String,
///     }
///     codecs {
///         "documentation" => TextCodec,
///     }
/// }
///
/// fn main() {
///     assert!(Configured::declare().is_ok());
/// }
/// ```
///
/// The remaining checks (codec protocol, inference) run once per type, on
/// first use. Call `declare()` to surface them up front.
///
/// ```ignore
/// use std::collections::BTreeMap;
/// use classio::codec::YamlCodec;
/// use classio::{declario, Frame};
///
/// declario! {
///     #[derive(Debug, Clone)]
///     pub struct Experiment {
///         pub documentation: String,
///         pub config: BTreeMap<String, String>,
///         pub df: Frame,
///     }
///     codecs {
///         "config" => YamlCodec,
///     }
/// }
///
/// Experiment::declare()?;
/// experiment.save("experiment.cpack")?;
/// let loaded = Experiment::load("experiment.cpack")?;
/// ```
#[macro_export]
macro_rules! declario {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
        $(
            codecs {
                $( $key:literal => $codec:expr ),* $(,)?
            }
        )?
    ) => {
        const _: () = {
            #[allow(dead_code)]
            const FIELDS: &[&str] = &[ $( ::std::stringify!($field) ),* ];
            $($(
                ::std::assert!(
                    $crate::macros::names_a_field($key, FIELDS),
                    "declario! codecs key does not name a field of the struct"
                );
            )*)?
        };

        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field : $ty,
            )*
        }

        impl $crate::Declared for $name {
            fn attributes() -> ::std::vec::Vec<$crate::Attribute> {
                ::std::vec![ $( $crate::Attribute::of::<$ty>(::std::stringify!($field)) ),* ]
            }

            #[allow(unused_mut)]
            fn to_record(&self) -> $crate::Result<$crate::Record> {
                let mut record = $crate::Record::new();
                $( record.set(::std::stringify!($field), &self.$field)?; )*
                ::std::result::Result::Ok(record)
            }

            #[allow(unused_mut, unused_variables)]
            fn from_record(mut record: $crate::Record) -> $crate::Result<Self> {
                ::std::result::Result::Ok(Self {
                    $( $field: record.take::<$ty>(::std::stringify!($field))?, )*
                })
            }
        }

        #[allow(dead_code)]
        impl $name {
            /// Explicit codecs declared for this type.
            pub fn declario() -> $crate::Declario {
                #[allow(unused_mut)]
                let mut declario = $crate::Declario::new();
                $($( declario = declario.with_codec($key, $codec); )*)?
                declario
            }

            /// Decorate this type once and return its archive IO.
            pub fn declare() -> ::std::result::Result<&'static $crate::IoClass<$name>, $crate::DeclarationError> {
                static IO: ::std::sync::OnceLock<
                    ::std::result::Result<$crate::IoClass<$name>, $crate::DeclarationError>,
                > = ::std::sync::OnceLock::new();
                IO.get_or_init(|| $name::declario().decorate::<$name>())
                    .as_ref()
                    .map_err(::std::clone::Clone::clone)
            }

            /// Save to `path`, one archive entry per field.
            pub fn save(&self, path: impl ::std::convert::AsRef<::std::path::Path>) -> $crate::Result<()> {
                $name::declare()?.save(self, path)
            }

            /// Load from `path`.
            pub fn load(path: impl ::std::convert::AsRef<::std::path::Path>) -> $crate::Result<$name> {
                $name::declare()?.load(path)
            }

            /// Alias of `load`.
            pub fn from_file(path: impl ::std::convert::AsRef<::std::path::Path>) -> $crate::Result<$name> {
                $name::load(path)
            }
        }
    };
}

/// Whether `key` is one of `fields`. Used by [`declario!`] at compile time.
#[doc(hidden)]
pub const fn names_a_field(key: &str, fields: &[&str]) -> bool {
    let mut i = 0;
    while i < fields.len() {
        if str_eq(key, fields[i]) {
            return true;
        }
        i += 1;
    }
    false
}

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}
