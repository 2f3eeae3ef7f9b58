use serde::de::DeserializeOwned;

use crate::error::{ErrorDetail, Result, Chainable};
use crate::value::Source;

/// A data format template data and settings can be read from.
pub trait Format: Sized {
    /// The data format's error type.
    type Error: serde::de::Error + ErrorDetail + 'static;

    /// Parses `string` as the data format `Self` as a `T` or returns an error
    /// if the `string` is an invalid `T`. **_Note:_** This method is _not_
    /// intended to be called directly. Instead, it is intended to be
    /// _implemented_ and then used indirectly via [`Format::read()`].
    fn from_str<T: DeserializeOwned>(string: &str) -> Result<T, Self::Error>;

    fn read<I: Source, T: DeserializeOwned>(input: I) -> Result<T> {
        let path = input.path().map(|p| p.display().to_string());
        let input = input.read_str()?;
        Self::from_str(&input).chain_with(|| error! {
            "failed to deserialize data",
            "format" => std::any::type_name::<Self>().rsplit("::").next().unwrap_or("?"),
            "source" => path.unwrap_or_else(|| "<string>".into()),
        })
    }
}

macro_rules! impl_format {
    ($name:ident : $func:expr, $E:ty) => (
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Format for $name {
            type Error = $E;

            fn from_str<T: DeserializeOwned>(s: &str) -> Result<T, $E> {
                $func(s)
            }
        }
    );
}

impl_format!(Toml: toml::from_str, toml::de::Error);
impl_format!(Json: serde_json::from_str, serde_json::error::Error);
