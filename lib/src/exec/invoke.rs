use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use derive_more::{Deref, From};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::value::{Dict, Num, Value};

/// An object whose members templates can look up and invoke by name.
///
/// `arg` is the pipeline value computed so far, or `None` when the member is
/// the first term of its action.
///
/// Implementations should fail with [`NotFound`](crate::error::ErrorKind)
/// when there is no member `name`, with `Arity` when the member can't take
/// (or requires) `arg`, and with `Type` when `arg` has the wrong type.
pub trait Invocable {
    fn invoke(&self, name: &str, arg: Option<Value>) -> Result<Value>;

    /// Returns `true` if there is a member `name`.
    fn has_member(&self, name: &str) -> bool;
}

pub(crate) fn not_found(name: &str) -> Error {
    error!(NotFound: "no such member", "member" => name)
}

/// Dictionary entries are nullary members.
impl Invocable for Dict {
    fn invoke(&self, name: &str, arg: Option<Value>) -> Result<Value> {
        let value = self.get(name).ok_or_else(|| not_found(name))?;
        if let Some(arg) = arg {
            return err! {
                Arity: "dictionary member takes no arguments",
                "member" => name,
                "argument" => arg.kind(),
            };
        }

        Ok(value.clone())
    }

    fn has_member(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl Invocable for Value {
    fn invoke(&self, name: &str, arg: Option<Value>) -> Result<Value> {
        match self {
            Value::Dict(dict) => dict.invoke(name, arg),
            value => err! {
                NotFound: "value has no members",
                "member" => name,
                "value" => value.kind(),
            },
        }
    }

    fn has_member(&self, name: &str) -> bool {
        matches!(self, Value::Dict(dict) if dict.contains_key(name))
    }
}

/// Looks in `self.0` first and falls back to `self.1` if `self.0` has no
/// member `name`.
impl<A: Invocable, B: Invocable> Invocable for (A, B) {
    fn invoke(&self, name: &str, arg: Option<Value>) -> Result<Value> {
        match self.0.has_member(name) {
            true => self.0.invoke(name, arg),
            false => self.1.invoke(name, arg),
        }
    }

    fn has_member(&self, name: &str) -> bool {
        self.0.has_member(name) || self.1.has_member(name)
    }
}

impl<T: Invocable + ?Sized> Invocable for &T {
    fn invoke(&self, name: &str, arg: Option<Value>) -> Result<Value> {
        (**self).invoke(name, arg)
    }

    fn has_member(&self, name: &str) -> bool {
        (**self).has_member(name)
    }
}

impl<T: Invocable + ?Sized> Invocable for Arc<T> {
    fn invoke(&self, name: &str, arg: Option<Value>) -> Result<Value> {
        (**self).invoke(name, arg)
    }

    fn has_member(&self, name: &str) -> bool {
        (**self).has_member(name)
    }
}

impl<T: Invocable + ?Sized> Invocable for Box<T> {
    fn invoke(&self, name: &str, arg: Option<Value>) -> Result<Value> {
        (**self).invoke(name, arg)
    }

    fn has_member(&self, name: &str) -> bool {
        (**self).has_member(name)
    }
}

type Member = Box<dyn Fn(Option<Value>) -> Result<Value> + Send + Sync>;

/// A registry of named Rust functions, invocable from templates.
///
/// ```rust
/// use quill::exec::{Invocable, Methods};
/// use quill::value::Value;
///
/// let methods = Methods::new()
///     .with("Name", || "Ferris")
///     .with("Upper", |s: String| s.to_uppercase())
///     .with("Twice", |n: i64| n * 2);
///
/// assert_eq!(methods.invoke("Name", None).unwrap(), Value::from("Ferris"));
/// assert_eq!(methods.invoke("Upper", Some("hi".into())).unwrap(), Value::from("HI"));
/// assert_eq!(methods.invoke("Twice", Some(21.into())).unwrap(), Value::from(42));
/// ```
#[derive(Default)]
pub struct Methods {
    members: FxHashMap<Arc<str>, Member>,
}

impl Methods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `function` as the member `name`, replacing any existing
    /// member of the same name.
    pub fn register<N, F, Args>(&mut self, name: N, function: F) -> &mut Self
        where N: Into<Arc<str>>, F: Function<Args>, Args: 'static
    {
        let member: Member = Box::new(move |arg| function.call(arg));
        self.members.insert(name.into(), member);
        self
    }

    pub fn with<N, F, Args>(mut self, name: N, function: F) -> Self
        where N: Into<Arc<str>>, F: Function<Args>, Args: 'static
    {
        self.register(name, function);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(|name| &**name)
    }
}

impl fmt::Debug for Methods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Methods").field("members", &names).finish()
    }
}

impl Invocable for Methods {
    fn invoke(&self, name: &str, arg: Option<Value>) -> Result<Value> {
        let member = self.members.get(name).ok_or_else(|| not_found(name))?;
        member(arg)
    }

    fn has_member(&self, name: &str) -> bool {
        self.contains(name)
    }
}

/// A Rust function taking zero or one argument that can be registered in
/// [`Methods`]. `Args` is `()` or `(A,)` and only serves to tell the two
/// apart.
pub trait Function<Args>: Send + Sync + 'static {
    fn call(&self, arg: Option<Value>) -> Result<Value>;
}

impl<F, R> Function<()> for F
    where F: Fn() -> R + Send + Sync + 'static, R: IntoOutput
{
    fn call(&self, arg: Option<Value>) -> Result<Value> {
        if let Some(arg) = arg {
            return err!(Arity: "member takes no arguments", "argument" => arg.kind());
        }

        self().into_output()
    }
}

impl<F, A, R> Function<(A,)> for F
    where F: Fn(A) -> R + Send + Sync + 'static, A: ArgType, R: IntoOutput
{
    fn call(&self, arg: Option<Value>) -> Result<Value> {
        self(A::from_arg(arg)?).into_output()
    }
}

/// A parameter type: how a pipeline value, or its absence, becomes an
/// argument.
pub trait ArgType: Sized {
    fn from_arg(arg: Option<Value>) -> Result<Self>;
}

fn missing(expected: &str) -> Error {
    error!(Arity: "member requires an argument", "expected" => expected)
}

impl ArgType for Value {
    fn from_arg(arg: Option<Value>) -> Result<Self> {
        arg.ok_or_else(|| missing("a value"))
    }
}

macro_rules! impl_arg_type {
    ($($T:ty),* $(,)?) => ($(
        impl ArgType for $T {
            fn from_arg(arg: Option<Value>) -> Result<Self> {
                let value = arg.ok_or_else(|| missing(stringify!($T)))?;
                <$T>::try_from(value).map_err(|value| error! {
                    Type: "argument has the wrong type",
                    "expected" => stringify!($T),
                    "found" => value.kind(),
                })
            }
        }
    )*)
}

impl_arg_type! {
    bool, String, Arc<str>, Num, f64, Arc<Dict>, Arc<Vec<Value>>,
    u8, u16, u32, u64, usize, i8, i16, i32, i64, isize,
}

/// Accepts a missing or null pipeline value as `None`.
impl<T: ArgType> ArgType for Option<T> {
    fn from_arg(arg: Option<Value>) -> Result<Self> {
        match arg {
            None | Some(Value::Null) => Ok(None),
            arg => T::from_arg(arg).map(Some),
        }
    }
}

/// A variadic parameter: every remaining argument, converted to `T`.
///
/// A pipeline passes at most one value, so a `Rest` holds zero or one
/// element.
#[derive(Debug, Clone, PartialEq, Deref, From)]
pub struct Rest<T>(pub Vec<T>);

impl<T: ArgType> ArgType for Rest<T> {
    fn from_arg(arg: Option<Value>) -> Result<Self> {
        match arg {
            Some(arg) => Ok(Rest(vec![T::from_arg(Some(arg))?])),
            None => Ok(Rest(vec![])),
        }
    }
}

/// A return type: how a function's result becomes a pipeline value.
pub trait IntoOutput {
    fn into_output(self) -> Result<Value>;
}

macro_rules! impl_into_output {
    ($($T:ty),* $(,)?) => ($(
        impl IntoOutput for $T {
            #[inline]
            fn into_output(self) -> Result<Value> {
                Ok(Value::from(self))
            }
        }
    )*)
}

impl_into_output! {
    Value, (), bool, &'static str, String, Arc<str>, Cow<'static, str>, Num,
    Dict, Arc<Dict>, Vec<Value>, Arc<Vec<Value>>, f32, f64,
    u8, u16, u32, u64, usize, i8, i16, i32, i64, isize,
}

impl<T: IntoOutput> IntoOutput for Option<T> {
    fn into_output(self) -> Result<Value> {
        self.map_or(Ok(Value::Null), T::into_output)
    }
}

impl<T: IntoOutput, E: Into<Error>> IntoOutput for Result<T, E> {
    fn into_output(self) -> Result<Value> {
        self.map_err(Into::into)?.into_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn methods() -> Methods {
        Methods::new()
            .with("Zero", || 0)
            .with("Len", |s: String| s.len())
            .with("OrDefault", |s: Option<String>| s.unwrap_or_else(|| "default".into()))
            .with("Count", |rest: Rest<Value>| rest.len())
            .with("Fails", |_: Value| -> Result<Value> { err!("on purpose") })
            .with("Ident", |v: Value| v)
    }

    #[test]
    fn calls_with_and_without_arguments() {
        let methods = methods();
        assert_eq!(methods.invoke("Zero", None).unwrap(), Value::from(0));
        assert_eq!(methods.invoke("Len", Some("four".into())).unwrap(), Value::from(4usize));
        assert_eq!(methods.invoke("Ident", Some(Value::Null)).unwrap(), Value::Null);
    }

    #[test]
    fn dispatch_errors_are_distinct() {
        let methods = methods();
        assert_eq!(methods.invoke("Nope", None).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(methods.invoke("Zero", Some(1.into())).unwrap_err().kind(), ErrorKind::Arity);
        assert_eq!(methods.invoke("Len", None).unwrap_err().kind(), ErrorKind::Arity);
        assert_eq!(methods.invoke("Len", Some(1.into())).unwrap_err().kind(), ErrorKind::Type);
        assert_eq!(methods.invoke("Fails", Some(1.into())).unwrap_err().kind(), ErrorKind::Other);
    }

    #[test]
    fn optional_and_variadic_parameters() {
        let methods = methods();
        assert_eq!(methods.invoke("OrDefault", None).unwrap(), Value::from("default"));
        assert_eq!(methods.invoke("OrDefault", Some(Value::Null)).unwrap(), Value::from("default"));
        assert_eq!(methods.invoke("OrDefault", Some("x".into())).unwrap(), Value::from("x"));
        assert_eq!(methods.invoke("OrDefault", Some(true.into())).unwrap_err().kind(), ErrorKind::Type);

        assert_eq!(methods.invoke("Count", None).unwrap(), Value::from(0usize));
        assert_eq!(methods.invoke("Count", Some(Value::Null)).unwrap(), Value::from(1usize));
    }

    #[test]
    fn dict_members_are_nullary() {
        let dict: Dict = [(Arc::from("Title"), Value::from("Home"))].into_iter().collect();
        assert_eq!(dict.invoke("Title", None).unwrap(), Value::from("Home"));
        assert_eq!(dict.invoke("Title", Some(1.into())).unwrap_err().kind(), ErrorKind::Arity);
        assert_eq!(dict.invoke("Body", None).unwrap_err().kind(), ErrorKind::NotFound);

        let value = Value::from(dict);
        assert_eq!(value.invoke("Title", None).unwrap(), Value::from("Home"));
        assert_eq!(Value::from(3).invoke("Title", None).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn pairs_fall_back_on_not_found() {
        let dict: Dict = [(Arc::from("Zero"), Value::from("shadowed"))].into_iter().collect();
        let layered = (methods(), dict);
        assert_eq!(layered.invoke("Zero", None).unwrap(), Value::from(0));

        let dict: Dict = [(Arc::from("Title"), Value::from("Home"))].into_iter().collect();
        let layered = (methods(), &dict);
        assert_eq!(layered.invoke("Title", None).unwrap(), Value::from("Home"));
        assert_eq!(layered.invoke("Len", None).unwrap_err().kind(), ErrorKind::Arity);
        assert!(layered.has_member("Title") && layered.has_member("Zero"));
        assert!(!layered.has_member("Body"));
    }

    #[test]
    fn pairs_do_not_mask_failing_members() {
        let inner = Methods::new();
        let data = Methods::new().with("Page", move || inner.invoke("Missing", None));
        let globals: Dict = [(Arc::from("Page"), Value::from("global"))].into_iter().collect();

        let error = (data, globals).invoke("Page", None).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(error.to_string().contains("Missing"));
    }
}
