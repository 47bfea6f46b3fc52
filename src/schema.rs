//! Helpers for validating configuration values.
//!
//! [`supports_float`] and [`supports_int`] test whether a value can be read as a number,
//! [`DefaultValue`] supplies a value in place of a missing one and [`Formatter`] builds error
//! messages from a template.

use std::{
    any::type_name,
    fmt,
    sync::{Arc, LazyLock},
};

use regex::{Captures, Regex};
use tracing::warn;

/// A value that may be interpreted as a number.
pub trait NumberLike {
    /// The value as a float, if it has one.
    fn as_float(&self) -> Option<f64>;

    /// Whether the value is an integer, or a float with an exact integer value.
    fn is_int(&self) -> bool;
}

/// Removes `_` digit separators, rejecting separators that are not between two digits.
fn strip_separators(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    for (i, byte) in bytes.iter().enumerate() {
        if *byte == b'_' {
            let before = i.checked_sub(1).and_then(|j| bytes.get(j));
            let after = bytes.get(i + 1);
            if !before.is_some_and(u8::is_ascii_digit) || !after.is_some_and(u8::is_ascii_digit)
            {
                return None;
            }
        }
    }
    Some(text.replace('_', ""))
}

impl NumberLike for str {
    fn as_float(&self) -> Option<f64> {
        strip_separators(self.trim())?.parse().ok()
    }

    fn is_int(&self) -> bool {
        let Some(text) = strip_separators(self.trim()) else {
            return false;
        };
        let digits = text.strip_prefix(['+', '-']).unwrap_or(&text);
        !digits.is_empty()
            && digits.bytes().all(|byte| byte.is_ascii_digit())
            && text.parse::<f64>().is_ok_and(f64::is_finite)
    }
}

impl NumberLike for String {
    fn as_float(&self) -> Option<f64> {
        self.as_str().as_float()
    }

    fn is_int(&self) -> bool {
        self.as_str().is_int()
    }
}

impl NumberLike for f64 {
    fn as_float(&self) -> Option<f64> {
        Some(*self)
    }

    fn is_int(&self) -> bool {
        self.is_finite() && self.fract() == 0.0
    }
}

impl NumberLike for f32 {
    fn as_float(&self) -> Option<f64> {
        Some(f64::from(*self))
    }

    fn is_int(&self) -> bool {
        f64::from(*self).is_int()
    }
}

impl NumberLike for bool {
    fn as_float(&self) -> Option<f64> {
        Some(f64::from(u8::from(*self)))
    }

    fn is_int(&self) -> bool {
        true
    }
}

macro_rules! impl_number_like_int {
    ($($ty:ty),*) => {
        $(
            impl NumberLike for $ty {
                #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
                fn as_float(&self) -> Option<f64> {
                    Some(*self as f64)
                }

                fn is_int(&self) -> bool {
                    true
                }
            }
        )*
    };
}

impl_number_like_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Whether `value` can be read as a float.
///
/// ```rust
/// use nanoutils::schema::supports_float;
///
/// assert!(supports_float(&1));
/// assert!(supports_float("1.0"));
/// assert!(supports_float(" 1_000.5 "));
/// assert!(!supports_float("not a float"));
/// ```
pub fn supports_float<T: NumberLike + ?Sized>(value: &T) -> bool {
    value.as_float().is_some()
}

/// Whether `value` can be read as an integer without losing information.
///
/// Floats qualify when their value is integral; strings must be integer literals.
///
/// ```rust
/// use nanoutils::schema::supports_int;
///
/// assert!(supports_int(&1.0));
/// assert!(!supports_int(&1.5));
/// assert!(supports_int(&1));
/// assert!(supports_int("1"));
/// assert!(!supports_int("1.0"));
/// assert!(!supports_int("not a int"));
/// ```
pub fn supports_int<T: NumberLike + ?Sized>(value: &T) -> bool {
    value.is_int()
}

enum Source<T> {
    Value(T),
    Factory(Arc<dyn Fn() -> T + Send + Sync>),
}

/// A validation step that ignores its input and supplies a default.
///
/// ```rust
/// use nanoutils::schema::DefaultValue;
/// use std::collections::HashMap;
///
/// assert!(DefaultValue::new(true).validate(&1));
///
/// let fresh = DefaultValue::factory(HashMap::<String, i32>::new);
/// assert!(fresh.validate(&1).is_empty());
/// ```
pub struct DefaultValue<T> {
    source: Source<T>,
}

impl<T> DefaultValue<T> {
    /// Supplies clones of `value`.
    pub fn new(value: T) -> Self {
        DefaultValue {
            source: Source::Value(value),
        }
    }

    /// Supplies a fresh value from `factory` on every call.
    pub fn factory(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        DefaultValue {
            source: Source::Factory(Arc::new(factory)),
        }
    }

    /// Whether values come from a factory.
    pub fn is_factory(&self) -> bool {
        matches!(self.source, Source::Factory(_))
    }

    /// Returns the default, whatever `_data` is.
    pub fn validate<D: ?Sized>(&self, _data: &D) -> T
    where
        T: Clone,
    {
        match &self.source {
            Source::Value(value) => value.clone(),
            Source::Factory(factory) => factory(),
        }
    }
}

impl<T: Clone> Clone for DefaultValue<T> {
    fn clone(&self) -> Self {
        let source = match &self.source {
            Source::Value(value) => Source::Value(value.clone()),
            Source::Factory(factory) => Source::Factory(factory.clone()),
        };
        DefaultValue { source }
    }
}

impl<T: fmt::Debug> fmt::Debug for DefaultValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Value(value) => write!(f, "DefaultValue({value:?})"),
            Source::Factory(_) => f.write_str("DefaultValue(<factory>)"),
        }
    }
}

static PLACEHOLDER: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]"));

/// The last path segment of a type name, generics included: `alloc::string::String` is `String`.
fn short_type_name<T: ?Sized>() -> &'static str {
    let name = type_name::<T>();
    let base = name.split('<').next().unwrap_or(name);
    match base.rfind("::") {
        Some(index) => &name[index + 2..],
        None => name,
    }
}

/// An error message template.
///
/// The template may contain `{name}`, `{value}` and `{type}`. The name is the text between
/// the first two single quotes of the template, or `value` when there is none. `{{` and `}}`
/// produce literal braces.
///
/// ```rust
/// use nanoutils::schema::Formatter;
///
/// let message = Formatter::new("{name}: {type} = {value}");
/// assert_eq!(message.format(&1), "value: i32 = 1");
///
/// let message = Formatter::new("'charge' expected an integer; observed {type}: {value}");
/// assert_eq!(
///     message.format(&1.5),
///     "'charge' expected an integer; observed f64: 1.5"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Formatter {
    msg: String,
}

impl Formatter {
    /// Wraps the template `msg`.
    pub fn new(msg: impl Into<String>) -> Self {
        Formatter { msg: msg.into() }
    }

    /// The template.
    pub fn msg(&self) -> &str {
        &self.msg
    }

    /// The name substituted for `{name}`.
    pub fn name(&self) -> &str {
        match self.msg.split('\'').nth(1) {
            Some(name) if !name.is_empty() => name,
            _ => "value",
        }
    }

    /// Fills the template with `value`.
    ///
    /// A template with an unknown placeholder or an unbalanced brace is logged as a warning
    /// and the `Debug` form of `value` is returned instead.
    pub fn format<T: fmt::Display + fmt::Debug + ?Sized>(&self, value: &T) -> String {
        let Ok(pattern) = PLACEHOLDER.as_ref() else {
            return format!("{value:?}");
        };
        let mut unknown = None;
        let text = pattern.replace_all(&self.msg, |captures: &Captures<'_>| {
            match (&captures[0], captures.get(1).map(|field| field.as_str())) {
                ("{{", _) => "{".to_string(),
                ("}}", _) => "}".to_string(),
                (_, Some("name")) => self.name().to_string(),
                (_, Some("value")) => value.to_string(),
                (_, Some("type")) => short_type_name::<T>().to_string(),
                (other, _) => {
                    unknown.get_or_insert_with(|| other.to_string());
                    String::new()
                }
            }
        });
        match unknown {
            None => text.into_owned(),
            Some(placeholder) => {
                warn!(template = %self.msg, %placeholder, "cannot format error message");
                format!("{value:?}")
            }
        }
    }
}

impl fmt::Display for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats() {
        for value in ["1", "1.0", "-2.5e3", " 7 ", "inf", "1_000.000_1"] {
            assert!(supports_float(value), "{value}");
        }
        for value in ["", "abc", "1__0", "_1", "1_", "1.0.0"] {
            assert!(!supports_float(value), "{value}");
        }
        assert!(supports_float(&f64::NAN));
        assert!(supports_float(&true));
        assert!(supports_float(&String::from("3")));
    }

    #[test]
    fn ints() {
        for value in ["1", "-12", "+3", " 1_000 "] {
            assert!(supports_int(value), "{value}");
        }
        for value in ["1.0", "1e3", "", "-", "abc", "1_"] {
            assert!(!supports_int(value), "{value}");
        }
        assert!(supports_int(&2.0_f64));
        assert!(supports_int(&-3.0_f32));
        assert!(!supports_int(&0.5_f64));
        assert!(!supports_int(&f64::NAN));
        assert!(!supports_int(&f64::INFINITY));
        assert!(supports_int(&u64::MAX));
    }

    #[test]
    fn default_values() {
        let fixed = DefaultValue::new(5);
        assert_eq!(fixed.validate("ignored"), 5);
        assert!(!fixed.is_factory());
        assert_eq!(format!("{fixed:?}"), "DefaultValue(5)");

        let factory = DefaultValue::factory(Vec::<u8>::new);
        assert!(factory.is_factory());
        assert_eq!(factory.clone().validate(&()), Vec::<u8>::new());
        assert_eq!(format!("{factory:?}"), "DefaultValue(<factory>)");
    }

    #[test]
    fn formatting() {
        let msg = Formatter::new("{name}: {type} = {value}");
        assert_eq!(msg.name(), "value");
        assert_eq!(msg.format(&1), "value: i32 = 1");
        assert_eq!(msg.format("abc"), "value: str = abc");
        assert_eq!(msg.format(&String::from("x")), "value: String = x");

        let named = Formatter::new("'coords' must be finite, got {{{value}}}");
        assert_eq!(named.name(), "coords");
        assert_eq!(named.format(&1.5), "'coords' must be finite, got {1.5}");
        assert_eq!(named.to_string(), "'coords' must be finite, got {{{value}}}");
    }

    #[test]
    fn broken_templates_fall_back_to_debug() {
        assert_eq!(Formatter::new("{bob}").format("x"), "\"x\"");
        assert_eq!(Formatter::new("unbalanced { brace").format(&3), "3");
    }

    #[test]
    fn type_names() {
        assert_eq!(short_type_name::<Vec<String>>(), "Vec<alloc::string::String>");
        assert_eq!(short_type_name::<u8>(), "u8");
    }
}
