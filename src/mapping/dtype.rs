//! Scalar and structured data type descriptions.
//!
//! A [`DType`] describes the memory layout of one array element: a scalar kind, a byte
//! order and an optional subarray shape. It carries no data. Descriptions are written in the
//! usual array-library notation:
//!
//! | Text                 | Meaning                                  |
//! |----------------------|------------------------------------------|
//! | `float64`, `f8`      | 8-byte float, native order               |
//! | `<i4`, `>i4`         | 4-byte signed int, explicit order        |
//! | `?`, `bool`, `b1`    | boolean                                  |
//! | `U5`, `S5`           | 5-character unicode / 5-byte string      |
//! | `(3,)f8`, `(2, 2)i2` | subarray of the following scalar         |

use std::{fmt, str::FromStr};

use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

/// The scalar kind of a [`DType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ScalarKind {
    /// Boolean
    Bool,
    /// Signed 8-bit integer
    Int8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 8-bit integer
    UInt8,
    /// Unsigned 16-bit integer
    UInt16,
    /// Unsigned 32-bit integer
    UInt32,
    /// Unsigned 64-bit integer
    UInt64,
    /// Half-precision float
    Float16,
    /// Single-precision float
    Float32,
    /// Double-precision float
    Float64,
    /// Complex number of two single-precision floats
    Complex64,
    /// Complex number of two double-precision floats
    Complex128,
    /// Fixed-length unicode string (4 bytes per character)
    #[strum(serialize = "str")]
    Unicode,
    /// Fixed-length byte string
    #[strum(serialize = "bytes")]
    Bytes,
}

impl ScalarKind {
    /// The canonical name, e.g. `float64`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The one-letter type code, e.g. `f` for floats.
    pub fn code(self) -> char {
        match self {
            ScalarKind::Bool => 'b',
            ScalarKind::Int8 | ScalarKind::Int16 | ScalarKind::Int32 | ScalarKind::Int64 => 'i',
            ScalarKind::UInt8 | ScalarKind::UInt16 | ScalarKind::UInt32 | ScalarKind::UInt64 => {
                'u'
            }
            ScalarKind::Float16 | ScalarKind::Float32 | ScalarKind::Float64 => 'f',
            ScalarKind::Complex64 | ScalarKind::Complex128 => 'c',
            ScalarKind::Unicode => 'U',
            ScalarKind::Bytes => 'S',
        }
    }

    /// Size in bytes; per character for the string kinds.
    pub fn size(self) -> usize {
        match self {
            ScalarKind::Bool | ScalarKind::Int8 | ScalarKind::UInt8 | ScalarKind::Bytes => 1,
            ScalarKind::Int16 | ScalarKind::UInt16 | ScalarKind::Float16 => 2,
            ScalarKind::Int32 | ScalarKind::UInt32 | ScalarKind::Float32 | ScalarKind::Unicode => 4,
            ScalarKind::Int64 | ScalarKind::UInt64 | ScalarKind::Float64 | ScalarKind::Complex64 => 8,
            ScalarKind::Complex128 => 16,
        }
    }

    /// Whether the kind has a length parameter (the string kinds).
    pub fn is_flexible(self) -> bool {
        matches!(self, ScalarKind::Unicode | ScalarKind::Bytes)
    }

    fn from_code(code: char, size: Option<usize>) -> Option<Self> {
        let kind = match (code, size) {
            ('?', None) | ('b', Some(1)) => ScalarKind::Bool,
            ('b', None) | ('i', Some(1)) => ScalarKind::Int8,
            ('B', None) | ('u', Some(1)) => ScalarKind::UInt8,
            ('h', None) | ('i', Some(2)) => ScalarKind::Int16,
            ('H', None) | ('u', Some(2)) => ScalarKind::UInt16,
            ('i', None) | ('i', Some(4)) => ScalarKind::Int32,
            ('I', None) | ('u', None) | ('u', Some(4)) => ScalarKind::UInt32,
            ('l' | 'q', None) | ('i', Some(8)) => ScalarKind::Int64,
            ('L' | 'Q', None) | ('u', Some(8)) => ScalarKind::UInt64,
            ('e', None) | ('f', Some(2)) => ScalarKind::Float16,
            ('f', None) | ('f', Some(4)) => ScalarKind::Float32,
            ('d', None) | ('f', Some(8)) => ScalarKind::Float64,
            ('F', None) | ('c', Some(8)) => ScalarKind::Complex64,
            ('D', None) | ('c', Some(16)) => ScalarKind::Complex128,
            _ => return None,
        };
        Some(kind)
    }

    fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "float" | "double" => ScalarKind::Float64,
            "half" => ScalarKind::Float16,
            "single" => ScalarKind::Float32,
            "int" => ScalarKind::Int64,
            "complex" => ScalarKind::Complex128,
            "unicode" | "str_" => ScalarKind::Unicode,
            "bytes_" => ScalarKind::Bytes,
            "bool_" => ScalarKind::Bool,
            other => return ScalarKind::from_str(other).ok(),
        };
        Some(kind)
    }
}

/// Byte order of a [`DType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Little-endian (`<`)
    Little,
    /// Big-endian (`>`)
    Big,
    /// Single-byte kinds, for which order does not apply (`|`)
    NotApplicable,
}

impl ByteOrder {
    /// The byte order of the running machine.
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }

    /// The order prefix character.
    pub fn symbol(self) -> char {
        match self {
            ByteOrder::Little => '<',
            ByteOrder::Big => '>',
            ByteOrder::NotApplicable => '|',
        }
    }
}

/// The layout of one array element.
///
/// # Examples
///
/// ```rust
/// use nanoutils::mapping::{DType, ScalarKind};
///
/// let f8 = DType::parse("f8")?;
/// assert_eq!(f8.kind(), ScalarKind::Float64);
/// assert_eq!(f8.to_string(), "float64");
/// assert_eq!(f8.str(), "<f8");
///
/// let xyz = DType::parse("(3,)f8")?;
/// assert_eq!(xyz.itemsize(), 24);
/// assert_eq!(xyz.to_string(), "('<f8', (3,))");
///
/// assert_eq!(DType::parse("U2")?.to_string(), "<U2");
/// # Ok::<(), nanoutils::Error>(())
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DType {
    kind: ScalarKind,
    width: usize,
    order: ByteOrder,
    shape: Vec<usize>,
}

impl DType {
    /// A scalar dtype in native byte order. String kinds get length zero.
    pub fn new(kind: ScalarKind) -> Self {
        let order = if kind.size() == 1 || kind == ScalarKind::Bytes {
            ByteOrder::NotApplicable
        } else {
            ByteOrder::native()
        };
        DType {
            kind,
            width: 0,
            order,
            shape: Vec::new(),
        }
    }

    /// A unicode string of `chars` characters.
    pub fn unicode(chars: usize) -> Self {
        Self::new(ScalarKind::Unicode).with_width(chars)
    }

    /// A byte string of `len` bytes.
    pub fn bytes(len: usize) -> Self {
        Self::new(ScalarKind::Bytes).with_width(len)
    }

    /// Sets the length of a string kind; ignored for other kinds.
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        if self.kind.is_flexible() {
            self.width = width;
        }
        self
    }

    /// Sets the byte order; ignored for kinds where order does not apply.
    #[must_use]
    pub fn with_order(mut self, order: ByteOrder) -> Self {
        if self.order != ByteOrder::NotApplicable && order != ByteOrder::NotApplicable {
            self.order = order;
        }
        self
    }

    /// Turns the dtype into a subarray of `shape`.
    #[must_use]
    pub fn with_shape(mut self, shape: impl Into<Vec<usize>>) -> Self {
        self.shape = shape.into();
        self
    }

    /// Parses a dtype description.
    ///
    /// # Errors
    /// Returns [`Error::DType`] when `text` is not understood.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::DType(format!("data type '{text}' not understood"));
        let mut rest = text.trim();

        let mut shape = Vec::new();
        if let Some(inner) = rest.strip_prefix('(') {
            let (dims, tail) = inner.split_once(')').ok_or_else(invalid)?;
            for dim in dims.split(',').map(str::trim).filter(|dim| !dim.is_empty()) {
                shape.push(dim.parse::<usize>().map_err(|_| invalid())?);
            }
            rest = tail.trim_start();
        } else {
            let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits > 0 {
                shape.push(rest[..digits].parse::<usize>().map_err(|_| invalid())?);
                rest = &rest[digits..];
            }
        }

        let mut order = None;
        if let Some(symbol) = rest.chars().next() {
            order = match symbol {
                '<' => Some(ByteOrder::Little),
                '>' => Some(ByteOrder::Big),
                '=' | '|' => Some(ByteOrder::native()),
                _ => None,
            };
            if order.is_some() {
                rest = &rest[1..];
            }
        }

        let scalar = if let Some(kind) = ScalarKind::from_name(rest) {
            DType::new(kind)
        } else {
            let mut chars = rest.chars();
            let code = chars.next().ok_or_else(invalid)?;
            let digits = chars.as_str();
            let size = if digits.is_empty() {
                None
            } else {
                Some(digits.parse::<usize>().map_err(|_| invalid())?)
            };
            match code {
                'U' => DType::unicode(size.unwrap_or(0)),
                'S' | 'a' => DType::bytes(size.unwrap_or(0)),
                _ => DType::new(ScalarKind::from_code(code, size).ok_or_else(invalid)?),
            }
        };

        let scalar = match order {
            Some(order) => scalar.with_order(order),
            None => scalar,
        };
        Ok(scalar.with_shape(shape))
    }

    /// The scalar kind.
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// The byte order.
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// The subarray shape, empty for scalars.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The length of a string kind, zero otherwise.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The scalar element of a subarray dtype (the dtype itself for scalars).
    pub fn base(&self) -> DType {
        DType {
            shape: Vec::new(),
            ..self.clone()
        }
    }

    /// Size in bytes of one element, including the subarray shape.
    pub fn itemsize(&self) -> usize {
        let scalar = if self.kind.is_flexible() {
            self.kind.size().saturating_mul(self.width)
        } else {
            self.kind.size()
        };
        self.shape
            .iter()
            .fold(scalar, |size, &dim| size.saturating_mul(dim))
    }

    /// The type string of the scalar element, e.g. `<f8`, `|b1` or `<U2`.
    pub fn str(&self) -> String {
        let size = if self.kind.is_flexible() {
            self.width
        } else {
            self.kind.size()
        };
        format!("{}{}{}", self.order.symbol(), self.kind.code(), size)
    }

    /// The field description used inside structured dtypes, e.g. `'<f8'` or `'<f8', (3,)`.
    fn descr(&self) -> String {
        if self.shape.is_empty() {
            format!("'{}'", self.str())
        } else {
            format!("'{}', {}", self.str(), fmt_shape(&self.shape))
        }
    }
}

fn fmt_shape(shape: &[usize]) -> String {
    match shape {
        [single] => format!("({single},)"),
        dims => format!(
            "({})",
            dims.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        ),
    }
}

impl FromStr for DType {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        DType::parse(text)
    }
}

impl From<ScalarKind> for DType {
    fn from(kind: ScalarKind) -> Self {
        DType::new(kind)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.shape.is_empty() {
            return write!(f, "('{}', {})", self.str(), fmt_shape(&self.shape));
        }
        if self.kind.is_flexible() || self.order == ByteOrder::Big {
            return f.write_str(&self.str());
        }
        f.write_str(self.kind.name())
    }
}

impl fmt::Debug for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shape.is_empty() {
            write!(f, "dtype('{self}')")
        } else {
            write!(f, "dtype({self})")
        }
    }
}

/// Conversion into a [`DType`].
///
/// Implemented for dtypes, scalar kinds and description strings. A `(dtype, n)` pair sets the
/// length of a string kind of length zero and is a subarray of shape `(n,)` otherwise.
pub trait IntoDType {
    /// Performs the conversion.
    ///
    /// # Errors
    /// Returns [`Error::DType`] for descriptions that cannot be parsed.
    fn into_dtype(self) -> Result<DType>;
}

impl IntoDType for DType {
    fn into_dtype(self) -> Result<DType> {
        Ok(self)
    }
}

impl IntoDType for &DType {
    fn into_dtype(self) -> Result<DType> {
        Ok(self.clone())
    }
}

impl IntoDType for ScalarKind {
    fn into_dtype(self) -> Result<DType> {
        Ok(DType::new(self))
    }
}

impl IntoDType for &str {
    fn into_dtype(self) -> Result<DType> {
        DType::parse(self)
    }
}

impl IntoDType for String {
    fn into_dtype(self) -> Result<DType> {
        DType::parse(&self)
    }
}

impl<D: IntoDType> IntoDType for (D, usize) {
    fn into_dtype(self) -> Result<DType> {
        let (dtype, n) = self;
        let dtype = dtype.into_dtype()?;
        if dtype.kind.is_flexible() && dtype.width == 0 && dtype.shape.is_empty() {
            Ok(dtype.with_width(n))
        } else {
            Ok(dtype.with_shape([n]))
        }
    }
}

/// One named field of a [`StructuredDType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field layout
    pub dtype: DType,
    /// Byte offset inside the record
    pub offset: usize,
}

/// A packed record layout: named fields laid out back to back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructuredDType {
    fields: Vec<Field>,
    itemsize: usize,
}

impl StructuredDType {
    /// Lays out `fields` in order without padding.
    pub fn new(fields: impl IntoIterator<Item = (String, DType)>) -> Self {
        let mut offset = 0;
        let fields: Vec<Field> = fields
            .into_iter()
            .map(|(name, dtype)| {
                let field = Field {
                    name,
                    offset,
                    dtype,
                };
                offset = offset.saturating_add(field.dtype.itemsize());
                field
            })
            .collect();
        StructuredDType {
            fields,
            itemsize: offset,
        }
    }

    /// The fields in layout order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The field called `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Size in bytes of one record.
    pub fn itemsize(&self) -> usize {
        self.itemsize
    }
}

impl fmt::Display for StructuredDType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "('{}', {})", field.name, field.dtype.descr())?;
        }
        f.write_str("]")
    }
}
