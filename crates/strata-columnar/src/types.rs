use std::fmt;

/// Runtime type tag carried by value columns.
///
/// `Number` and `Any` are supertypes: a column tagged with them may hold values of several
/// concrete types, and conversions out of such a column dispatch on each value's own type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    Boolean,
    Int,
    Long,
    Double,
    Decimal,
    String,
    Date,
    Time,
    DateTime,
    Instant,
    Duration,
    Url,
    List,
    Json,
    Number,
    Any,
}

impl ValueType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueType::Int
                | ValueType::Long
                | ValueType::Double
                | ValueType::Decimal
                | ValueType::Number
        )
    }

    pub fn is_supertype(self) -> bool {
        matches!(self, ValueType::Number | ValueType::Any)
    }

    /// Whether a value of type `other` may be stored in a column of this type.
    pub fn accepts(self, other: ValueType) -> bool {
        match self {
            ValueType::Any => true,
            ValueType::Number => other.is_numeric(),
            _ => self == other,
        }
    }

    /// Smallest type able to hold values of both `self` and `other`.
    pub fn common(self, other: ValueType) -> ValueType {
        if self == other {
            self
        } else if self.is_numeric() && other.is_numeric() {
            ValueType::Number
        } else {
            ValueType::Any
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Boolean => "Boolean",
            ValueType::Int => "Int",
            ValueType::Long => "Long",
            ValueType::Double => "Double",
            ValueType::Decimal => "Decimal",
            ValueType::String => "String",
            ValueType::Date => "Date",
            ValueType::Time => "Time",
            ValueType::DateTime => "DateTime",
            ValueType::Instant => "Instant",
            ValueType::Duration => "Duration",
            ValueType::Url => "Url",
            ValueType::List => "List",
            ValueType::Json => "Json",
            ValueType::Number => "Number",
            ValueType::Any => "Any",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared element type of a value column: a type tag plus nullability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementType {
    pub value_type: ValueType,
    pub nullable: bool,
}

impl ElementType {
    pub const fn new(value_type: ValueType, nullable: bool) -> Self {
        Self {
            value_type,
            nullable,
        }
    }

    pub const fn not_null(value_type: ValueType) -> Self {
        Self::new(value_type, false)
    }

    pub const fn nullable(value_type: ValueType) -> Self {
        Self::new(value_type, true)
    }

    pub fn with_nullable(self, nullable: bool) -> Self {
        Self::new(self.value_type, nullable)
    }

    pub fn common(self, other: ElementType) -> ElementType {
        ElementType::new(
            self.value_type.common(other.value_type),
            self.nullable || other.nullable,
        )
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.value_type)
        } else {
            write!(f, "{}", self.value_type)
        }
    }
}
