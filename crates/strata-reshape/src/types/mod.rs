//! String parsing and typed conversion of value columns.

mod convert;
mod locale;
mod parse;

pub use convert::{convert, convert_column, convert_value, ConvertOptions, ValueConversionError};
pub use locale::{DateOrder, Separators, ValueLocaleConfig};
pub use parse::{
    parse, parse_as, parse_columns, parse_value_as, try_parse_column, ParserOptions,
    DEFAULT_NULL_STRINGS,
};
