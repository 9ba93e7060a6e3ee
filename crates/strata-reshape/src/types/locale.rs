/// Decimal and thousands separators of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Separators {
    pub decimal_sep: char,
    pub thousands_sep: char,
}

impl Separators {
    pub const fn new(decimal_sep: char, thousands_sep: char) -> Self {
        Self {
            decimal_sep,
            thousands_sep,
        }
    }

    pub const fn en_us() -> Self {
        Self::new('.', ',')
    }

    pub const fn de_de() -> Self {
        Self::new(',', '.')
    }

    pub const fn fr_fr() -> Self {
        Self::new(',', '\u{00A0}')
    }

    pub const fn es_es() -> Self {
        Self::new(',', '.')
    }
}

/// Date component order to use when parsing ambiguous numeric dates like `1/2/2024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateOrder {
    /// Month-Day-Year (`1/2/2024` -> Jan 2, 2024).
    MDY,
    /// Day-Month-Year (`1/2/2024` -> Feb 1, 2024).
    DMY,
    /// Year-Month-Day (`2024/1/2` -> Jan 2, 2024).
    YMD,
}

/// Locale configuration used when parsing text into numbers and dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueLocaleConfig {
    pub separators: Separators,
    pub date_order: DateOrder,
}

impl Default for ValueLocaleConfig {
    fn default() -> Self {
        Self::en_us()
    }
}

impl ValueLocaleConfig {
    #[must_use]
    pub const fn new(separators: Separators, date_order: DateOrder) -> Self {
        Self {
            separators,
            date_order,
        }
    }

    #[must_use]
    pub const fn en_us() -> Self {
        Self::new(Separators::en_us(), DateOrder::MDY)
    }

    /// Same separators as `en-US`, day-month-year dates.
    #[must_use]
    pub const fn en_gb() -> Self {
        Self::new(Separators::en_us(), DateOrder::DMY)
    }

    #[must_use]
    pub const fn de_de() -> Self {
        Self::new(Separators::de_de(), DateOrder::DMY)
    }

    #[must_use]
    pub const fn fr_fr() -> Self {
        Self::new(Separators::fr_fr(), DateOrder::DMY)
    }

    #[must_use]
    pub const fn es_es() -> Self {
        Self::new(Separators::es_es(), DateOrder::DMY)
    }

    /// Looks up a locale from a BCP 47 style id such as `de-DE`, `en_GB` or `fr`.
    #[must_use]
    pub fn for_locale_id(id: &str) -> Option<Self> {
        let key = id.trim().replace('_', "-").to_ascii_lowercase();
        let mut parts = key.split('-');
        let lang = parts.next().filter(|l| !l.is_empty())?;
        let region = parts.next();

        match lang {
            "en" => match region {
                Some("gb") | Some("uk") => Some(Self::en_gb()),
                _ => Some(Self::en_us()),
            },
            "de" => Some(Self::de_de()),
            "fr" => Some(Self::fr_fr()),
            "es" => Some(Self::es_es()),
            _ => None,
        }
    }
}
