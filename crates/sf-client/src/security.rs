//! Literal escaping and input validation for SOQL and resource URLs.
//!
//! Every interpolated string in a SOQL statement must go through
//! [`soql::quote`] (or [`soql::escape_string`] when the quotes are already in
//! the template):
//!
//! ```rust
//! use dualforce_client::security::soql;
//!
//! let query = format!("SELECT Id FROM Contact WHERE LastName = {}", soql::quote("O'Neil"));
//! assert_eq!(query, r"SELECT Id FROM Contact WHERE LastName = 'O\'Neil'");
//! ```

/// SOQL literal helpers.
pub mod soql {
    /// Escape a string value for use inside a quoted SOQL literal.
    ///
    /// - Single quotes (`'`) become (`\'`)
    /// - Backslashes (`\`) become (`\\`)
    /// - Newlines, carriage returns and tabs become `\n`, `\r`, `\t`
    #[must_use]
    pub fn escape_string(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '\'' => escaped.push_str("\\'"),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Wrap a value in single quotes as an escaped SOQL string literal.
    ///
    /// ```rust
    /// use dualforce_client::security::soql;
    ///
    /// assert_eq!(soql::quote("O'Neil"), r"'O\'Neil'");
    /// ```
    #[must_use]
    pub fn quote(value: &str) -> String {
        format!("'{}'", escape_string(value))
    }

    /// Alias of [`quote`].
    #[must_use]
    pub fn escape_soql(value: &str) -> String {
        quote(value)
    }

    /// Escape a value for a LIKE pattern; `%` and `_` are matched literally.
    #[must_use]
    pub fn escape_like(value: &str) -> String {
        let base_escaped = escape_string(value);
        let mut escaped = String::with_capacity(base_escaped.len() + 8);
        for ch in base_escaped.chars() {
            match ch {
                '%' => escaped.push_str("\\%"),
                '_' => escaped.push_str("\\_"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Field names must start with a letter and contain only ASCII
    /// alphanumerics and underscores (`Custom__c`, `Account__r`).
    #[must_use]
    pub fn is_safe_field_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            }
            _ => false,
        }
    }

    /// SObject names follow the field-name rules.
    #[must_use]
    pub fn is_safe_sobject_name(name: &str) -> bool {
        is_safe_field_name(name)
    }
}

/// URL parameter helpers.
pub mod url {
    /// Percent-encode a value used as a path segment or parameter.
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }
}

/// SOQL date and datetime literals.
pub mod datetime {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    /// Format an instant as a SOQL datetime literal in UTC,
    /// e.g. `2024-01-15T10:30:00Z`.
    #[must_use]
    pub fn format_date_time<Tz: TimeZone>(value: &DateTime<Tz>) -> String {
        value
            .with_timezone(&Utc)
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string()
    }

    /// Format a calendar date as a SOQL date literal, e.g. `2024-01-15`.
    #[must_use]
    pub fn format_date(value: &NaiveDate) -> String {
        value.format("%Y-%m-%d").to_string()
    }
}
