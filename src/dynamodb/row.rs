use aws_sdk_dynamodb::types::AttributeValue;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::keys::{Key, RowKind, KIND_ATTRIBUTE, PARTITION_KEY, SORT_KEY};

/// A single row of the store table.
///
/// A row is a collection of named attributes. Every row carries the table's
/// composite primary key (`pk`, `sk`); cart and catalog rows also carry a
/// `kind` attribute naming what they represent.
///
/// Rows are built with the chained setters below and read back either with
/// the typed getters or by deserializing the whole row with
/// [`Row::deserialize`].
///
/// # Example
///
/// ```
/// use cart_store::dynamodb::Row;
/// use cart_store::keys::{Key, RowKind};
///
/// let row = Row::keyed(&Key::cart_item("c1", "11aa"), RowKind::CartItem)
///     .set_string("item_id", "11aa")
///     .set_number("price", 9.5)
///     .set_integer("quantity", 2);
///
/// assert_eq!(row.get_integer("quantity"), Some(2));
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Row {
    pub(crate) attributes: HashMap<String, AttributeValue>,
}

impl Row {
    /// Creates a new empty `Row`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a row holding the primary key attributes and the kind tag.
    pub fn keyed(key: &Key, kind: RowKind) -> Self {
        Self::new()
            .set_string(PARTITION_KEY, key.partition.as_str())
            .set_string(SORT_KEY, key.sort.as_str())
            .set_string(KIND_ATTRIBUTE, kind.as_str())
    }

    /// Wraps raw attributes returned by the store.
    pub fn from_attributes(attributes: HashMap<String, AttributeValue>) -> Self {
        Self { attributes }
    }

    /// Sets a string attribute.
    pub fn set_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::S(value.into()));
        self
    }

    /// Sets a number attribute, rounded to six decimal places.
    pub fn set_number(mut self, key: impl Into<String>, value: impl Into<f64>) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::N(format_number(value.into())));
        self
    }

    /// Sets an integer number attribute.
    pub fn set_integer(mut self, key: impl Into<String>, value: i64) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::N(value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Gets the value of an attribute as a string.
    ///
    /// Returns `None` if the attribute doesn't exist or is not a string.
    pub fn get_string(&self, key: &str) -> Option<&String> {
        self.attributes.get(key).and_then(|av| av.as_s().ok())
    }

    /// Gets the value of an attribute as a number (f64).
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.attributes
            .get(key)
            .and_then(|av| av.as_n().ok())
            .and_then(|n| n.parse().ok())
    }

    /// Gets the value of an attribute as an integer.
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.attributes
            .get(key)
            .and_then(|av| av.as_n().ok())
            .and_then(|n| n.parse().ok())
    }

    /// The primary key of this row, if both key attributes are present.
    pub fn key(&self) -> Option<Key> {
        let partition = self.get_string(PARTITION_KEY)?;
        let sort = self.get_string(SORT_KEY)?;
        Some(Key::new(partition.as_str(), sort.as_str()))
    }

    /// Keeps only the named attributes.
    pub fn project(mut self, attributes: &[&str]) -> Self {
        if !attributes.is_empty() {
            self.attributes
                .retain(|name, _| attributes.contains(&name.as_str()));
        }
        self
    }

    /// Deserializes the row into a typed value.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, serde_dynamo::Error> {
        serde_dynamo::from_item(self.attributes)
    }

    pub fn into_attributes(self) -> HashMap<String, AttributeValue> {
        self.attributes
    }
}

/// Renders a number with at most six decimal places and no trailing zeros.
pub(crate) fn format_number(value: f64) -> String {
    let fixed = format!("{value:.6}");
    match fixed.trim_end_matches('0').trim_end_matches('.') {
        "" | "-0" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}

pub(crate) fn key_attributes(key: &Key) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (
            PARTITION_KEY.to_string(),
            AttributeValue::S(key.partition.clone()),
        ),
        (SORT_KEY.to_string(), AttributeValue::S(key.sort.clone())),
    ])
}
