//! Retrieval query construction

use parcel_domain::{DataType, FeatureDefinition};

/// Search terms appended for each data type
pub fn datatype_hint(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Currency => "amount dollar price",
        DataType::Date => "date year month day",
        DataType::Number => "number quantity count",
        DataType::String => "",
    }
}

/// Build the retrieval query for a feature
///
/// Name (underscores as spaces), description and data type hint, in that
/// order; empty parts are skipped.
///
/// # Examples
///
/// ```
/// use parcel_domain::{DataType, FeatureDefinition};
/// use parcel_extractor::generate_query;
///
/// let feature = FeatureDefinition::new("sale_price", "most recent sale price", DataType::Currency);
/// assert_eq!(
///     generate_query(&feature),
///     "sale price most recent sale price amount dollar price"
/// );
/// ```
pub fn generate_query(feature: &FeatureDefinition) -> String {
    let name = feature.name.replace('_', " ");
    [
        name.trim(),
        feature.description.trim(),
        datatype_hint(feature.data_type),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" ")
}
