//! Default property feature schema
//!
//! The standard set of features pulled from property records: ownership,
//! location, sale history, building facts and tax data.

use crate::feature::{DataType, FeatureDefinition, FeatureSchema, ValidationRule};
use serde_json::json;

/// (name, description, type, required, instructions)
const PROPERTY_FEATURES: &[(&str, &str, DataType, bool, &str)] = &[
    (
        "owner_name",
        "The name of the property owner",
        DataType::String,
        true,
        "Find the owner of record, usually labeled 'Owner' or 'Property Owner'. Return the full name exactly as written.",
    ),
    (
        "property_address",
        "The full address of the property",
        DataType::String,
        true,
        "Find the site address with street number, street name, city, state and ZIP code. Labels include 'Property Address', 'Location' and 'Site Address'.",
    ),
    (
        "lot_size",
        "The size of the lot in acres or square feet",
        DataType::String,
        false,
        "Find the lot size ('Lot Size', 'Land Area', 'Acreage') and keep the unit of measurement.",
    ),
    (
        "sale_price",
        "The most recent sale price of the property",
        DataType::Currency,
        false,
        "Find the most recent sale price ('Sale Price', 'Purchase Price', 'Consideration'). Keep the currency symbol if present.",
    ),
    (
        "sale_date",
        "The date of the most recent sale",
        DataType::Date,
        false,
        "Find the date of the most recent sale ('Sale Date', 'Date of Sale', 'Transfer Date').",
    ),
    (
        "property_type",
        "The type or classification of the property",
        DataType::String,
        false,
        "Find the property classification ('Property Type', 'Classification', 'Use Code'), e.g. Residential or Commercial.",
    ),
    (
        "bedrooms",
        "The number of bedrooms in the property",
        DataType::Number,
        false,
        "Find the bedroom count ('Bedrooms', 'BR', 'Beds'). Return only the number.",
    ),
    (
        "bathrooms",
        "The number of bathrooms in the property",
        DataType::Number,
        false,
        "Find the bathroom count ('Bathrooms', 'BA', 'Baths'). Half baths count as 0.5.",
    ),
    (
        "year_built",
        "The year the property was built",
        DataType::Number,
        false,
        "Find the construction year ('Year Built', 'Built'). Return the 4-digit year only.",
    ),
    (
        "square_footage",
        "The total square footage of the building",
        DataType::Number,
        false,
        "Find the building area ('Square Feet', 'Living Area', 'GLA'). Return only the number.",
    ),
    (
        "tax_assessment_value",
        "The assessed value for tax purposes",
        DataType::Currency,
        false,
        "Find the assessed value ('Assessed Value', 'Assessment', 'Taxable Value').",
    ),
    (
        "annual_property_tax",
        "The annual property tax amount",
        DataType::Currency,
        false,
        "Find the yearly tax amount ('Annual Tax', 'Property Tax', 'Tax Amount').",
    ),
    (
        "zoning_classification",
        "The zoning classification or code",
        DataType::String,
        false,
        "Find the zoning code ('Zoning', 'Zone', 'Zoning District'), e.g. R-1.",
    ),
    (
        "parcel_id",
        "The unique parcel identification number",
        DataType::String,
        false,
        "Find the parcel identifier ('Parcel ID', 'APN', 'PIN', 'Tax ID') exactly as written.",
    ),
    (
        "legal_description",
        "The legal description of the property",
        DataType::String,
        false,
        "Find the legal description (lot, block, subdivision, metes and bounds).",
    ),
    (
        "mortgage_amount",
        "The mortgage or loan amount",
        DataType::Currency,
        false,
        "Find the mortgage or loan principal ('Mortgage Amount', 'Loan Amount').",
    ),
    (
        "deed_book_reference",
        "The deed book reference number",
        DataType::String,
        false,
        "Find the deed book reference ('Deed Book', 'Book', 'Liber').",
    ),
];

/// Build the default property feature schema
///
/// # Examples
///
/// ```
/// use parcel_domain::schema::property_feature_schema;
///
/// let schema = property_feature_schema();
/// assert!(schema.contains_key("owner_name"));
/// assert!(schema["owner_name"].required);
/// ```
pub fn property_feature_schema() -> FeatureSchema {
    PROPERTY_FEATURES
        .iter()
        .map(|&(name, description, data_type, required, prompt)| {
            let feature = FeatureDefinition::new(name, description, data_type)
                .required(required)
                .with_prompt(prompt);
            let feature = default_rules(data_type)
                .into_iter()
                .fold(feature, FeatureDefinition::with_rule);
            (name.to_string(), feature)
        })
        .collect()
}

fn default_rules(data_type: DataType) -> Vec<ValidationRule> {
    match data_type {
        DataType::String => vec![ValidationRule::new("min_length", json!({"min": 1}))],
        DataType::Number => vec![ValidationRule::new("numeric", json!({"allow_decimal": true}))],
        DataType::Currency => vec![ValidationRule::new(
            "currency_format",
            json!({"allow_symbols": ["$", "USD"]}),
        )],
        DataType::Date => vec![ValidationRule::new(
            "date_format",
            json!({"formats": ["MM/DD/YYYY", "YYYY-MM-DD", "Month DD, YYYY"]}),
        )],
    }
}

/// Names of required features, in schema order
pub fn required_features(schema: &FeatureSchema) -> Vec<&str> {
    schema
        .values()
        .filter(|f| f.required)
        .map(|f| f.name.as_str())
        .collect()
}

/// Names of optional features, in schema order
pub fn optional_features(schema: &FeatureSchema) -> Vec<&str> {
    schema
        .values()
        .filter(|f| !f.required)
        .map(|f| f.name.as_str())
        .collect()
}
