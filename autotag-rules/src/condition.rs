use autotag_catalog::{parse_decimal, ProductView};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Product attribute a condition inspects.
///
/// Legacy rows may carry field names this version does not know; those
/// deserialize to [`ConditionField::Unknown`] and evaluate to a skip
/// rather than failing the whole rule payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionField {
    Vendor,
    ProductType,
    Title,
    MinVariantPrice,
    MaxVariantPrice,
    Weight,
    Status,
    OnSale,
    Collection,
    InventoryQuantity,
    Unknown,
}

impl ConditionField {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "vendor" => ConditionField::Vendor,
            "productType" => ConditionField::ProductType,
            "title" => ConditionField::Title,
            "minVariantPrice" => ConditionField::MinVariantPrice,
            "maxVariantPrice" => ConditionField::MaxVariantPrice,
            "weight" => ConditionField::Weight,
            "status" => ConditionField::Status,
            "onSale" => ConditionField::OnSale,
            "collection" => ConditionField::Collection,
            "inventoryQuantity" => ConditionField::InventoryQuantity,
            _ => ConditionField::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionField::Vendor => "vendor",
            ConditionField::ProductType => "productType",
            ConditionField::Title => "title",
            ConditionField::MinVariantPrice => "minVariantPrice",
            ConditionField::MaxVariantPrice => "maxVariantPrice",
            ConditionField::Weight => "weight",
            ConditionField::Status => "status",
            ConditionField::OnSale => "onSale",
            ConditionField::Collection => "collection",
            ConditionField::InventoryQuantity => "inventoryQuantity",
            ConditionField::Unknown => "unknown",
        }
    }
}

impl Default for ConditionField {
    fn default() -> Self {
        ConditionField::Unknown
    }
}

impl Serialize for ConditionField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConditionField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ConditionField::parse(&raw))
    }
}

/// Comparison applied between the derived product value and the
/// condition's target value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionOperator {
    Contains,
    Equals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Unknown,
}

impl ConditionOperator {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "contains" => ConditionOperator::Contains,
            "equals" => ConditionOperator::Equals,
            "greater_than" => ConditionOperator::GreaterThan,
            "greater_than_or_equal" => ConditionOperator::GreaterThanOrEqual,
            "less_than" => ConditionOperator::LessThan,
            "less_than_or_equal" => ConditionOperator::LessThanOrEqual,
            _ => ConditionOperator::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Contains => "contains",
            ConditionOperator::Equals => "equals",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::GreaterThanOrEqual => "greater_than_or_equal",
            ConditionOperator::LessThan => "less_than",
            ConditionOperator::LessThanOrEqual => "less_than_or_equal",
            ConditionOperator::Unknown => "unknown",
        }
    }
}

impl Default for ConditionOperator {
    fn default() -> Self {
        ConditionOperator::Unknown
    }
}

impl Serialize for ConditionOperator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConditionOperator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ConditionOperator::parse(&raw))
    }
}

/// Why a condition was skipped instead of evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownField,
    UnknownOperator,
    /// The operator exists but does not apply to this field.
    UnsupportedOperator,
    /// The field is valid but the data source does not expose it.
    FieldUnavailable,
    /// The product carries no numeric data for the aggregate.
    MissingNumericValue,
    /// The condition's target value does not parse as a number.
    MalformedTarget,
}

/// Result of evaluating one condition against one product.
///
/// Skips collapse to "no match" for rule purposes but stay
/// distinguishable in logs and tests (the fail-closed policy is a
/// contract, not an accident).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOutcome {
    Matched,
    NotMatched,
    Skipped(SkipReason),
}

impl ConditionOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, ConditionOutcome::Matched)
    }

    fn from_bool(matched: bool) -> Self {
        if matched {
            ConditionOutcome::Matched
        } else {
            ConditionOutcome::NotMatched
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::String(value) => value,
        serde_json::Value::Number(value) => value.to_string(),
        serde_json::Value::Bool(value) => value.to_string(),
        _ => String::new(),
    })
}

/// One atomic condition: a field, an operator and a target value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub field: ConditionField,
    #[serde(default)]
    pub operator: ConditionOperator,
    /// Target value, always kept as text; numeric fields parse it at
    /// evaluation time. Legacy rows may store numbers or booleans here.
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
}

impl Condition {
    pub fn new(field: ConditionField, operator: ConditionOperator, value: impl Into<String>) -> Self {
        Self {
            field,
            operator,
            value: value.into(),
        }
    }

    fn target_lower(&self) -> String {
        self.value.trim().to_lowercase()
    }

    /// Evaluates the condition against a product. Never raises: unknown
    /// fields, inapplicable operators and missing numeric data all
    /// resolve to a skip.
    pub fn evaluate(&self, product: &ProductView) -> ConditionOutcome {
        match self.field {
            ConditionField::Vendor => {
                let vendor = product.vendor.to_lowercase();
                let target = self.target_lower();
                match self.operator {
                    ConditionOperator::Contains => {
                        ConditionOutcome::from_bool(vendor.contains(&target))
                    }
                    ConditionOperator::Equals => ConditionOutcome::from_bool(vendor == target),
                    ConditionOperator::Unknown => {
                        ConditionOutcome::Skipped(SkipReason::UnknownOperator)
                    }
                    _ => ConditionOutcome::Skipped(SkipReason::UnsupportedOperator),
                }
            }
            ConditionField::ProductType => self.equals_only(&product.product_type),
            ConditionField::Title => {
                let title = product.title.to_lowercase();
                match self.operator {
                    ConditionOperator::Contains => {
                        ConditionOutcome::from_bool(title.contains(&self.target_lower()))
                    }
                    ConditionOperator::Unknown => {
                        ConditionOutcome::Skipped(SkipReason::UnknownOperator)
                    }
                    _ => ConditionOutcome::Skipped(SkipReason::UnsupportedOperator),
                }
            }
            ConditionField::MinVariantPrice => self.compare_numeric(product.min_variant_price()),
            ConditionField::MaxVariantPrice => self.compare_numeric(product.max_variant_price()),
            // Weight is not exposed by the catalog data source.
            ConditionField::Weight => ConditionOutcome::Skipped(SkipReason::FieldUnavailable),
            ConditionField::Status => self.equals_only(&product.status),
            ConditionField::OnSale => match self.operator {
                ConditionOperator::Equals => {
                    let target = self.value.trim() == "true";
                    ConditionOutcome::from_bool(product.is_on_sale() == target)
                }
                ConditionOperator::Unknown => ConditionOutcome::Skipped(SkipReason::UnknownOperator),
                _ => ConditionOutcome::Skipped(SkipReason::UnsupportedOperator),
            },
            ConditionField::Collection => {
                let target = self.target_lower();
                let mut handles = product.collections.iter().map(|handle| handle.to_lowercase());
                match self.operator {
                    ConditionOperator::Contains => {
                        ConditionOutcome::from_bool(handles.any(|handle| handle.contains(&target)))
                    }
                    ConditionOperator::Equals => {
                        ConditionOutcome::from_bool(handles.any(|handle| handle == target))
                    }
                    ConditionOperator::Unknown => {
                        ConditionOutcome::Skipped(SkipReason::UnknownOperator)
                    }
                    _ => ConditionOutcome::Skipped(SkipReason::UnsupportedOperator),
                }
            }
            ConditionField::InventoryQuantity => {
                self.compare_numeric(Some(product.total_inventory() as f64))
            }
            ConditionField::Unknown => ConditionOutcome::Skipped(SkipReason::UnknownField),
        }
    }

    fn equals_only(&self, actual: &str) -> ConditionOutcome {
        match self.operator {
            ConditionOperator::Equals => {
                ConditionOutcome::from_bool(actual.to_lowercase() == self.target_lower())
            }
            ConditionOperator::Unknown => ConditionOutcome::Skipped(SkipReason::UnknownOperator),
            _ => ConditionOutcome::Skipped(SkipReason::UnsupportedOperator),
        }
    }

    fn compare_numeric(&self, actual: Option<f64>) -> ConditionOutcome {
        let target = match parse_decimal(&self.value) {
            Some(target) => target,
            None => return ConditionOutcome::Skipped(SkipReason::MalformedTarget),
        };
        let actual = match actual {
            Some(actual) => actual,
            None => return ConditionOutcome::Skipped(SkipReason::MissingNumericValue),
        };

        match self.operator {
            ConditionOperator::GreaterThan => ConditionOutcome::from_bool(actual > target),
            ConditionOperator::GreaterThanOrEqual => ConditionOutcome::from_bool(actual >= target),
            ConditionOperator::LessThan => ConditionOutcome::from_bool(actual < target),
            ConditionOperator::LessThanOrEqual => ConditionOutcome::from_bool(actual <= target),
            ConditionOperator::Equals => {
                ConditionOutcome::from_bool((actual - target).abs() < f64::EPSILON)
            }
            ConditionOperator::Unknown => ConditionOutcome::Skipped(SkipReason::UnknownOperator),
            _ => ConditionOutcome::Skipped(SkipReason::UnsupportedOperator),
        }
    }
}
