//! Boundary validation for insert payloads.
//!
//! Runs before anything reaches the merge engine. Every violation in the
//! document is reported, not just the first one found.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SkuEntry;

/// Allowed length of a product id, in characters.
pub const PRODUCT_ID_MIN_LEN: usize = 1;
pub const PRODUCT_ID_MAX_LEN: usize = 1024;

const NUMERIC_FIELDS: [&str; 4] = ["beingRead", "becomingReadable", "exitError", "dailyTurn"];
const PRODUCT_FIELDS: [&str; 6] = [
    "productId",
    "beingRead",
    "becomingReadable",
    "exitError",
    "dailyTurn",
    "metadata",
];

/// The body accepted by an insert: `{ "data": [ SkuEntry, ... ] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertPayload {
    pub data: Vec<SkuEntry>,
}

/// One schema rule broken by a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaViolation {
    pub field: String,
    #[serde(rename = "errortype")]
    pub error_type: String,
    pub value: Value,
    pub description: String,
}

impl SchemaViolation {
    fn new(field: &str, error_type: &str, value: &Value, description: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            error_type: error_type.to_string(),
            value: value.clone(),
            description: description.into(),
        }
    }
}

/// Validate an insert payload and decode it.
pub fn validate_payload(payload: &Value) -> Result<InsertPayload, Vec<SchemaViolation>> {
    let mut violations = Vec::new();

    let Some(root) = payload.as_object() else {
        return Err(vec![SchemaViolation::new(
            "(root)",
            "invalid_type",
            payload,
            "Invalid type. Expected: object",
        )]);
    };

    for key in root.keys().filter(|k| k.as_str() != "data") {
        violations.push(SchemaViolation::new(
            key,
            "additional_property_not_allowed",
            &root[key],
            format!("Additional property {} is not allowed", key),
        ));
    }

    match root.get("data") {
        None => violations.push(SchemaViolation::new(
            "data",
            "required",
            &Value::Null,
            "data is required",
        )),
        Some(Value::Array(items)) if items.is_empty() => violations.push(SchemaViolation::new(
            "data",
            "array_min_items",
            &Value::Array(Vec::new()),
            "Array must have at least 1 items",
        )),
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                check_sku_item(&format!("data.{}", index), item, &mut violations);
            }
        }
        Some(other) => violations.push(SchemaViolation::new(
            "data",
            "invalid_type",
            other,
            "Invalid type. Expected: array",
        )),
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    InsertPayload::deserialize(payload).map_err(|e| {
        vec![SchemaViolation::new(
            "(root)",
            "decode_failed",
            &Value::Null,
            e.to_string(),
        )]
    })
}

/// Check a product id used for a point lookup.
pub fn validate_product_id(product_id: &str) -> Result<(), String> {
    let len = product_id.chars().count();
    if !(PRODUCT_ID_MIN_LEN..=PRODUCT_ID_MAX_LEN).contains(&len) {
        return Err(format!(
            "productId must be between {} and {} characters",
            PRODUCT_ID_MIN_LEN, PRODUCT_ID_MAX_LEN
        ));
    }
    Ok(())
}

fn check_sku_item(path: &str, item: &Value, violations: &mut Vec<SchemaViolation>) {
    let Some(object) = item.as_object() else {
        violations.push(SchemaViolation::new(
            path,
            "invalid_type",
            item,
            "Invalid type. Expected: object",
        ));
        return;
    };

    for key in object
        .keys()
        .filter(|k| k.as_str() != "sku" && k.as_str() != "productList")
    {
        violations.push(SchemaViolation::new(
            &format!("{}.{}", path, key),
            "additional_property_not_allowed",
            &object[key],
            format!("Additional property {} is not allowed", key),
        ));
    }

    match object.get("sku") {
        None => violations.push(required(path, "sku")),
        Some(Value::String(_)) => {}
        Some(other) => violations.push(SchemaViolation::new(
            &format!("{}.sku", path),
            "invalid_type",
            other,
            "Invalid type. Expected: string",
        )),
    }

    match object.get("productList") {
        None => violations.push(required(path, "productList")),
        Some(Value::Array(products)) => {
            for (index, product) in products.iter().enumerate() {
                check_product(
                    &format!("{}.productList.{}", path, index),
                    product,
                    violations,
                );
            }
        }
        Some(other) => violations.push(SchemaViolation::new(
            &format!("{}.productList", path),
            "invalid_type",
            other,
            "Invalid type. Expected: array",
        )),
    }
}

fn check_product(path: &str, product: &Value, violations: &mut Vec<SchemaViolation>) {
    let Some(object) = product.as_object() else {
        violations.push(SchemaViolation::new(
            path,
            "invalid_type",
            product,
            "Invalid type. Expected: object",
        ));
        return;
    };

    for key in object.keys().filter(|k| !PRODUCT_FIELDS.contains(&k.as_str())) {
        violations.push(SchemaViolation::new(
            &format!("{}.{}", path, key),
            "additional_property_not_allowed",
            &object[key],
            format!("Additional property {} is not allowed", key),
        ));
    }

    check_product_id(path, object, violations);

    for name in NUMERIC_FIELDS {
        let Some(value) = object.get(name) else {
            continue;
        };
        let field = format!("{}.{}", path, name);
        match value.as_f64() {
            None => violations.push(SchemaViolation::new(
                &field,
                "invalid_type",
                value,
                "Invalid type. Expected: number",
            )),
            Some(n) if n < 0.0 => violations.push(SchemaViolation::new(
                &field,
                "number_gte",
                value,
                "Must be greater than or equal to 0",
            )),
            Some(n) if n > 1.0 => violations.push(SchemaViolation::new(
                &field,
                "number_lte",
                value,
                "Must be less than or equal to 1",
            )),
            Some(_) => {}
        }
    }
}

fn check_product_id(path: &str, object: &Map<String, Value>, violations: &mut Vec<SchemaViolation>) {
    let field = format!("{}.productId", path);
    match object.get("productId") {
        None => violations.push(required(path, "productId")),
        Some(Value::String(id)) => {
            let len = id.chars().count();
            if len < PRODUCT_ID_MIN_LEN {
                violations.push(SchemaViolation::new(
                    &field,
                    "string_gte",
                    &Value::String(id.clone()),
                    format!("String length must be greater than or equal to {}", PRODUCT_ID_MIN_LEN),
                ));
            } else if len > PRODUCT_ID_MAX_LEN {
                violations.push(SchemaViolation::new(
                    &field,
                    "string_lte",
                    &Value::String(id.clone()),
                    format!("String length must be less than or equal to {}", PRODUCT_ID_MAX_LEN),
                ));
            }
        }
        Some(other) => violations.push(SchemaViolation::new(
            &field,
            "invalid_type",
            other,
            "Invalid type. Expected: string",
        )),
    }
}

fn required(path: &str, name: &str) -> SchemaViolation {
    SchemaViolation::new(
        &format!("{}.{}", path, name),
        "required",
        &Value::Null,
        format!("{} is required", name),
    )
}
