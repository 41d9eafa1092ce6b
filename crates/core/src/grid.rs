//! Grid requests and their results.
//!
//! A grid is a table whose primary column is filled from one function call,
//! and whose other cells are answered one at a time against a row's context.

use crate::Settings;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound body of a primary-column request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnRequest {
    /// What the column should list, e.g. "open issues in rust-lang/rust".
    pub query: String,
    /// Provider, model and offered functions.
    pub settings: Settings,
}

/// Inbound body of a cell request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CellRequest {
    /// The column query the cell answers.
    pub key: String,
    /// The row artifact the query is asked about.
    pub context: Value,
    /// Provider, model and offered functions.
    pub settings: Settings,
}

/// One row of the primary column.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryCell {
    /// The artifact the row stands for.
    pub context: Value,
    /// Text shown in the cell.
    pub display_value: String,
}

impl From<Value> for PrimaryCell {
    fn from(context: Value) -> Self {
        let display_value = match context.get("value") {
            Some(Value::String(value)) if !value.is_empty() => value.clone(),
            _ => context.to_string(),
        };
        Self {
            context,
            display_value,
        }
    }
}

/// A grid with its primary column filled.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    /// The query the grid was created from.
    pub title: String,
    /// One cell per produced item.
    pub primary_column: Vec<PrimaryCell>,
}

/// An answered cell.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// The column query.
    pub key: String,
    /// The row artifact.
    pub context: Value,
    /// The model's answer.
    pub display_value: String,
}
