//! MCP Tool definitions and handlers
//!
//! Tools are declared in [`TOOLS`], a table mapping each tool name to its
//! argument schema and argument parser. Parsing turns untyped arguments into
//! a [`ToolRequest`]; running a request fetches beaches once and feeds them
//! through the matching pipeline.

use std::sync::Arc;

use schemars::gen::{SchemaGenerator, SchemaSettings};
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::beaches::client::BeachSource;
use crate::beaches::pipeline::{
    self, BestCriteria, CompareCriteria, MapCriteria, BEST_TOP_N, DEFAULT_COMPARE_LIMIT,
    DEFAULT_MAX_WIND, DEFAULT_MIN_TEMP,
};
use crate::beaches::ranking::SwimFilter;
use crate::beaches::types::{EnrichedBeach, ScoredBeach, WaterQuality};
use crate::error::{McpError, Result};
use crate::mcp::types::{CallToolResult, Tool, ToolAnnotations};
use crate::mcp::widgets::WidgetRegistry;

/// Text returned to the caller when the beach API cannot be used
pub const UPSTREAM_FAILURE_TEXT: &str = "Failed to fetch beach data from API";

/// Validated arguments of one tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    Map(MapCriteria),
    Compare(CompareCriteria),
    Best(BestCriteria),
}

/// Dispatch table entry
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: fn() -> Value,
    pub parse: fn(Value) -> std::result::Result<ToolRequest, McpError>,
}

pub static TOOLS: [ToolSpec; 3] = [
    ToolSpec {
        name: "beach-map",
        description: "Show an interactive map of Danish beaches with water quality, temperature, and weather information. Use this for geographical visualization of beaches.",
        input_schema: schema_for::<MapArgs>,
        parse: parse_map,
    },
    ToolSpec {
        name: "beach-compare",
        description: "Compare multiple beaches side-by-side to help decide which beach is best. Shows detailed comparison of water quality, temperature, wind conditions, and more.",
        input_schema: schema_for::<CompareArgs>,
        parse: parse_compare,
    },
    ToolSpec {
        name: "beach-best",
        description: "Find and rank the best beaches for swimming based on current conditions. Filters beaches by water quality, temperature, wind speed, and other criteria to recommend ideal swimming spots.",
        input_schema: schema_for::<BestArgs>,
        parse: parse_best,
    },
];

pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|spec| spec.name == name)
}

/// Validate `args` for the named tool without running it
pub fn parse_request(name: &str, args: Value) -> std::result::Result<ToolRequest, McpError> {
    let spec = find_tool(name).ok_or_else(|| McpError::UnknownTool {
        name: name.to_string(),
    })?;
    (spec.parse)(args)
}

// ==================== Arguments ====================

/// Arguments for the map view
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct MapArgs {
    /// Filter beaches by municipality name (optional).
    municipality: Option<String>,

    /// Filter by water quality: 1 = poor, 2 = good (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "quality_class_schema")]
    #[validate(range(min = 1.0, max = 2.0, message = "must be 1 (poor) or 2 (good)"))]
    water_quality_filter: Option<f64>,
}

/// Arguments for the beach comparison
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CompareArgs {
    /// Filter beaches by municipality name (optional).
    municipality: Option<String>,

    /// Number of top beaches to compare (default: 3, max: 10).
    #[schemars(default = "default_limit")]
    #[validate(range(min = 2.0, max = 10.0, message = "must be between 2 and 10"))]
    limit: Option<f64>,
}

/// Arguments for the swim recommendations
#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct BestArgs {
    /// Minimum water temperature in Celsius (optional, default: 12).
    #[schemars(default = "default_min_temp")]
    #[validate(range(min = 0.0, max = 30.0, message = "must be between 0 and 30"))]
    min_temp: Option<f64>,

    /// Maximum wind speed in m/s (optional, default: 10).
    #[schemars(default = "default_max_wind")]
    #[validate(range(min = 0.0, max = 20.0, message = "must be between 0 and 20"))]
    max_wind: Option<f64>,

    /// Only show beaches with good water quality (optional, default: true).
    #[schemars(default = "default_only_good_quality")]
    only_good_quality: Option<bool>,

    /// Filter beaches by municipality name (optional).
    municipality: Option<String>,
}

// Defaults advertised in the input schemas
fn default_limit() -> Option<f64> {
    Some(DEFAULT_COMPARE_LIMIT as f64)
}

fn default_min_temp() -> Option<f64> {
    Some(DEFAULT_MIN_TEMP)
}

fn default_max_wind() -> Option<f64> {
    Some(DEFAULT_MAX_WIND)
}

fn default_only_good_quality() -> Option<bool> {
    Some(true)
}

fn quality_class_schema(_: &mut SchemaGenerator) -> Schema {
    let mut schema = SchemaObject {
        instance_type: Some(InstanceType::Number.into()),
        enum_values: Some(vec![1.into(), 2.into()]),
        ..Default::default()
    };
    schema.metadata().description =
        Some("Filter by water quality: 1 = poor, 2 = good (optional).".to_string());
    schema.into()
}

fn schema_for<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.option_nullable = false;
            s.option_add_null_type = false;
            s.meta_schema = None;
        })
        .into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let mut schema =
        serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}));

    // The argument struct's own name and docs are not part of the tool contract
    if let Some(root) = schema.as_object_mut() {
        root.remove("title");
        root.remove("description");
    }
    schema
}

fn parse_args<T>(args: Value) -> std::result::Result<T, McpError>
where
    T: DeserializeOwned + Validate,
{
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        Value::Object(_) => args,
        _ => return Err(McpError::invalid_argument("arguments", "must be an object")),
    };

    let parsed: T = serde_path_to_error::deserialize(args).map_err(|e| {
        let field = e.path().to_string();
        let field = if field == "." { "arguments".to_string() } else { field };
        McpError::invalid_argument(field, e.into_inner().to_string())
    })?;
    parsed.validate().map_err(first_violation)?;
    Ok(parsed)
}

fn first_violation(errors: ValidationErrors) -> McpError {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.keys().copied().collect();
    fields.sort_unstable();

    match fields.first() {
        Some(&field) => {
            let constraint = field_errors[field]
                .first()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .unwrap_or_else(|| "invalid value".to_string());
            McpError::invalid_argument(camel_case(field), constraint)
        }
        None => McpError::invalid_argument("arguments", errors.to_string()),
    }
}

/// Report validation errors under the argument's wire name
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_map(args: Value) -> std::result::Result<ToolRequest, McpError> {
    let args: MapArgs = parse_args(args)?;
    let water_quality = match args.water_quality_filter {
        None => None,
        Some(class) if class == 1.0 => Some(WaterQuality::Poor),
        Some(class) if class == 2.0 => Some(WaterQuality::Good),
        Some(_) => {
            return Err(McpError::invalid_argument(
                "waterQualityFilter",
                "must be 1 (poor) or 2 (good)",
            ))
        }
    };

    Ok(ToolRequest::Map(MapCriteria {
        municipality: args.municipality,
        water_quality,
    }))
}

fn parse_compare(args: Value) -> std::result::Result<ToolRequest, McpError> {
    let args: CompareArgs = parse_args(args)?;
    Ok(ToolRequest::Compare(CompareCriteria {
        municipality: args.municipality,
        // Fractional limits round down, range already checked
        limit: args
            .limit
            .map(|limit| limit.trunc() as usize)
            .unwrap_or(DEFAULT_COMPARE_LIMIT),
    }))
}

fn parse_best(args: Value) -> std::result::Result<ToolRequest, McpError> {
    let args: BestArgs = parse_args(args)?;
    Ok(ToolRequest::Best(BestCriteria {
        municipality: args.municipality,
        filter: SwimFilter {
            only_good_quality: args.only_good_quality.unwrap_or(true),
            min_water_temperature: args.min_temp.unwrap_or(DEFAULT_MIN_TEMP),
            max_wind_speed: args.max_wind.unwrap_or(DEFAULT_MAX_WIND),
        },
    }))
}

// ==================== Structured content ====================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapContent {
    beaches: Vec<EnrichedBeach>,
    #[serde(skip_serializing_if = "Option::is_none")]
    municipality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    water_quality_filter: Option<u8>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareContent {
    beaches: Vec<ScoredBeach>,
    #[serde(skip_serializing_if = "Option::is_none")]
    municipality: Option<String>,
    limit: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BestContent {
    beaches: Vec<ScoredBeach>,
    criteria: BestCriteriaEcho,
    #[serde(skip_serializing_if = "Option::is_none")]
    municipality: Option<String>,
    top_n: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BestCriteriaEcho {
    min_temp: f64,
    max_wind: f64,
    only_good_quality: bool,
}

// ==================== Handler ====================

/// Tool handler
pub struct ToolHandler {
    source: Arc<dyn BeachSource>,
    widgets: Arc<WidgetRegistry>,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(source: Arc<dyn BeachSource>, widgets: Arc<WidgetRegistry>) -> Self {
        Self { source, widgets }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        TOOLS
            .iter()
            .map(|spec| {
                let widget = self.widgets.by_id(spec.name);
                Tool {
                    name: spec.name.to_string(),
                    title: widget.map(|w| w.descriptor.title.to_string()),
                    description: Some(spec.description.to_string()),
                    input_schema: (spec.input_schema)(),
                    annotations: Some(ToolAnnotations::read_only()),
                    meta: widget.map(|w| w.meta()),
                }
            })
            .collect()
    }

    /// Call a tool by name
    ///
    /// Unknown tools and invalid arguments fail before any upstream fetch.
    /// Upstream failures are returned as errors; no partial result is built.
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<CallToolResult> {
        let widget = self.widgets.by_id(name).ok_or_else(|| McpError::UnknownTool {
            name: name.to_string(),
        })?;
        let request = parse_request(name, args)?;

        tracing::debug!(tool = name, ?request, "Running tool");
        let content = self.run(request).await?;

        Ok(CallToolResult::text(widget.descriptor.response_text)
            .with_structured_content(content)
            .with_meta(widget.meta()))
    }

    async fn run(&self, request: ToolRequest) -> Result<Value> {
        let records = self.source.fetch_beaches().await?;

        let content = match request {
            ToolRequest::Map(criteria) => serde_json::to_value(MapContent {
                beaches: pipeline::map_view(&records, &criteria),
                water_quality_filter: criteria.water_quality.and_then(|q| q.class()),
                municipality: criteria.municipality,
            })?,
            ToolRequest::Compare(criteria) => serde_json::to_value(CompareContent {
                beaches: pipeline::compare(&records, &criteria),
                limit: criteria.limit,
                municipality: criteria.municipality,
            })?,
            ToolRequest::Best(criteria) => serde_json::to_value(BestContent {
                beaches: pipeline::best_for_swimming(&records, &criteria),
                criteria: BestCriteriaEcho {
                    min_temp: criteria.filter.min_water_temperature,
                    max_wind: criteria.filter.max_wind_speed,
                    only_good_quality: criteria.filter.only_good_quality,
                },
                municipality: criteria.municipality,
                top_n: BEST_TOP_N,
            })?,
        };

        Ok(content)
    }
}
