use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 500;

pub const HEALTH_CHECK: &str = "health_check";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn paging_schema(extra: Option<(&str, Value)>) -> Value {
    let mut props = json!({
        "page": {"type": "integer", "minimum": 1, "default": DEFAULT_PAGE, "description": "Page number"},
        "limit": {"type": "integer", "minimum": 1, "maximum": MAX_LIMIT, "default": DEFAULT_LIMIT, "description": "Results per page (max 500)"}
    });
    if let (Some((name, schema)), Some(map)) = (extra, props.as_object_mut()) {
        map.insert(name.to_string(), schema);
    }
    json!({"type": "object", "properties": props})
}

fn id_schema(field: &str, what: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            field: {"type": ["integer", "string"], "description": format!("The {} ID", what)}
        },
        "required": [field]
    })
}

/// The static tool catalogue. Independent of authentication state.
pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    let tool = |name: &str, description: &str, input_schema: Value| ToolDescriptor {
        name: name.into(),
        description: description.into(),
        input_schema,
    };
    vec![
        tool(
            "get_account_info",
            "Get information about the Huntress account",
            json!({"type": "object", "properties": {}}),
        ),
        tool(
            "list_organizations",
            "List organizations in the account",
            paging_schema(None),
        ),
        tool(
            "get_organization",
            "Get details of a specific organization",
            id_schema("organization_id", "organization"),
        ),
        tool("list_agents", "List agents in the account", paging_schema(None)),
        tool(
            "get_agent",
            "Get details of a specific agent",
            id_schema("agent_id", "agent"),
        ),
        tool(
            "list_incidents",
            "List incident reports",
            paging_schema(Some((
                "status",
                json!({"type": "string", "enum": ["active", "resolved", "ignored"], "description": "Filter by incident status"}),
            ))),
        ),
        tool(
            "get_incident",
            "Get details of a specific incident report",
            id_schema("incident_id", "incident"),
        ),
        tool(
            HEALTH_CHECK,
            "Report whether the server is running and credentials are configured",
            json!({"type": "object", "properties": {}}),
        ),
    ]
}

/// Identifier argument; clients send either a number or a string.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ResourceId {
    Num(i64),
    Str(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Num(n) => write!(f, "{}", n),
            ResourceId::Str(s) => f.write_str(s.trim()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageInput {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Normalized paging parameters sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u32,
    pub limit: u32,
}

impl PageInput {
    pub fn normalize(&self) -> Paging {
        let page = self
            .page
            .map(|p| p.clamp(1, u32::MAX as i64) as u32)
            .unwrap_or(DEFAULT_PAGE);
        let limit = self
            .limit
            .map(|l| l.clamp(1, MAX_LIMIT as i64) as u32)
            .unwrap_or(DEFAULT_LIMIT);
        Paging { page, limit }
    }
}

impl Paging {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![("page", self.page.to_string()), ("limit", self.limit.to_string())]
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Active,
    Resolved,
    Ignored,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Active => "active",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Ignored => "ignored",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListIncidentsInput {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<IncidentStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrganizationIdInput {
    pub organization_id: Option<ResourceId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AgentIdInput {
    pub agent_id: Option<ResourceId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IncidentIdInput {
    pub incident_id: Option<ResourceId>,
}

/// A validated tool call, ready to be sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    HealthCheck,
    Upstream {
        endpoint: String,
        query: Vec<(&'static str, String)>,
    },
}

fn parse_args<T: for<'de> Deserialize<'de> + Default>(args: Value) -> Result<T, ToolError> {
    if args.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(args).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

fn required_id(id: Option<ResourceId>, field: &str) -> Result<String, ToolError> {
    let id = id
        .map(|i| i.to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::MissingParameter(field.to_string()))?;
    Ok(crate::http::encode_path_segment(&id))
}

/// Map a tool name and raw arguments to the request it stands for.
pub fn plan_call(name: &str, args: Value) -> Result<ToolCall, ToolError> {
    let upstream = |endpoint: String,
                    query: Vec<(&'static str, String)>|
     -> Result<ToolCall, ToolError> { Ok(ToolCall::Upstream { endpoint, query }) };
    match name {
        HEALTH_CHECK => Ok(ToolCall::HealthCheck),
        "get_account_info" => upstream("/account".into(), Vec::new()),
        "list_organizations" => {
            let input: PageInput = parse_args(args)?;
            upstream("/organizations".into(), input.normalize().query())
        }
        "get_organization" => {
            let input: OrganizationIdInput = parse_args(args)?;
            let id = required_id(input.organization_id, "organization_id")?;
            upstream(format!("/organizations/{}", id), Vec::new())
        }
        "list_agents" => {
            let input: PageInput = parse_args(args)?;
            upstream("/agents".into(), input.normalize().query())
        }
        "get_agent" => {
            let input: AgentIdInput = parse_args(args)?;
            let id = required_id(input.agent_id, "agent_id")?;
            upstream(format!("/agents/{}", id), Vec::new())
        }
        "list_incidents" => {
            let input: ListIncidentsInput = parse_args(args)?;
            let paging = PageInput {
                page: input.page,
                limit: input.limit,
            }
            .normalize();
            let mut query = paging.query();
            if let Some(status) = input.status {
                query.push(("status", status.as_str().to_string()));
            }
            upstream("/incidents".into(), query)
        }
        "get_incident" => {
            let input: IncidentIdInput = parse_args(args)?;
            let id = required_id(input.incident_id, "incident_id")?;
            upstream(format!("/incidents/{}", id), Vec::new())
        }
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}
