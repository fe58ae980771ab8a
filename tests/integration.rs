use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cmd() -> anyhow::Result<Command> {
    let mut cmd = Command::cargo_bin("huntress-mcp")?;
    cmd.env_remove("HUNTRESS_API_KEY")
        .env_remove("HUNTRESS_API_SECRET")
        .env_remove("PORT")
        .arg("--log-level")
        .arg("warn");
    Ok(cmd)
}

fn run(reqs: &[serde_json::Value]) -> anyhow::Result<Vec<serde_json::Value>> {
    let mut input = Vec::new();
    for req in reqs {
        writeln!(input, "{}", serde_json::to_string(req)?)?;
    }
    let assert = cmd()?.write_stdin(input).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone())?;
    Ok(output
        .lines()
        .map(serde_json::from_str::<serde_json::Value>)
        .collect::<Result<_, _>>()?)
}

#[test]
fn version_flag() -> anyhow::Result<()> {
    cmd()?
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("huntress-mcp "));
    Ok(())
}

#[test]
fn initialize_and_tools_list_without_credentials() -> anyhow::Result<()> {
    let out = run(&[
        serde_json::json!({"jsonrpc":"2.0","method":"initialize","id":1,"params":{"protocolVersion":"2024-11-05"}}),
        serde_json::json!({"jsonrpc":"2.0","method":"notifications/initialized"}),
        serde_json::json!({"jsonrpc":"2.0","method":"tools/list","id":2}),
    ])?;
    assert_eq!(out.len(), 2, "notifications get no reply");
    assert_eq!(out[0]["result"]["serverInfo"]["name"], "huntress-mcp");
    assert!(out[0]["result"]["protocolVersion"].is_string());

    let tools = out[1]["result"]["tools"].as_array().expect("tools array");
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    for expected in [
        "get_account_info",
        "list_organizations",
        "get_organization",
        "list_agents",
        "get_agent",
        "list_incidents",
        "get_incident",
    ] {
        assert!(names.contains(&expected), "missing {expected}");
    }
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    Ok(())
}

#[test]
fn tool_call_without_credentials_is_auth_error() -> anyhow::Result<()> {
    let out = run(&[serde_json::json!({
        "jsonrpc":"2.0","method":"tools/call","id":1,
        "params":{"name":"get_account_info","arguments":{}}
    })])?;
    assert_eq!(out[0]["result"]["isError"], true);
    let text = out[0]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("auth_required"));
    Ok(())
}

#[test]
fn health_check_reports_missing_credentials() -> anyhow::Result<()> {
    let out = run(&[serde_json::json!({
        "jsonrpc":"2.0","method":"tools/call","id":1,
        "params":{"name":"health_check"}
    })])?;
    let text = out[0]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("is running"));
    assert!(text.contains("Credentials: not configured"));
    Ok(())
}

#[test]
fn caller_errors_are_rpc_errors() -> anyhow::Result<()> {
    let out = run(&[
        serde_json::json!({"jsonrpc":"2.0","method":"tools/call","id":1,"params":{"name":"nope","arguments":{}}}),
        serde_json::json!({"jsonrpc":"2.0","method":"tools/call","id":2,"params":{"name":"get_agent","arguments":{}}}),
        serde_json::json!({"jsonrpc":"2.0","method":"resources/list","id":3}),
    ])?;
    assert_eq!(out[0]["error"]["code"], -32601);
    assert_eq!(out[1]["error"]["code"], -32602);
    assert!(out[1]["error"]["message"]
        .as_str()
        .unwrap()
        .contains("agent_id"));
    assert_eq!(out[2]["error"]["code"], -32601);
    Ok(())
}
