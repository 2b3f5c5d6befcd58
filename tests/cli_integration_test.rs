use anyhow::Result;
use atheme_rpc::core::invoke::OutputFormat;
use atheme_rpc::{app, AthemeClient, CliConfig, Invoker, RpcTransport};
use clap::Parser;
use httpmock::prelude::*;
use tempfile::TempDir;

fn string_response(value: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\r\n<methodResponse>\r\n<params>\r\n <param>\r\n  <value>\r\n   <string>{}</string>\r\n  </value>\r\n </param>\r\n</params>\r\n</methodResponse>",
        value
    )
}

/// Parses `args` like the binary does and runs the command, returning stdout.
async fn run_cli(args: &[&str]) -> Result<String> {
    let cli = CliConfig::try_parse_from(args)?;
    let config = cli.resolve()?;
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let invoker =
        Invoker::new(AthemeClient::new(RpcTransport::from_config(&config)?)).with_format(format);

    let mut out = Vec::new();
    app::execute(cli.command.as_ref(), &config.session, &invoker, &mut out).await?;
    Ok(String::from_utf8(out)?)
}

#[tokio::test]
async fn test_alis_subcommand_builds_list_params() -> Result<()> {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/xmlrpc")
                .body_contains("<string>ALIS</string></value></param>\n<param><value><string>LIST</string></value></param>\n<param><value><string>#atheme*</string></value></param>\n<param><value><string>-min</string></value></param>\n<param><value><string>3</string></value></param>\n<param><value><string>-mode</string></value></param>\n<param><value><string>-s</string></value></param>");
            then.status(200).body(string_response("#atheme-dev 12 :Development"));
        })
        .await;

    let endpoint = server.url("/xmlrpc");
    let output = run_cli(&[
        "atheme-rpc", "--endpoint", &endpoint, "alis", "#atheme*", "--min", "3", "--mode", "-s",
    ])
    .await?;

    list.assert_async().await;
    assert_eq!(output, "#atheme-dev 12 :Development\n");
    Ok(())
}

#[tokio::test]
async fn test_command_subcommand_with_session() -> Result<()> {
    let server = MockServer::start_async().await;
    let info = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/xmlrpc")
                .body_contains("<param><value><string>abcdef</string></value></param>\n<param><value><string>jilles</string></value></param>\n<param><value><string>192.0.2.1</string></value></param>\n<param><value><string>NickServ</string></value></param>\n<param><value><string>INFO</string></value></param>\n<param><value><string>jilles</string></value></param>");
            then.status(200).body(string_response("Information on jilles"));
        })
        .await;

    let endpoint = server.url("/xmlrpc");
    let output = run_cli(&[
        "atheme-rpc",
        "--endpoint",
        &endpoint,
        "command",
        "--cookie",
        "abcdef",
        "--account",
        "jilles",
        "--source-ip",
        "192.0.2.1",
        "NickServ",
        "INFO",
        "jilles",
    ])
    .await?;

    info.assert_async().await;
    assert_eq!(output, "Information on jilles\n");
    Ok(())
}

#[tokio::test]
async fn test_profile_supplies_endpoint_and_session() -> Result<()> {
    let server = MockServer::start_async().await;
    let command = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rpc")
                .body_contains("<param><value><string>cookie-from-env</string></value></param>\n<param><value><string>jilles</string></value></param>\n<param><value><string>::1</string></value></param>");
            then.status(200).body(string_response("ok"));
        })
        .await;

    std::env::set_var("ATHEME_RPC_CLI_TEST_COOKIE", "cookie-from-env");
    let temp_dir = TempDir::new()?;
    let profile_path = temp_dir.path().join("profile.toml");
    tokio::fs::write(
        &profile_path,
        format!(
            "[server]\nendpoint = \"{}\"\n\n[session]\nauthcookie = \"${{ATHEME_RPC_CLI_TEST_COOKIE}}\"\naccount = \"jilles\"\n",
            server.url("/rpc")
        ),
    )
    .await?;

    let profile = profile_path.to_str().unwrap_or_default().to_string();
    let output = run_cli(&["atheme-rpc", "--config", &profile]).await?;

    command.assert_async().await;
    assert_eq!(output, "ok\n");
    Ok(())
}

#[tokio::test]
async fn test_call_subcommand_with_json_output() -> Result<()> {
    let server = MockServer::start_async().await;
    let metadata = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/xmlrpc")
                .body_contains("<methodName>atheme.metadata</methodName>");
            then.status(200).body(string_response("https://atheme.github.io/"));
        })
        .await;

    let endpoint = server.url("/xmlrpc");
    let output = run_cli(&[
        "atheme-rpc", "--endpoint", &endpoint, "--json", "call", "atheme.metadata", "#atheme", "url",
    ])
    .await?;

    metadata.assert_async().await;
    assert_eq!(output, "\"https://atheme.github.io/\"\n");
    Ok(())
}

#[tokio::test]
async fn test_login_prints_authcookie() -> Result<()> {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/xmlrpc")
                .body_contains("<methodName>atheme.login</methodName>")
                .body_contains("<string>hunter2</string>");
            then.status(200).body(string_response("q1w2e3r4t5"));
        })
        .await;

    let endpoint = server.url("/xmlrpc");
    let output = run_cli(&["atheme-rpc", "--endpoint", &endpoint, "login", "jilles", "hunter2"]).await?;

    login.assert_async().await;
    assert_eq!(output, "q1w2e3r4t5\n");
    Ok(())
}

#[tokio::test]
async fn test_login_uses_profile_source_ip() -> Result<()> {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/xmlrpc")
                .body_contains("<methodName>atheme.login</methodName>")
                .body_contains("<param><value><string>hunter2</string></value></param>\n<param><value><string>198.51.100.4</string></value></param>");
            then.status(200).body(string_response("q1w2e3r4t5"));
        })
        .await;

    let temp_dir = TempDir::new()?;
    let profile_path = temp_dir.path().join("profile.toml");
    tokio::fs::write(
        &profile_path,
        format!(
            "[server]\nendpoint = \"{}\"\n\n[session]\nsource_ip = \"198.51.100.4\"\n",
            server.url("/xmlrpc")
        ),
    )
    .await?;

    let profile = profile_path.to_str().unwrap_or_default().to_string();
    let output = run_cli(&["atheme-rpc", "--config", &profile, "login", "jilles", "hunter2"]).await?;

    login.assert_async().await;
    assert_eq!(output, "q1w2e3r4t5\n");
    Ok(())
}
