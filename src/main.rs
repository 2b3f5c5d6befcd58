use atheme_rpc::core::invoke::OutputFormat;
use atheme_rpc::utils::error::RpcError;
use atheme_rpc::utils::{logger, validation::Validate};
use atheme_rpc::{app, AthemeClient, CliConfig, Invoker, RpcTransport};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose, cli.log_json);
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => fail(e),
    };
    if let Err(e) = config.validate() {
        fail(e);
    }

    let transport = match RpcTransport::from_config(&config) {
        Ok(transport) => transport,
        Err(e) => fail(e),
    };
    tracing::info!("Connecting to {} ({:?})", transport.endpoint(), transport.kind());

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let invoker = Invoker::new(AthemeClient::new(transport)).with_format(format);

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = app::execute(cli.command.as_ref(), &config.session, &invoker, &mut stdout).await {
        fail(e);
    }
}

fn fail(e: RpcError) -> ! {
    tracing::error!(
        "❌ Call failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code());
}
