// Application layer: maps parsed CLI commands onto client calls.

use crate::config::cli::Commands;
use crate::config::SessionDefaults;
use crate::core::alis::{AlisQuery, ModeMatch};
use crate::core::invoke::Invoker;
use crate::core::{CommandRequest, MethodCall, Result, Transport};
use crate::utils::validation::validate_non_empty_string;
use std::io::Write;

/// The call made when no subcommand is given: `ALIS LIST *` with empty
/// session fields.
pub fn default_request(session: &SessionDefaults) -> CommandRequest {
    with_session(AlisQuery::default().into_request(), session)
}

fn with_session(request: CommandRequest, session: &SessionDefaults) -> CommandRequest {
    request
        .session(session.authcookie.clone(), session.account.clone())
        .source_ip(session.source_ip.clone())
}

/// Runs one CLI command and writes its result to `out`.
pub async fn execute<T, W>(
    command: Option<&Commands>,
    session: &SessionDefaults,
    invoker: &Invoker<T>,
    out: &mut W,
) -> Result<()>
where
    T: Transport,
    W: Write,
{
    let client = invoker.client();

    match command {
        None => {
            invoker.run_command(&default_request(session), out).await?;
        }
        Some(Commands::Command {
            session: args,
            service,
            command,
            params,
        }) => {
            let request = with_session(
                CommandRequest::new(service.as_str(), command.as_str()).params(params.iter().cloned()),
                &args.resolve(session),
            );
            invoker.run_command(&request, out).await?;
        }
        Some(Commands::Alis {
            session: args,
            mask,
            min,
            max,
            skip,
            maxmatches,
            topic,
            show,
            mode,
        }) => {
            let mut query = AlisQuery::new(mask.as_str());
            if let Some(min) = min {
                query = query.min_users(*min);
            }
            if let Some(max) = max {
                query = query.max_users(*max);
            }
            if let Some(skip) = skip {
                query = query.skip(*skip);
            }
            if let Some(maxmatches) = maxmatches {
                query = query.max_matches(*maxmatches);
            }
            if let Some(topic) = topic {
                query = query.topic(topic.as_str());
            }
            if let Some(show) = show {
                query = query.show(*show);
            }
            if let Some(mode) = mode {
                let (matching, modes) = ModeMatch::parse_arg(mode)?;
                query = query.mode(matching, modes);
            }
            let request = with_session(query.into_request(), &args.resolve(session));
            invoker.run_command(&request, out).await?;
        }
        Some(Commands::Login {
            account,
            password,
            source_ip,
        }) => {
            let source_ip = source_ip.as_deref().unwrap_or(&session.source_ip);
            let cookie = client.login(account, password, Some(source_ip)).await?;
            invoker.emit(&cookie, out)?;
        }
        Some(Commands::Logout { authcookie, account }) => {
            let reply = client.logout(authcookie, account).await?;
            invoker.emit(&reply, out)?;
        }
        Some(Commands::Privset { authcookie, account }) => {
            let privs = client.privset(authcookie, account).await?;
            invoker.emit(&privs, out)?;
        }
        Some(Commands::Ison { nick }) => {
            let ison = client.ison(nick).await?;
            invoker.emit(&ison, out)?;
        }
        Some(Commands::Metadata { target, key }) => {
            let value = client.metadata(target, key).await?;
            invoker.emit(&value, out)?;
        }
        Some(Commands::Call { method, params }) => {
            validate_non_empty_string("method", method)?;
            let request = MethodCall::with_params(method.as_str(), params.iter().map(String::as_str));
            invoker.run(&request, out).await?;
        }
    }

    Ok(())
}
