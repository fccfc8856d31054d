//! Subcommand implementations.
//!
//! Every remote command prints the operation's JSON envelope to stdout and
//! turns an unsuccessful envelope into [`ClientError::Operation`].

pub mod config;
pub mod event;
pub mod route;

use ridesched_core::Tag;
use ridesched_remote::{OperationResult, RemoteClient, ReqwestTransport, Transport};
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Builds a client over the reqwest transport from the loaded configuration.
pub fn connect(config: &ClientConfig) -> ClientResult<RemoteClient<ReqwestTransport>> {
    let remote = config.to_remote_config().map_err(ClientError::Config)?;
    let credentials = config.resolve_credentials().map_err(ClientError::Config)?;
    let transport = ReqwestTransport::new(&remote)?;

    let client = RemoteClient::new(transport, credentials, remote);
    let directory = config.organizer_directory();
    if directory.is_empty() {
        Ok(client)
    } else {
        debug!(organizers = directory.len(), "using configured organizer directory");
        Ok(client.with_organizer_lookup(directory))
    }
}

/// Signs in unless a session is already held.
///
/// A failed sign-in is not an error here; the operation that needed the
/// session reports it.
pub fn ensure_session<T: Transport>(client: &mut RemoteClient<T>) {
    if !client.session().is_established() {
        client.login();
    }
}

/// Signs in and reports the outcome.
pub fn login<T: Transport>(client: &mut RemoteClient<T>) -> ClientResult<()> {
    let result = if client.login() {
        OperationResult::ok(())
    } else {
        OperationResult::failure(ridesched_remote::RemoteError::auth_failed(
            "sign-in did not return a session cookie",
        ))
    };
    emit(&result)
}

/// Renders an envelope as pretty JSON.
pub fn render<T: Serialize>(result: &OperationResult<T>) -> ClientResult<String> {
    serde_json::to_string_pretty(result)
        .map_err(|e| ClientError::Operation(format!("failed to serialize result: {}", e)))
}

/// Prints an envelope and maps failure to an error.
pub fn emit<T: Serialize>(result: &OperationResult<T>) -> ClientResult<()> {
    println!("{}", render(result)?);
    check(result)
}

fn check<T>(result: &OperationResult<T>) -> ClientResult<()> {
    if result.is_success() {
        Ok(())
    } else {
        Err(ClientError::Operation(
            result.error().unwrap_or("operation failed").to_string(),
        ))
    }
}

/// Parses tag arguments.
pub fn parse_tags(raw: &[String]) -> ClientResult<Vec<Tag>> {
    raw.iter()
        .map(|t| Tag::new(t).map_err(|e| ClientError::Input(e.to_string())))
        .collect()
}


#[cfg(test)]
mod tests {
    use ridesched_remote::RemoteError;

    use super::testing::{CannedTransport, api_client};
    use super::*;

    #[test]
    fn render_uses_envelope_field_names() {
        let result = OperationResult::ok(42).with_route_url("https://rides.test/routes/1");
        let value: serde_json::Value = serde_json::from_str(&render(&result).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "success": true,
                "data": 42,
                "routeUrl": "https://rides.test/routes/1",
                "warnings": []
            })
        );
    }

    #[test]
    fn failed_envelope_becomes_operation_error() {
        let result: OperationResult<()> =
            OperationResult::failure(RemoteError::validation("no tags given"));
        match check(&result) {
            Err(ClientError::Operation(msg)) => assert!(msg.contains("no tags given")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn login_without_credentials_fails() {
        let transport = CannedTransport::default();
        let mut client = api_client(&transport);
        assert!(matches!(login(&mut client), Err(ClientError::Operation(_))));
        assert!(transport.urls.borrow().is_empty());
    }

    #[test]
    fn ensure_session_is_quiet_on_failure() {
        let transport = CannedTransport::default();
        let mut client = api_client(&transport);
        ensure_session(&mut client);
        assert!(!client.session().is_established());
    }

    #[test]
    fn parse_tags_rejects_invalid() {
        assert!(parse_tags(&["club".into(), "EXP:2025-02-08".into()]).is_ok());
        assert!(matches!(parse_tags(&["a,b".into()]), Err(ClientError::Input(_))));
    }
}
