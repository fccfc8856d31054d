//! Route commands and the offline expiry-tag helper.

use chrono::NaiveDate;
use ridesched_core::build_expiry_tag;
use ridesched_core::time::parse_date;
use ridesched_remote::{ImportOptions, OperationResult, RemoteClient, Transport};

use crate::cli::{RouteAction, TagArgs};
use crate::commands::{emit, ensure_session, parse_tags};
use crate::error::{ClientError, ClientResult};

/// Runs a route subcommand.
pub fn run<T: Transport>(client: &mut RemoteClient<T>, action: RouteAction) -> ClientResult<()> {
    match action {
        RouteAction::Get { url } => emit(&client.get_route(&url)),
        RouteAction::Import {
            url,
            name,
            user_id,
            tags,
            expires,
        } => {
            let options = ImportOptions {
                name,
                user_id,
                tags: parse_tags(&tags)?,
                expiry: expires.as_deref().map(date).transpose()?,
            };
            emit(&client.import_route(&url, &options))
        }
        RouteAction::Expire { url, date: raw, force } => {
            let date = date(&raw)?;
            ensure_session(client);
            emit(&client.set_route_expiration(&url, date, force))
        }
        RouteAction::Tag { tags } => tag(client, &tags),
    }
}

fn tag<T: Transport>(client: &mut RemoteClient<T>, args: &TagArgs) -> ClientResult<()> {
    let tags = parse_tags(&args.tags)?;
    let urls: Vec<&str> = args.urls.iter().map(String::as_str).collect();
    ensure_session(client);
    if args.remove {
        emit(&client.remove_route_tags(&urls, &tags))
    } else {
        emit(&client.add_route_tags(&urls, &tags))
    }
}

/// Prints the `EXP:` tag `days` after `raw`.
pub fn expiry_tag(raw: &str, days: i64) -> ClientResult<()> {
    let tag = build_expiry_tag(date(raw)?, days).map_err(|e| ClientError::Input(e.to_string()))?;
    emit(&OperationResult::ok(tag.to_string()))
}

fn date(raw: &str) -> ClientResult<NaiveDate> {
    parse_date(raw).ok_or_else(|| {
        ClientError::Input(format!("expected YYYY-MM-DD or MM/DD/YYYY, got {:?}", raw))
    })
}
