//! Event commands.

use std::path::Path;

use ridesched_core::time::parse_timestamp;
use ridesched_core::{NormalizedEvent, RouteIdentity, RouteRef, Visibility};
use ridesched_remote::{Dialect, Logo, Organizers, RemoteClient, Transport};

use crate::cli::{EventAction, EventFields, TagArgs};
use crate::commands::{emit, ensure_session, parse_tags};
use crate::error::{ClientError, ClientResult};

/// Runs an event subcommand.
pub fn run<T: Transport>(client: &mut RemoteClient<T>, action: EventAction) -> ClientResult<()> {
    if client.config().event_dialect == Dialect::Web && reads_or_edits(&action) {
        ensure_session(client);
    }

    match action {
        EventAction::Get { url } => emit(&client.get_event(&url)),
        EventAction::Delete { url } => emit(&client.delete_event(&url)),
        EventAction::Cancel { url } => emit(&client.cancel_event(&url)),
        EventAction::Reinstate { url } => emit(&client.reinstate_event(&url)),
        EventAction::Schedule { fields, logo } => {
            let event = to_event(&fields)?;
            let organizers = organizers(&fields).unwrap_or(Organizers::Names(Vec::new()));
            let logo = logo.as_deref().map(read_logo).transpose()?;
            emit(&client.schedule_event(&event, &organizers, logo.as_ref()))
        }
        EventAction::Update { url, fields } => {
            let event = to_event(&fields)?;
            emit(&client.update_event(&url, &event, organizers(&fields).as_ref()))
        }
        EventAction::Copy { template, name } => {
            ensure_session(client);
            emit(&client.copy_template(&template, name.as_deref()))
        }
        EventAction::Tag { tags } => tag(client, &tags),
    }
}

fn reads_or_edits(action: &EventAction) -> bool {
    matches!(
        action,
        EventAction::Get { .. } | EventAction::Cancel { .. } | EventAction::Reinstate { .. }
    )
}

fn tag<T: Transport>(client: &mut RemoteClient<T>, args: &TagArgs) -> ClientResult<()> {
    let tags = parse_tags(&args.tags)?;
    let urls: Vec<&str> = args.urls.iter().map(String::as_str).collect();
    ensure_session(client);
    if args.remove {
        emit(&client.remove_event_tags(&urls, &tags))
    } else {
        emit(&client.add_event_tags(&urls, &tags))
    }
}

/// Builds the event fields from command-line flags.
pub fn to_event(fields: &EventFields) -> ClientResult<NormalizedEvent> {
    let mut event = NormalizedEvent::new(fields.name.clone().unwrap_or_default());
    event.desc = fields.desc.clone();
    event.location = fields.location.clone();
    event.starts_at = fields.start.as_deref().map(|s| timestamp("start", s)).transpose()?;
    event.ends_at = fields.end.as_deref().map(|s| timestamp("end", s)).transpose()?;

    if let Some(ref raw) = fields.visibility {
        event.visibility = Some(
            Visibility::from_name(raw)
                .ok_or_else(|| ClientError::Input(format!("unknown visibility {:?}", raw)))?,
        );
    }
    if fields.all_day {
        event.all_day = Some(true);
    }
    if !fields.routes.is_empty() {
        let routes = fields
            .routes
            .iter()
            .map(|url| {
                RouteIdentity::parse(url)
                    .map(|id| RouteRef::new(id.id()))
                    .map_err(|e| ClientError::Input(e.to_string()))
            })
            .collect::<ClientResult<Vec<_>>>()?;
        event.routes = Some(routes);
    }
    Ok(event)
}

/// Organizers given on the command line, if any.
pub fn organizers(fields: &EventFields) -> Option<Organizers> {
    if !fields.organizers.is_empty() {
        Some(Organizers::Names(fields.organizers.clone()))
    } else if !fields.organizer_ids.is_empty() {
        Some(Organizers::Ids(fields.organizer_ids.clone()))
    } else {
        None
    }
}

fn timestamp(flag: &str, value: &str) -> ClientResult<chrono::DateTime<chrono::FixedOffset>> {
    parse_timestamp(value)
        .ok_or_else(|| ClientError::Input(format!("--{} must be RFC 3339, got {:?}", flag, value)))
}

/// Reads a logo file, guessing the MIME type from its extension.
pub fn read_logo(path: &Path) -> ClientResult<Logo> {
    let bytes = std::fs::read(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mime = match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "logo".to_string());
    Ok(Logo::new(file_name, mime, bytes))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use ridesched_remote::HttpResponse;
    use serde_json::json;

    use super::*;
    use crate::commands::testing::{BASE, CannedTransport, api_client};

    fn fields() -> EventFields {
        EventFields {
            name: Some("Sat A Ride".into()),
            start: Some("2025-01-25T09:30:00-08:00".into()),
            ..Default::default()
        }
    }

    mod conversion {
        use super::*;

        #[test]
        fn flags_map_onto_event() {
            let mut f = fields();
            f.visibility = Some("friends_only".into());
            f.all_day = true;
            f.routes = vec!["https://ridewithgps.com/routes/50123-coast".into()];

            let event = to_event(&f).unwrap();
            assert_eq!(event.name, "Sat A Ride");
            assert_eq!(event.visibility, Some(Visibility::FriendsOnly));
            assert_eq!(event.all_day, Some(true));
            assert_eq!(event.routes, Some(vec![RouteRef::new("50123")]));
            assert_eq!(
                event.starts_at.unwrap().to_rfc3339(),
                "2025-01-25T09:30:00-08:00"
            );
            assert!(event.ends_at.is_none());
        }

        #[test]
        fn unset_all_day_stays_untouched() {
            assert_eq!(to_event(&fields()).unwrap().all_day, None);
        }

        #[test]
        fn bad_start_is_input_error() {
            let mut f = fields();
            f.start = Some("next saturday".into());
            assert!(matches!(to_event(&f), Err(ClientError::Input(msg)) if msg.contains("--start")));
        }

        #[test]
        fn event_url_is_not_a_route() {
            let mut f = fields();
            f.routes = vec!["https://ridewithgps.com/events/1".into()];
            assert!(matches!(to_event(&f), Err(ClientError::Input(_))));
        }

        #[test]
        fn organizer_flags() {
            let mut f = fields();
            assert_eq!(organizers(&f), None);
            f.organizer_ids = vec!["302732".into()];
            assert_eq!(organizers(&f), Some(Organizers::Ids(vec!["302732".into()])));
            f.organizers = vec!["Jane Rider".into()];
            assert_eq!(
                organizers(&f),
                Some(Organizers::Names(vec!["Jane Rider".into()]))
            );
        }
    }

    mod logo {
        use super::*;

        #[test]
        fn mime_follows_extension() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("Club.PNG");
            std::fs::File::create(&path)
                .unwrap()
                .write_all(b"\x89PNG")
                .unwrap();

            let logo = read_logo(&path).unwrap();
            assert_eq!(logo.file_name, "Club.PNG");
            assert_eq!(logo.mime_type, "image/png");
            assert_eq!(logo.bytes, b"\x89PNG");
        }

        #[test]
        fn missing_file_is_io_error() {
            let dir = tempfile::tempdir().unwrap();
            assert!(matches!(
                read_logo(&dir.path().join("absent.png")),
                Err(ClientError::Io(_))
            ));
        }
    }

    mod dispatch {
        use super::*;

        #[test]
        fn get_prints_and_succeeds() {
            let transport = CannedTransport::with([HttpResponse::new(
                200,
                json!({"event": {"id": 188822, "name": "Sat A Ride"}}).to_string(),
            )]);
            let mut client = api_client(&transport);

            run(
                &mut client,
                EventAction::Get {
                    url: format!("{BASE}/events/188822-sat-a-ride"),
                },
            )
            .unwrap();
            assert_eq!(
                transport.urls.borrow().as_slice(),
                [format!("{BASE}/api/v1/events/188822.json")]
            );
        }

        #[test]
        fn already_cancelled_is_operation_error() {
            let transport = CannedTransport::with([HttpResponse::new(
                200,
                json!({"event": {"id": 1, "name": "CANCELLED: Sat A Ride"}}).to_string(),
            )]);
            let mut client = api_client(&transport);

            let err = run(
                &mut client,
                EventAction::Cancel {
                    url: format!("{BASE}/events/1"),
                },
            )
            .unwrap_err();
            assert!(matches!(err, ClientError::Operation(_)));
            assert_eq!(transport.urls.borrow().len(), 1);
        }

        #[test]
        fn invalid_tag_fails_before_any_request() {
            let transport = CannedTransport::default();
            let mut client = api_client(&transport);
            let err = run(
                &mut client,
                EventAction::Tag {
                    tags: TagArgs {
                        urls: vec![format!("{BASE}/events/1")],
                        tags: vec!["a,b".into()],
                        remove: false,
                    },
                },
            )
            .unwrap_err();
            assert!(matches!(err, ClientError::Input(_)));
            assert!(transport.urls.borrow().is_empty());
        }
    }
}
