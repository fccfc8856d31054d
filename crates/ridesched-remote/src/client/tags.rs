//! Batch tag updates for events and routes (session scheme).

use ridesched_core::{EventKind, Identity, Kind, ResourceKind, RouteKind, Tag, join_tags};
use serde::Serialize;
use tracing::debug;

use crate::auth::AuthScheme;
use crate::error::{RemoteError, RemoteResult};
use crate::result::OperationResult;
use crate::transport::{HttpRequest, Transport};

use super::{RemoteClient, fail};

/// Whether a batch update adds or removes tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagAction {
    Add,
    Remove,
}

impl TagAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

#[derive(Serialize)]
struct BatchTagBody<'a> {
    tag_action: TagAction,
    tag_names: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_ids: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    route_ids: Option<&'a str>,
}

impl<T: Transport> RemoteClient<T> {
    pub fn add_event_tags(&mut self, urls: &[&str], tags: &[Tag]) -> OperationResult<()> {
        self.tag_resources::<EventKind>(urls, TagAction::Add, tags)
    }

    pub fn remove_event_tags(&mut self, urls: &[&str], tags: &[Tag]) -> OperationResult<()> {
        self.tag_resources::<EventKind>(urls, TagAction::Remove, tags)
    }

    pub fn add_route_tags(&mut self, urls: &[&str], tags: &[Tag]) -> OperationResult<()> {
        self.tag_resources::<RouteKind>(urls, TagAction::Add, tags)
    }

    pub fn remove_route_tags(&mut self, urls: &[&str], tags: &[Tag]) -> OperationResult<()> {
        self.tag_resources::<RouteKind>(urls, TagAction::Remove, tags)
    }

    fn tag_resources<K: Kind>(&mut self, urls: &[&str], action: TagAction, tags: &[Tag]) -> OperationResult<()> {
        let context = match K::KIND {
            ResourceKind::Event => "tag events",
            ResourceKind::Route => "tag routes",
        };
        let ids: Result<Vec<String>, _> = urls
            .iter()
            .map(|url| Identity::<K>::parse(url).map(|id| id.id().to_string()))
            .collect();
        let result = ids
            .map_err(RemoteError::from)
            .and_then(|ids| self.batch_tags(K::KIND, &ids, action, tags));
        match result {
            Ok(()) => OperationResult::ok(()),
            Err(e) => fail(e, context),
        }
    }

    /// Issues one batch tag request for `ids` of `kind`.
    pub(crate) fn batch_tags(
        &mut self,
        kind: ResourceKind,
        ids: &[String],
        action: TagAction,
        tags: &[Tag],
    ) -> RemoteResult<()> {
        if ids.is_empty() {
            return Err(RemoteError::validation("no resources to tag"));
        }
        if tags.is_empty() {
            return Err(RemoteError::validation("no tags given"));
        }

        let joined_ids = ids.join(",");
        let (path, context, body) = match kind {
            ResourceKind::Event => (
                "events/batch_update_tags.json",
                "tag events",
                BatchTagBody {
                    tag_action: action,
                    tag_names: join_tags(tags),
                    event_ids: Some(&joined_ids),
                    route_ids: None,
                },
            ),
            ResourceKind::Route => (
                "routes/batch_update_tags.json",
                "tag routes",
                BatchTagBody {
                    tag_action: action,
                    tag_names: join_tags(tags),
                    event_ids: None,
                    route_ids: Some(&joined_ids),
                },
            ),
        };

        debug!(kind = %kind, action = action.as_str(), ids = %joined_ids, "updating tags");
        let request = HttpRequest::post(self.endpoint(path)).json(&body)?;
        self.send_ok(AuthScheme::Session, request, context)?;
        Ok(())
    }
}
