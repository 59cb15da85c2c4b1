//! Process-local link repository.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use super::lock;
use crate::domain::analytics::LinkActivity;
use crate::domain::entities::{
    Click, ExpirationPolicy, Link, LinkSource, LinkStatus, NewClick, NewLink,
};
use crate::domain::repositories::{LinkRepository, LinkTotals};
use crate::error::AppError;

#[derive(Default)]
struct LinkStore {
    next_link_id: i64,
    next_click_id: i64,
    links: BTreeMap<i64, Link>,
    clicks: HashMap<i64, Vec<Click>>,
    visitors: HashMap<i64, BTreeSet<String>>,
}

impl LinkStore {
    fn code_taken(&self, code: &str, exclude_id: Option<i64>) -> bool {
        self.links.values().any(|l| {
            Some(l.id) != exclude_id
                && (l.short_code == code || l.custom_alias.as_deref() == Some(code))
        })
    }

    fn remove(&mut self, id: i64) {
        self.links.remove(&id);
        self.clicks.remove(&id);
        self.visitors.remove(&id);
    }
}

/// [`LinkRepository`] kept entirely in memory.
///
/// A single mutex serializes all mutations, which gives the same atomicity
/// as the transactional PostgreSQL statements.
#[derive(Default)]
pub struct InMemoryLinkRepository {
    store: Mutex<LinkStore>,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_violation(constraint: &str) -> AppError {
    AppError::conflict(
        "Unique constraint violation",
        json!({ "constraint": constraint }),
    )
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut store = lock(&self.store)?;

        if store.links.values().any(|l| l.short_code == new_link.short_code) {
            return Err(unique_violation("links_short_code_key"));
        }
        if let Some(alias) = new_link.custom_alias.as_deref()
            && store.code_taken(alias, None)
        {
            return Err(unique_violation("links_custom_alias_key"));
        }

        store.next_link_id += 1;
        let link = Link {
            id: store.next_link_id,
            original_url: new_link.original_url,
            short_code: new_link.short_code,
            full_short_url: new_link.full_short_url,
            custom_alias: new_link.custom_alias,
            session_id: new_link.session_id,
            domain: new_link.domain,
            total_clicks: 0,
            expiration: new_link.expiration,
            status: new_link.status,
            source: new_link.source,
            bulk_batch_id: new_link.bulk_batch_id,
            created_at: Utc::now(),
        };

        store.links.insert(link.id, link.clone());
        Ok(link)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        Ok(lock(&self.store)?.links.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        Ok(lock(&self.store)?
            .links
            .values()
            .find(|l| l.short_code == code)
            .cloned())
    }

    async fn code_exists(&self, code: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        Ok(lock(&self.store)?.code_taken(code, exclude_id))
    }

    async fn list_by_session(
        &self,
        session_id: &str,
        include_bulk: bool,
    ) -> Result<Vec<Link>, AppError> {
        let store = lock(&self.store)?;
        let mut links: Vec<Link> = store
            .links
            .values()
            .filter(|l| l.session_id == session_id)
            .filter(|l| include_bulk || l.source != LinkSource::Bulk)
            .cloned()
            .collect();

        links.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(links)
    }

    async fn delete(&self, id: i64, session_id: &str) -> Result<bool, AppError> {
        let mut store = lock(&self.store)?;
        let owned = store
            .links
            .get(&id)
            .is_some_and(|l| l.session_id == session_id);

        if owned {
            store.remove(id);
        }
        Ok(owned)
    }

    async fn delete_many(&self, ids: Vec<i64>, session_id: &str) -> Result<u64, AppError> {
        let mut store = lock(&self.store)?;
        let owned: Vec<i64> = ids
            .into_iter()
            .filter(|id| {
                store
                    .links
                    .get(id)
                    .is_some_and(|l| l.session_id == session_id)
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        for id in &owned {
            store.remove(*id);
        }
        Ok(owned.len() as u64)
    }

    async fn update_alias(
        &self,
        id: i64,
        session_id: &str,
        alias: &str,
    ) -> Result<Option<Link>, AppError> {
        let mut store = lock(&self.store)?;

        if !store
            .links
            .get(&id)
            .is_some_and(|l| l.session_id == session_id)
        {
            return Ok(None);
        }
        if store.code_taken(alias, Some(id)) {
            return Err(unique_violation("links_custom_alias_key"));
        }

        let Some(link) = store.links.get_mut(&id) else {
            return Ok(None);
        };
        link.short_code = alias.to_string();
        link.custom_alias = Some(alias.to_string());
        link.full_short_url = format!("{}/{}", link.domain, alias);
        Ok(Some(link.clone()))
    }

    async fn update_expiration(
        &self,
        id: i64,
        session_id: Option<String>,
        policy: ExpirationPolicy,
        status: LinkStatus,
    ) -> Result<Option<Link>, AppError> {
        let mut store = lock(&self.store)?;

        let Some(link) = store.links.get_mut(&id) else {
            return Ok(None);
        };
        if session_id.is_some_and(|s| s != link.session_id) {
            return Ok(None);
        }

        link.expiration = policy;
        link.status = status;
        Ok(Some(link.clone()))
    }

    async fn mark_expired(&self, id: i64) -> Result<bool, AppError> {
        let mut store = lock(&self.store)?;
        match store.links.get_mut(&id) {
            Some(link) => {
                link.status = LinkStatus::Expired;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_click(
        &self,
        click: NewClick,
        now: DateTime<Utc>,
    ) -> Result<Option<Link>, AppError> {
        let mut store = lock(&self.store)?;

        let Some(link) = store.links.get_mut(&click.link_id) else {
            return Ok(None);
        };
        if link.is_expired_at(now) {
            return Ok(None);
        }
        link.total_clicks += 1;
        let updated = link.clone();

        store.next_click_id += 1;
        let record = Click {
            id: store.next_click_id,
            link_id: click.link_id,
            clicked_at: now,
            ip: click.ip,
            user_agent: click.user_agent,
            device_type: click.device_type.as_str().to_string(),
            country_code: click.country_code,
            visitor_hash: click.visitor_hash.clone(),
        };
        store.clicks.entry(click.link_id).or_default().push(record);
        store
            .visitors
            .entry(click.link_id)
            .or_default()
            .insert(click.visitor_hash);

        Ok(Some(updated))
    }

    async fn activity_by_session(&self, session_id: &str) -> Result<Vec<LinkActivity>, AppError> {
        let store = lock(&self.store)?;
        Ok(store
            .links
            .values()
            .filter(|l| l.session_id == session_id)
            .map(|l| LinkActivity {
                link: l.clone(),
                clicks: store.clicks.get(&l.id).cloned().unwrap_or_default(),
                visitors: store
                    .visitors
                    .get(&l.id)
                    .map(|v| v.iter().cloned().collect())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn totals(&self) -> Result<LinkTotals, AppError> {
        let store = lock(&self.store)?;
        Ok(LinkTotals {
            links: store.links.len() as i64,
            active_links: store
                .links
                .values()
                .filter(|l| l.status == LinkStatus::Active)
                .count() as i64,
            clicks: store.links.values().map(|l| l.total_clicks).sum(),
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        lock(&self.store).map(|_| ())
    }
}
