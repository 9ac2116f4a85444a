//! Live-or-fixture loading and origin-aware mutation routing.
//!
//! Lists are loaded from the store when it answers with rows, otherwise from
//! bundled fixture data. Each entity keeps the [`Origin`] it was loaded with,
//! and [`TrackedList`] never sends a write for a fixture entity to the store.

use crate::{
    core::access::AccessContext,
    errors::{Error, Result},
    models::{Identified, Origin, Tracked},
};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info, warn};

/// Why a list holds the records it holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadSource {
    /// The store returned rows
    Live,
    /// The store returned no rows; fixtures were used
    BackendEmpty,
    /// The store failed; fixtures were used
    BackendError(String),
}

/// Result of [`load`].
#[derive(Clone, Debug)]
pub struct Loaded<T> {
    /// Table the records belong to
    pub table: &'static str,
    /// Where the records came from
    pub source: LoadSource,
    /// Normalized records with their origin
    pub records: Vec<Tracked<T>>,
}

/// Loads one list, falling back to `fixtures` when `fetch` fails or yields
/// nothing. Never returns an error.
pub async fn load<T, F, N>(
    table: &'static str,
    fetch: F,
    fixtures: &[Value],
    normalize: N,
) -> Loaded<T>
where
    F: Future<Output = Result<Vec<Value>>>,
    N: Fn(&[Value]) -> Vec<T>,
{
    let (source, records) = match fetch.await {
        Ok(rows) if !rows.is_empty() => {
            let records: Vec<_> = normalize(&rows).into_iter().map(Tracked::live).collect();
            debug!(table, count = records.len(), "Loaded live records");
            (LoadSource::Live, records)
        }
        Ok(_) => {
            info!(table, "backend empty; using fixture data");
            (LoadSource::BackendEmpty, fixture_records(fixtures, &normalize))
        }
        Err(e) => {
            warn!(table, error = %e, "backend error; using fixture data");
            (
                LoadSource::BackendError(e.to_string()),
                fixture_records(fixtures, &normalize),
            )
        }
    };

    Loaded {
        table,
        source,
        records,
    }
}

fn fixture_records<T, N>(fixtures: &[Value], normalize: &N) -> Vec<Tracked<T>>
where
    N: Fn(&[Value]) -> Vec<T>,
{
    normalize(fixtures)
        .into_iter()
        .map(Tracked::fixture)
        .collect()
}

/// What happened to a mutation after the local list was updated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The store accepted the write
    Persisted,
    /// Only fixture entities were touched; the store was not called
    LocalOnly,
    /// The store rejected the write; the local list keeps the change
    BackendFailed(String),
}

/// An ordered list of entities that routes writes by origin.
#[derive(Clone, Debug)]
pub struct TrackedList<T> {
    table: &'static str,
    source: LoadSource,
    items: Vec<Tracked<T>>,
}

impl<T> From<Loaded<T>> for TrackedList<T> {
    fn from(loaded: Loaded<T>) -> Self {
        Self {
            table: loaded.table,
            source: loaded.source,
            items: loaded.records,
        }
    }
}

impl<T: Identified + Clone> TrackedList<T> {
    /// Where the list was loaded from.
    #[must_use]
    pub const fn source(&self) -> &LoadSource {
        &self.source
    }

    /// Entities with their origin, in display order.
    #[must_use]
    pub fn items(&self) -> &[Tracked<T>] {
        &self.items
    }

    /// Snapshot of the plain entities, in display order.
    #[must_use]
    pub fn entities(&self) -> Vec<T> {
        self.items.iter().map(|t| t.entity.clone()).collect()
    }

    /// Looks an entity up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Tracked<T>> {
        self.items.iter().find(|t| t.entity.id() == id)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Inserts through the store and prepends the stored entity.
    ///
    /// # Errors
    /// Fails with [`Error::Forbidden`] for viewers, or with the store's error;
    /// the list is unchanged in both cases.
    pub async fn create<F>(&mut self, ctx: &AccessContext, remote: F) -> Result<&T>
    where
        F: Future<Output = Result<T>>,
    {
        ctx.require_editor(&format!("create {}", self.table))?;
        let entity = remote.await?;
        info!(table = self.table, id = entity.id(), "Created record");
        self.items.insert(0, Tracked::live(entity));
        Ok(&self.items[0].entity)
    }

    /// Prepends an entity without touching the store.
    ///
    /// # Errors
    /// Fails with [`Error::Forbidden`] for viewers.
    pub fn create_local(&mut self, ctx: &AccessContext, entity: T) -> Result<()> {
        ctx.require_editor(&format!("create {}", self.table))?;
        debug!(table = self.table, id = entity.id(), "Created local record");
        self.items.insert(0, Tracked::fixture(entity));
        Ok(())
    }

    /// Applies `mutate` to the entity with `id`, then persists it through
    /// `remote` if the entity is live. `remote` receives the updated entity
    /// and is not called for fixture entities.
    ///
    /// # Errors
    /// Fails with [`Error::Forbidden`] for viewers and [`Error::NotFound`] for
    /// an unknown id. Store failures are reported as
    /// [`WriteOutcome::BackendFailed`].
    pub async fn update<M, R, F>(
        &mut self,
        ctx: &AccessContext,
        id: &str,
        mutate: M,
        remote: R,
    ) -> Result<WriteOutcome>
    where
        M: FnOnce(&mut T),
        R: FnOnce(T) -> F,
        F: Future<Output = Result<()>>,
    {
        ctx.require_editor(&format!("update {}", self.table))?;
        let table = self.table;
        let item = self
            .items
            .iter_mut()
            .find(|t| t.entity.id() == id)
            .ok_or_else(|| Error::not_found(table, id))?;

        mutate(&mut item.entity);
        if item.origin == Origin::Fixture {
            debug!(table, id, "Updated fixture record locally");
            return Ok(WriteOutcome::LocalOnly);
        }
        let updated = item.entity.clone();
        Ok(self.settle("update", remote(updated).await))
    }

    /// Removes the entity with `id`, deleting it through `remote` if it is
    /// live.
    ///
    /// # Errors
    /// Fails with [`Error::Forbidden`] for viewers and [`Error::NotFound`] for
    /// an unknown id.
    pub async fn delete<R, F>(
        &mut self,
        ctx: &AccessContext,
        id: &str,
        remote: R,
    ) -> Result<WriteOutcome>
    where
        R: FnOnce(String) -> F,
        F: Future<Output = Result<()>>,
    {
        ctx.require_editor(&format!("delete {}", self.table))?;
        let index = self
            .items
            .iter()
            .position(|t| t.entity.id() == id)
            .ok_or_else(|| Error::not_found(self.table, id))?;

        let removed = self.items.remove(index);
        if removed.origin == Origin::Fixture {
            debug!(table = self.table, id, "Deleted fixture record locally");
            return Ok(WriteOutcome::LocalOnly);
        }
        Ok(self.settle("delete", remote(id.to_string()).await))
    }

    /// Applies `mutate` to every listed entity; `remote` receives the ids of
    /// the live ones and is skipped when there are none. Unknown ids are
    /// ignored.
    ///
    /// # Errors
    /// Fails with [`Error::Forbidden`] for viewers.
    pub async fn update_many<M, R, F>(
        &mut self,
        ctx: &AccessContext,
        ids: &[String],
        mutate: M,
        remote: R,
    ) -> Result<WriteOutcome>
    where
        M: Fn(&mut T),
        R: FnOnce(Vec<String>) -> F,
        F: Future<Output = Result<()>>,
    {
        ctx.require_editor(&format!("update {}", self.table))?;
        let mut live_ids = Vec::new();
        for item in self
            .items
            .iter_mut()
            .filter(|t| ids.iter().any(|id| id == t.entity.id()))
        {
            mutate(&mut item.entity);
            if item.is_live() {
                live_ids.push(item.entity.id().to_string());
            }
        }

        if live_ids.is_empty() {
            debug!(table = self.table, "Bulk update touched fixture records only");
            return Ok(WriteOutcome::LocalOnly);
        }
        Ok(self.settle("bulk update", remote(live_ids).await))
    }

    /// Removes every listed entity; `remote` receives the ids of the live
    /// ones and is skipped when there are none. Unknown ids are ignored.
    ///
    /// # Errors
    /// Fails with [`Error::Forbidden`] for viewers.
    pub async fn delete_many<R, F>(
        &mut self,
        ctx: &AccessContext,
        ids: &[String],
        remote: R,
    ) -> Result<WriteOutcome>
    where
        R: FnOnce(Vec<String>) -> F,
        F: Future<Output = Result<()>>,
    {
        ctx.require_editor(&format!("delete {}", self.table))?;
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|t| ids.iter().any(|id| id == t.entity.id()));
        self.items = kept;

        let live_ids: Vec<String> = removed
            .iter()
            .filter(|t| t.is_live())
            .map(|t| t.entity.id().to_string())
            .collect();
        if live_ids.is_empty() {
            debug!(table = self.table, "Bulk delete touched fixture records only");
            return Ok(WriteOutcome::LocalOnly);
        }
        Ok(self.settle("bulk delete", remote(live_ids).await))
    }

    fn settle(&self, action: &str, result: Result<()>) -> WriteOutcome {
        match result {
            Ok(()) => {
                info!(table = self.table, action, "Persisted change");
                WriteOutcome::Persisted
            }
            Err(e) => {
                warn!(table = self.table, action, error = %e, "Backend write failed; keeping local change");
                WriteOutcome::BackendFailed(e.to_string())
            }
        }
    }
}
