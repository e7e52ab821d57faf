// In-memory `ResourceBackend` with per-operation call counters.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Map, Value};
use shopdesk_core::{
    CoreError, MultipartPayload, Notice, Notifier, OptionItem, PageMeta, PaginatedResult,
    QueryParams, Record, ResourceBackend, ResourceId, SortOrder,
};
use tokio::sync::mpsc;

#[derive(Default)]
struct Inner {
    rows: Mutex<Vec<Record>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    fail_next: Mutex<Option<CoreError>>,
    last_bulk_update: Mutex<Option<(Vec<String>, Value)>>,
    delay: Mutex<Option<Duration>>,
    next_id: Mutex<u64>,
}

#[derive(Clone)]
pub struct MemoryBackend {
    name: String,
    inner: Arc<Inner>,
}

impl MemoryBackend {
    pub fn new(name: &str, rows: Vec<Record>) -> Self {
        let inner = Inner {
            next_id: Mutex::new(1000),
            ..Inner::default()
        };
        *inner.rows.lock().unwrap() = rows;
        Self {
            name: name.to_owned(),
            inner: Arc::new(inner),
        }
    }

    /// `n` active rows with ids `1..=n` and names `Item 01..`.
    pub fn seeded(name: &str, n: u32) -> Self {
        let rows = (1..=n)
            .map(|i| {
                Record::new(i.to_string())
                    .with("name", format!("Item {i:02}"))
                    .with("price", i * 10)
                    .with("isActive", true)
            })
            .collect();
        Self::new(name, rows)
    }

    pub fn calls(&self, op: &str) -> usize {
        self.inner.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn fail_next(&self, err: CoreError) {
        *self.inner.fail_next.lock().unwrap() = Some(err);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock().unwrap() = Some(delay);
    }

    pub fn ids(&self) -> Vec<String> {
        self.inner
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.id.as_ref().map(ToString::to_string))
            .collect()
    }

    pub fn row(&self, id: &str) -> Option<Record> {
        self.inner
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id.as_ref().is_some_and(|rid| rid.as_str() == id))
            .cloned()
    }

    pub fn last_bulk_update(&self) -> Option<(Vec<String>, Value)> {
        self.inner.last_bulk_update.lock().unwrap().clone()
    }

    async fn enter(&self, op: &'static str) -> Result<(), CoreError> {
        let (delay, failure) = {
            *self.inner.calls.lock().unwrap().entry(op).or_default() += 1;
            let delay = *self.inner.delay.lock().unwrap();
            let failure = self.inner.fail_next.lock().unwrap().take();
            (delay, failure)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        failure.map_or(Ok(()), Err)
    }

    fn not_found(&self, id: &str) -> CoreError {
        CoreError::NotFound {
            resource: self.name.clone(),
            id: id.to_owned(),
        }
    }

    fn merge(row: &mut Record, data: &Value) {
        if let Value::Object(fields) = data {
            for (k, v) in fields {
                row.fields.insert(k.clone(), v.clone());
            }
        }
    }

    fn insert(&self, data: &Value) -> Record {
        let mut next = self.inner.next_id.lock().unwrap();
        *next += 1;
        let mut row = Record {
            id: Some(ResourceId::new(next.to_string())),
            fields: Map::new(),
        };
        Self::merge(&mut row, data);
        self.inner.rows.lock().unwrap().push(row.clone());
        row
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn payload_to_value(payload: &MultipartPayload) -> Value {
    let mut map = Map::new();
    for key in ["name", "isActive", "price"] {
        if let Some(text) = payload.get(key).and_then(|v| v.as_text()) {
            map.insert(key.to_owned(), Value::String(text));
        }
    }
    Value::Object(map)
}

impl ResourceBackend<Record> for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self, params: &QueryParams) -> Result<PaginatedResult<Record>, CoreError> {
        self.enter("list").await?;
        let search = params.search.to_lowercase();
        let mut rows: Vec<Record> = self
            .inner
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| search.is_empty() || r.label().to_lowercase().contains(&search))
            .filter(|r| params.filters.iter().all(|(k, v)| text(r.get(k)) == *v))
            .cloned()
            .collect();

        if let Some(field) = &params.sort_field {
            rows.sort_by_key(|r| text(r.get(field)));
            if params.sort_order == Some(SortOrder::Desc) {
                rows.reverse();
            }
        }

        let total = u64::try_from(rows.len()).unwrap();
        let start = usize::try_from((params.page - 1) * params.page_size).unwrap();
        let data = rows
            .into_iter()
            .skip(start)
            .take(usize::try_from(params.page_size).unwrap())
            .collect();
        Ok(PaginatedResult {
            data,
            meta: PageMeta::new(total, params.page, params.page_size),
        })
    }

    async fn get(&self, id: &str) -> Result<Record, CoreError> {
        self.enter("get").await?;
        self.row(id).ok_or_else(|| self.not_found(id))
    }

    async fn options(&self, parent_id: Option<&str>) -> Result<Vec<OptionItem>, CoreError> {
        self.enter("options").await?;
        let rows = self.inner.rows.lock().unwrap().clone();
        Ok(rows
            .into_iter()
            .filter(|r| parent_id.is_none_or(|p| text(r.get("parentId")) == p))
            .filter_map(|r| {
                let label = r.label();
                r.id.map(|id| OptionItem { id, label })
            })
            .collect())
    }

    async fn create(&self, data: &Value) -> Result<Record, CoreError> {
        self.enter("create").await?;
        Ok(self.insert(data))
    }

    async fn create_multipart(&self, payload: MultipartPayload) -> Result<Record, CoreError> {
        self.enter("create").await?;
        Ok(self.insert(&payload_to_value(&payload)))
    }

    async fn update(&self, id: &str, data: &Value) -> Result<Record, CoreError> {
        self.enter("update").await?;
        let mut rows = self.inner.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id.as_ref().is_some_and(|rid| rid.as_str() == id))
            .ok_or_else(|| self.not_found(id))?;
        Self::merge(row, data);
        Ok(row.clone())
    }

    async fn update_multipart(&self, id: &str, payload: MultipartPayload) -> Result<Record, CoreError> {
        self.update(id, &payload_to_value(&payload)).await
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        self.enter("delete").await?;
        let mut rows = self.inner.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id.as_ref().is_none_or(|rid| rid.as_str() != id));
        if rows.len() == before {
            return Err(self.not_found(id));
        }
        Ok(())
    }

    async fn bulk_update(&self, ids: &[String], data: &Value) -> Result<(), CoreError> {
        self.enter("bulk_update").await?;
        *self.inner.last_bulk_update.lock().unwrap() = Some((ids.to_vec(), data.clone()));
        let mut rows = self.inner.rows.lock().unwrap();
        for row in rows.iter_mut() {
            if row.id.as_ref().is_some_and(|rid| ids.iter().any(|i| i == rid.as_str())) {
                Self::merge(row, data);
            }
        }
        Ok(())
    }

    async fn bulk_delete(&self, ids: &[String]) -> Result<(), CoreError> {
        self.enter("bulk_delete").await?;
        let mut rows = self.inner.rows.lock().unwrap();
        if let Some(missing) = ids
            .iter()
            .find(|id| !rows.iter().any(|r| r.id.as_ref().is_some_and(|rid| rid.as_str() == id.as_str())))
        {
            return Err(self.not_found(missing));
        }
        rows.retain(|r| r.id.as_ref().is_none_or(|rid| !ids.iter().any(|i| i == rid.as_str())));
        Ok(())
    }
}

/// Notifier whose notices can be drained by the test.
pub fn notifier() -> (Arc<dyn Notifier>, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(tx), rx)
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}
