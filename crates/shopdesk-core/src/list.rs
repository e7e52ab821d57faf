// ── Resource list orchestrator ──
//
// Page-level controller for one resource screen. Owns the query params
// as a single value, derives the cache key from them, and keeps the
// last settled page visible while the next one loads. Filter and sort
// changes reset to page 1; page navigation and page-size changes keep
// every other param.
//
// Loading is split in two so a UI can keep handling input while a
// request runs: `load()` returns a detached future, `settle()` applies
// its result only if the params it was started for are still current.

use std::fmt;
use std::fs;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use shopdesk_api::{PageMeta, PaginatedResult, QueryParams, total_pages};
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::export;
use crate::hooks::ResourceHooks;
use crate::notify::Notifier;
use crate::resource::{Resource, ResourceBackend};
use crate::table::{ColumnSort, PageIntent, TableController, TableModel, row_key};

/// Render status of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ListStatus {
    /// Nothing to show yet; blocking.
    Loading,
    /// Showing rows while a newer request runs; non-blocking.
    Fetching,
    Ready,
    /// The request for the current params failed.
    Error,
}

/// Snapshot for rendering a list screen.
#[derive(Debug, Clone)]
pub struct ListView<T> {
    pub status: ListStatus,
    /// Last settled page, possibly for earlier params.
    pub page: Option<Arc<PaginatedResult<T>>>,
    /// `page` belongs to params other than the current ones.
    pub is_placeholder: bool,
    pub is_filtered: bool,
    pub error: Option<CoreError>,
    pub pending_delete: Option<Vec<String>>,
    pub selected_count: usize,
}

impl<T> ListView<T> {
    pub fn rows(&self) -> &[T] {
        self.page.as_ref().map_or(&[][..], |p| p.data.as_slice())
    }

    pub fn meta(&self) -> Option<PageMeta> {
        self.page.as_ref().map(|p| p.meta)
    }
}

/// Result of a [`ResourceList::load`] future, to hand back to
/// [`ResourceList::settle`].
#[derive(Debug)]
pub struct Loaded<T> {
    pub params: QueryParams,
    pub result: Result<Arc<PaginatedResult<T>>, CoreError>,
}

struct Shown<T> {
    params: QueryParams,
    page: Arc<PaginatedResult<T>>,
}

pub struct ResourceList<T, B> {
    hooks: ResourceHooks<T, B>,
    notifier: Arc<dyn Notifier>,
    baseline: QueryParams,
    filters: QueryParams,
    table: TableController,
    shown: Option<Shown<T>>,
    error: Option<(QueryParams, CoreError)>,
    loading: Option<QueryParams>,
    pending_delete: Option<Vec<String>>,
}

impl<T, B> fmt::Debug for ResourceList<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceList")
            .field("filters", &self.filters)
            .field("loading", &self.loading.is_some())
            .field("pending_delete", &self.pending_delete)
            .finish_non_exhaustive()
    }
}

impl<T: Resource, B: ResourceBackend<T>> ResourceList<T, B> {
    /// `baseline` is the initial, "unfiltered" state that `reset` returns
    /// to. Sorting lives in the table, so any sort in `baseline` is
    /// dropped.
    pub fn new(
        hooks: ResourceHooks<T, B>,
        table: TableController,
        mut baseline: QueryParams,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        if baseline.is_sorted() {
            debug!(resource = hooks.resource(), "ignoring sort in baseline params");
        }
        baseline.sort_field = None;
        baseline.sort_order = None;
        baseline.page = 1;
        Self {
            hooks,
            notifier,
            filters: baseline.clone(),
            baseline,
            table,
            shown: None,
            error: None,
            loading: None,
            pending_delete: None,
        }
    }

    pub fn resource(&self) -> &str {
        self.hooks.resource()
    }

    pub fn hooks(&self) -> &ResourceHooks<T, B> {
        &self.hooks
    }

    pub fn filters(&self) -> &QueryParams {
        &self.filters
    }

    pub fn baseline(&self) -> &QueryParams {
        &self.baseline
    }

    pub fn table(&self) -> &TableController {
        &self.table
    }

    /// Search/filters differ from the baseline, or any sort is active.
    pub fn is_filtered(&self) -> bool {
        !self.filters.same_selection(&self.baseline) || !self.table.sorting().is_empty()
    }

    pub fn is_mutating(&self) -> bool {
        self.hooks.mutations.is_pending()
    }

    // ── Filter changes (reset to page 1) ─────────────────────────────

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        self.change_selection(|p| p.search = search);
    }

    /// Set a free-form filter; an empty value removes it. Returns
    /// `false` for reserved keys.
    pub fn set_filter(&mut self, key: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        let mut accepted = true;
        self.change_selection(|p| accepted = p.insert_filter(key, value));
        accepted
    }

    pub fn remove_filter(&mut self, key: &str) {
        self.change_selection(|p| {
            p.filters.remove(key);
        });
    }

    /// Replace search and filters wholesale, keeping page size and sort.
    pub fn replace_filters(&mut self, search: impl Into<String>, filters: &QueryParams) {
        let search = search.into();
        self.change_selection(|p| {
            p.search = search;
            p.filters.clone_from(&filters.filters);
        });
    }

    /// Advance `column` through its sort cycle and project the primary
    /// sort into the params.
    pub fn toggle_sort(&mut self, column: &str, multi: bool) -> bool {
        if !self.table.toggle_sort(column, multi) {
            return false;
        }
        self.project_sort();
        true
    }

    pub fn set_sorting(&mut self, sorting: Vec<ColumnSort>) {
        self.table.set_sorting(sorting);
        self.project_sort();
    }

    pub fn clear_sorting(&mut self) {
        self.table.clear_sorting();
        self.project_sort();
    }

    /// Restore the baseline filters and clear sorting in one step.
    pub fn reset(&mut self) {
        self.table.clear_sorting();
        self.table.clear_selection();
        self.filters = self.baseline.clone();
        debug!(resource = self.resource(), "filters reset");
    }

    fn change_selection(&mut self, change: impl FnOnce(&mut QueryParams)) {
        let before = (self.filters.search.clone(), self.filters.filters.clone());
        change(&mut self.filters);
        if before.0 != self.filters.search || before.1 != self.filters.filters {
            self.filters.page = 1;
            self.table.clear_selection();
        }
    }

    fn project_sort(&mut self) {
        let (field, order) = self
            .table
            .primary_sort()
            .map(|s| (Some(s.column.clone()), Some(s.order)))
            .unwrap_or_default();
        self.filters.sort_field = field;
        self.filters.sort_order = order;
        self.filters.page = 1;
        self.table.clear_selection();
    }

    // ── Page navigation (keeps other params) ─────────────────────────

    /// Go to `page`, clamped to the known page count. Selection belongs
    /// to the page being left and is cleared.
    pub fn set_page(&mut self, page: u32) {
        let count = self.table.page_count();
        let page = if count > 0 { page.clamp(1, count) } else { page.max(1) };
        if page != self.filters.page {
            self.filters.page = page;
            self.table.clear_selection();
        }
    }

    /// Change the page size, keeping the current page when it still
    /// exists under the new size.
    pub fn set_page_size(&mut self, page_size: u32) {
        let page_size = page_size.max(1);
        if page_size == self.filters.page_size {
            return;
        }
        self.filters.page_size = page_size;
        self.table.clear_selection();
        if let Some(meta) = self.table.pagination() {
            let count = total_pages(meta.total, page_size);
            if count > 0 {
                self.filters.page = self.filters.page.min(count);
            }
        }
    }

    pub fn apply(&mut self, intent: PageIntent) {
        match intent {
            PageIntent::Goto(page) => self.set_page(page),
            PageIntent::SetPageSize(size) => self.set_page_size(size),
        }
    }

    pub fn next_page(&mut self) -> bool {
        let Some(intent) = self.table.next_page() else {
            return false;
        };
        self.apply(intent);
        true
    }

    pub fn previous_page(&mut self) -> bool {
        let Some(intent) = self.table.previous_page() else {
            return false;
        };
        self.apply(intent);
        true
    }

    pub fn goto_page(&mut self, page: u32) -> bool {
        let Some(intent) = self.table.goto_page(page) else {
            return false;
        };
        self.apply(intent);
        true
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Start a read for the current params. The returned future holds no
    /// borrow of `self`; pass its output to [`settle`](Self::settle).
    pub fn load(&mut self) -> impl Future<Output = Loaded<T>> + Send + use<T, B> {
        let queries = self.hooks.queries.clone();
        let params = self.filters.clone();
        self.loading = Some(params.clone());
        async move {
            let result = queries.list(&params).await;
            Loaded { params, result }
        }
    }

    /// Apply a finished read. Results for params that are no longer
    /// current are discarded (they remain in the cache under their own
    /// key). Returns whether the result was applied.
    pub fn settle(&mut self, loaded: Loaded<T>) -> bool {
        let Loaded { params, result } = loaded;
        if params != self.filters {
            debug!(resource = self.resource(), "discarding result for superseded params");
            if self.loading.as_ref() == Some(&params) {
                self.loading = None;
            }
            return false;
        }

        self.loading = None;
        match result {
            Ok(page) => {
                let refetched = self
                    .shown
                    .as_ref()
                    .is_none_or(|s| !Arc::ptr_eq(&s.page, &page));
                if refetched {
                    self.table.sync_rows(&page.data);
                }
                self.table.set_pagination(page.meta);
                self.shown = Some(Shown { params, page });
                self.error = None;
            }
            Err(e) => {
                warn!(resource = self.resource(), error = %e, "list read failed");
                self.error = Some((params, e));
            }
        }
        true
    }

    /// Load and settle the current params.
    pub async fn refresh(&mut self) -> Result<(), CoreError> {
        let load = self.load();
        let loaded = load.await;
        self.settle(loaded);
        match self.current_error() {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn current_error(&self) -> Option<&CoreError> {
        self.error
            .as_ref()
            .filter(|(p, _)| *p == self.filters)
            .map(|(_, e)| e)
    }

    pub fn view(&self) -> ListView<T> {
        let error = self.current_error().cloned();
        let is_placeholder = self
            .shown
            .as_ref()
            .is_some_and(|s| s.params != self.filters);
        let status = if error.is_some() {
            ListStatus::Error
        } else if self.shown.is_none() {
            ListStatus::Loading
        } else if is_placeholder || self.loading.is_some() {
            ListStatus::Fetching
        } else {
            ListStatus::Ready
        };

        ListView {
            status,
            page: self.shown.as_ref().map(|s| Arc::clone(&s.page)),
            is_placeholder,
            is_filtered: self.is_filtered(),
            error,
            pending_delete: self.pending_delete.clone(),
            selected_count: self.table.selected_count(),
        }
    }

    /// Render model for the shown page.
    pub fn table_model(&self) -> Option<TableModel<'_, T>> {
        self.shown.as_ref().map(|s| self.table.model(&s.page.data))
    }

    // ── Selection and columns ────────────────────────────────────────

    /// The shown page was loaded for the current params. Placeholder
    /// rows from another page or filter are not selectable.
    fn rows_are_current(&self) -> bool {
        self.shown.as_ref().is_some_and(|s| s.params == self.filters)
    }

    pub fn toggle_row(&mut self, key: &str) -> bool {
        self.rows_are_current() && self.table.toggle_row(key)
    }

    pub fn select_row(&mut self, key: &str, selected: bool) -> bool {
        self.rows_are_current() && self.table.select_row(key, selected)
    }

    pub fn select_all(&mut self) {
        if self.rows_are_current() {
            self.table.select_all();
        }
    }

    pub fn clear_selection(&mut self) {
        self.table.clear_selection();
    }

    pub fn set_column_visible(&mut self, column: &str, visible: bool) -> bool {
        self.table.set_column_visible(column, visible)
    }

    /// Selected rows that carry a resolvable id, in page order. Empty
    /// while placeholder rows are shown.
    pub fn selected_rows(&self) -> Vec<&T> {
        let Some(shown) = self.shown.as_ref().filter(|s| s.params == self.filters) else {
            return Vec::new();
        };
        shown
            .page
            .data
            .iter()
            .enumerate()
            .filter(|(i, row)| {
                row.id().is_some_and(|id| !id.is_empty())
                    && self.table.is_selected(&row_key(*row, *i))
            })
            .map(|(_, row)| row)
            .collect()
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selected_rows()
            .into_iter()
            .filter_map(|row| row.id().map(str::to_owned))
            .collect()
    }

    // ── Bulk actions ─────────────────────────────────────────────────

    /// Stage the selected ids for deletion. Nothing is sent until
    /// [`confirm_bulk_delete`](Self::confirm_bulk_delete).
    pub fn request_bulk_delete(&mut self) -> bool {
        let ids = self.selected_ids();
        if ids.is_empty() {
            self.notifier.warning("Select at least one row to delete.");
            return false;
        }
        debug!(resource = self.resource(), count = ids.len(), "bulk delete staged");
        self.pending_delete = Some(ids);
        true
    }

    pub fn pending_delete(&self) -> Option<&[String]> {
        self.pending_delete.as_deref()
    }

    pub fn cancel_bulk_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the staged ids. Pending state is cleared whatever the
    /// outcome; the outcome is also reported through the notifier.
    /// Returns the number of deleted records.
    pub async fn confirm_bulk_delete(&mut self) -> Result<usize, CoreError> {
        let Some(ids) = self.pending_delete.take() else {
            return Ok(0);
        };
        let resource = self.resource().to_owned();

        match self.hooks.mutations.bulk_delete(&ids).await {
            Ok(()) => {
                info!(resource = %resource, count = ids.len(), "bulk delete confirmed");
                self.notifier
                    .success(&format!("Deleted {} {resource}.", ids.len()));
                self.after_bulk_write().await;
                Ok(ids.len())
            }
            Err(e) => {
                self.notifier
                    .error(&format!("Could not delete {resource}: {e}"));
                Err(e)
            }
        }
    }

    /// Set `isActive` on every selected row. Returns the number of rows
    /// sent; zero (with a warning) when nothing is selected.
    pub async fn bulk_set_active(&mut self, active: bool) -> Result<usize, CoreError> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            self.notifier.warning("Select at least one row to update.");
            return Ok(0);
        }
        let resource = self.resource().to_owned();
        let verb = if active { "Activated" } else { "Deactivated" };

        match self.hooks.mutations.set_active(&ids, active).await {
            Ok(()) => {
                self.notifier
                    .success(&format!("{verb} {} {resource}.", ids.len()));
                self.after_bulk_write().await;
                Ok(ids.len())
            }
            Err(e) => {
                self.notifier
                    .error(&format!("Could not update {resource}: {e}"));
                Err(e)
            }
        }
    }

    async fn after_bulk_write(&mut self) {
        self.table.clear_selection();
        if let Err(e) = self.refresh().await {
            debug!(resource = self.resource(), error = %e, "refresh after bulk write failed");
        }
    }

    // ── Export ───────────────────────────────────────────────────────

    /// Write the selected rows as CSV using the visible columns. No
    /// request is made. Returns the number of rows written.
    pub fn export_selected<W: Write>(&self, writer: W) -> Result<usize, CoreError> {
        let rows = self.selected_rows();
        if rows.is_empty() {
            self.notifier.warning("Select at least one row to export.");
            return Ok(0);
        }
        let written = export::write_csv(writer, &rows, &self.table.visible_columns())?;
        self.notifier
            .success(&format!("Exported {written} {}.", self.resource()));
        Ok(written)
    }

    /// Export the selection to `<dir>/<resource>-<timestamp>.csv`.
    /// Returns `None` when nothing is selected. A failed write leaves no
    /// file behind.
    pub fn export_selected_to_dir(&self, dir: &Path) -> Result<Option<PathBuf>, CoreError> {
        let rows = self.selected_rows();
        if rows.is_empty() {
            self.notifier.warning("Select at least one row to export.");
            return Ok(None);
        }
        fs::create_dir_all(dir).map_err(|e| CoreError::Export {
            message: e.to_string(),
        })?;
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let path = dir.join(format!("{}-{stamp}.csv", self.resource()));
        let written = export::write_file(&path, &rows, &self.table.visible_columns())?;
        self.notifier
            .success(&format!("Exported {written} {}.", self.resource()));
        Ok(Some(path))
    }
}
