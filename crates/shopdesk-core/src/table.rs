// ── Table state controller ──
//
// UI-local table state: sorting, column visibility and row selection.
// Pagination is owned by the server; the controller only remembers the
// last page metadata so it can turn "next"/"previous" into concrete
// page intents for whoever owns the query params. It never fetches.

use std::collections::{BTreeSet, HashSet};

use shopdesk_api::{PageMeta, SortOrder};

use crate::resource::Resource;

// ── Columns ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Field path in the record (`name`, `brand.name`).
    pub id: String,
    pub header: String,
    pub sortable: bool,
    pub hideable: bool,
}

impl ColumnDef {
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            sortable: true,
            hideable: true,
        }
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Always shown; hide requests are ignored.
    pub fn pinned(mut self) -> Self {
        self.hideable = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSort {
    pub column: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    pub enable_multi_sort: bool,
    /// `asc → desc → unsorted` when set, otherwise `asc → desc → asc`.
    pub enable_sorting_removal: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            enable_multi_sort: false,
            enable_sorting_removal: true,
        }
    }
}

/// Navigation request reported upward; the list owner applies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageIntent {
    Goto(u32),
    SetPageSize(u32),
}

/// Selection key for a row: its id, or a positional key when the row
/// has no resolvable id yet.
pub fn row_key<T: Resource>(row: &T, index: usize) -> String {
    row.id()
        .filter(|id| !id.is_empty())
        .map_or_else(|| format!("#{index}"), str::to_owned)
}

// ── Controller ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TableController {
    columns: Vec<ColumnDef>,
    options: TableOptions,
    sorting: Vec<ColumnSort>,
    hidden: HashSet<String>,
    /// Keys of the rows currently loaded, in page order.
    row_keys: Vec<String>,
    selection: BTreeSet<String>,
    pagination: Option<PageMeta>,
}

impl TableController {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self::with_options(columns, TableOptions::default())
    }

    pub fn with_options(columns: Vec<ColumnDef>, options: TableOptions) -> Self {
        Self {
            columns,
            options,
            sorting: Vec::new(),
            hidden: HashSet::new(),
            row_keys: Vec::new(),
            selection: BTreeSet::new(),
            pagination: None,
        }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn options(&self) -> TableOptions {
        self.options
    }

    // ── Sorting ──────────────────────────────────────────────────────

    pub fn sorting(&self) -> &[ColumnSort] {
        &self.sorting
    }

    /// First sort entry, the one projected into query params.
    pub fn primary_sort(&self) -> Option<&ColumnSort> {
        self.sorting.first()
    }

    pub fn sort_of(&self, column: &str) -> Option<SortOrder> {
        self.sorting
            .iter()
            .find(|s| s.column == column)
            .map(|s| s.order)
    }

    /// Advance `column` one step through its sort cycle. `multi` keeps
    /// other sorted columns when multi-sort is enabled; otherwise the
    /// column replaces them. Returns `false` for unknown or unsortable
    /// columns.
    pub fn toggle_sort(&mut self, column: &str, multi: bool) -> bool {
        if !self.columns.iter().any(|c| c.id == column && c.sortable) {
            return false;
        }

        let next = match self.sort_of(column) {
            None => Some(SortOrder::Asc),
            Some(SortOrder::Asc) => Some(SortOrder::Desc),
            Some(SortOrder::Desc) if self.options.enable_sorting_removal => None,
            Some(SortOrder::Desc) => Some(SortOrder::Asc),
        };

        if multi && self.options.enable_multi_sort {
            match (self.sorting.iter().position(|s| s.column == column), next) {
                (Some(i), Some(order)) => self.sorting[i].order = order,
                (Some(i), None) => {
                    self.sorting.remove(i);
                }
                (None, Some(order)) => self.sorting.push(ColumnSort {
                    column: column.to_owned(),
                    order,
                }),
                (None, None) => {}
            }
        } else {
            self.sorting = next
                .map(|order| ColumnSort {
                    column: column.to_owned(),
                    order,
                })
                .into_iter()
                .collect();
        }
        true
    }

    pub fn set_sorting(&mut self, sorting: Vec<ColumnSort>) {
        self.sorting = sorting;
    }

    pub fn clear_sorting(&mut self) {
        self.sorting.clear();
    }

    // ── Column visibility ────────────────────────────────────────────

    /// Show or hide a column. Returns `false` when the column is unknown
    /// or pinned and a hide was requested.
    pub fn set_column_visible(&mut self, column: &str, visible: bool) -> bool {
        let Some(def) = self.columns.iter().find(|c| c.id == column) else {
            return false;
        };
        if visible {
            self.hidden.remove(column);
            return true;
        }
        if !def.hideable {
            return false;
        }
        self.hidden.insert(column.to_owned());
        true
    }

    pub fn toggle_column(&mut self, column: &str) -> bool {
        let visible = self.is_column_visible(column);
        self.set_column_visible(column, !visible)
    }

    pub fn is_column_visible(&self, column: &str) -> bool {
        !self.hidden.contains(column)
    }

    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        self.columns
            .iter()
            .filter(|c| self.is_column_visible(&c.id))
            .collect()
    }

    // ── Row selection ────────────────────────────────────────────────

    /// Adopt a newly loaded page. Selection never carries across pages
    /// or refetches.
    pub fn sync_rows<T: Resource>(&mut self, rows: &[T]) {
        self.row_keys = rows.iter().enumerate().map(|(i, r)| row_key(r, i)).collect();
        self.selection.clear();
    }

    pub fn row_keys(&self) -> &[String] {
        &self.row_keys
    }

    /// Select or deselect a row of the current page. Unknown keys are
    /// ignored and return `false`.
    pub fn select_row(&mut self, key: &str, selected: bool) -> bool {
        if !self.row_keys.iter().any(|k| k == key) {
            return false;
        }
        if selected {
            self.selection.insert(key.to_owned());
        } else {
            self.selection.remove(key);
        }
        true
    }

    pub fn toggle_row(&mut self, key: &str) -> bool {
        let selected = self.is_selected(key);
        self.select_row(key, !selected)
    }

    /// Select every row on the current page.
    pub fn select_all(&mut self) {
        self.selection = self.row_keys.iter().cloned().collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selection.contains(key)
    }

    /// Selected keys in page order.
    pub fn selected_keys(&self) -> Vec<&str> {
        self.row_keys
            .iter()
            .filter(|k| self.selection.contains(*k))
            .map(String::as_str)
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn is_all_selected(&self) -> bool {
        !self.row_keys.is_empty() && self.selection.len() == self.row_keys.len()
    }

    pub fn is_some_selected(&self) -> bool {
        !self.selection.is_empty() && !self.is_all_selected()
    }

    // ── Pagination intents ───────────────────────────────────────────

    pub fn set_pagination(&mut self, meta: PageMeta) {
        self.pagination = Some(meta);
    }

    pub fn pagination(&self) -> Option<PageMeta> {
        self.pagination
    }

    pub fn page_count(&self) -> u32 {
        self.pagination.map_or(0, |m| m.total_pages)
    }

    pub fn can_previous_page(&self) -> bool {
        self.pagination.is_some_and(|m| m.has_previous())
    }

    pub fn can_next_page(&self) -> bool {
        self.pagination.is_some_and(|m| m.has_next())
    }

    pub fn previous_page(&self) -> Option<PageIntent> {
        let meta = self.pagination.filter(PageMeta::has_previous)?;
        Some(PageIntent::Goto(meta.page - 1))
    }

    pub fn next_page(&self) -> Option<PageIntent> {
        let meta = self.pagination.filter(PageMeta::has_next)?;
        Some(PageIntent::Goto(meta.page + 1))
    }

    /// Jump to `page` (1-based) if it exists.
    pub fn goto_page(&self, page: u32) -> Option<PageIntent> {
        (1..=self.page_count())
            .contains(&page)
            .then_some(PageIntent::Goto(page))
    }

    pub fn set_page_size(&self, page_size: u32) -> Option<PageIntent> {
        let current = self.pagination.map(|m| m.page_size);
        (page_size > 0 && current != Some(page_size)).then_some(PageIntent::SetPageSize(page_size))
    }

    // ── Render model ─────────────────────────────────────────────────

    /// Project `rows` and the current state into a render-ready model.
    pub fn model<'a, T: Resource>(&'a self, rows: &'a [T]) -> TableModel<'a, T> {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let key = row_key(record, i);
                let selected = self.selection.contains(&key);
                TableRow {
                    key,
                    record,
                    selected,
                }
            })
            .collect();

        TableModel {
            columns: self.visible_columns(),
            rows,
            sorting: &self.sorting,
            page: self.pagination.map_or(1, |m| m.page),
            page_count: self.page_count(),
            can_previous_page: self.can_previous_page(),
            can_next_page: self.can_next_page(),
            all_selected: self.is_all_selected(),
            some_selected: self.is_some_selected(),
        }
    }
}

#[derive(Debug)]
pub struct TableRow<'a, T> {
    pub key: String,
    pub record: &'a T,
    pub selected: bool,
}

#[derive(Debug)]
pub struct TableModel<'a, T> {
    pub columns: Vec<&'a ColumnDef>,
    pub rows: Vec<TableRow<'a, T>>,
    pub sorting: &'a [ColumnSort],
    pub page: u32,
    pub page_count: u32,
    pub can_previous_page: bool,
    pub can_next_page: bool,
    pub all_selected: bool,
    pub some_selected: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::record::Record;
    use pretty_assertions::assert_eq;

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("name", "Name"),
            ColumnDef::new("price", "Price"),
            ColumnDef::new("actions", "").unsortable().pinned(),
        ]
    }

    fn rows(ids: &[&str]) -> Vec<Record> {
        ids.iter().map(|id| Record::new(*id)).collect()
    }

    #[test]
    fn sort_cycle_with_removal() {
        let mut t = TableController::new(columns());
        t.toggle_sort("name", false);
        assert_eq!(t.sort_of("name"), Some(SortOrder::Asc));
        t.toggle_sort("name", false);
        assert_eq!(t.sort_of("name"), Some(SortOrder::Desc));
        t.toggle_sort("name", false);
        assert!(t.sorting().is_empty());
    }

    #[test]
    fn sort_cycle_without_removal_wraps() {
        let mut t = TableController::with_options(
            columns(),
            TableOptions {
                enable_sorting_removal: false,
                ..TableOptions::default()
            },
        );
        for _ in 0..3 {
            t.toggle_sort("price", false);
        }
        assert_eq!(t.sort_of("price"), Some(SortOrder::Asc));
    }

    #[test]
    fn single_sort_replaces_others() {
        let mut t = TableController::new(columns());
        t.toggle_sort("name", false);
        t.toggle_sort("price", true);
        assert_eq!(
            t.sorting(),
            &[ColumnSort {
                column: "price".into(),
                order: SortOrder::Asc
            }]
        );
    }

    #[test]
    fn multi_sort_appends() {
        let mut t = TableController::with_options(
            columns(),
            TableOptions {
                enable_multi_sort: true,
                ..TableOptions::default()
            },
        );
        t.toggle_sort("name", false);
        t.toggle_sort("price", true);
        t.toggle_sort("price", true);
        assert_eq!(t.sorting().len(), 2);
        assert_eq!(t.primary_sort().unwrap().column, "name");
        assert_eq!(t.sort_of("price"), Some(SortOrder::Desc));
        t.toggle_sort("price", true);
        assert_eq!(t.sorting().len(), 1);
    }

    #[test]
    fn unsortable_columns_ignore_toggles() {
        let mut t = TableController::new(columns());
        assert!(!t.toggle_sort("actions", false));
        assert!(!t.toggle_sort("nope", false));
        assert!(t.sorting().is_empty());
    }

    #[test]
    fn visibility_survives_row_sync_and_respects_pinned() {
        let mut t = TableController::new(columns());
        assert!(t.set_column_visible("price", false));
        assert!(!t.set_column_visible("actions", false));
        t.sync_rows(&rows(&["1", "2"]));
        let ids: Vec<_> = t.visible_columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["name", "actions"]);
    }

    #[test]
    fn selection_is_page_scoped() {
        let mut t = TableController::new(columns());
        t.sync_rows(&rows(&["a", "b", "c"]));
        assert!(t.toggle_row("a"));
        assert!(t.toggle_row("c"));
        assert!(!t.toggle_row("z"));
        assert_eq!(t.selected_keys(), vec!["a", "c"]);
        assert!(t.is_some_selected());

        t.select_all();
        assert!(t.is_all_selected());

        t.sync_rows(&rows(&["d"]));
        assert_eq!(t.selected_count(), 0);
    }

    #[test]
    fn rows_without_id_get_positional_keys() {
        let mut t = TableController::new(columns());
        t.sync_rows(&[Record::new("1"), Record::default()]);
        assert_eq!(t.row_keys(), &["1".to_owned(), "#1".to_owned()]);
    }

    #[test]
    fn page_intents_follow_server_meta() {
        let mut t = TableController::new(columns());
        assert_eq!(t.next_page(), None);

        t.set_pagination(PageMeta::new(45, 1, 10));
        assert_eq!(t.previous_page(), None);
        assert_eq!(t.next_page(), Some(PageIntent::Goto(2)));
        assert_eq!(t.goto_page(5), Some(PageIntent::Goto(5)));
        assert_eq!(t.goto_page(6), None);
        assert_eq!(t.goto_page(0), None);
        assert_eq!(t.set_page_size(10), None);
        assert_eq!(t.set_page_size(25), Some(PageIntent::SetPageSize(25)));

        t.set_pagination(PageMeta::new(45, 5, 10));
        assert_eq!(t.next_page(), None);
        assert_eq!(t.previous_page(), Some(PageIntent::Goto(4)));
    }

    #[test]
    fn model_marks_selected_rows() {
        let mut t = TableController::new(columns());
        let data = rows(&["a", "b"]);
        t.sync_rows(&data);
        t.toggle_row("b");
        t.set_pagination(PageMeta::new(2, 1, 10));

        let model = t.model(&data);
        assert_eq!(model.rows.len(), 2);
        assert!(!model.rows[0].selected);
        assert!(model.rows[1].selected);
        assert_eq!(model.page_count, 1);
        assert!(!model.can_next_page);
        assert!(model.some_selected);
    }
}
