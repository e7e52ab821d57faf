//! Resource-management layer between `shopdesk-api` and UI consumers.
//!
//! Every admin screen is a table, a form and a modal over one REST
//! resource. This crate implements that composition once:
//!
//! - **[`QueryCache`]**: Structurally keyed read cache (`DashMap` +
//!   `ArcSwap` slots, `watch` revision channel). Equal params share one
//!   entry and one in-flight request; [`QueryCache::invalidate`] marks a
//!   key partition stale.
//!
//! - **[`ResourceHooks`]**: [`ResourceQueries`] (list/get/options reads)
//!   plus [`ResourceMutations`] (create/update/delete and bulk variants)
//!   for one resource, invalidating exactly the partitions a write can
//!   affect.
//!
//! - **[`TableController`]**: Sorting, column visibility and row
//!   selection; turns server pagination metadata into page intents.
//!
//! - **[`ResourceList`]**: Page-level orchestrator that owns the query
//!   params, keeps the previous page visible while the next loads, runs
//!   bulk delete (with confirmation), bulk status change and CSV export.
//!
//! - **[`ModalController`]**: Add/edit/view modal state machine.
//!
//! - **[`Console`]**: Facade wiring one HTTP client and one cache into
//!   per-resource hooks and lists.

pub mod cache;
pub mod config;
pub mod console;
pub mod error;
pub mod export;
pub mod hooks;
pub mod list;
pub mod modal;
pub mod mutation;
pub mod notify;
pub mod query;
pub mod record;
pub mod resource;
pub mod table;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{Cached, KeyPrefix, KeyScope, QueryCache, QueryKey};
pub use config::{ConsoleConfig, TlsVerification};
pub use console::Console;
pub use error::CoreError;
pub use hooks::ResourceHooks;
pub use list::{ListStatus, ListView, Loaded, ResourceList};
pub use modal::{
    ModalConfig, ModalController, ModalCopy, ModalError, ModalMode, OpenOptions, SubmitError,
    Submission,
};
pub use mutation::ResourceMutations;
pub use notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use query::ResourceQueries;
pub use record::Record;
pub use resource::{Resource, ResourceBackend};
pub use table::{
    ColumnDef, ColumnSort, PageIntent, TableController, TableModel, TableOptions, TableRow,
};

// Wire types callers need alongside the hooks.
pub use shopdesk_api::{
    FilePart, MultipartPayload, OptionItem, PageMeta, PaginatedResult, QueryParams, ResourceClient,
    ResourceId, SortOrder,
};
