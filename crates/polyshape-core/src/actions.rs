//! List state and the create/update/delete workflow over a collection.

use std::collections::HashSet;
use std::future::Future;

use tracing::{debug, info, warn};

use crate::abort::AbortSignal;
use crate::error::{failure_message, AppError};
use crate::form::RecordForm;
use crate::listing::{filter_and_sort, paginate, Page, PAGE_SIZE};
use crate::models::{Collection, EnrichedItem};
use crate::path::last_path_segment;

pub const LOAD_FAILED: &str = "Failed to load";
pub const REFRESH_FAILED: &str = "Failed to refresh";
pub const DELETE_FAILED: &str = "Failed to delete";

/// Remote operations on one collection.
///
/// Implemented by the HTTP resource controllers; tests use in-memory doubles.
pub trait CollectionApi<C: Collection>: Send + Sync {
    /// Fetches the index and every item's detail.
    fn fetch_list(
        &self,
        signal: Option<&AbortSignal>,
    ) -> impl Future<Output = Result<Vec<EnrichedItem<C::Detail>>, AppError>> + Send;

    fn create(&self, payload: &C::Payload) -> impl Future<Output = Result<(), AppError>> + Send;

    fn update(
        &self,
        id: &str,
        payload: &C::Payload,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Everything a list view renders from.
#[derive(Debug, Clone)]
pub struct ListState<C: Collection> {
    /// `None` while loading.
    pub items: Option<Vec<EnrichedItem<C::Detail>>>,
    /// List-level failure; replaces the list when set.
    pub error: Option<String>,
    /// Pathnames with a deletion in flight.
    pub deleting: HashSet<String>,
    /// Pathname awaiting delete confirmation.
    pub confirm_path: Option<String>,
    pub search_query: String,
    pub page: usize,
    pub form: C::Form,
    pub form_open: bool,
    pub form_error: Option<String>,
    /// Decoded filename of the record being edited; `None` when adding.
    pub edit_id: Option<String>,
    pub creating: bool,
}

impl<C: Collection> Default for ListState<C> {
    fn default() -> Self {
        Self {
            items: None,
            error: None,
            deleting: HashSet::new(),
            confirm_path: None,
            search_query: String::new(),
            page: 1,
            form: C::Form::default(),
            form_open: false,
            form_error: None,
            edit_id: None,
            creating: false,
        }
    }
}

/// Drives a [`ListState`] through a [`CollectionApi`].
///
/// Methods take `&mut self`, so state updates never interleave.
pub struct ListActions<C: Collection, A> {
    api: A,
    state: ListState<C>,
}

impl<C, A> ListActions<C, A>
where
    C: Collection,
    A: CollectionApi<C>,
{
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: ListState::default(),
        }
    }

    pub fn state(&self) -> &ListState<C> {
        &self.state
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Sorted, filtered and paginated view of the current items.
    ///
    /// `None` while the list is loading.
    pub fn view(&self) -> Option<Page<&EnrichedItem<C::Detail>>> {
        let items = self.state.items.as_ref()?;
        let visible = filter_and_sort(items, &self.state.search_query);
        Some(paginate(visible, self.state.page, PAGE_SIZE))
    }

    pub fn is_deleting(&self) -> bool {
        !self.state.deleting.is_empty()
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.state.search_query = query.into();
        self.state.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.state.page = page.max(1);
    }

    /// Looks up an item by pathname.
    pub fn item(&self, pathname: &str) -> Option<&EnrichedItem<C::Detail>> {
        self.state
            .items
            .as_ref()?
            .iter()
            .find(|item| item.pathname == pathname)
    }

    /// Looks up an item by pathname or by its decoded filename.
    pub fn find(&self, id_or_pathname: &str) -> Option<&EnrichedItem<C::Detail>> {
        self.state.items.as_ref()?.iter().find(|item| {
            item.pathname == id_or_pathname || last_path_segment(&item.pathname) == id_or_pathname
        })
    }

    /// Initial load. Aborts are ignored; other failures set the list error.
    pub async fn load(&mut self, signal: &AbortSignal) {
        self.state.error = None;
        match self.api.fetch_list(Some(signal)).await {
            Ok(items) => {
                debug!("Loaded {} {}", items.len(), C::NAME);
                self.state.items = Some(items);
            }
            Err(e) if e.is_cancelled() => debug!("Loading {} aborted", C::NAME),
            Err(e) => {
                warn!("Failed to load {}: {}", C::NAME, e);
                self.state.error = Some(failure_message(&e, LOAD_FAILED));
            }
        }
    }

    /// Drops the current items and fetches them again.
    pub async fn refresh(&mut self) {
        self.state.error = None;
        self.state.items = None;
        match self.api.fetch_list(None).await {
            Ok(items) => self.state.items = Some(items),
            Err(e) => {
                warn!("Failed to refresh {}: {}", C::NAME, e);
                self.state.error = Some(failure_message(&e, REFRESH_FAILED));
            }
        }
    }

    /// Opens an empty form for a new record.
    pub fn open_add(&mut self) {
        self.state.form = C::Form::default();
        self.state.form_error = None;
        self.state.edit_id = None;
        self.state.form_open = true;
    }

    /// Opens the form pre-filled from an item. Returns false when the item is
    /// unknown or has no detail.
    pub fn open_edit(&mut self, pathname: &str) -> bool {
        let Some(detail) = self.item(pathname).and_then(|item| item.detail.as_ref()) else {
            return false;
        };
        self.state.form = C::Form::from_detail(detail);
        self.state.form_error = None;
        self.state.edit_id = Some(last_path_segment(pathname));
        self.state.form_open = true;
        true
    }

    pub fn form_mut(&mut self) -> &mut C::Form {
        &mut self.state.form
    }

    pub fn close_form(&mut self) {
        self.state.form = C::Form::default();
        self.state.form_error = None;
        self.state.edit_id = None;
        self.state.form_open = false;
    }

    /// Validates and saves the form. Returns true when the record was saved.
    ///
    /// Validation failures never reach the API. A failed save keeps the form
    /// open with its error; a successful one refreshes the list and resets the
    /// form.
    pub async fn submit_form(&mut self) -> bool {
        self.state.form_error = None;

        let payload = match self.state.form.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                self.state.form_error = Some(e.to_string());
                return false;
            }
        };

        self.state.creating = true;
        let result = match self.state.edit_id.as_deref() {
            Some(id) => {
                info!("Updating {} {}", C::LABEL, id);
                self.api.update(id, &payload).await
            }
            None => {
                info!("Creating {}", C::LABEL);
                self.api.create(&payload).await
            }
        };

        if let Err(e) = result {
            warn!("Failed to save {}: {}", C::LABEL, e);
            self.state.form_error = Some(failure_message(&e, <C::Form as RecordForm>::SAVE_FAILED));
            self.state.creating = false;
            return false;
        }

        self.refresh().await;
        self.close_form();
        self.state.creating = false;
        true
    }

    pub fn request_delete(&mut self, pathname: impl Into<String>) {
        self.state.confirm_path = Some(pathname.into());
    }

    pub fn cancel_delete(&mut self) {
        self.state.confirm_path = None;
    }

    /// Deletes the item at `pathname` by its decoded filename and re-fetches.
    ///
    /// The deleting marker and the confirm prompt are cleared whatever the
    /// outcome.
    pub async fn delete(&mut self, pathname: &str) {
        let filename = last_path_segment(pathname);
        self.state.deleting.insert(pathname.to_string());

        info!("Deleting {} {}", C::LABEL, filename);
        let result = match self.api.delete(&filename).await {
            Ok(()) => self.api.fetch_list(None).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(items) => self.state.items = Some(items),
            Err(e) => {
                warn!("Failed to delete {}: {}", filename, e);
                self.state.error = Some(failure_message(&e, DELETE_FAILED));
            }
        }

        self.state.deleting.remove(pathname);
        self.state.confirm_path = None;
    }
}
