//! Polyshape Core - Domain types, list logic, error handling, and configuration.

pub mod abort;
pub mod actions;
pub mod config;
pub mod content;
pub mod error;
pub mod form;
pub mod listing;
pub mod loading;
pub mod models;
pub mod path;
pub mod session;

pub use abort::{AbortController, AbortSignal};
pub use actions::{CollectionApi, ListActions, ListState};
pub use config::{default_config_path, load_config, AdminConfig, HttpConfig, SessionConfig};
pub use content::{join_content_for_edit, join_paragraphs, normalize_content};
pub use error::{failure_message, AppError};
pub use form::{FormError, ProjectForm, PublicationForm, RecordForm};
pub use listing::{filter_and_sort, paginate, parse_date, Page, PAGE_SIZE};
pub use loading::{LoadingTracker, LoadingTransition};
pub use models::{
    parse_list, Collection, Content, EnrichedItem, ListItem, ListedDetail, Partner,
    ProjectDetail, ProjectPayload, Projects, PublicationDetail, PublicationPayload, Publications,
};
pub use path::last_path_segment;
pub use session::{InactivityMonitor, SessionEvent};
