//! Marksort engine: bookmark store access, liveness probing, model
//! categorization and the reorganization pipeline.
mod categorize;
mod controller;
mod engine;
mod gemini;
mod liveness;
mod persist;
mod progress;
mod reorganize;
mod store;
mod types;
mod validate;

pub use categorize::{
    build_system_prompt, build_user_prompt, extract_json, parse_plans, truncate, Categorizer,
    TITLE_LIMIT, URL_LIMIT,
};
pub use controller::Controller;
pub use engine::EngineHandle;
pub use gemini::{
    CategorizerSettings, GeminiClient, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, ModelClient, DEFAULT_BASE_URL, DEFAULT_MODEL,
};
pub use liveness::{LivenessProbe, LivenessSettings, ReqwestLivenessChecker};
pub use persist::{load_tree, save_tree, write_atomic, PersistError};
pub use progress::{ChannelProgressSink, NullProgressSink, ProgressSink};
pub use reorganize::{DateSource, OrganizerConfig, Reorganizer, DEAD_LINKS_FOLDER};
pub use store::{BookmarkStore, InMemoryBookmarkStore, StoreError};
pub use types::{
    Cancelled, EngineEvent, MutationWarning, OrganizeError, RunEnd, RunOutcome, SetupError, Stage,
    TransportError,
};
pub use validate::{BatchValidator, Validation, VALIDATION_BATCH_SIZE};
