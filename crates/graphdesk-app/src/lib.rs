//! Application layer of the graph studio: service seams, the in-memory graph
//! store, HTTP backends, settings and the headless [`StudioController`].

pub mod controller;
pub mod error;
pub mod guidance;
pub mod http;
pub mod interaction;
pub mod jobs;
pub mod memory;
pub mod service;
pub mod settings;
pub mod tutor;

pub use controller::{CatalogKind, FetchOutcome, StudioController};
pub use error::{BackendError, QueryError, StudioError};
pub use guidance::{CompetencyGuide, LinkedNode, SkillPlan};
pub use interaction::{Interaction, InteractionState};
pub use jobs::{HttpJobService, JobMonitor, JobService, JobState, JobStatus, TrackedJob};
pub use memory::{Fixture, FixtureNode, FixtureRelationship, MemoryGraphService};
pub use service::{GraphQuery, QueryService};
pub use settings::StudioSettings;
pub use tutor::{HttpTutorBackend, Question, QuestionRequest, QuestionStats, TutorBackend};
