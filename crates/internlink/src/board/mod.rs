//! Standalone job board: a deliberately small catalog with open CRUD,
//! served by its own binary next to the marketplace API.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Job, JobDraft, JobFilter, JobId};
pub use repository::JobRepository;
pub use router::job_router;
pub use service::{JobBoardService, JobError};
