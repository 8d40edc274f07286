//! Application intake and review workflow.
//!
//! Students submit one application per posting; companies advance it through
//! a fixed review ladder. Every successful write lands exactly one
//! notification with the counterparty.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AdvanceRequest, Application, ApplicationId, ApplicationStatus, ApplicationView,
    StatusChange, SubmissionRequest,
};
pub use repository::ApplicationRepository;
pub use router::application_router;
pub use service::{ApplicationError, ApplicationService};
