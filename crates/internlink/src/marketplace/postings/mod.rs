pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    FieldOfWork, Posting, PostingDraft, PostingFilter, PostingId, PostingStatus, PostingUpdate,
    PostingView,
};
pub use repository::PostingRepository;
pub use router::{posting_failure, posting_router};
pub use service::{PostingError, PostingService};
