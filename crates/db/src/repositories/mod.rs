//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async associated
//! functions. Single-statement functions accept any `PgExecutor` (a pool or
//! `&mut *tx`); functions that issue several statements take a
//! `&mut PgConnection` so they can run inside the caller's transaction.

pub mod answer_repo;
pub mod question_repo;
pub mod record_repo;
pub mod response_repo;
pub mod survey_repo;

pub use answer_repo::AnswerRepo;
pub use question_repo::QuestionRepo;
pub use record_repo::RecordRepo;
pub use response_repo::ResponseRepo;
pub use survey_repo::SurveyRepo;
