#![forbid(unsafe_code)]

pub mod service;

pub use service::{
    Backend, BackendError, InMemoryBackend, QuestionSource, StatsAck, StatsStore, StatsSubmission,
};
