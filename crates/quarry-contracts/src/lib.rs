// Public contracts for the Quarry indexing pipeline
// This crate defines the job DTO, the tracker checkout protocol payloads,
// and the status frame vocabulary shared by workers and their supervisors.

pub mod job;
pub mod status;
pub mod tracker;

pub use job::*;
pub use status::*;
pub use tracker::*;
