mod tools;

pub use tools::{AnalyzeRepoRequest, AnalyzeSourceRequest, LensServer};
