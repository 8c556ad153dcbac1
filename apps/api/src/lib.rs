//! Resume parsing service.
//!
//! Decodes PDF, Word and plain-text resumes and extracts the candidate's
//! name, email address and skills. Each field runs an ordered fallback chain
//! of extraction strategies (regular expressions, entity recognition, a
//! generative model); a chain that runs dry leaves its field empty instead of
//! failing the request.

pub mod config;
pub mod documents;
pub mod errors;
pub mod extraction;
pub mod llm_client;
pub mod models;
pub mod ner_client;
pub mod parser;
pub mod routes;
pub mod state;

pub use models::ResumeData;
pub use parser::{ParseError, ResumeParser};
