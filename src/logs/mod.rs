//! Framework log capture for failed tests

pub mod classifier;
pub mod scraper;

pub use classifier::{classify, summarize, Classified, NO_LOGS_FOUND};
pub use scraper::{LogCapture, LogProbe, LogScraper, ProbeOutcome};
