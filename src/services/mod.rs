pub mod downloader;
pub mod lookup;
pub mod merger;

pub use downloader::{DocumentDownloader, HttpDownloader};
pub use lookup::LookupTrigger;
pub use merger::{MergeReport, PdfMerger};
