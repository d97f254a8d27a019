pub mod download;
pub mod locator;
pub mod pdf;
pub mod pipeline;
pub mod scroll;
pub mod session;

pub use download::Downloader;
pub use locator::ResourceMap;
pub use pdf::{AssembledPdf, assemble_pdf};
pub use pipeline::{Captured, Pipeline, auto_scroll_page, scroll_and_download_from_url};
pub use scroll::{ScrollController, ScrollReport, ScrollSettings};
pub use session::Session;
