//! # Notification Operations
//!
//! The concrete graph nodes run for every handled notification:
//!
//! - [`ConfigDownloader`] (global and tenant): leaves, persist one fragment each
//! - [`ConfigMerger`]: after both downloaders, persists the merged configuration
//! - [`DeliveryReporter`]: after the merger, emits one delivery record
//! - [`DeeplinkExtractor`] and [`MediaAttachmentDownloader`]: independent
//!   leaves writing disjoint fields of the draft
//!
//! Fetch failures are logged and swallowed inside each node, so a node only
//! fails when its own bookkeeping (e.g. a repository write) does.

pub mod config_downloader;
pub mod config_merger;
pub mod deeplink_extractor;
pub mod delivery_reporter;
pub mod media_attachment_downloader;

pub use config_downloader::ConfigDownloader;
pub use config_merger::ConfigMerger;
pub use deeplink_extractor::DeeplinkExtractor;
pub use delivery_reporter::DeliveryReporter;
pub use media_attachment_downloader::MediaAttachmentDownloader;
