/*!
 * Read helpers for patient pages and the doctor sharing screen.
 *
 * Everything here reads from a `CatalogSnapshot`; nothing touches the store.
 */

pub mod messages;
pub mod pages;

pub use crate::language_utils::normalize_language;
pub use messages::{MessagePrefixes, PREFIX_CACHE_TTL};
pub use pages::{ClusterPage, ClusterPageItem, VideoPage, cluster_page, share_payload, video_page};
