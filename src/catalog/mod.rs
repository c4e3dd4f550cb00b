/*!
 * Sharing catalog.
 *
 * - `snapshot`: the serialized view of all published entries
 * - `service`: the keyed cache around it (`SharingCatalog`)
 * - `admin`: administrative writes that invalidate the cache
 */

pub mod admin;
pub mod service;
pub mod snapshot;

pub use admin::CatalogAdmin;
pub use service::{CATALOG_CACHE_KEY, SharingCatalog};
pub use snapshot::{
    CatalogSnapshot, ClusterEntry, ClusterVideoEntry, Localized, TriggerEntry, VideoEntry,
};
