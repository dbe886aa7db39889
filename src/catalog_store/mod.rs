mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{Album, ResolvedAlbum, ResolvedSong, Song};
pub use schema::VERSIONED_SCHEMAS;
pub use store::SqliteCatalogStore;
pub use trait_def::CatalogStore;
