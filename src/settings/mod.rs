// Settings — capture configuration and loading.

pub mod store;
pub mod types;
