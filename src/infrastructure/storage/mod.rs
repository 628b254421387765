mod local_store;
mod mock_store;
mod store_factory;

pub use local_store::LocalBlobStore;
pub use mock_store::MockBlobStore;
pub use store_factory::create_blob_store;
