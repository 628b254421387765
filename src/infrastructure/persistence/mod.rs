mod mock_repository;
mod pg_episode_repository;
mod pg_pool;
mod pg_project_repository;

pub use mock_repository::{MockEpisodeRepository, MockProjectRepository};
pub use pg_episode_repository::PgEpisodeRepository;
pub use pg_pool::create_pool;
pub use pg_project_repository::PgProjectRepository;
