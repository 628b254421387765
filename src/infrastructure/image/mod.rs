mod kie_image_generator;
mod mock_image_generator;

pub use kie_image_generator::KieImageGenerator;
pub use mock_image_generator::MockImageGenerator;
