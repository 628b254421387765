use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{
    ImageGenerator, ImageGeneratorError, ImageRequest, ImageTaskId, ImageTaskStatus,
};

/// Generator stub for tests. Each submitted task succeeds after
/// `polls_until_success` polls with a distinct URL; individual task indexes
/// can be marked failing to exercise partial-failure paths.
pub struct MockImageGenerator {
    next_task: AtomicUsize,
    polls: Mutex<Vec<usize>>,
    polls_until_success: usize,
    failing_tasks: Vec<usize>,
}

impl MockImageGenerator {
    pub fn new() -> Self {
        Self {
            next_task: AtomicUsize::new(0),
            polls: Mutex::new(Vec::new()),
            polls_until_success: 1,
            failing_tasks: Vec::new(),
        }
    }

    pub fn with_failing_tasks(mut self, indexes: Vec<usize>) -> Self {
        self.failing_tasks = indexes;
        self
    }

    pub fn with_polls_until_success(mut self, polls: usize) -> Self {
        self.polls_until_success = polls;
        self
    }
}

impl Default for MockImageGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn submit(&self, _request: &ImageRequest) -> Result<ImageTaskId, ImageGeneratorError> {
        let index = self.next_task.fetch_add(1, Ordering::SeqCst);
        self.polls.lock().unwrap().push(0);
        Ok(ImageTaskId(format!("task-{}", index)))
    }

    async fn poll(&self, task_id: &ImageTaskId) -> Result<ImageTaskStatus, ImageGeneratorError> {
        let index: usize = task_id
            .0
            .strip_prefix("task-")
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ImageGeneratorError::InvalidResponse("unknown task".to_string()))?;

        let mut polls = self.polls.lock().unwrap();
        polls[index] += 1;

        if polls[index] < self.polls_until_success {
            return Ok(ImageTaskStatus::Pending);
        }
        if self.failing_tasks.contains(&index) {
            return Ok(ImageTaskStatus::Failed {
                message: "stub task failed".to_string(),
            });
        }
        Ok(ImageTaskStatus::Success {
            url: format!("https://images.example/{}.png", index),
        })
    }
}
