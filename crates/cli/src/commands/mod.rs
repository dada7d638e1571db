//! CLI subcommands.

pub mod auth;
pub mod import;
pub mod seed;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use proglearn_backend::{BackendError, LessonGateway};
    use proglearn_core::{
        Category, CategoryId, CategoryPayload, Lesson, LessonId, LessonPatch, LessonPayload,
    };

    /// Gateway that keeps the titles of created lessons.
    #[derive(Default)]
    pub struct RecordingGateway {
        created: Mutex<Vec<String>>,
    }

    impl RecordingGateway {
        pub fn created(&self) -> Vec<String> {
            self.created.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LessonGateway for RecordingGateway {
        async fn list_all_lessons(&self) -> Result<Vec<Lesson>, BackendError> {
            Ok(Vec::new())
        }

        async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
            Ok(Vec::new())
        }

        async fn create_lesson(&self, payload: &LessonPayload) -> Result<Lesson, BackendError> {
            let mut created = self.created.lock().unwrap();
            created.push(payload.title.clone());
            Ok(Lesson {
                id: LessonId::new(i64::try_from(created.len()).unwrap()),
                title: payload.title.clone(),
                content: payload.content.clone(),
                featured_image: None,
                status: payload.status,
                category_id: payload.category_id,
                category: None,
                views_count: 0,
                created_at: Utc::now(),
                updated_at: None,
                excerpt: None,
                meta_description: None,
                code_snippets: payload.code_snippets.clone(),
            })
        }

        async fn update_lesson(
            &self,
            _id: LessonId,
            _patch: &LessonPatch,
        ) -> Result<Lesson, BackendError> {
            unreachable!("the CLI never updates lessons")
        }

        async fn delete_lesson(&self, _id: LessonId) -> Result<(), BackendError> {
            unreachable!("the CLI never deletes lessons")
        }

        async fn create_category(&self, payload: &CategoryPayload) -> Result<Category, BackendError> {
            Ok(Category {
                id: CategoryId::new(1),
                name: payload.name.clone(),
                difficulty: payload.difficulty,
                lesson_count: 0,
            })
        }
    }
}
