//! Minijinja template rendering for reminder emails.
//!
//! Templates are arbitrary strings (not pre-registered), so a fresh
//! [`minijinja::Environment`] is created per render call.

use nudge_core::Task;

use crate::traits::NotifyError;

/// Subject prefix for reminder emails.
pub const EMAIL_SUBJECT_PREFIX: &str = "Task Reminder: ";

/// Plain-text body of a reminder email.
pub const EMAIL_BODY_TEMPLATE: &str = "Hello!

This is a reminder for your task:

Title: {{ task.title }}
Description: {{ task.description }}
Scheduled Time: {{ task.due }}

Best regards,
{{ app_name }}
";

/// Signature used in reminder emails.
pub const APP_NAME: &str = "Personal Task Reminder System";

/// Context data available to reminder templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateContext {
    pub task: TaskContext,
    pub app_name: String,
}

/// Task fields exposed to templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskContext {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Due time formatted `%Y-%m-%d %H:%M`.
    pub due: String,
}

impl TemplateContext {
    pub fn for_task(task: &Task) -> Self {
        Self {
            task: TaskContext {
                id: task.id.clone(),
                title: task.title.clone(),
                description: task.description.clone(),
                due: task.formatted_due(),
            },
            app_name: APP_NAME.to_string(),
        }
    }
}

/// Renders notification templates using minijinja.
#[derive(Debug, Default)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.set_keep_trailing_newline(true);
        env
    }

    /// Render a template string with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render(&self, template_str: &str, ctx: &TemplateContext) -> Result<String, NotifyError> {
        let env = Self::build_env();
        env.render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Subject line for a task's reminder email.
    pub fn email_subject(&self, task: &Task) -> String {
        format!("{EMAIL_SUBJECT_PREFIX}{}", task.title)
    }

    /// Body of a task's reminder email.
    pub fn email_body(&self, task: &Task) -> Result<String, NotifyError> {
        self.render(EMAIL_BODY_TEMPLATE, &TemplateContext::for_task(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_task() -> Task {
        Task {
            id: "4".to_string(),
            title: "Pay bill".to_string(),
            description: "Electricity, due Friday".to_string(),
            reminder_time: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            email: "me@example.com".to_string(),
            phone: String::new(),
            is_completed: false,
            is_active: true,
        }
    }

    #[test]
    fn subject_has_prefix() {
        let renderer = TemplateRenderer::new();
        assert_eq!(renderer.email_subject(&sample_task()), "Task Reminder: Pay bill");
    }

    #[test]
    fn body_contains_task_fields() {
        let renderer = TemplateRenderer::new();
        let body = renderer.email_body(&sample_task()).unwrap();
        assert!(body.starts_with("Hello!"));
        assert!(body.contains("Title: Pay bill"));
        assert!(body.contains("Description: Electricity, due Friday"));
        assert!(body.contains("Scheduled Time: 2025-03-01 09:30"));
        assert!(body.contains("Personal Task Reminder System"));
    }

    #[test]
    fn body_does_not_html_escape() {
        let renderer = TemplateRenderer::new();
        let mut task = sample_task();
        task.title = "Tom & Jerry <3".to_string();
        let body = renderer.email_body(&task).unwrap();
        assert!(body.contains("Title: Tom & Jerry <3"));
    }

    #[test]
    fn invalid_template_produces_error() {
        let renderer = TemplateRenderer::new();
        let ctx = TemplateContext::for_task(&sample_task());
        match renderer.render("{{ unclosed", &ctx) {
            Err(NotifyError::Template(msg)) => assert!(!msg.is_empty()),
            other => panic!("Expected Template error, got: {:?}", other),
        }
    }
}
