//! Interactive prompt.
//!
//! Reads commands line by line while reminder popups from the background
//! scheduler are printed as soon as they arrive, including in the middle
//! of a multi-field prompt.

use anyhow::Result;
use nudge_core::{time, EmailSettings, NewTask, NudgeError};
use nudge_service::{Popup, ReminderService};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::input::LineReader;
use crate::terminal::Terminal;

const PROMPT: &str = "nudge> ";

/// A parsed prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Add,
    List,
    Complete(String),
    Delete(String),
    Settings,
    SettingsEdit,
    TestEmail,
    Status,
    Tick,
    Help,
    Quit,
    Empty,
    /// A command that needs a task id was given none.
    MissingId(&'static str),
    Unknown(String),
}

pub fn parse_command(line: &str) -> ReplCommand {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return ReplCommand::Empty;
    };
    let arg = words.next();

    match (head.to_lowercase().as_str(), arg) {
        ("add" | "new", _) => ReplCommand::Add,
        ("list" | "ls", _) => ReplCommand::List,
        ("complete" | "done", Some(id)) => ReplCommand::Complete(id.to_string()),
        ("complete" | "done", None) => ReplCommand::MissingId("complete"),
        ("delete" | "rm", Some(id)) => ReplCommand::Delete(id.to_string()),
        ("delete" | "rm", None) => ReplCommand::MissingId("delete"),
        ("settings", Some("edit")) => ReplCommand::SettingsEdit,
        ("settings", _) => ReplCommand::Settings,
        ("test-email", _) => ReplCommand::TestEmail,
        ("status", _) => ReplCommand::Status,
        ("tick", _) => ReplCommand::Tick,
        ("help" | "?", _) => ReplCommand::Help,
        ("quit" | "exit", _) => ReplCommand::Quit,
        _ => ReplCommand::Unknown(line.to_string()),
    }
}

/// Message to show the user for a failed operation.
fn user_message(err: &NudgeError) -> String {
    match err {
        NudgeError::Validation(msg) => msg.clone(),
        NudgeError::NotFound(id) => format!("No active task with id {id}"),
        other => other.to_string(),
    }
}

pub struct Repl {
    service: ReminderService,
    terminal: Terminal,
    lines: LineReader,
    popups: UnboundedReceiver<Popup>,
}

impl Repl {
    pub fn new(service: ReminderService, popups: UnboundedReceiver<Popup>) -> Self {
        Self::with_reader(service, popups, LineReader::stdin())
    }

    pub fn with_reader(
        service: ReminderService,
        popups: UnboundedReceiver<Popup>,
        lines: LineReader,
    ) -> Self {
        Self {
            service,
            terminal: Terminal::new(),
            lines,
            popups,
        }
    }

    /// Start the scheduler, run the prompt until quit, then stop the scheduler.
    pub async fn run(mut self) -> Result<()> {
        let config = self.service.config();
        self.terminal.print_banner(
            &config.data_dir.display().to_string(),
            config.tick_interval.as_secs(),
        )?;

        let scheduler = self.service.start_scheduler();
        let result = self.session().await;
        scheduler.shutdown().await;

        self.terminal.print_info("Goodbye.")?;
        result
    }

    /// Command loop. Returns at `quit`, end of input or Ctrl+C.
    pub async fn session(&mut self) -> Result<()> {
        loop {
            let Some(line) = self.prompt(PROMPT).await? else {
                return Ok(());
            };

            match parse_command(&line) {
                ReplCommand::Empty => {}
                ReplCommand::Quit => return Ok(()),
                ReplCommand::Add => self.add_task().await?,
                ReplCommand::List => self.list_tasks()?,
                ReplCommand::Complete(id) => self.complete_task(&id)?,
                ReplCommand::Delete(id) => self.delete_task(&id).await?,
                ReplCommand::Settings => {
                    self.terminal.print_settings(&self.service.get_email_settings())?
                }
                ReplCommand::SettingsEdit => self.edit_settings().await?,
                ReplCommand::TestEmail => self.test_email().await?,
                ReplCommand::Status => self.status()?,
                ReplCommand::Tick => self.tick().await?,
                ReplCommand::Help => self.terminal.print_help()?,
                ReplCommand::MissingId(cmd) => self
                    .terminal
                    .print_warning(&format!("Please select a task: {cmd} <id>"))?,
                ReplCommand::Unknown(text) => self
                    .terminal
                    .print_warning(&format!("Unknown command '{text}'. Type 'help'."))?,
            }
        }
    }

    /// Print `label` and wait for a line, showing popups while waiting.
    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        self.terminal.print_prompt(label)?;
        loop {
            tokio::select! {
                Some(popup) = self.popups.recv() => {
                    self.terminal.print_popup(&popup)?;
                    self.terminal.print_prompt(label)?;
                }
                line = self.lines.next_line() => return Ok(line),
                _ = tokio::signal::ctrl_c() => return Ok(None),
            }
        }
    }

    /// Prompt with a default shown in brackets; an empty answer takes it.
    async fn prompt_default(&mut self, label: &str, default: &str) -> Result<Option<String>> {
        let line = self.prompt(&format!("{label} [{default}]: ")).await?;
        Ok(line.map(|l| if l.is_empty() { default.to_string() } else { l }))
    }

    async fn add_task(&mut self) -> Result<()> {
        let (default_date, default_time) = time::default_form_values(time::now_local());

        let Some(title) = self.prompt("Title: ").await? else { return Ok(()) };
        let Some(description) = self.prompt("Description: ").await? else { return Ok(()) };
        let Some(date) = self.prompt_default("Date (YYYY-MM-DD)", &default_date).await? else {
            return Ok(());
        };
        let Some(time_text) = self.prompt_default("Time (HH:MM)", &default_time).await? else {
            return Ok(());
        };
        let Some(email) = self.prompt("Email (optional): ").await? else { return Ok(()) };
        let Some(phone) = self.prompt("Phone (optional): ").await? else { return Ok(()) };

        let reminder_time = match time::parse_reminder_time(&date, &time_text) {
            Ok(ts) => ts,
            Err(e) => return self.show_error(&e),
        };
        let new = NewTask {
            title,
            description,
            reminder_time: Some(reminder_time),
            email,
            phone,
        };

        match self.service.create_task(new) {
            Ok(task) => self.terminal.print_task_added(&task),
            Err(e) => self.show_error(&e),
        }
    }

    fn list_tasks(&self) -> Result<()> {
        match self.service.list_active_tasks() {
            Ok(tasks) => self.terminal.print_tasks(&tasks),
            Err(e) => self.show_error(&e),
        }
    }

    fn complete_task(&self, id: &str) -> Result<()> {
        match self.service.complete_task(id) {
            Ok(()) => self.terminal.print_success(&format!("Task {id} completed")),
            Err(e) => self.show_error(&e),
        }
    }

    async fn delete_task(&mut self, id: &str) -> Result<()> {
        let question = format!("Are you sure you want to delete task {id}? [y/N] ");
        let Some(answer) = self.prompt(&question).await? else { return Ok(()) };
        if !matches!(answer.to_lowercase().as_str(), "y" | "yes") {
            return self.terminal.print_info("Delete cancelled.");
        }
        match self.service.delete_task(id) {
            Ok(()) => self.terminal.print_success(&format!("Task {id} deleted")),
            Err(e) => self.show_error(&e),
        }
    }

    async fn edit_settings(&mut self) -> Result<()> {
        let current = self.service.get_email_settings();
        let port = current.smtp_port.to_string();

        let Some(smtp_server) = self.prompt_default("SMTP Server", &current.smtp_server).await?
        else {
            return Ok(());
        };
        let Some(port_text) = self.prompt_default("SMTP Port", &port).await? else {
            return Ok(());
        };
        let Some(email_username) = self
            .prompt_default("Email", &current.email_username)
            .await?
        else {
            return Ok(());
        };
        let Some(password) = self.prompt("Password (blank keeps current): ").await? else {
            return Ok(());
        };

        let settings = EmailSettings {
            smtp_server,
            smtp_port: EmailSettings::parse_port(&port_text),
            email_username,
            email_password: if password.is_empty() {
                current.email_password
            } else {
                password
            },
        };
        match self.service.save_email_settings(settings) {
            Ok(()) => self.terminal.print_success("Email settings saved successfully!"),
            Err(e) => self.show_error(&e),
        }
    }

    async fn test_email(&self) -> Result<()> {
        let settings = self.service.get_email_settings();
        info!(settings = %settings.redacted_summary(), "Testing SMTP connection");
        self.terminal.print_info("Connecting...")?;
        match self.service.test_email_connection(&settings).await {
            Ok(()) => self.terminal.print_success("Email connection test successful!"),
            Err(e) => self
                .terminal
                .print_error(&format!("Connection test failed: {}", user_message(&e))),
        }
    }

    fn status(&self) -> Result<()> {
        let active = self
            .service
            .list_active_tasks()
            .map(|t| t.len())
            .unwrap_or_default();
        self.terminal
            .print_status(&self.service.scheduler_metrics(), active)
    }

    async fn tick(&mut self) -> Result<()> {
        match self.service.run_scheduler_once().await {
            Ok(report) => {
                while let Ok(popup) = self.popups.try_recv() {
                    self.terminal.print_popup(&popup)?;
                }
                self.terminal.print_tick_report(&report)
            }
            Err(e) => self.show_error(&e),
        }
    }

    fn show_error(&self, err: &NudgeError) -> Result<()> {
        if err.is_warning() {
            self.terminal.print_warning(&user_message(err))
        } else {
            self.terminal.print_error(&user_message(err))
        }
    }
}
