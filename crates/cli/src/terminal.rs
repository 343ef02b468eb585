use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use nudge_core::{EmailSettings, Task};
use nudge_service::{Popup, SchedulerMetrics, TickReport};
use std::io::{self, Write};

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const PROMPT: Color = Color::Green;
    const POPUP: Color = Color::Yellow;
    const TASK_ID: Color = Color::Cyan;
    const WARNING: Color = Color::DarkYellow;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

const TITLE_WIDTH: usize = 24;

/// Table row for one task: id, title, due time, status, description preview.
pub fn task_row(task: &Task) -> String {
    format!(
        "{:<5} {:<width$} {:<16} {:<9} {}",
        task.id,
        truncate(&task.title, TITLE_WIDTH),
        task.formatted_due(),
        task.status().to_string(),
        task.description_preview(),
        width = TITLE_WIDTH,
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// One line per fired task summarising its channel outcomes.
pub fn tick_lines(report: &TickReport) -> Vec<String> {
    report
        .fired
        .iter()
        .map(|(id, outcome)| {
            let email = match (outcome.email_attempted, outcome.email_ok) {
                (false, _) => "skipped",
                (true, true) => "sent",
                (true, false) => "failed",
            };
            format!(
                "task {id}: desktop {}, email {email}, sms {}",
                if outcome.desktop_ok { "shown" } else { "failed" },
                if outcome.sms_noted { "noted" } else { "skipped" },
            )
        })
        .collect()
}

/// Manages terminal output for the interactive prompt.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print the startup banner.
    pub fn print_banner(&self, data_dir: &str, tick_secs: u64) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("nudge"),
            ResetColor,
            Print(" - Personal Task Reminder System\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!("Data: {} | Checking every {}s\n", data_dir, tick_secs)),
            Print("Type 'help' for commands, 'quit' to exit.\n"),
            Print("---\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an input prompt without a trailing newline.
    pub fn print_prompt(&self, label: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::PROMPT),
            Print(label),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Show a reminder popup.
    pub fn print_popup(&self, popup: &Popup) -> Result<()> {
        let mut stdout = io::stdout();
        let rule = "=".repeat(40);
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::POPUP),
            Print(format!("{rule}\n")),
            Print(format!("{}\n", popup.message())),
            Print(format!("{rule}\n")),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print the active task table.
    pub fn print_tasks(&self, tasks: &[Task]) -> Result<()> {
        let mut stdout = io::stdout();
        if tasks.is_empty() {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print("No active tasks.\n"),
                ResetColor,
            )?;
            return Ok(());
        }

        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print(format!(
                "{:<5} {:<width$} {:<16} {:<9} {}\n",
                "ID",
                "TITLE",
                "DUE",
                "STATUS",
                "DESCRIPTION",
                width = TITLE_WIDTH,
            )),
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", "-".repeat(80))),
            ResetColor,
        )?;
        for task in tasks {
            execute!(stdout, Print(format!("{}\n", task_row(task))))?;
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn print_task_added(&self, task: &Task) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("Task "),
            SetForegroundColor(Colors::TASK_ID),
            Print(&task.id),
            ResetColor,
            Print(format!(" added, due {}\n", task.formatted_due())),
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print email settings with the password masked.
    pub fn print_settings(&self, settings: &EmailSettings) -> Result<()> {
        let password = if settings.email_password.is_empty() {
            "(not set)"
        } else {
            "********"
        };
        let username = if settings.email_username.is_empty() {
            "(not set)"
        } else {
            settings.email_username.as_str()
        };
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("Email Settings:\n"),
            ResetColor,
            Print(format!("  SMTP Server:  {}\n", settings.smtp_server)),
            Print(format!("  SMTP Port:    {}\n", settings.smtp_port)),
            Print(format!("  Email:        {}\n", username)),
            Print(format!("  Password:     {}\n", password)),
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_tick_report(&self, report: &TickReport) -> Result<()> {
        if report.is_empty() {
            return self.print_info("No tasks due.");
        }
        for line in tick_lines(report) {
            self.print_info(&line)?;
        }
        Ok(())
    }

    pub fn print_status(&self, metrics: &SchedulerMetrics, active: usize) -> Result<()> {
        let last = metrics
            .last_tick
            .map(|t| t.format(nudge_core::time::DISPLAY_FORMAT).to_string())
            .unwrap_or_else(|| "never".to_string());
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("Scheduler:\n"),
            ResetColor,
            Print(format!("  Active tasks:      {}\n", active)),
            Print(format!("  Ticks:             {}\n", metrics.ticks)),
            Print(format!("  Last tick:         {}\n", last)),
            Print(format!("  Reminders fired:   {}\n", metrics.reminders_fired)),
            Print(format!("  Popup failures:    {}\n", metrics.desktop_failures)),
            Print(format!("  Email failures:    {}\n", metrics.email_failures)),
            Print(format!(
                "  Avg tick:          {}ms\n",
                metrics.avg_tick_duration.as_millis()
            )),
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_help(&self) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("Commands:\n"),
            ResetColor,
            Print("  add               Add a task\n"),
            Print("  list              Show active tasks\n"),
            Print("  complete <id>     Mark a task completed\n"),
            Print("  delete <id>       Delete a task\n"),
            Print("  settings          Show email settings\n"),
            Print("  settings edit     Change email settings\n"),
            Print("  test-email        Test the email settings\n"),
            Print("  status            Show scheduler status\n"),
            Print("  tick              Check for due tasks now\n"),
            Print("  help              Show this help\n"),
            Print("  quit              Exit\n"),
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_success(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::PROMPT),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_warning(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::WARNING),
            Print(format!("Warning: {}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an error message.
    pub fn print_error(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::ERROR),
            Print(format!("Error: {}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an info message.
    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nudge_service::TickReport;

    fn task() -> Task {
        Task {
            id: "7".to_string(),
            title: "Renew passport before the summer trip".to_string(),
            description: "Bring photos".to_string(),
            reminder_time: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            email: String::new(),
            phone: String::new(),
            is_completed: false,
            is_active: true,
        }
    }

    #[test]
    fn row_truncates_long_title() {
        let row = task_row(&task());
        assert!(row.starts_with("7     Renew passport before... "));
        assert!(row.contains("2025-03-01 09:30"));
        assert!(row.contains("Pending"));
        assert!(row.ends_with("Bring photos"));
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("ééééé", 4), "é...");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn tick_lines_describe_channels() {
        let report = TickReport {
            fired: vec![(
                "3".to_string(),
                nudge_service::DispatchReport {
                    desktop_ok: true,
                    email_attempted: true,
                    email_ok: false,
                    sms_noted: false,
                    results: Vec::new(),
                },
            )],
        };
        assert_eq!(
            tick_lines(&report),
            vec!["task 3: desktop shown, email failed, sms skipped"]
        );
    }
}
