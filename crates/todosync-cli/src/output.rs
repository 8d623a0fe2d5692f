//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;
use todosync_core::{ClearReport, Task, TaskId, VisibleTask};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a task confirmed by the store
    pub fn print_task(&self, task: &Task) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:        {}", task.id);
                println!("Title:     {}", task.title);
                println!("Completed: {}", if task.completed { "yes" } else { "no" });
            }
            OutputFormat::Json => print_json(task),
            OutputFormat::Quiet => println!("{}", task.id),
        }
    }

    /// Print the visible tasks followed by the items-left counter
    pub fn print_tasks(&self, tasks: &[VisibleTask], items_left: usize) {
        match self.format {
            OutputFormat::Human => {
                if tasks.is_empty() {
                    println!("No todos found.");
                } else {
                    for task in tasks {
                        println!("{}", task_line(task));
                    }
                }
                println!("\n{}", items_left_label(items_left));
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "todos": tasks,
                    "itemsLeft": items_left,
                }));
            }
            OutputFormat::Quiet => {
                for task in tasks {
                    println!("{}", task.id);
                }
            }
        }
    }

    /// Print the outcome of a clear-completed batch
    pub fn print_clear_report(&self, report: &ClearReport) {
        match self.format {
            OutputFormat::Human => {
                if report.removed.is_empty() && report.failures.is_empty() {
                    println!("No completed todos to clear.");
                } else {
                    println!("Cleared {} completed todo(s)", report.removed.len());
                }
                for failure in &report.failures {
                    println!("✗ {} | {} ({})", failure.id, failure.title, failure.reason);
                }
                if report.aborted {
                    println!("✗ Clear did not finish; some results are unknown");
                }
            }
            OutputFormat::Json => print_json(&ClearReportJson::from(report)),
            OutputFormat::Quiet => {
                for id in &report.removed {
                    println!("{}", id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearReportJson {
    removed: Vec<u64>,
    failures: Vec<ClearFailureJson>,
    aborted: bool,
}

#[derive(Serialize)]
struct ClearFailureJson {
    id: u64,
    title: String,
    reason: String,
}

impl From<&ClearReport> for ClearReportJson {
    fn from(report: &ClearReport) -> Self {
        Self {
            removed: report.removed.iter().map(|id| id.0).collect(),
            failures: report
                .failures
                .iter()
                .map(|f| ClearFailureJson {
                    id: f.id.0,
                    title: f.title.clone(),
                    reason: f.reason.clone(),
                })
                .collect(),
            aborted: report.aborted,
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

/// One human-readable row: checkbox, id and title
pub fn task_line(task: &VisibleTask) -> String {
    let mark = if task.completed { "[x]" } else { "[ ]" };
    let id = match task.id {
        TaskId::Confirmed(id) => id.to_string(),
        TaskId::Pending(token) => token.to_string(),
    };
    format!("{} {:>9}  {}", mark, id, truncate(&task.title, 60))
}

/// Footer counter text
pub fn items_left_label(count: usize) -> String {
    format!("{} items left", count)
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
