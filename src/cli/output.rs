//! Colored terminal output for release runs

use std::io::Write;

use termcolor::{Buffer, BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

use crate::state::{EntryReport, EntryState, RunReport};

/// Consistent colored progress output on stdout, errors on stderr
#[derive(Debug)]
pub struct OutputManager {
    stdout: BufferWriter,
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            stdout: BufferWriter::stdout(ColorChoice::Auto),
            verbose,
            quiet,
        }
    }

    fn marked(&self, marker: &str, color: Color, bold: bool, message: &str) {
        if self.quiet {
            return;
        }
        let mut buffer = self.stdout.buffer();
        write_marked(&mut buffer, marker, color, bold, message);
        let _ = self.stdout.print(&buffer);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        self.marked("ℹ", Color::Cyan, false, message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        self.marked("✓", Color::Green, true, message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        self.marked("⚠", Color::Yellow, true, message);
    }

    /// Print a detail line, only with `--verbose`
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            self.marked("→", Color::Blue, false, message);
        }
    }

    /// Print an error message to stderr (never suppressed)
    pub fn error(&self, message: &str) {
        let stderr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = stderr.buffer();
        write_marked(&mut buffer, "✗", Color::Red, true, message);
        if stderr.print(&buffer).is_err() {
            println!("✗ {}", message);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        let mut buffer = self.stdout.buffer();
        let _ = writeln!(&mut buffer);
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
        let _ = writeln!(&mut buffer, "═══ {} ═══", title);
        let _ = buffer.reset();
        let _ = self.stdout.print(&buffer);
    }

    /// Print indented text (for sub-items)
    pub fn indent(&self, message: &str) {
        self.println(&format!("    {}", message));
    }

    /// Print a plain line
    pub fn println(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut buffer = self.stdout.buffer();
        let _ = writeln!(&mut buffer, "{}", message);
        let _ = self.stdout.print(&buffer);
    }

    /// Print one line per entry followed by the overall verdict
    pub fn run_report(&self, report: &RunReport) {
        self.section(&format!("Release {}", report.tag));
        for entry in &report.entries {
            self.entry_report(entry);
        }
        let failed = report.failed().count();
        if report.succeeded() {
            self.success(&format!(
                "All {} entries published for {}",
                report.entries.len(),
                report.tag
            ));
        } else {
            self.error(&format!(
                "{} of {} entries failed for {}",
                failed,
                report.entries.len(),
                report.tag
            ));
        }
    }

    /// Print the terminal state of one entry
    pub fn entry_report(&self, entry: &EntryReport) {
        match entry.state {
            EntryState::Published => {
                let artifact = entry
                    .canonical_artifact
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.success(&format!("{}: published {}", entry.platform, artifact));
                if let Some(sha) = &entry.sha256 {
                    self.verbose(&format!("sha256 {}", sha));
                }
                for package in &entry.packages {
                    self.verbose(&format!("pooled {}", package.display()));
                }
            }
            EntryState::Failed => {
                let (stage, message) = match &entry.failure {
                    Some(failure) => (
                        failure.stage.map(|s| s.name()).unwrap_or("task"),
                        failure.message.as_str(),
                    ),
                    None => ("unknown", ""),
                };
                self.error(&format!("{}: failed at {}", entry.platform, stage));
                for line in message.lines().take(if self.verbose { usize::MAX } else { 20 }) {
                    self.indent(line);
                }
            }
            other => self.warn(&format!("{}: stopped at {:?}", entry.platform, other)),
        }
    }
}

fn write_marked(buffer: &mut Buffer, marker: &str, color: Color, bold: bool, message: &str) {
    let _ = buffer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
    let _ = write!(buffer, "{}", marker);
    let _ = buffer.reset();
    let _ = writeln!(buffer, " {}", message);
}
