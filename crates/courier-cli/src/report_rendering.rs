//! Chat text for build acknowledgements, summaries, and the report prompt.

use courier_build::{BuildJob, BuildResult, BuildSource};
use courier_core::tail_chars;

pub const BUILD_REPORT_TITLE: &str = ":clipboard: *Build report*";
pub const BUILD_REPORT_STARTING: &str = ":hourglass_flowing_sand: Generating build report...";
pub const FALLBACK_NOTICE: &str =
    ":warning: Could not trigger a new build, reading the last completed build...";
pub const ANALYSIS_PLACEHOLDER: &str = ":brain: Analysing...";

pub fn render_build_running(alias: &str) -> String {
    format!(":gear: Running Jenkins job *{alias}*...")
}

pub fn render_analysis_running() -> String {
    ":brain: Analysing build output with the assistant...".to_string()
}

pub fn render_failure(message: &str) -> String {
    format!(":x: {message}")
}

pub fn render_trigger_ack(job: &BuildJob) -> String {
    let mut text = format!("Jenkins build triggered: *{}* ({})", job.alias, job.path);
    if let Some(queue_location) = job.queue_location.as_deref() {
        text.push_str(&format!("\nqueue: {queue_location}"));
    }
    text
}

fn format_duration_ms(duration_ms: u64) -> String {
    if duration_ms < 1_000 {
        return format!("{duration_ms}ms");
    }
    let seconds = duration_ms / 1_000;
    if seconds < 60 {
        return format!("{}.{}s", seconds, (duration_ms % 1_000) / 100);
    }
    format!("{}m{:02}s", seconds / 60, seconds % 60)
}

/// Summary line plus a fenced tail of the console output.
pub fn render_build_summary(
    alias: &str,
    result: &BuildResult,
    source: BuildSource,
    console_tail_chars: usize,
) -> String {
    let source_note = match source {
        BuildSource::Triggered => "",
        BuildSource::LastCompleted => " (last completed build)",
    };
    let mut text = format!(
        "*{alias}* {} #{}: *{}* in {}{source_note}",
        result.job_path,
        result.build_number,
        result.outcome.as_str(),
        format_duration_ms(result.duration_ms),
    );
    let console = result.console_output.trim_end();
    if console.is_empty() {
        text.push_str("\n_(no console output)_");
    } else {
        text.push_str(&format!(
            "\n```\n{}\n```",
            tail_chars(console, console_tail_chars)
        ));
    }
    text
}

/// Analysis prompt fed to the assistant for the build report.
pub fn render_build_report_prompt(
    alias: &str,
    result: &BuildResult,
    console_tail_chars: usize,
) -> String {
    format!(
        "You are a project data analysis assistant. Write a concise build report from the data below.\n\n\
         ## Build {alias} #{} ({}):\n\
         ```\n{}\n```\n\n\
         The report should cover:\n\
         1. A summary of the key metrics found in the output\n\
         2. Risks or problems worth attention, if any\n\
         3. Suggested actions for today\n\n\
         Keep it short and clear.",
        result.build_number,
        result.outcome.as_str(),
        tail_chars(&result.console_output, console_tail_chars),
    )
}
