//! Human readable formatter.
//!
//! Objects are printed sorted by key, each with a header and one line per
//! check. Descriptions are wrapped to the terminal width.

use super::HumanOptions;
use crate::analyzer::kubescore::scorecard::{ScoredCheck, ScoredObject, Scorecard};
use crate::analyzer::kubescore::types::Grade;
use colored::{Color, Colorize};

const INDENT: &str = "            ";
const MAX_HEADER_WIDTH: usize = 80;
const MIN_WRAP_WIDTH: usize = 40;

/// Format a scorecard for a terminal.
pub fn format(scorecard: &Scorecard, options: &HumanOptions) -> String {
    let mut output = String::new();
    for object in scorecard.sorted() {
        write_header(&mut output, object, options);
        for check in &object.checks {
            write_check(&mut output, check, options);
        }
    }
    output
}

fn paint(text: &str, color: Color, options: &HumanOptions) -> String {
    if options.color {
        text.color(color).to_string()
    } else {
        text.to_string()
    }
}

fn write_header(output: &mut String, object: &ScoredObject, options: &HumanOptions) {
    let mut header = format!("{} {}", object.type_meta, object.object_meta.name);
    if !object.object_meta.namespace.is_empty() {
        header.push_str(&format!(" in {}", object.object_meta.namespace));
    }

    let status = if object.has_errors() || object.any_below_or_equal(Grade::Critical) {
        "💥"
    } else if object.any_below_or_equal(Grade::Warning) {
        "🤔"
    } else {
        "✅"
    };

    let padding = options
        .term_width
        .min(MAX_HEADER_WIDTH)
        .saturating_sub(header.chars().count() + 2);
    output.push_str(&paint(&header, Color::Magenta, options));
    output.push_str(&" ".repeat(padding));
    output.push_str(status);
    output.push('\n');
}

fn write_check(output: &mut String, check: &ScoredCheck, options: &HumanOptions) {
    let name = &check.check.name;

    if let Some(message) = check.error() {
        output.push_str(&paint(&format!("    [ERROR] {}", name), Color::Red, options));
        output.push('\n');
        write_wrapped(output, message, options);
        return;
    }

    let Some(score) = check.score() else {
        return;
    };

    if score.skipped && options.verbosity < 2 {
        return;
    }

    let color = if score.skipped || score.grade >= Grade::AllOk {
        if options.verbosity == 0 {
            return;
        }
        Color::Green
    } else if score.grade >= Grade::Warning {
        Color::Yellow
    } else {
        Color::Red
    };

    let line = if score.skipped {
        format!("    [SKIPPED] {}", name)
    } else {
        format!("    [{}] {}", score.grade, name)
    };
    output.push_str(&paint(&line, color, options));
    output.push('\n');

    for comment in &score.comments {
        output.push_str("        · ");
        if !comment.path.is_empty() {
            output.push_str(&comment.path);
            output.push_str(" -> ");
        }
        output.push_str(&comment.summary);
        output.push('\n');
        if !comment.description.is_empty() {
            write_wrapped(output, &comment.description, options);
        }
        if !comment.documentation_url.is_empty() {
            output.push_str(&format!("{}More information: {}\n", INDENT, comment.documentation_url));
        }
    }
}

fn write_wrapped(output: &mut String, text: &str, options: &HumanOptions) {
    let width = options.term_width.saturating_sub(INDENT.len()).max(MIN_WRAP_WIDTH);
    for line in textwrap::wrap(text, width) {
        output.push_str(INDENT);
        output.push_str(&line);
        output.push('\n');
    }
}
