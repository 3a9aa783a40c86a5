//! Mockwire Configuration Linter CLI
//!
//! Validates exported rule sets before they are imported into an engine.
//!
//! Usage:
//!   mockwire-lint <file_or_directory> [OPTIONS]

use clap::{Parser, ValueEnum};
use mockwire_lint::{fix_config, lint_file, LintIssue, LintOptions, LintResult, Severity};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Mockwire Configuration Linter
#[derive(Parser, Debug)]
#[command(name = "mockwire-lint")]
#[command(author, version, about = "Validate Mockwire configuration files")]
struct Args {
    /// Configuration file, or a directory of them
    #[arg(required = true)]
    path: PathBuf,

    /// Rewrite files with mechanical fixes applied
    #[arg(short, long)]
    fix: bool,

    #[arg(short, long, value_enum, default_value_t = Output::Text)]
    output: Output,

    /// Only show errors
    #[arg(short = 'e', long)]
    errors_only: bool,

    /// Also report disabled rules
    #[arg(short, long)]
    verbose: bool,

    /// Treat warnings as errors
    #[arg(short, long)]
    strict: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Output {
    Text,
    Json,
}

fn main() {
    let args = Args::parse();
    let options = LintOptions {
        verbose: args.verbose,
    };

    let files = collect_config_files(&args.path);
    if files.is_empty() {
        eprintln!(
            "{YELLOW}Warning:{RESET} No JSON files found at {}",
            args.path.display()
        );
        std::process::exit(0);
    }

    if args.fix {
        for file in &files {
            fix_file(file);
        }
    }

    let mut result = LintResult::new();
    for file in &files {
        result.merge(lint_file(file, &options));
    }

    match args.output {
        Output::Json => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize results: {e}");
                std::process::exit(2);
            }
        },
        Output::Text => print_results(&result, &args),
    }

    std::process::exit(if result.fails(args.strict) { 1 } else { 0 });
}

fn collect_config_files(path: &Path) -> Vec<PathBuf> {
    let is_json = |p: &Path| p.extension().is_some_and(|ext| ext == "json");

    if path.is_file() {
        return if is_json(path) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_file() && is_json(p))
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

fn fix_file(file: &Path) {
    let Ok(content) = std::fs::read_to_string(file) else {
        return;
    };
    let Ok(mut config) = serde_json::from_str::<Value>(&content) else {
        return;
    };

    let fixes = fix_config(&mut config);
    if fixes.is_empty() {
        return;
    }

    println!("{BOLD}Fixing {}{RESET}", file.display());
    for fix in &fixes {
        println!("  {GREEN}->{RESET} {fix}");
    }

    let written = serde_json::to_string_pretty(&config)
        .map_err(|e| e.to_string())
        .and_then(|json| std::fs::write(file, json).map_err(|e| e.to_string()));
    if let Err(e) = written {
        eprintln!("{RED}Error writing {}: {e}{RESET}", file.display());
    }
}

fn print_results(result: &LintResult, args: &Args) {
    println!("{BOLD}{CYAN}Mockwire Config Linter{RESET}");
    println!("{DIM}{RULE}{RESET}");

    let mut by_file: BTreeMap<&Path, Vec<&LintIssue>> = BTreeMap::new();
    for issue in &result.issues {
        if args.errors_only && issue.severity != Severity::Error {
            continue;
        }
        by_file.entry(issue.file.as_path()).or_default().push(issue);
    }

    if by_file.is_empty() {
        println!("{GREEN}{BOLD}No issues found!{RESET}");
    }

    for (file, issues) in &by_file {
        let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
        let status = if errors > 0 {
            format!("{RED}FAIL{RESET}")
        } else {
            format!("{YELLOW}WARN{RESET}")
        };
        println!("{status} {BOLD}{CYAN}{}{RESET}", file.display());

        for issue in issues {
            let color = severity_color(issue.severity);
            let location = issue
                .location
                .as_ref()
                .map(|l| format!("{DIM}[{RESET}{CYAN}{l}{RESET}{DIM}]{RESET} "))
                .unwrap_or_default();
            println!(
                "  {color}|{RESET} {location}{BOLD}{color}{}{RESET}: {} {DIM}({}){RESET}",
                issue.severity, issue.message, issue.code
            );
            if let Some(suggestion) = &issue.suggestion {
                println!("  {color}|{RESET}   {GREEN}-> {suggestion}{RESET}");
            }
        }
        println!();
    }

    println!("{DIM}{RULE}{RESET}");
    println!("  {DIM}Files checked:{RESET} {BOLD}{}{RESET}", result.files_checked);
    println!(
        "  {}Errors:{RESET}    {BOLD}{}{RESET}",
        count_color(result.errors, RED),
        result.errors
    );
    println!(
        "  {}Warnings:{RESET}  {BOLD}{}{RESET}",
        count_color(result.warnings, YELLOW),
        result.warnings
    );
    println!();

    if result.fails(args.strict) {
        println!("{RED}{BOLD}Linting failed{RESET}");
    } else if result.has_warnings() {
        println!("{YELLOW}{BOLD}Passed with warnings{RESET}");
    } else {
        println!("{GREEN}{BOLD}All checks passed!{RESET}");
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => RED,
        Severity::Warning => YELLOW,
        Severity::Info => CYAN,
    }
}

fn count_color(count: usize, color: &'static str) -> &'static str {
    if count > 0 {
        color
    } else {
        GREEN
    }
}
