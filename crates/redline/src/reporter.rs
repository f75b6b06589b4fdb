//! Report rendering.
//!
//! Three file formats: Playwright-shaped JSON (what the triage tooling
//! consumes), JUnit XML for CI and a standalone HTML page.

use crate::harness::{RunResults, TestResult, TestStatus};
use crate::result::RedlineResult;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Report file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Playwright JSON reporter shape
    Json,
    /// JUnit XML
    Junit,
    /// Standalone HTML
    Html,
}

impl ReportFormat {
    /// File name inside the output directory
    #[must_use]
    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::Json => "results.json",
            Self::Junit => "junit.xml",
            Self::Html => "index.html",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Junit => "junit",
            Self::Html => "html",
        };
        f.write_str(name)
    }
}

/// Renders a finished run
#[derive(Debug)]
pub struct Reporter<'a> {
    run: &'a RunResults,
    title: String,
}

impl<'a> Reporter<'a> {
    /// Create a reporter over a run
    #[must_use]
    pub fn new(run: &'a RunResults) -> Self {
        Self {
            run,
            title: "Redline Report".to_string(),
        }
    }

    /// Set the report title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        let verdict = if self.run.as_designed() {
            "as designed"
        } else {
            "NOT as designed"
        };
        format!(
            "{} failed, {} passed, {} skipped of {} ({verdict})",
            self.run.failed_count(),
            self.run.passed_count(),
            self.run.skipped_count(),
            self.run.total(),
        )
    }

    /// Results grouped by fixture file, then suite, in run order
    fn grouped(&self) -> Vec<(&'a str, Vec<(&'a str, Vec<&'a TestResult>)>)> {
        let run: &'a RunResults = self.run;
        let mut files: Vec<(&str, Vec<(&str, Vec<&TestResult>)>)> = Vec::new();
        for result in &run.results {
            let file_pos = match files.iter().position(|(f, _)| *f == result.file) {
                Some(pos) => pos,
                None => {
                    files.push((result.file.as_str(), Vec::new()));
                    files.len() - 1
                }
            };
            let suites = &mut files[file_pos].1;
            match suites.iter_mut().find(|(s, _)| *s == result.suite) {
                Some((_, results)) => results.push(result),
                None => suites.push((result.suite.as_str(), vec![result])),
            }
        }
        files
    }

    /// Playwright JSON reporter document
    #[must_use]
    pub fn render_json(&self) -> Value {
        let run = self.run;
        let expected_status = if run.expect_pass { "passed" } else { "failed" };

        let suites: Vec<Value> = self
            .grouped()
            .into_iter()
            .map(|(file, suites)| {
                let nested: Vec<Value> = suites
                    .into_iter()
                    .map(|(suite, results)| {
                        let specs: Vec<Value> = results
                            .into_iter()
                            .map(|r| spec_json(r, file, expected_status, &run.driver))
                            .collect();
                        json!({
                            "title": suite,
                            "file": file,
                            "line": 0,
                            "column": 0,
                            "specs": specs,
                        })
                    })
                    .collect();
                json!({
                    "title": file,
                    "file": file,
                    "line": 0,
                    "column": 0,
                    "specs": [],
                    "suites": nested,
                })
            })
            .collect();

        let unexpected = run.unexpected().len();
        let skipped = run.skipped_count();
        json!({
            "config": {
                "version": env!("CARGO_PKG_VERSION"),
                "projects": [{ "id": run.driver, "name": run.driver }],
            },
            "suites": suites,
            "errors": [],
            "stats": {
                "startTime": run.started_at.to_rfc3339(),
                "duration": millis(run.duration),
                "expected": run.total() - unexpected - skipped,
                "skipped": skipped,
                "unexpected": unexpected,
                "flaky": 0,
            },
        })
    }

    /// Render HTML report content
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut html = String::new();

        html.push_str(&format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }}
        .summary {{ background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }}
        .test {{ padding: 10px; margin: 5px 0; border-radius: 4px; }}
        .test.pass {{ background: #e8f5e9; border-left: 4px solid #4caf50; }}
        .test.fail {{ background: #ffebee; border-left: 4px solid #f44336; }}
        .test.skip {{ background: #fff3e0; border-left: 4px solid #ff9800; }}
        .error {{ color: #d32f2f; font-family: monospace; white-space: pre-wrap; }}
    </style>
</head>
<body>
"#,
            escape_xml(&self.title)
        ));

        html.push_str(&format!(
            r#"<div class="summary">
    <h1>{}</h1>
    <h2>{}</h2>
    <p>Driver: {} | Started: {} | Duration: {:.2}s</p>
</div>
"#,
            escape_xml(&self.title),
            escape_xml(&self.summary()),
            escape_xml(&self.run.driver),
            self.run.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.run.duration.as_secs_f64()
        ));

        for (_, suites) in self.grouped() {
            for (suite, results) in suites {
                html.push_str(&format!("<h2>{}</h2>\n", escape_xml(suite)));
                for result in results {
                    let class = match result.status {
                        TestStatus::Passed => "pass",
                        TestStatus::Failed | TestStatus::TimedOut => "fail",
                        TestStatus::Skipped => "skip",
                    };
                    html.push_str(&format!(
                        r#"<div class="test {}">
    <strong>{}</strong> - {} ({:.2}ms)
"#,
                        class,
                        escape_xml(&result.name),
                        result.status,
                        result.duration.as_secs_f64() * 1000.0
                    ));
                    if let Some(message) = result.failure_message() {
                        html.push_str(&format!(
                            "    <div class=\"error\">{}</div>\n",
                            escape_xml(message)
                        ));
                    }
                    html.push_str("</div>\n");
                }
            }
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Render JUnit XML content
    #[must_use]
    pub fn render_junit(&self) -> String {
        let run = self.run;
        let mut xml = String::new();

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<testsuites name="{}" tests="{}" failures="{}" skipped="{}" time="{:.3}">"#,
            escape_xml(&self.title),
            run.total(),
            run.failed_count(),
            run.skipped_count(),
            run.duration.as_secs_f64()
        ));
        xml.push('\n');

        for (suite, results) in self.grouped().into_iter().flat_map(|(_, suites)| suites) {
            let failures = results.iter().filter(|r| r.status.is_failure()).count();
            let time: f64 = results.iter().map(|r| r.duration.as_secs_f64()).sum();
            xml.push_str(&format!(
                r#"  <testsuite name="{}" tests="{}" failures="{}" time="{:.3}">"#,
                escape_xml(suite),
                results.len(),
                failures,
                time
            ));
            xml.push('\n');

            for result in results {
                xml.push_str(&format!(
                    r#"    <testcase name="{}" classname="{}" time="{:.3}">"#,
                    escape_xml(&result.name),
                    escape_xml(&result.file),
                    result.duration.as_secs_f64()
                ));
                xml.push('\n');

                if result.status == TestStatus::Skipped {
                    xml.push_str("      <skipped/>\n");
                } else if let Some(message) = result.failure_message() {
                    let headline = message.lines().next().unwrap_or_default();
                    xml.push_str(&format!(
                        r#"      <failure message="{}" type="{}">{}</failure>"#,
                        escape_xml(headline),
                        result.status,
                        escape_xml(message)
                    ));
                    xml.push('\n');
                }

                xml.push_str("    </testcase>\n");
            }
            xml.push_str("  </testsuite>\n");
        }

        xml.push_str("</testsuites>\n");
        xml
    }

    /// Write one report into `dir`, returning its path
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be written
    pub fn write(&self, format: ReportFormat, dir: &Path) -> RedlineResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format.file_name());
        let content = match format {
            ReportFormat::Json => serde_json::to_string_pretty(&self.render_json())?,
            ReportFormat::Junit => self.render_junit(),
            ReportFormat::Html => self.render_html(),
        };
        std::fs::write(&path, content)?;
        tracing::debug!(path = %path.display(), %format, "report written");
        Ok(path)
    }

    /// Write failure screenshots into `dir/screenshots`
    ///
    /// # Errors
    ///
    /// Returns error if a file cannot be written
    pub fn write_screenshots(&self, dir: &Path) -> RedlineResult<Vec<PathBuf>> {
        let shots = dir.join("screenshots");
        let mut written = Vec::new();
        for result in &self.run.results {
            if let Some(png) = &result.screenshot {
                std::fs::create_dir_all(&shots)?;
                let path = shots.join(format!("{}.png", slug(&result.title())));
                std::fs::write(&path, png)?;
                written.push(path);
            }
        }
        Ok(written)
    }
}

fn spec_json(result: &TestResult, file: &str, expected_status: &str, driver: &str) -> Value {
    let mut run = json!({
        "workerIndex": 0,
        "status": result.status.as_str(),
        "duration": millis(result.duration),
        "errors": [],
        "stdout": result.log.iter().map(|line| json!({ "text": line })).collect::<Vec<_>>(),
        "stderr": [],
        "retry": 0,
        "attachments": [],
    });
    if let Some(message) = result.failure_message() {
        run["error"] = json!({
            "message": message,
            "stack": stack_trace(message, file),
        });
        run["errors"] = json!([{ "message": message }]);
    }

    let status = if result.status == TestStatus::Skipped {
        "skipped"
    } else if result.status.as_str() == expected_status
        || (expected_status == "failed" && result.status.is_failure())
    {
        "expected"
    } else {
        "unexpected"
    };

    json!({
        "title": result.name,
        "ok": status != "unexpected",
        "tags": [],
        "id": slug(&result.title()),
        "file": file,
        "line": 0,
        "column": 0,
        "tests": [{
            "timeout": 0,
            "annotations": [],
            "expectedStatus": expected_status,
            "projectId": driver,
            "projectName": driver,
            "results": [run],
            "status": status,
        }],
    })
}

/// Stack trace in the shape Playwright prints for an expect failure
#[must_use]
pub fn stack_trace(message: &str, file: &str) -> String {
    let headline = message.lines().next().unwrap_or_default();
    format!("Error: {headline}\n    at {file}")
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
