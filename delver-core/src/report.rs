// Report generation from a finished crawl

use crate::filter::{extract_url_path, host_of};
use crate::graph::PageMap;
use crate::model::CrawlMode;
use crate::stats::CrawlStatistics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEAVY_RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_url: Option<String>,
    pub content_length: usize,
    pub links_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub session_id: String,
    pub mode: CrawlMode,
    pub seed_urls: Vec<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub termination: String,
    pub statistics: CrawlStatistics,
    pub pages: Vec<PageSummary>,
}

impl ReportData {
    /// Assemble report data; pages are ordered by depth, then URL
    pub fn new(
        mode: CrawlMode,
        seed_urls: Vec<String>,
        started_at: DateTime<Utc>,
        termination: impl Into<String>,
        statistics: CrawlStatistics,
        pages: &PageMap,
    ) -> Self {
        let mut summaries: Vec<PageSummary> = pages
            .values()
            .map(|page| PageSummary {
                url: page.url.clone(),
                title: page.title.clone(),
                depth: page.depth,
                parent_url: page.parent_url.clone(),
                content_length: page.content.chars().count(),
                links_count: page.links.len(),
            })
            .collect();
        summaries.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.url.cmp(&b.url)));

        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            mode,
            seed_urls,
            started_at,
            finished_at: None,
            termination: termination.into(),
            statistics,
            pages: summaries,
        }
    }

    pub fn with_finished_at(mut self, finished_at: DateTime<Utc>) -> Self {
        self.finished_at = Some(finished_at);
        self
    }

    fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    fn format_targets(&self) -> String {
        match self.seed_urls.len() {
            0 => "None".to_string(),
            1 => self.seed_urls[0].clone(),
            n => format!("{} URLs", n),
        }
    }

    fn pages_by_host(&self) -> BTreeMap<String, Vec<&PageSummary>> {
        let mut by_host: BTreeMap<String, Vec<&PageSummary>> = BTreeMap::new();
        for page in &self.pages {
            let host = host_of(&page.url).unwrap_or_else(|| "unknown".to_string());
            by_host.entry(host).or_default().push(page);
        }
        by_host
    }
}

pub fn generate_report(
    data: &ReportData,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => generate_json_report(data),
        ReportFormat::Markdown => Ok(generate_markdown_report(data)),
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let stats = &data.statistics;
    let mut report = String::new();

    // Header
    report.push_str(HEAVY_RULE);
    report.push('\n');
    report.push_str("                           DELVER CRAWL REPORT\n");
    report.push_str(HEAVY_RULE);
    report.push_str("\n\n");

    report.push_str(&format!("Session ID:   {}\n", data.session_id));
    report.push_str(&format!("Method:       {}\n", data.mode.label()));
    report.push_str(&format!("Started:      {}\n", format_timestamp(&data.started_at)));
    if let Some(duration) = data.duration_seconds() {
        report.push_str(&format!("Duration:     {:.1} seconds\n", duration));
    }
    report.push_str(&format!("Targets:      {}\n", data.format_targets()));
    report.push_str(&format!("Stopped:      {}\n", data.termination));
    report.push('\n');

    section(&mut report, "SUMMARY");
    report.push_str(&format!("  Pages crawled:   {}\n", stats.crawled_nodes));
    report.push_str(&format!("  Failed:          {}\n", stats.failed_nodes));
    report.push_str(&format!("  Pending:         {}\n", stats.pending_nodes));
    report.push_str(&format!("  Total nodes:     {}\n", stats.total_nodes));
    report.push_str(&format!("  Success rate:    {:.1}%\n", stats.success_rate));
    report.push_str(&format!(
        "  Depth:           {}..{} (avg {:.2})\n",
        stats.min_depth, stats.max_depth, stats.avg_depth
    ));
    report.push_str(&format!("  Unique domains:  {}\n", stats.unique_domains));
    report.push('\n');

    if !stats.pages_by_depth.is_empty() {
        report.push_str("  Pages by depth:\n");
        for (depth, count) in &stats.pages_by_depth {
            report.push_str(&format!("    depth {:<3} {}\n", depth, count));
        }
        report.push('\n');
    }

    let conn = &stats.connectivity;
    section(&mut report, "GRAPH");
    report.push_str(&format!("  Roots:               {}\n", conn.root_nodes));
    report.push_str(&format!("  Leaves:              {}\n", conn.leaf_nodes));
    report.push_str(&format!(
        "  With children:       {} ({:.0}%)\n",
        conn.nodes_with_children,
        conn.children_ratio * 100.0
    ));
    report.push_str(&format!(
        "  With parents:        {} ({:.0}%)\n",
        conn.nodes_with_parents,
        conn.parent_ratio * 100.0
    ));
    report.push_str(&format!("  Branching factor:    {:.2}\n", conn.avg_branching_factor));
    report.push_str(&format!("  Links per page:      {:.2}\n", conn.avg_links_per_page));
    report.push('\n');

    if !data.pages.is_empty() {
        section(&mut report, "PAGES");
        for (host, pages) in data.pages_by_host() {
            report.push_str(&format!("## {}\n", host));
            report.push_str(&format!("  {} pages found\n\n", pages.len()));
            for page in pages {
                report.push_str(&format!(
                    "  [d{}] {}  {}\n",
                    page.depth,
                    extract_url_path(&page.url),
                    truncate(&page.title, 60)
                ));
            }
            report.push('\n');
        }
    }

    report.push_str(HEAVY_RULE);
    report.push('\n');
    report.push_str("                              End of Report\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');

    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Delver",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": Utc::now().to_rfc3339(),
                "format": "json"
            },
            "session": {
                "id": data.session_id,
                "mode": data.mode,
                "method": data.mode.label(),
                "started_at": data.started_at.to_rfc3339(),
                "finished_at": data.finished_at.map(|t| t.to_rfc3339()),
                "duration_seconds": data.duration_seconds(),
                "termination": data.termination,
                "targets": data.seed_urls
            },
            "statistics": data.statistics,
            "pages": data.pages
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let stats = &data.statistics;
    let mut report = String::new();

    report.push_str("# Delver Crawl Report\n\n");
    report.push_str(&format!("- **Session:** `{}`\n", data.session_id));
    report.push_str(&format!("- **Method:** {}\n", data.mode.label()));
    report.push_str(&format!("- **Started:** {}\n", format_timestamp(&data.started_at)));
    if let Some(duration) = data.duration_seconds() {
        report.push_str(&format!("- **Duration:** {:.1} s\n", duration));
    }
    report.push_str(&format!("- **Targets:** {}\n", data.format_targets()));
    report.push_str(&format!("- **Stopped:** {}\n\n", data.termination));

    report.push_str("## Summary\n\n");
    report.push_str("| Metric | Value |\n|---|---|\n");
    report.push_str(&format!("| Pages crawled | {} |\n", stats.crawled_nodes));
    report.push_str(&format!("| Failed | {} |\n", stats.failed_nodes));
    report.push_str(&format!("| Pending | {} |\n", stats.pending_nodes));
    report.push_str(&format!("| Success rate | {:.1}% |\n", stats.success_rate));
    report.push_str(&format!("| Average depth | {:.2} |\n", stats.avg_depth));
    report.push_str(&format!("| Unique domains | {} |\n\n", stats.unique_domains));

    if !stats.pages_by_depth.is_empty() {
        report.push_str("## Pages by depth\n\n| Depth | Pages |\n|---|---|\n");
        for (depth, count) in &stats.pages_by_depth {
            report.push_str(&format!("| {} | {} |\n", depth, count));
        }
        report.push('\n');
    }

    if !data.pages.is_empty() {
        report.push_str("## Pages\n\n| Depth | Title | URL |\n|---|---|---|\n");
        for page in &data.pages {
            report.push_str(&format!(
                "| {} | {} | <{}> |\n",
                page.depth,
                truncate(&page.title, 60).replace('|', "\\|"),
                page.url
            ));
        }
        report.push('\n');
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn section(report: &mut String, title: &str) {
    report.push_str(HEAVY_RULE);
    report.push('\n');
    report.push_str(title);
    report.push('\n');
    report.push_str(HEAVY_RULE);
    report.push_str("\n\n");
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}…", head)
    } else {
        text.to_string()
    }
}
