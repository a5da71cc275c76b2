//! Notice counts per campus and topic, read from the analysis table.

use crate::classify::config::UNMAPPED_LOCATION;
use crate::models::AnalyzedRecord;
use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;
use std::cmp::Reverse;
use std::fmt::Write;

const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeCount {
    pub campus: String,
    pub topic: String,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeSummary {
    /// Rows considered after filtering.
    pub records: usize,
    pub notices: usize,
    /// Notices dropped by the unmapped filter.
    pub notices_excluded: usize,
    /// Sorted by total descending, then campus, then topic.
    pub counts: Vec<NoticeCount>,
    /// Earliest and latest parseable publish dates among the notices.
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

/// Group notices by (campus, topic). With `exclude_unmapped`, rows whose
/// campus is the unmapped sentinel are dropped first.
pub fn summarize(records: &[AnalyzedRecord], exclude_unmapped: bool) -> NoticeSummary {
    let (kept, dropped): (Vec<&AnalyzedRecord>, Vec<&AnalyzedRecord>) = records
        .iter()
        .partition(|r| !(exclude_unmapped && r.campus == UNMAPPED_LOCATION));
    let notices: Vec<&AnalyzedRecord> = kept.iter().copied().filter(|r| r.is_notice).collect();

    let counts = notices
        .iter()
        .counts_by(|r| (r.campus.as_str(), r.topic.as_str()))
        .into_iter()
        .map(|((campus, topic), total)| NoticeCount {
            campus: campus.to_string(),
            topic: topic.to_string(),
            total,
        })
        .sorted_by(|a, b| {
            (Reverse(a.total), &a.campus, &a.topic).cmp(&(Reverse(b.total), &b.campus, &b.topic))
        })
        .collect();

    let dates = notices
        .iter()
        .filter_map(|r| NaiveDate::parse_from_str(&r.publish_date, DATE_FORMAT).ok());
    let (earliest, latest) = match dates.minmax() {
        itertools::MinMaxResult::NoElements => (None, None),
        itertools::MinMaxResult::OneElement(d) => (Some(d), Some(d)),
        itertools::MinMaxResult::MinMax(lo, hi) => (Some(lo), Some(hi)),
    };

    NoticeSummary {
        records: kept.len(),
        notices: notices.len(),
        notices_excluded: dropped.iter().filter(|r| r.is_notice).count(),
        counts,
        earliest: earliest.map(|d| d.format(DATE_FORMAT).to_string()),
        latest: latest.map(|d| d.format(DATE_FORMAT).to_string()),
    }
}

/// Why the summary has nothing to show, or `None` when it has notices.
pub fn empty_reason(summary: &NoticeSummary) -> Option<String> {
    if summary.notices > 0 {
        return None;
    }
    Some(if summary.notices_excluded > 0 {
        format!(
            "No notices matched the filter ({} notices without a mapped campus were excluded).",
            summary.notices_excluded
        )
    } else {
        format!(
            "No notices matched the notice keywords ({} records checked).",
            summary.records
        )
    })
}

/// Plain-text table of the counts, columns padded to their widest cell.
pub fn render(summary: &NoticeSummary) -> String {
    let headers = ("Campus_Citado", "Topico_Classificado", "Total");
    let campus_w = summary
        .counts
        .iter()
        .map(|c| c.campus.chars().count())
        .chain([headers.0.len()])
        .max()
        .unwrap_or_default();
    let topic_w = summary
        .counts
        .iter()
        .map(|c| c.topic.chars().count())
        .chain([headers.1.len()])
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "{:<campus_w$}  {:<topic_w$}  {}", headers.0, headers.1, headers.2);
    for c in &summary.counts {
        let _ = writeln!(out, "{:<campus_w$}  {:<topic_w$}  {:>5}", c.campus, c.topic, c.total);
    }
    if let (Some(first), Some(last)) = (&summary.earliest, &summary.latest) {
        let _ = writeln!(out, "\nNotices published between {first} and {last}.");
    }
    out
}
