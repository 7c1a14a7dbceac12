//! Inspect report types and terminal formatting.

use std::fmt;

use serde::Serialize;

/// The result of inspecting a dataset.
#[derive(Clone, Debug, Serialize)]
pub struct InspectReport {
    pub summary: SummarySection,
    /// Item shape of each selected view, in canonical order.
    pub views: Vec<ViewEntry>,
    pub classes: Vec<ClassCount>,
    pub metadata: MetadataSection,
    #[serde(skip)]
    pub(crate) bar_width: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct SummarySection {
    pub name: String,
    pub dtype: String,
    pub num_data: usize,
    /// `(frames, height, width)` of a packet.
    pub packet_shape: [usize; 3],
    /// `(height, width)` of an elementary cell.
    pub ec_shape: [usize; 2],
    pub num_ec: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct ViewEntry {
    pub view: String,
    pub item_shape: Vec<usize>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClassCount {
    pub class: String,
    pub count: usize,
}

/// How many items carry each metadata field.
#[derive(Clone, Debug, Serialize)]
pub struct MetadataSection {
    pub fields: Vec<FieldFill>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FieldFill {
    pub field: String,
    pub present: usize,
}

const INNER_WIDTH: usize = 59;

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "╭─────────────────────────────────────────────────────────────╮")?;
        writeln!(f, "│              Shower Dataset Inspection Report               │")?;
        writeln!(f, "╰─────────────────────────────────────────────────────────────╯")?;
        writeln!(f)?;

        self.fmt_summary(f)?;
        writeln!(f)?;
        self.fmt_classes(f)?;
        writeln!(f)?;
        self.fmt_metadata(f)?;

        Ok(())
    }
}

impl InspectReport {
    fn fmt_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;

        open_box(f, "Summary")?;
        row(f, format!("  Name:          {}", s.name))?;
        row(f, format!("  Items:         {:>8}", format_number(s.num_data)))?;
        row(f, format!("  Dtype:         {:>8}", s.dtype))?;
        row(
            f,
            format!(
                "  Packet:        {} x {} x {} (frames x height x width)",
                s.packet_shape[0], s.packet_shape[1], s.packet_shape[2]
            ),
        )?;
        row(
            f,
            format!(
                "  EC:            {} x {} ({} cell(s))",
                s.ec_shape[0], s.ec_shape[1], s.num_ec
            ),
        )?;
        row(f, String::new())?;
        row(f, "  Views:".to_string())?;
        for entry in &self.views {
            row(f, format!("    {:<6} item shape {:?}", entry.view, entry.item_shape))?;
        }
        close_box(f)
    }

    fn fmt_classes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        open_box(f, "Classes")?;

        let total: usize = self.classes.iter().map(|c| c.count).sum();
        if total == 0 {
            row(f, "  No items.".to_string())?;
        } else {
            let max_count = self.classes.iter().map(|c| c.count).max().unwrap_or(1);
            for class in &self.classes {
                row(
                    f,
                    format!(
                        "  {:<8} {:>9} {:>7}  {}",
                        class.class,
                        format_number(class.count),
                        fmt_percent(class.count, total),
                        render_bar(class.count, max_count, self.bar_width)
                    ),
                )?;
            }
        }
        close_box(f)
    }

    fn fmt_metadata(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        open_box(f, "Metadata")?;

        if self.metadata.fields.is_empty() {
            row(f, "  No metadata fields.".to_string())?;
        } else {
            let total = self.summary.num_data;
            for fill in &self.metadata.fields {
                row(
                    f,
                    format!(
                        "  {:<20} {:>9} / {:<9} ({})",
                        truncate_label(&fill.field, 20),
                        format_number(fill.present),
                        format_number(total),
                        fmt_percent(fill.present, total)
                    ),
                )?;
            }
        }
        close_box(f)
    }
}

fn open_box(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    let used = title.chars().count() + 3;
    writeln!(f, "┌─ {} {}┐", title, "─".repeat(INNER_WIDTH.saturating_sub(used)))?;
    row(f, String::new())
}

fn close_box(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    row(f, String::new())?;
    writeln!(f, "└{}┘", "─".repeat(INNER_WIDTH))
}

fn row(f: &mut fmt::Formatter<'_>, content: String) -> fmt::Result {
    writeln!(f, "│ {:<width$}│", content, width = INNER_WIDTH - 1)
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

fn fmt_percent(numerator: usize, denominator: usize) -> String {
    if denominator == 0 {
        "n/a".to_string()
    } else {
        format!("{:.1}%", (numerator as f64 / denominator as f64) * 100.0)
    }
}

fn render_bar(count: usize, max_count: usize, width: usize) -> String {
    if max_count == 0 || width == 0 {
        return String::new();
    }
    let filled = ((count * width) / max_count).min(width);
    "█".repeat(filled) + &"░".repeat(width - filled)
}

fn truncate_label(label: &str, max_len: usize) -> String {
    if label.chars().count() <= max_len {
        label.to_string()
    } else {
        let kept: String = label.chars().take(max_len - 1).collect();
        format!("{}…", kept)
    }
}
