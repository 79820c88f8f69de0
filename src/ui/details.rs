//! Side panel: the selected referral's details above the summary stats.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::core::{
    format::{format_earnings, format_joined, format_rate},
    stats::SummaryStats,
    tree::TreeNode,
};

use super::theme::Theme;

pub struct DetailsPanel<'a> {
    /// Selected node and its level.
    selected: Option<(&'a TreeNode, usize)>,
    stats: Option<&'a SummaryStats>,
    block: Option<Block<'a>>,
}

impl<'a> DetailsPanel<'a> {
    pub fn new(selected: Option<(&'a TreeNode, usize)>, stats: Option<&'a SummaryStats>) -> Self {
        Self {
            selected,
            stats,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        match self.selected {
            Some((node, level)) => {
                lines.push(Line::from(vec![
                    Span::styled(format!("[{}] ", node.initials()), Theme::muted_style()),
                    Span::styled(node.name.clone(), Theme::name_style()),
                ]));
                if !node.email.is_empty() {
                    lines.push(Line::styled(node.email.clone(), Theme::muted_style()));
                }
                lines.push(Line::default());
                lines.push(field("Level", level.to_string()));
                lines.push(Line::from(vec![
                    Span::styled(format!("{:<12}", "Status"), Theme::muted_style()),
                    if node.is_active {
                        Span::styled("active", Theme::active_style())
                    } else {
                        Span::styled("inactive", Theme::inactive_style())
                    },
                ]));
                lines.push(Line::from(vec![
                    Span::styled(format!("{:<12}", "Earnings"), Theme::muted_style()),
                    Span::styled(format_earnings(node.earnings), Theme::earnings_style()),
                ]));
                lines.push(field("Joined", format_joined(node.joined_at.as_ref())));
                lines.push(field("Referrals", node.children.len().to_string()));
                lines.push(field("Clicks", node.clicks.map_or_else(|| "-".into(), |c| c.to_string())));
                lines.push(field("Conversion", format_rate(node.conversion_rate)));
            }
            None => lines.push(Line::styled("Click a node to see details", Theme::placeholder_style())),
        }

        lines.push(Line::default());
        lines.push(Line::styled("Summary", Theme::title_style()));
        match self.stats {
            Some(stats) => {
                lines.push(field(
                    "Referrals",
                    format!("{} ({} active)", stats.total_referrals, stats.active_referrals),
                ));
                lines.push(Line::from(vec![
                    Span::styled(format!("{:<12}", "Earnings"), Theme::muted_style()),
                    Span::styled(format_earnings(stats.total_earnings), Theme::earnings_style()),
                ]));
                lines.push(field("Depth", stats.deepest_level.to_string()));
                lines.push(field("Per level", format!("{:.1}", stats.average_per_level)));
                if let Some(top) = &stats.top_referrer {
                    lines.push(field("Top", top.name().to_string()));
                }
            }
            None => lines.push(Line::styled("-", Theme::muted_style())),
        }
        lines
    }
}

fn field<'a>(label: &str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{label:<12}"), Theme::muted_style()),
        Span::raw(value),
    ])
}

impl Widget for DetailsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.lines();
        let mut paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        if let Some(block) = self.block {
            paragraph = paragraph.block(block);
        }
        paragraph.render(area, buf);
    }
}
