//! Timeline layout: connector styling and text rendering for narrative rows.

use std::collections::HashMap;

use chrono_tz::Tz;

use super::classifier::NarrativeRow;
use super::users::UserDisplay;
use crate::util::timezone::format_timestamp;

/// What the audit log panel should show right now.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimelineState {
    /// No fetch has resolved yet, or there is no request to show.
    #[default]
    Loading,
    Ready(Vec<NarrativeRow>),
}

impl TimelineState {
    pub fn rows(&self) -> Option<&[NarrativeRow]> {
        match self {
            TimelineState::Loading => None,
            TimelineState::Ready(rows) => Some(rows),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, TimelineState::Loading)
    }
}

/// A row positioned within the visible timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineSlot<'a> {
    pub row: &'a NarrativeRow,
    /// Line joining this row to the one above.
    pub incoming: bool,
    /// Line joining this row to the one below.
    pub outgoing: bool,
}

/// Attach connector flags to rows, keeping their order.
///
/// Connectors follow visible position: the first row never has an incoming
/// line and the last never has an outgoing one, regardless of which source
/// events were dropped during classification.
pub fn layout(rows: &[NarrativeRow]) -> Vec<TimelineSlot<'_>> {
    let last = rows.len().saturating_sub(1);
    rows.iter()
        .enumerate()
        .map(|(position, row)| TimelineSlot {
            row,
            incoming: position > 0,
            outgoing: position < last,
        })
        .collect()
}

/// Render the timeline as plain text for terminal output.
pub fn render_text(
    state: &TimelineState,
    users: &HashMap<String, UserDisplay>,
    tz: Tz,
) -> String {
    let Some(rows) = state.rows() else {
        return "Audit Log\n  loading…\n".to_string();
    };

    let mut out = String::from("Audit Log\n");
    if rows.is_empty() {
        return out;
    }

    for slot in layout(rows) {
        let glyph = match (slot.incoming, slot.outgoing) {
            (false, false) => '•',
            (false, true) => '╷',
            (true, true) => '│',
            (true, false) => '╵',
        };
        let continuation = if slot.outgoing { '│' } else { ' ' };

        let headline = slot.row.narrative.headline(tz);
        let display = headline
            .actor
            .as_deref()
            .and_then(|id| users.get(id))
            .map(UserDisplay::as_str)
            .unwrap_or("");

        out.push_str(&format!(
            "{glyph} {}  {}\n",
            format_timestamp(slot.row.timestamp, tz),
            headline.to_text(display)
        ));

        if let Some(details) = slot.row.narrative.details() {
            out.push_str(&format!("{continuation}     {details}\n"));
        }
        if let Some(fields) = slot.row.narrative.fields() {
            for (key, value) in fields.iter() {
                out.push_str(&format!("{continuation}     {key}: {value}\n"));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::audit::classifier::Narrative;
    use time::macros::datetime;

    fn row(index: usize, narrative: Narrative) -> NarrativeRow {
        NarrativeRow {
            index,
            total: 3,
            timestamp: datetime!(2024-03-01 10:00:00 UTC),
            narrative,
        }
    }

    #[test]
    fn first_and_last_rows_drop_outer_connectors() {
        let rows = vec![
            row(0, Narrative::GrantCreated),
            row(1, Narrative::GrantCreated),
            row(2, Narrative::GrantCreated),
        ];
        let slots = layout(&rows);

        assert!(!slots[0].incoming && slots[0].outgoing);
        assert!(slots[1].incoming && slots[1].outgoing);
        assert!(slots[2].incoming && !slots[2].outgoing);
    }

    #[test]
    fn single_row_has_no_connectors() {
        let rows = vec![row(1, Narrative::GrantCreated)];
        let slots = layout(&rows);
        assert_eq!(slots.len(), 1);
        assert!(!slots[0].incoming);
        assert!(!slots[0].outgoing);
    }

    #[test]
    fn empty_timeline_has_no_slots() {
        assert!(layout(&[]).is_empty());
    }

    #[test]
    fn layout_preserves_input_order() {
        let mut late = row(0, Narrative::GrantCreated);
        late.timestamp = datetime!(2024-03-02 10:00:00 UTC);
        let early = row(1, Narrative::GrantCreated);
        let rows = vec![late.clone(), early.clone()];

        let slots = layout(&rows);
        assert_eq!(slots[0].row, &late);
        assert_eq!(slots[1].row, &early);
    }

    #[test]
    fn text_rendering_substitutes_user_display() {
        let rows = vec![
            row(
                0,
                Narrative::RequestCreated {
                    actor: "usr_1".into(),
                },
            ),
            row(
                1,
                Narrative::GrantFailed {
                    reason: "boom".into(),
                },
            ),
        ];
        let mut users = HashMap::new();
        users.insert("usr_1".to_string(), UserDisplay::new("alice@example.com"));

        let text = render_text(&TimelineState::Ready(rows), &users, Tz::UTC);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "Audit Log",
                "╷ 2024/03/01 10:00:00  Request created by alice@example.com",
                "╵ 2024/03/01 10:00:00  Grant failed due to an error",
                "      boom",
            ]
        );
    }

    #[test]
    fn loading_state_renders_placeholder() {
        let text = render_text(&TimelineState::Loading, &HashMap::new(), Tz::UTC);
        assert!(text.contains("loading"));
    }
}
