use serenity::builder::CreateComponents;
use serenity::model::application::component::ButtonStyle;
use serenity::model::id::ChannelId;
use unicode_segmentation::UnicodeSegmentation;

pub const SETUP_SELECT_ID: &str = "setup_points_channel";

/// Discord allows at most 25 options in a select menu.
pub const MAX_SELECT_OPTIONS: usize = 25;
/// And at most 100 characters per option label.
pub const MAX_LABEL_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelButton {
    AddPoints,
    RemovePoints,
    Blacklist,
    Announce,
    PointsHelp,
    Daily,
    Status,
    Setup,
    MyPoints,
    ResetAll,
}

impl PanelButton {
    pub const ALL: [PanelButton; 10] = [
        PanelButton::AddPoints,
        PanelButton::RemovePoints,
        PanelButton::Blacklist,
        PanelButton::Announce,
        PanelButton::PointsHelp,
        PanelButton::Daily,
        PanelButton::Status,
        PanelButton::Setup,
        PanelButton::MyPoints,
        PanelButton::ResetAll,
    ];

    pub const fn custom_id(self) -> &'static str {
        match self {
            PanelButton::AddPoints => "panel_addpoints",
            PanelButton::RemovePoints => "panel_removepoints",
            PanelButton::Blacklist => "panel_blacklist",
            PanelButton::Announce => "panel_announce",
            PanelButton::PointsHelp => "panel_points",
            PanelButton::Daily => "panel_daily",
            PanelButton::Status => "panel_status",
            PanelButton::Setup => "panel_setup",
            PanelButton::MyPoints => "panel_mypoints",
            PanelButton::ResetAll => "panel_reset",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PanelButton::AddPoints => "Add points",
            PanelButton::RemovePoints => "Remove points",
            PanelButton::Blacklist => "Blacklist",
            PanelButton::Announce => "Announce",
            PanelButton::PointsHelp => "Points",
            PanelButton::Daily => "Daily",
            PanelButton::Status => "Status",
            PanelButton::Setup => "Setup",
            PanelButton::MyPoints => "My points",
            PanelButton::ResetAll => "Reset all points",
        }
    }

    const fn style(self) -> ButtonStyle {
        match self {
            PanelButton::AddPoints | PanelButton::Daily => ButtonStyle::Success,
            PanelButton::RemovePoints | PanelButton::Blacklist | PanelButton::ResetAll => {
                ButtonStyle::Danger
            }
            PanelButton::Announce | PanelButton::MyPoints => ButtonStyle::Primary,
            _ => ButtonStyle::Secondary,
        }
    }

    pub fn from_custom_id(id: &str) -> Option<PanelButton> {
        PanelButton::ALL.into_iter().find(|b| b.custom_id() == id)
    }
}

/// A channel offered by the setup menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelChoice {
    pub id: ChannelId,
    pub label: String,
}

impl ChannelChoice {
    pub fn new(id: ChannelId, name: &str) -> ChannelChoice {
        ChannelChoice {
            id,
            label: truncate_graphemes(name, MAX_LABEL_LEN),
        }
    }
}

/// Cuts `text` to at most `max` characters without splitting a grapheme.
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    let mut out = String::new();
    let mut chars = 0;
    for g in text.graphemes(true) {
        let len = g.chars().count();
        if chars + len > max {
            break;
        }
        chars += len;
        out.push_str(g);
    }
    out
}

pub fn channel_select<'a>(
    components: &'a mut CreateComponents,
    choices: &[ChannelChoice],
) -> &'a mut CreateComponents {
    components.create_action_row(|row| {
        row.create_select_menu(|menu| {
            menu.custom_id(SETUP_SELECT_ID)
                .placeholder("Pick the points channel")
                .min_values(1)
                .max_values(1)
                .options(|opts| {
                    for choice in choices.iter().take(MAX_SELECT_OPTIONS) {
                        opts.create_option(|o| {
                            o.label(&choice.label).value(choice.id.0.to_string())
                        });
                    }
                    opts
                })
        })
    })
}

pub fn control_panel(components: &mut CreateComponents) -> &mut CreateComponents {
    // five buttons per row
    for row_buttons in PanelButton::ALL.chunks(5) {
        components.create_action_row(|row| {
            for button in row_buttons {
                row.create_button(|b| {
                    b.custom_id(button.custom_id())
                        .label(button.label())
                        .style(button.style())
                });
            }
            row
        });
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_ids_roundtrip() {
        for button in PanelButton::ALL {
            assert_eq!(PanelButton::from_custom_id(button.custom_id()), Some(button));
        }
        assert_eq!(PanelButton::from_custom_id("panel_nope"), None);
    }

    #[test]
    fn test_truncate_ascii() {
        let long = "a".repeat(150);
        assert_eq!(truncate_graphemes(&long, MAX_LABEL_LEN).len(), 100);
        assert_eq!(truncate_graphemes("general", MAX_LABEL_LEN), "general");
    }

    #[test]
    fn test_truncate_keeps_graphemes_whole() {
        // "e" followed by a combining acute accent is one grapheme of two chars
        let text = "abe\u{301}";
        assert_eq!(truncate_graphemes(text, 3), "ab");
        assert_eq!(truncate_graphemes(text, 4), text);
    }

    #[test]
    fn test_builders_fill_rows() {
        let choices: Vec<ChannelChoice> = (1..=30)
            .map(|id| ChannelChoice::new(ChannelId(id), "general"))
            .collect();
        let mut select = CreateComponents::default();
        assert_eq!(channel_select(&mut select, &choices).0.len(), 1);

        let mut panel = CreateComponents::default();
        control_panel(&mut panel);
        assert_eq!(panel.0.len(), (PanelButton::ALL.len() + 4) / 5);
    }

    #[test]
    fn test_choice_label() {
        let choice = ChannelChoice::new(ChannelId(5), &"x".repeat(120));
        assert_eq!(choice.label.chars().count(), 100);
    }
}
