use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub struct LearningLayout {
    pub header_area: Rect,
    pub body_area: Rect,
    pub help_area: Rect,
    pub notification_area: Rect,
}

pub struct MenuLayout {
    pub title_area: Rect,
    pub list_area: Rect,
    pub status_area: Rect,
    pub help_area: Rect,
}

pub fn calculate_learning_chunks(area: Rect) -> LearningLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    LearningLayout {
        header_area: chunks[0],
        body_area: chunks[1],
        help_area: chunks[2],
        notification_area: chunks[3],
    }
}

pub fn calculate_menu_chunks(area: Rect) -> MenuLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(4),
        ])
        .split(area);

    let footer = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[2]);

    MenuLayout {
        title_area: chunks[0],
        list_area: chunks[1],
        status_area: footer[0],
        help_area: footer[1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learning_chunks_stack_vertically() {
        let layout = calculate_learning_chunks(Rect::new(0, 0, 80, 30));
        assert_eq!(layout.header_area.height, 3);
        assert_eq!(layout.help_area.height, 3);
        assert_eq!(layout.notification_area.height, 1);
        assert_eq!(layout.body_area.y, layout.header_area.y + 3);
        assert_eq!(layout.body_area.height, 30 - 2 - 3 - 3 - 1);
    }

    #[test]
    fn test_menu_footer_is_split() {
        let layout = calculate_menu_chunks(Rect::new(0, 0, 100, 20));
        assert_eq!(layout.status_area.y, layout.help_area.y);
        assert!(layout.status_area.width < layout.help_area.width);
        assert_eq!(layout.title_area.height, 3);
        assert!(layout.list_area.height >= 3);
    }
}
