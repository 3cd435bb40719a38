use std::io;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    prelude::{Span, Text},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem},
    Frame, Terminal,
};

use crate::models::comments::ThreadRow;
use crate::models::post::Post;
use crate::views::widgets::{MediaCarousel, StatefulList};

pub fn setup_terminal() -> io::Result<Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

pub fn restore_terminal(
    terminal: &mut Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>,
) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()
}

pub fn render_ui<B: ratatui::backend::Backend>(
    f: &mut Frame<B>,
    stateful_list: &mut StatefulList<Post>,
    status: String,
    carousel: Option<&MediaCarousel>,
) {
    // Create the layout
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Percentage(100)].as_ref())
        .split(f.size());

    let selected = stateful_list.state.selected();

    // Create the feed of posts
    let items: Vec<ListItem> = stateful_list
        .items
        .iter()
        .enumerate()
        .map(|(index, post)| {
            // Header line with author and timestamp
            let header = Line::from(vec![Span::styled(
                format!("{} · {}", post.author.label(), post.datetime),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )]);

            let engagement = engagement_line(post);

            let mut all_lines = vec![header, engagement];

            if let Some(media) = &post.media {
                let summary = match carousel {
                    Some(carousel) if selected == Some(index) => {
                        match carousel.current() {
                            Some((url, kind)) => format!(
                                "media {} · {} · {}",
                                carousel.indicator(),
                                kind.badge(),
                                url
                            ),
                            None => format!("media ×{}", media.len()),
                        }
                    }
                    _ => format!("media ×{}", media.len()),
                };
                all_lines.push(Line::from(Span::styled(
                    summary,
                    Style::default().fg(Color::Magenta),
                )));
            }

            all_lines.push(Line::from(""));
            let content = Text::raw(&post.content);
            all_lines.extend(content.lines);
            all_lines.push(Line::from(""));

            ListItem::new(all_lines).style(Style::default())
        })
        .collect();

    // Create a List from the items and highlight the currently selected one
    let list = List::new(items)
        .block(Block::default().title(status).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Gray)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );

    // Render the list with its state
    f.render_stateful_widget(list, chunks[0], &mut stateful_list.state);
}

fn engagement_line(post: &Post) -> Line<'static> {
    let marker = |set: bool, on: Color| {
        if set {
            Style::default().fg(on).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let mut spans = vec![
        Span::styled(
            format!("{} {}", if post.is_liked { "♥" } else { "♡" }, post.likes_count),
            marker(post.is_liked, Color::Red),
        ),
        Span::raw("  "),
        Span::styled(
            format!("⇄ {}", post.reposts_count),
            marker(post.is_reposted, Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            format!("🗨 {}", post.comments_count),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if post.is_saved {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "★ saved".to_string(),
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}

pub fn render_thread<B: ratatui::backend::Backend>(
    f: &mut Frame<B>,
    rows: &mut StatefulList<ThreadRow>,
    status: String,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Percentage(100)].as_ref())
        .split(f.size());

    let items: Vec<ListItem> = rows
        .items
        .iter()
        .map(|row| {
            let indent = if row.is_reply { "    ↳ " } else { "" };
            let comment = &row.comment;

            let header = Line::from(vec![Span::styled(
                format!("{}{} · {}", indent, comment.author.label(), comment.datetime),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )]);

            let mut all_lines = vec![header];
            for line in comment.content.lines() {
                all_lines.push(Line::from(format!("{}{}", indent, line)));
            }
            if !row.is_reply && comment.replies_count > 0 {
                all_lines.push(Line::from(Span::styled(
                    format!("{} replies [Tab]", comment.replies_count),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            all_lines.push(Line::from(""));

            ListItem::new(all_lines).style(Style::default())
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().title(status).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Gray)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );

    f.render_stateful_widget(list, chunks[0], &mut rows.state);
}
