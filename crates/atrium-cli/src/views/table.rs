use atrium_core::models::{ActivityInstance, InstanceState};
use comfy_table::{Attribute, Cell, Color, Row, Table};

use crate::util::{format_instant, short_id};

pub fn display_activities(activities: &[ActivityInstance]) {
    if activities.is_empty() {
        println!("No activities scheduled in this window.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Start", "End", "Location", "Kind"]);

    for activity in activities {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&activity.id)));

        let mut display_title = String::new();
        if activity.series_id.is_some() {
            display_title.push('↻');
            display_title.push(' ');
        }
        display_title.push_str(&activity.title);
        if activity.conflict_override {
            display_title.push_str(" ⚠");
        }

        let title_cell = match activity.state {
            InstanceState::SeriesOverride => Cell::new(display_title)
                .fg(Color::Yellow)
                .add_attribute(Attribute::Bold),
            InstanceState::SeriesGenerated => Cell::new(display_title),
            InstanceState::Standalone => Cell::new(display_title),
        };
        row.add_cell(title_cell);

        row.add_cell(Cell::new(format_instant(activity.start_at)));
        row.add_cell(Cell::new(format_instant(activity.end_at)));
        row.add_cell(Cell::new(activity.location.as_deref().unwrap_or("-")));
        row.add_cell(Cell::new(kind_label(activity.state)));

        table.add_row(row);
    }

    println!("{table}");
    println!("{} activities", activities.len());
}

fn kind_label(state: InstanceState) -> &'static str {
    match state {
        InstanceState::SeriesGenerated => "series",
        InstanceState::SeriesOverride => "override",
        InstanceState::Standalone => "one-off",
    }
}
