use std::io::{self, Write};

use doors_client::{ClientError, SessionManager};
use doors_core::format;
use doors_core::models::{Category, Door};
use doors_core::types::Timestamp;

use super::ViewState;

const DESCRIPTION_WIDTH: usize = 60;

/// All doors, optionally filtered by category. Also serves as the home view.
#[derive(Debug, Default)]
pub struct DoorListView {
    pub category: Option<Category>,
    pub state: ViewState<Vec<Door>>,
}

impl DoorListView {
    pub fn new(category: Option<Category>) -> Self {
        Self {
            category,
            state: ViewState::Loading,
        }
    }

    pub async fn load(&mut self, session: &SessionManager) {
        self.state = ViewState::from_result(self.fetch(session).await);
    }

    async fn fetch(&self, session: &SessionManager) -> Result<Vec<Door>, ClientError> {
        let token = session.require_token().await?;
        session.api().list_doors(&token, self.category).await
    }

    pub fn render(&self, out: &mut impl Write, now: Timestamp) -> io::Result<()> {
        match self.category {
            Some(category) => writeln!(out, "Doors (category {category})")?,
            None => writeln!(out, "Doors (all categories)")?,
        }
        self.state.render_with(out, |out, doors| {
            if doors.is_empty() {
                return writeln!(out, "No doors found.");
            }
            for door in doors {
                let place = door.place_name.as_deref().unwrap_or("Unknown place");
                writeln!(
                    out,
                    "{}  [{}] {} - {} - by {}, {}",
                    door.id,
                    door.category,
                    door.title,
                    place,
                    door.user_name,
                    format::relative_age(door.created_at, now),
                )?;
                writeln!(out, "    {}", format::truncate(&door.description, DESCRIPTION_WIDTH))?;
            }
            writeln!(out, "{} door(s)", doors.len())
        })
    }
}
