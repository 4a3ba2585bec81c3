use std::io::{self, Write};

use doors_client::{ClientError, SessionManager};
use doors_core::error::CoreError;
use doors_core::form::{FormStep, SubmissionForm};
use doors_core::models::Door;

use super::ViewState;

/// Door submission: walks the form to its review step, then uploads.
#[derive(Debug)]
pub struct SubmitView {
    form: SubmissionForm,
    pub state: ViewState<Door>,
}

impl SubmitView {
    pub fn new(form: SubmissionForm) -> Self {
        Self {
            form,
            state: ViewState::Loading,
        }
    }

    pub fn form(&self) -> &SubmissionForm {
        &self.form
    }

    /// Advance through every remaining step. On a validation failure the
    /// form stays on the offending step.
    pub fn advance_to_review(&mut self) -> Result<(), CoreError> {
        while self.form.step() != FormStep::Review {
            let step = self.form.advance()?;
            tracing::debug!(step = step.number(), "Submission form advanced");
        }
        Ok(())
    }

    pub async fn submit(&mut self, session: &SessionManager) {
        let result = self.send(session).await;
        self.state = ViewState::from_result(result);
    }

    async fn send(&mut self, session: &SessionManager) -> Result<Door, ClientError> {
        self.advance_to_review()?;
        let (door, image) = self.form.clone().finish()?;
        let token = session.require_token().await?;
        session.api().create_door(&token, &door, &image).await
    }

    /// Summary of the entered values, as shown on the review step.
    pub fn render_review(&self, out: &mut impl Write) -> io::Result<()> {
        let form = &self.form;
        writeln!(
            out,
            "Review (step {} of {})",
            form.step().number(),
            SubmissionForm::STEP_COUNT
        )?;
        writeln!(out, "  Title: {}", form.title.trim())?;
        if let Some(category) = form.category {
            writeln!(out, "  Category: {category}")?;
        }
        writeln!(out, "  Description: {}", form.description.trim())?;
        if let (Some(lat), Some(lon)) = (form.latitude, form.longitude) {
            writeln!(out, "  Location: {lat:.5}, {lon:.5}")?;
        }
        for (label, value) in [("Place", &form.place_name), ("History", &form.history)] {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                writeln!(out, "  {label}: {}", value.trim())?;
            }
        }
        if let Some(image) = &form.image {
            writeln!(
                out,
                "  Image: {} ({}, {}x{}, {} bytes)",
                image.file_name,
                image.content_type,
                image.width,
                image.height,
                image.bytes.len()
            )?;
        }
        Ok(())
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        match &self.state {
            ViewState::Loading => self.render_review(out),
            ViewState::Failed(message) => super::render_toast(out, message),
            ViewState::Loaded(door) => {
                writeln!(out, "Door submitted: {} ({})", door.title, door.id)
            }
        }
    }
}
