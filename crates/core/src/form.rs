//! Multi-step door submission form.
//!
//! The form walks `Details -> Place -> Photo -> Review`. Each call to
//! [`SubmissionForm::advance`] validates only the fields of the current
//! step; a failure leaves the form where it is. [`SubmissionForm::finish`]
//! re-validates everything and yields the request payload.

use crate::error::CoreError;
use crate::models::{Category, NewDoor};
use crate::validation::{self, ImageUpload};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormStep {
    #[default]
    Details,
    Place,
    Photo,
    Review,
}

impl FormStep {
    fn next(self) -> Option<Self> {
        match self {
            FormStep::Details => Some(FormStep::Place),
            FormStep::Place => Some(FormStep::Photo),
            FormStep::Photo => Some(FormStep::Review),
            FormStep::Review => None,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            FormStep::Details => None,
            FormStep::Place => Some(FormStep::Details),
            FormStep::Photo => Some(FormStep::Place),
            FormStep::Review => Some(FormStep::Photo),
        }
    }

    /// 1-based position, for "step 2 of 4" style prompts.
    pub fn number(self) -> usize {
        match self {
            FormStep::Details => 1,
            FormStep::Place => 2,
            FormStep::Photo => 3,
            FormStep::Review => 4,
        }
    }
}

/// Draft state of a door submission.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    step: FormStep,
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_name: Option<String>,
    pub history: Option<String>,
    pub image: Option<ImageUpload>,
}

impl SubmissionForm {
    pub const STEP_COUNT: usize = 4;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    /// Validate the current step and move to the next one.
    pub fn advance(&mut self) -> Result<FormStep, CoreError> {
        let current = self.step();
        self.check_step(current)?;
        let next = current.next().ok_or_else(|| {
            CoreError::Validation("form is already at the review step".into())
        })?;
        self.step = next;
        Ok(next)
    }

    /// Return to the previous step. Entered values are kept.
    pub fn back(&mut self) -> FormStep {
        let current = self.step();
        let prev = current.previous().unwrap_or(current);
        self.step = prev;
        prev
    }

    /// Produce the submission payload. Only valid on the review step.
    pub fn finish(self) -> Result<(NewDoor, ImageUpload), CoreError> {
        if self.step() != FormStep::Review {
            return Err(CoreError::Validation(format!(
                "form is on step {} of {}, not review",
                self.step().number(),
                Self::STEP_COUNT
            )));
        }
        for step in [FormStep::Details, FormStep::Place, FormStep::Photo] {
            self.check_step(step)?;
        }

        let image = self
            .image
            .ok_or_else(|| CoreError::Validation("an image is required".into()))?;
        let door = NewDoor {
            title: self.title,
            description: self.description,
            place_name: self.place_name,
            history: self.history,
            category: self
                .category
                .ok_or_else(|| CoreError::Validation("category is required".into()))?,
            latitude: self
                .latitude
                .ok_or_else(|| CoreError::Validation("latitude is required".into()))?,
            longitude: self
                .longitude
                .ok_or_else(|| CoreError::Validation("longitude is required".into()))?,
        };
        validation::validate(&door)?;
        Ok((door, image))
    }

    fn check_step(&self, step: FormStep) -> Result<(), CoreError> {
        match step {
            FormStep::Details => {
                if self.title.trim().is_empty() {
                    return Err(CoreError::Validation("title is required".into()));
                }
                if self.description.trim().is_empty() {
                    return Err(CoreError::Validation("description is required".into()));
                }
                if self.category.is_none() {
                    return Err(CoreError::Validation("category is required".into()));
                }
            }
            FormStep::Place => match (self.latitude, self.longitude) {
                (Some(lat), Some(lon)) => {
                    if !(-90.0..=90.0).contains(&lat) {
                        return Err(CoreError::Validation(format!(
                            "latitude {lat} is outside [-90, 90]"
                        )));
                    }
                    if !(-180.0..=180.0).contains(&lon) {
                        return Err(CoreError::Validation(format!(
                            "longitude {lon} is outside [-180, 180]"
                        )));
                    }
                }
                _ => {
                    return Err(CoreError::Validation(
                        "latitude and longitude are required".into(),
                    ))
                }
            },
            FormStep::Photo => {
                if self.image.is_none() {
                    return Err(CoreError::Validation("an image is required".into()));
                }
            }
            FormStep::Review => {}
        }
        Ok(())
    }
}
