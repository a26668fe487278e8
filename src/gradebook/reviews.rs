use chrono::Utc;
use tracing::info;

use super::book::Gradebook;
use super::error::GradebookError;
use super::types::CourseReview;
use crate::access::{authorize, owns_record, AccessDenied, Action, Actor};
use crate::grading::round_half_up;

const MIN_RATING: u8 = 1;
const MAX_RATING: u8 = 5;

fn check_rating(rating: u8) -> Result<(), GradebookError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(GradebookError::InvalidRating(rating))
    }
}

impl Gradebook {
    /// A student reviews a course. The review is attributed to the acting
    /// student, never to an id supplied separately.
    pub fn add_review(
        &mut self,
        actor: &Actor,
        course_id: u64,
        rating: u8,
        comment: &str,
    ) -> Result<u64, GradebookError> {
        authorize(actor, Action::WriteReview)?;
        let student_id = actor.student_id.ok_or(AccessDenied {
            role: actor.role,
            action: Action::WriteReview,
        })?;
        self.require_student(student_id)?;
        self.require_course(course_id)?;
        check_rating(rating)?;

        let id = self.reviews.iter().map(|r| r.id).max().map_or(1, |last| last + 1);
        self.reviews.push(CourseReview {
            id,
            course_id,
            student_id,
            rating,
            comment: comment.to_string(),
            created_at: Utc::now(),
        });
        info!(review_id = id, course_id, student_id, rating, "added review");
        Ok(id)
    }

    fn owned_review_index(&self, actor: &Actor, review_id: u64) -> Result<usize, GradebookError> {
        let index = self
            .reviews
            .iter()
            .position(|r| r.id == review_id)
            .ok_or(GradebookError::ReviewNotFound(review_id))?;

        if !owns_record(actor, self.reviews[index].student_id) {
            return Err(AccessDenied {
                role: actor.role,
                action: Action::WriteReview,
            }
            .into());
        }
        Ok(index)
    }

    /// Only the review's author may change it.
    pub fn update_review(
        &mut self,
        actor: &Actor,
        review_id: u64,
        rating: u8,
        comment: &str,
    ) -> Result<(), GradebookError> {
        let index = self.owned_review_index(actor, review_id)?;
        check_rating(rating)?;

        let review = &mut self.reviews[index];
        review.rating = rating;
        review.comment = comment.to_string();
        Ok(())
    }

    pub fn remove_review(
        &mut self,
        actor: &Actor,
        review_id: u64,
    ) -> Result<CourseReview, GradebookError> {
        let index = self.owned_review_index(actor, review_id)?;
        Ok(self.reviews.remove(index))
    }

    pub fn reviews_for_course(&self, course_id: u64) -> Vec<&CourseReview> {
        self.reviews
            .iter()
            .filter(|r| r.course_id == course_id)
            .collect()
    }

    /// Mean rating rounded to 2 decimals, or `None` for an unreviewed course.
    pub fn average_rating(&self, course_id: u64) -> Option<f64> {
        let reviews = self.reviews_for_course(course_id);
        if reviews.is_empty() {
            return None;
        }
        let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
        Some(round_half_up(f64::from(total) / reviews.len() as f64, 2))
    }
}
