use crate::domain::{Course, Crn};

/// A user's registered interest in a course section
///
/// `status` is the course status observed when the subscription was created.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Subscription {
    #[serde(rename = "CRN")]
    pub crn: Crn,
    #[serde(rename = "STATUS")]
    pub status: String,
}

impl From<&Course> for Subscription {
    fn from(course: &Course) -> Self {
        Self {
            crn: course.crn.clone(),
            status: course.status.clone(),
        }
    }
}
