use std::time;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::domain::{Course, Crn};

/// Source of course section records
#[async_trait]
pub trait CourseData: Send + Sync {
    /// Resolve a list of CRNs to their course records
    async fn get_courses_by_crns(&self, crns: &[Crn]) -> anyhow::Result<Vec<Course>>;
}

/// HTTP client for the course data service
pub struct CourseDataClient {
    http_client: Client,
    base_url: Url,
}

impl CourseDataClient {
    /// Build a client for the service at `base_url`; a path prefix such as `/api` is kept
    pub fn new(mut base_url: Url, timeout: time::Duration) -> anyhow::Result<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the course data HTTP client")?;
        Ok(Self {
            http_client,
            base_url,
        })
    }
}

#[async_trait]
impl CourseData for CourseDataClient {
    /// Fetch courses with `GET /courses?crns=<crn>,<crn>,...`
    #[tracing::instrument(name = "Fetch courses by CRN", skip(self))]
    async fn get_courses_by_crns(&self, crns: &[Crn]) -> anyhow::Result<Vec<Course>> {
        if crns.is_empty() {
            return Ok(Vec::new());
        }

        let url = self
            .base_url
            .join("courses")
            .context("Failed to build the course data URL")?;
        let crns = crns.iter().map(AsRef::<str>::as_ref).collect::<Vec<&str>>().join(",");

        let courses = self
            .http_client
            .get(url)
            .query(&[("crns", crns)])
            .send()
            .await
            .context("Failed to reach the course data service")?
            .error_for_status()
            .context("The course data service rejected the request")?
            .json::<Vec<Course>>()
            .await
            .context("Failed to decode the course data response")?;

        Ok(courses)
    }
}
