use std::{env, io, sync, time};

use fdlimit::raise_fd_limit;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use course_notifier::configuration::Settings;
use course_notifier::startup::Application;
use course_notifier::store::InMemoryUserStore;
use course_notifier::telemetry::{get_subscriber, init_subscriber};

/// Ensure the tracing stack is initialized only once
static TRACING: sync::LazyLock<()> = sync::LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if env::var("TEST_LOG").is_ok() {
        init_subscriber(get_subscriber(
            subscriber_name,
            default_filter_level,
            io::stdout,
        ))
        .expect("Failed to initialize tracing");
    } else {
        init_subscriber(get_subscriber(
            subscriber_name,
            default_filter_level,
            io::sink,
        ))
        .expect("Failed to initialize tracing");
    };
});

/// Test application data
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub email_server: MockServer,
    pub course_data_server: MockServer,
    pub store: InMemoryUserStore,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spin up a test application backed by an in-memory store and return its data
    pub async fn spawn() -> Self {
        // Initialize logging
        sync::LazyLock::force(&TRACING);

        // Raise file descriptors limit to avoid "Too many open files" error
        raise_fd_limit().expect("Failed to raise fd limit");

        // Launch mock servers to stand in for Postmark's API and the course data service
        let email_server = MockServer::start().await;
        let course_data_server = MockServer::start().await;

        // Get settings and modify them for testing
        let config = {
            let mut c = Settings::get_config().expect("Failed to read configuration");
            // Listen on a random TCP port
            c.application.app_port = 0;
            // Use the mock servers as collaborators
            c.email_client.base_url = email_server.uri();
            c.course_data.base_url = course_data_server.uri();
            c
        };

        // Build the application and get its address
        let store = InMemoryUserStore::new();
        let app = Application::build_with_store(config, sync::Arc::new(store.clone()))
            .await
            .expect("Failed to build application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{port}");

        // Run the application and return its data
        #[allow(clippy::let_underscore_future)]
        let _ = tokio::spawn(app.run_until_stopped());
        Self {
            address,
            port,
            email_server,
            course_data_server,
            store,
            api_client: reqwest::Client::new(),
        }
    }

    /// Accept every email sent to the email API
    pub async fn accept_emails(&self) {
        Mock::given(path("/email"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.email_server)
            .await;
    }

    /// POST to the subscriptions endpoint
    pub async fn post_subscriptions(&self, body: &Value) -> reqwest::Response {
        self.post_json("/subscriptions", body).await
    }

    /// POST to the unsubscribe endpoint
    pub async fn post_unsubscribe(&self, body: &Value) -> reqwest::Response {
        self.post_json("/subscriptions/unsubscribe", body).await
    }

    /// POST to the unsubscribe-all endpoint
    pub async fn post_unsubscribe_all(&self, email: &str) -> reqwest::Response {
        self.post_json("/subscriptions/unsubscribe_all", &json!({ "email": email }))
            .await
    }

    /// GET the subscriptions of a user
    pub async fn get_subscriptions(&self, email: &str) -> reqwest::Response {
        self.get_with_email("/subscriptions", email).await
    }

    /// GET the CRNs a user is subscribed to
    pub async fn get_subscribed_crns(&self, email: &str) -> reqwest::Response {
        self.get_with_email("/subscriptions/crns", email).await
    }

    /// GET the courses a user is subscribed to
    pub async fn get_subscribed_courses(&self, email: &str) -> reqwest::Response {
        self.get_with_email("/subscriptions/courses", email).await
    }

    /// Subscribe a user through the public API, failing the test on error
    pub async fn subscribe(&self, email: &str, course: Value) {
        self.post_subscriptions(&json!({ "email": email, "course": course }))
            .await
            .error_for_status()
            .unwrap();
    }

    /// Wait until the email API has received at least `expected` requests and return all of them
    pub async fn received_emails(&self, expected: usize) -> Vec<Request> {
        for _ in 0..200 {
            let requests = self.email_server.received_requests().await.unwrap();
            if requests.len() >= expected {
                return requests;
            }
            tokio::time::sleep(time::Duration::from_millis(25)).await;
        }
        panic!("The email API did not receive {expected} requests in time");
    }

    async fn post_json(&self, endpoint: &str, body: &Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}{endpoint}", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    async fn get_with_email(&self, endpoint: &str, email: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}{endpoint}", &self.address))
            .query(&[("email", email)])
            .send()
            .await
            .expect("Failed to send request")
    }
}

/// Course record as published by the course data service
pub fn course(crn: &str, title: &str, status: &str) -> Value {
    json!({ "CRN": crn, "TITLE": title, "STATUS": status })
}

/// Parse the body of a request to the email API
pub fn email_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap()
}
