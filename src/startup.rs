use std::sync::Arc;
use std::{net, time};

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::notifications::{notification_channel, NotificationWorker};
use crate::routes::{
    healthcheck, list_subscribed_courses, list_subscribed_crns, list_subscriptions, subscribe,
    unsubscribe, unsubscribe_all,
};
use crate::store::{PgUserStore, UserStore};
use crate::subscription_service::SubscriptionService;

/// Application
pub struct Application {
    server: Server,
    worker: NotificationWorker,
    port: u16,
}

impl Application {
    /// Build an application based on settings
    pub async fn build(config: Settings) -> anyhow::Result<Self> {
        // Connect to the database
        let db_pool = PgPoolOptions::new()
            .acquire_timeout(time::Duration::from_secs(2))
            .connect_lazy_with(config.database.db_options());

        // Run the HTTP server and return its data
        Self::build_with_store(config, Arc::new(PgUserStore::new(db_pool))).await
    }

    /// Build an application based on settings and a user store
    pub async fn build_with_store(
        config: Settings,
        store: Arc<dyn UserStore>,
    ) -> anyhow::Result<Self> {
        // Build the collaborators and the notification worker
        let email_client = config.email_client.client()?;
        let course_data = config.course_data.client()?;
        let (notifications, worker) = notification_channel(Arc::new(email_client));
        let service = SubscriptionService::new(
            store,
            Arc::new(course_data),
            notifications,
            config.subscriptions.max_write_attempts,
        );

        // Run the HTTP server and return its data
        let listener = net::TcpListener::bind(format!(
            "{}:{}",
            config.application.app_host, config.application.app_port
        ))?;
        let port = listener.local_addr()?.port();
        let server = run_server(listener, service)?;
        Ok(Self {
            server,
            worker,
            port,
        })
    }

    /// Get application port
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Run application until it is stopped
    ///
    /// The notification worker runs alongside the HTTP server; notifications
    /// still queued when the server stops are dropped.
    #[allow(clippy::redundant_pub_crate)]
    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        let Self { server, worker, .. } = self;

        // Return as soon as one of the tasks completes or errors out
        tokio::select! {
            outcome = server => outcome?,
            outcome = worker.run_until_stopped() => outcome?,
        }

        Ok(())
    }
}

/// Run the HTTP server
pub fn run_server(
    listener: net::TcpListener,
    service: SubscriptionService,
) -> anyhow::Result<Server> {
    // Prepare data to be added the application context
    let service = web::Data::new(service);

    // Start the HTTP server
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/healthcheck", web::get().to(healthcheck))
            .service(
                web::scope("/subscriptions")
                    .route("", web::get().to(list_subscriptions))
                    .route("", web::post().to(subscribe))
                    .route("/crns", web::get().to(list_subscribed_crns))
                    .route("/courses", web::get().to(list_subscribed_courses))
                    .route("/unsubscribe", web::post().to(unsubscribe))
                    .route("/unsubscribe_all", web::post().to(unsubscribe_all)),
            )
            .app_data(service.clone())
    })
    .listen(listener)?
    .run())
}
