use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use compliance_assist::analysis::{RetrievalAnalyzer, SearchIndexClient};
use compliance_assist::auth::{BearerTokenSource, CachedTokenSource, TokenSource};
use compliance_assist::compliance::ComplianceOrchestrator;
use compliance_assist::config::AppConfig;
use compliance_assist::directory::{GraphDirectoryClient, RecipientResolver};
use compliance_assist::llm::create_provider;
use compliance_assist::mail::{
    GraphMailTransport, MailTransport, NotificationDispatcher, SmtpMailTransport,
};
use compliance_assist::web::{AppState, compliance_routes};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    eprintln!("Compliance Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   API: http://0.0.0.0:{}", config.http_port);
    eprintln!(
        "   Mail transport: {}",
        if config.smtp.is_some() { "smtp" } else { "graph" }
    );

    let llm = create_provider(&config.llm)?;
    let http = reqwest::Client::new();

    let tokens: Arc<dyn TokenSource> = Arc::new(CachedTokenSource::new(BearerTokenSource::new(
        config.graph_token.clone(),
    )));

    // ── Collaborators ───────────────────────────────────────────────
    let retrieval = Arc::new(SearchIndexClient::new(
        http.clone(),
        config.retrieval.endpoint.clone(),
        config.retrieval.index.clone(),
        Arc::clone(&tokens),
    ));
    let analyzer = Arc::new(RetrievalAnalyzer::new(retrieval, llm));

    let directory = Arc::new(GraphDirectoryClient::new(
        http.clone(),
        config.graph_base_url.clone(),
        Arc::clone(&tokens),
    ));
    let resolver = RecipientResolver::new(directory);

    let transport: Arc<dyn MailTransport> = match config.smtp.clone() {
        Some(smtp) => Arc::new(SmtpMailTransport::new(smtp)),
        None => Arc::new(GraphMailTransport::new(
            http,
            config.graph_base_url.clone(),
            Arc::clone(&tokens),
        )),
    };
    let dispatcher = NotificationDispatcher::new(resolver, transport);

    let orchestrator = Arc::new(ComplianceOrchestrator::new(analyzer, dispatcher));

    // ── HTTP server ─────────────────────────────────────────────────
    let app = compliance_routes(AppState {
        orchestrator,
        consent_url: config.consent_url,
        default_file: config.default_file,
    })
    .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    tracing::info!(port = config.http_port, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
