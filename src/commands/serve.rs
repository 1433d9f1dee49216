use crate::commands::build_runtime;
use crate::constants::WARM_SCREENS;
use crate::models::AppConfig;
use crate::server::{self, AppState, UpstreamSummary};

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let port = port.unwrap_or(config.port);
    println!("🚀 Starting kiwooming server on port {}", port);
    println!("   🧩 Parser service:  {}", config.parser_base_url);
    println!("   🗂️  Backend service: {}", config.backend_base_url);
    println!("   📈 Chart service:   {} (code {})", config.chart_base_url, config.chart_code);
    println!("   🤖 Model:           {}", config.llm.model);
    match config.cache_ttl {
        Some(ttl) => println!("   ⏳ Screen cache TTL: {}s", ttl.as_secs()),
        None => println!("   ⏳ Screen cache TTL: none (process lifetime)"),
    }

    let runtime = build_runtime(&config)?;

    // Warm before binding so the first requests hit the cache
    println!("🔥 Warming screen cache: {}", WARM_SCREENS.join(", "));
    let report = runtime.assembler.cache().warm(WARM_SCREENS).await;
    println!("✅ Warmed {}/{} screens", report.warmed.len(), WARM_SCREENS.len());
    for (screen, error) in &report.failed {
        eprintln!("⚠️  Warning: Failed to warm '{}': {}", screen, error);
    }

    let upstreams = UpstreamSummary {
        parser: config.parser_base_url.clone(),
        backend: config.backend_base_url.clone(),
        chart: config.chart_base_url.clone(),
        model: config.llm.model.clone(),
    };
    let app_state = AppState::new(runtime.assembler, runtime.upstream, upstreams);

    println!("🌐 Starting HTTP server...");
    println!();
    server::serve(app_state, port, &config.cors_origins).await
}
