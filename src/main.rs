//! Distribuidor de chamados
//!
//! Fluxo:
//! - Colaborador escolhe o nome na lista e abre uma sessão
//! - Painel mostra o chamado em andamento ou o tamanho da fila
//! - "Pegar próximo" relê a planilha e atribui o primeiro pendente livre
//! - "Finalizar" pede confirmação e grava Status/Data Fim

use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use distribuidor_chamados::{build_router, config::Settings, services, utils::logging::*, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Carregar .env se existir
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "distribuidor_chamados=info,fila=info,planilha=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new()?;
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
    log_config_loaded(&run_mode);

    let store = services::build_store(&settings)?;
    let queue = services::build_queue_service(&settings, store);

    // Falha cedo se a planilha não responder depois das tentativas de conexão
    if let Err(e) = queue.connect().await {
        log_error(&format!("❌ Não foi possível conectar ao armazenamento: {}", e));
        return Err(anyhow::anyhow!("falha na conexão inicial: {}", e));
    }

    let app_state = Arc::new(AppState::new(settings.clone(), queue));

    let app = build_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    // PORT tem precedência sobre server.port
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(settings.server.port);
    let listener = TcpListener::bind(format!("{}:{}", settings.server.host, port)).await?;

    log_server_startup(port);
    log_server_ready(port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_warning(&format!("⚠️ Falha ao instalar handler de Ctrl+C: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_warning(&format!("⚠️ Falha ao instalar handler de SIGTERM: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
