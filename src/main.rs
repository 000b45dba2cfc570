use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use auto_shop_crm::build_app;
use auto_shop_crm::config::{EnvironmentConfig, StorageBackend};
use auto_shop_crm::database::{
    DatabaseConnection, DocumentStore, MemoryDocumentStore, PgDocumentStore,
};
use auto_shop_crm::services::{LogNotifier, Notifier, WebhookNotifier};
use auto_shop_crm::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env().context("configuración inválida")?;

    // Configurar logging
    let level = config
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🔧 {} - Auto Shop CRM", config.shop_name);
    info!("================================================");
    info!("🌍 Entorno: {}", config.environment);

    let store = build_store(&config).await?;
    let notifier = build_notifier(&config);

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .context("HOST/PORT inválidos")?;

    let app = build_app(AppState::new(store, notifier, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   /api/customers, /api/vehicles, /api/technicians");
    info!("   /api/work-orders, /api/appointments, /api/invoices");
    info!("   GET  /api/search?q=");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Elegir el almacén de documentos según `STORAGE_BACKEND`
async fn build_store(config: &EnvironmentConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let db_config = config
                .database_config()
                .context("STORAGE_BACKEND=postgres requiere DATABASE_URL")?;
            let connection = match DatabaseConnection::connect(&db_config).await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow::anyhow!("Error de base de datos: {}", e));
                }
            };
            info!("🐘 Almacén: PostgreSQL");
            Ok(Arc::new(PgDocumentStore::new(connection.pool().clone())))
        }
        StorageBackend::Memory => {
            if config.is_development() {
                info!("🧪 Almacén en memoria");
            } else {
                warn!("⚠️ Almacén en memoria fuera de desarrollo: los datos se pierden al reiniciar");
            }
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
    }
}

/// Webhook si está configurado; si no, los avisos sólo se registran en el log
fn build_notifier(config: &EnvironmentConfig) -> Arc<dyn Notifier> {
    let Some(url) = config.notification_webhook_url.clone() else {
        info!("📨 Avisos: sólo log (sin NOTIFICATION_WEBHOOK_URL)");
        return Arc::new(LogNotifier);
    };

    match WebhookNotifier::new(url, config.notification_api_key.clone()) {
        Ok(notifier) => {
            info!("📨 Avisos: webhook configurado");
            Arc::new(notifier)
        }
        Err(e) => {
            error!("❌ No se pudo crear el cliente de avisos ({}); se usará el log", e);
            Arc::new(LogNotifier)
        }
    }
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
