//! Server execution logic.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tilecast_shared::time::Clock;
use tokio::{net::TcpListener, sync::Mutex, task::JoinHandle, time::MissedTickBehavior};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::ServerConfig,
    domain::{CodeGenerator, HubRepository, MessagePusher, PairingHub},
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryHubRepository},
    usecase::{
        ApprovePairingUseCase, ConfigureWallUseCase, ConnectSessionUseCase,
        DisconnectSessionUseCase, DispatchSyncUseCase, GetServerTimeUseCase, GetStatsUseCase,
        HeartbeatUseCase, IssueCodeUseCase, RedeemCodeUseCase, RegisterIdentityUseCase,
        RejectPairingUseCase, SweepUseCase, UnpairUseCase,
    },
};

use super::{
    handler::{get_server_time, get_stats, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(100);

/// How often the background sweeps run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSchedule {
    pub code_expiry: Duration,
    pub liveness: Duration,
}

/// Pairing and synchronized playback server
///
/// # Example
///
/// ```ignore
/// let config = ServerConfig::default();
/// let server = Server::from_config(
///     &config,
///     Arc::new(SystemClock),
///     Box::new(RandomCodeGenerator::new()),
/// );
/// server.run(config.host.clone(), config.port).await?;
/// ```
pub struct Server {
    app_state: AppState,
    /// SweepUseCase（定期掃除のユースケース）
    sweep_usecase: Arc<SweepUseCase>,
    sweep_schedule: SweepSchedule,
}

impl Server {
    pub fn new(
        app_state: AppState,
        sweep_usecase: Arc<SweepUseCase>,
        sweep_schedule: SweepSchedule,
    ) -> Self {
        Self {
            app_state,
            sweep_usecase,
            sweep_schedule,
        }
    }

    /// Wire the in-memory hub, the WebSocket pusher and every use case.
    pub fn from_config(
        config: &ServerConfig,
        clock: Arc<dyn Clock>,
        generator: Box<dyn CodeGenerator>,
    ) -> Self {
        // 1. Repository（インメモリのペアリングハブ）
        let hub = PairingHub::new(config.hub_policy(), generator);
        let repository: Arc<dyn HubRepository> =
            Arc::new(InMemoryHubRepository::new(Arc::new(Mutex::new(hub))));

        // 2. MessagePusher（WebSocket 実装）
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new(
            Arc::new(Mutex::new(HashMap::new())),
        ));

        // 3. UseCases
        let disconnect_session_usecase = Arc::new(DisconnectSessionUseCase::new(
            repository.clone(),
            message_pusher.clone(),
        ));
        let sweep_usecase = Arc::new(SweepUseCase::new(
            repository.clone(),
            message_pusher.clone(),
            clock.clone(),
            disconnect_session_usecase.clone(),
            config.liveness_timeout_ms(),
        ));
        let app_state = AppState {
            message_pusher: message_pusher.clone(),
            connect_session_usecase: Arc::new(ConnectSessionUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            disconnect_session_usecase,
            register_identity_usecase: Arc::new(RegisterIdentityUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            heartbeat_usecase: Arc::new(HeartbeatUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            issue_code_usecase: Arc::new(IssueCodeUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            redeem_code_usecase: Arc::new(RedeemCodeUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            approve_pairing_usecase: Arc::new(ApprovePairingUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            reject_pairing_usecase: Arc::new(RejectPairingUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            unpair_usecase: Arc::new(UnpairUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            configure_wall_usecase: Arc::new(ConfigureWallUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            dispatch_sync_usecase: Arc::new(DispatchSyncUseCase::new(
                repository.clone(),
                message_pusher,
                clock.clone(),
            )),
            get_stats_usecase: Arc::new(GetStatsUseCase::new(repository)),
            get_server_time_usecase: Arc::new(GetServerTimeUseCase::new(clock)),
        };

        Self::new(
            app_state,
            sweep_usecase,
            SweepSchedule {
                code_expiry: config.code_sweep_interval,
                liveness: config.liveness_sweep_interval,
            },
        )
    }

    /// Run the server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Tilecast server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sweepers = spawn_sweepers(self.sweep_usecase, self.sweep_schedule);
        let app = router(Arc::new(self.app_state));

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        for sweeper in sweepers {
            sweeper.abort();
        }
        result
    }
}

fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/time", get(get_server_time))
        .route("/api/stats", get(get_stats))
        .route("/health", get(health_check))
        .route("/time", get(get_server_time))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the code expiry and liveness sweeps.
fn spawn_sweepers(sweep: Arc<SweepUseCase>, schedule: SweepSchedule) -> [JoinHandle<()>; 2] {
    let code_sweep = {
        let sweep = sweep.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(schedule.code_expiry.max(MIN_SWEEP_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                sweep.expire_codes().await;
            }
        })
    };

    let liveness_sweep = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(schedule.liveness.max(MIN_SWEEP_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep.evict_stale().await;
        }
    });

    [code_sweep, liveness_sweep]
}
