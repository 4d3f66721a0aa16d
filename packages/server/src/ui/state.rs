//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::MessagePusher,
    usecase::{
        ApprovePairingUseCase, ConfigureWallUseCase, ConnectSessionUseCase,
        DisconnectSessionUseCase, DispatchSyncUseCase, GetServerTimeUseCase, GetStatsUseCase,
        HeartbeatUseCase, IssueCodeUseCase, RedeemCodeUseCase, RegisterIdentityUseCase,
        RejectPairingUseCase, UnpairUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// MessagePusher（DTO 変換エラーの通知に使う）
    pub message_pusher: Arc<dyn MessagePusher>,
    /// ConnectSessionUseCase（接続受付のユースケース）
    pub connect_session_usecase: Arc<ConnectSessionUseCase>,
    /// DisconnectSessionUseCase（切断のユースケース）
    pub disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    /// RegisterIdentityUseCase（ロール登録のユースケース）
    pub register_identity_usecase: Arc<RegisterIdentityUseCase>,
    /// HeartbeatUseCase（生存確認のユースケース）
    pub heartbeat_usecase: Arc<HeartbeatUseCase>,
    /// IssueCodeUseCase（ペアリングコード発行のユースケース）
    pub issue_code_usecase: Arc<IssueCodeUseCase>,
    /// RedeemCodeUseCase（ペアリングコード入力のユースケース）
    pub redeem_code_usecase: Arc<RedeemCodeUseCase>,
    /// ApprovePairingUseCase（承認のユースケース）
    pub approve_pairing_usecase: Arc<ApprovePairingUseCase>,
    /// RejectPairingUseCase（拒否のユースケース）
    pub reject_pairing_usecase: Arc<RejectPairingUseCase>,
    /// UnpairUseCase（ペアリング解除のユースケース）
    pub unpair_usecase: Arc<UnpairUseCase>,
    /// ConfigureWallUseCase（ウォール設定のユースケース）
    pub configure_wall_usecase: Arc<ConfigureWallUseCase>,
    /// DispatchSyncUseCase（同期再生のユースケース）
    pub dispatch_sync_usecase: Arc<DispatchSyncUseCase>,
    /// GetStatsUseCase（統計情報取得のユースケース）
    pub get_stats_usecase: Arc<GetStatsUseCase>,
    /// GetServerTimeUseCase（サーバー時刻取得のユースケース）
    pub get_server_time_usecase: Arc<GetServerTimeUseCase>,
}
