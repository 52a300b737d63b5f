use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use getjobandgo::board::{
    BoardError, BoardService, IdentityProvider, InMemoryBoardStore, InMemorySessions, Profile,
    Session,
};
use getjobandgo::config::AdminSeedConfig;

pub(crate) type Board = BoardService<InMemoryBoardStore, InMemorySessions>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The seeded administrator and the bearer token that authenticates it.
pub(crate) struct SeededAdmin {
    pub(crate) profile: Profile,
    pub(crate) token: String,
    pub(crate) generated: bool,
}

pub(crate) fn in_memory_board() -> (Arc<Board>, Arc<InMemorySessions>) {
    let store = Arc::new(InMemoryBoardStore::default());
    let sessions = Arc::new(InMemorySessions::default());
    let board = Arc::new(BoardService::new(store, Arc::clone(&sessions)));
    (board, sessions)
}

/// Ensure the configured administrator exists and holds a usable session.
pub(crate) fn seed_admin(
    board: &Board,
    sessions: &InMemorySessions,
    config: &AdminSeedConfig,
) -> Result<SeededAdmin, BoardError> {
    let profile = board.bootstrap_admin(&config.email, "Administrator")?;
    match &config.token {
        Some(token) => {
            sessions.insert_token(token.clone(), Session::from(&profile))?;
            Ok(SeededAdmin {
                profile,
                token: token.clone(),
                generated: false,
            })
        }
        None => {
            let token = sessions.issue(&profile)?;
            Ok(SeededAdmin {
                profile,
                token,
                generated: true,
            })
        }
    }
}
