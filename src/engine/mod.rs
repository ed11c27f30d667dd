pub mod orchestrator;
pub mod session;

pub use orchestrator::{FetchTicket, FetchWindow, QueryOrchestrator, build_query, fetch_window};
pub use session::{
    Session, SessionHandle, SessionInbox, SessionSettings, UiEvent, View, run_session,
    spawn_session,
};
