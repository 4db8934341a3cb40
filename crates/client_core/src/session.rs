use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    error::classify,
    state::{BusyFlag, NoticeSlot},
    BusyGuard, ClientEvent, ScreeningClient,
};

pub const LOGOUT_SUCCEEDED: &str = "Logout successful!";
pub const LOGOUT_COMPLETED: &str = "Logout completed!";

impl ScreeningClient {
    pub async fn probe(&self) -> bool {
        let _checking = self.enter(BusyFlag::CheckingAuth);
        let epoch = self.epoch();

        match self.backend.auth_status().await {
            Ok(status) => {
                let authenticated = status.authenticated;
                if !self.apply_if_current(epoch, |state| {
                    state.session.authenticated = authenticated;
                }) {
                    return false;
                }
                info!(authenticated, "auth status resolved");
                self.emit(ClientEvent::SessionChanged { authenticated });

                if authenticated {
                    self.load_config().await;
                    self.load_results().await;
                }
                authenticated
            }
            Err(err) => {
                let classified = classify(&err, "Failed to fetch authentication status");
                warn!(error = %err, kind = ?classified.kind, "auth status probe failed");
                if self.apply_if_current(epoch, |state| {
                    state.session.authenticated = false;
                    state.page_error = Some(classified.message.clone());
                }) {
                    self.emit(ClientEvent::SessionChanged {
                        authenticated: false,
                    });
                }
                false
            }
        }
    }

    pub async fn logout(self: &Arc<Self>) -> String {
        self.with_state(|state| state.mark_busy(BusyFlag::LoggingOut));
        let _logging_out = BusyGuard::new(self, BusyFlag::LoggingOut, None);

        let notice = match self.backend.logout().await {
            Ok(()) => LOGOUT_SUCCEEDED,
            Err(err) => {
                warn!(error = %err, "remote logout failed; resetting local state anyway");
                LOGOUT_COMPLETED
            }
        };

        self.abort_pending_refresh();
        let generation = self.with_state(|state| {
            state.reset();
            state.set_notice(NoticeSlot::Screening, notice)
        });
        self.arm_notice_expiry(
            NoticeSlot::Screening,
            generation,
            self.options.timings.logout_notice,
        );
        info!("session reset after logout");
        self.emit(ClientEvent::SessionChanged {
            authenticated: false,
        });
        notice.to_string()
    }

    pub async fn check_server(&self) -> bool {
        match self.backend.health().await {
            Ok(()) => {
                info!("screening api reachable");
                true
            }
            Err(err) => {
                let classified = classify(&err, "Server health check failed");
                warn!(error = %err, "screening api health check failed");
                self.with_state(|state| state.page_error = Some(classified.message));
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
