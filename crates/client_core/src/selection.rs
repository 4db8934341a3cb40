use shared::domain::CandidateRecord;

use crate::ScreeningClient;

impl ScreeningClient {
    pub fn focus_candidate(&self, record: CandidateRecord) {
        self.with_state(|state| state.focused = Some(record));
    }

    pub fn focus_candidate_at(&self, index: usize) -> bool {
        self.with_state(|state| match state.results.records.get(index) {
            Some(record) => {
                state.focused = Some(record.clone());
                true
            }
            None => false,
        })
    }

    pub fn clear_focus(&self) {
        self.with_state(|state| state.focused = None);
    }

    pub fn focused_candidate(&self) -> Option<CandidateRecord> {
        self.with_state(|state| state.focused.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{client_with, record, FakeBackend};

    #[tokio::test]
    async fn focus_follows_user_actions_only() {
        let backend = FakeBackend::signed_in();
        backend
            .results
            .always(Ok(FakeBackend::results_of(vec![record("Ani", 90)])));
        let client = client_with(&backend);
        client.probe().await;

        assert!(client.focus_candidate_at(0));
        assert_eq!(client.focused_candidate().map(|r| r.name), Some("Ani".into()));
        assert!(!client.focus_candidate_at(5));

        client.load_results().await;
        assert!(client.focused_candidate().is_some());

        client.clear_focus();
        assert!(client.focused_candidate().is_none());

        client.focus_candidate(record("Budi", 40));
        assert_eq!(client.state().focused.map(|r| r.overall_fit), Some(40));
    }
}
