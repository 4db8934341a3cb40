use super::*;
use std::time::Duration;

use shared::protocol::{SetScreeningConfigRequest, SetScreeningConfigResponse};

use crate::{
    error::{ErrorKind, ValidationError},
    test_support::{client_with, detail, status_error, FakeBackend},
};

fn saved_sheet() -> SetScreeningConfigResponse {
    SetScreeningConfigResponse {
        spreadsheet_name: "Analisis Resume AI - UI/UX Designer".into(),
        spreadsheet_url: "https://docs.google.com/spreadsheets/d/sheet-1".into(),
    }
}

#[tokio::test]
async fn saving_sends_exactly_the_draft() {
    let backend = FakeBackend::signed_in();
    backend.save.push(Ok(saved_sheet()));
    let client = client_with(&backend);
    client.probe().await;
    let mut events = client.subscribe_events();

    client.set_job_position("UI/UX Designer");
    assert!(client.update_subject(0, "cv-ui/ux"));
    client.save_config().await.expect("saved");

    assert_eq!(
        backend.saved_requests.lock().expect("requests").as_slice(),
        [SetScreeningConfigRequest {
            job_position: "UI/UX Designer".into(),
            email_subjects: vec!["cv-ui/ux".into()],
        }]
    );
    let state = client.state();
    assert!(state.config.saved);
    assert_eq!(state.config.spreadsheet_name, "Analisis Resume AI - UI/UX Designer");
    assert_eq!(
        state.config.spreadsheet_url,
        "https://docs.google.com/spreadsheets/d/sheet-1"
    );
    assert_eq!(state.config_status.as_deref(), Some(CONFIG_SAVED));
    assert!(!state.busy.saving_config);
    assert_eq!(events.try_recv().expect("event"), ClientEvent::ConfigChanged);
}

#[tokio::test]
async fn saving_trims_and_skips_blank_subjects() {
    let backend = FakeBackend::signed_in();
    backend.save.push(Ok(saved_sheet()));
    let client = client_with(&backend);

    client.set_job_position("  Data Analyst ");
    client.update_subject(0, "  cv data ");
    client.add_subject();
    client.add_subject();
    client.update_subject(2, "resume");
    client.save_config().await.expect("saved");

    let requests = backend.saved_requests.lock().expect("requests").clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].job_position, "Data Analyst");
    assert_eq!(requests[0].email_subjects, vec!["cv data", "resume"]);
    // The draft itself is left as typed.
    assert_eq!(client.state().config.email_subjects.len(), 3);
}

#[tokio::test]
async fn invalid_draft_never_reaches_the_server() {
    let backend = FakeBackend::signed_in();
    let client = client_with(&backend);

    let err = client.save_config().await.expect_err("empty position");
    assert_eq!(err, OperationError::Validation(ValidationError::EmptyJobPosition));

    client.set_job_position("QA Engineer");
    client.update_subject(0, "   ");
    let err = client.save_config().await.expect_err("blank subjects");
    assert_eq!(err, OperationError::Validation(ValidationError::NoEmailSubjects));

    assert_eq!(backend.save.calls(), 0);
    let state = client.state();
    assert!(state.config_status.is_none());
    assert!(!state.busy.saving_config);
}

#[tokio::test]
async fn failed_save_reports_error_and_stays_unsaved() {
    let backend = FakeBackend::signed_in();
    backend
        .save
        .push(Err(status_error(400, detail("Invalid job position"))));
    let client = client_with(&backend);
    client.set_job_position("UI/UX Designer");
    client.update_subject(0, "cv-ui/ux");

    let err = client.save_config().await.expect_err("400");

    assert_eq!(err.kind(), Some(ErrorKind::OtherStatus));
    let state = client.state();
    assert!(!state.config.saved);
    assert_eq!(
        state.config_status.as_deref(),
        Some("Error: Error 400: Invalid job position")
    );
    assert!(!state.busy.saving_config);
}

#[tokio::test]
async fn expired_session_during_save_signs_out() {
    let backend = FakeBackend::signed_in();
    backend.save.push(Err(status_error(401, None)));
    let client = client_with(&backend);
    client.probe().await;
    client.set_job_position("UI/UX Designer");
    client.update_subject(0, "cv-ui/ux");

    let err = client.save_config().await.expect_err("401");

    assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
    assert!(!client.state().session.authenticated);
}

#[tokio::test]
async fn failed_reload_keeps_saved_configuration() {
    let backend = FakeBackend::ready_to_run();
    let client = client_with(&backend);
    client.probe().await;
    assert!(client.state().config.saved);

    backend.config.push(Err(status_error(500, None)));
    client.load_config().await;

    let state = client.state();
    assert!(state.config.saved);
    assert_eq!(state.config.job_position, "UI/UX Designer");
    assert!(state.page_error.is_none());
}

#[tokio::test]
async fn loaded_job_description_marks_upload_done() {
    let backend = FakeBackend::ready_to_run();
    let client = client_with(&backend);

    client.load_config().await;

    assert_eq!(
        client.state().upload_status,
        UploadStatus::Succeeded(JOB_DESCRIPTION_AVAILABLE.into())
    );
}

#[tokio::test]
async fn last_subject_cannot_be_removed() {
    let backend = FakeBackend::signed_in();
    let client = client_with(&backend);

    assert!(!client.remove_subject(0));
    client.add_subject();
    assert!(client.remove_subject(1));
    assert!(!client.remove_subject(0));
    assert!(!client.update_subject(4, "x"));
    assert_eq!(client.state().config.email_subjects.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn saved_notice_clears_after_five_seconds() {
    let backend = FakeBackend::signed_in();
    backend.save.always(Ok(saved_sheet()));
    let client = client_with(&backend);
    client.set_job_position("UI/UX Designer");
    client.update_subject(0, "cv-ui/ux");
    client.save_config().await.expect("saved");

    tokio::time::sleep(Duration::from_millis(4900)).await;
    assert_eq!(client.state().config_status.as_deref(), Some(CONFIG_SAVED));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(client.state().config_status.is_none());
}

#[tokio::test(start_paused = true)]
async fn newer_notice_survives_earlier_timer() {
    let backend = FakeBackend::signed_in();
    backend.save.push(Ok(saved_sheet()));
    backend.save.push(Err(status_error(503, None)));
    let client = client_with(&backend);
    client.set_job_position("UI/UX Designer");
    client.update_subject(0, "cv-ui/ux");
    client.save_config().await.expect("saved");

    tokio::time::sleep(Duration::from_secs(1)).await;
    client.save_config().await.expect_err("503");

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(
        client.state().config_status.as_deref(),
        Some("Error: Server error: Request failed with status code 503")
    );
}

#[tokio::test(start_paused = true)]
async fn logout_voids_pending_notice_timer() {
    let backend = FakeBackend::signed_in();
    backend.save.always(Ok(saved_sheet()));
    let client = client_with(&backend);
    client.probe().await;
    client.set_job_position("UI/UX Designer");
    client.update_subject(0, "cv-ui/ux");
    client.save_config().await.expect("saved");

    tokio::time::sleep(Duration::from_secs(1)).await;
    client.logout().await;
    client.probe().await;
    client.set_job_position("Data Analyst");
    client.update_subject(0, "cv-data");
    tokio::time::sleep(Duration::from_secs(2)).await;
    client.save_config().await.expect("saved again");

    // The first timer fires at 5s; the second save's notice must outlive it.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(client.state().config_status.as_deref(), Some(CONFIG_SAVED));
}
