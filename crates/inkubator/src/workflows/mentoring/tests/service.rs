use super::common::*;
use crate::workflows::errors::WorkflowErrorKind;
use crate::workflows::mentoring::{MentoringError, StageRefusal, StageStatus};

#[test]
fn new_umkm_starts_at_stage_one_with_nothing_started() {
    let (service, _) = build_service();
    let umkm = registered(&service);

    assert_eq!(umkm.current_stage, tahap(1));
    assert!(umkm
        .stages
        .iter()
        .all(|stage| stage.status == StageStatus::BelumDimulai));
}

#[test]
fn uploading_ahead_of_the_current_stage_fails() {
    let (service, _) = build_service();
    let umkm = registered(&service);
    advance_to(&service, &umkm, 2);

    match service.upload_files(&umkm.id, tahap(3), &owner(), uploads(&["loncat.pdf"])) {
        Err(error @ MentoringError::InvalidTransition { .. }) => {
            assert_eq!(error.kind(), WorkflowErrorKind::InvalidTransition);
            let current = error.current_state().expect("current state");
            assert_eq!(current["tahap_saat_ini"], 2);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }

    let stored = service.umkm(&umkm.id).expect("stored");
    assert_eq!(stored.stage(tahap(3)).status, StageStatus::BelumDimulai);
}

#[test]
fn approving_current_stage_advances_pointer() {
    let (service, notifications) = build_service();
    let umkm = registered(&service);
    advance_to(&service, &umkm, 2);
    submit(&service, &umkm, 2);

    let approved = service
        .validate(&umkm.id, tahap(2), &admin(), true, Some("lengkap".to_string()))
        .expect("approved");

    assert_eq!(approved.stage(tahap(2)).status, StageStatus::Selesai);
    assert_eq!(approved.current_stage, tahap(3));
    assert_eq!(approved.stage(tahap(2)).validated_by, Some(admin()));
    assert!(notifications
        .templates()
        .iter()
        .any(|template| template == "stage_approved"));
}

#[test]
fn rejection_keeps_files_and_stores_catatan() {
    let (service, notifications) = build_service();
    let umkm = registered(&service);
    advance_to(&service, &umkm, 2);
    let waiting = submit(&service, &umkm, 2);
    let files_before = waiting.stage(tahap(2)).files.clone();

    let rejected = service
        .validate(
            &umkm.id,
            tahap(2),
            &admin(),
            false,
            Some("perbaiki dokumen".to_string()),
        )
        .expect("rejected");

    let stage = rejected.stage(tahap(2));
    assert_eq!(stage.status, StageStatus::SedangProses);
    assert_eq!(stage.files, files_before);
    assert_eq!(stage.catatan.as_deref(), Some("perbaiki dokumen"));
    assert_eq!(rejected.current_stage, tahap(2));

    let last = notifications.events().pop().expect("notification sent");
    assert_eq!(last.template, "stage_rejected");
    assert_eq!(
        last.details.get("catatan").map(String::as_str),
        Some("perbaiki dokumen")
    );

    let resubmitted = service
        .upload_files(&umkm.id, tahap(2), &owner(), uploads(&["revisi.pdf"]))
        .expect("owner adds files after rejection");
    assert_eq!(resubmitted.stage(tahap(2)).files.len(), 2);
}

#[test]
fn uploads_guess_content_types() {
    let (service, _) = build_service();
    let umkm = registered(&service);

    let updated = service
        .upload_files(
            &umkm.id,
            tahap(1),
            &owner(),
            uploads(&["proposal.pdf", "foto-produk.png", "catatan"]),
        )
        .expect("uploaded");

    let types: Vec<&str> = updated
        .stage(tahap(1))
        .files
        .iter()
        .map(|file| file.content_type.as_str())
        .collect();
    assert_eq!(
        types,
        vec!["application/pdf", "image/png", "application/octet-stream"]
    );
}

#[test]
fn validation_request_needs_files_owner_and_current_stage() {
    let (service, _) = build_service();
    let umkm = registered(&service);

    match service.request_validation(&umkm.id, tahap(1), &owner()) {
        Err(MentoringError::InvalidTransition { refusal, .. }) => assert_eq!(
            refusal,
            StageRefusal::Status {
                tahap: tahap(1),
                status: StageStatus::BelumDimulai,
            }
        ),
        other => panic!("expected invalid transition, got {other:?}"),
    }

    let error = service
        .upload_files(&umkm.id, tahap(1), &admin(), uploads(&["a.pdf"]))
        .expect_err("only the owner uploads");
    assert_eq!(error.kind(), WorkflowErrorKind::Forbidden);

    let error = service
        .upload_files(&umkm.id, tahap(1), &owner(), Vec::new())
        .expect_err("empty upload");
    assert_eq!(error.kind(), WorkflowErrorKind::Validation);
}

#[test]
fn validate_requires_a_waiting_stage() {
    let (service, _) = build_service();
    let umkm = registered(&service);
    service
        .upload_files(&umkm.id, tahap(1), &owner(), uploads(&["a.pdf"]))
        .expect("uploaded");

    let error = service
        .validate(&umkm.id, tahap(1), &admin(), true, None)
        .expect_err("not waiting");
    assert_eq!(error.kind(), WorkflowErrorKind::InvalidTransition);
}

#[test]
fn completing_stage_four_keeps_pointer_at_four() {
    let (service, _) = build_service();
    let umkm = registered(&service);
    advance_to(&service, &umkm, 4);
    submit(&service, &umkm, 4);

    let finished = service
        .validate(&umkm.id, tahap(4), &admin(), true, None)
        .expect("approved");

    assert_eq!(finished.current_stage, tahap(4));
    assert!(finished.is_complete());
}

#[test]
fn validation_queue_lists_waiting_stages_oldest_first() {
    let (service, _) = build_service();
    let first = registered(&service);
    let second = registered(&service);
    let idle = registered(&service);
    submit(&service, &first, 1);
    submit(&service, &second, 1);
    service
        .upload_files(&idle.id, tahap(1), &owner(), uploads(&["draft.pdf"]))
        .expect("in progress only");

    let queue = service.validation_queue().expect("queue");
    let ids: Vec<_> = queue.iter().map(|entry| entry.umkm_id.clone()).collect();

    assert_eq!(ids, vec![first.id, second.id]);
    assert!(queue.iter().all(|entry| entry.files == 1));
}
