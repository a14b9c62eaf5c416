use std::sync::Arc;

use chrono::{Duration, Utc};
use inkubator::config::WorkflowConfig;
use inkubator::workflows::judging::{
    CategoryDraft, CriterionDraft, CriterionId, JudgingError, JudgingService, ScoreSubmission,
    WinnerChange,
};
use inkubator::workflows::memory::{MemoryNotifications, MemoryStore};
use inkubator::workflows::participation::{
    AdminGate, BusinessId, EventDraft, EventStatus, MentorStatus, ParticipationService,
    RegistrationRequest, RegistrationWindow,
};
use inkubator::workflows::{UserId, WorkflowErrorKind};

fn criterion(id: &str, name: &str, weight: i64) -> CriterionDraft {
    CriterionDraft {
        id: Some(CriterionId(id.to_string())),
        name: name.to_string(),
        weight,
    }
}

fn nilai(business: &BusinessId, id: &str, value: i64) -> ScoreSubmission {
    ScoreSubmission {
        business_id: business.clone(),
        criterion_id: CriterionId(id.to_string()),
        nilai: value,
    }
}

#[test]
fn event_runs_from_registration_to_locked_winner() {
    let store = Arc::new(MemoryStore::new());
    let notifications = Arc::new(MemoryNotifications::default());
    let participation =
        ParticipationService::new(store.clone(), notifications.clone(), WorkflowConfig::default());
    let judging = JudgingService::new(store.clone(), store, notifications.clone());

    let now = Utc::now();
    let event = participation
        .create_event(EventDraft {
            name: "Expo Wirausaha Muda".to_string(),
            registration: RegistrationWindow {
                opens_at: now - Duration::hours(1),
                closes_at: now + Duration::days(3),
            },
            quota: Some(10),
        })
        .expect("event created");
    participation
        .change_event_status(&event.id, EventStatus::Terbuka)
        .expect("registration opened");

    let mentor = UserId::new("dosen-pembina");
    let student = participation
        .register(
            &event.id,
            RegistrationRequest::Mahasiswa {
                name: "Sambal Kampus".to_string(),
                owner_id: UserId::new("mhs-101"),
                mentor_id: mentor.clone(),
            },
        )
        .expect("student registered");
    let external = participation
        .register(
            &event.id,
            RegistrationRequest::UmkmLuar {
                name: "Tenun Ikat Lestari".to_string(),
                owner_name: "Ibu Lestari".to_string(),
                registered_by: UserId::new("admin-expo"),
            },
        )
        .expect("external registered");

    let student = participation
        .mentor_approve(&student.id, &mentor)
        .expect("mentor approves");
    assert_eq!(student.mentor_status(), Some(MentorStatus::Disetujui));
    let student = participation
        .admin_approve(&student.id)
        .expect("admin approves student");
    let external = participation
        .admin_approve(&external.id)
        .expect("admin approves external");
    assert!(matches!(external.admin, AdminGate::Disetujui { .. }));

    participation
        .assign_booth(&student.id, "A-01")
        .expect("booth for student");
    participation
        .assign_booth(&external.id, "A-02")
        .expect("booth for external");

    let category = judging
        .create_category(
            &event.id,
            CategoryDraft {
                name: "Inovasi Produk".to_string(),
                criteria: vec![
                    criterion("k1", "Inovasi", 40),
                    criterion("k2", "Pasar", 35),
                    criterion("k3", "Presentasi", 25),
                ],
                evaluators: vec![UserId::new("juri-1")],
            },
        )
        .expect("category created");
    assert!(judging
        .validate_criteria(&category.id)
        .expect("report")
        .valid);

    participation
        .change_event_status(&event.id, EventStatus::Berlangsung)
        .expect("event running");

    let juri = UserId::new("juri-1");
    let batch = judging
        .submit_scores(
            &category.id,
            &juri,
            vec![
                nilai(&student.id, "k1", 80),
                nilai(&student.id, "k2", 60),
                nilai(&student.id, "k3", 60),
                nilai(&external.id, "k1", 90),
                nilai(&external.id, "k2", 70),
                nilai(&external.id, "k3", 101),
            ],
        )
        .expect("batch processed");
    assert_eq!(batch.accepted, 5);
    assert_eq!(batch.rejected.len(), 1);
    assert_eq!(batch.rejected[0].index, 5);

    let ranking = judging.ranking(&category.id).expect("ranking");
    assert_eq!(ranking.entries[0].business_id, student.id);
    assert_eq!(ranking.entries[0].total_score, 68.0);
    assert!(ranking.entries[0].complete);
    assert_eq!(ranking.entries[1].business_id, external.id);
    assert_eq!(ranking.entries[1].total_score, 60.5);
    assert!(!ranking.entries[1].complete);
    assert_eq!(ranking.suggested_winner.as_ref(), Some(&student.id));

    participation
        .change_event_status(&event.id, EventStatus::Selesai)
        .expect("event finished");
    let outcome = judging
        .set_winner(&category.id, &student.id, &UserId::new("admin-expo"))
        .expect("winner selected");
    assert_eq!(outcome.change, WinnerChange::Selected);
    assert!(notifications
        .templates()
        .iter()
        .any(|template| template == "category_winner_selected"));

    participation
        .set_event_lock(&event.id, true)
        .expect("event locked");
    let error = judging
        .set_winner(&category.id, &external.id, &UserId::new("admin-expo"))
        .expect_err("locked categories keep their winner");
    assert!(matches!(error, JudgingError::CategoryLocked { .. }));
    assert_eq!(error.kind(), WorkflowErrorKind::Locked);
    assert_eq!(
        judging.category(&category.id).expect("category").winner_id(),
        Some(&student.id)
    );
}
