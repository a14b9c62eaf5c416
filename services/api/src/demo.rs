use crate::infra::WorkflowServices;
use chrono::{Duration, Utc};
use clap::Args;
use inkubator::config::WorkflowConfig;
use inkubator::error::AppError;
use inkubator::workflows::judging::{
    CategoryDraft, CriterionDraft, CriterionId, ScoreSheetImporter, ScoreSubmission,
};
use inkubator::workflows::memory::MemoryNotifications;
use inkubator::workflows::mentoring::{FileUpload, Tahap, UmkmRegistration};
use inkubator::workflows::participation::{
    Business, EventDraft, EventStatus, RegistrationRequest, RegistrationWindow,
};
use inkubator::workflows::UserId;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// CSV score sheet (business_id,criterion_id,nilai) used instead of the built-in scores.
    /// Demo businesses are registered as usaha-000001 through usaha-000003 and the criteria
    /// are k1 (Inovasi), k2 (Pasar) and k3 (Presentasi).
    #[arg(long)]
    pub(crate) score_sheet: Option<PathBuf>,
    /// Skip the UMKM mentoring portion of the demo.
    #[arg(long)]
    pub(crate) skip_mentoring: bool,
}

/// Print the failure and hand back `None` so the demo can stop cleanly.
fn step<T, E: Display>(label: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            println!("  {label} failed: {err}");
            None
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        score_sheet,
        skip_mentoring,
    } = args;

    // Parse the sheet up front so a bad file fails before anything is printed.
    let imported = score_sheet
        .map(|path| {
            ScoreSheetImporter::from_path(&path)
                .map_err(|source| AppError::score_sheet_file(path, source))
        })
        .transpose()?;

    let notifications = Arc::new(MemoryNotifications::default());
    let services = WorkflowServices::in_memory(notifications.clone(), WorkflowConfig::default());
    let admin = UserId::new("admin-inkubator");
    let mentor = UserId::new("dosen-pembina");
    let juri = UserId::new("dosen-juri");

    println!("Inkubator workflow demo");
    let participation = &services.participation;
    let now = Utc::now();
    let Some(event) = step(
        "Event creation",
        participation.create_event(EventDraft {
            name: "Expo Wirausaha Kampus".to_string(),
            registration: RegistrationWindow {
                opens_at: now - Duration::hours(1),
                closes_at: now + Duration::days(14),
            },
            quota: Some(20),
        }),
    ) else {
        return Ok(());
    };
    let Some(event) = step(
        "Opening registration",
        participation.change_event_status(&event.id, EventStatus::Terbuka),
    ) else {
        return Ok(());
    };
    println!("- Event {} '{}' is {}", event.id, event.name, event.status);

    let requests = vec![
        RegistrationRequest::Mahasiswa {
            name: "Kopi Kampus".to_string(),
            owner_id: UserId::new("mhs-001"),
            mentor_id: mentor.clone(),
        },
        RegistrationRequest::Mahasiswa {
            name: "Sambal Roa Mahasiswa".to_string(),
            owner_id: UserId::new("mhs-002"),
            mentor_id: mentor.clone(),
        },
        RegistrationRequest::UmkmLuar {
            name: "Batik Tulis Sekar".to_string(),
            owner_name: "Ibu Sekar".to_string(),
            registered_by: admin.clone(),
        },
    ];

    println!("\nParticipation approvals");
    let mut participants: Vec<Business> = Vec::new();
    for (index, request) in requests.into_iter().enumerate() {
        let Some(business) = step("Registration", participation.register(&event.id, request))
        else {
            return Ok(());
        };
        let business = if business.mentor_id().is_some() {
            match step("Mentor approval", participation.mentor_approve(&business.id, &mentor)) {
                Some(business) => business,
                None => return Ok(()),
            }
        } else {
            business
        };
        let Some(business) = step("Admin approval", participation.admin_approve(&business.id))
        else {
            return Ok(());
        };
        let booth = format!("B-{:02}", index + 1);
        let Some(business) = step("Booth", participation.assign_booth(&business.id, &booth)) else {
            return Ok(());
        };
        let view = business.view();
        println!(
            "- {} {} ({:?}) -> disetujui {:?}, booth {}",
            view.business_id,
            view.name,
            view.kind,
            view.disetujui,
            view.booth_number.as_deref().unwrap_or("-")
        );
        participants.push(business);
    }

    println!("\nJudging");
    let judging = &services.judging;
    let criteria = [("k1", "Inovasi", 40), ("k2", "Pasar", 35), ("k3", "Presentasi", 25)]
        .into_iter()
        .map(|(id, name, weight)| CriterionDraft {
            id: Some(CriterionId(id.to_string())),
            name: name.to_string(),
            weight,
        })
        .collect();
    let Some(category) = step(
        "Category creation",
        judging.create_category(
            &event.id,
            CategoryDraft {
                name: "Produk Paling Inovatif".to_string(),
                criteria,
                evaluators: vec![juri.clone()],
            },
        ),
    ) else {
        return Ok(());
    };
    let Some(report) = step("Criteria check", judging.validate_criteria(&category.id)) else {
        return Ok(());
    };
    println!(
        "- Category {} '{}' weights sum to {} (valid: {})",
        category.id, category.name, report.total_weight, report.valid
    );

    if step(
        "Starting the event",
        participation.change_event_status(&event.id, EventStatus::Berlangsung),
    )
    .is_none()
    {
        return Ok(());
    }

    let submissions = match imported {
        Some(rows) => {
            println!("- Using {} rows from the score sheet", rows.len());
            rows
        }
        None => built_in_scores(&participants),
    };
    let Some(outcome) = step(
        "Scoring",
        judging.submit_scores(&category.id, &juri, submissions),
    ) else {
        return Ok(());
    };
    println!(
        "- {} scores accepted, {} rejected",
        outcome.accepted,
        outcome.rejected.len()
    );
    for rejected in &outcome.rejected {
        println!(
            "  - row {} ({} / {}): {} {}",
            rejected.index + 1,
            rejected.business_id,
            rejected.criterion_id,
            rejected.code,
            rejected.error
        );
    }

    let Some(ranking) = step("Ranking", judging.ranking(&category.id)) else {
        return Ok(());
    };
    println!("Ranking:");
    for entry in &ranking.entries {
        println!(
            "  {}. {} {:.2} ({} of {} criteria scored)",
            entry.rank,
            entry.business_name,
            entry.total_score,
            entry.scored_criteria,
            entry.per_criterion.len()
        );
    }

    if step(
        "Closing the event",
        participation.change_event_status(&event.id, EventStatus::Selesai),
    )
    .is_none()
    {
        return Ok(());
    }
    match ranking.suggested_winner {
        Some(business_id) => {
            let Some(outcome) = step(
                "Winner selection",
                judging.set_winner(&category.id, &business_id, &admin),
            ) else {
                return Ok(());
            };
            println!("- Winner {business_id} ({:?})", outcome.change);
        }
        None => println!("- No scored business to pick as winner"),
    }
    if step("Locking", participation.set_event_lock(&event.id, true)).is_some() {
        println!("- Event locked; further changes are refused");
    }

    if !skip_mentoring {
        run_mentoring(&services, &admin);
    }

    println!("\nNotifications sent");
    for notification in notifications.events() {
        println!(
            "- {} -> {} ({})",
            notification.template, notification.recipient, notification.subject_id
        );
    }

    Ok(())
}

fn built_in_scores(participants: &[Business]) -> Vec<ScoreSubmission> {
    let sheet: [[i64; 3]; 3] = [[80, 60, 60], [75, 90, 70], [88, 72, 101]];
    participants
        .iter()
        .zip(sheet)
        .flat_map(|(business, row)| {
            ["k1", "k2", "k3"]
                .into_iter()
                .zip(row)
                .map(|(criterion, nilai)| ScoreSubmission {
                    business_id: business.id.clone(),
                    criterion_id: CriterionId(criterion.to_string()),
                    nilai,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn run_mentoring(services: &WorkflowServices<MemoryNotifications>, admin: &UserId) {
    println!("\nUMKM mentoring");
    let mentoring = &services.mentoring;
    let owner = UserId::new("pemilik-keripik");
    let Some(umkm) = step(
        "UMKM registration",
        mentoring.register(UmkmRegistration {
            owner_id: owner.clone(),
            name: "Keripik Tempe Bu Ani".to_string(),
        }),
    ) else {
        return;
    };
    println!("- {} '{}' starts at tahap {}", umkm.id, umkm.name, umkm.current_stage);

    let upload = |name: &str| FileUpload {
        name: name.to_string(),
        url: format!("https://storage.inkubator.test/{}/{name}", umkm.id),
    };

    let early = mentoring.upload_files(&umkm.id, Tahap::LAST, &owner, vec![upload("x.pdf")]);
    if let Err(err) = early {
        println!("- Uploading to tahap {} early is refused: {err}", Tahap::LAST);
    }

    let mut current = umkm.current_stage;
    for (tahap, file) in Tahap::all().zip(["profil-usaha.pdf", "rencana-bisnis.pdf"]) {
        if step(
            "Upload",
            mentoring.upload_files(&umkm.id, tahap, &owner, vec![upload(file)]),
        )
        .is_none()
            || step(
                "Validation request",
                mentoring.request_validation(&umkm.id, tahap, &owner),
            )
            .is_none()
        {
            return;
        }
        let Some(updated) = step(
            "Validation",
            mentoring.validate(&umkm.id, tahap, admin, true, Some("lengkap".to_string())),
        ) else {
            return;
        };
        println!(
            "- Tahap {} {} -> tahap_saat_ini {}",
            tahap,
            updated.stage(tahap).status,
            updated.current_stage
        );
        current = updated.current_stage;
    }

    let queued = step(
        "Upload",
        mentoring.upload_files(&umkm.id, current, &owner, vec![upload("laporan-keuangan.xlsx")]),
    )
    .and_then(|_| {
        step(
            "Validation request",
            mentoring.request_validation(&umkm.id, current, &owner),
        )
    });
    if queued.is_none() {
        return;
    }
    if let Some(queue) = step("Validation queue", mentoring.validation_queue()) {
        for entry in queue {
            println!(
                "- Waiting: {} tahap {} ({} files)",
                entry.umkm_name, entry.tahap, entry.files
            );
        }
    }
}
