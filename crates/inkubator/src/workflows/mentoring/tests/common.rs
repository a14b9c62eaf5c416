use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::actors::UserId;
use crate::workflows::memory::{MemoryNotifications, MemoryStore};
use crate::workflows::mentoring::domain::{FileUpload, Tahap, Umkm, UmkmRegistration};
use crate::workflows::mentoring::MentoringService;

pub(super) type MemoryService = MentoringService<MemoryStore, MemoryNotifications>;

pub(super) fn build_service() -> (MemoryService, Arc<MemoryNotifications>) {
    let notifications = Arc::new(MemoryNotifications::default());
    let service = MentoringService::new(Arc::new(MemoryStore::new()), notifications.clone());
    (service, notifications)
}

pub(super) fn owner() -> UserId {
    UserId::new("pemilik-umkm")
}

pub(super) fn admin() -> UserId {
    UserId::new("admin-inkubator")
}

pub(super) fn tahap(value: u8) -> Tahap {
    Tahap::new(value).expect("valid tahap")
}

pub(super) fn uploads(names: &[&str]) -> Vec<FileUpload> {
    names
        .iter()
        .map(|name| FileUpload {
            name: name.to_string(),
            url: format!("https://storage.example.test/umkm/{name}"),
        })
        .collect()
}

pub(super) fn registered(service: &MemoryService) -> Umkm {
    service
        .register(UmkmRegistration {
            owner_id: owner(),
            name: "Keripik Tempe Bu Ani".to_string(),
        })
        .expect("umkm registered")
}

/// Upload a file to `value` and ask for validation.
pub(super) fn submit(service: &MemoryService, umkm: &Umkm, value: u8) -> Umkm {
    service
        .upload_files(&umkm.id, tahap(value), &owner(), uploads(&["laporan.pdf"]))
        .expect("uploaded");
    service
        .request_validation(&umkm.id, tahap(value), &owner())
        .expect("validation requested")
}

/// Drive the UMKM until `tahap_saat_ini` equals `value`.
pub(super) fn advance_to(service: &MemoryService, umkm: &Umkm, value: u8) -> Umkm {
    let mut current = umkm.clone();
    for stage in 1..value {
        submit(service, umkm, stage);
        current = service
            .validate(&umkm.id, tahap(stage), &admin(), true, None)
            .expect("approved");
    }
    current
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
