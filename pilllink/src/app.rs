//! Application state and initialization
//!
//! Loads settings, selects the backing store and builds the services.

use crate::api::ApiClient;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{AppSettings, Backend, MedicationService, RemindersService, SettingsService};
use crate::stores::{FamilyRepository, MedicationStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub settings: AppSettings,
    pub medication: MedicationService,
    pub reminders: RemindersService,
    /// Only available with the local store
    pub family: Option<Arc<dyn FamilyRepository>>,
}

impl AppState {
    /// Initialize state from the settings in `data_dir`
    pub async fn init(data_dir: PathBuf) -> Result<Self> {
        tracing::info!("Data directory: {:?}", data_dir);
        tokio::fs::create_dir_all(&data_dir).await?;

        let settings = SettingsService::new(data_dir.clone()).load().await?;

        let (store, family): (Arc<dyn MedicationStore>, Option<Arc<dyn FamilyRepository>>) =
            match settings.backend {
                Backend::Local => {
                    let pool = create_pool(&data_dir.join("pilllink.db")).await?;
                    let repo = Arc::new(Repository::new(pool));
                    let family = repo.clone() as Arc<dyn FamilyRepository>;
                    (repo as Arc<dyn MedicationStore>, Some(family))
                }
                Backend::Remote => {
                    tracing::info!("Using backend at {}", settings.api.base_url);
                    let client =
                        ApiClient::new(&settings.api.base_url, settings.api.session_token.clone())?;
                    (Arc::new(client) as Arc<dyn MedicationStore>, None)
                }
            };

        let medication = MedicationService::from_settings(store, &settings);
        let reminders = RemindersService::new(medication.clone(), settings.reminders.target_member_id);

        tracing::info!("Application initialized successfully");

        Ok(Self {
            data_dir,
            settings,
            medication,
            reminders,
            family,
        })
    }
}
