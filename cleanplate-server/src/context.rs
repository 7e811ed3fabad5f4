//! cleanplate-server/src/context.rs
//!
//! Defines the main "global" context (ServerContext) for the reward server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cleanplate_common::traits::repository_traits::{
    ItemRepository, RestaurantRepository, ScanRepository, ShopRepository,
};
use cleanplate_common::traits::verifier_traits::PlateVerifier;
use cleanplate_core::db::Database;
use cleanplate_core::repositories::postgres::items::PostgresItemRepository;
use cleanplate_core::repositories::postgres::restaurants::PostgresRestaurantRepository;
use cleanplate_core::repositories::postgres::scans::PostgresScanRepository;
use cleanplate_core::repositories::postgres::shops::PostgresShopRepository;
use cleanplate_core::services::{EligibilityService, RewardService, VerificationService};
use cleanplate_core::tasks::scan_maintenance::run_scan_maintenance;
use cleanplate_core::verifier::StubPlateVerifier;
use cleanplate_core::Error;

use crate::uploads::LocalImageStore;
use crate::Args;

/// Everything the HTTP handlers need, wired once at startup.
pub struct ServerContext {
    pub db: Database,
    pub eligibility_service: Arc<EligibilityService>,
    pub verification_service: Arc<VerificationService>,
    pub reward_service: Arc<RewardService>,
    pub image_store: Arc<LocalImageStore>,
    pub uploads_dir: PathBuf,
}

impl ServerContext {
    pub async fn new(args: &Args) -> Result<Arc<Self>, Error> {
        // 1) Connect to DB and migrate
        let db = Database::new(&args.resolved_database_url()).await?;
        db.migrate().await?;

        // 2) Build core repos
        let scan_repo: Arc<dyn ScanRepository> =
            Arc::new(PostgresScanRepository::new(db.pool().clone()));
        let item_repo: Arc<dyn ItemRepository> =
            Arc::new(PostgresItemRepository::new(db.pool().clone()));
        let shop_repo: Arc<dyn ShopRepository> =
            Arc::new(PostgresShopRepository::new(db.pool().clone()));
        let restaurant_repo: Arc<dyn RestaurantRepository> =
            Arc::new(PostgresRestaurantRepository::new(db.pool().clone()));

        // 3) Repair scans written by older builds before serving traffic
        run_scan_maintenance(scan_repo.as_ref()).await?;

        // 4) Services. The stub verifier is the only concrete PlateVerifier
        //    today; swapping in a real classifier happens here and only here.
        let verifier: Arc<dyn PlateVerifier> = Arc::new(StubPlateVerifier::with_delay(
            Duration::from_millis(args.verifier_delay_ms),
        ));

        let eligibility_service = Arc::new(EligibilityService::new(scan_repo.clone()));
        let verification_service = Arc::new(VerificationService::new(
            scan_repo.clone(),
            shop_repo.clone(),
            item_repo.clone(),
            restaurant_repo.clone(),
            eligibility_service.clone(),
            verifier,
        ));
        let reward_service = Arc::new(RewardService::new(
            scan_repo,
            item_repo,
            shop_repo,
            restaurant_repo,
            eligibility_service.clone(),
        ));

        let uploads_dir = PathBuf::from(&args.uploads_dir);
        let image_store = Arc::new(LocalImageStore::new(uploads_dir.clone()));

        Ok(Arc::new(Self {
            db,
            eligibility_service,
            verification_service,
            reward_service,
            image_store,
            uploads_dir,
        }))
    }
}
