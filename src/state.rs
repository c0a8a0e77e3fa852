use std::sync::Mutex;

use crate::config::AppConfig;
use crate::services::dashboard::Dashboard;
use crate::services::sheet::SheetClient;

pub struct AppState {
    pub config: AppConfig,
    pub sheet: Box<dyn SheetClient>,
    pub dashboard: Mutex<Dashboard>,
}
