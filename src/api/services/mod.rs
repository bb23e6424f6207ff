// Services module - authentication client, diagram lookups, history ledger and the model mutation engine

pub mod auth_service;
pub mod diagram_service;
pub mod error;
pub mod history_ledger;
pub mod model_service;

pub use auth_service::{AuthError, Authenticator, HttpAuthenticator};
pub use diagram_service::DiagramService;
pub use error::ServiceError;
pub use history_ledger::HistoryLedger;
pub use model_service::{ModelRefs, ModelService, ModelView};
