pub mod file_serve;
pub mod http_server;
pub mod service_manager;

pub use http_server::HttpService;
pub use service_manager::ServiceManager;
