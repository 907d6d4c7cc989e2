// Remote rate source.
// HTTP transport contract plus the loader that maps responses into exchange rates.

pub mod client;
pub mod loader;

pub use client::{HttpClient, HttpResponse, ReqwestHttpClient};
pub use loader::{LoadTask, RemoteRateLoader, map_response};
