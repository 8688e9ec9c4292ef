//! Clients HTTP des registres (BAG, OpenKVK, Locatieserver)

pub mod bag;
pub mod http;
pub mod kvk;
pub mod locatie;

pub use bag::{BagClient, BagConfig};
pub use http::{HttpClient, HttpConfig};
pub use kvk::{KvkClient, KvkConfig};
pub use locatie::{LocatieClient, LocatieConfig};
