pub mod app;
pub mod backup;
pub mod board;
pub mod config;
pub mod contact;
pub mod deal;
pub mod directory;
pub mod error;
pub mod io;
pub mod level;
pub mod metrics;
pub mod migrations;
pub mod notify;
pub mod paths;
pub mod state;
pub mod storage;
pub mod store;
pub mod types;

pub use app::WarRoom;
pub use error::{Result, WarRoomError};
