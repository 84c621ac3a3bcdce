//! Downloader backend abstraction.
//!
//! This module provides a `DownloaderClient` trait for reading torrent
//! state and mutating tags across backends (qBittorrent, Transmission).

mod qbittorrent;
mod transmission;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use transmission::TransmissionClient;
pub use types::*;
