mod filename;
mod stream;

pub use filename::{audio_extension, episode_download_path, episode_file_name};
pub use stream::{DownloadContext, PARTIAL_EXTENSION, download_episode};
