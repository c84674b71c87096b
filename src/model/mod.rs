mod episode;
mod podcast;

pub use episode::{Episode, Episodes, NEW_TAG, NewEpisode};
pub use podcast::{NewPodcast, Podcast, Podcasts};

#[cfg(test)]
pub(crate) use episode::tests::make_new_episode;
#[cfg(test)]
pub(crate) use podcast::tests::{make_entry, make_store};
