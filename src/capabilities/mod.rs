mod genre;
mod songs;

pub use genre::{GenreClassifier, GenrePhrase, genre_prompt};
pub use songs::{
    MAX_SONGS, SongCandidate, SongFinder, SongSearch, TITLE_BLOCKLIST, filter_songs,
    is_blocklisted, search_query,
};
