//! Prints the genre list.

use crate::flow::Genre;

pub fn handle_genres() {
    for genre in Genre::ALL {
        println!("{genre}");
    }
}
