//! Book library client and scene navigation for the Genie VR reader.
//!
//! `LibraryClient` talks to the book server (`/books`, `/books/{id}`,
//! `/static/...`); `Reader` walks a fetched book scene by scene and tells the
//! caller which panorama to show.

mod book;
mod client;
mod reader;

pub use book::{Book, BookOverview, Scene, UNKNOWN_AUTHOR};
pub use client::{LibraryClient, LibraryConfig, LibraryError};
pub use reader::{Reader, SceneView, SkyboxCue};
