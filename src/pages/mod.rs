//! Routed views of the library site.

pub mod atomic_shop;
pub mod book;
pub mod books_export;
pub mod glossary;
pub mod home;
pub mod layout;
pub mod library;
pub mod not_found;
pub mod queries;

pub use atomic_shop::{AtomicShopFilter, AtomicShopItemPage, AtomicShopPage};
pub use book::BookPage;
pub use books_export::BooksExportPage;
pub use glossary::{Glossary, GlossaryPage};
pub use home::HomePage;
pub use layout::Shell;
pub use library::{CategoryFilter, LibraryPage, PatchFilter};
pub use not_found::NotFoundPage;
