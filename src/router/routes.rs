//! The site's route table.

use std::sync::Arc;

use super::{NOT_FOUND, NOT_FOUND_PATH, RouteDef, RouteTable, numeric_param_guard};
use crate::error::ResolveError;
use crate::pages::{
    AtomicShopFilter, AtomicShopItemPage, AtomicShopPage, BookPage, BooksExportPage,
    CategoryFilter, Glossary, GlossaryPage, HomePage, LibraryPage, NotFoundPage, PatchFilter,
    Shell,
};

/// Compile the static route table, in match order.
pub fn route_table() -> Result<RouteTable, ResolveError> {
    RouteTable::new(
        Arc::new(Shell),
        vec![
            RouteDef::new("/", "home", Arc::new(HomePage)),
            RouteDef::new("/library/eso", "library", Arc::new(LibraryPage)).children(vec![
                RouteDef::new(
                    r"category/:categoryId([0-9]+):slug?",
                    "category",
                    Arc::new(CategoryFilter),
                )
                .guard(numeric_param_guard("categoryId")),
                RouteDef::new(
                    r"patch/:patchVersion([0-9]{1,2}\.[0-9]{1,2}):slug?",
                    "patch",
                    Arc::new(PatchFilter),
                ),
            ]),
            RouteDef::new(r"/library/eso/:bookId([0-9]+):slug?", "book", Arc::new(BookPage))
                .guard(numeric_param_guard("bookId")),
            RouteDef::new(
                "/glossary-tes",
                "glossary-tes",
                Arc::new(GlossaryPage::new(Glossary::ElderScrolls)),
            ),
            RouteDef::new(
                "/glossary-fallout",
                "glossary-fallout",
                Arc::new(GlossaryPage::new(Glossary::Fallout)),
            ),
            RouteDef::new("/f76-atomic-shop", "atomic-shop", Arc::new(AtomicShopPage)).children(
                vec![
                    RouteDef::new(
                        "category/:categoryFormId([a-f0-9]{8}):slug?",
                        "atomic-shop-category",
                        Arc::new(AtomicShopFilter),
                    ),
                    RouteDef::new(
                        "subcategory/:subcategoryFormId([a-f0-9]{8}):slug?",
                        "atomic-shop-subcategory",
                        Arc::new(AtomicShopFilter),
                    ),
                ],
            ),
            RouteDef::new(
                "/f76-atomic-shop/:itemFormId([a-fA-F0-9]{8}):slug?",
                "atomic-shop-item",
                Arc::new(AtomicShopItemPage),
            ),
            RouteDef::new("/books-export", "books-export", Arc::new(BooksExportPage)),
            RouteDef::new("/:catchAll(.*)", NOT_FOUND, Arc::new(NotFoundPage))
                .alias(NOT_FOUND_PATH),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::InstanceRouter;

    fn resolve(path: &str) -> &'static str {
        let mut router = InstanceRouter::new(Arc::new(route_table().unwrap()));
        router.push(path).unwrap().name
    }

    #[test]
    fn test_table_compiles_in_declaration_order() {
        let table = route_table().unwrap();
        assert_eq!(table.names().next(), Some("home"));
        assert_eq!(table.names().last(), Some(NOT_FOUND));
        assert_eq!(table.len(), 13);
    }

    #[test]
    fn test_library_routes() {
        assert_eq!(resolve("/library/eso"), "library");
        assert_eq!(resolve("/library/eso/"), "library");
        assert_eq!(resolve("/library/eso/category/12-letters"), "category");
        assert_eq!(resolve("/library/eso/patch/10.3-gold-road"), "patch");
        assert_eq!(resolve("/library/eso/42"), "book");
        assert_eq!(resolve("/library/eso/42-the-real-barenziah"), "book");
        assert_eq!(resolve("/Library/ESO/42"), "book");
    }

    #[test]
    fn test_invalid_parameters_fall_through() {
        assert_eq!(resolve("/library/eso/category/abc"), NOT_FOUND);
        assert_eq!(resolve("/library/eso/patch/123"), NOT_FOUND);
        assert_eq!(resolve("/library/eso/book"), NOT_FOUND);
    }

    #[test]
    fn test_numeric_parameters_accept_only_ascii_digits() {
        assert_eq!(resolve("/library/eso/٤٢"), NOT_FOUND);
        assert_eq!(resolve("/library/eso/category/١٢"), NOT_FOUND);
        assert_eq!(resolve("/library/eso/patch/١.٢"), NOT_FOUND);
        assert_eq!(resolve("/library/eso/patch/1.2"), "patch");
    }

    #[test]
    fn test_atomic_shop_routes() {
        assert_eq!(resolve("/f76-atomic-shop"), "atomic-shop");
        assert_eq!(resolve("/f76-atomic-shop/category/0a1b2c3d"), "atomic-shop-category");
        assert_eq!(
            resolve("/f76-atomic-shop/subcategory/0a1b2c3d-outfits"),
            "atomic-shop-subcategory"
        );
        assert_eq!(resolve("/f76-atomic-shop/0A1B2C3D-power-armor"), "atomic-shop-item");
    }

    #[test]
    fn test_everything_else_is_not_found() {
        assert_eq!(resolve("/404"), NOT_FOUND);
        assert_eq!(resolve("/no/such/page"), NOT_FOUND);
        assert_eq!(resolve("/books-export"), "books-export");
        assert_eq!(resolve("/glossary-tes"), "glossary-tes");
    }
}
